use serde::{Deserialize, Serialize};

use super::{ShowId, ShowSummary};

// ============================================================================
// TMDB API Types
// ============================================================================

/// Raw `GET /tv/{id}` response (only the fields the tracker reads)
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbTvDetails {
    pub id: ShowId,
    pub name: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub number_of_seasons: Option<u32>,
    #[serde(default)]
    pub number_of_episodes: Option<u32>,
}

impl From<TmdbTvDetails> for ShowSummary {
    fn from(details: TmdbTvDetails) -> Self {
        ShowSummary {
            id: details.id,
            title: details.name,
            poster_path: details.poster_path,
            vote_average: details.vote_average,
            // TMDB sends "" for shows that have not aired yet
            first_air_date: details.first_air_date.filter(|d| !d.is_empty()),
            total_seasons: details.number_of_seasons.unwrap_or(0),
            total_episodes: details.number_of_episodes.unwrap_or(0),
        }
    }
}

/// Raw `GET /tv/{id}/season/{n}` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbSeasonDetails {
    pub season_number: u32,
    #[serde(default)]
    pub episodes: Vec<TmdbEpisode>,
}

impl TmdbSeasonDetails {
    /// Episode count as the tracker understands it: the number of listed episodes
    pub fn episode_count(&self) -> u32 {
        self.episodes.len() as u32
    }
}

/// Episode entry inside a season response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbEpisode {
    pub episode_number: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub air_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tv_details_into_summary() {
        let json = r#"{
            "id": 1396,
            "name": "Breaking Bad",
            "poster_path": "/ggFHVNu6YYI5L9pCfOacjizRGt.jpg",
            "vote_average": 8.9,
            "first_air_date": "2008-01-20",
            "number_of_seasons": 5,
            "number_of_episodes": 62,
            "genres": [{"id": 18, "name": "Drama"}]
        }"#;

        let details: TmdbTvDetails = serde_json::from_str(json).unwrap();
        let summary = ShowSummary::from(details);

        assert_eq!(summary.id, 1396);
        assert_eq!(summary.title, "Breaking Bad");
        assert_eq!(summary.total_seasons, 5);
        assert_eq!(summary.total_episodes, 62);
        assert_eq!(summary.first_air_date.as_deref(), Some("2008-01-20"));
    }

    #[test]
    fn test_tv_details_missing_counts() {
        let json = r#"{"id": 42, "name": "Pilot Only", "first_air_date": ""}"#;
        let summary = ShowSummary::from(serde_json::from_str::<TmdbTvDetails>(json).unwrap());

        assert_eq!(summary.total_seasons, 0);
        assert_eq!(summary.total_episodes, 0);
        assert!(summary.first_air_date.is_none());
        assert!(summary.poster_path.is_none());
    }

    #[test]
    fn test_season_episode_count() {
        let json = r#"{
            "_id": "52571",
            "season_number": 2,
            "episodes": [
                {"episode_number": 1, "name": "Seven Thirty-Seven"},
                {"episode_number": 2, "name": "Grilled"},
                {"episode_number": 3, "name": "Bit by a Dead Bee"}
            ]
        }"#;

        let season: TmdbSeasonDetails = serde_json::from_str(json).unwrap();
        assert_eq!(season.season_number, 2);
        assert_eq!(season.episode_count(), 3);
    }

    #[test]
    fn test_season_without_episodes() {
        let season: TmdbSeasonDetails = serde_json::from_str(r#"{"season_number": 4}"#).unwrap();
        assert_eq!(season.episode_count(), 0);
    }
}
