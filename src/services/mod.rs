pub mod providers;
pub mod tracker;
pub mod transitions;

pub use tracker::{tracked_shows, ProgressTracker, RefreshOutcome};
