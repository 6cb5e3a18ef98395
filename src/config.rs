use std::env;
use std::path::PathBuf;

const DEFAULT_IMAGE_DIR: &str = "images";
const DEFAULT_STATS_PATH: &str = "osteo_stats.json";
const DEFAULT_DIALOGUE_DB: &str = "db.sqlite";

/// Runtime settings, read from the environment (and `.env` when present).
///
/// The bot token itself is read by teloxide from `TELOXIDE_TOKEN`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding the reference pictures named in the dataset.
    pub image_dir: PathBuf,
    /// Lifetime statistics file.
    pub stats_path: PathBuf,
    /// SQLite file used for dialogue state.
    pub dialogue_db: String,
    /// External dataset replacing the embedded one.
    pub dataset: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            image_dir: value("OSTEO_IMAGE_DIR")
                .unwrap_or_else(|| DEFAULT_IMAGE_DIR.to_string())
                .into(),
            stats_path: value("OSTEO_STATS_PATH")
                .unwrap_or_else(|| DEFAULT_STATS_PATH.to_string())
                .into(),
            dialogue_db: value("OSTEO_DIALOGUE_DB")
                .unwrap_or_else(|| DEFAULT_DIALOGUE_DB.to_string()),
            dataset: value("OSTEO_DATASET").map(PathBuf::from),
        }
    }
}
