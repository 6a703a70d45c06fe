use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "typetrial";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", APP_NAME)
    }

    pub fn db_path() -> PathBuf {
        Self::project()
            .map(|pd| pd.data_local_dir().join("typing_test_stats.db"))
            .unwrap_or_else(|| PathBuf::from("typing_test_stats.db"))
    }

    pub fn config_path() -> PathBuf {
        Self::project()
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("typetrial_config.json"))
    }

    pub fn log_path() -> PathBuf {
        Self::project()
            .map(|pd| pd.data_local_dir().join("typetrial.log"))
            .unwrap_or_else(|| PathBuf::from("typetrial.log"))
    }
}
