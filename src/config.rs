use crate::app_dirs::AppDirs;
use crate::error::TrialResult;
use crate::session::DEFAULT_TRIAL_SECS;
use crate::word_generator::WordGenConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub trial_secs: u64,
    pub sentence_count: usize,
    pub min_words_per_sentence: usize,
    pub max_words_per_sentence: usize,
    pub db_path: Option<PathBuf>,
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trial_secs: DEFAULT_TRIAL_SECS,
            sentence_count: 8,
            min_words_per_sentence: 4,
            max_words_per_sentence: 8,
            db_path: None,
            last_username: None,
        }
    }
}

impl Config {
    /// Trial length; never shorter than one second.
    pub fn trial(&self) -> Duration {
        Duration::from_secs(self.trial_secs.max(1))
    }

    pub fn word_gen(&self) -> WordGenConfig {
        WordGenConfig {
            sentence_count: self.sentence_count,
            min_words: self.min_words_per_sentence,
            max_words: self.max_words_per_sentence,
        }
    }

    pub fn resolved_db_path(&self) -> PathBuf {
        self.db_path.clone().unwrap_or_else(AppDirs::db_path)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> TrialResult<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// Missing files give the defaults; unreadable ones are logged and also give the defaults.
    fn load(&self) -> Config {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(_) => return Config::default(),
        };
        serde_json::from_slice::<Config>(&bytes).unwrap_or_else(|e| {
            warn!("ignoring malformed config {}: {}", self.path.display(), e);
            Config::default()
        })
    }

    fn save(&self, cfg: &Config) -> TrialResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
