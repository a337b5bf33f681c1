use std::{env, path::{Path, PathBuf}};

use tracing::level_filters::LevelFilter;

pub const ARTIFACT_DIR_VAR: &str = "PREDICT_ARTIFACT_DIR";
pub const LOG_VAR: &str = "PREDICT_LOG";

pub const MODEL_CONFIG_FILE: &str = "config.json";
// CompactRecorder appends the `.mpk` extension itself.
pub const MODEL_RECORD_FILE: &str = "model";
pub const LABELS_FILE: &str = "class_names.json";

#[derive(Debug, Clone)]
pub struct Settings {
    pub artifact_dir: PathBuf,
    pub log_level: LevelFilter,
}

impl Settings {
    pub fn from_env() -> Self {
        let artifact_dir = env::var_os(ARTIFACT_DIR_VAR).map(PathBuf::from);
        let exe_dir = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        let log_level = env::var(LOG_VAR).ok();

        Self::resolve(artifact_dir, exe_dir, log_level.as_deref())
    }

    /// Picks the artifact directory (explicit override, then the executable's
    /// directory, then the working directory) and the log level.
    pub fn resolve(artifact_dir: Option<PathBuf>, exe_dir: Option<PathBuf>, log_level: Option<&str>) -> Self {
        let artifact_dir = artifact_dir
            .or(exe_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        let log_level = log_level
            .and_then(|level| level.trim().parse::<LevelFilter>().ok())
            .unwrap_or(LevelFilter::OFF);

        Self { artifact_dir, log_level }
    }

    pub fn model_config_path(&self) -> PathBuf {
        self.artifact_dir.join(MODEL_CONFIG_FILE)
    }

    pub fn model_record_path(&self) -> PathBuf {
        self.artifact_dir.join(MODEL_RECORD_FILE)
    }

    pub fn labels_path(&self) -> PathBuf {
        self.artifact_dir.join(LABELS_FILE)
    }
}
