//! Worker configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use cutvids_media::PlanOptions;

use crate::cli::Cli;
use crate::error::{WorkerError, WorkerResult};

/// Default upload config location.
pub const DEFAULT_UPLOAD_CONFIG: &str = "~/.config/cutvids.conf";

/// Default name of the work-in-progress directory.
pub const DEFAULT_WORK_DIR_NAME: &str = "uploading";

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Root searched for source videos (defaults to the current directory)
    pub indir: Option<PathBuf>,
    /// Upload config path, before `~`/`$VAR` expansion
    pub upload_config: String,
    /// ffmpeg program name or path
    pub ffmpeg: String,
    /// Optional `-v` level for every ffmpeg call
    pub ffmpeg_log_level: Option<String>,
    /// Per-command timeout in seconds
    pub command_timeout: Option<u64>,
    /// Work directory name, relative to the current directory
    pub work_dir_name: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            indir: None,
            upload_config: DEFAULT_UPLOAD_CONFIG.to_string(),
            ffmpeg: "ffmpeg".to_string(),
            ffmpeg_log_level: None,
            command_timeout: None,
            work_dir_name: DEFAULT_WORK_DIR_NAME.to_string(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());
        Self {
            indir: non_empty("CUTVIDS_INDIR").map(PathBuf::from),
            upload_config: non_empty("CUTVIDS_UPLOAD_CONFIG")
                .unwrap_or_else(|| DEFAULT_UPLOAD_CONFIG.to_string()),
            ffmpeg: non_empty("CUTVIDS_FFMPEG").unwrap_or_else(|| "ffmpeg".to_string()),
            ffmpeg_log_level: non_empty("CUTVIDS_FFMPEG_LOGLEVEL"),
            command_timeout: non_empty("CUTVIDS_COMMAND_TIMEOUT")
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0),
            work_dir_name: non_empty("CUTVIDS_WORK_DIR_NAME")
                .unwrap_or_else(|| DEFAULT_WORK_DIR_NAME.to_string()),
        }
    }

    /// Command line flags take precedence over the environment.
    pub fn with_cli(mut self, cli: &Cli) -> Self {
        if let Some(indir) = &cli.indir {
            self.indir = Some(indir.clone());
        }
        if let Some(path) = &cli.upload_config {
            self.upload_config = path.clone();
        }
        self
    }

    pub fn plan_options(&self) -> PlanOptions {
        PlanOptions {
            ffmpeg: self.ffmpeg.clone(),
            log_level: self.ffmpeg_log_level.clone(),
        }
    }

    /// Upload config path with `~` and environment variables expanded.
    pub fn upload_config_path(&self) -> WorkerResult<PathBuf> {
        let expanded = shellexpand::full(&self.upload_config).map_err(|e| {
            WorkerError::config_error(format!(
                "cannot expand upload config path {:?}: {}",
                self.upload_config, e
            ))
        })?;
        Ok(PathBuf::from(expanded.into_owned()))
    }
}

/// Settings handed to the uploader binary.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UploadConfig {
    pub category: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl UploadConfig {
    /// Read the JSON config file.
    pub fn load(path: impl AsRef<Path>) -> WorkerResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| WorkerError::UploadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| WorkerError::InvalidUploadConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Email and password, required by the legacy uploader.
    pub fn credentials(&self) -> WorkerResult<(&str, &str)> {
        match (self.email.as_deref(), self.password.as_deref()) {
            (Some(email), Some(password)) => Ok((email, password)),
            _ => Err(WorkerError::config_error(
                "upload config needs \"email\" and \"password\" for youtube_upload",
            )),
        }
    }
}
