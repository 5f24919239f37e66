//! Uploader binary discovery and command construction.
//!
//! Two command line dialects exist. The old `youtube_upload` script takes
//! account credentials and one flag per privacy level; the maintained
//! `youtube-upload` authenticates on its own and takes `--privacy`.

use std::path::{Path, PathBuf};

use cutvids_media::Command;
use cutvids_models::{Privacy, Task};

use crate::config::UploadConfig;
use crate::error::{WorkerError, WorkerResult};

/// Binaries tried in order.
pub const UPLOAD_CANDIDATES: [&str; 3] = ["youtube_upload", "youtube-upload", "yt-upload"];

/// Find the first uploader on `PATH`.
pub fn find_upload_bin() -> WorkerResult<PathBuf> {
    UPLOAD_CANDIDATES
        .iter()
        .find_map(|candidate| which::which(candidate).ok())
        .ok_or_else(|| WorkerError::UploaderNotFound(UPLOAD_CANDIDATES.join(", ")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploaderFlavor {
    /// `youtube_upload`: `--email`/`--password`, `--public`/`--private`/`--unlisted`
    Legacy,
    /// `youtube-upload` and compatible: `--privacy <level>`
    Modern,
}

impl UploaderFlavor {
    pub fn detect(bin: &Path) -> Self {
        match bin.file_name().and_then(|n| n.to_str()) {
            Some("youtube_upload") => UploaderFlavor::Legacy,
            _ => UploaderFlavor::Modern,
        }
    }
}

/// A located uploader plus the account settings it needs.
#[derive(Debug, Clone)]
pub struct Uploader {
    bin: PathBuf,
    flavor: UploaderFlavor,
    config: UploadConfig,
}

impl Uploader {
    /// Fails when the legacy uploader is paired with a config lacking credentials.
    pub fn new(bin: impl Into<PathBuf>, config: UploadConfig) -> WorkerResult<Self> {
        let bin = bin.into();
        let flavor = UploaderFlavor::detect(&bin);
        if flavor == UploaderFlavor::Legacy {
            config.credentials()?;
        }
        Ok(Self { bin, flavor, config })
    }

    pub fn bin(&self) -> &Path {
        &self.bin
    }

    /// Upload command for `file`, titled after the task's output name.
    pub fn command(&self, task: &Task, file: &Path) -> Command {
        let mut argv = vec![
            self.bin.to_string_lossy().into_owned(),
            "--category".to_string(),
            self.config.category.clone(),
        ];

        match self.flavor {
            UploaderFlavor::Legacy => {
                if let Ok((email, password)) = self.config.credentials() {
                    argv.extend(["--email".to_string(), email.to_string()]);
                    argv.extend(["--password".to_string(), password.to_string()]);
                }
                argv.extend(["-t".to_string(), task.title()]);
                if let Some(privacy) = task.privacy {
                    argv.push(legacy_privacy_flag(privacy).to_string());
                }
                if let Some(description) = &task.description {
                    argv.extend(["--description".to_string(), description.clone()]);
                }
            }
            UploaderFlavor::Modern => {
                argv.extend(["-t".to_string(), task.title()]);
                if let Some(description) = &task.description {
                    argv.extend(["--description".to_string(), description.clone()]);
                }
                if let Some(privacy) = task.privacy {
                    argv.extend(["--privacy".to_string(), privacy.to_string()]);
                }
            }
        }

        argv.extend(["--".to_string(), file.to_string_lossy().into_owned()]);
        Command::from_argv(argv)
    }
}

fn legacy_privacy_flag(privacy: Privacy) -> &'static str {
    match privacy {
        Privacy::Public => "--public",
        Privacy::Private => "--private",
        Privacy::Unlisted => "--unlisted",
    }
}

#[cfg(test)]
mod tests {
    use cutvids_models::parse_task_line;

    use super::*;

    fn config(credentials: bool) -> UploadConfig {
        UploadConfig {
            category: "Education".to_string(),
            email: credentials.then(|| "me@example.org".to_string()),
            password: credentials.then(|| "hunter2".to_string()),
        }
    }

    #[test]
    fn test_flavor_detection() {
        assert_eq!(
            UploaderFlavor::detect(Path::new("/usr/bin/youtube_upload")),
            UploaderFlavor::Legacy
        );
        assert_eq!(
            UploaderFlavor::detect(Path::new("/usr/local/bin/youtube-upload")),
            UploaderFlavor::Modern
        );
        assert_eq!(UploaderFlavor::detect(Path::new("yt-upload")), UploaderFlavor::Modern);
    }

    #[test]
    fn test_legacy_command() {
        let task = parse_task_line(
            r#"a.mp4 "Keynote 2024" - - '{"description": "Opening talk", "privacy": "unlisted"}'"#,
        )
        .unwrap();
        let uploader = Uploader::new("/usr/bin/youtube_upload", config(true)).unwrap();
        let cmd = uploader.command(&task, Path::new("uploading/Keynote 2024.mp4"));

        assert_eq!(
            cmd.argv(),
            &[
                "/usr/bin/youtube_upload", "--category", "Education", "--email", "me@example.org",
                "--password", "hunter2", "-t", "Keynote 2024", "--unlisted", "--description",
                "Opening talk", "--", "uploading/Keynote 2024.mp4",
            ]
        );
    }

    #[test]
    fn test_modern_command() {
        let task = parse_task_line(r#"a.mp4 talk.webm - - '{"privacy": "private"}'"#).unwrap();
        let uploader = Uploader::new("/usr/bin/youtube-upload", config(false)).unwrap();
        let cmd = uploader.command(&task, Path::new("uploading/talk.webm"));

        assert_eq!(
            cmd.argv(),
            &[
                "/usr/bin/youtube-upload", "--category", "Education", "-t", "talk", "--privacy",
                "private", "--", "uploading/talk.webm",
            ]
        );
    }

    #[test]
    fn test_modern_command_without_extras() {
        let task = parse_task_line("a.mp4 talk").unwrap();
        let uploader = Uploader::new("yt-upload", config(true)).unwrap();
        let cmd = uploader.command(&task, Path::new("talk.mp4"));
        assert_eq!(
            cmd.argv(),
            &["yt-upload", "--category", "Education", "-t", "talk", "--", "talk.mp4"]
        );
    }

    #[test]
    fn test_legacy_requires_credentials() {
        let err = Uploader::new("/usr/bin/youtube_upload", config(false)).unwrap_err();
        assert!(matches!(err, WorkerError::ConfigError(_)));
    }
}
