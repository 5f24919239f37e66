//! External commands: the immutable `Command`, the FFmpeg builder and the runner.

use std::borrow::Cow;
use std::fmt;
use std::future::pending;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command as ProcessCommand};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};

/// One external process invocation: the program followed by its arguments.
///
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    argv: Vec<String>,
}

impl Command {
    /// Create a command from a full argument vector.
    pub fn from_argv<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
        }
    }

    /// `mv -- src dst`
    pub fn rename(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Self {
        Self::from_argv(["mv".to_string(), "--".to_string(), path_arg(src), path_arg(dst)])
    }

    /// `cp -- src dst`
    pub fn copy(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Self {
        Self::from_argv(["cp".to_string(), "--".to_string(), path_arg(src), path_arg(dst)])
    }

    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or_default()
    }

    /// Arguments after the program name.
    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or_default()
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Value following the first occurrence of `flag`, e.g. `"-t"`.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.argv
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.argv.get(i + 1))
            .map(String::as_str)
    }

    /// Last argument, which is the output path for every command we build.
    pub fn target(&self) -> Option<&str> {
        self.argv.last().map(String::as_str)
    }
}

impl fmt::Display for Command {
    /// Shell-quoted form suitable for copy-pasting into a terminal.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quoted: Vec<Cow<'_, str>> = self.argv.iter().map(|a| shell_quote(a)).collect();
        f.write_str(&quoted.join(" "))
    }
}

fn path_arg(path: impl AsRef<Path>) -> String {
    path.as_ref().to_string_lossy().into_owned()
}

/// POSIX shell quoting: safe words pass through, everything else is single-quoted.
fn shell_quote(arg: &str) -> Cow<'_, str> {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "@%+=:,./_-".contains(c));
    if safe {
        Cow::Borrowed(arg)
    } else {
        Cow::Owned(format!("'{}'", arg.replace('\'', r#"'"'"'"#)))
    }
}

/// Builder for FFmpeg commands.
///
/// Always stream-copies unless told otherwise by the caller; the builder
/// never adds encoder settings on its own.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Program name or path
    program: String,
    /// Input file path
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level, passed as `-v` when set
    log_level: Option<String>,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            program: "ffmpeg".to_string(),
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: None,
        }
    }

    /// Use a different ffmpeg binary.
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Add input arguments (before -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add multiple input arguments.
    pub fn input_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Start position in whole seconds (output option, `-ss`).
    pub fn seek(self, seconds: u64) -> Self {
        self.output_arg("-ss").output_arg(seconds.to_string())
    }

    /// Duration in whole seconds (output option, `-t`).
    pub fn duration(self, seconds: u64) -> Self {
        self.output_arg("-t").output_arg(seconds.to_string())
    }

    /// Seek on the input before decoding. Fast, not frame accurate.
    pub fn inaccurate_seek(self) -> Self {
        self.input_arg("-noaccurate_seek")
    }

    /// Shift timestamps so the output starts at zero.
    pub fn avoid_negative_ts(self) -> Self {
        self.output_args(["-avoid_negative_ts", "make_zero"])
    }

    /// Read the input as a concat list of absolute paths.
    pub fn concat_demuxer(self) -> Self {
        self.input_args(["-f", "concat", "-safe", "0"])
    }

    /// Copy all streams without re-encoding.
    pub fn stream_copy(self) -> Self {
        self.output_args(["-c", "copy"])
    }

    /// Set video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set audio filter.
    pub fn audio_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-af").output_arg(filter)
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    /// Build the command arguments (without the program name).
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        // Overwrite flag
        if self.overwrite {
            args.push("-y".to_string());
        }

        // Log level
        if let Some(level) = &self.log_level {
            args.push("-v".to_string());
            args.push(level.clone());
        }

        // Input args
        args.extend(self.input_args.iter().cloned());

        // Input file
        args.push("-i".to_string());
        args.push(path_arg(&self.input));

        // Output args
        args.extend(self.output_args.iter().cloned());

        // Output file
        args.push(path_arg(&self.output));

        args
    }

    /// Freeze into an immutable [`Command`].
    pub fn build(&self) -> Command {
        let mut argv = vec![self.program.clone()];
        argv.extend(self.build_args());
        Command { argv }
    }
}

/// Something that can execute a [`Command`] to completion.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command; a non-zero exit becomes [`MediaError::ExternalCommandFailed`].
    async fn run(&self, cmd: &Command) -> MediaResult<()>;
}

/// Runner for external processes with cancellation and an optional timeout.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    /// Cancellation signal receiver
    cancel_rx: Option<watch::Receiver<bool>>,
    /// Timeout in seconds
    timeout_secs: Option<u64>,
}

enum WaitOutcome {
    Exited(std::io::Result<ExitStatus>),
    TimedOut(u64),
    Cancelled,
}

impl ProcessRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set cancellation signal.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Wait for the child, killing it on timeout or cancellation.
    async fn wait_for_completion(&self, child: &mut Child) -> MediaResult<ExitStatus> {
        let timeout_secs = self.timeout_secs;
        let timeout = async move {
            match timeout_secs {
                Some(secs) => {
                    tokio::time::sleep(Duration::from_secs(secs)).await;
                    secs
                }
                None => pending().await,
            }
        };

        let cancel_rx = self.cancel_rx.clone();
        let cancelled = async move {
            let Some(mut rx) = cancel_rx else {
                return pending().await;
            };
            loop {
                if *rx.borrow_and_update() {
                    return;
                }
                if rx.changed().await.is_err() {
                    // Sender gone: nobody can cancel any more.
                    return pending().await;
                }
            }
        };

        let outcome = tokio::select! {
            status = child.wait() => WaitOutcome::Exited(status),
            secs = timeout => WaitOutcome::TimedOut(secs),
            _ = cancelled => WaitOutcome::Cancelled,
        };

        match outcome {
            WaitOutcome::Exited(status) => Ok(status?),
            WaitOutcome::TimedOut(secs) => {
                warn!("Command timed out after {} seconds, killing process", secs);
                let _ = child.kill().await;
                Err(MediaError::Timeout(secs))
            }
            WaitOutcome::Cancelled => {
                info!("Command cancelled, killing process");
                let _ = child.kill().await;
                Err(MediaError::Cancelled)
            }
        }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, cmd: &Command) -> MediaResult<()> {
        let program = cmd.program();
        check_program(program)?;

        debug!("Running: {}", cmd);

        let mut child = ProcessCommand::new(program)
            .args(cmd.args())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("stderr not captured"))?;

        // Drain stderr concurrently so a chatty process never blocks on a full pipe
        let stderr_handle = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf).await;
            buf
        });

        let result = self.wait_for_completion(&mut child).await;
        let stderr = stderr_handle.await.unwrap_or_default();
        let status = result?;

        if status.success() {
            Ok(())
        } else {
            Err(MediaError::external_command_failed(
                program,
                String::from_utf8_lossy(&stderr),
                status.code(),
            ))
        }
    }
}

/// Resolve a program on `PATH` (or check an explicit path).
pub fn check_program(program: &str) -> MediaResult<PathBuf> {
    which::which(program).map_err(|_| MediaError::CommandNotFound(program.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let cmd = FfmpegCommand::new("input.mp4", "output.mp4")
            .seek(10)
            .duration(30)
            .stream_copy()
            .build();

        assert_eq!(
            cmd.argv(),
            &["ffmpeg", "-y", "-i", "input.mp4", "-ss", "10", "-t", "30", "-c", "copy", "output.mp4"]
        );
        assert_eq!(cmd.program(), "ffmpeg");
        assert_eq!(cmd.flag_value("-t"), Some("30"));
        assert_eq!(cmd.target(), Some("output.mp4"));
    }

    #[test]
    fn test_input_args_precede_input() {
        let cmd = FfmpegCommand::new("list.txt", "out.mp4")
            .program("/opt/ffmpeg/bin/ffmpeg")
            .log_level("error")
            .concat_demuxer()
            .stream_copy()
            .build();

        assert_eq!(
            cmd.argv(),
            &[
                "/opt/ffmpeg/bin/ffmpeg", "-y", "-v", "error", "-f", "concat", "-safe", "0", "-i",
                "list.txt", "-c", "copy", "out.mp4"
            ]
        );
    }

    #[test]
    fn test_rename_and_copy() {
        assert_eq!(Command::rename("a", "b").argv(), &["mv", "--", "a", "b"]);
        assert_eq!(Command::copy("a", "b").argv(), &["cp", "--", "a", "b"]);
    }

    #[test]
    fn test_display_quotes_for_shell() {
        let cmd = Command::from_argv(["mv", "--", "/tmp/My talk.mp4", "it's.mp4", "plain-name.mp4"]);
        assert_eq!(
            cmd.to_string(),
            r#"mv -- '/tmp/My talk.mp4' 'it'"'"'s.mp4' plain-name.mp4"#
        );
        assert_eq!(Command::from_argv(["echo", ""]).to_string(), "echo ''");
    }

    #[tokio::test]
    async fn test_runner_success_and_failure() {
        let runner = ProcessRunner::new();
        runner.run(&Command::from_argv(["true"])).await.unwrap();

        let err = runner
            .run(&Command::from_argv(["sh", "-c", "echo oops >&2; exit 3"]))
            .await
            .unwrap_err();
        match err {
            MediaError::ExternalCommandFailed {
                program,
                stderr,
                exit_code,
            } => {
                assert_eq!(program, "sh");
                assert_eq!(stderr.trim(), "oops");
                assert_eq!(exit_code, Some(3));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_runner_stdin_is_closed() {
        // `cat` would hang forever if stdin were left open
        let runner = ProcessRunner::new().with_timeout(10);
        runner.run(&Command::from_argv(["cat"])).await.unwrap();
    }

    #[tokio::test]
    async fn test_runner_missing_program() {
        let err = ProcessRunner::new()
            .run(&Command::from_argv(["definitely-not-a-real-program-xyz"]))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::CommandNotFound(_)));
    }

    #[tokio::test]
    async fn test_runner_timeout() {
        let err = ProcessRunner::new()
            .with_timeout(1)
            .run(&Command::from_argv(["sleep", "30"]))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::Timeout(1)));
    }

    #[tokio::test]
    async fn test_runner_cancel() {
        let (tx, rx) = watch::channel(false);
        let runner = ProcessRunner::new().with_cancel(rx);
        let handle = tokio::spawn(async move {
            runner.run(&Command::from_argv(["sleep", "30"])).await
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send(true).unwrap();
        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, MediaError::Cancelled));
    }
}
