//! Task executor.
//!
//! Drives the cut phase (one command plan per task) and the upload phase.
//! Tasks are handled strictly one after another. A failing task is reported
//! and the run moves on; only cancellation stops the run early.

use std::io::{self, Write};
use std::path::PathBuf;

use tracing::Instrument;

use cutvids_media::{
    move_file, CommandPlan, CommandRunner, DirectoryLocator, MediaError, PlanOptions,
};
use cutvids_models::Task;

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::TaskLogger;
use crate::upload::Uploader;

/// Operator switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Print commands instead of executing them
    pub dry_run: bool,
    /// Echo every command and report skipped tasks
    pub verbose: bool,
}

/// The directories a run works in.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Finished, uploaded files end up here
    pub cwd: PathBuf,
    /// Cut files wait here until they are uploaded
    pub work_dir: PathBuf,
    /// Root searched for source videos
    pub indir: PathBuf,
}

impl Workspace {
    pub fn new(cwd: impl Into<PathBuf>, config: &WorkerConfig) -> Self {
        let cwd = cwd.into();
        Self {
            work_dir: cwd.join(&config.work_dir_name),
            indir: config.indir.clone().unwrap_or_else(|| cwd.clone()),
            cwd,
        }
    }

    /// Create the work directory if needed.
    pub fn prepare(&self) -> WorkerResult<()> {
        std::fs::create_dir_all(&self.work_dir)?;
        Ok(())
    }

    pub fn uploaded_file(&self, task: &Task) -> PathBuf {
        self.cwd.join(&task.output_file)
    }

    pub fn cut_file(&self, task: &Task) -> PathBuf {
        self.work_dir.join(&task.output_file)
    }

    pub fn is_uploaded(&self, task: &Task) -> bool {
        self.uploaded_file(task).exists()
    }

    pub fn is_cut(&self, task: &Task) -> bool {
        self.cut_file(task).exists()
    }
}

/// Outcome counts of one phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub skipped: usize,
    /// Output file names of the tasks that failed
    pub failed: Vec<String>,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.completed + self.skipped + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Fold another phase's counts into this one.
    pub fn merge(&mut self, other: RunSummary) {
        self.completed += other.completed;
        self.skipped += other.skipped;
        self.failed.extend(other.failed);
    }

    pub fn into_result(self) -> WorkerResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(WorkerError::TasksFailed {
                failed: self.failed.len(),
                total: self.total(),
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskOutcome {
    Completed,
    Skipped,
}

/// Runs tasks through a [`CommandRunner`], writing operator output to `W`.
pub struct TaskExecutor<R, W = io::Stdout> {
    runner: R,
    workspace: Workspace,
    locator: DirectoryLocator,
    plan_options: PlanOptions,
    options: RunOptions,
    out: W,
}

impl<R: CommandRunner> TaskExecutor<R> {
    pub fn new(
        runner: R,
        workspace: Workspace,
        plan_options: PlanOptions,
        options: RunOptions,
    ) -> Self {
        Self {
            locator: DirectoryLocator::new(workspace.indir.clone()),
            runner,
            workspace,
            plan_options,
            options,
            out: io::stdout(),
        }
    }
}

impl<R: CommandRunner, W: Write + Send> TaskExecutor<R, W> {
    /// Send operator output somewhere other than stdout.
    pub fn with_output<W2: Write + Send>(self, out: W2) -> TaskExecutor<R, W2> {
        TaskExecutor {
            runner: self.runner,
            workspace: self.workspace,
            locator: self.locator,
            plan_options: self.plan_options,
            options: self.options,
            out,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Cut every task that is neither cut nor uploaded yet.
    pub async fn run_cuts(&mut self, tasks: &[Task]) -> WorkerResult<RunSummary> {
        let mut summary = RunSummary::default();
        for task in tasks {
            let logger = TaskLogger::new(task, "cut");
            let span = logger.create_span();
            match self.cut_task(task, &logger).instrument(span).await {
                Ok(TaskOutcome::Completed) => summary.completed += 1,
                Ok(TaskOutcome::Skipped) => summary.skipped += 1,
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    logger.log_error(&e.to_string());
                    summary.failed.push(task.output_file.clone());
                }
            }
        }
        Ok(summary)
    }

    async fn cut_task(&mut self, task: &Task, logger: &TaskLogger) -> WorkerResult<TaskOutcome> {
        if self.workspace.is_uploaded(task) || self.workspace.is_cut(task) {
            if self.options.verbose {
                writeln!(self.out, "{}: Conversion done.", task.output_file)?;
            }
            return Ok(TaskOutcome::Skipped);
        }

        write!(self.out, "{}: Converting", task.output_file)?;
        self.out.flush()?;
        logger.log_start(&format!("{} source file(s)", task.input_files.len()));

        let plan = match CommandPlan::compile_with_options(
            task,
            &self.locator,
            &self.workspace.work_dir,
            &self.plan_options,
        ) {
            Ok(plan) => plan,
            Err(e) => {
                writeln!(self.out)?;
                return Err(e.into());
            }
        };

        let destination = plan.destination().to_path_buf();
        self.run_plan(plan, logger).await?;
        writeln!(self.out)?;
        logger.log_completion(&destination.display().to_string());
        Ok(TaskOutcome::Completed)
    }

    async fn run_plan(&mut self, mut plan: CommandPlan, logger: &TaskLogger) -> WorkerResult<()> {
        while let Some(cmd) = plan.next() {
            // The plan has already cleaned up when it yields an error
            let cmd = cmd?;
            if self.options.verbose {
                write!(self.out, "\n  {}", cmd)?;
                self.out.flush()?;
            }
            if self.options.dry_run {
                continue;
            }

            logger.log_progress(&format!("running {}", cmd.program()));
            if let Err(e) = self.runner.run(&cmd).await {
                self.report_failure(&e)?;
                logger.log_warning("aborting plan, removing temporaries");
                plan.abort()?;
                return Err(e.into());
            }
        }
        Ok(())
    }

    /// Print the captured stderr of a failed command.
    fn report_failure(&mut self, err: &MediaError) -> WorkerResult<()> {
        writeln!(self.out)?;
        if let Some(stderr) = err.stderr() {
            self.out.write_all(stderr.as_bytes())?;
        }
        self.out.flush()?;
        Ok(())
    }

    /// Upload every cut task not uploaded yet, then move it out of the work directory.
    pub async fn run_uploads(
        &mut self,
        tasks: &[Task],
        uploader: &Uploader,
    ) -> WorkerResult<RunSummary> {
        let mut summary = RunSummary::default();
        for task in tasks {
            let logger = TaskLogger::new(task, "upload");
            let span = logger.create_span();
            match self.upload_task(task, uploader, &logger).instrument(span).await {
                Ok(TaskOutcome::Completed) => summary.completed += 1,
                Ok(TaskOutcome::Skipped) => summary.skipped += 1,
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    logger.log_error(&e.to_string());
                    summary.failed.push(task.output_file.clone());
                }
            }
        }
        Ok(summary)
    }

    async fn upload_task(
        &mut self,
        task: &Task,
        uploader: &Uploader,
        logger: &TaskLogger,
    ) -> WorkerResult<TaskOutcome> {
        if !task.upload {
            return Ok(TaskOutcome::Skipped);
        }
        if self.workspace.is_uploaded(task) {
            if self.options.verbose {
                writeln!(self.out, "{}: Already uploaded.", task.output_file)?;
                self.out.flush()?;
            }
            return Ok(TaskOutcome::Skipped);
        }

        let cut_file = self.workspace.cut_file(task);
        if !self.options.dry_run && !cut_file.exists() {
            return Err(MediaError::InputFileNotFound(cut_file.display().to_string()).into());
        }

        write!(self.out, "{}: Uploading", task.output_file)?;
        self.out.flush()?;
        logger.log_start(&uploader.bin().display().to_string());

        let cmd = uploader.command(task, &cut_file);
        if self.options.verbose {
            write!(self.out, "\n  {}", cmd)?;
            self.out.flush()?;
        }
        if !self.options.dry_run {
            if let Err(e) = self.runner.run(&cmd).await {
                self.report_failure(&e)?;
                return Err(e.into());
            }
            move_file(&cut_file, self.workspace.uploaded_file(task)).await?;
        }
        writeln!(self.out)?;

        logger.log_completion("uploaded");
        Ok(TaskOutcome::Completed)
    }
}
