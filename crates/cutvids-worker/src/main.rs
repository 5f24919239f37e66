//! cutvids binary.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info, warn};

use cutvids_media::{check_program, ProcessRunner};
use cutvids_models::read_task_file;
use cutvids_worker::{
    find_upload_bin, init_tracing, Cli, RunOptions, TaskExecutor, UploadConfig,
    Uploader, WorkerConfig, Workspace,
};

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.find_upload_bin {
        return match find_upload_bin() {
            Ok(path) => {
                println!("Uploader is at {}", path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}", e);
                ExitCode::FAILURE
            }
        };
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = WorkerConfig::from_env().with_cli(&cli);
    info!("Worker config: {:?}", config);

    let cwd = std::env::current_dir().context("cannot determine current directory")?;
    let workspace = Workspace::new(cwd, &config);
    workspace
        .prepare()
        .with_context(|| format!("cannot create {}", workspace.work_dir.display()))?;

    let tasks = read_task_file(&cli.index_file)?;

    if cli.show_tasks {
        for task in &tasks {
            println!("{:?}", task);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let options = RunOptions {
        dry_run: cli.dry_run,
        verbose: cli.verbose,
    };
    if !options.dry_run {
        if let Err(e) = check_program(&config.ffmpeg) {
            warn!("{}; tasks that need it will fail", e);
        }
    }

    // Ctrl-C kills the running process; the executor then removes the
    // task's temporaries and stops.
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received interrupt, cancelling");
            let _ = cancel_tx.send(true);
        }
    });

    let mut runner = ProcessRunner::new().with_cancel(cancel_rx);
    if let Some(secs) = config.command_timeout {
        runner = runner.with_timeout(secs);
    }

    let mut executor = TaskExecutor::new(runner, workspace, config.plan_options(), options);

    let mut summary = executor.run_cuts(&tasks).await?;
    if cli.upload {
        let uploader = load_uploader(&config)?;
        summary.merge(executor.run_uploads(&tasks, &uploader).await?);
    }
    info!(
        completed = summary.completed,
        skipped = summary.skipped,
        failed = summary.failed.len(),
        "Run finished"
    );

    match summary.into_result() {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            error!("{}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn load_uploader(config: &WorkerConfig) -> anyhow::Result<Uploader> {
    let bin = find_upload_bin()?;
    let config_path = config.upload_config_path()?;
    let upload_config = UploadConfig::load(&config_path)?;
    Ok(Uploader::new(bin, upload_config)?)
}
