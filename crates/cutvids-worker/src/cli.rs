//! Command line arguments.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "cutvids")]
#[command(about = "Cut, join and upload videos described by a task file")]
#[command(version, long_about = None)]
pub struct Cli {
    /// Description of videos, one per line.
    /// Format: sources (separated with +) "destination name" [start, - for none] [end] [JSON extras]
    #[arg(value_name = "FILE", default_value = "./renames")]
    pub index_file: PathBuf,

    /// Print commands instead of executing them
    #[arg(long)]
    pub dry_run: bool,

    /// Print out more information
    #[arg(short, long)]
    pub verbose: bool,

    /// Upload videos after cutting them
    #[arg(short, long)]
    pub upload: bool,

    /// Directory to search source videos in
    #[arg(long, value_name = "DIR")]
    pub indir: Option<PathBuf>,

    /// JSON configuration file for the upload (keys: category, email, password)
    #[arg(long, value_name = "FILE")]
    pub upload_config: Option<String>,

    /// Show the video tasks and exit
    #[arg(long)]
    pub show_tasks: bool,

    /// Find the uploader binary and exit
    #[arg(long)]
    pub find_upload_bin: bool,
}
