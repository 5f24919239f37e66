//! FFmpeg concat demuxer lists.

use std::path::{Path, PathBuf};

use crate::error::MediaResult;

/// Suffix appended to the concat target's path to name its list file.
pub const CONCAT_LIST_SUFFIX: &str = ".concat_list.txt";

/// List file that feeds the concat command writing `target`.
pub fn concat_list_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(CONCAT_LIST_SUFFIX);
    PathBuf::from(name)
}

/// One `file '<path>'` line per input, followed by a blank line.
pub fn concat_list_contents(inputs: &[PathBuf]) -> String {
    let lines: Vec<String> = inputs
        .iter()
        .map(|p| format!("file '{}'", p.to_string_lossy().replace('\'', r"'\''")))
        .collect();
    format!("{}\n\n", lines.join("\n"))
}

pub fn write_concat_list(list: &Path, inputs: &[PathBuf]) -> MediaResult<()> {
    std::fs::write(list, concat_list_contents(inputs))?;
    Ok(())
}
