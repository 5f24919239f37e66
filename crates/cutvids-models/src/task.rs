//! Video task model.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::segment::Segment;

/// Container extensions accepted on output file names.
pub const MEDIA_EXTENSIONS: &[&str] = &["mp4", "webm", "ogv"];

/// Extension appended when the output name carries none of [`MEDIA_EXTENSIONS`].
pub const DEFAULT_EXTENSION: &str = "mp4";

/// Upload visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    Public,
    Private,
    Unlisted,
}

impl Privacy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Privacy::Public => "public",
            Privacy::Private => "private",
            Privacy::Unlisted => "unlisted",
        }
    }
}

impl fmt::Display for Privacy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of a task file: cut, join and optionally boost a set of sources.
///
/// Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    /// Source basenames, in playback order (at least one).
    pub input_files: Vec<String>,
    /// Destination file name, always with a recognized extension.
    pub output_file: String,
    pub description: Option<String>,
    /// At least one segment.
    pub segments: Vec<Segment>,
    /// Audio volume multiplier.
    pub boost_volume: Option<f64>,
    pub privacy: Option<Privacy>,
    pub upload: bool,
}

impl Task {
    /// Output file extension including the leading dot.
    pub fn extension(&self) -> String {
        Path::new(&self.output_file)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default()
    }

    /// Output file name without its extension, used as the upload title.
    pub fn title(&self) -> String {
        Path::new(&self.output_file)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.output_file.clone())
    }
}

/// Append [`DEFAULT_EXTENSION`] unless the name already ends in a media extension.
pub fn normalize_output_file(name: &str) -> String {
    let recognized = MEDIA_EXTENSIONS
        .iter()
        .any(|ext| name.ends_with(&format!(".{}", ext)));
    if recognized {
        name.to_string()
    } else {
        format!("{}.{}", name, DEFAULT_EXTENSION)
    }
}

/// A time value as written in JSON extras: a string token or whole seconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawTime {
    Seconds(u64),
    Text(String),
}

/// A segment as written in JSON extras: `[start, end]` or `{"start": .., "end": ..}`.
///
/// Arrays must have exactly two elements. `Bounds` is a plain map so that
/// short arrays cannot fall through to it.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawSegment {
    Pair(Option<RawTime>, Option<RawTime>),
    Bounds(serde_json::Map<String, serde_json::Value>),
}

/// Optional JSON object in the fifth column of a task line.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TaskExtras {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub segments: Option<Vec<RawSegment>>,
    #[serde(default)]
    pub boost_volume: Option<f64>,
    #[serde(default)]
    pub privacy: Option<Privacy>,
    #[serde(default = "default_upload")]
    pub upload: bool,
}

fn default_upload() -> bool {
    true
}

impl Default for TaskExtras {
    fn default() -> Self {
        Self {
            description: None,
            segments: None,
            boost_volume: None,
            privacy: None,
            upload: true,
        }
    }
}
