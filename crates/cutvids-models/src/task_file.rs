//! Line-oriented task file parser.
//!
//! Each line reads `SOURCES DEST [START] [END] [JSON_EXTRAS]`:
//!
//! ```text
//! day1.mp4+day1b.mp4 "Opening keynote" 1:30 - '{"privacy": "unlisted"}'
//! day2.mp4 workshop - - '{"segments": [["0:10", "5:00"], ["7:00", "9:30"]]}'
//! ```
//!
//! The first blank or `#` line ends the task list: everything below it is
//! ignored, which lets a file keep finished or future tasks after a marker.

use std::path::Path;

use crate::error::{TaskParseError, TaskParseResult};
use crate::segment::Segment;
use crate::task::{normalize_output_file, RawSegment, RawTime, Task, TaskExtras};
use crate::timestamp::parse_seconds;

const MIN_TOKENS: usize = 2;
const MAX_TOKENS: usize = 5;

/// Split a line into tokens.
///
/// Tokens are separated by spaces. A token starting with `"` or `'` runs to
/// the next matching quote and is taken verbatim; it must be followed by a
/// space or the end of the line.
pub fn tokenize(line: &str) -> TaskParseResult<Vec<String>> {
    let mut tokens = Vec::new();
    let mut rest = line.trim();

    while let Some(first) = rest.chars().next() {
        if first == '"' || first == '\'' {
            let body = &rest[1..];
            let close = body.find(first).ok_or_else(|| {
                TaskParseError::malformed(format!("unterminated {} quote", first))
            })?;
            tokens.push(body[..close].to_string());
            rest = &body[close + 1..];
            if rest.starts_with(|c: char| !is_separator(c)) {
                return Err(TaskParseError::malformed(format!(
                    "unexpected text after closing {} quote",
                    first
                )));
            }
        } else {
            let end = rest.find(is_separator).unwrap_or(rest.len());
            let token = &rest[..end];
            if token.contains('"') {
                return Err(TaskParseError::malformed(format!(
                    "stray double quote in token {}",
                    token
                )));
            }
            tokens.push(token.to_string());
            rest = &rest[end..];
        }
        rest = rest.trim_start_matches(is_separator);
    }

    Ok(tokens)
}

fn is_separator(c: char) -> bool {
    c == ' '
}

/// Parse one non-blank, non-comment task line.
pub fn parse_task_line(line: &str) -> TaskParseResult<Task> {
    let tokens = tokenize(line)?;
    if !(MIN_TOKENS..=MAX_TOKENS).contains(&tokens.len()) {
        return Err(TaskParseError::malformed(format!(
            "expected {} to {} fields, found {}",
            MIN_TOKENS,
            MAX_TOKENS,
            tokens.len()
        )));
    }

    let input_files: Vec<String> = tokens[0].split('+').map(str::to_string).collect();
    if input_files.iter().any(String::is_empty) {
        return Err(TaskParseError::malformed(format!(
            "empty source name in {}",
            tokens[0]
        )));
    }

    if tokens[1].is_empty() {
        return Err(TaskParseError::malformed("empty output file name"));
    }
    let output_file = normalize_output_file(&tokens[1]);

    let start = match tokens.get(2) {
        Some(t) => parse_seconds(t)?,
        None => None,
    };
    let end = match tokens.get(3) {
        Some(t) => parse_seconds(t)?,
        None => None,
    };

    let extras = match tokens.get(4) {
        Some(json) => serde_json::from_str::<TaskExtras>(json).map_err(|e| {
            TaskParseError::malformed(format!("invalid JSON extras: {}", e))
        })?,
        None => TaskExtras::default(),
    };

    let segments = match extras.segments.filter(|s| !s.is_empty()) {
        Some(raw) => {
            if start.is_some() || end.is_some() {
                return Err(TaskParseError::malformed(
                    "segments cannot be combined with positional start/end",
                ));
            }
            raw.into_iter()
                .map(segment_from_raw)
                .collect::<TaskParseResult<Vec<_>>>()?
        }
        None => vec![Segment::new(start, end)],
    };

    if let Some(gain) = extras.boost_volume {
        if !gain.is_finite() || gain <= 0.0 {
            return Err(TaskParseError::malformed(format!(
                "boost_volume must be a positive number, got {}",
                gain
            )));
        }
    }

    Ok(Task {
        input_files,
        output_file,
        description: extras.description,
        segments,
        boost_volume: extras.boost_volume,
        privacy: extras.privacy,
        upload: extras.upload,
    })
}

fn segment_from_raw(raw: RawSegment) -> TaskParseResult<Segment> {
    let (start, end) = match raw {
        RawSegment::Pair(start, end) => (start, end),
        RawSegment::Bounds(mut bounds) => {
            let start = bound_from_map(&mut bounds, "start")?;
            let end = bound_from_map(&mut bounds, "end")?;
            if let Some(key) = bounds.keys().next() {
                return Err(TaskParseError::malformed(format!(
                    "unknown segment key {:?}",
                    key
                )));
            }
            (start, end)
        }
    };
    Ok(Segment::new(time_from_raw(start)?, time_from_raw(end)?))
}

fn bound_from_map(
    bounds: &mut serde_json::Map<String, serde_json::Value>,
    key: &str,
) -> TaskParseResult<Option<RawTime>> {
    match bounds.remove(key) {
        Some(value) => serde_json::from_value(value).map_err(|e| {
            TaskParseError::malformed(format!("invalid segment {}: {}", key, e))
        }),
        None => Ok(None),
    }
}

fn time_from_raw(raw: Option<RawTime>) -> TaskParseResult<Option<u64>> {
    match raw {
        None => Ok(None),
        Some(RawTime::Seconds(secs)) => Ok(Some(secs)),
        Some(RawTime::Text(text)) => parse_seconds(&text),
    }
}

/// Parse task file contents, stopping at the first blank or `#` line.
pub fn parse_tasks(content: &str) -> TaskParseResult<Vec<Task>> {
    let mut tasks = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            break;
        }
        tasks.push(parse_task_line(trimmed).map_err(|e| e.at_line(idx + 1))?);
    }
    Ok(tasks)
}

/// Read and parse a task file.
pub fn read_task_file(path: impl AsRef<Path>) -> TaskParseResult<Vec<Task>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| TaskParseError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_tasks(&content)
}
