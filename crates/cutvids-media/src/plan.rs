//! Command plan compiler.
//!
//! Turns one [`Task`] into the ordered list of external commands that
//! produce its output file. Every intermediate result goes to a temporary
//! next to the destination, and the destination itself is only ever written
//! by the final `mv` of the `.part` file, so a reader never observes a
//! half-written output.
//!
//! # Shapes
//!
//! | segments | inputs | plan |
//! |---|---|---|
//! | many | any | [join inputs →] extract each segment → join segments → [gain] → rename |
//! | one, both bounds | one | single inaccurate-seek extraction → rename |
//! | one, otherwise | any | [trim head] [trim tail] → copy or join → rename |
//!
//! The plan is consumed as an iterator. Concat list files are written right
//! before the command that reads them is handed out, and the temp registry is
//! released when the iterator is exhausted or the plan is aborted.

use std::collections::VecDeque;
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use cutvids_models::{Segment, Task};

use crate::command::{Command, FfmpegCommand};
use crate::concat::{concat_list_path, write_concat_list};
use crate::error::{MediaError, MediaResult};
use crate::locate::SourceLocator;
use crate::temp_registry::TempRegistry;

/// Settings shared by every ffmpeg invocation of a plan.
#[derive(Debug, Clone)]
pub struct PlanOptions {
    /// ffmpeg program name or path
    pub ffmpeg: String,
    /// Passed as `-v <level>` when set
    pub log_level: Option<String>,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            log_level: None,
        }
    }
}

impl PlanOptions {
    fn ffmpeg(&self, input: &Path, output: &Path) -> FfmpegCommand {
        let cmd = FfmpegCommand::new(input, output).program(&self.ffmpeg);
        match &self.log_level {
            Some(level) => cmd.log_level(level),
            None => cmd,
        }
    }

    fn concat(&self, list: &Path, output: &Path) -> Command {
        self.ffmpeg(list, output).concat_demuxer().stream_copy().build()
    }
}

#[derive(Debug)]
enum Step {
    Run(Command),
    /// Write the list file, then run the concat command that reads it.
    Concat {
        list: PathBuf,
        inputs: Vec<PathBuf>,
        command: Command,
    },
}

/// What a task asks for, decided before any command is built.
#[derive(Debug, Clone, Copy)]
enum Shape<'a> {
    MultiSegment {
        segments: &'a [Segment],
        gain: Option<f64>,
    },
    FastTrim {
        start: u64,
        end: u64,
    },
    General {
        start: Option<u64>,
        end: Option<u64>,
    },
}

impl<'a> Shape<'a> {
    fn classify(task: &'a Task, input_count: usize) -> MediaResult<Self> {
        match (task.segments.as_slice(), input_count, task.boost_volume) {
            ([], _, _) => Err(MediaError::EmptyTask("segments")),
            ([_], _, Some(_)) => Err(MediaError::GainNotSupported),
            ([only], 1, None) => Ok(match (only.trim_start(), only.trim_end()) {
                (Some(start), Some(end)) => Shape::FastTrim { start, end },
                (start, end) => Shape::General { start, end },
            }),
            ([only], _, None) => Ok(Shape::General {
                start: only.trim_start(),
                end: only.trim_end(),
            }),
            (segments, _, gain) => Ok(Shape::MultiSegment { segments, gain }),
        }
    }
}

/// The ordered command stream for one task, plus the temporaries it owns.
#[derive(Debug)]
pub struct CommandPlan {
    steps: VecDeque<Step>,
    registry: TempRegistry,
    destination: PathBuf,
    part_file: PathBuf,
    finished: bool,
}

impl CommandPlan {
    /// Compile with default [`PlanOptions`].
    pub fn compile(task: &Task, locator: &dyn SourceLocator, outdir: &Path) -> MediaResult<Self> {
        Self::compile_with_options(task, locator, outdir, &PlanOptions::default())
    }

    /// Resolve the task's sources and build its command plan.
    ///
    /// Fails before anything touches the filesystem when a source is missing
    /// or ambiguous, a segment ends before it starts, or audio gain is asked
    /// for on a single-segment task.
    pub fn compile_with_options(
        task: &Task,
        locator: &dyn SourceLocator,
        outdir: &Path,
        options: &PlanOptions,
    ) -> MediaResult<Self> {
        if task.input_files.is_empty() {
            return Err(MediaError::EmptyTask("input files"));
        }
        check_segment_order(&task.segments)?;

        let inputs = task
            .input_files
            .iter()
            .map(|name| Ok(std::path::absolute(locator.locate(name)?)?))
            .collect::<MediaResult<Vec<PathBuf>>>()?;
        let shape = Shape::classify(task, inputs.len())?;

        let destination = std::path::absolute(outdir)?.join(&task.output_file);
        let mut builder = PlanBuilder::new(destination, task.extension(), options);

        match shape {
            Shape::MultiSegment { segments, gain } => builder.multi_segment(inputs, segments, gain),
            Shape::FastTrim { start, end } => builder.fast_trim(&inputs[0], start, end),
            Shape::General { start, end } => builder.general(inputs, start, end),
        }

        let plan = builder.finish();
        debug!(
            "Compiled {} steps for {}",
            plan.steps.len(),
            plan.destination.display()
        );
        Ok(plan)
    }

    /// Final output path.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Work-in-progress file renamed onto the destination by the last command.
    pub fn part_file(&self) -> &Path {
        &self.part_file
    }

    /// Paths that are removed when the plan ends.
    pub fn temp_paths(&self) -> &[PathBuf] {
        self.registry.paths()
    }

    /// Number of commands not yet handed out.
    pub fn remaining(&self) -> usize {
        self.steps.len()
    }

    /// Stop early and remove every temporary.
    pub fn abort(mut self) -> MediaResult<()> {
        self.finished = true;
        self.steps.clear();
        self.registry.release()
    }

    fn fail(&mut self, err: MediaError) -> MediaError {
        self.finished = true;
        self.steps.clear();
        match self.registry.release() {
            Ok(()) => err,
            Err(cleanup) => {
                warn!("Cleanup after failure also failed: {}", cleanup);
                cleanup
            }
        }
    }
}

/// A lone segment is judged on its trim points, so `5 0` and `0 0` are valid.
fn check_segment_order(segments: &[Segment]) -> MediaResult<()> {
    let lone = segments.len() == 1;
    for (index, segment) in segments.iter().enumerate() {
        let segment = if lone { segment.trim_points() } else { *segment };
        if segment.is_ordered() {
            continue;
        }
        if let (Some(start), Some(end)) = (segment.start, segment.end) {
            return Err(MediaError::InvalidSegment { index, start, end });
        }
    }
    Ok(())
}

impl Iterator for CommandPlan {
    type Item = MediaResult<Command>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.steps.pop_front() {
            Some(Step::Run(command)) => Some(Ok(command)),
            Some(Step::Concat {
                list,
                inputs,
                command,
            }) => {
                self.registry.register(&list);
                match write_concat_list(&list, &inputs) {
                    Ok(()) => Some(Ok(command)),
                    Err(e) => Some(Err(self.fail(e))),
                }
            }
            None => {
                self.finished = true;
                match self.registry.release() {
                    Ok(()) => None,
                    Err(e) => Some(Err(e)),
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            (0, Some(0))
        } else {
            // Releasing the registry may yield one trailing error
            (self.steps.len(), Some(self.steps.len() + 1))
        }
    }
}

impl FusedIterator for CommandPlan {}

struct PlanBuilder<'o> {
    steps: VecDeque<Step>,
    registry: TempRegistry,
    destination: PathBuf,
    part_file: PathBuf,
    extension: String,
    options: &'o PlanOptions,
}

impl<'o> PlanBuilder<'o> {
    fn new(destination: PathBuf, extension: String, options: &'o PlanOptions) -> Self {
        let mut builder = Self {
            steps: VecDeque::new(),
            registry: TempRegistry::new(),
            part_file: PathBuf::new(),
            destination,
            extension,
            options,
        };
        // A successful plan renames the part file away before the registry is
        // released, so registering it only matters for aborted plans.
        builder.part_file = builder.temp("part");
        builder
    }

    /// `<destination>.<label><ext>`, registered for cleanup.
    fn temp(&mut self, label: &str) -> PathBuf {
        let mut name = self.destination.as_os_str().to_owned();
        name.push(format!(".{}{}", label, self.extension));
        let path = PathBuf::from(name);
        self.registry.register(&path);
        path
    }

    fn run(&mut self, command: Command) {
        self.steps.push_back(Step::Run(command));
    }

    fn concat(&mut self, inputs: Vec<PathBuf>, output: &Path) {
        let list = concat_list_path(output);
        let command = self.options.concat(&list, output);
        self.steps.push_back(Step::Concat {
            list,
            inputs,
            command,
        });
    }

    fn multi_segment(&mut self, inputs: Vec<PathBuf>, segments: &[Segment], gain: Option<f64>) {
        let source = match <[PathBuf; 1]>::try_from(inputs) {
            Ok([single]) => single,
            Err(inputs) => {
                let whole = self.temp("whole");
                self.concat(inputs, &whole);
                whole
            }
        };

        let mut segment_files = Vec::with_capacity(segments.len());
        for (n, segment) in segments.iter().enumerate() {
            let segment_file = self.temp(&format!("segment{}", n));
            let mut cmd = self.options.ffmpeg(&source, &segment_file);
            // Presence, not truthiness: a segment may start at second 0
            match (segment.start, segment.end) {
                (Some(start), Some(end)) => cmd = cmd.seek(start).duration(end - start),
                (Some(start), None) => cmd = cmd.seek(start),
                (None, Some(end)) => cmd = cmd.duration(end),
                (None, None) => {}
            }
            self.run(cmd.stream_copy().build());
            segment_files.push(segment_file);
        }

        let part = self.part_file.clone();
        self.concat(segment_files, &part);

        if let Some(gain) = gain {
            let filter_input = self.temp("filter_input");
            self.run(Command::rename(&part, &filter_input));
            let cmd = self
                .options
                .ffmpeg(&filter_input, &part)
                .video_codec("copy")
                .audio_filter(format!("volume={}", gain))
                .build();
            self.run(cmd);
        }

        self.publish();
    }

    fn fast_trim(&mut self, input: &Path, start: u64, end: u64) {
        let part = self.part_file.clone();
        let cmd = self
            .options
            .ffmpeg(input, &part)
            .inaccurate_seek()
            .seek(start)
            .stream_copy()
            .duration(end - start)
            .avoid_negative_ts()
            .build();
        self.run(cmd);
        self.publish();
    }

    fn general(&mut self, mut inputs: Vec<PathBuf>, start: Option<u64>, end: Option<u64>) {
        if let Some(start) = start {
            let head = self.temp("first_part");
            let cmd = self.options.ffmpeg(&inputs[0], &head).seek(start).stream_copy().build();
            self.run(cmd);
            inputs[0] = head;
        }

        if let Some(end) = end {
            let tail = self.temp("end_part");
            let last = inputs.len() - 1;
            let cmd = self.options.ffmpeg(&inputs[last], &tail).duration(end).stream_copy().build();
            self.run(cmd);
            inputs[last] = tail;
        }

        let part = self.part_file.clone();
        match <[PathBuf; 1]>::try_from(inputs) {
            Ok([single]) => self.run(Command::copy(&single, &part)),
            Err(inputs) => self.concat(inputs, &part),
        }

        self.publish();
    }

    /// The only command that writes the destination path.
    fn publish(&mut self) {
        let cmd = Command::rename(&self.part_file, &self.destination);
        self.run(cmd);
    }

    fn finish(self) -> CommandPlan {
        CommandPlan {
            steps: self.steps,
            registry: self.registry,
            destination: self.destination,
            part_file: self.part_file,
            finished: false,
        }
    }
}
