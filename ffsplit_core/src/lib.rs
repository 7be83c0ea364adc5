mod config;
mod error;
mod plan;
mod tool;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};

pub use config::{Config, ConfigBuilder, OutputFormat, AUDIO_EXTENSIONS};
pub use error::SplitError;
pub use plan::{plan_chunks, ChunkSpan, PlannedChunk, SplitPlan, MAX_CHUNKS};
pub use tool::{
    extract_args, probe_args, SystemRunner, ToolOutput, ToolRunner, SPEECHNORM_FILTER,
};

/// Progress notifications emitted while a split is running.
#[derive(Clone, Debug)]
pub enum ProgressEvent {
    /// Emitted once, after probing, before the first chunk is extracted.
    Start {
        total_duration: Duration,
        chunks: usize,
    },
    /// Emitted after each chunk has been written.
    ChunkWritten {
        index: usize,
        path: PathBuf,
        /// Amount of the input covered once this chunk is on disk.
        processed: Duration,
    },
    /// Emitted after the final chunk.
    Finish,
}

/// Cooperative cancellation flag shared with a split in progress.
///
/// The flag is checked between tool invocations; an extraction that has
/// already started always runs to completion.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Summary of a completed or cancelled split.
#[derive(Clone, Debug)]
pub struct SplitReport {
    pub total_duration: Duration,
    pub chunks_written: usize,
    pub cancelled: bool,
}

/// Probe the input and lay out the chunks without invoking ffmpeg.
pub fn plan_split(config: &Config) -> Result<SplitPlan, SplitError> {
    plan_split_with_runner(config, &SystemRunner)
}

/// Variant of [`plan_split`] with a caller-supplied tool runner.
pub fn plan_split_with_runner(
    config: &Config,
    runner: &dyn ToolRunner,
) -> Result<SplitPlan, SplitError> {
    // The directory was present when the configuration was built; re-check
    // in case it vanished since.
    if !config.output_dir().is_dir() {
        return Err(SplitError::MissingOutputDirectory(
            config.output_dir().to_path_buf(),
        ));
    }

    let total = tool::probe_duration(config, runner)?;
    plan::build_plan(config, total)
}

/// Execute the split, invoking ffmpeg once per chunk.
///
/// ```no_run
/// use std::time::Duration;
/// use ffsplit_core::{run, Config};
///
/// # fn main() -> Result<(), ffsplit_core::SplitError> {
/// let config = Config::new("lecture.mp3", "out", Duration::from_secs(600))?;
/// let report = run(&config)?;
/// println!("wrote {} chunk(s)", report.chunks_written);
/// # Ok(())
/// # }
/// ```
pub fn run(config: &Config) -> Result<SplitReport, SplitError> {
    run_with_progress(config, |_| {})
}

/// Execute the split, reporting [`ProgressEvent`]s through the callback.
pub fn run_with_progress<F>(config: &Config, callback: F) -> Result<SplitReport, SplitError>
where
    F: FnMut(ProgressEvent),
{
    run_cancellable(config, callback, &CancelToken::new())
}

/// Execute the split, stopping early (without error) once the token is
/// cancelled. The report records how many chunks were completed.
pub fn run_cancellable<F>(
    config: &Config,
    mut callback: F,
    token: &CancelToken,
) -> Result<SplitReport, SplitError>
where
    F: FnMut(ProgressEvent),
{
    run_with_runner(config, &SystemRunner, &mut callback, token)
}

/// Fully parameterized run: caller-supplied tool runner, progress callback,
/// and cancellation token.
pub fn run_with_runner(
    config: &Config,
    runner: &dyn ToolRunner,
    callback: &mut dyn FnMut(ProgressEvent),
    token: &CancelToken,
) -> Result<SplitReport, SplitError> {
    let plan = plan_split_with_runner(config, runner)?;
    info!(
        "splitting '{}' into {} chunk(s) of {:?}",
        config.input_path().display(),
        plan.len(),
        config.chunk_length()
    );

    callback(ProgressEvent::Start {
        total_duration: plan.total_duration,
        chunks: plan.len(),
    });

    let mut written = 0;
    for chunk in &plan.chunks {
        if token.is_cancelled() {
            info!("split cancelled after {} of {} chunk(s)", written, plan.len());
            return Ok(SplitReport {
                total_duration: plan.total_duration,
                chunks_written: written,
                cancelled: true,
            });
        }

        tool::run_extract(config, runner, chunk.span, &chunk.output_path)?;
        written += 1;
        debug!("wrote {}", chunk.output_path.display());

        callback(ProgressEvent::ChunkWritten {
            index: chunk.span.index,
            path: chunk.output_path.clone(),
            processed: chunk.span.end,
        });
    }

    callback(ProgressEvent::Finish);

    Ok(SplitReport {
        total_duration: plan.total_duration,
        chunks_written: written,
        cancelled: false,
    })
}
