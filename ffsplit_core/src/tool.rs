use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use log::debug;

use crate::config::Config;
use crate::error::SplitError;
use crate::plan::ChunkSpan;

/// Volume-normalization filter applied when [`Config::normalize`] is set.
pub const SPEECHNORM_FILTER: &str = "speechnorm=e=12.5:r=0.0001:l=1";

/// Number of trailing stderr bytes carried into a `ToolFailed` error.
const STDERR_TAIL_BYTES: usize = 2_048;

/// Captured result of one external-tool invocation.
#[derive(Debug)]
pub struct ToolOutput {
    pub status: std::process::ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Seam over the external tool processes.
///
/// The run functions accept any implementation so tests can substitute a
/// scripted fake for ffmpeg and ffprobe.
pub trait ToolRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> Result<ToolOutput, SplitError>;
}

/// Runs tools as real child processes with captured output.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> Result<ToolOutput, SplitError> {
        debug!("running {} {:?}", program.display(), args);

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|err| {
                if err.kind() == std::io::ErrorKind::NotFound {
                    SplitError::ToolNotFound {
                        program: program.display().to_string(),
                        source: err,
                    }
                } else {
                    SplitError::Io(err)
                }
            })?;

        Ok(ToolOutput {
            status: output.status,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

fn check(program: &Path, output: ToolOutput) -> Result<ToolOutput, SplitError> {
    if output.status.success() {
        Ok(output)
    } else {
        Err(SplitError::ToolFailed {
            program: program.display().to_string(),
            status: output.status,
            stderr: stderr_tail(&output.stderr),
        })
    }
}

fn stderr_tail(bytes: &[u8]) -> String {
    let start = bytes.len().saturating_sub(STDERR_TAIL_BYTES);
    String::from_utf8_lossy(&bytes[start..]).trim().to_owned()
}

/// Argument vector for the ffprobe duration query.
pub fn probe_args(input: &Path) -> Vec<OsString> {
    vec![
        OsString::from("-i"),
        input.as_os_str().to_owned(),
        OsString::from("-show_entries"),
        OsString::from("format=duration"),
        OsString::from("-v"),
        OsString::from("quiet"),
        OsString::from("-of"),
        OsString::from("csv=p=0"),
    ]
}

/// Argument vector for one ffmpeg chunk extraction.
///
/// `-nostdin` keeps a backgrounded run from blocking on a tty prompt and
/// `-v error` keeps stderr limited to actual failures. Existing-file checks
/// happen at plan time, so the invocation always carries `-y`.
pub fn extract_args(config: &Config, span: ChunkSpan, output_path: &Path) -> Vec<OsString> {
    let mut args = vec![
        OsString::from("-nostdin"),
        OsString::from("-v"),
        OsString::from("error"),
        OsString::from("-y"),
        OsString::from("-i"),
        config.input_path().as_os_str().to_owned(),
        OsString::from("-ss"),
        OsString::from(format_offset(span.start)),
        OsString::from("-to"),
        OsString::from(format_offset(span.end)),
    ];

    if config.normalize() {
        args.push(OsString::from("-filter:a"));
        args.push(OsString::from(SPEECHNORM_FILTER));
    }

    args.push(OsString::from("-c:a"));
    args.push(OsString::from(config.format().encoder()));
    args.push(output_path.as_os_str().to_owned());
    args
}

/// Render an offset as fractional seconds with millisecond precision.
fn format_offset(offset: Duration) -> String {
    let ms = offset.as_millis();
    format!("{}.{:03}", ms / 1_000, ms % 1_000)
}

/// Query ffprobe for the total duration of the configured input.
pub(crate) fn probe_duration(
    config: &Config,
    runner: &dyn ToolRunner,
) -> Result<Duration, SplitError> {
    let program = config.ffprobe_program();
    let output = check(program, runner.run(program, &probe_args(config.input_path()))?)?;
    parse_probe_output(&String::from_utf8_lossy(&output.stdout))
}

/// Parse ffprobe's `format=duration` output: fractional seconds on a line.
pub(crate) fn parse_probe_output(raw: &str) -> Result<Duration, SplitError> {
    let trimmed = raw.trim();
    let seconds: f64 = trimmed
        .parse()
        .map_err(|_| SplitError::MalformedProbe(trimmed.to_owned()))?;
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(SplitError::MalformedProbe(trimmed.to_owned()));
    }
    Ok(Duration::from_secs_f64(seconds))
}

/// Extract one chunk by invoking ffmpeg.
pub(crate) fn run_extract(
    config: &Config,
    runner: &dyn ToolRunner,
    span: ChunkSpan,
    output_path: &Path,
) -> Result<(), SplitError> {
    let program = config.ffmpeg_program();
    check(program, runner.run(program, &extract_args(config, span, output_path))?)?;
    Ok(())
}
