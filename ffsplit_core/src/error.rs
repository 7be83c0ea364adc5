use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors that can occur while planning or executing a split.
#[derive(Debug, Error)]
pub enum SplitError {
    /// Wrapper around IO errors encountered while inspecting paths or
    /// talking to a child process.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Error returned when the input file does not exist.
    #[error("input file does not exist: {0}")]
    MissingInput(PathBuf),

    /// Error returned when the input path exists but is not a regular file.
    #[error("input path is not a regular file: {0}")]
    NotAFile(PathBuf),

    /// Error returned when the input extension is not a recognized audio
    /// extension.
    #[error("input does not have a recognized audio extension: {0}")]
    UnsupportedExtension(PathBuf),

    /// Error produced when a file name cannot be derived from the input path.
    #[error("failed to derive a base name for the input file")]
    InvalidInputName,

    /// Error returned when the output directory is missing at plan time.
    #[error("output directory does not exist: {0}")]
    MissingOutputDirectory(PathBuf),

    /// Error returned when the chunk length is shorter than one millisecond.
    #[error("chunk length must be at least one millisecond")]
    InvalidChunkLength,

    /// Error returned when an output format name is not recognized.
    #[error("unknown output format '{0}'")]
    UnknownFormat(String),

    /// Error returned when a planned output file already exists and
    /// overwriting was not requested.
    #[error("output file already exists: {0}")]
    OutputExists(PathBuf),

    /// Error returned when a plan would exceed the chunk-count limit.
    #[error("refusing to plan more than {limit} chunks")]
    ChunkLimitExceeded { limit: usize },

    /// Error returned when an external tool executable cannot be found.
    #[error("could not find '{program}'")]
    ToolNotFound {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Error returned when an external tool exits unsuccessfully.
    #[error("'{program}' exited with {status}: {stderr}")]
    ToolFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    /// Error returned when the duration reported by ffprobe cannot be parsed.
    #[error("could not parse the duration reported by ffprobe: '{0}'")]
    MalformedProbe(String),
}
