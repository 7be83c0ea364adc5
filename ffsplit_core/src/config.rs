use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::SplitError;

/// File extensions accepted as input audio.
pub const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "ogg", "flac", "aac", "m4a", "wma", "aiff", "alac", "ape", "opus", "ra", "rm",
    "wv", "tta", "dts", "ac3", "amr", "gsm", "voc", "mpc",
];

/// Encoding target for the produced chunks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Mp3,
    Wav,
    Flac,
    Ogg,
    Opus,
    Aac,
}

impl OutputFormat {
    /// File extension used for the produced chunks.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Wav => "wav",
            OutputFormat::Flac => "flac",
            OutputFormat::Ogg => "ogg",
            OutputFormat::Opus => "opus",
            OutputFormat::Aac => "aac",
        }
    }

    /// Encoder name passed to ffmpeg via `-c:a`.
    pub fn encoder(self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "libmp3lame",
            OutputFormat::Wav => "pcm_s16le",
            OutputFormat::Flac => "flac",
            OutputFormat::Ogg => "libvorbis",
            OutputFormat::Opus => "libopus",
            OutputFormat::Aac => "aac",
        }
    }

    /// Parse a format from its extension, case-insensitively.
    pub fn parse(value: &str) -> Result<Self, SplitError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mp3" => Ok(OutputFormat::Mp3),
            "wav" => Ok(OutputFormat::Wav),
            "flac" => Ok(OutputFormat::Flac),
            "ogg" => Ok(OutputFormat::Ogg),
            "opus" => Ok(OutputFormat::Opus),
            "aac" => Ok(OutputFormat::Aac),
            _ => Err(SplitError::UnknownFormat(value.to_owned())),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = SplitError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        OutputFormat::parse(value)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Validated configuration for a split operation.
///
/// Built through [`Config::builder`]; construction canonicalizes the paths
/// and performs all argument validation, so a `Config` handed to the run
/// functions is internally consistent.
#[derive(Clone, Debug)]
pub struct Config {
    input_path: PathBuf,
    output_dir: PathBuf,
    chunk_length: Duration,
    file_stem: String,
    format: OutputFormat,
    normalize: bool,
    overwrite: bool,
    ffmpeg_program: PathBuf,
    ffprobe_program: PathBuf,
}

impl Config {
    /// Start building a [`Config`] from the three required arguments.
    pub fn builder<P: AsRef<Path>, Q: AsRef<Path>>(
        input: P,
        output_dir: Q,
        chunk_length: Duration,
    ) -> ConfigBuilder {
        ConfigBuilder {
            input: input.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
            chunk_length,
            format: OutputFormat::default(),
            normalize: false,
            overwrite: false,
            ffmpeg_program: PathBuf::from("ffmpeg"),
            ffprobe_program: PathBuf::from("ffprobe"),
        }
    }

    /// Construct a [`Config`] with default options.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        input: P,
        output_dir: Q,
        chunk_length: Duration,
    ) -> Result<Self, SplitError> {
        Config::builder(input, output_dir, chunk_length).build()
    }

    /// Canonicalized path of the source file to split.
    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    /// Canonicalized directory into which the chunks will be written.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Desired length of each chunk.
    pub fn chunk_length(&self) -> Duration {
        self.chunk_length
    }

    /// Base name shared by all produced chunk files.
    pub fn file_stem(&self) -> &str {
        &self.file_stem
    }

    /// Format the chunks are encoded to.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Whether the speech-normalization filter is applied while encoding.
    pub fn normalize(&self) -> bool {
        self.normalize
    }

    /// Whether existing output files may be replaced.
    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    /// Executable invoked to extract chunks.
    pub fn ffmpeg_program(&self) -> &Path {
        &self.ffmpeg_program
    }

    /// Executable invoked to probe the input duration.
    pub fn ffprobe_program(&self) -> &Path {
        &self.ffprobe_program
    }
}

/// Builder returned by [`Config::builder`].
#[derive(Clone, Debug)]
pub struct ConfigBuilder {
    input: PathBuf,
    output_dir: PathBuf,
    chunk_length: Duration,
    format: OutputFormat,
    normalize: bool,
    overwrite: bool,
    ffmpeg_program: PathBuf,
    ffprobe_program: PathBuf,
}

impl ConfigBuilder {
    /// Select the output format (default mp3).
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Apply the speech-normalization filter while encoding.
    pub fn normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Allow replacing existing files in the output directory.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Override the ffmpeg executable looked up on PATH.
    pub fn ffmpeg_program<P: Into<PathBuf>>(mut self, program: P) -> Self {
        self.ffmpeg_program = program.into();
        self
    }

    /// Override the ffprobe executable looked up on PATH.
    pub fn ffprobe_program<P: Into<PathBuf>>(mut self, program: P) -> Self {
        self.ffprobe_program = program.into();
        self
    }

    /// Validate the arguments and produce a [`Config`].
    pub fn build(self) -> Result<Config, SplitError> {
        if self.chunk_length < Duration::from_millis(1) {
            return Err(SplitError::InvalidChunkLength);
        }

        if !self.input.exists() {
            return Err(SplitError::MissingInput(self.input));
        }
        if !self.input.is_file() {
            return Err(SplitError::NotAFile(self.input));
        }
        if !self.output_dir.is_dir() {
            return Err(SplitError::MissingOutputDirectory(self.output_dir));
        }

        let input_path = fs::canonicalize(&self.input)?;
        let output_dir = fs::canonicalize(&self.output_dir)?;

        let recognized = input_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                AUDIO_EXTENSIONS.iter().any(|known| *known == ext)
            })
            .unwrap_or(false);
        if !recognized {
            return Err(SplitError::UnsupportedExtension(input_path));
        }

        let file_stem = input_path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .ok_or(SplitError::InvalidInputName)?
            .to_owned();

        Ok(Config {
            input_path,
            output_dir,
            chunk_length: self.chunk_length,
            file_stem,
            format: self.format,
            normalize: self.normalize,
            overwrite: self.overwrite,
            ffmpeg_program: self.ffmpeg_program,
            ffprobe_program: self.ffprobe_program,
        })
    }
}
