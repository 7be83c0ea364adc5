use std::path::PathBuf;
use std::time::Duration;

use clap::{builder::ValueParser, value_parser, Arg, ArgAction, Command};
use ffsplit_core::OutputFormat;

/// Parse the chunk-length argument into a [`Duration`].
///
/// A bare integer is taken as minutes. Otherwise the value is a chain of
/// `<number><unit>` components with `ms`, `s`, `m`, and `h` units, such as
/// `"90s"` or `"2m30s"`. The total must be greater than zero.
pub fn parse_chunk_length(value: &str) -> Result<Duration, String> {
    let input = value.trim();
    if input.is_empty() {
        return Err("chunk length cannot be empty".into());
    }

    if input.bytes().all(|b| b.is_ascii_digit()) {
        let minutes = input
            .parse::<u64>()
            .map_err(|_| format!("invalid chunk length '{value}'"))?;
        if minutes == 0 {
            return Err("chunk length must be greater than zero".into());
        }
        return minutes
            .checked_mul(60_000)
            .map(Duration::from_millis)
            .ok_or_else(|| "chunk length is too large".to_owned());
    }

    let mut total_ms: u128 = 0;
    let mut index = 0;
    let bytes = input.as_bytes();
    let len = bytes.len();
    let invalid = || format!("invalid chunk length '{value}'");

    while index < len {
        let start = index;
        while index < len && bytes[index].is_ascii_digit() {
            index += 1;
        }

        if start == index {
            return Err(invalid());
        }

        let number = input[start..index].parse::<u128>().map_err(|_| invalid())?;

        if index >= len {
            return Err(invalid());
        }

        let remainder = &input[index..];
        let (unit_len, factor) = if remainder.starts_with("ms") {
            (2, 1u128)
        } else if remainder.starts_with('s') {
            (1, 1_000u128)
        } else if remainder.starts_with('m') {
            (1, 60_000u128)
        } else if remainder.starts_with('h') {
            (1, 3_600_000u128)
        } else {
            return Err(invalid());
        };

        index += unit_len;

        let component_ms = number
            .checked_mul(factor)
            .ok_or_else(|| "chunk length is too large".to_owned())?;
        total_ms = total_ms
            .checked_add(component_ms)
            .ok_or_else(|| "chunk length is too large".to_owned())?;
    }

    if total_ms == 0 {
        return Err("chunk length must be greater than zero".into());
    }

    if total_ms > u128::from(u64::MAX) {
        return Err("chunk length is too large".into());
    }

    Ok(Duration::from_millis(total_ms as u64))
}

pub fn parse_format(value: &str) -> Result<OutputFormat, String> {
    OutputFormat::parse(value).map_err(|err| err.to_string())
}

pub fn build_cli() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .about("Split an audio file into fixed-length chunks with ffmpeg")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("length")
                .short('l')
                .long("length")
                .value_name("CHUNK_LENGTH")
                .help("Length of each chunk, in minutes or with units (e.g. 10, 2m30s)")
                .required(true)
                .value_parser(ValueParser::new(parse_chunk_length)),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("OUTPUT_DIR")
                .help("Directory where the chunks will be written")
                .default_value(".")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .help("Output format for the chunks (mp3, wav, flac, ogg, opus, aac)")
                .default_value("mp3")
                .value_parser(ValueParser::new(parse_format)),
        )
        .arg(
            Arg::new("normalize")
                .short('n')
                .long("normalize")
                .help("Normalize speech volume while encoding")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("overwrite")
                .long("overwrite")
                .help("Allow overwriting existing files in the output directory")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Preview the generated chunks without invoking ffmpeg")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("ffmpeg")
                .long("ffmpeg")
                .value_name("PATH")
                .help("ffmpeg executable to invoke")
                .default_value("ffmpeg")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("ffprobe")
                .long("ffprobe")
                .value_name("PATH")
                .help("ffprobe executable to invoke")
                .default_value("ffprobe")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("file_path")
                .value_name("FILE_PATH")
                .help("Path to the input audio file")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_integers_are_minutes() {
        assert_eq!(parse_chunk_length("10").unwrap(), Duration::from_secs(600));
        assert_eq!(parse_chunk_length("1").unwrap(), Duration::from_secs(60));
    }

    #[test]
    fn parses_individual_units() {
        assert_eq!(
            parse_chunk_length("500ms").unwrap(),
            Duration::from_millis(500)
        );
        assert_eq!(parse_chunk_length("90s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_chunk_length("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_chunk_length("1h").unwrap(), Duration::from_secs(3_600));
    }

    #[test]
    fn parses_chained_units() {
        let expected = Duration::from_millis(3_600_000 + 120_000 + 3_000 + 45);
        assert_eq!(parse_chunk_length("1h2m3s45ms").unwrap(), expected);
    }

    #[test]
    fn rejects_zero_lengths() {
        assert!(parse_chunk_length("0").is_err());
        assert!(parse_chunk_length("0ms").is_err());
    }

    #[test]
    fn rejects_unknown_units_and_garbage() {
        assert!(parse_chunk_length("5x").is_err());
        assert!(parse_chunk_length("s5").is_err());
        assert!(parse_chunk_length("").is_err());
    }

    #[test]
    fn parses_output_formats() {
        assert_eq!(parse_format("mp3").unwrap(), OutputFormat::Mp3);
        assert_eq!(parse_format("OPUS").unwrap(), OutputFormat::Opus);
        assert!(parse_format("midi").is_err());
    }
}
