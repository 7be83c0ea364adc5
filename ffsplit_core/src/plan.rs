use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::{Config, OutputFormat};
use crate::error::SplitError;

/// Upper bound on the number of chunks a single plan may produce.
pub const MAX_CHUNKS: usize = 50_000;

/// Half-open time range covered by one output chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkSpan {
    /// 1-based position of the chunk in the plan.
    pub index: usize,
    pub start: Duration,
    pub end: Duration,
}

impl ChunkSpan {
    pub fn length(&self) -> Duration {
        self.end - self.start
    }
}

/// One chunk of the plan together with the file it will be written to.
#[derive(Clone, Debug)]
pub struct PlannedChunk {
    pub span: ChunkSpan,
    pub output_path: PathBuf,
}

/// Everything needed to execute a split: the probed input duration plus one
/// entry per chunk, in extraction order.
#[derive(Clone, Debug)]
pub struct SplitPlan {
    pub total_duration: Duration,
    pub chunks: Vec<PlannedChunk>,
}

impl SplitPlan {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn output_paths(&self) -> impl Iterator<Item = &Path> {
        self.chunks.iter().map(|chunk| chunk.output_path.as_path())
    }
}

/// Lay out the chunk boundaries for an input of the given total duration.
///
/// Chunk `i` covers `[i * chunk_length, min((i + 1) * chunk_length, total))`.
/// The final chunk may be shorter than the others; a zero-length trailing
/// chunk is never emitted, so a duration that divides exactly produces
/// exactly `total / chunk_length` chunks.
pub fn plan_chunks(
    total: Duration,
    chunk_length: Duration,
) -> Result<Vec<ChunkSpan>, SplitError> {
    let chunk_ms = u64::try_from(chunk_length.as_millis()).unwrap_or(u64::MAX);
    if chunk_ms == 0 {
        return Err(SplitError::InvalidChunkLength);
    }
    let total_ms = u64::try_from(total.as_millis()).unwrap_or(u64::MAX);

    let count = usize::try_from(total_ms.div_ceil(chunk_ms)).unwrap_or(usize::MAX);
    if count > MAX_CHUNKS {
        return Err(SplitError::ChunkLimitExceeded { limit: MAX_CHUNKS });
    }

    let mut spans = Vec::with_capacity(count);
    for i in 0..count as u64 {
        let start = i * chunk_ms;
        let end = ((u128::from(i) + 1) * u128::from(chunk_ms)).min(u128::from(total_ms)) as u64;
        spans.push(ChunkSpan {
            index: i as usize + 1,
            start: Duration::from_millis(start),
            end: Duration::from_millis(end),
        });
    }

    Ok(spans)
}

fn num_width(mut value: usize) -> usize {
    if value == 0 {
        return 1;
    }

    let mut width = 0;
    while value > 0 {
        value /= 10;
        width += 1;
    }
    width
}

/// File name for one chunk: `NNN_<stem>.<ext>`, 1-based and zero-padded.
pub(crate) fn chunk_file_name(
    index: usize,
    pad_width: usize,
    stem: &str,
    format: OutputFormat,
) -> String {
    format!(
        "{index:0pad_width$}_{stem}.{ext}",
        ext = format.extension()
    )
}

/// Turn a probed duration into a full [`SplitPlan`] for the configuration.
///
/// Unless overwriting was requested, planning fails on the first target path
/// that already exists, before any tool has been invoked.
pub(crate) fn build_plan(config: &Config, total: Duration) -> Result<SplitPlan, SplitError> {
    let spans = plan_chunks(total, config.chunk_length())?;
    let pad_width = num_width(spans.len()).max(3);

    let mut chunks = Vec::with_capacity(spans.len());
    for span in spans {
        let file_name =
            chunk_file_name(span.index, pad_width, config.file_stem(), config.format());
        let output_path = config.output_dir().join(file_name);
        if !config.overwrite() && output_path.exists() {
            return Err(SplitError::OutputExists(output_path));
        }
        chunks.push(PlannedChunk { span, output_path });
    }

    Ok(SplitPlan {
        total_duration: total,
        chunks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plans_remainder_chunk_when_duration_does_not_divide() {
        let spans =
            plan_chunks(Duration::from_millis(1_100), Duration::from_millis(400)).unwrap();
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0].start, Duration::ZERO);
        assert_eq!(spans[0].end, Duration::from_millis(400));
        assert_eq!(spans[2].start, Duration::from_millis(800));
        assert_eq!(spans[2].end, Duration::from_millis(1_100));
        assert_eq!(spans[2].length(), Duration::from_millis(300));
    }

    #[test]
    fn plans_no_empty_trailing_chunk_for_exact_multiples() {
        let spans = plan_chunks(Duration::from_secs(60), Duration::from_secs(20)).unwrap();
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[2].end, Duration::from_secs(60));
    }

    #[test]
    fn plans_single_chunk_for_short_inputs() {
        let spans = plan_chunks(Duration::from_secs(5), Duration::from_secs(600)).unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].length(), Duration::from_secs(5));
    }

    #[test]
    fn indexes_are_one_based_and_sequential() {
        let spans = plan_chunks(Duration::from_secs(10), Duration::from_secs(3)).unwrap();
        let indexes: Vec<_> = spans.iter().map(|span| span.index).collect();
        assert_eq!(indexes, vec![1, 2, 3, 4]);
    }

    #[test]
    fn rejects_plans_beyond_the_chunk_limit() {
        let err =
            plan_chunks(Duration::from_secs(100_000), Duration::from_millis(1)).unwrap_err();
        match err {
            SplitError::ChunkLimitExceeded { limit } => assert_eq!(limit, MAX_CHUNKS),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn chunk_names_are_zero_padded() {
        assert_eq!(
            chunk_file_name(1, 3, "tone", OutputFormat::Mp3),
            "001_tone.mp3"
        );
        assert_eq!(
            chunk_file_name(42, 3, "tone", OutputFormat::Flac),
            "042_tone.flac"
        );
        assert_eq!(
            chunk_file_name(1_000, 4, "tone", OutputFormat::Mp3),
            "1000_tone.mp3"
        );
    }

    #[test]
    fn num_width_counts_decimal_digits() {
        assert_eq!(num_width(0), 1);
        assert_eq!(num_width(9), 1);
        assert_eq!(num_width(10), 2);
        assert_eq!(num_width(999), 3);
        assert_eq!(num_width(1_000), 4);
    }
}
