//! Output types: per-chunk results, assembled text, and job statistics.

use crate::error::ChunkError;
use serde::{Deserialize, Serialize};

/// Result of converting one chunk.
///
/// Always produced, even on failure under the substitute policy — check
/// [`ChunkResult::used_fallback`] and [`ChunkResult::error`] to tell a real
/// conversion from a substituted original.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkResult {
    /// 0-indexed chunk position within the job.
    pub index: usize,
    /// Converted text, or the original chunk text when `used_fallback` is true.
    pub text: String,
    /// True when the original text was substituted (empty response, corrupt
    /// response, or retries exhausted under the substitute policy).
    pub used_fallback: bool,
    /// Number of retries this chunk needed (0 = first attempt succeeded).
    pub retries: u32,
    /// Wall-clock time spent on this chunk, including pacing delays.
    pub duration_ms: u64,
    /// Present when retries were exhausted and the original was substituted.
    pub error: Option<ChunkError>,
}

/// Complete result of a conversion job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Final converted text: ordered concatenation of all chunk results.
    pub text: String,
    /// Per-chunk results in index order.
    pub chunks: Vec<ChunkResult>,
    /// Aggregate statistics.
    pub stats: ConversionStats,
}

/// Aggregate statistics for a conversion job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Total chunks in the job, including any restored from a checkpoint.
    pub total_chunks: usize,
    /// Chunks converted by the remote service in this run.
    pub converted_chunks: usize,
    /// Chunks whose original text was substituted.
    pub fallback_chunks: usize,
    /// Chunks skipped because a checkpoint already held their results.
    pub resumed_chunks: usize,
    /// Characters of input text.
    pub input_chars: usize,
    /// Characters of converted output.
    pub output_chars: usize,
    /// End-to-end wall-clock time, including pacing delays.
    pub total_duration_ms: u64,
}

impl ConversionOutput {
    /// True when every chunk was genuinely converted (no fallbacks).
    pub fn is_complete(&self) -> bool {
        self.stats.fallback_chunks == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_complete_reflects_fallbacks() {
        let mut out = ConversionOutput {
            text: String::new(),
            chunks: vec![],
            stats: ConversionStats::default(),
        };
        assert!(out.is_complete());
        out.stats.fallback_chunks = 1;
        assert!(!out.is_complete());
    }
}
