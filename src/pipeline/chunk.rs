//! Text segmentation: split input into an ordered sequence of bounded chunks.
//!
//! Splitting is purely positional on character boundaries. It never cuts a
//! `char` in half, but it makes no attempt to avoid splitting mid-word or
//! mid-grapheme-cluster — a conjunct or matra sequence that straddles a chunk
//! boundary is sent to the service in two pieces. In practice the service
//! converts each piece independently and concatenation still renders
//! correctly for the supported fonts; this is a known limitation, not a bug
//! the chunker tries to paper over.

/// Remote service request cap in characters.
///
/// Payloads above this are truncated or rejected server-side, so it bounds
/// [`crate::config::JobConfig::chunk_size`] as a hard constraint.
pub const MAX_CHUNK_SIZE: usize = 200;

/// A bounded contiguous slice of input text, sent as one request.
///
/// Immutable once created. Chunks partition the input contiguously and in
/// order: concatenating all chunk texts in index order reconstructs the
/// input exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 0-indexed position within the job.
    pub index: usize,
    /// The slice of input text, at most `size` characters.
    pub text: String,
    /// Character offset of this chunk's start within the input.
    pub offset: usize,
}

/// Split `text` into chunks of at most `size` characters.
///
/// Deterministic: the same `(text, size)` always yields the same sequence.
/// Empty input yields an empty sequence (the orchestrator treats that as an
/// immediate no-op completion).
///
/// `size` must be non-zero; the config builder enforces `1..=MAX_CHUNK_SIZE`
/// before a chunker ever runs.
pub fn chunk_text(text: &str, size: usize) -> Vec<Chunk> {
    debug_assert!(size > 0, "chunk size validated by JobConfigBuilder");
    let mut chunks = Vec::new();
    let mut current = String::with_capacity(size.min(text.len()));
    let mut current_len = 0;
    let mut offset = 0;

    for (i, ch) in text.chars().enumerate() {
        current.push(ch);
        current_len += 1;
        if current_len == size {
            chunks.push(Chunk {
                index: chunks.len(),
                text: std::mem::take(&mut current),
                offset,
            });
            current_len = 0;
            offset = i + 1;
        }
    }
    if !current.is_empty() {
        chunks.push(Chunk {
            index: chunks.len(),
            text: current,
            offset,
        });
    }
    chunks
}
