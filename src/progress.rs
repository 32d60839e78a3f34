//! Progress-callback trait for per-chunk conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::JobConfigBuilder::progress_callback`] to receive events
//! as the pipeline finishes each chunk.
//!
//! # Why callbacks instead of channels?
//!
//! The callback is the least-invasive integration point: callers can forward
//! events to a channel, a terminal progress bar, or a GUI event loop without
//! the library knowing how the host application communicates. Events are
//! immutable values; marshalling them onto a particular thread or executor is
//! entirely the subscriber's responsibility — the core assumes nothing about
//! the caller's threading model.
//!
//! Chunks are processed strictly sequentially within one job, so events for
//! one job arrive in order and never concurrently. The trait is still
//! `Send + Sync` because a job may run on a spawned worker task while the
//! callback lives on the driving side.

use std::sync::Arc;

/// Called by the conversion pipeline as it processes each chunk.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after chunking, before any network activity.
    ///
    /// # Arguments
    /// * `total_chunks` — number of chunks that will be processed
    fn on_job_start(&self, total_chunks: usize) {
        let _ = total_chunks;
    }

    /// Called just before a chunk's first attempt is paced and sent.
    ///
    /// # Arguments
    /// * `index` — 0-indexed chunk number
    /// * `total` — total chunks in the job
    fn on_chunk_start(&self, index: usize, total: usize) {
        let _ = (index, total);
    }

    /// Called when a chunk's result is in (converted or substituted).
    ///
    /// # Arguments
    /// * `index`       — 0-indexed chunk number
    /// * `total`       — total chunks in the job
    /// * `chunk_text`  — the converted (or substituted) text for this chunk
    /// * `total_chars` — running character count of all output so far
    fn on_chunk_complete(&self, index: usize, total: usize, chunk_text: &str, total_chars: usize) {
        let _ = (index, total, chunk_text, total_chars);
    }

    /// Called when a chunk exhausts its retries.
    ///
    /// Under the substitute policy `on_chunk_complete` still follows with the
    /// original text; under the halt policy this is the last event before the
    /// job fails.
    fn on_chunk_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called once after the final chunk, before assembly returns.
    ///
    /// # Arguments
    /// * `total_chunks`    — total chunks in the job
    /// * `converted_count` — chunks converted without fallback
    fn on_job_complete(&self, total_chunks: usize, converted_count: usize) {
        let _ = (total_chunks, converted_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::JobConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
