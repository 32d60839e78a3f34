//! Error types for the gujconv library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`GujConvError`] — **Fatal**: the conversion job cannot proceed at all
//!   (bad delay bounds, unknown font key, missing input file) or must halt
//!   (batch-mode chunk exhaustion). Returned as `Err(GujConvError)` from the
//!   top-level `convert*` functions.
//!
//! * [`ChunkError`] — **Non-fatal**: a single chunk exhausted its retries but
//!   the interactive policy substituted the original text and moved on.
//!   Stored inside [`crate::output::ChunkResult`] so callers can inspect
//!   which chunks came back untranslated.
//!
//! The separation lets call sites pick their own tolerance: interactive
//! sessions favour forward progress (substitute and continue), batch jobs
//! favour halting so the checkpoint stays resumable.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the gujconv library.
///
/// Chunk-level failures under the substitute policy use [`ChunkError`] and
/// are stored in [`crate::output::ChunkResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum GujConvError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// Builder or job validation failed before any network activity.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The font key does not exist in the catalog.
    ///
    /// Unknown keys are rejected rather than silently mapped to a default
    /// font; a silent default would mask user typos with wrong output.
    #[error("Unknown font key '{key}'\nRun with --list-fonts to see available fonts.")]
    UnknownFont { key: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCreate the file with your Gujarati Unicode text.")]
    InputFileNotFound { path: PathBuf },

    /// Process does not have read permission on the input file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    // ── Job errors ────────────────────────────────────────────────────────
    /// A chunk failed every retry in batch mode; the job halted.
    ///
    /// The checkpoint written just before this error records `completed`
    /// finished chunks, so a resumed run re-sends nothing that succeeded.
    #[error(
        "Chunk {index} (offset {offset}) failed after {attempts} attempts: {detail}\n\
         Progress preserved: {completed}/{total} chunks. Re-run to resume."
    )]
    ChunkFailed {
        index: usize,
        offset: usize,
        attempts: u32,
        detail: String,
        completed: usize,
        total: usize,
    },

    /// A second job was started for an output identity that is already busy.
    #[error("A conversion job is already running for '{output_id}'")]
    JobAlreadyRunning { output_id: String },

    /// The job was cancelled between chunks.
    ///
    /// If the job had an output identity, a checkpoint covering `completed`
    /// chunks was written before stopping.
    #[error("Conversion cancelled after {completed}/{total} chunks")]
    Cancelled { completed: usize, total: usize },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the converted output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single chunk.
///
/// Stored in [`crate::output::ChunkResult`] when the substitute policy
/// replaced a failed conversion with the original text. The overall job
/// continues.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ChunkError {
    /// All retries were exhausted; the original text was substituted.
    #[error("Chunk {index}: conversion failed after {retries} retries: {detail}")]
    Exhausted {
        index: usize,
        retries: u32,
        detail: String,
    },
}
