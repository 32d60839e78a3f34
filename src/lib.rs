//! # gujconv
//!
//! Convert Unicode Gujarati text into legacy non-Unicode font encodings by
//! driving a remote conversion service, chunk by chunk.
//!
//! ## Why this crate?
//!
//! Decades of Gujarati publishing material lives in legacy glyph encodings
//! (Shree, LMG, Terafont, EKLG, …) that predate Unicode. The only practical
//! re-mapping for many of these fonts is the conversion service the font
//! vendors themselves feed — but the service caps requests at 200 characters
//! and rate-limits or bans clients that hammer it. This crate wraps that
//! service in a pipeline that is safe to point at a whole book: bounded
//! chunks, paced requests, exponential backoff, and crash-resilient
//! progress checkpoints so an interrupted job never re-sends converted work.
//!
//! ## Pipeline Overview
//!
//! ```text
//! text
//!  │
//!  ├─ 1. Chunk      split into ordered segments of ≤ 200 chars
//!  ├─ 2. Pace       uniform random delay, ×2ᵃ backoff on retries
//!  ├─ 3. Convert    POST one chunk, rotating identity, classify failures
//!  ├─ 4. Retry      bounded attempts; substitute or halt on exhaustion
//!  ├─ 5. Checkpoint persist {completed, total, results} every N chunks
//!  └─ 6. Assemble   ordered concatenation + per-chunk stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gujconv::{convert, JobConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = JobConfig::builder().font("shree0768").build()?;
//!     let output = convert("ગુજરાતી લખાણ અહીં", &config).await?;
//!     println!("{}", output.text);
//!     eprintln!(
//!         "{}/{} chunks converted",
//!         output.stats.converted_chunks, output.stats.total_chunks
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Interactive vs batch
//!
//! | Entry point | On chunk exhaustion | Checkpoints |
//! |-------------|--------------------|-------------|
//! | [`convert`] | substitutes the original text and continues | none |
//! | [`convert_file`] | halts the job with [`GujConvError::ChunkFailed`] | keyed by output path, resumable |
//!
//! The divergence is deliberate: an interactive session prefers forward
//! progress over per-chunk correctness, a batch job prefers halting so its
//! checkpoint stays trustworthy.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `gujconv` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! gujconv = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod checkpoint;
pub mod config;
pub mod convert;
pub mod error;
pub mod fonts;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{JobConfig, JobConfigBuilder, ResumeMode};
pub use convert::{
    convert, convert_file, convert_file_with_cancel, convert_sync, convert_with_cancel,
    CancelToken,
};
pub use error::{ChunkError, GujConvError};
pub use fonts::{font_info, font_list, FontInfo};
pub use output::{ChunkResult, ConversionOutput, ConversionStats};
pub use pipeline::chunk::MAX_CHUNK_SIZE;
pub use pipeline::client::{ChunkReply, FontConverter, HttpFontConverter, SendError};
pub use pipeline::retry::ExhaustionPolicy;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
