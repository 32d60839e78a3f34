//! Pipeline stages for chunked text conversion.
//!
//! Each submodule implements exactly one concern. Keeping stages separate
//! makes each independently testable and lets us swap implementations (e.g.
//! a scripted converter under test) without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! chunk ──▶ pacing ──▶ client ──▶ retry
//! (split)   (delay)    (HTTP)     (backoff + policy)
//! ```
//!
//! 1. [`chunk`]  — split the input into an ordered, bounded, lossless
//!    sequence of chunks
//! 2. [`pacing`] — decide the delay before each attempt, with exponential
//!    backoff on retries
//! 3. [`client`] — one chunk's HTTP exchange: rotating identity, response
//!    validation and decoding, failure classification; the only stage with
//!    network I/O
//! 4. [`retry`]  — bounded retry loop per chunk with a named exhaustion
//!    policy (substitute vs halt)

pub mod chunk;
pub mod client;
pub mod pacing;
pub mod retry;
