//! Retry controller: bounded retry loop per chunk with a named exhaustion
//! policy.
//!
//! Every attempt (the first included) is preceded by a pacing delay — the
//! service bans clients that fire requests back-to-back, so even a healthy
//! run is deliberately slow. Per-attempt failures are swallowed until the
//! bound is hit; what happens then is the call site's explicit choice:
//!
//! * [`ExhaustionPolicy::Substitute`] — interactive sessions favour forward
//!   progress: return the original chunk text flagged as a fallback.
//! * [`ExhaustionPolicy::Halt`] — batch jobs favour resumability: escalate
//!   so the orchestrator checkpoints and fails the job.

use crate::error::ChunkError;
use crate::output::ChunkResult;
use crate::pipeline::chunk::Chunk;
use crate::pipeline::client::FontConverter;
use crate::pipeline::pacing::PacingPolicy;
use std::time::Instant;
use tokio::time::sleep;
use tracing::{debug, warn};

/// What to do when a chunk exhausts its retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExhaustionPolicy {
    /// Substitute the original chunk text and keep going.
    Substitute,
    /// Escalate a hard failure that halts the whole job.
    Halt,
}

/// A chunk that failed every attempt under [`ExhaustionPolicy::Halt`].
///
/// Carries no job context; the orchestrator wraps it into
/// [`crate::error::GujConvError::ChunkFailed`] with progress information.
#[derive(Debug, Clone)]
pub struct RetryExhausted {
    pub attempts: u32,
    pub detail: String,
}

/// Convert one chunk with up to `max_retries` paced attempts.
///
/// Returns `Err` only under the halt policy; the substitute policy always
/// yields a [`ChunkResult`], flagged with `used_fallback` and the final
/// [`ChunkError`] when conversion never succeeded.
pub async fn convert_with_retry(
    converter: &dyn FontConverter,
    pacing: &PacingPolicy,
    chunk: &Chunk,
    max_retries: u32,
    policy: ExhaustionPolicy,
) -> Result<ChunkResult, RetryExhausted> {
    let start = Instant::now();
    let mut last_err: Option<String> = None;

    for attempt in 0..max_retries {
        let delay = pacing.next_delay(attempt);
        if attempt > 0 {
            warn!(
                "chunk {}: retry {}/{} after {:.1}s",
                chunk.index,
                attempt,
                max_retries - 1,
                delay.as_secs_f64()
            );
        }
        sleep(delay).await;

        match converter.convert_chunk(&chunk.text).await {
            Ok(reply) => {
                debug!(
                    "chunk {}: attempt {} ok ({} chars{})",
                    chunk.index,
                    attempt + 1,
                    reply.text.chars().count(),
                    if reply.substituted { ", substituted" } else { "" }
                );
                return Ok(ChunkResult {
                    index: chunk.index,
                    text: reply.text,
                    used_fallback: reply.substituted,
                    retries: attempt,
                    duration_ms: start.elapsed().as_millis() as u64,
                    error: None,
                });
            }
            Err(e) => {
                // 403/429 mean the service is pushing back; log them louder
                // than garden-variety failures.
                match &e {
                    crate::pipeline::client::SendError::RateLimited { status } => warn!(
                        "chunk {}: attempt {} hit rate-limit/ban signal (HTTP {status})",
                        chunk.index,
                        attempt + 1
                    ),
                    other => warn!("chunk {}: attempt {} failed: {other}", chunk.index, attempt + 1),
                }
                last_err = Some(e.to_string());
            }
        }
    }

    let detail = last_err.unwrap_or_else(|| "unknown error".to_string());
    match policy {
        ExhaustionPolicy::Substitute => {
            warn!(
                "chunk {}: all {} attempts failed, substituting original text",
                chunk.index, max_retries
            );
            Ok(ChunkResult {
                index: chunk.index,
                text: chunk.text.clone(),
                used_fallback: true,
                retries: max_retries.saturating_sub(1),
                duration_ms: start.elapsed().as_millis() as u64,
                error: Some(ChunkError::Exhausted {
                    index: chunk.index,
                    retries: max_retries,
                    detail,
                }),
            })
        }
        ExhaustionPolicy::Halt => Err(RetryExhausted {
            attempts: max_retries,
            detail,
        }),
    }
}
