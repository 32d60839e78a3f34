//! Conversion client: one chunk's HTTP exchange with the remote service.
//!
//! The network seam is the [`FontConverter`] trait so tests (and callers who
//! need middleware) can script the remote service; [`HttpFontConverter`] is
//! the production implementation backed by a per-job [`reqwest::Client`]
//! whose connection pool is torn down when the job ends.
//!
//! ## Response classification
//!
//! The service speaks no schema — a 2xx body *is* the converted text. That
//! leaves three degenerate 2xx cases the client resolves locally instead of
//! retrying, since re-sending the same chunk reproduces them:
//!
//! * empty body — the service had nothing usable; substitute the original
//! * undecodable bytes — try Latin-1 as a secondary decode
//! * control characters early in the body — suspected transport corruption;
//!   re-decode, and substitute the original if it still looks corrupt
//!
//! The control-character sniff is a heuristic. Legitimate output containing
//! low bytes in its first 50 characters would be falsely substituted; none
//! of the supported legacy encodings is known to do that.
//!
//! 403 and 429 are classified separately from other HTTP errors — they mean
//! the service is pushing back on *us*, which matters for logging even
//! though the retry bound is the same.

use crate::error::GujConvError;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Form field under which the chunk text is POSTed.
const MODIFY_FIELD: &str = "modify_string";

/// How many leading characters the corruption sniff inspects.
const SNIFF_WINDOW: usize = 50;

/// Fixed identity pool, drawn from pseudo-randomly per attempt.
///
/// Rotating the client identity reduces fingerprinting-based blocking; it is
/// pacing hygiene, not a security measure.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:89.0) Gecko/20100101 Firefox/89.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/91.0.864.59",
];

/// A transient, retryable failure from one send attempt.
#[derive(Debug, Clone, Error)]
pub enum SendError {
    /// HTTP 403 or 429 — the service is rate-limiting or has banned us.
    #[error("rate-limit/ban signal (HTTP {status})")]
    RateLimited { status: u16 },

    /// Any other non-2xx status.
    #[error("service error (HTTP {status})")]
    Status { status: u16 },

    /// The request exceeded the configured timeout.
    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Connection-level fault (reset, DNS, TLS).
    #[error("network error: {detail}")]
    Network { detail: String },
}

/// The outcome of one successful (2xx) exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkReply {
    /// Converted text, or the original chunk when `substituted` is true.
    pub text: String,
    /// True when the body was empty or corrupt and the original chunk text
    /// was substituted (a soft failure — not retried).
    pub substituted: bool,
}

/// One chunk's exchange with a conversion endpoint.
///
/// The production implementation is [`HttpFontConverter`]; tests inject
/// scripted implementations via
/// [`crate::config::JobConfigBuilder::converter`].
#[async_trait]
pub trait FontConverter: Send + Sync {
    /// Send one chunk and return its converted text.
    ///
    /// # Errors
    /// [`SendError`] for retryable failures. Soft failures (empty or corrupt
    /// 2xx body) are resolved here by substitution and reported via
    /// [`ChunkReply::substituted`].
    async fn convert_chunk(&self, chunk: &str) -> Result<ChunkReply, SendError>;
}

/// HTTP implementation of [`FontConverter`] against a single endpoint.
pub struct HttpFontConverter {
    client: reqwest::Client,
    endpoint: String,
    timeout_secs: u64,
}

impl HttpFontConverter {
    /// Build a converter with its own connection-reuse context.
    ///
    /// The `reqwest::Client` owns a connection pool; dropping the converter
    /// (when the job ends, on any exit path) releases it.
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Result<Self, GujConvError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| GujConvError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout_secs,
        })
    }
}

#[async_trait]
impl FontConverter for HttpFontConverter {
    async fn convert_chunk(&self, chunk: &str) -> Result<ChunkReply, SendError> {
        let identity = pick_identity();
        debug!(endpoint = %self.endpoint, chars = chunk.chars().count(), "sending chunk");

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::USER_AGENT, identity)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.5")
            .form(&[(MODIFY_FIELD, chunk)])
            .send()
            .await
            .map_err(|e| classify_transport(e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| classify_transport(e, self.timeout_secs))?;

        Ok(decode_body(&bytes, chunk))
    }
}

/// Pick a user-agent pseudo-randomly from the fixed pool.
fn pick_identity() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Map a non-2xx status to its retryable failure category.
fn classify_status(status: u16) -> SendError {
    match status {
        403 | 429 => SendError::RateLimited { status },
        _ => SendError::Status { status },
    }
}

/// Map a reqwest transport error to its retryable failure category.
fn classify_transport(e: reqwest::Error, timeout_secs: u64) -> SendError {
    if e.is_timeout() {
        SendError::Timeout { secs: timeout_secs }
    } else {
        SendError::Network {
            detail: e.to_string(),
        }
    }
}

/// Decode and validate a 2xx body, substituting `chunk` on soft failure.
fn decode_body(bytes: &[u8], chunk: &str) -> ChunkReply {
    // The service declares no charset; assume UTF-8 and fall back to Latin-1
    // the way browsers historically did.
    let text = match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => decode_latin1(bytes),
    };

    if text.trim().is_empty() {
        warn!("empty response body, substituting original chunk");
        return ChunkReply {
            text: chunk.to_string(),
            substituted: true,
        };
    }

    if looks_corrupt(&text) {
        warn!("response contains control characters, attempting secondary decode");
        let alt = decode_latin1(bytes);
        if looks_corrupt(&alt) {
            warn!("secondary decode still corrupt, substituting original chunk");
            return ChunkReply {
                text: chunk.to_string(),
                substituted: true,
            };
        }
        return ChunkReply {
            text: alt,
            substituted: false,
        };
    }

    ChunkReply {
        text,
        substituted: false,
    }
}

/// Heuristic corruption sniff: control characters other than `\n` `\r` `\t`
/// within the first [`SNIFF_WINDOW`] characters.
fn looks_corrupt(text: &str) -> bool {
    text.chars()
        .take(SNIFF_WINDOW)
        .any(|c| (c as u32) < 32 && !matches!(c, '\n' | '\r' | '\t'))
}

/// Latin-1 decode: every byte maps to the code point of the same value.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
