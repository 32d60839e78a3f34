//! Configuration types for a conversion job.
//!
//! All job behaviour is controlled through [`JobConfig`], built via its
//! [`JobConfigBuilder`]. A job copies the config at start and never reads it
//! live afterwards, so two concurrent jobs can never interfere through shared
//! tunables.
//!
//! # Design choice: builder over constructor
//! The builder lets callers set only what they care about and rely on
//! documented defaults for the rest, and it gives validation a single choke
//! point: delay bounds and chunk size are checked in [`JobConfigBuilder::build`],
//! before any network activity.

use crate::error::GujConvError;
use crate::pipeline::chunk::MAX_CHUNK_SIZE;
use crate::pipeline::client::FontConverter;
use crate::progress::ConversionProgressCallback;
use std::fmt;
use std::sync::Arc;

/// Configuration for a Unicode-to-legacy-font conversion job.
///
/// Built via [`JobConfig::builder()`] or [`JobConfig::default()`].
///
/// # Example
/// ```rust
/// use gujconv::JobConfig;
///
/// let config = JobConfig::builder()
///     .font("shree0768")
///     .delay_bounds(2.0, 5.0)
///     .chunk_size(200)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct JobConfig {
    /// Maximum characters per chunk. Range: 1–200. Default: 200.
    ///
    /// 200 is the remote service's documented request cap — larger payloads
    /// risk truncation or outright rejection on the server side, so this is
    /// a hard external constraint rather than a tunable optimisation.
    pub chunk_size: usize,

    /// Minimum seconds to wait before each request. Default: 2.0.
    ///
    /// The service rate-limits and bans clients that hammer it. Pacing every
    /// request with a uniform random delay in `[min_delay_secs,
    /// max_delay_secs]` keeps the request pattern irregular enough to avoid
    /// tripping fixed-interval abuse detection.
    pub min_delay_secs: f64,

    /// Maximum seconds to wait before each request. Default: 5.0.
    pub max_delay_secs: f64,

    /// Maximum attempts per chunk on transient failure. Default: 3.
    ///
    /// Retries use exponential backoff: the uniform pacing draw is multiplied
    /// by `2^attempt`, growing without bound so a client that is being
    /// rate-limited backs off aggressively rather than digging in.
    pub max_retries: u32,

    /// Write a progress checkpoint every N completed chunks. Default: 5.
    ///
    /// A failed chunk always checkpoints regardless of cadence, so an
    /// interrupted batch job never re-sends more than N-1 converted chunks.
    pub checkpoint_interval: usize,

    /// Per-request HTTP timeout in seconds. Default: 30.
    pub request_timeout_secs: u64,

    /// Font catalog key selecting the endpoint, e.g. `"shree0768"`.
    ///
    /// Resolved against [`crate::fonts`] at job start; an unknown key is a
    /// configuration error, never a silent default.
    pub font_key: Option<String>,

    /// Explicit endpoint URL. Takes precedence over `font_key`.
    pub endpoint: Option<String>,

    /// Pre-constructed converter. Takes precedence over both `endpoint` and
    /// `font_key`. Primarily a test seam, but also lets callers wrap the
    /// HTTP converter with caching or custom middleware.
    pub converter: Option<Arc<dyn FontConverter>>,

    /// Progress callback invoked after every chunk. Default: none.
    pub progress_callback: Option<Arc<dyn ConversionProgressCallback>>,

    /// Whether a batch job resumes from an existing checkpoint. Default: resume.
    pub resume: ResumeMode,
}

/// What to do when a batch job finds a checkpoint for its output identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResumeMode {
    /// Skip already-converted chunks and seed results from the checkpoint. (default)
    #[default]
    Resume,
    /// Discard the checkpoint and restart from chunk 0.
    Fresh,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            chunk_size: MAX_CHUNK_SIZE,
            min_delay_secs: 2.0,
            max_delay_secs: 5.0,
            max_retries: 3,
            checkpoint_interval: 5,
            request_timeout_secs: 30,
            font_key: None,
            endpoint: None,
            converter: None,
            progress_callback: None,
            resume: ResumeMode::Resume,
        }
    }
}

impl fmt::Debug for JobConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobConfig")
            .field("chunk_size", &self.chunk_size)
            .field("min_delay_secs", &self.min_delay_secs)
            .field("max_delay_secs", &self.max_delay_secs)
            .field("max_retries", &self.max_retries)
            .field("checkpoint_interval", &self.checkpoint_interval)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("font_key", &self.font_key)
            .field("endpoint", &self.endpoint)
            .field("converter", &self.converter.as_ref().map(|_| "<dyn FontConverter>"))
            .field("resume", &self.resume)
            .finish()
    }
}

impl JobConfig {
    /// Create a new builder for `JobConfig`.
    pub fn builder() -> JobConfigBuilder {
        JobConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`JobConfig`].
#[derive(Debug)]
pub struct JobConfigBuilder {
    config: JobConfig,
}

impl JobConfigBuilder {
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set both pacing bounds at once.
    pub fn delay_bounds(mut self, min_secs: f64, max_secs: f64) -> Self {
        self.config.min_delay_secs = min_secs;
        self.config.max_delay_secs = max_secs;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn checkpoint_interval(mut self, n: usize) -> Self {
        self.config.checkpoint_interval = n;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn font(mut self, key: impl Into<String>) -> Self {
        self.config.font_key = Some(key.into());
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = Some(url.into());
        self
    }

    pub fn converter(mut self, converter: Arc<dyn FontConverter>) -> Self {
        self.config.converter = Some(converter);
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn ConversionProgressCallback>) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn resume(mut self, mode: ResumeMode) -> Self {
        self.config.resume = mode;
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// # Errors
    /// [`GujConvError::InvalidConfig`] when delay bounds are negative,
    /// inverted, or non-finite, when the chunk size is zero or exceeds
    /// [`MAX_CHUNK_SIZE`], or when `max_retries` or `checkpoint_interval`
    /// is zero.
    pub fn build(self) -> Result<JobConfig, GujConvError> {
        let c = &self.config;
        if !c.min_delay_secs.is_finite() || !c.max_delay_secs.is_finite() {
            return Err(GujConvError::InvalidConfig(
                "Delay bounds must be finite".into(),
            ));
        }
        if c.min_delay_secs < 0.0 || c.min_delay_secs > c.max_delay_secs {
            return Err(GujConvError::InvalidConfig(format!(
                "Delay bounds must satisfy 0 <= min <= max, got {}..{}",
                c.min_delay_secs, c.max_delay_secs
            )));
        }
        if c.chunk_size == 0 || c.chunk_size > MAX_CHUNK_SIZE {
            return Err(GujConvError::InvalidConfig(format!(
                "Chunk size must be 1-{MAX_CHUNK_SIZE} characters, got {}",
                c.chunk_size
            )));
        }
        if c.max_retries == 0 {
            return Err(GujConvError::InvalidConfig("max_retries must be >= 1".into()));
        }
        if c.checkpoint_interval == 0 {
            return Err(GujConvError::InvalidConfig(
                "checkpoint_interval must be >= 1".into(),
            ));
        }
        Ok(self.config)
    }
}
