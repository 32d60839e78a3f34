//! Pipeline orchestrator: chunk, convert in order, checkpoint, assemble.
//!
//! ## Job lifecycle
//!
//! ```text
//! Idle ─▶ Chunking ─▶ Converting(i) ─▶ {Checkpointing, Converting(i+1)}
//!                          │                         │
//!                          ▼                         ▼
//!                       Failed                  Assembling ─▶ Completed
//! ```
//!
//! Chunks are processed strictly sequentially: output ordering depends on
//! in-order completion, and the remote service's implicit rate limits make
//! concurrent fan-out counterproductive (it raises the ban risk without
//! making the paced pipeline faster). Entering `Converting(i)` requires all
//! results for indices below `i`; the final text is the ordered
//! concatenation of every chunk result with no gaps.
//!
//! Two entry-point families exist, mirroring the two exhaustion policies:
//! [`convert`] (interactive: substitute on exhaustion, no checkpointing) and
//! [`convert_file`] (batch: halt on exhaustion, checkpoint/resume keyed by
//! the output path). Both copy the [`JobConfig`] at start and never read
//! live state from the caller during the run.

use crate::checkpoint;
use crate::config::{JobConfig, ResumeMode};
use crate::error::GujConvError;
use crate::fonts;
use crate::output::{ChunkResult, ConversionOutput, ConversionStats};
use crate::pipeline::chunk::chunk_text;
use crate::pipeline::client::{FontConverter, HttpFontConverter};
use crate::pipeline::pacing::PacingPolicy;
use crate::pipeline::retry::{convert_with_retry, ExhaustionPolicy};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, warn};

// ── Cancellation ─────────────────────────────────────────────────────────

/// Cooperative cancellation flag.
///
/// Checked between chunks, never mid-request: an in-flight request is
/// allowed to finish so its result is not wasted. On cancellation a batch
/// job writes a checkpoint before stopping, so the work is resumable.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The job stops before its next chunk.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ── One job per output identity ──────────────────────────────────────────

static ACTIVE_JOBS: Lazy<Mutex<HashSet<String>>> = Lazy::new(|| Mutex::new(HashSet::new()));

/// Registry entry held for the lifetime of a batch job.
///
/// Dropping the guard releases the identity on every exit path — success,
/// failure, cancellation, or panic unwind.
struct JobGuard {
    output_id: String,
}

impl JobGuard {
    /// Claim `output_id`, rejecting synchronously if a job already holds it.
    fn acquire(output_id: &str) -> Result<Self, GujConvError> {
        let mut active = ACTIVE_JOBS
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !active.insert(output_id.to_string()) {
            return Err(GujConvError::JobAlreadyRunning {
                output_id: output_id.to_string(),
            });
        }
        Ok(Self {
            output_id: output_id.to_string(),
        })
    }
}

impl Drop for JobGuard {
    fn drop(&mut self) {
        let mut active = ACTIVE_JOBS
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        active.remove(&self.output_id);
    }
}

// ── Job state machine ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobState {
    Idle,
    Chunking,
    Converting(usize),
    Checkpointing(usize),
    Assembling,
    Completed,
    Failed,
}

fn enter(state: &mut JobState, next: JobState) {
    debug!("job state: {:?} -> {:?}", *state, next);
    *state = next;
}

// ── Public entry points ──────────────────────────────────────────────────

/// Convert a string of Gujarati Unicode text (interactive path).
///
/// Uses the substitute-on-exhaustion policy: a chunk that fails every retry
/// comes back as its original text with
/// [`crate::output::ChunkResult::used_fallback`] set, and the job keeps
/// going. No checkpoints are written — interactive sessions hold their
/// progress in memory and report it via the configured progress callback.
///
/// # Errors
/// Only fatal errors: invalid configuration or an unknown font key.
pub async fn convert(
    text: impl AsRef<str>,
    config: &JobConfig,
) -> Result<ConversionOutput, GujConvError> {
    convert_with_cancel(text, config, &CancelToken::new()).await
}

/// [`convert`] with a cooperative cancellation token.
///
/// Cancellation is observed between chunks; the partial results are
/// discarded (interactive jobs have no checkpoint identity) and
/// [`GujConvError::Cancelled`] reports how far the job got.
pub async fn convert_with_cancel(
    text: impl AsRef<str>,
    config: &JobConfig,
    cancel: &CancelToken,
) -> Result<ConversionOutput, GujConvError> {
    let config = config.clone();
    let converter = resolve_converter(&config)?;
    run_job(
        text.as_ref(),
        &config,
        converter,
        ExhaustionPolicy::Substitute,
        None,
        cancel,
    )
    .await
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    text: impl AsRef<str>,
    config: &JobConfig,
) -> Result<ConversionOutput, GujConvError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| GujConvError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(convert(text, config))
}

/// Convert a text file to a legacy-font output file (batch path).
///
/// Uses the halt-on-exhaustion policy: a chunk that fails every retry stops
/// the job with [`GujConvError::ChunkFailed`], after writing a checkpoint so
/// a re-run resumes from the failure point. Progress checkpoints are keyed
/// by the output path and also written every
/// [`JobConfig::checkpoint_interval`] chunks; on success the output is
/// written atomically and the checkpoint removed.
pub async fn convert_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &JobConfig,
) -> Result<ConversionStats, GujConvError> {
    convert_file_with_cancel(input_path, output_path, config, &CancelToken::new()).await
}

/// [`convert_file`] with a cooperative cancellation token.
pub async fn convert_file_with_cancel(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &JobConfig,
    cancel: &CancelToken,
) -> Result<ConversionStats, GujConvError> {
    let config = config.clone();
    let input_path = input_path.as_ref();
    let output_path = output_path.as_ref();
    let output_id = output_path.to_string_lossy().into_owned();

    // Reject a concurrent job for the same output before any I/O.
    let _guard = JobGuard::acquire(&output_id)?;
    let converter = resolve_converter(&config)?;

    let text = read_input(input_path).await?;
    info!(
        "batch conversion: {} -> {} ({} chars)",
        input_path.display(),
        output_path.display(),
        text.chars().count()
    );

    let output = run_job(
        &text,
        &config,
        converter,
        ExhaustionPolicy::Halt,
        Some(&output_id),
        cancel,
    )
    .await?;

    write_output(output_path, &output.text).await?;

    // Only after the output exists on disk is the checkpoint disposable.
    if let Err(e) = checkpoint::cleanup(&output_id).await {
        warn!("could not remove checkpoint for '{output_id}': {e}");
    }

    Ok(output.stats)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Resolve the chunk converter, from most-specific to least-specific:
///
/// 1. **Pre-built converter** (`config.converter`) — used as-is; the test
///    seam, and the hook for caching or middleware wrappers.
/// 2. **Explicit endpoint URL** (`config.endpoint`) — an HTTP converter
///    against that URL.
/// 3. **Font key** (`config.font_key`) — resolved through the catalog; an
///    unknown key is a configuration error, never a silent default.
fn resolve_converter(config: &JobConfig) -> Result<Arc<dyn FontConverter>, GujConvError> {
    if let Some(ref converter) = config.converter {
        return Ok(Arc::clone(converter));
    }
    if let Some(ref url) = config.endpoint {
        return Ok(Arc::new(HttpFontConverter::new(
            url.clone(),
            config.request_timeout_secs,
        )?));
    }
    if let Some(ref key) = config.font_key {
        let font = fonts::font_info(key)?;
        info!("font: {} ({}) via {}", font.name, font.key, font.endpoint);
        return Ok(Arc::new(HttpFontConverter::new(
            font.endpoint,
            config.request_timeout_secs,
        )?));
    }
    Err(GujConvError::InvalidConfig(
        "No font key or endpoint configured".into(),
    ))
}

async fn read_input(path: &Path) -> Result<String, GujConvError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(GujConvError::InputFileNotFound {
                path: path.to_path_buf(),
            })
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(GujConvError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(e) => Err(GujConvError::Internal(format!(
            "reading '{}': {e}",
            path.display()
        ))),
    }
}

/// Atomic output write: temp file + rename, so a crash never leaves a
/// half-written result that looks complete.
async fn write_output(path: &Path, text: &str) -> Result<(), GujConvError> {
    let io_err = |source| GujConvError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
    }
    let tmp = path.with_extension("txt.tmp");
    tokio::fs::write(&tmp, text).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
    Ok(())
}

/// Drive one conversion job end to end.
///
/// `output_id` keys checkpointing; `None` (interactive) disables it.
async fn run_job(
    text: &str,
    config: &JobConfig,
    converter: Arc<dyn FontConverter>,
    policy: ExhaustionPolicy,
    output_id: Option<&str>,
    cancel: &CancelToken,
) -> Result<ConversionOutput, GujConvError> {
    let job_start = Instant::now();
    let pacing = PacingPolicy::new(config.min_delay_secs, config.max_delay_secs);
    let mut state = JobState::Idle;

    enter(&mut state, JobState::Chunking);
    let chunks = chunk_text(text, config.chunk_size);
    let total = chunks.len();
    info!("input split into {total} chunks of <= {} chars", config.chunk_size);

    if chunks.is_empty() {
        // Empty input is an immediate no-op completion, not an error.
        enter(&mut state, JobState::Completed);
        notify(config, |cb| cb.on_job_start(0));
        notify(config, |cb| cb.on_job_complete(0, 0));
        return Ok(ConversionOutput {
            text: String::new(),
            chunks: Vec::new(),
            stats: ConversionStats::default(),
        });
    }

    // Resume: seed results from a prior checkpoint when one matches this job.
    let (mut results, start_index) = restore_progress(config, output_id, total).await;
    let resumed = start_index;

    notify(config, |cb| cb.on_job_start(total));

    let mut chunk_results: Vec<ChunkResult> = Vec::with_capacity(total - start_index);
    let mut running_chars: usize = results.iter().map(|r| r.chars().count()).sum();

    for chunk in &chunks[start_index..] {
        if cancel.is_cancelled() {
            info!("cancellation observed before chunk {}", chunk.index);
            checkpoint_progress(output_id, chunk.index, total, &results).await;
            enter(&mut state, JobState::Failed);
            return Err(GujConvError::Cancelled {
                completed: chunk.index,
                total,
            });
        }

        enter(&mut state, JobState::Converting(chunk.index));
        notify(config, |cb| cb.on_chunk_start(chunk.index, total));

        let result =
            convert_with_retry(converter.as_ref(), &pacing, chunk, config.max_retries, policy)
                .await;

        match result {
            Ok(res) => {
                if let Some(ref err) = res.error {
                    notify(config, |cb| cb.on_chunk_error(chunk.index, total, &err.to_string()));
                }
                running_chars += res.text.chars().count();
                notify(config, |cb| {
                    cb.on_chunk_complete(chunk.index, total, &res.text, running_chars)
                });
                results.push(res.text.clone());
                chunk_results.push(res);

                let completed = chunk.index + 1;
                if completed % config.checkpoint_interval == 0 && completed < total {
                    enter(&mut state, JobState::Checkpointing(completed));
                    checkpoint_progress(output_id, completed, total, &results).await;
                }
            }
            Err(exhausted) => {
                notify(config, |cb| cb.on_chunk_error(chunk.index, total, &exhausted.detail));
                // Unconditional checkpoint on terminal failure, so the
                // resumed run starts exactly at this chunk.
                checkpoint_progress(output_id, chunk.index, total, &results).await;
                enter(&mut state, JobState::Failed);
                return Err(GujConvError::ChunkFailed {
                    index: chunk.index,
                    offset: chunk.offset,
                    attempts: exhausted.attempts,
                    detail: exhausted.detail,
                    completed: chunk.index,
                    total,
                });
            }
        }
    }

    enter(&mut state, JobState::Assembling);
    debug_assert_eq!(results.len(), total, "assembly requires a result per chunk");
    let final_text: String = results.concat();

    let converted = chunk_results.iter().filter(|c| !c.used_fallback).count();
    let fallbacks = chunk_results.iter().filter(|c| c.used_fallback).count();
    let stats = ConversionStats {
        total_chunks: total,
        converted_chunks: converted,
        fallback_chunks: fallbacks,
        resumed_chunks: resumed,
        input_chars: text.chars().count(),
        output_chars: final_text.chars().count(),
        total_duration_ms: job_start.elapsed().as_millis() as u64,
    };

    info!(
        "conversion complete: {}/{} chunks converted ({} substituted, {} resumed), {}ms",
        converted, total, fallbacks, resumed, stats.total_duration_ms
    );
    notify(config, |cb| cb.on_job_complete(total, converted));
    enter(&mut state, JobState::Completed);

    Ok(ConversionOutput {
        text: final_text,
        chunks: chunk_results,
        stats,
    })
}

/// Load prior progress for this job, honouring [`ResumeMode`].
///
/// Returns the seeded results and the first chunk index left to convert.
async fn restore_progress(
    config: &JobConfig,
    output_id: Option<&str>,
    total: usize,
) -> (Vec<String>, usize) {
    let Some(id) = output_id else {
        return (Vec::new(), 0);
    };

    match config.resume {
        ResumeMode::Fresh => {
            // Declined resume: the old checkpoint is dead weight; drop it so
            // the first new save overwrites rather than merges.
            if let Err(e) = checkpoint::cleanup(id).await {
                warn!("could not discard checkpoint for '{id}': {e}");
            }
            (Vec::new(), 0)
        }
        ResumeMode::Resume => match checkpoint::load(id).await {
            Some(cp) if cp.total_chunks == total => {
                info!(
                    "resuming from checkpoint: {}/{} chunks done at {}",
                    cp.completed_chunks, cp.total_chunks, cp.timestamp
                );
                let start = cp.completed_chunks;
                (cp.results, start)
            }
            Some(cp) => {
                warn!(
                    "checkpoint covers {} chunks but current input has {}; starting fresh",
                    cp.total_chunks, total
                );
                (Vec::new(), 0)
            }
            None => (Vec::new(), 0),
        },
    }
}

/// Best-effort checkpoint write; persistence failure is a warning, never a
/// job failure.
async fn checkpoint_progress(output_id: Option<&str>, completed: usize, total: usize, results: &[String]) {
    let Some(id) = output_id else { return };
    match checkpoint::save(id, completed, total, results).await {
        Ok(()) => info!("progress saved: {completed}/{total} chunks"),
        Err(e) => warn!("could not save checkpoint for '{id}': {e}"),
    }
}

fn notify(config: &JobConfig, f: impl FnOnce(&dyn crate::progress::ConversionProgressCallback)) {
    if let Some(ref cb) = config.progress_callback {
        f(cb.as_ref());
    }
}
