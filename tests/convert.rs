//! End-to-end pipeline tests with a scripted converter.
//!
//! The network seam (`FontConverter`) is injected through
//! `JobConfigBuilder::converter`, so these tests exercise chunking, retry,
//! checkpointing, resume, and assembly without any live HTTP. Delay bounds
//! are zero throughout; pacing maths is covered by unit tests in
//! `pipeline::pacing`.

use async_trait::async_trait;
use gujconv::{
    convert, convert_file, convert_file_with_cancel, convert_with_cancel, CancelToken, ChunkReply,
    ConversionProgressCallback, FontConverter, GujConvError, JobConfig, ResumeMode, SendError,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Test converters ──────────────────────────────────────────────────────────

/// Deterministic "conversion": wraps each chunk so the transform is visible
/// in the assembled output and order mistakes are obvious.
fn transform(chunk: &str) -> String {
    format!("[{chunk}]")
}

/// Converts every chunk with [`transform`], recording what it was sent.
struct Recording {
    calls: Mutex<Vec<String>>,
}

impl Recording {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FontConverter for Recording {
    async fn convert_chunk(&self, chunk: &str) -> Result<ChunkReply, SendError> {
        self.calls.lock().unwrap().push(chunk.to_string());
        Ok(ChunkReply {
            text: transform(chunk),
            substituted: false,
        })
    }
}

/// Fails permanently for any chunk containing `poison`; converts the rest.
struct PoisonedChunk {
    poison: &'static str,
}

#[async_trait]
impl FontConverter for PoisonedChunk {
    async fn convert_chunk(&self, chunk: &str) -> Result<ChunkReply, SendError> {
        if chunk.contains(self.poison) {
            Err(SendError::Status { status: 500 })
        } else {
            Ok(ChunkReply {
                text: transform(chunk),
                substituted: false,
            })
        }
    }
}

/// Simulates the service returning HTTP 200 with an empty body: the client
/// resolves that by substituting the original chunk.
struct EmptyBodyService;

#[async_trait]
impl FontConverter for EmptyBodyService {
    async fn convert_chunk(&self, chunk: &str) -> Result<ChunkReply, SendError> {
        Ok(ChunkReply {
            text: chunk.to_string(),
            substituted: true,
        })
    }
}

/// Cancels the provided token after `after` calls, then keeps converting.
struct CancellingConverter {
    token: CancelToken,
    after: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl FontConverter for CancellingConverter {
    async fn convert_chunk(&self, chunk: &str) -> Result<ChunkReply, SendError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n >= self.after {
            self.token.cancel();
        }
        Ok(ChunkReply {
            text: transform(chunk),
            substituted: false,
        })
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn config_with(converter: Arc<dyn FontConverter>) -> JobConfig {
    JobConfig::builder()
        .converter(converter)
        .delay_bounds(0.0, 0.0)
        .build()
        .unwrap()
}

fn checkpoint_file(output: &Path) -> PathBuf {
    PathBuf::from(format!("{}.progress.json", output.display()))
}

/// 450-char input: chunks of 200, 200, 50 at size 200.
fn scenario_text() -> String {
    format!("{}{}{}", "a".repeat(200), "b".repeat(200), "c".repeat(50))
}

// ── Interactive path ─────────────────────────────────────────────────────────

#[tokio::test]
async fn converts_chunks_in_order_and_reassembles() {
    let conv = Recording::new();
    let config = config_with(conv.clone());

    let output = convert(scenario_text(), &config).await.unwrap();

    assert_eq!(
        output.text,
        format!(
            "{}{}{}",
            transform(&"a".repeat(200)),
            transform(&"b".repeat(200)),
            transform(&"c".repeat(50))
        )
    );
    assert_eq!(output.stats.total_chunks, 3);
    assert_eq!(output.stats.converted_chunks, 3);
    assert_eq!(output.stats.fallback_chunks, 0);
    assert_eq!(output.stats.input_chars, 450);
    // Chunks must have been sent in index order.
    assert_eq!(
        conv.calls(),
        vec!["a".repeat(200), "b".repeat(200), "c".repeat(50)]
    );
}

#[tokio::test]
async fn empty_input_is_a_noop_completion() {
    let config = config_with(Recording::new());
    let output = convert("", &config).await.unwrap();
    assert_eq!(output.text, "");
    assert_eq!(output.stats.total_chunks, 0);
    assert!(output.chunks.is_empty());
}

#[tokio::test]
async fn empty_body_responses_fall_back_to_original_text() {
    let text = "ગુજરાતી ".repeat(40);
    let config = config_with(Arc::new(EmptyBodyService));

    let output = convert(&text, &config).await.unwrap();

    // Every chunk substituted, so the output equals the input.
    assert_eq!(output.text, text);
    assert!(output.chunks.iter().all(|c| c.used_fallback));
    assert_eq!(output.stats.fallback_chunks, output.stats.total_chunks);
    assert!(!output.is_complete());
}

#[tokio::test]
async fn interactive_policy_substitutes_failed_chunks_and_continues() {
    let config = config_with(Arc::new(PoisonedChunk { poison: "b" }));

    let output = convert(scenario_text(), &config).await.unwrap();

    // Chunk 1 (the b's) exhausted retries and was substituted verbatim.
    assert_eq!(
        output.text,
        format!(
            "{}{}{}",
            transform(&"a".repeat(200)),
            "b".repeat(200),
            transform(&"c".repeat(50))
        )
    );
    assert_eq!(output.stats.fallback_chunks, 1);
    assert!(output.chunks[1].used_fallback);
    assert!(output.chunks[1].error.is_some());
}

#[tokio::test]
async fn unknown_font_is_rejected_before_any_conversion() {
    let config = JobConfig::builder()
        .font("not-a-real-font")
        .delay_bounds(0.0, 0.0)
        .build()
        .unwrap();
    let err = convert("કંઈક", &config).await.unwrap_err();
    assert!(matches!(err, GujConvError::UnknownFont { .. }));
}

#[tokio::test]
async fn missing_converter_and_font_is_a_config_error() {
    let config = JobConfig::builder().delay_bounds(0.0, 0.0).build().unwrap();
    let err = convert("કંઈક", &config).await.unwrap_err();
    assert!(matches!(err, GujConvError::InvalidConfig(_)));
}

#[tokio::test]
async fn progress_events_fire_per_chunk_with_running_totals() {
    struct Totals {
        seen: Mutex<Vec<usize>>,
        job_totals: Mutex<Option<(usize, usize)>>,
    }
    impl ConversionProgressCallback for Totals {
        fn on_chunk_complete(&self, _i: usize, _t: usize, _text: &str, total_chars: usize) {
            self.seen.lock().unwrap().push(total_chars);
        }
        fn on_job_complete(&self, total: usize, converted: usize) {
            *self.job_totals.lock().unwrap() = Some((total, converted));
        }
    }

    let totals = Arc::new(Totals {
        seen: Mutex::new(Vec::new()),
        job_totals: Mutex::new(None),
    });
    let config = JobConfig::builder()
        .converter(Recording::new())
        .progress_callback(totals.clone())
        .delay_bounds(0.0, 0.0)
        .build()
        .unwrap();

    convert(scenario_text(), &config).await.unwrap();

    let seen = totals.seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 3);
    assert!(seen.windows(2).all(|w| w[0] < w[1]), "running count must grow: {seen:?}");
    assert_eq!(*totals.job_totals.lock().unwrap(), Some((3, 3)));
}

// ── Batch path: halt, checkpoint, resume ─────────────────────────────────────

#[tokio::test]
async fn batch_failure_halts_checkpoints_and_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.txt");
    let output = dir.path().join("output.txt");
    std::fs::write(&input, scenario_text()).unwrap();

    // The 50-char remainder (index 2) fails all retries.
    let config = config_with(Arc::new(PoisonedChunk { poison: "c" }));
    let err = convert_file(&input, &output, &config).await.unwrap_err();

    match err {
        GujConvError::ChunkFailed {
            index,
            offset,
            completed,
            total,
            ..
        } => {
            assert_eq!(index, 2);
            assert_eq!(offset, 400);
            assert_eq!(completed, 2);
            assert_eq!(total, 3);
        }
        other => panic!("expected ChunkFailed, got {other:?}"),
    }

    assert!(!output.exists(), "output must not be written on failure");

    let cp_path = checkpoint_file(&output);
    assert!(cp_path.exists(), "failure must checkpoint");
    let cp: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&cp_path).unwrap()).unwrap();
    assert_eq!(cp["completed_chunks"], 2);
    assert_eq!(cp["total_chunks"], 3);
    assert_eq!(cp["results"].as_array().unwrap().len(), 2);
    assert!(cp["timestamp"].is_string());
}

#[tokio::test]
async fn resume_processes_only_remaining_chunks() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.txt");
    let output = dir.path().join("output.txt");
    std::fs::write(&input, scenario_text()).unwrap();

    // First run halts at chunk 2.
    let failing = config_with(Arc::new(PoisonedChunk { poison: "c" }));
    convert_file(&input, &output, &failing).await.unwrap_err();

    // Second run with a healthy service resumes at chunk 2.
    let conv = Recording::new();
    let stats = convert_file(&input, &output, &config_with(conv.clone()))
        .await
        .unwrap();

    assert_eq!(conv.calls(), vec!["c".repeat(50)], "chunks 0 and 1 must not be re-sent");
    assert_eq!(stats.resumed_chunks, 2);
    assert_eq!(stats.total_chunks, 3);

    // Resumed output equals a from-scratch conversion.
    let written = std::fs::read_to_string(&output).unwrap();
    assert_eq!(
        written,
        format!(
            "{}{}{}",
            transform(&"a".repeat(200)),
            transform(&"b".repeat(200)),
            transform(&"c".repeat(50))
        )
    );

    assert!(!checkpoint_file(&output).exists(), "checkpoint must be cleaned up");
}

#[tokio::test]
async fn fresh_mode_discards_checkpoint_and_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.txt");
    let output = dir.path().join("output.txt");
    std::fs::write(&input, scenario_text()).unwrap();

    convert_file(&input, &output, &config_with(Arc::new(PoisonedChunk { poison: "c" })))
        .await
        .unwrap_err();
    assert!(checkpoint_file(&output).exists());

    let conv = Recording::new();
    let config = JobConfig::builder()
        .converter(conv.clone())
        .delay_bounds(0.0, 0.0)
        .resume(ResumeMode::Fresh)
        .build()
        .unwrap();
    convert_file(&input, &output, &config).await.unwrap();

    // All three chunks re-sent from chunk 0.
    assert_eq!(conv.calls().len(), 3);
}

#[tokio::test]
async fn successful_batch_job_removes_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.txt");
    let output = dir.path().join("output.txt");
    std::fs::write(&input, "ટૂંકું લખાણ").unwrap();

    let stats = convert_file(&input, &output, &config_with(Recording::new()))
        .await
        .unwrap();

    assert_eq!(stats.total_chunks, 1);
    assert!(output.exists());
    assert!(!checkpoint_file(&output).exists());
}

#[tokio::test]
async fn missing_input_file_reports_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = convert_file(
        dir.path().join("does-not-exist.txt"),
        dir.path().join("out.txt"),
        &config_with(Recording::new()),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, GujConvError::InputFileNotFound { .. }));
}

#[tokio::test]
async fn checkpoint_for_different_chunking_is_discarded() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.txt");
    let output = dir.path().join("output.txt");
    std::fs::write(&input, "x".repeat(300)).unwrap();

    // Stale checkpoint claiming a 10-chunk job.
    let stale = serde_json::json!({
        "completed_chunks": 4,
        "total_chunks": 10,
        "results": ["a", "b", "c", "d"],
        "timestamp": "2026-01-01T00:00:00Z",
    });
    std::fs::write(checkpoint_file(&output), stale.to_string()).unwrap();

    let conv = Recording::new();
    let stats = convert_file(&input, &output, &config_with(conv.clone()))
        .await
        .unwrap();

    // The mismatch forces a fresh start: both chunks of the 300-char input.
    assert_eq!(conv.calls().len(), 2);
    assert_eq!(stats.resumed_chunks, 0);
}

// ── Cancellation and exclusivity ─────────────────────────────────────────────

#[tokio::test]
async fn cancellation_checkpoints_and_reports_progress() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.txt");
    let output = dir.path().join("output.txt");
    std::fs::write(&input, scenario_text()).unwrap();

    let token = CancelToken::new();
    let converter = Arc::new(CancellingConverter {
        token: token.clone(),
        after: 2,
        calls: AtomicUsize::new(0),
    });
    let err = convert_file_with_cancel(&input, &output, &config_with(converter), &token)
        .await
        .unwrap_err();

    // Cancel was raised during chunk 1; observed before chunk 2 started.
    match err {
        GujConvError::Cancelled { completed, total } => {
            assert_eq!(completed, 2);
            assert_eq!(total, 3);
        }
        other => panic!("expected Cancelled, got {other:?}"),
    }
    assert!(!output.exists());

    let cp: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(checkpoint_file(&output)).unwrap()).unwrap();
    assert_eq!(cp["completed_chunks"], 2);
}

#[tokio::test]
async fn interactive_cancellation_reports_progress_without_checkpoint() {
    let token = CancelToken::new();
    let converter = Arc::new(CancellingConverter {
        token: token.clone(),
        after: 1,
        calls: AtomicUsize::new(0),
    });
    let err = convert_with_cancel(scenario_text(), &config_with(converter), &token)
        .await
        .unwrap_err();
    assert!(matches!(err, GujConvError::Cancelled { completed: 1, total: 3 }));
}

#[tokio::test]
async fn second_job_for_same_output_is_rejected() {
    use tokio::sync::Semaphore;

    struct Gated {
        gate: Arc<Semaphore>,
    }

    #[async_trait]
    impl FontConverter for Gated {
        async fn convert_chunk(&self, chunk: &str) -> Result<ChunkReply, SendError> {
            let _permit = self.gate.acquire().await.map_err(|_| SendError::Network {
                detail: "gate closed".into(),
            })?;
            Ok(ChunkReply {
                text: transform(chunk),
                substituted: false,
            })
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.txt");
    let output = dir.path().join("output.txt");
    std::fs::write(&input, scenario_text()).unwrap();

    let gate = Arc::new(Semaphore::new(0));
    let first = {
        let config = config_with(Arc::new(Gated { gate: gate.clone() }));
        let (input, output) = (input.clone(), output.clone());
        tokio::spawn(async move { convert_file(&input, &output, &config).await })
    };

    // Let the first job claim its identity and block on the gate.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let err = convert_file(&input, &output, &config_with(Recording::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, GujConvError::JobAlreadyRunning { .. }));

    // Release the first job; it must now run to completion.
    gate.add_permits(100);
    first.await.unwrap().unwrap();
    assert!(output.exists());
}
