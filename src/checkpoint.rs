//! Progress store: crash-resilient checkpoints keyed by output identity.
//!
//! A checkpoint records how many chunks finished and their converted texts,
//! so an interrupted job resumes without re-sending work (and without
//! re-annoying a rate-limiting service). The file lives next to the output
//! at `<output_id>.progress.json` and is written atomically — serialise to a
//! sibling temp file, then rename — so a reader never observes a partial
//! write. Exactly one checkpoint exists per output identity; every save
//! overwrites the last.
//!
//! Checkpointing is best-effort for resumability, not correctness-critical
//! for the current run: callers log persistence failures as warnings and
//! keep converting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Persisted snapshot of job progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Chunks fully converted so far.
    pub completed_chunks: usize,
    /// Total chunks in the job this checkpoint belongs to.
    pub total_chunks: usize,
    /// Converted text per completed chunk, in index order.
    pub results: Vec<String>,
    /// When this checkpoint was written (ISO-8601).
    pub timestamp: DateTime<Utc>,
}

impl Checkpoint {
    /// Internal consistency: one result per completed chunk, and completion
    /// never exceeds the total.
    pub fn is_consistent(&self) -> bool {
        self.results.len() == self.completed_chunks && self.completed_chunks <= self.total_chunks
    }
}

/// Path of the checkpoint file for an output identity.
pub fn checkpoint_path(output_id: &str) -> PathBuf {
    PathBuf::from(format!("{output_id}.progress.json"))
}

/// Write (or overwrite) the checkpoint for `output_id`.
pub async fn save(
    output_id: &str,
    completed_chunks: usize,
    total_chunks: usize,
    results: &[String],
) -> std::io::Result<()> {
    let checkpoint = Checkpoint {
        completed_chunks,
        total_chunks,
        results: results.to_vec(),
        timestamp: Utc::now(),
    };
    let json = serde_json::to_string_pretty(&checkpoint)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    let path = checkpoint_path(output_id);
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json.as_bytes()).await?;
    tokio::fs::rename(&tmp, &path).await?;

    debug!(
        "checkpoint saved: {completed_chunks}/{total_chunks} chunks -> {}",
        path.display()
    );
    Ok(())
}

/// Load the checkpoint for `output_id`, if one exists and is readable.
///
/// A missing file is a normal `None`; an unreadable or inconsistent file is
/// logged and also treated as `None` — a corrupt checkpoint must not stop a
/// fresh run.
pub async fn load(output_id: &str) -> Option<Checkpoint> {
    let path = checkpoint_path(output_id);
    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!("could not read checkpoint {}: {e}", path.display());
            return None;
        }
    };

    let checkpoint: Checkpoint = match serde_json::from_slice(&bytes) {
        Ok(c) => c,
        Err(e) => {
            warn!("ignoring malformed checkpoint {}: {e}", path.display());
            return None;
        }
    };

    if !checkpoint.is_consistent() {
        warn!(
            "ignoring inconsistent checkpoint {} ({} results for {}/{} chunks)",
            path.display(),
            checkpoint.results.len(),
            checkpoint.completed_chunks,
            checkpoint.total_chunks
        );
        return None;
    }

    Some(checkpoint)
}

/// Remove the checkpoint for `output_id`. Missing files are not an error.
pub async fn cleanup(output_id: &str) -> std::io::Result<()> {
    let path = checkpoint_path(output_id);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => {
            debug!("checkpoint removed: {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_output_id(dir: &tempfile::TempDir, name: &str) -> String {
        dir.path().join(name).to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let id = temp_output_id(&dir, "out.txt");

        let results = vec!["પહેલો".to_string(), "બીજો".to_string()];
        save(&id, 2, 5, &results).await.unwrap();

        let cp = load(&id).await.unwrap();
        assert_eq!(cp.completed_chunks, 2);
        assert_eq!(cp.total_chunks, 5);
        assert_eq!(cp.results, results);
        assert!(cp.is_consistent());
    }

    #[tokio::test]
    async fn load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(&temp_output_id(&dir, "never-saved.txt")).await.is_none());
    }

    #[tokio::test]
    async fn save_overwrites_previous_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let id = temp_output_id(&dir, "out.txt");

        save(&id, 1, 5, &["a".to_string()]).await.unwrap();
        save(&id, 3, 5, &["a".into(), "b".into(), "c".into()])
            .await
            .unwrap();

        let cp = load(&id).await.unwrap();
        assert_eq!(cp.completed_chunks, 3);
        assert_eq!(cp.results.len(), 3);
    }

    #[tokio::test]
    async fn cleanup_removes_file_and_tolerates_absence() {
        let dir = tempfile::tempdir().unwrap();
        let id = temp_output_id(&dir, "out.txt");

        save(&id, 1, 1, &["x".to_string()]).await.unwrap();
        assert!(checkpoint_path(&id).exists());

        cleanup(&id).await.unwrap();
        assert!(!checkpoint_path(&id).exists());

        // Second cleanup of the same id is a no-op, not an error.
        cleanup(&id).await.unwrap();
    }

    #[tokio::test]
    async fn malformed_checkpoint_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let id = temp_output_id(&dir, "out.txt");
        tokio::fs::write(checkpoint_path(&id), b"{ not json")
            .await
            .unwrap();
        assert!(load(&id).await.is_none());
    }

    #[tokio::test]
    async fn inconsistent_checkpoint_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let id = temp_output_id(&dir, "out.txt");
        // 3 results but only 1 claimed complete.
        let bad = serde_json::json!({
            "completed_chunks": 1,
            "total_chunks": 5,
            "results": ["a", "b", "c"],
            "timestamp": "2026-01-01T00:00:00Z",
        });
        tokio::fs::write(checkpoint_path(&id), bad.to_string())
            .await
            .unwrap();
        assert!(load(&id).await.is_none());
    }

    #[tokio::test]
    async fn no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let id = temp_output_id(&dir, "out.txt");
        save(&id, 1, 2, &["a".to_string()]).await.unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
