//! JSON-file session history.

use crate::paths::MockmatePaths;
use async_trait::async_trait;
use mockmate_core::error::Result;
use mockmate_core::history::{HISTORY_LIMIT, HistoryRepository, SessionHistoryRecord};
use std::path::PathBuf;
use tokio::sync::Mutex;

/// Keeps the newest [`HISTORY_LIMIT`] records, newest first, in one JSON
/// array.
///
/// Writes go to a sibling temp file that is then renamed over the original.
pub struct JsonHistoryRepository {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonHistoryRepository {
    pub fn new(paths: &MockmatePaths) -> Result<Self> {
        Ok(Self::with_path(paths.history_file()?))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    async fn read(&self) -> Result<Vec<SessionHistoryRecord>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str(&content) {
            Ok(records) => Ok(records),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "Unreadable history file, starting fresh");
                Ok(Vec::new())
            }
        }
    }

    async fn write(&self, records: &[SessionHistoryRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(records)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl HistoryRepository for JsonHistoryRepository {
    async fn list(&self) -> Result<Vec<SessionHistoryRecord>> {
        self.read().await
    }

    async fn append(&self, record: SessionHistoryRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.read().await?;
        records.insert(0, record);
        records.truncate(HISTORY_LIMIT);
        self.write(&records).await?;
        tracing::debug!(count = records.len(), "Saved session history");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockmate_core::interview::SessionType;
    use tempfile::TempDir;

    fn record(id: &str) -> SessionHistoryRecord {
        SessionHistoryRecord {
            id: id.to_string(),
            timestamp: "2026-01-05T10:00:00Z".to_string(),
            role: "SRE".to_string(),
            avg_score: 3.5,
            readiness_status: "ALMOST_READY".to_string(),
            biggest_risk: "Incident comms".to_string(),
            session_type: SessionType::Structured,
        }
    }

    #[tokio::test]
    async fn newest_first_and_capped() {
        let dir = TempDir::new().unwrap();
        let repo = JsonHistoryRepository::with_path(dir.path().join("history.json"));

        for i in 0..(HISTORY_LIMIT + 3) {
            repo.append(record(&format!("session_{i}"))).await.unwrap();
        }

        let records = repo.list().await.unwrap();
        assert_eq!(records.len(), HISTORY_LIMIT);
        assert_eq!(records[0].id, format!("session_{}", HISTORY_LIMIT + 2));
        assert_eq!(records.last().unwrap().id, "session_3");
    }

    #[tokio::test]
    async fn missing_or_corrupt_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        let repo = JsonHistoryRepository::with_path(path.clone());
        assert!(repo.list().await.unwrap().is_empty());

        std::fs::write(&path, "not json").unwrap();
        assert!(repo.list().await.unwrap().is_empty());
        repo.append(record("fresh")).await.unwrap();
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let dir = TempDir::new().unwrap();
        let repo = JsonHistoryRepository::with_path(dir.path().join("history.json"));
        repo.append(record("a")).await.unwrap();
        repo.clear().await.unwrap();
        repo.clear().await.unwrap();
        assert!(repo.list().await.unwrap().is_empty());
    }
}
