//! The last note set we managed to load, kept on disk for the next time the
//! database can't be reached.

use super::models::Note;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct Snapshot {
    path: PathBuf,
}

impl Snapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when no snapshot has been written yet.
    pub async fn read(&self) -> Result<Option<Vec<Note>>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("reading snapshot {}", self.path.display())
                })
            }
        };
        let notes = serde_json::from_slice(&bytes).with_context(|| {
            format!("parsing snapshot {}", self.path.display())
        })?;

        Ok(Some(notes))
    }

    /// Write to a sibling temp file first, so a crash mid-write leaves the
    /// previous snapshot intact.
    pub async fn write(&self, notes: &[Note]) -> Result<()> {
        let json = serde_json::to_vec(notes)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("writing snapshot {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path).await.with_context(|| {
            format!("replacing snapshot {}", self.path.display())
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn note(title: &str) -> Note {
        let now = Utc::now();
        Note {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: "body".to_string(),
            tags: vec!["t".to_string()],
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_missing_snapshot_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = Snapshot::new(dir.path().join("notes_backup.json"));
        assert!(snapshot.read().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = Snapshot::new(dir.path().join("notes_backup.json"));
        let notes = vec![note("one"), note("two")];
        snapshot.write(&notes).await.unwrap();
        snapshot.write(&notes[..1]).await.unwrap();

        let read = snapshot.read().await.unwrap().expect("snapshot");
        assert_eq!(read, notes[..1].to_vec());
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes_backup.json");
        std::fs::write(&path, b"{not json").unwrap();
        assert!(Snapshot::new(path).read().await.is_err());
    }
}
