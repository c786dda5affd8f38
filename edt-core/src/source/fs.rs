//! Filesystem-backed track loader.
//!
//! Layout under the data directory:
//!
//! ```text
//! <data_dir>/<level>_<track>.ics          raw snapshot
//! <data_dir>/index/<level>_<track>.json   precomputed index
//! ```

use std::path::{Path, PathBuf};

use super::{Backend, TrackData, TrackKey, TrackLoader, parse_index};
use crate::constants::INDEX_DIR;
use crate::error::{EdtError, EdtResult};
use crate::ics::parse_events;

/// Prefers the index of a track and falls back to its raw snapshot.
#[derive(Debug, Clone)]
pub struct FsLoader {
    data_dir: PathBuf,
}

impl FsLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        FsLoader {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn index_path(&self, key: &TrackKey) -> PathBuf {
        self.data_dir.join(INDEX_DIR).join(format!("{key}.json"))
    }

    pub fn snapshot_path(&self, key: &TrackKey) -> PathBuf {
        self.data_dir.join(format!("{key}.ics"))
    }

    async fn load_index(&self, key: &TrackKey) -> EdtResult<Option<TrackData>> {
        let path = self.index_path(key);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(None);
        }
        let content = tokio::fs::read_to_string(&path).await?;
        let events = parse_index(&content)?;
        Ok(Some(TrackData::new(Backend::Index, events)))
    }

    async fn load_snapshot(&self, key: &TrackKey) -> EdtResult<TrackData> {
        let path = self.snapshot_path(key);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| unavailable(key, format!("{}: {e}", path.display())))?;
        let events = parse_events(&content).map_err(|e| unavailable(key, e.to_string()))?;
        Ok(TrackData::new(Backend::Raw, events))
    }
}

impl TrackLoader for FsLoader {
    async fn load(&self, key: &TrackKey) -> EdtResult<TrackData> {
        match self.load_index(key).await {
            Ok(Some(data)) => return Ok(data),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(track = %key, error = %e, "unreadable index, using raw snapshot");
            }
        }
        self.load_snapshot(key).await
    }
}

fn unavailable(key: &TrackKey, reason: String) -> EdtError {
    EdtError::TrackDataUnavailable {
        track: key.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:TEST\r\n\
BEGIN:VEVENT\r\n\
SUMMARY:MU4IN202-MOGPL-TD3\r\n\
DTSTART:20230123T083000Z\r\n\
DTEND:20230123T103000Z\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    const INDEX: &str = r#"[{"summary": "MU4IN202-MOGPL-TD3",
        "start": "2023-01-23T08:30:00Z", "end": "2023-01-23T10:30:00Z", "groups": [3]}]"#;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn test_index_is_preferred() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "M1_AND.ics", SNAPSHOT);
        write(dir.path(), "index/M1_AND.json", INDEX);

        let data = FsLoader::new(dir.path())
            .load(&TrackKey::new("M1", "AND"))
            .await
            .unwrap();
        assert_eq!(data.backend(), Backend::Index);
        assert_eq!(data.len(), 1);
    }

    #[tokio::test]
    async fn test_raw_snapshot_without_index() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "M1_AND.ics", SNAPSHOT);

        let data = FsLoader::new(dir.path())
            .load(&TrackKey::new("M1", "AND"))
            .await
            .unwrap();
        assert_eq!(data.backend(), Backend::Raw);
        assert_eq!(data.len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_index_falls_back_to_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "M1_AND.ics", SNAPSHOT);
        write(dir.path(), "index/M1_AND.json", "{oops");

        let data = FsLoader::new(dir.path())
            .load(&TrackKey::new("M1", "AND"))
            .await
            .unwrap();
        assert_eq!(data.backend(), Backend::Raw);
    }

    #[tokio::test]
    async fn test_missing_track_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();

        let result = FsLoader::new(dir.path())
            .load(&TrackKey::new("M2", "SAR"))
            .await;
        match result {
            Err(EdtError::TrackDataUnavailable { track, .. }) => assert_eq!(track, "M2_SAR"),
            other => panic!("Expected TrackDataUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_paths() {
        let loader = FsLoader::new("/srv/edt");
        let key = TrackKey::new("M1", "DAC");
        assert_eq!(loader.snapshot_path(&key), PathBuf::from("/srv/edt/M1_DAC.ics"));
        assert_eq!(
            loader.index_path(&key),
            PathBuf::from("/srv/edt/index/M1_DAC.json")
        );
    }
}
