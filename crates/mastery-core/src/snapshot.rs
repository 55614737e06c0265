//! On-disk persistence of the three keyed collections.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{QuestionRecord, StudentProgress, SubtopicAggregate};

/// Current snapshot layout version.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Point-in-time copy of every store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub format_version: u32,
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub questions: Vec<QuestionRecord>,
    #[serde(default)]
    pub aggregates: Vec<SubtopicAggregate>,
    #[serde(default)]
    pub students: Vec<StudentProgress>,
}

impl Default for StateSnapshot {
    fn default() -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            saved_at: Utc::now(),
            questions: Vec::new(),
            aggregates: Vec::new(),
            students: Vec::new(),
        }
    }
}

impl StateSnapshot {
    /// Write the snapshot as pretty JSON.
    ///
    /// The document goes to a sibling temp file first and is renamed over
    /// `path`, so readers never observe a half-written snapshot.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(self).context("failed to serialize snapshot")?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("failed to write snapshot: {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("failed to replace snapshot: {}", path.display()))?;
        Ok(())
    }

    /// Load a snapshot written by [`StateSnapshot::save_json`].
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot: {}", path.display()))?;
        let snapshot: StateSnapshot = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse snapshot: {}", path.display()))?;

        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            bail!(
                "unsupported snapshot format version {} in {} (expected {})",
                snapshot.format_version,
                path.display(),
                SNAPSHOT_FORMAT_VERSION
            );
        }
        Ok(snapshot)
    }

    /// Load the snapshot at `path`, or an empty one if the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_json(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("snapshot.json");

        let mut snapshot = StateSnapshot::default();
        snapshot.aggregates.push(SubtopicAggregate::new("T1", "U1"));
        snapshot.students.push(StudentProgress::new("S1"));
        snapshot.save_json(&path).unwrap();

        assert!(!path.with_extension("json.tmp").exists());
        let loaded = StateSnapshot::load_json(&path).unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn rejects_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(
            &path,
            r#"{"format_version": 99, "saved_at": "2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();

        let err = StateSnapshot::load_json(&path).unwrap_err();
        assert!(err.to_string().contains("format version 99"));
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = StateSnapshot::load_or_default(&dir.path().join("none.json")).unwrap();
        assert!(snapshot.questions.is_empty());
        assert_eq!(snapshot.format_version, SNAPSHOT_FORMAT_VERSION);
    }
}
