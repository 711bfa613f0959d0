use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use factify_core::types::AnalysisKind;
use serde::{Deserialize, Serialize};

/// One finished analysis as remembered on this machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub ts_unix_ms: i64,
    pub kind: AnalysisKind,
    #[serde(default)]
    pub task_id: Option<String>,
    pub input_summary: String,
    pub outcome: String,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    max_entries: usize,
}

impl HistoryStore {
    pub fn at_path(path: PathBuf) -> Self {
        Self {
            path,
            max_entries: 200,
        }
    }

    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max.max(1);
        self
    }

    pub fn load(&self) -> anyhow::Result<Vec<HistoryEntry>> {
        if !self.path.exists() {
            return Ok(vec![]);
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read history: {}", self.path.display()))?;
        let entries: Vec<HistoryEntry> = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse history: {}", self.path.display()))?;
        Ok(entries)
    }

    /// Appends and drops the oldest entries beyond the limit.
    pub fn append(&self, entry: HistoryEntry) -> anyhow::Result<()> {
        let mut entries = self.load()?;
        entries.push(entry);
        if entries.len() > self.max_entries {
            let start = entries.len() - self.max_entries;
            entries = entries.split_off(start);
        }

        let json = serde_json::to_string_pretty(&entries).context("encode history JSON")?;
        crate::fs::write_replacing(&self.path, json.as_bytes())
            .with_context(|| format!("failed to replace history: {}", self.path.display()))
    }

    pub fn clear(&self) -> anyhow::Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("failed to remove history: {}", self.path.display()))?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ts: i64, summary: &str) -> HistoryEntry {
        HistoryEntry {
            ts_unix_ms: ts,
            kind: AnalysisKind::AiDetection,
            task_id: Some(format!("t{ts}")),
            input_summary: summary.into(),
            outcome: "done".into(),
            error: None,
        }
    }

    #[test]
    fn appends_and_limits_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::at_path(dir.path().join("history.json")).with_max_entries(2);

        store.append(entry(1, "a")).unwrap();
        store.append(entry(2, "b")).unwrap();
        store.append(entry(3, "c")).unwrap();

        let entries = store.load().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].input_summary, "b");
        assert_eq!(entries[1].input_summary, "c");
    }

    #[test]
    fn clear_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::at_path(dir.path().join("history.json"));

        store.append(entry(1, "a")).unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_empty());
        store.clear().unwrap();
    }

    #[test]
    fn reads_entries_without_optional_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(
            &path,
            r#"[{"ts_unix_ms":5,"kind":"find_sources","input_summary":"x","outcome":"failed"}]"#,
        )
        .unwrap();

        let entries = HistoryStore::at_path(path).load().unwrap();
        assert_eq!(entries[0].kind, AnalysisKind::FindSources);
        assert!(entries[0].task_id.is_none());
    }
}
