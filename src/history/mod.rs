//! Per-session expression history persistence.

use std::{fs, path::PathBuf};

use anyhow::Result;

use crate::config::Config;

/// Stores the expressions a session has executed, one JSON file per session
/// id, truncated to a configured length.
#[derive(Debug, Clone)]
pub struct ExpressionHistory {
    length: usize,
    storage_path: PathBuf,
}

impl ExpressionHistory {
    pub fn from_config(cfg: &Config) -> Self {
        let len = cfg
            .get("HISTORY_LENGTH")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(100);
        let path = cfg.history_path();
        let _ = fs::create_dir_all(&path);
        Self { length: len, storage_path: path }
    }

    fn file_path(&self, session_id: &str) -> PathBuf {
        self.storage_path.join(session_id)
    }

    pub fn exists(&self, session_id: &str) -> bool {
        self.file_path(session_id).exists()
    }

    pub fn invalidate(&self, session_id: &str) {
        let _ = fs::remove_file(self.file_path(session_id));
    }

    pub fn read(&self, session_id: &str) -> Result<Vec<String>> {
        let p = self.file_path(session_id);
        if !p.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(p)?;
        let expressions: Vec<String> = serde_json::from_str(&text)?;
        Ok(expressions)
    }

    pub fn write(&self, session_id: &str, mut expressions: Vec<String>) -> Result<()> {
        // Keep only the newest `length` expressions.
        if expressions.len() > self.length {
            let drop = expressions.len() - self.length;
            expressions.drain(0..drop);
        }

        let p = self.file_path(session_id);
        fs::write(p, serde_json::to_string(&expressions)?)?;
        Ok(())
    }

    /// Append one executed expression to a session, skipping immediate
    /// repeats.
    pub fn append(&self, session_id: &str, expression: &str) -> Result<()> {
        let mut expressions = self.read(session_id)?;
        if expressions.last().map(|s| s.as_str()) != Some(expression) {
            expressions.push(expression.to_string());
        }
        self.write(session_id, expressions)
    }

    pub fn list(&self) -> Vec<PathBuf> {
        if let Ok(read_dir) = fs::read_dir(&self.storage_path) {
            let mut files: Vec<PathBuf> =
                read_dir.filter_map(|e| e.ok().map(|e| e.path())).collect();
            files.sort_by_key(|p| fs::metadata(p).and_then(|m| m.modified()).ok());
            files
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_in(dir: &std::path::Path, length: usize) -> ExpressionHistory {
        ExpressionHistory { length, storage_path: dir.to_path_buf() }
    }

    #[test]
    fn append_and_read_round_trip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let history = history_in(dir.path(), 100);

        history.append("s1", "a := get(\"1104\")")?;
        history.append("s1", "b := a + 1")?;

        assert_eq!(
            history.read("s1")?,
            vec!["a := get(\"1104\")".to_string(), "b := a + 1".to_string()]
        );
        Ok(())
    }

    #[test]
    fn append_skips_immediate_repeats() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let history = history_in(dir.path(), 100);

        history.append("s1", "x := 1")?;
        history.append("s1", "x := 1")?;

        assert_eq!(history.read("s1")?.len(), 1);
        Ok(())
    }

    #[test]
    fn write_truncates_to_length() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let history = history_in(dir.path(), 3);

        for i in 0..5 {
            history.append("s1", &format!("x := {}", i))?;
        }

        let kept = history.read("s1")?;
        assert_eq!(kept, vec!["x := 2", "x := 3", "x := 4"]);
        Ok(())
    }

    #[test]
    fn missing_session_reads_empty() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let history = history_in(dir.path(), 100);

        assert!(history.read("nope")?.is_empty());
        assert!(!history.exists("nope"));
        Ok(())
    }

    #[test]
    fn invalidate_removes_the_session_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let history = history_in(dir.path(), 100);

        history.append("s1", "x := 1")?;
        assert!(history.exists("s1"));
        history.invalidate("s1");
        assert!(!history.exists("s1"));
        Ok(())
    }
}
