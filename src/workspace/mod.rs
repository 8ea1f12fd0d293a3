//! Session-wide dataset state.
//!
//! One entry per dataset name, plus the name list and error of the most
//! recent evaluation. All mutation goes through whole-entry or whole-map
//! replacement; nothing updates an entry field by field.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::gateway::ServiceError;
use crate::model::Variable;

/// Everything currently known about one named dataset.
///
/// An entry holds at most one of row data, structure, or an error; whichever
/// operation completed last for the name wins outright.
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetEntry {
    /// Named by an evaluation result, nothing fetched yet.
    Unloaded,
    /// Row data fetched and held.
    Loaded { data: Value },
    /// Structural metadata fetched and held.
    StructureLoaded { variables: Vec<Variable> },
    /// The most recent fetch for this name failed.
    Failed { error: ServiceError },
}

impl DatasetEntry {
    /// One-word state label for listings and status lines.
    pub fn state_label(&self) -> &'static str {
        match self {
            DatasetEntry::Unloaded => "unloaded",
            DatasetEntry::Loaded { .. } => "data",
            DatasetEntry::StructureLoaded { .. } => "structure",
            DatasetEntry::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Default)]
pub struct Workspace {
    entries: BTreeMap<String, DatasetEntry>,
    current: Vec<String>,
    execution_error: Option<ServiceError>,
    generation: u64,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the token for a newly started evaluation. Only the holder of
    /// the newest token may publish its outcome.
    pub fn begin_execution(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub fn is_current(&self, token: u64) -> bool {
        token == self.generation
    }

    /// Atomically install the outcome of one evaluation: the new dataset list
    /// and a full replacement of the entry map. Entries for names outside the
    /// new list are gone afterwards, and any prior evaluation error is
    /// cleared.
    pub fn publish(&mut self, names: Vec<String>, entries: BTreeMap<String, DatasetEntry>) {
        self.execution_error = None;
        self.current = names;
        self.entries = entries;
    }

    /// Record a failed evaluation. Entries and the dataset list keep their
    /// prior values; only the error slot changes.
    pub fn record_execution_error(&mut self, error: ServiceError) {
        self.execution_error = Some(error);
    }

    /// Make sure an entry exists for `name`, creating it as `Unloaded` if
    /// absent. Idempotent.
    pub fn ensure_entry(&mut self, name: &str) {
        self.entries.entry(name.to_string()).or_insert(DatasetEntry::Unloaded);
    }

    /// Replace the whole entry for `name` with the outcome of one operation.
    pub fn replace_entry(&mut self, name: &str, entry: DatasetEntry) {
        self.entries.insert(name.to_string(), entry);
    }

    /// Drop `name` from the entry map and the current dataset list. Called
    /// only after the service confirmed the delete.
    pub fn remove_entry(&mut self, name: &str) {
        self.entries.remove(name);
        self.current.retain(|n| n != name);
    }

    /// Cloneable read model for display layers: datasets in current-list
    /// order first, then any explicitly fetched entries outside the list.
    pub fn snapshot(&self) -> WorkspaceSnapshot {
        let mut datasets: Vec<(String, DatasetEntry)> = Vec::with_capacity(self.entries.len());
        for name in &self.current {
            if let Some(entry) = self.entries.get(name) {
                datasets.push((name.clone(), entry.clone()));
            }
        }
        for (name, entry) in &self.entries {
            if !self.current.contains(name) {
                datasets.push((name.clone(), entry.clone()));
            }
        }
        WorkspaceSnapshot { datasets, execution_error: self.execution_error.clone() }
    }
}

/// Point-in-time copy of the workspace handed to display layers; they never
/// read the live workspace directly.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceSnapshot {
    pub datasets: Vec<(String, DatasetEntry)>,
    pub execution_error: Option<ServiceError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(message: &str) -> DatasetEntry {
        DatasetEntry::Failed { error: ServiceError::transport(message) }
    }

    fn names(snapshot: &WorkspaceSnapshot) -> Vec<&str> {
        snapshot.datasets.iter().map(|(name, _)| name.as_str()).collect()
    }

    fn entry<'a>(snapshot: &'a WorkspaceSnapshot, name: &str) -> Option<&'a DatasetEntry> {
        snapshot
            .datasets
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, entry)| entry)
    }

    #[test]
    fn publish_replaces_the_whole_map() {
        let mut ws = Workspace::new();
        ws.replace_entry("old", DatasetEntry::Unloaded);
        ws.record_execution_error(ServiceError::transport("previous failure"));

        let mut entries = BTreeMap::new();
        entries.insert("a".to_string(), DatasetEntry::StructureLoaded { variables: vec![] });
        entries.insert("b".to_string(), failed("boom"));
        ws.publish(vec!["a".into(), "b".into()], entries);

        let snapshot = ws.snapshot();
        assert_eq!(names(&snapshot), vec!["a", "b"]);
        assert!(snapshot.execution_error.is_none());
    }

    #[test]
    fn execution_error_leaves_entries_alone() {
        let mut ws = Workspace::new();
        ws.replace_entry("kept", DatasetEntry::Unloaded);
        ws.record_execution_error(ServiceError::transport("bad expression"));

        let snapshot = ws.snapshot();
        assert_eq!(names(&snapshot), vec!["kept"]);
        assert!(snapshot.execution_error.is_some());
    }

    #[test]
    fn ensure_entry_does_not_clobber() {
        let mut ws = Workspace::new();
        ws.replace_entry("a", DatasetEntry::Loaded { data: serde_json::json!([1, 2]) });
        ws.ensure_entry("a");
        ws.ensure_entry("b");

        let snapshot = ws.snapshot();
        assert!(matches!(entry(&snapshot, "a"), Some(DatasetEntry::Loaded { .. })));
        assert!(matches!(entry(&snapshot, "b"), Some(DatasetEntry::Unloaded)));
    }

    #[test]
    fn remove_drops_entry_and_list_membership() {
        let mut ws = Workspace::new();
        let mut entries = BTreeMap::new();
        entries.insert("a".to_string(), DatasetEntry::Unloaded);
        entries.insert("b".to_string(), DatasetEntry::Unloaded);
        ws.publish(vec!["a".into(), "b".into()], entries);

        ws.remove_entry("a");
        let snapshot = ws.snapshot();
        assert_eq!(names(&snapshot), vec!["b"]);
    }

    #[test]
    fn newer_generation_invalidates_older_tokens() {
        let mut ws = Workspace::new();
        let first = ws.begin_execution();
        let second = ws.begin_execution();
        assert!(!ws.is_current(first));
        assert!(ws.is_current(second));
    }
}
