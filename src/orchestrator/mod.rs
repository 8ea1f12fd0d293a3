//! Evaluation orchestration over a workspace.
//!
//! `Session` owns the workspace and the backend and is the only writer to
//! the workspace. `execute` fans out one structure fetch per produced
//! dataset, waits for all of them, and installs the merged outcome as a
//! single replacement; the two dataset operations touch exactly one entry.

use std::collections::BTreeMap;

use futures::future;
use tokio::sync::Mutex;

use crate::gateway::{EvaluationBackend, ServiceError};
use crate::workspace::{DatasetEntry, Workspace, WorkspaceSnapshot};

/// What one `execute` call did to the workspace.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecuteOutcome {
    /// The evaluation succeeded; the workspace now holds exactly these
    /// datasets (individual entries may still be `Failed` from their
    /// structure fetch).
    Published { datasets: Vec<String> },
    /// The expression itself failed to evaluate; the workspace keeps its
    /// prior datasets and records only the error.
    Rejected { error: ServiceError },
    /// A newer evaluation was started before this one finished, so its
    /// outcome was discarded without touching the workspace.
    Superseded,
}

pub struct Session<G> {
    gateway: G,
    workspace: Mutex<Workspace>,
}

impl<G: EvaluationBackend> Session<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway, workspace: Mutex::new(Workspace::new()) }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Read model of the current workspace state.
    pub async fn snapshot(&self) -> WorkspaceSnapshot {
        self.workspace.lock().await.snapshot()
    }

    /// Evaluate an expression and refresh the workspace from the result.
    ///
    /// The produced dataset names fully replace the previous set: structure
    /// fetches run concurrently, one per name, and the join waits for every
    /// one of them, keeping each name's own success or failure. Nothing is
    /// visible in the workspace until the whole batch has completed, and a
    /// call whose evaluation was overtaken by a newer one publishes nothing.
    pub async fn execute(&self, expression: &str) -> ExecuteOutcome {
        let token = self.workspace.lock().await.begin_execution();

        let names = match self.gateway.execute(expression).await {
            Ok(names) => names,
            Err(error) => {
                let mut workspace = self.workspace.lock().await;
                if !workspace.is_current(token) {
                    return ExecuteOutcome::Superseded;
                }
                workspace.record_execution_error(error.clone());
                return ExecuteOutcome::Rejected { error };
            }
        };

        let gateway = &self.gateway;
        let fetches = names.iter().map(|name| async move {
            (name.clone(), gateway.fetch_structure(name).await)
        });
        let outcomes = future::join_all(fetches).await;

        let mut entries = BTreeMap::new();
        for (name, outcome) in outcomes {
            let entry = match outcome {
                Ok(variables) => DatasetEntry::StructureLoaded { variables },
                Err(error) => DatasetEntry::Failed { error },
            };
            entries.insert(name, entry);
        }

        let mut workspace = self.workspace.lock().await;
        if !workspace.is_current(token) {
            return ExecuteOutcome::Superseded;
        }
        workspace.publish(names.clone(), entries);
        ExecuteOutcome::Published { datasets: names }
    }

    /// Fetch row data for one dataset. The outcome, success or failure,
    /// replaces that dataset's entry; no other entry and not the dataset
    /// list is affected. Returns the entry as installed.
    pub async fn fetch_data(&self, name: &str) -> DatasetEntry {
        self.workspace.lock().await.ensure_entry(name);
        let entry = match self.gateway.fetch_data(name).await {
            Ok(data) => DatasetEntry::Loaded { data },
            Err(error) => DatasetEntry::Failed { error },
        };
        self.workspace.lock().await.replace_entry(name, entry.clone());
        entry
    }

    /// Delete one dataset on the service. The local entry is dropped only
    /// when the service confirms; on failure the workspace is left exactly
    /// as it was and the error goes to the caller for display.
    pub async fn remove(&self, name: &str) -> Result<(), ServiceError> {
        self.gateway.delete_dataset(name).await?;
        self.workspace.lock().await.remove_entry(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::model::{Role, Variable};

    fn var(name: &str, role: Role) -> Variable {
        Variable { name: name.into(), r#type: None, role }
    }

    fn err(message: &str) -> ServiceError {
        ServiceError { status: Some(500), detail: json!({"message": message}) }
    }

    /// In-memory backend with scripted outcomes per operation.
    #[derive(Default)]
    struct MockBackend {
        /// Successive outcomes for `execute`, consumed front to back.
        executions: std::sync::Mutex<VecDeque<Result<Vec<String>, ServiceError>>>,
        structures: HashMap<String, Result<Vec<Variable>, ServiceError>>,
        /// Per-dataset artificial latency for the structure fetch.
        structure_delays: HashMap<String, Duration>,
        data: HashMap<String, Result<serde_json::Value, ServiceError>>,
        deletes: HashMap<String, Result<(), ServiceError>>,
        structure_calls: AtomicUsize,
    }

    impl MockBackend {
        fn with_executions(
            outcomes: impl IntoIterator<Item = Result<Vec<String>, ServiceError>>,
        ) -> Self {
            Self {
                executions: std::sync::Mutex::new(outcomes.into_iter().collect()),
                ..Self::default()
            }
        }

        fn structure_ok(mut self, name: &str, variables: Vec<Variable>) -> Self {
            self.structures.insert(name.into(), Ok(variables));
            self
        }

        fn structure_err(mut self, name: &str, error: ServiceError) -> Self {
            self.structures.insert(name.into(), Err(error));
            self
        }

        fn structure_delay(mut self, name: &str, delay: Duration) -> Self {
            self.structure_delays.insert(name.into(), delay);
            self
        }

        fn data_ok(mut self, name: &str, payload: serde_json::Value) -> Self {
            self.data.insert(name.into(), Ok(payload));
            self
        }

        fn data_err(mut self, name: &str, error: ServiceError) -> Self {
            self.data.insert(name.into(), Err(error));
            self
        }

        fn delete_ok(mut self, name: &str) -> Self {
            self.deletes.insert(name.into(), Ok(()));
            self
        }

        fn delete_err(mut self, name: &str, error: ServiceError) -> Self {
            self.deletes.insert(name.into(), Err(error));
            self
        }
    }

    impl EvaluationBackend for MockBackend {
        async fn execute(&self, _expression: &str) -> Result<Vec<String>, ServiceError> {
            self.executions
                .lock()
                .expect("executions lock")
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn fetch_structure(&self, name: &str) -> Result<Vec<Variable>, ServiceError> {
            self.structure_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.structure_delays.get(name) {
                tokio::time::sleep(*delay).await;
            }
            self.structures
                .get(name)
                .cloned()
                .unwrap_or_else(|| Err(err("no structure scripted")))
        }

        async fn fetch_data(&self, name: &str) -> Result<serde_json::Value, ServiceError> {
            self.data
                .get(name)
                .cloned()
                .unwrap_or_else(|| Err(err("no data scripted")))
        }

        async fn delete_dataset(&self, name: &str) -> Result<(), ServiceError> {
            self.deletes
                .get(name)
                .cloned()
                .unwrap_or_else(|| Err(err("no delete scripted")))
        }
    }

    fn dataset_names(snapshot: &WorkspaceSnapshot) -> Vec<&str> {
        snapshot.datasets.iter().map(|(name, _)| name.as_str()).collect()
    }

    #[tokio::test]
    async fn successful_execute_replaces_the_cache_wholesale() {
        let backend = MockBackend::with_executions([
            Ok(vec!["old".to_string()]),
            Ok(vec!["a".to_string(), "b".to_string()]),
        ])
        .structure_ok("old", vec![])
        .structure_ok("a", vec![var("id", Role::Identifier)])
        .structure_ok("b", vec![]);
        let session = Session::new(backend);

        session.execute("first").await;
        let outcome = session.execute("second").await;

        assert_eq!(
            outcome,
            ExecuteOutcome::Published { datasets: vec!["a".into(), "b".into()] }
        );
        let snapshot = session.snapshot().await;
        assert_eq!(dataset_names(&snapshot), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn one_failed_structure_fetch_does_not_poison_the_rest() {
        let backend =
            MockBackend::with_executions([Ok(vec!["a".to_string(), "b".to_string()])])
                .structure_ok("a", vec![var("id", Role::Identifier)])
                .structure_err("b", err("structure unavailable"));
        let session = Session::new(backend);

        let outcome = session.execute("expr").await;

        assert!(matches!(outcome, ExecuteOutcome::Published { .. }));
        let snapshot = session.snapshot().await;
        assert!(snapshot.execution_error.is_none());
        let entries: HashMap<&str, &DatasetEntry> = snapshot
            .datasets
            .iter()
            .map(|(name, entry)| (name.as_str(), entry))
            .collect();
        assert!(matches!(entries["a"], DatasetEntry::StructureLoaded { .. }));
        assert!(matches!(entries["b"], DatasetEntry::Failed { .. }));
    }

    #[tokio::test]
    async fn failed_execute_leaves_the_cache_untouched() {
        let backend = MockBackend::with_executions([
            Ok(vec!["a".to_string()]),
            Err(err("syntax error")),
        ])
        .structure_ok("a", vec![]);
        let session = Session::new(backend);

        session.execute("good").await;
        let before = session.snapshot().await;
        let outcome = session.execute("bad").await;

        match outcome {
            ExecuteOutcome::Rejected { error } => {
                assert_eq!(error.status, Some(500));
            }
            other => panic!("expected Rejected, got {:?}", other),
        }
        let after = session.snapshot().await;
        assert_eq!(dataset_names(&after), dataset_names(&before));
        assert!(after.execution_error.is_some());
    }

    #[tokio::test]
    async fn a_following_successful_execute_clears_the_error() {
        let backend = MockBackend::with_executions([
            Err(err("nope")),
            Ok(vec!["a".to_string()]),
        ])
        .structure_ok("a", vec![]);
        let session = Session::new(backend);

        session.execute("bad").await;
        assert!(session.snapshot().await.execution_error.is_some());

        session.execute("good").await;
        assert!(session.snapshot().await.execution_error.is_none());
    }

    #[tokio::test]
    async fn fan_out_issues_one_fetch_per_dataset_and_publishes_once() {
        let names: Vec<String> = (1..=5).map(|i| format!("ds{}", i)).collect();
        let mut backend = MockBackend::with_executions([Ok(names.clone())]);
        for name in &names {
            backend.structures.insert(name.clone(), Ok(vec![]));
        }
        let session = Session::new(backend);

        let outcome = session.execute("expr").await;

        assert!(matches!(outcome, ExecuteOutcome::Published { .. }));
        assert_eq!(session.gateway().structure_calls.load(Ordering::SeqCst), 5);
        // The publish carries every outcome at once
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.datasets.len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn an_overtaken_execute_publishes_nothing() {
        let backend = MockBackend::with_executions([
            Ok(vec!["slow".to_string()]),
            Ok(vec!["fast".to_string()]),
        ])
        .structure_ok("slow", vec![])
        .structure_ok("fast", vec![])
        .structure_delay("slow", Duration::from_secs(5));
        let session = Session::new(backend);

        let (first, second) = tokio::join!(session.execute("first"), async {
            // Let the first call get its fan-out in flight before overtaking it
            tokio::time::sleep(Duration::from_millis(10)).await;
            session.execute("second").await
        });

        assert_eq!(first, ExecuteOutcome::Superseded);
        assert!(matches!(second, ExecuteOutcome::Published { .. }));
        let snapshot = session.snapshot().await;
        assert_eq!(dataset_names(&snapshot), vec!["fast"]);
    }

    #[tokio::test]
    async fn fetch_data_touches_only_the_named_entry() {
        let backend = MockBackend::with_executions([Ok(vec![
            "a".to_string(),
            "b".to_string(),
        ])])
        .structure_ok("a", vec![])
        .structure_ok("b", vec![])
        .data_ok("a", json!([{"id": 1}]));
        let session = Session::new(backend);
        session.execute("expr").await;

        let entry = session.fetch_data("a").await;

        assert!(matches!(entry, DatasetEntry::Loaded { .. }));
        let snapshot = session.snapshot().await;
        let entries: HashMap<&str, &DatasetEntry> = snapshot
            .datasets
            .iter()
            .map(|(name, entry)| (name.as_str(), entry))
            .collect();
        assert!(matches!(entries["a"], DatasetEntry::Loaded { .. }));
        assert!(matches!(entries["b"], DatasetEntry::StructureLoaded { .. }));
    }

    #[tokio::test]
    async fn fetch_data_failure_replaces_the_entry_with_the_error() {
        let backend = MockBackend::default().data_err("a", err("rows gone"));
        let session = Session::new(backend);

        let entry = session.fetch_data("a").await;

        assert!(matches!(entry, DatasetEntry::Failed { .. }));
        let snapshot = session.snapshot().await;
        assert_eq!(dataset_names(&snapshot), vec!["a"]);
    }

    #[tokio::test]
    async fn failed_delete_keeps_the_entry() {
        let backend = MockBackend::with_executions([Ok(vec!["a".to_string()])])
            .structure_ok("a", vec![])
            .delete_err("a", err("in use"));
        let session = Session::new(backend);
        session.execute("expr").await;

        let result = session.remove("a").await;

        assert!(result.is_err());
        let snapshot = session.snapshot().await;
        assert_eq!(dataset_names(&snapshot), vec!["a"]);
    }

    #[tokio::test]
    async fn successful_delete_removes_exactly_that_entry() {
        let backend = MockBackend::with_executions([Ok(vec![
            "a".to_string(),
            "b".to_string(),
        ])])
        .structure_ok("a", vec![])
        .structure_ok("b", vec![])
        .delete_ok("a");
        let session = Session::new(backend);
        session.execute("expr").await;

        session.remove("a").await.expect("delete scripted as ok");

        let snapshot = session.snapshot().await;
        assert_eq!(dataset_names(&snapshot), vec!["b"]);
    }
}
