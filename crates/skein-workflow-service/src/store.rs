//! Execution record storage
//!
//! The orchestrator depends only on this trait's create/update/read
//! operations, not on a specific schema engine. The bundled in-memory
//! store backs tests and single-process deployments.

use parking_lot::RwLock;

use crate::execution::WorkflowExecution;

/// Abstract persistence for execution records
pub trait ExecutionStore: Send + Sync {
    /// Persist a new record
    fn insert(&self, execution: WorkflowExecution);

    /// Persist an updated record (matched by ID)
    fn update(&self, execution: &WorkflowExecution);

    /// Fetch a record by ID
    fn get(&self, execution_id: &str) -> Option<WorkflowExecution>;

    /// All records for a run, in insertion order
    fn by_run(&self, run_id: &str) -> Vec<WorkflowExecution>;
}

/// In-memory execution store
#[derive(Default)]
pub struct MemoryExecutionStore {
    records: RwLock<Vec<WorkflowExecution>>,
}

impl MemoryExecutionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExecutionStore for MemoryExecutionStore {
    fn insert(&self, execution: WorkflowExecution) {
        self.records.write().push(execution);
    }

    fn update(&self, execution: &WorkflowExecution) {
        let mut records = self.records.write();
        match records.iter_mut().find(|r| r.id == execution.id) {
            Some(existing) => *existing = execution.clone(),
            None => {
                log::warn!("update for unknown execution '{}'; inserting", execution.id);
                records.push(execution.clone());
            }
        }
    }

    fn get(&self, execution_id: &str) -> Option<WorkflowExecution> {
        self.records
            .read()
            .iter()
            .find(|r| r.id == execution_id)
            .cloned()
    }

    fn by_run(&self, run_id: &str) -> Vec<WorkflowExecution> {
        self.records
            .read()
            .iter()
            .filter(|r| r.run_id == run_id)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::ExecutionStatus;

    #[test]
    fn test_insert_get_update() {
        let store = MemoryExecutionStore::new();
        let mut record = WorkflowExecution::running("wf", "a", "run-1", serde_json::json!({}));
        store.insert(record.clone());

        assert_eq!(store.get(&record.id).unwrap().status, ExecutionStatus::Running);

        record.complete(serde_json::json!({"text": "done"}));
        store.update(&record);
        assert_eq!(store.get(&record.id).unwrap().status, ExecutionStatus::Completed);
    }

    #[test]
    fn test_by_run_preserves_order() {
        let store = MemoryExecutionStore::new();
        for node in ["a", "b", "c"] {
            store.insert(WorkflowExecution::running("wf", node, "run-1", serde_json::json!({})));
        }
        store.insert(WorkflowExecution::running("wf", "x", "run-2", serde_json::json!({})));

        let records = store.by_run("run-1");
        let nodes: Vec<&str> = records.iter().map(|r| r.node_id.as_str()).collect();
        assert_eq!(nodes, vec!["a", "b", "c"]);
    }
}
