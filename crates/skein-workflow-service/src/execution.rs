//! Per-node execution records
//!
//! One [`WorkflowExecution`] is created for every node a run touches and
//! moves through `pending -> running -> {completed | failed}`. Terminal
//! states are final: a record is updated exactly once to a terminal
//! status and never transitions backward.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use node_engine::WorkflowGraph;
use skein_credit_ledger::Credits;

/// Status of one node execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    /// Whether this status admits no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Record of one node execution within a run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowExecution {
    /// Unique execution ID
    pub id: String,
    /// Workflow the node belongs to
    pub workflow_id: String,
    /// The node that executed
    pub node_id: String,
    /// Groups every node execution triggered by one run action
    pub run_id: String,
    /// Current status
    pub status: ExecutionStatus,
    /// Gathered input the node executed with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<serde_json::Value>,
    /// Output the node produced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    /// Failure message, when failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Machine-readable failure code, when failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Provider that served the call, when one was involved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Cost the provider reported, stored for audit only; billing uses
    /// the pre-execution estimate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_cost: Option<Credits>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// When the node started running
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When the node reached a terminal status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkflowExecution {
    /// Create a record for a node that has begun executing
    pub fn running(
        workflow_id: impl Into<String>,
        node_id: impl Into<String>,
        run_id: impl Into<String>,
        input: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            workflow_id: workflow_id.into(),
            node_id: node_id.into(),
            run_id: run_id.into(),
            status: ExecutionStatus::Running,
            input: Some(input),
            output: None,
            error: None,
            error_code: None,
            provider: None,
            actual_cost: None,
            created_at: now,
            started_at: Some(now),
            completed_at: None,
        }
    }

    /// Create an already-completed record for a source node.
    ///
    /// Input nodes with no upstream dependencies complete the moment the
    /// run starts, at zero cost, but still leave a record for history.
    pub fn completed_source(
        workflow_id: impl Into<String>,
        node_id: impl Into<String>,
        run_id: impl Into<String>,
        output: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            workflow_id: workflow_id.into(),
            node_id: node_id.into(),
            run_id: run_id.into(),
            status: ExecutionStatus::Completed,
            input: None,
            output: Some(output),
            error: None,
            error_code: None,
            provider: None,
            actual_cost: None,
            created_at: now,
            started_at: Some(now),
            completed_at: Some(now),
        }
    }

    /// Transition to `completed`. Ignored with a warning if the record is
    /// already terminal.
    pub fn complete(&mut self, output: serde_json::Value) {
        if self.status.is_terminal() {
            log::warn!(
                "execution '{}' already terminal ({:?}); ignoring complete()",
                self.id,
                self.status
            );
            return;
        }
        self.status = ExecutionStatus::Completed;
        self.output = Some(output);
        self.completed_at = Some(Utc::now());
    }

    /// Transition to `failed`. Ignored with a warning if the record is
    /// already terminal.
    pub fn fail(&mut self, error: impl Into<String>) {
        if self.status.is_terminal() {
            log::warn!(
                "execution '{}' already terminal ({:?}); ignoring fail()",
                self.id,
                self.status
            );
            return;
        }
        self.status = ExecutionStatus::Failed;
        self.error = Some(error.into());
        self.completed_at = Some(Utc::now());
    }
}

/// Overall outcome of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every scheduled node completed
    Completed,
    /// A node failed and the rest of the run was skipped
    Failed,
}

/// Result of one run
///
/// Carries the per-node records and the graph with propagated outputs
/// written into node data, so the editor can show downstream values
/// exactly as execution left them. On failure, records of nodes that
/// completed before the halt are preserved; partial results are a
/// deliberate, user-visible outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub run_id: String,
    pub workflow_id: String,
    pub status: RunStatus,
    /// Failure message when the run halted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Per-node execution records, in execution order
    pub executions: Vec<WorkflowExecution>,
    /// The graph with propagated values applied
    pub graph: WorkflowGraph,
}
