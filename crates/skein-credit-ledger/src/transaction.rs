//! Credit transaction records
//!
//! The transaction log is append-only: entries are never mutated or
//! deleted, and each entry stores the balance it produced so the history
//! is self-auditing even if the running totals were lost.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::amount::Credits;

/// Why a balance changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Charged for running a node
    Execution,
    /// Purchased credits
    Topup,
    /// Returned after a failed execution
    Refund,
    /// Manual correction
    Adjustment,
    /// Promotional grant
    Bonus,
}

/// One entry in the append-only credit log
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditTransaction {
    /// Unique transaction ID
    pub id: String,
    /// User whose balance changed
    pub user_id: String,
    /// Signed amount applied (negative for deductions)
    pub amount: Credits,
    /// Balance after this entry was applied
    pub balance: Credits,
    /// Why the balance changed
    pub kind: TransactionKind,
    /// Human-readable description
    pub description: String,
    /// Execution this entry belongs to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<String>,
    /// Node this entry belongs to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    /// Provider that served the execution, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// When the entry was appended
    pub created_at: DateTime<Utc>,
}

/// A transaction waiting to be applied atomically by the store
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: String,
    /// Signed amount (negative for deductions)
    pub amount: Credits,
    pub kind: TransactionKind,
    pub description: String,
    pub execution_id: Option<String>,
    pub node_id: Option<String>,
    pub provider: Option<String>,
}

impl NewTransaction {
    /// Create an entry with no execution context
    pub fn new(
        user_id: impl Into<String>,
        amount: Credits,
        kind: TransactionKind,
        description: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            amount,
            kind,
            description: description.into(),
            execution_id: None,
            node_id: None,
            provider: None,
        }
    }

    /// Attach the execution this entry belongs to
    pub fn for_execution(mut self, execution_id: impl Into<String>) -> Self {
        self.execution_id = Some(execution_id.into());
        self
    }

    /// Attach the node this entry belongs to
    pub fn for_node(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    /// Attach the provider that served the execution
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_attaches_context() {
        let tx = NewTransaction::new(
            "user-1",
            Credits::from_units(-60_000),
            TransactionKind::Execution,
            "reserved for image generation",
        )
        .for_execution("exec-1")
        .for_node("image-1")
        .with_provider("gateway");

        assert_eq!(tx.execution_id.as_deref(), Some("exec-1"));
        assert_eq!(tx.node_id.as_deref(), Some("image-1"));
        assert_eq!(tx.provider.as_deref(), Some("gateway"));
    }

    #[test]
    fn test_wire_format() {
        let tx = CreditTransaction {
            id: "tx-1".into(),
            user_id: "user-1".into(),
            amount: Credits::from_units(-60_000),
            balance: Credits::from_units(940_000),
            kind: TransactionKind::Execution,
            description: "charge".into(),
            execution_id: None,
            node_id: None,
            provider: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["kind"], "execution");
        assert_eq!(json["userId"], "user-1");
        assert_eq!(json["amount"], -60_000);
        assert!(json.get("executionId").is_none());
    }
}
