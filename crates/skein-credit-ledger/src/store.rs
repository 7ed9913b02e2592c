//! Credit store abstraction
//!
//! The ledger depends only on this trait's operations, not on a specific
//! schema engine. The single mutation point is [`CreditStore::apply`],
//! which must perform read -> floor check -> write -> append as one
//! atomic unit: no lost updates, and no negative balance is ever
//! persisted, regardless of concurrent callers.

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::Mutex;

use crate::amount::Credits;
use crate::error::{CreditError, Result};
use crate::transaction::{CreditTransaction, NewTransaction};

/// Abstract persistence for balances and the append-only transaction log
pub trait CreditStore: Send + Sync {
    /// Atomically apply a signed amount to a user's balance.
    ///
    /// The implementation must, under mutual exclusion: read the current
    /// balance, reject the update if it would go negative, write the new
    /// balance, and append a transaction record carrying that balance.
    fn apply(&self, tx: NewTransaction) -> Result<CreditTransaction>;

    /// Current balance for a user (zero if unknown)
    fn balance(&self, user_id: &str) -> Credits;

    /// All transactions for a user, oldest first
    fn transactions(&self, user_id: &str) -> Vec<CreditTransaction>;

    /// All transactions tagged with an execution, oldest first
    fn execution_transactions(&self, execution_id: &str) -> Vec<CreditTransaction>;
}

#[derive(Default)]
struct StoreInner {
    balances: HashMap<String, Credits>,
    log: Vec<CreditTransaction>,
}

/// In-memory credit store
///
/// One mutex guards balances and the log together, so every `apply` is
/// serializable by construction. Concurrent deductions that would jointly
/// exceed a balance cannot both succeed.
#[derive(Default)]
pub struct MemoryCreditStore {
    inner: Mutex<StoreInner>,
}

impl MemoryCreditStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user's balance via an adjustment entry.
    ///
    /// Test and bootstrap helper; production top-ups go through the
    /// ledger so they carry the right kind.
    pub fn with_balance(self, user_id: impl Into<String>, balance: Credits) -> Self {
        let user_id = user_id.into();
        {
            let mut inner = self.inner.lock();
            inner.balances.insert(user_id.clone(), balance);
            inner.log.push(CreditTransaction {
                id: uuid::Uuid::new_v4().to_string(),
                user_id,
                amount: balance,
                balance,
                kind: crate::transaction::TransactionKind::Adjustment,
                description: "initial balance".to_string(),
                execution_id: None,
                node_id: None,
                provider: None,
                created_at: Utc::now(),
            });
        }
        self
    }
}

impl CreditStore for MemoryCreditStore {
    fn apply(&self, tx: NewTransaction) -> Result<CreditTransaction> {
        let mut inner = self.inner.lock();

        let current = inner
            .balances
            .get(&tx.user_id)
            .copied()
            .unwrap_or(Credits::ZERO);

        let next = current
            .checked_add(tx.amount)
            .ok_or_else(|| CreditError::BalanceOverflow(tx.user_id.clone()))?;

        if next.is_negative() {
            return Err(CreditError::InsufficientCredits {
                required: tx.amount.abs(),
                available: current,
            });
        }

        let record = CreditTransaction {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: tx.user_id.clone(),
            amount: tx.amount,
            balance: next,
            kind: tx.kind,
            description: tx.description,
            execution_id: tx.execution_id,
            node_id: tx.node_id,
            provider: tx.provider,
            created_at: Utc::now(),
        };

        inner.balances.insert(tx.user_id, next);
        inner.log.push(record.clone());
        Ok(record)
    }

    fn balance(&self, user_id: &str) -> Credits {
        self.inner
            .lock()
            .balances
            .get(user_id)
            .copied()
            .unwrap_or(Credits::ZERO)
    }

    fn transactions(&self, user_id: &str) -> Vec<CreditTransaction> {
        self.inner
            .lock()
            .log
            .iter()
            .filter(|tx| tx.user_id == user_id)
            .cloned()
            .collect()
    }

    fn execution_transactions(&self, execution_id: &str) -> Vec<CreditTransaction> {
        self.inner
            .lock()
            .log
            .iter()
            .filter(|tx| tx.execution_id.as_deref() == Some(execution_id))
            .cloned()
            .collect()
    }
}
