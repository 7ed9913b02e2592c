//! The credit ledger
//!
//! High-level balance operations over an abstract [`CreditStore`]:
//! deductions with floor enforcement, additions for top-ups and refunds,
//! execution reservations, and read-only history queries. Atomicity lives
//! in the store; the ledger validates intent (sign conventions, kinds)
//! and tags entries with their execution context.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::amount::Credits;
use crate::error::{CreditError, Result};
use crate::store::CreditStore;
use crate::transaction::{CreditTransaction, NewTransaction, TransactionKind};

/// A deduction or addition request with its audit context
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub user_id: String,
    /// Magnitude of the change; must be strictly positive
    pub amount: Credits,
    pub kind: TransactionKind,
    pub description: String,
    pub execution_id: Option<String>,
    pub node_id: Option<String>,
    pub provider: Option<String>,
}

impl ChargeRequest {
    /// Create a request with no execution context
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

    pub fn for_execution(mut self, execution_id: impl Into<String>) -> Self {
        self.execution_id = Some(execution_id.into());
        self
    }

    pub fn for_node(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    fn into_transaction(self, sign: i64) -> NewTransaction {
        NewTransaction {
            user_id: self.user_id,
            amount: if sign < 0 {
                self.amount.negate()
            } else {
                self.amount
            },
            kind: self.kind,
            description: self.description,
            execution_id: self.execution_id,
            node_id: self.node_id,
            provider: self.provider,
        }
    }
}

/// Per-user credit accounting over an abstract store
#[derive(Clone)]
pub struct CreditLedger {
    store: Arc<dyn CreditStore>,
}

impl CreditLedger {
    /// Create a ledger over the given store
    pub fn new(store: Arc<dyn CreditStore>) -> Self {
        Self { store }
    }

    /// Current balance for a user
    pub fn balance(&self, user_id: &str) -> Credits {
        self.store.balance(user_id)
    }

    /// Deduct credits from a user.
    ///
    /// The amount must be strictly positive; the store enforces the
    /// non-negative floor atomically and returns the shortfall on
    /// insufficient funds.
    pub fn deduct(&self, request: ChargeRequest) -> Result<CreditTransaction> {
        if !request.amount.is_positive() {
            return Err(CreditError::invalid_amount(
                request.amount,
                "deduction amount must be positive",
            ));
        }
        let record = self.store.apply(request.into_transaction(-1))?;
        log::debug!(
            "deducted {} from '{}' (balance now {})",
            record.amount.abs(),
            record.user_id,
            record.balance
        );
        Ok(record)
    }

    /// Add credits to a user (top-up, refund, bonus, adjustment).
    ///
    /// Never fails on balance grounds.
    pub fn add(&self, request: ChargeRequest) -> Result<CreditTransaction> {
        if !request.amount.is_positive() {
            return Err(CreditError::invalid_amount(
                request.amount,
                "addition amount must be positive",
            ));
        }
        let record = self.store.apply(request.into_transaction(1))?;
        log::debug!(
            "added {} to '{}' (balance now {})",
            record.amount,
            record.user_id,
            record.balance
        );
        Ok(record)
    }

    /// Reserve credits for an execution before the provider is called.
    ///
    /// A low balance blocks the work from starting; the reservation is a
    /// normal deduction tagged with the execution.
    pub fn reserve(
        &self,
        user_id: &str,
        amount: Credits,
        execution_id: &str,
        node_id: &str,
    ) -> Result<CreditTransaction> {
        self.deduct(
            ChargeRequest::new(
                user_id,
                amount,
                TransactionKind::Execution,
                format!("reserved for node '{}'", node_id),
            )
            .for_execution(execution_id)
            .for_node(node_id),
        )
    }

    /// Return a reservation after an execution failed.
    pub fn refund(
        &self,
        user_id: &str,
        amount: Credits,
        execution_id: &str,
        reason: &str,
    ) -> Result<CreditTransaction> {
        self.add(
            ChargeRequest::new(
                user_id,
                amount,
                TransactionKind::Refund,
                format!("refund: {}", reason),
            )
            .for_execution(execution_id),
        )
    }

    /// Full transaction history for a user, oldest first
    pub fn history(&self, user_id: &str) -> Vec<CreditTransaction> {
        self.store.transactions(user_id)
    }

    /// All transactions belonging to one execution
    pub fn execution_transactions(&self, execution_id: &str) -> Vec<CreditTransaction> {
        self.store.execution_transactions(execution_id)
    }

    /// Net credits spent on executions within `[from, to)`: execution
    /// charges minus refunds.
    pub fn used_in_period(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Credits {
        self.store
            .transactions(user_id)
            .iter()
            .filter(|tx| tx.created_at >= from && tx.created_at < to)
            .filter(|tx| {
                matches!(tx.kind, TransactionKind::Execution | TransactionKind::Refund)
            })
            .fold(Credits::ZERO, |acc, tx| {
                // Charges are negative, refunds positive; usage is the
                // negated net.
                acc.checked_sub(tx.amount).unwrap_or(acc)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCreditStore;
    use chrono::Duration;

    fn ledger_with(units: i64) -> CreditLedger {
        CreditLedger::new(Arc::new(
            MemoryCreditStore::new().with_balance("user-1", Credits::from_units(units)),
        ))
    }

    fn charge(units: i64) -> ChargeRequest {
        ChargeRequest::new(
            "user-1",
            Credits::from_units(units),
            TransactionKind::Execution,
            "test",
        )
    }

    #[test]
    fn test_deduct_more_than_balance_is_invalid_and_unchanged() {
        let ledger = ledger_with(50_000);
        let err = ledger.deduct(charge(60_000)).unwrap_err();
        assert!(matches!(err, CreditError::InsufficientCredits { .. }));
        assert_eq!(ledger.balance("user-1"), Credits::from_units(50_000));
    }

    #[test]
    fn test_deduct_exact_balance_reaches_zero() {
        let ledger = ledger_with(50_000);
        let record = ledger.deduct(charge(50_000)).unwrap();
        assert_eq!(record.balance, Credits::ZERO);
        assert_eq!(ledger.balance("user-1"), Credits::ZERO);
    }

    #[test]
    fn test_negative_amount_is_invalid() {
        let ledger = ledger_with(50_000);
        let err = ledger.deduct(charge(-10)).unwrap_err();
        assert!(matches!(err, CreditError::InvalidAmount { .. }));

        let err = ledger.deduct(charge(0)).unwrap_err();
        assert!(matches!(err, CreditError::InvalidAmount { .. }));
    }

    #[test]
    fn test_add_never_fails_on_balance() {
        let ledger = ledger_with(0);
        let record = ledger
            .add(ChargeRequest::new(
                "user-1",
                Credits::from_whole(5),
                TransactionKind::Topup,
                "purchase",
            ))
            .unwrap();
        assert_eq!(record.balance, Credits::from_whole(5));
    }

    #[test]
    fn test_reserve_then_refund_round_trips() {
        let ledger = ledger_with(100_000);

        let reservation = ledger
            .reserve("user-1", Credits::from_units(60_000), "exec-1", "image-1")
            .unwrap();
        assert_eq!(reservation.kind, TransactionKind::Execution);
        assert_eq!(reservation.node_id.as_deref(), Some("image-1"));
        assert_eq!(ledger.balance("user-1"), Credits::from_units(40_000));

        ledger
            .refund(
                "user-1",
                Credits::from_units(60_000),
                "exec-1",
                "provider chain exhausted",
            )
            .unwrap();
        assert_eq!(ledger.balance("user-1"), Credits::from_units(100_000));

        let for_exec = ledger.execution_transactions("exec-1");
        assert_eq!(for_exec.len(), 2);
        assert_eq!(for_exec[1].kind, TransactionKind::Refund);
    }

    #[test]
    fn test_reservation_blocks_before_work_starts() {
        let ledger = ledger_with(10_000);
        let err = ledger
            .reserve("user-1", Credits::from_units(60_000), "exec-1", "image-1")
            .unwrap_err();
        assert_eq!(err.shortfall(), Some(Credits::from_units(50_000)));
    }

    #[test]
    fn test_used_in_period_nets_refunds() {
        let ledger = ledger_with(1_000_000);
        ledger
            .reserve("user-1", Credits::from_units(300_000), "exec-1", "a")
            .unwrap();
        ledger
            .reserve("user-1", Credits::from_units(200_000), "exec-2", "b")
            .unwrap();
        ledger
            .refund("user-1", Credits::from_units(200_000), "exec-2", "failed")
            .unwrap();
        // Top-ups are not usage
        ledger
            .add(ChargeRequest::new(
                "user-1",
                Credits::from_whole(10),
                TransactionKind::Topup,
                "purchase",
            ))
            .unwrap();

        let now = Utc::now();
        let used = ledger.used_in_period("user-1", now - Duration::hours(1), now + Duration::hours(1));
        assert_eq!(used, Credits::from_units(300_000));

        // Empty window
        let used = ledger.used_in_period("user-1", now + Duration::hours(2), now + Duration::hours(3));
        assert_eq!(used, Credits::ZERO);
    }

    #[test]
    fn test_history_sums_to_balance() {
        let ledger = ledger_with(500_000);
        ledger.deduct(charge(120_000)).unwrap();
        ledger
            .add(ChargeRequest::new(
                "user-1",
                Credits::from_units(20_000),
                TransactionKind::Bonus,
                "promo",
            ))
            .unwrap();

        let sum = ledger
            .history("user-1")
            .iter()
            .fold(Credits::ZERO, |acc, tx| acc.checked_add(tx.amount).unwrap());
        assert_eq!(sum, ledger.balance("user-1"));
    }
}
