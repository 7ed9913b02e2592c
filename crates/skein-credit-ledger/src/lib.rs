//! Skein credit ledger
//!
//! Per-user credit accounting for workflow executions: an append-only
//! transaction log, atomic balance mutations with a non-negative floor,
//! and execution reservations/refunds.
//!
//! Amounts are 64-bit fixed-point integers (1,000,000 units = 1 credit);
//! no balance-affecting computation uses floating point. The store trait
//! is the persistence seam: the bundled in-memory store serializes every
//! mutation behind one mutex, and a database-backed store substitutes a
//! serializable transaction for the same contract.

pub mod amount;
pub mod error;
pub mod ledger;
pub mod store;
pub mod transaction;

// Re-export key types
pub use amount::{Credits, UNITS_PER_CREDIT};
pub use error::{CreditError, Result};
pub use ledger::{ChargeRequest, CreditLedger};
pub use store::{CreditStore, MemoryCreditStore};
pub use transaction::{CreditTransaction, NewTransaction, TransactionKind};
