//! Ledger store port - persistent store abstraction
//!
//! The import core reads the ledger, it never writes it: account metadata
//! is needed to interpret amounts/currencies and the existing transactions
//! of an account are the candidate set for duplicate detection. Persisting
//! reviewed candidates is the caller's job, behind this same boundary.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::{Account, Transaction};

/// Read-only view of the persistent ledger
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Resolve account or category metadata by local id
    async fn get_account(&self, id: Uuid) -> Result<Option<Account>>;

    /// All known transactions of one account, the candidate set for
    /// duplicate detection
    async fn list_transactions(&self, account_id: Uuid) -> Result<Vec<Transaction>>;
}
