//! In-memory ledger store
//!
//! Stands in for the real persistent store in tests and demos. Satchel's
//! desktop process owns the durable ledger; this core only ever reads it
//! through the [`LedgerStore`] port.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::{Account, Transaction};
use crate::ports::LedgerStore;

#[derive(Default)]
pub struct MemoryLedgerStore {
    accounts: RwLock<HashMap<Uuid, Account>>,
    transactions: RwLock<HashMap<Uuid, Vec<Transaction>>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_account(&self, account: Account) {
        self.accounts.write().unwrap().insert(account.id, account);
    }

    pub fn add_transaction(&self, transaction: Transaction) {
        self.transactions
            .write()
            .unwrap()
            .entry(transaction.account_id)
            .or_default()
            .push(transaction);
    }

    pub fn transaction_count(&self, account_id: Uuid) -> usize {
        self.transactions
            .read()
            .unwrap()
            .get(&account_id)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self.accounts.read().unwrap().get(&id).cloned())
    }

    async fn list_transactions(&self, account_id: Uuid) -> Result<Vec<Transaction>> {
        Ok(self
            .transactions
            .read()
            .unwrap()
            .get(&account_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BankAccountKind;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_round_trip() {
        let store = MemoryLedgerStore::new();
        let account = Account::new_bank(
            Uuid::new_v4(),
            "Checking",
            BankAccountKind::Checking,
            "USD",
        );
        let account_id = account.id;
        store.add_account(account);

        let tx = Transaction::new(
            account_id,
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            "CORNER CAFE",
            Decimal::new(-4217, 2),
            "USD",
        );
        store.add_transaction(tx);

        assert!(store.get_account(account_id).await.unwrap().is_some());
        assert_eq!(store.list_transactions(account_id).await.unwrap().len(), 1);
        assert_eq!(store.transaction_count(account_id), 1);
        assert_eq!(store.transaction_count(Uuid::new_v4()), 0);
        assert!(store
            .list_transactions(Uuid::new_v4())
            .await
            .unwrap()
            .is_empty());
    }
}
