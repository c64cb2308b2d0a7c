//! Satchel Core - statement import pipeline for Satchel personal finance
//!
//! This crate turns bank/brokerage export files (OFX/QFX, QIF, CSV) into
//! canonical, line-itemized transaction candidates ready for user review.
//! It follows hexagonal architecture:
//!
//! - **domain**: Core business entities (Account, Transaction, mapping types)
//! - **readers**: The three statement format readers
//! - **ports**: Trait definitions for external dependencies (LedgerStore)
//! - **services**: Business logic orchestration (inspect, import)
//! - **adapters**: Concrete implementations (in-memory store for tests/demos)
//!
//! Data flows one way: raw file -> reader -> (preview) mapping metadata ->
//! user mapping -> resolved config -> builder -> reconciled candidates.
//! Persistence of reviewed candidates belongs to the caller, behind the
//! `LedgerStore` boundary.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod readers;
pub mod services;

use std::sync::Arc;

use ports::LedgerStore;

// Re-export commonly used types at crate root
pub use domain::result::{Error, Result, ValidationError};
pub use domain::{
    Account, AccountClass, BankAccountKind, CategoryKind, CsvFields, CsvHeader, CsvMapper,
    CsvSettings, FileAccount, FileMapping, FileType, ImportMapper, LineItem, Transaction,
};
pub use services::{
    ImportOptions, ImportOutcome, ImportService, InspectService, ReconciledTransaction,
};

/// Main context for import operations
///
/// The primary entry point: holds the ledger-store handle and the two
/// services the review UI talks to.
pub struct ImportContext {
    pub store: Arc<dyn LedgerStore>,
    pub inspect_service: InspectService,
    pub import_service: ImportService,
}

impl ImportContext {
    /// Create a new import context over a ledger store
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        let inspect_service = InspectService::new();
        let import_service = ImportService::new(Arc::clone(&store));

        Self {
            store,
            inspect_service,
            import_service,
        }
    }
}
