//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod account;
pub mod mapping;
pub mod result;
mod transaction;

pub use account::{Account, AccountClass, BankAccountKind, CategoryKind};
pub use mapping::{
    CsvFields, CsvHeader, CsvMapper, CsvSettings, FileAccount, FileMapping, FileType,
    ImportMapper, ResolvedMapping,
};
pub use transaction::{LineItem, Transaction};
