//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies. The real
//! ledger store lives in the desktop process behind IPC; this crate ships
//! an in-memory adapter for tests and demos.

pub mod memory;

pub use memory::MemoryLedgerStore;
