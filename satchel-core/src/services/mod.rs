//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

pub mod import;
pub mod inspect;

pub use import::{ImportOptions, ImportOutcome, ImportService, ReconciledTransaction};
pub use inspect::InspectService;
