//! # gateway-audit
//!
//! a tamper-evident, signed, hash-chained audit log with periodic external
//! anchoring.

pub mod anchor;
pub mod chain;
pub mod commitment;
pub mod entry;
pub mod error;
#[cfg(test)]
mod test_support;

pub use anchor::{merkle_root, AuditAnchor};
pub use chain::{AuditChain, ChainVerification, EntryError};
pub use commitment::{CommitmentRecord, CommitmentService};
pub use entry::AuditEntry;
pub use error::{Error, Result};
