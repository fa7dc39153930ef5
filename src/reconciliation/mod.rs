//! Reconciliation of ledger transactions against bank statements
//!
//! - [`engine`]: phased automatic matching that claims transactions
//! - [`subset_sum`]: bounded search used for many-to-one matches
//! - [`scoring`]: candidate ranking for manual review
//! - [`similarity`]: shared comparison primitives
//! - [`workflow`]: persistence and review of matches through a repository

pub mod engine;
pub mod scoring;
pub mod similarity;
pub mod subset_sum;
pub mod workflow;

pub use engine::*;
pub use scoring::*;
pub use subset_sum::*;
pub use workflow::*;
