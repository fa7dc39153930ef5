//! # Reconciliation Core
//!
//! Matches an internal ledger against an external statement (bank records,
//! payment gateway exports) even when dates drift, amounts are rounded or
//! descriptions are worded differently.
//!
//! ## Features
//!
//! - **Automatic reconciliation**: four ordered phases (exact, date window,
//!   amount tolerance, many-to-one) with first-found, claim-and-remove semantics
//! - **Subset-sum grouping**: several ledger entries settled by one statement line
//! - **Candidate scoring**: ranked suggestions with structured reasons for manual review
//! - **Storage abstraction**: trait-based repository for persisting reviewed matches
//!
//! ## Quick Start
//!
//! ```rust
//! use reconciliation_core::{ReconciliationEngine, Transaction};
//! use bigdecimal::BigDecimal;
//! use chrono::NaiveDate;
//!
//! let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
//! let ledger = vec![Transaction::expense(
//!     "inv-001".to_string(),
//!     date,
//!     "Office rent".to_string(),
//!     BigDecimal::from(1200),
//! )];
//! let statement = vec![Transaction::expense(
//!     "bank-881".to_string(),
//!     date,
//!     "RENT JANUARY".to_string(),
//!     BigDecimal::from(1200),
//! )];
//!
//! let result = ReconciliationEngine::new().reconcile(&ledger, &statement);
//! assert!(result.is_fully_reconciled());
//! ```

pub mod config;
pub mod reconciliation;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::*;
pub use reconciliation::*;
pub use traits::*;
pub use types::*;
