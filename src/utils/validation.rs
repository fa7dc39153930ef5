//! Validation utilities

use crate::traits::*;
use crate::types::*;
use bigdecimal::BigDecimal;
use std::collections::HashSet;

/// Validate that an amount is not negative
pub fn validate_non_negative_amount(amount: &BigDecimal) -> ReconResult<()> {
    if *amount < BigDecimal::from(0) {
        Err(ReconError::Validation(
            "Amount cannot be negative".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Validate that a transaction ID is valid
pub fn validate_transaction_id(transaction_id: &str) -> ReconResult<()> {
    if transaction_id.trim().is_empty() {
        return Err(ReconError::Validation(
            "Transaction ID cannot be empty".to_string(),
        ));
    }

    if transaction_id.len() > 100 {
        return Err(ReconError::Validation(
            "Transaction ID cannot exceed 100 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate that a transaction description is valid
pub fn validate_transaction_description(description: &str) -> ReconResult<()> {
    if description.trim().is_empty() {
        return Err(ReconError::Validation(
            "Transaction description cannot be empty".to_string(),
        ));
    }

    if description.len() > 500 {
        return Err(ReconError::Validation(
            "Transaction description cannot exceed 500 characters".to_string(),
        ));
    }

    Ok(())
}

/// Check the structural invariants of a match before it is stored
pub fn validate_match(reconciliation_match: &ReconciliationMatch) -> ReconResult<()> {
    if reconciliation_match.internal_ids.is_empty() || reconciliation_match.external_ids.is_empty()
    {
        return Err(ReconError::Validation(format!(
            "Match '{}' needs at least one transaction on each side",
            reconciliation_match.id
        )));
    }

    if reconciliation_match.difference < BigDecimal::from(0) {
        return Err(ReconError::Validation(format!(
            "Match '{}' has a negative difference",
            reconciliation_match.id
        )));
    }

    if reconciliation_match.confidence > 100 {
        return Err(ReconError::Validation(format!(
            "Match '{}' has confidence {} above 100",
            reconciliation_match.id, reconciliation_match.confidence
        )));
    }

    let mut seen = HashSet::new();
    for id in reconciliation_match.transaction_ids() {
        if !seen.insert(id) {
            return Err(ReconError::Validation(format!(
                "Transaction '{}' appears more than once in match '{}'",
                id, reconciliation_match.id
            )));
        }
    }

    Ok(())
}

/// Stricter input validator that also requires usable descriptions
pub struct StrictInputValidator;

impl InputValidator for StrictInputValidator {
    fn validate_transaction(&self, transaction: &Transaction) -> ReconResult<()> {
        validate_transaction_id(&transaction.id)?;
        validate_non_negative_amount(&transaction.amount)?;
        validate_transaction_description(&transaction.description)?;
        Ok(())
    }
}
