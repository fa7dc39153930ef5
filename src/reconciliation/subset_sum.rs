//! Bounded subset-sum search over signed transaction amounts
//!
//! The search walks candidates in the order given and always tries the
//! branch that takes the current candidate before the branch that skips it.
//! The first selection whose sum lands within tolerance wins, so the input
//! order decides which combination comes back when several would qualify.

use bigdecimal::BigDecimal;

use crate::reconciliation::similarity::amount_gap;
use crate::types::Transaction;

/// Find a combination of at most `max_size` candidates whose signed amounts
/// sum to `target` within `tolerance`.
///
/// Returns the selected transactions in candidate order, or `None` when no
/// qualifying combination exists. Cost is exponential in `candidates.len()`;
/// callers are expected to cap the pool.
pub fn find_subset(
    candidates: &[Transaction],
    target: &BigDecimal,
    tolerance: &BigDecimal,
    max_size: u32,
) -> Option<Vec<Transaction>> {
    let amounts: Vec<BigDecimal> = candidates.iter().map(Transaction::signed_amount).collect();

    find_subset_indices(&amounts, target, tolerance, max_size).map(|indices| {
        indices
            .into_iter()
            .map(|i| candidates[i].clone())
            .collect()
    })
}

/// Same search as [`find_subset`], over bare amounts, returning positions
pub fn find_subset_indices(
    amounts: &[BigDecimal],
    target: &BigDecimal,
    tolerance: &BigDecimal,
    max_size: u32,
) -> Option<Vec<usize>> {
    let mut search = SubsetSearch {
        amounts,
        target,
        tolerance,
        max_size: max_size as usize,
        selected: Vec::new(),
    };

    if search.explore(0, BigDecimal::from(0)) {
        Some(search.selected)
    } else {
        None
    }
}

struct SubsetSearch<'a> {
    amounts: &'a [BigDecimal],
    target: &'a BigDecimal,
    tolerance: &'a BigDecimal,
    max_size: usize,
    selected: Vec<usize>,
}

impl SubsetSearch<'_> {
    fn explore(&mut self, index: usize, sum: BigDecimal) -> bool {
        if !self.selected.is_empty() && amount_gap(&sum, self.target) <= *self.tolerance {
            return true;
        }

        if index >= self.amounts.len() || self.selected.len() >= self.max_size {
            return false;
        }

        // Take the candidate first
        self.selected.push(index);
        let with_current = &sum + &self.amounts[index];
        if self.explore(index + 1, with_current) {
            return true;
        }
        self.selected.pop();

        self.explore(index + 1, sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn income(id: &str, amount: i64) -> Transaction {
        Transaction::income(
            id.to_string(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            format!("Deposit {id}"),
            BigDecimal::from(amount),
        )
    }

    fn ids(found: &[Transaction]) -> Vec<&str> {
        found.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_pair_reaches_target() {
        let pool = vec![income("a", 300), income("b", 200), income("c", 50)];

        let found = find_subset(&pool, &BigDecimal::from(500), &BigDecimal::from(0), 2).unwrap();

        assert_eq!(ids(&found), vec!["a", "b"]);
    }

    #[test]
    fn test_size_limit_blocks_solution() {
        let pool = vec![income("a", 300), income("b", 200), income("c", 50)];

        let found = find_subset(&pool, &BigDecimal::from(500), &BigDecimal::from(0), 1);

        assert!(found.is_none());
    }

    #[test]
    fn test_include_first_order_decides_between_solutions() {
        // Both {a, d} and {b, c} sum to 100; taking `a` first finds {a, d}
        let pool = vec![
            income("a", 70),
            income("b", 60),
            income("c", 40),
            income("d", 30),
        ];

        let found = find_subset(&pool, &BigDecimal::from(100), &BigDecimal::from(0), 4).unwrap();

        assert_eq!(ids(&found), vec!["a", "d"]);
    }

    #[test]
    fn test_stops_at_first_hit_within_tolerance() {
        // `a` alone is within 0.05 of the target, so the search never grows the selection
        let pool = vec![income("a", 100), income("b", 0)];
        let target = BigDecimal::from_str("100.04").unwrap();
        let tolerance = BigDecimal::from_str("0.05").unwrap();

        let found = find_subset(&pool, &target, &tolerance, 4).unwrap();

        assert_eq!(ids(&found), vec!["a"]);
    }

    #[test]
    fn test_signed_amounts_are_summed() {
        let refund = Transaction::expense(
            "r".to_string(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            "Refund".to_string(),
            BigDecimal::from(25),
        );
        let pool = vec![income("a", 100), refund];

        let found = find_subset(&pool, &BigDecimal::from(75), &BigDecimal::from(0), 2).unwrap();

        assert_eq!(ids(&found), vec!["a", "r"]);
    }

    #[test]
    fn test_empty_selection_never_matches() {
        // A zero target would be "matched" by choosing nothing; that must not count
        let pool = vec![income("a", 10)];

        assert!(find_subset(&pool, &BigDecimal::from(0), &BigDecimal::from(0), 3).is_none());
        assert!(find_subset(&[], &BigDecimal::from(0), &BigDecimal::from(0), 3).is_none());
    }

    #[test]
    fn test_zero_max_size_finds_nothing() {
        let pool = vec![income("a", 10)];

        assert!(find_subset(&pool, &BigDecimal::from(10), &BigDecimal::from(0), 0).is_none());
    }

    #[test]
    fn test_indices_variant() {
        let amounts = vec![BigDecimal::from(5), BigDecimal::from(7), BigDecimal::from(8)];

        let found =
            find_subset_indices(&amounts, &BigDecimal::from(15), &BigDecimal::from(0), 3).unwrap();

        assert_eq!(found, vec![1, 2]);
    }
}
