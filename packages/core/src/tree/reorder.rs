//! Sibling reorder validation
//!
//! Clients submit the complete new order of a sibling group. The submitted
//! ids must be exactly the current siblings: nothing missing, nothing extra,
//! nothing repeated. Only then are positions assigned (`sort_order = index`,
//! 0-based).

use std::collections::{BTreeSet, HashSet};
use thiserror::Error;

/// Difference between a submitted order and the actual sibling set
#[derive(Error, Debug, Clone, Default, PartialEq, Eq)]
#[error(
    "submitted order does not match current siblings (missing: {missing:?}, unexpected: {unexpected:?}, duplicated: {duplicated:?})"
)]
pub struct SiblingSetMismatch {
    pub missing: Vec<i64>,
    pub unexpected: Vec<i64>,
    pub duplicated: Vec<i64>,
}

/// Validate `requested` against the `current` sibling ids
pub fn validate_sibling_order(current: &[i64], requested: &[i64]) -> Result<(), SiblingSetMismatch> {
    let current_set: BTreeSet<i64> = current.iter().copied().collect();

    let mut seen = HashSet::with_capacity(requested.len());
    let mut duplicated = BTreeSet::new();
    for id in requested {
        if !seen.insert(*id) {
            duplicated.insert(*id);
        }
    }

    let requested_set: BTreeSet<i64> = requested.iter().copied().collect();
    let missing: Vec<i64> = current_set.difference(&requested_set).copied().collect();
    let unexpected: Vec<i64> = requested_set.difference(&current_set).copied().collect();

    if missing.is_empty() && unexpected.is_empty() && duplicated.is_empty() {
        Ok(())
    } else {
        Err(SiblingSetMismatch {
            missing,
            unexpected,
            duplicated: duplicated.into_iter().collect(),
        })
    }
}

/// Pair every id with its new 0-based position
pub fn assign_sort_orders(requested: &[i64]) -> Vec<(i64, i64)> {
    requested
        .iter()
        .enumerate()
        .map(|(position, id)| (*id, position as i64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permutation_accepted() {
        assert!(validate_sibling_order(&[1, 2, 3], &[3, 1, 2]).is_ok());
        assert!(validate_sibling_order(&[], &[]).is_ok());
    }

    #[test]
    fn test_missing_sibling_rejected() {
        let err = validate_sibling_order(&[1, 2, 3], &[3, 1]).unwrap_err();
        assert_eq!(err.missing, vec![2]);
        assert!(err.unexpected.is_empty());
    }

    #[test]
    fn test_foreign_id_rejected() {
        let err = validate_sibling_order(&[1, 2], &[2, 1, 7]).unwrap_err();
        assert_eq!(err.unexpected, vec![7]);
        assert!(err.missing.is_empty());
    }

    #[test]
    fn test_duplicate_rejected() {
        let err = validate_sibling_order(&[1, 2], &[1, 2, 2]).unwrap_err();
        assert_eq!(err.duplicated, vec![2]);
        assert!(err.to_string().contains("duplicated: [2]"));
    }

    #[test]
    fn test_positions_are_zero_based() {
        assert_eq!(assign_sort_orders(&[30, 10, 20]), vec![(30, 0), (10, 1), (20, 2)]);
    }
}
