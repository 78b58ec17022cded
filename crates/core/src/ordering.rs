//! Ordinality bookkeeping shared by the in-memory tree and the store.

use std::collections::HashSet;

use crate::error::CoreError;
use crate::types::DbId;

/// Check that `requested` is exactly a reordering of `current`.
///
/// `what` names the items in the error message (`"children"`, `"blocks"`).
pub fn check_permutation(current: &[DbId], requested: &[DbId], what: &str) -> Result<(), CoreError> {
    let current_set: HashSet<DbId> = current.iter().copied().collect();
    let mut seen = HashSet::with_capacity(requested.len());

    for id in requested {
        if !seen.insert(*id) {
            return Err(CoreError::Validation(format!(
                "Id {id} appears more than once in the new order of {what}"
            )));
        }
        if !current_set.contains(id) {
            return Err(CoreError::Validation(format!(
                "Id {id} is not one of the {what} being reordered"
            )));
        }
    }

    if seen.len() != current_set.len() {
        return Err(CoreError::Validation(format!(
            "New order lists {} of {} {what}",
            seen.len(),
            current_set.len()
        )));
    }
    Ok(())
}

/// True if `ordinalities`, in order, are exactly `1..=N`.
pub fn is_contiguous(ordinalities: impl IntoIterator<Item = i32>) -> bool {
    ordinalities
        .into_iter()
        .enumerate()
        .all(|(i, o)| i64::from(o) == i as i64 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permutation_accepted() {
        assert!(check_permutation(&[1, 2, 3], &[3, 1, 2], "children").is_ok());
    }

    #[test]
    fn empty_permutation_accepted() {
        assert!(check_permutation(&[], &[], "blocks").is_ok());
    }

    #[test]
    fn missing_id_rejected() {
        let err = check_permutation(&[1, 2, 3], &[3, 1], "children").unwrap_err();
        assert!(err.to_string().contains("2 of 3"));
    }

    #[test]
    fn foreign_id_rejected() {
        assert!(check_permutation(&[1, 2], &[1, 9], "children").is_err());
    }

    #[test]
    fn duplicate_id_rejected() {
        assert!(check_permutation(&[1, 2], &[1, 1], "blocks").is_err());
    }

    #[test]
    fn contiguity() {
        assert!(is_contiguous([1, 2, 3]));
        assert!(is_contiguous([]));
        assert!(!is_contiguous([1, 3]));
        assert!(!is_contiguous([2, 1]));
    }
}
