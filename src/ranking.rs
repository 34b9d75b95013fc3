/// Ranking helpers shared by all clearing functions and bots.
///
/// Everything is ranked by descending score. Equal scores are broken by ascending
/// name, so the order never depends on how a map was filled.

use crate::errors::{AuctionError, AuctionResult};
use crate::types::SlotCtrs;
use std::collections::BTreeMap;

/// Sort (name, score) pairs best first, ties by name
pub fn rank_descending<'a>(mut entries: Vec<(&'a str, f64)>) -> Vec<(&'a str, f64)> {
    entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries
}

/// Check that every value of the mapping is a finite, non-negative number
pub fn validate_non_negative(what: &str, entries: &BTreeMap<String, f64>) -> AuctionResult<()> {
    for (name, value) in entries {
        if !value.is_finite() || *value < 0.0 {
            return Err(AuctionError::InvalidInput(format!(
                "{} for '{}' must be a finite non-negative number, got {}",
                what, name, value
            )));
        }
    }
    Ok(())
}

/// Slots ranked by descending CTR
pub fn rank_slots(slot_ctrs: &SlotCtrs) -> AuctionResult<Vec<(&str, f64)>> {
    validate_non_negative("CTR", slot_ctrs)?;
    Ok(rank_descending(
        slot_ctrs.iter().map(|(slot, ctr)| (slot.as_str(), *ctr)).collect(),
    ))
}

/// Bid values only, highest first
pub fn sorted_bids_descending(bids: &BTreeMap<String, f64>) -> Vec<f64> {
    let mut values: Vec<f64> = bids.values().copied().collect();
    values.sort_by(|a, b| b.total_cmp(a));
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_rank_slots_by_ctr() {
        let ctrs = map(&[("B", 0.3), ("A", 0.5), ("C", 0.1)]);
        let ranked = rank_slots(&ctrs).unwrap();
        let names: Vec<&str> = ranked.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_ties_break_by_name() {
        let ranked = rank_descending(vec![("zeta", 1.0), ("alpha", 1.0), ("mid", 2.0)]);
        let names: Vec<&str> = ranked.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["mid", "alpha", "zeta"]);
    }

    #[test]
    fn test_rank_slots_rejects_bad_ctr() {
        assert!(matches!(rank_slots(&map(&[("A", -0.1)])), Err(AuctionError::InvalidInput(_))));
        assert!(matches!(rank_slots(&map(&[("A", f64::NAN)])), Err(AuctionError::InvalidInput(_))));
        assert!(rank_slots(&map(&[("A", 0.0)])).is_ok());
    }

    #[test]
    fn test_sorted_bids_descending() {
        let bids = map(&[("x", 2.0), ("y", 10.0), ("z", 6.0)]);
        assert_eq!(sorted_bids_descending(&bids), vec![10.0, 6.0, 2.0]);
    }
}
