/// Generalized second price auction without budgets.
/// Advertisers are ranked by raw bid, slots by raw CTR, the i-th advertiser takes
/// the i-th slot and pays the next bid down. The lowest ranked winner pays 0.

use crate::chargers::{assign_slots, ChargerSecondPrice, RankedBidder};
use crate::errors::AuctionResult;
use crate::ranking::{rank_descending, rank_slots, validate_non_negative};
use crate::types::{AuctionOutcome, Bids, SlotCtrs};

pub fn gsp(slot_ctrs: &SlotCtrs, bids: &Bids) -> AuctionResult<AuctionOutcome> {
    validate_non_negative("Bid", bids)?;
    let ranked_slots = rank_slots(slot_ctrs)?;

    let ranked_bidders: Vec<RankedBidder> = rank_descending(bids.iter().map(|(name, bid)| (name.as_str(), *bid)).collect())
        .into_iter()
        .map(|(name, bid)| RankedBidder { name, bid, score: bid })
        .collect();

    Ok(assign_slots(&ranked_slots, &ranked_bidders, &ChargerSecondPrice))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AuctionError;
    use std::collections::BTreeMap;

    fn map(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_gsp_example() {
        let slot_ctrs = map(&[("A", 0.5), ("B", 0.3)]);
        let bids = map(&[("x", 10.0), ("y", 6.0), ("z", 2.0)]);

        let outcome = gsp(&slot_ctrs, &bids).unwrap();
        assert_eq!(outcome.winners.len(), 2);
        assert_eq!(outcome.winners["A"], "x");
        assert_eq!(outcome.winners["B"], "y");
        assert_eq!(outcome.payments["x"], 6.0);
        assert_eq!(outcome.payments["y"], 0.0);
        assert!(outcome.slot_of("z").is_none());
    }

    #[test]
    fn test_gsp_more_slots_than_bidders() {
        let slot_ctrs = map(&[("A", 0.5), ("B", 0.3), ("C", 0.2), ("D", 0.1)]);
        let bids = map(&[("x", 3.0), ("y", 7.0), ("z", 5.0)]);

        let outcome = gsp(&slot_ctrs, &bids).unwrap();
        assert_eq!(outcome.winners.len(), 3);
        assert_eq!(outcome.winners["A"], "y");
        assert_eq!(outcome.winners["B"], "z");
        assert_eq!(outcome.winners["C"], "x");
        assert!(!outcome.winners.contains_key("D"));
        assert_eq!(outcome.payments["y"], 5.0);
        assert_eq!(outcome.payments["z"], 3.0);
        assert_eq!(outcome.payments["x"], 0.0);
    }

    #[test]
    fn test_gsp_assignment_is_injective() {
        let slot_ctrs = map(&[("A", 0.4), ("B", 0.4), ("C", 0.4)]);
        let bids = map(&[("x", 1.0), ("y", 1.0), ("z", 1.0), ("w", 1.0)]);

        let outcome = gsp(&slot_ctrs, &bids).unwrap();
        assert_eq!(outcome.winners.len(), 3);
        let mut advertisers: Vec<&String> = outcome.winners.values().collect();
        advertisers.sort();
        advertisers.dedup();
        assert_eq!(advertisers.len(), 3);
        // Ties go by name on both sides
        assert_eq!(outcome.winners["A"], "w");
        assert_eq!(outcome.winners["B"], "x");
        assert_eq!(outcome.winners["C"], "y");
    }

    #[test]
    fn test_gsp_empty_inputs() {
        let slot_ctrs = map(&[("A", 0.5)]);
        let bids = map(&[("x", 1.0)]);
        assert!(gsp(&BTreeMap::new(), &bids).unwrap().is_empty());
        assert!(gsp(&slot_ctrs, &BTreeMap::new()).unwrap().is_empty());
    }

    #[test]
    fn test_gsp_rejects_malformed_input() {
        let slot_ctrs = map(&[("A", 0.5)]);
        assert!(matches!(gsp(&slot_ctrs, &map(&[("x", f64::NAN)])), Err(AuctionError::InvalidInput(_))));
        assert!(matches!(gsp(&map(&[("A", -1.0)]), &map(&[("x", 1.0)])), Err(AuctionError::InvalidInput(_))));
    }
}
