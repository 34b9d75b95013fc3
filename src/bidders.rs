/// This is a file where the repeated-auction bots reside.
/// A bot takes the history of past GSP rounds and suggests the bid for the next round.
///
/// All bots here are best-response bots: they disregard everything except the last
/// round and look for the bid that maximizes the advertiser's utility given that
/// no other advertiser changes its bid. The search over slots is shared, the bots
/// only differ in a small policy:
/// - how much winning a given slot would cost
/// - what to bid when no slot is worth having
/// - which bid to pick among the ones that win the preferred slot
///
/// The competitive and altruistic policies differ from the pure one: no one-rank
/// lookahead for competitive, a fixed fallback, and no CTR ratio discount.

use crate::errors::{AuctionError, AuctionResult};
use crate::ranking::{rank_slots, sorted_bids_descending, validate_non_negative};
use crate::types::{History, SlotCtrs};
use rand::{Rng, RngCore};

/// Raw value of a withdrawn bid
pub const WITHDRAW_SENTINEL: f64 = -1.0;

/// Utility every slot has to beat to be preferred
const UTILITY_FLOOR: f64 = -1.0;

/// What a bot suggests for the next round
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NextBid {
    Bid(f64),
    /// Do not take part in the next round
    Withdraw,
}

impl NextBid {
    /// Bid as a plain number, -1 for a withdrawn bid
    pub fn as_f64(&self) -> f64 {
        match self {
            NextBid::Bid(bid) => *bid,
            NextBid::Withdraw => WITHDRAW_SENTINEL,
        }
    }

    pub fn bid(&self) -> Option<f64> {
        match self {
            NextBid::Bid(bid) => Some(*bid),
            NextBid::Withdraw => None,
        }
    }
}

/// Result of the preferred slot search
#[derive(Debug, Clone, PartialEq)]
pub struct SlotPreference {
    /// Rank of the preferred slot (0 = highest CTR), None if no slot beats the floor
    pub rank: Option<usize>,
    /// Estimated price of the preferred slot
    pub payment: f64,
    pub utility: f64,
}

/// Competing bid at a position of the sorted list. Past the end there is nobody to outbid.
fn competing_bid(sorted_bids: &[f64], index: usize) -> f64 {
    sorted_bids.get(index).copied().unwrap_or(0.0)
}

/// Price of the slot at `rank` assuming nobody else moves.
/// A better slot than last time costs the bid currently holding it, the last
/// competing position is free, anything else costs the bid `lookahead` positions further down.
fn estimate_price_with_lookahead(rank: usize, last_rank: Option<usize>, sorted_bids: &[f64], lookahead: usize) -> f64 {
    if matches!(last_rank, Some(last) if rank < last) {
        return competing_bid(sorted_bids, rank);
    }
    if rank + 1 == sorted_bids.len() {
        return 0.0;
    }
    competing_bid(sorted_bids, rank + lookahead)
}

/// Trait for best-response bidding policies
pub trait BidPolicy {
    /// Estimated price to win the slot at `rank`
    fn estimate_price(&self, rank: usize, last_rank: Option<usize>, sorted_bids: &[f64]) -> f64;

    /// Bid when no slot is preferred
    fn fallback(&self, value: f64, sorted_bids: &[f64], slot_count: usize) -> NextBid;

    /// Whether a preferred slot with utility at or below zero still gets a bid.
    /// Policies that refuse such slots use the fallback instead.
    fn bids_at_a_loss(&self) -> bool {
        true
    }

    /// Bid that wins the preferred slot at `rank` for `payment`
    fn tie_break(&self, rank: usize, payment: f64, value: f64, ranked_slots: &[(&str, f64)], rng: &mut dyn RngCore) -> NextBid;

    /// Get a string representation of the bidding type
    fn get_bidding_type(&self) -> String;
}

/// Plain best response
pub struct BidPolicyBestResponse;

impl BidPolicy for BidPolicyBestResponse {
    fn estimate_price(&self, rank: usize, last_rank: Option<usize>, sorted_bids: &[f64]) -> f64 {
        estimate_price_with_lookahead(rank, last_rank, sorted_bids, 1)
    }

    fn fallback(&self, value: f64, sorted_bids: &[f64], slot_count: usize) -> NextBid {
        // Largest bid below value that still loses
        NextBid::Bid(value.min(competing_bid(sorted_bids, slot_count)))
    }

    fn tie_break(&self, rank: usize, payment: f64, value: f64, ranked_slots: &[(&str, f64)], _rng: &mut dyn RngCore) -> NextBid {
        if rank == 0 {
            return NextBid::Bid((value + payment) / 2.0);
        }
        // Indifferent between this slot at `payment` and the slot above at the bid
        let ctr = ranked_slots[rank].1;
        let ctr_above = ranked_slots[rank - 1].1;
        let ratio = if ctr_above > 0.0 { ctr / ctr_above } else { 1.0 };
        NextBid::Bid(value - ratio * (value - payment))
    }

    fn get_bidding_type(&self) -> String {
        "Best response".to_string()
    }
}

/// Competitive best response: overbids the estimated price by a random 10-14%,
/// never above value
pub struct BidPolicyCompetitive;

impl BidPolicy for BidPolicyCompetitive {
    fn estimate_price(&self, rank: usize, last_rank: Option<usize>, sorted_bids: &[f64]) -> f64 {
        estimate_price_with_lookahead(rank, last_rank, sorted_bids, 0)
    }

    fn fallback(&self, value: f64, _sorted_bids: &[f64], _slot_count: usize) -> NextBid {
        NextBid::Bid(value * 10.0 / 200.0)
    }

    fn tie_break(&self, _rank: usize, payment: f64, value: f64, _ranked_slots: &[(&str, f64)], rng: &mut dyn RngCore) -> NextBid {
        let percent: u32 = rng.gen_range(10..15);
        let bid = (value + payment) / 2.0 + payment * f64::from(percent) / 100.0;
        NextBid::Bid(bid.min(value))
    }

    fn get_bidding_type(&self) -> String {
        "Competitive best response".to_string()
    }
}

/// Altruistic best response: bids the estimated price, withdraws unless some slot
/// has positive utility
pub struct BidPolicyAltruistic;

impl BidPolicy for BidPolicyAltruistic {
    fn estimate_price(&self, rank: usize, last_rank: Option<usize>, sorted_bids: &[f64]) -> f64 {
        estimate_price_with_lookahead(rank, last_rank, sorted_bids, 1)
    }

    fn fallback(&self, _value: f64, _sorted_bids: &[f64], _slot_count: usize) -> NextBid {
        NextBid::Withdraw
    }

    fn bids_at_a_loss(&self) -> bool {
        false
    }

    fn tie_break(&self, _rank: usize, payment: f64, value: f64, _ranked_slots: &[(&str, f64)], _rng: &mut dyn RngCore) -> NextBid {
        NextBid::Bid(value.min(payment))
    }

    fn get_bidding_type(&self) -> String {
        "Altruistic best response".to_string()
    }
}

/// Bot type used by drivers to pick a policy
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BotType {
    BEST_RESPONSE,
    COMPETITIVE,
    ALTRUISTIC,
}

impl BotType {
    pub fn create_policy(&self) -> Box<dyn BidPolicy> {
        match self {
            BotType::BEST_RESPONSE => Box::new(BidPolicyBestResponse),
            BotType::COMPETITIVE => Box::new(BidPolicyCompetitive),
            BotType::ALTRUISTIC => Box::new(BidPolicyAltruistic),
        }
    }
}

/// Slot rank with the strictly greatest utility `ctr * (value - price)`.
/// The first rank seen wins ties.
pub fn preferred_slot(policy: &dyn BidPolicy, value: f64, ranked_slots: &[(&str, f64)], sorted_bids: &[f64], last_rank: Option<usize>) -> SlotPreference {
    let mut preference = SlotPreference {
        rank: None,
        payment: 0.0,
        utility: UTILITY_FLOOR,
    };
    for (rank, (_, ctr)) in ranked_slots.iter().enumerate() {
        let price = policy.estimate_price(rank, last_rank, sorted_bids);
        let utility = ctr * (value - price);
        if utility > preference.utility {
            preference = SlotPreference {
                rank: Some(rank),
                payment: price,
                utility,
            };
        }
    }
    preference
}

/// Next bid of advertiser `name` with per-click `value`, based on the last round of `history`
pub fn next_bid(policy: &dyn BidPolicy, name: &str, value: f64, slot_ctrs: &SlotCtrs, history: &History, rng: &mut dyn RngCore) -> AuctionResult<NextBid> {
    if !value.is_finite() || value < 0.0 {
        return Err(AuctionError::InvalidInput(format!("Value of '{}' must be a finite non-negative number, got {}", name, value)));
    }
    if slot_ctrs.is_empty() {
        return Err(AuctionError::InvalidInput("No slots to bid for".to_string()));
    }
    let ranked_slots = rank_slots(slot_ctrs)?;

    // Nothing to respond to in the first round
    let last_round = match history.last() {
        Some(round) => round,
        None => return Ok(NextBid::Bid(0.0)),
    };
    let round_index = history.len() - 1;

    if last_round.bids.is_empty() {
        return Err(AuctionError::InvalidInput(format!("Round {} has no bids", round_index)));
    }
    validate_non_negative("Bid", &last_round.bids)?;
    for winner in last_round.outcome.winners.values() {
        if !last_round.bids.contains_key(winner) {
            return Err(AuctionError::InconsistentHistory {
                advertiser: winner.clone(),
                round: round_index,
            });
        }
    }

    let last_rank = match last_round.outcome.slot_of(name) {
        Some(slot) => match ranked_slots.iter().position(|(ranked, _)| *ranked == slot) {
            Some(rank) => Some(rank),
            None => {
                return Err(AuctionError::InvalidInput(format!(
                    "Slot '{}' held by '{}' in round {} has no CTR",
                    slot, name, round_index
                )))
            }
        },
        None => None,
    };

    let sorted_bids = sorted_bids_descending(&last_round.bids);
    let preference = preferred_slot(policy, value, &ranked_slots, &sorted_bids, last_rank);

    Ok(match preference.rank {
        Some(rank) if preference.utility > 0.0 || policy.bids_at_a_loss() => {
            policy.tie_break(rank, preference.payment, value, &ranked_slots, rng)
        }
        _ => policy.fallback(value, &sorted_bids, ranked_slots.len()),
    })
}

/// Plain best response bot
pub fn best_response(name: &str, value: f64, slot_ctrs: &SlotCtrs, history: &History) -> AuctionResult<NextBid> {
    // The policy never draws, any generator will do
    let mut rng = rand::rngs::mock::StepRng::new(0, 0);
    next_bid(&BidPolicyBestResponse, name, value, slot_ctrs, history, &mut rng)
}

/// Competitive best response bot, perturbation drawn from `rng`
pub fn best_response_competitive(name: &str, value: f64, slot_ctrs: &SlotCtrs, history: &History, rng: &mut dyn RngCore) -> AuctionResult<NextBid> {
    next_bid(&BidPolicyCompetitive, name, value, slot_ctrs, history, rng)
}

/// Altruistic best response bot
pub fn best_response_altruistic(name: &str, value: f64, slot_ctrs: &SlotCtrs, history: &History) -> AuctionResult<NextBid> {
    let mut rng = rand::rngs::mock::StepRng::new(0, 0);
    next_bid(&BidPolicyAltruistic, name, value, slot_ctrs, history, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gsp::gsp;
    use crate::types::{AuctionOutcome, Bids};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeMap;

    fn map(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "expected {}, got {}", expected, actual);
    }

    /// History with one GSP round played with the given bids
    fn one_round(slot_ctrs: &SlotCtrs, bids: Bids) -> History {
        let outcome = gsp(slot_ctrs, &bids).unwrap();
        let mut history = History::new();
        history.push(bids, outcome);
        history
    }

    fn two_slots() -> SlotCtrs {
        map(&[("A", 0.5), ("B", 0.3)])
    }

    fn three_bids() -> Bids {
        map(&[("x", 10.0), ("y", 6.0), ("z", 2.0)])
    }

    #[test]
    fn test_empty_history_bids_zero() {
        let slot_ctrs = two_slots();
        let history = History::new();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(best_response("x", 5.0, &slot_ctrs, &history), Ok(NextBid::Bid(0.0)));
        assert_eq!(best_response_competitive("x", 5.0, &slot_ctrs, &history, &mut rng), Ok(NextBid::Bid(0.0)));
        assert_eq!(best_response_altruistic("x", 5.0, &slot_ctrs, &history), Ok(NextBid::Bid(0.0)));
    }

    #[test]
    fn test_best_response_lower_slot_uses_ctr_ratio() {
        let slot_ctrs = two_slots();
        let history = one_round(&slot_ctrs, three_bids());

        // y held B; A would cost 10 (utility -1, not above the floor), B costs 2
        let bid = best_response("y", 8.0, &slot_ctrs, &history).unwrap();
        assert_close(bid.as_f64(), 8.0 - 0.3 / 0.5 * (8.0 - 2.0));
    }

    #[test]
    fn test_best_response_top_slot_bids_midpoint() {
        let slot_ctrs = two_slots();
        let history = one_round(&slot_ctrs, three_bids());

        // x held A at price 6 (utility 4.0) vs B at price 2 (utility 3.6)
        let bid = best_response("x", 14.0, &slot_ctrs, &history).unwrap();
        assert_close(bid.as_f64(), 10.0);
    }

    #[test]
    fn test_best_response_fallback() {
        let slot_ctrs = map(&[("A", 1.0), ("B", 0.9)]);
        let history = one_round(&slot_ctrs, three_bids());

        // z cannot afford anything: fallback is min(value, bid at position #slots)
        assert_eq!(best_response("z", 0.5, &slot_ctrs, &history), Ok(NextBid::Bid(0.5)));
    }

    #[test]
    fn test_more_slots_than_bids_is_not_an_error() {
        let slot_ctrs = map(&[("A", 0.5), ("B", 0.3), ("C", 0.2), ("D", 0.1)]);
        let history = one_round(&slot_ctrs, map(&[("x", 4.0), ("y", 2.0)]));

        // B is the last competing position, so it is free
        let bid = best_response("y", 5.0, &slot_ctrs, &history).unwrap();
        assert_close(bid.as_f64(), 5.0 - 0.3 / 0.5 * 5.0);
    }

    #[test]
    fn test_preferred_slot_lookahead_differs_between_policies() {
        let slot_ctrs = two_slots();
        let ranked = rank_slots(&slot_ctrs).unwrap();
        let sorted_bids = vec![10.0, 6.0, 2.0];

        let pure = preferred_slot(&BidPolicyBestResponse, 8.0, &ranked, &sorted_bids, Some(1));
        assert_eq!(pure.rank, Some(1));
        assert_eq!(pure.payment, 2.0);

        let competitive = preferred_slot(&BidPolicyCompetitive, 8.0, &ranked, &sorted_bids, Some(1));
        assert_eq!(competitive.rank, Some(1));
        assert_eq!(competitive.payment, 6.0);
    }

    #[test]
    fn test_preferred_slot_first_seen_wins_ties() {
        let ranked = vec![("A", 0.5), ("B", 0.5)];
        let sorted_bids = vec![4.0, 2.0, 2.0];
        let preference = preferred_slot(&BidPolicyBestResponse, 6.0, &ranked, &sorted_bids, None);
        // Both slots cost 2 with equal CTR, the first one is kept
        assert_eq!(preference.rank, Some(0));
        assert_close(preference.utility, 2.0);
    }

    #[test]
    fn test_competitive_perturbation_band() {
        let slot_ctrs = two_slots();
        let history = one_round(&slot_ctrs, three_bids());

        // Preferred slot B at price 6, bid is 7 + 6 * r / 100 with r in 10..15
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let bid = best_response_competitive("y", 8.0, &slot_ctrs, &history, &mut rng).unwrap().as_f64();
            assert!(bid >= 7.6 - 1e-9 && bid <= 7.84 + 1e-9, "bid {} out of band", bid);
        }
    }

    #[test]
    fn test_competitive_never_above_value() {
        let slot_ctrs = two_slots();
        let history = one_round(&slot_ctrs, three_bids());

        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let bid = best_response_competitive("x", 6.5, &slot_ctrs, &history, &mut rng).unwrap();
            assert_eq!(bid, NextBid::Bid(6.5));
        }
    }

    #[test]
    fn test_competitive_is_reproducible_with_seed() {
        let slot_ctrs = two_slots();
        let history = one_round(&slot_ctrs, three_bids());
        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        let a = best_response_competitive("y", 8.0, &slot_ctrs, &history, &mut rng_a).unwrap();
        let b = best_response_competitive("y", 8.0, &slot_ctrs, &history, &mut rng_b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_competitive_fallback_is_five_percent() {
        let slot_ctrs = map(&[("A", 1.0), ("B", 0.9)]);
        let history = one_round(&slot_ctrs, three_bids());
        let mut rng = StdRng::seed_from_u64(7);
        let bid = best_response_competitive("z", 0.5, &slot_ctrs, &history, &mut rng).unwrap();
        assert_close(bid.as_f64(), 0.025);
    }

    #[test]
    fn test_altruistic_bids_estimated_price() {
        let slot_ctrs = two_slots();
        let history = one_round(&slot_ctrs, three_bids());
        assert_eq!(best_response_altruistic("y", 8.0, &slot_ctrs, &history), Ok(NextBid::Bid(2.0)));
    }

    #[test]
    fn test_altruistic_withdraws() {
        let slot_ctrs = map(&[("A", 1.0), ("B", 0.9)]);
        let history = one_round(&slot_ctrs, three_bids());
        let bid = best_response_altruistic("z", 0.5, &slot_ctrs, &history).unwrap();
        assert_eq!(bid, NextBid::Withdraw);
        assert_eq!(bid.as_f64(), -1.0);
        assert_eq!(bid.bid(), None);
    }

    #[test]
    fn test_altruistic_withdraws_from_slot_that_loses_money() {
        let slot_ctrs = map(&[("A", 1.0), ("B", 0.9)]);
        let history = one_round(&slot_ctrs, three_bids());

        // B beats the floor at utility 0.9 * (1 - 2) = -0.9 but still loses money
        let ranked = rank_slots(&slot_ctrs).unwrap();
        let preference = preferred_slot(&BidPolicyAltruistic, 1.0, &ranked, &[10.0, 6.0, 2.0], None);
        assert_eq!(preference.rank, Some(1));
        assert_close(preference.utility, -0.9);

        let bid = best_response_altruistic("z", 1.0, &slot_ctrs, &history).unwrap();
        assert_eq!(bid, NextBid::Withdraw);
        assert_eq!(bid.as_f64(), -1.0);
    }

    #[test]
    fn test_altruistic_withdraws_at_zero_utility() {
        let slot_ctrs = map(&[("A", 1.0), ("B", 0.9)]);
        let history = one_round(&slot_ctrs, three_bids());
        assert_eq!(best_response_altruistic("z", 2.0, &slot_ctrs, &history), Ok(NextBid::Withdraw));
    }

    #[test]
    fn test_unprofitable_slot_still_bid_by_other_bots() {
        let slot_ctrs = map(&[("A", 1.0), ("B", 0.9)]);
        let history = one_round(&slot_ctrs, three_bids());

        // Same -0.9 utility slot: the pure bot keeps bidding for B
        let bid = best_response("z", 1.0, &slot_ctrs, &history).unwrap();
        assert_close(bid.as_f64(), 1.0 - 0.9 * (1.0 - 2.0));

        // Competitive prices B at 6: utility 0.9 * (5.5 - 6) = -0.45, capped at value
        let mut rng = StdRng::seed_from_u64(3);
        let bid = best_response_competitive("z", 5.5, &slot_ctrs, &history, &mut rng).unwrap();
        assert_eq!(bid, NextBid::Bid(5.5));
    }

    #[test]
    fn test_inconsistent_history() {
        let slot_ctrs = two_slots();
        let mut outcome = AuctionOutcome::new();
        outcome.assign("A", "ghost", 1.0);
        let mut history = History::new();
        history.push(map(&[("x", 3.0)]), outcome);

        let err = best_response("x", 5.0, &slot_ctrs, &history).unwrap_err();
        assert_eq!(err, AuctionError::InconsistentHistory { advertiser: "ghost".to_string(), round: 0 });
    }

    #[test]
    fn test_invalid_inputs() {
        let history = one_round(&two_slots(), three_bids());
        assert!(matches!(best_response("x", 5.0, &BTreeMap::new(), &history), Err(AuctionError::InvalidInput(_))));
        assert!(matches!(best_response("x", f64::NAN, &two_slots(), &history), Err(AuctionError::InvalidInput(_))));

        // x held A, which is no longer on offer
        let moved = map(&[("B", 0.3), ("C", 0.2)]);
        assert!(matches!(best_response("x", 5.0, &moved, &history), Err(AuctionError::InvalidInput(_))));

        let mut empty_round = History::new();
        empty_round.push(Bids::new(), AuctionOutcome::new());
        assert!(matches!(best_response_altruistic("x", 5.0, &two_slots(), &empty_round), Err(AuctionError::InvalidInput(_))));
    }

    #[test]
    fn test_bot_type_policies() {
        assert_eq!(BotType::BEST_RESPONSE.create_policy().get_bidding_type(), "Best response");
        assert_eq!(BotType::COMPETITIVE.create_policy().get_bidding_type(), "Competitive best response");
        assert_eq!(BotType::ALTRUISTIC.create_policy().get_bidding_type(), "Altruistic best response");
    }
}
