// Chargers decide what a winner pays once slots have been handed out by rank.
// Both BALANCE variants and plain GSP share the same assignment step and only
// differ in the charger (and in how the bidders were ranked).

use crate::types::AuctionOutcome;

/// A bidder after ranking. `score` is what the ranking used (weight for BALANCE, bid for GSP)
#[derive(Debug, Clone, PartialEq)]
pub struct RankedBidder<'a> {
    pub name: &'a str,
    pub bid: f64,
    pub score: f64,
}

/// Trait for auction payment rules
pub trait AuctionCharger {
    /// Payment for the bidder at `rank`, given the full ranked list and the number of winners
    fn get_payment(&self, ranked: &[RankedBidder], rank: usize, winner_count: usize) -> f64;

    /// Get a string representation of the charging type
    fn get_charging_type(&self) -> String;
}

/// First price: winner pays its own bid
pub struct ChargerFirstPrice;

impl AuctionCharger for ChargerFirstPrice {
    fn get_payment(&self, ranked: &[RankedBidder], rank: usize, _winner_count: usize) -> f64 {
        ranked[rank].bid
    }

    fn get_charging_type(&self) -> String {
        "First price".to_string()
    }
}

/// Generalized second price: winner pays the bid of the next ranked bidder,
/// the lowest ranked winner pays nothing.
/// Payment is capped at the winner's own bid, since budget weighting can rank a
/// lower bid above a higher one.
pub struct ChargerSecondPrice;

impl AuctionCharger for ChargerSecondPrice {
    fn get_payment(&self, ranked: &[RankedBidder], rank: usize, winner_count: usize) -> f64 {
        if rank + 1 >= winner_count {
            return 0.0;
        }
        ranked[rank + 1].bid.min(ranked[rank].bid)
    }

    fn get_charging_type(&self) -> String {
        "Second price".to_string()
    }
}

/// Hand rank-i slot to rank-i bidder and charge each winner
/// Both inputs must already be sorted best first.
pub fn assign_slots(ranked_slots: &[(&str, f64)], ranked_bidders: &[RankedBidder], charger: &dyn AuctionCharger) -> AuctionOutcome {
    let winner_count = ranked_slots.len().min(ranked_bidders.len());
    let mut outcome = AuctionOutcome::new();
    for rank in 0..winner_count {
        let payment = charger.get_payment(ranked_bidders, rank, winner_count);
        outcome.assign(ranked_slots[rank].0, ranked_bidders[rank].name, payment);
    }
    outcome
}
