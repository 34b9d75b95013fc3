use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Slot name -> clickthrough rate
pub type SlotCtrs = BTreeMap<String, f64>;

/// Advertiser name -> bid for one query
pub type Bids = BTreeMap<String, f64>;

/// Advertiser name -> budget (starting or current)
pub type Budgets = BTreeMap<String, f64>;

/// Outcome of a single auction round
/// Winners map slot -> advertiser, payments map advertiser -> amount (winners only)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuctionOutcome {
    pub winners: BTreeMap<String, String>,
    pub payments: BTreeMap<String, f64>,
}

impl AuctionOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `advertiser` takes `slot` and pays `payment`
    pub fn assign(&mut self, slot: &str, advertiser: &str, payment: f64) {
        self.winners.insert(slot.to_string(), advertiser.to_string());
        self.payments.insert(advertiser.to_string(), payment);
    }

    pub fn is_empty(&self) -> bool {
        self.winners.is_empty()
    }

    /// Slot won by the advertiser, if any
    pub fn slot_of(&self, advertiser: &str) -> Option<&str> {
        self.winners
            .iter()
            .find(|(_, winner)| winner.as_str() == advertiser)
            .map(|(slot, _)| slot.as_str())
    }

    pub fn payment_of(&self, advertiser: &str) -> Option<f64> {
        self.payments.get(advertiser).copied()
    }

    /// Sum of all payments, i.e. the auctioneer's revenue for the round
    pub fn revenue(&self) -> f64 {
        self.payments.values().sum()
    }
}

/// One past round: the bids that were submitted and the outcome they produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub bids: Bids,
    pub outcome: AuctionOutcome,
}

/// Append-only record of past rounds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    rounds: Vec<Round>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bids: Bids, outcome: AuctionOutcome) {
        self.rounds.push(Round { bids, outcome });
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn last(&self) -> Option<&Round> {
        self.rounds.last()
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }
}
