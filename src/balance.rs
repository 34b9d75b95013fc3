/// BALANCE clearing for budgeted advertisers.
///
/// Advertisers are not ranked by raw bid but by a weight that trades the bid off
/// against the fraction of budget that is still available:
///
///   weight = bid * (1 - exp(-current_budget / starting_budget))
///
/// so that an advertiser that has spent most of its budget gets pushed down and
/// the remaining budget of the market is spread over more queries.
/// Only advertisers that can still afford their bid take part (no partial fills).
///
/// Two payment rules share the algorithm:
/// - FPA: winner pays its bid
/// - GSP: winner pays the bid of the next advertiser in weight order (capped at its
///   own bid), the lowest ranked winner pays 0
///
/// Budgets are never touched here, deducting payments is up to the driver.

use crate::chargers::{assign_slots, AuctionCharger, ChargerFirstPrice, ChargerSecondPrice, RankedBidder};
use crate::errors::{AuctionError, AuctionResult};
use crate::ranking::{rank_slots, validate_non_negative};
use crate::types::{AuctionOutcome, Bids, Budgets, SlotCtrs};

/// Budget-smoothed weight of a bid. Caller guarantees `starting_budget > 0`.
pub fn balance_weight(bid: f64, current_budget: f64, starting_budget: f64) -> f64 {
    bid * (1.0 - (-current_budget / starting_budget).exp())
}

/// Advertisers that can afford their bid, with their BALANCE weight
fn eligible_bidders<'a>(bids: &'a Bids, starting_budgets: &Budgets, current_budgets: &Budgets) -> AuctionResult<Vec<RankedBidder<'a>>> {
    let mut eligible = Vec::new();
    for (advertiser, &bid) in bids {
        // No current budget entry means nothing left to spend
        let current_budget = match current_budgets.get(advertiser) {
            Some(&budget) => budget,
            None => continue,
        };
        if !(current_budget >= bid) {
            continue;
        }
        let starting_budget = starting_budgets.get(advertiser).copied().unwrap_or(0.0);
        if !starting_budget.is_finite() || starting_budget <= 0.0 {
            return Err(AuctionError::InvalidBudget {
                advertiser: advertiser.clone(),
                starting_budget,
            });
        }
        eligible.push(RankedBidder {
            name: advertiser.as_str(),
            bid,
            score: balance_weight(bid, current_budget, starting_budget),
        });
    }
    Ok(eligible)
}

/// Shared BALANCE algorithm, parameterized by the payment rule
pub fn clear_balance(charger: &dyn AuctionCharger, slot_ctrs: &SlotCtrs, bids: &Bids, starting_budgets: &Budgets, current_budgets: &Budgets) -> AuctionResult<AuctionOutcome> {
    validate_non_negative("Bid", bids)?;
    let ranked_slots = rank_slots(slot_ctrs)?;

    let mut ranked_bidders = eligible_bidders(bids, starting_budgets, current_budgets)?;
    // Bids arrive in name order, so a stable sort keeps equal weights by name
    ranked_bidders.sort_by(|a, b| b.score.total_cmp(&a.score));

    Ok(assign_slots(&ranked_slots, &ranked_bidders, charger))
}

/// BALANCE with first price payments
pub fn balance_fpa(slot_ctrs: &SlotCtrs, bids: &Bids, starting_budgets: &Budgets, current_budgets: &Budgets) -> AuctionResult<AuctionOutcome> {
    clear_balance(&ChargerFirstPrice, slot_ctrs, bids, starting_budgets, current_budgets)
}

/// BALANCE with generalized second price payments
pub fn balance_gsp(slot_ctrs: &SlotCtrs, bids: &Bids, starting_budgets: &Budgets, current_budgets: &Budgets) -> AuctionResult<AuctionOutcome> {
    clear_balance(&ChargerSecondPrice, slot_ctrs, bids, starting_budgets, current_budgets)
}
