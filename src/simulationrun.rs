/// This file contains the BudgetedCampaign driver: one pass of BALANCE clearing over a
/// sequence of queries, with payments deducted from the advertisers' current budgets
/// after every query.
///
/// We support two payment rules
/// - FPA: winners pay their bid
/// - GSP: winners pay the next advertiser's bid, the last winner pays nothing

use crate::balance::clear_balance;
use crate::chargers::{AuctionCharger, ChargerFirstPrice, ChargerSecondPrice};
use crate::errors::AuctionResult;
use crate::logger::{LogEvent, Logger};
use crate::logln;
use crate::types::{AuctionOutcome, Bids, Budgets, SlotCtrs};
use crate::utils::{TOTAL_SIMULATION_RUNS, VERBOSE_ROUNDS};
use std::collections::BTreeMap;
use std::sync::atomic::Ordering;

/// BALANCE payment rule
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BalanceType {
    FPA,
    GSP,
}

impl BalanceType {
    pub fn create_charger(&self) -> Box<dyn AuctionCharger> {
        match self {
            BalanceType::FPA => Box::new(ChargerFirstPrice),
            BalanceType::GSP => Box::new(ChargerSecondPrice),
        }
    }

    pub fn clear(&self, slot_ctrs: &SlotCtrs, bids: &Bids, starting_budgets: &Budgets, current_budgets: &Budgets) -> AuctionResult<AuctionOutcome> {
        clear_balance(self.create_charger().as_ref(), slot_ctrs, bids, starting_budgets, current_budgets)
    }

    pub fn get_balance_type(&self) -> String {
        format!("BALANCE {}", self.create_charger().get_charging_type().to_lowercase())
    }
}

/// One search query: the slots shown for it and the bids placed on it
#[derive(Debug, Clone)]
pub struct Query {
    pub query_name: String,
    pub slot_ctrs: SlotCtrs,
    pub bids: Bids,
}

/// Statistics for a single advertiser
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetStat {
    pub queries_won: usize,
    pub queries_priced_out: usize,
    pub total_spend: f64,
    pub final_budget: f64,
}

/// Complete statistics of a campaign run
pub struct BudgetedRunStat {
    /// Outcome per query, matched to queries by index
    pub outcomes: Vec<AuctionOutcome>,
    pub advertiser_stats: BTreeMap<String, BudgetStat>,
    pub total_revenue: f64,
    pub unsold_queries: usize,
    /// Lowest current budget observed after any deduction
    pub min_budget_seen: f64,
}

/// A budgeted campaign: starting budgets plus the queries that will be auctioned
pub struct BudgetedCampaign {
    pub balance_type: BalanceType,
    pub starting_budgets: Budgets,
    pub queries: Vec<Query>,
}

impl BudgetedCampaign {
    pub fn new(balance_type: BalanceType, starting_budgets: Budgets) -> Self {
        Self {
            balance_type,
            starting_budgets,
            queries: Vec::new(),
        }
    }

    pub fn add_query(&mut self, query_name: &str, slot_ctrs: SlotCtrs, bids: Bids) {
        self.queries.push(Query {
            query_name: query_name.to_string(),
            slot_ctrs,
            bids,
        });
    }

    /// Auction every query in order, deducting payments as they happen
    pub fn run(&self, logger: &mut Logger) -> AuctionResult<BudgetedRunStat> {
        let mut current_budgets = self.starting_budgets.clone();
        let mut advertiser_stats: BTreeMap<String, BudgetStat> = self.starting_budgets.keys()
            .map(|name| (name.clone(), BudgetStat::default()))
            .collect();
        let mut outcomes = Vec::with_capacity(self.queries.len());
        let mut total_revenue = 0.0;
        let mut unsold_queries = 0;
        let mut min_budget_seen = current_budgets.values().copied().fold(f64::INFINITY, f64::min);
        let verbose = VERBOSE_ROUNDS.load(Ordering::Relaxed);

        for query in &self.queries {
            let outcome = self.balance_type.clear(&query.slot_ctrs, &query.bids, &self.starting_budgets, &current_budgets)?;

            for (advertiser, bid) in &query.bids {
                let affordable = current_budgets.get(advertiser).map_or(false, |budget| *budget >= *bid);
                if !affordable {
                    advertiser_stats.entry(advertiser.clone()).or_default().queries_priced_out += 1;
                }
            }

            if outcome.is_empty() {
                unsold_queries += 1;
            }
            for (advertiser, payment) in &outcome.payments {
                // Payment never exceeds the bid, which never exceeds the current budget
                if let Some(budget) = current_budgets.get_mut(advertiser) {
                    *budget -= payment;
                    min_budget_seen = min_budget_seen.min(*budget);
                }
                let stat = advertiser_stats.entry(advertiser.clone()).or_default();
                stat.queries_won += 1;
                stat.total_spend += payment;
            }
            total_revenue += outcome.revenue();

            if verbose {
                logln!(logger, LogEvent::Round, "Query {}:", query.query_name);
                for (slot, winner) in &outcome.winners {
                    logln!(logger, LogEvent::Round, "  {} -> {} pays {:.4} (budget left {:.4})",
                        slot, winner, outcome.payment_of(winner).unwrap_or(0.0), current_budgets.get(winner).copied().unwrap_or(0.0));
                }
            }
            outcomes.push(outcome);
        }

        for (advertiser, stat) in advertiser_stats.iter_mut() {
            stat.final_budget = current_budgets.get(advertiser).copied().unwrap_or(0.0);
        }

        TOTAL_SIMULATION_RUNS.fetch_add(1, Ordering::Relaxed);
        Ok(BudgetedRunStat {
            outcomes,
            advertiser_stats,
            total_revenue,
            unsold_queries,
            min_budget_seen,
        })
    }
}

impl BudgetedRunStat {
    pub fn printout(&self, campaign: &BudgetedCampaign, logger: &mut Logger) {
        logln!(logger, LogEvent::Simulation, "\n=== {} ===", campaign.balance_type.get_balance_type());
        for (advertiser, stat) in &self.advertiser_stats {
            let starting = campaign.starting_budgets.get(advertiser).copied().unwrap_or(0.0);
            logln!(logger, LogEvent::Simulation, "Advertiser {}: won {} queries, priced out of {}",
                advertiser, stat.queries_won, stat.queries_priced_out);
            logln!(logger, LogEvent::Simulation, "  Spend: {:.2} (budget {:.2} -> {:.2})", stat.total_spend, starting, stat.final_budget);
        }
        logln!(logger, LogEvent::Simulation, "Queries (total/unsold): {} / {}", self.outcomes.len(), self.unsold_queries);
        logln!(logger, LogEvent::Simulation, "Total revenue: {:.2}", self.total_revenue);
    }
}
