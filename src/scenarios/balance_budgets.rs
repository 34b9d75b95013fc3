/// Budgeted advertisers competing over a stream of queries with BALANCE.
///
/// Four advertisers with different budgets bid on 300 queries. Each query shows two
/// or three slots with random CTRs; bids are the advertiser's value with some noise.
///
/// - Variant A: BALANCE with first price payments
///
/// - Variant B: BALANCE with second price payments
///
/// Expected behavior:
/// - no current budget ever goes negative
/// - revenue never exceeds the total starting budget
/// - with first price, every winner pays exactly its bid

use crate::logger::{LogEvent, Logger};
use crate::logln;
use crate::scenarios::{check, finish};
use crate::simulationrun::{BalanceType, BudgetedCampaign, BudgetedRunStat};
use crate::types::{Bids, Budgets, SlotCtrs};
use crate::utils;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Distribution;

// Register this scenario in the catalog
inventory::submit!(crate::scenarios::ScenarioEntry {
    short_name: "balance_budgets",
    run,
});

const QUERY_COUNT: usize = 300;

/// (name, per-query value, starting budget)
const ADVERTISERS: [(&str, f64, f64); 4] = [
    ("Advertiser A", 4.0, 60.0),
    ("Advertiser B", 3.0, 120.0),
    ("Advertiser C", 2.5, 200.0),
    ("Advertiser D", 1.5, 80.0),
];

/// Same queries for every variant, only the payment rule differs
fn prepare_campaign(balance_type: BalanceType) -> Result<BudgetedCampaign, Box<dyn std::error::Error>> {
    let starting_budgets: Budgets = ADVERTISERS.iter()
        .map(|(name, _, budget)| (name.to_string(), *budget))
        .collect();
    let mut campaign = BudgetedCampaign::new(balance_type, starting_budgets);

    let noise_dist = utils::lognormal_dist(1.0, 0.2)?;
    let mut rng = StdRng::seed_from_u64(utils::get_seed(2));
    for query_index in 0..QUERY_COUNT {
        let slot_count = rng.gen_range(2..=3);
        let slot_ctrs: SlotCtrs = (0..slot_count)
            .map(|slot| (format!("Slot {}", slot + 1), rng.gen_range(0.05..0.6)))
            .collect();
        let bids: Bids = ADVERTISERS.iter()
            .map(|(name, value, _)| (name.to_string(), value * noise_dist.sample(&mut rng)))
            .collect();
        campaign.add_query(&format!("Query {}", query_index), slot_ctrs, bids);
    }
    Ok(campaign)
}

fn run_variant(title: &str, balance_type: BalanceType, logger: &mut Logger) -> Result<(BudgetedCampaign, BudgetedRunStat), Box<dyn std::error::Error>> {
    logln!(logger, LogEvent::Scenario, "\n{}", title);
    let campaign = prepare_campaign(balance_type)?;
    let stat = campaign.run(logger)?;
    stat.printout(&campaign, logger);
    Ok((campaign, stat))
}

pub fn run(scenario_name: &str, logger: &mut Logger) -> Result<(), Box<dyn std::error::Error>> {
    let (campaign_a, stats_a) = run_variant("Running with BALANCE first price", BalanceType::FPA, logger)?;
    let (campaign_b, stats_b) = run_variant("Running with BALANCE second price", BalanceType::GSP, logger)?;

    logln!(logger, LogEvent::Scenario, "");
    logln!(logger, LogEvent::Scenario, "Revenue (first/second price): {:.2} / {:.2}", stats_a.total_revenue, stats_b.total_revenue);
    logln!(logger, LogEvent::Scenario, "Unsold queries (first/second price): {} / {}", stats_a.unsold_queries, stats_b.unsold_queries);

    let mut errors: Vec<String> = Vec::new();
    let total_budget: f64 = ADVERTISERS.iter().map(|(_, _, budget)| budget).sum();

    for (label, stat) in [("A", &stats_a), ("B", &stats_b)] {
        check(
            stat.min_budget_seen >= 0.0,
            format!("Variant {}: no budget goes negative (lowest {:.4})", label, stat.min_budget_seen),
            &mut errors,
            logger,
        );
        check(
            stat.total_revenue <= total_budget + 1e-9,
            format!("Variant {}: revenue within total budget: {:.2} <= {:.2}", label, stat.total_revenue, total_budget),
            &mut errors,
            logger,
        );
    }

    let pays_own_bid = campaign_a.queries.iter().zip(stats_a.outcomes.iter())
        .all(|(query, outcome)| outcome.payments.iter().all(|(advertiser, payment)| *payment == query.bids[advertiser]));
    check(
        pays_own_bid,
        "Variant A (first price): every winner pays exactly its bid".to_string(),
        &mut errors,
        logger,
    );

    let within_bid = campaign_b.queries.iter().zip(stats_b.outcomes.iter())
        .all(|(query, outcome)| outcome.payments.iter().all(|(advertiser, payment)| *payment <= query.bids[advertiser]));
    check(
        within_bid,
        "Variant B (second price): no winner pays above its bid".to_string(),
        &mut errors,
        logger,
    );

    finish(scenario_name, errors)
}
