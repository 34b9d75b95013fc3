/// Repeated GSP auction with three slots and five advertisers, all driven by bots.
///
/// Its three variants run the same market with a different bot for everybody:
///
/// - Variant A: Best response
///
/// - Variant B: Competitive best response (random overbid, capped at value)
///
/// - Variant C: Altruistic best response (bids the estimated price, withdraws when priced out)
///
/// Expected behavior:
/// - every round assigns min(#slots, #bids) slots and no payment exceeds its bid
/// - competitive bots never bid above value
/// - altruistic bots never end up with negative utility

use crate::bidders::BotType;
use crate::converge::{GspRunStat, RepeatedGsp};
use crate::logger::{LogEvent, Logger};
use crate::logln;
use crate::scenarios::{check, finish};
use crate::types::SlotCtrs;
use crate::utils;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::Distribution;

// Register this scenario in the catalog
inventory::submit!(crate::scenarios::ScenarioEntry {
    short_name: "gsp_bots",
    run,
});

const MAX_ROUNDS: usize = 200;

/// Same slots and values for every variant, only the bot differs
fn prepare_repeated_gsp(bot_type: BotType) -> Result<RepeatedGsp, Box<dyn std::error::Error>> {
    let slot_ctrs: SlotCtrs = [("Slot 1", 0.5), ("Slot 2", 0.3), ("Slot 3", 0.1)]
        .iter()
        .map(|(slot, ctr)| (slot.to_string(), *ctr))
        .collect();
    let mut repeated_gsp = RepeatedGsp::new(slot_ctrs);

    let value_dist = utils::lognormal_dist(10.0, 3.0)?;
    let mut rng = StdRng::seed_from_u64(utils::get_seed(1));
    for index in 0..5 {
        repeated_gsp.add(&format!("Advertiser {}", index), value_dist.sample(&mut rng), bot_type);
    }
    Ok(repeated_gsp)
}

/// Mechanism invariants that must hold in every round of a run
fn rounds_are_consistent(repeated_gsp: &RepeatedGsp, stat: &GspRunStat) -> bool {
    stat.history.rounds().iter().all(|round| {
        let expected_winners = repeated_gsp.slot_ctrs.len().min(round.bids.len());
        round.outcome.winners.len() == expected_winners
            && round.outcome.payments.iter().all(|(advertiser, payment)| *payment <= round.bids[advertiser])
    })
}

pub fn run(scenario_name: &str, logger: &mut Logger) -> Result<(), Box<dyn std::error::Error>> {
    let gsp_a = prepare_repeated_gsp(BotType::BEST_RESPONSE)?;
    let stats_a = gsp_a.run_variant("Running with best response bots", scenario_name, "best-response", MAX_ROUNDS, logger)?;

    let gsp_b = prepare_repeated_gsp(BotType::COMPETITIVE)?;
    let stats_b = gsp_b.run_variant("Running with competitive bots", scenario_name, "competitive", MAX_ROUNDS, logger)?;

    let gsp_c = prepare_repeated_gsp(BotType::ALTRUISTIC)?;
    let stats_c = gsp_c.run_variant("Running with altruistic bots", scenario_name, "altruistic", MAX_ROUNDS, logger)?;

    logln!(logger, LogEvent::Scenario, "");
    logln!(logger, LogEvent::Scenario, "Expected revenue (best response/competitive/altruistic): {:.2} / {:.2} / {:.2}",
        stats_a.expected_revenue, stats_b.expected_revenue, stats_c.expected_revenue);

    let mut errors: Vec<String> = Vec::new();

    for (label, repeated_gsp, stat) in [("A", &gsp_a, &stats_a), ("B", &gsp_b, &stats_b), ("C", &gsp_c, &stats_c)] {
        check(
            rounds_are_consistent(repeated_gsp, stat),
            format!("Variant {}: every round fills min(#slots, #bids) slots and nobody pays above its bid ({} rounds)", label, stat.rounds_played),
            &mut errors,
            logger,
        );
    }

    let max_overbid = stats_b.history.rounds().iter()
        .flat_map(|round| gsp_b.advertisers.iter().filter_map(move |a| round.bids.get(&a.name).map(|bid| bid - a.value)))
        .fold(f64::NEG_INFINITY, f64::max);
    check(
        max_overbid <= 0.0,
        format!("Variant B (competitive) never bids above value: max bid - value = {:.4}", max_overbid),
        &mut errors,
        logger,
    );

    let min_utility = stats_c.advertiser_stats.iter().map(|s| s.utility()).fold(f64::INFINITY, f64::min);
    check(
        min_utility >= -1e-9,
        format!("Variant C (altruistic) leaves nobody with negative utility: min utility = {:.4}", min_utility),
        &mut errors,
        logger,
    );

    finish(scenario_name, errors)
}
