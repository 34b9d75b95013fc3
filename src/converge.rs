/// Repeated GSP auction driven by bots.
///
/// Every round each advertiser's bot looks at the history and suggests a bid, the
/// round is cleared with GSP and appended to the history. The run stops when bids
/// stop moving between two rounds or after `max_rounds`.
/// Bots with a random component (competitive) usually never settle, so for them the
/// round limit is what ends the run.

use crate::bidders::{next_bid, BidPolicy, BotType};
use crate::errors::AuctionResult;
use crate::gsp::gsp;
use crate::logger::{FileReceiver, LogEvent, Logger, sanitize_filename};
use crate::types::{AuctionOutcome, Bids, History, SlotCtrs};
use crate::utils::{get_seed, TOTAL_SIMULATION_RUNS, VERBOSE_ROUNDS};
use crate::{logln, warnln};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::sync::atomic::Ordering;

/// Two bids closer than this count as unchanged
const BID_TOLERANCE: f64 = 1e-9;

/// Advertiser taking part in the repeated auction
pub struct BotAdvertiser {
    pub name: String,
    /// Per-click value
    pub value: f64,
    pub bot_type: BotType,
}

/// Per-advertiser statistics of a run. Costs and values are expected, i.e. per-click amounts times CTR
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GspAdvertiserStat {
    pub rounds_won: usize,
    pub rounds_withdrawn: usize,
    pub expected_clicks: f64,
    pub expected_cost: f64,
    pub expected_value: f64,
    pub last_bid: Option<f64>,
}

impl GspAdvertiserStat {
    pub fn utility(&self) -> f64 {
        self.expected_value - self.expected_cost
    }
}

/// Result of one repeated auction run
pub struct GspRunStat {
    pub rounds_played: usize,
    /// Round in which bids first repeated the previous round
    pub converged_at: Option<usize>,
    pub advertiser_stats: Vec<GspAdvertiserStat>,
    pub expected_revenue: f64,
    pub history: History,
}

/// Repeated GSP auction over a fixed set of slots
pub struct RepeatedGsp {
    pub slot_ctrs: SlotCtrs,
    pub advertisers: Vec<BotAdvertiser>,
}

fn bids_unchanged(previous: &Bids, current: &Bids) -> bool {
    previous.len() == current.len()
        && previous.iter().all(|(name, bid)| {
            current.get(name).map_or(false, |other| (other - bid).abs() < BID_TOLERANCE)
        })
}

impl RepeatedGsp {
    pub fn new(slot_ctrs: SlotCtrs) -> Self {
        Self {
            slot_ctrs,
            advertisers: Vec::new(),
        }
    }

    pub fn add(&mut self, name: &str, value: f64, bot_type: BotType) {
        self.advertisers.push(BotAdvertiser {
            name: name.to_string(),
            value,
            bot_type,
        });
    }

    /// Ask every bot for its bid for the next round. Withdrawn advertisers are left out.
    fn collect_bids(&self, policies: &[Box<dyn BidPolicy>], history: &History, rng: &mut StdRng, stats: &mut [GspAdvertiserStat], logger: &mut Logger) -> AuctionResult<Bids> {
        let mut bids = Bids::new();
        for ((advertiser, policy), stat) in self.advertisers.iter().zip(policies.iter()).zip(stats.iter_mut()) {
            let suggested = next_bid(policy.as_ref(), &advertiser.name, advertiser.value, &self.slot_ctrs, history, rng)?;
            stat.last_bid = suggested.bid();
            match stat.last_bid {
                Some(bid) => {
                    bids.insert(advertiser.name.clone(), bid);
                }
                None => {
                    stat.rounds_withdrawn += 1;
                    if VERBOSE_ROUNDS.load(Ordering::Relaxed) {
                        logln!(logger, LogEvent::Round, "  {} withdraws", advertiser.name);
                    }
                }
            }
        }
        Ok(bids)
    }

    fn record_outcome(&self, outcome: &AuctionOutcome, stats: &mut [GspAdvertiserStat]) -> f64 {
        let mut revenue = 0.0;
        for (slot, winner) in &outcome.winners {
            let ctr = self.slot_ctrs[slot];
            let payment = outcome.payment_of(winner).unwrap_or(0.0);
            if let Some(index) = self.advertisers.iter().position(|a| &a.name == winner) {
                let stat = &mut stats[index];
                stat.rounds_won += 1;
                stat.expected_clicks += ctr;
                stat.expected_cost += ctr * payment;
                stat.expected_value += ctr * self.advertisers[index].value;
            }
            revenue += ctr * payment;
        }
        revenue
    }

    fn log_round(&self, round: usize, bids: &Bids, outcome: &AuctionOutcome, logger: &mut Logger) {
        let bid_list: Vec<String> = bids.iter().map(|(name, bid)| format!("{}={:.4}", name, bid)).collect();
        logln!(logger, LogEvent::Round, "Round {}: bids [{}]", round, bid_list.join(", "));
        for (slot, winner) in &outcome.winners {
            logln!(logger, LogEvent::Round, "  {} -> {} pays {:.4}", slot, winner, outcome.payment_of(winner).unwrap_or(0.0));
        }
    }

    /// Run at most `max_rounds` rounds
    pub fn run(&self, max_rounds: usize, rng: &mut StdRng, logger: &mut Logger) -> AuctionResult<GspRunStat> {
        let policies: Vec<Box<dyn BidPolicy>> = self.advertisers.iter().map(|a| a.bot_type.create_policy()).collect();
        let mut stats = vec![GspAdvertiserStat::default(); self.advertisers.len()];
        let mut history = History::new();
        let mut expected_revenue = 0.0;
        let mut converged_at = None;
        let verbose = VERBOSE_ROUNDS.load(Ordering::Relaxed);

        for round in 0..max_rounds {
            let bids = self.collect_bids(&policies, &history, rng, &mut stats, logger)?;
            let unchanged = history.last().map_or(false, |last| bids_unchanged(&last.bids, &bids));

            let outcome = gsp(&self.slot_ctrs, &bids)?;
            if verbose {
                self.log_round(round, &bids, &outcome, logger);
            }
            expected_revenue += self.record_outcome(&outcome, &mut stats);
            let no_bids = bids.is_empty();
            history.push(bids, outcome);

            if no_bids {
                // Bots can't respond to a round nobody bid in
                warnln!(logger, LogEvent::Simulation, "All advertisers withdrew in round {}, stopping", round);
                break;
            }
            if unchanged {
                converged_at = Some(round);
                logln!(logger, LogEvent::Simulation, "Bids converged in round {}", round);
                break;
            }
        }

        TOTAL_SIMULATION_RUNS.fetch_add(1, Ordering::Relaxed);
        Ok(GspRunStat {
            rounds_played: history.len(),
            converged_at,
            advertiser_stats: stats,
            expected_revenue,
            history,
        })
    }

    /// Run one variant of a scenario: seeded generator, per-variant log file, summary printout
    pub fn run_variant(&self, title: &str, scenario_name: &str, variant_name: &str, max_rounds: usize, logger: &mut Logger) -> Result<GspRunStat, Box<dyn std::error::Error>> {
        logln!(logger, LogEvent::Scenario, "\n{}", title);
        let receiver_id = logger.add_receiver(FileReceiver::new(
            &PathBuf::from(format!("log/{}/{}.log", sanitize_filename(scenario_name), sanitize_filename(variant_name))),
            vec![LogEvent::Round, LogEvent::Simulation],
        )?);

        let mut rng = StdRng::seed_from_u64(get_seed(0));
        let result = self.run(max_rounds, &mut rng, logger);
        if let Ok(stat) = &result {
            stat.printout(self, logger);
        }
        logger.remove_receiver(receiver_id);
        Ok(result?)
    }
}

impl GspRunStat {
    pub fn printout(&self, gsp_run: &RepeatedGsp, logger: &mut Logger) {
        match self.converged_at {
            Some(round) => logln!(logger, LogEvent::Simulation, "Rounds played: {} (converged in round {})", self.rounds_played, round),
            None => logln!(logger, LogEvent::Simulation, "Rounds played: {} (not converged)", self.rounds_played),
        }
        for (advertiser, stat) in gsp_run.advertisers.iter().zip(self.advertiser_stats.iter()) {
            let last_bid = stat.last_bid.map_or("withdrawn".to_string(), |bid| format!("{:.4}", bid));
            logln!(logger, LogEvent::Simulation, "  {} ({}, value {:.2}): won {} rounds, withdrew {}, last bid {}",
                advertiser.name,
                advertiser.bot_type.create_policy().get_bidding_type(),
                advertiser.value,
                stat.rounds_won,
                stat.rounds_withdrawn,
                last_bid);
            logln!(logger, LogEvent::Simulation, "    Clicks: {:.2}, cost: {:.2}, value: {:.2}, utility: {:.2}",
                stat.expected_clicks, stat.expected_cost, stat.expected_value, stat.utility());
        }
        logln!(logger, LogEvent::Simulation, "Expected revenue: {:.2}", self.expected_revenue);
    }
}
