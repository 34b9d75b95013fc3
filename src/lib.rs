//! Sponsored-search auction simulator.
//!
//! Clearing: BALANCE (first and second price, budget-weighted) and plain GSP.
//! Bidding: best-response bots for repeated GSP auctions.
//! Drivers: a repeated GSP auction and a budgeted query stream, plus a catalog of
//! validated scenarios run by the `slotsim` binary.

pub mod logger;
pub mod utils;
pub mod errors;
pub mod types;
pub mod ranking;
pub mod chargers;
pub mod balance;
pub mod gsp;
pub mod bidders;
pub mod converge;
pub mod simulationrun;
pub mod scenarios;

pub use balance::{balance_fpa, balance_gsp, balance_weight, clear_balance};
pub use bidders::{best_response, best_response_altruistic, best_response_competitive, next_bid, preferred_slot, BidPolicy, BotType, NextBid, SlotPreference, WITHDRAW_SENTINEL};
pub use errors::{AuctionError, AuctionResult};
pub use gsp::gsp;
pub use types::{AuctionOutcome, Bids, Budgets, History, Round, SlotCtrs};
