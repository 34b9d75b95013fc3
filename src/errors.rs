/// Errors returned by the clearing functions and the bidding bots.
/// None of them is fatal: the driver decides whether a simulation stops.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AuctionError {
    /// Empty or malformed slot/bid data where a ranking is required
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Starting budget missing, zero or negative for a bidding advertiser
    #[error("Invalid starting budget for advertiser '{advertiser}': {starting_budget}")]
    InvalidBudget { advertiser: String, starting_budget: f64 },

    /// A round assigns a slot to an advertiser that did not bid in that round
    #[error("Inconsistent history in round {round}: advertiser '{advertiser}' won a slot without a bid")]
    InconsistentHistory { advertiser: String, round: usize },
}

pub type AuctionResult<T> = Result<T, AuctionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AuctionError::InvalidBudget { advertiser: "acme".to_string(), starting_budget: 0.0 };
        assert_eq!(err.to_string(), "Invalid starting budget for advertiser 'acme': 0");

        let err = AuctionError::InconsistentHistory { advertiser: "x".to_string(), round: 3 };
        assert!(err.to_string().contains("round 3"));
        assert!(err.to_string().contains("'x'"));
    }
}
