use rand_distr::{LogNormal, NormalError};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// Seed of the current iteration, set by the scenario runner
pub static RAND_SEED: AtomicU64 = AtomicU64::new(0);

/// Log every round of every run (bids, winners, payments)
pub static VERBOSE_ROUNDS: AtomicBool = AtomicBool::new(false);

/// Number of driver runs since the counter was last reset
pub static TOTAL_SIMULATION_RUNS: AtomicUsize = AtomicUsize::new(0);

/// Seed derived from the current RAND_SEED, so different generators of the same
/// run don't share a stream
pub fn get_seed(offset: u64) -> u64 {
    RAND_SEED.load(Ordering::Relaxed).wrapping_mul(1_000_003).wrapping_add(offset)
}

/// Convert mean and standard deviation to log-normal (μ, σ)
///
/// - σ = sqrt(ln(1 + s²/m²))
/// - μ = ln(m) - σ²/2
fn lognormal_from_mean_stddev(mean: f64, stddev: f64) -> (f64, f64) {
    let variance = stddev * stddev;
    let sigma_squared = (1.0 + variance / (mean * mean)).ln();
    let mu = mean.ln() - sigma_squared / 2.0;
    (mu, sigma_squared.sqrt())
}

/// Log-normal distribution with the given mean and standard deviation
pub fn lognormal_dist(mean: f64, stddev: f64) -> Result<LogNormal<f64>, NormalError> {
    let (mu, sigma) = lognormal_from_mean_stddev(mean, stddev);
    LogNormal::new(mu, sigma)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::Distribution;

    #[test]
    fn test_lognormal_mean() {
        let dist = lognormal_dist(10.0, 3.0).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let samples = 20_000;
        let mean: f64 = (0..samples).map(|_| dist.sample(&mut rng)).sum::<f64>() / samples as f64;
        assert!((mean - 10.0).abs() < 0.3, "mean was {}", mean);
    }

    #[test]
    fn test_get_seed_offsets_differ() {
        assert_ne!(get_seed(1), get_seed(2));
    }
}
