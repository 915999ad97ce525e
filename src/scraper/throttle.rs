use crate::error::ScrapeError;
use rand_distr::{Distribution, Normal};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Randomized politeness delay: normal(mean, mean / 3), floored at zero.
#[derive(Debug, Clone, Copy)]
pub struct Throttle {
    dist: Normal<f64>,
}

impl Throttle {
    pub fn new(mean_secs: f64) -> Result<Self, ScrapeError> {
        if !mean_secs.is_finite() || mean_secs < 0.0 {
            return Err(ScrapeError::InvalidThrottle(mean_secs));
        }
        let dist = Normal::new(mean_secs, mean_secs / 3.0)
            .map_err(|_| ScrapeError::InvalidThrottle(mean_secs))?;
        Ok(Self { dist })
    }

    /// One sampled delay.
    pub fn delay(&self) -> Duration {
        let secs = self.dist.sample(&mut rand::rng()).max(0.0);
        Duration::from_secs_f64(secs)
    }

    /// `n` delays sampled up front, for use as a retry schedule.
    pub fn delays(&self, n: usize) -> Vec<Duration> {
        (0..n).map(|_| self.delay()).collect()
    }

    pub async fn wait(&self) {
        let d = self.delay();
        debug!("Throttle: sleeping {:.2?}", d);
        sleep(d).await;
    }
}
