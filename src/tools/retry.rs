use rand::Rng;
use std::time::Duration;

/// Backoff configuration for transient tool failures.
///
/// Delays grow exponentially (`initial * factor^attempt`), are capped at
/// `max_interval`, and get a ±50% jitter so concurrent runs don't hammer an
/// upstream in lockstep.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_interval: Duration,
    /// Multiplier applied per retry.
    pub backoff_factor: f64,
    /// Upper bound for any single delay.
    pub max_interval: Duration,
    /// Whether to randomize delays.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_interval: Duration::from_millis(250),
            backoff_factor: 2.0,
            max_interval: Duration::from_secs(10),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    #[must_use]
    pub fn with_max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = interval;
        self
    }

    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// True while another attempt is allowed after `attempt` completed ones.
    #[must_use]
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Delay to sleep after the given 1-based attempt failed.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16) as i32;
        let base = self.initial_interval.as_secs_f64() * self.backoff_factor.powi(exponent);
        let capped = base.min(self.max_interval.as_secs_f64());
        let final_delay = if self.jitter {
            let mut rng = rand::rng();
            capped * rng.random_range(0.5..=1.5)
        } else {
            capped
        };
        Duration::from_secs_f64(final_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_exponentially_without_jitter() {
        let policy = RetryPolicy::new(5)
            .with_initial_interval(Duration::from_secs(1))
            .with_jitter(false);
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
    }

    #[test]
    fn backoff_is_capped_at_max_interval() {
        let policy = RetryPolicy::new(10)
            .with_initial_interval(Duration::from_secs(4))
            .with_max_interval(Duration::from_secs(10))
            .with_jitter(false);
        assert_eq!(policy.delay_for(8), Duration::from_secs(10));
    }

    #[test]
    fn jitter_stays_within_half_to_threehalves() {
        let policy = RetryPolicy::new(5).with_initial_interval(Duration::from_secs(2));
        for _ in 0..32 {
            let delay = policy.delay_for(2).as_secs_f64();
            assert!((2.0..=6.0).contains(&delay), "delay out of range: {delay}");
        }
    }

    #[test]
    fn should_retry_respects_max_attempts() {
        let policy = RetryPolicy::new(3);
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
    }
}
