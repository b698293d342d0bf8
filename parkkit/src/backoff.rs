use std::time::Duration;
use tracing::debug;

/// Stretches the refresh interval while a backend keeps failing.
///
/// The first failure keeps the base interval; each further consecutive
/// failure multiplies it, clamped to `max_delay`.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            multiplier: 2.0,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl BackoffPolicy {
    pub fn delay_after(&self, base: Duration, consecutive_failures: u32) -> Duration {
        if consecutive_failures <= 1 {
            return base;
        }

        let exponent = (consecutive_failures - 1) as i32;
        let scaled = base.as_secs_f64() * self.multiplier.max(1.0).powi(exponent);
        let delay = if scaled.is_finite() && scaled < self.max_delay.as_secs_f64() {
            Duration::from_secs_f64(scaled)
        } else {
            self.max_delay
        };

        debug!(
            consecutive_failures,
            delay_ms = delay.as_millis() as u64,
            "Backing off refresh interval"
        );
        delay.max(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_failure_keeps_base_interval() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_after(Duration::from_secs(2), 1), Duration::from_secs(2));
    }

    #[test]
    fn test_backoff_sequence_clamps() {
        let policy = BackoffPolicy {
            multiplier: 2.0,
            max_delay: Duration::from_secs(10),
        };
        let base = Duration::from_secs(2);
        let delays: Vec<u64> = (1..=5).map(|n| policy.delay_after(base, n).as_secs()).collect();
        assert_eq!(delays, vec![2, 4, 8, 10, 10]);
    }

    #[test]
    fn test_multiplier_below_one_never_shrinks() {
        let policy = BackoffPolicy {
            multiplier: 0.5,
            max_delay: Duration::from_secs(60),
        };
        assert_eq!(policy.delay_after(Duration::from_secs(3), 4), Duration::from_secs(3));
    }
}
