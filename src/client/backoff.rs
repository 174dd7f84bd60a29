use std::time::Duration;

/// Uncapped exponential reconnection backoff (spec §4.8): "wait `delay`,
/// double up to `maxDelay`, reset to initial on first successful op".
/// Grounded on the teacher's `BackoffStrategy` shape, minus the attempt
/// cap - reconnection keeps trying until it succeeds or the caller gives
/// up, it never runs out of retries on its own.
pub struct ReconnectBackoff {
    initial: Duration,
    max: Duration,
    attempt: u32,
}

impl ReconnectBackoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            attempt: 0,
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let scaled = self.initial.as_secs_f64() * 2f64.powi(self.attempt as i32);
        let delay = Duration::from_secs_f64(scaled.min(self.max.as_secs_f64()));
        self.attempt = self.attempt.saturating_add(1);
        delay
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_each_attempt_up_to_the_cap() {
        let mut backoff = ReconnectBackoff::new(Duration::from_millis(100), Duration::from_secs(1));
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
        assert_eq!(backoff.next_delay(), Duration::from_millis(200));
        assert_eq!(backoff.next_delay(), Duration::from_millis(400));
        assert_eq!(backoff.next_delay(), Duration::from_millis(800));
        assert_eq!(backoff.next_delay(), Duration::from_secs(1)); // capped
        assert_eq!(backoff.next_delay(), Duration::from_secs(1)); // stays capped
    }

    #[test]
    fn reset_restarts_from_initial() {
        let mut backoff = ReconnectBackoff::new(Duration::from_millis(100), Duration::from_secs(1));
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
    }
}
