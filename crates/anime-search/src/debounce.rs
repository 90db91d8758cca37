//! Debounce primitive for values that change in bursts.
//!
//! A [`Debouncer`] holds the last stable value and at most one pending
//! candidate. Every [`Debouncer::update`] replaces the candidate and restarts
//! its timer, so intermediate values are never emitted.

use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Quiet period used when none is configured
pub const DEFAULT_DELAY: Duration = Duration::from_millis(250);

/// Delays propagation of a value until it stops changing
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    /// Last emitted value
    current: T,
    /// Candidate and the instant it becomes stable
    pending: Option<(T, Instant)>,
}

impl<T: Clone + PartialEq> Debouncer<T> {
    pub fn new(initial: T, delay: Duration) -> Self {
        Self {
            delay,
            current: initial,
            pending: None,
        }
    }

    /// Last value that survived the quiet period
    pub fn value(&self) -> &T {
        &self.current
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Offer a new input value and restart the timer
    pub fn update(&mut self, value: T) {
        self.pending = Some((value, Instant::now() + self.delay));
    }

    /// Make `value` the stable value at once, skipping the quiet period
    pub fn replace(&mut self, value: T) {
        self.pending = None;
        self.current = value;
    }

    /// Drop the pending candidate, if any
    ///
    /// Called on teardown so nothing is emitted afterwards.
    pub fn reset(&mut self) {
        self.pending = None;
    }

    /// Wait for the pending candidate to become stable and return it
    ///
    /// Never resolves while nothing is pending, or when the stable candidate
    /// equals the value already emitted. Safe to use as a `select!` branch:
    /// the candidate lives in `self`, not in the future.
    pub async fn settled(&mut self) -> T {
        loop {
            let Some((_, deadline)) = &self.pending else {
                return std::future::pending().await;
            };
            sleep_until(*deadline).await;

            if let Some((value, _)) = self.pending.take() {
                if value != self.current {
                    self.current = value.clone();
                    return value;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{advance, timeout};

    #[tokio::test(start_paused = true)]
    async fn test_only_final_value_is_emitted() {
        let mut debouncer = Debouncer::new(String::new(), DEFAULT_DELAY);

        let mut typed = String::new();
        for ch in "one piece".chars() {
            typed.push(ch);
            debouncer.update(typed.clone());
            advance(Duration::from_millis(40)).await;
        }

        let last_keystroke = Instant::now();
        let value = debouncer.settled().await;
        assert_eq!(value, "one piece");
        assert_eq!(debouncer.value(), "one piece");
        assert!(!debouncer.is_pending());
        // 40ms already elapsed after the last keystroke
        assert_eq!(last_keystroke.elapsed(), Duration::from_millis(210));
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_update_restarts_the_timer() {
        let mut debouncer = Debouncer::new(0u32, Duration::from_millis(250));
        let start = Instant::now();

        debouncer.update(1);
        advance(Duration::from_millis(200)).await;
        debouncer.update(2);

        assert_eq!(debouncer.settled().await, 2);
        assert_eq!(start.elapsed(), Duration::from_millis(450));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_value_is_not_emitted_again() {
        let mut debouncer = Debouncer::new("naruto".to_string(), DEFAULT_DELAY);

        debouncer.update("naruto!".to_string());
        debouncer.update("naruto".to_string());

        let result = timeout(Duration::from_secs(5), debouncer.settled()).await;
        assert!(result.is_err());
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_discards_pending_value() {
        let mut debouncer = Debouncer::new(String::new(), DEFAULT_DELAY);
        debouncer.update("bleach".to_string());
        debouncer.reset();

        let result = timeout(Duration::from_secs(5), debouncer.settled()).await;
        assert!(result.is_err());
        assert_eq!(debouncer.value(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_replace_skips_quiet_period() {
        let mut debouncer = Debouncer::new("naruto".to_string(), DEFAULT_DELAY);
        debouncer.update("naruto shippuden".to_string());
        debouncer.replace(String::new());

        assert_eq!(debouncer.value(), "");
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_settled_survives_being_dropped_mid_wait() {
        let mut debouncer = Debouncer::new(0u32, Duration::from_millis(250));
        debouncer.update(7);

        // Lose a select race halfway through the quiet period
        let early = timeout(Duration::from_millis(100), debouncer.settled()).await;
        assert!(early.is_err());
        assert!(debouncer.is_pending());

        assert_eq!(debouncer.settled().await, 7);
    }
}
