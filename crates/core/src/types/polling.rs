//! Bounded backoff schedule for order status polling.
//!
//! After the payment provider redirects the customer back, the confirmation
//! page polls the order status until the webhook has landed. Polling stops
//! after a fixed number of attempts; the page then shows a "still processing,
//! check back later" state instead of polling forever.

use std::time::Duration;

use serde::Serialize;

/// Backoff schedule for client-side status polling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollSchedule {
    /// Number of polls before giving up.
    pub max_attempts: u32,
    /// Delay before the second poll.
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after every poll.
    pub factor: f64,
    /// Upper bound for a single delay.
    pub max_delay: Duration,
}

impl PollSchedule {
    /// Default schedule: 8 polls, starting at 1s, growing 1.5x, capped at 8s.
    pub const DEFAULT: Self = Self {
        max_attempts: 8,
        initial_delay: Duration::from_secs(1),
        factor: 1.5,
        max_delay: Duration::from_secs(8),
    };

    /// Delay to wait after poll number `attempt` (zero-based).
    ///
    /// Returns `None` when poll number `attempt` was the last one allowed by
    /// `max_attempts`: the caller should stop polling.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt.saturating_add(1) >= self.max_attempts {
            return None;
        }
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let scaled = self.initial_delay.as_secs_f64() * self.factor.powi(exponent);
        let capped = scaled.min(self.max_delay.as_secs_f64());
        Some(Duration::from_secs_f64(capped))
    }

    /// Polling hint for a status response.
    #[must_use]
    pub fn hint(&self, attempt: u32) -> PollHint {
        self.delay_for(attempt).map_or(PollHint::StillProcessing, |delay| {
            PollHint::RetryAfter {
                #[allow(clippy::cast_possible_truncation)] // capped by max_delay
                retry_after_ms: delay.as_millis() as u64,
            }
        })
    }
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// What the client should do after reading a pending status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "poll", rename_all = "snake_case")]
pub enum PollHint {
    /// Poll again after the given delay.
    RetryAfter { retry_after_ms: u64 },
    /// Stop polling and show the "still processing" state.
    StillProcessing,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_delays_increase() {
        let schedule = PollSchedule::DEFAULT;
        let first = schedule.delay_for(0).unwrap();
        let second = schedule.delay_for(1).unwrap();
        let third = schedule.delay_for(2).unwrap();
        assert_eq!(first, Duration::from_secs(1));
        assert!(second > first);
        assert!(third > second);
    }

    #[test]
    fn test_delays_are_capped() {
        let schedule = PollSchedule::DEFAULT;
        for attempt in 0..schedule.max_attempts - 1 {
            assert!(schedule.delay_for(attempt).unwrap() <= schedule.max_delay);
        }
    }

    #[test]
    fn test_schedule_is_bounded() {
        let schedule = PollSchedule::DEFAULT;
        let polls = (0..100).take_while(|a| schedule.delay_for(*a).is_some()).count();
        assert_eq!(polls, 7);
        assert_eq!(schedule.delay_for(7), None);
        assert_eq!(schedule.delay_for(1000), None);
    }

    #[test]
    fn test_hint() {
        let schedule = PollSchedule::DEFAULT;
        assert_eq!(
            schedule.hint(0),
            PollHint::RetryAfter {
                retry_after_ms: 1000
            }
        );
        assert_eq!(schedule.hint(7), PollHint::StillProcessing);
    }

    #[test]
    fn test_hint_serialization() {
        let json = serde_json::to_value(PollHint::StillProcessing).unwrap();
        assert_eq!(json, serde_json::json!({"poll": "still_processing"}));
        let json = serde_json::to_value(PollHint::RetryAfter {
            retry_after_ms: 1500,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"poll": "retry_after", "retry_after_ms": 1500})
        );
    }
}
