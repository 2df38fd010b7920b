//! Completion acknowledgment checks.
//!
//! Outcomes are decided before any client sees them, so a forged early
//! acknowledgment cannot change a result. It can still be used to skip the
//! wait between plays; [`AntiCheat::validate`] flags those for audit. A flag
//! never fails, blocks, or re-rolls a play.

use prizecast_types::game::PlayMode;
use serde::Serialize;
use tracing::warn;

/// Default fraction of the animation a client must plausibly have played.
pub const DEFAULT_MIN_FLIGHT_RATIO: f64 = 0.6;

/// Who reported the completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompletionOrigin {
    /// A remote display client.
    Client,
    /// The engine itself (safety timeout, debug tooling).
    Server,
}

/// A completion acknowledgment for an active play.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionEvent {
    pub request_id: String,
    pub origin: CompletionOrigin,
    pub activated_at_ms: u64,
    pub acknowledged_at_ms: u64,
}

impl CompletionEvent {
    pub fn elapsed_ms(&self) -> u64 {
        self.acknowledged_at_ms.saturating_sub(self.activated_at_ms)
    }
}

/// Audit record for a suspicious acknowledgment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AntiCheatFlag {
    pub request_id: String,
    pub elapsed_ms: u64,
    pub expected_min_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Flag(AntiCheatFlag),
}

impl Verdict {
    pub fn is_flagged(&self) -> bool {
        matches!(self, Verdict::Flag(_))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct AntiCheat {
    min_flight_ratio: f64,
}

impl Default for AntiCheat {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_FLIGHT_RATIO)
    }
}

impl AntiCheat {
    /// `min_flight_ratio` is clamped to `[0, 1]`.
    pub fn new(min_flight_ratio: f64) -> Self {
        let min_flight_ratio = if min_flight_ratio.is_finite() {
            min_flight_ratio.clamp(0.0, 1.0)
        } else {
            DEFAULT_MIN_FLIGHT_RATIO
        };
        Self { min_flight_ratio }
    }

    /// Minimum plausible playback time for an animation of `duration_ms`.
    pub fn expected_min_ms(&self, duration_ms: u64) -> u64 {
        (duration_ms as f64 * self.min_flight_ratio).floor() as u64
    }

    pub fn validate(
        &self,
        event: &CompletionEvent,
        expected_min_ms: u64,
        mode: PlayMode,
    ) -> Verdict {
        if mode.is_test() || event.origin == CompletionOrigin::Server {
            return Verdict::Accept;
        }
        let elapsed_ms = event.elapsed_ms();
        if elapsed_ms >= expected_min_ms {
            return Verdict::Accept;
        }
        warn!(
            request_id = %event.request_id,
            elapsed_ms,
            expected_min_ms,
            "completion acknowledged implausibly early"
        );
        Verdict::Flag(AntiCheatFlag {
            request_id: event.request_id.clone(),
            elapsed_ms,
            expected_min_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(origin: CompletionOrigin, elapsed: u64) -> CompletionEvent {
        CompletionEvent {
            request_id: "r1".to_string(),
            origin,
            activated_at_ms: 10_000,
            acknowledged_at_ms: 10_000 + elapsed,
        }
    }

    #[test]
    fn test_expected_min() {
        let validator = AntiCheat::new(0.5);
        assert_eq!(validator.expected_min_ms(6_000), 3_000);
        assert_eq!(AntiCheat::new(7.0).expected_min_ms(1_000), 1_000);
        assert_eq!(AntiCheat::new(f64::NAN).expected_min_ms(1_000), 600);
    }

    #[test]
    fn test_early_client_ack_flagged() {
        let validator = AntiCheat::default();
        let verdict = validator.validate(&event(CompletionOrigin::Client, 200), 3_600, PlayMode::Live);
        assert_eq!(
            verdict,
            Verdict::Flag(AntiCheatFlag {
                request_id: "r1".to_string(),
                elapsed_ms: 200,
                expected_min_ms: 3_600,
            })
        );
    }

    #[test]
    fn test_plausible_ack_accepted() {
        let validator = AntiCheat::default();
        let verdict = validator.validate(&event(CompletionOrigin::Client, 3_600), 3_600, PlayMode::Live);
        assert_eq!(verdict, Verdict::Accept);
    }

    #[test]
    fn test_bypass_for_test_and_server() {
        let validator = AntiCheat::default();
        assert!(!validator
            .validate(&event(CompletionOrigin::Client, 0), 3_600, PlayMode::Test)
            .is_flagged());
        assert!(!validator
            .validate(&event(CompletionOrigin::Server, 0), 3_600, PlayMode::Live)
            .is_flagged());
    }

    #[test]
    fn test_clock_skew_counts_as_zero_elapsed() {
        let mut skewed = event(CompletionOrigin::Client, 0);
        skewed.acknowledged_at_ms = 5_000;
        assert_eq!(skewed.elapsed_ms(), 0);
        assert!(AntiCheat::default()
            .validate(&skewed, 1, PlayMode::Live)
            .is_flagged());
    }
}
