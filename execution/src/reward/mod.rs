//! Reward dispatch.
//!
//! A completed play produces exactly one dispatch. The dispatcher applies
//! ledger deltas once per request id, records play statistics, and then fires
//! the optional haptic stimulus. Hardware runs after the ledger and can never
//! undo it.
//!
//! Live and test plays go through different [`Lane`]s. The test lane carries a
//! discarding ledger, a disabled haptic port, and its own statistics ledger, so
//! test plays are isolated structurally rather than by branching on the mode.

mod haptics;
mod ledger;

pub use haptics::{DeviceError, HapticPort, NoopHaptics};
pub use ledger::{Balance, Ledger, LedgerError, MemoryLedger, NullLedger, StatsLedger};

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use prizecast_types::game::{
    DeviceOutcome, DispatchReport, HapticCommand, HapticLimits, HapticSpec, LedgerOutcome,
    OutcomeResult, PlayMode,
};
use tracing::{debug, info, warn};

/// Default number of request ids remembered for idempotency.
pub const DEFAULT_IDEMPOTENCY_WINDOW: usize = 4_096;

/// Side-effect ports used for one class of plays.
#[derive(Clone)]
pub struct Lane {
    pub ledger: Arc<dyn Ledger>,
    pub haptics: Arc<dyn HapticPort>,
    pub stats: Arc<StatsLedger>,
}

impl Lane {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        haptics: Arc<dyn HapticPort>,
        stats: Arc<StatsLedger>,
    ) -> Self {
        Self {
            ledger,
            haptics,
            stats,
        }
    }

    /// Lane for test plays: no ledger writes, no hardware, separate stats.
    pub fn test(stats: Arc<StatsLedger>) -> Self {
        Self {
            ledger: Arc::new(NullLedger),
            haptics: Arc::new(NoopHaptics),
            stats,
        }
    }
}

/// Bounded set of recently dispatched request ids.
///
/// Oldest ids are evicted first once `capacity` is reached.
#[derive(Debug)]
pub struct DispatchWindow {
    capacity: usize,
    seen: HashSet<String>,
    order: VecDeque<String>,
}

impl DispatchWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            seen: HashSet::new(),
            order: VecDeque::new(),
        }
    }

    pub fn contains(&self, request_id: &str) -> bool {
        self.seen.contains(request_id)
    }

    /// Returns `false` if `request_id` was already present.
    pub fn insert(&mut self, request_id: &str) -> bool {
        if self.seen.contains(request_id) {
            return false;
        }
        if self.seen.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.seen.insert(request_id.to_string());
        self.order.push_back(request_id.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Applies rewards for completed plays.
pub struct RewardDispatcher {
    live: Lane,
    test: Lane,
    limits: HapticLimits,
    applied: DispatchWindow,
}

impl RewardDispatcher {
    pub fn new(live: Lane, test: Lane, limits: HapticLimits, window: usize) -> Self {
        Self {
            live,
            test,
            limits,
            applied: DispatchWindow::new(window),
        }
    }

    fn lane(&self, mode: PlayMode) -> &Lane {
        match mode {
            PlayMode::Live => &self.live,
            PlayMode::Test => &self.test,
        }
    }

    /// Dispatch the reward for `outcome`.
    ///
    /// A request id seen before returns a [`LedgerOutcome::Duplicate`] report
    /// and performs no side effects.
    pub fn dispatch(
        &mut self,
        outcome: &OutcomeResult,
        actor_id: &str,
        mode: PlayMode,
    ) -> DispatchReport {
        let request_id = outcome.request_id.clone();
        if !self.applied.insert(&request_id) {
            debug!(%request_id, "duplicate dispatch ignored");
            return DispatchReport {
                request_id,
                actor_id: actor_id.to_string(),
                mode,
                ledger: LedgerOutcome::Duplicate,
                command: None,
                devices: Vec::new(),
                hardware_error: None,
            };
        }

        let lane = self.lane(mode);
        let grant = &outcome.reward;

        // Ledger first; hardware can never undo it.
        let ledger = if grant.currency == 0 && grant.xp == 0 {
            LedgerOutcome::Applied {
                currency: 0,
                xp: 0,
            }
        } else {
            match lane.ledger.apply_reward(actor_id, grant.currency, grant.xp) {
                Ok(()) => LedgerOutcome::Applied {
                    currency: grant.currency,
                    xp: grant.xp,
                },
                Err(err) => {
                    warn!(%request_id, actor_id, error = %err, "ledger write failed");
                    LedgerOutcome::Failed {
                        error: err.to_string(),
                    }
                }
            }
        };
        lane.stats
            .record(&outcome.board_id, outcome.stake, grant.payout());

        let mut report = DispatchReport {
            request_id,
            actor_id: actor_id.to_string(),
            mode,
            ledger,
            command: None,
            devices: Vec::new(),
            hardware_error: None,
        };
        if let Some(spec) = &grant.haptic {
            if lane.haptics.enabled() {
                fire(lane.haptics.as_ref(), &self.limits, spec, &mut report);
            }
        }

        info!(
            request_id = %report.request_id,
            actor_id,
            test = mode.is_test(),
            currency = grant.currency,
            xp = grant.xp,
            commands = report.commands_sent(),
            "reward dispatched"
        );
        report
    }

    pub fn has_dispatched(&self, request_id: &str) -> bool {
        self.applied.contains(request_id)
    }
}

/// Send the stimulus to configured devices, falling back to the first
/// available device when none of them took it.
fn fire(port: &dyn HapticPort, limits: &HapticLimits, spec: &HapticSpec, report: &mut DispatchReport) {
    let (intensity, duration_ms) = limits.clamp(spec);
    let available = port.available_devices();
    let mut targeted = Vec::new();
    let mut delivered = false;

    for device_id in &spec.device_ids {
        if !available.contains(device_id) {
            report.devices.push(DeviceOutcome {
                device_id: device_id.clone(),
                attempted: false,
                success: false,
                fallback: false,
                error: Some(DeviceError::Unavailable(device_id.clone()).to_string()),
            });
            continue;
        }
        targeted.push(device_id.clone());
        let outcome = send(port, device_id, spec, intensity, duration_ms, false);
        delivered |= outcome.success;
        report.devices.push(outcome);
    }

    if !delivered {
        let fallback = available
            .iter()
            .find(|id| !targeted.contains(id))
            .cloned();
        match fallback {
            Some(device_id) => {
                let outcome = send(port, &device_id, spec, intensity, duration_ms, true);
                if !outcome.success {
                    report.hardware_error = Some(DeviceError::AllFailed.to_string());
                }
                targeted.push(device_id);
                report.devices.push(outcome);
            }
            None => {
                let err = if available.is_empty() {
                    DeviceError::NoneRegistered
                } else {
                    DeviceError::AllFailed
                };
                warn!(request_id = %report.request_id, error = %err, "haptic stimulus dropped");
                report.hardware_error = Some(err.to_string());
            }
        }
    }

    report.command = Some(HapticCommand {
        device_ids: targeted,
        mode: spec.mode,
        intensity,
        duration_ms,
    });
}

fn send(
    port: &dyn HapticPort,
    device_id: &str,
    spec: &HapticSpec,
    intensity: u8,
    duration_ms: u64,
    fallback: bool,
) -> DeviceOutcome {
    match port.send_command(device_id, spec.mode, intensity, duration_ms) {
        Ok(()) => DeviceOutcome {
            device_id: device_id.to_string(),
            attempted: true,
            success: true,
            fallback,
            error: None,
        },
        Err(err) => {
            warn!(device_id, error = %err, "haptic command failed");
            DeviceOutcome {
                device_id: device_id.to_string(),
                attempted: true,
                success: false,
                fallback,
                error: Some(err.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_evicts_oldest() {
        let mut window = DispatchWindow::new(2);
        assert!(window.insert("a"));
        assert!(window.insert("b"));
        assert!(!window.insert("a"));
        assert!(window.insert("c"));
        assert_eq!(window.len(), 2);
        assert!(!window.contains("a"));
        assert!(window.contains("b"));
        assert!(window.contains("c"));
    }

    #[test]
    fn test_test_lane_is_disabled() {
        let lane = Lane::test(Arc::new(StatsLedger::new()));
        assert!(!lane.haptics.enabled());
        assert!(lane.ledger.apply_reward("anyone", 1_000, 1_000).is_ok());
    }
}
