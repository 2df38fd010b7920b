//! Test doubles and sample boards.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use prizecast_types::game::{
    BoardConfig, BoardSettings, DropSettings, HapticMode, HapticSpec, PlayMode, PlayRequest,
    RewardSpec, Segment, WheelSettings,
};

use crate::reward::{DeviceError, HapticPort, Ledger, LedgerError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A command observed by [`RecordingHaptics`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentCommand {
    pub device_id: String,
    pub mode: HapticMode,
    pub intensity: u8,
    pub duration_ms: u64,
}

/// Haptic port backed by a fixed device list that records every command.
#[derive(Debug, Default)]
pub struct RecordingHaptics {
    devices: Vec<String>,
    failing: HashSet<String>,
    sent: Mutex<Vec<SentCommand>>,
}

impl RecordingHaptics {
    pub fn new(devices: &[&str]) -> Self {
        Self {
            devices: devices.iter().map(|d| d.to_string()).collect(),
            failing: HashSet::new(),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Registered devices that reject every command.
    pub fn failing(mut self, devices: &[&str]) -> Self {
        self.failing = devices.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn sent(&self) -> Vec<SentCommand> {
        lock(&self.sent).clone()
    }
}

impl HapticPort for RecordingHaptics {
    fn available_devices(&self) -> Vec<String> {
        self.devices.clone()
    }

    fn send_command(
        &self,
        device_id: &str,
        mode: HapticMode,
        intensity: u8,
        duration_ms: u64,
    ) -> Result<(), DeviceError> {
        lock(&self.sent).push(SentCommand {
            device_id: device_id.to_string(),
            mode,
            intensity,
            duration_ms,
        });
        if self.failing.contains(device_id) {
            return Err(DeviceError::Rejected {
                device_id: device_id.to_string(),
                reason: "offline".to_string(),
            });
        }
        Ok(())
    }
}

/// Ledger that rejects every write and counts attempts.
#[derive(Debug, Default)]
pub struct FailingLedger {
    attempts: Mutex<u64>,
}

impl FailingLedger {
    pub fn attempts(&self) -> u64 {
        *lock(&self.attempts)
    }
}

impl Ledger for FailingLedger {
    fn apply_reward(&self, _: &str, _: i64, _: i64) -> Result<(), LedgerError> {
        *lock(&self.attempts) += 1;
        Err(LedgerError::Unavailable("maintenance".to_string()))
    }
}

fn segment(label: &str, weight: f64, currency: i64, xp: i64) -> Segment {
    Segment {
        label: label.to_string(),
        weight,
        reward: RewardSpec {
            currency,
            xp,
            multiplier: None,
        },
        haptic: None,
    }
}

/// Wheel with `count` equally weighted segments worth 10 currency each.
pub fn equal_wheel(count: usize) -> BoardConfig {
    BoardConfig {
        id: "equal-wheel".to_string(),
        name: "Equal wheel".to_string(),
        channel: "main".to_string(),
        segments: (0..count)
            .map(|i| segment(&format!("prize-{i}"), 1.0, 10, 1))
            .collect(),
        settings: BoardSettings::Wheel(WheelSettings::default()),
    }
}

/// Five-segment wheel with mixed weights and one haptic segment.
pub fn sample_wheel() -> BoardConfig {
    let mut segments = vec![
        segment("Jackpot", 1.0, 500, 50),
        segment("Big", 2.0, 100, 10),
        segment("Small", 4.0, 25, 5),
        segment("Nothing", 6.0, 0, 0),
        segment("Buzz", 2.0, 0, 2),
    ];
    segments[4].haptic = Some(HapticSpec {
        device_ids: Vec::new(),
        mode: HapticMode::Vibrate,
        intensity: 40,
        duration_ms: 1_000,
    });
    BoardConfig {
        id: "sample-wheel".to_string(),
        name: "Sample wheel".to_string(),
        channel: "main".to_string(),
        segments,
        settings: BoardSettings::Wheel(WheelSettings::default()),
    }
}

/// Seven-slot drop board with a symmetric multiplier table.
pub fn sample_drop() -> BoardConfig {
    let multipliers = vec![5.0, 2.0, 0.5, 0.2, 0.5, 2.0, 5.0];
    BoardConfig {
        id: "sample-drop".to_string(),
        name: "Sample drop".to_string(),
        channel: "main".to_string(),
        segments: multipliers
            .iter()
            .enumerate()
            .map(|(i, m)| segment(&format!("x{m}"), 1.0, i as i64, 1))
            .collect(),
        settings: BoardSettings::Plinko(DropSettings {
            multipliers,
            ..DropSettings::default()
        }),
    }
}

/// Segment whose reward fires a haptic command at `device_ids`.
pub fn haptic_segment(device_ids: &[&str], intensity: u32, duration_ms: u64) -> Segment {
    let mut segment = segment("Zap", 1.0, 5, 0);
    segment.haptic = Some(HapticSpec {
        device_ids: device_ids.iter().map(|d| d.to_string()).collect(),
        mode: HapticMode::Shock,
        intensity,
        duration_ms,
    });
    segment
}

pub fn play_request(request_id: &str, board_id: &str, mode: PlayMode) -> PlayRequest {
    PlayRequest {
        request_id: request_id.to_string(),
        board_id: board_id.to_string(),
        actor_id: "viewer-1".to_string(),
        actor_display_name: "Viewer One".to_string(),
        stake: 0,
        enqueued_at_ms: 0,
        mode,
    }
}
