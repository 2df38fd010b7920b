use serde::{Deserialize, Serialize};

use super::{HapticMode, PlayMode};

/// Command issued to one or more haptic devices. Fire-and-forget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HapticCommand {
    pub device_ids: Vec<String>,
    pub mode: HapticMode,
    pub intensity: u8,
    pub duration_ms: u64,
}

/// Result of commanding a single device.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceOutcome {
    pub device_id: String,
    /// False when the device was skipped without sending a command.
    pub attempted: bool,
    pub success: bool,
    /// Set when the device was chosen because the configured list was empty
    /// or entirely unreachable.
    pub fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What happened to the ledger side of a dispatch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LedgerOutcome {
    Applied { currency: i64, xp: i64 },
    /// Already dispatched under the same request id.
    Duplicate,
    Failed { error: String },
}

/// Summary of a reward dispatch, one per completed play.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReport {
    pub request_id: String,
    pub actor_id: String,
    pub mode: PlayMode,
    pub ledger: LedgerOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<HapticCommand>,
    pub devices: Vec<DeviceOutcome>,
    /// Set when a stimulus was due but no device could take it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_error: Option<String>,
}

impl DispatchReport {
    pub fn is_duplicate(&self) -> bool {
        matches!(self.ledger, LedgerOutcome::Duplicate)
    }

    /// Number of hardware commands actually sent.
    pub fn commands_sent(&self) -> usize {
        self.devices.iter().filter(|d| d.attempted).count()
    }
}

/// Aggregated play statistics for one board.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayStats {
    pub plays: u64,
    pub total_stake: u64,
    pub total_payout: u64,
}

impl PlayStats {
    pub fn record(&mut self, stake: u64, payout: u64) {
        self.plays = self.plays.saturating_add(1);
        self.total_stake = self.total_stake.saturating_add(stake);
        self.total_payout = self.total_payout.saturating_add(payout);
    }

    /// Payout over stake, or `None` when nothing was staked.
    pub fn return_ratio(&self) -> Option<f64> {
        if self.total_stake == 0 {
            return None;
        }
        Some(self.total_payout as f64 / self.total_stake as f64)
    }
}
