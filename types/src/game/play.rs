use serde::{Deserialize, Serialize};

use super::{BoardId, BoardKind, HapticSpec};

/// Suffix appended to a display channel to form its test lane.
pub const TEST_LANE_SUFFIX: &str = "#test";

/// Name of the test lane paired with a display channel.
pub fn test_lane(channel: &str) -> String {
    format!("{channel}{TEST_LANE_SUFFIX}")
}

/// Whether a play settles against production ledgers or the test lane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayMode {
    #[default]
    Live,
    Test,
}

impl PlayMode {
    pub fn is_test(&self) -> bool {
        matches!(self, PlayMode::Test)
    }
}

/// A request to play a board, produced by a trigger source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayRequest {
    pub request_id: String,
    pub board_id: BoardId,
    pub actor_id: String,
    #[serde(default)]
    pub actor_display_name: String,
    #[serde(default)]
    pub stake: u64,
    /// Unix milliseconds at which the trigger fired.
    #[serde(default)]
    pub enqueued_at_ms: u64,
    #[serde(default)]
    pub mode: PlayMode,
}

/// Lifecycle of a queue entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryState {
    Queued,
    Active,
    Completed,
    Failed,
    Evicted,
}

/// How a drop outcome was settled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropResolution {
    /// The simulated ball reached a slot.
    Simulated,
    /// The simulation hit its step cap; the slot came from a weighted draw.
    Fallback,
}

/// Inputs that produced an outcome, kept for audit and replay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DerivationTrace {
    #[serde(rename_all = "camelCase")]
    Wheel {
        seed: u64,
        draw: f64,
        total_weight: f64,
        /// Offset from the winning segment's center, in degrees.
        landing_offset_degrees: f64,
    },
    #[serde(rename_all = "camelCase")]
    Plinko {
        seed: u64,
        jitter_offset: f64,
        steps: u32,
        resolution: DropResolution,
    },
}

impl DerivationTrace {
    pub fn seed(&self) -> u64 {
        match self {
            DerivationTrace::Wheel { seed, .. } | DerivationTrace::Plinko { seed, .. } => *seed,
        }
    }
}

/// Ledger effect decided for a play.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardGrant {
    /// Currency delta, including any stake-multiplier payout.
    pub currency: i64,
    pub xp: i64,
    /// Portion of `currency` derived from the stake multiplier.
    pub stake_payout: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub haptic: Option<HapticSpec>,
}

impl RewardGrant {
    /// Amount counted as payout in statistics ledgers.
    pub fn payout(&self) -> u64 {
        self.currency.max(0) as u64
    }
}

/// The decided outcome of a play. Immutable once produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeResult {
    pub request_id: String,
    pub board_id: BoardId,
    pub kind: BoardKind,
    pub winning_index: usize,
    pub label: String,
    pub stake: u64,
    pub reward: RewardGrant,
    pub trace: DerivationTrace,
    pub computed_at_ms: u64,
}
