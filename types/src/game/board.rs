use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use super::{
    BoardId, ChannelId, DEFAULT_FULL_ROTATIONS, DEFAULT_LANDING_ZONE, DEFAULT_SPIN_DURATION_MS,
    MAX_DROP_ROWS, MAX_DROP_SLOTS, MAX_FULL_ROTATIONS, MAX_HAPTIC_DURATION_MS,
    MAX_HAPTIC_INTENSITY, MAX_LABEL_LENGTH, MAX_LANDING_ZONE, MAX_SPIN_DURATION_MS,
    MAX_WHEEL_SEGMENTS, MIN_DROP_ROWS, MIN_DROP_SLOTS, MIN_HAPTIC_DURATION_MS,
    MIN_HAPTIC_INTENSITY, MIN_SPIN_DURATION_MS,
};

/// Errors raised when a board (or a request against it) cannot be played.
///
/// These are the only errors surfaced back to trigger sources: a play that
/// fails validation is never queued.
#[derive(Clone, Debug, ThisError, PartialEq)]
pub enum ConfigError {
    #[error("board not found: {0}")]
    MissingBoard(BoardId),
    #[error("board {board_id} has no segments")]
    EmptyBoard { board_id: BoardId },
    #[error("board {board_id} weights sum to zero")]
    ZeroTotalWeight { board_id: BoardId },
    #[error("board {board_id} segment {index} has invalid weight {weight}")]
    InvalidWeight {
        board_id: BoardId,
        index: usize,
        weight: f64,
    },
    #[error("board {board_id} segment {index} label too long (len={len}, max={max})")]
    LabelTooLong {
        board_id: BoardId,
        index: usize,
        len: usize,
        max: usize,
    },
    #[error("board {board_id}: {field} out of range ({detail})")]
    OutOfRange {
        board_id: BoardId,
        field: &'static str,
        detail: String,
    },
    #[error("board {board_id} multiplier table has {got} entries, expected {expected}")]
    MultiplierTableMismatch {
        board_id: BoardId,
        expected: usize,
        got: usize,
    },
}

/// Game kind rendered by a board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardKind {
    Wheel,
    Plinko,
}

impl BoardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoardKind::Wheel => "wheel",
            BoardKind::Plinko => "plinko",
        }
    }
}

/// Physical stimulus a haptic device can issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HapticMode {
    /// Discrete pulse.
    Shock,
    /// Continuous vibration.
    Vibrate,
}

/// Hardware stimulus attached to a segment/slot reward.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HapticSpec {
    /// Target devices. Empty means "first available device".
    #[serde(default)]
    pub device_ids: Vec<String>,
    pub mode: HapticMode,
    pub intensity: u32,
    pub duration_ms: u64,
}

/// Ledger reward attached to a segment/slot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardSpec {
    #[serde(default)]
    pub currency: i64,
    #[serde(default)]
    pub xp: i64,
    /// Optional stake multiplier (wheel segments). Drop boards use the
    /// slot multiplier table instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f64>,
}

/// One wheel segment or drop-board slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub label: String,
    pub weight: f64,
    #[serde(default)]
    pub reward: RewardSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub haptic: Option<HapticSpec>,
}

/// Wheel presentation and landing parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WheelSettings {
    pub spin_duration_ms: u64,
    pub full_rotations: u32,
    /// Fraction of a segment (centered) the stop angle may land in.
    pub landing_zone: f64,
}

impl Default for WheelSettings {
    fn default() -> Self {
        Self {
            spin_duration_ms: DEFAULT_SPIN_DURATION_MS,
            full_rotations: DEFAULT_FULL_ROTATIONS,
            landing_zone: DEFAULT_LANDING_ZONE,
        }
    }
}

/// Peg lattice and rigid-body parameters for a drop board.
///
/// Units are abstract board units (one unit = one slot width at the default
/// spacing) and seconds. The board's segment list defines the bottom slots,
/// left to right.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DropSettings {
    pub rows: u8,
    pub peg_spacing: f64,
    pub row_spacing: f64,
    pub peg_radius: f64,
    pub ball_radius: f64,
    pub gravity: f64,
    pub restitution: f64,
    pub friction: f64,
    /// Maximum horizontal offset applied to the drop position.
    pub jitter: f64,
    /// Fixed simulation step in seconds.
    pub time_step: f64,
    pub max_steps: u32,
    /// Record a trajectory point every N steps.
    pub sample_every: u32,
    /// Per-slot stake multipliers. Empty disables stake payouts.
    pub multipliers: Vec<f64>,
    /// Animation duration used when the simulation does not terminate.
    pub fallback_duration_ms: u64,
}

impl Default for DropSettings {
    fn default() -> Self {
        Self {
            rows: 10,
            peg_spacing: 1.0,
            row_spacing: 0.9,
            peg_radius: 0.08,
            ball_radius: 0.18,
            gravity: 9.8,
            restitution: 0.45,
            friction: 0.1,
            jitter: 0.35,
            time_step: 1.0 / 240.0,
            max_steps: 20_000,
            sample_every: 4,
            multipliers: Vec::new(),
            fallback_duration_ms: 4_000,
        }
    }
}

/// Kind-specific board settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BoardSettings {
    Wheel(WheelSettings),
    Plinko(DropSettings),
}

/// A playable board as stored by configuration.
///
/// The engine never mutates a board; each play captures its own snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardConfig {
    pub id: BoardId,
    #[serde(default)]
    pub name: String,
    /// Display channel this board animates on.
    pub channel: ChannelId,
    pub segments: Vec<Segment>,
    pub settings: BoardSettings,
}

/// Compact description of a board sent with `config-changed`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSummary {
    pub board_id: BoardId,
    pub name: String,
    pub kind: BoardKind,
    pub segment_count: usize,
    pub total_weight: f64,
    pub labels: Vec<String>,
}

impl BoardConfig {
    pub fn kind(&self) -> BoardKind {
        match self.settings {
            BoardSettings::Wheel(_) => BoardKind::Wheel,
            BoardSettings::Plinko(_) => BoardKind::Plinko,
        }
    }

    pub fn total_weight(&self) -> f64 {
        self.segments.iter().map(|s| s.weight).sum()
    }

    pub fn weights(&self) -> Vec<f64> {
        self.segments.iter().map(|s| s.weight).collect()
    }

    pub fn summary(&self) -> BoardSummary {
        BoardSummary {
            board_id: self.id.clone(),
            name: self.name.clone(),
            kind: self.kind(),
            segment_count: self.segments.len(),
            total_weight: self.total_weight(),
            labels: self.segments.iter().map(|s| s.label.clone()).collect(),
        }
    }

    /// Check every invariant the resolver relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.segments.is_empty() {
            return Err(ConfigError::EmptyBoard {
                board_id: self.id.clone(),
            });
        }
        for (index, segment) in self.segments.iter().enumerate() {
            if !segment.weight.is_finite() || segment.weight < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    board_id: self.id.clone(),
                    index,
                    weight: segment.weight,
                });
            }
            if segment.label.len() > MAX_LABEL_LENGTH {
                return Err(ConfigError::LabelTooLong {
                    board_id: self.id.clone(),
                    index,
                    len: segment.label.len(),
                    max: MAX_LABEL_LENGTH,
                });
            }
            if let Some(multiplier) = segment.reward.multiplier {
                if !multiplier.is_finite() || multiplier < 0.0 {
                    return Err(self.out_of_range(
                        "reward.multiplier",
                        format!("segment {index} has {multiplier}"),
                    ));
                }
            }
        }
        if self.total_weight() <= 0.0 {
            return Err(ConfigError::ZeroTotalWeight {
                board_id: self.id.clone(),
            });
        }
        match &self.settings {
            BoardSettings::Wheel(wheel) => self.validate_wheel(wheel),
            BoardSettings::Plinko(drop) => self.validate_drop(drop),
        }
    }

    fn validate_wheel(&self, wheel: &WheelSettings) -> Result<(), ConfigError> {
        let count = self.segments.len();
        if count < 2 || count > MAX_WHEEL_SEGMENTS {
            return Err(self.out_of_range(
                "segments",
                format!("{count} not in 2..={MAX_WHEEL_SEGMENTS}"),
            ));
        }
        if !(MIN_SPIN_DURATION_MS..=MAX_SPIN_DURATION_MS).contains(&wheel.spin_duration_ms) {
            return Err(self.out_of_range(
                "spinDurationMs",
                format!(
                    "{} not in {MIN_SPIN_DURATION_MS}..={MAX_SPIN_DURATION_MS}",
                    wheel.spin_duration_ms
                ),
            ));
        }
        if wheel.full_rotations == 0 || wheel.full_rotations > MAX_FULL_ROTATIONS {
            return Err(self.out_of_range(
                "fullRotations",
                format!("{} not in 1..={MAX_FULL_ROTATIONS}", wheel.full_rotations),
            ));
        }
        if !wheel.landing_zone.is_finite()
            || wheel.landing_zone < 0.0
            || wheel.landing_zone > MAX_LANDING_ZONE
        {
            return Err(self.out_of_range(
                "landingZone",
                format!("{} not in 0..={MAX_LANDING_ZONE}", wheel.landing_zone),
            ));
        }
        Ok(())
    }

    fn validate_drop(&self, drop: &DropSettings) -> Result<(), ConfigError> {
        let slots = self.segments.len();
        if !(MIN_DROP_SLOTS..=MAX_DROP_SLOTS).contains(&slots) {
            return Err(self.out_of_range(
                "segments",
                format!("{slots} not in {MIN_DROP_SLOTS}..={MAX_DROP_SLOTS}"),
            ));
        }
        if !(MIN_DROP_ROWS..=MAX_DROP_ROWS).contains(&drop.rows) {
            return Err(self.out_of_range(
                "rows",
                format!("{} not in {MIN_DROP_ROWS}..={MAX_DROP_ROWS}", drop.rows),
            ));
        }
        let positive = [
            ("pegSpacing", drop.peg_spacing),
            ("rowSpacing", drop.row_spacing),
            ("pegRadius", drop.peg_radius),
            ("ballRadius", drop.ball_radius),
            ("gravity", drop.gravity),
            ("timeStep", drop.time_step),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(self.out_of_range(field, format!("{value} must be > 0")));
            }
        }
        if drop.peg_radius + drop.ball_radius >= drop.peg_spacing / 2.0 {
            return Err(self.out_of_range(
                "pegRadius",
                "ball cannot pass between pegs".to_string(),
            ));
        }
        for (field, value) in [("restitution", drop.restitution), ("friction", drop.friction)] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(self.out_of_range(field, format!("{value} not in 0..=1")));
            }
        }
        if !drop.jitter.is_finite() || drop.jitter < 0.0 || drop.jitter >= drop.peg_spacing {
            return Err(self.out_of_range(
                "jitter",
                format!("{} not in 0..{}", drop.jitter, drop.peg_spacing),
            ));
        }
        if drop.max_steps == 0 {
            return Err(self.out_of_range("maxSteps", "must be > 0".to_string()));
        }
        if drop.sample_every == 0 {
            return Err(self.out_of_range("sampleEvery", "must be > 0".to_string()));
        }
        if !drop.multipliers.is_empty() {
            if drop.multipliers.len() != slots {
                return Err(ConfigError::MultiplierTableMismatch {
                    board_id: self.id.clone(),
                    expected: slots,
                    got: drop.multipliers.len(),
                });
            }
            if let Some(bad) = drop
                .multipliers
                .iter()
                .find(|m| !m.is_finite() || **m < 0.0)
            {
                return Err(self.out_of_range("multipliers", format!("{bad} must be >= 0")));
            }
        }
        Ok(())
    }

    fn out_of_range(&self, field: &'static str, detail: String) -> ConfigError {
        ConfigError::OutOfRange {
            board_id: self.id.clone(),
            field,
            detail,
        }
    }
}

/// Safety bounds applied to every hardware command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HapticLimits {
    pub min_intensity: u8,
    pub max_intensity: u8,
    pub min_duration_ms: u64,
    pub max_duration_ms: u64,
}

impl Default for HapticLimits {
    fn default() -> Self {
        Self {
            min_intensity: MIN_HAPTIC_INTENSITY,
            max_intensity: MAX_HAPTIC_INTENSITY,
            min_duration_ms: MIN_HAPTIC_DURATION_MS,
            max_duration_ms: MAX_HAPTIC_DURATION_MS,
        }
    }
}

impl HapticLimits {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.min_intensity == 0 || self.min_intensity > self.max_intensity {
            return Err("haptic intensity bounds must satisfy 1 <= min <= max");
        }
        if self.min_duration_ms == 0 || self.min_duration_ms > self.max_duration_ms {
            return Err("haptic duration bounds must satisfy 1 <= min <= max");
        }
        Ok(())
    }

    /// Clamp a spec's intensity and duration into the configured bounds.
    pub fn clamp(&self, spec: &HapticSpec) -> (u8, u64) {
        let intensity = spec
            .intensity
            .clamp(self.min_intensity as u32, self.max_intensity as u32) as u8;
        let duration_ms = spec
            .duration_ms
            .clamp(self.min_duration_ms, self.max_duration_ms);
        (intensity, duration_ms)
    }
}
