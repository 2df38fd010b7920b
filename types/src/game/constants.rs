/// Maximum number of segments on a wheel board.
pub const MAX_WHEEL_SEGMENTS: usize = 64;

/// Maximum number of bottom slots on a drop board.
pub const MAX_DROP_SLOTS: usize = 32;

/// Minimum number of bottom slots on a drop board.
pub const MIN_DROP_SLOTS: usize = 2;

/// Peg rows allowed on a drop board.
pub const MIN_DROP_ROWS: u8 = 2;
pub const MAX_DROP_ROWS: u8 = 24;

/// Full rotations a wheel completes before landing (when not configured).
pub const DEFAULT_FULL_ROTATIONS: u32 = 5;

/// Upper bound on configured full rotations.
pub const MAX_FULL_ROTATIONS: u32 = 50;

/// Default wheel spin duration.
pub const DEFAULT_SPIN_DURATION_MS: u64 = 6_000;

/// Spin durations outside this range are rejected.
pub const MIN_SPIN_DURATION_MS: u64 = 500;
pub const MAX_SPIN_DURATION_MS: u64 = 60_000;

/// Fraction of a segment the stop angle may wander from the segment center.
pub const DEFAULT_LANDING_ZONE: f64 = 0.8;

/// Landing zones at or above this would let the stop angle touch a neighbour.
pub const MAX_LANDING_ZONE: f64 = 0.95;

/// Haptic safety bounds.
pub const MIN_HAPTIC_INTENSITY: u8 = 1;
pub const MAX_HAPTIC_INTENSITY: u8 = 100;
pub const MIN_HAPTIC_DURATION_MS: u64 = 300;
pub const MAX_HAPTIC_DURATION_MS: u64 = 30_000;

/// Maximum label length for segments, slots, and board names.
pub const MAX_LABEL_LENGTH: usize = 64;
