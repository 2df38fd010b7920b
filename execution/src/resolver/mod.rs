//! Outcome resolution.
//!
//! [`resolve`] is the only place an outcome is decided. It runs before any
//! animation is scheduled, consumes nothing but the board snapshot and the
//! play seed, and returns an immutable [`OutcomeResult`] plus the drop
//! simulation (for plinko boards) needed to build the animation contract.

pub mod plinko;
pub mod wheel;

use prizecast_types::game::{
    BoardConfig, BoardSettings, ConfigError, DerivationTrace, DropResolution, DropSettings,
    OutcomeResult, PlayRequest, RewardGrant, Segment, WheelSettings,
};
use tracing::{debug, warn};

use crate::rng::PlayRng;
use plinko::{fallback_slot, simulate_drop, DropError, DropSimulation, PegBoard};
use wheel::{landing_offset, weighted_index};

/// Inputs for resolving one play.
#[derive(Clone, Copy, Debug)]
pub struct PlayContext<'a> {
    pub request: &'a PlayRequest,
    pub seed: u64,
    /// Stamped on the outcome. Never read as a source of randomness.
    pub now_ms: u64,
}

/// A decided play.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolved {
    pub outcome: OutcomeResult,
    /// Present for plinko boards. On fallback the trajectory is empty and
    /// `flight_ms` holds the configured fallback duration.
    pub drop: Option<DropSimulation>,
}

/// Decide the outcome of a play against `board`.
///
/// Fails only when the board is unplayable; a diverging drop simulation
/// falls back to a weighted slot draw instead of failing.
pub fn resolve(board: &BoardConfig, ctx: &PlayContext<'_>) -> Result<Resolved, ConfigError> {
    if board.id != ctx.request.board_id {
        return Err(ConfigError::MissingBoard(ctx.request.board_id.clone()));
    }
    board.validate()?;

    let (index, trace, drop) = match &board.settings {
        BoardSettings::Wheel(settings) => {
            let (index, trace) = resolve_wheel(board, settings, ctx.seed)?;
            (index, trace, None)
        }
        BoardSettings::Plinko(settings) => {
            let (index, trace, drop) = resolve_drop(board, settings, ctx.seed)?;
            (index, trace, Some(drop))
        }
    };

    let segment = &board.segments[index];
    let reward = grant(segment, multiplier(board, index), ctx.request.stake);
    debug!(
        request_id = %ctx.request.request_id,
        board_id = %board.id,
        kind = board.kind().as_str(),
        winning_index = index,
        seed = ctx.seed,
        currency = reward.currency,
        xp = reward.xp,
        "resolved play"
    );

    Ok(Resolved {
        outcome: OutcomeResult {
            request_id: ctx.request.request_id.clone(),
            board_id: board.id.clone(),
            kind: board.kind(),
            winning_index: index,
            label: segment.label.clone(),
            stake: ctx.request.stake,
            reward,
            trace,
            computed_at_ms: ctx.now_ms,
        },
        drop,
    })
}

fn resolve_wheel(
    board: &BoardConfig,
    settings: &WheelSettings,
    seed: u64,
) -> Result<(usize, DerivationTrace), ConfigError> {
    let mut rng = PlayRng::new(seed);
    let draw = weighted_index(&board.weights(), &mut rng).ok_or_else(|| {
        ConfigError::ZeroTotalWeight {
            board_id: board.id.clone(),
        }
    })?;
    let segment_angle = 360.0 / board.segments.len() as f64;
    let offset = landing_offset(segment_angle, settings.landing_zone, &mut rng);
    Ok((
        draw.index,
        DerivationTrace::Wheel {
            seed,
            draw: draw.draw,
            total_weight: draw.total_weight,
            landing_offset_degrees: offset,
        },
    ))
}

fn resolve_drop(
    board: &BoardConfig,
    settings: &DropSettings,
    seed: u64,
) -> Result<(usize, DerivationTrace, DropSimulation), ConfigError> {
    let pegs = PegBoard::new(settings, board.segments.len()).map_err(|err| {
        ConfigError::OutOfRange {
            board_id: board.id.clone(),
            field: "segments",
            detail: err.to_string(),
        }
    })?;
    let (simulation, resolution) = match simulate_drop(&pegs, seed) {
        Ok(simulation) => (simulation, DropResolution::Simulated),
        Err(DropError::Diverged {
            steps,
            jitter_offset,
            last,
        }) => {
            let slot_index = fallback_slot(&board.weights(), seed);
            warn!(
                board_id = %board.id,
                seed,
                steps,
                last_x = last.x,
                last_y = last.y,
                slot_index,
                "drop simulation diverged, using weighted fallback"
            );
            (
                DropSimulation {
                    slot_index,
                    start_x: pegs.width() / 2.0 + jitter_offset,
                    jitter_offset,
                    steps,
                    flight_ms: settings.fallback_duration_ms,
                    trajectory: Vec::new(),
                },
                DropResolution::Fallback,
            )
        }
    };
    let trace = DerivationTrace::Plinko {
        seed,
        jitter_offset: simulation.jitter_offset,
        steps: simulation.steps,
        resolution,
    };
    Ok((simulation.slot_index, trace, simulation))
}

/// Stake multiplier for the winning index, if any.
///
/// Plinko boards read their slot table first and fall back to the segment's
/// own multiplier.
fn multiplier(board: &BoardConfig, index: usize) -> Option<f64> {
    if let BoardSettings::Plinko(settings) = &board.settings {
        if let Some(value) = settings.multipliers.get(index) {
            return Some(*value);
        }
    }
    board.segments[index].reward.multiplier
}

fn grant(segment: &Segment, multiplier: Option<f64>, stake: u64) -> RewardGrant {
    let stake_payout = match multiplier {
        Some(m) if m.is_finite() && m > 0.0 => {
            let payout = (stake as f64 * m).floor();
            if payout >= u64::MAX as f64 {
                u64::MAX
            } else {
                payout as u64
            }
        }
        _ => 0,
    };
    let payout_delta = i64::try_from(stake_payout).unwrap_or(i64::MAX);
    RewardGrant {
        currency: segment.reward.currency.saturating_add(payout_delta),
        xp: segment.reward.xp,
        stake_payout,
        haptic: segment.haptic.clone(),
    }
}
