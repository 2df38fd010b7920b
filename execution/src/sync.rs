//! Animation contracts.
//!
//! Converts a resolved play into the numeric payload display clients animate
//! to. Every randomness-dependent value is computed here, once, so clients
//! never re-derive anything.
//!
//! ## Wheel rotation
//!
//! ```text
//! segment_angle = 360 / segment_count
//! landing_angle = winning_index * segment_angle + segment_angle / 2 + offset
//! total         = full_rotations * 360 + (360 - landing_angle)
//! ```
//!
//! `offset` is measured from the center of the winning segment. Clients reset
//! to 0° before every spin and rotate forward by `total`, which parks the
//! landing angle under the pointer at 0°.

use prizecast_types::game::{
    AnimationContract, AnimationEndpoint, BoardConfig, BoardSettings, DerivationTrace,
};
use thiserror::Error as ThisError;

use crate::resolver::Resolved;

/// A resolved play does not fit the board it is rendered on.
#[derive(Clone, Debug, ThisError, PartialEq, Eq)]
pub enum ContractError {
    #[error("outcome for {request_id} was resolved as {resolved} but board {board_id} is {board}")]
    KindMismatch {
        request_id: String,
        board_id: String,
        resolved: &'static str,
        board: &'static str,
    },
    #[error("outcome for {request_id} carries no drop simulation")]
    MissingDrop { request_id: String },
}

/// Computed wheel stop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WheelRotation {
    pub segment_angle: f64,
    pub landing_angle: f64,
    pub total_rotation: f64,
}

/// Forward rotation that stops `winning_index` under the pointer.
pub fn wheel_rotation(
    segment_count: usize,
    winning_index: usize,
    offset: f64,
    full_rotations: u32,
) -> WheelRotation {
    let segment_angle = 360.0 / segment_count.max(1) as f64;
    let landing_angle =
        (winning_index as f64 * segment_angle + segment_angle / 2.0 + offset).rem_euclid(360.0);
    WheelRotation {
        segment_angle,
        landing_angle,
        total_rotation: full_rotations as f64 * 360.0 + (360.0 - landing_angle),
    }
}

/// Recover the winning segment from a total forward rotation.
///
/// This is the inverse clients may use to check their own endpoint.
pub fn reconstruct_wheel_index(total_rotation: f64, segment_count: usize) -> usize {
    if segment_count == 0 {
        return 0;
    }
    let segment_angle = 360.0 / segment_count as f64;
    let residual = total_rotation.rem_euclid(360.0);
    let landing_angle = (360.0 - residual).rem_euclid(360.0);
    let index = (landing_angle / segment_angle).floor();
    if index <= 0.0 {
        0
    } else {
        (index as usize).min(segment_count - 1)
    }
}

/// Build the contract broadcast with `play-start`.
pub fn build_contract(
    resolved: &Resolved,
    board: &BoardConfig,
) -> Result<AnimationContract, ContractError> {
    let outcome = &resolved.outcome;
    let (duration_ms, endpoint) = match (&board.settings, &outcome.trace) {
        (
            BoardSettings::Wheel(settings),
            DerivationTrace::Wheel {
                landing_offset_degrees,
                ..
            },
        ) => {
            let rotation = wheel_rotation(
                board.segments.len(),
                outcome.winning_index,
                *landing_offset_degrees,
                settings.full_rotations,
            );
            (
                settings.spin_duration_ms,
                AnimationEndpoint::Wheel {
                    final_rotation_degrees: rotation.total_rotation,
                    landing_angle_degrees: rotation.landing_angle,
                    segment_count: board.segments.len() as u32,
                    full_rotations: settings.full_rotations,
                    winning_index: outcome.winning_index,
                },
            )
        }
        (
            BoardSettings::Plinko(settings),
            DerivationTrace::Plinko {
                seed, resolution, ..
            },
        ) => {
            let drop = resolved
                .drop
                .as_ref()
                .ok_or_else(|| ContractError::MissingDrop {
                    request_id: outcome.request_id.clone(),
                })?;
            (
                drop.flight_ms,
                AnimationEndpoint::Plinko {
                    final_slot_index: outcome.winning_index,
                    drop_seed: *seed,
                    start_x: drop.start_x,
                    physics: settings.clone(),
                    resolution: *resolution,
                    trajectory: drop.trajectory.clone(),
                },
            )
        }
        _ => {
            return Err(ContractError::KindMismatch {
                request_id: outcome.request_id.clone(),
                board_id: board.id.clone(),
                resolved: outcome.kind.as_str(),
                board: board.kind().as_str(),
            })
        }
    };

    Ok(AnimationContract {
        request_id: outcome.request_id.clone(),
        duration_ms,
        endpoint,
        board: board.clone(),
    })
}
