use serde::{Deserialize, Serialize};

use super::{BoardConfig, DropResolution, DropSettings};

/// A sampled ball position along a drop trajectory.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrajectoryPoint {
    pub t_ms: u32,
    pub x: f64,
    pub y: f64,
}

/// Terminal visual state a client must reach.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AnimationEndpoint {
    /// Clients reset to 0° and rotate forward by `final_rotation_degrees`.
    #[serde(rename_all = "camelCase")]
    Wheel {
        final_rotation_degrees: f64,
        landing_angle_degrees: f64,
        segment_count: u32,
        full_rotations: u32,
        winning_index: usize,
    },
    /// Clients replay `trajectory` (or re-simulate from `drop_seed` and
    /// `physics`) and must come to rest in `final_slot_index`.
    #[serde(rename_all = "camelCase")]
    Plinko {
        final_slot_index: usize,
        drop_seed: u64,
        start_x: f64,
        physics: DropSettings,
        resolution: DropResolution,
        trajectory: Vec<TrajectoryPoint>,
    },
}

/// Self-sufficient payload a display client needs to render a decided play.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationContract {
    pub request_id: String,
    /// Animation length. Clients use this value verbatim.
    pub duration_ms: u64,
    pub endpoint: AnimationEndpoint,
    pub board: BoardConfig,
}

impl AnimationContract {
    pub fn winning_index(&self) -> usize {
        match &self.endpoint {
            AnimationEndpoint::Wheel { winning_index, .. } => *winning_index,
            AnimationEndpoint::Plinko {
                final_slot_index, ..
            } => *final_slot_index,
        }
    }
}
