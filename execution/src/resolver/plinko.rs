//! Discrete-time ball-drop simulation.
//!
//! One ball falls through a staggered peg lattice and comes to rest in one of
//! the bottom slots. The only entropy is the horizontal jitter applied to the
//! drop position, derived from the play seed, so a drop is fully reproducible
//! from `(settings, slot_count, seed)`.
//!
//! ## Board geometry
//!
//! ```text
//! x: 0 ............................................ W = slots * spacing
//! y = 0            start (W/2 + jitter)
//! row 0 (even)     o     o     o     o     o     o     o     pegs at slot centers
//! row 1 (odd)         o     o     o     o     o     o        pegs at slot edges
//! ...
//! y = floor        | s0  | s1  | s2  | s3  | s4  | s5  | s6  |
//! ```
//!
//! `y` grows downward. Side walls reflect the ball with the configured
//! restitution.

use glam::DVec2;
use prizecast_types::game::{DropSettings, TrajectoryPoint, MIN_DROP_SLOTS};
use thiserror::Error as ThisError;

use super::wheel::weighted_index;
use crate::rng::PlayRng;

/// Domain mixed into the seed for the fallback slot draw.
const FALLBACK_DOMAIN: u64 = 0x9E37_79B9_7F4A_7C15;

/// Minimum separation used to derive a contact normal.
const CONTACT_EPSILON: f64 = 1e-12;

/// The simulated ball failed to reach a slot.
#[derive(Clone, Debug, ThisError, PartialEq)]
pub enum DropError {
    #[error("drop did not terminate within {steps} steps")]
    Diverged {
        steps: u32,
        jitter_offset: f64,
        last: TrajectoryPoint,
    },
}

/// A peg lattice cannot be built for this slot count.
#[derive(Clone, Copy, Debug, ThisError, PartialEq, Eq)]
#[error("drop board needs at least {min} slots (got {slots})")]
pub struct TooFewSlots {
    pub slots: usize,
    pub min: usize,
}

/// Outcome of a completed drop simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct DropSimulation {
    pub slot_index: usize,
    pub start_x: f64,
    pub jitter_offset: f64,
    pub steps: u32,
    pub flight_ms: u64,
    pub trajectory: Vec<TrajectoryPoint>,
}

/// Static peg lattice derived from a board's drop settings.
#[derive(Clone, Debug)]
pub struct PegBoard {
    settings: DropSettings,
    slots: usize,
    /// Pegs grouped by row, top to bottom.
    rows: Vec<Vec<DVec2>>,
    width: f64,
    floor_y: f64,
}

impl PegBoard {
    pub fn new(settings: &DropSettings, slots: usize) -> Result<Self, TooFewSlots> {
        if slots < MIN_DROP_SLOTS {
            return Err(TooFewSlots {
                slots,
                min: MIN_DROP_SLOTS,
            });
        }
        let spacing = settings.peg_spacing;
        let width = slots as f64 * spacing;
        let rows = (0..settings.rows as usize)
            .map(|row| {
                let y = (row as f64 + 1.0) * settings.row_spacing;
                if row % 2 == 0 {
                    (0..slots)
                        .map(|i| DVec2::new((i as f64 + 0.5) * spacing, y))
                        .collect()
                } else {
                    (1..slots)
                        .map(|i| DVec2::new(i as f64 * spacing, y))
                        .collect()
                }
            })
            .collect();
        Ok(Self {
            settings: settings.clone(),
            slots,
            rows,
            width,
            floor_y: (settings.rows as f64 + 1.0) * settings.row_spacing,
        })
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn floor_y(&self) -> f64 {
        self.floor_y
    }

    pub fn peg_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Bottom slot under horizontal position `x`.
    pub fn slot_at(&self, x: f64) -> usize {
        let slot = (x / self.settings.peg_spacing).floor();
        if slot <= 0.0 {
            0
        } else {
            (slot as usize).min(self.slots - 1)
        }
    }

    /// Pegs in the rows that can touch a ball at height `y`.
    fn nearby_pegs(&self, y: f64) -> impl Iterator<Item = &DVec2> {
        let row = (y / self.settings.row_spacing).round() as i64 - 1;
        let first = (row - 1).max(0) as usize;
        let last = ((row + 1).max(-1) + 1) as usize;
        let last = last.min(self.rows.len());
        self.rows[first.min(last)..last].iter().flatten()
    }
}

/// Mutable state of the falling ball.
#[derive(Clone, Copy, Debug)]
struct Ball {
    pos: DVec2,
    vel: DVec2,
}

/// Simulate one drop from `jitter_seed`.
///
/// Runs at most `settings.max_steps` fixed steps; exceeding the cap returns
/// [`DropError::Diverged`] so callers can fall back to [`fallback_slot`].
pub fn simulate_drop(board: &PegBoard, jitter_seed: u64) -> Result<DropSimulation, DropError> {
    let settings = &board.settings;
    let dt = settings.time_step;
    let gravity = DVec2::new(0.0, settings.gravity);
    let radius = settings.ball_radius;
    let contact = settings.ball_radius + settings.peg_radius;

    let mut rng = PlayRng::new(jitter_seed);
    let jitter_offset = rng.range(-settings.jitter, settings.jitter);
    let start_x = board.width / 2.0 + jitter_offset;

    let mut ball = Ball {
        pos: DVec2::new(start_x, 0.0),
        vel: DVec2::ZERO,
    };
    let mut trajectory = vec![point(0, ball.pos, dt)];

    for step in 1..=settings.max_steps {
        // Semi-implicit Euler
        ball.vel += gravity * dt;
        ball.pos += ball.vel * dt;

        for peg in board.nearby_pegs(ball.pos.y) {
            resolve_peg_contact(&mut ball, *peg, contact, settings);
        }
        resolve_walls(&mut ball, radius, board.width, settings.restitution);

        if ball.pos.y >= board.floor_y {
            trajectory.push(point(step, ball.pos, dt));
            return Ok(DropSimulation {
                slot_index: board.slot_at(ball.pos.x),
                start_x,
                jitter_offset,
                steps: step,
                flight_ms: elapsed_ms(step, dt),
                trajectory,
            });
        }
        if step % settings.sample_every == 0 {
            trajectory.push(point(step, ball.pos, dt));
        }
    }

    Err(DropError::Diverged {
        steps: settings.max_steps,
        jitter_offset,
        last: point(settings.max_steps, ball.pos, dt),
    })
}

/// Deterministic weighted slot used when a drop diverges.
pub fn fallback_slot(weights: &[f64], jitter_seed: u64) -> usize {
    let mut rng = PlayRng::new(jitter_seed ^ FALLBACK_DOMAIN);
    weighted_index(weights, &mut rng)
        .map(|draw| draw.index)
        .unwrap_or(weights.len() / 2)
}

fn resolve_peg_contact(ball: &mut Ball, peg: DVec2, contact: f64, settings: &DropSettings) {
    let delta = ball.pos - peg;
    let distance = delta.length();
    if distance >= contact {
        return;
    }
    let normal = if distance > CONTACT_EPSILON {
        delta / distance
    } else {
        DVec2::new(0.0, -1.0)
    };

    // Position correction
    ball.pos = peg + normal * contact;

    let approach = ball.vel.dot(normal);
    if approach < 0.0 {
        let normal_vel = normal * approach;
        let tangent_vel = ball.vel - normal_vel;
        ball.vel = tangent_vel * (1.0 - settings.friction) - normal_vel * settings.restitution;
    }
}

fn resolve_walls(ball: &mut Ball, radius: f64, width: f64, restitution: f64) {
    if ball.pos.x < radius {
        ball.pos.x = radius;
        if ball.vel.x < 0.0 {
            ball.vel.x = -ball.vel.x * restitution;
        }
    } else if ball.pos.x > width - radius {
        ball.pos.x = width - radius;
        if ball.vel.x > 0.0 {
            ball.vel.x = -ball.vel.x * restitution;
        }
    }
}

fn elapsed_ms(step: u32, dt: f64) -> u64 {
    (step as f64 * dt * 1_000.0).round() as u64
}

fn point(step: u32, pos: DVec2, dt: f64) -> TrajectoryPoint {
    TrajectoryPoint {
        t_ms: elapsed_ms(step, dt).min(u32::MAX as u64) as u32,
        x: pos.x,
        y: pos.y,
    }
}
