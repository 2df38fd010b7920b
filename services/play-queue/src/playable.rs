//! Queue-facing play handles.
//!
//! The channel actor only sees [`Playable`]: it never inspects board kinds,
//! so wheel and drop plays share one FIFO.

use std::sync::Arc;

use prizecast_execution::{build_contract, resolve, ContractError, PlayContext};
use prizecast_types::game::{AnimationContract, BoardConfig, ConfigError, OutcomeResult, PlayRequest};
use thiserror::Error as ThisError;

/// A play could not be started.
#[derive(Clone, Debug, ThisError, PartialEq)]
pub enum StartError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Contract(#[from] ContractError),
}

/// Everything produced when a play becomes active.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayStart {
    pub outcome: OutcomeResult,
    pub contract: AnimationContract,
}

/// An opaque queue entry.
pub trait Playable: Send + 'static {
    fn request(&self) -> &PlayRequest;

    /// Decide the outcome and build the animation contract. Called once, when
    /// the entry is promoted to active.
    fn start(&mut self, now_ms: u64) -> Result<PlayStart, StartError>;
}

/// A play against a board snapshot captured at enqueue time.
#[derive(Clone, Debug)]
pub struct BoardPlay {
    request: PlayRequest,
    snapshot: Arc<BoardConfig>,
    seed: u64,
}

impl BoardPlay {
    pub fn new(request: PlayRequest, snapshot: Arc<BoardConfig>, seed: u64) -> Self {
        Self {
            request,
            snapshot,
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Playable for BoardPlay {
    fn request(&self) -> &PlayRequest {
        &self.request
    }

    fn start(&mut self, now_ms: u64) -> Result<PlayStart, StartError> {
        let resolved = resolve(
            &self.snapshot,
            &PlayContext {
                request: &self.request,
                seed: self.seed,
                now_ms,
            },
        )?;
        let contract = build_contract(&resolved, &self.snapshot)?;
        Ok(PlayStart {
            outcome: resolved.outcome,
            contract,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prizecast_execution::mocks::{play_request, sample_wheel};
    use prizecast_types::game::PlayMode;

    #[test]
    fn test_snapshot_is_isolated_from_later_edits() {
        let mut board = sample_wheel();
        let snapshot = Arc::new(board.clone());
        let mut play = BoardPlay::new(
            play_request("r1", &board.id, PlayMode::Live),
            snapshot,
            3,
        );

        // An edit after enqueue shrinks the live board.
        board.segments.truncate(2);

        let start = play.start(0).expect("play starts");
        assert!(start.outcome.winning_index < 5);
        assert_eq!(start.contract.board.segments.len(), 5);
        assert_eq!(start.contract.request_id, "r1");
    }

    #[test]
    fn test_same_seed_same_start() {
        let board = Arc::new(sample_wheel());
        let request = play_request("r1", &board.id, PlayMode::Live);
        let mut a = BoardPlay::new(request.clone(), board.clone(), 9);
        let mut b = BoardPlay::new(request, board, 9);
        assert_eq!(a.start(5).unwrap(), b.start(5).unwrap());
    }
}
