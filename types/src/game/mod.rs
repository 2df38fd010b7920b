//! Prize-game domain types.
//!
//! Defines boards, play requests, outcomes, animation contracts, reward
//! reports, and the push events shared by the execution layer, the play
//! queue, and display clients.

mod board;
mod constants;
mod contract;
mod events;
mod play;
mod reward;

pub use board::*;
pub use constants::*;
pub use contract::*;
pub use events::*;
pub use play::*;
pub use reward::*;

/// Identifier of a board in configuration storage.
pub type BoardId = String;

/// Identifier of a display channel (one independent queue).
pub type ChannelId = String;

#[cfg(test)]
mod tests;
