//! Prizecast execution layer.
//!
//! This crate decides play outcomes, turns them into animation contracts for
//! display clients, and applies rewards once a play completes. It holds no
//! queue state; the play-queue service drives it.
//!
//! ## Determinism requirements
//! - Do not use wall-clock time inside execution. Timestamps are passed in.
//! - Do not use non-deterministic randomness; derive everything from the play seed.
//! - A resolved outcome is final. Nothing downstream re-rolls it.
//!
//! ## Resolving a play (example)
//! ```rust,ignore
//! use prizecast_execution::{build_contract, resolve, PlayContext, SeedSource};
//!
//! let mut seeds = SeedSource::derived(42, "main");
//! let resolved = resolve(
//!     &board,
//!     &PlayContext {
//!         request: &request,
//!         seed: seeds.next_seed(),
//!         now_ms,
//!     },
//! )?;
//! let contract = build_contract(&resolved, &board)?;
//! ```

pub mod anti_cheat;
pub mod resolver;
pub mod reward;
pub mod rng;
pub mod sync;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

#[cfg(test)]
mod dispatch_tests;

pub use anti_cheat::{AntiCheat, AntiCheatFlag, CompletionEvent, CompletionOrigin, Verdict};
pub use resolver::plinko::{
    fallback_slot, simulate_drop, DropError, DropSimulation, PegBoard, TooFewSlots,
};
pub use resolver::{resolve, PlayContext, Resolved};
pub use reward::{
    DeviceError, HapticPort, Lane, Ledger, LedgerError, MemoryLedger, NoopHaptics, NullLedger,
    RewardDispatcher, StatsLedger,
};
pub use rng::{PlayRng, SeedSource};
pub use sync::{build_contract, reconstruct_wheel_index, wheel_rotation, ContractError, WheelRotation};
