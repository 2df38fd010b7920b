//! Prizecast play queue.
//!
//! Serializes plays per display channel, strictly FIFO across board kinds.
//! Each channel is a single [`actor::ChannelActor`] task fed through a
//! [`ingress::Mailbox`]; the [`Engine`] owns the board store and spawns
//! channel actors on first use.
//!
//! A play moves through the channel as follows:
//! 1. `enqueue` validates the board and captures a snapshot plus a seed.
//! 2. On promotion the outcome is resolved and `play-start` carries the
//!    animation contract.
//! 3. A client acknowledgment (or the safety timeout) completes the play,
//!    dispatches its reward exactly once, and starts the next entry.
//!
//! Test-mode plays run on a separate `<channel>#test` lane whose dispatcher
//! lane never writes production ledgers or drives hardware.

pub mod actor;
pub mod config;
pub mod engine;
pub mod ingress;
pub mod playable;
pub mod store;


pub use actor::{ChannelCounters, ChannelSnapshot, EntryView};
pub use config::{LoadError, QueueConfig};
pub use engine::{Engine, EnqueueError, Enqueued};
pub use ingress::CompletionAck;
pub use playable::{BoardPlay, PlayStart, Playable, StartError};
pub use store::BoardStore;
