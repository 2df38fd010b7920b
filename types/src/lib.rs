//! Common types used throughout prizecast.
//!
//! Everything here is plain data plus validation: no I/O, no clocks, no
//! randomness. The execution crate decides outcomes from these types and the
//! play queue moves them between trigger sources and display clients.

pub mod game;

pub use game::{
    AnimationContract, AnimationEndpoint, BoardConfig, BoardKind, BoardSettings, ConfigError,
    DispatchReport, OutcomeResult, PlayMode, PlayRequest, PushEvent,
};
