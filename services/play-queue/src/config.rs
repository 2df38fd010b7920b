//! Service configuration.
//!
//! Loaded from an optional JSON file (missing keys keep their defaults) and
//! then overridden from `PRIZECAST_*` environment variables.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use prizecast_execution::anti_cheat::DEFAULT_MIN_FLIGHT_RATIO;
use prizecast_execution::reward::DEFAULT_IDEMPOTENCY_WINDOW;
use prizecast_types::game::{BoardConfig, HapticLimits};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

/// Default multiple of the animation duration before a play is force-completed.
pub const DEFAULT_SAFETY_FACTOR: f64 = 3.0;
/// Default maximum pending (non-active) entries per channel.
pub const DEFAULT_MAX_PENDING: usize = 256;
/// Default window during which a request id cannot be enqueued again.
pub const DEFAULT_DEDUPE_TTL_MS: u64 = 600_000;
/// Default per-channel mailbox depth.
pub const DEFAULT_MAILBOX_SIZE: usize = 1_024;
/// Default push-event buffer shared by all channels.
pub const DEFAULT_EVENT_BUFFER: usize = 1_024;

#[derive(Debug, ThisError)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for the play-queue engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueueConfig {
    /// Multiple of the contract duration allowed before a missing
    /// acknowledgment is treated as a timeout.
    pub safety_factor: f64,

    /// Fraction of the contract duration a client acknowledgment must cover
    /// to avoid an anti-cheat flag.
    pub min_flight_ratio: f64,

    /// Maximum queued entries per channel, excluding the active play.
    pub max_pending: usize,

    /// How long a request id is remembered for duplicate rejection.
    pub dedupe_ttl_ms: u64,

    pub mailbox_size: usize,
    pub event_buffer: usize,

    /// Request ids remembered by each dispatcher for idempotency.
    pub idempotency_window: usize,

    pub haptic_limits: HapticLimits,

    /// Derive per-channel seed streams from this value instead of OS entropy.
    pub master_seed: Option<u64>,

    /// Boards loaded at startup.
    pub boards: Vec<BoardConfig>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            safety_factor: DEFAULT_SAFETY_FACTOR,
            min_flight_ratio: DEFAULT_MIN_FLIGHT_RATIO,
            max_pending: DEFAULT_MAX_PENDING,
            dedupe_ttl_ms: DEFAULT_DEDUPE_TTL_MS,
            mailbox_size: DEFAULT_MAILBOX_SIZE,
            event_buffer: DEFAULT_EVENT_BUFFER,
            idempotency_window: DEFAULT_IDEMPOTENCY_WINDOW,
            haptic_limits: HapticLimits::default(),
            master_seed: None,
            boards: Vec::new(),
        }
    }
}

impl QueueConfig {
    /// Read a JSON config file. Keys absent from the file keep their defaults.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let raw = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `PRIZECAST_*` overrides from the process environment.
    pub fn with_env(self) -> Result<Self, LoadError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`. Unparseable values are rejected.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, LoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = read(&lookup, "PRIZECAST_SAFETY_FACTOR")? {
            self.safety_factor = value;
        }
        if let Some(value) = read(&lookup, "PRIZECAST_MIN_FLIGHT_RATIO")? {
            self.min_flight_ratio = value;
        }
        if let Some(value) = read(&lookup, "PRIZECAST_MAX_PENDING")? {
            self.max_pending = value;
        }
        if let Some(value) = read(&lookup, "PRIZECAST_DEDUPE_TTL_MS")? {
            self.dedupe_ttl_ms = value;
        }
        if let Some(value) = read(&lookup, "PRIZECAST_MASTER_SEED")? {
            self.master_seed = Some(value);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), LoadError> {
        if !self.safety_factor.is_finite() || self.safety_factor < 1.0 {
            return Err(LoadError::Invalid(format!(
                "safetyFactor must be >= 1 (got {})",
                self.safety_factor
            )));
        }
        if !(0.0..=1.0).contains(&self.min_flight_ratio) {
            return Err(LoadError::Invalid(format!(
                "minFlightRatio must be within [0, 1] (got {})",
                self.min_flight_ratio
            )));
        }
        if self.max_pending == 0 || self.mailbox_size == 0 || self.event_buffer == 0 {
            return Err(LoadError::Invalid(
                "maxPending, mailboxSize and eventBuffer must be > 0".to_string(),
            ));
        }
        self.haptic_limits
            .validate()
            .map_err(|err| LoadError::Invalid(err.to_string()))?;
        for board in &self.boards {
            board
                .validate()
                .map_err(|err| LoadError::Invalid(err.to_string()))?;
        }
        Ok(())
    }

    pub fn dedupe_ttl(&self) -> Duration {
        Duration::from_millis(self.dedupe_ttl_ms)
    }
}

fn read<T, F>(lookup: &F, key: &str) -> Result<Option<T>, LoadError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<T>()
        .map(Some)
        .map_err(|_| LoadError::Invalid(format!("{key} has invalid value {trimmed:?}")))
}
