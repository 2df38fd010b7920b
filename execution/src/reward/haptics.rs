//! Hardware stimulus port.

use prizecast_types::game::HapticMode;
use thiserror::Error as ThisError;

/// Per-device failure. Never fatal to a dispatch.
#[derive(Clone, Debug, ThisError, PartialEq, Eq)]
pub enum DeviceError {
    #[error("device {0} unavailable")]
    Unavailable(String),
    #[error("device {device_id} rejected command: {reason}")]
    Rejected { device_id: String, reason: String },
    #[error("no haptic device registered")]
    NoneRegistered,
    #[error("all haptic devices failed")]
    AllFailed,
}

/// Registry and command channel for networked haptic devices.
pub trait HapticPort: Send + Sync {
    /// Devices currently reachable, in preference order.
    fn available_devices(&self) -> Vec<String>;

    fn send_command(
        &self,
        device_id: &str,
        mode: HapticMode,
        intensity: u8,
        duration_ms: u64,
    ) -> Result<(), DeviceError>;

    /// Whether this port may emit hardware output at all.
    fn enabled(&self) -> bool {
        true
    }
}

/// Port injected into the test lane. Emits nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHaptics;

impl HapticPort for NoopHaptics {
    fn available_devices(&self) -> Vec<String> {
        Vec::new()
    }

    fn send_command(&self, _: &str, _: HapticMode, _: u8, _: u64) -> Result<(), DeviceError> {
        Ok(())
    }

    fn enabled(&self) -> bool {
        false
    }
}
