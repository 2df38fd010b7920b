use serde::{Deserialize, Serialize};

use super::{AnimationContract, BoardId, BoardSummary, ChannelId};

/// How an active play left the channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompletionStatus {
    /// A display client acknowledged the animation.
    Acknowledged,
    /// No acknowledgment arrived before the safety timeout.
    TimedOut,
    /// The play could not be started.
    Failed,
    /// Cleared from the pending queue before it started.
    Evicted,
}

/// Result digest broadcast with `play-completed`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeSummary {
    pub board_id: BoardId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winning_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub status: CompletionStatus,
    pub currency: i64,
    pub xp: i64,
    /// The acknowledgment arrived implausibly early (audit only).
    pub flagged: bool,
}

/// Real-time events pushed to display clients, one stream per channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PushEvent {
    #[serde(rename_all = "camelCase")]
    PlayQueued {
        request_id: String,
        position: usize,
        channel: ChannelId,
    },
    #[serde(rename_all = "camelCase")]
    PlayStart {
        channel: ChannelId,
        contract: AnimationContract,
    },
    #[serde(rename_all = "camelCase")]
    PlayCompleted {
        channel: ChannelId,
        request_id: String,
        outcome_summary: OutcomeSummary,
    },
    #[serde(rename_all = "camelCase")]
    ConfigChanged {
        channel: ChannelId,
        snapshot_summary: BoardSummary,
    },
}

impl PushEvent {
    pub fn channel(&self) -> &str {
        match self {
            PushEvent::PlayQueued { channel, .. }
            | PushEvent::PlayStart { channel, .. }
            | PushEvent::PlayCompleted { channel, .. }
            | PushEvent::ConfigChanged { channel, .. } => channel,
        }
    }

    pub fn request_id(&self) -> Option<&str> {
        match self {
            PushEvent::PlayQueued { request_id, .. }
            | PushEvent::PlayCompleted { request_id, .. } => Some(request_id),
            PushEvent::PlayStart { contract, .. } => Some(&contract.request_id),
            PushEvent::ConfigChanged { .. } => None,
        }
    }
}
