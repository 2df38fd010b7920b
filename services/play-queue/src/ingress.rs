use futures::{
    channel::{mpsc, oneshot},
    SinkExt,
};
use prizecast_execution::CompletionOrigin;
use tracing::warn;

use crate::actor::ChannelSnapshot;
use crate::engine::EnqueueError;
use crate::playable::Playable;

/// Reply to a completion acknowledgment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompletionAck {
    /// The active play was completed. `flagged` marks an implausibly early
    /// client acknowledgment.
    Completed { flagged: bool },
    /// The request is not the active play on this channel.
    NotActive,
}

/// Messages sent to a channel actor.
pub enum Message {
    Enqueue {
        play: Box<dyn Playable>,
        response: oneshot::Sender<Result<usize, EnqueueError>>,
    },
    Complete {
        request_id: String,
        origin: CompletionOrigin,
        response: oneshot::Sender<CompletionAck>,
    },
    ClearPending {
        response: oneshot::Sender<usize>,
    },
    Snapshot {
        response: oneshot::Sender<ChannelSnapshot>,
    },
}

/// Mailbox for a channel actor.
#[derive(Clone)]
pub struct Mailbox {
    channel: String,
    sender: mpsc::Sender<Message>,
}

impl Mailbox {
    pub(crate) fn new(channel: String, sender: mpsc::Sender<Message>) -> Self {
        Self { channel, sender }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Queue a play. Returns its position: 0 when it started immediately.
    pub async fn enqueue(&mut self, play: Box<dyn Playable>) -> Result<usize, EnqueueError> {
        let (response, receiver) = oneshot::channel();
        if self
            .sender
            .send(Message::Enqueue { play, response })
            .await
            .is_err()
        {
            warn!(channel = %self.channel, "channel mailbox closed; enqueue dropped");
            return Err(self.closed());
        }
        receiver.await.unwrap_or_else(|_| Err(self.closed()))
    }

    pub async fn complete(&mut self, request_id: String, origin: CompletionOrigin) -> CompletionAck {
        let (response, receiver) = oneshot::channel();
        if self
            .sender
            .send(Message::Complete {
                request_id,
                origin,
                response,
            })
            .await
            .is_err()
        {
            warn!(channel = %self.channel, "channel mailbox closed; completion dropped");
            return CompletionAck::NotActive;
        }
        receiver.await.unwrap_or(CompletionAck::NotActive)
    }

    /// Drop every pending entry. Returns how many were removed.
    pub async fn clear_pending(&mut self) -> usize {
        let (response, receiver) = oneshot::channel();
        if self
            .sender
            .send(Message::ClearPending { response })
            .await
            .is_err()
        {
            warn!(channel = %self.channel, "channel mailbox closed; clear dropped");
            return 0;
        }
        receiver.await.unwrap_or(0)
    }

    pub async fn snapshot(&mut self) -> Option<ChannelSnapshot> {
        let (response, receiver) = oneshot::channel();
        if self
            .sender
            .send(Message::Snapshot { response })
            .await
            .is_err()
        {
            warn!(channel = %self.channel, "channel mailbox closed; snapshot dropped");
            return None;
        }
        receiver.await.ok()
    }

    fn closed(&self) -> EnqueueError {
        EnqueueError::ChannelClosed {
            channel: self.channel.clone(),
        }
    }
}
