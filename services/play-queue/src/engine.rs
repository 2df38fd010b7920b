//! Channel registry and public entry points.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use futures::channel::mpsc;
use prizecast_execution::{AntiCheat, CompletionOrigin, Lane, RewardDispatcher, SeedSource};
use prizecast_types::game::{
    test_lane, BoardConfig, BoardSummary, ChannelId, ConfigError, PlayRequest, PushEvent,
};
use thiserror::Error as ThisError;
use tokio::sync::broadcast;
use tracing::info;

use crate::actor::{ChannelActor, ChannelConfig, ChannelSnapshot};
use crate::config::QueueConfig;
use crate::ingress::{CompletionAck, Mailbox};
use crate::playable::BoardPlay;
use crate::store::BoardStore;

/// Why a play was not queued. Surfaced to the trigger source.
#[derive(Clone, Debug, ThisError, PartialEq)]
pub enum EnqueueError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("request {request_id} is already queued or was seen recently")]
    Duplicate { request_id: String },
    #[error("channel {channel} queue is full ({capacity} pending)")]
    QueueFull { channel: ChannelId, capacity: usize },
    #[error("channel {channel} is shut down")]
    ChannelClosed { channel: ChannelId },
}

/// Where an accepted play landed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Enqueued {
    pub channel: ChannelId,
    /// 0 when the play started immediately.
    pub position: usize,
}

struct ChannelHandle {
    mailbox: Mailbox,
    seeds: SeedSource,
}

/// Play-queue engine: one actor per display channel plus the board store.
pub struct Engine {
    config: QueueConfig,
    boards: BoardStore,
    channels: Mutex<BTreeMap<ChannelId, ChannelHandle>>,
    events: broadcast::Sender<PushEvent>,
    live: Lane,
    test: Lane,
    anti_cheat: AntiCheat,
}

impl Engine {
    /// Build an engine and load the boards listed in `config`.
    ///
    /// `live` receives production plays; `test` receives plays on test lanes
    /// and should be built with [`Lane::test`].
    pub fn new(config: QueueConfig, live: Lane, test: Lane) -> Result<Self, ConfigError> {
        let boards = BoardStore::new();
        for board in &config.boards {
            boards.upsert(board.clone())?;
        }
        let (events, _) = broadcast::channel(config.event_buffer.max(1));
        let anti_cheat = AntiCheat::new(config.min_flight_ratio);
        Ok(Self {
            config,
            boards,
            channels: Mutex::new(BTreeMap::new()),
            events,
            live,
            test,
            anti_cheat,
        })
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn boards(&self) -> &BoardStore {
        &self.boards
    }

    /// Subscribe to push events from every channel.
    pub fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.events.subscribe()
    }

    /// Replace a board. The next play uses the new snapshot; queued plays keep
    /// the one they were enqueued with.
    pub fn update_board(&self, board: BoardConfig) -> Result<BoardSummary, ConfigError> {
        let board = self.boards.upsert(board)?;
        let summary = board.summary();
        info!(board_id = %board.id, channel = %board.channel, "board updated");
        let _ = self.events.send(PushEvent::ConfigChanged {
            channel: board.channel.clone(),
            snapshot_summary: summary.clone(),
        });
        Ok(summary)
    }

    /// Validate and queue a play on its board's channel (or test lane).
    pub async fn enqueue(&self, request: PlayRequest) -> Result<Enqueued, EnqueueError> {
        let board = self
            .boards
            .get(&request.board_id)
            .ok_or_else(|| ConfigError::MissingBoard(request.board_id.clone()))?;
        let channel = if request.mode.is_test() {
            test_lane(&board.channel)
        } else {
            board.channel.clone()
        };

        let (mut mailbox, seed) = self.open(&channel);
        let play = BoardPlay::new(request, board, seed);
        let position = mailbox.enqueue(Box::new(play)).await?;
        Ok(Enqueued { channel, position })
    }

    /// Acknowledge that a display client finished animating `request_id`.
    pub async fn complete(
        &self,
        channel: &str,
        request_id: &str,
        origin: CompletionOrigin,
    ) -> CompletionAck {
        match self.mailbox(channel) {
            Some(mut mailbox) => mailbox.complete(request_id.to_string(), origin).await,
            None => CompletionAck::NotActive,
        }
    }

    /// Remove every pending play on `channel`. The active play is untouched.
    pub async fn clear_pending(&self, channel: &str) -> usize {
        match self.mailbox(channel) {
            Some(mut mailbox) => mailbox.clear_pending().await,
            None => 0,
        }
    }

    pub async fn snapshot(&self, channel: &str) -> Option<ChannelSnapshot> {
        self.mailbox(channel)?.snapshot().await
    }

    /// Channels with a running actor.
    pub fn channels(&self) -> Vec<ChannelId> {
        self.lock_channels().keys().cloned().collect()
    }

    /// Drop every channel mailbox. Actors exit once in-flight messages drain.
    pub fn shutdown(&self) {
        let closed = std::mem::take(&mut *self.lock_channels());
        info!(channels = closed.len(), "play queue shut down");
    }

    fn mailbox(&self, channel: &str) -> Option<Mailbox> {
        self.lock_channels()
            .get(channel)
            .map(|handle| handle.mailbox.clone())
    }

    /// Mailbox for `channel` plus the next seed from its stream, spawning the
    /// channel actor on first use.
    fn open(&self, channel: &str) -> (Mailbox, u64) {
        let mut channels = self.lock_channels();
        let handle = channels
            .entry(channel.to_string())
            .or_insert_with(|| self.spawn(channel));
        (handle.mailbox.clone(), handle.seeds.next_seed())
    }

    fn spawn(&self, channel: &str) -> ChannelHandle {
        let (sender, receiver) = mpsc::channel(self.config.mailbox_size);
        let dispatcher = RewardDispatcher::new(
            self.live.clone(),
            self.test.clone(),
            self.config.haptic_limits.clone(),
            self.config.idempotency_window,
        );
        let actor = ChannelActor::new(
            channel.to_string(),
            ChannelConfig {
                max_pending: self.config.max_pending,
                safety_factor: self.config.safety_factor,
                dedupe_ttl: self.config.dedupe_ttl(),
            },
            receiver,
            self.events.clone(),
            dispatcher,
            self.anti_cheat,
        );
        tokio::spawn(actor.run());
        info!(channel, "channel actor spawned");
        ChannelHandle {
            mailbox: Mailbox::new(channel.to_string(), sender),
            seeds: SeedSource::for_stream(self.config.master_seed, channel),
        }
    }

    fn lock_channels(&self) -> MutexGuard<'_, BTreeMap<ChannelId, ChannelHandle>> {
        self.channels
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
