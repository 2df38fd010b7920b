//! Per-channel play queue.
//!
//! Each display channel is owned by one [`ChannelActor`]. The actor is the
//! only code that changes which play is active, so at most one play is active
//! per channel without any cross-channel locking.
//!
//! ```text
//! Idle --enqueue--> Active --ack | safety timeout--> Idle
//!                     ^                               |
//!                     +------- next pending entry ----+
//! ```

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures::{channel::mpsc, StreamExt};
use prizecast_execution::{AntiCheat, CompletionEvent, CompletionOrigin, RewardDispatcher};
use prizecast_types::game::{
    BoardId, ChannelId, CompletionStatus, EntryState, OutcomeResult, OutcomeSummary, PlayMode,
    PlayRequest, PushEvent,
};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::engine::EnqueueError;
use crate::ingress::{CompletionAck, Message};
use crate::playable::Playable;

/// Queue limits for one channel.
#[derive(Clone, Debug)]
pub struct ChannelConfig {
    pub max_pending: usize,
    pub safety_factor: f64,
    pub dedupe_ttl: Duration,
}

impl ChannelConfig {
    /// Time allowed for an animation of `duration_ms` before force-completion.
    pub fn safety_timeout(&self, duration_ms: u64) -> Duration {
        let millis = (duration_ms as f64 * self.safety_factor).ceil();
        Duration::from_millis(millis.max(1.0) as u64)
    }
}

/// Lifetime counters for one channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelCounters {
    pub enqueued: u64,
    pub started: u64,
    pub acknowledged: u64,
    pub timed_out: u64,
    pub failed: u64,
    pub evicted: u64,
    pub flagged: u64,
    pub duplicates: u64,
    pub rejected_full: u64,
}

/// A queue entry as seen from outside the actor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryView {
    pub request_id: String,
    pub board_id: BoardId,
    pub actor_id: String,
    pub state: EntryState,
}

impl EntryView {
    fn of(request: &PlayRequest, state: EntryState) -> Self {
        Self {
            request_id: request.request_id.clone(),
            board_id: request.board_id.clone(),
            actor_id: request.actor_id.clone(),
            state,
        }
    }
}

/// Point-in-time view of a channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSnapshot {
    pub channel: ChannelId,
    pub active: Option<EntryView>,
    pub pending: Vec<EntryView>,
    pub counters: ChannelCounters,
}

struct ActivePlay {
    request: PlayRequest,
    outcome: OutcomeResult,
    activated_at: Instant,
    deadline: Instant,
    expected_min_ms: u64,
}

enum State {
    Idle,
    Active(Box<ActivePlay>),
}

/// Request ids seen recently, expired after a fixed TTL.
struct RecentIds {
    ttl: Duration,
    seen: HashMap<String, Instant>,
    order: VecDeque<(Instant, String)>,
}

impl RecentIds {
    fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            seen: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn prune(&mut self, now: Instant) {
        while let Some((at, _)) = self.order.front() {
            if now.duration_since(*at) < self.ttl {
                break;
            }
            if let Some((_, id)) = self.order.pop_front() {
                self.seen.remove(&id);
            }
        }
    }

    /// Returns `false` if `request_id` was seen within the TTL.
    fn insert(&mut self, request_id: &str, now: Instant) -> bool {
        self.prune(now);
        if self.seen.contains_key(request_id) {
            return false;
        }
        self.seen.insert(request_id.to_string(), now);
        self.order.push_back((now, request_id.to_string()));
        true
    }
}

/// Owns the queue for one display channel.
pub struct ChannelActor {
    channel: ChannelId,
    config: ChannelConfig,
    mailbox: mpsc::Receiver<Message>,
    events: broadcast::Sender<PushEvent>,
    dispatcher: RewardDispatcher,
    anti_cheat: AntiCheat,

    state: State,
    pending: VecDeque<Box<dyn Playable>>,
    recent: RecentIds,
    counters: ChannelCounters,
    epoch: Instant,
}

impl ChannelActor {
    pub fn new(
        channel: ChannelId,
        config: ChannelConfig,
        mailbox: mpsc::Receiver<Message>,
        events: broadcast::Sender<PushEvent>,
        dispatcher: RewardDispatcher,
        anti_cheat: AntiCheat,
    ) -> Self {
        let recent = RecentIds::new(config.dedupe_ttl);
        Self {
            channel,
            config,
            mailbox,
            events,
            dispatcher,
            anti_cheat,
            state: State::Idle,
            pending: VecDeque::new(),
            recent,
            counters: ChannelCounters::default(),
            epoch: Instant::now(),
        }
    }

    /// Run until every mailbox sender is dropped.
    pub async fn run(mut self) {
        debug!(channel = %self.channel, "channel actor started");
        loop {
            let deadline = match &self.state {
                State::Active(active) => Some(active.deadline),
                State::Idle => None,
            };
            tokio::select! {
                message = self.mailbox.next() => {
                    let Some(message) = message else {
                        break;
                    };
                    self.handle(message);
                }
                _ = wait_until(deadline) => {
                    self.timeout();
                }
            }
        }
        self.drain();
        debug!(channel = %self.channel, "channel actor stopped");
    }

    /// Settle the active play and evict pending ones once the mailbox closes.
    fn drain(&mut self) {
        if let State::Active(active) = &self.state {
            warn!(
                channel = %self.channel,
                request_id = %active.request.request_id,
                "channel closed with an active play; forcing completion"
            );
            self.counters.timed_out += 1;
            self.settle(CompletionStatus::TimedOut, false);
        }
        if !self.pending.is_empty() {
            self.clear_pending();
        }
    }

    fn handle(&mut self, message: Message) {
        match message {
            Message::Enqueue { play, response } => {
                let result = self.enqueue(play);
                let _ = response.send(result);
            }
            Message::Complete {
                request_id,
                origin,
                response,
            } => {
                let ack = self.complete(&request_id, origin);
                let _ = response.send(ack);
            }
            Message::ClearPending { response } => {
                let _ = response.send(self.clear_pending());
            }
            Message::Snapshot { response } => {
                let _ = response.send(self.snapshot());
            }
        }
    }

    fn enqueue(&mut self, play: Box<dyn Playable>) -> Result<usize, EnqueueError> {
        let request_id = play.request().request_id.clone();
        if self.pending.len() >= self.config.max_pending {
            self.counters.rejected_full += 1;
            warn!(channel = %self.channel, %request_id, "queue full");
            return Err(EnqueueError::QueueFull {
                channel: self.channel.clone(),
                capacity: self.config.max_pending,
            });
        }
        // Dispatched ids stay rejected after the TTL so a re-delivered
        // trigger cannot re-roll or re-pay a finished play.
        if self.is_known(&request_id)
            || self.dispatcher.has_dispatched(&request_id)
            || !self.recent.insert(&request_id, Instant::now())
        {
            self.counters.duplicates += 1;
            debug!(channel = %self.channel, %request_id, "duplicate request rejected");
            return Err(EnqueueError::Duplicate { request_id });
        }

        self.counters.enqueued += 1;
        self.pending.push_back(play);
        let position = match self.state {
            State::Idle => 0,
            State::Active(_) => self.pending.len(),
        };
        self.emit(PushEvent::PlayQueued {
            request_id,
            position,
            channel: self.channel.clone(),
        });
        self.advance();
        Ok(position)
    }

    fn is_known(&self, request_id: &str) -> bool {
        let active = matches!(&self.state, State::Active(a) if a.request.request_id == request_id);
        active
            || self
                .pending
                .iter()
                .any(|play| play.request().request_id == request_id)
    }

    /// Promote pending entries until one starts or the queue is empty.
    fn advance(&mut self) {
        while matches!(self.state, State::Idle) {
            let Some(mut play) = self.pending.pop_front() else {
                return;
            };
            let request = play.request().clone();
            match play.start(unix_ms()) {
                Ok(start) => {
                    let now = Instant::now();
                    let duration_ms = start.contract.duration_ms;
                    let deadline = now + self.config.safety_timeout(duration_ms);
                    self.counters.started += 1;
                    info!(
                        channel = %self.channel,
                        request_id = %request.request_id,
                        board_id = %request.board_id,
                        winning_index = start.outcome.winning_index,
                        duration_ms,
                        "play started"
                    );
                    self.state = State::Active(Box::new(ActivePlay {
                        request,
                        outcome: start.outcome,
                        activated_at: now,
                        deadline,
                        expected_min_ms: self.anti_cheat.expected_min_ms(duration_ms),
                    }));
                    self.emit(PushEvent::PlayStart {
                        channel: self.channel.clone(),
                        contract: start.contract,
                    });
                }
                Err(err) => {
                    self.counters.failed += 1;
                    warn!(
                        channel = %self.channel,
                        request_id = %request.request_id,
                        error = %err,
                        "play failed to start"
                    );
                    self.emit(PushEvent::PlayCompleted {
                        channel: self.channel.clone(),
                        request_id: request.request_id.clone(),
                        outcome_summary: OutcomeSummary {
                            board_id: request.board_id,
                            winning_index: None,
                            label: None,
                            status: CompletionStatus::Failed,
                            currency: 0,
                            xp: 0,
                            flagged: false,
                        },
                    });
                }
            }
        }
    }

    fn complete(&mut self, request_id: &str, origin: CompletionOrigin) -> CompletionAck {
        let active = match &self.state {
            State::Active(active) if active.request.request_id == request_id => active,
            _ => {
                debug!(channel = %self.channel, request_id, "completion for inactive request");
                return CompletionAck::NotActive;
            }
        };
        let event = CompletionEvent {
            request_id: request_id.to_string(),
            origin,
            activated_at_ms: self.millis(active.activated_at),
            acknowledged_at_ms: self.millis(Instant::now()),
        };
        let flagged = self
            .anti_cheat
            .validate(&event, active.expected_min_ms, active.request.mode)
            .is_flagged();
        if flagged {
            self.counters.flagged += 1;
        }
        self.counters.acknowledged += 1;
        self.finish(CompletionStatus::Acknowledged, flagged);
        CompletionAck::Completed { flagged }
    }

    fn timeout(&mut self) {
        if let State::Active(active) = &self.state {
            warn!(
                channel = %self.channel,
                request_id = %active.request.request_id,
                "no completion before safety timeout; forcing completion"
            );
            self.counters.timed_out += 1;
            self.finish(CompletionStatus::TimedOut, false);
        }
    }

    /// Settle the active play and start the next one.
    fn finish(&mut self, status: CompletionStatus, flagged: bool) {
        self.settle(status, flagged);
        self.advance();
    }

    /// Dispatch the active play's reward and broadcast its completion.
    fn settle(&mut self, status: CompletionStatus, flagged: bool) {
        let State::Active(active) = std::mem::replace(&mut self.state, State::Idle) else {
            return;
        };
        let mode: PlayMode = active.request.mode;
        let report = self
            .dispatcher
            .dispatch(&active.outcome, &active.request.actor_id, mode);
        if let Some(error) = &report.hardware_error {
            debug!(channel = %self.channel, request_id = %report.request_id, error, "hardware stimulus not delivered");
        }

        let outcome = active.outcome;
        self.emit(PushEvent::PlayCompleted {
            channel: self.channel.clone(),
            request_id: outcome.request_id.clone(),
            outcome_summary: OutcomeSummary {
                board_id: outcome.board_id,
                winning_index: Some(outcome.winning_index),
                label: Some(outcome.label),
                status,
                currency: outcome.reward.currency,
                xp: outcome.reward.xp,
                flagged,
            },
        });
    }

    fn clear_pending(&mut self) -> usize {
        let cleared: Vec<Box<dyn Playable>> = self.pending.drain(..).collect();
        for play in &cleared {
            let request = play.request();
            self.emit(PushEvent::PlayCompleted {
                channel: self.channel.clone(),
                request_id: request.request_id.clone(),
                outcome_summary: OutcomeSummary {
                    board_id: request.board_id.clone(),
                    winning_index: None,
                    label: None,
                    status: CompletionStatus::Evicted,
                    currency: 0,
                    xp: 0,
                    flagged: false,
                },
            });
        }
        self.counters.evicted += cleared.len() as u64;
        info!(channel = %self.channel, cleared = cleared.len(), "pending plays cleared");
        cleared.len()
    }

    fn snapshot(&self) -> ChannelSnapshot {
        let active = match &self.state {
            State::Active(active) => Some(EntryView::of(&active.request, EntryState::Active)),
            State::Idle => None,
        };
        ChannelSnapshot {
            channel: self.channel.clone(),
            active,
            pending: self
                .pending
                .iter()
                .map(|play| EntryView::of(play.request(), EntryState::Queued))
                .collect(),
            counters: self.counters,
        }
    }

    fn emit(&self, event: PushEvent) {
        // Errs only when nobody is subscribed.
        let _ = self.events.send(event);
    }

    fn millis(&self, at: Instant) -> u64 {
        at.saturating_duration_since(self.epoch).as_millis() as u64
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_ids_expire() {
        let start = Instant::now();
        let mut recent = RecentIds::new(Duration::from_secs(10));
        assert!(recent.insert("a", start));
        assert!(!recent.insert("a", start + Duration::from_secs(5)));
        assert!(recent.insert("b", start + Duration::from_secs(6)));
        assert!(recent.insert("a", start + Duration::from_secs(10)));
        assert!(!recent.insert("b", start + Duration::from_secs(11)));
    }

    #[test]
    fn test_safety_timeout_scales_duration() {
        let config = ChannelConfig {
            max_pending: 4,
            safety_factor: 3.0,
            dedupe_ttl: Duration::from_secs(1),
        };
        assert_eq!(config.safety_timeout(1_000), Duration::from_millis(3_000));
        assert_eq!(config.safety_timeout(0), Duration::from_millis(1));
    }
}
