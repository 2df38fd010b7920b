//! Ledger ports and in-memory ledgers.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use prizecast_types::game::{BoardId, PlayStats};
use thiserror::Error as ThisError;

/// Errors returned by a ledger backend.
#[derive(Clone, Debug, ThisError, PartialEq, Eq)]
pub enum LedgerError {
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
    #[error("ledger rejected reward for {actor_id}: {reason}")]
    Rejected { actor_id: String, reason: String },
}

/// Currency and XP ledger owned outside the engine.
pub trait Ledger: Send + Sync {
    fn apply_reward(
        &self,
        actor_id: &str,
        currency_delta: i64,
        xp_delta: i64,
    ) -> Result<(), LedgerError>;
}

/// Ledger that accepts and discards every write.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullLedger;

impl Ledger for NullLedger {
    fn apply_reward(&self, _: &str, _: i64, _: i64) -> Result<(), LedgerError> {
        Ok(())
    }
}

/// Balances held by [`MemoryLedger`] for one actor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Balance {
    pub currency: i64,
    pub xp: i64,
}

#[derive(Debug, Default)]
struct MemoryLedgerInner {
    balances: BTreeMap<String, Balance>,
    writes: u64,
}

/// In-process ledger used by the demo binary and tests.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    inner: Mutex<MemoryLedgerInner>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self, actor_id: &str) -> Balance {
        self.lock()
            .balances
            .get(actor_id)
            .copied()
            .unwrap_or_default()
    }

    /// Sum of all balances.
    pub fn totals(&self) -> Balance {
        self.lock()
            .balances
            .values()
            .fold(Balance::default(), |acc, b| Balance {
                currency: acc.currency.saturating_add(b.currency),
                xp: acc.xp.saturating_add(b.xp),
            })
    }

    /// Number of accepted `apply_reward` calls.
    pub fn writes(&self) -> u64 {
        self.lock().writes
    }

    fn lock(&self) -> MutexGuard<'_, MemoryLedgerInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Ledger for MemoryLedger {
    fn apply_reward(
        &self,
        actor_id: &str,
        currency_delta: i64,
        xp_delta: i64,
    ) -> Result<(), LedgerError> {
        let mut inner = self.lock();
        let balance = inner.balances.entry(actor_id.to_string()).or_default();
        balance.currency = balance.currency.saturating_add(currency_delta);
        balance.xp = balance.xp.saturating_add(xp_delta);
        inner.writes = inner.writes.saturating_add(1);
        Ok(())
    }
}

/// Per-board play statistics.
///
/// Live and test lanes each own a separate instance, so test plays can never
/// leak into production totals.
#[derive(Debug, Default)]
pub struct StatsLedger {
    boards: Mutex<HashMap<BoardId, PlayStats>>,
}

impl StatsLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, board_id: &str, stake: u64, payout: u64) {
        let mut boards = self.lock();
        boards
            .entry(board_id.to_string())
            .or_default()
            .record(stake, payout);
    }

    pub fn board(&self, board_id: &str) -> PlayStats {
        self.lock().get(board_id).cloned().unwrap_or_default()
    }

    /// Aggregate across all boards.
    pub fn totals(&self) -> PlayStats {
        self.lock()
            .values()
            .fold(PlayStats::default(), |mut acc, stats| {
                acc.plays = acc.plays.saturating_add(stats.plays);
                acc.total_stake = acc.total_stake.saturating_add(stats.total_stake);
                acc.total_payout = acc.total_payout.saturating_add(stats.total_payout);
                acc
            })
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<BoardId, PlayStats>> {
        self.boards
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_ledger_accumulates() {
        let ledger = MemoryLedger::new();
        ledger.apply_reward("alice", 10, 1).unwrap();
        ledger.apply_reward("alice", -3, 2).unwrap();
        ledger.apply_reward("bob", 5, 0).unwrap();
        assert_eq!(
            ledger.balance("alice"),
            Balance {
                currency: 7,
                xp: 3
            }
        );
        assert_eq!(ledger.balance("carol"), Balance::default());
        assert_eq!(ledger.totals().currency, 12);
        assert_eq!(ledger.writes(), 3);
    }

    #[test]
    fn test_stats_ledger_per_board() {
        let stats = StatsLedger::new();
        stats.record("wheel", 100, 50);
        stats.record("wheel", 100, 150);
        stats.record("drop", 10, 0);
        assert_eq!(stats.board("wheel").plays, 2);
        assert_eq!(stats.board("wheel").return_ratio(), Some(1.0));
        assert_eq!(stats.totals().plays, 3);
        assert_eq!(stats.totals().total_stake, 210);
        assert_eq!(stats.board("missing"), PlayStats::default());
    }
}
