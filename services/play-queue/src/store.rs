use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use prizecast_types::game::{BoardConfig, BoardId, BoardSummary, ConfigError};

/// Live board configuration.
///
/// Boards are replaced wholesale and handed out as `Arc` snapshots, so a play
/// keeps the board it was enqueued against even if the board is edited while
/// the play waits.
#[derive(Debug, Default)]
pub struct BoardStore {
    boards: RwLock<BTreeMap<BoardId, Arc<BoardConfig>>>,
}

impl BoardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store `board`, replacing any board with the same id.
    pub fn upsert(&self, board: BoardConfig) -> Result<Arc<BoardConfig>, ConfigError> {
        board.validate()?;
        let board = Arc::new(board);
        self.write().insert(board.id.clone(), board.clone());
        Ok(board)
    }

    pub fn get(&self, board_id: &str) -> Option<Arc<BoardConfig>> {
        self.read().get(board_id).cloned()
    }

    pub fn remove(&self, board_id: &str) -> Option<Arc<BoardConfig>> {
        self.write().remove(board_id)
    }

    pub fn summaries(&self) -> Vec<BoardSummary> {
        self.read().values().map(|board| board.summary()).collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<BoardId, Arc<BoardConfig>>> {
        self.boards
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<BoardId, Arc<BoardConfig>>> {
        self.boards
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prizecast_execution::mocks::{equal_wheel, sample_wheel};

    #[test]
    fn test_upsert_replaces_and_keeps_old_snapshot() {
        let store = BoardStore::new();
        let first = store.upsert(equal_wheel(4)).expect("valid board");
        let second = store.upsert(equal_wheel(6)).expect("valid board");
        assert_eq!(store.len(), 1);
        assert_eq!(first.segments.len(), 4);
        assert_eq!(second.segments.len(), 6);
        assert_eq!(store.get("equal-wheel").unwrap().segments.len(), 6);
    }

    #[test]
    fn test_invalid_board_not_stored() {
        let store = BoardStore::new();
        let mut board = sample_wheel();
        board.segments.clear();
        assert!(store.upsert(board).is_err());
        assert!(store.is_empty());
        assert!(store.get("sample-wheel").is_none());
    }

    #[test]
    fn test_summaries_and_remove() {
        let store = BoardStore::new();
        store.upsert(sample_wheel()).unwrap();
        store.upsert(equal_wheel(3)).unwrap();
        let ids: Vec<String> = store.summaries().into_iter().map(|s| s.board_id).collect();
        assert_eq!(ids, vec!["equal-wheel".to_string(), "sample-wheel".to_string()]);
        assert!(store.remove("equal-wheel").is_some());
        assert_eq!(store.len(), 1);
    }
}
