//! Reward dispatch tests.
//!
//! These tests drive resolved outcomes through [`RewardDispatcher`] and check
//! that ledger writes happen once per request id, that test plays never reach
//! production ledgers or hardware, and that haptic commands fall back to an
//! available device.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::mocks::{
        equal_wheel, haptic_segment, play_request, sample_wheel, FailingLedger, RecordingHaptics,
    };
    use crate::resolver::{resolve, PlayContext};
    use crate::reward::{
        Balance, Lane, MemoryLedger, RewardDispatcher, StatsLedger, DEFAULT_IDEMPOTENCY_WINDOW,
    };
    use prizecast_types::game::{
        BoardConfig, HapticLimits, LedgerOutcome, OutcomeResult, PlayMode, Segment,
    };

    struct Harness {
        dispatcher: RewardDispatcher,
        ledger: Arc<MemoryLedger>,
        haptics: Arc<RecordingHaptics>,
        live_stats: Arc<StatsLedger>,
        test_stats: Arc<StatsLedger>,
    }

    fn harness(haptics: RecordingHaptics) -> Harness {
        let ledger = Arc::new(MemoryLedger::new());
        let haptics = Arc::new(haptics);
        let live_stats = Arc::new(StatsLedger::new());
        let test_stats = Arc::new(StatsLedger::new());
        let dispatcher = RewardDispatcher::new(
            Lane::new(ledger.clone(), haptics.clone(), live_stats.clone()),
            Lane::test(test_stats.clone()),
            HapticLimits::default(),
            DEFAULT_IDEMPOTENCY_WINDOW,
        );
        Harness {
            dispatcher,
            ledger,
            haptics,
            live_stats,
            test_stats,
        }
    }

    /// Board whose first segment always wins.
    fn rigged(first: Segment) -> BoardConfig {
        let mut board = equal_wheel(2);
        board.segments[0] = first;
        board.segments[1].weight = 0.0;
        board
    }

    fn outcome(board: &BoardConfig, request_id: &str, mode: PlayMode) -> OutcomeResult {
        let request = play_request(request_id, &board.id, mode);
        resolve(
            board,
            &PlayContext {
                request: &request,
                seed: 7,
                now_ms: 0,
            },
        )
        .expect("board resolves")
        .outcome
    }

    #[test]
    fn test_duplicate_dispatch_is_noop() {
        let mut h = harness(RecordingHaptics::new(&["pad"]));
        let board = rigged(haptic_segment(&["pad"], 50, 1_000));
        let result = outcome(&board, "r1", PlayMode::Live);

        let first = h.dispatcher.dispatch(&result, "alice", PlayMode::Live);
        assert_eq!(
            first.ledger,
            LedgerOutcome::Applied {
                currency: 5,
                xp: 0
            }
        );
        assert_eq!(first.commands_sent(), 1);

        let second = h.dispatcher.dispatch(&result, "alice", PlayMode::Live);
        assert!(second.is_duplicate());
        assert_eq!(second.commands_sent(), 0);

        assert_eq!(h.ledger.writes(), 1);
        assert_eq!(
            h.ledger.balance("alice"),
            Balance {
                currency: 5,
                xp: 0
            }
        );
        assert_eq!(h.haptics.sent().len(), 1);
        assert_eq!(h.live_stats.board(&board.id).plays, 1);
        assert!(h.dispatcher.has_dispatched("r1"));
    }

    #[test]
    fn test_test_plays_never_touch_production() {
        let mut h = harness(RecordingHaptics::new(&["pad"]));
        let board = rigged(haptic_segment(&["pad"], 50, 1_000));
        let before = h.ledger.totals();

        const N: u64 = 25;
        for i in 0..N {
            let result = outcome(&board, &format!("t{i}"), PlayMode::Test);
            let report = h.dispatcher.dispatch(&result, "tester", PlayMode::Test);
            assert_eq!(report.mode, PlayMode::Test);
            assert!(report.command.is_none());
            assert!(report.devices.is_empty());
        }

        assert_eq!(h.ledger.totals(), before);
        assert_eq!(h.ledger.writes(), 0);
        assert!(h.haptics.sent().is_empty());
        assert_eq!(h.live_stats.totals().plays, 0);
        assert_eq!(h.test_stats.totals().plays, N);
    }

    #[test]
    fn test_empty_device_list_falls_back_to_first_available() {
        let mut h = harness(RecordingHaptics::new(&["collar", "pad"]));
        let board = rigged(haptic_segment(&[], 50, 1_000));
        let report = h
            .dispatcher
            .dispatch(&outcome(&board, "r1", PlayMode::Live), "alice", PlayMode::Live);

        assert_eq!(report.commands_sent(), 1);
        assert!(report.devices[0].fallback);
        assert!(report.devices[0].success);
        assert_eq!(report.hardware_error, None);
        let sent = h.haptics.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].device_id, "collar");
    }

    #[test]
    fn test_unreachable_devices_fall_back() {
        let mut h = harness(RecordingHaptics::new(&["pad"]));
        let board = rigged(haptic_segment(&["gone-1", "gone-2"], 50, 1_000));
        let report = h
            .dispatcher
            .dispatch(&outcome(&board, "r1", PlayMode::Live), "alice", PlayMode::Live);

        assert_eq!(report.devices.len(), 3);
        assert!(!report.devices[0].attempted);
        assert!(!report.devices[1].attempted);
        assert!(report.devices[2].fallback);
        assert_eq!(report.commands_sent(), 1);
        assert_eq!(h.haptics.sent()[0].device_id, "pad");
    }

    #[test]
    fn test_no_registered_devices_records_failure() {
        let mut h = harness(RecordingHaptics::new(&[]));
        let board = rigged(haptic_segment(&[], 50, 1_000));
        let report = h
            .dispatcher
            .dispatch(&outcome(&board, "r1", PlayMode::Live), "alice", PlayMode::Live);

        assert_eq!(report.commands_sent(), 0);
        assert_eq!(
            report.hardware_error.as_deref(),
            Some("no haptic device registered")
        );
        // Ledger still applied.
        assert_eq!(h.ledger.balance("alice").currency, 5);
    }

    #[test]
    fn test_partial_device_failure_continues() {
        let haptics = RecordingHaptics::new(&["a", "b", "c"]).failing(&["a"]);
        let mut h = harness(haptics);
        let board = rigged(haptic_segment(&["a", "b", "c"], 50, 1_000));
        let report = h
            .dispatcher
            .dispatch(&outcome(&board, "r1", PlayMode::Live), "alice", PlayMode::Live);

        let results: Vec<(&str, bool)> = report
            .devices
            .iter()
            .map(|d| (d.device_id.as_str(), d.success))
            .collect();
        assert_eq!(results, vec![("a", false), ("b", true), ("c", true)]);
        assert!(report.devices.iter().all(|d| !d.fallback));
        assert_eq!(report.hardware_error, None);
        assert_eq!(h.haptics.sent().len(), 3);
    }

    #[test]
    fn test_hardware_failure_keeps_ledger() {
        let haptics = RecordingHaptics::new(&["a"]).failing(&["a"]);
        let mut h = harness(haptics);
        let board = rigged(haptic_segment(&["a"], 50, 1_000));
        let report = h
            .dispatcher
            .dispatch(&outcome(&board, "r1", PlayMode::Live), "alice", PlayMode::Live);

        assert!(matches!(report.ledger, LedgerOutcome::Applied { .. }));
        assert_eq!(
            report.hardware_error.as_deref(),
            Some("all haptic devices failed")
        );
        assert_eq!(h.ledger.balance("alice").currency, 5);
    }

    #[test]
    fn test_intensity_and_duration_clamped() {
        let mut h = harness(RecordingHaptics::new(&["pad"]));
        let board = rigged(haptic_segment(&["pad"], 400, 5));
        let report = h
            .dispatcher
            .dispatch(&outcome(&board, "r1", PlayMode::Live), "alice", PlayMode::Live);

        let command = report.command.expect("command issued");
        assert_eq!(command.intensity, 100);
        assert_eq!(command.duration_ms, 300);
        assert_eq!(command.device_ids, vec!["pad".to_string()]);
        let sent = h.haptics.sent();
        assert_eq!(sent[0].intensity, 100);
        assert_eq!(sent[0].duration_ms, 300);
    }

    #[test]
    fn test_ledger_failure_is_reported_once() {
        let failing = Arc::new(FailingLedger::default());
        let stats = Arc::new(StatsLedger::new());
        let mut dispatcher = RewardDispatcher::new(
            Lane::new(
                failing.clone(),
                Arc::new(RecordingHaptics::new(&[])),
                stats.clone(),
            ),
            Lane::test(Arc::new(StatsLedger::new())),
            HapticLimits::default(),
            16,
        );
        let board = sample_wheel();
        let mut result = outcome(&board, "r1", PlayMode::Live);
        result.reward.currency = 10;

        let report = dispatcher.dispatch(&result, "alice", PlayMode::Live);
        assert!(matches!(report.ledger, LedgerOutcome::Failed { .. }));
        assert!(dispatcher.dispatch(&result, "alice", PlayMode::Live).is_duplicate());
        assert_eq!(failing.attempts(), 1);
        assert_eq!(stats.totals().plays, 1);
    }

    #[test]
    fn test_zero_reward_skips_ledger_write() {
        let mut h = harness(RecordingHaptics::new(&[]));
        let mut board = equal_wheel(2);
        board.segments[0].reward.currency = 0;
        board.segments[0].reward.xp = 0;
        board.segments[1].weight = 0.0;
        let report = h
            .dispatcher
            .dispatch(&outcome(&board, "r1", PlayMode::Live), "alice", PlayMode::Live);

        assert_eq!(
            report.ledger,
            LedgerOutcome::Applied {
                currency: 0,
                xp: 0
            }
        );
        assert_eq!(h.ledger.writes(), 0);
        assert_eq!(h.live_stats.totals().plays, 1);
    }
}
