use super::*;
use proptest::prelude::*;

fn segment(label: &str, weight: f64) -> Segment {
    Segment {
        label: label.to_string(),
        weight,
        reward: RewardSpec::default(),
        haptic: None,
    }
}

fn wheel(weights: &[f64]) -> BoardConfig {
    BoardConfig {
        id: "wheel".to_string(),
        name: "Wheel".to_string(),
        channel: "main".to_string(),
        segments: weights
            .iter()
            .enumerate()
            .map(|(i, w)| segment(&format!("s{i}"), *w))
            .collect(),
        settings: BoardSettings::Wheel(WheelSettings::default()),
    }
}

fn drop_board(slots: usize) -> BoardConfig {
    BoardConfig {
        id: "drop".to_string(),
        name: "Drop".to_string(),
        channel: "main".to_string(),
        segments: (0..slots).map(|i| segment(&format!("slot{i}"), 1.0)).collect(),
        settings: BoardSettings::Plinko(DropSettings::default()),
    }
}

#[test]
fn test_valid_boards_pass() {
    wheel(&[1.0, 2.0, 3.0]).validate().expect("wheel is valid");
    drop_board(7).validate().expect("drop board is valid");
}

#[test]
fn test_empty_board_rejected() {
    let board = wheel(&[]);
    assert_eq!(
        board.validate(),
        Err(ConfigError::EmptyBoard {
            board_id: "wheel".to_string()
        })
    );
}

#[test]
fn test_zero_weight_sum_rejected() {
    assert!(matches!(
        wheel(&[0.0, 0.0, 0.0]).validate(),
        Err(ConfigError::ZeroTotalWeight { .. })
    ));
}

#[test]
fn test_negative_and_nan_weights_rejected() {
    assert!(matches!(
        wheel(&[1.0, -1.0]).validate(),
        Err(ConfigError::InvalidWeight { index: 1, .. })
    ));
    assert!(matches!(
        wheel(&[f64::NAN, 1.0]).validate(),
        Err(ConfigError::InvalidWeight { index: 0, .. })
    ));
}

#[test]
fn test_single_segment_wheel_rejected() {
    assert!(matches!(
        wheel(&[1.0]).validate(),
        Err(ConfigError::OutOfRange {
            field: "segments",
            ..
        })
    ));
}

#[test]
fn test_wheel_settings_ranges() {
    let mut board = wheel(&[1.0, 1.0]);
    board.settings = BoardSettings::Wheel(WheelSettings {
        full_rotations: 0,
        ..WheelSettings::default()
    });
    assert!(matches!(
        board.validate(),
        Err(ConfigError::OutOfRange {
            field: "fullRotations",
            ..
        })
    ));

    board.settings = BoardSettings::Wheel(WheelSettings {
        landing_zone: 1.0,
        ..WheelSettings::default()
    });
    assert!(matches!(
        board.validate(),
        Err(ConfigError::OutOfRange {
            field: "landingZone",
            ..
        })
    ));
}

#[test]
fn test_drop_multiplier_table_must_match_slots() {
    let mut board = drop_board(5);
    board.settings = BoardSettings::Plinko(DropSettings {
        multipliers: vec![1.0, 2.0],
        ..DropSettings::default()
    });
    assert_eq!(
        board.validate(),
        Err(ConfigError::MultiplierTableMismatch {
            board_id: "drop".to_string(),
            expected: 5,
            got: 2,
        })
    );
}

#[test]
fn test_drop_pegs_must_leave_a_gap() {
    let mut board = drop_board(5);
    board.settings = BoardSettings::Plinko(DropSettings {
        peg_radius: 0.3,
        ball_radius: 0.3,
        ..DropSettings::default()
    });
    assert!(matches!(
        board.validate(),
        Err(ConfigError::OutOfRange {
            field: "pegRadius",
            ..
        })
    ));
}

#[test]
fn test_haptic_clamp() {
    let limits = HapticLimits::default();
    let spec = HapticSpec {
        device_ids: vec![],
        mode: HapticMode::Shock,
        intensity: 250,
        duration_ms: 10,
    };
    assert_eq!(limits.clamp(&spec), (100, 300));

    let spec = HapticSpec {
        intensity: 0,
        duration_ms: 90_000,
        ..spec
    };
    assert_eq!(limits.clamp(&spec), (1, 30_000));
}

#[test]
fn test_haptic_limits_validate() {
    assert!(HapticLimits::default().validate().is_ok());
    let inverted = HapticLimits {
        min_intensity: 50,
        max_intensity: 10,
        ..HapticLimits::default()
    };
    assert!(inverted.validate().is_err());
}

#[test]
fn test_play_stats_return_ratio() {
    let mut stats = PlayStats::default();
    assert_eq!(stats.return_ratio(), None);
    stats.record(100, 50);
    stats.record(100, 250);
    assert_eq!(stats.plays, 2);
    assert_eq!(stats.return_ratio(), Some(1.5));
}

#[test]
fn test_board_json_shape() {
    let json = r#"{
        "id": "w1",
        "channel": "main",
        "segments": [
            {"label": "A", "weight": 1, "reward": {"currency": 10}},
            {"label": "B", "weight": 3, "haptic": {"mode": "vibrate", "intensity": 40, "durationMs": 1000}}
        ],
        "settings": {"kind": "wheel", "fullRotations": 7}
    }"#;
    let board: BoardConfig = serde_json::from_str(json).expect("board parses");
    assert_eq!(board.kind(), BoardKind::Wheel);
    assert_eq!(board.segments[0].reward.currency, 10);
    assert!(board.segments[1].haptic.as_ref().unwrap().device_ids.is_empty());
    match &board.settings {
        BoardSettings::Wheel(settings) => {
            assert_eq!(settings.full_rotations, 7);
            assert_eq!(settings.spin_duration_ms, DEFAULT_SPIN_DURATION_MS);
        }
        other => panic!("unexpected settings: {other:?}"),
    }
    board.validate().expect("board validates");
}

#[test]
fn test_push_event_tags() {
    let event = PushEvent::PlayQueued {
        request_id: "r1".to_string(),
        position: 2,
        channel: "main".to_string(),
    };
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["type"], "play-queued");
    assert_eq!(value["requestId"], "r1");
    assert_eq!(value["position"], 2);
    assert_eq!(event.channel(), "main");

    let event = PushEvent::ConfigChanged {
        channel: "main".to_string(),
        snapshot_summary: wheel(&[1.0, 1.0]).summary(),
    };
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["type"], "config-changed");
    assert_eq!(value["snapshotSummary"]["segmentCount"], 2);
    assert_eq!(event.request_id(), None);
}

#[test]
fn test_test_lane_name() {
    assert_eq!(test_lane("main"), "main#test");
}

proptest! {
    #[test]
    fn prop_nonnegative_weights_with_positive_sum_validate(
        weights in proptest::collection::vec(0.0f64..1_000.0, 2..MAX_WHEEL_SEGMENTS),
    ) {
        let board = wheel(&weights);
        let total: f64 = weights.iter().sum();
        if total > 0.0 {
            prop_assert!(board.validate().is_ok());
        } else {
            let is_zero_total = matches!(board.validate(), Err(ConfigError::ZeroTotalWeight { .. }));
            prop_assert!(is_zero_total);
        }
    }
}
