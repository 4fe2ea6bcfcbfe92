//! End-to-end runs of the assist loop against the simulated arena

use aim_assistant::simulation::{Arena, ArenaConfig, SimTarget};
use aim_assistant::{
    AssistConfig, AssistLoop, Clock, CycleOutcome, ManualClock, Point, RecordingActuator,
    TickOutcome,
};
use std::time::Duration;

fn small_arena_config() -> ArenaConfig {
    ArenaConfig {
        view_width: 400,
        view_height: 320,
        spawn_extent: 120.0,
        target_radius: 16.0,
        num_targets: 3,
        sensitivity: 1.0,
        seed: 11,
    }
}

fn small_assist_config() -> AssistConfig {
    let mut config = AssistConfig::default();
    config.capture.width = 400;
    config.capture.height = 320;
    config
}

#[test]
fn test_single_target_is_destroyed_with_one_move() {
    let arena = Arena::with_targets(
        small_arena_config(),
        vec![SimTarget {
            position: Point::new(60.0, -40.0),
            radius: 16.0,
        }],
    );
    let clock = ManualClock::new();
    let mut assist = AssistLoop::new(
        &small_assist_config(),
        arena.clone(),
        arena.clone(),
        arena.clone(),
        clock,
    );
    assist.set_active(true);

    match assist.tick() {
        TickOutcome::Cycle(CycleOutcome::Fired(report)) => {
            assert_eq!(report.movement, (60, -40));
            assert_eq!(report.sub_moves, 1);
            assert!(!report.instant);
        }
        other => panic!("expected a shot, got {:?}", other),
    }
    assert_eq!(arena.camera(), Point::new(60.0, -40.0));
    assert_eq!(arena.clicks(), 1);
    assert_eq!(arena.destroyed(), 1);
}

#[test]
fn test_long_move_is_interpolated_and_lands() {
    let arena = Arena::with_targets(
        small_arena_config(),
        vec![SimTarget {
            position: Point::new(-180.0, 0.0),
            radius: 16.0,
        }],
    );
    let mut assist = AssistLoop::new(
        &small_assist_config(),
        arena.clone(),
        arena.clone(),
        arena.clone(),
        ManualClock::new(),
    );
    assist.set_active(true);

    match assist.tick() {
        TickOutcome::Cycle(CycleOutcome::Fired(report)) => {
            assert_eq!(report.movement, (-180, 0));
            assert_eq!(report.sub_moves, 2);
        }
        other => panic!("expected a shot, got {:?}", other),
    }
    assert_eq!(arena.camera(), Point::new(-180.0, 0.0));
    assert_eq!(arena.destroyed(), 1);
}

#[test]
fn test_every_shot_destroys_a_target() {
    let arena = Arena::new(small_arena_config());
    let clock = ManualClock::new();
    let mut assist = AssistLoop::new(
        &small_assist_config(),
        arena.clone(),
        arena.clone(),
        arena.clone(),
        clock.clone(),
    );

    // Toggle on with one key press
    arena.set_toggle_down(true);
    assist.tick();
    arena.set_toggle_down(false);
    assert!(assist.is_active());

    for _ in 0..150 {
        clock.advance(Duration::from_millis(5));
        assist.tick();
    }

    let stats = assist.stats();
    assert!(stats.shots > 0);
    assert_eq!(arena.clicks(), stats.shots);
    assert_eq!(arena.destroyed(), stats.shots);
}

#[test]
fn test_run_ticks_keeps_engaging_on_its_own_clock() {
    // Only the loop's own waits move simulated time forward. Respawns stay
    // close enough that every target remains in view.
    let arena = Arena::with_targets(
        ArenaConfig {
            spawn_extent: 40.0,
            ..small_arena_config()
        },
        vec![
            SimTarget {
                position: Point::new(60.0, -40.0),
                radius: 16.0,
            },
            SimTarget {
                position: Point::new(-50.0, 30.0),
                radius: 16.0,
            },
            SimTarget {
                position: Point::new(20.0, 70.0),
                radius: 16.0,
            },
        ],
    );
    let mut assist = AssistLoop::new(
        &small_assist_config(),
        arena.clone(),
        arena.clone(),
        arena.clone(),
        ManualClock::new(),
    );
    assist.set_active(true);

    let shots = assist.run_ticks(30).shots;
    assert!(shots >= 3, "only {} shots fired", shots);
    assert_eq!(arena.destroyed(), shots);
}

#[test]
fn test_surviving_target_is_suppressed_for_ghost_window() {
    // Pointer commands go to a recorder, so the target never dies and the
    // camera never moves
    let arena = Arena::with_targets(
        small_arena_config(),
        vec![SimTarget {
            position: Point::new(50.0, 0.0),
            radius: 16.0,
        }],
    );
    let clock = ManualClock::new();
    let mut assist = AssistLoop::new(
        &small_assist_config(),
        arena.clone(),
        RecordingActuator::new(),
        arena.clone(),
        clock.clone(),
    );
    assist.set_active(true);

    let fired_at = match assist.tick() {
        TickOutcome::Cycle(CycleOutcome::Fired(report)) => report.fired_at,
        other => panic!("expected a shot, got {:?}", other),
    };

    while clock.now() < fired_at + Duration::from_millis(90) {
        assert_eq!(assist.tick(), TickOutcome::NoTargets { detections: 1 });
        clock.advance(Duration::from_millis(10));
    }
    assert_eq!(assist.actuator().clicks(), 1);

    // Once the ghost window is over the still-visible target is engaged again
    while clock.now() < fired_at + Duration::from_millis(200) && assist.actuator().clicks() < 2 {
        clock.advance(Duration::from_millis(10));
        assist.tick();
    }
    assert_eq!(assist.actuator().clicks(), 2);
}

#[test]
fn test_toggle_off_stops_engagement() {
    let arena = Arena::new(small_arena_config());
    let clock = ManualClock::new();
    let mut assist = AssistLoop::new(
        &small_assist_config(),
        arena.clone(),
        arena.clone(),
        arena.clone(),
        clock.clone(),
    );
    assist.set_active(true);
    assist.set_active(false);

    for _ in 0..20 {
        assert_eq!(assist.tick(), TickOutcome::Inactive);
    }
    assert_eq!(arena.clicks(), 0);
    assert_eq!(arena.frames_rendered(), 0);
    // Idle ticks poll at the configured interval
    assert_eq!(clock.total_slept(), Duration::from_millis(200));
}
