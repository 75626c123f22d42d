//! End-to-end game scenarios driven through the session
//!
//! Every test runs on simulated time, so timings are exact.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crosswalk_sim::autopilot::Autopilot;
use crosswalk_sim::simulation::{
    Command, Direction, FixedOracle, GameEvent, GameSession, LifeLossCause, LightColor,
    OracleDispatch, Position, SimConfig, TaskKind, Violation, COLLISION_WARNING,
    CROSSING_RESET_DELAY_MS, CROSSING_SETTLE_MS, PLAYER_SIZE, PLAYER_START_X,
    VIOLATION_RESET_DELAY_MS, WARNING_DURATION_MS,
};

fn started_session(seed: u64) -> GameSession {
    let mut session = GameSession::new(SimConfig::default().with_seed(seed)).unwrap();
    session.start();
    session
}

fn record_events(session: &mut GameSession) -> Rc<RefCell<Vec<GameEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    session.subscribe(move |event| sink.borrow_mut().push(event.clone()));
    events
}

/// Put the player inside the crosswalk on the start row
fn stand_at_crosswalk(session: &mut GameSession) {
    let x = session.crosswalk().center_x() - PLAYER_SIZE / 2.0;
    let y = session.config().viewport.start_row();
    session.player_mut().place(Position::new(x, y));
}

fn submit_many(session: &mut GameSession, command: Command, count: usize) {
    for _ in 0..count {
        session.submit(command);
    }
}

#[test]
fn test_session_starts_on_red_with_countdown() {
    let session = started_session(1);
    assert!(session.is_started());
    assert_eq!(session.light().color(), LightColor::Red);
    assert_eq!(session.light().countdown_sec(), 6);
    assert_eq!(session.clock().remaining_ms(TaskKind::LightPhase), Some(6000));
    assert_eq!(session.state().lives(), 4.0);
    assert_eq!(session.difficulty().stats().lane_count, 2);
}

#[test]
fn test_countdown_and_first_phase_change() {
    let mut session = started_session(1);

    session.advance(1000);
    assert_eq!(session.light().countdown_sec(), 5);

    session.advance(4500);
    assert_eq!(session.light().color(), LightColor::Red);
    assert_eq!(session.light().countdown_sec(), 1);

    session.advance(600);
    assert_eq!(session.now_ms(), 6100);
    assert_eq!(session.light().color(), LightColor::Green);
    assert_eq!(session.light().countdown_sec(), 0);
    assert!(!session.clock().is_scheduled(TaskKind::RedCountdown));
}

#[test]
fn test_light_cycles_in_order() {
    let mut session = started_session(2);
    let events = record_events(&mut session);

    session.advance(30_000);

    let colors: Vec<LightColor> = events
        .borrow()
        .iter()
        .filter_map(|event| match event {
            GameEvent::LightChanged { color } => Some(*color),
            _ => None,
        })
        .collect();

    // Level 1: red 6s, green 4s, yellow 2s
    assert_eq!(
        colors,
        vec![
            LightColor::Green,
            LightColor::Yellow,
            LightColor::Red,
            LightColor::Green,
            LightColor::Yellow,
            LightColor::Red,
            LightColor::Green,
        ]
    );
    assert_eq!(session.light().transitions(), 7);
    assert_eq!(session.clock().remaining_ms(TaskKind::LightPhase), Some(4000));
}

#[test]
fn test_stepping_into_road_on_green_costs_half_a_life() {
    let mut session = started_session(3);
    session.advance(6100);
    assert_eq!(session.light().color(), LightColor::Green);

    // Nine steps reach the road edge, the tenth is a violation
    submit_many(&mut session, Command::Up, 10);
    session.advance(16);

    assert_eq!(session.state().lives(), 3.5);
    assert_eq!(session.state().violations, 1);
    assert_eq!(session.warning(), Some(Violation::WrongLight.warning()));
    assert_eq!(session.warning(), Some("Wait for the red light!"));
    assert!(session.player().is_returning());
    assert_eq!(session.difficulty().stats().attempt_count, 1);

    session.advance(VIOLATION_RESET_DELAY_MS + 16);
    let position = session.player().position();
    assert_eq!(position.y, session.config().viewport.start_row());
    assert_eq!(position.x, PLAYER_START_X);
    assert!(!session.player().is_returning());

    // Warning outlives the reset and then clears
    assert!(session.warning().is_some());
    session.advance(WARNING_DURATION_MS);
    assert_eq!(session.warning(), None);
}

#[test]
fn test_stepping_into_road_off_crosswalk_costs_half_a_life() {
    let mut session = started_session(4);
    let events = record_events(&mut session);

    submit_many(&mut session, Command::Up, 10);
    session.advance(16);

    assert_eq!(session.light().color(), LightColor::Red);
    assert_eq!(session.state().lives(), 3.5);
    assert_eq!(session.warning(), Some("Use the crosswalk!"));
    assert!(events.borrow().contains(&GameEvent::LifeLost {
        lives: 3.5,
        cause: LifeLossCause::Violation(Violation::OffCrosswalk),
    }));
}

#[test]
fn test_moves_are_ignored_while_returning() {
    let mut session = started_session(5);
    submit_many(&mut session, Command::Up, 10);
    session.advance(16);
    assert!(session.player().is_returning());

    let before = session.player().position();
    submit_many(&mut session, Command::Left, 3);
    session.advance(16);
    assert_eq!(session.player().position(), before);
    assert_eq!(session.state().lives(), 3.5);
}

#[test]
fn test_crossing_at_red_scores_and_moves_crosswalk() {
    let mut session = started_session(6);
    let events = record_events(&mut session);
    stand_at_crosswalk(&mut session);

    session.advance(3000);
    assert_eq!(session.light().color(), LightColor::Red);

    // 570 -> 90 crosses the threshold
    submit_many(&mut session, Command::Up, 24);
    session.advance(16);

    // Finished at 3008ms against a 6s target
    assert_eq!(session.state().score, 129);
    assert_eq!(session.state().crossings_completed, 1);
    assert_eq!(session.state().lives(), 4.0);
    assert!(session.player().is_returning());

    let (min, max) = session.crosswalk().band();
    let center = session.crosswalk().center_x();
    assert!(center >= min && center <= max);

    assert!(events.borrow().contains(&GameEvent::CrossingCompleted {
        points: 129,
        elapsed_ms: 3008,
    }));
    assert!(events
        .borrow()
        .contains(&GameEvent::ScoreChanged { score: 129 }));

    session.advance(CROSSING_RESET_DELAY_MS + CROSSING_SETTLE_MS + 50);
    let position = session.player().position();
    assert_eq!(position.x, PLAYER_START_X);
    assert_eq!(position.y, session.config().viewport.start_row());
    assert!(!session.player().is_returning());

    // Fallback path: 129 points is level 2
    assert_eq!(session.state().difficulty_level, 2);
    assert!(events
        .borrow()
        .contains(&GameEvent::DifficultyChanged { level: 2 }));
}

#[test]
fn test_oracle_level_applies_after_crossing() {
    let mut session = GameSession::new(SimConfig::default().with_seed(7))
        .unwrap()
        .with_oracle(Arc::new(FixedOracle(6.0)), OracleDispatch::Inline);
    session.start();
    stand_at_crosswalk(&mut session);

    session.advance(1000);
    submit_many(&mut session, Command::Up, 24);
    session.advance(16);
    assert_eq!(session.state().crossings_completed, 1);
    // Previous level until the next difficulty poll
    assert_eq!(session.state().difficulty_level, 1);

    session.advance(100);
    assert_eq!(session.state().difficulty_level, 6);
    assert_eq!(session.snapshot().vehicle_speed_kmh, 160.0);
    let spawn_left = session.clock().remaining_ms(TaskKind::VehicleSpawn).unwrap();
    assert!(spawn_left <= 1500);
}

#[test]
fn test_collision_cooldown_limits_losses() {
    let mut session = started_session(8);
    let start = session.player().position();

    // Two parked vehicles on top of the player
    session
        .vehicles_mut()
        .insert(start, 0, Direction::Right, 0.0);
    session
        .vehicles_mut()
        .insert(Position::new(start.x + 10.0, start.y), 1, Direction::Right, 0.0);

    session.advance(100);
    assert_eq!(session.state().collisions, 1);
    assert_eq!(session.state().lives(), 3.5);
    assert_eq!(session.warning(), Some(COLLISION_WARNING));

    // Still overlapping after the reset, but within the cooldown
    session.advance(1050);
    assert_eq!(session.now_ms(), 1150);
    assert_eq!(session.state().collisions, 1);
    assert_eq!(session.player().position().x, start.x);

    session.advance(100);
    assert_eq!(session.state().collisions, 2);
    assert_eq!(session.state().lives(), 3.0);
}

#[test]
fn test_held_vehicles_clear_player_in_crosswalk() {
    let mut session = started_session(8);
    session.crosswalk_mut().place(640.0);

    // Left edge of the crosswalk window, in lane 0
    session.player_mut().place(Position::new(520.0, 330.0));
    assert!(session.crosswalk().contains_player(520.0));
    let right = session
        .vehicles_mut()
        .insert(Position::new(400.0, 340.0), 0, Direction::Right, 10.0);

    session.advance(300);
    assert_eq!(session.light().color(), LightColor::Red);
    assert_eq!(session.vehicles().get(right).unwrap().position.x, 410.0);
    assert_eq!(session.state().collisions, 0);

    // Right edge of the window, in lane 1
    session.player_mut().place(Position::new(705.0, 370.0));
    assert!(session.crosswalk().contains_player(705.0));
    let left = session
        .vehicles_mut()
        .insert(Position::new(800.0, 380.0), 1, Direction::Left, 10.0);

    session.advance(300);
    assert_eq!(session.light().color(), LightColor::Red);
    assert_eq!(session.vehicles().get(left).unwrap().position.x, 770.0);
    assert_eq!(session.state().collisions, 0);
    assert_eq!(session.state().lives(), 4.0);
}

#[test]
fn test_game_over_after_eight_violations() {
    let mut session = started_session(9);
    let events = record_events(&mut session);

    for _ in 0..8 {
        assert!(!session.is_game_over());
        submit_many(&mut session, Command::Up, 10);
        session.advance(16);
        session.advance(200);
    }

    assert!(session.is_game_over());
    assert_eq!(session.state().lives(), 0.0);
    assert_eq!(session.state().violations, 8);
    assert!(session.clock().is_idle());
    assert!(events
        .borrow()
        .contains(&GameEvent::GameOver { score: 0 }));

    // Nothing runs after game over
    let vehicles = session.vehicles().len();
    submit_many(&mut session, Command::Up, 10);
    session.advance(10_000);
    assert_eq!(session.state().lives(), 0.0);
    assert_eq!(session.vehicles().len(), vehicles);
    assert_eq!(session.light().color(), LightColor::Red);

    session.pause();
    assert!(!session.is_paused());
}

#[test]
fn test_pause_freezes_every_timer() {
    let mut session = started_session(10);
    session.advance(1000);
    let active = session.clock().active_count();
    let before = session.snapshot();

    session.submit(Command::Pause);
    assert!(session.is_paused());
    assert_eq!(session.clock().active_count(), 0);
    assert_eq!(session.clock().suspended_tasks().len(), active);

    session.submit(Command::Up);
    session.advance(10_000);
    assert_eq!(session.now_ms(), 1000);
    let paused = session.snapshot();
    assert_eq!(paused.light_color, before.light_color);
    assert_eq!(paused.countdown, 5);
    assert_eq!(paused.vehicles, before.vehicles);
    assert_eq!(paused.player, before.player);
    assert!(paused.paused);

    session.submit(Command::Pause);
    assert!(!session.is_paused());
    assert_eq!(session.clock().active_count(), active);
    assert_eq!(session.clock().remaining_ms(TaskKind::LightPhase), Some(5000));

    session.advance(4999);
    assert_eq!(session.light().color(), LightColor::Red);
    session.advance(1);
    assert_eq!(session.light().color(), LightColor::Green);
}

#[test]
fn test_reset_cancels_everything() {
    let mut session = started_session(11);
    submit_many(&mut session, Command::Up, 10);
    session.advance(2500);
    assert!(session.state().lives() < 4.0);
    assert!(!session.vehicles().is_empty());

    session.reset().unwrap();
    assert!(!session.is_started());
    assert!(session.clock().is_idle());
    assert_eq!(session.now_ms(), 0);
    assert_eq!(session.state().lives(), 4.0);
    assert_eq!(session.state().score, 0);
    assert!(session.vehicles().is_empty());
    assert_eq!(session.warning(), None);

    // No stale timers fire after a reset
    session.advance(10_000);
    assert_eq!(session.light().transitions(), 0);

    session.start();
    assert_eq!(session.light().countdown_sec(), 6);
    session.advance(6000);
    assert_eq!(session.light().color(), LightColor::Green);
}

#[test]
fn test_start_twice_does_not_duplicate_timers() {
    let mut session = started_session(12);
    let active = session.clock().active_count();
    session.start();
    assert_eq!(session.clock().active_count(), active);
}

#[test]
fn test_snapshot_only_when_changed() {
    let mut session = GameSession::new(SimConfig::default().with_seed(13)).unwrap();
    assert!(session.take_snapshot_if_changed().is_some());
    assert!(session.take_snapshot_if_changed().is_none());

    // Not started: time passes but nothing moves
    session.advance(1000);
    assert!(session.take_snapshot_if_changed().is_none());

    session.start();
    let snapshot = session.take_snapshot_if_changed().unwrap();
    assert_eq!(snapshot.lives, 4.0);
    assert_eq!(snapshot.light_color, LightColor::Red);
    assert_eq!(snapshot.lane_count, 2);
    assert_eq!(snapshot.vehicle_speed_kmh, 20.0);
}

#[test]
fn test_snapshot_json_uses_camel_case_throughout() {
    let mut session = started_session(13);
    session
        .vehicles_mut()
        .insert(Position::new(300.0, 340.0), 0, Direction::Right, 1.0);

    let value = serde_json::to_value(session.snapshot()).unwrap();
    let player = value["player"].as_object().unwrap();
    assert!(player.contains_key("isReturning"));
    assert!(!player.contains_key("is_returning"));

    let vehicle = value["vehicles"][0].as_object().unwrap();
    for key in ["id", "position", "lane", "direction", "speed"] {
        assert!(vehicle.contains_key(key), "missing vehicle key {}", key);
    }
    assert!(value.get("lightColor").is_some());
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let mut a = started_session(14);
    let mut b = started_session(14);
    for _ in 0..1000 {
        a.advance(16);
        b.advance(16);
    }
    assert_eq!(a.snapshot(), b.snapshot());
    assert!(a.vehicles().total_spawned() > 0);
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = SimConfig {
        player_age: 40,
        ..SimConfig::default()
    };
    assert!(GameSession::new(config).is_err());
}

#[test]
fn test_autopilot_crosses() {
    let mut session = started_session(15);
    let autopilot = Autopilot;

    for _ in 0..200 {
        if let Some(command) = autopilot.next_command(&session.snapshot()) {
            session.submit(command);
        }
        session.advance(16);
    }

    assert!(session.state().crossings_completed >= 1);
    assert!(session.state().score >= 100);
}

#[test]
fn test_teardown_reports_totals() {
    let mut session = started_session(16);
    session.advance(13_000);
    let stats = session.teardown();
    assert_eq!(stats.elapsed_ms, 13_000);
    assert_eq!(stats.lives, 4.0);
    assert_eq!(stats.light_transitions, 3);
    assert_eq!(stats.vehicles_spawned, 6);
}
