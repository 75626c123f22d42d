//! Game session that ties everything together
//!
//! This is the entry point for running the crossing simulation without any
//! renderer. All timers live in one [`SimulationClock`]; each fired task runs
//! to completion before the next one, and events raised by a handler are
//! dispatched right after it.

use anyhow::{bail, ensure, Context, Result};
use log::{debug, error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;

use super::collision::{CollisionDetector, COLLISION_CHECK_INTERVAL_MS};
use super::config::SimConfig;
use super::crosswalk::CrosswalkManager;
use super::difficulty::{DifficultySettings, DifficultyTable};
use super::difficulty_controller::{DifficultyController, OracleDispatch};
use super::game_state::GameState;
use super::oracle::DifficultyOracle;
use super::player::{Command, MoveOutcome, PlayerController, Violation, INPUT_POLL_INTERVAL_MS};
use super::scheduler::{SimulationClock, TaskKind};
use super::scoring::{crossing_points, is_crossing_complete};
use super::snapshot::Snapshot;
use super::traffic_light::{TrafficLightMachine, COUNTDOWN_TICK_MS};
use super::types::LightColor;
use super::vehicle_manager::{VehicleSimulator, VEHICLE_ADVANCE_INTERVAL_MS};

/// Interval at which resolved difficulty predictions are applied
pub const DIFFICULTY_POLL_INTERVAL_MS: u64 = 50;
/// How long a warning stays visible
pub const WARNING_DURATION_MS: u64 = 2000;

/// Delay before a collided player is moved back, and the unlock after it
pub const COLLISION_RESET_DELAY_MS: u64 = 200;
pub const COLLISION_SETTLE_MS: u64 = 100;
/// Delay before a rule-breaking player is moved back; unlocks at once
pub const VIOLATION_RESET_DELAY_MS: u64 = 100;
/// Delay before a successful player is moved back, and the unlock after it
pub const CROSSING_RESET_DELAY_MS: u64 = 200;
pub const CROSSING_SETTLE_MS: u64 = 200;

pub const COLLISION_WARNING: &str = "Watch out for the vehicles!";

/// What cost the player a life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeLossCause {
    Collision,
    Violation(Violation),
}

/// Notifications delivered to subscribers after each handler
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    Started,
    ScoreChanged { score: u32 },
    CrossingCompleted { points: u32, elapsed_ms: u64 },
    LifeLost { lives: f32, cause: LifeLossCause },
    DifficultyChanged { level: u8 },
    LightChanged { color: LightColor },
    Paused,
    Resumed,
    GameOver { score: u32 },
}

/// Totals for the current session
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SessionStats {
    pub elapsed_ms: u64,
    pub score: u32,
    pub lives: f32,
    pub difficulty_level: u8,
    pub crossings: u32,
    pub collisions: u32,
    pub violations: u32,
    pub vehicles_spawned: u64,
    pub vehicles_despawned: u64,
    pub light_transitions: u64,
}

/// Pending second half of a reset sequence
#[derive(Debug, Clone, Copy)]
struct ReturnPlan {
    to_start_column: bool,
    settle_ms: u64,
    after_crossing: bool,
}

type Observer = Box<dyn FnMut(&GameEvent)>;

/// One game from start to game over, with everything it owns
pub struct GameSession {
    config: SimConfig,
    clock: SimulationClock,
    rng: StdRng,

    state: GameState,
    difficulty: DifficultyController,
    light: TrafficLightMachine,
    crosswalk: CrosswalkManager,
    vehicles: VehicleSimulator,
    collisions: CollisionDetector,
    player: PlayerController,

    commands: VecDeque<Command>,
    warning: Option<String>,
    return_plan: Option<ReturnPlan>,
    /// Reference point of the crossing time bonus
    last_hazard_ms: u64,
    /// Spawn period the spawn timer is currently armed with
    spawn_period_ms: u64,

    started: bool,
    paused: bool,
    dirty: bool,

    events: Vec<GameEvent>,
    observers: Vec<Observer>,
}

impl GameSession {
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate().context("Invalid simulation config")?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let difficulty = DifficultyController::new(config.player_age)
            .with_timeout_ms(config.oracle_timeout_ms);
        let state = GameState::new(config.starting_lives);
        let settings = DifficultyTable::settings(state.difficulty_level);
        let viewport = config.viewport;

        Ok(Self {
            clock: SimulationClock::new(),
            rng,
            light: TrafficLightMachine::new(LightColor::Red, settings, 0),
            crosswalk: CrosswalkManager::new(viewport.width),
            vehicles: VehicleSimulator::new(),
            collisions: CollisionDetector::default(),
            player: PlayerController::new(viewport),
            spawn_period_ms: settings.spawn_rate_ms,
            state,
            difficulty,
            commands: VecDeque::new(),
            warning: None,
            return_plan: None,
            last_hazard_ms: 0,
            started: false,
            paused: false,
            dirty: true,
            events: Vec::new(),
            observers: Vec::new(),
            config,
        })
    }

    /// Attach a difficulty oracle; without one the fallback formula is used
    pub fn with_oracle(mut self, oracle: Arc<dyn DifficultyOracle>, dispatch: OracleDispatch) -> Self {
        let timeout = self.config.oracle_timeout_ms;
        self.difficulty = DifficultyController::new(self.config.player_age)
            .with_oracle(oracle, dispatch)
            .with_timeout_ms(timeout);
        self
    }

    /// Register a callback for every [`GameEvent`]
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&GameEvent) + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn difficulty(&self) -> &DifficultyController {
        &self.difficulty
    }

    pub fn light(&self) -> &TrafficLightMachine {
        &self.light
    }

    pub fn crosswalk(&self) -> &CrosswalkManager {
        &self.crosswalk
    }

    pub fn vehicles(&self) -> &VehicleSimulator {
        &self.vehicles
    }

    pub fn player(&self) -> &PlayerController {
        &self.player
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    /// Mutable access for scripted setups such as tests and demos
    pub fn crosswalk_mut(&mut self) -> &mut CrosswalkManager {
        self.dirty = true;
        &mut self.crosswalk
    }

    /// Mutable access for scripted setups such as tests and demos
    pub fn vehicles_mut(&mut self) -> &mut VehicleSimulator {
        self.dirty = true;
        &mut self.vehicles
    }

    /// Mutable access for scripted setups such as tests and demos
    pub fn player_mut(&mut self) -> &mut PlayerController {
        self.dirty = true;
        &mut self.player
    }

    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_game_over(&self) -> bool {
        self.state.game_over
    }

    fn settings(&self) -> &'static DifficultySettings {
        DifficultyTable::settings(self.state.difficulty_level)
    }

    fn lane_count(&self) -> u32 {
        self.difficulty.stats().lane_count
    }

    /// Arm every timer of a running game
    pub fn start(&mut self) {
        if self.started {
            debug!("Session already started");
            return;
        }
        let settings = self.settings();
        let now = self.clock.now_ms();

        self.light = TrafficLightMachine::new(LightColor::Red, settings, now);
        self.clock
            .schedule_once(TaskKind::LightPhase, self.light.phase_duration_ms());
        if self.light.countdown_sec() > 0 {
            self.clock
                .schedule_repeating(TaskKind::RedCountdown, COUNTDOWN_TICK_MS);
        }
        self.spawn_period_ms = settings.spawn_rate_ms;
        self.clock
            .schedule_repeating(TaskKind::VehicleSpawn, self.spawn_period_ms);
        self.clock
            .schedule_repeating(TaskKind::VehicleAdvance, VEHICLE_ADVANCE_INTERVAL_MS);
        self.clock
            .schedule_repeating(TaskKind::CollisionCheck, COLLISION_CHECK_INTERVAL_MS);
        self.clock
            .schedule_repeating(TaskKind::InputPoll, INPUT_POLL_INTERVAL_MS);
        self.clock
            .schedule_repeating(TaskKind::DifficultyPoll, DIFFICULTY_POLL_INTERVAL_MS);

        self.last_hazard_ms = now;
        self.started = true;
        self.dirty = true;
        info!(
            "Session started: level {}, {} lanes, {} lives",
            self.state.difficulty_level,
            self.lane_count(),
            self.state.lives()
        );
        self.emit(GameEvent::Started);
        self.flush_events();
    }

    pub fn pause(&mut self) {
        if !self.started || self.paused || self.state.game_over {
            return;
        }
        self.clock.suspend();
        self.paused = true;
        self.dirty = true;
        info!("Paused with {} timers suspended", self.clock.suspended_tasks().len());
        self.emit(GameEvent::Paused);
        self.flush_events();
    }

    pub fn resume(&mut self) {
        if !self.paused {
            return;
        }
        self.clock.resume();
        self.paused = false;
        self.dirty = true;
        info!("Resumed with {} timers", self.clock.active_count());
        self.emit(GameEvent::Resumed);
        self.flush_events();
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Deliver an input command
    ///
    /// `Pause` toggles right away; movement is queued for the next input
    /// poll and dropped while paused, over or not started.
    pub fn submit(&mut self, command: Command) {
        if command == Command::Pause {
            self.toggle_pause();
            return;
        }
        if !self.started || self.paused || self.state.game_over {
            return;
        }
        self.commands.push_back(command);
    }

    /// Run every timer that falls within the next `delta_ms`
    pub fn advance(&mut self, delta_ms: u64) {
        let target = self.clock.now_ms() + delta_ms;
        while let Some(kind) = self.clock.pop_due(target) {
            if let Err(e) = self.run_task(kind) {
                error!("Task {:?} failed: {:#}", kind, e);
            }
            self.flush_events();
        }
        self.clock.advance_to(target);
    }

    /// Cancel every timer and return to a fresh, not yet started game
    ///
    /// Fails if any timer of the previous session survived cancellation.
    pub fn reset(&mut self) -> Result<()> {
        self.clock.cancel_all();
        ensure!(
            self.clock.is_idle(),
            "Timers still armed after cancelling the session"
        );
        self.clock.reset();

        self.state.reset();
        self.difficulty.reset();
        self.vehicles.clear();
        self.collisions.reset();
        self.player.reset();
        self.crosswalk = CrosswalkManager::new(self.config.viewport.width);
        self.light = TrafficLightMachine::new(LightColor::Red, self.settings(), 0);
        self.commands.clear();
        self.events.clear();
        self.warning = None;
        self.return_plan = None;
        self.last_hazard_ms = 0;
        self.started = false;
        self.paused = false;
        self.dirty = true;
        info!("Session reset");
        Ok(())
    }

    /// Stop for good and release the timers
    pub fn teardown(mut self) -> SessionStats {
        self.clock.cancel_all();
        self.commands.clear();
        info!("Session torn down");
        self.stats()
    }

    fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    fn flush_events(&mut self) {
        if self.events.is_empty() {
            return;
        }
        let events = std::mem::take(&mut self.events);
        for event in &events {
            if let GameEvent::ScoreChanged { score } = event {
                self.difficulty.update_difficulty(*score, self.clock.now_ms());
            }
            for observer in self.observers.iter_mut() {
                observer(event);
            }
        }
    }

    fn run_task(&mut self, kind: TaskKind) -> Result<()> {
        match kind {
            TaskKind::LightPhase => self.on_light_phase(),
            TaskKind::RedCountdown => {
                if !self.light.tick_countdown() {
                    self.clock.cancel(TaskKind::RedCountdown);
                }
                self.dirty = true;
                Ok(())
            }
            TaskKind::VehicleSpawn => self.on_spawn(),
            TaskKind::VehicleAdvance => {
                let report = self.vehicles.advance(
                    self.light.is_red(),
                    self.crosswalk.center_x(),
                    &self.config.viewport,
                );
                if report.moved > 0 || report.despawned > 0 {
                    self.dirty = true;
                }
                Ok(())
            }
            TaskKind::CollisionCheck => {
                self.on_collision_check();
                Ok(())
            }
            TaskKind::InputPoll => {
                self.on_input_poll();
                Ok(())
            }
            TaskKind::DifficultyPoll => {
                if let Some(level) = self.difficulty.poll(self.clock.now_ms()) {
                    self.apply_level(level);
                }
                Ok(())
            }
            TaskKind::WarningExpiry => {
                self.warning = None;
                self.dirty = true;
                Ok(())
            }
            TaskKind::PlayerReset => self.on_player_reset(),
            TaskKind::ReturnComplete => self.on_return_complete(),
        }
    }

    fn on_light_phase(&mut self) -> Result<()> {
        let now = self.clock.now_ms();
        let settings = self.settings();
        let (color, duration) = self.light.advance_phase(settings, now);
        ensure!(duration > 0, "Light phase {} has no duration", color.as_str());

        self.clock.schedule_once(TaskKind::LightPhase, duration);
        if color == LightColor::Red && self.light.countdown_sec() > 0 {
            self.clock
                .schedule_repeating(TaskKind::RedCountdown, COUNTDOWN_TICK_MS);
        } else {
            self.clock.cancel(TaskKind::RedCountdown);
        }
        self.dirty = true;
        self.emit(GameEvent::LightChanged { color });
        Ok(())
    }

    fn on_spawn(&mut self) -> Result<()> {
        let lanes = self.lane_count();
        ensure!(lanes > 0, "Cannot spawn on a road without lanes");
        let settings = self.settings();
        self.vehicles
            .spawn(&mut self.rng, lanes, settings, &self.config.viewport);
        self.dirty = true;
        Ok(())
    }

    fn on_collision_check(&mut self) {
        if self.player.is_returning() {
            return;
        }
        let hitbox = self.player.hitbox();
        let now = self.clock.now_ms();
        if self.collisions.check(&hitbox, self.vehicles.vehicles(), now) {
            debug!("Collision at {}ms", now);
            self.penalize(LifeLossCause::Collision);
        }
    }

    fn on_input_poll(&mut self) {
        while let Some(command) = self.commands.pop_front() {
            if self.state.game_over {
                self.commands.clear();
                return;
            }
            let lanes = self.lane_count();
            let outcome = self
                .player
                .apply(command, self.light.color(), &self.crosswalk, lanes);
            match outcome {
                MoveOutcome::Moved => {
                    self.dirty = true;
                    if is_crossing_complete(self.player.player(), &self.crosswalk) {
                        self.complete_crossing();
                    }
                }
                MoveOutcome::Rejected(violation) => {
                    debug!("Rejected {:?}: {:?}", command, violation);
                    self.penalize(LifeLossCause::Violation(violation));
                }
                MoveOutcome::Ignored => {}
            }
        }
    }

    fn complete_crossing(&mut self) {
        let now = self.clock.now_ms();
        let elapsed = now.saturating_sub(self.last_hazard_ms);
        let points = crossing_points(self.difficulty.stats().target_cross_time_sec, elapsed);

        self.state.award_crossing(points);
        let center = self.crosswalk.reposition(&mut self.rng);
        info!(
            "Crossing completed in {}ms for {} points, crosswalk moved to {:.0}",
            elapsed, points, center
        );

        self.begin_return(
            CROSSING_RESET_DELAY_MS,
            ReturnPlan {
                to_start_column: true,
                settle_ms: CROSSING_SETTLE_MS,
                after_crossing: true,
            },
        );
        self.emit(GameEvent::CrossingCompleted {
            points,
            elapsed_ms: elapsed,
        });
        self.emit(GameEvent::ScoreChanged {
            score: self.state.score,
        });
    }

    /// Shared penalty path of collisions and rule violations
    fn penalize(&mut self, cause: LifeLossCause) {
        let now = self.clock.now_ms();
        self.last_hazard_ms = now;

        let message = match cause {
            LifeLossCause::Collision => {
                self.state.collisions += 1;
                COLLISION_WARNING
            }
            LifeLossCause::Violation(violation) => {
                self.state.violations += 1;
                violation.warning()
            }
        };
        self.warning = Some(message.to_string());
        self.clock
            .schedule_once(TaskKind::WarningExpiry, WARNING_DURATION_MS);
        self.dirty = true;

        if self.state.lose_life() {
            self.difficulty.record_attempt();
            info!("Life lost ({:?}), {:.1} left", cause, self.state.lives());
            self.emit(GameEvent::LifeLost {
                lives: self.state.lives(),
                cause,
            });
        }

        if self.state.game_over {
            self.finish_game();
            return;
        }

        let (delay, plan) = match cause {
            LifeLossCause::Collision => (
                COLLISION_RESET_DELAY_MS,
                ReturnPlan {
                    to_start_column: false,
                    settle_ms: COLLISION_SETTLE_MS,
                    after_crossing: false,
                },
            ),
            LifeLossCause::Violation(_) => (
                VIOLATION_RESET_DELAY_MS,
                ReturnPlan {
                    to_start_column: false,
                    settle_ms: 0,
                    after_crossing: false,
                },
            ),
        };
        self.begin_return(delay, plan);
    }

    fn begin_return(&mut self, delay_ms: u64, plan: ReturnPlan) {
        self.player.begin_return();
        self.commands.clear();
        self.return_plan = Some(plan);
        self.clock.schedule_once(TaskKind::PlayerReset, delay_ms);
    }

    fn on_player_reset(&mut self) -> Result<()> {
        let plan = self
            .return_plan
            .context("Player reset fired without a pending return")?;
        self.player.return_to_start(plan.to_start_column);
        self.clock
            .schedule_once(TaskKind::ReturnComplete, plan.settle_ms);
        self.dirty = true;
        Ok(())
    }

    fn on_return_complete(&mut self) -> Result<()> {
        let Some(plan) = self.return_plan.take() else {
            bail!("Return completed without a pending return");
        };
        self.player.finish_return();
        if plan.after_crossing {
            self.last_hazard_ms = self.clock.now_ms();
        }
        self.dirty = true;
        Ok(())
    }

    fn apply_level(&mut self, level: u8) {
        self.state.set_difficulty_level(level);
        let spawn_rate = self.settings().spawn_rate_ms;
        if spawn_rate != self.spawn_period_ms {
            self.spawn_period_ms = spawn_rate;
            self.clock
                .schedule_repeating(TaskKind::VehicleSpawn, spawn_rate);
        }
        self.dirty = true;
        self.emit(GameEvent::DifficultyChanged { level });
    }

    fn finish_game(&mut self) {
        self.clock.cancel_all();
        self.commands.clear();
        self.return_plan = None;
        self.dirty = true;
        info!("Game over with score {}", self.state.score);
        self.emit(GameEvent::GameOver {
            score: self.state.score,
        });
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            elapsed_ms: self.clock.now_ms(),
            score: self.state.score,
            lives: self.state.lives(),
            difficulty_level: self.state.difficulty_level,
            crossings: self.state.crossings_completed,
            collisions: self.state.collisions,
            violations: self.state.violations,
            vehicles_spawned: self.vehicles.total_spawned(),
            vehicles_despawned: self.vehicles.total_despawned(),
            light_transitions: self.light.transitions(),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            time_ms: self.clock.now_ms(),
            player: *self.player.player(),
            vehicles: self.vehicles.vehicles().cloned().collect(),
            light_color: self.light.color(),
            countdown: self.light.countdown_sec(),
            score: self.state.score,
            lives: self.state.lives(),
            difficulty_level: self.state.difficulty_level,
            lane_count: self.lane_count(),
            vehicle_speed_kmh: self.settings().vehicle_speed_kmh,
            crosswalk_center_x: self.crosswalk.center_x(),
            warning_message: self.warning.clone(),
            paused: self.paused,
            game_over: self.state.game_over,
            viewport: self.config.viewport,
        }
    }

    /// Snapshot if anything changed since the last call
    pub fn take_snapshot_if_changed(&mut self) -> Option<Snapshot> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::types::VEHICLE_SPAWN_OFFSET;

    fn started(seed: u64) -> GameSession {
        let mut session = GameSession::new(SimConfig::default().with_seed(seed)).unwrap();
        session.start();
        session
    }

    #[test]
    fn test_stray_return_tasks_fail() {
        let mut session = started(1);
        assert!(session.run_task(TaskKind::PlayerReset).is_err());
        assert!(session.run_task(TaskKind::ReturnComplete).is_err());
    }

    #[test]
    fn test_failing_task_does_not_stop_other_timers() {
        let mut session = started(1);
        let width = session.config.viewport.width;
        session.clock.schedule_once(TaskKind::PlayerReset, 50);
        session.clock.schedule_once(TaskKind::ReturnComplete, 120);

        session.advance(6100);
        assert_eq!(session.now_ms(), 6100);
        assert!(!session.clock.is_scheduled(TaskKind::PlayerReset));
        assert!(!session.clock.is_scheduled(TaskKind::ReturnComplete));

        assert_eq!(session.light.color(), LightColor::Green);
        assert!(session.vehicles.total_spawned() > 0);
        let moved = session.vehicles.vehicles().any(|vehicle| {
            vehicle.position.x != -VEHICLE_SPAWN_OFFSET
                && vehicle.position.x != width + VEHICLE_SPAWN_OFFSET
        });
        assert!(moved, "no vehicle advanced after the failed tasks");
        assert!(session.clock.is_scheduled(TaskKind::VehicleAdvance));
        assert!(!session.player.is_returning());
    }
}
