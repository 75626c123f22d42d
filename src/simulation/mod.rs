//! Standalone crossing simulation module
//!
//! This module contains all the core simulation logic: the traffic light,
//! vehicles, player rules, scoring, difficulty and the timers that drive
//! them. It runs headless and can be tested without any renderer.

mod collision;
mod config;
mod crosswalk;
mod difficulty;
mod difficulty_controller;
mod game_state;
mod oracle;
mod player;
mod scheduler;
mod scoring;
mod session;
mod snapshot;
mod traffic_light;
mod types;
mod vehicle;
mod vehicle_manager;

// Re-export public types for external use
pub use collision::{CollisionDetector, COLLISION_CHECK_INTERVAL_MS, COLLISION_COOLDOWN_MS};
pub use config::{SimConfig, MAX_PLAYER_AGE, MIN_PLAYER_AGE};
pub use crosswalk::{CrosswalkManager, CrosswalkState};
pub use difficulty::{
    fallback_level, level_from_prediction, DifficultySettings, DifficultyTable, GameStats,
    BASE_TARGET_CROSS_TIME_SEC, CROSS_TIME_ALLOWANCE_PER_LEVEL, MAX_LEVEL, MIN_LEVEL,
    POINTS_PER_LEVEL,
};
pub use difficulty_controller::{
    resolve_level, DifficultyController, OracleDispatch, DEFAULT_ORACLE_TIMEOUT_MS,
};
pub use game_state::{
    GameState, CROSSING_BASE_POINTS, LIFE_LOSS, MAX_LIVES, STARTING_LIVES,
};
pub use oracle::{
    decode_response, encode_request, DifficultyOracle, FixedOracle, JsonOracle, UnavailableOracle,
};
pub use player::{Command, MoveOutcome, Player, PlayerController, Violation, INPUT_POLL_INTERVAL_MS};
pub use scheduler::{SimulationClock, SuspendedTask, TaskKind};
pub use scoring::{crossing_points, is_crossing_complete};
pub use session::{
    GameEvent, GameSession, LifeLossCause, SessionStats, COLLISION_RESET_DELAY_MS,
    COLLISION_SETTLE_MS, COLLISION_WARNING, CROSSING_RESET_DELAY_MS, CROSSING_SETTLE_MS,
    DIFFICULTY_POLL_INTERVAL_MS, VIOLATION_RESET_DELAY_MS, WARNING_DURATION_MS,
};
pub use snapshot::Snapshot;
pub use traffic_light::{phase_duration_ms, TrafficLightMachine, TrafficLightState, COUNTDOWN_TICK_MS};
pub use types::*;
pub use vehicle::{kmh_to_px_per_tick, SimVehicle, VehicleUpdateResult, KMH_TO_PX_PER_TICK};
pub use vehicle_manager::{AdvanceReport, VehicleSimulator, VEHICLE_ADVANCE_INTERVAL_MS};
