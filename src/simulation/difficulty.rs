//! Difficulty levels and the per-level tuning table
//!
//! Harder levels mean more lanes, faster and denser traffic and shorter
//! light phases. Values are fixed configuration, not computed.

use serde::Serialize;

/// Lowest difficulty level
pub const MIN_LEVEL: u8 = 1;
/// Highest difficulty level
pub const MAX_LEVEL: u8 = 10;
/// Score needed to climb one level on the fallback path
pub const POINTS_PER_LEVEL: u32 = 100;

/// Crossing-time allowance at level 1, in seconds
pub const BASE_TARGET_CROSS_TIME_SEC: f32 = 6.0;
/// Extra crossing-time allowance granted per level above 1
pub const CROSS_TIME_ALLOWANCE_PER_LEVEL: f32 = 0.25;

/// Tuning values for one difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DifficultySettings {
    pub lanes: u32,
    pub vehicle_speed_kmh: f32,
    /// Milliseconds between vehicle spawns
    pub spawn_rate_ms: u64,
    pub red_light_ms: u64,
    pub green_light_ms: u64,
    pub yellow_light_ms: u64,
    pub traffic_density: f32,
}

const fn settings(
    lanes: u32,
    vehicle_speed_kmh: f32,
    spawn_rate_ms: u64,
    red_light_ms: u64,
    green_light_ms: u64,
    yellow_light_ms: u64,
    traffic_density: f32,
) -> DifficultySettings {
    DifficultySettings {
        lanes,
        vehicle_speed_kmh,
        spawn_rate_ms,
        red_light_ms,
        green_light_ms,
        yellow_light_ms,
        traffic_density,
    }
}

/// Level 1 is at index 0
const TABLE: [DifficultySettings; MAX_LEVEL as usize] = [
    settings(2, 20.0, 2000, 6000, 4000, 2000, 0.3),
    settings(2, 50.0, 1900, 5000, 4000, 2000, 0.4),
    settings(4, 80.0, 1800, 4000, 3500, 1500, 0.5),
    settings(4, 120.0, 1700, 3000, 3000, 1500, 0.6),
    settings(4, 140.0, 1600, 3000, 2500, 1500, 0.7),
    settings(6, 160.0, 1500, 2000, 2000, 1000, 0.8),
    settings(6, 180.0, 1400, 1000, 1000, 1000, 0.85),
    settings(6, 200.0, 1300, 1000, 1000, 1000, 0.9),
    settings(6, 200.0, 1200, 1000, 1000, 1000, 0.95),
    settings(6, 200.0, 1000, 1000, 1000, 1000, 1.0),
];

/// Static lookup from difficulty level to its settings
pub struct DifficultyTable;

impl DifficultyTable {
    /// Settings for a level; out-of-range levels are clamped into [1, 10]
    pub fn settings(level: u8) -> &'static DifficultySettings {
        let level = level.clamp(MIN_LEVEL, MAX_LEVEL);
        &TABLE[(level - 1) as usize]
    }

    /// Iterate over (level, settings) pairs in ascending level order
    pub fn levels() -> impl Iterator<Item = (u8, &'static DifficultySettings)> {
        TABLE.iter().enumerate().map(|(i, s)| (i as u8 + 1, s))
    }
}

/// Deterministic level used whenever the oracle cannot answer
pub fn fallback_level(score: u32) -> u8 {
    let level = score / POINTS_PER_LEVEL + 1;
    level.min(MAX_LEVEL as u32) as u8
}

/// Clamp a raw oracle prediction into a level
///
/// Returns `None` for predictions that are not finite numbers.
pub fn level_from_prediction(prediction: f64) -> Option<u8> {
    if !prediction.is_finite() {
        return None;
    }
    Some(prediction.round().clamp(MIN_LEVEL as f64, MAX_LEVEL as f64) as u8)
}

/// Feature vector sent to the difficulty oracle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStats {
    pub player_age: u32,
    pub target_cross_time_sec: f32,
    pub vehicle_speed_kmh: f32,
    pub lane_count: u32,
    pub attempt_count: u32,
}

impl GameStats {
    /// Stats of a fresh game for a player of the given age
    pub fn new(player_age: u32) -> Self {
        Self::for_score(0, player_age, 0)
    }

    fn for_score(score: u32, player_age: u32, attempt_count: u32) -> Self {
        let level = fallback_level(score);
        let settings = DifficultyTable::settings(level);
        Self {
            player_age,
            target_cross_time_sec: BASE_TARGET_CROSS_TIME_SEC
                + CROSS_TIME_ALLOWANCE_PER_LEVEL * (level - 1) as f32,
            vehicle_speed_kmh: settings.vehicle_speed_kmh,
            lane_count: settings.lanes,
            attempt_count,
        }
    }

    /// Recompute the score-driven features, keeping age and attempts
    ///
    /// Speed and lane count grow with score; the crossing-time allowance
    /// grows slightly to compensate for the extra hazard.
    pub fn derive(&self, score: u32) -> Self {
        Self::for_score(score, self.player_age, self.attempt_count)
    }
}
