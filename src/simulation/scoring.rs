//! Crossing detection and crossing points

use super::crosswalk::CrosswalkManager;
use super::game_state::CROSSING_BASE_POINTS;
use super::player::Player;
use super::types::CROSSING_THRESHOLD_Y;

/// Points for a crossing finished `elapsed_ms` after the last hazard
///
/// Every 100ms saved against the target adds one bonus point.
pub fn crossing_points(target_cross_time_sec: f32, elapsed_ms: u64) -> u32 {
    let target_ms = (target_cross_time_sec * 1000.0).round() as i64;
    let saved_ms = target_ms - elapsed_ms as i64;
    let bonus = if saved_ms > 0 { saved_ms / 100 } else { 0 };
    CROSSING_BASE_POINTS + bonus as u32
}

/// Whether the player just reached the far side through the crosswalk
pub fn is_crossing_complete(player: &Player, crosswalk: &CrosswalkManager) -> bool {
    !player.is_returning
        && player.position.y < CROSSING_THRESHOLD_Y
        && crosswalk.contains_player(player.position.x)
}
