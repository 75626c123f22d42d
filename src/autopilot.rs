//! Scripted input source for headless runs
//!
//! Walks to the crosswalk, waits for red and crosses. It only reads
//! snapshots, like any other input source.

use crate::simulation::{Command, LightColor, Snapshot, PLAYER_SIZE, PLAYER_STEP};

/// Aligned once the player's center is this close to the crosswalk center
const ALIGN_TOLERANCE: f32 = 30.0;
/// Do not step onto the road with less red time left than this
const MIN_RED_SECONDS_TO_ENTER: u32 = 2;

#[derive(Debug, Clone, Copy, Default)]
pub struct Autopilot;

impl Autopilot {
    /// Pick the next command for the frame, or wait
    pub fn next_command(&self, snapshot: &Snapshot) -> Option<Command> {
        if snapshot.paused || snapshot.game_over || snapshot.player.is_returning {
            return None;
        }

        let position = snapshot.player.position;
        let center = position.x + PLAYER_SIZE / 2.0;
        let offset = snapshot.crosswalk_center_x - center;
        let road_top = snapshot.viewport.road_top(snapshot.lane_count);
        let road_bottom = snapshot.viewport.road_bottom(snapshot.lane_count);
        let in_road = position.y >= road_top && position.y <= road_bottom;
        let red = snapshot.light_color == LightColor::Red;

        if in_road {
            // Committed: keep going while red, otherwise back off
            return Some(if red { Command::Up } else { Command::Down });
        }

        if position.y < road_top {
            return Some(Command::Up);
        }

        if offset.abs() > ALIGN_TOLERANCE {
            return Some(if offset > 0.0 {
                Command::Right
            } else {
                Command::Left
            });
        }

        let next_y = position.y - PLAYER_STEP;
        let entering = next_y <= road_bottom;
        if entering && !(red && snapshot.countdown >= MIN_RED_SECONDS_TO_ENTER) {
            return None;
        }
        Some(Command::Up)
    }
}
