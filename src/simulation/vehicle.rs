//! Vehicle movement logic for the crosswalk simulation
//!
//! Standalone implementation that doesn't depend on any renderer.

use serde::Serialize;

use super::types::{
    Direction, Position, Rect, VehicleId, VEHICLE_DESPAWN_MARGIN, VEHICLE_HEIGHT,
    VEHICLE_HITBOX_INSET, VEHICLE_STOP_DISTANCE, VEHICLE_WIDTH,
};

/// km/h to pixels per movement tick
pub const KMH_TO_PX_PER_TICK: f32 = 0.277778 / 60.0;

/// Convert a speed in km/h to the pixels a vehicle covers each movement tick
pub fn kmh_to_px_per_tick(kmh: f32) -> f32 {
    kmh * KMH_TO_PX_PER_TICK
}

/// Result of a vehicle update indicating what action should be taken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleUpdateResult {
    /// Vehicle moved and is still on screen
    Continue,
    /// Vehicle is waiting at the stop line for the light
    Held,
    /// Vehicle left the visible bounds and should be removed
    Despawn,
}

/// A vehicle travelling along one lane
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimVehicle {
    pub id: VehicleId,
    pub position: Position,
    pub lane: u32,
    pub direction: Direction,
    /// Pixels per movement tick
    pub speed: f32,
}

impl SimVehicle {
    pub fn new(id: VehicleId, position: Position, lane: u32, direction: Direction, speed: f32) -> Self {
        Self {
            id,
            position,
            lane,
            direction,
            speed,
        }
    }

    pub fn hitbox(&self) -> Rect {
        Rect::inset(self.position, VEHICLE_WIDTH, VEHICLE_HEIGHT, VEHICLE_HITBOX_INSET)
    }

    /// Position at which this vehicle waits on red
    ///
    /// The leading edge stops [`VEHICLE_STOP_DISTANCE`] before the crosswalk
    /// center on the approach side.
    pub fn stop_line(&self, crosswalk_x: f32) -> f32 {
        match self.direction {
            Direction::Right => crosswalk_x - VEHICLE_STOP_DISTANCE - VEHICLE_WIDTH,
            Direction::Left => crosswalk_x + VEHICLE_STOP_DISTANCE,
        }
    }

    /// Whether the vehicle has not yet passed its stop line
    pub fn is_before_stop_line(&self, crosswalk_x: f32) -> bool {
        let stop = self.stop_line(crosswalk_x);
        match self.direction {
            Direction::Right => self.position.x <= stop,
            Direction::Left => self.position.x >= stop,
        }
    }

    /// Advance one movement tick
    ///
    /// On red a vehicle that has not passed its stop line moves at most up to
    /// the line and then holds. Vehicles already past it keep going so that
    /// none freezes on top of the crosswalk.
    pub fn update(&mut self, light_is_red: bool, crosswalk_x: f32, view_width: f32) -> VehicleUpdateResult {
        let mut result = VehicleUpdateResult::Continue;
        let mut next_x = self.position.x + self.direction.sign() * self.speed;

        if light_is_red && self.is_before_stop_line(crosswalk_x) {
            let stop = self.stop_line(crosswalk_x);
            next_x = match self.direction {
                Direction::Right => next_x.min(stop),
                Direction::Left => next_x.max(stop),
            };
            if next_x == self.position.x {
                result = VehicleUpdateResult::Held;
            }
        }

        self.position.x = next_x;

        if self.position.x <= -VEHICLE_DESPAWN_MARGIN
            || self.position.x >= view_width + VEHICLE_DESPAWN_MARGIN
        {
            return VehicleUpdateResult::Despawn;
        }
        result
    }
}
