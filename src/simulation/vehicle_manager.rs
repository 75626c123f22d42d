//! Vehicle spawning and management for the crosswalk simulation
//!
//! This module spawns, advances and culls vehicles. It separates vehicle
//! management from the session that schedules it.

use log::{debug, warn};
use rand::Rng;
use std::collections::BTreeMap;

use super::difficulty::{DifficultySettings, DifficultyTable};
use super::types::{Direction, Position, SimId, VehicleId, Viewport, VEHICLE_SPAWN_OFFSET};
use super::vehicle::{kmh_to_px_per_tick, SimVehicle, VehicleUpdateResult};

/// Interval of the vehicle movement tick
pub const VEHICLE_ADVANCE_INTERVAL_MS: u64 = 16;

/// What happened during one movement tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdvanceReport {
    pub moved: usize,
    pub held: usize,
    pub despawned: usize,
}

#[derive(Debug, Clone, Default)]
pub struct VehicleSimulator {
    /// Ordered by id so iteration is stable
    vehicles: BTreeMap<VehicleId, SimVehicle>,
    next_id: u64,
    total_spawned: u64,
    total_despawned: u64,
}

impl VehicleSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &SimVehicle> {
        self.vehicles.values()
    }

    pub fn get(&self, id: VehicleId) -> Option<&SimVehicle> {
        self.vehicles.get(&id)
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn total_spawned(&self) -> u64 {
        self.total_spawned
    }

    pub fn total_despawned(&self) -> u64 {
        self.total_despawned
    }

    /// Remove every vehicle; ids keep increasing
    pub fn clear(&mut self) {
        self.vehicles.clear();
    }

    fn next_vehicle_id(&mut self) -> VehicleId {
        let id = VehicleId(SimId(self.next_id));
        self.next_id += 1;
        id
    }

    /// Add a vehicle at an explicit position
    pub fn insert(&mut self, position: Position, lane: u32, direction: Direction, speed: f32) -> VehicleId {
        let id = self.next_vehicle_id();
        self.vehicles
            .insert(id, SimVehicle::new(id, position, lane, direction, speed));
        self.total_spawned += 1;
        id
    }

    /// Spawn a vehicle in a random lane, entering from a random side
    pub fn spawn<R: Rng>(
        &mut self,
        rng: &mut R,
        lanes: u32,
        settings: &DifficultySettings,
        viewport: &Viewport,
    ) -> VehicleId {
        let lanes = lanes.max(1);
        let lane = rng.random_range(0..lanes);
        let direction = if rng.random_bool(0.5) {
            Direction::Right
        } else {
            Direction::Left
        };
        let x = match direction {
            Direction::Right => -VEHICLE_SPAWN_OFFSET,
            Direction::Left => viewport.width + VEHICLE_SPAWN_OFFSET,
        };
        let position = Position::new(x, viewport.lane_y(lane, lanes));
        let speed = kmh_to_px_per_tick(settings.vehicle_speed_kmh);

        let id = self.insert(position, lane, direction, speed);
        debug!(
            "Spawned vehicle {:?} in lane {}/{} heading {:?} at {:.3}px/tick",
            id.0 .0, lane, lanes, direction, speed
        );
        id
    }

    /// Move every vehicle one tick and drop the ones that left the screen
    pub fn advance(&mut self, light_is_red: bool, crosswalk_x: f32, viewport: &Viewport) -> AdvanceReport {
        let max_lanes = DifficultyTable::levels()
            .map(|(_, s)| s.lanes)
            .max()
            .unwrap_or(1);
        let mut report = AdvanceReport::default();
        let mut to_remove = Vec::new();

        for (id, vehicle) in self.vehicles.iter_mut() {
            if vehicle.lane >= max_lanes {
                warn!(
                    "Vehicle {:?} is in lane {} outside the road, despawning",
                    id.0 .0, vehicle.lane
                );
                to_remove.push(*id);
                continue;
            }
            match vehicle.update(light_is_red, crosswalk_x, viewport.width) {
                VehicleUpdateResult::Continue => report.moved += 1,
                VehicleUpdateResult::Held => report.held += 1,
                VehicleUpdateResult::Despawn => to_remove.push(*id),
            }
        }

        for id in to_remove {
            self.vehicles.remove(&id);
            self.total_despawned += 1;
            report.despawned += 1;
        }
        report
    }
}
