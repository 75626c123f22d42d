//! Player/vehicle overlap detection with a cooldown

use super::types::Rect;
use super::vehicle::SimVehicle;

/// Interval of the collision check
pub const COLLISION_CHECK_INTERVAL_MS: u64 = 100;
/// Minimum time between two registered collisions
pub const COLLISION_COOLDOWN_MS: u64 = 1000;

#[derive(Debug, Clone)]
pub struct CollisionDetector {
    cooldown_ms: u64,
    last_collision_ms: Option<u64>,
    total: u64,
}

impl Default for CollisionDetector {
    fn default() -> Self {
        Self::new(COLLISION_COOLDOWN_MS)
    }
}

impl CollisionDetector {
    pub fn new(cooldown_ms: u64) -> Self {
        Self {
            cooldown_ms,
            last_collision_ms: None,
            total: 0,
        }
    }

    pub fn last_collision_ms(&self) -> Option<u64> {
        self.last_collision_ms
    }

    /// Registered collisions so far
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn reset(&mut self) {
        self.last_collision_ms = None;
        self.total = 0;
    }

    fn cooling_down(&self, now_ms: u64) -> bool {
        match self.last_collision_ms {
            Some(last) => now_ms.saturating_sub(last) <= self.cooldown_ms,
            None => false,
        }
    }

    /// Test the player against every vehicle
    ///
    /// Returns true when a collision is registered. Overlapping several
    /// vehicles at once still counts as one collision.
    pub fn check<'a, I>(&mut self, player_hitbox: &Rect, vehicles: I, now_ms: u64) -> bool
    where
        I: IntoIterator<Item = &'a SimVehicle>,
    {
        if self.cooling_down(now_ms) {
            return false;
        }
        let hit = vehicles
            .into_iter()
            .any(|vehicle| vehicle.hitbox().overlaps(player_hitbox));
        if hit {
            self.last_collision_ms = Some(now_ms);
            self.total += 1;
        }
        hit
    }
}
