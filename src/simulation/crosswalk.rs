//! The single crosswalk and its horizontal placement

use rand::Rng;

use super::types::{CROSSWALK_MAX_FRACTION, CROSSWALK_MIN_FRACTION, CROSSWALK_WIDTH, PLAYER_SIZE};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrosswalkState {
    pub center_x: f32,
}

#[derive(Debug, Clone)]
pub struct CrosswalkManager {
    state: CrosswalkState,
    view_width: f32,
}

impl CrosswalkManager {
    /// Crosswalk starts centered in the view
    pub fn new(view_width: f32) -> Self {
        Self {
            state: CrosswalkState {
                center_x: view_width / 2.0,
            },
            view_width,
        }
    }

    pub fn center_x(&self) -> f32 {
        self.state.center_x
    }

    pub fn state(&self) -> CrosswalkState {
        self.state
    }

    /// Allowed range for the crosswalk center
    pub fn band(&self) -> (f32, f32) {
        (
            self.view_width * CROSSWALK_MIN_FRACTION,
            self.view_width * CROSSWALK_MAX_FRACTION,
        )
    }

    /// Place the center at `x`, clamped into the band
    pub fn place(&mut self, x: f32) {
        let (min, max) = self.band();
        self.state.center_x = x.clamp(min, max);
    }

    /// Draw a new center uniformly from the band
    pub fn reposition<R: Rng>(&mut self, rng: &mut R) -> f32 {
        let (min, max) = self.band();
        self.state.center_x = rng.random_range(min..=max);
        self.state.center_x
    }

    /// Whether the player's horizontal center is inside a window of `width`
    pub fn is_player_within(&self, player_x: f32, width: f32) -> bool {
        let player_center = player_x + PLAYER_SIZE / 2.0;
        (player_center - self.state.center_x).abs() < width / 2.0
    }

    /// [`Self::is_player_within`] using the standard crosswalk width
    pub fn contains_player(&self, player_x: f32) -> bool {
        self.is_player_within(player_x, CROSSWALK_WIDTH)
    }
}
