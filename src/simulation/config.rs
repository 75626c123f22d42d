//! Session configuration

use anyhow::{ensure, Result};

use super::difficulty_controller::DEFAULT_ORACLE_TIMEOUT_MS;
use super::game_state::{LIFE_LOSS, MAX_LIVES, STARTING_LIVES};
use super::types::{Viewport, PLAYER_SIZE};

/// Youngest and oldest player the game is made for
pub const MIN_PLAYER_AGE: u32 = 3;
pub const MAX_PLAYER_AGE: u32 = 12;

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub viewport: Viewport,
    /// Seed for reproducible runs; `None` seeds from the OS
    pub seed: Option<u64>,
    pub player_age: u32,
    pub player_name: String,
    pub starting_lives: f32,
    /// Simulated milliseconds a threaded oracle request may take
    pub oracle_timeout_ms: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            seed: None,
            player_age: 8,
            player_name: "Player".to_string(),
            starting_lives: STARTING_LIVES,
            oracle_timeout_ms: DEFAULT_ORACLE_TIMEOUT_MS,
        }
    }
}

impl SimConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            (MIN_PLAYER_AGE..=MAX_PLAYER_AGE).contains(&self.player_age),
            "Player age must be between {} and {}, got {}",
            MIN_PLAYER_AGE,
            MAX_PLAYER_AGE,
            self.player_age
        );
        ensure!(
            self.viewport.width > PLAYER_SIZE * 2.0 && self.viewport.height > PLAYER_SIZE * 4.0,
            "Viewport {}x{} is too small",
            self.viewport.width,
            self.viewport.height
        );
        ensure!(
            self.starting_lives >= LIFE_LOSS && self.starting_lives <= MAX_LIVES,
            "Starting lives must be within [{}, {}]",
            LIFE_LOSS,
            MAX_LIVES
        );
        Ok(())
    }
}
