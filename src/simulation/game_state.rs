//! Game state tracking for the street-crossing game
//!
//! This module tracks the player's score, lives and difficulty level.
//! Only the session mutates it, through the methods below.

use log::{info, warn};

use super::difficulty::{MAX_LEVEL, MIN_LEVEL};

/// Lives at the start of a game
pub const STARTING_LIVES: f32 = 4.0;
/// Highest number of lives a game may start with
pub const MAX_LIVES: f32 = 4.0;
/// Lives are lost in half steps
pub const LIFE_LOSS: f32 = 0.5;

/// Base points for a completed crossing
pub const CROSSING_BASE_POINTS: u32 = 100;

/// Score, lives and level of the running game
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    /// Player's current score
    pub score: u32,

    /// Lives counted in halves so that arithmetic stays exact
    half_lives: u32,

    /// Half lives the game was (re)started with
    starting_half_lives: u32,

    /// Set when lives reach zero; only a reset clears it
    pub game_over: bool,

    /// Active difficulty level in [1, 10]
    pub difficulty_level: u8,

    /// Successful crossings this game
    pub crossings_completed: u32,

    /// Collisions that cost a life this game
    pub collisions: u32,

    /// Rule violations that cost a life this game
    pub violations: u32,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(STARTING_LIVES)
    }
}

impl GameState {
    /// Create a new game state; lives are clamped to (0, 4] in half steps
    pub fn new(starting_lives: f32) -> Self {
        let half_lives = (starting_lives.clamp(LIFE_LOSS, MAX_LIVES) / LIFE_LOSS).round() as u32;
        Self {
            score: 0,
            half_lives,
            starting_half_lives: half_lives,
            game_over: false,
            difficulty_level: MIN_LEVEL,
            crossings_completed: 0,
            collisions: 0,
            violations: 0,
        }
    }

    pub fn lives(&self) -> f32 {
        self.half_lives as f32 * LIFE_LOSS
    }

    pub fn starting_lives(&self) -> f32 {
        self.starting_half_lives as f32 * LIFE_LOSS
    }

    /// Add points for a completed crossing
    pub fn award_crossing(&mut self, points: u32) {
        if self.game_over {
            return;
        }
        self.score += points;
        self.crossings_completed += 1;
    }

    /// Lose half a life
    ///
    /// Returns false when the game is already over; lives never go below zero.
    pub fn lose_life(&mut self) -> bool {
        if self.game_over {
            return false;
        }
        if self.half_lives == 0 {
            warn!("Life lost with no lives left, ending the game");
            self.game_over = true;
            return false;
        }
        self.half_lives -= 1;
        if self.half_lives == 0 {
            info!("Out of lives with score {}", self.score);
            self.game_over = true;
        }
        true
    }

    pub fn set_difficulty_level(&mut self, level: u8) {
        self.difficulty_level = level.clamp(MIN_LEVEL, MAX_LEVEL);
    }

    /// Back to the starting conditions
    pub fn reset(&mut self) {
        *self = Self::new(self.starting_lives());
    }

    /// Get a summary string for display
    pub fn summary(&self) -> String {
        format!(
            "Score: {} | Lives: {:.1} | Level: {} | Crossings: {} | Collisions: {} | Violations: {}{}",
            self.score,
            self.lives(),
            self.difficulty_level,
            self.crossings_completed,
            self.collisions,
            self.violations,
            if self.game_over { " | GAME OVER" } else { "" }
        )
    }
}
