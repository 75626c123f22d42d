//! Score leaderboard
//!
//! Persisted as a JSON file. Storage is best effort: failures are logged and
//! never stop a game.

use anyhow::{ensure, Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Number of entries returned by [`Leaderboard::top`]
pub const TOP_SCORES: usize = 10;
/// Longest accepted player name
pub const MAX_NAME_LEN: usize = 32;

/// A stored score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    pub player_name: String,
    pub score: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    /// Score of the most recently finished game
    #[serde(default)]
    pub last_score: u32,
    #[serde(default)]
    entries: Vec<ScoreRecord>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Best scores first, at most [`TOP_SCORES`]
    ///
    /// Equal scores keep their submission order.
    pub fn top(&self) -> Vec<ScoreRecord> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| b.score.cmp(&a.score));
        sorted.truncate(TOP_SCORES);
        sorted
    }

    /// Validate and store a score, returning the stored record
    pub fn submit(&mut self, player_name: &str, score: u32) -> Result<ScoreRecord> {
        let name = player_name.trim();
        ensure!(!name.is_empty(), "Player name is required");
        ensure!(
            name.chars().count() <= MAX_NAME_LEN,
            "Player name is longer than {} characters",
            MAX_NAME_LEN
        );
        let record = ScoreRecord {
            player_name: name.to_string(),
            score,
        };
        self.entries.push(record.clone());
        self.last_score = score;
        Ok(record)
    }

    /// Load from `path`; a missing file is an empty leaderboard
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scores from {}", path.display()))?;
        let board = serde_json::from_str(&json)
            .with_context(|| format!("Malformed scores file {}", path.display()))?;
        Ok(board)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to encode scores")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write scores to {}", path.display()))?;
        Ok(())
    }
}

/// Load, submit and save in one go; errors are logged, not returned
pub fn record_best_effort(path: &Path, player_name: &str, score: u32) -> Option<ScoreRecord> {
    let result = Leaderboard::load(path).and_then(|mut board| {
        let record = board.submit(player_name, score)?;
        board.save(path)?;
        Ok(record)
    });
    match result {
        Ok(record) => {
            info!("Saved score {} for {}", record.score, record.player_name);
            Some(record)
        }
        Err(e) => {
            warn!("Could not save score: {:#}", e);
            None
        }
    }
}
