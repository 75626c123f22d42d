//! Difficulty re-evaluation driven by score changes
//!
//! A score change recomputes the [`GameStats`] and asks the oracle for a
//! level. The answer is applied at the next poll, so gameplay never waits
//! on the oracle and the previous level stays active until then.

use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use super::difficulty::{fallback_level, level_from_prediction, GameStats, MIN_LEVEL};
use super::oracle::DifficultyOracle;

/// Simulated milliseconds to wait for a threaded prediction before falling back
pub const DEFAULT_ORACLE_TIMEOUT_MS: u64 = 2000;

/// How oracle requests are carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OracleDispatch {
    /// Call the oracle right away and apply the answer at the next poll
    #[default]
    Inline,
    /// Call the oracle on a worker thread and collect the answer through a channel
    Threaded,
}

enum PredictionState {
    Ready(Result<f64>),
    Waiting(Receiver<Result<f64>>),
}

struct PendingPrediction {
    request_id: u64,
    score: u32,
    issued_at_ms: u64,
    state: PredictionState,
}

/// Owns the difficulty level and the oracle feature vector
pub struct DifficultyController {
    oracle: Option<Arc<dyn DifficultyOracle>>,
    dispatch: OracleDispatch,
    timeout_ms: u64,
    level: u8,
    stats: GameStats,
    pending: Option<PendingPrediction>,
    next_request_id: u64,
}

impl DifficultyController {
    pub fn new(player_age: u32) -> Self {
        Self {
            oracle: None,
            dispatch: OracleDispatch::Inline,
            timeout_ms: DEFAULT_ORACLE_TIMEOUT_MS,
            level: MIN_LEVEL,
            stats: GameStats::new(player_age),
            pending: None,
            next_request_id: 0,
        }
    }

    /// Attach an oracle; without one every update takes the fallback path
    ///
    /// A blocking oracle is always threaded, whatever `dispatch` asks for.
    pub fn with_oracle(mut self, oracle: Arc<dyn DifficultyOracle>, dispatch: OracleDispatch) -> Self {
        self.dispatch = if oracle.is_blocking() && dispatch == OracleDispatch::Inline {
            debug!("Blocking difficulty oracle attached, dispatching on a worker thread");
            OracleDispatch::Threaded
        } else {
            dispatch
        };
        self.oracle = Some(oracle);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn dispatch(&self) -> OracleDispatch {
        self.dispatch
    }

    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    /// Whether a prediction has been requested but not applied yet
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Count one more attempt after a life loss
    pub fn record_attempt(&mut self) {
        self.stats.attempt_count += 1;
    }

    /// Back to level 1 with fresh stats; any in-flight prediction is dropped
    pub fn reset(&mut self) {
        self.level = MIN_LEVEL;
        self.stats = GameStats::new(self.stats.player_age);
        self.pending = None;
        // Bumping the id makes late answers from the old session unmatchable
        self.next_request_id += 1;
    }

    /// Recompute the stats for `score` and request a new level
    ///
    /// A newer request supersedes any prediction still in flight.
    pub fn update_difficulty(&mut self, score: u32, now_ms: u64) {
        self.stats = self.stats.derive(score);
        let request_id = self.next_request_id;
        self.next_request_id += 1;

        let state = match (&self.oracle, self.dispatch) {
            (None, _) => PredictionState::Ready(Err(anyhow!("no difficulty oracle configured"))),
            (Some(oracle), OracleDispatch::Inline) => {
                PredictionState::Ready(oracle.predict(&self.stats))
            }
            (Some(oracle), OracleDispatch::Threaded) => {
                let (tx, rx) = mpsc::channel();
                let oracle = Arc::clone(oracle);
                let stats = self.stats;
                thread::spawn(move || {
                    // The receiver may be gone if a newer request replaced this one
                    let _ = tx.send(oracle.predict(&stats));
                });
                PredictionState::Waiting(rx)
            }
        };

        debug!("Difficulty request {} for score {}", request_id, score);
        self.pending = Some(PendingPrediction {
            request_id,
            score,
            issued_at_ms: now_ms,
            state,
        });
    }

    /// Apply a resolved prediction, if any
    ///
    /// Returns the new level when it changed.
    pub fn poll(&mut self, now_ms: u64) -> Option<u8> {
        let pending = self.pending.as_mut()?;

        let outcome = match &mut pending.state {
            PredictionState::Ready(_) => None,
            PredictionState::Waiting(rx) => match rx.try_recv() {
                Ok(result) => Some(result),
                Err(TryRecvError::Empty) => {
                    if now_ms.saturating_sub(pending.issued_at_ms) < self.timeout_ms {
                        return None;
                    }
                    Some(Err(anyhow!("difficulty oracle timed out")))
                }
                Err(TryRecvError::Disconnected) => {
                    Some(Err(anyhow!("difficulty oracle worker exited without answering")))
                }
            },
        };

        let pending = self.pending.take()?;
        let result = match (outcome, pending.state) {
            (Some(result), _) => result,
            (None, PredictionState::Ready(result)) => result,
            (None, PredictionState::Waiting(_)) => return None,
        };

        let level = resolve_level(result, pending.score);
        debug!(
            "Difficulty request {} resolved to level {}",
            pending.request_id, level
        );

        if level == self.level {
            return None;
        }
        info!("Difficulty level {} -> {}", self.level, level);
        self.level = level;
        Some(level)
    }
}

/// Turn an oracle outcome into a level, falling back on any failure
pub fn resolve_level(prediction: Result<f64>, score: u32) -> u8 {
    let fallback = fallback_level(score);
    match prediction {
        Ok(value) => level_from_prediction(value).unwrap_or_else(|| {
            warn!("Oracle returned a non-finite difficulty, using fallback {}", fallback);
            fallback
        }),
        Err(e) => {
            warn!("Difficulty oracle failed ({:#}), using fallback {}", e, fallback);
            fallback
        }
    }
}
