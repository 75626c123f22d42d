//! Difficulty oracle seam
//!
//! The oracle is an external predictor that maps a [`GameStats`] feature
//! vector to a suggested difficulty. Any failure is handled by the caller
//! through the deterministic fallback, so implementations are free to error.

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use super::difficulty::GameStats;

/// Something that can suggest a difficulty for the current stats
pub trait DifficultyOracle: Send + Sync {
    /// Return the raw (unrounded) predicted difficulty
    fn predict(&self, stats: &GameStats) -> Result<f64>;

    /// Whether `predict` may block, e.g. on network I/O
    ///
    /// Blocking oracles are always called off the simulation thread.
    fn is_blocking(&self) -> bool {
        false
    }
}

/// Oracle that always predicts the same value
#[derive(Debug, Clone, Copy)]
pub struct FixedOracle(pub f64);

impl DifficultyOracle for FixedOracle {
    fn predict(&self, _stats: &GameStats) -> Result<f64> {
        Ok(self.0)
    }
}

/// Oracle that is never reachable
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableOracle;

impl DifficultyOracle for UnavailableOracle {
    fn predict(&self, _stats: &GameStats) -> Result<f64> {
        bail!("difficulty oracle unavailable")
    }
}

/// Response body of the prediction endpoint
#[derive(Debug, Deserialize)]
struct PredictionResponse {
    success: bool,
    difficulty: Option<f64>,
    error: Option<String>,
}

/// Encode the stats as the JSON request body of the prediction endpoint
pub fn encode_request(stats: &GameStats) -> Result<String> {
    serde_json::to_string(stats).context("Failed to encode oracle request")
}

/// Decode a prediction response body
///
/// Anything but `{"success": true, "difficulty": <number>}` is an error.
pub fn decode_response(body: &str) -> Result<f64> {
    let response: PredictionResponse =
        serde_json::from_str(body).context("Malformed oracle response")?;
    if !response.success {
        bail!(
            "Oracle reported failure: {}",
            response.error.as_deref().unwrap_or("unknown error")
        );
    }
    response
        .difficulty
        .context("Oracle response is missing the difficulty")
}

/// Adapter for a JSON prediction endpoint reached through any transport
///
/// The transport receives the encoded request body and returns the raw
/// response body, e.g. an HTTP POST to `/predict`. The transport may block,
/// so a controller always dispatches this oracle on a worker thread.
pub struct JsonOracle<T> {
    transport: T,
}

impl<T> JsonOracle<T>
where
    T: Fn(&str) -> Result<String> + Send + Sync,
{
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

impl<T> DifficultyOracle for JsonOracle<T>
where
    T: Fn(&str) -> Result<String> + Send + Sync,
{
    fn predict(&self, stats: &GameStats) -> Result<f64> {
        let request = encode_request(stats)?;
        let body = (self.transport)(&request).context("Oracle transport failed")?;
        decode_response(&body)
    }

    fn is_blocking(&self) -> bool {
        true
    }
}
