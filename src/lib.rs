//! Crosswalk Simulation Library
//!
//! A street-crossing game engine that runs headless; renderers consume its
//! snapshots.

pub mod autopilot;
pub mod leaderboard;
pub mod simulation;
