//! Traffic light state machine
//!
//! Cycles red -> green -> yellow -> red. The machine only tracks state; the
//! session's scheduler owns the single phase timer and calls
//! [`TrafficLightMachine::advance_phase`] when it fires.

use log::debug;
use serde::Serialize;

use super::difficulty::DifficultySettings;
use super::types::LightColor;

/// Interval of the red countdown ticks
pub const COUNTDOWN_TICK_MS: u64 = 1000;

/// Currently active light phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrafficLightState {
    pub color: LightColor,
    /// Whole seconds left while red; zero for the other colors
    pub countdown_sec: u32,
}

#[derive(Debug, Clone)]
pub struct TrafficLightMachine {
    state: TrafficLightState,
    /// Duration the current phase was entered with
    phase_duration_ms: u64,
    phase_started_ms: u64,
    /// Completed transitions since the session started
    transitions: u64,
}

/// Duration of a phase under the given settings
pub fn phase_duration_ms(color: LightColor, settings: &DifficultySettings) -> u64 {
    match color {
        LightColor::Red => settings.red_light_ms,
        LightColor::Green => settings.green_light_ms,
        LightColor::Yellow => settings.yellow_light_ms,
    }
}

impl TrafficLightMachine {
    /// Start in `color` at `now_ms`
    pub fn new(color: LightColor, settings: &DifficultySettings, now_ms: u64) -> Self {
        let mut machine = Self {
            state: TrafficLightState {
                color,
                countdown_sec: 0,
            },
            phase_duration_ms: 0,
            phase_started_ms: now_ms,
            transitions: 0,
        };
        machine.enter(color, settings, now_ms);
        machine
    }

    fn enter(&mut self, color: LightColor, settings: &DifficultySettings, now_ms: u64) {
        let duration = phase_duration_ms(color, settings);
        self.state.color = color;
        self.state.countdown_sec = match color {
            LightColor::Red => (duration / 1000) as u32,
            _ => 0,
        };
        self.phase_duration_ms = duration;
        self.phase_started_ms = now_ms;
    }

    pub fn state(&self) -> TrafficLightState {
        self.state
    }

    pub fn color(&self) -> LightColor {
        self.state.color
    }

    pub fn is_red(&self) -> bool {
        self.state.color == LightColor::Red
    }

    pub fn countdown_sec(&self) -> u32 {
        self.state.countdown_sec
    }

    /// Duration the current phase was armed with
    pub fn phase_duration_ms(&self) -> u64 {
        self.phase_duration_ms
    }

    pub fn phase_started_ms(&self) -> u64 {
        self.phase_started_ms
    }

    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    /// Move to the next color, reading its duration from `settings`
    ///
    /// Returns the new color and how long it lasts.
    pub fn advance_phase(&mut self, settings: &DifficultySettings, now_ms: u64) -> (LightColor, u64) {
        let next = self.state.color.next();
        self.enter(next, settings, now_ms);
        self.transitions += 1;
        debug!(
            "Light -> {} for {}ms",
            next.as_str(),
            self.phase_duration_ms
        );
        (next, self.phase_duration_ms)
    }

    /// One countdown second elapsed; returns whether more ticks are needed
    pub fn tick_countdown(&mut self) -> bool {
        if !self.is_red() {
            return false;
        }
        self.state.countdown_sec = self.state.countdown_sec.saturating_sub(1);
        self.state.countdown_sec > 0
    }
}
