//! Player movement and road-entry rules

use serde::Serialize;

use super::crosswalk::CrosswalkManager;
use super::types::{
    LightColor, Position, Rect, Viewport, PLAYER_HITBOX_INSET, PLAYER_SIZE, PLAYER_START_X,
    PLAYER_STEP,
};

/// Interval at which queued commands are applied
pub const INPUT_POLL_INTERVAL_MS: u64 = 16;

/// Discrete input command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Up,
    Down,
    Left,
    Right,
    Pause,
}

/// Why an attempt to step into the road was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Violation {
    /// The light was not red
    WrongLight,
    /// The player was outside the crosswalk window
    OffCrosswalk,
}

impl Violation {
    pub fn warning(self) -> &'static str {
        match self {
            Violation::WrongLight => "Wait for the red light!",
            Violation::OffCrosswalk => "Use the crosswalk!",
        }
    }
}

/// Result of applying one command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// Clamped at the viewport edge or returning; nothing changed
    Ignored,
    Rejected(Violation),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub position: Position,
    /// Set while the player is being sent back to the start row
    pub is_returning: bool,
}

#[derive(Debug, Clone)]
pub struct PlayerController {
    player: Player,
    viewport: Viewport,
}

impl PlayerController {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            player: Player {
                position: Position::new(PLAYER_START_X, viewport.start_row()),
                is_returning: false,
            },
            viewport,
        }
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn position(&self) -> Position {
        self.player.position
    }

    pub fn is_returning(&self) -> bool {
        self.player.is_returning
    }

    pub fn hitbox(&self) -> Rect {
        Rect::inset(self.player.position, PLAYER_SIZE, PLAYER_SIZE, PLAYER_HITBOX_INSET)
    }

    /// Whether the player's row lies within the road band
    pub fn is_in_road(&self, lanes: u32) -> bool {
        let y = self.player.position.y;
        y >= self.viewport.road_top(lanes) && y <= self.viewport.road_bottom(lanes)
    }

    /// Place the player, clamped to the viewport
    pub fn place(&mut self, position: Position) {
        self.player.position = Position::new(
            position.x.clamp(0.0, self.viewport.width - PLAYER_SIZE),
            position.y.clamp(0.0, self.viewport.height - PLAYER_SIZE),
        );
    }

    /// Apply a movement command
    ///
    /// Stepping up while on the road is only allowed on red and inside the
    /// crosswalk window. `Pause` is handled by the session and ignored here.
    pub fn apply(
        &mut self,
        command: Command,
        light: LightColor,
        crosswalk: &CrosswalkManager,
        lanes: u32,
    ) -> MoveOutcome {
        if self.player.is_returning {
            return MoveOutcome::Ignored;
        }
        let before = self.player.position;
        let mut next = before;

        match command {
            Command::Up => {
                if self.is_in_road(lanes) {
                    if light != LightColor::Red {
                        return MoveOutcome::Rejected(Violation::WrongLight);
                    }
                    if !crosswalk.contains_player(before.x) {
                        return MoveOutcome::Rejected(Violation::OffCrosswalk);
                    }
                }
                next.y = (before.y - PLAYER_STEP).max(0.0);
            }
            Command::Down => {
                next.y = (before.y + PLAYER_STEP).min(self.viewport.height - PLAYER_SIZE);
            }
            Command::Left => {
                next.x = (before.x - PLAYER_STEP).max(0.0);
            }
            Command::Right => {
                next.x = (before.x + PLAYER_STEP).min(self.viewport.width - PLAYER_SIZE);
            }
            Command::Pause => return MoveOutcome::Ignored,
        }

        if next == before {
            return MoveOutcome::Ignored;
        }
        self.player.position = next;
        MoveOutcome::Moved
    }

    /// First half of the reset sequence: lock rule evaluation
    pub fn begin_return(&mut self) {
        self.player.is_returning = true;
    }

    /// Move back to the start row, optionally also to the start column
    pub fn return_to_start(&mut self, to_start_column: bool) {
        self.player.position.y = self.viewport.start_row();
        if to_start_column {
            self.player.position.x = PLAYER_START_X;
        }
    }

    /// Last step of the reset sequence
    pub fn finish_return(&mut self) {
        self.player.is_returning = false;
    }

    /// Full reset for a new game
    pub fn reset(&mut self) {
        *self = Self::new(self.viewport);
    }
}
