//! Core types for the crosswalk simulation
//!
//! These are standalone types that don't depend on any renderer.

use serde::Serialize;

/// A unique identifier for simulation entities
/// This is a simple wrapper around a u64 for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SimId(pub u64);

/// A wrapper type for vehicle IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VehicleId(pub SimId);

/// Direction a vehicle travels along its lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Enters at the left edge, moves towards +x
    Right,
    /// Enters at the right edge, moves towards -x
    Left,
}

impl Direction {
    /// Sign of the x velocity for this direction
    pub fn sign(self) -> f32 {
        match self {
            Direction::Right => 1.0,
            Direction::Left => -1.0,
        }
    }
}

/// Color of the pedestrian-facing traffic light.
///
/// Red stops the vehicles, so red is the only color the player may cross on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LightColor {
    Red,
    Green,
    Yellow,
}

impl LightColor {
    /// The color that follows this one in the cycle
    pub fn next(self) -> LightColor {
        match self {
            LightColor::Red => LightColor::Green,
            LightColor::Green => LightColor::Yellow,
            LightColor::Yellow => LightColor::Red,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LightColor::Red => "red",
            LightColor::Green => "green",
            LightColor::Yellow => "yellow",
        }
    }
}

/// A 2D position in screen pixels (y grows downwards)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle used for hitboxes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Rect {
    /// Build the rectangle `inset` inside a sprite of the given size at `origin`
    pub fn inset(origin: Position, width: f32, height: f32, inset: f32) -> Self {
        Self {
            left: origin.x + inset,
            right: origin.x + width - inset,
            top: origin.y + inset,
            bottom: origin.y + height - inset,
        }
    }

    /// Touching edges count as overlap
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(self.right < other.left
            || self.left > other.right
            || self.bottom < other.top
            || self.top > other.bottom)
    }
}

/// Size of the visible play area
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

impl Viewport {
    /// Top edge of the road band for the given lane count
    pub fn road_top(&self, lanes: u32) -> f32 {
        self.height / 2.0 - lanes as f32 * ROAD_HALF_HEIGHT_PER_LANE
    }

    /// Bottom edge of the road band for the given lane count
    pub fn road_bottom(&self, lanes: u32) -> f32 {
        self.height / 2.0 + lanes as f32 * ROAD_HALF_HEIGHT_PER_LANE
    }

    /// Vertical position of a lane, lanes are centered on the middle of the screen
    pub fn lane_y(&self, lane: u32, lanes: u32) -> f32 {
        self.height / 2.0 + (lane as f32 - (lanes as f32 - 1.0) / 2.0) * LANE_SPACING
    }

    /// Row the player starts from and is returned to
    pub fn start_row(&self) -> f32 {
        self.height - PLAYER_START_ROW_OFFSET
    }
}

/// Player sprite is a square of this size
pub const PLAYER_SIZE: f32 = 60.0;
/// Hitbox inset inside the player sprite
pub const PLAYER_HITBOX_INSET: f32 = 10.0;
/// Distance covered by one movement command
pub const PLAYER_STEP: f32 = 20.0;
/// Horizontal start position of the player
pub const PLAYER_START_X: f32 = 100.0;
/// Start row is this far above the bottom of the viewport
pub const PLAYER_START_ROW_OFFSET: f32 = 150.0;

/// Vehicle sprite size
pub const VEHICLE_WIDTH: f32 = 100.0;
pub const VEHICLE_HEIGHT: f32 = 40.0;
/// Hitbox inset inside the vehicle sprite
pub const VEHICLE_HITBOX_INSET: f32 = 10.0;
/// Vehicles spawn this far outside the visible edge
pub const VEHICLE_SPAWN_OFFSET: f32 = 100.0;
/// Vehicles are removed once this far outside the visible bounds
pub const VEHICLE_DESPAWN_MARGIN: f32 = 200.0;
/// On red, the leading edge holds this far from the crosswalk center.
/// A held hitbox stays clear of any player the crosswalk window admits.
pub const VEHICLE_STOP_DISTANCE: f32 = CROSSWALK_WIDTH / 2.0 + PLAYER_SIZE / 2.0;

/// Vertical distance between lane centers
pub const LANE_SPACING: f32 = 40.0;
/// Half height of the road band contributed by each lane
pub const ROAD_HALF_HEIGHT_PER_LANE: f32 = 20.0;

/// Width of the crosswalk window around its center
pub const CROSSWALK_WIDTH: f32 = 200.0;
/// Crosswalk center is kept within this fraction band of the viewport width
pub const CROSSWALK_MIN_FRACTION: f32 = 0.2;
pub const CROSSWALK_MAX_FRACTION: f32 = 0.8;

/// A crossing is complete once the player is above this row
pub const CROSSING_THRESHOLD_Y: f32 = 100.0;
