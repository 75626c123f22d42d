//! Read-only view of the session for renderers

use serde::Serialize;

use super::player::Player;
use super::types::{Direction, LightColor, Viewport, CROSSWALK_WIDTH, PLAYER_SIZE, VEHICLE_HEIGHT, VEHICLE_WIDTH};
use super::vehicle::SimVehicle;

/// Everything a renderer needs to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub time_ms: u64,
    pub player: Player,
    pub vehicles: Vec<SimVehicle>,
    pub light_color: LightColor,
    pub countdown: u32,
    pub score: u32,
    pub lives: f32,
    pub difficulty_level: u8,
    pub lane_count: u32,
    pub vehicle_speed_kmh: f32,
    pub crosswalk_center_x: f32,
    pub warning_message: Option<String>,
    pub paused: bool,
    pub game_over: bool,
    pub viewport: Viewport,
}

impl Snapshot {
    /// Print a summary of the frame
    pub fn print_summary(&self) {
        println!("=== Crosswalk Simulation Summary ===");
        println!("Time: {:.2}s", self.time_ms as f64 / 1000.0);
        println!(
            "Score: {}, Lives: {:.1}, Level: {}",
            self.score, self.lives, self.difficulty_level
        );
        println!(
            "Lanes: {}, Vehicle speed: {:.0} km/h",
            self.lane_count, self.vehicle_speed_kmh
        );
        match self.light_color {
            LightColor::Red => println!("Light: red ({}s)", self.countdown),
            other => println!("Light: {}", other.as_str()),
        }
        println!("Crosswalk at x={:.0}", self.crosswalk_center_x);
        println!(
            "Player at ({:.0}, {:.0}){}",
            self.player.position.x,
            self.player.position.y,
            if self.player.is_returning { " returning" } else { "" }
        );
        println!("Vehicles: {}", self.vehicles.len());
        if let Some(warning) = &self.warning_message {
            println!("Warning: {}", warning);
        }
        if self.paused {
            println!("PAUSED");
        }
        if self.game_over {
            println!("GAME OVER");
        }
    }

    /// Draw a coarse map of the road in the terminal
    pub fn draw_map(&self) {
        // One character covers a block of pixels
        let cell_w = 20.0;
        let cell_h = 20.0;
        let width = (self.viewport.width / cell_w).ceil() as usize;
        let height = (self.viewport.height / cell_h).ceil() as usize;
        if width == 0 || height == 0 {
            return;
        }

        let mut grid = vec![vec![' '; width]; height];

        let to_grid = |x: f32, y: f32| -> Option<(usize, usize)> {
            if x < 0.0 || y < 0.0 {
                return None;
            }
            let col = (x / cell_w) as usize;
            let row = (y / cell_h) as usize;
            (row < height && col < width).then_some((row, col))
        };

        // Road band
        let road_top = self.viewport.road_top(self.lane_count);
        let road_bottom = self.viewport.road_bottom(self.lane_count);
        for (row, line) in grid.iter_mut().enumerate() {
            let y = row as f32 * cell_h;
            if y >= road_top && y < road_bottom {
                line.iter_mut().for_each(|c| *c = '-');
            }
        }

        // Crosswalk stripes
        let half = CROSSWALK_WIDTH / 2.0;
        let mut x = self.crosswalk_center_x - half;
        while x < self.crosswalk_center_x + half {
            let mut y = road_top;
            while y < road_bottom {
                if let Some((row, col)) = to_grid(x, y) {
                    grid[row][col] = '=';
                }
                y += cell_h;
            }
            x += cell_w;
        }

        for vehicle in &self.vehicles {
            let glyph = match vehicle.direction {
                Direction::Right => '>',
                Direction::Left => '<',
            };
            let center_x = vehicle.position.x + VEHICLE_WIDTH / 2.0;
            let center_y = vehicle.position.y + VEHICLE_HEIGHT / 2.0;
            if let Some((row, col)) = to_grid(center_x, center_y) {
                grid[row][col] = glyph;
            }
        }

        let player = self.player.position;
        if let Some((row, col)) = to_grid(player.x + PLAYER_SIZE / 2.0, player.y + PLAYER_SIZE / 2.0) {
            grid[row][col] = 'P';
        }

        println!("\n=== Street Map ===");
        println!("Legend: P=Player, >/<=Vehicle, ==Crosswalk, -=Road");
        println!();
        for row in &grid {
            let line: String = row.iter().collect();
            println!("{}", line);
        }
        println!();
    }
}
