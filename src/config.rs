use anyhow::{ensure, Result};

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_GRID_WIDTH: usize = 10;
pub const DEFAULT_GRID_HEIGHT: usize = 20;

pub const DEFAULT_TILE_SIZE: i32 = 20;
pub const DEFAULT_GRID_ORIGIN_X: i32 = 25;
pub const DEFAULT_GRID_ORIGIN_Y: i32 = 50;

pub const DEFAULT_FRAMERATE: u32 = 60;

// Timing (in milliseconds)
pub const DEFAULT_FALL_INTERVAL_MS: u64 = 200;
pub const DEFAULT_FAST_INTERVAL_MS: u64 = 10;

const MIN_GRID_SIDE: usize = 4;
const MAX_GRID_SIDE: usize = 100;

// ============================================================================
// Settings
// ============================================================================

/// Per-session constants. Nothing here changes while a game is running.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub grid_width: usize,
    pub grid_height: usize,
    pub tile_size: i32,
    pub grid_origin_x: i32,
    pub grid_origin_y: i32,
    pub framerate: u32,
    pub fall_interval_ms: u64,
    pub fast_interval_ms: u64,
    /// Where the reference block of a freshly spawned piece goes.
    pub spawn_col: i32,
    pub spawn_row: i32,
    pub seed: Option<u64>,
    pub sound: bool,
}

impl Settings {
    /// Settings for a grid of the given size, spawn column recentered.
    pub fn with_grid(width: usize, height: usize) -> Self {
        Self {
            grid_width: width,
            grid_height: height,
            spawn_col: (width / 2) as i32,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.grid_width >= MIN_GRID_SIDE && self.grid_height >= MIN_GRID_SIDE,
            "grid must be at least {MIN_GRID_SIDE}x{MIN_GRID_SIDE}, got {}x{}",
            self.grid_width,
            self.grid_height
        );
        ensure!(
            self.grid_width <= MAX_GRID_SIDE && self.grid_height <= MAX_GRID_SIDE,
            "grid must be at most {MAX_GRID_SIDE}x{MAX_GRID_SIDE}, got {}x{}",
            self.grid_width,
            self.grid_height
        );
        ensure!(
            self.spawn_col >= 0 && (self.spawn_col as usize) < self.grid_width,
            "spawn column {} is outside a grid {} wide",
            self.spawn_col,
            self.grid_width
        );
        ensure!(
            (self.spawn_row as i64) < self.grid_height as i64,
            "spawn row {} is below the grid",
            self.spawn_row
        );
        ensure!(self.fall_interval_ms > 0, "fall interval must be non-zero");
        ensure!(
            self.fast_interval_ms < self.fall_interval_ms,
            "fast interval ({}ms) must be shorter than the fall interval ({}ms)",
            self.fast_interval_ms,
            self.fall_interval_ms
        );
        ensure!(self.tile_size > 0, "tile size must be positive");
        Ok(())
    }

    /// Top-left screen coordinate of the tile at grid cell `(col, row)`.
    pub fn to_screen(&self, col: i32, row: i32) -> (i32, i32) {
        (
            self.grid_origin_x + col * self.tile_size,
            self.grid_origin_y + row * self.tile_size,
        )
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            grid_width: DEFAULT_GRID_WIDTH,
            grid_height: DEFAULT_GRID_HEIGHT,
            tile_size: DEFAULT_TILE_SIZE,
            grid_origin_x: DEFAULT_GRID_ORIGIN_X,
            grid_origin_y: DEFAULT_GRID_ORIGIN_Y,
            framerate: DEFAULT_FRAMERATE,
            fall_interval_ms: DEFAULT_FALL_INTERVAL_MS,
            fast_interval_ms: DEFAULT_FAST_INTERVAL_MS,
            spawn_col: (DEFAULT_GRID_WIDTH / 2) as i32,
            spawn_row: 0,
            seed: None,
            sound: true,
        }
    }
}
