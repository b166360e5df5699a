use std::time::Duration;

use crate::config::Settings;
use crate::grid::{Grid, LineClear, PieceId, Position};
use crate::tetromino::{Direction, PieceProvider, RandomPieceProvider, Shape, Tetromino};

// ============================================================================
// Configuration
// ============================================================================

// Scoring
pub const LANDING_BONUS: u32 = 10;
pub const LINE_CLEAR_BONUS: u32 = 100;

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CellState {
    Empty,
    Filled(Shape),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameState {
    Running,
    Paused,
    GameOver,
}

/// What the player asked for, already decoded from raw key events.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Intent {
    MoveLeft,
    MoveRight,
    Rotate,
    /// `true` while the drop key is held, `false` once it is released.
    SoftDrop(bool),
    TogglePause,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum GameEvent {
    PieceMoved,
    PieceRotated,
    PieceLanded,
    LinesCleared(u32),
    Paused,
    Unpaused,
    GameRestarted,
    GameOver,
}

// ============================================================================
// Fall Timer
// ============================================================================

/// Cadence of gravity ticks: the normal interval, or the fast one while the
/// drop key is held.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FallTimer {
    normal: Duration,
    fast: Duration,
    soft_drop: bool,
}

impl FallTimer {
    pub fn new(normal: Duration, fast: Duration) -> Self {
        Self {
            normal,
            fast,
            soft_drop: false,
        }
    }

    pub fn interval(&self) -> Duration {
        if self.soft_drop {
            self.fast
        } else {
            self.normal
        }
    }

    pub fn is_soft_drop(&self) -> bool {
        self.soft_drop
    }

    pub fn set_soft_drop(&mut self, held: bool) {
        self.soft_drop = held;
    }

    pub fn reset(&mut self) {
        self.soft_drop = false;
    }
}

// ============================================================================
// Game
// ============================================================================

pub struct Game {
    pub grid: Grid,
    pub current: Tetromino,
    pub next: Tetromino,
    pub score: u32,
    pub lines_cleared: u32,
    pub paused: bool,
    pub game_over: bool,
    pub timer: FallTimer,
    spawn: Position,
    next_id: u32,
    piece_provider: Box<dyn PieceProvider>,
    events: Vec<GameEvent>,
}

impl Game {
    pub fn new(settings: &Settings) -> Self {
        let provider: Box<dyn PieceProvider> = match settings.seed {
            Some(seed) => Box::new(RandomPieceProvider::seeded(seed)),
            None => Box::new(RandomPieceProvider::new()),
        };
        Self::with_provider(settings, provider)
    }

    pub fn with_provider(settings: &Settings, provider: Box<dyn PieceProvider>) -> Self {
        let timer = FallTimer::new(
            Duration::from_millis(settings.fall_interval_ms),
            Duration::from_millis(settings.fast_interval_ms),
        );
        let spawn = Position::new(settings.spawn_col, settings.spawn_row);
        let placeholder = Tetromino::new(Shape::O, PieceId(0), spawn);

        let mut game = Self {
            grid: Grid::new(settings.grid_width, settings.grid_height),
            current: placeholder.clone(),
            next: placeholder,
            score: 0,
            lines_cleared: 0,
            paused: false,
            game_over: false,
            timer,
            spawn,
            next_id: 0,
            piece_provider: provider,
            events: Vec::new(),
        };
        game.deal_fresh_pieces();
        game
    }

    /// A session over a prepared grid with a chosen falling piece. Used to set
    /// up positions directly. Later pieces come from `settings.seed`, or seed 0.
    pub fn with_grid(settings: &Settings, grid: Grid, mut current: Tetromino) -> Self {
        let provider = RandomPieceProvider::seeded(settings.seed.unwrap_or_default());
        let mut game = Self::with_provider(settings, Box::new(provider));
        game.grid = grid;
        current.is_current = true;
        game.current = current;
        game
    }

    fn spawn_piece(&mut self) -> Tetromino {
        let shape = self.piece_provider.next_piece();
        self.next_id += 1;
        Tetromino::new(shape, PieceId(self.next_id), self.spawn)
    }

    fn deal_fresh_pieces(&mut self) {
        let mut current = self.spawn_piece();
        current.is_current = true;
        self.current = current;
        self.next = self.spawn_piece();
    }

    pub fn state(&self) -> GameState {
        if self.game_over {
            GameState::GameOver
        } else if self.paused {
            GameState::Paused
        } else {
            GameState::Running
        }
    }

    pub fn spawn_position(&self) -> Position {
        self.spawn
    }

    pub fn fall_interval(&self) -> Duration {
        self.timer.interval()
    }

    /// One fall-timer tick: gravity, then landing, then full rows.
    pub fn tick(&mut self) {
        if self.game_over || self.paused {
            return;
        }
        self.current.update(&self.grid);
        self.check_tetromino_landed();
        self.check_full_lines();
    }

    /// Commits a landed piece and brings in the next one.
    ///
    /// Top-out is signalled by a piece that lands with its reference block
    /// still on the spawn row, or with any block above the field. Nothing is
    /// committed in that case.
    pub fn check_tetromino_landed(&mut self) {
        if !self.current.landed || self.game_over {
            return;
        }

        let sticks_out = self.current.blocks().iter().any(|b| b.position.y < 0);
        if self.current.reference().y == self.spawn.y || sticks_out {
            self.game_over = true;
            self.events.push(GameEvent::GameOver);
            return;
        }

        self.score += LANDING_BONUS;
        for block in self.current.blocks() {
            self.grid.place(*block);
        }
        self.events.push(GameEvent::PieceLanded);

        let fresh = self.spawn_piece();
        let mut promoted = std::mem::replace(&mut self.next, fresh);
        promoted.is_current = true;
        self.current = promoted;
        self.timer.reset();
    }

    pub fn check_full_lines(&mut self) -> LineClear {
        let cleared = self.grid.clear_full_rows();
        if !cleared.is_empty() {
            let rows = cleared.count();
            self.score += LINE_CLEAR_BONUS * rows;
            self.lines_cleared += rows;
            self.events.push(GameEvent::LinesCleared(rows));
        }
        cleared
    }

    pub fn handle_input(&mut self, intent: Intent) {
        match intent {
            Intent::TogglePause => self.toggle_pause(),
            Intent::SoftDrop(held) => {
                if !self.game_over {
                    self.timer.set_soft_drop(held);
                }
            }
            _ if self.paused || self.game_over => {}
            Intent::MoveLeft => self.move_piece(Direction::Left),
            Intent::MoveRight => self.move_piece(Direction::Right),
            Intent::Rotate => {
                if self.current.rotate(&self.grid) {
                    self.events.push(GameEvent::PieceRotated);
                }
            }
        }
    }

    fn move_piece(&mut self, direction: Direction) {
        if self.current.try_move(direction, &self.grid) {
            self.events.push(GameEvent::PieceMoved);
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.game_over {
            return;
        }
        self.paused = !self.paused;
        self.events.push(if self.paused {
            GameEvent::Paused
        } else {
            GameEvent::Unpaused
        });
    }

    pub fn restart(&mut self) {
        // Clear the grid
        self.grid = Grid::new(self.grid.width(), self.grid.height());

        // Reset score and flags
        self.score = 0;
        self.lines_cleared = 0;
        self.paused = false;
        self.game_over = false;
        self.timer.reset();
        self.events.clear();

        // Deal a new current/next pair
        self.deal_fresh_pieces();

        self.events.push(GameEvent::GameRestarted);
    }

    /// Landed cells with the falling piece drawn over them, indexed `[row][col]`.
    pub fn render_grid(&self) -> Vec<Vec<CellState>> {
        let mut visual = vec![vec![CellState::Empty; self.grid.width()]; self.grid.height()];

        for block in self.grid.blocks() {
            let pos = block.position;
            visual[pos.y as usize][pos.x as usize] = CellState::Filled(block.shape);
        }

        if !self.game_over {
            for block in self.current.blocks() {
                let pos = block.position;
                if self.grid.in_bounds(pos.x, pos.y) {
                    visual[pos.y as usize][pos.x as usize] = CellState::Filled(block.shape);
                }
            }
        }

        visual
    }

    /// Takes and clears all pending events
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

pub mod test_helpers {
    use super::*;
    use crate::grid::Block;

    pub fn empty_grid(settings: &Settings) -> Grid {
        Grid::new(settings.grid_width, settings.grid_height)
    }

    pub fn filler(x: i32, y: i32) -> Block {
        Block::new(Position::new(x, y), Shape::T, PieceId(u32::MAX))
    }

    pub fn fill_row(grid: &mut Grid, y: usize) {
        for x in 0..grid.width() {
            grid.place(filler(x as i32, y as i32));
        }
    }

    pub fn fill_row_with_gap(grid: &mut Grid, y: usize, gap_x: usize) {
        for x in 0..grid.width() {
            if x != gap_x {
                grid.place(filler(x as i32, y as i32));
            }
        }
    }

    pub fn piece_at(shape: Shape, x: i32, y: i32) -> Tetromino {
        Tetromino::new(shape, PieceId(1000), Position::new(x, y))
    }
}
