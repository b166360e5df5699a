use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::grid::{Block, Grid, PieceId, Position};

// ============================================================================
// Shapes
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Shape {
    T,
    O,
    J,
    L,
    I,
    S,
    Z,
}

impl Shape {
    pub const ALL: [Shape; 7] = [
        Shape::T,
        Shape::O,
        Shape::J,
        Shape::L,
        Shape::I,
        Shape::S,
        Shape::Z,
    ];

    /// Block offsets relative to the spawn point. The first entry is the
    /// reference block and always sits at `(0, 0)`; it is also the pivot.
    pub fn offsets(self) -> [(i32, i32); 4] {
        match self {
            Shape::T => [(0, 0), (-1, 0), (1, 0), (0, -1)],
            Shape::O => [(0, 0), (0, -1), (1, 0), (1, -1)],
            Shape::J => [(0, 0), (-1, 0), (0, -1), (0, -2)],
            Shape::L => [(0, 0), (1, 0), (0, -1), (0, -2)],
            Shape::I => [(0, 0), (0, 1), (0, -1), (0, -2)],
            Shape::S => [(0, 0), (-1, 0), (0, -1), (1, -1)],
            Shape::Z => [(0, 0), (1, 0), (0, -1), (-1, -1)],
        }
    }

    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Left,
    Right,
    Down,
}

impl Direction {
    fn delta(self) -> (i32, i32) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
        }
    }
}

// ============================================================================
// Piece Provider Trait
// ============================================================================

pub trait PieceProvider {
    fn next_piece(&mut self) -> Shape;
}

/// Uniform pick over the seven shapes.
pub struct RandomPieceProvider {
    rng: StdRng,
}

impl RandomPieceProvider {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPieceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceProvider for RandomPieceProvider {
    fn next_piece(&mut self) -> Shape {
        Shape::random(&mut self.rng)
    }
}

pub struct SequencePieceProvider {
    pieces: Vec<Shape>,
    index: usize,
}

impl SequencePieceProvider {
    pub fn new(pieces: Vec<Shape>) -> Self {
        assert!(!pieces.is_empty(), "piece sequence must not be empty");
        Self { pieces, index: 0 }
    }
}

impl PieceProvider for SequencePieceProvider {
    fn next_piece(&mut self) -> Shape {
        let piece = self.pieces[self.index % self.pieces.len()];
        self.index += 1;
        piece
    }
}

// ============================================================================
// Tetromino
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tetromino {
    pub shape: Shape,
    pub id: PieceId,
    pub landed: bool,
    pub is_current: bool,
    blocks: [Block; 4],
}

impl Tetromino {
    /// Builds the shape with its reference block at `origin`.
    pub fn new(shape: Shape, id: PieceId, origin: Position) -> Self {
        let blocks = shape
            .offsets()
            .map(|(dx, dy)| Block::new(origin.offset(dx, dy), shape, id));
        Self {
            shape,
            id,
            landed: false,
            is_current: false,
            blocks,
        }
    }

    pub fn blocks(&self) -> &[Block; 4] {
        &self.blocks
    }

    pub fn positions(&self) -> [Position; 4] {
        self.blocks.map(|block| block.position)
    }

    /// Position of the reference (first) block.
    pub fn reference(&self) -> Position {
        self.blocks[0].position
    }

    /// True if any of `positions` is illegal on `grid`. Every position is
    /// checked; nothing is mutated.
    pub fn collides(grid: &Grid, positions: &[Position; 4]) -> bool {
        positions
            .iter()
            .fold(false, |hit, pos| hit | !grid.is_legal(pos.x, pos.y))
    }

    /// Shifts the piece one cell. A blocked `Down` marks the piece landed,
    /// a blocked `Left`/`Right` is dropped. Returns whether the piece moved.
    pub fn try_move(&mut self, direction: Direction, grid: &Grid) -> bool {
        if self.landed {
            return false;
        }
        let (dx, dy) = direction.delta();
        let candidate = self.positions().map(|pos| pos.offset(dx, dy));
        if Self::collides(grid, &candidate) {
            if direction == Direction::Down {
                self.landed = true;
            }
            return false;
        }
        self.commit(candidate);
        true
    }

    /// Turns the piece a quarter clockwise around its reference block.
    pub fn rotate(&mut self, grid: &Grid) -> bool {
        if self.landed || self.shape == Shape::O {
            return false;
        }
        let pivot = self.reference();
        let candidate = self.positions().map(|pos| {
            let (dx, dy) = (pos.x - pivot.x, pos.y - pivot.y);
            // Rows grow downward, so (dx, dy) -> (-dy, dx) is clockwise on screen.
            pivot.offset(-dy, dx)
        });
        if Self::collides(grid, &candidate) {
            return false;
        }
        self.commit(candidate);
        true
    }

    /// One gravity step.
    pub fn update(&mut self, grid: &Grid) -> bool {
        self.try_move(Direction::Down, grid)
    }

    fn commit(&mut self, positions: [Position; 4]) {
        for (block, pos) in self.blocks.iter_mut().zip(positions) {
            block.position = pos;
        }
    }
}
