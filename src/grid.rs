use crate::tetromino::Shape;

// ============================================================================
// Types
// ============================================================================

/// Grid-space coordinate. `x` is the column, `y` the row, rows grow downward
/// and negative rows lie above the visible field.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Handle of the tetromino a block was spawned with.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct PieceId(pub u32);

/// One unit cell of a tetromino. Once landed it is owned by the [`Grid`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Block {
    pub position: Position,
    pub shape: Shape,
    pub piece: PieceId,
    alive: bool,
}

impl Block {
    pub fn new(position: Position, shape: Shape, piece: PieceId) -> Self {
        Self {
            position,
            shape,
            piece,
            alive: true,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    fn kill(&mut self) {
        self.alive = false;
    }
}

/// Outcome of one full-row scan.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LineClear {
    /// Rows that were full, by their index before the shift, bottom first.
    pub rows: Vec<i32>,
    /// Blocks taken out of the grid, all marked dead.
    pub removed: Vec<Block>,
}

impl LineClear {
    pub fn count(&self) -> u32 {
        self.rows.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ============================================================================
// Grid
// ============================================================================

/// Fixed-size occupancy field of landed blocks, stored row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Option<Block>>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some()
    }

    /// Whether a block may sit at `(x, y)`.
    ///
    /// Walls and the floor are blocking, everything above row 0 is open so
    /// pieces can spawn partly outside the field.
    pub fn is_legal(&self, x: i32, y: i32) -> bool {
        if x < 0 || x as usize >= self.width || y >= self.height as i32 {
            return false;
        }
        match self.index(x, y) {
            Some(i) => self.cells[i].is_none(),
            None => true,
        }
    }

    pub fn is_occupied(&self, x: i32, y: i32) -> bool {
        !self.is_legal(x, y)
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&Block> {
        self.index(x, y).and_then(|i| self.cells[i].as_ref())
    }

    /// Records `block` at its own position.
    ///
    /// # Panics
    ///
    /// Panics if the block lies outside the grid; landing logic never
    /// commits such a block.
    pub fn place(&mut self, block: Block) {
        let pos = block.position;
        let i = self
            .index(pos.x, pos.y)
            .unwrap_or_else(|| panic!("block placed outside the grid at {:?}", pos));
        self.cells[i] = Some(block);
    }

    pub fn is_row_full(&self, y: usize) -> bool {
        self.row(y).iter().all(Option::is_some)
    }

    pub fn filled_count_in_row(&self, y: usize) -> usize {
        self.row(y).iter().filter(|cell| cell.is_some()).count()
    }

    pub fn total_filled_cells(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Landed blocks, top row first.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.cells.iter().flatten()
    }

    fn row(&self, y: usize) -> &[Option<Block>] {
        &self.cells[y * self.width..(y + 1) * self.width]
    }

    /// Removes every full row and drops the rows above into the gap.
    ///
    /// Rows are scanned bottom to top with a separate write cursor, so each
    /// full row is counted exactly once even when several are stacked.
    pub fn clear_full_rows(&mut self) -> LineClear {
        let mut cleared = LineClear::default();
        let mut write = self.height;

        for read in (0..self.height).rev() {
            if self.is_row_full(read) {
                for x in 0..self.width {
                    if let Some(mut block) = self.cells[read * self.width + x].take() {
                        block.kill();
                        cleared.removed.push(block);
                    }
                }
                cleared.rows.push(read as i32);
                continue;
            }

            write -= 1;
            if write != read {
                for x in 0..self.width {
                    let moved = self.cells[read * self.width + x].take().map(|mut block| {
                        block.position.y = write as i32;
                        block
                    });
                    self.cells[write * self.width + x] = moved;
                }
            }
        }

        for cell in &mut self.cells[..write * self.width] {
            *cell = None;
        }

        cleared
    }
}
