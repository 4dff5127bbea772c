use serde::{Deserialize, Serialize};

/// A cell on the grid: `x` is the column, `y` is the row (row 0 = top line of the maze)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub fn new(x: i32, y: i32) -> Self {
        Cell { x, y }
    }

    /// Manhattan distance, the A* heuristic on a 4-connected grid
    pub fn manhattan(&self, other: &Cell) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// The adjacent cell one step in `dir`
    pub fn neighbor(&self, dir: Direction) -> Cell {
        let (dx, dy) = dir.delta();
        Cell::new(self.x + dx, self.y + dy)
    }
}

/// Cardinal movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Neighbor exploration order used by every search
    pub const ALL: [Direction; 4] = [Direction::Right, Direction::Left, Direction::Down, Direction::Up];

    /// Grid-space delta (`Up` decreases the row index)
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Grid structure for storing cell states
/// Cell values: 0=free/walkable, 1=blocked/wall
///
/// `cells.len()` is always `rows * cols`; build grids through the constructors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid {
    pub rows: i32,
    pub cols: i32,
    pub cells: Vec<i32>,
    /// Revision number - incremented whenever grid cells change
    pub revision: u64,
}

impl Grid {
    /// Create a new grid with all cells set to free (0).
    /// Dimensions whose cell count overflows an `i32` id give an empty grid.
    pub fn new(rows: i32, cols: i32) -> Self {
        let (rows, cols) = match rows.max(0).checked_mul(cols.max(0)) {
            Some(_) => (rows.max(0), cols.max(0)),
            None => (0, 0),
        };
        Grid {
            rows,
            cols,
            cells: vec![0; (rows * cols) as usize],
            revision: 0,
        }
    }

    /// Create a grid with specific blocked cells
    pub fn with_blocked(rows: i32, cols: i32, blocked: &[Cell]) -> Self {
        let mut grid = Self::new(rows, cols);
        for cell in blocked {
            if grid.in_bounds(*cell) {
                let id = grid.get_id(cell.x, cell.y);
                grid.cells[id as usize] = 1;
            }
        }
        grid
    }

    /// Build a grid from rows of 0/1 values, the layout most callers keep their walls in.
    /// Short rows are padded with walls.
    pub fn from_walls(walls: &[Vec<i32>]) -> Self {
        let rows = walls.len() as i32;
        let cols = walls.iter().map(|r| r.len()).max().unwrap_or(0) as i32;
        let mut grid = Self::new(rows, cols);
        for y in 0..grid.rows {
            let row = &walls[y as usize];
            for x in 0..grid.cols {
                let value = row.get(x as usize).copied().unwrap_or(1);
                let id = grid.get_id(x, y);
                grid.cells[id as usize] = if value == 0 { 0 } else { 1 };
            }
        }
        grid
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.x < self.cols && cell.y >= 0 && cell.y < self.rows
    }

    /// Check if a cell at (x, y) is blocked
    pub fn is_blocked(&self, x: i32, y: i32) -> bool {
        if x < 0 || x >= self.cols || y < 0 || y >= self.rows {
            return true; // Out of bounds is considered blocked
        }
        self.cells[self.get_id(x, y) as usize] == 1
    }

    /// In bounds and not a wall
    pub fn is_walkable(&self, cell: Cell) -> bool {
        !self.is_blocked(cell.x, cell.y)
    }

    /// Walkable 4-neighbors of `cell`, in `Direction::ALL` order
    pub fn walkable_neighbors(&self, cell: Cell) -> impl Iterator<Item = Cell> + '_ {
        Direction::ALL
            .into_iter()
            .map(move |dir| cell.neighbor(dir))
            .filter(move |next| self.is_walkable(*next))
    }

    /// Convert (x, y) coordinates to cell ID
    pub fn get_id(&self, x: i32, y: i32) -> i32 {
        x + y * self.cols
    }

    /// Convert cell ID to (x, y) coordinates
    pub fn get_coords(&self, id: i32) -> (i32, i32) {
        (id % self.cols, id / self.cols)
    }

    /// Set cell value at (x, y)
    pub fn set_cell(&mut self, x: i32, y: i32, value: i32) {
        if x >= 0 && x < self.cols && y >= 0 && y < self.rows {
            let id = self.get_id(x, y);
            let old_value = self.cells[id as usize];
            if old_value != value {
                self.cells[id as usize] = value;
                self.revision += 1;
            }
        }
    }

    /// Get current grid revision number
    pub fn get_revision(&self) -> u64 {
        self.revision
    }

    /// All walkable cells in row-major order
    pub fn walkable_cells(&self) -> Vec<Cell> {
        let mut cells = Vec::new();
        for y in 0..self.rows {
            for x in 0..self.cols {
                if self.cells[self.get_id(x, y) as usize] == 0 {
                    cells.push(Cell::new(x, y));
                }
            }
        }
        cells
    }

    /// Render as `#`/` ` lines, handy in test output
    pub fn to_ascii(&self) -> String {
        let mut out = String::new();
        for y in 0..self.rows {
            for x in 0..self.cols {
                out.push(if self.is_blocked(x, y) { '#' } else { ' ' });
            }
            out.push('\n');
        }
        out
    }
}
