#![allow(dead_code)]

use pacpath::{Cell, Grid};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;

/// Parse a test layout
/// Format:
/// - #: blocked cell
/// - S: start
/// - D: destination
/// - anything else: free cell
pub fn parse_layout(lines: &[&str]) -> (Grid, Option<Cell>, Option<Cell>) {
    let rows = lines.len() as i32;
    let cols = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as i32;

    let mut blocked = Vec::new();
    let mut start = None;
    let mut dest = None;

    for (y, line) in lines.iter().enumerate() {
        for (x, ch) in line.chars().enumerate() {
            let cell = Cell::new(x as i32, y as i32);
            match ch {
                '#' => blocked.push(cell),
                'S' => start = Some(cell),
                'D' => dest = Some(cell),
                _ => {}
            }
        }
    }

    (Grid::with_blocked(rows, cols, &blocked), start, dest)
}

/// Distances from `start` by repeated relaxation until nothing changes.
/// Slow, and deliberately shares no code with the searches under test.
pub fn brute_force_distances(grid: &Grid, start: Cell) -> HashMap<Cell, u32> {
    let mut dist = HashMap::new();
    if !grid.is_walkable(start) {
        return dist;
    }
    dist.insert(start, 0u32);

    let cells = grid.walkable_cells();
    loop {
        let mut changed = false;
        for cell in &cells {
            let Some(&d) = dist.get(cell) else { continue };
            for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
                let next = Cell::new(cell.x + dx, cell.y + dy);
                if !grid.is_walkable(next) {
                    continue;
                }
                let better = dist.get(&next).map_or(true, |&old| d + 1 < old);
                if better {
                    dist.insert(next, d + 1);
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
    dist
}

/// Random grid with roughly `wall_chance` of its cells blocked
pub fn random_grid(seed: u64, rows: i32, cols: i32, wall_chance: f64) -> Grid {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut grid = Grid::new(rows, cols);
    for y in 0..rows {
        for x in 0..cols {
            if rng.gen_bool(wall_chance) {
                grid.set_cell(x, y, 1);
            }
        }
    }
    grid
}

/// Every cell walkable and consecutive cells one cardinal step apart
pub fn assert_valid_path(grid: &Grid, path: &[Cell], start: Cell, goal: Cell) {
    assert!(!path.is_empty(), "path should not be empty");
    assert_eq!(path[0], start, "path must begin at the start");
    assert_eq!(*path.last().unwrap(), goal, "path must end at the goal");
    for cell in path {
        assert!(grid.is_walkable(*cell), "path crosses wall at ({},{})", cell.x, cell.y);
    }
    for pair in path.windows(2) {
        assert_eq!(
            pair[0].manhattan(&pair[1]),
            1,
            "({},{}) -> ({},{}) is not a single step",
            pair[0].x,
            pair[0].y,
            pair[1].x,
            pair[1].y
        );
    }
}

/// Mirror a grid and cells left-right
pub fn flip_horizontal(grid: &Grid, cells: &[Cell]) -> (Grid, Vec<Cell>) {
    let mut blocked = Vec::new();
    for y in 0..grid.rows {
        for x in 0..grid.cols {
            if grid.is_blocked(x, y) {
                blocked.push(Cell::new(grid.cols - 1 - x, y));
            }
        }
    }
    let flipped = cells.iter().map(|c| Cell::new(grid.cols - 1 - c.x, c.y)).collect();
    (Grid::with_blocked(grid.rows, grid.cols, &blocked), flipped)
}

/// Mirror a grid and cells top-bottom
pub fn flip_vertical(grid: &Grid, cells: &[Cell]) -> (Grid, Vec<Cell>) {
    let mut blocked = Vec::new();
    for y in 0..grid.rows {
        for x in 0..grid.cols {
            if grid.is_blocked(x, y) {
                blocked.push(Cell::new(x, grid.rows - 1 - y));
            }
        }
    }
    let flipped = cells.iter().map(|c| Cell::new(c.x, grid.rows - 1 - c.y)).collect();
    (Grid::with_blocked(grid.rows, grid.cols, &blocked), flipped)
}

/// Original plus h/v/hv mirrored variants, each with its own transformed cells
pub fn all_variants(grid: &Grid, cells: &[Cell]) -> Vec<(&'static str, Grid, Vec<Cell>)> {
    let (h_grid, h_cells) = flip_horizontal(grid, cells);
    let (v_grid, v_cells) = flip_vertical(grid, cells);
    let (hv_grid, hv_cells) = flip_vertical(&h_grid, &h_cells);
    vec![
        ("original", grid.clone(), cells.to_vec()),
        ("h_flip", h_grid, h_cells),
        ("v_flip", v_grid, v_cells),
        ("hv_flip", hv_grid, hv_cells),
    ]
}

/// Draw a path on a grid
pub fn visualize_path(grid: &Grid, path: &[Cell]) -> String {
    let mut result = String::new();
    for y in 0..grid.rows {
        for x in 0..grid.cols {
            let cell = Cell::new(x, y);
            let symbol = if path.first() == Some(&cell) {
                'S'
            } else if path.last() == Some(&cell) {
                'D'
            } else if path.contains(&cell) {
                '*'
            } else if grid.is_blocked(x, y) {
                '#'
            } else {
                '.'
            };
            result.push(symbol);
        }
        result.push('\n');
    }
    result
}
