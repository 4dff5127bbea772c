use crate::config::CaveConfig;
use crate::grid::{Cell, Grid};
use crate::maze::Maze;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashSet, VecDeque};

/// Cellular automata parameters for cave generation
#[derive(Debug, Clone, PartialEq)]
pub struct CaveParams {
    pub width: i32,
    pub height: i32,
    /// Probability that a cell starts as wall
    pub chance_to_start_alive: f64,
    /// A wall with fewer wall neighbours than this becomes floor
    pub death_limit: u32,
    /// A floor cell with more wall neighbours than this becomes wall
    pub birth_limit: u32,
    pub steps: u32,
}

impl Default for CaveParams {
    fn default() -> Self {
        CaveParams::from(&CaveConfig::default())
    }
}

impl From<&CaveConfig> for CaveParams {
    fn from(config: &CaveConfig) -> Self {
        CaveParams {
            width: config.width,
            height: config.height,
            chance_to_start_alive: config.chance_to_start_alive,
            death_limit: config.death_limit,
            birth_limit: config.birth_limit,
            steps: config.steps,
        }
    }
}

/// Wall neighbours among the 8 surrounding cells; off-grid counts as wall
fn count_wall_neighbors(grid: &Grid, x: i32, y: i32) -> u32 {
    let mut count = 0;
    for dy in -1..=1 {
        for dx in -1..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            if grid.is_blocked(x + dx, y + dy) {
                count += 1;
            }
        }
    }
    count
}

/// One smoothing pass
pub fn simulation_step(grid: &Grid, params: &CaveParams) -> Grid {
    let mut next = Grid::new(grid.rows, grid.cols);
    for y in 0..grid.rows {
        for x in 0..grid.cols {
            let walls = count_wall_neighbors(grid, x, y);
            let wall = if grid.is_blocked(x, y) {
                walls >= params.death_limit
            } else {
                walls > params.birth_limit
            };
            if wall {
                let id = next.get_id(x, y);
                next.cells[id as usize] = 1;
            }
        }
    }
    next
}

/// Random fill followed by `params.steps` smoothing passes
pub fn generate_cave<R: Rng>(params: &CaveParams, rng: &mut R) -> Grid {
    let mut grid = Grid::new(params.height, params.width);
    let chance = if params.chance_to_start_alive.is_finite() {
        params.chance_to_start_alive.clamp(0.0, 1.0)
    } else {
        0.0
    };
    for cell in grid.cells.iter_mut() {
        if rng.gen_bool(chance) {
            *cell = 1;
        }
    }
    for _ in 0..params.steps {
        grid = simulation_step(&grid, params);
    }
    grid
}

/// The biggest 4-connected set of walkable cells
pub fn largest_open_region(grid: &Grid) -> HashSet<Cell> {
    let mut seen: HashSet<Cell> = HashSet::new();
    let mut best: HashSet<Cell> = HashSet::new();

    for origin in grid.walkable_cells() {
        if seen.contains(&origin) {
            continue;
        }
        let mut region = HashSet::new();
        let mut queue = VecDeque::new();
        seen.insert(origin);
        region.insert(origin);
        queue.push_back(origin);
        while let Some(cell) = queue.pop_front() {
            for next in grid.walkable_neighbors(cell) {
                if seen.insert(next) {
                    region.insert(next);
                    queue.push_back(next);
                }
            }
        }
        if region.len() > best.len() {
            best = region;
        }
    }
    best
}

/// `count` distinct cells drawn from `region` (fewer if the region is smaller)
pub fn place_items<R: Rng>(region: &HashSet<Cell>, count: usize, rng: &mut R) -> Vec<Cell> {
    // Sort first so the draw only depends on the RNG, not on hash order
    let mut cells: Vec<Cell> = region.iter().copied().collect();
    cells.sort();
    cells.shuffle(rng);
    cells.truncate(count);
    cells
}

/// A generated cave with a spawn and items that are guaranteed reachable
#[derive(Debug, Clone)]
pub struct Cave {
    pub grid: Grid,
    pub spawn: Cell,
    pub items: Vec<Cell>,
}

impl Cave {
    /// Treat the items as pellets of a maze with no enemies
    pub fn into_maze(self) -> Maze {
        Maze {
            grid: self.grid,
            pellets: self.items.into_iter().collect(),
            power_pellets: HashSet::new(),
            agent_spawn: self.spawn,
            enemy_spawns: Vec::new(),
        }
    }
}

/// Generate a cave, then place the spawn and items inside its largest open region.
/// Returns `None` if the automaton closed every cell.
pub fn generate_level<R: Rng>(params: &CaveParams, item_count: usize, rng: &mut R) -> Option<Cave> {
    let grid = generate_cave(params, rng);
    let region = largest_open_region(&grid);
    let mut picks = place_items(&region, item_count + 1, rng);
    if picks.is_empty() {
        return None;
    }
    let spawn = picks.remove(0);
    Some(Cave { grid, spawn, items: picks })
}
