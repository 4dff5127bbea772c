use crate::grid::{Cell, Direction, Grid};
use crate::threat::{ThreatMap, ThreatTimeline};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

// Trace logging flag - toggled from [logging] trace_pathfinding
static TRACE_PATHFINDING: AtomicBool = AtomicBool::new(false);

/// Enable or disable search trace output
pub fn set_trace(enabled: bool) {
    TRACE_PATHFINDING.store(enabled, AtomicOrdering::Relaxed);
}

fn tracing() -> bool {
    TRACE_PATHFINDING.load(AtomicOrdering::Relaxed)
}

/// A node in the A* open set
#[derive(Debug, Clone, Copy)]
struct PathNode {
    cell: Cell,
    /// Time layer, always 0 outside time-expanded search
    step: usize,
    cost: f64,
    estimate: f64,
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PathNode {}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other.estimate.total_cmp(&self.estimate)
            // Prefer deeper nodes on equal f, they are closer to the goal
            .then_with(|| self.cost.total_cmp(&other.cost))
            // Tie-breaker: use position for deterministic ordering
            .then_with(|| other.cell.cmp(&self.cell))
            .then_with(|| other.step.cmp(&self.step))
    }
}

/// Walk the parent table back from `end` to the search root
fn reconstruct(grid: &Grid, parents: &[i32], end: Cell) -> Vec<Cell> {
    let mut path = vec![end];
    let mut id = parents[grid.get_id(end.x, end.y) as usize];
    while id >= 0 {
        let (x, y) = grid.get_coords(id);
        path.push(Cell::new(x, y));
        id = parents[id as usize];
    }
    path.reverse();
    path
}

/// Breadth-first search from `start`, stopping at the first cell accepted by `is_goal`.
/// Cells in `forbidden` are never entered and never accepted as a goal. The
/// start may be forbidden; the search still leaves from it.
fn bfs_until<F>(grid: &Grid, start: Cell, forbidden: &HashSet<Cell>, is_goal: F) -> Vec<Cell>
where
    F: Fn(Cell) -> bool,
{
    if !grid.is_walkable(start) {
        if tracing() {
            println!("[bfs] start ({},{}) is not walkable", start.x, start.y);
        }
        return Vec::new();
    }
    if is_goal(start) && !forbidden.contains(&start) {
        return vec![start];
    }

    let size = (grid.rows * grid.cols) as usize;
    // -2 = unvisited, -1 = root
    let mut parents = vec![-2i32; size];
    parents[grid.get_id(start.x, start.y) as usize] = -1;
    let mut queue = VecDeque::new();
    queue.push_back(start);
    let mut expanded = 0usize;

    while let Some(cell) = queue.pop_front() {
        expanded += 1;
        let cell_id = grid.get_id(cell.x, cell.y);
        for next in grid.walkable_neighbors(cell) {
            let next_id = grid.get_id(next.x, next.y) as usize;
            if parents[next_id] != -2 || forbidden.contains(&next) {
                continue;
            }
            parents[next_id] = cell_id;
            if is_goal(next) {
                if tracing() {
                    println!("[bfs] reached ({},{}) after expanding {} cells", next.x, next.y, expanded);
                }
                return reconstruct(grid, &parents, next);
            }
            queue.push_back(next);
        }
    }

    if tracing() {
        println!("[bfs] no goal reachable from ({},{}), {} cells expanded", start.x, start.y, expanded);
    }
    Vec::new()
}

/// Fewest-steps path from `start` to `goal`, both inclusive.
///
/// Returns an empty path when either end is out of bounds or a wall, or when
/// the goal is walled off. Among equally short paths the one found first in
/// `Direction::ALL` order wins; callers should not rely on which.
pub fn shortest_path(grid: &Grid, start: Cell, goal: Cell) -> Vec<Cell> {
    if tracing() {
        println!("\n[shortest_path] ({},{}) -> ({},{})", start.x, start.y, goal.x, goal.y);
    }
    if !grid.is_walkable(goal) {
        return Vec::new();
    }
    bfs_until(grid, start, &HashSet::new(), |cell| cell == goal)
}

/// Path to whichever goal is fewest steps away, found with a single search.
/// Cells in `forbidden` are not entered, so a forbidden goal is never returned.
pub fn nearest_target_path(
    grid: &Grid,
    start: Cell,
    goals: &HashSet<Cell>,
    forbidden: &HashSet<Cell>,
) -> Vec<Cell> {
    if goals.is_empty() {
        return Vec::new();
    }
    bfs_until(grid, start, forbidden, |cell| goals.contains(&cell))
}

/// The goal reached first by a breadth-first search from `start`, or `None`
pub fn nearest_target(grid: &Grid, start: Cell, goals: &HashSet<Cell>) -> Option<Cell> {
    nearest_target_path(grid, start, goals, &HashSet::new()).last().copied()
}

/// A* with a Manhattan heuristic where entering a cell costs `1 + threat(cell)`.
///
/// Cells in `forbidden` are impassable, including the goal. The start is
/// exempt because the agent is already standing on it. With an empty threat
/// map and no forbidden cells the result has the same length as
/// [`shortest_path`].
pub fn weighted_path(
    grid: &Grid,
    start: Cell,
    goal: Cell,
    threat: &ThreatMap,
    forbidden: &HashSet<Cell>,
) -> Vec<Cell> {
    if tracing() {
        println!(
            "\n[weighted_path] ({},{}) -> ({},{}), {} threat cells, {} forbidden",
            start.x, start.y, goal.x, goal.y, threat.len(), forbidden.len()
        );
    }
    if !grid.is_walkable(start) || !grid.is_walkable(goal) {
        return Vec::new();
    }
    if start == goal {
        return vec![start];
    }
    if forbidden.contains(&goal) {
        if tracing() {
            println!("[weighted_path] goal is forbidden");
        }
        return Vec::new();
    }

    let size = (grid.rows * grid.cols) as usize;
    let mut best_cost = vec![f64::INFINITY; size];
    let mut parents = vec![-1i32; size];
    let mut closed = vec![false; size];
    let mut open: BinaryHeap<PathNode> = BinaryHeap::new();

    best_cost[grid.get_id(start.x, start.y) as usize] = 0.0;
    open.push(PathNode {
        cell: start,
        step: 0,
        cost: 0.0,
        estimate: start.manhattan(&goal) as f64,
    });

    let mut iterations = 0usize;
    while let Some(node) = open.pop() {
        iterations += 1;
        let id = grid.get_id(node.cell.x, node.cell.y);

        // Skip stale entries
        if closed[id as usize] {
            continue;
        }
        closed[id as usize] = true;

        if node.cell == goal {
            let path = reconstruct(grid, &parents, goal);
            if tracing() {
                println!(
                    "[weighted_path] FOUND: {} cells, cost={:.2}, {} iterations",
                    path.len(),
                    node.cost,
                    iterations
                );
            }
            return path;
        }

        for next in grid.walkable_neighbors(node.cell) {
            if forbidden.contains(&next) {
                continue;
            }
            let next_id = grid.get_id(next.x, next.y) as usize;
            if closed[next_id] {
                continue;
            }
            let cost = node.cost + 1.0 + threat.get(&next);
            if cost < best_cost[next_id] {
                best_cost[next_id] = cost;
                parents[next_id] = id;
                open.push(PathNode {
                    cell: next,
                    step: 0,
                    cost,
                    estimate: cost + next.manhattan(&goal) as f64,
                });
            }
        }
    }

    if tracing() {
        println!("[weighted_path] NO PATH after {} iterations", iterations);
    }
    Vec::new()
}

/// A* over `(cell, step)` where entering `cell` at step `t` costs
/// `1 + timeline.get(t, cell)`.
///
/// Besides the four moves the agent may wait in place for one step, so it can
/// let a predicted enemy pass. Waiting is only possible up to the timeline
/// horizon; past it the last threat map holds and the search continues as a
/// plain weighted search. A wait shows up as a repeated cell in the returned
/// path. Forbidden handling matches [`weighted_path`], and a forbidden cell is
/// never waited on.
pub fn weighted_path_in_time(
    grid: &Grid,
    start: Cell,
    goal: Cell,
    timeline: &ThreatTimeline,
    forbidden: &HashSet<Cell>,
) -> Vec<Cell> {
    if tracing() {
        println!(
            "\n[weighted_path_in_time] ({},{}) -> ({},{}), horizon {}, {} forbidden",
            start.x, start.y, goal.x, goal.y, timeline.horizon(), forbidden.len()
        );
    }
    if !grid.is_walkable(start) || !grid.is_walkable(goal) {
        return Vec::new();
    }
    if start == goal {
        return vec![start];
    }
    if forbidden.contains(&goal) {
        return Vec::new();
    }

    let horizon = timeline.horizon();
    let layers = horizon + 1;
    let index = |cell: Cell, step: usize| grid.get_id(cell.x, cell.y) as usize * layers + step;

    let size = (grid.rows * grid.cols) as usize * layers;
    let mut best_cost = vec![f64::INFINITY; size];
    let mut parents: Vec<Option<(Cell, usize)>> = vec![None; size];
    let mut closed = vec![false; size];
    let mut open: BinaryHeap<PathNode> = BinaryHeap::new();

    best_cost[index(start, 0)] = 0.0;
    open.push(PathNode {
        cell: start,
        step: 0,
        cost: 0.0,
        estimate: start.manhattan(&goal) as f64,
    });

    let mut iterations = 0usize;
    while let Some(node) = open.pop() {
        iterations += 1;
        let id = index(node.cell, node.step);
        if closed[id] {
            continue;
        }
        closed[id] = true;

        if node.cell == goal {
            let mut path = vec![goal];
            let mut current = parents[id];
            while let Some((cell, step)) = current {
                path.push(cell);
                current = parents[index(cell, step)];
            }
            path.reverse();
            if tracing() {
                println!(
                    "[weighted_path_in_time] FOUND: {} cells, cost={:.2}, {} iterations",
                    path.len(),
                    node.cost,
                    iterations
                );
            }
            return path;
        }

        let next_step = (node.step + 1).min(horizon);
        let can_wait = node.step < horizon && !forbidden.contains(&node.cell);
        let waits = can_wait.then_some(node.cell);
        for next in grid.walkable_neighbors(node.cell).chain(waits) {
            if forbidden.contains(&next) {
                continue;
            }
            let next_id = index(next, next_step);
            if closed[next_id] {
                continue;
            }
            let cost = node.cost + 1.0 + timeline.get(next_step, &next);
            if cost < best_cost[next_id] {
                best_cost[next_id] = cost;
                parents[next_id] = Some((node.cell, node.step));
                open.push(PathNode {
                    cell: next,
                    step: next_step,
                    cost,
                    estimate: cost + next.manhattan(&goal) as f64,
                });
            }
        }
    }

    if tracing() {
        println!("[weighted_path_in_time] NO PATH after {} iterations", iterations);
    }
    Vec::new()
}

/// [`weighted_path`], retried without `forbidden` when the constraints leave no route.
/// The flag reports whether the danger-ignoring retry produced the result.
pub fn weighted_path_or_ignore_danger(
    grid: &Grid,
    start: Cell,
    goal: Cell,
    threat: &ThreatMap,
    forbidden: &HashSet<Cell>,
) -> (Vec<Cell>, bool) {
    let path = weighted_path(grid, start, goal, threat, forbidden);
    if !path.is_empty() || forbidden.is_empty() {
        return (path, false);
    }
    let retry = weighted_path(grid, start, goal, threat, &HashSet::new());
    let used_fallback = !retry.is_empty();
    (retry, used_fallback)
}

/// Result of [`multi_goal_greedy_plan`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GreedyPlan {
    /// Concatenated route through every visited goal, starting at the start cell
    pub path: Vec<Cell>,
    /// Goals in the order they were reached
    pub visit_order: Vec<Cell>,
    /// Goals no leg could reach, sorted
    pub unreachable: Vec<Cell>,
}

/// Visit goals by repeatedly walking to the nearest remaining one.
///
/// This is the nearest-neighbour heuristic, not an optimal tour: the total
/// length can exceed the best ordering. Duplicate goals are visited once.
pub fn multi_goal_greedy_plan(grid: &Grid, start: Cell, goals: &[Cell]) -> GreedyPlan {
    let mut remaining: HashSet<Cell> = goals.iter().copied().collect();
    let mut plan = GreedyPlan::default();
    let no_forbidden = HashSet::new();
    let mut current = start;

    while !remaining.is_empty() {
        let leg = nearest_target_path(grid, current, &remaining, &no_forbidden);
        let Some(&reached) = leg.last() else {
            break;
        };

        if plan.path.is_empty() {
            plan.path.extend(leg);
        } else {
            plan.path.extend(leg.into_iter().skip(1));
        }
        plan.visit_order.push(reached);
        remaining.remove(&reached);
        current = reached;
    }

    let mut unreachable: Vec<Cell> = remaining.into_iter().collect();
    unreachable.sort();
    plan.unreachable = unreachable;
    if plan.path.is_empty() && grid.is_walkable(start) {
        plan.path.push(start);
    }
    plan
}

/// `cell` if walkable, otherwise the walkable cell fewest steps away.
///
/// Out-of-bounds input is clamped onto the grid first; pixel-to-cell rounding
/// can leave an agent fractionally inside a wall.
pub fn snap_to_walkable(grid: &Grid, cell: Cell) -> Option<Cell> {
    if grid.is_empty() {
        return None;
    }
    let origin = Cell::new(cell.x.clamp(0, grid.cols - 1), cell.y.clamp(0, grid.rows - 1));
    if grid.is_walkable(origin) {
        return Some(origin);
    }

    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    seen.insert(origin);
    queue.push_back(origin);
    while let Some(current) = queue.pop_front() {
        for dir in Direction::ALL {
            let next = current.neighbor(dir);
            if !grid.in_bounds(next) || !seen.insert(next) {
                continue;
            }
            if grid.is_walkable(next) {
                return Some(next);
            }
            queue.push_back(next);
        }
    }
    None
}

/// Direction of a single cardinal step from `from` to `to`
pub fn direction_between(from: Cell, to: Cell) -> Option<Direction> {
    Direction::ALL.into_iter().find(|dir| from.neighbor(*dir) == to)
}

/// Total step cost of a path under `threat` (0 for paths with fewer than two cells)
pub fn path_cost(path: &[Cell], threat: &ThreatMap) -> f64 {
    path.iter().skip(1).map(|cell| 1.0 + threat.get(cell)).sum()
}

/// Total cost of a path from [`weighted_path_in_time`], the i-th cell entered at step i
pub fn timed_path_cost(path: &[Cell], timeline: &ThreatTimeline) -> f64 {
    path.iter()
        .enumerate()
        .skip(1)
        .map(|(t, cell)| 1.0 + timeline.get(t, cell))
        .sum()
}

/// True if every consecutive pair is one cardinal step apart and every cell is walkable
pub fn is_valid_path(grid: &Grid, path: &[Cell]) -> bool {
    path.iter().all(|c| grid.is_walkable(*c)) && path.windows(2).all(|w| w[0].manhattan(&w[1]) == 1)
}

/// Format path for display
pub fn format_path(path: &[Cell]) -> String {
    if path.is_empty() {
        return "No path".to_string();
    }

    let mut result = String::new();
    for (i, cell) in path.iter().enumerate() {
        if i > 0 {
            result.push_str(" -> ");
        }
        result.push_str(&format!("({},{})", cell.x, cell.y));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_grid_matches_manhattan() {
        let grid = Grid::new(6, 6);
        let path = shortest_path(&grid, Cell::new(0, 0), Cell::new(4, 3));
        assert_eq!(path.len(), 8);
        assert!(is_valid_path(&grid, &path));
    }

    #[test]
    fn test_blocked_start_returns_empty() {
        let grid = Grid::with_blocked(3, 3, &[Cell::new(0, 0)]);
        assert!(shortest_path(&grid, Cell::new(0, 0), Cell::new(2, 2)).is_empty());
        assert!(weighted_path(&grid, Cell::new(0, 0), Cell::new(2, 2), &ThreatMap::new(), &HashSet::new()).is_empty());
    }

    #[test]
    fn test_snap_to_walkable_inside_wall() {
        let grid = Grid::with_blocked(3, 3, &[Cell::new(0, 0), Cell::new(1, 0)]);
        assert_eq!(snap_to_walkable(&grid, Cell::new(0, 0)), Some(Cell::new(0, 1)));
        assert_eq!(snap_to_walkable(&grid, Cell::new(-5, 9)), Some(Cell::new(0, 2)));
    }

    #[test]
    fn test_snap_to_walkable_all_walls() {
        let grid = Grid::from_walls(&[vec![1, 1], vec![1, 1]]);
        assert_eq!(snap_to_walkable(&grid, Cell::new(0, 0)), None);
    }

    #[test]
    fn test_direction_between() {
        assert_eq!(direction_between(Cell::new(2, 2), Cell::new(2, 1)), Some(Direction::Up));
        assert_eq!(direction_between(Cell::new(2, 2), Cell::new(3, 2)), Some(Direction::Right));
        assert_eq!(direction_between(Cell::new(2, 2), Cell::new(3, 3)), None);
    }

    #[test]
    fn test_path_cost_counts_threat() {
        let mut threat = ThreatMap::new();
        threat.insert(Cell::new(1, 0), 2.0);
        let path = vec![Cell::new(0, 0), Cell::new(1, 0), Cell::new(2, 0)];
        assert_eq!(path_cost(&path, &threat), 4.0);
        assert_eq!(format_path(&path[..1]), "(0,0)");
    }
}
