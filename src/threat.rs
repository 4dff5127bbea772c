use crate::grid::{Cell, Direction, Grid};
use std::collections::{HashMap, HashSet, VecDeque};

/// Per-cell extra step cost. Cells not present cost nothing extra.
///
/// Weights are kept non-negative and finite so A* with a Manhattan heuristic
/// stays admissible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThreatMap {
    weights: HashMap<Cell, f64>,
}

fn sanitize(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

impl ThreatMap {
    pub fn new() -> Self {
        ThreatMap { weights: HashMap::new() }
    }

    /// Threat cost of stepping into `cell`
    pub fn get(&self, cell: &Cell) -> f64 {
        self.weights.get(cell).copied().unwrap_or(0.0)
    }

    /// Overwrite the weight of a cell
    pub fn insert(&mut self, cell: Cell, weight: f64) {
        let weight = sanitize(weight);
        if weight == 0.0 {
            self.weights.remove(&cell);
        } else {
            self.weights.insert(cell, weight);
        }
    }

    /// Accumulate onto the existing weight
    pub fn add(&mut self, cell: Cell, weight: f64) {
        let total = self.get(&cell) + sanitize(weight);
        self.insert(cell, total);
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Cell, &f64)> {
        self.weights.iter()
    }

    /// Copy with every weight multiplied by `factor` (power mode uses a small factor)
    pub fn scaled(&self, factor: f64) -> ThreatMap {
        let mut out = ThreatMap::new();
        for (cell, weight) in &self.weights {
            out.insert(*cell, weight * factor);
        }
        out
    }

    /// The most dangerous cell, ties broken by smallest cell
    pub fn max_cell(&self) -> Option<(Cell, f64)> {
        self.weights
            .iter()
            .map(|(c, w)| (*c, *w))
            .max_by(|a, b| a.1.total_cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
    }

    /// Threat that fades with how many moves an enemy needs to get near a cell.
    ///
    /// Each enemy is expanded by BFS for up to `horizon` moves. For every cell
    /// it can reach after `k` moves, each walkable cell within Manhattan
    /// `safety_radius` (distance `d`) gains `1 / ((1 + k) * (1 + d))`.
    pub fn from_enemies(grid: &Grid, enemies: &[Cell], horizon: u32, safety_radius: u32) -> ThreatMap {
        let mut map = ThreatMap::new();
        let radius = safety_radius as i32;

        for enemy in enemies {
            for (reached, k) in bfs_within(grid, *enemy, horizon) {
                let time_falloff = 1.0 + k as f64;
                for dy in -radius..=radius {
                    for dx in -radius..=radius {
                        let d = dx.abs() + dy.abs();
                        if d > radius {
                            continue;
                        }
                        let cell = Cell::new(reached.x + dx, reached.y + dy);
                        if !grid.is_walkable(cell) {
                            continue;
                        }
                        map.add(cell, 1.0 / (time_falloff * (1.0 + d as f64)));
                    }
                }
            }
        }

        map
    }
}

/// Cells reachable from `origin` within `max_steps` moves, with their BFS distance
fn bfs_within(grid: &Grid, origin: Cell, max_steps: u32) -> Vec<(Cell, u32)> {
    if !grid.is_walkable(origin) {
        return Vec::new();
    }
    let mut seen: HashSet<Cell> = HashSet::new();
    let mut queue = VecDeque::new();
    let mut out = Vec::new();
    seen.insert(origin);
    queue.push_back((origin, 0u32));

    while let Some((cell, dist)) = queue.pop_front() {
        out.push((cell, dist));
        if dist == max_steps {
            continue;
        }
        for next in grid.walkable_neighbors(cell) {
            if seen.insert(next) {
                queue.push_back((next, dist + 1));
            }
        }
    }
    out
}

/// Every in-bounds cell in the square of half-width `radius` around each enemy
pub fn danger_zone(grid: &Grid, enemies: &[Cell], radius: u32) -> HashSet<Cell> {
    let r = radius as i32;
    let mut zone = HashSet::new();
    for enemy in enemies {
        for dy in -r..=r {
            for dx in -r..=r {
                let cell = Cell::new(enemy.x + dx, enemy.y + dy);
                if grid.in_bounds(cell) {
                    zone.insert(cell);
                }
            }
        }
    }
    zone
}

/// `reach[t]` holds every cell some enemy could occupy after `t` moves
/// (standing still allowed). `reach[0]` is the enemies' current cells.
pub fn predict_enemy_reach(grid: &Grid, enemies: &[Cell], horizon: u32) -> Vec<HashSet<Cell>> {
    let mut reach = Vec::with_capacity(horizon as usize + 1);
    let mut current: HashSet<Cell> = enemies.iter().copied().filter(|c| grid.in_bounds(*c)).collect();
    reach.push(current.clone());

    for _ in 0..horizon {
        let mut next = current.clone();
        for cell in &current {
            next.extend(grid.walkable_neighbors(*cell));
        }
        reach.push(next.clone());
        current = next;
    }
    reach
}

/// Like [`predict_enemy_reach`] for one enemy already moving in `heading`.
///
/// Enemies never turn back unless they hit a dead end, so cells behind a
/// moving enemy are left out. Standing still is allowed at every step.
pub fn predict_directed_reach(grid: &Grid, enemy: Cell, heading: Direction, horizon: u32) -> Vec<HashSet<Cell>> {
    let mut reach = Vec::with_capacity(horizon as usize + 1);
    let mut states: HashSet<(Cell, Direction)> = HashSet::new();
    if grid.in_bounds(enemy) {
        states.insert((enemy, heading));
    }
    reach.push(states.iter().map(|(cell, _)| *cell).collect::<HashSet<Cell>>());

    for _ in 0..horizon {
        let mut next = states.clone();
        for (cell, dir) in &states {
            let mut options: Vec<Direction> = Direction::ALL
                .into_iter()
                .filter(|d| grid.is_walkable(cell.neighbor(*d)))
                .collect();
            if options.len() > 1 {
                options.retain(|d| *d != dir.opposite());
            }
            for d in options {
                next.insert((cell.neighbor(d), d));
            }
        }
        reach.push(next.iter().map(|(cell, _)| *cell).collect());
        states = next;
    }
    reach
}

/// One [`ThreatMap`] per future step; `at(t)` is the threat of standing on a
/// cell `t` moves from now. Steps past the horizon reuse the last map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThreatTimeline {
    steps: Vec<ThreatMap>,
}

impl ThreatTimeline {
    pub fn new() -> Self {
        ThreatTimeline { steps: Vec::new() }
    }

    pub fn from_steps(steps: Vec<ThreatMap>) -> Self {
        ThreatTimeline { steps }
    }

    /// Every cell in `reach[t]` spreads `1 / (1 + d)` over the walkable cells
    /// within Manhattan `safety_radius` of it at step `t`.
    pub fn from_reach(grid: &Grid, reach: &[HashSet<Cell>], safety_radius: u32) -> Self {
        let radius = safety_radius as i32;
        let mut steps = Vec::with_capacity(reach.len());
        for cells in reach {
            let mut map = ThreatMap::new();
            for center in cells {
                for dy in -radius..=radius {
                    for dx in -radius..=radius {
                        let d = dx.abs() + dy.abs();
                        if d > radius {
                            continue;
                        }
                        let cell = Cell::new(center.x + dx, center.y + dy);
                        if grid.is_walkable(cell) {
                            map.add(cell, 1.0 / (1.0 + d as f64));
                        }
                    }
                }
            }
            steps.push(map);
        }
        ThreatTimeline { steps }
    }

    /// Last step index; 0 for an empty timeline
    pub fn horizon(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.steps.iter().all(|map| map.is_empty())
    }

    pub fn at(&self, t: usize) -> Option<&ThreatMap> {
        self.steps.get(t.min(self.horizon()))
    }

    pub fn get(&self, t: usize, cell: &Cell) -> f64 {
        self.at(t).map_or(0.0, |map| map.get(cell))
    }

    /// Sum step by step with `other`; the shorter timeline is extended with its last map
    pub fn merge(&mut self, other: &ThreatTimeline) {
        let len = self.steps.len().max(other.steps.len());
        let mut merged = Vec::with_capacity(len);
        for t in 0..len {
            let mut map = self.at(t).cloned().unwrap_or_default();
            if let Some(extra) = other.at(t) {
                for (cell, weight) in extra.iter() {
                    map.add(*cell, *weight);
                }
            }
            merged.push(map);
        }
        self.steps = merged;
    }

    /// Add the same extra cost at every step
    pub fn add_static(&mut self, extra: &ThreatMap) {
        if self.steps.is_empty() {
            self.steps.push(ThreatMap::new());
        }
        for map in self.steps.iter_mut() {
            for (cell, weight) in extra.iter() {
                map.add(*cell, *weight);
            }
        }
    }

    pub fn scaled(&self, factor: f64) -> ThreatTimeline {
        ThreatTimeline {
            steps: self.steps.iter().map(|map| map.scaled(factor)).collect(),
        }
    }
}
