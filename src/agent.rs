use crate::config::PlannerConfig;
use crate::grid::{Cell, Direction, Grid};
use crate::pathfinding::{
    direction_between, nearest_target, nearest_target_path, snap_to_walkable, weighted_path,
    weighted_path_in_time, weighted_path_or_ignore_danger,
};
use crate::plan_log::{PlanEvent, PlanLog};
use crate::threat::{danger_zone, predict_directed_reach, predict_enemy_reach, ThreatMap, ThreatTimeline};
use std::collections::{HashSet, VecDeque};

/// The collecting agent as plain data: where it is and how it is doing
#[derive(Clone, Debug, PartialEq)]
pub struct Agent {
    pub cell: Cell,
    pub spawn: Cell,
    pub direction: Option<Direction>,
    pub score: u32,
    pub lives: u32,
    /// Cells moved so far
    pub steps: u64,
}

impl Agent {
    pub fn new(spawn: Cell, lives: u32) -> Self {
        Agent {
            cell: spawn,
            spawn,
            direction: None,
            score: 0,
            lives,
            steps: 0,
        }
    }

    /// Move one cell in `dir` if the grid allows it.
    /// Returns true if the agent moved.
    pub fn step(&mut self, grid: &Grid, dir: Direction) -> bool {
        let next = self.cell.neighbor(dir);
        if !grid.is_walkable(next) {
            self.direction = None;
            return false;
        }
        self.cell = next;
        self.direction = Some(dir);
        self.steps += 1;
        true
    }

    /// Back to spawn after being caught
    pub fn respawn(&mut self) {
        self.cell = self.spawn;
        self.direction = None;
    }
}

/// Where the autopilot is in its plan/follow cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgentState {
    Idle,
    Planning,
    Following,
}

/// Threat-aware route follower.
///
/// Plans toward the nearest pellet while keeping out of enemy danger zones,
/// then follows that route cell by cell. A new plan is made only when the
/// route runs out or becomes invalid, never on every call.
///
/// Enemy headings are read off the difference between consecutive calls, so
/// an enemy seen moving is forecast to keep going rather than to turn back.
/// A route may contain repeated cells; `decide` answers `None` for those and
/// the agent waits.
pub struct Autopilot {
    config: PlannerConfig,
    state: AgentState,
    route: Vec<Cell>,
    /// Index into `route` of the cell the agent currently stands on
    index: usize,
    target: Option<Cell>,
    unreachable: HashSet<Cell>,
    /// Enemy cells at the previous call
    last_enemies: Vec<Cell>,
    recent: VecDeque<Cell>,
    log: PlanLog,
}

impl Autopilot {
    pub fn new(config: PlannerConfig) -> Self {
        Self::with_log(config, PlanLog::disabled())
    }

    pub fn with_log(config: PlannerConfig, log: PlanLog) -> Self {
        Autopilot {
            config,
            state: AgentState::Idle,
            route: Vec::new(),
            index: 0,
            target: None,
            unreachable: HashSet::new(),
            last_enemies: Vec::new(),
            recent: VecDeque::new(),
            log,
        }
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn target(&self) -> Option<Cell> {
        self.target
    }

    /// The current route, start to target
    pub fn route(&self) -> &[Cell] {
        &self.route
    }

    /// Pellets given up on because nothing can reach them
    pub fn unreachable(&self) -> &HashSet<Cell> {
        &self.unreachable
    }

    pub fn log(&self) -> &PlanLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut PlanLog {
        &mut self.log
    }

    /// Drop the current route; the next `decide` will plan again
    pub fn reset(&mut self) {
        self.state = AgentState::Idle;
        self.route.clear();
        self.index = 0;
        self.target = None;
    }

    /// Next move for an agent standing on `position`, or `None` to stay put.
    pub fn decide(
        &mut self,
        grid: &Grid,
        position: Cell,
        pellets: &HashSet<Cell>,
        enemies: &[Cell],
        power_active: bool,
        tick: u64,
    ) -> Option<Direction> {
        let headings = self.enemy_headings(enemies);
        self.last_enemies = enemies.to_vec();

        let Some(position) = snap_to_walkable(grid, position) else {
            self.reset();
            return None;
        };
        self.remember(position);

        if self.state == AgentState::Following {
            if let Some(reason) = self.invalidation(grid, position, pellets, enemies, power_active) {
                if !reason.is_empty() {
                    self.log.log(tick, PlanEvent::Invalidated { at: position, reason });
                }
                self.reset();
            }
        }

        if self.state != AgentState::Following {
            self.state = AgentState::Planning;
            if !self.plan(grid, position, pellets, enemies, &headings, power_active, tick) {
                self.reset();
                return None;
            }
        }

        let next = self.route[self.index + 1];
        direction_between(position, next)
    }

    /// Direction each enemy moved since the last call, when it moved one cell
    fn enemy_headings(&self, enemies: &[Cell]) -> Vec<Option<Direction>> {
        if self.last_enemies.len() != enemies.len() {
            return vec![None; enemies.len()];
        }
        self.last_enemies
            .iter()
            .zip(enemies)
            .map(|(before, now)| direction_between(*before, *now))
            .collect()
    }

    fn remember(&mut self, position: Cell) {
        if self.config.loop_memory == 0 {
            self.recent.clear();
            return;
        }
        self.recent.push_back(position);
        while self.recent.len() > self.config.loop_memory {
            self.recent.pop_front();
        }
    }

    /// Extra cost on recently visited cells, except the one the agent stands on
    fn loop_penalty(&self, start: Cell) -> ThreatMap {
        let mut penalty = ThreatMap::new();
        for cell in self.recent.iter().filter(|c| **c != start) {
            penalty.add(*cell, self.config.loop_penalty);
        }
        penalty
    }

    /// Per-step threat: directed reach for enemies with a known heading, full reach otherwise
    fn forecast(&self, grid: &Grid, enemies: &[Cell], headings: &[Option<Direction>]) -> ThreatTimeline {
        let horizon = self.config.threat_horizon;
        let mut timeline = ThreatTimeline::new();
        for (enemy, heading) in enemies.iter().zip(headings) {
            let reach = match heading {
                Some(dir) => predict_directed_reach(grid, *enemy, *dir, horizon),
                None => predict_enemy_reach(grid, &[*enemy], horizon),
            };
            timeline.merge(&ThreatTimeline::from_reach(grid, &reach, self.config.safety_radius));
        }
        timeline
    }

    /// Why the current route must be dropped, `Some("")` when it simply ran out
    fn invalidation(
        &mut self,
        grid: &Grid,
        position: Cell,
        pellets: &HashSet<Cell>,
        enemies: &[Cell],
        power_active: bool,
    ) -> Option<String> {
        // Advance along the route if the last move landed
        if self.index + 1 < self.route.len() && self.route[self.index + 1] == position {
            self.index += 1;
        }
        if self.index + 1 >= self.route.len() {
            return Some(String::new());
        }
        if let Some(target) = self.target {
            if !pellets.contains(&target) {
                return Some("target consumed".to_string());
            }
        }
        if self.route[self.index] != position {
            return Some("agent left the route".to_string());
        }
        if !power_active {
            let zone = danger_zone(grid, enemies, self.config.danger_radius);
            if self.route[self.index + 1..].iter().any(|c| zone.contains(c)) {
                return Some("enemy entered the corridor".to_string());
            }
        }
        None
    }

    #[allow(clippy::too_many_arguments)]
    fn plan(
        &mut self,
        grid: &Grid,
        start: Cell,
        pellets: &HashSet<Cell>,
        enemies: &[Cell],
        headings: &[Option<Direction>],
        power_active: bool,
        tick: u64,
    ) -> bool {
        let candidates: HashSet<Cell> = pellets
            .iter()
            .copied()
            .filter(|c| !self.unreachable.contains(c) && *c != start)
            .collect();
        if candidates.is_empty() {
            return false;
        }

        let forbidden = if power_active {
            HashSet::new()
        } else {
            danger_zone(grid, enemies, self.config.danger_radius)
        };
        let scale = if power_active {
            self.config.threat_weight * self.config.power_threat_scale
        } else {
            self.config.threat_weight
        };
        let penalty = self.loop_penalty(start);

        let safe_target = nearest_target_path(grid, start, &candidates, &forbidden).last().copied();
        let target = match safe_target {
            Some(target) => target,
            None => match nearest_target(grid, start, &candidates) {
                Some(target) => target,
                None => {
                    // Walled off from every remaining pellet
                    for cell in &candidates {
                        self.log.log(tick, PlanEvent::Unreachable { from: start, target: *cell });
                    }
                    self.unreachable.extend(candidates);
                    return false;
                }
            },
        };

        let fallback = self.config.ignore_danger_fallback;
        let (route, used_fallback) = if self.config.time_expanded {
            let mut timeline = self.forecast(grid, enemies, headings).scaled(scale);
            timeline.add_static(&penalty);
            let route = weighted_path_in_time(grid, start, target, &timeline, &forbidden);
            if route.is_empty() && fallback && !forbidden.is_empty() {
                let retry = weighted_path_in_time(grid, start, target, &timeline, &HashSet::new());
                let used = !retry.is_empty();
                (retry, used)
            } else {
                (route, false)
            }
        } else {
            let mut threat =
                ThreatMap::from_enemies(grid, enemies, self.config.threat_horizon, self.config.safety_radius)
                    .scaled(scale);
            for (cell, weight) in penalty.iter() {
                threat.add(*cell, *weight);
            }
            if fallback {
                weighted_path_or_ignore_danger(grid, start, target, &threat, &forbidden)
            } else {
                (weighted_path(grid, start, target, &threat, &forbidden), false)
            }
        };
        if used_fallback {
            self.log.log(tick, PlanEvent::FallbackIgnoredDanger { from: start, target });
        }

        if route.len() < 2 {
            // Danger blocks the way and fallback is off: wait for enemies to move
            return false;
        }

        self.log.log(tick, PlanEvent::Planned { from: start, target, length: route.len() });
        self.route = route;
        self.index = 0;
        self.target = Some(target);
        self.state = AgentState::Following;
        true
    }
}
