use crate::agent::{Agent, Autopilot};
use crate::config::Config;
use crate::grid::{Cell, Direction, Grid};
use crate::maze::Maze;
use crate::plan_log::{PlanEvent, PlanLog};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;

const PELLET_POINTS: u32 = 10;
const POWER_PELLET_POINTS: u32 = 50;
const ENEMY_POINTS: u32 = 200;

/// A wandering enemy
#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    pub cell: Cell,
    pub spawn: Cell,
    pub direction: Option<Direction>,
    /// Cell before the last move, for pass-through collisions
    pub previous: Cell,
}

impl Enemy {
    pub fn new(spawn: Cell) -> Self {
        Enemy {
            cell: spawn,
            spawn,
            direction: None,
            previous: spawn,
        }
    }

    /// Random walk that only turns back at dead ends
    fn wander(&mut self, grid: &Grid, rng: &mut ChaCha8Rng) {
        self.previous = self.cell;
        let mut options: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|d| grid.is_walkable(self.cell.neighbor(*d)))
            .collect();
        if options.len() > 1 {
            if let Some(back) = self.direction.map(|d| d.opposite()) {
                options.retain(|d| *d != back);
            }
        }
        if let Some(dir) = options.choose(rng) {
            self.cell = self.cell.neighbor(*dir);
            self.direction = Some(*dir);
        }
    }

    fn respawn(&mut self) {
        self.cell = self.spawn;
        self.previous = self.spawn;
        self.direction = None;
    }
}

/// How a run ended
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// Every collectible eaten
    Win,
    /// Everything reachable eaten; these could never be reached
    Partial { unreachable: Vec<Cell> },
    /// Out of lives
    Fail,
    Timeout,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimulationReport {
    pub outcome: Outcome,
    pub ticks: u64,
    pub steps: u64,
    pub score: u32,
    pub lives: u32,
}

/// Headless game loop: one agent decision and move per tick
pub struct Simulation {
    pub grid: Grid,
    pub agent: Agent,
    pub enemies: Vec<Enemy>,
    pub pellets: HashSet<Cell>,
    pub power_pellets: HashSet<Cell>,
    autopilot: Autopilot,
    rng: ChaCha8Rng,
    tick: u64,
    power_timer: u32,
    power_ticks: u32,
    enemy_period: u32,
    outcome: Option<Outcome>,
}

impl Simulation {
    pub fn new(maze: Maze, config: &Config) -> Self {
        let log = if config.logging.enable_plan_log {
            PlanLog::new()
        } else {
            PlanLog::disabled()
        };
        Simulation {
            agent: Agent::new(maze.agent_spawn, config.simulation.lives),
            enemies: maze.enemy_spawns.iter().map(|c| Enemy::new(*c)).collect(),
            grid: maze.grid,
            pellets: maze.pellets,
            power_pellets: maze.power_pellets,
            autopilot: Autopilot::with_log(config.planner.clone(), log),
            rng: ChaCha8Rng::seed_from_u64(config.simulation.seed),
            tick: 0,
            power_timer: 0,
            power_ticks: config.simulation.power_ticks,
            enemy_period: config.simulation.enemy_period.max(1),
            outcome: None,
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn power_active(&self) -> bool {
        self.power_timer > 0
    }

    pub fn autopilot(&self) -> &Autopilot {
        &self.autopilot
    }

    pub fn plan_log(&self) -> &PlanLog {
        self.autopilot.log()
    }

    fn enemy_cells(&self) -> Vec<Cell> {
        self.enemies.iter().map(|e| e.cell).collect()
    }

    /// Advance one step. Returns the outcome once the run is over.
    pub fn tick(&mut self) -> Option<&Outcome> {
        if self.outcome.is_some() {
            return self.outcome.as_ref();
        }
        self.tick += 1;

        let collectibles: HashSet<Cell> = self.pellets.union(&self.power_pellets).copied().collect();
        let enemy_cells = self.enemy_cells();
        let decision = self.autopilot.decide(
            &self.grid,
            self.agent.cell,
            &collectibles,
            &enemy_cells,
            self.power_active(),
            self.tick,
        );

        let agent_previous = self.agent.cell;
        if let Some(dir) = decision {
            self.agent.step(&self.grid, dir);
        }
        self.eat();

        let mut caught: HashSet<usize> = HashSet::new();
        self.resolve_collisions(agent_previous, &mut caught);
        if self.outcome.is_some() {
            return self.outcome.as_ref();
        }

        if self.tick % self.enemy_period as u64 == 0 {
            for (i, enemy) in self.enemies.iter_mut().enumerate() {
                if !caught.contains(&i) {
                    enemy.wander(&self.grid, &mut self.rng);
                }
            }
            let agent_now = self.agent.cell;
            self.resolve_collisions(agent_now, &mut caught);
        }

        self.power_timer = self.power_timer.saturating_sub(1);
        self.check_finished();
        self.outcome.as_ref()
    }

    fn eat(&mut self) {
        let at = self.agent.cell;
        if self.pellets.remove(&at) {
            self.agent.score += PELLET_POINTS;
            self.autopilot.log_mut().log(self.tick, PlanEvent::PelletEaten { at, power: false });
        }
        if self.power_pellets.remove(&at) {
            self.agent.score += POWER_PELLET_POINTS;
            self.power_timer = self.power_ticks;
            self.autopilot.log_mut().log(self.tick, PlanEvent::PelletEaten { at, power: true });
        }
    }

    /// Same cell, or agent and enemy swapped cells this tick
    fn resolve_collisions(&mut self, agent_previous: Cell, caught: &mut HashSet<usize>) {
        let agent = self.agent.cell;
        for i in 0..self.enemies.len() {
            if caught.contains(&i) {
                continue;
            }
            let enemy = &self.enemies[i];
            let swapped = enemy.cell == agent_previous && enemy.previous == agent && agent != agent_previous;
            if enemy.cell != agent && !swapped {
                continue;
            }

            caught.insert(i);
            if self.power_active() {
                self.agent.score += ENEMY_POINTS;
                self.enemies[i].respawn();
                continue;
            }

            self.agent.lives = self.agent.lives.saturating_sub(1);
            self.autopilot
                .log_mut()
                .log(self.tick, PlanEvent::Collision { at: agent, lives_left: self.agent.lives });
            println!("Collision at ({},{})! Lives: {}", agent.x, agent.y, self.agent.lives);
            if self.agent.lives == 0 {
                self.outcome = Some(Outcome::Fail);
                return;
            }
            self.agent.respawn();
            self.autopilot.reset();
            return;
        }
    }

    fn check_finished(&mut self) {
        let unreachable = self.autopilot.unreachable();
        let remaining: Vec<Cell> = self
            .pellets
            .iter()
            .chain(self.power_pellets.iter())
            .copied()
            .collect();

        if remaining.is_empty() {
            self.outcome = Some(Outcome::Win);
        } else if remaining.iter().all(|c| unreachable.contains(c)) {
            let mut cells = remaining;
            cells.sort();
            self.outcome = Some(Outcome::Partial { unreachable: cells });
        }
    }

    /// Tick until the run ends or `max_ticks` have passed
    pub fn run(&mut self, max_ticks: u64) -> SimulationReport {
        while self.outcome.is_none() && self.tick < max_ticks {
            self.tick();
        }
        if self.outcome.is_none() {
            self.outcome = Some(Outcome::Timeout);
        }
        SimulationReport {
            outcome: self.outcome.clone().unwrap_or(Outcome::Timeout),
            ticks: self.tick,
            steps: self.agent.steps,
            score: self.agent.score,
            lives: self.agent.lives,
        }
    }
}
