pub mod agent;
pub mod cave;
pub mod config;
pub mod grid;
pub mod maze;
pub mod pathfinding;
pub mod plan_log;
pub mod simulation;
pub mod threat;

pub use agent::{Agent, AgentState, Autopilot};
pub use config::Config;
pub use grid::{Cell, Direction, Grid};
pub use maze::Maze;
pub use pathfinding::{
    multi_goal_greedy_plan, nearest_target, shortest_path, snap_to_walkable, weighted_path,
    weighted_path_in_time, weighted_path_or_ignore_danger, GreedyPlan,
};
pub use threat::{ThreatMap, ThreatTimeline};
