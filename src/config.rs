use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub maze: MazeConfig,
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub cave: CaveConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MazeConfig {
    /// Maze text file; empty means the built-in layout
    #[serde(default)]
    pub path: String,
}

/// Knobs for the autopilot's threat-aware planning
#[derive(Debug, Clone, Deserialize)]
pub struct PlannerConfig {
    /// Half-width of the square around each enemy that is treated as impassable
    #[serde(default = "default_danger_radius")]
    pub danger_radius: u32,
    /// How many enemy moves ahead the threat map looks
    #[serde(default = "default_threat_horizon")]
    pub threat_horizon: u32,
    /// Manhattan radius over which each predicted enemy cell spreads threat
    #[serde(default = "default_safety_radius")]
    pub safety_radius: u32,
    /// Multiplier applied to every threat weight
    #[serde(default = "default_threat_weight")]
    pub threat_weight: f64,
    /// Multiplier applied on top of threat_weight while a power pellet is active
    #[serde(default = "default_power_threat_scale")]
    pub power_threat_scale: f64,
    /// Retry with the danger zone cleared when it blocks every route
    #[serde(default = "default_ignore_danger_fallback")]
    pub ignore_danger_fallback: bool,
    /// Plan over (cell, step) against a per-step threat forecast instead of one static map
    #[serde(default = "default_time_expanded")]
    pub time_expanded: bool,
    /// How many recent positions count towards the loop penalty
    #[serde(default = "default_loop_memory")]
    pub loop_memory: usize,
    /// Extra cost per recent visit of a cell; discourages back-and-forth dithering
    #[serde(default = "default_loop_penalty")]
    pub loop_penalty: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaveConfig {
    #[serde(default = "default_cave_width")]
    pub width: i32,
    #[serde(default = "default_cave_height")]
    pub height: i32,
    #[serde(default = "default_chance_to_start_alive")]
    pub chance_to_start_alive: f64,
    #[serde(default = "default_death_limit")]
    pub death_limit: u32,
    #[serde(default = "default_birth_limit")]
    pub birth_limit: u32,
    #[serde(default = "default_steps")]
    pub steps: u32,
    #[serde(default = "default_item_count")]
    pub item_count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_lives")]
    pub lives: u32,
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Ticks a power pellet stays active
    #[serde(default = "default_power_ticks")]
    pub power_ticks: u32,
    /// Enemies move once every this many ticks
    #[serde(default = "default_enemy_period")]
    pub enemy_period: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub trace_pathfinding: bool,
    #[serde(default = "default_enable_plan_log")]
    pub enable_plan_log: bool,
    #[serde(default = "default_plan_log_path")]
    pub plan_log_path: String,
}

// Default values
fn default_danger_radius() -> u32 { 1 }
fn default_threat_horizon() -> u32 { 4 }
fn default_safety_radius() -> u32 { 1 }
fn default_threat_weight() -> f64 { 4.0 }
fn default_power_threat_scale() -> f64 { 0.15 }
fn default_ignore_danger_fallback() -> bool { true }
fn default_time_expanded() -> bool { true }
fn default_loop_memory() -> usize { 6 }
fn default_loop_penalty() -> f64 { 0.5 }
fn default_cave_width() -> i32 { 100 }
fn default_cave_height() -> i32 { 80 }
fn default_chance_to_start_alive() -> f64 { 0.4 }
fn default_death_limit() -> u32 { 3 }
fn default_birth_limit() -> u32 { 4 }
fn default_steps() -> u32 { 4 }
fn default_item_count() -> usize { 10 }
fn default_lives() -> u32 { 3 }
fn default_max_ticks() -> u64 { 5000 }
fn default_seed() -> u64 { 42 }
fn default_power_ticks() -> u32 { 40 }
fn default_enemy_period() -> u32 { 2 }
fn default_enable_plan_log() -> bool { false }
fn default_plan_log_path() -> String { "plan_log.json".to_string() }

impl Default for MazeConfig {
    fn default() -> Self {
        Self { path: String::new() }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            danger_radius: default_danger_radius(),
            threat_horizon: default_threat_horizon(),
            safety_radius: default_safety_radius(),
            threat_weight: default_threat_weight(),
            power_threat_scale: default_power_threat_scale(),
            ignore_danger_fallback: default_ignore_danger_fallback(),
            time_expanded: default_time_expanded(),
            loop_memory: default_loop_memory(),
            loop_penalty: default_loop_penalty(),
        }
    }
}

impl Default for CaveConfig {
    fn default() -> Self {
        Self {
            width: default_cave_width(),
            height: default_cave_height(),
            chance_to_start_alive: default_chance_to_start_alive(),
            death_limit: default_death_limit(),
            birth_limit: default_birth_limit(),
            steps: default_steps(),
            item_count: default_item_count(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            lives: default_lives(),
            max_ticks: default_max_ticks(),
            seed: default_seed(),
            power_ticks: default_power_ticks(),
            enemy_period: default_enemy_period(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            trace_pathfinding: false,
            enable_plan_log: default_enable_plan_log(),
            plan_log_path: default_plan_log_path(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            maze: MazeConfig::default(),
            planner: PlannerConfig::default(),
            cave: CaveConfig::default(),
            simulation: SimulationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from config.toml, or use defaults if it doesn't exist
    pub fn load() -> Self {
        Self::load_from("config.toml")
    }

    /// Load configuration from `path`, falling back to defaults on any problem
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => {
                    println!("Loaded configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    eprintln!("Warning: {}", e);
                    eprintln!("Using default configuration");
                    Config::default()
                }
            },
            Err(_) => {
                println!("No {} found, using default configuration", path.display());
                Config::default()
            }
        }
    }

    /// Parse TOML text; missing sections and fields take their defaults
    pub fn parse(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|e| format!("Failed to parse config: {}", e))
    }
}
