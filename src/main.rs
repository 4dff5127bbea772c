use pacpath::cave::{generate_level, CaveParams};
use pacpath::pathfinding::{self, format_path, multi_goal_greedy_plan};
use pacpath::simulation::{Outcome, Simulation};
use pacpath::{Config, Maze};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::env;
use std::time::Instant;

fn print_usage(program: &str) {
    eprintln!("Usage: {} [maze.txt] [--cave [SEED]] [--plan] [--config config.toml]", program);
    eprintln!("Runs the autopilot headless on a maze (or a generated cave) and reports the result");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let mut maze_path: Option<String> = None;
    let mut cave_seed: Option<Option<u64>> = None;
    let mut plan_only = false;
    let mut config_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage(&args[0]);
                return Ok(());
            }
            "--plan" => plan_only = true,
            "--config" => {
                i += 1;
                config_path = Some(args.get(i).cloned().ok_or("--config needs a path")?);
            }
            "--cave" => {
                // Optional seed; otherwise the configured one
                let seed = args.get(i + 1).and_then(|s| s.parse::<u64>().ok());
                if seed.is_some() {
                    i += 1;
                }
                cave_seed = Some(seed);
            }
            other if other.starts_with('-') => {
                print_usage(&args[0]);
                return Err(format!("Unknown option {}", other).into());
            }
            other => maze_path = Some(other.to_string()),
        }
        i += 1;
    }

    let config = match &config_path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    pathfinding::set_trace(config.logging.trace_pathfinding);

    let maze = if let Some(seed) = cave_seed {
        let seed = seed.unwrap_or(config.simulation.seed);
        let params = CaveParams::from(&config.cave);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let cave = generate_level(&params, config.cave.item_count, &mut rng)
            .ok_or("Generated cave has no open cells")?;
        println!(
            "Generated {}x{} cave (seed {}), {} items",
            params.width,
            params.height,
            seed,
            cave.items.len()
        );
        if config.logging.trace_pathfinding {
            print!("{}", cave.grid.to_ascii());
        }
        cave.into_maze()
    } else {
        let path = maze_path.unwrap_or_else(|| config.maze.path.clone());
        if path.is_empty() {
            println!("Using built-in maze");
            Maze::default_maze()?
        } else {
            println!("Loading maze from {}", path);
            Maze::load(&path)?
        }
    };

    if plan_only {
        let mut goals: Vec<_> = maze.all_collectibles().into_iter().collect();
        goals.sort();
        let started = Instant::now();
        let plan = multi_goal_greedy_plan(&maze.grid, maze.agent_spawn, &goals);
        println!("Greedy plan: {} goals visited, {} unreachable", plan.visit_order.len(), plan.unreachable.len());
        println!("Path length: {} steps ({:.3} ms)", plan.path.len().saturating_sub(1), started.elapsed().as_secs_f64() * 1000.0);
        println!("Visit order: {}", format_path(&plan.visit_order));
        return Ok(());
    }

    let started = Instant::now();
    let mut sim = Simulation::new(maze, &config);
    let report = sim.run(config.simulation.max_ticks);
    let elapsed = started.elapsed().as_secs_f64();

    match &report.outcome {
        Outcome::Win => println!("Victory! Time: {:.2}s Steps: {}", elapsed, report.steps),
        Outcome::Partial { unreachable } => {
            println!("Partially completed. Uncollected: {}", format_path(unreachable))
        }
        Outcome::Fail => println!("Defeat. Time: {:.2}s Steps: {}", elapsed, report.steps),
        Outcome::Timeout => println!("Stopped after {} ticks", report.ticks),
    }
    println!("Score: {}  Lives: {}  Ticks: {}", report.score, report.lives, report.ticks);

    if sim.plan_log().is_enabled() {
        if config.logging.trace_pathfinding {
            sim.plan_log().print();
        }
        println!("{}", sim.plan_log().summary());
        if let Err(e) = sim.plan_log().save_to_file(&config.logging.plan_log_path) {
            eprintln!("Warning: {}", e);
        } else {
            println!("Plan log written to {}", config.logging.plan_log_path);
        }
    }

    Ok(())
}
