use pacpath::plan_log::{LoggedEvent, PlanEvent, PlanLog};
use pacpath::{multi_goal_greedy_plan, Cell, Maze};
use std::fs;
use std::path::PathBuf;

fn scratch_file(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("pacpath_{}_{}", std::process::id(), name))
}

#[test]
fn test_load_maze_from_file() {
    let path = scratch_file("maze.txt");
    fs::write(&path, "\n#######\n#P..o #\n#E### #\n#######\n\n").unwrap();

    let maze = Maze::load(&path).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(maze.grid.rows, 4);
    assert_eq!(maze.agent_spawn, Cell::new(1, 1));
    assert_eq!(maze.enemy_spawns, vec![Cell::new(1, 2)]);
    assert_eq!(maze.all_collectibles().len(), 3);

    let mut goals: Vec<Cell> = maze.all_collectibles().into_iter().collect();
    goals.sort();
    let plan = multi_goal_greedy_plan(&maze.grid, maze.agent_spawn, &goals);
    assert_eq!(plan.visit_order, vec![Cell::new(2, 1), Cell::new(3, 1), Cell::new(4, 1)]);
}

#[test]
fn test_missing_maze_file_is_an_error() {
    let err = Maze::load(scratch_file("does_not_exist.txt")).unwrap_err();
    assert!(err.contains("Failed to read maze file"));
}

#[test]
fn test_plan_log_saves_json() {
    let path = scratch_file("plan_log.json");
    let mut log = PlanLog::new();
    log.log(1, PlanEvent::Planned { from: Cell::new(1, 1), target: Cell::new(3, 1), length: 3 });
    log.log(2, PlanEvent::PelletEaten { at: Cell::new(2, 1), power: false });

    log.save_to_file(path.to_str().unwrap()).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    fs::remove_file(&path).ok();

    let events: Vec<LoggedEvent> = serde_json::from_str(&text).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].tick, 2);
    assert_eq!(events[0].event, log.events()[0].event);
}
