mod common;

use common::{all_variants, assert_valid_path, parse_layout, random_grid, visualize_path};
use pacpath::pathfinding::{path_cost, timed_path_cost};
use pacpath::threat::danger_zone;
use pacpath::{
    shortest_path, weighted_path, weighted_path_in_time, weighted_path_or_ignore_danger, Cell, Grid, ThreatMap,
    ThreatTimeline,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;

/// Two-wide room: straight down the left column is 3 steps,
/// swinging through the right column is 5
fn detour_room() -> (Grid, Cell, Cell) {
    let (grid, start, goal) = parse_layout(&["####", "#S.#", "#..#", "#..#", "#D.#", "####"]);
    (grid, start.unwrap(), goal.unwrap())
}

#[test]
fn test_high_threat_cell_forces_detour() {
    let (grid, start, goal) = detour_room();
    let danger = Cell::new(1, 2);

    let direct = shortest_path(&grid, start, goal);
    assert_eq!(direct.len() - 1, 3);

    let mut threat = ThreatMap::new();
    threat.insert(danger, 100.0);
    let safe = weighted_path(&grid, start, goal, &threat, &HashSet::new());
    println!("{}", visualize_path(&grid, &safe));

    assert_valid_path(&grid, &safe, start, goal);
    assert_eq!(safe.len() - 1, 5);
    assert!(!safe.contains(&danger));
    assert_eq!(path_cost(&safe, &threat), 5.0);
}

#[test]
fn test_small_threat_not_worth_a_detour() {
    let (grid, start, goal) = detour_room();
    let mut threat = ThreatMap::new();
    threat.insert(Cell::new(1, 2), 1.5);
    // Detour costs 2 extra steps, threat only 1.5
    let path = weighted_path(&grid, start, goal, &threat, &HashSet::new());
    assert_eq!(path.len() - 1, 3);
}

#[test]
fn test_without_threat_matches_bfs_length() {
    for seed in 0..15 {
        let grid = random_grid(seed, 10, 10, 0.3);
        let cells = grid.walkable_cells();
        if cells.len() < 2 {
            continue;
        }
        let start = cells[0];
        for goal in cells.iter().step_by(3) {
            let bfs = shortest_path(&grid, start, *goal);
            let astar = weighted_path(&grid, start, *goal, &ThreatMap::new(), &HashSet::new());
            assert_eq!(bfs.len(), astar.len(), "seed {} goal ({},{})", seed, goal.x, goal.y);
        }
    }
}

#[test]
fn test_never_enters_forbidden_cells() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    for seed in 0..20 {
        let grid = random_grid(1000 + seed, 12, 12, 0.2);
        let cells = grid.walkable_cells();
        if cells.len() < 10 {
            continue;
        }
        let start = cells[0];
        let goal = *cells.last().unwrap();
        let forbidden: HashSet<Cell> = cells
            .iter()
            .copied()
            .filter(|c| *c != start && *c != goal && rng.gen_bool(0.15))
            .collect();
        let mut threat = ThreatMap::new();
        for cell in &cells {
            threat.insert(*cell, rng.gen_range(0.0..3.0));
        }

        let path = weighted_path(&grid, start, goal, &threat, &forbidden);
        if !path.is_empty() {
            assert_valid_path(&grid, &path, start, goal);
        }
        for cell in &path {
            assert!(!forbidden.contains(cell), "seed {}: path enters forbidden ({},{})", seed, cell.x, cell.y);
        }
    }
}

#[test]
fn test_forbidden_goal_is_unreachable() {
    let grid = Grid::new(3, 3);
    let goal = Cell::new(2, 2);
    let forbidden: HashSet<Cell> = [goal].into_iter().collect();
    assert!(weighted_path(&grid, Cell::new(0, 0), goal, &ThreatMap::new(), &forbidden).is_empty());
}

#[test]
fn test_start_inside_danger_zone_can_leave() {
    let grid = Grid::new(1, 6);
    let start = Cell::new(1, 0);
    let goal = Cell::new(5, 0);
    let forbidden = danger_zone(&grid, &[Cell::new(0, 0)], 1);
    assert!(forbidden.contains(&start));
    let path = weighted_path(&grid, start, goal, &ThreatMap::new(), &forbidden);
    assert_eq!(path.len(), 5);
}

#[test]
fn test_ignore_danger_fallback() {
    let (grid, start, goal) = parse_layout(&["#######", "#S   D#", "#######"]);
    let (start, goal) = (start.unwrap(), goal.unwrap());

    for (variant, grid, cells) in all_variants(&grid, &[start, goal, Cell::new(3, 1)]) {
        let forbidden = danger_zone(&grid, &[cells[2]], 0);
        assert!(weighted_path(&grid, cells[0], cells[1], &ThreatMap::new(), &forbidden).is_empty());

        let (path, used_fallback) =
            weighted_path_or_ignore_danger(&grid, cells[0], cells[1], &ThreatMap::new(), &forbidden);
        assert!(used_fallback, "[{}]", variant);
        assert_valid_path(&grid, &path, cells[0], cells[1]);
    }
}

#[test]
fn test_fallback_not_used_when_safe_route_exists() {
    let (grid, start, goal) = detour_room();
    let forbidden: HashSet<Cell> = [Cell::new(1, 2)].into_iter().collect();
    let (path, used_fallback) = weighted_path_or_ignore_danger(&grid, start, goal, &ThreatMap::new(), &forbidden);
    assert!(!used_fallback);
    assert_eq!(path.len() - 1, 5);
}

#[test]
fn test_fallback_reports_false_when_walled_off() {
    let (grid, start, goal) = parse_layout(&["#####", "#S#D#", "#####"]);
    let forbidden: HashSet<Cell> = [Cell::new(0, 0)].into_iter().collect();
    let (path, used_fallback) =
        weighted_path_or_ignore_danger(&grid, start.unwrap(), goal.unwrap(), &ThreatMap::new(), &forbidden);
    assert!(path.is_empty());
    assert!(!used_fallback);
}

#[test]
fn test_waits_for_threat_to_pass() {
    // (1,0) is dangerous only one step from now
    let grid = Grid::new(1, 5);
    let start = Cell::new(0, 0);
    let goal = Cell::new(4, 0);
    let mut spike = ThreatMap::new();
    spike.insert(Cell::new(1, 0), 100.0);
    let timeline = ThreatTimeline::from_steps(vec![ThreatMap::new(), spike, ThreatMap::new()]);

    let path = weighted_path_in_time(&grid, start, goal, &timeline, &HashSet::new());

    assert_eq!(
        path,
        vec![start, start, Cell::new(1, 0), Cell::new(2, 0), Cell::new(3, 0), goal]
    );
    assert_eq!(timed_path_cost(&path, &timeline), 5.0);

    // The static search sees no threat at all on the last map
    let static_path = weighted_path(&grid, start, goal, &ThreatMap::new(), &HashSet::new());
    assert_eq!(static_path.len(), 5);
}

#[test]
fn test_timed_search_without_threat_matches_bfs_length() {
    let timeline = ThreatTimeline::from_steps(vec![ThreatMap::new(); 4]);
    for seed in 40..50 {
        let grid = random_grid(seed, 9, 9, 0.3);
        let cells = grid.walkable_cells();
        if cells.len() < 2 {
            continue;
        }
        let start = cells[0];
        for goal in cells.iter().step_by(4) {
            let bfs = shortest_path(&grid, start, *goal);
            let timed = weighted_path_in_time(&grid, start, *goal, &timeline, &HashSet::new());
            assert_eq!(bfs.len(), timed.len(), "seed {} goal ({},{})", seed, goal.x, goal.y);
            assert!(timed.windows(2).all(|w| w[0].manhattan(&w[1]) == 1), "no reason to wait");
        }
    }
}

#[test]
fn test_timed_search_respects_forbidden() {
    let (grid, start, goal) = detour_room();
    let forbidden: HashSet<Cell> = [Cell::new(1, 2)].into_iter().collect();
    let timeline = ThreatTimeline::from_steps(vec![ThreatMap::new(); 3]);

    let path = weighted_path_in_time(&grid, start, goal, &timeline, &forbidden);
    assert_valid_path(&grid, &path, start, goal);
    assert_eq!(path.len() - 1, 5);
    assert!(!path.contains(&Cell::new(1, 2)));

    let goal_forbidden: HashSet<Cell> = [goal].into_iter().collect();
    assert!(weighted_path_in_time(&grid, start, goal, &timeline, &goal_forbidden).is_empty());
    assert_eq!(weighted_path_in_time(&grid, start, start, &timeline, &forbidden), vec![start]);
}
