use crate::grid::{Cell, Grid};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Classic layout used when no maze file is configured.
/// Some rows are one character short; they are padded with wall.
pub const DEFAULT_MAZE: &[&str] = &[
    "######################",
    "#........##..........#",
    "#.##.###.##.###.##..#",
    "#o##.###.##.###.##o.#",
    "#....................#",
    "#.##.#.######.#.##.#.#",
    "#....#....##....#....#",
    "####.### #### ###.####",
    "#P.......G  G.......P#",
    "####.### #### ###.####",
    "#....#....##....#....#",
    "#.##.#.######.#.##.#.#",
    "#....................#",
    "#o##.###.##.###.##o.#",
    "#.##.###.##.###.##..#",
    "#........##..........#",
    "######################",
];

/// A parsed level: walls plus the things placed on the floor
#[derive(Debug, Clone)]
pub struct Maze {
    pub grid: Grid,
    pub pellets: HashSet<Cell>,
    pub power_pellets: HashSet<Cell>,
    pub agent_spawn: Cell,
    pub enemy_spawns: Vec<Cell>,
}

impl Maze {
    /// Parse maze text.
    ///
    /// `#` wall, `.` pellet, `o` power pellet, `P` agent spawn, `G`/`E` enemy
    /// spawn, space empty floor. Rows shorter than the widest one are padded
    /// with wall. Only the first `P` is the spawn; later ones become pellets.
    pub fn parse(text: &str) -> Result<Maze, String> {
        let lines: Vec<&str> = text.lines().collect();
        Self::from_lines(&lines)
    }

    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Result<Maze, String> {
        // Blank lines at either end are formatting, not maze rows
        let rows: Vec<&str> = {
            let all: Vec<&str> = lines.iter().map(|l| l.as_ref().trim_end_matches('\r')).collect();
            let first = all.iter().position(|l| !l.trim().is_empty());
            let last = all.iter().rposition(|l| !l.trim().is_empty());
            match (first, last) {
                (Some(first), Some(last)) => all[first..=last].to_vec(),
                _ => return Err("Maze is empty".to_string()),
            }
        };

        let rows_count = rows.len() as i32;
        let cols_count = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as i32;

        let mut grid = Grid::new(rows_count, cols_count);
        let mut pellets = HashSet::new();
        let mut power_pellets = HashSet::new();
        let mut agent_spawn = None;
        let mut enemy_spawns = Vec::new();

        for (y, line) in rows.iter().enumerate() {
            let mut chars = line.chars();
            for x in 0..cols_count {
                let cell = Cell::new(x, y as i32);
                match chars.next().unwrap_or('#') {
                    '#' => grid.set_cell(cell.x, cell.y, 1),
                    '.' => {
                        pellets.insert(cell);
                    }
                    'o' | 'O' => {
                        power_pellets.insert(cell);
                    }
                    'P' => {
                        if agent_spawn.is_none() {
                            agent_spawn = Some(cell);
                        } else {
                            pellets.insert(cell);
                        }
                    }
                    'G' | 'E' => enemy_spawns.push(cell),
                    ' ' => {}
                    other => {
                        return Err(format!("Unknown maze character '{}' at row {}, col {}", other, y, x));
                    }
                }
            }
        }

        let agent_spawn = agent_spawn.ok_or_else(|| "Maze has no agent spawn 'P'".to_string())?;
        // Layout load is not a cell edit
        grid.revision = 0;

        Ok(Maze {
            grid,
            pellets,
            power_pellets,
            agent_spawn,
            enemy_spawns,
        })
    }

    /// Load a maze from a text file
    pub fn load(path: impl AsRef<Path>) -> Result<Maze, String> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read maze file {}: {}", path.display(), e))?;
        Self::parse(&text)
    }

    /// The built-in layout
    pub fn default_maze() -> Result<Maze, String> {
        Self::from_lines(DEFAULT_MAZE)
    }

    /// Pellets and power pellets together
    pub fn all_collectibles(&self) -> HashSet<Cell> {
        self.pellets.union(&self.power_pellets).copied().collect()
    }
}
