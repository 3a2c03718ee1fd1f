use crate::common::Direction;
use crate::error::SolverError;

#[derive(Debug, Clone)]
pub struct Tile {
    passable: bool,
    pub neighbors: Vec<((usize, usize), Direction)>, // Accessible cells, tagged with the move that reaches them
}

impl Tile {
    pub fn is_passable(&self) -> bool {
        self.passable
    }
}

#[derive(Debug, Clone)]
pub struct Map {
    pub height: usize,
    pub width: usize,
    pub grid: Vec<Vec<Tile>>,
}

impl Map {
    // Build a map from rows of tile codes; 1 is traversable, anything else
    // is blocked.
    pub fn from_grid(rows: Vec<Vec<i32>>) -> Result<Self, SolverError> {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.len());
        if height == 0 || width == 0 {
            return Err(SolverError::invalid("grid must have at least one cell"));
        }
        if let Some(row) = rows.iter().position(|row| row.len() != width) {
            return Err(SolverError::invalid(format!(
                "row {row} has {} cells, expected {width}",
                rows[row].len()
            )));
        }

        let grid = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|code| Tile {
                        passable: code == 1,
                        neighbors: Vec::new(),
                    })
                    .collect()
            })
            .collect();

        let mut map = Map {
            height,
            width,
            grid,
        };
        map.initialize_neighbors();
        Ok(map)
    }

    pub fn open(width: usize, height: usize) -> Result<Self, SolverError> {
        Self::from_grid(vec![vec![1; width]; height])
    }

    fn initialize_neighbors(&mut self) {
        for x in 0..self.height {
            for y in 0..self.width {
                if self.grid[x][y].passable {
                    self.grid[x][y].neighbors = self.compute_neighbors(x, y);
                }
            }
        }
    }

    fn compute_neighbors(&self, x: usize, y: usize) -> Vec<((usize, usize), Direction)> {
        let directions = [
            (-1, 0, Direction::North),
            (1, 0, Direction::South),
            (0, -1, Direction::West),
            (0, 1, Direction::East),
            (0, 0, Direction::Stationary),
        ];
        let mut neighbors = Vec::new();

        for &(dx, dy, direction) in &directions {
            let new_x = x as i64 + dx;
            let new_y = y as i64 + dy;
            if new_x >= 0
                && new_y >= 0
                && self.is_passable(new_x as usize, new_y as usize)
            {
                neighbors.push(((new_x as usize, new_y as usize), direction));
            }
        }

        neighbors
    }

    pub fn get_neighbors(&self, x: usize, y: usize) -> &[((usize, usize), Direction)] {
        self.grid
            .get(x)
            .and_then(|row| row.get(y))
            .map(|tile| tile.neighbors.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_passable(&self, x: usize, y: usize) -> bool {
        x < self.height && y < self.width && self.grid[x][y].is_passable()
    }

    pub fn passable_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.height)
            .flat_map(move |x| (0..self.width).map(move |y| (x, y)))
            .filter(|&(x, y)| self.is_passable(x, y))
    }
}
