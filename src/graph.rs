use std::collections::BTreeSet;

use crate::common::Direction;
use crate::map::Map;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Vertex {
    pub position: (usize, usize),
    pub direction: Direction,
}

#[derive(Debug, Clone)]
pub struct Graph {
    pub width: usize,
    pub height: usize,
    locations: BTreeSet<(usize, usize)>,
}

impl Graph {
    pub fn new(width: usize, height: usize) -> Self {
        let locations = (0..height)
            .flat_map(|x| (0..width).map(move |y| (x, y)))
            .collect();
        Graph {
            width,
            height,
            locations,
        }
    }

    pub fn from_map(map: &Map) -> Self {
        Graph {
            width: map.width,
            height: map.height,
            locations: map.passable_cells().collect(),
        }
    }

    pub fn contains(&self, position: (usize, usize)) -> bool {
        self.locations.contains(&position)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn get_neighbors(&self, position: (usize, usize)) -> Vec<Vertex> {
        let (x, y) = position;
        let moves = [
            (x.checked_sub(1).map(|x| (x, y)), Direction::North),
            (Some((x + 1, y)), Direction::South),
            (y.checked_sub(1).map(|y| (x, y)), Direction::West),
            (Some((x, y + 1)), Direction::East),
            (Some(position), Direction::Stationary),
        ];

        moves
            .into_iter()
            .filter_map(|(cell, direction)| {
                cell.filter(|&cell| self.contains(cell))
                    .map(|position| Vertex {
                        position,
                        direction,
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_graph_neighbors() {
        let graph = Graph::new(3, 2);
        assert_eq!(graph.len(), 6);
        assert!(graph.contains((1, 2)));
        assert!(!graph.contains((2, 0)));

        let neighbors = graph.get_neighbors((0, 0));
        let cells: Vec<_> = neighbors.iter().map(|v| (v.position, v.direction)).collect();
        assert_eq!(
            cells,
            vec![
                ((1, 0), Direction::South),
                ((0, 1), Direction::East),
                ((0, 0), Direction::Stationary),
            ]
        );
    }

    #[test]
    fn test_graph_from_map_skips_obstacles() {
        let map = Map::from_grid(vec![vec![1, 0], vec![1, 1]]).unwrap();
        let graph = Graph::from_map(&map);
        assert_eq!(graph.len(), 3);
        assert!(!graph.contains((0, 1)));
        assert_eq!(graph.get_neighbors((0, 0)).len(), 2);
    }
}
