mod conflict;
mod constraint;
mod highlevel;
mod lowlevel;

pub use conflict::{detect_conflicts, generate_constraints, Conflict, ConflictType, DetectMode};
pub use constraint::{Constraint, ConstraintKind};
pub(crate) use highlevel::HighLevelOpenNode;
pub(crate) use lowlevel::{LowLevelOpenNode, State};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::map::Map;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Direction {
    #[default]
    North,
    South,
    West,
    East,
    Stationary,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::East => Direction::West,
            Direction::Stationary => Direction::Stationary,
        }
    }

    // Facing after taking an action tagged `requested` while facing `self`.
    // Waiting and reversing keep the current facing.
    pub fn resolve(self, requested: Direction) -> Direction {
        if requested == Direction::Stationary || requested == self.opposite() {
            self
        } else {
            requested
        }
    }

    pub fn rotation_cost(self, to: Direction) -> usize {
        if self == to {
            0
        } else if self.opposite() == to {
            1
        } else {
            2
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Step {
    pub position: (usize, usize),
    pub direction: Direction,
    pub time_step: usize,
}

pub type Path = Vec<Step>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: usize,
    pub start: (usize, usize),
    pub goal: (usize, usize),
}

impl Agent {
    pub fn verify(&self, map: &Map) -> bool {
        map.is_passable(self.start.0, self.start.1) && map.is_passable(self.goal.0, self.goal.1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub paths: Vec<Path>,
}

impl Solution {
    pub fn cost(&self) -> usize {
        self.paths.iter().map(|path| path.len()).sum()
    }

    pub fn makespan(&self) -> usize {
        self.paths.iter().map(|path| path.len()).max().unwrap_or(0)
    }

    pub fn verify(&self, map: &Map, agents: &[Agent]) -> bool {
        if self.paths.len() != agents.len() {
            debug!("solution has {} paths for {} agents", self.paths.len(), agents.len());
            return false;
        }

        for (agent, path) in agents.iter().zip(&self.paths) {
            let (Some(first), Some(last)) = (path.first(), path.last()) else {
                debug!("agent {} has an empty path", agent.id);
                return false;
            };
            if first.position != agent.start || last.position != agent.goal {
                debug!("agent {} path does not connect start and goal", agent.id);
                return false;
            }

            for (time, step) in path.iter().enumerate() {
                if step.time_step != time || !map.is_passable(step.position.0, step.position.1) {
                    debug!("agent {} has an invalid step {step:?}", agent.id);
                    return false;
                }
            }

            for window in path.windows(2) {
                let (a, b) = (window[0].position, window[1].position);
                if a.0.abs_diff(b.0) + a.1.abs_diff(b.1) > 1 {
                    debug!("agent {} jumps from {a:?} to {b:?}", agent.id);
                    return false;
                }
            }
        }

        let conflicts = detect_conflicts(&self.paths, DetectMode::All);
        let collisions: Vec<_> = conflicts
            .iter()
            .filter(|conflict| {
                matches!(
                    conflict.conflict_type,
                    ConflictType::Vertex { .. } | ConflictType::Edge { .. }
                )
            })
            .collect();
        if !collisions.is_empty() {
            debug!("solution has collisions: {collisions:?}");
            return false;
        }

        true
    }

    // Smooth out back-and-forth wobbles: when an agent is back on the cell
    // it held two steps earlier, the middle step becomes a wait there.
    // Cosmetic only; the result is not re-checked for conflicts.
    pub fn clean(&self) -> Solution {
        let mut paths = self.paths.clone();
        for path in &mut paths {
            for i in 0..path.len().saturating_sub(2) {
                let after = path[i + 2];
                if path[i].position == after.position {
                    path[i + 1].position = after.position;
                    path[i + 1].direction = after.direction;
                }
                if path[i].direction == after.direction {
                    path[i + 1].direction = after.direction;
                }
            }
        }
        Solution { paths }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(position: (usize, usize), direction: Direction, time_step: usize) -> Step {
        Step {
            position,
            direction,
            time_step,
        }
    }

    #[test]
    fn test_direction_resolve_keeps_facing_on_reverse_and_wait() {
        assert_eq!(Direction::North.resolve(Direction::South), Direction::North);
        assert_eq!(Direction::East.resolve(Direction::West), Direction::East);
        assert_eq!(Direction::East.resolve(Direction::Stationary), Direction::East);
        assert_eq!(Direction::North.resolve(Direction::East), Direction::East);
    }

    #[test]
    fn test_rotation_cost() {
        assert_eq!(Direction::North.rotation_cost(Direction::North), 0);
        assert_eq!(Direction::North.rotation_cost(Direction::South), 1);
        assert_eq!(Direction::North.rotation_cost(Direction::West), 2);
    }

    #[test]
    fn test_clean_turns_detour_into_wait() {
        let solution = Solution {
            paths: vec![vec![
                step((0, 0), Direction::North, 0),
                step((0, 1), Direction::East, 1),
                step((0, 0), Direction::East, 2),
                step((1, 0), Direction::East, 3),
            ]],
        };
        let cleaned = solution.clean();
        assert_eq!(cleaned.paths[0][1].position, (0, 0));
        assert_eq!(cleaned.paths[0][1].direction, Direction::East);
        assert_eq!(cleaned.paths[0][1].time_step, 1);
        assert_eq!(cleaned.paths[0][3], solution.paths[0][3]);
    }

    #[test]
    fn test_verify_rejects_vertex_collision() {
        let map = Map::from_grid(vec![vec![1, 1, 1]]).unwrap();
        let agents = vec![
            Agent {
                id: 0,
                start: (0, 0),
                goal: (0, 1),
            },
            Agent {
                id: 1,
                start: (0, 2),
                goal: (0, 1),
            },
        ];
        let solution = Solution {
            paths: vec![
                vec![step((0, 0), Direction::North, 0), step((0, 1), Direction::East, 1)],
                vec![step((0, 2), Direction::North, 0), step((0, 1), Direction::West, 1)],
            ],
        };
        assert!(!solution.verify(&map, &agents));
    }
}
