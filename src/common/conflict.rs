use super::{Constraint, Path};

use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConflictType {
    Vertex {
        position: (usize, usize),
        time_step: usize,
    },
    // `agent_1` moves `u -> v` while `agent_2` moves `v -> u`, arriving at
    // `time_step`.
    Edge {
        u: (usize, usize),
        v: (usize, usize),
        time_step: usize,
    },
    // `agent_1` is parked on `position`; `agent_2` is there at `time_step`.
    Stopping {
        position: (usize, usize),
        time_step: usize,
    },
    // `agent_1` holds `position` at `leader_time`, `agent_2` one step
    // before or after at `follower_time`.
    Following {
        position: (usize, usize),
        leader_time: usize,
        follower_time: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Conflict {
    pub agent_1: usize,
    pub agent_2: usize,
    pub conflict_type: ConflictType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectMode {
    First,
    All,
}

// Scan a joint solution for conflicts. Classes are checked in a fixed order
// (vertex, edge, stopping, following), each over all agent pairs.
pub fn detect_conflicts(paths: &[Path], mode: DetectMode) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    let checks: [fn(&[Path], &mut Vec<Conflict>, DetectMode); 4] = [
        vertex_conflicts,
        edge_conflicts,
        stopping_conflicts,
        following_conflicts,
    ];

    for check in checks {
        check(paths, &mut conflicts, mode);
        if mode == DetectMode::First && !conflicts.is_empty() {
            conflicts.truncate(1);
            break;
        }
    }

    trace!("detect conflicts: {conflicts:?}");
    conflicts
}

fn vertex_conflicts(paths: &[Path], conflicts: &mut Vec<Conflict>, mode: DetectMode) {
    for i in 0..paths.len() {
        for j in (i + 1)..paths.len() {
            let min_length = paths[i].len().min(paths[j].len());
            for t in 0..min_length {
                if paths[i][t].position == paths[j][t].position {
                    conflicts.push(Conflict {
                        agent_1: i,
                        agent_2: j,
                        conflict_type: ConflictType::Vertex {
                            position: paths[i][t].position,
                            time_step: t,
                        },
                    });
                    if mode == DetectMode::First {
                        return;
                    }
                }
            }
        }
    }
}

fn edge_conflicts(paths: &[Path], conflicts: &mut Vec<Conflict>, mode: DetectMode) {
    for i in 0..paths.len() {
        for j in (i + 1)..paths.len() {
            let (path1, path2) = (&paths[i], &paths[j]);
            let min_length = path1.len().min(path2.len());
            for t in 1..min_length {
                let (prev1, pos1) = (path1[t - 1].position, path1[t].position);
                let (prev2, pos2) = (path2[t - 1].position, path2[t].position);
                if prev1 != pos1 && prev1 == pos2 && prev2 == pos1 {
                    conflicts.push(Conflict {
                        agent_1: i,
                        agent_2: j,
                        conflict_type: ConflictType::Edge {
                            u: prev1,
                            v: prev2,
                            time_step: t,
                        },
                    });
                    if mode == DetectMode::First {
                        return;
                    }
                }
            }
        }
    }
}

fn stopping_conflicts(paths: &[Path], conflicts: &mut Vec<Conflict>, mode: DetectMode) {
    for (i, parked) in paths.iter().enumerate() {
        let Some(rest) = parked.last() else {
            continue;
        };
        for (j, other) in paths.iter().enumerate() {
            if i == j {
                continue;
            }
            for t in parked.len()..other.len() {
                if other[t].position == rest.position {
                    conflicts.push(Conflict {
                        agent_1: i,
                        agent_2: j,
                        conflict_type: ConflictType::Stopping {
                            position: rest.position,
                            time_step: t,
                        },
                    });
                    if mode == DetectMode::First {
                        return;
                    }
                }
            }
        }
    }
}

fn following_conflicts(paths: &[Path], conflicts: &mut Vec<Conflict>, mode: DetectMode) {
    for i in 0..paths.len() {
        for j in (i + 1)..paths.len() {
            let (path1, path2) = (&paths[i], &paths[j]);
            let min_length = path1.len().min(path2.len());
            for t in 0..min_length {
                let position = path1[t].position;

                // i steps onto the cell j left one step earlier.
                if t > 0 && path2[t - 1].position == position {
                    conflicts.push(Conflict {
                        agent_1: j,
                        agent_2: i,
                        conflict_type: ConflictType::Following {
                            position,
                            leader_time: t - 1,
                            follower_time: t,
                        },
                    });
                    if mode == DetectMode::First {
                        return;
                    }
                }

                // j steps onto the cell i is leaving.
                if t + 1 < path2.len() && path2[t + 1].position == position {
                    conflicts.push(Conflict {
                        agent_1: i,
                        agent_2: j,
                        conflict_type: ConflictType::Following {
                            position,
                            leader_time: t,
                            follower_time: t + 1,
                        },
                    });
                    if mode == DetectMode::First {
                        return;
                    }
                }
            }
        }
    }
}

pub fn generate_constraints(conflict: &Conflict) -> [Constraint; 2] {
    let (a1, a2) = (conflict.agent_1, conflict.agent_2);
    match conflict.conflict_type {
        ConflictType::Vertex {
            position,
            time_step,
        } => [
            Constraint::vertex(a1, position, time_step),
            Constraint::vertex(a2, position, time_step),
        ],
        ConflictType::Edge { u, v, time_step } => [
            Constraint::edge(a1, v, time_step),
            Constraint::edge(a2, u, time_step),
        ],
        ConflictType::Stopping {
            position,
            time_step,
        } => [
            Constraint::stopping(a2, position, time_step),
            Constraint::stopping(a1, position, time_step),
        ],
        ConflictType::Following {
            position,
            leader_time,
            follower_time,
        } => [
            Constraint::following(a2, position, follower_time),
            Constraint::following(a1, position, leader_time),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{ConstraintKind, Direction, Step};

    fn path(cells: &[(usize, usize)]) -> Path {
        cells
            .iter()
            .enumerate()
            .map(|(time_step, &position)| Step {
                position,
                direction: Direction::North,
                time_step,
            })
            .collect()
    }

    #[test]
    fn test_vertex_conflict() {
        let paths = vec![path(&[(0, 0), (0, 1)]), path(&[(0, 2), (0, 1)])];
        let conflicts = detect_conflicts(&paths, DetectMode::First);
        assert_eq!(
            conflicts,
            vec![Conflict {
                agent_1: 0,
                agent_2: 1,
                conflict_type: ConflictType::Vertex {
                    position: (0, 1),
                    time_step: 1
                },
            }]
        );
    }

    #[test]
    fn test_edge_conflict() {
        let paths = vec![path(&[(0, 0), (0, 1)]), path(&[(0, 1), (0, 0)])];
        let conflicts = detect_conflicts(&paths, DetectMode::All);
        assert!(conflicts.contains(&Conflict {
            agent_1: 0,
            agent_2: 1,
            conflict_type: ConflictType::Edge {
                u: (0, 0),
                v: (0, 1),
                time_step: 1
            },
        }));

        let constraints = generate_constraints(&conflicts[0]);
        assert_eq!(constraints[0], Constraint::edge(0, (0, 1), 1));
        assert_eq!(constraints[1], Constraint::edge(1, (0, 0), 1));
    }

    #[test]
    fn test_stopping_conflict() {
        // Agent 0 parks at (0, 1) from t = 1; agent 1 crosses it at t = 2.
        let paths = vec![
            path(&[(0, 0), (0, 1)]),
            path(&[(1, 1), (1, 1), (0, 1), (0, 2)]),
        ];
        let conflicts = detect_conflicts(&paths, DetectMode::All);
        let stopping = conflicts
            .iter()
            .find(|c| matches!(c.conflict_type, ConflictType::Stopping { .. }))
            .unwrap();
        assert_eq!(stopping.agent_1, 0);
        assert_eq!(stopping.agent_2, 1);

        let constraints = generate_constraints(stopping);
        assert_eq!(constraints[0], Constraint::stopping(1, (0, 1), 2));
        assert_eq!(constraints[1], Constraint::stopping(0, (0, 1), 2));
    }

    #[test]
    fn test_following_conflict() {
        // Agent 1 trails agent 0 along the row.
        let paths = vec![
            path(&[(0, 1), (0, 2), (0, 3)]),
            path(&[(0, 0), (0, 1), (0, 2)]),
        ];
        let conflicts = detect_conflicts(&paths, DetectMode::All);
        assert!(!conflicts.is_empty());
        assert!(conflicts.iter().all(|c| matches!(
            c.conflict_type,
            ConflictType::Following { .. }
        )));

        let first = detect_conflicts(&paths, DetectMode::First);
        assert_eq!(first.len(), 1);
        assert_eq!(
            first[0],
            Conflict {
                agent_1: 0,
                agent_2: 1,
                conflict_type: ConflictType::Following {
                    position: (0, 1),
                    leader_time: 0,
                    follower_time: 1
                },
            }
        );

        let constraints = generate_constraints(&first[0]);
        assert_eq!(constraints[0], Constraint::following(1, (0, 1), 1));
        assert_eq!(constraints[1], Constraint::following(0, (0, 1), 0));
        assert!(constraints
            .iter()
            .all(|c| c.kind == ConstraintKind::Following));
    }

    #[test]
    fn test_disjoint_paths_have_no_conflicts() {
        let paths = vec![
            path(&[(0, 0), (1, 0), (2, 0)]),
            path(&[(0, 2), (1, 2), (2, 2)]),
        ];
        assert!(detect_conflicts(&paths, DetectMode::All).is_empty());
    }
}
