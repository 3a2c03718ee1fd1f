use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum ConstraintKind {
    Vertex,
    Edge,
    Stopping,
    Following,
}

#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Constraint {
    pub kind: ConstraintKind,
    pub agent_id: usize,
    pub position: (usize, usize),
    pub time_step: usize,
}

impl Constraint {
    pub fn vertex(agent_id: usize, position: (usize, usize), time_step: usize) -> Self {
        Constraint {
            kind: ConstraintKind::Vertex,
            agent_id,
            position,
            time_step,
        }
    }

    pub fn edge(agent_id: usize, position: (usize, usize), time_step: usize) -> Self {
        Constraint {
            kind: ConstraintKind::Edge,
            agent_id,
            position,
            time_step,
        }
    }

    pub fn stopping(agent_id: usize, position: (usize, usize), time_step: usize) -> Self {
        Constraint {
            kind: ConstraintKind::Stopping,
            agent_id,
            position,
            time_step,
        }
    }

    pub fn following(agent_id: usize, position: (usize, usize), time_step: usize) -> Self {
        Constraint {
            kind: ConstraintKind::Following,
            agent_id,
            position,
            time_step,
        }
    }

    // Every kind forbids occupying its cell at exactly its time step.
    pub fn is_violated(&self, position: (usize, usize), time: usize) -> bool {
        position == self.position && time == self.time_step
    }

    // A stopping constraint on the agent's goal protects the cell up to and
    // including its time step, so the agent may not come to rest earlier.
    pub fn blocks_arrival(&self, goal: (usize, usize), time: usize) -> bool {
        self.kind == ConstraintKind::Stopping && goal == self.position && time <= self.time_step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_violation_is_exact_time() {
        let constraint = Constraint::vertex(0, (1, 1), 3);
        assert!(constraint.is_violated((1, 1), 3));
        assert!(!constraint.is_violated((1, 1), 2));
        assert!(!constraint.is_violated((1, 2), 3));
    }

    #[test]
    fn test_only_stopping_blocks_arrival() {
        let stopping = Constraint::stopping(0, (2, 2), 4);
        assert!(stopping.blocks_arrival((2, 2), 4));
        assert!(stopping.blocks_arrival((2, 2), 1));
        assert!(!stopping.blocks_arrival((2, 2), 5));
        assert!(!Constraint::vertex(0, (2, 2), 4).blocks_arrival((2, 2), 1));
    }
}
