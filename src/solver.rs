mod cbs;
mod pibt;

pub use cbs::{cbs_solve, CBS};
pub use pibt::{PibtAgent, PibtPlanner, PIBT};

use std::collections::HashSet;

use crate::common::Solution;
use crate::error::SolverError;
use crate::stat::Stats;

pub trait Solver {
    fn solve(&mut self) -> Result<Solution, SolverError>;

    fn stats(&self) -> &Stats;
}

// Reject endpoint sets that no solver can work with: mismatched counts,
// cells rejected by `is_valid`, or two agents sharing a start or a goal.
pub(crate) fn validate_endpoints(
    starts: &[(usize, usize)],
    goals: &[(usize, usize)],
    is_valid: impl Fn((usize, usize)) -> bool,
) -> Result<(), SolverError> {
    if starts.len() != goals.len() {
        return Err(SolverError::invalid(format!(
            "{} starts but {} goals",
            starts.len(),
            goals.len()
        )));
    }

    for (agent, (&start, &goal)) in starts.iter().zip(goals).enumerate() {
        if !is_valid(start) {
            return Err(SolverError::invalid(format!(
                "agent {agent} start {start:?} is blocked or out of bounds"
            )));
        }
        if !is_valid(goal) {
            return Err(SolverError::invalid(format!(
                "agent {agent} goal {goal:?} is blocked or out of bounds"
            )));
        }
    }

    let mut seen = HashSet::new();
    if let Some(start) = starts.iter().find(|&&start| !seen.insert(start)) {
        return Err(SolverError::invalid(format!("duplicate start {start:?}")));
    }
    seen.clear();
    if let Some(goal) = goals.iter().find(|&&goal| !seen.insert(goal)) {
        return Err(SolverError::invalid(format!("duplicate goal {goal:?}")));
    }

    Ok(())
}
