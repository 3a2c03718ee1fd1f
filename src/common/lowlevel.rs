use super::{Direction, Step};

use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct State {
    pub(crate) position: (usize, usize),
    pub(crate) direction: Direction,
    pub(crate) time_step: usize,
}

impl State {
    // Past the last constrained time step, states differing only in time
    // are interchangeable, so they share one key.
    pub(crate) fn key(&self, constraint_limit_time_step: usize) -> State {
        State {
            time_step: self.time_step.min(constraint_limit_time_step + 1),
            ..*self
        }
    }
}

impl From<State> for Step {
    fn from(state: State) -> Self {
        Step {
            position: state.position,
            direction: state.direction,
            time_step: state.time_step,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct LowLevelOpenNode {
    pub(crate) state: State,
    pub(crate) f_open_cost: usize,
    pub(crate) g_cost: usize,
}

impl Ord for LowLevelOpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_open_cost
            .cmp(&other.f_open_cost)
            // Higher g cost has higher priority
            .then_with(|| other.g_cost.cmp(&self.g_cost))
            .then_with(|| self.state.cmp(&other.state))
    }
}

impl PartialOrd for LowLevelOpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
