mod astar;

pub use astar::a_star_search;

use std::collections::HashMap;

use crate::common::{Direction, Path, State};

type Trace = HashMap<State, State>;

pub(crate) const MOVE_COST: usize = 2;
pub(crate) const WAIT_COST: usize = 1;

pub(crate) fn manhattan_distance(a: (usize, usize), b: (usize, usize)) -> usize {
    a.0.abs_diff(b.0) + a.1.abs_diff(b.1)
}

// Cost of one transition: translation (or wait) plus re-orientation.
pub(crate) fn transition_cost(
    from: (usize, usize),
    from_direction: Direction,
    to: (usize, usize),
    to_direction: Direction,
) -> usize {
    let move_cost = if from == to { WAIT_COST } else { MOVE_COST };
    move_cost + from_direction.rotation_cost(to_direction)
}

pub fn path_cost(path: &Path) -> usize {
    path.windows(2)
        .map(|w| transition_cost(w[0].position, w[0].direction, w[1].position, w[1].direction))
        .sum()
}

fn construct_path(trace: &Trace, mut current: State) -> Path {
    let mut path = vec![current.into()];
    while let Some(&previous) = trace.get(&current) {
        path.push(previous.into());
        current = previous;
    }
    path.reverse();
    path
}
