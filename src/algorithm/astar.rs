use super::{construct_path, manhattan_distance, transition_cost};
use crate::common::{Constraint, Direction, LowLevelOpenNode, Path, State};
use crate::map::Map;
use crate::stat::Stats;

use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, instrument, trace};

/// Time-expanded A* over (position, facing, time) for a single agent.
///
/// `constraints` must already be filtered down to the agent being planned.
/// Returns `None` when no path satisfies them.
#[instrument(skip_all, name = "a_star", fields(start = ?start, goal = ?goal), level = "debug")]
pub fn a_star_search(
    map: &Map,
    start: (usize, usize),
    goal: (usize, usize),
    constraints: &[Constraint],
    stats: &mut Stats,
) -> Option<Path> {
    if !map.is_passable(start.0, start.1) || !map.is_passable(goal.0, goal.1) {
        debug!("start or goal is not traversable");
        return None;
    }

    // The agent cannot leave its start before time 0.
    if constraints.iter().any(|c| c.is_violated(start, 0)) {
        debug!("start is forbidden at time 0");
        return None;
    }

    let constraint_limit_time_step = constraints
        .iter()
        .map(|constraint| constraint.time_step)
        .max()
        .unwrap_or(0);
    debug!("constraints: {constraints:?}, limit time step: {constraint_limit_time_step:?}");

    let mut open_list = BTreeSet::new();
    let mut closed_list = HashSet::new();
    let mut g_costs = HashMap::new();
    let mut trace = HashMap::new();

    let start_state = State {
        position: start,
        direction: Direction::default(),
        time_step: 0,
    };
    g_costs.insert(start_state.key(constraint_limit_time_step), 0);
    open_list.insert(LowLevelOpenNode {
        state: start_state,
        f_open_cost: manhattan_distance(start, goal),
        g_cost: 0,
    });

    while let Some(current) = open_list.pop_first() {
        if !closed_list.insert(current.state.key(constraint_limit_time_step)) {
            continue;
        }
        trace!("expand node: {current:?}");

        // Update stats.
        stats.low_level_expand_nodes += 1;

        if current.state.position == goal
            && !constraints
                .iter()
                .any(|c| c.blocks_arrival(goal, current.state.time_step))
        {
            return Some(construct_path(&trace, current.state));
        }

        let tentative_time_step = current.state.time_step + 1;
        let (x, y) = current.state.position;

        for &(neighbor, requested) in map.get_neighbors(x, y) {
            // Check for constraints before exploring the neighbor.
            if constraints
                .iter()
                .any(|constraint| constraint.is_violated(neighbor, tentative_time_step))
            {
                continue;
            }

            let direction = current.state.direction.resolve(requested);
            let next = State {
                position: neighbor,
                direction,
                time_step: tentative_time_step,
            };
            let next_key = next.key(constraint_limit_time_step);
            if closed_list.contains(&next_key) {
                continue;
            }

            let tentative_g_cost = current.g_cost
                + transition_cost(
                    current.state.position,
                    current.state.direction,
                    neighbor,
                    direction,
                );
            if tentative_g_cost < *g_costs.get(&next_key).unwrap_or(&usize::MAX) {
                g_costs.insert(next_key, tentative_g_cost);
                trace.insert(next, current.state);
                open_list.insert(LowLevelOpenNode {
                    state: next,
                    f_open_cost: tentative_g_cost + manhattan_distance(neighbor, goal),
                    g_cost: tentative_g_cost,
                });
            }
        }
    }

    debug!("cannot find solution");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::path_cost;

    // Helper function to setup tracing
    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    }

    fn corridor() -> Map {
        Map::from_grid(vec![vec![0; 5], vec![1; 5], vec![0; 5]]).unwrap()
    }

    #[test]
    fn test_a_star_open_grid_diagonal() {
        init_tracing();
        let map = Map::open(6, 6).unwrap();
        let stats = &mut Stats::default();
        let path = a_star_search(&map, (0, 0), (5, 5), &[], stats).unwrap();
        debug!("{path:?}");

        assert_eq!(path.len(), 11);
        for (time, step) in path.iter().enumerate() {
            assert_eq!(step.time_step, time);
        }
        for window in path.windows(2) {
            assert_eq!(
                manhattan_distance(window[0].position, (5, 5)),
                manhattan_distance(window[1].position, (5, 5)) + 1
            );
        }
        // Heading south keeps the initial north facing, so only one turn.
        assert_eq!(path_cost(&path), 22);
        assert!(stats.low_level_expand_nodes > 0);
    }

    #[test]
    fn test_a_star_is_deterministic() {
        let map = Map::open(6, 6).unwrap();
        let first = a_star_search(&map, (4, 1), (0, 5), &[], &mut Stats::default()).unwrap();
        let second = a_star_search(&map, (4, 1), (0, 5), &[], &mut Stats::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_a_star_start_is_goal() {
        let map = Map::open(3, 3).unwrap();
        let path = a_star_search(&map, (1, 1), (1, 1), &[], &mut Stats::default()).unwrap();
        assert_eq!(path.len(), 1);
        assert_eq!(path[0].position, (1, 1));
        assert_eq!(path[0].time_step, 0);
    }

    #[test]
    fn test_a_star_vertex_constraint_forces_wait() {
        init_tracing();
        let map = corridor();
        let constraints = [Constraint::vertex(0, (1, 1), 3)];
        let stats = &mut Stats::default();

        let free = a_star_search(&map, (1, 4), (1, 0), &[], stats).unwrap();
        assert!(free
            .iter()
            .any(|step| step.position == (1, 1) && step.time_step == 3));

        let path = a_star_search(&map, (1, 4), (1, 0), &constraints, stats).unwrap();
        debug!("{path:?}");
        assert_eq!(path.len(), 6);
        assert!(!path
            .iter()
            .any(|step| step.position == (1, 1) && step.time_step == 3));
    }

    #[test]
    fn test_a_star_edge_and_following_constraints() {
        let map = corridor();
        let constraints = [
            Constraint::edge(0, (1, 3), 1),
            Constraint::following(0, (1, 2), 3),
        ];
        let path = a_star_search(&map, (1, 4), (1, 0), &constraints, &mut Stats::default())
            .unwrap();
        for constraint in &constraints {
            assert!(!path
                .iter()
                .any(|step| constraint.is_violated(step.position, step.time_step)));
        }
        assert!(path.len() > 5);
    }

    #[test]
    fn test_a_star_stopping_constraint_delays_arrival() {
        let map = Map::open(3, 1).unwrap();
        let constraints = [Constraint::stopping(0, (0, 1), 3)];
        let path = a_star_search(&map, (0, 0), (0, 1), &constraints, &mut Stats::default())
            .unwrap();
        debug!("{path:?}");

        assert_eq!(path.len(), 5);
        assert_eq!(path.last().unwrap().position, (0, 1));
        assert!(!path
            .iter()
            .any(|step| step.position == (0, 1) && step.time_step == 3));
    }

    #[test]
    fn test_a_star_respects_obstacles() {
        let map = Map::from_grid(vec![
            vec![1, 1, 1, 1],
            vec![0, 0, 0, 1],
            vec![1, 1, 1, 1],
            vec![1, 0, 0, 0],
        ])
        .unwrap();
        let constraints = [Constraint::vertex(0, (0, 3), 3), Constraint::vertex(0, (2, 2), 6)];
        let path = a_star_search(&map, (0, 0), (3, 0), &constraints, &mut Stats::default())
            .unwrap();
        assert_eq!(path.last().unwrap().position, (3, 0));
        for step in &path {
            assert!(map.is_passable(step.position.0, step.position.1));
        }
    }

    #[test]
    fn test_a_star_not_found() {
        let map = Map::from_grid(vec![vec![1, 0, 1]]).unwrap();
        assert!(a_star_search(&map, (0, 0), (0, 2), &[], &mut Stats::default()).is_none());

        // Blocked endpoints.
        assert!(a_star_search(&map, (0, 1), (0, 0), &[], &mut Stats::default()).is_none());

        // Start forbidden at time 0.
        let constraints = [Constraint::following(0, (0, 0), 0)];
        assert!(a_star_search(&map, (0, 0), (0, 0), &constraints, &mut Stats::default()).is_none());
    }
}
