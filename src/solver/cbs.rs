use super::{validate_endpoints, Solver};
use crate::common::{
    detect_conflicts, generate_constraints, Agent, DetectMode, HighLevelOpenNode, Path, Solution,
};
use crate::config::Config;
use crate::error::SolverError;
use crate::map::Map;
use crate::stat::Stats;

use std::collections::{BTreeSet, HashSet};
use std::time::Instant;
use tracing::{debug, info};

pub struct CBS {
    agents: Vec<Agent>,
    map: Map,
    pruning: bool,
    max_expansions: usize,
    stats: Stats,
}

impl CBS {
    pub fn new(agents: Vec<Agent>, map: &Map, config: &Config) -> Result<Self, SolverError> {
        let starts: Vec<_> = agents.iter().map(|agent| agent.start).collect();
        let goals: Vec<_> = agents.iter().map(|agent| agent.goal).collect();
        validate_endpoints(&starts, &goals, |(x, y)| map.is_passable(x, y))?;

        // Constraints address agents by their position in the instance.
        let agents = agents
            .into_iter()
            .enumerate()
            .map(|(id, agent)| Agent { id, ..agent })
            .collect();

        Ok(CBS {
            agents,
            map: map.clone(),
            pruning: config.pruning,
            max_expansions: config.max_expansions,
            stats: Stats::default(),
        })
    }
}

impl Solver for CBS {
    fn solve(&mut self) -> Result<Solution, SolverError> {
        let total_solve_start_time = Instant::now();
        let mut open = BTreeSet::new();
        let mut closed: HashSet<BTreeSet<_>> = HashSet::new();
        let mut pops = 0;

        let root = HighLevelOpenNode::new(&self.agents, &self.map, &mut self.stats)
            .ok_or(SolverError::Infeasible)?;
        open.insert(root);

        while let Some(current_node) = open.pop_first() {
            pops += 1;
            if pops > self.max_expansions {
                info!("cbs gives up after {} node pops", self.max_expansions);
                return Err(SolverError::BudgetExceeded {
                    what: "CBS expansion",
                    limit: self.max_expansions,
                });
            }

            if self.pruning && !closed.insert(current_node.constraints.clone()) {
                continue;
            }
            self.stats.high_level_expand_nodes += 1;

            let conflicts = detect_conflicts(&current_node.paths, DetectMode::First);
            let Some(conflict) = conflicts.first() else {
                // No conflicts, return solution.
                let total_solve_time = total_solve_start_time.elapsed();
                self.stats.time_ms = total_solve_time.as_micros() as usize;
                self.stats.costs = current_node.cost;
                return Ok(Solution {
                    paths: current_node.paths,
                });
            };
            debug!("conflict: {conflict:?}");

            for constraint in generate_constraints(conflict) {
                if let Some(child) = current_node.update_constraint(
                    constraint,
                    &self.agents,
                    &self.map,
                    &mut self.stats,
                ) {
                    open.insert(child);
                }
            }
        }

        debug!("constraint tree exhausted");
        Err(SolverError::Infeasible)
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}

/// Plan conflict-free paths for `sources[i] -> destinations[i]` on `map`.
///
/// Any failure (invalid input, infeasible instance, exhausted budget) is
/// reported as `None`.
pub fn cbs_solve(
    sources: &[(usize, usize)],
    destinations: &[(usize, usize)],
    map: &Map,
    pruning: bool,
) -> Option<Vec<Path>> {
    if sources.len() != destinations.len() {
        return None;
    }

    let agents = sources
        .iter()
        .zip(destinations)
        .enumerate()
        .map(|(id, (&start, &goal))| Agent { id, start, goal })
        .collect();
    let config = Config {
        pruning,
        ..Config::default()
    };

    let mut solver = CBS::new(agents, map, &config).ok()?;
    match solver.solve() {
        Ok(solution) => Some(solution.paths),
        Err(err) => {
            debug!("cbs failed: {err}");
            None
        }
    }
}
