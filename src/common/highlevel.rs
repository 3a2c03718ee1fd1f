use super::{Agent, Constraint, Path};
use crate::algorithm::{a_star_search, path_cost};
use crate::map::Map;
use crate::stat::Stats;

use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Clone, Eq, PartialEq, Debug)]
pub(crate) struct HighLevelOpenNode {
    pub(crate) constraints: BTreeSet<Constraint>,
    pub(crate) paths: Vec<Path>, // Indexed by agent position in the instance
    pub(crate) cost: usize,      // Sum of path lengths
    pub(crate) g_cost: usize,    // Sum of low-level move and rotation costs
}

impl Ord for HighLevelOpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .cmp(&other.cost)
            .then_with(|| self.g_cost.cmp(&other.g_cost))
            .then_with(|| self.constraints.len().cmp(&other.constraints.len()))
            // Two distinct nodes must never compare equal inside the frontier.
            .then_with(|| self.paths.cmp(&other.paths))
            .then_with(|| self.constraints.cmp(&other.constraints))
    }
}

impl PartialOrd for HighLevelOpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl HighLevelOpenNode {
    pub(crate) fn new(agents: &[Agent], map: &Map, stats: &mut Stats) -> Option<Self> {
        let mut paths = Vec::with_capacity(agents.len());
        for agent in agents {
            let Some(path) = a_star_search(map, agent.start, agent.goal, &[], stats) else {
                debug!("agent {} has no path at the root", agent.id);
                return None;
            };
            paths.push(path);
        }

        let cost = paths.iter().map(|path| path.len()).sum();
        let g_cost = paths.iter().map(path_cost).sum();
        Some(HighLevelOpenNode {
            constraints: BTreeSet::new(),
            paths,
            cost,
            g_cost,
        })
    }

    // Child node with one more constraint; only the constrained agent is
    // replanned. `None` if the constraint is already present or the agent
    // can no longer reach its goal.
    pub(crate) fn update_constraint(
        &self,
        constraint: Constraint,
        agents: &[Agent],
        map: &Map,
        stats: &mut Stats,
    ) -> Option<HighLevelOpenNode> {
        let agent_to_update = constraint.agent_id;
        let agent = agents.get(agent_to_update)?;

        let mut new_constraints = self.constraints.clone();
        if !new_constraints.insert(constraint) {
            debug!("constraint {constraint:?} already present");
            return None;
        }

        let agent_constraints: Vec<Constraint> = new_constraints
            .iter()
            .filter(|c| c.agent_id == agent_to_update)
            .copied()
            .collect();
        let new_path = a_star_search(map, agent.start, agent.goal, &agent_constraints, stats)?;
        debug!("update agent {agent_to_update:?} with path {new_path:?} for {constraint:?}");

        let old_path = &self.paths[agent_to_update];
        let new_cost = self.cost - old_path.len() + new_path.len();
        let new_g_cost = self.g_cost - path_cost(old_path) + path_cost(&new_path);

        let mut new_paths = self.paths.clone();
        new_paths[agent_to_update] = new_path;

        Some(HighLevelOpenNode {
            constraints: new_constraints,
            paths: new_paths,
            cost: new_cost,
            g_cost: new_g_cost,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agents() -> Vec<Agent> {
        vec![
            Agent {
                id: 0,
                start: (1, 0),
                goal: (1, 2),
            },
            Agent {
                id: 1,
                start: (0, 1),
                goal: (2, 1),
            },
        ]
    }

    #[test]
    fn test_root_and_child() {
        let map = Map::open(3, 3).unwrap();
        let agents = agents();
        let stats = &mut Stats::default();
        let root = HighLevelOpenNode::new(&agents, &map, stats).unwrap();
        assert_eq!(root.cost, 6);
        assert!(root.constraints.is_empty());

        let constraint = Constraint::vertex(0, (1, 1), 1);
        let child = root
            .update_constraint(constraint, &agents, &map, stats)
            .unwrap();
        assert_eq!(child.paths[1], root.paths[1]);
        assert!(child.cost > root.cost);
        assert!(child.g_cost >= root.g_cost);
        assert!(root < child);

        // Same constraint twice is a dead branch.
        assert!(child
            .update_constraint(constraint, &agents, &map, stats)
            .is_none());
    }
}
