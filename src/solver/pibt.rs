use super::{validate_endpoints, Solver};
use crate::algorithm::manhattan_distance;
use crate::common::{Agent, Direction, Path, Solution, Step};
use crate::config::Config;
use crate::error::SolverError;
use crate::graph::{Graph, Vertex};
use crate::map::Map;
use crate::stat::Stats;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::{debug, error, info, instrument, trace};

#[derive(Debug, Clone)]
pub struct PibtAgent {
    pub id: usize,
    pub v_now: (usize, usize),
    pub v_next: Option<Vertex>,
    pub start: (usize, usize),
    pub goal: (usize, usize),
    pub priority: f64,
    pub reached_goal: bool,
    pub current_direction: Direction,
    pub path: Path,
}

#[derive(Debug)]
pub struct PibtPlanner {
    graph: Graph,
    agents: Vec<PibtAgent>, // Indexed by agent id
    order: Vec<usize>,      // Agent ids, highest priority first
    occupied: HashMap<(usize, usize), usize>,
    timestep: usize,
    max_timesteps: usize,
    done: bool,
    failed: bool,
}

impl PibtPlanner {
    pub fn new(
        width: usize,
        height: usize,
        starts: &[(usize, usize)],
        goals: &[(usize, usize)],
    ) -> Result<Self, SolverError> {
        let mut rng = StdRng::from_entropy();
        Self::with_graph(Graph::new(width, height), starts, goals, &mut rng)
    }

    pub fn with_graph<R: Rng + ?Sized>(
        graph: Graph,
        starts: &[(usize, usize)],
        goals: &[(usize, usize)],
        rng: &mut R,
    ) -> Result<Self, SolverError> {
        validate_endpoints(starts, goals, |cell| graph.contains(cell))?;

        let num_agents = starts.len();
        let mut priorities: Vec<f64> = (0..num_agents)
            .map(|i| i as f64 / num_agents as f64)
            .collect();
        priorities.shuffle(rng);

        let agents = starts
            .iter()
            .zip(goals)
            .zip(priorities)
            .enumerate()
            .map(|(id, ((&start, &goal), priority))| PibtAgent {
                id,
                v_now: start,
                v_next: None,
                start,
                goal,
                priority,
                reached_goal: start == goal,
                current_direction: Direction::default(),
                path: vec![Step {
                    position: start,
                    direction: Direction::default(),
                    time_step: 0,
                }],
            })
            .collect();

        let max_timesteps = num_agents * graph.width.max(graph.height) * 10;
        Ok(PibtPlanner {
            graph,
            agents,
            order: (0..num_agents).collect(),
            occupied: HashMap::new(),
            timestep: 0,
            max_timesteps,
            done: false,
            failed: false,
        })
    }

    pub fn agents(&self) -> &[PibtAgent] {
        &self.agents
    }

    pub fn timestep(&self) -> usize {
        self.timestep
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Advance one timestep. Returns `Ok(true)` once every agent stands on
    /// its goal; the paths are then complete.
    pub fn step(&mut self) -> Result<bool, SolverError> {
        if self.done {
            return Ok(true);
        }
        if self.failed {
            return Err(self.budget_exceeded());
        }

        // Apply the moves chosen last step.
        let timestep = self.timestep;
        for agent in &mut self.agents {
            if let Some(next) = agent.v_next.take() {
                agent.current_direction = agent.current_direction.resolve(next.direction);
                agent.v_now = next.position;
                agent.path.push(Step {
                    position: next.position,
                    direction: agent.current_direction,
                    time_step: timestep,
                });
            }
        }
        self.occupied = self
            .agents
            .iter()
            .map(|agent| (agent.v_now, agent.id))
            .collect();

        // Done only once the configuration just reached has everyone home.
        for agent in &mut self.agents {
            agent.reached_goal = agent.v_now == agent.goal;
        }
        if self.agents.iter().all(|agent| agent.reached_goal) {
            debug!("all agents reached their goals at timestep {timestep}");
            self.done = true;
            return Ok(true);
        }

        // Agents still travelling gain priority.
        for agent in &mut self.agents {
            if !agent.reached_goal {
                agent.priority += 1.0;
            }
        }
        let agents = &self.agents;
        self.order
            .sort_by(|&a, &b| agents[b].priority.total_cmp(&agents[a].priority));

        // Highest priority chooses first.
        for index in 0..self.order.len() {
            let id = self.order[index];
            let agent = &self.agents[id];
            if agent.v_next.is_none() && !agent.reached_goal {
                let mut in_progress = HashSet::new();
                self.negotiate(id, None, &mut in_progress);
            }
        }

        // Whoever is still unassigned waits.
        for agent in &mut self.agents {
            if agent.v_next.is_none() {
                agent.v_next = Some(stay(agent.v_now));
            }
        }

        self.timestep += 1;
        if self.timestep > self.max_timesteps {
            error!("no feasible plan found under PIBT");
            self.failed = true;
            return Err(self.budget_exceeded());
        }
        Ok(false)
    }

    #[instrument(skip_all, name = "pibt", fields(agents = self.agents.len()), level = "debug")]
    pub fn run(&mut self) -> Result<Vec<Path>, SolverError> {
        while !self.step()? {}
        Ok(self.agents.iter().map(|agent| agent.path.clone()).collect())
    }

    // Let `ai` pick its next vertex, pushing lower-priority occupants out of
    // the way. `aj` is the agent that pushed `ai`, if any.
    fn negotiate(&mut self, ai: usize, aj: Option<usize>, in_progress: &mut HashSet<usize>) -> bool {
        if !in_progress.insert(ai) {
            trace!("agent {ai} is already negotiating");
            return false;
        }

        // Inherit the pusher's priority for the duration of this call.
        let saved_priority = self.agents[ai].priority;
        if let Some(aj) = aj {
            self.agents[ai].priority = saved_priority.max(self.agents[aj].priority);
        }

        let result = self.try_candidates(ai, aj, in_progress);

        self.agents[ai].priority = saved_priority;
        in_progress.remove(&ai);
        result
    }

    fn try_candidates(
        &mut self,
        ai: usize,
        aj: Option<usize>,
        in_progress: &mut HashSet<usize>,
    ) -> bool {
        let v_now = self.agents[ai].v_now;
        let goal = self.agents[ai].goal;
        let mut candidates = self.graph.get_neighbors(v_now);
        candidates.sort_by_key(|vertex| manhattan_distance(vertex.position, goal));

        for candidate in candidates {
            let u = candidate.position;
            if self.is_reserved(u, ai) {
                continue;
            }
            if aj.is_some_and(|aj| self.agents[aj].v_now == u) {
                continue;
            }

            let Some(ak) = self.occupied.get(&u).copied().filter(|&ak| ak != ai) else {
                self.agents[ai].v_next = Some(candidate);
                return true;
            };
            if self.agents[ak].priority >= self.agents[ai].priority
                || self.agents[ak].v_next.is_some()
            {
                continue;
            }

            // Hold `u` while `ak` looks for somewhere else to go.
            self.agents[ai].v_next = Some(candidate);
            if self.negotiate(ak, Some(ai), in_progress) {
                // Moving into a cell as it is vacated is not allowed.
                self.agents[ai].v_next = Some(stay(v_now));
                return true;
            }
            self.agents[ai].v_next = None;
        }

        self.agents[ai].v_next = Some(stay(v_now));
        false
    }

    fn is_reserved(&self, position: (usize, usize), by_other_than: usize) -> bool {
        self.agents.iter().any(|agent| {
            agent.id != by_other_than && agent.v_next.is_some_and(|next| next.position == position)
        })
    }

    fn budget_exceeded(&self) -> SolverError {
        SolverError::BudgetExceeded {
            what: "PIBT timestep",
            limit: self.max_timesteps,
        }
    }
}

fn stay(position: (usize, usize)) -> Vertex {
    Vertex {
        position,
        direction: Direction::Stationary,
    }
}

// PIBT solver that restarts with fresh random priorities when a run
// exhausts its timestep budget.
pub struct PIBT {
    agents: Vec<Agent>,
    graph: Graph,
    max_retries: usize,
    rng: StdRng,
    stats: Stats,
}

impl PIBT {
    pub fn new(agents: Vec<Agent>, map: &Map, config: &Config) -> Result<Self, SolverError> {
        let graph = Graph::from_map(map);
        let starts: Vec<_> = agents.iter().map(|agent| agent.start).collect();
        let goals: Vec<_> = agents.iter().map(|agent| agent.goal).collect();
        validate_endpoints(&starts, &goals, |cell| graph.contains(cell))?;

        Ok(PIBT {
            agents,
            graph,
            max_retries: config.pibt_max_retries,
            rng: StdRng::seed_from_u64(config.seed),
            stats: Stats::default(),
        })
    }
}

impl Solver for PIBT {
    fn solve(&mut self) -> Result<Solution, SolverError> {
        let total_solve_start_time = Instant::now();
        let starts: Vec<_> = self.agents.iter().map(|agent| agent.start).collect();
        let goals: Vec<_> = self.agents.iter().map(|agent| agent.goal).collect();

        for attempt in 0..self.max_retries {
            let mut planner =
                PibtPlanner::with_graph(self.graph.clone(), &starts, &goals, &mut self.rng)?;
            self.stats.retries = attempt;

            match planner.run() {
                Ok(paths) => {
                    self.stats.timesteps = planner.timestep();
                    self.stats.time_ms = total_solve_start_time.elapsed().as_micros() as usize;
                    let solution = Solution { paths };
                    self.stats.costs = solution.cost();
                    return Ok(solution);
                }
                Err(SolverError::BudgetExceeded { .. }) => {
                    info!("pibt attempt {attempt} ran out of timesteps, retrying");
                }
                Err(err) => return Err(err),
            }
        }

        error!("no feasible plan found under PIBT");
        Err(SolverError::BudgetExceeded {
            what: "PIBT retry",
            limit: self.max_retries,
        })
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}
