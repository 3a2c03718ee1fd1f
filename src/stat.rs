use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct Stats {
    pub costs: usize,
    pub time_ms: usize,
    pub low_level_expand_nodes: usize,
    pub high_level_expand_nodes: usize,
    pub timesteps: usize,
    pub retries: usize,
}

impl Stats {
    pub fn print(&self, solver: &str) {
        info!(
            "{solver}: Cost {:?} Time(microseconds) {:?} High level expand nodes number: {:?} Low level expand nodes number {:?} Timesteps {:?} Retries {:?}",
            self.costs,
            self.time_ms,
            self.high_level_expand_nodes,
            self.low_level_expand_nodes,
            self.timesteps,
            self.retries
        );
    }
}
