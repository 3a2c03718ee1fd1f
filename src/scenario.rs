use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, Write};
use tracing::info;

use crate::common::Agent;
use crate::map::Map;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub start: (usize, usize),
    pub goal: (usize, usize),
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Scenario {
    pub grid: Vec<Vec<i32>>,
    pub agents: Vec<Route>,
}

impl Scenario {
    pub fn load_from_file(path: &str) -> Result<Scenario> {
        let file = File::open(path).with_context(|| format!("cannot open scenario {path}"))?;
        Self::from_reader(BufReader::new(file))
            .with_context(|| format!("error with scenario file: {path}"))
    }

    pub fn from_reader(reader: impl io::Read) -> Result<Scenario> {
        let scenario: Scenario = serde_yaml::from_reader(reader)?;
        info!(
            "Load scenario: {}x{} grid, {} agents",
            scenario.grid.len(),
            scenario.grid.first().map_or(0, |row| row.len()),
            scenario.agents.len()
        );
        Ok(scenario)
    }

    pub fn to_map(&self) -> Result<Map> {
        Ok(Map::from_grid(self.grid.clone())?)
    }

    pub fn to_agents(&self) -> Vec<Agent> {
        self.agents
            .iter()
            .enumerate()
            .map(|(id, route)| Agent {
                id,
                start: route.start,
                goal: route.goal,
            })
            .collect()
    }

    pub fn write_agents_to_yaml(path: &str, agents: &[Agent]) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = io::BufWriter::new(file);
        let yaml_data = serde_yaml::to_string(&agents)?;
        writer.write_all(yaml_data.as_bytes())?;

        Ok(())
    }
}
