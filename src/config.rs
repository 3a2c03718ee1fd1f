use anyhow::{anyhow, Context};
use clap::Parser;
use serde::Deserialize;

#[derive(Parser, Debug, Default)]
#[command(
    name = "Rust TAPF",
    about = "Orientation-aware multi-agent path finding with CBS and PIBT.",
    version = "1.0"
)]
pub struct Cli {
    #[arg(long, help = "Path to a YAML config file")]
    pub config: Option<String>,

    #[arg(long, help = "Path to the YAML scenario file (grid and agents)")]
    pub scenario_path: Option<String>,

    #[arg(long, help = "Path to the JSON solution output file")]
    pub output_path: Option<String>,

    #[arg(long, help = "Solver to use: cbs or pibt")]
    pub solver: Option<String>,

    #[arg(long, help = "Seed for the random number generator")]
    pub seed: Option<u64>,

    #[arg(long, help = "CBS: skip constraint sets that were already expanded")]
    pub pruning: Option<bool>,

    #[arg(long, help = "CBS: maximum number of high-level node pops")]
    pub max_expansions: Option<usize>,

    #[arg(long, help = "PIBT: number of fresh attempts before giving up")]
    pub pibt_max_retries: Option<usize>,

    #[arg(long, help = "Smooth back-and-forth moves out of the solution")]
    pub clean_solution: Option<bool>,

    #[arg(long, help = "Log filter, e.g. info or tapf_rust=debug")]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub scenario_path: String,
    pub output_path: Option<String>,
    pub solver: String,
    pub seed: u64,
    pub pruning: bool,
    pub max_expansions: usize,
    pub pibt_max_retries: usize,
    pub clean_solution: bool,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scenario_path: "map_file/test/cross.yaml".to_string(),
            output_path: None,
            solver: "cbs".to_string(),
            seed: 0,
            pruning: false,
            max_expansions: 1000,
            pibt_max_retries: 10,
            clean_solution: false,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(yaml).context("failed to parse config")
    }

    pub fn override_from_command_line(mut self, cli: &Cli) -> anyhow::Result<Self> {
        if let Some(scenario_path) = &cli.scenario_path {
            self.scenario_path = scenario_path.clone();
        }
        if let Some(output_path) = &cli.output_path {
            self.output_path = Some(output_path.clone());
        }
        if let Some(solver) = &cli.solver {
            self.solver = solver.clone();
        }
        if let Some(seed) = cli.seed {
            self.seed = seed;
        }
        if let Some(pruning) = cli.pruning {
            self.pruning = pruning;
        }
        if let Some(max_expansions) = cli.max_expansions {
            self.max_expansions = max_expansions;
        }
        if let Some(pibt_max_retries) = cli.pibt_max_retries {
            self.pibt_max_retries = pibt_max_retries;
        }
        if let Some(clean_solution) = cli.clean_solution {
            self.clean_solution = clean_solution;
        }
        if let Some(log_level) = &cli.log_level {
            self.log_level = log_level.clone();
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        match self.solver.as_str() {
            "cbs" | "pibt" => {}
            other => return Err(anyhow!("Unknown solver {other:?}, expected cbs or pibt")),
        }

        if self.max_expansions == 0 {
            return Err(anyhow!("max_expansions must be at least 1"));
        }
        if self.pibt_max_retries == 0 {
            return Err(anyhow!("pibt_max_retries must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_config_with_command_line_override() {
        let config = Config::from_yaml_str("solver: pibt\nseed: 7\npibt_max_retries: 3\n").unwrap();
        assert_eq!(config.solver, "pibt");
        assert_eq!(config.seed, 7);
        assert_eq!(config.max_expansions, 1000);

        let cli = Cli {
            solver: Some("cbs".to_string()),
            pruning: Some(true),
            ..Default::default()
        };
        let config = config.override_from_command_line(&cli).unwrap();
        assert_eq!(config.solver, "cbs");
        assert!(config.pruning);
        assert_eq!(config.pibt_max_retries, 3);
    }

    #[test]
    fn test_invalid_config() {
        assert!(Config::from_yaml_str("solver: ecbs\n")
            .unwrap()
            .validate()
            .is_err());
        assert!(Config::from_yaml_str("unknown_key: 1\n").is_err());
        assert!(Config::default().validate().is_ok());
    }
}
