use tapf_rust::config::{Cli, Config};
use tapf_rust::scenario::Scenario;
use tapf_rust::solver::{Solver, CBS, PIBT};

use anyhow::{anyhow, Context};
use clap::Parser;
use std::fs::File;
use std::io::BufWriter;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = if let Some(config_file) = cli.config.as_ref() {
        let config_str = std::fs::read_to_string(config_file)
            .with_context(|| format!("cannot read config file: {config_file}"))?;
        Config::from_yaml_str(&config_str)
            .with_context(|| format!("error with config file: {config_file}"))?
    } else {
        Config::default()
    }
    .override_from_command_line(&cli)?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    if cli.config.is_none() {
        info!("No config file specified, using default config");
    }

    let scenario = Scenario::load_from_file(&config.scenario_path)?;
    let map = scenario.to_map()?;
    let agents = scenario.to_agents();

    let mut solver: Box<dyn Solver> = match config.solver.as_str() {
        "cbs" => Box::new(CBS::new(agents.clone(), &map, &config)?),
        "pibt" => Box::new(PIBT::new(agents.clone(), &map, &config)?),
        other => return Err(anyhow!("Unknown solver {other:?}")),
    };

    let mut solution = match solver.solve() {
        Ok(solution) => solution,
        Err(err) => {
            error!("{} solve fails: {err}", config.solver);
            return Err(err.into());
        }
    };
    if !solution.verify(&map, &agents) {
        return Err(anyhow!("{} returned an invalid solution", config.solver));
    }
    info!(
        "Solution cost {} makespan {}",
        solution.cost(),
        solution.makespan()
    );

    if config.clean_solution {
        solution = solution.clean();
    }

    if let Some(output_path) = &config.output_path {
        let file = File::create(output_path)
            .with_context(|| format!("cannot create output file: {output_path}"))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &solution)?;
        info!("Write solution to {output_path}");

        // Keep the instance next to its solution so runs can be replayed.
        let agents_path = format!("{output_path}.agents.yaml");
        Scenario::write_agents_to_yaml(&agents_path, &agents)
            .with_context(|| format!("cannot write agents file: {agents_path}"))?;
        info!("Write agents to {agents_path}");
    }

    solver.stats().print(&config.solver);
    Ok(())
}
