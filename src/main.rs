// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Annealing dynamics simulator.
//!
//! Runs the transverse-field Ising annealing problem described by the
//! configuration through one of the equation drivers.
//!
//! # Usage
//!
//! ```bash
//! # Closed-system run with default configuration
//! anneal-sim run --equation schrodinger
//!
//! # Open-system run with custom config, report written to a file
//! anneal-sim run --equation redfield --config anneal.yaml --output report.json
//!
//! # Show effective configuration
//! anneal-sim config
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use anneal_dynamics::config::Config;
use anneal_dynamics::dynamics::{
    solve_redfield, solve_schrodinger, solve_unitary, solve_von_neumann, InterpolatedUnitary,
};
use anneal_dynamics::integrator::{Diagnostic, Stats, Trajectory};
use anneal_dynamics::{Error, Result, VERSION};

/// Quantum annealing dynamics simulator
#[derive(Parser)]
#[command(name = "anneal-sim")]
#[command(author = "QubitOS Contributors")]
#[command(version = VERSION)]
#[command(about = "Closed- and open-system quantum annealing simulator")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "ANNEAL_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the configured annealing problem
    Run {
        /// Equation to integrate
        #[arg(short, long, value_enum, default_value_t = Equation::Schrodinger)]
        equation: Equation,

        /// Annealing time, overrides problem.tf
        #[arg(long)]
        tf: Option<f64>,

        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show effective configuration
    Config,

    /// Validate configuration file
    Validate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
enum Equation {
    Schrodinger,
    VonNeumann,
    Redfield,
}

/// Summary written after a run.
#[derive(Debug, Serialize)]
struct RunReport {
    equation: Equation,
    tf: f64,
    dim: usize,
    points: usize,
    final_time: f64,
    populations: Vec<f64>,
    stats: Stats,
    diagnostics: Vec<Diagnostic>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    init_logging(&config.logging.level, &config.logging.format);

    match cli.command {
        Commands::Run {
            equation,
            tf,
            output,
        } => {
            if let Some(tf) = tf {
                config.problem.tf = tf;
            }
            config.validate()?;

            let report = run(&config, equation)?;
            let json = serde_json::to_string_pretty(&report)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    info!(path = %path.display(), "report written");
                }
                None => println!("{json}"),
            }
        }

        Commands::Config => {
            println!("{}", serde_yaml::to_string(&config)?);
        }

        Commands::Validate => match config.validate() {
            Ok(()) => {
                println!("Configuration is valid");
            }
            Err(e) => {
                eprintln!("Configuration error: {}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

fn run(config: &Config, equation: Equation) -> Result<RunReport> {
    let tf = config.problem.tf;
    let options = config.solver.solve_options()?;
    let annealing = config.problem.build(equation == Equation::Redfield)?;
    info!(
        version = VERSION,
        ?equation,
        tf,
        qubits = config.problem.num_qubits,
        method = %config.solver.method,
        "starting run"
    );

    let traj = match equation {
        Equation::Schrodinger => solve_schrodinger(&annealing, tf, &options)?,
        Equation::VonNeumann => solve_von_neumann(&annealing, tf, &options)?,
        Equation::Redfield => {
            // the interpolated unitary needs every step
            let mut unitary_options = options.clone();
            unitary_options.solver.save_everystep = true;
            let propagator = solve_unitary(&annealing, tf, &unitary_options)?;
            let unitary =
                InterpolatedUnitary::from_trajectory(&propagator, tf, options.dimensionless_time)?;
            solve_redfield(&annealing, tf, &unitary, &options)?
        }
    };

    report(equation, tf, annealing.dim(), &traj)
}

fn report(equation: Equation, tf: f64, dim: usize, traj: &Trajectory) -> Result<RunReport> {
    let last = traj
        .len()
        .checked_sub(1)
        .ok_or_else(|| Error::Integration("integrator returned no points".into()))?;
    let populations = traj
        .populations(last)
        .ok_or_else(|| Error::Integration("final state has an unexpected layout".into()))?;
    if !traj.diagnostics.is_empty() {
        warn!(
            count = traj.diagnostics.len(),
            "density matrix lost positivity during the run"
        );
    }
    info!(
        points = traj.len(),
        accepted = traj.stats.accepted_steps,
        rejected = traj.stats.rejected_steps,
        "run finished"
    );
    Ok(RunReport {
        equation,
        tf,
        dim,
        points: traj.len(),
        final_time: traj.t[last],
        populations,
        stats: traj.stats,
        diagnostics: traj.diagnostics.clone(),
    })
}

/// Initialize logging with tracing.
fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
