// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration management for the simulator.
//!
//! Configuration is loaded from multiple sources with the following priority
//! (later sources override earlier ones):
//!
//! 1. Built-in defaults
//! 2. anneal.yaml file
//! 3. Environment variables (ANNEAL_*)
//! 4. CLI arguments

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::dynamics::{QuadratureTolerances, SolveOptions};
use crate::error::{Error, Result};
use crate::integrator::{Method, SolverOptions};
use crate::linalg::{c, local_operator, sigma_z};
use crate::model::{
    ising_problem, rotation_pulse, transverse_driver, Annealing, Axis, Control, Coupling,
    DenseHamiltonian, ExponentialBath, InitialState, InstPulseControl,
};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Integrator and driver settings
    #[serde(default)]
    pub solver: SolverConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Annealing problem run by the CLI
    #[serde(default)]
    pub problem: ProblemConfig,
}

impl Config {
    /// Load configuration from file and environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(path) = config_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                config = serde_yaml::from_str(&content)?;
            }
        } else {
            for path in &["anneal.yaml", "anneal.yml"] {
                let path = Path::new(path);
                if path.exists() {
                    let content = std::fs::read_to_string(path)?;
                    config = serde_yaml::from_str(&content)?;
                    break;
                }
            }
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("ANNEAL_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("ANNEAL_LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("ANNEAL_METHOD") {
            self.solver.method = val.to_lowercase();
        }
        if let Ok(val) = env::var("ANNEAL_RTOL") {
            if let Ok(rtol) = val.parse() {
                self.solver.rtol = rtol;
            }
        }
        if let Ok(val) = env::var("ANNEAL_ATOL") {
            if let Ok(atol) = val.parse() {
                self.solver.atol = atol;
            }
        }
        if let Ok(val) = env::var("ANNEAL_DIMENSIONLESS") {
            self.solver.dimensionless_time = parse_flag(&val);
        }
        if let Ok(val) = env::var("ANNEAL_VECTORIZE") {
            self.solver.vectorize = parse_flag(&val);
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        self.solver.method()?;
        if !(self.solver.rtol > 0.0) || !(self.solver.atol > 0.0) {
            return Err(Error::Config("solver tolerances must be positive".into()));
        }
        if !(self.solver.quadrature.rtol > 0.0) || !(self.solver.quadrature.atol > 0.0) {
            return Err(Error::Config("quadrature tolerances must be positive".into()));
        }
        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            return Err(Error::Config(format!(
                "unknown log format '{}', expected json or pretty",
                self.logging.format
            )));
        }

        let p = &self.problem;
        if p.num_qubits == 0 || p.num_qubits > MAX_QUBITS {
            return Err(Error::Config(format!(
                "num_qubits must be between 1 and {MAX_QUBITS}"
            )));
        }
        if !(p.tf > 0.0) {
            return Err(Error::Config("annealing time tf must be positive".into()));
        }
        if p.fields.len() != p.num_qubits {
            return Err(Error::Config(format!(
                "expected {} local fields, got {}",
                p.num_qubits,
                p.fields.len()
            )));
        }
        if p.bath.strength < 0.0 || !(p.bath.cutoff > 0.0) {
            return Err(Error::Config(
                "bath strength must be non-negative and cutoff positive".into(),
            ));
        }
        if p.bath.strength > 0.0 && p.bath.strength >= p.energy_scale {
            tracing::warn!(
                strength = p.bath.strength,
                energy_scale = p.energy_scale,
                "bath is not weak compared to the system; Redfield results may be unphysical"
            );
        }
        Ok(())
    }
}

fn parse_flag(val: &str) -> bool {
    val.to_lowercase() == "true" || val == "1"
}

/// Largest register the CLI will build densely.
pub const MAX_QUBITS: usize = 8;

/// Solver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Integration method (dopri5, dop853, rk4)
    #[serde(default = "default_method")]
    pub method: String,

    /// Step size for rk4
    #[serde(default = "default_step")]
    pub step: f64,

    /// Relative tolerance of adaptive methods
    #[serde(default = "default_rtol")]
    pub rtol: f64,

    /// Absolute tolerance of adaptive methods
    #[serde(default = "default_atol")]
    pub atol: f64,

    /// Integrate in dimensionless time
    #[serde(default = "default_true")]
    pub dimensionless_time: bool,

    /// Evolve density matrices in vectorized form
    #[serde(default)]
    pub vectorize: bool,

    /// Check density-matrix positivity after every step
    #[serde(default)]
    pub positivity_check: bool,

    /// Keep every accepted step in the trajectory
    #[serde(default = "default_true")]
    pub save_everystep: bool,

    /// Redfield Λ quadrature tolerances
    #[serde(default)]
    pub quadrature: QuadratureTolerances,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            method: default_method(),
            step: default_step(),
            rtol: default_rtol(),
            atol: default_atol(),
            dimensionless_time: true,
            vectorize: false,
            positivity_check: false,
            save_everystep: true,
            quadrature: QuadratureTolerances::default(),
        }
    }
}

impl SolverConfig {
    /// Parsed integration method.
    pub fn method(&self) -> Result<Method> {
        match self.method.as_str() {
            "dopri5" => Ok(Method::Dopri5),
            "dop853" => Ok(Method::Dop853),
            "rk4" if self.step > 0.0 => Ok(Method::Rk4 { step: self.step }),
            "rk4" => Err(Error::Config("rk4 step must be positive".into())),
            other => Err(Error::Config(format!("unknown integration method '{other}'"))),
        }
    }

    /// Driver options described by this section.
    pub fn solve_options(&self) -> Result<SolveOptions> {
        Ok(SolveOptions {
            dimensionless_time: self.dimensionless_time,
            vectorize: self.vectorize,
            positivity_check: self.positivity_check,
            quadrature: self.quadrature,
            solver: SolverOptions {
                method: Some(self.method()?),
                rtol: self.rtol,
                atol: self.atol,
                save_everystep: self.save_everystep,
            },
            ..SolveOptions::default()
        })
    }
}

fn default_method() -> String {
    "dopri5".into()
}

fn default_step() -> f64 {
    0.01
}

fn default_rtol() -> f64 {
    1e-6
}

fn default_atol() -> f64 {
    1e-8
}

fn default_true() -> bool {
    true
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

/// Transverse-field Ising annealing problem.
///
/// `H(s) = energy_scale · ((1 − s) · (−Σ σx_i) + s · H_P)` with
/// `H_P = Σ h_i σz_i + Σ J_ij σz_i σz_j`, started in the ground state of
/// the driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemConfig {
    #[serde(default = "default_num_qubits")]
    pub num_qubits: usize,

    /// Annealing time
    #[serde(default = "default_tf")]
    pub tf: f64,

    #[serde(default = "default_energy_scale")]
    pub energy_scale: f64,

    /// Local fields `h_i`, one per qubit
    #[serde(default = "default_fields")]
    pub fields: Vec<f64>,

    /// Couplers `J_ij`
    #[serde(default)]
    pub couplers: Vec<CouplerConfig>,

    /// Stop-times in dimensionless time
    #[serde(default)]
    pub tstops: Vec<f64>,

    /// Bath attached to every qubit through σz (Redfield only)
    #[serde(default)]
    pub bath: BathConfig,

    /// Optional instantaneous rotation pulses
    #[serde(default)]
    pub pulse: Option<PulseConfig>,
}

impl Default for ProblemConfig {
    fn default() -> Self {
        Self {
            num_qubits: default_num_qubits(),
            tf: default_tf(),
            energy_scale: default_energy_scale(),
            fields: default_fields(),
            couplers: Vec::new(),
            tstops: Vec::new(),
            bath: BathConfig::default(),
            pulse: None,
        }
    }
}

impl ProblemConfig {
    /// Build the annealing problem, with its environment when `open`.
    pub fn build(&self, open: bool) -> Result<Annealing> {
        let n = self.num_qubits;
        let couplers: Vec<(usize, usize, f64)> =
            self.couplers.iter().map(|j| (j.i, j.j, j.strength)).collect();
        let hamiltonian = DenseHamiltonian::linear_anneal(
            transverse_driver(n),
            ising_problem(n, &self.fields, &couplers)?,
            self.energy_scale,
        )?;

        let dim = 1usize << n;
        let amplitude = c(1.0 / (dim as f64).sqrt(), 0.0);
        let u0 = InitialState::Ket(ndarray::Array1::from_elem(dim, amplitude));

        let mut annealing = Annealing::new(hamiltonian, u0).with_tstops(self.tstops.clone());
        if let Some(pulse) = &self.pulse {
            let op = rotation_pulse(pulse.axis, pulse.angle, pulse.qubit, n)?;
            let ctrl = InstPulseControl::fixed(pulse.times.clone(), op)?;
            annealing = annealing.with_control(Control::InstantaneousPulse(ctrl));
        }
        if open {
            let ops = (0..n).map(|q| local_operator(&sigma_z(), q, n)).collect();
            annealing = annealing.with_coupling(
                Coupling::constant(ops)?,
                ExponentialBath::new(self.bath.strength, self.bath.cutoff)?,
            );
        }
        Ok(annealing)
    }
}

fn default_num_qubits() -> usize {
    1
}

fn default_tf() -> f64 {
    10.0
}

fn default_energy_scale() -> f64 {
    1.0
}

fn default_fields() -> Vec<f64> {
    vec![1.0]
}

/// One `J_ij σz_i σz_j` term.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouplerConfig {
    pub i: usize,
    pub j: usize,
    pub strength: f64,
}

/// Exponential bath `C(τ) = strength · exp(−cutoff |τ|)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BathConfig {
    #[serde(default = "default_bath_strength")]
    pub strength: f64,

    #[serde(default = "default_bath_cutoff")]
    pub cutoff: f64,
}

impl Default for BathConfig {
    fn default() -> Self {
        Self {
            strength: default_bath_strength(),
            cutoff: default_bath_cutoff(),
        }
    }
}

fn default_bath_strength() -> f64 {
    0.01
}

fn default_bath_cutoff() -> f64 {
    4.0
}

/// Rotation pulse applied at fixed dimensionless times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseConfig {
    pub axis: Axis,
    pub angle: f64,
    #[serde(default)]
    pub qubit: usize,
    pub times: Vec<f64>,
}
