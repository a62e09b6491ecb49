// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Driver layer for quantum annealing dynamics.
//!
//! This crate turns an annealing problem (Hamiltonian, initial state,
//! optional bath coupling and pulse control) into an ODE problem and hands
//! it to an external integrator.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │         anneal-sim CLI (clap)            │
//! ├──────────────────────────────────────────┤
//! │  Schrödinger │ von Neumann │  Redfield   │
//! │   unitary    │             │  (Λ, D)     │
//! ├──────────────────────────────────────────┤
//! │ time scaling · initial value · pulses    │
//! ├──────────────────────────────────────────┤
//! │      integrator adapter (ode_solvers)    │
//! └──────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration management
//! - [`model`]: Hamiltonians, couplings, controls and states
//! - [`dynamics`]: Equation drivers
//! - [`integrator`]: ODE integrator adapter
//! - [`linalg`]: Dense complex linear algebra helpers
//! - [`validation`]: Input validation utilities
//! - [`error`]: Error types

pub mod config;
pub mod dynamics;
pub mod error;
pub mod integrator;
pub mod linalg;
pub mod model;
pub mod validation;

pub use config::Config;
pub use dynamics::{
    solve_redfield, solve_schrodinger, solve_unitary, solve_von_neumann, SolveOptions,
};
pub use error::{Error, Result};
pub use model::Annealing;

#[cfg(test)]
pub mod test_utils;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
