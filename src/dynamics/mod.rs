// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Equation drivers for annealing problems.
//!
//! Each driver validates the problem, maps the annealing time onto solver
//! time, builds the initial value and the pulse callbacks, then hands a
//! right-hand side to [`crate::integrator::solve`]:
//!
//! - [`solve_schrodinger`]: `dψ/dt = −i H ψ`
//! - [`solve_unitary`]: `dU/dt = −i H U`, `U(s0) = 1`
//! - [`solve_von_neumann`]: `dρ/dt = −i [H, ρ]`
//! - [`solve_redfield`]: `dρ/dt = −i [H, ρ] + D(s) ρ`

pub mod callback;
pub mod initial;
pub mod operator;
pub mod params;
pub mod redfield;
pub mod schrodinger;
pub mod time;
pub mod von_neumann;

pub use callback::{positivity_callback, pulse_callbacks, PulseTarget, POSITIVITY_TOLERANCE};
pub use initial::{build_initial_value, check_aux_data, InitialValue, Representation};
pub use operator::CachedOperator;
pub use params::{OdeParams, QuadratureTolerances, SolveOptions};
pub use redfield::{
    build_open_system, solve_redfield, InterpolatedUnitary, OpenSystem, Redfield, RedfieldSet,
    StaticUnitary, Unitary,
};
pub use schrodinger::{schrodinger_operator, solve_schrodinger, solve_unitary};
pub use time::{preprocess_time, TimeScale, TimeSetup};
pub use von_neumann::{hamiltonian_liouvillian, solve_von_neumann, DensityRhs};
