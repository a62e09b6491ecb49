// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Adapter around the external ODE integrator.
//!
//! Drivers describe a problem as an [`OdeProblem`] over flat complex states
//! and hand it to [`solve`] together with stop-times, callbacks and
//! pass-through [`SolverOptions`]. Stepping is done by `ode_solvers`.

pub mod callback;
pub mod solve;
pub mod types;

pub use callback::{Callback, CallbackSet, PresetAffect, StepHook};
pub use solve::{solve, OdeFunction, OdeProblem};
pub use types::{AlgorithmHint, Diagnostic, Method, SolverOptions, Stats, Trajectory};
