// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Parameters threaded through the integrator and per-call options.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::integrator::SolverOptions;
use crate::model::control::Control;
use crate::model::hamiltonian::Hamiltonian;
use crate::model::state::AuxDataConstructor;

use super::redfield::OpenSystem;
use super::time::TimeScale;

/// Everything a right-hand side reads at each evaluation.
pub struct OdeParams<'a> {
    pub hamiltonian: &'a dyn Hamiltonian,
    pub tf: f64,
    pub scale: TimeScale,
    pub opensys: Option<&'a dyn OpenSystem>,
    pub control: &'a Control,
}

impl OdeParams<'_> {
    /// Dimensionless time at solver time `t`.
    pub fn s(&self, t: f64) -> f64 {
        self.scale.s(t)
    }

    pub fn rate(&self) -> f64 {
        self.scale.rate()
    }
}

impl fmt::Debug for OdeParams<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OdeParams")
            .field("dim", &self.hamiltonian.dim())
            .field("tf", &self.tf)
            .field("scale", &self.scale)
            .field("open", &self.opensys.is_some())
            .field("control", &self.control.kind())
            .finish()
    }
}

/// Tolerances of the adaptive Simpson rule computing the Redfield `Λ`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadratureTolerances {
    pub rtol: f64,
    pub atol: f64,
    /// Maximum bisection depth.
    pub max_depth: u32,
}

impl Default for QuadratureTolerances {
    fn default() -> Self {
        Self {
            rtol: 1e-6,
            atol: 1e-8,
            max_depth: 20,
        }
    }
}

/// Per-call driver options.
#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// Integrate in `s` rather than physical time.
    pub dimensionless_time: bool,
    /// Extra stop-times in solver units.
    pub tstops: Vec<f64>,
    /// Evolve density matrices as vectors under a Liouvillian.
    pub vectorize: bool,
    /// Check positivity of the density matrix after every step.
    pub positivity_check: bool,
    pub aux_data: Option<AuxDataConstructor>,
    pub quadrature: QuadratureTolerances,
    pub solver: SolverOptions,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            dimensionless_time: true,
            tstops: Vec::new(),
            vectorize: false,
            positivity_check: false,
            aux_data: None,
            quadrature: QuadratureTolerances::default(),
            solver: SolverOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_options_defaults() {
        let opts = SolveOptions::default();
        assert!(opts.dimensionless_time);
        assert!(!opts.vectorize);
        assert!(!opts.positivity_check);
        assert!(opts.aux_data.is_none());
        assert_eq!(opts.quadrature.rtol, 1e-6);
        assert_eq!(opts.quadrature.atol, 1e-8);
    }
}
