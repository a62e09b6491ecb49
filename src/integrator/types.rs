// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Solver options and the trajectory returned by [`super::solve`].

use ndarray::{Array1, Array2};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::linalg::trace;
use crate::model::state::{AuxData, StateLayout};

/// Stepping method of the external integrator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Method {
    /// Adaptive Dormand–Prince 5(4).
    Dopri5,
    /// Adaptive Dormand–Prince 8(5,3).
    Dop853,
    /// Classic fixed-step fourth-order Runge–Kutta.
    ///
    /// Each segment between stop-times is split into the smallest number of
    /// equal steps not longer than `step`.
    Rk4 { step: f64 },
}

/// Problem class hint used to pick a default method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmHint {
    NonStiff,
}

impl AlgorithmHint {
    pub fn default_method(self) -> Method {
        match self {
            AlgorithmHint::NonStiff => Method::Dopri5,
        }
    }
}

/// Options passed through to the integrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverOptions {
    /// Overrides the method chosen from the hint.
    #[serde(default)]
    pub method: Option<Method>,
    #[serde(default = "default_rtol")]
    pub rtol: f64,
    #[serde(default = "default_atol")]
    pub atol: f64,
    /// Keep every accepted step, not only the stop-times.
    #[serde(default = "default_true")]
    pub save_everystep: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            method: None,
            rtol: default_rtol(),
            atol: default_atol(),
            save_everystep: true,
        }
    }
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

/// Integrator counters summed over every segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub num_eval: u32,
    pub accepted_steps: u32,
    pub rejected_steps: u32,
    pub segments: u32,
}

/// Observations made during a solve that do not alter the state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The density matrix acquired an eigenvalue below the tolerance.
    PositivityViolation { t: f64, min_eigenvalue: f64 },
}

/// Solution of one driver call.
#[derive(Debug, Clone)]
pub struct Trajectory {
    /// Solver times; a time appears twice where a callback changed the state.
    pub t: Vec<f64>,
    /// Flat states, read through `layout`.
    pub u: Vec<Array1<Complex64>>,
    pub layout: StateLayout,
    /// Auxiliary data at the end of the solve.
    pub aux: Option<AuxData>,
    pub stats: Stats,
    pub diagnostics: Vec<Diagnostic>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// Last saved state.
    pub fn final_state(&self) -> Option<&Array1<Complex64>> {
        self.u.last()
    }

    /// State `i` as a matrix (density matrix or propagator).
    pub fn matrix(&self, i: usize) -> Option<Array2<Complex64>> {
        self.layout.to_matrix(self.u.get(i)?)
    }

    /// State `i` as a density matrix; kets become `|ψ⟩⟨ψ|`.
    pub fn density(&self, i: usize) -> Option<Array2<Complex64>> {
        let u = self.u.get(i)?;
        match self.layout {
            StateLayout::Ket { dim } => Some(Array2::from_shape_fn((dim, dim), |(r, c)| {
                u[r] * u[c].conj()
            })),
            StateLayout::Density { .. } | StateLayout::Vectorized { .. } => self.matrix(i),
            StateLayout::Propagator { .. } => None,
        }
    }

    /// Euclidean norm of state `i` (kets only).
    pub fn norm(&self, i: usize) -> Option<f64> {
        match self.layout {
            StateLayout::Ket { .. } => {
                Some(self.u.get(i)?.iter().map(|z| z.norm_sqr()).sum::<f64>().sqrt())
            }
            _ => None,
        }
    }

    /// Trace of state `i` (matrix layouts only).
    pub fn trace(&self, i: usize) -> Option<Complex64> {
        self.matrix(i).map(|m| trace(&m))
    }

    /// Diagonal of the density matrix at state `i`.
    pub fn populations(&self, i: usize) -> Option<Vec<f64>> {
        self.density(i).map(|rho| rho.diag().iter().map(|z| z.re).collect())
    }
}
