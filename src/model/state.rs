// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Initial states, flat state layouts and auxiliary per-state data.

use ndarray::{Array1, Array2};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::linalg::{unvectorize, vectorize};

/// Initial state supplied with an annealing problem.
#[derive(Debug, Clone, PartialEq)]
pub enum InitialState {
    /// State vector `|ψ⟩`.
    Ket(Array1<Complex64>),
    /// Density matrix `ρ`.
    Density(Array2<Complex64>),
}

impl InitialState {
    /// Hilbert space dimension.
    pub fn dim(&self) -> usize {
        match self {
            InitialState::Ket(v) => v.len(),
            InitialState::Density(m) => m.nrows(),
        }
    }
}

/// State in the shape the right-hand side consumes.
#[derive(Debug, Clone, PartialEq)]
pub enum StateData {
    Vector(Array1<Complex64>),
    Matrix(Array2<Complex64>),
}

impl StateData {
    /// Flat view handed to the integrator; matrices are column-major.
    pub fn flat(&self) -> Array1<Complex64> {
        match self {
            StateData::Vector(v) => v.clone(),
            StateData::Matrix(m) => vectorize(m),
        }
    }
}

/// How a flat state vector is to be read back.
///
/// Every matrix layout is stored column-major. `Density` and `Vectorized`
/// share a storage format and differ only in how the right-hand side
/// evaluates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StateLayout {
    Ket { dim: usize },
    Density { dim: usize },
    Vectorized { dim: usize },
    Propagator { dim: usize },
}

impl StateLayout {
    /// Hilbert space dimension.
    pub fn dim(&self) -> usize {
        match *self {
            StateLayout::Ket { dim }
            | StateLayout::Density { dim }
            | StateLayout::Vectorized { dim }
            | StateLayout::Propagator { dim } => dim,
        }
    }

    /// Number of complex entries in the flat state.
    pub fn flat_len(&self) -> usize {
        match *self {
            StateLayout::Ket { dim } => dim,
            _ => self.dim() * self.dim(),
        }
    }

    /// Whether the flat state holds a `d × d` matrix.
    pub fn is_matrix(&self) -> bool {
        !matches!(self, StateLayout::Ket { .. })
    }

    /// Reinterpret a flat state as a matrix; `None` for kets.
    pub fn to_matrix(&self, u: &Array1<Complex64>) -> Option<Array2<Complex64>> {
        self.is_matrix().then(|| unvectorize(u, self.dim()))
    }
}

/// Auxiliary data carried next to the numeric state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxData {
    /// Number of pulses applied so far by a tracking control.
    pub pulses_applied: usize,
}

/// Builds the auxiliary data for an initial state.
pub type AuxDataConstructor = fn(&StateData) -> AuxData;

/// Constructor starting the pulse count at zero.
pub fn pulse_counter(_: &StateData) -> AuxData {
    AuxData::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::c;

    #[test]
    fn test_flat_matrix_is_column_major() {
        let mut m = Array2::zeros((2, 2));
        m[[1, 0]] = c(5.0, 0.0);
        let flat = StateData::Matrix(m).flat();
        assert_eq!(flat[1], c(5.0, 0.0));
    }

    #[test]
    fn test_layout_lengths() {
        assert_eq!(StateLayout::Ket { dim: 4 }.flat_len(), 4);
        assert_eq!(StateLayout::Density { dim: 4 }.flat_len(), 16);
        assert_eq!(StateLayout::Propagator { dim: 2 }.flat_len(), 4);
        assert!(StateLayout::Ket { dim: 4 }.to_matrix(&Array1::zeros(4)).is_none());
    }

    #[test]
    fn test_layout_to_matrix_inverts_flat() {
        let mut m = Array2::zeros((2, 2));
        m[[0, 1]] = c(0.0, 1.0);
        m[[1, 1]] = c(2.0, 0.0);
        let flat = StateData::Matrix(m.clone()).flat();
        let back = StateLayout::Vectorized { dim: 2 }.to_matrix(&flat).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_pulse_counter_starts_at_zero() {
        let aux = pulse_counter(&StateData::Vector(Array1::zeros(2)));
        assert_eq!(aux.pulses_applied, 0);
    }

    #[test]
    fn test_layout_serializes_with_kind_tag() {
        let json = serde_json::to_string(&StateLayout::Density { dim: 2 }).unwrap();
        assert_eq!(json, r#"{"kind":"density","dim":2}"#);
    }
}
