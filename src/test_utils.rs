// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Shared test fixtures.

use ndarray::{array, Array1, Array2};
use num_complex::Complex64;

use crate::linalg::{c, sigma_x, sigma_z};
use crate::model::annealing::Annealing;
use crate::model::hamiltonian::DenseHamiltonian;
use crate::model::state::InitialState;

/// `|0⟩`.
pub fn ground_state() -> Array1<Complex64> {
    array![c(1.0, 0.0), c(0.0, 0.0)]
}

/// `|+⟩ = (|0⟩ + |1⟩)/√2`.
pub fn plus_state() -> Array1<Complex64> {
    let a = std::f64::consts::FRAC_1_SQRT_2;
    array![c(a, 0.0), c(a, 0.0)]
}

/// `|0⟩⟨0|`.
pub fn ground_density() -> Array2<Complex64> {
    array![[c(1.0, 0.0), c(0.0, 0.0)], [c(0.0, 0.0), c(0.0, 0.0)]]
}

/// `|1⟩⟨1|`.
pub fn excited_density() -> Array2<Complex64> {
    array![[c(0.0, 0.0), c(0.0, 0.0)], [c(0.0, 0.0), c(1.0, 0.0)]]
}

/// A full-rank state with coherences, eigenvalues 0.8 and 0.2.
pub fn mixed_density() -> Array2<Complex64> {
    array![[c(0.7, 0.0), c(0.2, 0.1)], [c(0.2, -0.1), c(0.3, 0.0)]]
}

/// `−(1 − s)σx + s σz` starting in its ground state `|+⟩`.
pub fn two_level_annealing() -> Annealing {
    let driver = sigma_x() * c(-1.0, 0.0);
    let h = DenseHamiltonian::linear_anneal(driver, sigma_z(), 1.0).expect("valid Hamiltonian");
    Annealing::new(h, InitialState::Ket(plus_state()))
}

/// Element-wise `|a − b| ≤ tol`.
pub fn assert_matrix_close(a: &Array2<Complex64>, b: &Array2<Complex64>, tol: f64) {
    assert_eq!(a.dim(), b.dim(), "shape mismatch");
    for ((idx, x), y) in a.indexed_iter().zip(b.iter()) {
        assert!(
            (x - y).norm() <= tol,
            "entry {idx:?}: {x} vs {y} (tolerance {tol})"
        );
    }
}
