// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Time-dependent Hamiltonians.
//!
//! The drivers only need two things from a Hamiltonian: its value at a
//! dimensionless time `s`, and the ability to write a scaled copy of that
//! value into a buffer the right-hand side already owns. [`DenseHamiltonian`]
//! is the reference implementation, `H(s) = Σ_k f_k(s) H_k`.

use std::fmt;

use ndarray::Array2;
use num_complex::Complex64;

use crate::error::{Result, ValidationError};
use crate::linalg::{c, local_operator, sigma_x, sigma_z};

/// A time-dependent Hamiltonian `H(s)` on a `dim()`-dimensional space.
pub trait Hamiltonian {
    /// Hilbert space dimension.
    fn dim(&self) -> usize;

    /// Evaluate `H(s)`.
    fn at(&self, s: f64) -> Array2<Complex64>;

    /// Overwrite `cache` with `scale · H(s)`.
    ///
    /// The default evaluates [`Hamiltonian::at`]; implementations override it
    /// when they can fill the buffer without an intermediate allocation.
    fn update_cache(&self, cache: &mut Array2<Complex64>, s: f64, scale: Complex64) {
        let h = self.at(s);
        cache.zip_mut_with(&h, |x, &y| *x = scale * y);
    }
}

/// Scalar schedule `f(s)` multiplying one Hamiltonian term.
pub type Schedule = Box<dyn Fn(f64) -> f64>;

/// `H(s) = Σ_k f_k(s) H_k` with dense constant matrices `H_k`.
pub struct DenseHamiltonian {
    schedules: Vec<Schedule>,
    terms: Vec<Array2<Complex64>>,
    dim: usize,
}

impl DenseHamiltonian {
    /// Build from matching lists of schedules and term matrices.
    ///
    /// # Errors
    ///
    /// Rejects empty or mismatched lists and non-square or differently
    /// sized terms.
    pub fn new(schedules: Vec<Schedule>, terms: Vec<Array2<Complex64>>) -> Result<Self> {
        if terms.is_empty() {
            return Err(ValidationError::field("terms", "at least one term is required").into());
        }
        if schedules.len() != terms.len() {
            return Err(ValidationError::Dimension {
                what: "schedules".into(),
                expected: terms.len(),
                actual: schedules.len(),
            }
            .into());
        }
        let dim = terms[0].nrows();
        for term in &terms {
            if term.nrows() != term.ncols() {
                return Err(ValidationError::field(
                    "terms",
                    format!("term must be square, got {} × {}", term.nrows(), term.ncols()),
                )
                .into());
            }
            if term.nrows() != dim {
                return Err(ValidationError::Dimension {
                    what: "Hamiltonian term".into(),
                    expected: dim,
                    actual: term.nrows(),
                }
                .into());
            }
        }
        Ok(Self {
            schedules,
            terms,
            dim,
        })
    }

    /// Time-independent Hamiltonian.
    pub fn constant(h: Array2<Complex64>) -> Result<Self> {
        Self::new(vec![Box::new(|_: f64| 1.0) as Schedule], vec![h])
    }

    /// Standard annealing form `A(s)·driver + B(s)·problem` with the linear
    /// schedules `A(s) = 1 − s`, `B(s) = s`, both multiplied by `energy_scale`.
    pub fn linear_anneal(
        driver: Array2<Complex64>,
        problem: Array2<Complex64>,
        energy_scale: f64,
    ) -> Result<Self> {
        Self::new(
            vec![
                Box::new(move |s: f64| energy_scale * (1.0 - s)) as Schedule,
                Box::new(move |s: f64| energy_scale * s) as Schedule,
            ],
            vec![driver, problem],
        )
    }
}

impl fmt::Debug for DenseHamiltonian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DenseHamiltonian")
            .field("dim", &self.dim)
            .field("terms", &self.terms.len())
            .finish()
    }
}

impl Hamiltonian for DenseHamiltonian {
    fn dim(&self) -> usize {
        self.dim
    }

    fn at(&self, s: f64) -> Array2<Complex64> {
        let mut h = Array2::zeros((self.dim, self.dim));
        self.update_cache(&mut h, s, c(1.0, 0.0));
        h
    }

    fn update_cache(&self, cache: &mut Array2<Complex64>, s: f64, scale: Complex64) {
        cache.fill(c(0.0, 0.0));
        for (f, term) in self.schedules.iter().zip(&self.terms) {
            let k = scale * f(s);
            cache.zip_mut_with(term, |x, &y| *x += k * y);
        }
    }
}

/// Transverse-field driver `−Σ_i σx_i`.
pub fn transverse_driver(num_qubits: usize) -> Array2<Complex64> {
    let d = 1 << num_qubits;
    (0..num_qubits).fold(Array2::zeros((d, d)), |acc, q| {
        acc - local_operator(&sigma_x(), q, num_qubits)
    })
}

/// Ising problem Hamiltonian `Σ_i h_i σz_i + Σ_(i,j) J_ij σz_i σz_j`.
///
/// # Errors
///
/// Rejects field lists of the wrong length and couplers referring to
/// missing or identical qubits.
pub fn ising_problem(
    num_qubits: usize,
    fields: &[f64],
    couplers: &[(usize, usize, f64)],
) -> Result<Array2<Complex64>> {
    if fields.len() != num_qubits {
        return Err(ValidationError::Dimension {
            what: "local fields".into(),
            expected: num_qubits,
            actual: fields.len(),
        }
        .into());
    }
    let d = 1 << num_qubits;
    let mut h = Array2::zeros((d, d));
    for (q, &hq) in fields.iter().enumerate() {
        h = h + local_operator(&sigma_z(), q, num_qubits) * c(hq, 0.0);
    }
    for &(i, j, jij) in couplers {
        if i >= num_qubits || j >= num_qubits || i == j {
            return Err(ValidationError::field(
                "couplers",
                format!("invalid coupler ({i}, {j}) for {num_qubits} qubits"),
            )
            .into());
        }
        let zi = local_operator(&sigma_z(), i, num_qubits);
        let zj = local_operator(&sigma_z(), j, num_qubits);
        let zz = zi.dot(&zj);
        h = h + zz * c(jij, 0.0);
    }
    Ok(h)
}
