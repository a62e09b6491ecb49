// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Dense complex matrix helpers shared by the drivers.
//!
//! Operators and states are `ndarray` arrays of [`Complex64`]. Decompositions
//! (LU solves, Hermitian eigenvalues) are delegated to `nalgebra`; the
//! helpers here only convert between the two representations and implement
//! the small amount of operator algebra the right-hand sides need.
//!
//! Vectorization is column-major throughout: `vec(ρ)[i + j·d] = ρ[i, j]`,
//! so that `vec(A ρ B) = (Bᵀ ⊗ A) vec(ρ)`.

use nalgebra::DMatrix;
use ndarray::{Array1, Array2};
use num_complex::Complex64;

/// Complex literal shorthand.
#[inline]
pub fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

/// `d × d` identity.
pub fn identity(d: usize) -> Array2<Complex64> {
    Array2::eye(d)
}

/// Pauli X.
pub fn sigma_x() -> Array2<Complex64> {
    let mut m = Array2::zeros((2, 2));
    m[[0, 1]] = c(1.0, 0.0);
    m[[1, 0]] = c(1.0, 0.0);
    m
}

/// Pauli Y.
pub fn sigma_y() -> Array2<Complex64> {
    let mut m = Array2::zeros((2, 2));
    m[[0, 1]] = c(0.0, -1.0);
    m[[1, 0]] = c(0.0, 1.0);
    m
}

/// Pauli Z.
pub fn sigma_z() -> Array2<Complex64> {
    let mut m = Array2::zeros((2, 2));
    m[[0, 0]] = c(1.0, 0.0);
    m[[1, 1]] = c(-1.0, 0.0);
    m
}

/// Conjugate transpose.
pub fn dagger(m: &Array2<Complex64>) -> Array2<Complex64> {
    m.t().mapv(|z| z.conj())
}

/// Commutator `[a, b] = ab − ba`.
pub fn commutator(a: &Array2<Complex64>, b: &Array2<Complex64>) -> Array2<Complex64> {
    a.dot(b) - b.dot(a)
}

/// Kronecker product `a ⊗ b`.
pub fn kron(a: &Array2<Complex64>, b: &Array2<Complex64>) -> Array2<Complex64> {
    let (br, bc) = b.dim();
    let (ar, ac) = a.dim();
    Array2::from_shape_fn((ar * br, ac * bc), |(r, col)| {
        a[[r / br, col / bc]] * b[[r % br, col % bc]]
    })
}

/// Embed a single-qubit operator acting on `qubit` of an `n`-qubit register.
///
/// Qubit 0 is the leftmost (most significant) tensor factor.
pub fn local_operator(
    op: &Array2<Complex64>,
    qubit: usize,
    num_qubits: usize,
) -> Array2<Complex64> {
    (0..num_qubits).fold(identity(1), |acc, k| {
        if k == qubit {
            kron(&acc, op)
        } else {
            kron(&acc, &identity(2))
        }
    })
}

/// Trace.
pub fn trace(m: &Array2<Complex64>) -> Complex64 {
    m.diag().sum()
}

/// Column-major flattening of a square matrix.
pub fn vectorize(m: &Array2<Complex64>) -> Array1<Complex64> {
    m.t().iter().copied().collect()
}

/// Inverse of [`vectorize`] for a `d × d` matrix.
pub fn unvectorize(v: &Array1<Complex64>, d: usize) -> Array2<Complex64> {
    Array2::from_shape_fn((d, d), |(i, j)| v[i + j * d])
}

/// Liouvillian of `ρ ↦ a ρ b` acting on column-major vectorized states.
pub fn sandwich_superop(a: &Array2<Complex64>, b: &Array2<Complex64>) -> Array2<Complex64> {
    kron(&b.t().to_owned(), a)
}

pub(crate) fn to_nalgebra(m: &Array2<Complex64>) -> DMatrix<Complex64> {
    let (r, cols) = m.dim();
    DMatrix::from_fn(r, cols, |i, j| m[[i, j]])
}

pub(crate) fn from_nalgebra(m: &DMatrix<Complex64>) -> Array2<Complex64> {
    Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)])
}

/// Smallest eigenvalue of the Hermitian part `(m + m†)/2`.
pub fn min_hermitian_eigenvalue(m: &Array2<Complex64>) -> f64 {
    let herm = (m + &dagger(m)) * c(0.5, 0.0);
    to_nalgebra(&herm)
        .symmetric_eigenvalues()
        .iter()
        .copied()
        .fold(f64::INFINITY, f64::min)
}

/// Padé(13,13) coefficients of `exp`, normalised by the constant term.
/// Higham (2005), eq. (10.33).
const PADE13: [f64; 14] = [
    1.0,
    0.5,
    0.12,
    1.833_333_333_333_333_4e-2,
    1.992_753_623_188_405_8e-3,
    1.630_434_782_608_696e-4,
    1.035_196_687_401_6e-5,
    5.175_983_437_008_01e-7,
    2.043_151_356_652_5e-8,
    6.306_022_705_717_593e-10,
    1.483_770_048_404_14e-11,
    2.529_153_491_597_966e-13,
    2.810_170_546_219_962_4e-15,
    1.544_049_750_670_309e-17,
];

/// `θ₁₃` from Higham (2005), Table 10.2.
const THETA_13: f64 = 5.37;

/// Matrix exponential by scaling and squaring with a Padé(13) approximant.
///
/// Returns `None` if `a` is not square or the Padé denominator is singular.
pub fn matrix_exp(a: &Array2<Complex64>) -> Option<Array2<Complex64>> {
    let n = a.nrows();
    if n != a.ncols() {
        return None;
    }
    if n == 0 {
        return Some(Array2::zeros((0, 0)));
    }

    let norm = (0..n)
        .map(|j| a.column(j).iter().map(|z| z.norm()).sum::<f64>())
        .fold(0.0, f64::max);
    let squarings = if norm > THETA_13 {
        (norm / THETA_13).log2().ceil() as i32
    } else {
        0
    };
    let a = a * c(2f64.powi(-squarings), 0.0);

    let eye = identity(n);
    let a2 = a.dot(&a);
    let a4 = a2.dot(&a2);
    let a6 = a2.dot(&a4);
    let poly = |k: [usize; 7]| {
        let low = &eye * c(PADE13[k[0]], 0.0)
            + &a2 * c(PADE13[k[1]], 0.0)
            + &a4 * c(PADE13[k[2]], 0.0)
            + &a6 * c(PADE13[k[3]], 0.0);
        let high = &a2 * c(PADE13[k[4]], 0.0)
            + &a4 * c(PADE13[k[5]], 0.0)
            + &a6 * c(PADE13[k[6]], 0.0);
        low + a6.dot(&high)
    };
    let u = a.dot(&poly([1, 3, 5, 7, 9, 11, 13]));
    let v = poly([0, 2, 4, 6, 8, 10, 12]);

    let numerator = to_nalgebra(&(&v + &u));
    let mut result = to_nalgebra(&(&v - &u)).lu().solve(&numerator)?;
    for _ in 0..squarings {
        result = &result * &result;
    }
    Some(from_nalgebra(&result))
}
