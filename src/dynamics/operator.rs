// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Linear operators refreshed in place at every evaluation.

use std::cell::RefCell;

use ndarray::{Array1, Array2};
use num_complex::Complex64;

use crate::integrator::OdeFunction;

/// Rule writing the operator at solver time `t` into the buffer.
pub type UpdateRule<'f, P> = Box<dyn Fn(&mut Array2<Complex64>, &P, f64) + 'f>;

/// Dense linear operator `L(t)` with a reusable buffer.
///
/// Every evaluation overwrites the buffer through the update rule and then
/// computes `du = L(t) u`. The buffer doubles as the Jacobian.
pub struct CachedOperator<'f, P> {
    cache: RefCell<Array2<Complex64>>,
    update: UpdateRule<'f, P>,
}

impl<'f, P> CachedOperator<'f, P> {
    /// Operator of size `n × n`.
    pub fn new(n: usize, update: UpdateRule<'f, P>) -> Self {
        Self {
            cache: RefCell::new(Array2::zeros((n, n))),
            update,
        }
    }

    pub fn size(&self) -> usize {
        self.cache.borrow().nrows()
    }

    /// Refresh the buffer for time `t`.
    pub fn update(&self, p: &P, t: f64) {
        let mut cache = self.cache.borrow_mut();
        (self.update)(&mut *cache, p, t);
    }

    /// `L(t)`, which is also `∂f/∂u`.
    pub fn jacobian_at(&self, p: &P, t: f64) -> Array2<Complex64> {
        self.update(p, t);
        self.cache.borrow().clone()
    }

    /// Apply the buffer as it currently stands to a matrix, `L · m`.
    pub(crate) fn apply_left(&self, m: &Array2<Complex64>) -> Array2<Complex64> {
        self.cache.borrow().dot(m)
    }
}

impl<P> OdeFunction<P> for CachedOperator<'_, P> {
    fn eval(&self, du: &mut Array1<Complex64>, u: &Array1<Complex64>, p: &P, t: f64) {
        self.update(p, t);
        du.assign(&self.cache.borrow().dot(u));
    }

    fn is_linear(&self) -> bool {
        true
    }
}
