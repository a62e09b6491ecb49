// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! System–bath coupling descriptions.
//!
//! An open-system solve needs system operators `A_α(s)` and a bath
//! two-point correlation `C(τ)`. Both are consumed once per solve to build
//! the Redfield generator; this module only describes them.

use std::fmt;

use ndarray::Array2;
use num_complex::Complex64;

use crate::error::{Result, ValidationError};
use crate::linalg::c;

/// One system operator coupled to the bath.
pub enum CouplingOperator {
    /// Constant operator.
    Constant(Array2<Complex64>),
    /// Operator depending on dimensionless time.
    TimeDependent {
        dim: usize,
        op: Box<dyn Fn(f64) -> Array2<Complex64>>,
    },
}

impl CouplingOperator {
    /// Evaluate the operator at `s`.
    pub fn at(&self, s: f64) -> Array2<Complex64> {
        match self {
            CouplingOperator::Constant(m) => m.clone(),
            CouplingOperator::TimeDependent { op, .. } => op(s),
        }
    }

    /// Operator dimension.
    pub fn dim(&self) -> usize {
        match self {
            CouplingOperator::Constant(m) => m.nrows(),
            CouplingOperator::TimeDependent { dim, .. } => *dim,
        }
    }
}

impl fmt::Debug for CouplingOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CouplingOperator::Constant(m) => f.debug_tuple("Constant").field(&m.dim()).finish(),
            CouplingOperator::TimeDependent { dim, .. } => {
                f.debug_struct("TimeDependent").field("dim", dim).finish()
            }
        }
    }
}

/// Set of system operators sharing one bath.
#[derive(Debug, Default)]
pub struct Coupling {
    ops: Vec<CouplingOperator>,
}

impl Coupling {
    /// Build from operators; all must be square and of equal dimension.
    pub fn new(ops: Vec<CouplingOperator>) -> Result<Self> {
        if let Some(first) = ops.first() {
            let d = first.dim();
            for op in &ops {
                if let CouplingOperator::Constant(m) = op {
                    if m.nrows() != m.ncols() {
                        return Err(ValidationError::field(
                            "coupling",
                            format!("operator must be square, got {} × {}", m.nrows(), m.ncols()),
                        )
                        .into());
                    }
                }
                if op.dim() != d {
                    return Err(ValidationError::Dimension {
                        what: "coupling operator".into(),
                        expected: d,
                        actual: op.dim(),
                    }
                    .into());
                }
            }
        }
        Ok(Self { ops })
    }

    /// Constant operators.
    pub fn constant(ops: Vec<Array2<Complex64>>) -> Result<Self> {
        Self::new(ops.into_iter().map(CouplingOperator::Constant).collect())
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CouplingOperator> {
        self.ops.iter()
    }

    /// Common dimension, `None` when there are no operators.
    pub fn dim(&self) -> Option<usize> {
        self.ops.first().map(CouplingOperator::dim)
    }
}

/// Bath two-point correlation function `C(τ)` in physical time units.
pub trait Bath {
    fn correlation(&self, tau: f64) -> Complex64;
}

impl<F> Bath for F
where
    F: Fn(f64) -> Complex64,
{
    fn correlation(&self, tau: f64) -> Complex64 {
        self(tau)
    }
}

/// Exponentially decaying correlation `C(τ) = g · exp(−ω_c |τ|)`.
///
/// A phenomenological stand-in for a real spectral density; enough to
/// drive the Redfield machinery from configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialBath {
    /// Correlation amplitude `g` (rate², angular units).
    pub strength: f64,
    /// Decay rate `ω_c` of the correlation.
    pub cutoff: f64,
}

impl ExponentialBath {
    pub fn new(strength: f64, cutoff: f64) -> Result<Self> {
        if !(strength >= 0.0 && strength.is_finite()) {
            return Err(ValidationError::PhysicsConstraint(format!(
                "bath strength must be non-negative, got {strength}"
            ))
            .into());
        }
        if !(cutoff > 0.0 && cutoff.is_finite()) {
            return Err(ValidationError::PhysicsConstraint(format!(
                "bath cutoff must be positive, got {cutoff}"
            ))
            .into());
        }
        Ok(Self { strength, cutoff })
    }
}

impl Bath for ExponentialBath {
    fn correlation(&self, tau: f64) -> Complex64 {
        c(self.strength * (-self.cutoff * tau.abs()).exp(), 0.0)
    }
}

/// A coupling paired with its own bath.
pub struct Interaction {
    pub coupling: Coupling,
    pub bath: Box<dyn Bath>,
}

impl Interaction {
    pub fn new(coupling: Coupling, bath: impl Bath + 'static) -> Self {
        Self {
            coupling,
            bath: Box::new(bath),
        }
    }
}

/// How the system talks to its environment.
pub enum Environment {
    /// One coupling set, one bath.
    Coupled {
        coupling: Coupling,
        bath: Box<dyn Bath>,
    },
    /// Independent interactions, each with its own bath.
    Interactions(Vec<Interaction>),
}

impl Environment {
    /// Every coupling set with its bath.
    pub fn channels(&self) -> Vec<(&Coupling, &dyn Bath)> {
        match self {
            Environment::Coupled { coupling, bath } => vec![(coupling, bath.as_ref())],
            Environment::Interactions(list) => list
                .iter()
                .map(|i| (&i.coupling, i.bath.as_ref()))
                .collect(),
        }
    }
}
