// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Input validation for driver arguments.

use ndarray::{Array1, Array2};
use num_complex::Complex64;

use crate::error::{Result, ValidationError};

/// Tolerance on `‖ψ‖ − 1` for initial kets.
pub const NORM_TOLERANCE: f64 = 1e-8;

/// Validate a strictly positive, finite scalar.
pub fn validate_positive(field: &str, value: f64) -> Result<()> {
    if value.is_nan() {
        return Err(ValidationError::field(field, "is NaN").into());
    }
    if value.is_infinite() {
        return Err(ValidationError::field(field, "is infinite").into());
    }
    if value <= 0.0 {
        return Err(ValidationError::field(field, format!("must be positive, got {value}")).into());
    }
    Ok(())
}

/// Validate a finite interval with `start < end`.
pub fn validate_span(field: &str, (start, end): (f64, f64)) -> Result<()> {
    if !start.is_finite() || !end.is_finite() {
        return Err(ValidationError::field(field, format!("({start}, {end}) is not finite")).into());
    }
    if start >= end {
        return Err(ValidationError::field(
            field,
            format!("start {start} must be below end {end}"),
        )
        .into());
    }
    Ok(())
}

/// Validate that every value is finite.
pub fn validate_finite(field: &str, values: &[f64]) -> Result<()> {
    for (i, val) in values.iter().enumerate() {
        if val.is_nan() {
            let msg = format!("contains NaN at index {}", i);
            return Err(ValidationError::field(field, msg).into());
        }
        if val.is_infinite() {
            let msg = format!("contains Inf at index {}", i);
            return Err(ValidationError::field(field, msg).into());
        }
    }
    Ok(())
}

/// Validate a square matrix.
pub fn validate_square(field: &str, m: &Array2<Complex64>) -> Result<()> {
    if m.nrows() != m.ncols() {
        return Err(ValidationError::field(
            field,
            format!("must be square, got {} × {}", m.nrows(), m.ncols()),
        )
        .into());
    }
    if m.nrows() == 0 {
        return Err(ValidationError::field(field, "must not be empty").into());
    }
    Ok(())
}

/// Validate a unit-norm state vector. The state is not renormalised.
pub fn validate_normalized(field: &str, psi: &Array1<Complex64>) -> Result<()> {
    if psi.is_empty() {
        return Err(ValidationError::field(field, "must not be empty").into());
    }
    let norm = psi.iter().map(|z| z.norm_sqr()).sum::<f64>().sqrt();
    if !norm.is_finite() || (norm - 1.0).abs() > NORM_TOLERANCE {
        return Err(ValidationError::PhysicsConstraint(format!(
            "{field} must have unit norm, got {norm}"
        ))
        .into());
    }
    Ok(())
}
