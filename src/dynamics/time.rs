// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Time scaling between dimensionless `s` and solver time.
//!
//! In dimensionless mode the solver runs in `s` directly and every
//! right-hand side is multiplied by `tf`. In physical mode the solver runs
//! in `t = tf · s` and right-hand sides are unscaled.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use crate::validation::{validate_finite, validate_positive, validate_span};

/// Mapping between solver time and dimensionless time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TimeScale {
    Dimensionless { tf: f64 },
    Physical { tf: f64 },
}

impl TimeScale {
    pub fn new(tf: f64, dimensionless: bool) -> Self {
        if dimensionless {
            TimeScale::Dimensionless { tf }
        } else {
            TimeScale::Physical { tf }
        }
    }

    pub fn tf(&self) -> f64 {
        match *self {
            TimeScale::Dimensionless { tf } | TimeScale::Physical { tf } => tf,
        }
    }

    /// Factor multiplying every right-hand side.
    pub fn rate(&self) -> f64 {
        match *self {
            TimeScale::Dimensionless { tf } => tf,
            TimeScale::Physical { .. } => 1.0,
        }
    }

    /// Dimensionless time at solver time `t`.
    pub fn s(&self, t: f64) -> f64 {
        match *self {
            TimeScale::Dimensionless { .. } => t,
            TimeScale::Physical { tf } => t / tf,
        }
    }

    /// Solver time at dimensionless time `s`.
    pub fn to_solver(&self, s: f64) -> f64 {
        match *self {
            TimeScale::Dimensionless { .. } => s,
            TimeScale::Physical { tf } => s * tf,
        }
    }
}

/// Output of [`preprocess_time`].
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSetup {
    pub scale: TimeScale,
    /// Solver span.
    pub tspan: (f64, f64),
    /// Strictly increasing stop-times in solver units.
    pub tstops: Vec<f64>,
}

impl TimeSetup {
    /// Whether a solver time lies inside the span.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.tspan.0 && t <= self.tspan.1
    }
}

/// Resolve the solver span and merged stop-times.
///
/// `extra_stops` are in solver units; `annealing_stops` and `sspan` are
/// dimensionless.
///
/// # Errors
///
/// Rejects a non-positive `tf`, an empty or non-finite span, non-finite
/// stop-times and stop-times outside the solver span.
pub fn preprocess_time(
    tf: f64,
    extra_stops: &[f64],
    annealing_stops: &[f64],
    sspan: (f64, f64),
    dimensionless: bool,
) -> Result<TimeSetup> {
    validate_positive("tf", tf)?;
    validate_span("sspan", sspan)?;
    validate_finite("tstops", extra_stops)?;
    validate_finite("annealing tstops", annealing_stops)?;

    let scale = TimeScale::new(tf, dimensionless);
    let tspan = (scale.to_solver(sspan.0), scale.to_solver(sspan.1));
    let mut tstops: Vec<f64> = annealing_stops
        .iter()
        .map(|&s| scale.to_solver(s))
        .chain(extra_stops.iter().copied())
        .collect();
    tstops.sort_by(f64::total_cmp);
    tstops.dedup();

    let setup = TimeSetup {
        scale,
        tspan,
        tstops,
    };
    if let Some(&bad) = setup.tstops.iter().find(|&&t| !setup.contains(t)) {
        return Err(ValidationError::field(
            "tstops",
            format!("stop-time {bad} outside the solver span ({}, {})", tspan.0, tspan.1),
        )
        .into());
    }
    Ok(setup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dimensionless_stops_pass_through() {
        let setup = preprocess_time(10.0, &[], &[0.5, 0.2, 0.5], (0.0, 1.0), true).unwrap();
        assert_eq!(setup.tstops, vec![0.2, 0.5]);
        assert_eq!(setup.tspan, (0.0, 1.0));
        assert_eq!(setup.scale.rate(), 10.0);
    }

    #[test]
    fn test_physical_stops_are_scaled() {
        let setup = preprocess_time(10.0, &[], &[0.5, 0.2], (0.0, 1.0), false).unwrap();
        assert_eq!(setup.tstops, vec![2.0, 5.0]);
        assert_eq!(setup.tspan, (0.0, 10.0));
        assert_eq!(setup.scale.rate(), 1.0);
        assert_relative_eq!(setup.scale.s(5.0), 0.5);
    }

    #[test]
    fn test_empty_extra_stops_give_strictly_increasing_annealing_stops() {
        let annealing = [0.9, 0.1, 0.4, 0.1];
        for dimensionless in [true, false] {
            let setup = preprocess_time(4.0, &[], &annealing, (0.0, 1.0), dimensionless).unwrap();
            assert!(setup.tstops.windows(2).all(|w| w[0] < w[1]));
            let factor = if dimensionless { 1.0 } else { 4.0 };
            let expected: Vec<f64> = [0.1, 0.4, 0.9].iter().map(|s| s * factor).collect();
            assert_eq!(setup.tstops, expected);
        }
    }

    #[test]
    fn test_extra_stops_are_solver_units() {
        let setup = preprocess_time(10.0, &[3.0], &[0.5], (0.0, 1.0), false).unwrap();
        assert_eq!(setup.tstops, vec![3.0, 5.0]);
    }

    #[test]
    fn test_shifted_span() {
        let setup = preprocess_time(2.0, &[], &[0.75], (0.5, 1.0), false).unwrap();
        assert_eq!(setup.tspan, (1.0, 2.0));
        assert_eq!(setup.tstops, vec![1.5]);
    }

    #[test]
    fn test_rejects_invalid_input() {
        assert!(preprocess_time(0.0, &[], &[], (0.0, 1.0), true).is_err());
        assert!(preprocess_time(f64::INFINITY, &[], &[], (0.0, 1.0), true).is_err());
        assert!(preprocess_time(1.0, &[], &[], (1.0, 1.0), true).is_err());
        assert!(preprocess_time(1.0, &[f64::NAN], &[], (0.0, 1.0), true).is_err());
        assert!(preprocess_time(1.0, &[2.0], &[], (0.0, 1.0), true).is_err());
        assert!(preprocess_time(1.0, &[], &[-0.1], (0.0, 1.0), true).is_err());
    }
}
