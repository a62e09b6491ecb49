// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Pulse callbacks and the positivity diagnostic.

use ndarray::Array2;
use num_complex::Complex64;
use tracing::{debug, warn};

use crate::error::{Error, Result, ValidationError};
use crate::integrator::{Callback, CallbackSet, Diagnostic};
use crate::linalg::{dagger, min_hermitian_eigenvalue, unvectorize, vectorize};
use crate::model::control::{Control, InstPulseControl};

use super::time::TimeSetup;

/// Eigenvalues of the Hermitian part below `−POSITIVITY_TOLERANCE` are
/// reported.
pub const POSITIVITY_TOLERANCE: f64 = 1e-8;

/// What a pulse `P` acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseTarget {
    /// `ψ ← P ψ`.
    Ket,
    /// `U ← P U`, flat column-major.
    Propagator { dim: usize },
    /// `ρ ← P ρ P†`, flat column-major (matrix or vectorized layout).
    Density { dim: usize },
}

impl PulseTarget {
    fn is_closed(&self) -> bool {
        !matches!(self, PulseTarget::Density { .. })
    }
}

fn apply_pulse(target: PulseTarget, pulse: &Array2<Complex64>, u: &mut ndarray::Array1<Complex64>) {
    match target {
        PulseTarget::Ket => {
            let next = pulse.dot(&*u);
            u.assign(&next);
        }
        PulseTarget::Propagator { dim } => {
            let next = vectorize(&pulse.dot(&unvectorize(u, dim)));
            u.assign(&next);
        }
        PulseTarget::Density { dim } => {
            let rho = unvectorize(u, dim);
            let next = vectorize(&pulse.dot(&rho).dot(&dagger(pulse)));
            u.assign(&next);
        }
    }
}

fn pulse_callback<'a>(
    ctrl: &'a InstPulseControl,
    target: PulseTarget,
    time: &TimeSetup,
) -> Result<Callback<'a>> {
    let times: Vec<f64> = ctrl.times().iter().map(|&s| time.scale.to_solver(s)).collect();
    if let Some(bad) = times.iter().find(|&&t| !time.contains(t)) {
        return Err(ValidationError::field(
            "pulse times",
            format!(
                "pulse at solver time {bad} outside the span ({}, {})",
                time.tspan.0,
                time.tspan.1
            ),
        )
        .into());
    }
    Ok(Callback::preset(
        times,
        Box::new(move |t, u, aux| {
            let Some(pulse) = ctrl.next_pulse() else {
                warn!(t, "pulse time reached after every pulse was applied");
                return;
            };
            apply_pulse(target, pulse, u);
            if ctrl.tracks_state() {
                if let Some(aux) = aux {
                    aux.pulses_applied += 1;
                }
            }
            debug!(t, progress = ctrl.progress(), "pulse applied");
        }),
    ))
}

/// Callbacks realising `control` on states of kind `target`.
///
/// # Errors
///
/// A composite control set is unsupported for closed-system targets. Pulse
/// times outside the solver span are rejected.
pub fn pulse_callbacks<'a>(
    control: &'a Control,
    target: PulseTarget,
    time: &TimeSetup,
) -> Result<CallbackSet<'a>> {
    let mut set = CallbackSet::new();
    match control {
        Control::None => {}
        Control::InstantaneousPulse(ctrl) => set.push(pulse_callback(ctrl, target, time)?),
        Control::CompositeSet(members) => {
            if target.is_closed() {
                return Err(Error::Unsupported(
                    "composite control sets are not supported by closed-system solvers".into(),
                ));
            }
            for ctrl in members.members() {
                set.push(pulse_callback(ctrl, target, time)?);
            }
        }
    }
    Ok(set)
}

/// Per-step check that the Hermitian part of `ρ` stays positive.
///
/// Violations are logged and recorded; the state is left untouched.
pub fn positivity_callback<'a>(dim: usize) -> Callback<'a> {
    Callback::step(Box::new(move |t, u| {
        let min_eigenvalue = min_hermitian_eigenvalue(&unvectorize(u, dim));
        if min_eigenvalue < -POSITIVITY_TOLERANCE {
            warn!(t, min_eigenvalue, "density matrix lost positivity");
            Some(Diagnostic::PositivityViolation { t, min_eigenvalue })
        } else {
            None
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::time::preprocess_time;
    use crate::linalg::{c, sigma_x};
    use crate::model::control::ControlSet;
    use crate::model::state::AuxData;
    use ndarray::Array1;

    fn setup() -> TimeSetup {
        preprocess_time(10.0, &[], &[], (0.0, 1.0), false).unwrap()
    }

    fn fire(cb: Callback<'_>, t: f64, u: &mut Array1<Complex64>, aux: Option<&mut AuxData>) {
        match cb {
            Callback::PresetTime(mut p) => (p.affect)(t, u, aux),
            Callback::Step(_) => panic!("expected a preset callback"),
        }
    }

    #[test]
    fn test_pulse_times_are_scaled_to_solver_units() {
        let pulse = InstPulseControl::fixed(vec![0.25, 0.5], sigma_x()).unwrap();
        let control = Control::InstantaneousPulse(pulse);
        let set = pulse_callbacks(&control, PulseTarget::Ket, &setup()).unwrap();
        assert_eq!(set.preset_times(), vec![2.5, 5.0]);
    }

    #[test]
    fn test_ket_pulse_flips_state_and_counts() {
        let ctrl = InstPulseControl::fixed(vec![0.5], sigma_x()).unwrap().tracked();
        let cb = pulse_callback(&ctrl, PulseTarget::Ket, &setup()).unwrap();
        let mut u = Array1::from(vec![c(1.0, 0.0), c(0.0, 0.0)]);
        let mut aux = AuxData::default();
        fire(cb, 5.0, &mut u, Some(&mut aux));
        assert_eq!(u[1], c(1.0, 0.0));
        assert_eq!(aux.pulses_applied, 1);
        assert_eq!(ctrl.progress(), 1);
    }

    #[test]
    fn test_density_pulse_conjugates() {
        let ctrl = InstPulseControl::fixed(vec![0.5], sigma_x()).unwrap();
        let cb = pulse_callback(&ctrl, PulseTarget::Density { dim: 2 }, &setup()).unwrap();
        // |0⟩⟨0| flattened column-major
        let mut u = Array1::from(vec![c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(0.0, 0.0)]);
        fire(cb, 5.0, &mut u, None);
        assert_eq!(u[3], c(1.0, 0.0));
        assert_eq!(u[0], c(0.0, 0.0));
    }

    #[test]
    fn test_untracked_pulse_leaves_aux_alone() {
        let ctrl = InstPulseControl::fixed(vec![0.5], sigma_x()).unwrap();
        let cb = pulse_callback(&ctrl, PulseTarget::Ket, &setup()).unwrap();
        let mut u = Array1::from(vec![c(1.0, 0.0), c(0.0, 0.0)]);
        let mut aux = AuxData::default();
        fire(cb, 5.0, &mut u, Some(&mut aux));
        assert_eq!(aux.pulses_applied, 0);
    }

    #[test]
    fn test_composite_set_is_unsupported_for_closed_targets() {
        let control = Control::CompositeSet(ControlSet::new(vec![
            InstPulseControl::fixed(vec![0.5], sigma_x()).unwrap(),
        ]));
        assert!(matches!(
            pulse_callbacks(&control, PulseTarget::Ket, &setup()),
            Err(Error::Unsupported(_))
        ));
        assert!(matches!(
            pulse_callbacks(&control, PulseTarget::Propagator { dim: 2 }, &setup()),
            Err(Error::Unsupported(_))
        ));
        let set = pulse_callbacks(&control, PulseTarget::Density { dim: 2 }, &setup()).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_pulse_outside_span_rejected() {
        let control =
            Control::InstantaneousPulse(InstPulseControl::fixed(vec![1.5], sigma_x()).unwrap());
        assert!(pulse_callbacks(&control, PulseTarget::Ket, &setup()).is_err());
    }

    #[test]
    fn test_positivity_callback_reports_negative_population() {
        let mut hook = match positivity_callback(2) {
            Callback::Step(s) => s.hook,
            Callback::PresetTime(_) => panic!("expected a step callback"),
        };
        let good = Array1::from(vec![c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(0.0, 0.0)]);
        assert!(hook(0.1, &good).is_none());
        let bad = Array1::from(vec![c(1.1, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(-0.1, 0.0)]);
        match hook(0.2, &bad) {
            Some(Diagnostic::PositivityViolation { t, min_eigenvalue }) => {
                assert_eq!(t, 0.2);
                assert!((min_eigenvalue + 0.1).abs() < 1e-12);
            }
            None => panic!("violation not reported"),
        }
    }
}
