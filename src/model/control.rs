// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Instantaneous pulse controls.
//!
//! A pulse control fires unitary kicks at fixed dimensionless times. The
//! progress pointer lives in a [`Cell`] so that callbacks holding a shared
//! reference to the control can advance it during integration; drivers
//! reset it before every solve.

use std::cell::Cell;

use ndarray::Array2;
use num_complex::Complex64;

use crate::error::{Result, ValidationError};
use crate::linalg::{c, local_operator, matrix_exp, sigma_x, sigma_y, sigma_z};

/// Pulse matrices of a control.
#[derive(Debug, Clone, PartialEq)]
pub enum Pulses {
    /// The same pulse at every time.
    Fixed(Array2<Complex64>),
    /// One pulse per time, in order.
    Sequence(Vec<Array2<Complex64>>),
}

impl Pulses {
    fn dim(&self) -> Option<usize> {
        match self {
            Pulses::Fixed(p) => Some(p.nrows()),
            Pulses::Sequence(list) => list.first().map(Array2::nrows),
        }
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &Array2<Complex64>> + '_> {
        match self {
            Pulses::Fixed(p) => Box::new(std::iter::once(p)),
            Pulses::Sequence(list) => Box::new(list.iter()),
        }
    }
}

/// Pulses applied instantaneously at given dimensionless times.
#[derive(Debug)]
pub struct InstPulseControl {
    times: Vec<f64>,
    pulses: Pulses,
    progress: Cell<usize>,
    track_in_state: bool,
}

impl InstPulseControl {
    /// Build a control firing `pulses` at `times` (dimensionless, ascending).
    ///
    /// # Errors
    ///
    /// Rejects non-finite or decreasing times, a sequence whose length does
    /// not match the times, and pulses that are not square of one size.
    pub fn new(times: Vec<f64>, pulses: Pulses) -> Result<Self> {
        if let Some(bad) = times.iter().find(|t| !t.is_finite()) {
            let msg = format!("non-finite time {bad}");
            return Err(ValidationError::field("pulse times", msg).into());
        }
        if times.windows(2).any(|w| w[1] < w[0]) {
            return Err(ValidationError::field("pulse times", "must be ascending").into());
        }
        if let Pulses::Sequence(list) = &pulses {
            if list.len() != times.len() {
                return Err(ValidationError::Dimension {
                    what: "pulse sequence".into(),
                    expected: times.len(),
                    actual: list.len(),
                }
                .into());
            }
        }
        if let Some(d) = pulses.dim() {
            for p in pulses.iter() {
                if p.nrows() != p.ncols() || p.nrows() != d {
                    return Err(ValidationError::Dimension {
                        what: "pulse".into(),
                        expected: d,
                        actual: p.ncols().max(p.nrows()),
                    }
                    .into());
                }
            }
        }
        Ok(Self {
            times,
            pulses,
            progress: Cell::new(0),
            track_in_state: false,
        })
    }

    /// Same pulse at every time.
    pub fn fixed(times: Vec<f64>, pulse: Array2<Complex64>) -> Result<Self> {
        Self::new(times, Pulses::Fixed(pulse))
    }

    /// One pulse per time.
    pub fn sequence(times: Vec<f64>, pulses: Vec<Array2<Complex64>>) -> Result<Self> {
        Self::new(times, Pulses::Sequence(pulses))
    }

    /// Record applied pulses in the state's auxiliary data.
    pub fn tracked(mut self) -> Self {
        self.track_in_state = true;
        self
    }

    pub fn tracks_state(&self) -> bool {
        self.track_in_state
    }

    /// Pulse times in dimensionless units.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Pulse dimension, `None` for an empty sequence.
    pub fn dim(&self) -> Option<usize> {
        self.pulses.dim()
    }

    /// Number of pulses applied since the last reset.
    pub fn progress(&self) -> usize {
        self.progress.get()
    }

    pub fn reset(&self) {
        self.progress.set(0);
    }

    /// Pulse to apply next, advancing the progress pointer.
    ///
    /// Returns `None` once every pulse time has been consumed.
    pub fn next_pulse(&self) -> Option<&Array2<Complex64>> {
        let k = self.progress.get();
        if k >= self.times.len() {
            return None;
        }
        let pulse = match &self.pulses {
            Pulses::Fixed(p) => p,
            Pulses::Sequence(list) => list.get(k)?,
        };
        self.progress.set(k + 1);
        Some(pulse)
    }
}

/// Several pulse controls acting on one state.
#[derive(Debug, Default)]
pub struct ControlSet {
    members: Vec<InstPulseControl>,
}

impl ControlSet {
    pub fn new(members: Vec<InstPulseControl>) -> Self {
        Self { members }
    }

    pub fn members(&self) -> &[InstPulseControl] {
        &self.members
    }
}

/// Control attached to an annealing problem.
#[derive(Debug, Default)]
pub enum Control {
    #[default]
    None,
    InstantaneousPulse(InstPulseControl),
    CompositeSet(ControlSet),
}

impl Control {
    /// Rewind every progress pointer.
    pub fn reset(&self) {
        for ctrl in self.pulse_controls() {
            ctrl.reset();
        }
    }

    /// Whether any member records pulses in auxiliary data.
    pub fn uses_aux_data(&self) -> bool {
        self.pulse_controls().iter().any(|c| c.tracks_state())
    }

    /// Every pulse control, flattened.
    pub fn pulse_controls(&self) -> Vec<&InstPulseControl> {
        match self {
            Control::None => Vec::new(),
            Control::InstantaneousPulse(ctrl) => vec![ctrl],
            Control::CompositeSet(set) => set.members.iter().collect(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Control::None => "none",
            Control::InstantaneousPulse(_) => "instantaneous_pulse",
            Control::CompositeSet(_) => "composite_set",
        }
    }
}

/// Rotation axis of a single-qubit pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

/// `exp(−i θ/2 σ_axis)` on `qubit` of an `n`-qubit register.
///
/// # Errors
///
/// Rejects a qubit index outside the register.
pub fn rotation_pulse(
    axis: Axis,
    angle: f64,
    qubit: usize,
    num_qubits: usize,
) -> Result<Array2<Complex64>> {
    if qubit >= num_qubits {
        return Err(ValidationError::field(
            "qubit",
            format!("index {qubit} out of range for {num_qubits} qubits"),
        )
        .into());
    }
    let sigma = match axis {
        Axis::X => sigma_x(),
        Axis::Y => sigma_y(),
        Axis::Z => sigma_z(),
    };
    let rotation = matrix_exp(&(sigma * c(0.0, -angle / 2.0))).ok_or_else(|| {
        ValidationError::PhysicsConstraint("rotation exponential is singular".into())
    })?;
    Ok(local_operator(&rotation, qubit, num_qubits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::identity;
    use std::f64::consts::PI;

    #[test]
    fn test_fixed_pulse_progress_and_reset() {
        let ctrl = InstPulseControl::fixed(vec![0.25, 0.75], sigma_x()).unwrap();
        assert!(ctrl.next_pulse().is_some());
        assert!(ctrl.next_pulse().is_some());
        assert!(ctrl.next_pulse().is_none());
        assert_eq!(ctrl.progress(), 2);
        ctrl.reset();
        assert_eq!(ctrl.progress(), 0);
    }

    #[test]
    fn test_sequence_returns_pulses_in_order() {
        let ctrl = InstPulseControl::sequence(vec![0.1, 0.2], vec![sigma_x(), sigma_z()]).unwrap();
        assert_eq!(ctrl.next_pulse().unwrap(), &sigma_x());
        assert_eq!(ctrl.next_pulse().unwrap(), &sigma_z());
    }

    #[test]
    fn test_rejects_bad_controls() {
        assert!(InstPulseControl::sequence(vec![0.1, 0.2], vec![sigma_x()]).is_err());
        assert!(InstPulseControl::fixed(vec![0.5, 0.2], sigma_x()).is_err());
        assert!(InstPulseControl::fixed(vec![f64::NAN], sigma_x()).is_err());
        assert!(InstPulseControl::sequence(vec![0.1, 0.2], vec![sigma_x(), identity(4)]).is_err());
    }

    #[test]
    fn test_control_reset_covers_every_member() {
        let a = InstPulseControl::fixed(vec![0.5], sigma_x()).unwrap();
        let b = InstPulseControl::fixed(vec![0.5], sigma_z()).unwrap().tracked();
        let control = Control::CompositeSet(ControlSet::new(vec![a, b]));
        for ctrl in control.pulse_controls() {
            ctrl.next_pulse();
        }
        control.reset();
        assert!(control.pulse_controls().iter().all(|c| c.progress() == 0));
        assert!(control.uses_aux_data());
        assert_eq!(control.kind(), "composite_set");
    }

    #[test]
    fn test_none_control_has_no_members() {
        let control = Control::default();
        assert!(control.pulse_controls().is_empty());
        assert!(!control.uses_aux_data());
    }

    #[test]
    fn test_pi_rotation_about_x_flips_qubit() {
        let p = rotation_pulse(Axis::X, PI, 0, 1).unwrap();
        assert!((p[[1, 0]] - c(0.0, -1.0)).norm() < 1e-12);
        assert!(p[[0, 0]].norm() < 1e-12);
        assert!(rotation_pulse(Axis::Z, PI, 2, 2).is_err());
    }
}
