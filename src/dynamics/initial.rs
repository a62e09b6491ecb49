// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Initial values in the layout each right-hand side expects.

use ndarray::{Array1, Array2};
use num_complex::Complex64;

use crate::error::{Result, ValidationError};
use crate::linalg::vectorize;
use crate::model::control::Control;
use crate::model::state::{AuxData, AuxDataConstructor, InitialState, StateData, StateLayout};
use crate::validation::{validate_normalized, validate_square};

/// Shape the driver evolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    /// State vector.
    Vector,
    /// Density matrix.
    Matrix,
}

/// Initial value ready for the integrator.
#[derive(Debug, Clone, PartialEq)]
pub struct InitialValue {
    pub data: StateData,
    pub layout: StateLayout,
    pub aux: Option<AuxData>,
}

impl InitialValue {
    /// Flat state handed to the integrator.
    pub fn flat(&self) -> Array1<Complex64> {
        self.data.flat()
    }

    pub fn dim(&self) -> usize {
        self.layout.dim()
    }
}

fn projector(psi: &Array1<Complex64>) -> Array2<Complex64> {
    let d = psi.len();
    Array2::from_shape_fn((d, d), |(i, j)| psi[i] * psi[j].conj())
}

/// Convert a raw initial state to the requested representation.
///
/// A ket is checked for unit norm but never renormalised. With
/// `Representation::Matrix` a ket becomes `|ψ⟩⟨ψ|`, and `vectorize` flattens
/// the matrix column-major. The function is pure.
///
/// # Errors
///
/// Rejects a density matrix for the vector representation, non-square
/// density matrices and kets without unit norm.
pub fn build_initial_value(
    state: &InitialState,
    representation: Representation,
    vectorize_state: bool,
    aux: Option<AuxDataConstructor>,
) -> Result<InitialValue> {
    let (data, layout) = match (representation, state) {
        (Representation::Vector, InitialState::Ket(psi)) => {
            validate_normalized("initial state", psi)?;
            (StateData::Vector(psi.clone()), StateLayout::Ket { dim: psi.len() })
        }
        (Representation::Vector, InitialState::Density(_)) => {
            return Err(ValidationError::field(
                "initial state",
                "a density matrix cannot be evolved as a state vector",
            )
            .into());
        }
        (Representation::Matrix, state) => {
            let rho = match state {
                InitialState::Ket(psi) => {
                    validate_normalized("initial state", psi)?;
                    projector(psi)
                }
                InitialState::Density(rho) => {
                    validate_square("initial state", rho)?;
                    rho.clone()
                }
            };
            let dim = rho.nrows();
            if vectorize_state {
                (StateData::Vector(vectorize(&rho)), StateLayout::Vectorized { dim })
            } else {
                (StateData::Matrix(rho), StateLayout::Density { dim })
            }
        }
    };
    let aux = aux.map(|construct| construct(&data));
    Ok(InitialValue { data, layout, aux })
}

/// Reject auxiliary data that the control will not maintain, and tracking
/// controls without auxiliary data to record into.
pub fn check_aux_data(initial: &InitialValue, control: &Control) -> Result<()> {
    match (initial.aux.is_some(), control.uses_aux_data()) {
        (true, false) => Err(ValidationError::IncompatibleAuxData(format!(
            "state carries auxiliary data but control '{}' does not record into it",
            control.kind()
        ))
        .into()),
        (false, true) => Err(ValidationError::IncompatibleAuxData(format!(
            "control '{}' records pulses but the state has no auxiliary data",
            control.kind()
        ))
        .into()),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::linalg::{c, sigma_x};
    use crate::model::control::InstPulseControl;
    use crate::model::state::pulse_counter;
    use crate::test_utils::{excited_density, plus_state};
    use approx::assert_relative_eq;

    #[test]
    fn test_vector_passes_ket_through() {
        let v = build_initial_value(
            &InitialState::Ket(plus_state()),
            Representation::Vector,
            false,
            None,
        )
        .unwrap();
        assert_eq!(v.layout, StateLayout::Ket { dim: 2 });
        assert_eq!(v.flat(), plus_state());
        assert!(v.aux.is_none());
    }

    #[test]
    fn test_matrix_from_ket_is_projector() {
        let v = build_initial_value(
            &InitialState::Ket(plus_state()),
            Representation::Matrix,
            false,
            None,
        )
        .unwrap();
        assert_eq!(v.layout, StateLayout::Density { dim: 2 });
        match &v.data {
            StateData::Matrix(rho) => {
                for z in rho.iter() {
                    assert_relative_eq!(z.re, 0.5, epsilon = 1e-12);
                }
            }
            StateData::Vector(_) => panic!("expected a matrix"),
        }
    }

    #[test]
    fn test_vectorized_layout_is_flat() {
        let v = build_initial_value(
            &InitialState::Density(excited_density()),
            Representation::Matrix,
            true,
            None,
        )
        .unwrap();
        assert_eq!(v.layout, StateLayout::Vectorized { dim: 2 });
        assert!(matches!(v.data, StateData::Vector(ref u) if u.len() == 4));
        assert_eq!(v.flat()[3], c(1.0, 0.0));
    }

    #[test]
    fn test_building_twice_gives_identical_output() {
        let state = InitialState::Ket(plus_state());
        for (repr, vectorize_state) in [
            (Representation::Vector, false),
            (Representation::Matrix, false),
            (Representation::Matrix, true),
        ] {
            let build = || build_initial_value(&state, repr, vectorize_state, Some(pulse_counter));
            assert_eq!(build().unwrap(), build().unwrap());
        }
    }

    #[test]
    fn test_rejects_density_for_vector_and_unnormalised_ket() {
        let err = build_initial_value(
            &InitialState::Density(excited_density()),
            Representation::Vector,
            false,
            None,
        );
        assert!(matches!(err, Err(Error::Validation(_))));

        let bad = Array1::from(vec![c(1.0, 0.0), c(1.0, 0.0)]);
        let err = build_initial_value(&InitialState::Ket(bad), Representation::Vector, false, None);
        assert!(err.is_err());
        assert!(build_initial_value(
            &InitialState::Density(Array2::zeros((2, 3))),
            Representation::Matrix,
            false,
            None
        )
        .is_err());
    }

    #[test]
    fn test_check_aux_data() {
        let plain = build_initial_value(
            &InitialState::Ket(plus_state()),
            Representation::Vector,
            false,
            None,
        )
        .unwrap();
        let wrapped = build_initial_value(
            &InitialState::Ket(plus_state()),
            Representation::Vector,
            false,
            Some(pulse_counter),
        )
        .unwrap();
        let untracked =
            Control::InstantaneousPulse(InstPulseControl::fixed(vec![0.5], sigma_x()).unwrap());
        let tracked = Control::InstantaneousPulse(
            InstPulseControl::fixed(vec![0.5], sigma_x())
                .unwrap()
                .tracked(),
        );

        assert!(check_aux_data(&plain, &Control::None).is_ok());
        assert!(check_aux_data(&plain, &untracked).is_ok());
        assert!(check_aux_data(&wrapped, &tracked).is_ok());
        assert!(matches!(
            check_aux_data(&wrapped, &untracked),
            Err(Error::Validation(ValidationError::IncompatibleAuxData(_)))
        ));
        assert!(check_aux_data(&plain, &tracked).is_err());
        assert!(check_aux_data(&wrapped, &Control::None).is_err());
    }
}
