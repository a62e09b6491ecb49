// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! The annealing problem handed to every driver.

use std::fmt;

use crate::error::{Result, ValidationError};

use super::control::Control;
use super::coupling::{Bath, Coupling, Environment, Interaction};
use super::hamiltonian::Hamiltonian;
use super::state::InitialState;

/// Hamiltonian, initial state, environment and control of one anneal.
///
/// `tstops` and `sspan` are dimensionless. Drivers borrow the problem, so
/// the same value can be solved repeatedly; the only state a solve touches
/// is the control's progress pointer, which is reset at the start of each
/// solve.
pub struct Annealing {
    pub hamiltonian: Box<dyn Hamiltonian>,
    pub u0: InitialState,
    pub environment: Option<Environment>,
    pub control: Control,
    pub tstops: Vec<f64>,
    pub sspan: (f64, f64),
}

impl Annealing {
    pub fn new(hamiltonian: impl Hamiltonian + 'static, u0: InitialState) -> Self {
        Self {
            hamiltonian: Box::new(hamiltonian),
            u0,
            environment: None,
            control: Control::None,
            tstops: Vec::new(),
            sspan: (0.0, 1.0),
        }
    }

    /// Attach a single coupling set and its bath.
    pub fn with_coupling(mut self, coupling: Coupling, bath: impl Bath + 'static) -> Self {
        self.environment = Some(Environment::Coupled {
            coupling,
            bath: Box::new(bath),
        });
        self
    }

    /// Attach independent interactions.
    pub fn with_interactions(mut self, interactions: Vec<Interaction>) -> Self {
        self.environment = Some(Environment::Interactions(interactions));
        self
    }

    pub fn with_control(mut self, control: Control) -> Self {
        self.control = control;
        self
    }

    pub fn with_tstops(mut self, tstops: Vec<f64>) -> Self {
        self.tstops = tstops;
        self
    }

    pub fn with_sspan(mut self, s0: f64, s1: f64) -> Self {
        self.sspan = (s0, s1);
        self
    }

    /// Hilbert space dimension.
    pub fn dim(&self) -> usize {
        self.hamiltonian.dim()
    }

    /// Check that state, environment and pulses share the Hamiltonian's
    /// dimension.
    pub fn validate(&self) -> Result<()> {
        let d = self.dim();
        let check = |what: &str, actual: usize| -> Result<()> {
            if actual != d {
                return Err(ValidationError::Dimension {
                    what: what.into(),
                    expected: d,
                    actual,
                }
                .into());
            }
            Ok(())
        };
        check("initial state", self.u0.dim())?;
        if let Some(env) = &self.environment {
            for (coupling, _) in env.channels() {
                if let Some(op_dim) = coupling.dim() {
                    check("coupling operator", op_dim)?;
                }
            }
        }
        for ctrl in self.control.pulse_controls() {
            if let Some(pulse_dim) = ctrl.dim() {
                check("pulse", pulse_dim)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Annealing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Annealing")
            .field("dim", &self.dim())
            .field("open", &self.environment.is_some())
            .field("control", &self.control.kind())
            .field("tstops", &self.tstops)
            .field("sspan", &self.sspan)
            .finish()
    }
}
