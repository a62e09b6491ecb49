// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Problem description consumed by the drivers.
//!
//! - [`hamiltonian`]: time-dependent Hamiltonians and reference builders
//! - [`coupling`]: coupling operators, baths and interactions
//! - [`control`]: instantaneous pulse controls
//! - [`state`]: initial states, flat layouts and auxiliary data
//! - [`annealing`]: the bundled problem

pub mod annealing;
pub mod control;
pub mod coupling;
pub mod hamiltonian;
pub mod state;

pub use annealing::Annealing;
pub use control::{rotation_pulse, Axis, Control, ControlSet, InstPulseControl, Pulses};
pub use coupling::{Bath, Coupling, CouplingOperator, Environment, ExponentialBath, Interaction};
pub use hamiltonian::{ising_problem, transverse_driver, DenseHamiltonian, Hamiltonian, Schedule};
pub use state::{pulse_counter, AuxData, AuxDataConstructor, InitialState, StateData, StateLayout};
