// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Closed-system drivers: state vectors and propagators.

use ndarray::{Array1, Array2};
use num_complex::Complex64;
use tracing::{debug, info, instrument};

use crate::error::{Error, Result};
use crate::integrator::{self, AlgorithmHint, OdeFunction, OdeProblem, Trajectory};
use crate::linalg::{c, identity, unvectorize, vectorize};
use crate::model::annealing::Annealing;
use crate::model::control::Control;
use crate::model::state::{InitialState, StateLayout};

use super::callback::{pulse_callbacks, PulseTarget};
use super::initial::{build_initial_value, check_aux_data, Representation};
use super::operator::CachedOperator;
use super::params::{OdeParams, SolveOptions};
use super::time::{preprocess_time, TimeSetup};

/// `L(t) = −i · rate · H(s)`, written through [`crate::model::Hamiltonian::update_cache`].
pub fn schrodinger_operator<'a>(dim: usize) -> CachedOperator<'a, OdeParams<'a>> {
    CachedOperator::new(
        dim,
        Box::new(|cache: &mut Array2<Complex64>, p: &OdeParams<'a>, t: f64| {
            p.hamiltonian.update_cache(cache, p.s(t), c(0.0, -p.rate()));
        }),
    )
}

/// `dU/dt = −i · rate · H(s) U` on a column-major flattened propagator.
struct PropagatorRhs<'a> {
    op: CachedOperator<'a, OdeParams<'a>>,
    dim: usize,
}

impl<'a> OdeFunction<OdeParams<'a>> for PropagatorRhs<'a> {
    fn eval(&self, du: &mut Array1<Complex64>, u: &Array1<Complex64>, p: &OdeParams<'a>, t: f64) {
        self.op.update(p, t);
        du.assign(&vectorize(&self.op.apply_left(&unvectorize(u, self.dim))));
    }

    fn is_linear(&self) -> bool {
        true
    }
}

fn reject_composite(control: &Control, solver: &str) -> Result<()> {
    if let Control::CompositeSet(_) = control {
        return Err(Error::Unsupported(format!(
            "composite control sets cannot be used with the {solver} solver"
        )));
    }
    Ok(())
}

fn closed_time(annealing: &Annealing, tf: f64, options: &SolveOptions) -> Result<TimeSetup> {
    annealing.validate()?;
    preprocess_time(
        tf,
        &options.tstops,
        &annealing.tstops,
        annealing.sspan,
        options.dimensionless_time,
    )
}

/// Solve the Schrödinger equation of `annealing` over `tf`.
///
/// # Errors
///
/// A composite control set is rejected with [`Error::Unsupported`] before
/// any other work. Invalid times, states or controls and integrator
/// failures are reported as well.
#[instrument(skip(annealing, options), fields(dim = annealing.dim()))]
pub fn solve_schrodinger(
    annealing: &Annealing,
    tf: f64,
    options: &SolveOptions,
) -> Result<Trajectory> {
    info!(control = annealing.control.kind(), "solving Schrödinger equation");
    reject_composite(&annealing.control, "Schrödinger")?;
    let time = closed_time(annealing, tf, options)?;
    let init = build_initial_value(&annealing.u0, Representation::Vector, false, options.aux_data)?;
    check_aux_data(&init, &annealing.control)?;

    annealing.control.reset();
    let callbacks = pulse_callbacks(&annealing.control, PulseTarget::Ket, &time)?;
    let rhs = schrodinger_operator(init.dim());
    let params = OdeParams {
        hamiltonian: annealing.hamiltonian.as_ref(),
        tf,
        scale: time.scale,
        opensys: None,
        control: &annealing.control,
    };
    debug!(?params, tstops = time.tstops.len(), "assembled Schrödinger problem");

    let problem =
        OdeProblem::new(&rhs, init.flat(), time.tspan, &params, init.layout).with_aux(init.aux);
    let traj = integrator::solve(
        problem,
        AlgorithmHint::NonStiff,
        &time.tstops,
        callbacks,
        &options.solver,
    )?;
    info!(points = traj.len(), "Schrödinger solve finished");
    Ok(traj)
}

/// Solve for the closed-system propagator `U(s)` with `U(s0) = 1`.
///
/// The initial state of `annealing` is not used. Pulses act as `U ← P U`.
/// Feed the result to [`super::InterpolatedUnitary::from_trajectory`] to
/// obtain the unitary the Redfield solver needs.
#[instrument(skip(annealing, options), fields(dim = annealing.dim()))]
pub fn solve_unitary(annealing: &Annealing, tf: f64, options: &SolveOptions) -> Result<Trajectory> {
    info!(control = annealing.control.kind(), "solving for the propagator");
    reject_composite(&annealing.control, "unitary")?;
    let time = closed_time(annealing, tf, options)?;
    let dim = annealing.dim();
    let mut init = build_initial_value(
        &InitialState::Density(identity(dim)),
        Representation::Matrix,
        false,
        options.aux_data,
    )?;
    init.layout = StateLayout::Propagator { dim };
    check_aux_data(&init, &annealing.control)?;

    annealing.control.reset();
    let callbacks = pulse_callbacks(&annealing.control, PulseTarget::Propagator { dim }, &time)?;
    let rhs = PropagatorRhs {
        op: schrodinger_operator(dim),
        dim,
    };
    let params = OdeParams {
        hamiltonian: annealing.hamiltonian.as_ref(),
        tf,
        scale: time.scale,
        opensys: None,
        control: &annealing.control,
    };

    let problem =
        OdeProblem::new(&rhs, init.flat(), time.tspan, &params, init.layout).with_aux(init.aux);
    let traj = integrator::solve(
        problem,
        AlgorithmHint::NonStiff,
        &time.tstops,
        callbacks,
        &options.solver,
    )?;
    info!(points = traj.len(), "propagator solve finished");
    Ok(traj)
}
