// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Density-matrix right-hand sides and the closed-system von Neumann driver.

use std::cell::RefCell;

use ndarray::{Array1, Array2};
use num_complex::Complex64;
use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::integrator::{self, AlgorithmHint, OdeFunction, OdeProblem, Trajectory};
use crate::linalg::{c, identity, kron, unvectorize, vectorize};
use crate::model::annealing::Annealing;

use super::callback::{pulse_callbacks, PulseTarget};
use super::initial::{build_initial_value, check_aux_data, Representation};
use super::operator::CachedOperator;
use super::params::{OdeParams, SolveOptions};
use super::time::preprocess_time;

/// Liouvillian of `ρ ↦ −i · rate · [H, ρ]`: `−i · rate · (I ⊗ H − Hᵀ ⊗ I)`.
pub fn hamiltonian_liouvillian(h: &Array2<Complex64>, rate: f64) -> Array2<Complex64> {
    let eye = identity(h.nrows());
    (kron(&eye, h) - kron(&h.t().to_owned(), &eye)) * c(0.0, -rate)
}

/// Vectorized closed-system operator.
pub(crate) fn von_neumann_operator<'a>(dim: usize) -> CachedOperator<'a, OdeParams<'a>> {
    CachedOperator::new(
        dim * dim,
        Box::new(|cache: &mut Array2<Complex64>, p: &OdeParams<'a>, t: f64| {
            cache.assign(&hamiltonian_liouvillian(&p.hamiltonian.at(p.s(t)), p.rate()));
        }),
    )
}

/// Direct density-matrix right-hand side
/// `du = −i · rate · [H(s), ρ] + rate · D(s) ρ`.
///
/// The dissipator term is present only when the parameters carry an open
/// system.
pub struct DensityRhs {
    dim: usize,
    h: RefCell<Array2<Complex64>>,
}

impl DensityRhs {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            h: RefCell::new(Array2::zeros((dim, dim))),
        }
    }
}

impl OdeFunction<OdeParams<'_>> for DensityRhs {
    fn eval(&self, du: &mut Array1<Complex64>, u: &Array1<Complex64>, p: &OdeParams<'_>, t: f64) {
        let s = p.s(t);
        let rate = p.rate();
        let rho = unvectorize(u, self.dim);
        let mut h = self.h.borrow_mut();
        p.hamiltonian.update_cache(&mut *h, s, c(0.0, -rate));
        let mut drho = h.dot(&rho) - rho.dot(&*h);
        if let Some(opensys) = p.opensys {
            opensys.dissipate(&mut drho, &rho, s, rate);
        }
        du.assign(&vectorize(&drho));
    }
}

/// Solve the von Neumann equation `dρ/dt = −i[H, ρ]` of `annealing`.
///
/// Any environment attached to the problem is ignored. Composite control
/// sets are applied member by member.
#[instrument(
    skip(annealing, options),
    fields(dim = annealing.dim(), vectorize = options.vectorize)
)]
pub fn solve_von_neumann(
    annealing: &Annealing,
    tf: f64,
    options: &SolveOptions,
) -> Result<Trajectory> {
    info!(control = annealing.control.kind(), "solving von Neumann equation");
    annealing.validate()?;
    let time = preprocess_time(
        tf,
        &options.tstops,
        &annealing.tstops,
        annealing.sspan,
        options.dimensionless_time,
    )?;
    let init = build_initial_value(
        &annealing.u0,
        Representation::Matrix,
        options.vectorize,
        options.aux_data,
    )?;
    check_aux_data(&init, &annealing.control)?;

    annealing.control.reset();
    let dim = init.dim();
    let callbacks = pulse_callbacks(&annealing.control, PulseTarget::Density { dim }, &time)?;

    let params = OdeParams {
        hamiltonian: annealing.hamiltonian.as_ref(),
        tf,
        scale: time.scale,
        opensys: None,
        control: &annealing.control,
    };
    debug!(?params, tstops = time.tstops.len(), "assembled von Neumann problem");

    let vectorized;
    let direct;
    let rhs: &dyn OdeFunction<OdeParams<'_>> = if options.vectorize {
        vectorized = von_neumann_operator(dim);
        &vectorized
    } else {
        direct = DensityRhs::new(dim);
        &direct
    };
    let problem =
        OdeProblem::new(rhs, init.flat(), time.tspan, &params, init.layout).with_aux(init.aux);
    let traj = integrator::solve(
        problem,
        AlgorithmHint::NonStiff,
        &time.tstops,
        callbacks,
        &options.solver,
    )?;
    info!(points = traj.len(), "von Neumann solve finished");
    Ok(traj)
}
