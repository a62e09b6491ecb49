// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Redfield master equation.
//!
//! The dissipator is built from the closed-system propagator `U(s)`:
//!
//! ```text
//! Λ_α(s) = ∫₀^{tf (s − s0)} C(τ) U(s) U(s')† A_α(s') U(s') U(s)† dτ
//! s'     = s − τ / tf
//! D(s) ρ = − Σ_α [A_α(s), Λ_α(s) ρ − ρ Λ_α(s)†]
//! ```
//!
//! Ref: Redfield (1957), IBM J. Res. Dev. 1, 19.
//! Ref: Breuer & Petruccione (2002), "The Theory of Open Quantum Systems", §3.3.

use nalgebra::SymmetricEigen;
use ndarray::Array2;
use num_complex::Complex64;
use tracing::{debug, info, instrument};

use crate::error::{Error, Result, ValidationError};
use crate::integrator::{self, AlgorithmHint, OdeFunction, OdeProblem, Trajectory};
use crate::linalg::{c, dagger, identity, sandwich_superop, to_nalgebra, unvectorize};
use crate::model::annealing::Annealing;
use crate::model::coupling::{Bath, Coupling, Environment};
use crate::model::state::StateLayout;

use super::callback::{positivity_callback, pulse_callbacks, PulseTarget};
use super::initial::{build_initial_value, check_aux_data, Representation};
use super::operator::CachedOperator;
use super::params::{OdeParams, QuadratureTolerances, SolveOptions};
use super::time::preprocess_time;
use super::von_neumann::{hamiltonian_liouvillian, DensityRhs};

/// Closed-system propagator `U(s)` from `s0`.
pub trait Unitary {
    fn at(&self, s: f64) -> Array2<Complex64>;
}

impl<F> Unitary for F
where
    F: Fn(f64) -> Array2<Complex64>,
{
    fn at(&self, s: f64) -> Array2<Complex64> {
        self(s)
    }
}

/// Exact propagator `exp(−i tf (s − s0) H)` of a time-independent
/// Hermitian Hamiltonian.
pub struct StaticUnitary {
    eigen: SymmetricEigen<Complex64, nalgebra::Dyn>,
    tf: f64,
    s0: f64,
}

impl StaticUnitary {
    pub fn new(h: &Array2<Complex64>, tf: f64, s0: f64) -> Result<Self> {
        if h.nrows() != h.ncols() {
            return Err(ValidationError::field("hamiltonian", "must be square").into());
        }
        Ok(Self {
            eigen: to_nalgebra(h).symmetric_eigen(),
            tf,
            s0,
        })
    }
}

impl Unitary for StaticUnitary {
    fn at(&self, s: f64) -> Array2<Complex64> {
        let v = &self.eigen.eigenvectors;
        let phase = -self.tf * (s - self.s0);
        let d = v.nrows();
        Array2::from_shape_fn((d, d), |(i, j)| {
            (0..d)
                .map(|k| {
                    let rotation = Complex64::from_polar(1.0, phase * self.eigen.eigenvalues[k]);
                    v[(i, k)] * rotation * v[(j, k)].conj()
                })
                .sum()
        })
    }
}

/// Piecewise-linear interpolation of a propagator trajectory in `s`.
#[derive(Debug, Clone)]
pub struct InterpolatedUnitary {
    s: Vec<f64>,
    u: Vec<Array2<Complex64>>,
}

impl InterpolatedUnitary {
    /// Build from a [`super::solve_unitary`] trajectory.
    ///
    /// `tf` and `dimensionless_time` must be the values the trajectory was
    /// solved with.
    pub fn from_trajectory(traj: &Trajectory, tf: f64, dimensionless_time: bool) -> Result<Self> {
        let StateLayout::Propagator { dim } = traj.layout else {
            return Err(ValidationError::field("trajectory", "does not hold a propagator").into());
        };
        if traj.is_empty() {
            return Err(ValidationError::field("trajectory", "is empty").into());
        }
        let scale = super::time::TimeScale::new(tf, dimensionless_time);
        Ok(Self {
            s: traj.t.iter().map(|&t| scale.s(t)).collect(),
            u: traj.u.iter().map(|u| unvectorize(u, dim)).collect(),
        })
    }
}

impl Unitary for InterpolatedUnitary {
    fn at(&self, s: f64) -> Array2<Complex64> {
        let n = self.s.len();
        if n == 1 || s <= self.s[0] {
            return self.u[0].clone();
        }
        if s >= self.s[n - 1] {
            return self.u[n - 1].clone();
        }
        let i = self.s.partition_point(|&x| x <= s) - 1;
        let (a, b) = (self.s[i], self.s[i + 1]);
        if b <= a {
            return self.u[i + 1].clone();
        }
        let w = (s - a) / (b - a);
        &self.u[i] * c(1.0 - w, 0.0) + &self.u[i + 1] * c(w, 0.0)
    }
}

/// Open-system contribution to a density-matrix right-hand side.
pub trait OpenSystem {
    /// `du += rate · D(s) ρ`.
    fn dissipate(&self, du: &mut Array2<Complex64>, rho: &Array2<Complex64>, s: f64, rate: f64);

    /// Add `rate ·` the Liouvillian of `D(s)` to `cache` (column-major
    /// vectorization).
    fn update_liouvillian(&self, cache: &mut Array2<Complex64>, s: f64, rate: f64);
}

fn max_abs(m: &Array2<Complex64>) -> f64 {
    m.iter().map(|z| z.norm()).fold(0.0, f64::max)
}

/// Redfield dissipator of one coupling set and one bath.
pub struct Redfield<'a> {
    coupling: &'a Coupling,
    unitary: &'a dyn Unitary,
    bath: &'a dyn Bath,
    tf: f64,
    s0: f64,
    tol: QuadratureTolerances,
}

impl<'a> Redfield<'a> {
    pub fn new(
        coupling: &'a Coupling,
        unitary: &'a dyn Unitary,
        bath: &'a dyn Bath,
        tf: f64,
        s0: f64,
        tol: QuadratureTolerances,
    ) -> Self {
        Self {
            coupling,
            unitary,
            bath,
            tf,
            s0,
            tol,
        }
    }

    /// `(A_α(s), Λ_α(s))` for every operator.
    pub fn lambdas(&self, s: f64) -> Vec<(Array2<Complex64>, Array2<Complex64>)> {
        let us = self.unitary.at(s);
        let upper = self.tf * (s - self.s0);
        self.coupling
            .iter()
            .map(|op| {
                let integrand = |tau: f64| {
                    let sp = s - tau / self.tf;
                    let v = us.dot(&dagger(&self.unitary.at(sp)));
                    v.dot(&op.at(sp)).dot(&dagger(&v)) * self.bath.correlation(tau)
                };
                let lambda = if upper > 0.0 {
                    self.simpson(&integrand, 0.0, upper)
                } else {
                    Array2::zeros(us.dim())
                };
                (op.at(s), lambda)
            })
            .collect()
    }

    fn simpson(
        &self,
        f: &dyn Fn(f64) -> Array2<Complex64>,
        a: f64,
        b: f64,
    ) -> Array2<Complex64> {
        let fa = f(a);
        let fb = f(b);
        let m = 0.5 * (a + b);
        let fm = f(m);
        let whole = simpson_rule(a, b, &fa, &fm, &fb);
        self.simpson_step(f, a, b, &fa, &fm, &fb, whole, self.tol.max_depth)
    }

    #[allow(clippy::too_many_arguments)]
    fn simpson_step(
        &self,
        f: &dyn Fn(f64) -> Array2<Complex64>,
        a: f64,
        b: f64,
        fa: &Array2<Complex64>,
        fm: &Array2<Complex64>,
        fb: &Array2<Complex64>,
        whole: Array2<Complex64>,
        depth: u32,
    ) -> Array2<Complex64> {
        let m = 0.5 * (a + b);
        let flm = f(0.5 * (a + m));
        let frm = f(0.5 * (m + b));
        let left = simpson_rule(a, m, fa, &flm, fm);
        let right = simpson_rule(m, b, fm, &frm, fb);
        let refined = &left + &right;
        let err = max_abs(&(&refined - &whole));
        let tol = self.tol.atol.max(self.tol.rtol * max_abs(&refined));
        if depth == 0 || err <= 15.0 * tol {
            // Richardson correction
            return &refined + &((&refined - &whole) * c(1.0 / 15.0, 0.0));
        }
        self.simpson_step(f, a, m, fa, &flm, fm, left, depth - 1)
            + self.simpson_step(f, m, b, fm, &frm, fb, right, depth - 1)
    }
}

fn simpson_rule(
    a: f64,
    b: f64,
    fa: &Array2<Complex64>,
    fm: &Array2<Complex64>,
    fb: &Array2<Complex64>,
) -> Array2<Complex64> {
    (fa + &(fm * c(4.0, 0.0)) + fb) * c((b - a) / 6.0, 0.0)
}

impl OpenSystem for Redfield<'_> {
    fn dissipate(&self, du: &mut Array2<Complex64>, rho: &Array2<Complex64>, s: f64, rate: f64) {
        for (a, lambda) in self.lambdas(s) {
            let x = lambda.dot(rho) - rho.dot(&dagger(&lambda));
            let comm = a.dot(&x) - x.dot(&a);
            du.zip_mut_with(&comm, |d, &k| *d -= k * rate);
        }
    }

    fn update_liouvillian(&self, cache: &mut Array2<Complex64>, s: f64, rate: f64) {
        let d = self.coupling.dim().unwrap_or(0);
        let eye = identity(d);
        for (a, lambda) in self.lambdas(s) {
            let lambda_dag = dagger(&lambda);
            let l = sandwich_superop(&a.dot(&lambda), &eye) - sandwich_superop(&a, &lambda_dag)
                - sandwich_superop(&lambda, &a)
                + sandwich_superop(&eye, &lambda_dag.dot(&a));
            cache.zip_mut_with(&l, |x, &y| *x -= y * rate);
        }
    }
}

/// Sum of independent Redfield dissipators.
pub struct RedfieldSet<'a> {
    members: Vec<Redfield<'a>>,
}

impl<'a> RedfieldSet<'a> {
    pub fn new(members: Vec<Redfield<'a>>) -> Self {
        Self { members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl OpenSystem for RedfieldSet<'_> {
    fn dissipate(&self, du: &mut Array2<Complex64>, rho: &Array2<Complex64>, s: f64, rate: f64) {
        for member in &self.members {
            member.dissipate(du, rho, s, rate);
        }
    }

    fn update_liouvillian(&self, cache: &mut Array2<Complex64>, s: f64, rate: f64) {
        for member in &self.members {
            member.update_liouvillian(cache, s, rate);
        }
    }
}

/// Build the open-system model of `environment`.
pub fn build_open_system<'a>(
    environment: &'a Environment,
    unitary: &'a dyn Unitary,
    tf: f64,
    s0: f64,
    tol: QuadratureTolerances,
) -> Box<dyn OpenSystem + 'a> {
    match environment {
        Environment::Coupled { coupling, bath } => {
            Box::new(Redfield::new(coupling, unitary, bath.as_ref(), tf, s0, tol))
        }
        Environment::Interactions(list) => Box::new(RedfieldSet::new(
            list.iter()
                .map(|i| Redfield::new(&i.coupling, unitary, i.bath.as_ref(), tf, s0, tol))
                .collect(),
        )),
    }
}

/// Vectorized density-matrix operator: Hamiltonian Liouvillian assigned
/// first, then the open-system Liouvillian added into the same buffer.
pub(crate) fn liouvillian_operator<'a>(dim: usize) -> CachedOperator<'a, OdeParams<'a>> {
    CachedOperator::new(
        dim * dim,
        Box::new(|cache: &mut Array2<Complex64>, p: &OdeParams<'a>, t: f64| {
            let s = p.s(t);
            let rate = p.rate();
            cache.assign(&hamiltonian_liouvillian(&p.hamiltonian.at(s), rate));
            if let Some(opensys) = p.opensys {
                opensys.update_liouvillian(cache, s, rate);
            }
        }),
    )
}

/// Solve the Redfield master equation of `annealing` over `tf`.
///
/// `unitary` is the closed-system propagator `U(s)` from `sspan.0`, for
/// instance an [`InterpolatedUnitary`] built from [`super::solve_unitary`].
///
/// # Errors
///
/// Fails without an environment, on invalid times, states or controls, and
/// when the integrator fails.
#[instrument(
    skip(annealing, unitary, options),
    fields(dim = annealing.dim(), vectorize = options.vectorize)
)]
pub fn solve_redfield(
    annealing: &Annealing,
    tf: f64,
    unitary: &dyn Unitary,
    options: &SolveOptions,
) -> Result<Trajectory> {
    info!(control = annealing.control.kind(), "solving Redfield equation");
    let environment = annealing.environment.as_ref().ok_or_else(|| {
        Error::from(ValidationError::field(
            "environment",
            "the Redfield solver needs a coupling and bath",
        ))
    })?;
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
    let mut callbacks = pulse_callbacks(&annealing.control, PulseTarget::Density { dim }, &time)?;
    if options.positivity_check {
        callbacks.push(positivity_callback(dim));
    }

    let opensys = build_open_system(
        environment,
        unitary,
        tf,
        annealing.sspan.0,
        options.quadrature,
    );
    let params = OdeParams {
        hamiltonian: annealing.hamiltonian.as_ref(),
        tf,
        scale: time.scale,
        opensys: Some(opensys.as_ref()),
        control: &annealing.control,
    };
    debug!(?params, tstops = time.tstops.len(), "assembled Redfield problem");

    let vectorized;
    let direct;
    let rhs: &dyn OdeFunction<OdeParams<'_>> = if options.vectorize {
        vectorized = liouvillian_operator(dim);
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
    info!(
        points = traj.len(),
        violations = traj.diagnostics.len(),
        "Redfield solve finished"
    );
    Ok(traj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::{sigma_x, sigma_z, trace, vectorize};
    use crate::dynamics::solve_von_neumann;
    use crate::model::annealing::Annealing;
    use crate::model::coupling::{ExponentialBath, Interaction};
    use crate::model::hamiltonian::DenseHamiltonian;
    use crate::model::state::InitialState;
    use crate::test_utils::{assert_matrix_close, excited_density, mixed_density};
    use approx::assert_relative_eq;

    fn dephasing_problem(strength: f64) -> Annealing {
        Annealing::new(
            DenseHamiltonian::linear_anneal(sigma_x() * c(-1.0, 0.0), sigma_z(), 1.0).unwrap(),
            InitialState::Density(mixed_density()),
        )
        .with_coupling(
            Coupling::constant(vec![sigma_z()]).unwrap(),
            ExponentialBath::new(strength, 4.0).unwrap(),
        )
    }

    #[test]
    fn test_static_unitary_matches_phases() {
        let u = StaticUnitary::new(&sigma_z(), 2.0, 0.0).unwrap();
        let m = u.at(0.25);
        // exp(−i · 2 · 0.25 · σz)
        assert!((m[[0, 0]] - Complex64::from_polar(1.0, -0.5)).norm() < 1e-12);
        assert!((m[[1, 1]] - Complex64::from_polar(1.0, 0.5)).norm() < 1e-12);
        assert!(m[[0, 1]].norm() < 1e-12);
        assert_matrix_close(&u.at(0.0), &identity(2), 1e-12);
    }

    #[test]
    fn test_static_unitary_is_unitary_for_off_diagonal_h() {
        let u = StaticUnitary::new(&sigma_x(), 3.0, 0.0).unwrap().at(0.7);
        assert_matrix_close(&u.dot(&dagger(&u)), &identity(2), 1e-12);
    }

    #[test]
    fn test_interpolated_unitary_is_linear_between_points() {
        let traj = Trajectory {
            t: vec![0.0, 1.0],
            u: vec![vectorize(&identity(2)), vectorize(&(identity(2) * c(3.0, 0.0)))],
            layout: StateLayout::Propagator { dim: 2 },
            aux: None,
            stats: Default::default(),
            diagnostics: Vec::new(),
        };
        let u = InterpolatedUnitary::from_trajectory(&traj, 5.0, true).unwrap();
        assert_relative_eq!(u.at(0.5)[[0, 0]].re, 2.0);
        assert_relative_eq!(u.at(2.0)[[1, 1]].re, 3.0);
        assert_relative_eq!(u.at(-1.0)[[1, 1]].re, 1.0);

        let physical = InterpolatedUnitary::from_trajectory(&traj, 2.0, false).unwrap();
        // solver time 1.0 is s = 0.5 when tf = 2
        assert_relative_eq!(physical.at(0.25)[[0, 0]].re, 2.0);
    }

    #[test]
    fn test_interpolated_unitary_rejects_other_layouts() {
        let traj = Trajectory {
            t: vec![0.0],
            u: vec![vectorize(&identity(2))],
            layout: StateLayout::Density { dim: 2 },
            aux: None,
            stats: Default::default(),
            diagnostics: Vec::new(),
        };
        assert!(InterpolatedUnitary::from_trajectory(&traj, 1.0, true).is_err());
    }

    #[test]
    fn test_lambda_with_constant_bath_and_identity_unitary() {
        // U = 1, C = g, A = σz: Λ = g · tf · (s − s0) · σz
        let coupling = Coupling::constant(vec![sigma_z()]).unwrap();
        let bath = |_: f64| c(0.3, 0.0);
        let unitary = |_: f64| identity(2);
        let tol = QuadratureTolerances::default();
        let redfield = Redfield::new(&coupling, &unitary, &bath, 4.0, 0.0, tol);
        let (a, lambda) = redfield.lambdas(0.5).remove(0);
        assert_eq!(a, sigma_z());
        assert_matrix_close(&lambda, &(sigma_z() * c(0.3 * 4.0 * 0.5, 0.0)), 1e-10);
        assert_matrix_close(&redfield.lambdas(0.0)[0].1, &Array2::zeros((2, 2)), 0.0);
    }

    #[test]
    fn test_dephasing_kills_coherence_but_keeps_populations() {
        let coupling = Coupling::constant(vec![sigma_z()]).unwrap();
        let bath = ExponentialBath::new(0.5, 2.0).unwrap();
        let unitary = |_: f64| identity(2);
        let tol = QuadratureTolerances::default();
        let redfield = Redfield::new(&coupling, &unitary, &bath, 1.0, 0.0, tol);

        let mut rho = Array2::from_elem((2, 2), c(0.5, 0.0));
        rho[[0, 1]] = c(0.5, 0.0);
        let mut du = Array2::zeros((2, 2));
        redfield.dissipate(&mut du, &rho, 0.5, 1.0);
        assert!(du[[0, 0]].norm() < 1e-12);
        assert!(du[[1, 1]].norm() < 1e-12);
        assert!(du[[0, 1]].re < 0.0);
        assert!(trace(&du).norm() < 1e-12);
    }

    #[test]
    fn test_liouvillian_matches_direct_dissipator() {
        let coupling = Coupling::constant(vec![sigma_x() + sigma_z() * c(0.5, 0.0)]).unwrap();
        let bath = ExponentialBath::new(0.4, 1.5).unwrap();
        let h = sigma_z() + sigma_x() * c(0.3, 0.0);
        let unitary = StaticUnitary::new(&h, 2.0, 0.0).unwrap();
        let tol = QuadratureTolerances::default();
        let redfield = Redfield::new(&coupling, &unitary, &bath, 2.0, 0.0, tol);

        let mut rho = excited_density() * c(0.7, 0.0);
        rho[[0, 0]] = c(0.3, 0.0);
        rho[[0, 1]] = c(0.1, 0.2);
        rho[[1, 0]] = c(0.1, -0.2);

        let mut direct = Array2::zeros((2, 2));
        redfield.dissipate(&mut direct, &rho, 0.6, 1.3);
        let mut liouvillian = Array2::zeros((4, 4));
        redfield.update_liouvillian(&mut liouvillian, 0.6, 1.3);
        let via_superop = unvectorize(&liouvillian.dot(&vectorize(&rho)), 2);
        assert_matrix_close(&via_superop, &direct, 1e-9);
    }

    #[test]
    fn test_redfield_set_sums_members() {
        let coupling = Coupling::constant(vec![sigma_z()]).unwrap();
        let bath = ExponentialBath::new(0.5, 2.0).unwrap();
        let unitary = |_: f64| identity(2);
        let tol = QuadratureTolerances::default();
        let single = Redfield::new(&coupling, &unitary, &bath, 1.0, 0.0, tol);
        let set = RedfieldSet::new(vec![
            Redfield::new(&coupling, &unitary, &bath, 1.0, 0.0, tol),
            Redfield::new(&coupling, &unitary, &bath, 1.0, 0.0, tol),
        ]);
        let rho = Array2::from_elem((2, 2), c(0.5, 0.0));
        let mut one = Array2::zeros((2, 2));
        single.dissipate(&mut one, &rho, 0.5, 1.0);
        let mut two = Array2::zeros((2, 2));
        set.dissipate(&mut two, &rho, 0.5, 1.0);
        assert_matrix_close(&two, &(one * c(2.0, 0.0)), 1e-12);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_solve_without_environment_fails() {
        let annealing = Annealing::new(
            DenseHamiltonian::constant(sigma_z()).unwrap(),
            InitialState::Density(mixed_density()),
        );
        let unitary = |_: f64| identity(2);
        let err = solve_redfield(&annealing, 1.0, &unitary, &SolveOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::Field { .. })));
    }

    #[test]
    fn test_zero_strength_bath_matches_von_neumann() {
        let annealing = dephasing_problem(0.0);
        let unitary = |_: f64| identity(2);
        let options = SolveOptions::default();
        let open = solve_redfield(&annealing, 2.0, &unitary, &options).unwrap();
        let closed = solve_von_neumann(&annealing, 2.0, &options).unwrap();
        assert_matrix_close(
            &open.density(open.len() - 1).unwrap(),
            &closed.density(closed.len() - 1).unwrap(),
            1e-6,
        );
    }

    #[test]
    fn test_trace_stays_one_at_every_point_without_coupling() {
        let annealing = dephasing_problem(0.0);
        let unitary = |_: f64| identity(2);
        for vectorize_state in [false, true] {
            let options = SolveOptions {
                vectorize: vectorize_state,
                ..SolveOptions::default()
            };
            let traj = solve_redfield(&annealing, 2.0, &unitary, &options).unwrap();
            assert!(traj.len() > 2);
            for i in 0..traj.len() {
                let tr = traj.trace(i).unwrap();
                assert!(
                    (tr - c(1.0, 0.0)).norm() < 1e-10,
                    "trace {tr} at t = {} (vectorize = {vectorize_state})",
                    traj.t[i]
                );
            }
        }
    }

    #[test]
    fn test_mismatched_interaction_rejected_before_integration() {
        let annealing = Annealing::new(
            DenseHamiltonian::constant(sigma_z()).unwrap(),
            InitialState::Density(mixed_density()),
        )
        .with_interactions(vec![
            Interaction::new(
                Coupling::constant(vec![sigma_z()]).unwrap(),
                ExponentialBath::new(0.05, 4.0).unwrap(),
            ),
            Interaction::new(
                Coupling::constant(vec![identity(4)]).unwrap(),
                ExponentialBath::new(0.05, 4.0).unwrap(),
            ),
        ]);
        let unitary = |_: f64| identity(2);
        let err = solve_redfield(&annealing, 1.0, &unitary, &SolveOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::Dimension { actual: 4, .. })
        ));
    }

    #[test]
    fn test_vectorized_and_direct_forms_agree() {
        let annealing = dephasing_problem(0.05);
        let h = sigma_x() * c(-1.0, 0.0);
        let unitary = StaticUnitary::new(&h, 2.0, 0.0).unwrap();
        let direct = solve_redfield(&annealing, 2.0, &unitary, &SolveOptions::default()).unwrap();
        let options = SolveOptions {
            vectorize: true,
            ..SolveOptions::default()
        };
        let vectorized = solve_redfield(&annealing, 2.0, &unitary, &options).unwrap();
        assert_eq!(vectorized.layout, StateLayout::Vectorized { dim: 2 });

        let a = direct.density(direct.len() - 1).unwrap();
        let b = vectorized.density(vectorized.len() - 1).unwrap();
        assert_matrix_close(&a, &b, 1e-5);
        assert_relative_eq!(trace(&a).re, 1.0, epsilon = 1e-8);
    }

    #[test]
    fn test_positivity_check_is_quiet_for_weak_coupling() {
        let annealing = dephasing_problem(0.01);
        let unitary = |_: f64| identity(2);
        let options = SolveOptions {
            positivity_check: true,
            ..SolveOptions::default()
        };
        let traj = solve_redfield(&annealing, 1.0, &unitary, &options).unwrap();
        assert!(traj.diagnostics.is_empty());
    }

    #[test]
    fn test_interactions_sum_like_a_single_channel() {
        let unitary = |_: f64| identity(2);
        let options = SolveOptions::default();
        let single = solve_redfield(&dephasing_problem(0.1), 1.0, &unitary, &options).unwrap();

        let pair = Annealing::new(
            DenseHamiltonian::linear_anneal(sigma_x() * c(-1.0, 0.0), sigma_z(), 1.0).unwrap(),
            InitialState::Density(mixed_density()),
        )
        .with_interactions(vec![
            Interaction::new(
                Coupling::constant(vec![sigma_z()]).unwrap(),
                ExponentialBath::new(0.05, 4.0).unwrap(),
            ),
            Interaction::new(
                Coupling::constant(vec![sigma_z()]).unwrap(),
                ExponentialBath::new(0.05, 4.0).unwrap(),
            ),
        ]);
        let split = solve_redfield(&pair, 1.0, &unitary, &options).unwrap();
        assert_matrix_close(
            &single.density(single.len() - 1).unwrap(),
            &split.density(split.len() - 1).unwrap(),
            1e-6,
        );
    }
}
