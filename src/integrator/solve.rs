// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Segmented integration on top of `ode_solvers`.
//!
//! The steppers work on real vectors, so complex states are packed as
//! interleaved `(re, im)` pairs. Stop-times are honoured by integrating each
//! interval between consecutive stops separately; preset callbacks fire at
//! the segment boundaries.

use nalgebra::DVector;
use ndarray::Array1;
use num_complex::Complex64;
use ode_solvers::dop_shared::OutputType;
use ode_solvers::{Dop853, Dopri5, Rk4, System};
use tracing::{debug, trace};

use crate::error::{Error, Result, ValidationError};
use crate::model::state::{AuxData, StateLayout};

use super::callback::{CallbackSet, PresetTimeCallback, StepCallback};
use super::types::{AlgorithmHint, Diagnostic, Method, SolverOptions, Stats, Trajectory};

/// Right-hand side `du = f(u, p, t)` on flat complex states.
pub trait OdeFunction<P> {
    fn eval(&self, du: &mut Array1<Complex64>, u: &Array1<Complex64>, p: &P, t: f64);

    /// `f` is linear in `u`.
    fn is_linear(&self) -> bool {
        false
    }
}

/// Initial value problem on flat complex states.
pub struct OdeProblem<'a, P> {
    pub f: &'a dyn OdeFunction<P>,
    pub u0: Array1<Complex64>,
    pub tspan: (f64, f64),
    pub params: &'a P,
    pub layout: StateLayout,
    pub aux: Option<AuxData>,
}

impl<'a, P> OdeProblem<'a, P> {
    pub fn new(
        f: &'a dyn OdeFunction<P>,
        u0: Array1<Complex64>,
        tspan: (f64, f64),
        params: &'a P,
        layout: StateLayout,
    ) -> Self {
        Self {
            f,
            u0,
            tspan,
            params,
            layout,
            aux: None,
        }
    }

    pub fn with_aux(mut self, aux: Option<AuxData>) -> Self {
        self.aux = aux;
        self
    }
}

pub(crate) fn pack(u: &Array1<Complex64>) -> DVector<f64> {
    DVector::from_iterator(2 * u.len(), u.iter().flat_map(|z| [z.re, z.im]))
}

pub(crate) fn unpack(y: &DVector<f64>) -> Array1<Complex64> {
    Array1::from_shape_fn(y.len() / 2, |k| Complex64::new(y[2 * k], y[2 * k + 1]))
}

/// Adapter exposing an [`OdeFunction`] as an `ode_solvers` system.
struct Stepper<'s, 'cb, P> {
    f: &'s dyn OdeFunction<P>,
    params: &'s P,
    start: f64,
    hooks: &'s mut [StepCallback<'cb>],
    diagnostics: &'s mut Vec<Diagnostic>,
    /// Accepted steps past `start`, in order.
    saved: &'s mut Vec<(f64, DVector<f64>)>,
}

impl<P> System<f64, DVector<f64>> for Stepper<'_, '_, P> {
    fn system(&self, x: f64, y: &DVector<f64>, dy: &mut DVector<f64>) {
        let u = unpack(y);
        let mut du = Array1::zeros(u.len());
        self.f.eval(&mut du, &u, self.params, x);
        for (k, z) in du.iter().enumerate() {
            dy[2 * k] = z.re;
            dy[2 * k + 1] = z.im;
        }
    }

    fn solout(&mut self, x: f64, y: &DVector<f64>, _dy: &DVector<f64>) -> bool {
        // the sparse output of Dop853 stamps every point with the start time,
        // so steps are recorded here where `x` is the true step end
        if x <= self.start {
            return false;
        }
        self.saved.push((x, y.clone()));
        if self.hooks.is_empty() {
            return false;
        }
        let u = unpack(y);
        for cb in self.hooks.iter_mut() {
            if let Some(d) = (cb.hook)(x, &u) {
                self.diagnostics.push(d);
            }
        }
        false
    }
}

/// Step-size controller parameters of the adaptive steppers.
#[derive(Clone, Copy)]
struct StepControl {
    safety_factor: f64,
    beta: f64,
    fac_min: f64,
    fac_max: f64,
}

const DOPRI5_CONTROL: StepControl = StepControl {
    safety_factor: 0.9,
    beta: 0.04,
    fac_min: 0.2,
    fac_max: 10.0,
};

const DOP853_CONTROL: StepControl = StepControl {
    safety_factor: 0.9,
    beta: 0.0,
    fac_min: 0.333,
    fac_max: 6.0,
};

const MAX_STEPS: u32 = 100_000;
const STIFFNESS_CHECK_INTERVAL: u32 = 1000;

fn integrate_segment<P>(
    stepper: Stepper<'_, '_, P>,
    method: Method,
    t0: f64,
    t1: f64,
    y0: DVector<f64>,
    options: &SolverOptions,
) -> Result<Stats> {
    let stats = match method {
        Method::Dopri5 => {
            let c = DOPRI5_CONTROL;
            let mut s = Dopri5::from_param(
                stepper,
                t0,
                t1,
                0.0,
                y0,
                options.rtol,
                options.atol,
                c.safety_factor,
                c.beta,
                c.fac_min,
                c.fac_max,
                t1 - t0,
                0.0,
                MAX_STEPS,
                STIFFNESS_CHECK_INTERVAL,
                OutputType::Sparse,
            );
            s.integrate().map_err(|e| Error::Integration(format!("{e:?}")))?
        }
        Method::Dop853 => {
            let c = DOP853_CONTROL;
            let mut s = Dop853::from_param(
                stepper,
                t0,
                t1,
                0.0,
                y0,
                options.rtol,
                options.atol,
                c.safety_factor,
                c.beta,
                c.fac_min,
                c.fac_max,
                t1 - t0,
                0.0,
                MAX_STEPS,
                STIFFNESS_CHECK_INTERVAL,
                OutputType::Sparse,
            );
            s.integrate().map_err(|e| Error::Integration(format!("{e:?}")))?
        }
        Method::Rk4 { step } => {
            let n = ((t1 - t0) / step).ceil().max(1.0);
            let h = (t1 - t0) / n;
            // the stepper takes ceil(span / h) steps without clipping; aiming
            // half a step short makes that exactly `n`
            let aim = t0 + (n - 0.5) * h;
            let mut s = Rk4::new(stepper, t0, y0, aim, h);
            s.integrate().map_err(|e| Error::Integration(format!("{e:?}")))?
        }
    };

    Ok(Stats {
        num_eval: stats.num_eval,
        accepted_steps: stats.accepted_steps,
        rejected_steps: stats.rejected_steps,
        segments: 1,
    })
}

fn fire_presets(
    presets: &mut [PresetTimeCallback<'_>],
    t: f64,
    u: &mut Array1<Complex64>,
    aux: &mut Option<AuxData>,
) -> bool {
    let mut fired = false;
    for cb in presets.iter_mut() {
        let hits = cb.times.iter().filter(|&&x| x == t).count();
        for _ in 0..hits {
            (cb.affect)(t, u, aux.as_mut());
            fired = true;
        }
    }
    if fired {
        debug!(t, "preset callback fired");
    }
    fired
}

/// Merged, sorted, deduplicated stop list inside `(t0, t1]`, ending at `t1`.
fn segment_ends(t0: f64, t1: f64, tstops: &[f64], preset_times: &[f64]) -> Vec<f64> {
    let mut ends: Vec<f64> = tstops
        .iter()
        .chain(preset_times)
        .copied()
        .filter(|&t| t > t0 && t < t1)
        .collect();
    ends.push(t1);
    ends.sort_by(f64::total_cmp);
    ends.dedup();
    ends
}

/// Integrate `problem` over its span.
///
/// # Errors
///
/// Rejects an empty span, stop-times or callback times outside it, and a
/// non-positive RK4 step. Integrator failures are reported as
/// [`Error::Integration`].
pub fn solve<P>(
    problem: OdeProblem<'_, P>,
    hint: AlgorithmHint,
    tstops: &[f64],
    callbacks: CallbackSet<'_>,
    options: &SolverOptions,
) -> Result<Trajectory> {
    let OdeProblem {
        f,
        u0,
        tspan: (t0, t1),
        params,
        layout,
        mut aux,
    } = problem;

    if !(t0.is_finite() && t1.is_finite() && t0 < t1) {
        return Err(ValidationError::field("tspan", format!("invalid span ({t0}, {t1})")).into());
    }
    if u0.len() != layout.flat_len() {
        return Err(ValidationError::Dimension {
            what: "flat state".into(),
            expected: layout.flat_len(),
            actual: u0.len(),
        }
        .into());
    }
    let preset_times = callbacks.preset_times();
    if let Some(bad) = tstops
        .iter()
        .chain(&preset_times)
        .find(|&&t| !(t >= t0 && t <= t1))
    {
        return Err(ValidationError::field(
            "tstops",
            format!("time {bad} outside the span ({t0}, {t1})"),
        )
        .into());
    }
    let method = options.method.unwrap_or_else(|| hint.default_method());
    if let Method::Rk4 { step } = method {
        if !(step > 0.0 && step.is_finite()) {
            return Err(ValidationError::field("step", "must be positive").into());
        }
    }

    let (mut presets, mut hooks) = callbacks.split();
    let ends = segment_ends(t0, t1, tstops, &preset_times);
    debug!(
        ?method,
        segments = ends.len(),
        linear = f.is_linear(),
        "starting integration"
    );

    let mut t = vec![t0];
    let mut u = vec![u0.clone()];
    let mut state = u0;
    if fire_presets(&mut presets, t0, &mut state, &mut aux) {
        t.push(t0);
        u.push(state.clone());
    }

    let mut stats = Stats::default();
    let mut diagnostics = Vec::new();
    let mut current = t0;
    for &end in &ends {
        let mut saved = Vec::new();
        let stepper = Stepper {
            f,
            params,
            start: current,
            hooks: &mut hooks,
            diagnostics: &mut diagnostics,
            saved: &mut saved,
        };
        let segment = integrate_segment(stepper, method, current, end, pack(&state), options)?;
        trace!(from = current, to = end, steps = saved.len(), "segment done");

        stats.num_eval += segment.num_eval;
        stats.accepted_steps += segment.accepted_steps;
        stats.rejected_steps += segment.rejected_steps;
        stats.segments += segment.segments;

        // the last step lands on `end`, which is saved exactly below
        let (_, y_end) = saved
            .pop()
            .ok_or_else(|| Error::Integration(format!("no output reaching t = {end}")))?;
        let last = unpack(&y_end);
        if options.save_everystep {
            for (x, y) in saved {
                t.push(x);
                u.push(unpack(&y));
            }
        }
        t.push(end);
        u.push(last.clone());
        state = last;

        if fire_presets(&mut presets, end, &mut state, &mut aux) {
            t.push(end);
            u.push(state.clone());
        }
        current = end;
    }

    debug!(
        num_eval = stats.num_eval,
        accepted = stats.accepted_steps,
        rejected = stats.rejected_steps,
        "integration finished"
    );
    Ok(Trajectory {
        t,
        u,
        layout,
        aux,
        stats,
        diagnostics,
    })
}
