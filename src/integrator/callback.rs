// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Callbacks understood by [`super::solve`].

use ndarray::Array1;
use num_complex::Complex64;

use crate::model::state::AuxData;

use super::types::Diagnostic;

/// Modifies the state (and auxiliary data) at a preset time.
pub type PresetAffect<'a> = Box<dyn FnMut(f64, &mut Array1<Complex64>, Option<&mut AuxData>) + 'a>;

/// Inspects the state after an accepted step.
pub type StepHook<'a> = Box<dyn FnMut(f64, &Array1<Complex64>) -> Option<Diagnostic> + 'a>;

/// Callback fired when the solver reaches one of `times`.
///
/// The affect runs once per occurrence, so a time listed twice fires twice.
pub struct PresetTimeCallback<'a> {
    pub times: Vec<f64>,
    pub affect: PresetAffect<'a>,
}

/// Callback run after every accepted step, excluding the initial point.
pub struct StepCallback<'a> {
    pub hook: StepHook<'a>,
}

pub enum Callback<'a> {
    PresetTime(PresetTimeCallback<'a>),
    Step(StepCallback<'a>),
}

impl<'a> Callback<'a> {
    pub fn preset(times: Vec<f64>, affect: PresetAffect<'a>) -> Self {
        Callback::PresetTime(PresetTimeCallback { times, affect })
    }

    pub fn step(hook: StepHook<'a>) -> Self {
        Callback::Step(StepCallback { hook })
    }
}

/// Ordered collection of callbacks; presets at the same time fire in
/// insertion order.
#[derive(Default)]
pub struct CallbackSet<'a> {
    callbacks: Vec<Callback<'a>>,
}

impl<'a> CallbackSet<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, callback: Callback<'a>) {
        self.callbacks.push(callback);
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Every preset time, unsorted, duplicates kept.
    pub fn preset_times(&self) -> Vec<f64> {
        self.callbacks
            .iter()
            .filter_map(|cb| match cb {
                Callback::PresetTime(p) => Some(p.times.iter().copied()),
                Callback::Step(_) => None,
            })
            .flatten()
            .collect()
    }

    pub(crate) fn split(self) -> (Vec<PresetTimeCallback<'a>>, Vec<StepCallback<'a>>) {
        let mut presets = Vec::new();
        let mut steps = Vec::new();
        for cb in self.callbacks {
            match cb {
                Callback::PresetTime(p) => presets.push(p),
                Callback::Step(s) => steps.push(s),
            }
        }
        (presets, steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_times_collects_all_presets() {
        let mut set = CallbackSet::new();
        set.push(Callback::preset(vec![0.5, 0.2], Box::new(|_, _, _| {})));
        set.push(Callback::step(Box::new(|_, _| None)));
        set.push(Callback::preset(vec![0.5], Box::new(|_, _, _| {})));
        assert_eq!(set.len(), 3);
        assert_eq!(set.preset_times(), vec![0.5, 0.2, 0.5]);
    }

    #[test]
    fn test_split_separates_kinds() {
        let mut a = CallbackSet::new();
        a.push(Callback::preset(vec![0.1], Box::new(|_, _, _| {})));
        a.push(Callback::step(Box::new(|_, _| None)));
        let (presets, steps) = a.split();
        assert_eq!(presets.len(), 1);
        assert_eq!(steps.len(), 1);
    }
}
