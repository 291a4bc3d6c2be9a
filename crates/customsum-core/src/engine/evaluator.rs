use super::error::EngineError;
use super::traits::{Engine, EngineHandle, EngineSpec};
use crate::core::geometry::{pack_points, point_count};
use crate::error::SummationError;
use nalgebra::Point3;
use std::collections::BTreeMap;
use tracing::{debug, instrument, trace};

/// Owns one engine handle and caches its results for the last argument vector.
///
/// Value and derivatives are cached independently: a value query never triggers
/// a force computation and vice versa. Both caches are invalidated together when
/// the arguments change, on commit, and when an overall parameter is written.
#[derive(Debug)]
pub struct Evaluator<H> {
    handle: H,
    num_args: usize,
    scratch: Vec<Point3<f64>>,
    // Positions last pushed to the engine; `None` until the first evaluation
    // and after any failed engine call.
    cached_points: Option<Vec<Point3<f64>>>,
    value: f64,
    value_is_stale: bool,
    derivatives: Vec<f64>,
    derivatives_are_stale: bool,
    committed_terms: Vec<Vec<f64>>,
}

impl<H: EngineHandle> Evaluator<H> {
    /// Configures a fresh engine instance with no terms.
    pub fn new<E>(engine: &E, spec: &EngineSpec, num_args: usize) -> Result<Self, EngineError>
    where
        E: Engine<Handle = H>,
    {
        debug_assert_eq!(spec.point_count, point_count(num_args));
        let handle = engine.configure(spec)?;
        Ok(Self {
            handle,
            num_args,
            scratch: Vec::with_capacity(spec.point_count),
            cached_points: None,
            value: 0.0,
            value_is_stale: true,
            derivatives: vec![0.0; num_args],
            derivatives_are_stale: true,
            committed_terms: Vec::new(),
        })
    }

    /// Terms most recently pushed to the engine by [`commit`](Self::commit).
    #[inline]
    pub fn committed_terms(&self) -> &[Vec<f64>] {
        &self.committed_terms
    }

    pub fn properties(&self) -> BTreeMap<String, String> {
        self.handle.properties()
    }

    /// Replaces the engine's term parametrization with `terms`.
    ///
    /// Caches are invalidated even when the terms are unchanged. On failure the
    /// previously committed terms are still reported as committed.
    #[instrument(skip_all, name = "evaluator_commit")]
    pub fn commit(&mut self, terms: &[Vec<f64>]) -> Result<(), SummationError> {
        self.invalidate();
        self.handle.set_terms(terms).inspect_err(|_| {
            self.cached_points = None;
        })?;
        self.committed_terms = terms.to_vec();
        debug!(terms = terms.len(), "Committed terms to engine");
        Ok(())
    }

    pub fn parameter(&self, name: &str) -> Result<f64, SummationError> {
        self.handle
            .parameter(name)
            .ok_or_else(|| SummationError::UnknownParameter(name.to_string()))
    }

    pub fn set_parameter(&mut self, name: &str, value: f64) -> Result<(), SummationError> {
        if self.handle.parameter(name).is_none() {
            return Err(SummationError::UnknownParameter(name.to_string()));
        }
        self.handle.set_parameter(name, value)?;
        self.invalidate();
        trace!(name, value, "Set overall parameter");
        Ok(())
    }

    pub fn evaluate(&mut self, args: &[f64]) -> Result<f64, SummationError> {
        self.check_arity(args)?;
        self.stage(args);

        if !self.value_is_stale {
            trace!("Value cache hit");
            return Ok(self.value);
        }

        trace!("Value cache miss");
        match self.handle.compute_value() {
            Ok(value) => {
                self.value = value;
                self.value_is_stale = false;
                Ok(value)
            }
            Err(err) => {
                self.forget_positions();
                Err(err.into())
            }
        }
    }

    /// Partial derivative of the sum with respect to argument `which`.
    pub fn evaluate_derivative(&mut self, args: &[f64], which: usize) -> Result<f64, SummationError> {
        if which >= self.num_args {
            return Err(SummationError::IndexOutOfRange {
                index: which,
                len: self.num_args,
            });
        }
        self.check_arity(args)?;
        self.refresh_derivatives(args)?;
        Ok(self.derivatives[which])
    }

    /// All partial derivatives at once, in argument order.
    pub fn gradient(&mut self, args: &[f64]) -> Result<&[f64], SummationError> {
        self.check_arity(args)?;
        self.refresh_derivatives(args)?;
        Ok(&self.derivatives)
    }

    fn refresh_derivatives(&mut self, args: &[f64]) -> Result<(), SummationError> {
        self.stage(args);

        if !self.derivatives_are_stale {
            trace!("Derivative cache hit");
            return Ok(());
        }

        trace!("Derivative cache miss");
        let forces = match self.handle.compute_forces() {
            Ok(forces) => forces,
            Err(err) => {
                self.forget_positions();
                return Err(err.into());
            }
        };
        if forces.len() != point_count(self.num_args) {
            self.forget_positions();
            return Err(EngineError::Evaluation(format!(
                "Engine returned forces for {} points, expected {}",
                forces.len(),
                point_count(self.num_args)
            ))
            .into());
        }

        // The engine reports forces; the derivative is their negation.
        for (i, derivative) in self.derivatives.iter_mut().enumerate() {
            *derivative = -forces[i / 3][i % 3];
        }
        self.derivatives_are_stale = false;
        Ok(())
    }

    /// Packs `args` into points and pushes them to the engine if they differ from
    /// the cached positions.
    fn stage(&mut self, args: &[f64]) {
        pack_points(args, &mut self.scratch);
        if self.cached_points.as_deref() == Some(self.scratch.as_slice()) {
            return;
        }
        self.handle.set_positions(&self.scratch);
        match &mut self.cached_points {
            Some(points) => points.clone_from(&self.scratch),
            None => self.cached_points = Some(self.scratch.clone()),
        }
        self.invalidate();
    }

    fn check_arity(&self, args: &[f64]) -> Result<(), SummationError> {
        if args.len() == self.num_args {
            Ok(())
        } else {
            Err(SummationError::ArityMismatch {
                expected: self.num_args,
                found: args.len(),
            })
        }
    }

    fn invalidate(&mut self) {
        self.value_is_stale = true;
        self.derivatives_are_stale = true;
    }

    fn forget_positions(&mut self) {
        self.cached_points = None;
        self.invalidate();
    }
}
