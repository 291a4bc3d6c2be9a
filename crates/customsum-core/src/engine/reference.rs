use super::error::EngineError;
use super::traits::{Engine, EngineHandle, EngineSpec};
use crate::core::expression::{CompiledExpression, TermInputs, Vocabulary, Workspace};
use nalgebra::{Point3, Vector3};
use std::collections::BTreeMap;
use tracing::{debug, instrument, trace, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Name of the reference engine property selecting multi-threaded term evaluation.
pub const PARALLEL_PROPERTY: &str = "Parallel";

/// Built-in engine that compiles the term expression to an instruction tape and
/// evaluates every term directly on the CPU.
///
/// With the `parallel` feature, terms are evaluated on the rayon thread pool.
/// Per-term results are reduced in term order, so parallel and serial evaluation
/// produce identical sums.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReferenceEngine;

impl Engine for ReferenceEngine {
    type Handle = ReferenceHandle;

    #[instrument(skip_all, name = "reference_engine_configure")]
    fn configure(&self, spec: &EngineSpec) -> Result<ReferenceHandle, EngineError> {
        let parallel = parallel_property(&spec.properties)?;
        let (overall_names, overall_values): (Vec<String>, Vec<f64>) =
            spec.overall_parameters.iter().cloned().unzip();

        let expression = CompiledExpression::compile(
            &spec.expression,
            &Vocabulary {
                point_count: spec.point_count,
                overall_parameters: &overall_names,
                per_term_parameters: &spec.per_term_parameters,
            },
        )?;

        debug!(
            points = spec.point_count,
            parallel, "Compiled term expression '{}'", spec.expression
        );

        Ok(ReferenceHandle {
            expression,
            overall_names,
            overall_values,
            per_term_count: spec.per_term_parameters.len(),
            terms: Vec::new(),
            coordinates: Vec::new(),
            parallel,
        })
    }
}

fn parallel_property(properties: &BTreeMap<String, String>) -> Result<bool, EngineError> {
    let mut parallel = cfg!(feature = "parallel");
    for (name, value) in properties {
        if name != PARALLEL_PROPERTY {
            return Err(EngineError::Initialization(format!(
                "Unknown engine property '{name}'"
            )));
        }
        parallel = match value.as_str() {
            "true" => true,
            "false" => false,
            other => {
                return Err(EngineError::Initialization(format!(
                    "Invalid value '{other}' for property '{PARALLEL_PROPERTY}': expected 'true' or 'false'"
                )));
            }
        };
    }
    if parallel && !cfg!(feature = "parallel") {
        return Err(EngineError::Initialization(
            "Parallel evaluation requires the 'parallel' feature".to_string(),
        ));
    }
    Ok(parallel)
}

#[derive(Debug, Clone)]
pub struct ReferenceHandle {
    expression: CompiledExpression,
    overall_names: Vec<String>,
    overall_values: Vec<f64>,
    per_term_count: usize,
    terms: Vec<Vec<f64>>,
    coordinates: Vec<f64>,
    parallel: bool,
}

impl ReferenceHandle {
    fn inputs<'a>(&'a self, term: &'a [f64]) -> TermInputs<'a> {
        TermInputs {
            coordinates: &self.coordinates,
            overall: &self.overall_values,
            per_term: term,
        }
    }

    fn check_positions(&self) -> Result<(), EngineError> {
        let expected = self.expression.coordinate_count();
        if self.coordinates.len() == expected {
            Ok(())
        } else {
            Err(EngineError::Evaluation(format!(
                "Expected positions for {} points but {} were set",
                expected / 3,
                self.coordinates.len() / 3
            )))
        }
    }

    fn term_values(&self) -> Vec<f64> {
        #[cfg(feature = "parallel")]
        {
            if self.parallel {
                return self
                    .terms
                    .par_iter()
                    .map_init(Workspace::default, |workspace, term| {
                        self.expression.value(&self.inputs(term), workspace)
                    })
                    .collect();
            }
        }

        let mut workspace = Workspace::default();
        self.terms
            .iter()
            .map(|term| self.expression.value(&self.inputs(term), &mut workspace))
            .collect()
    }

    fn accumulate_gradient(&self, total: &mut [f64]) {
        let n = total.len();

        #[cfg(feature = "parallel")]
        {
            if self.parallel {
                let per_term: Vec<Vec<f64>> = self
                    .terms
                    .par_iter()
                    .map_init(Workspace::default, |workspace, term| {
                        let mut gradient = vec![0.0; n];
                        self.expression
                            .accumulate_gradient(&self.inputs(term), workspace, &mut gradient);
                        gradient
                    })
                    .collect();
                for gradient in &per_term {
                    add_into(total, gradient);
                }
                return;
            }
        }

        let mut workspace = Workspace::default();
        let mut gradient = vec![0.0; n];
        for term in &self.terms {
            gradient.fill(0.0);
            self.expression
                .accumulate_gradient(&self.inputs(term), &mut workspace, &mut gradient);
            add_into(total, &gradient);
        }
    }
}

fn add_into(total: &mut [f64], gradient: &[f64]) {
    for (t, g) in total.iter_mut().zip(gradient) {
        *t += g;
    }
}

impl EngineHandle for ReferenceHandle {
    fn set_terms(&mut self, terms: &[Vec<f64>]) -> Result<(), EngineError> {
        if let Some((index, term)) = terms
            .iter()
            .enumerate()
            .find(|(_, term)| term.len() != self.per_term_count)
        {
            return Err(EngineError::Structural(format!(
                "Term {index} has {} parameters, expected {}",
                term.len(),
                self.per_term_count
            )));
        }
        self.terms = terms.to_vec();
        Ok(())
    }

    fn set_positions(&mut self, points: &[Point3<f64>]) {
        self.coordinates.clear();
        self.coordinates
            .extend(points.iter().flat_map(|p| p.coords.iter().copied()));
    }

    fn compute_value(&mut self) -> Result<f64, EngineError> {
        self.check_positions()?;
        let value = self.term_values().iter().fold(0.0, |sum, v| sum + v);
        trace!(terms = self.terms.len(), value, "Computed value");
        if !value.is_finite() {
            warn!(value, "Summation value is not finite");
        }
        Ok(value)
    }

    fn compute_forces(&mut self) -> Result<Vec<Vector3<f64>>, EngineError> {
        self.check_positions()?;
        let mut gradient = vec![0.0; self.coordinates.len()];
        self.accumulate_gradient(&mut gradient);
        trace!(terms = self.terms.len(), "Computed forces");
        if gradient.iter().any(|g| !g.is_finite()) {
            warn!("Summation gradient has non-finite components");
        }
        Ok(gradient
            .chunks_exact(3)
            .map(|g| -Vector3::new(g[0], g[1], g[2]))
            .collect())
    }

    fn parameter(&self, name: &str) -> Option<f64> {
        self.overall_names
            .iter()
            .position(|n| n == name)
            .map(|i| self.overall_values[i])
    }

    fn set_parameter(&mut self, name: &str, value: f64) -> Result<(), EngineError> {
        let index = self
            .overall_names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| EngineError::UnknownParameter(name.to_string()))?;
        self.overall_values[index] = value;
        Ok(())
    }

    fn properties(&self) -> BTreeMap<String, String> {
        BTreeMap::from([(PARALLEL_PROPERTY.to_string(), self.parallel.to_string())])
    }
}
