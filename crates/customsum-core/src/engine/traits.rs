use super::error::EngineError;
use nalgebra::{Point3, Vector3};
use std::collections::BTreeMap;

/// Everything an engine needs to compile a summation's term expression.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSpec {
    pub point_count: usize,
    pub expression: String,
    /// Overall parameters with their initial values, ordered by name.
    pub overall_parameters: Vec<(String, f64)>,
    pub per_term_parameters: Vec<String>,
    /// Engine-specific options, such as `Parallel` for the reference engine.
    pub properties: BTreeMap<String, String>,
}

/// A multi-body value/gradient engine.
///
/// An engine compiles the term expression once per [`EngineSpec`] and hands back a
/// handle that evaluates the sum of all terms for arbitrary point positions.
pub trait Engine: Clone {
    type Handle: EngineHandle;

    fn configure(&self, spec: &EngineSpec) -> Result<Self::Handle, EngineError>;
}

/// A configured engine instance. A new handle starts with no terms.
pub trait EngineHandle {
    /// Replaces the whole term parametrization.
    fn set_terms(&mut self, terms: &[Vec<f64>]) -> Result<(), EngineError>;

    /// Sets the positions of all points, in point order.
    fn set_positions(&mut self, points: &[Point3<f64>]);

    /// Sum of all terms at the current positions and parameters.
    fn compute_value(&mut self) -> Result<f64, EngineError>;

    /// Per-point forces, i.e. the negative gradient of [`compute_value`](Self::compute_value)
    /// with respect to each point.
    fn compute_forces(&mut self) -> Result<Vec<Vector3<f64>>, EngineError>;

    fn parameter(&self, name: &str) -> Option<f64>;

    fn set_parameter(&mut self, name: &str, value: f64) -> Result<(), EngineError>;

    /// Effective engine properties, defaults included.
    fn properties(&self) -> BTreeMap<String, String>;
}
