use crate::config::SummationConfig;
use crate::core::model::TermModel;
use crate::core::table::TermTable;
use crate::engine::error::EngineError;
use crate::engine::evaluator::Evaluator;
use crate::engine::reference::ReferenceEngine;
use crate::engine::traits::{Engine, EngineSpec};
use crate::error::SummationError;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, instrument};

/// A scalar function of `num_args` arguments defined as a sum of terms that all
/// share one algebraic expression.
///
/// Each term binds its own values to the per-term parameters; overall parameters are
/// shared by every term. The arguments are grouped three at a time into points, so the
/// expression refers to them as `x1, y1, z1, x2, ...` or through `p1, p2, ...`.
///
/// Term edits are staged: [`add_term`](Self::add_term) and [`set_term`](Self::set_term)
/// only take effect on the next [`update`](Self::update). Overall-parameter writes take
/// effect immediately.
pub struct CustomSummation<E: Engine = ReferenceEngine> {
    // Declared first so the engine handle is released before the model it was built from.
    evaluator: Evaluator<E::Handle>,
    engine: E,
    model: TermModel,
    table: TermTable,
}

impl CustomSummation<ReferenceEngine> {
    /// Creates a summation evaluated by the built-in [`ReferenceEngine`].
    pub fn new(config: SummationConfig) -> Result<Self, SummationError> {
        Self::with_engine(config, ReferenceEngine)
    }
}

impl<E: Engine> CustomSummation<E> {
    #[instrument(skip_all, name = "custom_summation_new")]
    pub fn with_engine(config: SummationConfig, engine: E) -> Result<Self, SummationError> {
        let model = TermModel::from_config(&config)?;
        Self::assemble(model, engine, config.engine_properties)
    }

    fn assemble(
        model: TermModel,
        engine: E,
        properties: BTreeMap<String, String>,
    ) -> Result<Self, SummationError> {
        let spec = EngineSpec {
            point_count: model.point_count(),
            expression: model.expression().to_string(),
            overall_parameters: model
                .overall_defaults()
                .iter()
                .map(|(name, value)| (name.clone(), *value))
                .collect(),
            per_term_parameters: model.per_term_names().to_vec(),
            properties,
        };

        let evaluator =
            Evaluator::new(&engine, &spec, model.num_args()).map_err(|err| match err {
                EngineError::Compile { .. } => SummationError::InvalidConfiguration {
                    reason: format!("expression '{}' does not compile", model.expression()),
                    source: Some(err),
                },
                other => SummationError::Engine(other),
            })?;

        debug!(
            num_args = model.num_args(),
            overall = model.overall_defaults().len(),
            per_term = model.num_per_term_parameters(),
            "Created custom summation"
        );

        Ok(Self {
            evaluator,
            engine,
            table: TermTable::new(model.num_per_term_parameters()),
            model,
        })
    }

    pub fn num_arguments(&self) -> usize {
        self.model.num_args()
    }

    pub fn expression(&self) -> &str {
        self.model.expression()
    }

    /// Overall parameters with their default values, ordered by name.
    pub fn overall_parameters(&self) -> &BTreeMap<String, f64> {
        self.model.overall_defaults()
    }

    pub fn num_overall_parameters(&self) -> usize {
        self.model.overall_defaults().len()
    }

    pub fn overall_parameter_name(&self, index: usize) -> Result<&str, SummationError> {
        self.model
            .overall_names()
            .nth(index)
            .ok_or(SummationError::IndexOutOfRange {
                index,
                len: self.num_overall_parameters(),
            })
    }

    pub fn overall_parameter_default(&self, index: usize) -> Result<f64, SummationError> {
        self.model
            .overall_defaults()
            .values()
            .nth(index)
            .copied()
            .ok_or(SummationError::IndexOutOfRange {
                index,
                len: self.num_overall_parameters(),
            })
    }

    pub fn per_term_parameters(&self) -> &[String] {
        self.model.per_term_names()
    }

    pub fn num_per_term_parameters(&self) -> usize {
        self.model.num_per_term_parameters()
    }

    pub fn per_term_parameter_name(&self, index: usize) -> Result<&str, SummationError> {
        self.model
            .per_term_names()
            .get(index)
            .map(String::as_str)
            .ok_or(SummationError::IndexOutOfRange {
                index,
                len: self.num_per_term_parameters(),
            })
    }

    /// Effective engine properties, including defaults the caller did not set.
    pub fn engine_properties(&self) -> BTreeMap<String, String> {
        self.evaluator.properties()
    }

    /// Number of stored terms, including ones not yet committed by [`update`](Self::update).
    pub fn num_terms(&self) -> usize {
        self.table.len()
    }

    /// Stages a new term and returns its index.
    pub fn add_term(&mut self, params: &[f64]) -> Result<usize, SummationError> {
        self.table.add_term(params)
    }

    /// Stages a replacement of the parameters of an existing term.
    pub fn set_term(&mut self, index: usize, params: &[f64]) -> Result<(), SummationError> {
        self.table.set_term(index, params)
    }

    /// Stored parameters of a term, whether or not they have been committed.
    pub fn term(&self, index: usize) -> Result<&[f64], SummationError> {
        self.table.term(index)
    }

    /// Whether term edits are waiting for [`update`](Self::update).
    pub fn has_pending_changes(&self) -> bool {
        self.table.is_dirty()
    }

    /// Commits all staged term edits to the engine.
    ///
    /// Cached results are discarded even when nothing was staged.
    #[instrument(skip_all, name = "summation_update")]
    pub fn update(&mut self) -> Result<(), SummationError> {
        self.evaluator.commit(self.table.terms())?;
        self.table.mark_committed();
        Ok(())
    }

    pub fn get_parameter(&self, name: &str) -> Result<f64, SummationError> {
        self.evaluator.parameter(name)
    }

    /// Sets the current value of an overall parameter. No [`update`](Self::update) is needed.
    pub fn set_parameter(&mut self, name: &str, value: f64) -> Result<(), SummationError> {
        if !self.model.has_overall_parameter(name) {
            return Err(SummationError::UnknownParameter(name.to_string()));
        }
        self.evaluator.set_parameter(name, value)
    }

    pub fn evaluate(&mut self, args: &[f64]) -> Result<f64, SummationError> {
        self.evaluator.evaluate(args)
    }

    /// Partial derivative of the function with respect to argument `which`.
    pub fn evaluate_derivative(
        &mut self,
        args: &[f64],
        which: usize,
    ) -> Result<f64, SummationError> {
        self.evaluator.evaluate_derivative(args, which)
    }

    /// Partial derivatives with respect to every argument.
    pub fn gradient(&mut self, args: &[f64]) -> Result<Vec<f64>, SummationError> {
        self.evaluator.gradient(args).map(<[f64]>::to_vec)
    }

    /// Derivative given as one differentiation order per argument.
    ///
    /// Only the function itself (all orders zero) and first derivatives in a single
    /// argument are supported.
    pub fn evaluate_derivative_order(
        &mut self,
        args: &[f64],
        orders: &[usize],
    ) -> Result<f64, SummationError> {
        if orders.len() != self.model.num_args() {
            return Err(SummationError::ArityMismatch {
                expected: self.model.num_args(),
                found: orders.len(),
            });
        }
        let mut nonzero = orders.iter().enumerate().filter(|(_, order)| **order != 0);
        match (nonzero.next(), nonzero.next()) {
            (None, _) => self.evaluate(args),
            (Some((which, 1)), None) => self.evaluate_derivative(args, which),
            _ => Err(SummationError::UnsupportedDerivativeOrder(orders.to_vec())),
        }
    }

    /// Builds an independent copy with its own engine instance.
    ///
    /// The copy holds the committed terms and the current overall-parameter values of
    /// this summation. Staged term edits that were never committed are not carried over.
    #[instrument(skip_all, name = "summation_clone")]
    pub fn try_clone(&self) -> Result<Self, SummationError> {
        let mut clone = Self::assemble(
            self.model.clone(),
            self.engine.clone(),
            self.engine_properties(),
        )?;
        for term in self.evaluator.committed_terms() {
            clone.add_term(term)?;
        }
        for name in self.model.overall_names() {
            clone.set_parameter(name, self.get_parameter(name)?)?;
        }
        clone.update()?;
        debug!(terms = clone.num_terms(), "Cloned custom summation");
        Ok(clone)
    }
}

impl<E: Engine> fmt::Debug for CustomSummation<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomSummation")
            .field("model", &self.model)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SummationConfigBuilder;
    use crate::engine::reference::{PARALLEL_PROPERTY, ReferenceHandle};
    use crate::engine::traits::EngineHandle;
    use nalgebra::{Point3, Vector3};
    use std::cell::Cell;
    use std::rc::Rc;

    const TOLERANCE: f64 = 1e-12;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn config(
        num_args: usize,
        expression: &str,
        overall: &[(&str, f64)],
        per_term: &[&str],
    ) -> SummationConfig {
        let mut builder = SummationConfigBuilder::new()
            .num_args(num_args)
            .expression(expression);
        for (name, value) in overall {
            builder = builder.overall_parameter(*name, *value);
        }
        for name in per_term {
            builder = builder.per_term_parameter(*name);
        }
        builder.build().unwrap()
    }

    fn summation(
        num_args: usize,
        expression: &str,
        overall: &[(&str, f64)],
        per_term: &[&str],
    ) -> CustomSummation {
        CustomSummation::new(config(num_args, expression, overall, per_term)).unwrap()
    }

    #[derive(Debug, Default)]
    struct Calls {
        value: Cell<usize>,
        forces: Cell<usize>,
        commits: Cell<usize>,
    }

    #[derive(Debug, Clone, Default)]
    struct CountingEngine {
        calls: Rc<Calls>,
    }

    struct CountingHandle {
        inner: ReferenceHandle,
        calls: Rc<Calls>,
    }

    impl Engine for CountingEngine {
        type Handle = CountingHandle;

        fn configure(&self, spec: &EngineSpec) -> Result<CountingHandle, EngineError> {
            Ok(CountingHandle {
                inner: ReferenceEngine.configure(spec)?,
                calls: Rc::clone(&self.calls),
            })
        }
    }

    impl EngineHandle for CountingHandle {
        fn set_terms(&mut self, terms: &[Vec<f64>]) -> Result<(), EngineError> {
            self.calls.commits.set(self.calls.commits.get() + 1);
            self.inner.set_terms(terms)
        }

        fn set_positions(&mut self, points: &[Point3<f64>]) {
            self.inner.set_positions(points)
        }

        fn compute_value(&mut self) -> Result<f64, EngineError> {
            self.calls.value.set(self.calls.value.get() + 1);
            self.inner.compute_value()
        }

        fn compute_forces(&mut self) -> Result<Vec<Vector3<f64>>, EngineError> {
            self.calls.forces.set(self.calls.forces.get() + 1);
            self.inner.compute_forces()
        }

        fn parameter(&self, name: &str) -> Option<f64> {
            self.inner.parameter(name)
        }

        fn set_parameter(&mut self, name: &str, value: f64) -> Result<(), EngineError> {
            self.inner.set_parameter(name, value)
        }

        fn properties(&self) -> BTreeMap<String, String> {
            self.inner.properties()
        }
    }

    fn counting(
        num_args: usize,
        expression: &str,
        overall: &[(&str, f64)],
        per_term: &[&str],
    ) -> (CustomSummation<CountingEngine>, Rc<Calls>) {
        let engine = CountingEngine::default();
        let calls = Rc::clone(&engine.calls);
        let summation =
            CustomSummation::with_engine(config(num_args, expression, overall, per_term), engine)
                .unwrap();
        (summation, calls)
    }

    #[test]
    fn linear_function_of_two_points_matches_hand_computation() {
        let mut function = summation(
            4,
            "a*x1+b*y1+c*z1+d*x2+e",
            &[("a", 1.0), ("b", 2.0)],
            &["c", "d", "e"],
        );
        function.add_term(&[3.0, 4.0, 5.0]).unwrap();
        function.add_term(&[6.0, 7.0, 8.0]).unwrap();
        function.update().unwrap();

        let args = [1.0, 2.0, 3.0, 4.0];
        assert!(f64_approx_equal(function.evaluate(&args).unwrap(), 94.0));
        assert_eq!(function.gradient(&args).unwrap(), vec![2.0, 4.0, 9.0, 11.0]);
    }

    #[test]
    fn repeated_evaluation_calls_engine_once() {
        let (mut function, calls) = counting(3, "x1*y1*z1", &[], &[]);
        function.add_term(&[]).unwrap();
        function.update().unwrap();

        let first = function.evaluate(&[1.0, 2.0, 3.0]).unwrap();
        let second = function.evaluate(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(first.to_bits(), second.to_bits());
        assert_eq!(calls.value.get(), 1);
        assert_eq!(calls.forces.get(), 0);
    }

    #[test]
    fn value_and_derivative_caches_are_independent() {
        let (mut function, calls) = counting(3, "x1*y1*z1", &[], &[]);
        function.add_term(&[]).unwrap();
        function.update().unwrap();
        let args = [1.0, 2.0, 3.0];

        function.evaluate(&args).unwrap();
        assert_eq!(function.evaluate_derivative(&args, 0).unwrap(), 6.0);
        assert_eq!(function.evaluate_derivative(&args, 1).unwrap(), 3.0);
        assert_eq!(function.evaluate_derivative(&args, 2).unwrap(), 2.0);
        assert_eq!(calls.value.get(), 1);
        assert_eq!(calls.forces.get(), 1);

        function.evaluate(&args).unwrap();
        assert_eq!(calls.value.get(), 1);

        function.evaluate(&[1.0, 2.0, 4.0]).unwrap();
        function.evaluate_derivative(&[1.0, 2.0, 4.0], 0).unwrap();
        assert_eq!(calls.value.get(), 2);
        assert_eq!(calls.forces.get(), 2);
    }

    #[test]
    fn added_term_is_invisible_until_update() {
        let mut function = summation(1, "c*x1", &[], &["c"]);
        function.add_term(&[2.0]).unwrap();
        function.update().unwrap();
        assert_eq!(function.evaluate(&[3.0]).unwrap(), 6.0);

        assert_eq!(function.add_term(&[5.0]).unwrap(), 1);
        assert!(function.has_pending_changes());
        assert_eq!(function.num_terms(), 2);
        assert_eq!(function.evaluate(&[3.0]).unwrap(), 6.0);
        assert_eq!(function.evaluate_derivative(&[3.0], 0).unwrap(), 2.0);

        function.update().unwrap();
        assert!(!function.has_pending_changes());
        assert_eq!(function.evaluate(&[3.0]).unwrap(), 21.0);
        assert_eq!(function.evaluate_derivative(&[3.0], 0).unwrap(), 7.0);
    }

    #[test]
    fn replaced_term_is_invisible_until_update() {
        let mut function = summation(1, "c*x1", &[], &["c"]);
        function.add_term(&[2.0]).unwrap();
        function.update().unwrap();

        function.set_term(0, &[10.0]).unwrap();
        assert_eq!(function.term(0).unwrap(), &[10.0]);
        assert_eq!(function.evaluate(&[1.0]).unwrap(), 2.0);

        function.update().unwrap();
        assert_eq!(function.evaluate(&[1.0]).unwrap(), 10.0);
    }

    #[test]
    fn derivative_is_partial_derivative_of_the_sum() {
        let mut function = summation(3, "x1^2 + y1^2 + z1^2", &[], &[]);
        function.add_term(&[]).unwrap();
        function.update().unwrap();

        let args = [1.0, 2.0, 3.0];
        assert_eq!(function.evaluate(&args).unwrap(), 14.0);
        assert_eq!(function.evaluate_derivative(&args, 0).unwrap(), 2.0);
        assert_eq!(function.evaluate_derivative(&args, 1).unwrap(), 4.0);
        assert_eq!(function.evaluate_derivative(&args, 2).unwrap(), 6.0);
    }

    #[test]
    fn overall_parameter_takes_effect_without_update() {
        let mut function = summation(1, "sigma*x1", &[("sigma", 1.0)], &[]);
        function.add_term(&[]).unwrap();
        function.update().unwrap();

        assert_eq!(function.evaluate(&[2.0]).unwrap(), 2.0);
        function.set_parameter("sigma", 3.0).unwrap();
        assert_eq!(function.get_parameter("sigma").unwrap(), 3.0);
        assert!(!function.has_pending_changes());
        assert_eq!(function.evaluate(&[2.0]).unwrap(), 6.0);
        assert_eq!(function.evaluate_derivative(&[2.0], 0).unwrap(), 3.0);
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        let mut function = summation(1, "sigma*x1", &[("sigma", 1.0)], &[]);
        assert_eq!(
            function.set_parameter("epsilon", 1.0),
            Err(SummationError::UnknownParameter("epsilon".to_string()))
        );
        assert_eq!(
            function.get_parameter("epsilon"),
            Err(SummationError::UnknownParameter("epsilon".to_string()))
        );
    }

    #[test]
    fn update_without_pending_changes_still_discards_cache() {
        let (mut function, calls) = counting(1, "x1", &[], &[]);
        function.add_term(&[]).unwrap();
        function.update().unwrap();

        function.evaluate(&[1.0]).unwrap();
        function.update().unwrap();
        function.evaluate(&[1.0]).unwrap();
        assert_eq!(calls.value.get(), 2);
        assert_eq!(calls.commits.get(), 2);
    }

    #[test]
    fn parameter_write_discards_both_caches() {
        let (mut function, calls) = counting(1, "k*x1^2", &[("k", 1.0)], &[]);
        function.add_term(&[]).unwrap();
        function.update().unwrap();

        function.evaluate(&[2.0]).unwrap();
        function.evaluate_derivative(&[2.0], 0).unwrap();
        function.set_parameter("k", 2.0).unwrap();
        assert_eq!(function.evaluate(&[2.0]).unwrap(), 8.0);
        assert_eq!(function.evaluate_derivative(&[2.0], 0).unwrap(), 8.0);
        assert_eq!(calls.value.get(), 2);
        assert_eq!(calls.forces.get(), 2);
    }

    #[test]
    fn summation_without_terms_is_identically_zero() {
        let mut function = summation(5, "x1*x2 + exp(z1)", &[], &[]);
        let args = [0.5, -1.0, 2.0, 3.0, 4.0];
        assert_eq!(function.evaluate(&args).unwrap(), 0.0);
        assert_eq!(function.gradient(&args).unwrap(), vec![0.0; 5]);

        function.update().unwrap();
        assert_eq!(function.evaluate(&args).unwrap(), 0.0);
        for which in 0..5 {
            assert_eq!(function.evaluate_derivative(&args, which).unwrap(), 0.0);
        }
    }

    #[test]
    fn add_term_with_wrong_length_fails_without_side_effects() {
        let mut function = summation(1, "a*b*x1", &[], &["a", "b"]);
        function.add_term(&[1.0, 2.0]).unwrap();
        function.update().unwrap();

        assert_eq!(
            function.add_term(&[1.0]),
            Err(SummationError::ArityMismatch {
                expected: 2,
                found: 1
            })
        );
        assert_eq!(function.num_terms(), 1);
        assert!(!function.has_pending_changes());
    }

    #[test]
    fn out_of_range_derivative_fails_without_touching_cache() {
        let (mut function, calls) = counting(2, "x1*y1", &[], &[]);
        function.add_term(&[]).unwrap();
        function.update().unwrap();

        function.evaluate(&[2.0, 3.0]).unwrap();
        assert_eq!(
            function.evaluate_derivative(&[7.0, 7.0], 2),
            Err(SummationError::IndexOutOfRange { index: 2, len: 2 })
        );
        assert_eq!(function.evaluate(&[2.0, 3.0]).unwrap(), 6.0);
        assert_eq!(calls.value.get(), 1);
        assert_eq!(calls.forces.get(), 0);
    }

    #[test]
    fn wrong_argument_count_is_rejected() {
        let mut function = summation(2, "x1*y1", &[], &[]);
        assert_eq!(
            function.evaluate(&[1.0, 2.0, 3.0]),
            Err(SummationError::ArityMismatch {
                expected: 2,
                found: 3
            })
        );
        assert_eq!(
            function.gradient(&[1.0]),
            Err(SummationError::ArityMismatch {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn derivative_order_selects_value_or_single_first_derivative() {
        let mut function = summation(3, "x1^2*y1 + z1", &[], &[]);
        function.add_term(&[]).unwrap();
        function.update().unwrap();
        let args = [2.0, 3.0, 5.0];

        assert_eq!(function.evaluate_derivative_order(&args, &[0, 0, 0]).unwrap(), 17.0);
        assert_eq!(function.evaluate_derivative_order(&args, &[1, 0, 0]).unwrap(), 12.0);
        assert_eq!(function.evaluate_derivative_order(&args, &[0, 1, 0]).unwrap(), 4.0);
        assert_eq!(function.evaluate_derivative_order(&args, &[0, 0, 1]).unwrap(), 1.0);

        for orders in [[1, 1, 0], [2, 0, 0], [0, 0, 3]] {
            assert_eq!(
                function.evaluate_derivative_order(&args, &orders),
                Err(SummationError::UnsupportedDerivativeOrder(orders.to_vec()))
            );
        }
        assert_eq!(
            function.evaluate_derivative_order(&args, &[1, 0]),
            Err(SummationError::ArityMismatch {
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn clone_matches_original_and_is_independent() {
        let mut original = summation(
            6,
            "k*(distance(p1, p2) - r0)^2 + eps*x1",
            &[("k", 1.5), ("eps", 0.1)],
            &["r0"],
        );
        original.add_term(&[1.0]).unwrap();
        original.add_term(&[2.5]).unwrap();
        original.update().unwrap();
        original.set_parameter("k", 4.0).unwrap();

        let mut clone = original.try_clone().unwrap();
        assert_eq!(clone.get_parameter("k").unwrap(), 4.0);
        assert_eq!(clone.num_terms(), 2);
        assert!(!clone.has_pending_changes());

        for args in [
            [0.1, 0.2, 0.3, 1.0, 1.5, -0.5],
            [-1.0, 0.0, 2.0, 0.5, 0.5, 0.5],
        ] {
            assert_eq!(
                original.evaluate(&args).unwrap().to_bits(),
                clone.evaluate(&args).unwrap().to_bits()
            );
            assert_eq!(original.gradient(&args).unwrap(), clone.gradient(&args).unwrap());
        }

        let args = [0.1, 0.2, 0.3, 1.0, 1.5, -0.5];
        let before = original.evaluate(&args).unwrap();
        clone.set_parameter("k", 10.0).unwrap();
        clone.set_term(0, &[3.0]).unwrap();
        clone.add_term(&[0.0]).unwrap();
        clone.update().unwrap();
        assert_ne!(clone.evaluate(&args).unwrap(), before);
        assert_eq!(original.evaluate(&args).unwrap(), before);
        assert_eq!(original.get_parameter("k").unwrap(), 4.0);
        assert_eq!(original.num_terms(), 2);
    }

    #[test]
    fn clone_carries_only_committed_terms() {
        let mut original = summation(1, "c*x1", &[], &["c"]);
        original.add_term(&[1.0]).unwrap();
        original.update().unwrap();
        original.add_term(&[2.0]).unwrap();

        let mut clone = original.try_clone().unwrap();
        assert_eq!(clone.num_terms(), 1);
        assert_eq!(clone.evaluate(&[1.0]).unwrap(), original.evaluate(&[1.0]).unwrap());
    }

    #[test]
    fn expression_that_does_not_compile_is_invalid_configuration() {
        let result = CustomSummation::new(config(3, "k*x2", &[], &[]));
        assert!(matches!(
            result,
            Err(SummationError::InvalidConfiguration {
                source: Some(EngineError::Compile { .. }),
                ..
            })
        ));
    }

    #[test]
    fn conflicting_parameter_names_are_invalid_configuration() {
        let result = CustomSummation::new(config(1, "k*x1", &[("k", 1.0)], &["k"]));
        assert!(matches!(
            result,
            Err(SummationError::InvalidConfiguration { source: None, .. })
        ));
    }

    #[test]
    fn engine_initialization_errors_are_surfaced() {
        let mut config = config(1, "x1", &[], &[]);
        config
            .engine_properties
            .insert("Precision".to_string(), "double".to_string());
        assert!(matches!(
            CustomSummation::new(config),
            Err(SummationError::Engine(EngineError::Initialization(_)))
        ));
    }

    #[test]
    fn engine_properties_include_defaults() {
        let function = summation(1, "x1", &[], &[]);
        let properties = function.engine_properties();
        assert!(properties.contains_key(PARALLEL_PROPERTY));
    }

    #[test]
    fn introspection_reports_declared_parameters() {
        let function = summation(
            7,
            "a*x1 + b*y3 + c",
            &[("b", 2.0), ("a", 1.0)],
            &["c", "d"],
        );
        assert_eq!(function.num_arguments(), 7);
        assert_eq!(function.expression(), "a*x1 + b*y3 + c");
        assert_eq!(function.num_overall_parameters(), 2);
        assert_eq!(function.overall_parameter_name(0).unwrap(), "a");
        assert_eq!(function.overall_parameter_name(1).unwrap(), "b");
        assert_eq!(function.overall_parameter_default(1).unwrap(), 2.0);
        assert_eq!(
            function.overall_parameter_name(2),
            Err(SummationError::IndexOutOfRange { index: 2, len: 2 })
        );
        assert_eq!(function.num_per_term_parameters(), 2);
        assert_eq!(function.per_term_parameter_name(1).unwrap(), "d");
        assert_eq!(
            function.per_term_parameter_name(5),
            Err(SummationError::IndexOutOfRange { index: 5, len: 2 })
        );
        assert_eq!(function.per_term_parameters(), &["c".to_string(), "d".to_string()]);
        assert_eq!(function.overall_parameters().get("a"), Some(&1.0));
        assert_eq!(function.num_terms(), 0);
    }
}
