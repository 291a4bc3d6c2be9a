use crate::config::SummationConfig;
use crate::core::expression::{is_identifier, is_reserved_name};
use crate::core::geometry::point_count;
use crate::error::SummationError;
use std::collections::BTreeMap;

/// Fixed description of a summation: how many arguments it takes, the expression
/// shared by all of its terms, and the names of the parameters the expression may use.
///
/// Overall-parameter defaults are kept here; the current values live with the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct TermModel {
    num_args: usize,
    expression: String,
    overall_defaults: BTreeMap<String, f64>,
    per_term_names: Vec<String>,
}

impl TermModel {
    pub fn new(
        num_args: usize,
        expression: impl Into<String>,
        overall_defaults: BTreeMap<String, f64>,
        per_term_names: Vec<String>,
    ) -> Result<Self, SummationError> {
        if num_args == 0 {
            return Err(invalid("the number of arguments must be at least 1"));
        }
        let points = point_count(num_args);

        let names = overall_defaults.keys().chain(per_term_names.iter());
        for name in names {
            if !is_identifier(name) {
                return Err(invalid(format!("'{name}' is not a valid parameter name")));
            }
            if is_reserved_name(name, points) {
                return Err(invalid(format!(
                    "parameter '{name}' shadows a coordinate or point name"
                )));
            }
        }

        for (i, name) in per_term_names.iter().enumerate() {
            if overall_defaults.contains_key(name) {
                return Err(invalid(format!(
                    "'{name}' is declared both as an overall and a per-term parameter"
                )));
            }
            if per_term_names[..i].contains(name) {
                return Err(invalid(format!(
                    "per-term parameter '{name}' is declared more than once"
                )));
            }
        }

        Ok(Self {
            num_args,
            expression: expression.into(),
            overall_defaults,
            per_term_names,
        })
    }

    pub fn from_config(config: &SummationConfig) -> Result<Self, SummationError> {
        Self::new(
            config.num_args,
            config.expression.clone(),
            config.overall_parameters.clone(),
            config.per_term_parameters.clone(),
        )
    }

    #[inline]
    pub fn num_args(&self) -> usize {
        self.num_args
    }

    #[inline]
    pub fn point_count(&self) -> usize {
        point_count(self.num_args)
    }

    #[inline]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Overall-parameter defaults, ordered by name.
    #[inline]
    pub fn overall_defaults(&self) -> &BTreeMap<String, f64> {
        &self.overall_defaults
    }

    pub fn overall_names(&self) -> impl Iterator<Item = &str> {
        self.overall_defaults.keys().map(String::as_str)
    }

    #[inline]
    pub fn per_term_names(&self) -> &[String] {
        &self.per_term_names
    }

    #[inline]
    pub fn num_per_term_parameters(&self) -> usize {
        self.per_term_names.len()
    }

    pub fn has_overall_parameter(&self, name: &str) -> bool {
        self.overall_defaults.contains_key(name)
    }
}

fn invalid(reason: impl Into<String>) -> SummationError {
    SummationError::InvalidConfiguration {
        reason: reason.into(),
        source: None,
    }
}
