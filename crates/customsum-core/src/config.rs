use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Parameter declared more than once: {0}")]
    DuplicateParameter(String),
}

/// Construction arguments of a [`CustomSummation`](crate::summation::CustomSummation).
#[derive(Debug, Clone, PartialEq)]
pub struct SummationConfig {
    pub num_args: usize,
    pub expression: String,
    /// Overall parameters and their default values.
    pub overall_parameters: BTreeMap<String, f64>,
    pub per_term_parameters: Vec<String>,
    /// Engine-specific properties, passed through to the engine unchanged.
    pub engine_properties: BTreeMap<String, String>,
}

#[derive(Default)]
pub struct SummationConfigBuilder {
    num_args: Option<usize>,
    expression: Option<String>,
    overall_parameters: Vec<(String, f64)>,
    per_term_parameters: Vec<String>,
    engine_properties: BTreeMap<String, String>,
}

impl SummationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_args(mut self, n: usize) -> Self {
        self.num_args = Some(n);
        self
    }
    pub fn expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = Some(expression.into());
        self
    }
    pub fn overall_parameter(mut self, name: impl Into<String>, default_value: f64) -> Self {
        self.overall_parameters.push((name.into(), default_value));
        self
    }
    pub fn per_term_parameter(mut self, name: impl Into<String>) -> Self {
        self.per_term_parameters.push(name.into());
        self
    }
    /// Sets an engine property. A later value for the same name replaces an earlier one.
    pub fn engine_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.engine_properties.insert(name.into(), value.into());
        self
    }

    pub fn build(self) -> Result<SummationConfig, ConfigError> {
        let mut overall_parameters = BTreeMap::new();
        for (name, default_value) in self.overall_parameters {
            if overall_parameters.contains_key(&name) {
                return Err(ConfigError::DuplicateParameter(name));
            }
            overall_parameters.insert(name, default_value);
        }

        for (i, name) in self.per_term_parameters.iter().enumerate() {
            if self.per_term_parameters[..i].contains(name) {
                return Err(ConfigError::DuplicateParameter(name.clone()));
            }
        }

        Ok(SummationConfig {
            num_args: self
                .num_args
                .ok_or(ConfigError::MissingParameter("num_args"))?,
            expression: self
                .expression
                .ok_or(ConfigError::MissingParameter("expression"))?,
            overall_parameters,
            per_term_parameters: self.per_term_parameters,
            engine_properties: self.engine_properties,
        })
    }
}
