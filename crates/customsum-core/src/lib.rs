//! # CustomSum Core Library
//!
//! Scalar functions of a fixed argument vector, written as a sum of terms that share
//! one algebraic expression, with exact first derivatives.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer split:
//!
//! - **[`core`]: The Foundation.** Stateless pieces: the term model and term table,
//!   point geometry, and the expression compiler with reverse-mode gradients.
//!
//! - **[`engine`]: The Logic Core.** The `Engine` seam, the built-in reference engine,
//!   and the `Evaluator` that packs arguments into points, commits terms, and caches
//!   values and derivatives.
//!
//! - **[`summation`]: The Public API.** [`CustomSummation`] ties a model, a term table,
//!   and an evaluator together behind a staged-commit interface.
//!
//! ## Example
//!
//! ```
//! use customsum::{CustomSummation, SummationConfigBuilder};
//!
//! let config = SummationConfigBuilder::new()
//!     .num_args(6)
//!     .expression("k*(distance(p1, p2) - r0)^2")
//!     .overall_parameter("k", 2.0)
//!     .per_term_parameter("r0")
//!     .build()?;
//! let mut function = CustomSummation::new(config)?;
//! function.add_term(&[1.0])?;
//! function.update()?;
//!
//! let args = [0.0, 0.0, 0.0, 3.0, 4.0, 0.0];
//! assert!((function.evaluate(&args)? - 32.0).abs() < 1e-12);
//! assert!((function.evaluate_derivative(&args, 3)? - 9.6).abs() < 1e-12);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod summation;

pub use config::{ConfigError, SummationConfig, SummationConfigBuilder};
pub use error::SummationError;
pub use summation::CustomSummation;
