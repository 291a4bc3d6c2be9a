//! # Engine Module
//!
//! The stateful layer between a summation and the numerical machinery that
//! evaluates it.
//!
//! ## Overview
//!
//! An [`Engine`] compiles the term expression once and returns an [`EngineHandle`]
//! that evaluates the sum of all terms for given point positions. The handle reports
//! forces, the negative gradient with respect to each point, in point order.
//!
//! The [`Evaluator`] owns exactly one handle. It packs argument vectors into points,
//! commits term tables to the engine, and keeps separate caches for the value and the
//! derivatives of the last argument vector it saw.
//!
//! ## Architecture
//!
//! - **Seam** ([`traits`]) - The `Engine`/`EngineHandle` contract and `EngineSpec`
//! - **Reference Engine** ([`reference`]) - Compiled-expression CPU engine, optionally parallel
//! - **Evaluator** ([`evaluator`]) - Point packing, commit semantics, and result caching
//! - **Error Handling** ([`error`]) - Engine failures surfaced to callers verbatim

pub mod error;
pub mod evaluator;
pub mod reference;
pub mod traits;

pub use error::EngineError;
pub use evaluator::Evaluator;
pub use reference::{PARALLEL_PROPERTY, ReferenceEngine, ReferenceHandle};
pub use traits::{Engine, EngineHandle, EngineSpec};
