//! # Core Module
//!
//! Stateless building blocks of a custom summation.
//!
//! ## Architecture
//!
//! - **Term Description** ([`model`]) - Argument count, expression, and parameter names
//! - **Term Storage** ([`table`]) - Per-term parameter vectors with a pending-commit flag
//! - **Geometry** ([`geometry`]) - Point packing and distance, angle, and dihedral with gradients
//! - **Expressions** ([`expression`]) - Parsing and compiled evaluation of term expressions

pub mod expression;
pub mod geometry;
pub mod model;
pub mod table;
