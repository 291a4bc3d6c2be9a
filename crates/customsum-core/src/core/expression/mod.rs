//! # Expression Module
//!
//! Compiles the algebraic energy expression of a summation into a flat instruction
//! tape and evaluates it, with or without its gradient, for one term at a time.
//!
//! ## Language
//!
//! - Arithmetic `+ - * / ^` with the usual precedence; `^` is right-associative.
//! - Coordinates `x1, y1, z1, x2, ...` and points `p1, p2, ...` over the packed arguments.
//! - Parameter names, resolved per-term first and then overall.
//! - Intermediate definitions appended after `;`, as in `k*(r-r0)^2; r = distance(p1, p2)`.
//! - Builtins: `sqrt exp log sin cos sec csc tan cot asin acos atan atan2 sinh cosh tanh
//!   erf erfc min max abs floor ceil step delta select`, the point forms
//!   `distance angle dihedral`, and the explicit-coordinate forms
//!   `pointdistance pointangle pointdihedral`.

mod error;
mod functions;
mod lexer;
mod parser;
mod program;

pub use error::CompileError;
pub use program::{CompiledExpression, TermInputs, Vocabulary, Workspace};

pub(crate) use program::{is_identifier, is_reserved_name};
