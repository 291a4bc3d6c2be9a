use crate::core::geometry;
use phf::{Map, phf_map};
use std::f64::consts::PI;

/// Largest number of arguments taken by any builtin (`pointdihedral`).
pub(crate) const MAX_ARITY: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Function {
    Sqrt,
    Exp,
    Log,
    Sin,
    Cos,
    Sec,
    Csc,
    Tan,
    Cot,
    Asin,
    Acos,
    Atan,
    Atan2,
    Sinh,
    Cosh,
    Tanh,
    Erf,
    Erfc,
    Min,
    Max,
    Abs,
    Floor,
    Ceil,
    Step,
    Delta,
    Select,
    PointDistance,
    PointAngle,
    PointDihedral,
}

#[rustfmt::skip]
pub(crate) static FUNCTIONS: Map<&'static str, Function> = phf_map! {
    "sqrt" => Function::Sqrt, "exp" => Function::Exp, "log" => Function::Log,
    "sin" => Function::Sin, "cos" => Function::Cos, "sec" => Function::Sec,
    "csc" => Function::Csc, "tan" => Function::Tan, "cot" => Function::Cot,
    "asin" => Function::Asin, "acos" => Function::Acos, "atan" => Function::Atan,
    "atan2" => Function::Atan2,
    "sinh" => Function::Sinh, "cosh" => Function::Cosh, "tanh" => Function::Tanh,
    "erf" => Function::Erf, "erfc" => Function::Erfc,
    "min" => Function::Min, "max" => Function::Max, "abs" => Function::Abs,
    "floor" => Function::Floor, "ceil" => Function::Ceil,
    "step" => Function::Step, "delta" => Function::Delta, "select" => Function::Select,
    "pointdistance" => Function::PointDistance,
    "pointangle" => Function::PointAngle,
    "pointdihedral" => Function::PointDihedral,
};

/// Functions whose arguments are point names (`p1`, `p2`, ...) rather than expressions.
/// Each expands to its coordinate-based counterpart.
#[rustfmt::skip]
pub(crate) static POINT_FUNCTIONS: Map<&'static str, Function> = phf_map! {
    "distance" => Function::PointDistance,
    "angle" => Function::PointAngle,
    "dihedral" => Function::PointDihedral,
};

impl Function {
    pub(crate) fn arity(self) -> usize {
        match self {
            Function::Atan2 | Function::Min | Function::Max => 2,
            Function::Select => 3,
            Function::PointDistance => 6,
            Function::PointAngle => 9,
            Function::PointDihedral => 12,
            _ => 1,
        }
    }

    pub(crate) fn evaluate(self, args: &[f64]) -> f64 {
        let x = args[0];
        match self {
            Function::Sqrt => x.sqrt(),
            Function::Exp => x.exp(),
            Function::Log => x.ln(),
            Function::Sin => x.sin(),
            Function::Cos => x.cos(),
            Function::Sec => 1.0 / x.cos(),
            Function::Csc => 1.0 / x.sin(),
            Function::Tan => x.tan(),
            Function::Cot => 1.0 / x.tan(),
            Function::Asin => x.asin(),
            Function::Acos => x.acos(),
            Function::Atan => x.atan(),
            Function::Atan2 => x.atan2(args[1]),
            Function::Sinh => x.sinh(),
            Function::Cosh => x.cosh(),
            Function::Tanh => x.tanh(),
            Function::Erf => erf(x),
            Function::Erfc => erfc(x),
            Function::Min => x.min(args[1]),
            Function::Max => x.max(args[1]),
            Function::Abs => x.abs(),
            Function::Floor => x.floor(),
            Function::Ceil => x.ceil(),
            Function::Step => indicator(x >= 0.0),
            Function::Delta => indicator(x == 0.0),
            Function::Select => {
                if x != 0.0 {
                    args[1]
                } else {
                    args[2]
                }
            }
            Function::PointDistance => geometry::distance(&geometry::points_from_flat(args)),
            Function::PointAngle => geometry::angle(&geometry::points_from_flat(args)),
            Function::PointDihedral => geometry::dihedral(&geometry::points_from_flat(args)),
        }
    }

    /// Writes the partial derivative with respect to each argument into `partials`.
    ///
    /// `value` must be the result of [`Function::evaluate`] for the same arguments.
    pub(crate) fn partials(self, args: &[f64], value: f64, partials: &mut [f64]) {
        let x = args[0];
        match self {
            Function::Atan2 => {
                let (y, x) = (args[0], args[1]);
                let r2 = x * x + y * y;
                partials[0] = x / r2;
                partials[1] = -y / r2;
            }
            Function::Min => {
                let first = x <= args[1];
                partials[0] = indicator(first);
                partials[1] = indicator(!first);
            }
            Function::Max => {
                let first = x >= args[1];
                partials[0] = indicator(first);
                partials[1] = indicator(!first);
            }
            Function::Select => {
                partials[0] = 0.0;
                partials[1] = indicator(x != 0.0);
                partials[2] = indicator(x == 0.0);
            }
            Function::PointDistance => geometry::flatten_gradient(
                &geometry::distance_gradient(&geometry::points_from_flat(args)),
                partials,
            ),
            Function::PointAngle => geometry::flatten_gradient(
                &geometry::angle_gradient(&geometry::points_from_flat(args)),
                partials,
            ),
            Function::PointDihedral => geometry::flatten_gradient(
                &geometry::dihedral_gradient(&geometry::points_from_flat(args)),
                partials,
            ),
            unary => partials[0] = unary.derivative(x, value),
        }
    }

    fn derivative(self, x: f64, value: f64) -> f64 {
        match self {
            Function::Sqrt => 0.5 / value,
            Function::Exp => value,
            Function::Log => 1.0 / x,
            Function::Sin => x.cos(),
            Function::Cos => -x.sin(),
            Function::Sec => value * x.tan(),
            Function::Csc => -value / x.tan(),
            Function::Tan => 1.0 + value * value,
            Function::Cot => -(1.0 + value * value),
            Function::Asin => 1.0 / (1.0 - x * x).sqrt(),
            Function::Acos => -1.0 / (1.0 - x * x).sqrt(),
            Function::Atan => 1.0 / (1.0 + x * x),
            Function::Sinh => x.cosh(),
            Function::Cosh => x.sinh(),
            Function::Tanh => 1.0 - value * value,
            Function::Erf => erf_derivative(x),
            Function::Erfc => -erf_derivative(x),
            Function::Abs => {
                if x >= 0.0 {
                    1.0
                } else {
                    -1.0
                }
            }
            _ => 0.0,
        }
    }
}

#[inline]
fn indicator(condition: bool) -> f64 {
    if condition { 1.0 } else { 0.0 }
}

fn erf_derivative(x: f64) -> f64 {
    2.0 / PI.sqrt() * (-x * x).exp()
}

const ERF_SERIES_LIMIT: f64 = 2.5;

pub(crate) fn erf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    let ax = x.abs();
    let magnitude = if ax < ERF_SERIES_LIMIT {
        erf_series(ax)
    } else {
        1.0 - erfc_continued_fraction(ax)
    };
    magnitude.copysign(x)
}

pub(crate) fn erfc(x: f64) -> f64 {
    if x < ERF_SERIES_LIMIT {
        1.0 - erf(x)
    } else {
        erfc_continued_fraction(x)
    }
}

// erf(x) = 2/sqrt(pi) exp(-x^2) sum_n (2x^2)^n x / (1*3*...*(2n+1)); all terms positive.
fn erf_series(x: f64) -> f64 {
    let two_x2 = 2.0 * x * x;
    let mut term = x;
    let mut sum = x;
    let mut n = 0.0;
    while term > 1e-17 * sum {
        n += 1.0;
        term *= two_x2 / (2.0 * n + 1.0);
        sum += term;
    }
    2.0 / PI.sqrt() * (-x * x).exp() * sum
}

// erfc(x) = exp(-x^2)/sqrt(pi) / (x + (1/2)/(x + 1/(x + (3/2)/(x + ...)))), evaluated bottom-up.
fn erfc_continued_fraction(x: f64) -> f64 {
    const DEPTH: u32 = 60;
    let mut t = x;
    for n in (1..=DEPTH).rev() {
        t = x + (f64::from(n) / 2.0) / t;
    }
    (-x * x).exp() / (PI.sqrt() * t)
}
