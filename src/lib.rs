//! A solver for systems of multivariable linear equations.

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

mod equations;
mod matrix;
mod parse;
mod solve;

pub use equations::{CoefficientRow, LinearSystem};
pub use matrix::AugmentedMatrix;
pub use parse::{parse_equation, parse_header, ParseError};
pub use solve::{reduce, reduce_with_partial_pivoting, Solution, SolveError};
