use crate::{equations::LinearSystem, matrix::AugmentedMatrix};
use nalgebra::DVector as Vector;
use std::{
    cmp::Ordering,
    error::Error,
    fmt::{self, Display, Formatter},
};

pub(crate) fn solve(system: LinearSystem) -> Result<Solution, SolveError> {
    let unknowns = system.num_unknowns();

    if system.num_equations() != unknowns {
        return Err(SolveError::WrongEquationCount {
            expected: unknowns,
            found: system.num_equations(),
        });
    }

    let mut matrix = system.into_matrix();
    reduce(&mut matrix);

    // reduce() itself never fails; a degenerate system shows up as
    // non-finite values left behind by a zero pivot
    if matrix.cells().any(|value| !value.is_finite()) {
        return Err(SolveError::Singular);
    }

    let values = matrix.rows().map(|row| row[unknowns]).collect();

    Ok(Solution {
        values: Vector::from_vec(values),
    })
}

/// Reduce an augmented matrix in place to reduced row-echelon form using
/// Gauss-Jordan elimination.
///
/// The reduction runs two passes over the pivot columns:
///
/// ```text
/// forward:   j = 0, 1, .., n-1    clear everything below the diagonal
/// backward:  j = n-1, n-2, .., 0  clear everything above it
/// ```
///
/// At each pivot the diagonal entry is scaled to exactly `1`
/// (`row[j] *= 1 / matrix[j][j]`), and every other entry in the column is
/// cancelled by adding `-matrix[i][j]` times the pivot row. Both operations
/// span the full row width, constant column included, which is what carries
/// the right-hand side through the elimination. Afterwards the left block is
/// the identity and the last column of row `i` holds the value of variable
/// `i + 1`.
///
/// No pivot selection happens: whatever sits on the diagonal is divided
/// through, so a zero pivot turns into non-finite values which quietly
/// spread through the remaining arithmetic.
/// [`reduce_with_partial_pivoting`] is the variant that swaps rows first,
/// and [`LinearSystem::solve`] is the wrapper that reports the degenerate
/// case as an error instead.
pub fn reduce(matrix: &mut AugmentedMatrix) {
    forward_pass(matrix);
    backward_pass(matrix);
}

/// [`reduce`], with partial pivoting: before each forward pivot, the
/// max-magnitude entry at or below the diagonal is swapped into place, which
/// keeps the division well-behaved whenever the column still has a nonzero
/// entry to offer.
pub fn reduce_with_partial_pivoting(matrix: &mut AugmentedMatrix) {
    for pivot in 0..matrix.num_rows() {
        let best = max_magnitude_row(matrix, pivot);
        matrix.swap_rows(pivot, best);

        for row in pivot..matrix.num_rows() {
            if row == pivot {
                normalize(matrix, pivot);
            } else {
                eliminate(matrix, row, pivot);
            }
        }
    }

    backward_pass(matrix);
}

fn max_magnitude_row(matrix: &AugmentedMatrix, pivot: usize) -> usize {
    (pivot..matrix.num_rows())
        .max_by(|&a, &b| {
            let left = matrix[(a, pivot)].abs();
            let right = matrix[(b, pivot)].abs();
            left.partial_cmp(&right).unwrap_or(Ordering::Equal)
        })
        .expect("There is always at least the pivot row")
}

fn forward_pass(matrix: &mut AugmentedMatrix) {
    for pivot in 0..matrix.num_rows() {
        for row in pivot..matrix.num_rows() {
            if row == pivot {
                normalize(matrix, pivot);
            } else {
                eliminate(matrix, row, pivot);
            }
        }
    }
}

fn backward_pass(matrix: &mut AugmentedMatrix) {
    for pivot in (0..matrix.num_rows()).rev() {
        for row in (0..=pivot).rev() {
            if row == pivot {
                normalize(matrix, pivot);
            } else {
                eliminate(matrix, row, pivot);
            }
        }
    }
}

/// Scale the pivot row so the diagonal entry becomes exactly `1`, skipped
/// when it already is.
fn normalize(matrix: &mut AugmentedMatrix, pivot: usize) {
    let value = matrix[(pivot, pivot)];

    if value != 1.0 {
        matrix.scale_row(pivot, 1.0 / value);
    }
}

/// Cancel the entry at `(row, pivot)` by adding a multiple of the pivot
/// row, skipped when it's already zero.
fn eliminate(matrix: &mut AugmentedMatrix, row: usize, pivot: usize) {
    let value = matrix[(row, pivot)];

    if value != 0.0 {
        matrix.add_scaled_row(row, pivot, -value);
    }
}

/// The solved values of a system, one per variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    values: Vector<f64>,
}

impl Solution {
    /// The value of the 1-based variable `xk`.
    pub fn value(&self, variable: usize) -> Option<f64> {
        variable
            .checked_sub(1)
            .and_then(|index| self.values.as_slice().get(index))
            .copied()
    }

    pub fn values(&self) -> &[f64] { self.values.as_slice() }

    pub fn len(&self) -> usize { self.values.len() }

    pub fn is_empty(&self) -> bool { self.values.len() == 0 }
}

impl Display for Solution {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;

        for i in 0..self.values.len() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "x{}", i + 1)?;
        }

        write!(f, ") = (")?;

        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:.2}", value)?;
        }

        write!(f, ")")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SolveError {
    /// Solving needs exactly as many equations as unknowns.
    WrongEquationCount { expected: usize, found: usize },
    /// The reduction divided by a zero pivot, so the system has no unique
    /// solution.
    Singular,
}

impl Display for SolveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SolveError::WrongEquationCount { expected, found } => write!(
                f,
                "Expected {} equations, found {}",
                expected, found
            ),
            SolveError::Singular => {
                write!(f, "The system has no unique solution")
            },
        }
    }
}

impl Error for SolveError {}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    fn system_of(lines: &[&str]) -> LinearSystem {
        LinearSystem::from_lines(lines).unwrap()
    }

    /// Solve a system given as text lines, check the solution against
    /// `should_be`, then substitute it back into `A * x ≈ b`.
    fn assert_solves(lines: &[&str], should_be: &[f64]) {
        let system = system_of(lines);
        let unknowns = system.num_unknowns();
        let rows: Vec<_> = (&system).into_iter().cloned().collect();

        let solution = system.solve().unwrap();

        for (i, &value) in should_be.iter().enumerate() {
            assert!(
                approx::abs_diff_eq!(
                    solution.value(i + 1).unwrap(),
                    value,
                    epsilon = 1e-6
                ),
                "x{} should be {}, got {:?}",
                i + 1,
                value,
                solution.value(i + 1)
            );
        }

        let a = DMatrix::from_fn(unknowns, unknowns, |row, column| {
            rows[row].coefficients()[column]
        });
        let b = Vector::from_fn(unknowns, |row, _| rows[row].constant());
        let x = Vector::from_vec(solution.values().to_vec());

        assert!(approx::relative_eq!(&a * &x, b, epsilon = 1e-6));
    }

    #[test]
    fn two_unknowns() {
        let lines = ["n = 2", "x1 + x2 = 3", "x1 - x2 = 1"];

        assert_solves(&lines, &[2.0, 1.0]);
    }

    #[test]
    fn three_unknowns() {
        let lines = [
            "n = 3",
            "x1+x2+x3=6",
            "2x1-x2+x3=3",
            "x1+2x2-x3=2",
        ];

        assert_solves(&lines, &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn four_unknowns_round_trip() {
        let lines = [
            "n = 4",
            "2x1 + x2 + x4 = 0.5",
            "x1 + 3x2 + x3 = -2",
            "x2 + 4x3 + x4 = 10.5",
            "x1 + x3 + 2x4 = 5",
        ];

        assert_solves(&lines, &[1.0, -2.0, 3.0, 0.5]);
    }

    #[test]
    fn reduce_leaves_the_solution_in_the_last_column() {
        let mut matrix =
            AugmentedMatrix::from([[1.0, 1.0, 3.0], [1.0, -1.0, 1.0]]);

        reduce(&mut matrix);

        assert_eq!(
            matrix,
            AugmentedMatrix::from([[1.0, 0.0, 2.0], [0.0, 1.0, 1.0]])
        );
    }

    #[test]
    fn reduction_is_idempotent() {
        let mut matrix =
            AugmentedMatrix::from([[1.0, 1.0, 3.0], [1.0, -1.0, 1.0]]);
        reduce(&mut matrix);
        let reduced = matrix.clone();

        reduce(&mut matrix);

        assert_eq!(matrix, reduced);
    }

    #[test]
    fn zero_pivots_propagate_non_finite_values() {
        let mut matrix =
            AugmentedMatrix::from([[0.0, 1.0, 1.0], [1.0, 0.0, 2.0]]);

        reduce(&mut matrix);

        assert!(matrix.cells().any(|value| !value.is_finite()));
    }

    #[test]
    fn partial_pivoting_handles_a_zero_leading_pivot() {
        let mut matrix =
            AugmentedMatrix::from([[0.0, 1.0, 1.0], [1.0, 0.0, 2.0]]);

        reduce_with_partial_pivoting(&mut matrix);

        assert_eq!(
            matrix,
            AugmentedMatrix::from([[1.0, 0.0, 2.0], [0.0, 1.0, 1.0]])
        );
    }

    #[test]
    fn partial_pivoting_agrees_with_the_plain_reduction() {
        let mut plain =
            AugmentedMatrix::from([[2.0, 1.0, 5.0], [1.0, 3.0, 10.0]]);
        let mut pivoted = plain.clone();

        reduce(&mut plain);
        reduce_with_partial_pivoting(&mut pivoted);

        for (a, b) in plain.cells().zip(pivoted.cells()) {
            assert!(approx::relative_eq!(a, b, epsilon = 1e-12));
        }
    }

    #[test]
    fn singular_systems_are_reported() {
        let system = system_of(&["n = 2", "x1 + x2 = 2", "2x1 + 2x2 = 4"]);

        let got = system.solve();

        assert_eq!(got, Err(SolveError::Singular));
    }

    #[test]
    fn too_few_equations_are_reported() {
        let system = system_of(&["n = 2", "x1 + x2 = 3"]);

        let got = system.solve();

        assert_eq!(
            got,
            Err(SolveError::WrongEquationCount {
                expected: 2,
                found: 1,
            })
        );
    }

    #[test]
    fn solution_accessors_and_display() {
        let system = system_of(&["n = 2", "x1 + x2 = 3", "x1 - x2 = 1"]);

        let solution = system.solve().unwrap();

        assert_eq!(solution.len(), 2);
        assert!(!solution.is_empty());
        assert_eq!(solution.value(1), Some(2.0));
        assert_eq!(solution.value(2), Some(1.0));
        assert_eq!(solution.value(0), None);
        assert_eq!(solution.value(3), None);
        assert_eq!(solution.to_string(), "(x1, x2) = (2.00, 1.00)");
    }
}
