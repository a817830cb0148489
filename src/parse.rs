use crate::equations::CoefficientRow;
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Convert one equation line (`3x1 + 2x2 - x3 = 7`) into a
/// [`CoefficientRow`] for a system of `unknowns` variables.
///
/// Whitespace is insignificant and stripped up front. The left-hand side is
/// scanned for terms; a variable the equation mentions more than once has
/// its coefficients summed, and a variable index past `unknowns` is dropped
/// without complaint. The right-hand side must be a plain decimal constant,
/// and a malformed constant is the only way an equation can fail to parse.
pub fn parse_equation(
    line: &str,
    unknowns: usize,
) -> Result<CoefficientRow, ParseError> {
    let stripped = strip_whitespace(line);

    let (left, right) = match stripped.find('=') {
        Some(index) => {
            let (left, right) = stripped.split_at(index);
            (left, &right[1..])
        },
        None => return Err(ParseError::MissingEquals),
    };

    let constant: f64 =
        right.parse().map_err(|_| ParseError::InvalidConstant {
            text: right.to_string(),
        })?;

    let mut cells = vec![0.0; unknowns + 1];

    for term in Terms::new(left) {
        // variable indices are 1-based; x0 and anything past the declared
        // unknown count falls into the same silent drop
        let slot = match term.variable.checked_sub(1) {
            Some(slot) if slot < unknowns => slot,
            _ => continue,
        };

        cells[slot] += term.coefficient;
    }

    cells[unknowns] = constant;

    Ok(CoefficientRow::new(cells))
}

/// Extract the declared unknown count from a header line of the form
/// `n = <integer>`.
///
/// Like the rest of the reader this is lax about its surroundings: the
/// `n=<digits>` pattern may sit anywhere in the line. A missing pattern, a
/// value with no digits, or a count of zero is an [`ParseError::InvalidHeader`].
pub fn parse_header(line: &str) -> Result<usize, ParseError> {
    let stripped = strip_whitespace(line);

    let rest = match stripped.find("n=") {
        Some(index) => &stripped[index + 2..],
        None => return Err(ParseError::InvalidHeader),
    };

    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or_else(|| rest.len());

    match rest[..end].parse::<usize>() {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(ParseError::InvalidHeader),
    }
}

fn strip_whitespace(line: &str) -> String {
    line.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Possible errors that may occur while reading a system of equations.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The equation has no `=` separating its two sides.
    MissingEquals,
    /// The right-hand side isn't a plain decimal constant.
    InvalidConstant { text: String },
    /// The header line doesn't declare the unknown count (`n = <integer>`).
    InvalidHeader,
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingEquals => {
                write!(f, "The equation has no \"=\"")
            },
            ParseError::InvalidConstant { text } => {
                write!(f, "\"{}\" isn't a valid constant", text)
            },
            ParseError::InvalidHeader => {
                write!(f, "Invalid header, expected \"n = <integer>\"")
            },
        }
    }
}

impl Error for ParseError {}

/// A single `<coefficient>x<index>` unit. Only lives for as long as it takes
/// to fold it into a [`CoefficientRow`].
#[derive(Debug, Copy, Clone, PartialEq)]
struct Term {
    coefficient: f64,
    variable: usize,
}

/// A scanner which walks a whitespace-free left-hand side and yields every
/// term it contains, left to right.
///
/// The shape of a term:
///
/// ```text
/// term   := sign? number? "x" DIGIT+
/// sign   := "+" | "-"
/// number := DIGIT+ ("." DIGIT*)?
///         | "." DIGIT+
/// ```
///
/// A term with no number gets coefficient `1`, negated when the term starts
/// with `-`. Anything which doesn't fit the shape is skipped over one
/// character at a time, so stray text never aborts the scan.
#[derive(Debug, Clone, PartialEq)]
struct Terms<'a> {
    src: &'a str,
    cursor: usize,
}

impl<'a> Terms<'a> {
    fn new(src: &'a str) -> Self { Terms { src, cursor: 0 } }

    fn rest(&self) -> &'a str { &self.src[self.cursor..] }

    fn peek(&self) -> Option<char> { self.rest().chars().next() }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.cursor += c.len_utf8();
        Some(c)
    }

    fn take_while<P>(&mut self, mut predicate: P) -> Option<&'a str>
    where
        P: FnMut(char) -> bool,
    {
        let start = self.cursor;

        while let Some(c) = self.peek() {
            if !predicate(c) {
                break;
            }

            self.advance();
        }

        if start != self.cursor {
            Some(&self.src[start..self.cursor])
        } else {
            None
        }
    }

    fn chomp_digits(&mut self) -> Option<&'a str> {
        self.take_while(|c| c.is_ascii_digit())
    }

    /// Consume a decimal number (`3`, `2.5`, `31.`, `.5`). A lone `.`
    /// doesn't count.
    fn chomp_number(&mut self) -> Option<&'a str> {
        let start = self.cursor;
        self.chomp_digits();

        if self.peek() == Some('.') {
            self.advance();
            self.chomp_digits();
        }

        let text = &self.src[start..self.cursor];

        if text.bytes().any(|b| b.is_ascii_digit()) {
            Some(text)
        } else {
            self.cursor = start;
            None
        }
    }

    /// Try to read a whole term at the cursor, putting the cursor back where
    /// it started on failure.
    fn chomp_term(&mut self) -> Option<Term> {
        let start = self.cursor;

        let sign = match self.peek() {
            Some('-') => {
                self.advance();
                -1.0
            },
            Some('+') => {
                self.advance();
                1.0
            },
            _ => 1.0,
        };

        let coefficient = match self.chomp_number() {
            Some(text) => {
                text.parse().expect("Guaranteed correct by the scanner")
            },
            None => 1.0,
        };

        if self.peek() != Some('x') {
            self.cursor = start;
            return None;
        }

        self.advance();

        let variable = self
            .chomp_digits()
            .and_then(|digits| digits.parse::<usize>().ok());

        match variable {
            Some(variable) => Some(Term {
                coefficient: sign * coefficient,
                variable,
            }),
            None => {
                self.cursor = start;
                None
            },
        }
    }
}

impl<'a> Iterator for Terms<'a> {
    type Item = Term;

    fn next(&mut self) -> Option<Self::Item> {
        while self.cursor < self.src.len() {
            match self.chomp_term() {
                Some(term) => return Some(term),
                None => {
                    self.advance();
                },
            }
        }

        None
    }
}
