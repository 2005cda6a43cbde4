//! Redundant feed line identity.

use std::fmt;

/// One of the two redundant multicast paths carrying the same sequenced stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Line {
    /// Primary feed (`IA` connection).
    A,
    /// Secondary feed (`IB` connection).
    B,
}

impl Line {
    /// Both lines, in report order.
    pub const ALL: [Line; 2] = [Line::A, Line::B];

    /// Returns the single-letter code used in configuration ids and reports.
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Line::A => 'A',
            Line::B => 'B',
        }
    }

    /// Returns the redundant partner line.
    #[must_use]
    pub const fn other(self) -> Line {
        match self {
            Line::A => Line::B,
            Line::B => Line::A,
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_code_and_display() {
        assert_eq!(Line::A.code(), 'A');
        assert_eq!(Line::B.to_string(), "B");
    }

    #[test]
    fn test_line_other() {
        assert_eq!(Line::A.other(), Line::B);
        assert_eq!(Line::B.other(), Line::A);
    }
}
