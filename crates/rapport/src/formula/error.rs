//! Formula errors.

use thiserror::Error;

/// Failure to compile or evaluate a Calculate formula.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// A character outside the grammar.
    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedChar { ch: char, position: usize },

    /// A token where the grammar expects something else.
    #[error("unexpected {found} at position {position}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: &'static str,
        position: usize,
    },

    /// The formula ended early.
    #[error("unexpected end of formula, expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    /// A `[` without its closing `]`.
    #[error("unterminated field reference starting at position {position}")]
    UnterminatedReference { position: usize },

    /// A name that is neither operand.
    #[error("unknown operand '{0}'")]
    UnknownOperand(String),

    /// A numeric literal that does not parse.
    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    /// Parentheses nested beyond the supported depth.
    #[error("formula nests deeper than {0} levels")]
    TooDeep(usize),

    /// Evaluation produced NaN or infinity.
    #[error("formula result is not a finite number")]
    NonFinite,
}
