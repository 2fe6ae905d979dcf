//! Closed arithmetic grammar for Calculate stages.
//!
//! A formula combines exactly two operands with `+ - * /`, parentheses,
//! numeric literals and unary minus. It is compiled once to a typed AST and
//! evaluated per row; nothing is ever executed dynamically.
//!
//! Operands may be written as `a`/`b` (first and second input field), as the
//! input field name when it is a plain identifier, or as `[Field Name]`.

mod ast;
mod error;
mod lexer;
mod parser;

pub use ast::{BinaryOp, Expr, Operand};
pub use error::FormulaError;
pub use parser::MAX_DEPTH;

/// A compiled formula bound to two input fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    /// Compile `source` with `left` and `right` as the operand field names.
    pub fn compile(source: &str, left: &str, right: &str) -> Result<Self, FormulaError> {
        let tokens = lexer::tokenize(source)?;
        let expr = parser::Parser::new(&tokens, left, right).parse()?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    /// Evaluate with the operand values bound.
    pub fn evaluate(&self, left: f64, right: f64) -> Result<f64, FormulaError> {
        let result = self.expr.eval(left, right);
        if result.is_finite() {
            Ok(result)
        } else {
            Err(FormulaError::NonFinite)
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_operands() {
        let f = Formula::compile("a - b", "Premium", "Cost").unwrap();
        assert_eq!(f.evaluate(10.0, 4.0).unwrap(), 6.0);
    }

    #[test]
    fn test_named_operands_and_precedence() {
        let f = Formula::compile("(Premium - [Cost]) / Premium * 100", "Premium", "Cost").unwrap();
        assert_eq!(f.evaluate(200.0, 50.0).unwrap(), 75.0);

        let g = Formula::compile("a + b * 2", "x", "y").unwrap();
        assert_eq!(g.evaluate(1.0, 3.0).unwrap(), 7.0);
    }

    #[test]
    fn test_division_by_zero_yields_zero() {
        let f = Formula::compile("a / b", "x", "y").unwrap();
        assert_eq!(f.evaluate(10.0, 0.0).unwrap(), 0.0);
    }

    #[test]
    fn test_unary_minus() {
        let f = Formula::compile("-a + -(-b)", "x", "y").unwrap();
        assert_eq!(f.evaluate(2.0, 5.0).unwrap(), 3.0);
    }

    #[test]
    fn test_compile_errors() {
        assert!(matches!(
            Formula::compile("a + c", "x", "y"),
            Err(FormulaError::UnknownOperand(name)) if name == "c"
        ));
        assert!(matches!(
            Formula::compile("(a + b", "x", "y"),
            Err(FormulaError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            Formula::compile("a b", "x", "y"),
            Err(FormulaError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            Formula::compile("", "x", "y"),
            Err(FormulaError::UnexpectedEnd { .. })
        ));
    }

    #[test]
    fn test_depth_limit() {
        let deep = format!("{}a{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert_eq!(
            Formula::compile(&deep, "x", "y"),
            Err(FormulaError::TooDeep(MAX_DEPTH))
        );
    }

    #[test]
    fn test_non_finite() {
        let f = Formula::compile("a * b", "x", "y").unwrap();
        assert_eq!(f.evaluate(f64::MAX, 10.0), Err(FormulaError::NonFinite));
    }
}
