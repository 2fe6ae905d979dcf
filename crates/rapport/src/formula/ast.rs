//! Typed formula AST and its evaluator.

/// Which of the two input fields an operand refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(f64),
    Operand(Operand),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Evaluate with the two operand values bound.
    ///
    /// Division by zero yields 0.
    pub fn eval(&self, left: f64, right: f64) -> f64 {
        match self {
            Expr::Literal(n) => *n,
            Expr::Operand(Operand::Left) => left,
            Expr::Operand(Operand::Right) => right,
            Expr::Neg(inner) => -inner.eval(left, right),
            Expr::Binary { op, lhs, rhs } => {
                let l = lhs.eval(left, right);
                let r = rhs.eval(left, right);
                match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Sub => l - r,
                    BinaryOp::Mul => l * r,
                    BinaryOp::Div => {
                        if r == 0.0 {
                            0.0
                        } else {
                            l / r
                        }
                    }
                }
            }
        }
    }

    /// Whether the expression references the given operand.
    pub fn uses(&self, operand: Operand) -> bool {
        match self {
            Expr::Literal(_) => false,
            Expr::Operand(o) => *o == operand,
            Expr::Neg(inner) => inner.uses(operand),
            Expr::Binary { lhs, rhs, .. } => lhs.uses(operand) || rhs.uses(operand),
        }
    }
}
