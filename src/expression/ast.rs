use std::fmt;

use crate::sequence;

/// Binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    pub(crate) fn from_symbol(c: char) -> Option<Self> {
        match c {
            '+' => Some(Self::Add),
            '-' => Some(Self::Sub),
            '*' => Some(Self::Mul),
            '/' => Some(Self::Div),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Sub => '-',
            Self::Mul => '*',
            Self::Div => '/',
        }
    }

    /// Add/Sub bind weaker than Mul/Div.
    pub(crate) fn is_additive(self) -> bool {
        matches!(self, Self::Add | Self::Sub)
    }

    /// Standard floating-point arithmetic; division by zero follows IEEE
    /// semantics and is not trapped.
    pub fn apply(self, left: f32, right: f32) -> f32 {
        match self {
            Self::Add => left + right,
            Self::Sub => left - right,
            Self::Mul => left * right,
            Self::Div => left / right,
        }
    }
}

/// An arithmetic sub-tree over file operands and numeric constants.
///
/// The tree is built once by the parser and never mutated; every operator
/// node owns exactly two children.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A file operand. The path may contain one sequence wildcard group.
    Input(String),
    /// A numeric literal.
    Constant(f32),
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    /// All input path templates in the tree, left to right.
    pub fn input_paths(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_inputs(&mut out);
        out
    }

    fn collect_inputs<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Input(path) => out.push(path),
            Expr::Constant(_) => {}
            Expr::Binary { left, right, .. } => {
                left.collect_inputs(out);
                right.collect_inputs(out);
            }
        }
    }

    /// Render the sub-tree with `patch` substituted into every template.
    pub fn render(&self, patch: &str) -> String {
        match self {
            Expr::Input(path) => sequence::substitute(path, patch),
            Expr::Constant(v) => v.to_string(),
            Expr::Binary { op, left, right } => format!(
                "({} {} {})",
                left.render(patch),
                op.symbol(),
                right.render(patch)
            ),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Input(path) => f.write_str(path),
            Expr::Constant(v) => write!(f, "{v}"),
            Expr::Binary { op, left, right } => {
                write!(f, "({left} {} {right})", op.symbol())
            }
        }
    }
}

/// A full parsed expression: `output template = arithmetic tree`.
///
/// The root is always an assignment; encoding it as a struct keeps that
/// invariant out of the `Expr` enum entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Output path template (may contain one wildcard group).
    pub output: String,
    /// Right-hand arithmetic tree.
    pub expr: Expr,
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.output, self.expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(p: &str) -> Expr {
        Expr::Input(p.to_owned())
    }

    #[test]
    fn collects_inputs_left_to_right() {
        let e = Expr::Binary {
            op: BinOp::Add,
            left: Box::new(leaf("a.exr")),
            right: Box::new(Expr::Binary {
                op: BinOp::Mul,
                left: Box::new(Expr::Constant(2.0)),
                right: Box::new(leaf("b.exr")),
            }),
        };
        assert_eq!(e.input_paths(), vec!["a.exr", "b.exr"]);
    }

    #[test]
    fn display_parenthesizes_binary_terms() {
        let e = Expr::Binary {
            op: BinOp::Sub,
            left: Box::new(leaf("a.exr")),
            right: Box::new(Expr::Constant(0.5)),
        };
        assert_eq!(e.to_string(), "(a.exr - 0.5)");
    }

    #[test]
    fn render_substitutes_the_patch() {
        let e = Expr::Binary {
            op: BinOp::Add,
            left: Box::new(leaf("beauty_#.exr")),
            right: Box::new(leaf("spec_#.exr")),
        };
        assert_eq!(e.render("0007"), "(beauty_0007.exr + spec_0007.exr)");
    }
}
