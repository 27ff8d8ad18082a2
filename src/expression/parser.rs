use crate::expression::ast::{Assignment, Expr};
use crate::expression::lexer::{Token, tokenize, unwrap_parens};
use crate::foundation::error::{ExrmixError, ExrmixResult};

/// Parse a full `output.exr = <arithmetic>` expression.
pub fn parse_assignment(src: &str) -> ExrmixResult<Assignment> {
    let Some((lhs, rhs)) = src.split_once('=') else {
        return Err(ExrmixError::syntax(
            "expression must contain exactly one '=' (e.g. \"out.exr = a.exr + b.exr\")",
        ));
    };
    if rhs.contains('=') {
        return Err(ExrmixError::syntax(
            "expression must contain exactly one '='",
        ));
    }

    let output = lhs.trim();
    if output.is_empty() {
        return Err(ExrmixError::syntax("output path before '=' is empty"));
    }

    Ok(Assignment {
        output: output.to_owned(),
        expr: parse_expr(rhs)?,
    })
}

/// Parse one arithmetic sub-expression into a tree.
pub fn parse_expr(src: &str) -> ExrmixResult<Expr> {
    let unwrapped = unwrap_parens(src);
    if unwrapped.is_empty() {
        return Err(ExrmixError::syntax(format!(
            "empty sub-expression in '{}'",
            src.trim()
        )));
    }
    let tokens = tokenize(unwrapped)?;
    parse_tokens(&tokens, unwrapped)
}

/// Build the tree for one token run.
///
/// The split point is the rightmost weakest operator: the last Add/Sub
/// token if any exists, otherwise the last Mul/Div token. Recursing on
/// both sides of that split yields the conventional left-associative,
/// precedence-respecting tree (`a - b - c` becomes `(a - b) - c`,
/// `a + b * c` keeps `+` at the root).
fn parse_tokens(tokens: &[Token], src: &str) -> ExrmixResult<Expr> {
    if tokens.is_empty() {
        return Err(ExrmixError::syntax(format!("empty sub-expression in '{src}'")));
    }
    for (i, token) in tokens.iter().enumerate() {
        let expect_operand = i % 2 == 0;
        if expect_operand != token.is_operand() {
            return Err(ExrmixError::syntax(format!(
                "malformed expression '{src}': operands and operators must alternate"
            )));
        }
    }
    if tokens.len() % 2 == 0 {
        return Err(ExrmixError::syntax(format!(
            "malformed expression '{src}': trailing operator"
        )));
    }

    if tokens.len() == 1 {
        return match &tokens[0] {
            Token::Path(path) => Ok(Expr::Input(path.clone())),
            Token::Constant(v) => Ok(Expr::Constant(*v)),
            Token::SubTerm(inner) => parse_expr(inner),
            Token::Op(op) => Err(ExrmixError::syntax(format!(
                "operator '{}' without operands in '{src}'",
                op.symbol()
            ))),
        };
    }

    let mut split = 1;
    let mut split_is_additive = false;
    for (i, token) in tokens.iter().enumerate().skip(1).step_by(2) {
        if let Token::Op(op) = token {
            if op.is_additive() {
                split = i;
                split_is_additive = true;
            } else if !split_is_additive {
                split = i;
            }
        }
    }

    let Token::Op(op) = &tokens[split] else {
        return Err(ExrmixError::syntax(format!("malformed expression '{src}'")));
    };

    Ok(Expr::Binary {
        op: *op,
        left: Box::new(parse_tokens(&tokens[..split], src)?),
        right: Box::new(parse_tokens(&tokens[split + 1..], src)?),
    })
}
