use crate::expression::ast::BinOp;
use crate::foundation::error::{ExrmixError, ExrmixResult};

/// One token of an arithmetic sub-expression.
///
/// Parenthesized groups are kept opaque as [`Token::SubTerm`] (the full
/// `(...)` substring, inclusive); the parser re-enters the tokenizer for
/// their interior.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    /// A file operand, terminated by its `.exr` extension.
    Path(String),
    /// A numeric literal.
    Constant(f32),
    /// A binary operator.
    Op(BinOp),
    /// An opaque parenthesized group, including both parentheses.
    SubTerm(String),
}

impl Token {
    pub(crate) fn is_operand(&self) -> bool {
        !matches!(self, Token::Op(_))
    }
}

/// Strip parenthesis pairs that enclose the whole expression.
///
/// Only a pair whose opening parenthesis matches the final character is
/// removed, so `(a.exr) + (b.exr)` is left alone.
pub(crate) fn unwrap_parens(s: &str) -> &str {
    let mut t = s.trim();
    while let Some(inner) = strip_enclosing_pair(t) {
        t = inner.trim();
    }
    t
}

fn strip_enclosing_pair(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'(') || bytes.last() != Some(&b')') {
        return None;
    }
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    // The opening parenthesis closes here; it encloses the
                    // whole string only when this is the last character.
                    return (i == bytes.len() - 1).then(|| &s[1..bytes.len() - 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split an already-unwrapped sub-expression into a flat token sequence.
///
/// A well-formed sequence alternates operand, operator, operand, ... and
/// therefore has odd length; the parser checks that shape.
pub(crate) fn tokenize(input: &str) -> ExrmixResult<Vec<Token>> {
    let bytes = input.as_bytes();
    let lower = input.to_ascii_lowercase();
    let mut out = Vec::new();
    let mut i = 0usize;

    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let start = i;

        if let Some(op) = BinOp::from_symbol(c) {
            out.push(Token::Op(op));
            i += 1;
            continue;
        }

        if c == '(' {
            let mut depth = 0usize;
            let mut end = None;
            for (j, &b) in bytes.iter().enumerate().skip(i) {
                match b {
                    b'(' => depth += 1,
                    b')' => {
                        depth -= 1;
                        if depth == 0 {
                            end = Some(j);
                            break;
                        }
                    }
                    _ => {}
                }
            }
            let Some(end) = end else {
                return Err(ExrmixError::syntax(format!(
                    "unbalanced parentheses in '{input}'"
                )));
            };
            out.push(Token::SubTerm(input[start..=end].to_owned()));
            i = end + 1;
            continue;
        }

        if c == ')' {
            return Err(ExrmixError::syntax(format!(
                "unexpected ')' in '{input}'"
            )));
        }

        // Numeric literal: [0-9]+(.[0-9]+)?([eE][+-]?[0-9]+)? or .[0-9]+...
        // Accepted as a constant only when the scan stops at a token
        // boundary; otherwise the operand is parsed as a file path, which
        // keeps digit-leading filenames like `0007_beauty.exr` intact.
        if let Some(end) = scan_number(bytes, i)
            && is_boundary(bytes, end)
        {
            let s = &input[start..end];
            let v: f32 = s.parse().map_err(|_| {
                ExrmixError::syntax(format!("invalid numeric constant '{s}'"))
            })?;
            out.push(Token::Constant(v));
            i = end;
            continue;
        }

        // File path operand, terminated by its `.exr` extension
        // (case-insensitive). Anything up to that marker belongs to the
        // path, operators included.
        let Some(rel) = lower[i..].find(".exr") else {
            return Err(ExrmixError::syntax(format!(
                "operand at '{}' is neither a number nor an .exr path",
                &input[i..]
            )));
        };
        let end = i + rel + ".exr".len();
        out.push(Token::Path(input[start..end].to_owned()));
        i = end;
    }

    Ok(out)
}

fn scan_number(bytes: &[u8], mut i: usize) -> Option<usize> {
    let start = i;
    let c = bytes[i] as char;
    if !c.is_ascii_digit() && !(c == '.' && i + 1 < bytes.len() && bytes[i + 1].is_ascii_digit()) {
        return None;
    }

    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    // fractional part
    if i < bytes.len() && bytes[i] == b'.' && i + 1 < bytes.len() && bytes[i + 1].is_ascii_digit() {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    // exponent
    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        let mut j = i + 1;
        if j < bytes.len() && matches!(bytes[j], b'+' | b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }

    (i > start).then_some(i)
}

fn is_boundary(bytes: &[u8], i: usize) -> bool {
    if i >= bytes.len() {
        return true;
    }
    let c = bytes[i] as char;
    c.is_whitespace() || matches!(c, '(' | ')' | '+' | '-' | '*' | '/')
}
