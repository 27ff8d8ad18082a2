//! Bottom-up evaluation of a parsed arithmetic tree for one patch.

use crate::codec::ImageIo;
use crate::expression::ast::{BinOp, Expr};
use crate::foundation::buffer::PixelBuffer;
use crate::foundation::error::{ExrmixError, ExrmixResult};
use crate::sequence;

/// The value of a sub-tree: a loaded image or a plain constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Image(PixelBuffer),
    Scalar(f32),
}

/// Evaluate `expr` for one patch.
///
/// A pure fold over the owned tree: file leaves load through `io` with
/// the patch substituted, constants pass through, and operator nodes
/// combine their children with broadcasting between images and scalars.
/// No state is shared between calls, so patches may evaluate in parallel.
pub fn evaluate(expr: &Expr, patch: &str, io: &dyn ImageIo) -> ExrmixResult<Value> {
    match expr {
        Expr::Input(template) => {
            let path = sequence::substitute(template, patch);
            Ok(Value::Image(io.load(&path)?))
        }
        Expr::Constant(v) => Ok(Value::Scalar(*v)),
        Expr::Binary { op, left, right } => {
            let left = evaluate(left, patch, io)?;
            let right = evaluate(right, patch, io)?;
            combine(*op, left, right)
        }
    }
}

fn combine(op: BinOp, left: Value, right: Value) -> ExrmixResult<Value> {
    match (left, right) {
        (Value::Scalar(l), Value::Scalar(r)) => Ok(Value::Scalar(op.apply(l, r))),
        (Value::Image(l), Value::Image(r)) => {
            if !l.same_shape(&r) {
                return Err(ExrmixError::shape_mismatch(format!(
                    "cannot combine a {}x{} image with a {}x{} image",
                    l.width(),
                    l.height(),
                    r.width(),
                    r.height()
                )));
            }
            if l.has_alpha() != r.has_alpha() {
                return Err(ExrmixError::alpha_mismatch(
                    "cannot combine an image with an alpha channel and one without",
                ));
            }
            Ok(Value::Image(l.zip(&r, |a, b| op.apply(a, b))))
        }
        (Value::Image(image), Value::Scalar(c)) => {
            Ok(Value::Image(image.map(|v| op.apply(v, c))))
        }
        (Value::Scalar(c), Value::Image(image)) => {
            Ok(Value::Image(image.map(|v| op.apply(c, v))))
        }
    }
}
