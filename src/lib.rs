//! exrmix composes OpenEXR images and sequences with arithmetic
//! expressions.
//!
//! An expression names one output and combines input files and constants
//! with `+ - * /` and parentheses:
//!
//! ```text
//! beauty_#.exr = (diffuse_#.exr * light_#.exr) + specular_#.exr
//! ```
//!
//! A `#` (variable length) or a `???` run (fixed length) in a filename
//! expands the expression into one job per discovered frame; jobs are
//! validated up front and then run in parallel.
//!
//! The usual flow is [`parse_and_resolve`] followed by [`run_batch`], or
//! [`compose`] for both in one call.
#![forbid(unsafe_code)]

pub mod batch;
pub mod codec;
pub mod eval;
pub mod expression;
mod foundation;
pub mod pipeline;
pub mod sequence;

pub use crate::codec::{Compression, ExrCodec, ImageIo, StoreOptions};
pub use crate::expression::ast::{Assignment, BinOp, Expr};
pub use crate::expression::parser::{parse_assignment, parse_expr};
pub use crate::foundation::buffer::PixelBuffer;
pub use crate::foundation::error::{ExrmixError, ExrmixResult};
pub use crate::pipeline::{ComposePlan, compose, parse_and_resolve, run_batch};
