//! Top-level compose pipeline: parse, resolve, run.

use crate::batch::{self, BatchReport};
use crate::codec::{ImageIo, StoreOptions};
use crate::expression::ast::Assignment;
use crate::expression::parser::parse_assignment;
use crate::foundation::error::ExrmixResult;
use crate::sequence::{self, BatchPlan};

/// A parsed and fully resolved compose request, ready to run.
#[derive(Debug, Clone)]
pub struct ComposePlan {
    pub assignment: Assignment,
    pub batch: BatchPlan,
}

/// Parse an expression and resolve its wildcard batch.
///
/// Every syntax, wildcard, and missing-file error surfaces here, before a
/// single image is decoded.
#[tracing::instrument]
pub fn parse_and_resolve(expression: &str) -> ExrmixResult<ComposePlan> {
    let assignment = parse_assignment(expression)?;
    tracing::debug!(tree = %assignment, "parsed expression");

    let inputs = assignment.expr.input_paths();
    let batch = sequence::resolve(&assignment.output, &inputs)?;
    tracing::info!(jobs = batch.jobs.len(), "resolved batch");

    Ok(ComposePlan { assignment, batch })
}

/// Run a resolved plan against the given image I/O collaborator.
pub fn run_batch(
    plan: &ComposePlan,
    io: &dyn ImageIo,
    options: &StoreOptions,
    threads: Option<usize>,
) -> ExrmixResult<BatchReport> {
    batch::run_batch(&plan.assignment.expr, &plan.batch, io, options, threads)
}

/// One-call convenience: parse, resolve, and run an expression.
pub fn compose(
    expression: &str,
    io: &dyn ImageIo,
    options: &StoreOptions,
    threads: Option<usize>,
) -> ExrmixResult<BatchReport> {
    let plan = parse_and_resolve(expression)?;
    run_batch(&plan, io, options, threads)
}
