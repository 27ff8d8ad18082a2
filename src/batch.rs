//! Parallel execution of a resolved batch.
//!
//! Patches are independent by construction (each job reads only its own
//! substituted inputs and writes only its own output), so the batch runs
//! on a dedicated rayon pool, one task per job. A failing job is recorded
//! and the rest of the batch keeps going; callers inspect the report.

use rayon::prelude::*;

use crate::codec::{ImageIo, StoreOptions};
use crate::eval::{Value, evaluate};
use crate::expression::ast::Expr;
use crate::foundation::error::{ExrmixError, ExrmixResult};
use crate::sequence::{BatchPlan, Job};

/// One failed job and why.
#[derive(Debug)]
pub struct BatchFailure {
    pub output_path: String,
    pub error: ExrmixError,
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Output paths written successfully, in job order.
    pub written: Vec<String>,
    /// Jobs that failed, in job order.
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn all_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Evaluate and store every job of the plan.
///
/// `threads` overrides the rayon worker count; `None` uses the rayon
/// default.
#[tracing::instrument(skip(expr, plan, io, options), fields(jobs = plan.jobs.len()))]
pub fn run_batch(
    expr: &Expr,
    plan: &BatchPlan,
    io: &dyn ImageIo,
    options: &StoreOptions,
    threads: Option<usize>,
) -> ExrmixResult<BatchReport> {
    let pool = build_thread_pool(threads)?;
    let results: Vec<Result<String, BatchFailure>> = pool.install(|| {
        plan.jobs
            .par_iter()
            .map(|job| run_job(expr, job, io, options))
            .collect()
    });

    let mut report = BatchReport::default();
    for result in results {
        match result {
            Ok(path) => report.written.push(path),
            Err(failure) => report.failures.push(failure),
        }
    }
    Ok(report)
}

fn run_job(
    expr: &Expr,
    job: &Job,
    io: &dyn ImageIo,
    options: &StoreOptions,
) -> Result<String, BatchFailure> {
    tracing::info!(output = %job.output_path, "computing");
    let outcome = evaluate(expr, &job.patch, io).and_then(|value| match value {
        Value::Image(buffer) => io.store(&job.output_path, &buffer, options),
        Value::Scalar(_) => Err(ExrmixError::NonImageResult(job.output_path.clone())),
    });
    match outcome {
        Ok(()) => Ok(job.output_path.clone()),
        Err(error) => {
            tracing::warn!(output = %job.output_path, %error, "job failed");
            Err(BatchFailure {
                output_path: job.output_path.clone(),
                error,
            })
        }
    }
}

fn build_thread_pool(threads: Option<usize>) -> ExrmixResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(ExrmixError::validation("'threads' must be >= 1 when set"));
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ExrmixError::validation(format!("failed to build thread pool: {e}")))
}

/// Outcome of the optional post-run verification pass.
#[derive(Debug, Default)]
pub struct VerifyReport {
    pub checked: usize,
    pub failures: Vec<BatchFailure>,
}

impl VerifyReport {
    pub fn all_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Best-effort check that every produced output decodes to a non-empty
/// image. Purely diagnostic; batch results stand either way.
pub fn verify_outputs(paths: &[String], io: &dyn ImageIo) -> VerifyReport {
    let mut report = VerifyReport {
        checked: paths.len(),
        ..VerifyReport::default()
    };
    for path in paths {
        let outcome = io.load(path).and_then(|buffer| {
            if buffer.width() == 0 || buffer.height() == 0 {
                Err(ExrmixError::validation(format!("'{path}' decoded to an empty image")))
            } else {
                Ok(())
            }
        });
        if let Err(error) = outcome {
            tracing::warn!(output = %path, %error, "verification failed");
            report.failures.push(BatchFailure {
                output_path: path.clone(),
                error,
            });
        }
    }
    report
}
