//! Probe execution
//!
//! [`BatchExecutor`] drives the sequential commands: the sweep over every
//! registry entry and the per-region traces. Rows are written as soon as each
//! probe finishes. Transport failures go through the [`FailurePolicy`];
//! request construction failures always end the run.
//!
//! [`RankingExecutor`] runs repeated samples through a bounded worker pool.

pub mod ranking;

pub use ranking::RankingExecutor;

use crate::{
    client::{LatencyProbe, TracingProbe},
    error::{AppError, Result},
    log_debug,
    logging::{ErrorEventLogger, Logger, LoggerFactory, PerformanceLogger},
    models::Endpoint,
    output::Presenter,
    registry::EndpointRegistry,
    types::FailurePolicy,
};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::time::{Duration, Instant};

/// Counts for one sweep or trace batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Probes that produced a result (any status)
    pub completed: usize,
    /// Completed probes that returned 200
    pub succeeded: usize,
    /// Transport failures reported inline
    pub failed: usize,
    /// Region arguments absent from the registry
    pub unresolved: usize,
    pub duration: Duration,
}

/// Sequential sweep and trace driver
pub struct BatchExecutor {
    presenter: Presenter,
    policy: FailurePolicy,
    logger: Logger,
    error_logger: ErrorEventLogger,
    perf_logger: PerformanceLogger,
}

impl BatchExecutor {
    pub fn new(presenter: Presenter, policy: FailurePolicy, loggers: &LoggerFactory) -> Self {
        Self {
            presenter,
            policy,
            logger: loggers.create_logger("EXEC"),
            error_logger: loggers.create_error_logger(),
            perf_logger: loggers.create_performance_logger(),
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Probe every registry entry in code order. The header goes out before
    /// the first probe and the hint after the last one.
    pub async fn sweep<L, W>(&self, probe: &L, registry: &EndpointRegistry, out: &mut W) -> Result<BatchSummary>
    where
        L: LatencyProbe + ?Sized,
        W: Write,
    {
        let started = Instant::now();
        let mut summary = BatchSummary::default();

        write_flush(out, &self.presenter.sweep_header())?;

        for endpoint in registry.iter() {
            log_debug!(self.logger, "Probing region {} at {}", endpoint.code, endpoint.address);

            match probe.measure(endpoint).await {
                Ok(result) => {
                    summary.completed += 1;
                    if result.success {
                        summary.succeeded += 1;
                    }
                    write_flush(out, &self.presenter.probe_row(&result))?;
                }
                Err(error) => {
                    let row = self.presenter.failure_row(endpoint, &error);
                    self.handle_failure(endpoint, error).await?;
                    summary.failed += 1;
                    write_flush(out, &row)?;
                }
            }
        }

        write_flush(out, &self.presenter.sweep_footer())?;

        summary.duration = started.elapsed();
        self.perf_logger
            .log_batch_summary("sweep", registry.len(), summary.duration)
            .await;

        Ok(summary)
    }

    /// Trace each region argument in order. Unknown codes print the usage
    /// hint and processing moves on to the next argument.
    pub async fn trace_regions<T, W>(
        &self,
        probe: &T,
        registry: &EndpointRegistry,
        codes: &[String],
        out: &mut W,
    ) -> Result<BatchSummary>
    where
        T: TracingProbe + ?Sized,
        W: Write,
    {
        let started = Instant::now();
        let mut summary = BatchSummary::default();

        for code in codes {
            let endpoint = match registry.get(code) {
                Some(endpoint) => endpoint,
                None => {
                    let error = AppError::unresolved_region(code.as_str());
                    self.error_logger.log_error(&error, None, None).await;
                    summary.unresolved += 1;
                    write_flush(out, &self.presenter.unresolved_hint(code))?;
                    continue;
                }
            };

            log_debug!(self.logger, "Tracing region {} at {}", endpoint.code, endpoint.address);

            match probe.trace(endpoint).await {
                Ok(trace) => {
                    summary.completed += 1;
                    write_flush(out, &self.presenter.trace_block(endpoint, &trace)?)?;
                }
                Err(error) => {
                    let block = self.presenter.trace_failure(endpoint, &error);
                    self.handle_failure(endpoint, error).await?;
                    summary.failed += 1;
                    write_flush(out, &block)?;
                }
            }
        }

        summary.duration = started.elapsed();
        self.perf_logger
            .log_batch_summary("trace", codes.len(), summary.duration)
            .await;

        Ok(summary)
    }

    /// Log a probe error, then either hand it back to end the run or let
    /// the caller report it inline
    async fn handle_failure(&self, endpoint: &Endpoint, error: AppError) -> Result<()> {
        let context = format!("Probe of region {} failed", endpoint.code);
        self.error_logger.log_error(&error, Some(context.as_str()), None).await;

        if error.is_transport() && self.policy == FailurePolicy::Continue {
            crate::log_warn!(self.logger, "Continuing after failure in region {}", endpoint.code);
            Ok(())
        } else {
            Err(error)
        }
    }
}

fn write_flush<W: Write>(out: &mut W, text: &str) -> Result<()> {
    out.write_all(text.as_bytes())?;
    out.flush()?;
    Ok(())
}
