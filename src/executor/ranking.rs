//! Ranking by median latency over a bounded worker pool
//!
//! Every region gets `samples` work items. At most `concurrency` probes are in
//! flight at once; results come back over a channel and are folded into
//! per-region sample sets. Non-200 responses and transport failures count as
//! errors for their region and never stop the ranking.

use crate::{
    client::LatencyProbe,
    error::{AppError, Result},
    logging::{Logger, LoggerFactory, PerformanceLogger},
    models::{Config, Endpoint, ProbeResult},
    registry::EndpointRegistry,
    stats::{self, RegionRanking, RegionSamples},
};
use futures::future::join_all;
use std::{collections::BTreeMap, sync::Arc, time::Instant};
use tokio::sync::{mpsc, Semaphore};

/// Outcome of one work item
type Sample = (String, Result<ProbeResult>);

pub struct RankingExecutor {
    probe: Arc<dyn LatencyProbe>,
    samples: u32,
    concurrency: usize,
    logger: Logger,
    perf_logger: PerformanceLogger,
}

impl RankingExecutor {
    pub fn new(probe: Arc<dyn LatencyProbe>, samples: u32, concurrency: usize, loggers: &LoggerFactory) -> Self {
        Self {
            probe,
            samples: samples.max(1),
            concurrency: concurrency.max(1),
            logger: loggers.create_logger("RANK"),
            perf_logger: loggers.create_performance_logger(),
        }
    }

    pub fn from_config(probe: Arc<dyn LatencyProbe>, config: &Config, loggers: &LoggerFactory) -> Self {
        Self::new(probe, config.samples, config.concurrency, loggers)
    }

    pub fn samples(&self) -> u32 {
        self.samples
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Sample every region and return them in ranking order
    pub async fn rank(&self, registry: &EndpointRegistry) -> Result<Vec<RegionRanking>> {
        let collected = self.collect(registry).await?;
        Ok(stats::rank(collected))
    }

    /// Run all work items and fold the outcomes into per-region samples.
    ///
    /// Request construction failures are not sampling noise: the first one
    /// is returned once the pool has drained.
    pub async fn collect(&self, registry: &EndpointRegistry) -> Result<Vec<RegionSamples>> {
        let started = Instant::now();
        let work_items = registry.len() * self.samples as usize;

        let mut by_region: BTreeMap<String, RegionSamples> = registry
            .iter()
            .map(|endpoint| (endpoint.code.clone(), RegionSamples::new(endpoint.code.as_str())))
            .collect();

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let (sender, mut receiver) = mpsc::channel::<Sample>(work_items.max(1));
        let mut tasks = Vec::with_capacity(work_items);

        for endpoint in registry.iter() {
            for _ in 0..self.samples {
                tasks.push(spawn_sample(
                    self.probe.clone(),
                    semaphore.clone(),
                    sender.clone(),
                    endpoint.clone(),
                ));
            }
        }

        // Only worker clones remain, so the channel closes when the last one finishes
        drop(sender);

        let mut fatal: Option<AppError> = None;
        while let Some((code, outcome)) = receiver.recv().await {
            let Some(region) = by_region.get_mut(&code) else {
                continue;
            };

            match outcome {
                Ok(result) if result.success => region.add_sample(result.latency),
                Ok(_) => region.add_error(),
                Err(error) if error.is_transport() => {
                    self.logger
                        .debug(&format!("Sample for region {} failed", code))
                        .error_info(&error)
                        .log()
                        .await;
                    region.add_error();
                }
                Err(error) => {
                    region.add_error();
                    fatal.get_or_insert(error);
                }
            }
        }

        for joined in join_all(tasks).await {
            joined.map_err(|e| AppError::internal(format!("Ranking worker failed: {}", e)))?;
        }

        self.perf_logger
            .log_batch_summary("ranking", work_items, started.elapsed())
            .await;

        match fatal {
            Some(error) => Err(error),
            None => Ok(by_region.into_values().collect()),
        }
    }
}

fn spawn_sample(
    probe: Arc<dyn LatencyProbe>,
    semaphore: Arc<Semaphore>,
    sender: mpsc::Sender<Sample>,
    endpoint: Endpoint,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let outcome = match semaphore.acquire().await {
            Ok(_permit) => probe.measure(&endpoint).await,
            Err(e) => Err(AppError::internal(format!("Worker pool closed: {}", e))),
        };
        let _ = sender.send((endpoint.code, outcome)).await;
    })
}
