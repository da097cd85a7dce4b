//! Command dispatch
//!
//! [`App`] owns the resolved configuration, the immutable region registry and
//! both probes. `run` picks one command from the configuration and writes its
//! report to the given writer, framed by a blank line before and after.

use crate::{
    client::{HttpLatencyProbe, HttpTracingProbe, LatencyProbe, TracingProbe},
    error::Result,
    executor::{BatchExecutor, RankingExecutor},
    log_debug,
    logging::{Logger, LoggerFactory},
    models::Config,
    output::Presenter,
    registry::{EndpointRegistry, RegistrySource},
};
use std::io::Write;
use std::sync::Arc;

/// What a run does, decided from the configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Print the registry
    List,
    /// Rank every region by median latency
    Rank,
    /// Probe every region once
    Sweep,
    /// Trace the named regions
    Trace,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::List => "list",
            Mode::Rank => "rank",
            Mode::Sweep => "sweep",
            Mode::Trace => "trace",
        }
    }

    pub fn from_config(config: &Config) -> Self {
        if config.list {
            Mode::List
        } else if config.rank {
            Mode::Rank
        } else if config.regions.is_empty() {
            Mode::Sweep
        } else {
            Mode::Trace
        }
    }
}

pub struct App<L, T> {
    config: Config,
    registry: EndpointRegistry,
    latency_probe: Arc<L>,
    tracing_probe: T,
    presenter: Presenter,
    loggers: LoggerFactory,
    logger: Logger,
}

impl App<HttpLatencyProbe, HttpTracingProbe> {
    /// Load the registry and build the network probes
    pub fn new(config: Config) -> Result<Self> {
        let registry = EndpointRegistry::load(&RegistrySource::resolve(&config))?;
        let loggers = LoggerFactory::new(&config);
        let latency_probe = HttpLatencyProbe::new(loggers.create_network_logger())?;
        let tracing_probe = HttpTracingProbe::new(loggers.create_network_logger())?;

        Ok(Self::assemble(config, registry, latency_probe, tracing_probe, loggers))
    }
}

impl<L, T> App<L, T>
where
    L: LatencyProbe + 'static,
    T: TracingProbe,
{
    pub fn with_probes(config: Config, registry: EndpointRegistry, latency_probe: L, tracing_probe: T) -> Self {
        let loggers = LoggerFactory::new(&config);
        Self::assemble(config, registry, latency_probe, tracing_probe, loggers)
    }

    fn assemble(
        config: Config,
        registry: EndpointRegistry,
        latency_probe: L,
        tracing_probe: T,
        loggers: LoggerFactory,
    ) -> Self {
        Self {
            presenter: Presenter::new(config.provider, config.enable_color),
            logger: loggers.create_logger("APP"),
            latency_probe: Arc::new(latency_probe),
            tracing_probe,
            registry,
            loggers,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    pub fn mode(&self) -> Mode {
        Mode::from_config(&self.config)
    }

    /// Run the configured command, writing the report to `out`
    pub async fn run<W: Write>(&self, out: &mut W) -> Result<()> {
        let mode = self.mode();
        let operation = mode.as_str();
        self.logger
            .add_context_field("provider", self.config.provider.to_string())
            .await;
        let correlation_id = self.logger.start_operation(operation).await;
        log_debug!(self.logger, "Running {} over {} regions", operation, self.registry.len());

        writeln!(out)?;
        let result = self.dispatch(mode, out).await;
        self.logger
            .end_operation(&correlation_id, operation, result.is_ok())
            .await;
        result?;

        writeln!(out)?;
        out.flush()?;
        Ok(())
    }

    async fn dispatch<W: Write>(&self, mode: Mode, out: &mut W) -> Result<()> {
        match mode {
            Mode::List => {
                out.write_all(self.presenter.region_listing(&self.registry).as_bytes())?;
            }
            Mode::Rank => {
                let probe: Arc<dyn LatencyProbe> = self.latency_probe.clone();
                let executor = RankingExecutor::from_config(probe, &self.config, &self.loggers);
                let rankings = executor.rank(&self.registry).await?;
                out.write_all(self.presenter.ranking(&rankings).as_bytes())?;
            }
            Mode::Sweep => {
                self.batch_executor()
                    .sweep(self.latency_probe.as_ref(), &self.registry, out)
                    .await?;
            }
            Mode::Trace => {
                self.batch_executor()
                    .trace_regions(&self.tracing_probe, &self.registry, &self.config.regions, out)
                    .await?;
            }
        }
        Ok(())
    }

    fn batch_executor(&self) -> BatchExecutor {
        BatchExecutor::new(self.presenter, self.config.failure_policy, &self.loggers)
    }
}
