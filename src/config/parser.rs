//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    config::env::EnvManager,
    error::Result,
    logging::LogLevel,
    models::Config,
    types::FailurePolicy,
};

/// Builds the run configuration: defaults, then `.env`, then the
/// environment, then command-line flags
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and validate the complete configuration from the process environment
    pub fn parse(&self) -> Result<Config> {
        EnvManager::load_env_file(self.cli.debug)?;
        self.parse_with(|key| std::env::var(key).ok())
    }

    /// Same as [`parse`](Self::parse) with variables from `lookup` and no `.env` loading
    pub fn parse_with<F>(&self, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        config.merge_from_vars(lookup)?;
        self.apply_cli_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply_cli_overrides(&self, config: &mut Config) {
        let args = self.cli.provider_args();

        config.provider = self.cli.provider();
        config.regions = args.regions.clone();
        config.list = args.list;
        config.rank = args.rank;

        if let Some(samples) = args.samples {
            config.samples = samples;
        }

        if let Some(concurrency) = args.concurrency {
            config.concurrency = concurrency;
        }

        if args.keep_going {
            config.failure_policy = FailurePolicy::Continue;
        }

        if let Some(path) = &self.cli.endpoints {
            config.endpoints_file = Some(path.clone());
        }

        if self.cli.no_color {
            config.enable_color = false;
        }

        if self.cli.debug {
            config.debug = true;
            config.log_level = config.log_level.min(LogLevel::Debug);
        }
    }
}

/// Convenience function to load the complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// One line per setting, for debug output
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    summary.push(format!("Provider: {}", config.provider));
    if !config.regions.is_empty() {
        summary.push(format!("Regions: {}", config.regions.join(", ")));
    }
    if let Some(path) = &config.endpoints_file {
        summary.push(format!("Endpoints file: {}", path.display()));
    }
    if let Some(path) = &config.endpoints_dir {
        summary.push(format!("Endpoints directory: {}", path.display()));
    }
    summary.push(format!("Failure policy: {:?}", config.failure_policy));
    if config.rank {
        summary.push(format!("Ranking: {} samples, {} in flight", config.samples, config.concurrency));
    }
    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Log level: {}", config.log_level.as_str()));

    summary.join("\n")
}
