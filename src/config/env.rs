//! Environment variable handling and .env file management

use crate::{
    error::{AppError, Result},
    models::Config,
};
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load `.env` from the working directory into the process environment.
    /// Variables already set take precedence. Returns whether a file was read.
    pub fn load_env_file(debug: bool) -> Result<bool> {
        Self::load_env_file_from(Path::new(".env"), debug)
    }

    pub fn load_env_file_from(path: &Path, debug: bool) -> Result<bool> {
        if !path.exists() {
            if debug {
                eprintln!("No {} file found, using environment and CLI arguments", path.display());
            }
            return Ok(false);
        }

        dotenv::from_path(path)
            .map_err(|e| AppError::config(format!("Failed to load {}: {}", path.display(), e)))?;

        if debug {
            eprintln!("Loaded configuration from {}", path.display());
        }
        Ok(true)
    }

    /// Example .env content documenting every supported variable
    pub fn create_example_env_content() -> String {
        let mut content = String::from(
            "# pingcloud configuration\n\
             #\n\
             # Values here are used when the variable is not already set in the\n\
             # environment. Command-line flags override both.\n\n",
        );

        for (var, description, example) in Self::get_supported_env_vars() {
            content.push_str(&format!("# {}\n# {}={}\n\n", description, var, example));
        }

        content
    }

    /// Check one variable the same way configuration loading does
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        let mut config = Config::default();
        config.merge_from_vars(|k| (k == key).then(|| value.to_string()))?;
        config.validate()
    }

    /// Supported variables as (name, description, example)
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("PINGCLOUD_DIR", "Directory containing endpoints/<provider>.csv", "/opt/pingcloud"),
            ("PINGCLOUD_ENDPOINTS", "Region table CSV file, overrides PINGCLOUD_DIR", "./regions.csv"),
            ("PINGCLOUD_FAILURE_POLICY", "abort or continue on transport failures", "continue"),
            ("PINGCLOUD_SAMPLES", "Samples per region for --rank (1-100)", "5"),
            ("PINGCLOUD_CONCURRENCY", "Probes in flight for --rank (1-64)", "4"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
            ("NO_COLOR", "Disable colored output when set to any value", "1"),
            ("LOG_LEVEL", "trace, debug, info, warn, error or fatal", "warn"),
            ("LOG_FORMAT", "console, json or compact", "console"),
        ]
    }

    /// Environment section appended to `--help`
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Environment variables:\n");

        for (var, description, _) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<26} {}\n", var, description));
        }

        help.push_str("\nPrecedence (highest first): command-line flags, environment, .env file, defaults\n");
        help
    }
}
