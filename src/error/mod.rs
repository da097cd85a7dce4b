//! Error handling for pingcloud

use thiserror::Error;

/// Error taxonomy for registry loading, probing and presentation
#[derive(Error, Debug)]
pub enum AppError {
    /// Registry source missing or malformed, invalid settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// Endpoint address cannot be turned into a request
    #[error("Request construction error: {0}")]
    RequestConstruction(String),

    /// DNS, connect, TLS or read/write failure during an exchange
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response arrived with a status other than 200
    #[error("Ping failed with status code: {status}")]
    Protocol { status: u16 },

    /// Region code not present in the registry
    #[error("Unknown region code: {0}")]
    UnresolvedRegion(String),

    /// I/O errors (file operations, terminal writes)
    #[error("I/O error: {0}")]
    Io(String),

    /// Parsing errors (numbers, enum values)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new request construction error
    pub fn request_construction<S: Into<String>>(message: S) -> Self {
        Self::RequestConstruction(message.into())
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport(message.into())
    }

    /// Create a new protocol error for a non-200 status
    pub fn protocol(status: u16) -> Self {
        Self::Protocol { status }
    }

    /// Create a new unresolved region error
    pub fn unresolved_region<S: Into<String>>(code: S) -> Self {
        Self::UnresolvedRegion(code.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::RequestConstruction(_) => "REQUEST",
            Self::Transport(_) => "TRANSPORT",
            Self::Protocol { .. } => "PROTOCOL",
            Self::UnresolvedRegion(_) => "REGION",
            Self::Io(_) => "IO",
            Self::Parse(_) => "PARSE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Whether this error ends the whole run.
    ///
    /// Transport errors are fatal here; a batch driver running with
    /// [`FailurePolicy::Continue`](crate::types::FailurePolicy::Continue)
    /// may still choose to report them inline.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Protocol { .. } | Self::UnresolvedRegion(_))
    }

    /// Whether this is a transport-level failure
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Parse(_) | Self::RequestConstruction(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::Transport(_) | Self::Protocol { .. } => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::UnresolvedRegion(_) | Self::Io(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(error: url::ParseError) -> Self {
        Self::request_construction(format!("URL parse error: {}", error))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_builder() {
            Self::request_construction(error.to_string())
        } else {
            Self::transport(error.to_string())
        }
    }
}

impl From<trust_dns_resolver::error::ResolveError> for AppError {
    fn from(error: trust_dns_resolver::error::ResolveError) -> Self {
        Self::transport(format!("DNS resolution failed: {}", error))
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::parse(format!("Integer parse error: {}", error))
    }
}

impl From<std::str::ParseBoolError> for AppError {
    fn from(error: std::str::ParseBoolError) -> Self {
        Self::parse(format!("Boolean parse error: {}", error))
    }
}

impl From<std::fmt::Error> for AppError {
    fn from(error: std::fmt::Error) -> Self {
        Self::io(format!("Formatting error: {}", error))
    }
}

// Anyhow integration
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal(error.to_string())
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Error reporter for user-facing fatal errors
pub struct ErrorReporter {
    pub use_color: bool,
}

impl ErrorReporter {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    /// Render an error the way it is printed on termination
    pub fn render(&self, error: &AppError) -> String {
        format!("Error: {}", error.format_for_console(self.use_color))
    }

    /// Report an error to stderr
    pub fn report_error(&self, error: &AppError) {
        eprintln!("{}", self.render(error));
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(false)
    }
}
