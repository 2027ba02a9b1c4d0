//! Logging and observability
//!
//! Structured logging through `tracing`, with a console layer and an
//! optional rolling JSON file layer.
//!
//! # Example
//!
//! ```no_run
//! use pec_connector::logging::init_logging;
//! use pec_connector::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Connector started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use pec_connector::log_error_with_context;
/// use pec_connector::domain::ConnectorError;
///
/// let error = ConnectorError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
