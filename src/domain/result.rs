//! Result type alias for the connector

use super::errors::ConnectorError;

/// Result type alias for connector operations
///
/// # Examples
///
/// ```
/// use pec_connector::domain::result::Result;
/// use pec_connector::domain::errors::ConnectorError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(ConnectorError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, ConnectorError>;
