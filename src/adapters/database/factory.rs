//! Source database factory
//!
//! Builds the source database client from configuration.

use crate::adapters::database::traits::SourceDatabase;
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::config::schema::SourceConfig;
use crate::domain::Result;
use std::sync::Arc;

/// Create the source database client
///
/// The pool is created lazily: no connection is opened until the first query,
/// so this succeeds even when the database is down.
///
/// # Errors
///
/// Returns an error if the configuration cannot be turned into a pool.
pub fn create_source_database(config: &SourceConfig) -> Result<Arc<dyn SourceDatabase>> {
    tracing::info!(
        host = %config.host,
        port = config.port,
        database = %config.database,
        ssl_mode = %config.ssl_mode,
        "Creating PostgreSQL source client"
    );
    let client = PostgreSQLClient::new(config.clone())?;
    Ok(Arc::new(client) as Arc<dyn SourceDatabase>)
}
