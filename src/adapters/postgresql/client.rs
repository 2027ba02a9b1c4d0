//! PostgreSQL client implementation
//!
//! This module provides the pooled, read-only client for the e-SUS PEC
//! database.

use crate::adapters::database::traits::SourceDatabase;
use crate::config::schema::SourceConfig;
use crate::domain::{ConnectorError, DomainTag, RawRow, Result, SourceError};
use async_trait::async_trait;
use chrono::NaiveDate;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use secrecy::ExposeSecret;
use std::collections::BTreeSet;
use std::str::FromStr;
use std::time::Duration;
use tokio_postgres::config::SslMode;
use tokio_postgres::{NoTls, Row};

const COLUMNS_QUERY: &str = "SELECT column_name::text FROM information_schema.columns \
     WHERE table_schema = 'public' AND table_name = $1";

/// PostgreSQL client for the PEC source database
///
/// Connections are pooled and opened lazily. Every extraction query runs in
/// its own read-only transaction.
pub struct PostgreSQLClient {
    /// Connection pool
    pool: Pool,

    /// Configuration
    config: SourceConfig,
}

impl PostgreSQLClient {
    /// Create a new PostgreSQL client
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS connector or the pool cannot be built.
    pub fn new(config: SourceConfig) -> Result<Self> {
        let ssl_mode = parse_ssl_mode(&config.ssl_mode)?;
        let timeout = Duration::from_secs(config.connect_timeout_seconds);

        let mut pg_config = tokio_postgres::Config::new();
        pg_config
            .host(&config.host)
            .port(config.port)
            .dbname(&config.database)
            .user(&config.user)
            .password(config.password.expose_secret().as_str())
            .application_name("pec-connector")
            .connect_timeout(timeout)
            .ssl_mode(ssl_mode);

        let manager_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let manager = match ssl_mode {
            SslMode::Disable => Manager::from_config(pg_config, NoTls, manager_config),
            _ => {
                // PEC installations ship self-signed certificates; libpq's
                // `require` does not verify them either.
                let connector = native_tls::TlsConnector::builder()
                    .danger_accept_invalid_certs(true)
                    .build()
                    .map_err(|e| {
                        ConnectorError::Configuration(format!("Failed to build TLS connector: {e}"))
                    })?;
                let tls = postgres_native_tls::MakeTlsConnector::new(connector);
                Manager::from_config(pg_config, tls, manager_config)
            }
        };

        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .runtime(Runtime::Tokio1)
            .wait_timeout(Some(timeout))
            .create_timeout(Some(timeout))
            .recycle_timeout(Some(timeout))
            .build()
            .map_err(|e| SourceError::Pool(format!("Failed to create connection pool: {e}")))?;

        Ok(Self { pool, config })
    }

    /// Get a connection from the pool
    ///
    /// # Errors
    ///
    /// Returns a connection-level error if a connection cannot be obtained.
    pub async fn get_connection(&self) -> Result<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| {
            SourceError::ConnectionFailed(format!("Failed to get connection from pool: {e}"))
                .into()
        })
    }

    /// Get the connection string (without password)
    pub fn connection_string_safe(&self) -> String {
        format!(
            "postgresql://{}:***@{}:{}/{}",
            self.config.user, self.config.host, self.config.port, self.config.database
        )
    }

    /// Get the pool statistics
    pub fn pool_status(&self) -> deadpool_postgres::Status {
        self.pool.status()
    }
}

#[async_trait]
impl SourceDatabase for PostgreSQLClient {
    async fn test_connection(&self) -> Result<()> {
        let client = self.get_connection().await?;

        client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| SourceError::ConnectionFailed(format!("Connection test failed: {e}")))?;

        tracing::info!(database = %self.connection_string_safe(), "PostgreSQL connection test successful");
        Ok(())
    }

    async fn table_columns(&self, table: &str) -> Result<BTreeSet<String>> {
        let client = self.get_connection().await?;

        let rows = client
            .query(COLUMNS_QUERY, &[&table])
            .await
            .map_err(|e| SourceError::QueryFailed(format!("Column lookup for {table} failed: {e}")))?;

        rows.iter()
            .map(|row| {
                row.try_get::<_, String>(0)
                    .map_err(|e| SourceError::Decode(format!("column_name: {e}")).into())
            })
            .collect()
    }

    async fn fetch_rows(&self, sql: &str, since: NaiveDate) -> Result<Vec<RawRow>> {
        let mut client = self.get_connection().await?;

        let tx = client
            .build_transaction()
            .read_only(true)
            .start()
            .await
            .map_err(|e| SourceError::QueryFailed(format!("Failed to open transaction: {e}")))?;

        if self.config.statement_timeout_seconds > 0 {
            let timeout_query = format!(
                "SET LOCAL statement_timeout = {}",
                self.config.statement_timeout_seconds * 1000
            );
            tx.batch_execute(&timeout_query).await.map_err(|e| {
                SourceError::QueryFailed(format!("Failed to set statement timeout: {e}"))
            })?;
        }

        // Dropping the transaction on an error path rolls it back.
        let rows = tx
            .query(sql, &[&since])
            .await
            .map_err(|e| SourceError::QueryFailed(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| SourceError::QueryFailed(format!("Failed to close transaction: {e}")))?;

        rows.iter().map(decode_row).collect()
    }

    fn describe(&self) -> String {
        self.connection_string_safe()
    }
}

/// Decode one extraction row by column alias
fn decode_row(row: &Row) -> Result<RawRow> {
    fn text(row: &Row, name: &str) -> Result<Option<String>> {
        row.try_get::<_, Option<String>>(name)
            .map_err(|e| SourceError::Decode(format!("{name}: {e}")).into())
    }

    fn date(row: &Row, name: &str) -> Result<Option<NaiveDate>> {
        row.try_get::<_, Option<NaiveDate>>(name)
            .map_err(|e| SourceError::Decode(format!("{name}: {e}")).into())
    }

    let domain = text(row, "domain_tag")?
        .ok_or_else(|| SourceError::Decode("domain_tag is null".to_string()))
        .and_then(|raw| DomainTag::from_str(&raw).map_err(SourceError::Decode))?;

    Ok(RawRow {
        ficha_uuid: text(row, "ficha_uuid")?,
        professional_name: text(row, "professional_name")?,
        professional_cns: text(row, "professional_cns")?,
        occupation_code: text(row, "occupation_code")?,
        patient_name: text(row, "patient_name")?,
        patient_cns: text(row, "patient_cns")?,
        patient_sex: text(row, "patient_sex")?,
        patient_cpf: text(row, "patient_cpf")?,
        birth_date: date(row, "birth_date")?,
        facility_code: text(row, "facility_code")?,
        procedure_code: text(row, "procedure_code")?,
        procedure_name: text(row, "procedure_name")?,
        production_date: date(row, "production_date")?,
        domain,
        cid_code: text(row, "cid_code")?,
        ciap_code: text(row, "ciap_code")?,
    })
}

fn parse_ssl_mode(raw: &str) -> Result<SslMode> {
    match raw {
        "disable" => Ok(SslMode::Disable),
        "prefer" => Ok(SslMode::Prefer),
        "require" => Ok(SslMode::Require),
        other => Err(ConnectorError::Configuration(format!(
            "Unsupported ssl_mode '{other}'"
        ))),
    }
}
