//! Source database abstraction
//!
//! This module defines the read-only interface the sync engine needs from the
//! e-SUS PEC database. Extraction code only talks to this trait, so cycles can
//! be exercised against an in-memory fake.

use crate::domain::{RawRow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Read-only access to the PEC schema
///
/// Implementations never write to the source database.
#[async_trait]
pub trait SourceDatabase: Send + Sync {
    /// Test the database connection with a trivial round-trip
    ///
    /// # Errors
    ///
    /// Returns a connection-level error if the database cannot be reached.
    async fn test_connection(&self) -> Result<()>;

    /// Column names of a table in the `public` schema
    ///
    /// Returns an empty set when the table does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog query fails.
    async fn table_columns(&self, table: &str) -> Result<BTreeSet<String>>;

    /// Run a composed extraction query with the window start bound to `$1`
    ///
    /// Each call runs inside its own read-only transaction; a failed query
    /// leaves no session state behind for the next domain.
    ///
    /// # Errors
    ///
    /// Returns a query error if the statement fails, or a connection-level
    /// error if no connection could be obtained.
    async fn fetch_rows(&self, sql: &str, since: NaiveDate) -> Result<Vec<RawRow>>;

    /// Connection description safe to log (no credentials)
    fn describe(&self) -> String;
}
