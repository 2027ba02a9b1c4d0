//! Schema inspection
//!
//! PEC installations differ in which optional columns and tables exist. The
//! inspector asks the database catalog once per cycle and hands the composer
//! an immutable [`SchemaProfile`] snapshot.

use crate::adapters::database::SourceDatabase;
use std::collections::{BTreeMap, BTreeSet};

/// Present columns per probed table, snapshotted at cycle start
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaProfile {
    tables: BTreeMap<String, BTreeSet<String>>,
}

impl SchemaProfile {
    /// Empty profile: every optional fragment resolves to its most
    /// conservative shape
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the columns discovered for a table
    pub fn insert<I, S>(&mut self, table: impl Into<String>, columns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables
            .insert(table.into(), columns.into_iter().map(Into::into).collect());
    }

    /// Builder form of [`SchemaProfile::insert`]
    pub fn with_table<I, S>(mut self, table: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(table, columns);
        self
    }

    /// Columns of a table; empty when the table is absent or was not probed
    pub fn columns(&self, table: &str) -> &BTreeSet<String> {
        static EMPTY: BTreeSet<String> = BTreeSet::new();
        self.tables.get(table).unwrap_or(&EMPTY)
    }

}

/// Catalog probe over a [`SourceDatabase`]
pub struct SchemaInspector<'a> {
    db: &'a dyn SourceDatabase,
}

impl<'a> SchemaInspector<'a> {
    pub fn new(db: &'a dyn SourceDatabase) -> Self {
        Self { db }
    }

    /// Present column names of a table in the default schema
    ///
    /// Any failure yields an empty set, which callers treat as "none of the
    /// optional columns exist".
    pub async fn columns_of(&self, table: &str) -> BTreeSet<String> {
        match self.db.table_columns(table).await {
            Ok(columns) => columns,
            Err(e) => {
                tracing::warn!(table = %table, error = %e, "Column probe failed, assuming no optional columns");
                BTreeSet::new()
            }
        }
    }

    /// Probe every table once and return the snapshot
    pub async fn snapshot<'t, I>(&self, tables: I) -> SchemaProfile
    where
        I: IntoIterator<Item = &'t str>,
    {
        let mut profile = SchemaProfile::new();
        for table in tables {
            if profile.tables.contains_key(table) {
                continue;
            }
            let columns = self.columns_of(table).await;
            tracing::debug!(table = %table, columns = columns.len(), "Probed table");
            profile.insert(table, columns);
        }
        profile
    }
}
