//! SELECT statement assembly
//!
//! Every extraction query projects the same aliased columns (see
//! [`ROW_COLUMNS`]). Text columns are cast to `TEXT` and date columns to
//! `DATE`, so rows decode by name regardless of the installation's column
//! types. Columns a domain does not provide are projected as typed `NULL`s.

use crate::domain::ROW_COLUMNS;
use std::collections::BTreeMap;

const DATE_COLUMNS: [&str; 2] = ["birth_date", "production_date"];

/// Window filter shared by every domain; `$1` is the window start date
pub const WINDOW_FILTER: &str = "tempo.dt_registro >= $1::date";

/// Builder for one extraction statement
#[derive(Debug, Clone)]
pub struct SelectShape {
    from: String,
    joins: Vec<String>,
    columns: BTreeMap<&'static str, String>,
}

impl SelectShape {
    /// Start from `<table> <alias>`
    pub fn from(table: &str, alias: &str) -> Self {
        Self {
            from: format!("{table} {alias}"),
            joins: Vec::new(),
            columns: BTreeMap::new(),
        }
    }

    /// Append a join clause verbatim
    pub fn join(mut self, clause: impl Into<String>) -> Self {
        self.joins.push(clause.into());
        self
    }

    /// Project `expr` as `alias`
    pub fn column(mut self, alias: &'static str, expr: impl Into<String>) -> Self {
        debug_assert!(ROW_COLUMNS.contains(&alias), "unknown column alias {alias}");
        self.columns.insert(alias, expr.into());
        self
    }

    /// Project a string literal as `alias`
    pub fn literal(self, alias: &'static str, value: &str) -> Self {
        let quoted = format!("'{}'", value.replace('\'', "''"));
        self.column(alias, quoted)
    }

    /// Render the statement, filtered by the window start
    pub fn render(&self) -> String {
        let projections: Vec<String> = ROW_COLUMNS
            .iter()
            .map(|alias| {
                let expr = self.columns.get(alias).map(String::as_str).unwrap_or("NULL");
                let ty = if DATE_COLUMNS.contains(alias) { "DATE" } else { "TEXT" };
                format!("    CAST({expr} AS {ty}) AS {alias}")
            })
            .collect();

        let mut sql = String::from("SELECT\n");
        sql.push_str(&projections.join(",\n"));
        sql.push_str("\nFROM ");
        sql.push_str(&self.from);
        for join in &self.joins {
            sql.push('\n');
            sql.push_str(join);
        }
        sql.push_str("\nWHERE ");
        sql.push_str(WINDOW_FILTER);
        sql
    }
}
