//! Domain extractors
//!
//! Each domain runs behind its own failure boundary: a failed query yields a
//! [`DomainError`] for that domain only, and the cycle moves on to the next.

use crate::adapters::database::SourceDatabase;
use crate::core::query::{ComposedQuery, DomainSpec, QueryComposer};
use crate::core::schema::SchemaProfile;
use crate::domain::{ConnectorError, DomainTag, RawRow};
use chrono::NaiveDate;
use thiserror::Error;

/// Why a domain contributed no rows
#[derive(Debug, Error)]
pub enum DomainError {
    /// The installation lacks what the domain needs
    #[error("{reason}")]
    Skipped { reason: String },

    /// The query ran and failed
    #[error("{source}")]
    Failed {
        #[source]
        source: ConnectorError,
    },
}

impl DomainError {
    /// Whether the failure means the database itself is gone
    pub fn is_connection_level(&self) -> bool {
        match self {
            DomainError::Skipped { .. } => false,
            DomainError::Failed { source } => source.is_connection_level(),
        }
    }
}

/// Result of extracting one domain
#[derive(Debug)]
pub struct Extraction {
    pub domain: DomainTag,
    /// Degradation notices raised while composing the query
    pub warnings: Vec<String>,
    pub outcome: Result<Vec<RawRow>, DomainError>,
}

/// Runs composed domain queries against the source database
pub struct DomainExtractor<'a> {
    db: &'a dyn SourceDatabase,
    composer: QueryComposer<'a>,
}

impl<'a> DomainExtractor<'a> {
    pub fn new(db: &'a dyn SourceDatabase, profile: &'a SchemaProfile) -> Self {
        Self {
            db,
            composer: QueryComposer::new(profile),
        }
    }

    /// Extract every row of `domain` produced on or after `since`
    pub async fn extract(&self, domain: DomainTag, since: NaiveDate) -> Extraction {
        let composition = self.composer.compose(DomainSpec::of(domain));

        let outcome = match composition.query {
            ComposedQuery::Skip(reason) => Err(DomainError::Skipped { reason }),
            ComposedQuery::Ready(sql) => {
                tracing::debug!(domain = %domain, since = %since, "Running extraction query");
                self.db
                    .fetch_rows(&sql, since)
                    .await
                    .map_err(|source| DomainError::Failed { source })
            }
        };

        match &outcome {
            Ok(rows) => tracing::debug!(domain = %domain, rows = rows.len(), "Extraction finished"),
            Err(e) => tracing::debug!(domain = %domain, error = %e, "Extraction produced no rows"),
        }

        Extraction {
            domain,
            warnings: composition.warnings,
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::query::catalogue::{COLLECTIVE_PARTICIPANT_TABLE, COLLECTIVE_TABLE};
    use crate::core::testing::FakeSource;
    use crate::domain::SourceError;

    fn since() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[tokio::test]
    async fn test_rows_are_returned() {
        let source = FakeSource::new().with_rows(
            DomainTag::Procedure,
            vec![RawRow::new("F1", DomainTag::Procedure).with_procedure("C1", "CURATIVO")],
        );
        let profile = SchemaProfile::new();
        let extractor = DomainExtractor::new(&source, &profile);

        let extraction = extractor.extract(DomainTag::Procedure, since()).await;
        assert_eq!(extraction.outcome.unwrap().len(), 1);
        assert!(source.queries()[0].contains("'PROCEDURE'"));
    }

    #[tokio::test]
    async fn test_missing_tables_skip_without_querying() {
        let source = FakeSource::new();
        let profile = SchemaProfile::new();
        let extractor = DomainExtractor::new(&source, &profile);

        let extraction = extractor.extract(DomainTag::CollectiveActivity, since()).await;
        let err = extraction.outcome.unwrap_err();
        assert!(matches!(err, DomainError::Skipped { .. }));
        assert!(!err.is_connection_level());
        assert!(source.queries().is_empty());
    }

    #[tokio::test]
    async fn test_query_failure_is_contained() {
        let source = FakeSource::new().failing_domain(DomainTag::CollectiveActivity);
        let profile = SchemaProfile::new()
            .with_table(COLLECTIVE_TABLE, ["co_seq_fat_atvdd_coletiva"])
            .with_table(COLLECTIVE_PARTICIPANT_TABLE, ["co_fat_atividade_coletiva"]);
        let extractor = DomainExtractor::new(&source, &profile);

        let extraction = extractor.extract(DomainTag::CollectiveActivity, since()).await;
        let err = extraction.outcome.unwrap_err();
        assert!(matches!(
            err,
            DomainError::Failed {
                source: ConnectorError::Source(SourceError::QueryFailed(_))
            }
        ));
        assert!(!err.is_connection_level());
    }
}
