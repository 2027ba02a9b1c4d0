//! Ingestion endpoint abstraction

use crate::domain::{CanonicalRecord, Result};
use async_trait::async_trait;

/// Remote endpoint receiving canonical records
///
/// The endpoint upserts by `externalId`, so resending a record is harmless.
#[async_trait]
pub trait IngestionSink: Send + Sync {
    /// Post one batch as `{"records": [...]}`
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint cannot be reached, times out, or
    /// answers with a status other than 200 or 201.
    async fn post_batch(&self, records: &[CanonicalRecord]) -> Result<()>;

    /// Reachability and credential check with an empty batch
    ///
    /// # Errors
    ///
    /// Same conditions as [`IngestionSink::post_batch`].
    async fn probe(&self) -> Result<()> {
        self.post_batch(&[]).await
    }

    /// Endpoint URL, for logs and diagnostics
    fn endpoint(&self) -> &str;
}
