//! Domain models and types for the connector.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`FichaId`], [`ExternalId`])
//! - **Clinical domains** ([`DomainTag`])
//! - **Row and record shapes** ([`RawRow`], [`CanonicalRecord`])
//! - **Error types** ([`ConnectorError`], [`SourceError`], [`IngestionError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, ConnectorError>`]:
//!
//! ```rust
//! use pec_connector::domain::Result;
//!
//! fn example() -> Result<()> {
//!     let _config = pec_connector::config::load_config("pec-connector.toml")?;
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod ids;
pub mod record;
pub mod result;
pub mod row;
pub mod tag;

pub use errors::{ConnectorError, IngestionError, SourceError};
pub use ids::{ExternalId, FichaId};
pub use record::{CanonicalRecord, Patient, Procedure, Professional, Unit};
pub use result::Result;
pub use row::{RawRow, ROW_COLUMNS};
pub use tag::DomainTag;
