//! Domain identifier types with validation
//!
//! Newtype wrappers for the identifiers that flow from the source database
//! to the ingestion endpoint.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ficha identifier newtype wrapper
///
/// The UUID of one clinical record sheet in the source system. It is kept as
/// an opaque string: installations store it as `varchar` and some legacy rows
/// carry values that are not strict RFC 4122 UUIDs.
///
/// # Examples
///
/// ```
/// use pec_connector::domain::ids::FichaId;
/// use std::str::FromStr;
///
/// let ficha = FichaId::from_str("8d2c6a0e-1b7f-4c55-9a54-3f0e2f6c9b11").unwrap();
/// assert_eq!(ficha.as_str(), "8d2c6a0e-1b7f-4c55-9a54-3f0e2f6c9b11");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FichaId(String);

impl FichaId {
    /// Creates a new FichaId, rejecting blank values
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Ficha UUID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the ficha UUID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FichaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FichaId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for FichaId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// External identity of a canonical record
///
/// Derived deterministically from the ficha and the domain-specific
/// deduplication key, so that re-sending the same source row produces the
/// same identity and the endpoint can upsert it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalId(String);

impl ExternalId {
    /// The bare ficha identity
    pub fn from_ficha(ficha: &FichaId) -> Self {
        Self(ficha.as_str().to_string())
    }

    /// Appends `_<part>` to the identity
    pub fn with_suffix(mut self, part: &str) -> Self {
        self.0.push('_');
        self.0.push_str(part);
        self
    }

    /// Returns the external id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
