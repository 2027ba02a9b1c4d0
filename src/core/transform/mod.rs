//! Record normalization
//!
//! Every domain's rows share the [`RawRow`](crate::domain::RawRow) shape and
//! are mapped into one [`CanonicalRecord`](crate::domain::CanonicalRecord):
//!
//! - [`identity`] - domain-specific `externalId` rules
//! - [`normalize`] - field mapping and date rendering

pub mod identity;
pub mod normalize;

pub use identity::external_id;
pub use normalize::{normalize_row, normalize_rows, Normalized};
