//! Query composition
//!
//! Extraction statements are assembled from three layers:
//!
//! - [`catalogue`] - static [`DomainSpec`] descriptors, one per domain
//! - [`fragments`] - pure resolvers that choose optional joins from the
//!   [`SchemaProfile`](crate::core::schema::SchemaProfile)
//! - [`composer`] - turns a spec and its resolved fragments into SQL
//!
//! ```rust
//! use pec_connector::core::query::{ComposedQuery, DomainSpec, QueryComposer};
//! use pec_connector::core::schema::SchemaProfile;
//! use pec_connector::domain::DomainTag;
//!
//! let profile = SchemaProfile::new()
//!     .with_table("tb_fat_vacinacao_vacina", ["co_dim_via_adm_vacina"]);
//! let composition = QueryComposer::new(&profile).compose(DomainSpec::of(DomainTag::Vaccination));
//!
//! match composition.query {
//!     ComposedQuery::Ready(sql) => assert!(sql.contains("tb_dim_via_administracao")),
//!     ComposedQuery::Skip(reason) => panic!("{reason}"),
//! }
//! ```

pub mod catalogue;
pub mod composer;
pub mod fragments;
pub mod select;

pub use catalogue::{probed_tables, DomainSpec, CATALOGUE};
pub use composer::{ComposedQuery, Composition, QueryComposer};
pub use fragments::{CollectiveShape, DiagnosisLink, VaccinationDetail};
