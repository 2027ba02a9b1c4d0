//! Source database abstraction layer
//!
//! This module provides a trait-based abstraction over the PEC database so the
//! sync engine can run against PostgreSQL in production and a fake in tests.

pub mod factory;
pub mod traits;

pub use factory::create_source_database;
pub use traits::SourceDatabase;
