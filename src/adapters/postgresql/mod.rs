//! PostgreSQL source integration
//!
//! This module provides the read-only client for the e-SUS PEC database.

pub mod client;

pub use client::PostgreSQLClient;
