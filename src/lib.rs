//! Read-only data access layer for the series analysis dashboard.
//!
//! The dashboard displays analysis snapshots produced for radio-show series.
//! Access is gated per document by permission data stored alongside the data
//! itself: the backing store evaluates a rule set on every read, and this
//! crate only requests data and decodes what comes back. [`Database`] is the
//! typed facade over a [`store::DocumentStore`] and [`store::BlobStore`]
//! bound to one signed-in identity's credentials.

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod rules;
pub mod store;

pub use database::Database;
pub use error::{DecodeError, StoreError};
