//! Domain logic for block-document versioning.
//!
//! Everything in this crate is pure: no I/O, no database types. The `db`
//! crate persists what these modules describe.

pub mod content;
pub mod diff;
pub mod error;
pub mod subject;
pub mod types;
pub mod versioning;
