//! Reservation and electricity usage reports.
//!
//! Delimited text rows are decoded into typed records ([`decode`]), kept in a
//! [`store::RecordStore`], grouped and reduced by [`aggregate`], and rendered
//! as comma-decimal text by [`reports`] and [`output`].

pub mod aggregate;
pub mod config;
pub mod decode;
pub mod error;
pub mod loader;
pub mod output;
pub mod reports;
pub mod selector;
pub mod store;
pub mod types;
pub mod util;

pub use error::{ReportError, Result};
