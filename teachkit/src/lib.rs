//! Teaching-group workspace manager.
//!
//! A workspace is a directory tree for one teaching group: a hidden metadata
//! area, a shared resources area and one folder per student. The crate is
//! split the same way the data flows:
//!
//! - **[`core`]**: Pure, deterministic logic (typed values, defaults, the word
//!   limiter and the name sanitizer). No I/O.
//! - **[`io`]**: Side-effecting operations (layered configuration, decoration
//!   markers, the workspace integrity engine, tree copies).
//! - **[`entity`]**: Create/read/update/delete on groups, students and
//!   resources, dispatched through an explicit handler table.
//!
//! [`context::Context`] carries the resolved configuration and the workspace
//! for one run; it is built once at start-up and passed by reference.

pub mod context;
pub mod core;
pub mod entity;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use error::{Error, ErrorKind, Result};
