//! Deterministic, pure logic shared by the workspace engine and the entities.
//!
//! Core modules must be free of filesystem side effects. They operate on
//! in-memory values and return deterministic outputs suitable for tests.

pub mod defaults;
pub mod naming;
pub mod platform;
pub mod value;
pub mod words;
