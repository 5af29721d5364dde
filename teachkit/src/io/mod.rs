//! I/O helpers: configuration files, markers and the workspace tree.

pub mod config;
pub mod copy;
pub mod marker;
pub mod workspace;
