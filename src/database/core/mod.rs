//! Core database infrastructure
//!
//! This module provides the foundational database components used by the catalog:
//! - `DatabaseConn`: Core SQLite connection wrapper with configuration

mod connection;

pub use connection::DatabaseConn;
