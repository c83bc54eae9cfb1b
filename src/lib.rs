#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! Schemactl - list and drop database schemas by name prefix
//!
//! Schemactl selects schemas sharing a naming prefix (per project, per
//! developer, per test run) and either lists them or drops all of them.
//! Dropping retries in passes so schemas that depend on each other go away
//! without the caller working out a drop order. It can be used as both a
//! command-line application and a library.
//!
//! # Feature Flags
//!
//! | Feature | Description | Key Dependencies |
//! |---------|-------------|------------------|
//! | (none) | Catalog, config and the schema lens | `rusqlite`, `config` |
//! | `cli` | The `schemactl` binary and clap derives on lens args | `clap`, `tabled`, `tracing-subscriber` |
//!
//! # Architecture
//!
//! - **[`database`]**: the schema catalog
//!   - `core`: SQLite connection management
//!   - `catalog`: `SchemaCatalog` trait and the SQLite-backed catalog
//!
//! - **[`lens`]**: high-level operations
//!   - `schema`: list schemas by prefix, drop schemas by prefix
//!
//! - **[`config`]**: Configuration management
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use schemactl::database::SqliteCatalog;
//! use schemactl::lens::schema::{SchemaDropArgs, SchemaLens};
//! use schemactl::SchemactlConfig;
//!
//! let config = SchemactlConfig::new(&None)?;
//! let catalog = SqliteCatalog::open_in_dir(&config.schema_dir)?;
//! let lens = SchemaLens::new(&catalog);
//!
//! for name in lens.list("dev_")? {
//!     println!("{}", name);
//! }
//!
//! // Prefix taken from [custom] "database.prefix" in the configuration
//! let args = SchemaDropArgs::from_config().with_dry_run(false);
//! let report = lens.drop_schemas(&args, &config)?;
//! println!("dropped {} schemas in {} passes", report.dropped.len(), report.passes);
//! ```

pub mod config;
pub mod database;
pub mod lens;

// =============================================================================
// Configuration
// =============================================================================

pub use config::{SchemactlConfig, PREFIX_KEY};

// =============================================================================
// Database Module - Re-export commonly used types
// =============================================================================

pub use database::{DatabaseConn, DropOutcome, SchemaCatalog, SqliteCatalog};

// =============================================================================
// Lens Module
// =============================================================================

pub use lens::schema::{
    DropProgress, DropProgressCallback, DropReport, SchemaDropArgs, SchemaError, SchemaLens,
    SchemaListArgs,
};
pub use lens::utils::OutputFormat;
