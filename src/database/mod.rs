//! Database module
//!
//! This module provides all database functionality for schemactl, organized into:
//!
//! - **core**: SQLite connection wrapper
//! - **catalog**: the schema catalog (list and drop schemas)
//!
//! # Architecture
//!
//! ```text
//! database/
//! ├── core/           # Foundation
//! │   └── connection  # SQLite DatabaseConn wrapper
//! │
//! └── catalog         # SchemaCatalog trait and the SQLite-backed catalog
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use schemactl::database::{SchemaCatalog, SqliteCatalog};
//!
//! // Every `<name>.sqlite3` file in the directory becomes a schema
//! let catalog = SqliteCatalog::open_in_dir("~/.schemactl/schemas")?;
//! catalog.create_schema("dev_subject")?;
//!
//! for name in catalog.list_schemas()? {
//!     println!("{}", name);
//! }
//! ```

pub mod catalog;
pub mod core;

pub use catalog::{
    stdin_prompt, validate_schema_name, ConfirmPrompt, DropOutcome, SchemaCatalog, SqliteCatalog,
    SCHEMA_FILE_EXTENSION,
};
pub use core::DatabaseConn;

/// Ensure the data directory exists
pub fn ensure_data_dir(data_dir: &str) -> anyhow::Result<()> {
    std::fs::create_dir_all(data_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create data directory '{}': {}", data_dir, e))
}
