//! Lens module
//!
//! This module provides high-level "lens" abstractions that combine business logic
//! with output-ready types. Lenses are reusable from the CLI or as a library.
//!
//! # Architecture
//!
//! Each lens module exports:
//! - A **Lens struct** (e.g., `SchemaLens`) - the main entry point for all operations
//! - **Args structs** - input arguments for lens methods
//! - **Output types** - return types and progress events
//!
//! # Usage
//!
//! ```rust,ignore
//! use schemactl::lens::schema::{SchemaDropArgs, SchemaLens, SchemaListArgs};
//! ```

pub mod utils;

// SchemaLens - list and drop schemas by prefix
pub mod schema;
