//! Schema lens
//!
//! Lists schemas sharing a name prefix and drops all of them. Schemas may
//! depend on each other in an order the caller does not know, so dropping
//! works in passes: every pending schema is attempted, conflicts are left for
//! the next pass, and the operation fails once a whole pass makes no progress.
//!
//! # Example
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
//! // Dry run by default: only reports what would be dropped
//! let report = lens.drop_schemas(&SchemaDropArgs::new("dev_"), &config)?;
//! println!("{:?}", report.matched);
//!
//! // Actually drop, without per-schema confirmation
//! let args = SchemaDropArgs::new("dev_").with_dry_run(false).with_force(true);
//! let report = lens.drop_schemas(&args, &config)?;
//! ```

use crate::config::{SchemactlConfig, PREFIX_KEY};
use crate::database::{DropOutcome, SchemaCatalog};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

// =============================================================================
// Errors
// =============================================================================

/// Errors returned by the schema lens
#[derive(Debug, Error)]
pub enum SchemaError {
    /// No prefix was given and the configuration has none either
    #[error(
        "No prefix found in config [custom] \"{key}\"\nPlease pass a prefix explicitly or add it to the configuration"
    )]
    MissingPrefix { key: &'static str },

    /// A full pass dropped nothing; the remaining schemas cannot be dropped
    #[error(
        "Could not drop any of the following schemas:\n\t{}\nMost recent error:\n\t{last_error}",
        .remaining.join("\n\t")
    )]
    Stalled {
        remaining: Vec<String>,
        last_error: String,
    },

    /// Unrecoverable error from the catalog
    #[error(transparent)]
    Catalog(#[from] anyhow::Error),
}

// =============================================================================
// Progress
// =============================================================================

/// Progress information for drop operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropProgress {
    /// Dropping has started
    Started {
        prefix: String,
        /// Number of schemas matching the prefix
        total: usize,
    },
    /// A schema was dropped
    Dropped { name: String },
    /// The confirmation prompt for a schema was declined
    Declined { name: String },
    /// A schema could not be dropped in this pass
    Conflict { name: String, error: String },
    /// A pass over the pending schemas finished
    PassCompleted { pass: usize, remaining: usize },
}

/// Type alias for progress callback function
///
/// The callback receives `DropProgress` updates as schemas are dropped.
pub type DropProgressCallback = Arc<dyn Fn(DropProgress) + Send + Sync>;

// =============================================================================
// Args
// =============================================================================

/// Arguments for listing schemas
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
pub struct SchemaListArgs {
    /// Schema name prefix, e.g. "dev_"
    #[cfg_attr(feature = "cli", clap(value_name = "PREFIX"))]
    pub prefix: String,
}

impl SchemaListArgs {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

fn default_dry_run() -> bool {
    true
}

/// Arguments for dropping schemas
///
/// Defaults are the safe ones: `dry_run` is on and `force` is off.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
pub struct SchemaDropArgs {
    /// Schema name prefix; falls back to [custom] "database.prefix" in the configuration
    #[cfg_attr(feature = "cli", clap(value_name = "PREFIX"))]
    #[serde(default)]
    pub prefix: Option<String>,

    /// Actually drop the schemas (without this only the matching schemas are listed)
    #[cfg_attr(
        feature = "cli",
        clap(long = "execute", action = clap::ArgAction::SetFalse)
    )]
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,

    /// Skip the confirmation prompt before each drop
    #[cfg_attr(feature = "cli", clap(short, long))]
    #[serde(default)]
    pub force: bool,
}

impl Default for SchemaDropArgs {
    fn default() -> Self {
        Self {
            prefix: None,
            dry_run: default_dry_run(),
            force: false,
        }
    }
}

impl SchemaDropArgs {
    /// Create new args with an explicit prefix
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            ..Default::default()
        }
    }

    /// Create args that take the prefix from the configuration
    pub fn from_config() -> Self {
        Self::default()
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Explicit prefix if non-empty, otherwise the configured one
    pub fn resolve_prefix(&self, config: &SchemactlConfig) -> Result<String, SchemaError> {
        self.prefix
            .as_deref()
            .filter(|p| !p.is_empty())
            .or_else(|| config.database_prefix())
            .map(str::to_string)
            .ok_or(SchemaError::MissingPrefix { key: PREFIX_KEY })
    }
}

// =============================================================================
// Types
// =============================================================================

/// Outcome of a drop operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropReport {
    /// Prefix the schemas were selected by
    pub prefix: String,
    /// Whether this was a dry run (nothing dropped)
    pub dry_run: bool,
    /// Schemas matching the prefix when the operation started
    pub matched: Vec<String>,
    /// Schemas dropped, in drop order
    pub dropped: Vec<String>,
    /// Schemas kept because their confirmation was declined
    pub declined: Vec<String>,
    /// Number of passes over the pending schemas
    pub passes: usize,
}

// =============================================================================
// Lens
// =============================================================================

/// Schema lens
///
/// Borrows a catalog and exposes the list and drop operations over it.
pub struct SchemaLens<'a, C: SchemaCatalog + ?Sized> {
    catalog: &'a C,
}

impl<'a, C: SchemaCatalog + ?Sized> SchemaLens<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// All schemas whose name starts with `prefix`, in catalog order
    ///
    /// An empty prefix matches every schema.
    pub fn list(&self, prefix: &str) -> Result<Vec<String>, SchemaError> {
        let schemas = self.catalog.list_schemas()?;
        Ok(schemas
            .into_iter()
            .filter(|name| name.starts_with(prefix))
            .collect())
    }

    /// Drop every schema matching the prefix (or report them on a dry run)
    pub fn drop_schemas(
        &self,
        args: &SchemaDropArgs,
        config: &SchemactlConfig,
    ) -> Result<DropReport, SchemaError> {
        self.drop_schemas_with_progress(args, config, None)
    }

    /// Same as [`SchemaLens::drop_schemas`], reporting progress through a callback
    pub fn drop_schemas_with_progress(
        &self,
        args: &SchemaDropArgs,
        config: &SchemactlConfig,
        progress_callback: Option<DropProgressCallback>,
    ) -> Result<DropReport, SchemaError> {
        let prefix = args.resolve_prefix(config)?;
        let matched = self.list(&prefix)?;

        let mut report = DropReport {
            prefix: prefix.clone(),
            dry_run: args.dry_run,
            matched: matched.clone(),
            ..Default::default()
        };

        if args.dry_run {
            info!(
                "dry run: {} schema(s) match prefix '{}'",
                matched.len(),
                prefix
            );
            return Ok(report);
        }

        let notify = |event: DropProgress| {
            if let Some(ref cb) = progress_callback {
                cb(event);
            }
        };

        notify(DropProgress::Started {
            prefix,
            total: matched.len(),
        });

        let mut pending = matched;
        let mut last_error: Option<String> = None;

        while !pending.is_empty() {
            let pending_at_start = pending.len();
            report.passes += 1;

            for name in pending.clone() {
                match self.catalog.drop_schema(&name, args.force)? {
                    DropOutcome::Dropped => {
                        pending.retain(|p| p != &name);
                        info!("dropped schema {}", name);
                        notify(DropProgress::Dropped { name: name.clone() });
                        report.dropped.push(name);
                    }
                    DropOutcome::Declined => {
                        pending.retain(|p| p != &name);
                        info!("kept schema {}: drop not confirmed", name);
                        notify(DropProgress::Declined { name: name.clone() });
                        report.declined.push(name);
                    }
                    DropOutcome::Conflict(error) => {
                        debug!("conflict dropping {}: {}", name, error);
                        notify(DropProgress::Conflict {
                            name,
                            error: error.clone(),
                        });
                        last_error = Some(error);
                    }
                }
            }

            info!(
                "pass {} finished, {} schema(s) remaining",
                report.passes,
                pending.len()
            );
            notify(DropProgress::PassCompleted {
                pass: report.passes,
                remaining: pending.len(),
            });

            if pending.len() == pending_at_start {
                warn!(
                    "no progress in pass {}, giving up on {} schema(s)",
                    report.passes,
                    pending.len()
                );
                return Err(SchemaError::Stalled {
                    remaining: pending,
                    last_error: last_error.unwrap_or_default(),
                });
            }
        }

        Ok(report)
    }
}
