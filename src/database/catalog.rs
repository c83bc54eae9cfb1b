//! Schema catalog
//!
//! The catalog is the collaborator that knows which schemas exist and how to
//! drop one. [`SchemaCatalog`] is the seam the schema lens works against;
//! [`SqliteCatalog`] is the concrete backend, where every schema is an SQLite
//! database file in one directory.

use crate::database::core::DatabaseConn;
use anyhow::{anyhow, bail, Result};
use rusqlite::ErrorCode;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// File extension of schema files inside the schema directory
pub const SCHEMA_FILE_EXTENSION: &str = "sqlite3";

/// Databases every SQLite connection carries that are never user schemas
const RESERVED_SCHEMAS: &[&str] = &["main", "temp"];

/// SQL for the bookkeeping table written into every created schema
const SCHEMA_META_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS "{schema}".schemactl_meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
    );
"#;

/// Result of a single drop attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// The schema no longer exists
    Dropped,
    /// The confirmation prompt was answered "no"; nothing changed
    Declined,
    /// The schema could not be dropped right now (dependency conflict, busy or
    /// locked); a later attempt may succeed
    Conflict(String),
}

/// Listing and dropping schemas
///
/// Errors returned from either method are unrecoverable. Recoverable drop
/// failures are reported as [`DropOutcome::Conflict`] instead.
pub trait SchemaCatalog {
    /// All schema names known to the connection, in catalog order
    fn list_schemas(&self) -> Result<Vec<String>>;

    /// Attempt to drop one schema
    ///
    /// Unless `force` is set, the catalog asks for confirmation first.
    fn drop_schema(&self, name: &str, force: bool) -> Result<DropOutcome>;
}

/// Confirmation prompt asked before a non-forced drop
pub type ConfirmPrompt = Box<dyn Fn(&str) -> bool>;

/// Ask on stderr and read the answer from stdin; only `y`/`yes` confirms
pub fn stdin_prompt(name: &str) -> bool {
    eprint!("Drop schema '{}'? [y/N] ", name);
    let _ = std::io::stderr().flush();

    let mut input = String::new();
    if std::io::stdin().read_line(&mut input).is_err() {
        return false;
    }
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Check that a schema name can be used as a file stem and SQL identifier
pub fn validate_schema_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("Schema name must not be empty");
    }
    if RESERVED_SCHEMAS.contains(&name.to_lowercase().as_str()) {
        bail!("'{}' is a reserved schema name", name);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        bail!(
            "Invalid schema name '{}': only ASCII letters, digits, '_' and '-' are allowed",
            name
        );
    }
    Ok(())
}

/// Classify a SQLite error raised while dropping a schema
///
/// Returns the conflict message for recoverable errors, or the error itself
/// when it should abort the operation.
fn classify_drop_error(name: &str, err: rusqlite::Error) -> Result<DropOutcome> {
    match err.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy)
        | Some(ErrorCode::DatabaseLocked)
        | Some(ErrorCode::ConstraintViolation) => Ok(DropOutcome::Conflict(format!(
            "Cannot drop schema '{}': {}",
            name, err
        ))),
        _ => Err(anyhow!("Failed to drop schema '{}': {}", name, err)),
    }
}

/// SQLite-backed schema catalog
///
/// Schemas live in `<schema_dir>/<name>.sqlite3`; the directory listing is the
/// catalog query. A schema is attached to the catalog's in-memory connection
/// only while it is being created or dropped, so the number of schemas is not
/// bounded by SQLite's attached-database limit.
pub struct SqliteCatalog {
    db: DatabaseConn,
    schema_dir: PathBuf,
    prompt: ConfirmPrompt,
}

impl SqliteCatalog {
    /// Open the catalog over a schema directory
    ///
    /// The directory is created if it does not exist yet.
    pub fn open_in_dir(schema_dir: impl AsRef<Path>) -> Result<Self> {
        let schema_dir = schema_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&schema_dir).map_err(|e| {
            anyhow!(
                "Failed to create schema directory '{}': {}",
                schema_dir.display(),
                e
            )
        })?;

        let db = DatabaseConn::open_in_memory()?;
        debug!("opened schema catalog at {}", schema_dir.display());

        Ok(SqliteCatalog {
            db,
            schema_dir,
            prompt: Box::new(stdin_prompt),
        })
    }

    /// Replace the confirmation prompt used by non-forced drops
    pub fn with_prompt(mut self, prompt: impl Fn(&str) -> bool + 'static) -> Self {
        self.prompt = Box::new(prompt);
        self
    }

    /// How long a drop waits on a schema locked by another connection before
    /// reporting a conflict
    pub fn with_busy_timeout(self, timeout: Duration) -> Result<Self> {
        self.db.set_busy_timeout(timeout)?;
        Ok(self)
    }

    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    /// Path of the file backing a schema
    pub fn schema_path(&self, name: &str) -> PathBuf {
        self.schema_dir
            .join(format!("{}.{}", name, SCHEMA_FILE_EXTENSION))
    }

    /// Create a new, empty schema
    pub fn create_schema(&self, name: &str) -> Result<()> {
        validate_schema_name(name)?;

        let path = self.schema_path(name);
        if path.exists() {
            bail!("Schema '{}' already exists", name);
        }

        self.db.attach(&path, name).map_err(|e| {
            anyhow!(
                "Failed to attach '{}' as '{}': {}",
                path.display(),
                name,
                e
            )
        })?;
        let written = self.write_meta(name);
        self.db
            .detach(name)
            .map_err(|e| anyhow!("Failed to detach schema '{}': {}", name, e))?;
        written?;

        debug!("created schema {} at {}", name, path.display());
        Ok(())
    }

    fn write_meta(&self, name: &str) -> Result<()> {
        self.db
            .execute(&SCHEMA_META_TABLE.replace("{schema}", name))?;
        self.db.execute_with_params(
            &format!(
                "INSERT OR REPLACE INTO \"{}\".schemactl_meta (key, value) VALUES ('name', ?1)",
                name
            ),
            [name],
        )?;
        Ok(())
    }

    /// Schema names derived from the files in the schema directory, sorted
    fn schema_files(&self) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.schema_dir).map_err(|e| {
            anyhow!(
                "Failed to read schema directory '{}': {}",
                self.schema_dir.display(),
                e
            )
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| anyhow!("Failed to read schema directory entry: {}", e))?
                .path();
            if path.extension().and_then(|e| e.to_str()) != Some(SCHEMA_FILE_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if validate_schema_name(stem).is_err() {
                debug!("skipping {}: not a valid schema name", path.display());
                continue;
            }
            names.push(stem.to_string());
        }
        names.sort();
        Ok(names)
    }

    /// Attach a schema, make sure no other connection holds it, then detach it
    ///
    /// Returns the conflict when the schema is in use elsewhere.
    fn release_schema(&self, name: &str) -> Result<Option<DropOutcome>> {
        if let Err(e) = self.db.attach(&self.schema_path(name), name) {
            return classify_drop_error(name, e).map(Some);
        }

        if let Err(e) = self.db.acquire_exclusive() {
            if let Err(detach_err) = self.db.detach(name) {
                debug!("failed to detach {} after lock error: {}", name, detach_err);
            }
            return classify_drop_error(name, e).map(Some);
        }

        if let Err(e) = self.db.detach(name) {
            return classify_drop_error(name, e).map(Some);
        }
        Ok(None)
    }

    fn remove_schema_files(&self, name: &str) -> Result<()> {
        let path = self.schema_path(name);
        std::fs::remove_file(&path)
            .map_err(|e| anyhow!("Failed to remove schema file '{}': {}", path.display(), e))?;

        for suffix in ["-wal", "-shm", "-journal"] {
            let mut sibling = path.clone().into_os_string();
            sibling.push(suffix);
            let sibling = PathBuf::from(sibling);
            if sibling.exists() {
                std::fs::remove_file(&sibling).map_err(|e| {
                    anyhow!("Failed to remove schema file '{}': {}", sibling.display(), e)
                })?;
            }
        }
        Ok(())
    }
}

impl SchemaCatalog for SqliteCatalog {
    fn list_schemas(&self) -> Result<Vec<String>> {
        self.schema_files()
    }

    fn drop_schema(&self, name: &str, force: bool) -> Result<DropOutcome> {
        if !self.list_schemas()?.iter().any(|s| s == name) {
            bail!("Schema '{}' does not exist", name);
        }

        if !force && !(self.prompt)(name) {
            return Ok(DropOutcome::Declined);
        }

        if let Some(conflict) = self.release_schema(name)? {
            return Ok(conflict);
        }

        self.remove_schema_files(name)?;
        Ok(DropOutcome::Dropped)
    }
}
