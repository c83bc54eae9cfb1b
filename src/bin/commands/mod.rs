pub mod config;
pub mod create;
pub mod drop;
pub mod list;

use schemactl::{OutputFormat, SchemactlConfig, SqliteCatalog};
use serde::Serialize;
use std::path::Path;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// A schema as shown by `list` and dry-run `drop`
#[derive(Debug, Serialize, Tabled)]
pub(crate) struct SchemaRow {
    pub name: String,
    pub size: String,
    pub path: String,
}

impl SchemaRow {
    pub(crate) fn new(catalog: &SqliteCatalog, name: &str) -> Self {
        let path = catalog.schema_path(name);
        let size = std::fs::metadata(&path)
            .map(|m| format_size(m.len()))
            .unwrap_or_else(|_| "-".to_string());
        SchemaRow {
            name: name.to_string(),
            size,
            path: path.display().to_string(),
        }
    }
}

/// Print schemas as rows with their file size and path
///
/// `Plain` prints one name per line.
pub(crate) fn print_schema_rows(
    catalog: &SqliteCatalog,
    names: &[String],
    output_format: OutputFormat,
) {
    if output_format == OutputFormat::Plain {
        for name in names {
            println!("{}", name);
        }
        return;
    }

    let rows: Vec<SchemaRow> = names.iter().map(|n| SchemaRow::new(catalog, n)).collect();
    match output_format {
        OutputFormat::Psv => {
            println!("name|size|path");
            for row in &rows {
                println!("{}|{}|{}", row.name, row.size, row.path);
            }
        }
        OutputFormat::JsonLine => {
            for row in &rows {
                match serde_json::to_string(row) {
                    Ok(json) => println!("{}", json),
                    Err(e) => eprintln!("ERROR: Failed to serialize to JSON: {}", e),
                }
            }
        }
        OutputFormat::Json | OutputFormat::JsonPretty => match output_format.to_json(&rows) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("ERROR: Failed to serialize to JSON: {}", e),
        },
        _ => {
            let mut table = Table::new(rows);
            if output_format == OutputFormat::Markdown {
                table.with(Style::markdown());
            } else {
                table.with(Style::rounded());
            }
            println!("{}", table);
        }
    }
}

/// Open the catalog over the configured schema directory, exiting on failure
pub(crate) fn open_catalog(config: &SchemactlConfig) -> SqliteCatalog {
    match SqliteCatalog::open_in_dir(Path::new(&config.schema_dir)) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    }
}

/// Format bytes as human-readable size
pub(crate) fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
