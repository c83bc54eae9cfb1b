use clap::Args;
use schemactl::{OutputFormat, SchemactlConfig};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Arguments for the Config command
#[derive(Args)]
pub struct ConfigArgs {
    /// Also list the schema files found in the schema directory
    #[clap(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Serialize)]
struct ConfigInfo {
    config_file: String,
    data_dir: String,
    schema_dir: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    database_prefix: Option<String>,
    custom: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schemas: Option<Vec<String>>,
}

pub fn run(config: &SchemactlConfig, args: ConfigArgs, output_format: OutputFormat) {
    let ConfigArgs { verbose } = args;

    let schemas = if verbose && Path::new(&config.schema_dir).exists() {
        let catalog = super::open_catalog(config);
        match schemactl::SchemaCatalog::list_schemas(&catalog) {
            Ok(names) => Some(names),
            Err(e) => {
                eprintln!("ERROR: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        None
    };

    if output_format.is_json() {
        let info = ConfigInfo {
            config_file: SchemactlConfig::config_file_path(),
            data_dir: config.data_dir.clone(),
            schema_dir: config.schema_dir.clone(),
            database_prefix: config.database_prefix().map(str::to_string),
            custom: config.custom.clone(),
            schemas,
        };
        match output_format.to_json(&info) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Error serializing config: {}", e),
        }
        return;
    }

    println!("Schemactl Configuration");
    println!("=======================\n");
    println!("{}", config.summary());

    if let Some(schemas) = schemas {
        println!();
        println!("Schemas ({}):", schemas.len());
        for name in schemas {
            println!("  {}", name);
        }
    }
}
