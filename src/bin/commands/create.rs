use super::open_catalog;
use clap::Args;
use schemactl::{OutputFormat, SchemactlConfig};

/// Arguments for the Create command
#[derive(Args)]
pub struct CreateArgs {
    /// Names of the schemas to create, e.g. "dev_subject"
    #[clap(value_name = "NAME", required = true)]
    pub names: Vec<String>,
}

pub fn run(config: &SchemactlConfig, args: CreateArgs, output_format: OutputFormat) {
    let CreateArgs { names } = args;

    let catalog = open_catalog(config);

    let mut created = Vec::new();
    let mut failed = false;
    for name in names {
        match catalog.create_schema(&name) {
            Ok(()) => {
                if !output_format.is_json() {
                    println!("{}", name);
                }
                created.push(name);
            }
            Err(e) => {
                eprintln!("ERROR: {}", e);
                failed = true;
            }
        }
    }

    if output_format.is_json() {
        match output_format.to_json(&serde_json::json!({ "created": created })) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("ERROR: Failed to serialize to JSON: {}", e),
        }
    }

    if failed {
        std::process::exit(1);
    }
}
