use super::{open_catalog, print_schema_rows};
use schemactl::lens::schema::{SchemaLens, SchemaListArgs};
use schemactl::{OutputFormat, SchemactlConfig};

pub fn run(config: &SchemactlConfig, args: SchemaListArgs, output_format: OutputFormat) {
    let SchemaListArgs { prefix } = args;

    let catalog = open_catalog(config);
    let lens = SchemaLens::new(&catalog);

    let names = match lens.list(&prefix) {
        Ok(names) => names,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    match output_format {
        // plain name arrays, so `schemactl list dev_ --format json | jq '.[]'` works
        OutputFormat::Json | OutputFormat::JsonPretty => match output_format.to_json(&names) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("ERROR: Failed to serialize to JSON: {}", e),
        },
        _ => print_schema_rows(&catalog, &names, output_format),
    }
}
