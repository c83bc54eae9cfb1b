use super::{open_catalog, print_schema_rows};
use schemactl::lens::schema::{
    DropProgress, DropProgressCallback, DropReport, SchemaDropArgs, SchemaLens,
};
use schemactl::{OutputFormat, SchemactlConfig, SqliteCatalog};
use std::sync::Arc;

pub fn run(config: &SchemactlConfig, mut args: SchemaDropArgs, output_format: OutputFormat) {
    // A missing prefix is a configuration error, reported before touching the catalog
    match args.resolve_prefix(config) {
        Ok(prefix) => args.prefix = Some(prefix),
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    }

    let catalog = open_catalog(config);
    let lens = SchemaLens::new(&catalog);

    // Dropped names are printed as they go; JSON output reports them at the end
    let show_progress = !output_format.is_json();
    let callback: DropProgressCallback = Arc::new(move |event: DropProgress| {
        if !show_progress {
            return;
        }
        match event {
            DropProgress::Dropped { name } => println!("{}", name),
            DropProgress::Declined { name } => eprintln!("kept {}", name),
            DropProgress::Conflict { name, error } => {
                eprintln!("could not drop {} yet: {}", name, error)
            }
            DropProgress::Started { .. } | DropProgress::PassCompleted { .. } => {}
        }
    });

    let report = match lens.drop_schemas_with_progress(&args, config, Some(callback)) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    if output_format.is_json() {
        match output_format.to_json(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("ERROR: Failed to serialize to JSON: {}", e),
        }
        return;
    }

    if report.dry_run {
        print_dry_run(&catalog, &report, output_format);
    } else {
        eprintln!(
            "Dropped {} of {} schema(s) with prefix '{}' in {} pass(es)",
            report.dropped.len(),
            report.matched.len(),
            report.prefix,
            report.passes
        );
        if !report.declined.is_empty() {
            eprintln!("Kept: {}", report.declined.join(", "));
        }
    }
}

fn print_dry_run(catalog: &SqliteCatalog, report: &DropReport, output_format: OutputFormat) {
    print_schema_rows(catalog, &report.matched, output_format);

    eprintln!();
    eprintln!(
        "Dry run: {} schema(s) with prefix '{}' would be dropped.",
        report.matched.len(),
        report.prefix
    );
    eprintln!("Re-run with --execute to drop them (add --force to skip confirmation).");
}
