use clap::{Parser, Subcommand};
use schemactl::lens::schema::{SchemaDropArgs, SchemaListArgs};
use schemactl::{OutputFormat, SchemactlConfig};
use tracing::Level;

mod commands;

use commands::config::ConfigArgs;
use commands::create::CreateArgs;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// configuration file path, by default $HOME/.schemactl/schemactl.toml is used
    #[clap(short, long)]
    config: Option<String>,

    /// Print debug information
    #[clap(long)]
    debug: bool,

    /// Output format: plain, table, markdown, json, json-pretty
    #[clap(long, global = true, default_value = "plain")]
    format: OutputFormat,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List schemas whose name starts with a prefix.
    List(SchemaListArgs),

    /// Drop all schemas whose name starts with a prefix (dry run unless --execute).
    Drop(SchemaDropArgs),

    /// Create empty schemas.
    Create(CreateArgs),

    /// Show the resolved configuration.
    Config(ConfigArgs),
}

fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if cli.debug {
        tracing_subscriber::fmt()
            // filter spans/events with level DEBUG or higher.
            .with_max_level(Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = match SchemactlConfig::new(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = schemactl::database::ensure_data_dir(&config.data_dir) {
        eprintln!("ERROR: {}", e);
        std::process::exit(1);
    }

    match cli.command {
        Commands::List(args) => commands::list::run(&config, args, cli.format),
        Commands::Drop(args) => commands::drop::run(&config, args, cli.format),
        Commands::Create(args) => commands::create::run(&config, args, cli.format),
        Commands::Config(args) => commands::config::run(&config, args, cli.format),
    }
}
