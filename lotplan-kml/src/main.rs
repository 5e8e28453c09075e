//! Point d'entrée CLI pour lotplan-kml

use anyhow::Result;
use clap::Parser;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::Commands;

/// Résoudre des identifiants cadastraux Lot/Plan (QLD, NSW) et les exporter
#[derive(Parser)]
#[command(name = "lotplan-kml")]
#[command(author, version)]
#[command(about = "Resolve QLD/NSW Lot/Plan identifiers and export them as KML or Shapefile")]
#[command(long_about = "Resolve Queensland and New South Wales cadastral Lot/Plan identifiers against the state ArcGIS services, merge them into WGS84 parcels and export styled KML or a zipped Shapefile.\n\nIdentifiers can be given as arguments, with --file, or on stdin.")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env();

    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Search {
            input,
            geojson,
            report,
        } => {
            debug!(count = input.identifiers.len(), "Search");
            cli::cmd_search(&input, geojson.as_deref(), report.as_deref()).await?;
        }
        Commands::Kml {
            input,
            output,
            style,
        } => {
            debug!(output = %output.display(), "Export to KML");
            cli::cmd_kml(&input, &style, &output).await?;
        }
        Commands::Shapefile { input, output } => {
            debug!(output = %output.display(), "Export to Shapefile");
            cli::cmd_shapefile(&input, &output).await?;
        }
        Commands::Serve { bind } => {
            cli::cmd_serve(bind).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
