//! Définition et implémentation des commandes CLI
//!
//! - `search` : tableau des parcelles résolues (+ GeoJSON optionnel)
//! - `kml` : export KML stylé
//! - `shapefile` : export Shapefile zippé
//! - `serve` : API HTTP

use std::io::{BufRead, IsTerminal};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use lotplan::export::geojson::export_to_file;
use lotplan::{build_kml, build_shapefile_zip, resolve, ArcGisClient, Resolution, StyleConfig};
use tracing::{info, warn};

use lotplan_kml::config::{load_style, validate_style, AppConfig};
use lotplan_kml::report::SearchReport;
use lotplan_kml::server;

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve Lot/Plan identifiers and print a summary table
    Search {
        #[command(flatten)]
        input: InputArgs,

        /// Write the resolved parcels as GeoJSON to this file
        #[arg(long)]
        geojson: Option<PathBuf>,

        /// Save the JSON report to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Resolve identifiers and write a styled KML document
    Kml {
        #[command(flatten)]
        input: InputArgs,

        /// Output KML file
        #[arg(short, long, default_value = "parcels.kml")]
        output: PathBuf,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// Resolve identifiers and write a zipped Shapefile
    Shapefile {
        #[command(flatten)]
        input: InputArgs,

        /// Output zip file
        #[arg(short, long, default_value = "parcels.zip")]
        output: PathBuf,
    },

    /// Serve the HTTP API
    Serve {
        /// Listen address (défaut : env LOTPLAN_BIND / 127.0.0.1:8000)
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
}

/// Identifiants à résoudre
#[derive(Args)]
pub struct InputArgs {
    /// Lot/Plan identifiers (e.g. 6RP702264, 5//DP123456)
    pub identifiers: Vec<String>,

    /// Read identifiers from a file, one per line ("-" for stdin)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Maximum number of concurrent service requests (défaut : env LOTPLAN_CONCURRENCY / 4)
    #[arg(long, alias = "jobs")]
    pub concurrency: Option<usize>,
}

impl InputArgs {
    /// Identifiants depuis les arguments, un fichier ou stdin
    pub fn collect(&self) -> Result<Vec<String>> {
        let mut ids = self.identifiers.clone();

        match &self.file {
            Some(path) if path == Path::new("-") => ids.extend(read_lines(std::io::stdin().lock())?),
            Some(path) => {
                let file = std::fs::File::open(path)
                    .context(format!("Failed to open identifier file: {}", path.display()))?;
                ids.extend(read_lines(std::io::BufReader::new(file))?);
            }
            None if ids.is_empty() && !std::io::stdin().is_terminal() => {
                ids.extend(read_lines(std::io::stdin().lock())?)
            }
            None => {}
        }

        if ids.iter().all(|s| s.trim().is_empty()) {
            anyhow::bail!("No Lot/Plan identifiers given");
        }
        Ok(ids)
    }
}

fn read_lines<R: BufRead>(reader: R) -> Result<Vec<String>> {
    reader
        .lines()
        .map(|line| line.context("Failed to read identifiers"))
        .collect()
}

/// Style d'export : preset ou fichier, puis surcharges
#[derive(Args)]
pub struct StyleArgs {
    /// Style preset (default/survey/highlight) or path to a JSON style
    #[arg(long, default_value = "default")]
    pub style: String,

    /// Fill color (#RRGGBB)
    #[arg(long)]
    pub fill: Option<String>,

    /// Fill opacity in percent (0-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub fill_opacity: Option<u8>,

    /// Outline color (#RRGGBB)
    #[arg(long)]
    pub outline: Option<String>,

    /// Outline width in pixels
    #[arg(long)]
    pub outline_width: Option<f64>,

    /// KML folder name
    #[arg(long)]
    pub folder: Option<String>,
}

impl StyleArgs {
    pub fn to_style(&self) -> Result<StyleConfig> {
        let mut style = load_style(&self.style)?;
        if let Some(fill) = &self.fill {
            style.fill_color = fill.clone();
        }
        if let Some(opacity) = self.fill_opacity {
            style.fill_opacity = opacity;
        }
        if let Some(outline) = &self.outline {
            style.outline_color = outline.clone();
        }
        if let Some(width) = self.outline_width {
            style.outline_width = width;
        }
        if let Some(folder) = &self.folder {
            style.folder_name = folder.clone();
        }
        validate_style(&style)?;
        Ok(style)
    }
}

/// Résout les identifiants avec le client ArcGIS configuré
async fn run_resolution(input: &InputArgs) -> Result<(Resolution, std::time::Duration)> {
    let ids = input.collect()?;
    let mut config = AppConfig::from_env()?;
    if let Some(concurrency) = input.concurrency {
        config.concurrency = concurrency.max(1);
    }

    let client = ArcGisClient::new(config.service.clone())?;
    let started_at = Instant::now();
    let resolution = resolve(&client, &ids, config.resolve_options()).await;
    let elapsed = started_at.elapsed();

    if let Some(warning) = resolution.warning() {
        warn!("{}", warning);
    }
    Ok((resolution, elapsed))
}

fn ensure_resolved(resolution: &Resolution) -> Result<()> {
    if resolution.resolved.is_empty() {
        anyhow::bail!("No parcel resolved, nothing to export");
    }
    Ok(())
}

/// Exécute la commande search
pub async fn cmd_search(
    input: &InputArgs,
    geojson: Option<&Path>,
    report_path: Option<&Path>,
) -> Result<()> {
    let (resolution, elapsed) = run_resolution(input).await?;
    let report = SearchReport::new(&resolution, &StyleConfig::default(), elapsed);
    report.display();

    if let Some(path) = geojson {
        ensure_resolved(&resolution)?;
        export_to_file(&resolution.resolved, path)
            .context(format!("Failed to write GeoJSON: {}", path.display()))?;
        println!("GeoJSON written to {}", path.display());
    }

    if let Some(path) = report_path {
        report.with_geojson(&resolution)?.save_to_file(path)?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}

/// Exécute la commande kml
pub async fn cmd_kml(input: &InputArgs, style: &StyleArgs, output: &Path) -> Result<()> {
    let style = style.to_style()?;
    let (resolution, elapsed) = run_resolution(input).await?;
    ensure_resolved(&resolution)?;

    let kml = build_kml(&resolution.resolved, &style)?;
    std::fs::write(output, kml).context(format!("Failed to write {}", output.display()))?;

    info!(
        output = %output.display(),
        parcels = resolution.resolved.len(),
        missing = resolution.missing.len(),
        "KML written"
    );
    println!(
        "KML written to {} ({} parcels, {:.2}s)",
        output.display(),
        resolution.resolved.len(),
        elapsed.as_secs_f64()
    );
    Ok(())
}

/// Exécute la commande shapefile
pub async fn cmd_shapefile(input: &InputArgs, output: &Path) -> Result<()> {
    let (resolution, elapsed) = run_resolution(input).await?;
    ensure_resolved(&resolution)?;

    let zip = build_shapefile_zip(&resolution.resolved)?;
    std::fs::write(output, &zip).context(format!("Failed to write {}", output.display()))?;

    info!(
        output = %output.display(),
        parcels = resolution.resolved.len(),
        bytes = zip.len(),
        "Shapefile written"
    );
    println!(
        "Shapefile written to {} ({} parcels, {:.2}s)",
        output.display(),
        resolution.resolved.len(),
        elapsed.as_secs_f64()
    );
    Ok(())
}

/// Exécute la commande serve
pub async fn cmd_serve(bind: Option<SocketAddr>) -> Result<()> {
    let mut config = AppConfig::from_env()?;
    if let Some(bind) = bind {
        config.bind = bind;
    }

    let client = ArcGisClient::new(config.service.clone())?;
    let state = server::AppState::new(client, config.resolve_options());
    let app = server::router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .context(format!("Failed to bind {}", config.bind))?;
    info!(address = %config.bind, "Listening");
    println!("Serving on http://{}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: Commands,
    }

    #[test]
    fn test_parse_kml_command() {
        let cli = TestCli::try_parse_from([
            "lotplan-kml",
            "kml",
            "6RP702264",
            "5//DP123456",
            "--fill",
            "#FF0000",
            "--fill-opacity",
            "50",
            "-o",
            "out.kml",
        ])
        .unwrap();

        let Commands::Kml { input, output, style } = cli.command else {
            panic!("expected kml command");
        };
        assert_eq!(input.identifiers, vec!["6RP702264", "5//DP123456"]);
        assert_eq!(output, PathBuf::from("out.kml"));

        let style = style.to_style().unwrap();
        assert_eq!(style.fill_color, "#FF0000");
        assert_eq!(style.fill_opacity, 50);
        assert_eq!(style.folder_name, "Parcels");
    }

    #[test]
    fn test_opacity_out_of_range() {
        assert!(TestCli::try_parse_from(["lotplan-kml", "kml", "1RP1", "--fill-opacity", "150"])
            .is_err());
    }

    #[test]
    fn test_invalid_override_color() {
        let cli = TestCli::try_parse_from(["lotplan-kml", "kml", "1RP1", "--outline", "black"])
            .unwrap();
        let Commands::Kml { style, .. } = cli.command else {
            panic!("expected kml command");
        };
        assert!(style.to_style().is_err());
    }

    #[test]
    fn test_identifiers_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ids.txt");
        std::fs::write(&path, "6RP702264\n\n5//DP123456\n").unwrap();

        let input = InputArgs {
            identifiers: vec!["1RP1".into()],
            file: Some(path),
            concurrency: None,
        };
        let ids = input.collect().unwrap();
        assert_eq!(ids, vec!["1RP1", "6RP702264", "", "5//DP123456"]);
    }
}
