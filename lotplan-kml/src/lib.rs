//! # lotplan-kml
//!
//! CLI et API HTTP au-dessus du crate `lotplan` : résolution d'identifiants
//! Lot/Plan QLD/NSW et export KML / Shapefile.
//!
//! ## Usage CLI
//!
//! ```bash
//! # Tableau des parcelles
//! lotplan-kml search 6RP702264 5//DP123456
//!
//! # KML stylé
//! lotplan-kml kml --file ids.txt --fill "#FF0000" --fill-opacity 50 -o parcels.kml
//!
//! # Shapefile zippé
//! lotplan-kml shapefile 6RP702264 -o parcels.zip
//!
//! # API HTTP
//! lotplan-kml serve --bind 0.0.0.0:8000
//! ```

pub mod config;
pub mod report;
pub mod server;

pub use config::AppConfig;
pub use report::{SearchReport, SearchStatus};
pub use server::{router, AppState};
