//! # lotplan
//!
//! Résolution d'identifiants cadastraux Lot/Plan du Queensland et de la
//! Nouvelle-Galles du Sud vers des géométries WGS84, et export stylé.
//!
//! ## Features
//!
//! - Classification QLD (`6RP702264`) / NSW (`5//DP123456`, `1/2/DP3`)
//! - Requêtes aux services ArcGIS REST avec concurrence bornée
//! - Reprojection vers EPSG:4326 (Web Mercator, MGA94/MGA2020, PROJ en option)
//! - Union des features d'un même identifiant
//! - Export KML 2.2 stylé, Shapefile zippé et GeoJSON
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lotplan::{resolve, ArcGisClient, ResolveOptions, ServiceConfig, StyleConfig};
//!
//! let client = ArcGisClient::new(ServiceConfig::default())?;
//! let resolution = resolve(&client, ["6RP702264", "5//DP123456"], ResolveOptions::default()).await;
//!
//! for row in resolution.rows() {
//!     println!("{} {:.2} ha", row.identifier, row.area_ha);
//! }
//! let kml = lotplan::build_kml(&resolution.resolved, &StyleConfig::default())?;
//! ```

pub mod classify;
pub mod error;
pub mod export;
pub mod reproject;
pub mod resolve;
pub mod source;
pub mod types;

pub use classify::{classify, Jurisdiction, ParcelQuery};
pub use error::{LotPlanError, Result};
pub use export::{build_kml, build_shapefile_zip, to_export_color, KML_MIME, ZIP_MIME};
pub use resolve::{resolve, resolve_one, ResolveOptions};
pub use source::{ArcGisClient, NswPredicate, ParcelSource, ServiceConfig};
pub use types::{Bounds, ParcelGeometry, ParcelRow, Resolution, ResolvedParcel, StyleConfig};
