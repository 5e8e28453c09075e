//! Modules d'export (KML, Shapefile, GeoJSON)

pub mod area;
pub mod color;
pub mod geojson;
pub mod kml;
pub mod shapefile;

pub use color::to_export_color;
pub use geojson::{to_geojson_string, GEOJSON_MIME};
pub use kml::{build_kml, KML_MIME};
pub use shapefile::{build_shapefile_zip, ZIP_MIME};
