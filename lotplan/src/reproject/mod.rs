//! Reprojection vers WGS84 (EPSG:4326)
//!
//! Les services cadastraux australiens renvoient la plupart du temps :
//! - WGS84 (EPSG:4326) ou GDA94 / GDA2020 géographiques (EPSG:4283, 7844)
//! - Web Mercator (EPSG:3857, alias ArcGIS 102100)
//! - MGA (EPSG:28348-28358, 7848-7858)
//!
//! Ces cas sont traités en Rust pur. Le reste passe par PROJ quand le
//! feature `reproject` est activé.

mod ellipsoid;
mod mercator;
mod mga;
#[cfg(feature = "reproject")]
mod proj;
mod smart;

pub use smart::SmartReprojector;

use geo::{Coord, MapCoords};

use crate::error::{LotPlanError, Result};
use crate::types::ParcelGeometry;

/// EPSG cible de toutes les géométries résolues
pub const WGS84_EPSG: u32 = 4326;

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    /// Longitude en radians
    pub lon: f64,
    /// Latitude en radians
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convertit en degrés
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }

    /// Crée depuis des degrés
    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }
}

/// Systèmes géographiques assimilés à WGS84 (écart GDA94/GDA2020 de l'ordre du mètre)
pub fn is_geographic_alias(wkid: u32) -> bool {
    matches!(wkid, 4326 | 4283 | 7844 | 4939 | 4979)
}

/// Source supportée par la reprojection légère
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LiteSource {
    WebMercator,
    Mga { zone: u32 },
}

/// Reprojection légère pour les projections australiennes
#[derive(Debug, Clone, Copy)]
pub struct ReprojectorLite {
    source: LiteSource,
    source_epsg: u32,
}

impl ReprojectorLite {
    /// Crée un reprojector vers WGS84, `None` si la source n'est pas supportée
    pub fn new(source_epsg: u32) -> Option<Self> {
        let source = if mercator::is_web_mercator(source_epsg) {
            LiteSource::WebMercator
        } else {
            LiteSource::Mga {
                zone: mga::zone_for_epsg(source_epsg)?,
            }
        };

        Some(Self {
            source,
            source_epsg,
        })
    }

    /// Vérifie si l'EPSG source est supporté
    pub fn is_supported(source_epsg: u32) -> bool {
        mercator::is_web_mercator(source_epsg) || mga::zone_for_epsg(source_epsg).is_some()
    }

    pub fn source_epsg(&self) -> u32 {
        self.source_epsg
    }

    /// Transforme un point (x, y) vers (lon, lat) en degrés
    pub fn transform_point(&self, x: f64, y: f64) -> (f64, f64) {
        let geo = match self.source {
            LiteSource::WebMercator => mercator::web_mercator_to_geographic(x, y),
            LiteSource::Mga { zone } => mga::mga_to_geographic(x, y, zone),
        };
        geo.to_degrees()
    }

    /// Transforme une géométrie
    pub fn transform_geometry(&self, geom: &ParcelGeometry) -> ParcelGeometry {
        let f = |c: Coord| {
            let (x, y) = self.transform_point(c.x, c.y);
            Coord { x, y }
        };
        match geom {
            ParcelGeometry::Polygon(p) => ParcelGeometry::Polygon(p.map_coords(f)),
            ParcelGeometry::MultiPolygon(mp) => ParcelGeometry::MultiPolygon(mp.map_coords(f)),
        }
    }
}

/// Vérifie que toutes les coordonnées sont des lon/lat valides
pub fn ensure_lon_lat(geom: &ParcelGeometry, wkid: u32) -> Result<()> {
    for polygon in geom.polygons() {
        let rings = std::iter::once(polygon.exterior()).chain(polygon.interiors());
        for ring in rings {
            if let Some(c) = ring.coords().find(|c| !is_lon_lat(c)) {
                return Err(LotPlanError::reprojection(
                    wkid,
                    format!("coordinate ({}, {}) outside lon/lat range", c.x, c.y),
                ));
            }
        }
    }
    Ok(())
}

fn is_lon_lat(c: &Coord) -> bool {
    c.x.is_finite()
        && c.y.is_finite()
        && (-180.0..=180.0).contains(&c.x)
        && (-90.0..=90.0).contains(&c.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn test_mga_to_wgs84() {
        // Brisbane (environ)
        let reproj = ReprojectorLite::new(28356).unwrap();
        let (lon, lat) = reproj.transform_point(502480.0, 6961530.0);

        assert!((lon - 153.03).abs() < 0.1, "lon={}", lon);
        assert!((lat - (-27.47)).abs() < 0.1, "lat={}", lat);
    }

    #[test]
    fn test_gda2020_mga_to_wgs84() {
        let reproj = ReprojectorLite::new(7856).unwrap();
        let (lon, lat) = reproj.transform_point(502480.0, 6961530.0);

        assert!((lon - 153.03).abs() < 0.1, "lon={}", lon);
        assert!((lat - (-27.47)).abs() < 0.1, "lat={}", lat);
    }

    #[test]
    fn test_unsupported_epsg() {
        assert!(ReprojectorLite::new(4326).is_none());
        assert!(ReprojectorLite::new(2154).is_none());
        assert!(ReprojectorLite::is_supported(102100));
    }

    #[test]
    fn test_transform_polygon_stays_closed() {
        let reproj = ReprojectorLite::new(3857).unwrap();
        let poly = ParcelGeometry::Polygon(polygon![
            (x: 17034699.0, y: -3183600.0),
            (x: 17035699.0, y: -3183600.0),
            (x: 17035699.0, y: -3182600.0),
            (x: 17034699.0, y: -3183600.0),
        ]);

        let result = reproj.transform_geometry(&poly);
        let ParcelGeometry::Polygon(p) = &result else {
            panic!("Expected Polygon geometry");
        };
        assert_eq!(p.exterior().0.len(), 4);
        assert_eq!(p.exterior().0.first(), p.exterior().0.last());
        assert!(ensure_lon_lat(&result, 3857).is_ok());
    }

    #[test]
    fn test_ensure_lon_lat_rejects_projected() {
        let poly = ParcelGeometry::Polygon(polygon![
            (x: 502480.0, y: 6961530.0),
            (x: 502580.0, y: 6961530.0),
            (x: 502580.0, y: 6961630.0),
        ]);
        assert!(ensure_lon_lat(&poly, 28356).is_err());
    }
}
