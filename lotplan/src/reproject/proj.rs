//! Reprojection de géométries avec PROJ
//!
//! Ce module est disponible uniquement avec le feature `reproject`.

use geo::{Coord, MapCoords};
use ::proj::Proj;

use super::WGS84_EPSG;
use crate::error::{LotPlanError, Result};
use crate::types::ParcelGeometry;

/// Reprojection d'un EPSG quelconque vers WGS84
pub struct Reprojector {
    proj: Proj,
    source_epsg: u32,
}

impl Reprojector {
    /// Crée un nouveau reprojector vers EPSG:4326.
    ///
    /// `new_known_crs` normalise l'ordre des axes : x=lon, y=lat.
    pub fn new(source_epsg: u32) -> Result<Self> {
        let source = format!("EPSG:{}", source_epsg);
        let target = format!("EPSG:{}", WGS84_EPSG);

        let proj = Proj::new_known_crs(&source, &target, None).map_err(|e| {
            LotPlanError::reprojection(
                source_epsg,
                format!("failed to create projection to {}: {}", target, e),
            )
        })?;

        Ok(Self { proj, source_epsg })
    }

    /// Retourne le SRID source
    pub fn source_epsg(&self) -> u32 {
        self.source_epsg
    }

    /// Transforme une géométrie
    pub fn transform_geometry(&self, geom: &ParcelGeometry) -> Result<ParcelGeometry> {
        let f = |c: Coord| -> Result<Coord> {
            let (x, y) = self.proj.convert((c.x, c.y)).map_err(|e| {
                LotPlanError::reprojection(self.source_epsg, e.to_string())
            })?;
            Ok(Coord { x, y })
        };

        match geom {
            ParcelGeometry::Polygon(p) => Ok(ParcelGeometry::Polygon(p.try_map_coords(f)?)),
            ParcelGeometry::MultiPolygon(mp) => {
                Ok(ParcelGeometry::MultiPolygon(mp.try_map_coords(f)?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn test_mga56_to_wgs84() {
        let reprojector = Reprojector::new(28356).unwrap();

        let poly = ParcelGeometry::Polygon(polygon![
            (x: 502480.0, y: 6961530.0),
            (x: 502580.0, y: 6961530.0),
            (x: 502580.0, y: 6961630.0),
            (x: 502480.0, y: 6961630.0),
        ]);

        let result = reprojector.transform_geometry(&poly).unwrap();
        let ParcelGeometry::Polygon(p) = result else {
            panic!("Expected Polygon geometry");
        };
        assert_eq!(p.exterior().0.len(), 5);
        let first = &p.exterior().0[0];
        assert!(first.x > 152.9 && first.x < 153.1, "lon={}", first.x);
        assert!(first.y > -27.6 && first.y < -27.4, "lat={}", first.y);
    }

    #[test]
    fn test_invalid_epsg() {
        assert!(Reprojector::new(99999).is_err());
    }
}
