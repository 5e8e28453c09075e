//! Reprojection intelligente : reprojection légère en priorité, fallback sur proj
//!
//! Utilise automatiquement la meilleure option disponible.

use super::ReprojectorLite;
use crate::error::Result;
#[cfg(not(feature = "reproject"))]
use crate::error::LotPlanError;
use crate::types::ParcelGeometry;

/// Reprojection intelligente vers WGS84
pub enum SmartReprojector {
    /// Pas de reprojection (source déjà en lon/lat)
    Identity,
    /// Reprojection légère (pure Rust)
    Lite(ReprojectorLite),
    /// Reprojection via PROJ (si feature activée)
    #[cfg(feature = "reproject")]
    Proj(super::proj::Reprojector),
}

impl SmartReprojector {
    /// Crée un reprojector depuis un WKID source
    pub fn new(source_wkid: u32) -> Result<Self> {
        if super::is_geographic_alias(source_wkid) {
            return Ok(Self::Identity);
        }

        if let Some(lite) = ReprojectorLite::new(source_wkid) {
            return Ok(Self::Lite(lite));
        }

        #[cfg(feature = "reproject")]
        {
            let proj = super::proj::Reprojector::new(source_wkid)?;
            return Ok(Self::Proj(proj));
        }

        #[cfg(not(feature = "reproject"))]
        Err(LotPlanError::reprojection(
            source_wkid,
            "unsupported source CRS; supported without PROJ: 4326, 4283, 7844, \
             3857/102100, MGA 28348-28358 and 7848-7858 (build with --features reproject)",
        ))
    }

    /// Transforme une géométrie et vérifie qu'elle est en lon/lat
    pub fn transform_geometry(&self, geom: &ParcelGeometry, wkid: u32) -> Result<ParcelGeometry> {
        let out = match self {
            Self::Identity => geom.clone(),
            Self::Lite(lite) => lite.transform_geometry(geom),
            #[cfg(feature = "reproject")]
            Self::Proj(proj) => proj.transform_geometry(geom)?,
        };
        super::ensure_lon_lat(&out, wkid)?;
        Ok(out)
    }

    /// Retourne une description du reprojector utilisé
    pub fn description(&self) -> &'static str {
        match self {
            Self::Identity => "identity (pas de reprojection)",
            Self::Lite(_) => "reproject_lite (pure Rust)",
            #[cfg(feature = "reproject")]
            Self::Proj(_) => "proj (PROJ library)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let r = SmartReprojector::new(4326).unwrap();
        assert!(matches!(r, SmartReprojector::Identity));
        let r = SmartReprojector::new(7844).unwrap();
        assert!(matches!(r, SmartReprojector::Identity));
    }

    #[test]
    fn test_lite() {
        let r = SmartReprojector::new(28356).unwrap();
        assert!(matches!(r, SmartReprojector::Lite(_)));
        let r = SmartReprojector::new(102100).unwrap();
        assert!(matches!(r, SmartReprojector::Lite(_)));
    }

    #[cfg(not(feature = "reproject"))]
    #[test]
    fn test_unknown_without_proj() {
        assert!(SmartReprojector::new(2154).is_err());
    }
}
