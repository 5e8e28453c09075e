//! Projection Web Mercator (EPSG:3857)
//!
//! ArcGIS publie souvent cette projection sous ses anciens WKID 102100 / 102113.

use super::ellipsoid::WGS84;
use super::Geographic;

/// WKID équivalents à EPSG:3857
pub fn is_web_mercator(wkid: u32) -> bool {
    matches!(wkid, 3857 | 102100 | 102113 | 900913)
}

/// Convertit Web Mercator vers coordonnées géographiques
pub fn web_mercator_to_geographic(x: f64, y: f64) -> Geographic {
    let r = WGS84::A;

    // Longitude = x / R
    let lon = x / r;

    // Latitude = 2 * atan(exp(y/R)) - π/2
    let lat = 2.0 * (y / r).exp().atan() - std::f64::consts::FRAC_PI_2;

    Geographic::new(lon, lat)
}
