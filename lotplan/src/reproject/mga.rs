//! Map Grid of Australia (MGA)
//!
//! Projection UTM hémisphère sud sur GRS80, utilisée par GDA94 et GDA2020.
//!
//! Zones:
//! - EPSG:28348 à 28358 - GDA94 / MGA zones 48 à 58
//! - EPSG:7848 à 7858 - GDA2020 / MGA zones 48 à 58

use super::ellipsoid::GRS80;
use super::Geographic;

/// Zone MGA correspondant à un EPSG, si c'en est un
pub fn zone_for_epsg(epsg: u32) -> Option<u32> {
    match epsg {
        28348..=28358 => Some(epsg - 28300),
        7848..=7858 => Some(epsg - 7800),
        _ => None,
    }
}

/// Convertit des coordonnées MGA (easting, northing) vers le géographique
pub fn mga_to_geographic(x: f64, y: f64, zone: u32) -> Geographic {
    let a = GRS80::A;
    let e2 = GRS80::E2;
    let ep2 = GRS80::EP2;

    // Paramètres UTM sud
    let k0 = 0.9996;
    let x0 = 500000.0;
    let y0 = 10000000.0;

    // Méridien central de la zone
    let lon0 = (zone as f64 * 6.0 - 183.0).to_radians();

    let x = x - x0;
    let y = y - y0;

    // Latitude du pied
    let m = y / k0;
    let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0));

    let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    let sin_phi1 = phi1.sin();
    let cos_phi1 = phi1.cos();
    let tan_phi1 = phi1.tan();

    let n1 = a / (1.0 - e2 * sin_phi1.powi(2)).sqrt();
    let t1 = tan_phi1.powi(2);
    let c1 = ep2 * cos_phi1.powi(2);
    let r1 = a * (1.0 - e2) / (1.0 - e2 * sin_phi1.powi(2)).powf(1.5);
    let d = x / (n1 * k0);

    let lat = phi1
        - (n1 * tan_phi1 / r1)
            * (d.powi(2) / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1.powi(2) - 9.0 * ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1.powi(2) - 252.0 * ep2 - 3.0 * c1.powi(2))
                    * d.powi(6)
                    / 720.0);

    let lon = lon0
        + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1.powi(2) + 8.0 * ep2 + 24.0 * t1.powi(2))
                * d.powi(5)
                / 120.0)
            / cos_phi1;

    Geographic::new(lon, lat)
}
