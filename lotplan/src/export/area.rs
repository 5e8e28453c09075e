//! Surface géodésique (ellipsoïde WGS84)

use geo::orient::{Direction, Orient};
use geo::{GeodesicArea, LineString, Polygon};

use crate::types::ParcelGeometry;

const M2_PER_HECTARE: f64 = 10_000.0;

/// Surface en m², toujours positive quel que soit le sens des anneaux
pub fn geodesic_area_m2(geometry: &ParcelGeometry) -> f64 {
    geometry.polygons().into_iter().map(polygon_area_m2).sum()
}

/// Extérieur moins les trous, chaque anneau mesuré orienté anti-horaire :
/// sinon la mesure non signée retourne le complément sur l'ellipsoïde
fn polygon_area_m2(polygon: &Polygon) -> f64 {
    let holes: f64 = polygon.interiors().iter().map(ring_area_m2).sum();
    (ring_area_m2(polygon.exterior()) - holes).max(0.0)
}

fn ring_area_m2(ring: &LineString) -> f64 {
    Polygon::new(ring.clone(), vec![])
        .orient(Direction::Default)
        .geodesic_area_unsigned()
}

/// Surface en hectares
pub fn geodesic_area_ha(geometry: &ParcelGeometry) -> f64 {
    geodesic_area_m2(geometry) / M2_PER_HECTARE
}
