//! Types de données pour le crate lotplan

use std::collections::BTreeMap;

use geo::{BooleanOps, BoundingRect, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::classify::Jurisdiction;

/// Géométrie d'une parcelle résolue, toujours en EPSG:4326 (lon, lat)
#[derive(Debug, Clone, PartialEq)]
pub enum ParcelGeometry {
    Polygon(Polygon),
    MultiPolygon(MultiPolygon),
}

impl ParcelGeometry {
    /// Normalise un MultiPolygon : un seul polygone devient `Polygon`
    pub fn from_multi(mp: MultiPolygon) -> Option<Self> {
        match mp.0.len() {
            0 => None,
            1 => mp.0.into_iter().next().map(Self::Polygon),
            _ => Some(Self::MultiPolygon(mp)),
        }
    }

    /// Polygones constitutifs, dans l'ordre
    pub fn polygons(&self) -> Vec<&Polygon> {
        match self {
            Self::Polygon(p) => vec![p],
            Self::MultiPolygon(mp) => mp.0.iter().collect(),
        }
    }

    /// Nombre de parties
    pub fn part_count(&self) -> usize {
        match self {
            Self::Polygon(_) => 1,
            Self::MultiPolygon(mp) => mp.0.len(),
        }
    }

    pub fn to_multi(&self) -> MultiPolygon {
        match self {
            Self::Polygon(p) => MultiPolygon::new(vec![p.clone()]),
            Self::MultiPolygon(mp) => mp.clone(),
        }
    }

    /// Union avec une autre géométrie
    pub fn union(&self, other: &ParcelGeometry) -> Option<ParcelGeometry> {
        let merged = self.to_multi().union(&other.to_multi());
        Self::from_multi(merged)
    }

    pub fn is_empty(&self) -> bool {
        self.polygons().iter().all(|p| p.exterior().0.is_empty())
    }

    pub fn to_geo(&self) -> geo::Geometry {
        match self {
            Self::Polygon(p) => geo::Geometry::Polygon(p.clone()),
            Self::MultiPolygon(mp) => geo::Geometry::MultiPolygon(mp.clone()),
        }
    }
}

/// Parcelle résolue pour un identifiant
#[derive(Debug, Clone)]
pub struct ResolvedParcel {
    /// Identifiant tel que saisi (après trim)
    pub identifier: String,

    pub jurisdiction: Jurisdiction,

    /// Union des géométries retournées, en WGS84
    pub geometry: ParcelGeometry,

    /// Attributs de la dernière feature traitée
    pub properties: serde_json::Map<String, Value>,

    /// Nombre de features fusionnées
    pub feature_count: usize,
}

impl ResolvedParcel {
    /// Première propriété texte non vide parmi `keys`
    pub fn property_str(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| {
            self.properties.get(*key).and_then(|v| match v {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
        })
    }

    /// Type de lot (QLD `parcel_typ`, NSW `classsubtype`)
    pub fn lot_type(&self) -> Option<String> {
        self.property_str(&["parcel_typ", "lot_type", "classsubtype"])
    }

    /// Localité (QLD `locality`, NSW `suburb`)
    pub fn locality(&self) -> Option<String> {
        self.property_str(&["locality", "suburb", "lga_name"])
    }

    /// Surface géodésique en hectares
    pub fn area_ha(&self) -> f64 {
        crate::export::area::geodesic_area_ha(&self.geometry)
    }

    /// Ligne de tableau pour l'affichage
    pub fn row(&self) -> ParcelRow {
        ParcelRow {
            identifier: self.identifier.clone(),
            jurisdiction: self.jurisdiction,
            lot_type: self.lot_type(),
            locality: self.locality(),
            area_ha: round2(self.area_ha()),
        }
    }
}

/// Ligne aplatie pour le tableau de résultats
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParcelRow {
    pub identifier: String,
    pub jurisdiction: Jurisdiction,
    pub lot_type: Option<String>,
    pub locality: Option<String>,
    /// Surface en hectares, arrondie à 2 décimales
    pub area_ha: f64,
}

/// Résultat d'une résolution
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Parcelles trouvées, par identifiant
    pub resolved: BTreeMap<String, ResolvedParcel>,

    /// Identifiants introuvables ou en erreur, dans l'ordre de saisie
    pub missing: Vec<String>,
}

impl Resolution {
    pub fn rows(&self) -> Vec<ParcelRow> {
        self.resolved.values().map(ResolvedParcel::row).collect()
    }

    /// Emprise `[[min_lat, min_lon], [max_lat, max_lon]]`
    pub fn bounds(&self) -> Bounds {
        Bounds::of(self.resolved.values().map(|p| &p.geometry))
    }

    /// Message d'avertissement listant les identifiants manquants
    pub fn warning(&self) -> Option<String> {
        if self.missing.is_empty() {
            None
        } else {
            Some(format!("No parcel found for: {}", self.missing.join(", ")))
        }
    }
}

/// Emprise au format Leaflet `[[sud, ouest], [nord, est]]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds(pub [[f64; 2]; 2]);

impl Bounds {
    /// Emprise par défaut : l'Australie orientale
    pub const AUSTRALIA: Bounds = Bounds([[-39.0, 137.0], [-9.0, 155.0]]);

    pub fn of<'a>(geometries: impl IntoIterator<Item = &'a ParcelGeometry>) -> Self {
        let mut acc: Option<geo::Rect> = None;
        for geom in geometries {
            let Some(rect) = geom.to_multi().bounding_rect() else {
                continue;
            };
            acc = Some(match acc {
                None => rect,
                Some(prev) => geo::Rect::new(
                    geo::Coord {
                        x: prev.min().x.min(rect.min().x),
                        y: prev.min().y.min(rect.min().y),
                    },
                    geo::Coord {
                        x: prev.max().x.max(rect.max().x),
                        y: prev.max().y.max(rect.max().y),
                    },
                ),
            });
        }

        match acc {
            Some(r) => Bounds([[r.min().y, r.min().x], [r.max().y, r.max().x]]),
            None => Self::AUSTRALIA,
        }
    }
}

/// Style d'export (couleurs `#RRGGBB`, opacité en %)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub fill_color: String,

    /// Opacité de remplissage, 0 à 100
    pub fill_opacity: u8,

    pub outline_color: String,

    /// Épaisseur du contour en pixels, reprise telle quelle
    pub outline_width: f64,

    pub folder_name: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            fill_color: "#ff6600".into(),
            fill_opacity: 70,
            outline_color: "#2e2e2e".into(),
            outline_width: 1.2,
            folder_name: "Parcels".into(),
        }
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
