//! Résolution des identifiants en géométries WGS84
//!
//! Pour chaque identifiant : classification, requête au service de la
//! juridiction, reprojection des features hors WGS84, puis union en une
//! seule géométrie. Un échec reste local à son identifiant.

use std::collections::{HashMap, HashSet};

use futures::stream::{self, StreamExt};
use geojson::{Feature, FeatureCollection, JsonObject};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::classify::{classify, Jurisdiction};
use crate::error::{LotPlanError, Result};
use crate::reproject::{SmartReprojector, WGS84_EPSG};
use crate::source::ParcelSource;
use crate::types::{ParcelGeometry, Resolution, ResolvedParcel};

/// Options de résolution
#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions {
    /// Nombre maximal de requêtes simultanées (1 = séquentiel)
    pub concurrency: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

/// Résout une liste d'identifiants.
///
/// Chaque identifiant distinct (après trim, lignes vides ignorées) se retrouve
/// soit dans `resolved`, soit dans `missing`, jamais dans les deux.
pub async fn resolve<S, I>(source: &S, identifiers: I, options: ResolveOptions) -> Resolution
where
    S: ParcelSource,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let ids = distinct_identifiers(identifiers);
    let concurrency = options.concurrency.max(1);

    info!(count = ids.len(), concurrency, "Resolving parcels");

    let mut outcomes: Vec<(usize, String, Result<ResolvedParcel>)> = stream::iter(
        ids.into_iter().enumerate(),
    )
    .map(|(idx, id)| async move {
        let outcome = resolve_one(source, &id).await;
        (idx, id, outcome)
    })
    .buffer_unordered(concurrency)
    .collect()
    .await;

    // `missing` conserve l'ordre de saisie
    outcomes.sort_by_key(|(idx, _, _)| *idx);

    let mut resolution = Resolution::default();
    for (_, id, outcome) in outcomes {
        match outcome {
            Ok(parcel) => {
                resolution.resolved.insert(id, parcel);
            }
            Err(LotPlanError::NotFound(_)) => {
                debug!(identifier = %id, "No features returned");
                resolution.missing.push(id);
            }
            Err(e) => {
                warn!(identifier = %id, error = %e, "Failed to resolve parcel");
                resolution.missing.push(id);
            }
        }
    }

    info!(
        resolved = resolution.resolved.len(),
        missing = resolution.missing.len(),
        "Resolution complete"
    );

    resolution
}

/// Résout un seul identifiant
pub async fn resolve_one<S: ParcelSource>(source: &S, identifier: &str) -> Result<ResolvedParcel> {
    let query = classify(identifier)?;
    let collection = source.query(&query).await?;
    merge_features(identifier, query.jurisdiction, collection)
}

/// Identifiants trimés, non vides, dédoublonnés dans l'ordre de saisie
fn distinct_identifiers<I>(identifiers: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut seen = HashSet::new();
    identifiers
        .into_iter()
        .map(|s| s.as_ref().trim().to_string())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

/// Reprojette et fusionne les features d'une réponse.
///
/// Les propriétés conservées sont celles de la dernière feature traitée.
pub fn merge_features(
    identifier: &str,
    jurisdiction: Jurisdiction,
    collection: FeatureCollection,
) -> Result<ResolvedParcel> {
    let collection_wkid = collection
        .foreign_members
        .as_ref()
        .and_then(crs_wkid);

    let mut reprojectors: HashMap<u32, SmartReprojector> = HashMap::new();
    let mut merged: Option<ParcelGeometry> = None;
    let mut properties = JsonObject::new();
    let mut feature_count = 0;

    for feature in collection.features {
        let Some((geometry, wkid)) = feature_geometry(identifier, &feature, collection_wkid)? else {
            continue;
        };

        let reprojector = match reprojectors.entry(wkid) {
            std::collections::hash_map::Entry::Occupied(e) => e.into_mut(),
            std::collections::hash_map::Entry::Vacant(e) => {
                let r = SmartReprojector::new(wkid)?;
                debug!(identifier, wkid, reprojector = r.description(), "Reprojector ready");
                e.insert(r)
            }
        };
        let geometry = reprojector.transform_geometry(&geometry, wkid)?;

        merged = Some(match merged {
            None => geometry,
            Some(prev) => match prev.union(&geometry) {
                Some(union) => union,
                None => {
                    warn!(identifier, "Union produced an empty geometry, keeping previous parts");
                    prev
                }
            },
        });
        properties = feature.properties.unwrap_or_default();
        feature_count += 1;
    }

    let geometry = merged
        .filter(|g| !g.is_empty())
        .ok_or_else(|| LotPlanError::NotFound(identifier.to_string()))?;

    Ok(ResolvedParcel {
        identifier: identifier.to_string(),
        jurisdiction,
        geometry,
        properties,
        feature_count,
    })
}

/// Géométrie polygonale d'une feature et son WKID, `None` si elle est ignorée
fn feature_geometry(
    identifier: &str,
    feature: &Feature,
    collection_wkid: Option<u32>,
) -> Result<Option<(ParcelGeometry, u32)>> {
    let Some(geometry) = &feature.geometry else {
        warn!(identifier, "Feature without geometry, skipping");
        return Ok(None);
    };

    let wkid = geometry
        .foreign_members
        .as_ref()
        .and_then(spatial_reference_wkid)
        .or(collection_wkid)
        .unwrap_or(WGS84_EPSG);

    let geom = geo::Geometry::<f64>::try_from(&geometry.value).map_err(|e| {
        LotPlanError::UnsupportedGeometry(format!("unreadable GeoJSON geometry: {}", e))
    })?;

    let parcel_geometry = match geom {
        geo::Geometry::Polygon(p) => ParcelGeometry::Polygon(p),
        geo::Geometry::MultiPolygon(mp) => match ParcelGeometry::from_multi(mp) {
            Some(g) => g,
            None => return Ok(None),
        },
        other => {
            warn!(
                identifier,
                geometry_type = geometry_type_name(&other),
                "Non-polygonal feature, skipping"
            );
            return Ok(None);
        }
    };

    Ok(Some((parcel_geometry, wkid)))
}

/// WKID depuis `spatialReference` (ArcGIS) : `latestWkid` puis `wkid`
fn spatial_reference_wkid(members: &JsonObject) -> Option<u32> {
    let sr = members.get("spatialReference")?;
    ["latestWkid", "wkid"]
        .iter()
        .find_map(|key| sr.get(*key).and_then(Value::as_u64))
        .and_then(|w| u32::try_from(w).ok())
}

/// WKID depuis un membre `crs` GeoJSON (`EPSG:3857`, `urn:ogc:def:crs:EPSG::3857`)
fn crs_wkid(members: &JsonObject) -> Option<u32> {
    let name = members
        .get("crs")?
        .get("properties")?
        .get("name")?
        .as_str()?;

    if name.ends_with("CRS84") {
        return Some(WGS84_EPSG);
    }
    name.rsplit(':').next()?.parse().ok()
}

fn geometry_type_name(geom: &geo::Geometry) -> &'static str {
    match geom {
        geo::Geometry::Point(_) => "Point",
        geo::Geometry::Line(_) => "Line",
        geo::Geometry::LineString(_) => "LineString",
        geo::Geometry::Polygon(_) => "Polygon",
        geo::Geometry::MultiPoint(_) => "MultiPoint",
        geo::Geometry::MultiLineString(_) => "MultiLineString",
        geo::Geometry::MultiPolygon(_) => "MultiPolygon",
        geo::Geometry::GeometryCollection(_) => "GeometryCollection",
        geo::Geometry::Rect(_) => "Rect",
        geo::Geometry::Triangle(_) => "Triangle",
        #[allow(unreachable_patterns)]
        _ => "Unknown",
    }
}
