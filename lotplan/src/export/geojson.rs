//! Export GeoJSON des parcelles résolues (geozero, streaming)
//!
//! Sert à l'affichage cartographique : une feature par identifier, en
//! EPSG:4326, avec les attributs du service et l'emprise globale.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use geozero::geojson::GeoJsonWriter;
use geozero::GeozeroGeometry;

use crate::error::{LotPlanError, Result};
use crate::types::{round2, Bounds, ResolvedParcel};

/// Type MIME d'un document GeoJSON
pub const GEOJSON_MIME: &str = "application/geo+json";

/// Écrit une FeatureCollection WGS84 pour les parcelles
pub fn write_geojson<'p, W: Write>(
    writer: &mut W,
    parcels: impl IntoIterator<Item = &'p ResolvedParcel>,
) -> Result<()> {
    let parcels: Vec<&ResolvedParcel> = parcels.into_iter().collect();
    let bounds = Bounds::of(parcels.iter().map(|p| &p.geometry));

    write!(
        writer,
        r#"{{"type":"FeatureCollection","crs":{{"type":"name","properties":{{"name":"urn:ogc:def:crs:OGC:1.3:CRS84"}}}},"bbox":[{},{},{},{}],"features":["#,
        bounds.0[0][1], bounds.0[0][0], bounds.0[1][1], bounds.0[1][0]
    )?;

    for (i, parcel) in parcels.iter().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        write_feature(writer, parcel)?;
    }

    write!(writer, "]}}")?;
    writer.flush()?;
    Ok(())
}

/// FeatureCollection en mémoire
pub fn to_geojson_string(parcels: &BTreeMap<String, ResolvedParcel>) -> Result<String> {
    let mut buf = Vec::with_capacity(2048 * parcels.len().max(1));
    write_geojson(&mut buf, parcels.values())?;
    String::from_utf8(buf)
        .map_err(|e| LotPlanError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Exporte les parcelles dans un fichier `.geojson`
pub fn export_to_file(parcels: &BTreeMap<String, ResolvedParcel>, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);
    write_geojson(&mut writer, parcels.values())
}

fn write_feature<W: Write>(writer: &mut W, parcel: &ResolvedParcel) -> Result<()> {
    write!(
        writer,
        r#"{{"type":"Feature","id":{},"geometry":"#,
        json_string(&parcel.identifier)
    )?;

    let mut geom_buf = Vec::new();
    let mut geom_writer = GeoJsonWriter::new(&mut geom_buf);
    parcel.geometry.to_geo().process_geom(&mut geom_writer)?;
    writer.write_all(&geom_buf)?;

    write!(
        writer,
        r#","properties":{{"name":{},"jurisdiction":"{}","area_ha":{},"feature_count":{}"#,
        json_string(&parcel.identifier),
        parcel.jurisdiction,
        round2(parcel.area_ha()),
        parcel.feature_count
    )?;
    for (key, value) in &parcel.properties {
        // Les clés calculées ci-dessus priment
        if matches!(key.as_str(), "name" | "jurisdiction" | "area_ha" | "feature_count") {
            continue;
        }
        write!(writer, ",{}:{}", json_string(key), value)?;
    }
    write!(writer, "}}}}")?;

    Ok(())
}

fn json_string(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Jurisdiction;
    use crate::types::ParcelGeometry;
    use geo::polygon;

    fn parcels() -> BTreeMap<String, ResolvedParcel> {
        let mut properties = serde_json::Map::new();
        properties.insert("locality".into(), "O\"CONNELL".into());
        properties.insert("name".into(), "shadowed".into());
        let parcel = ResolvedParcel {
            identifier: "6RP702264".into(),
            jurisdiction: Jurisdiction::Qld,
            geometry: ParcelGeometry::Polygon(polygon![
                (x: 153.0, y: -27.5),
                (x: 153.01, y: -27.5),
                (x: 153.01, y: -27.51),
                (x: 153.0, y: -27.5),
            ]),
            properties,
            feature_count: 1,
        };
        [(parcel.identifier.clone(), parcel)].into_iter().collect()
    }

    #[test]
    fn test_feature_collection_is_valid_geojson() {
        let json = to_geojson_string(&parcels()).unwrap();
        let fc: geojson::FeatureCollection = json.parse::<geojson::GeoJson>().unwrap().try_into().unwrap();

        assert_eq!(fc.features.len(), 1);
        let feature = &fc.features[0];
        assert_eq!(feature.property("name").and_then(|v| v.as_str()), Some("6RP702264"));
        assert_eq!(feature.property("jurisdiction").and_then(|v| v.as_str()), Some("QLD"));
        assert_eq!(feature.property("locality").and_then(|v| v.as_str()), Some("O\"CONNELL"));
        assert!(json.contains("CRS84"));
    }

    #[test]
    fn test_bbox_is_lon_lat() {
        let json = to_geojson_string(&parcels()).unwrap();
        assert!(json.contains(r#""bbox":[153,-27.51,153.01,-27.5]"#));
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parcels.geojson");
        export_to_file(&parcels(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(r#"{"type":"FeatureCollection""#));
    }
}
