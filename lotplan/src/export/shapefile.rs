//! Export Shapefile zippé (`parcels.shp/.shx/.dbf/.prj`)

use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use std::path::Path;

use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use shapefile::{Point, PolygonRing};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{LotPlanError, Result};
use crate::types::{round2, ResolvedParcel};

/// Type MIME de l'archive
pub const ZIP_MIME: &str = "application/zip";

/// Nom de base des fichiers dans l'archive
pub const BASENAME: &str = "parcels";

/// Extensions incluses, dans l'ordre
pub const EXTENSIONS: [&str; 4] = ["shp", "shx", "dbf", "prj"];

/// WKT du `.prj` : WGS84 géographique
pub const WGS84_PRJ: &str = concat!(
    r#"GEOGCS["WGS 84",DATUM["WGS_1984","#,
    r#"SPHEROID["WGS 84",6378137,298.257223563],"#,
    r#"AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0],"#,
    r#"UNIT["degree",0.0174532925199433],AUTHORITY["EPSG","4326"]]"#
);

/// Champs DBF (nom ≤ 10 caractères)
const FIELD_LOTPLAN: &str = "LOTPLAN";
const FIELD_LOT_TYPE: &str = "LOT_TYPE";
const FIELD_LOCALITY: &str = "LOCALITY";
const FIELD_AREA_HA: &str = "AREA_HA";

/// Construit l'archive zip du Shapefile.
///
/// Une ligne par identifier, géométrie = union des polygones, CRS WGS84.
///
/// # Errors
///
/// `LotPlanError::NothingToExport` si aucune parcelle n'est fournie.
pub fn build_shapefile_zip(parcels: &BTreeMap<String, ResolvedParcel>) -> Result<Vec<u8>> {
    if parcels.is_empty() {
        return Err(LotPlanError::NothingToExport);
    }

    let dir = tempfile::tempdir()?;
    let base = dir.path().join(BASENAME);

    write_shapefile(&base, parcels)?;
    std::fs::write(base.with_extension("prj"), WGS84_PRJ)?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for ext in EXTENSIONS {
        let bytes = std::fs::read(base.with_extension(ext))?;
        zip.start_file(format!("{}.{}", BASENAME, ext), options)?;
        zip.write_all(&bytes)?;
    }

    let data = zip.finish()?.into_inner();
    debug!(parcels = parcels.len(), bytes = data.len(), "Shapefile archive built");
    Ok(data)
}

/// Écrit `.shp/.shx/.dbf` à côté de `base`
fn write_shapefile(base: &Path, parcels: &BTreeMap<String, ResolvedParcel>) -> Result<()> {
    let table = TableWriterBuilder::new()
        .add_character_field(field_name(FIELD_LOTPLAN)?, 40)
        .add_character_field(field_name(FIELD_LOT_TYPE)?, 50)
        .add_character_field(field_name(FIELD_LOCALITY)?, 50)
        .add_numeric_field(field_name(FIELD_AREA_HA)?, 16, 2);

    // Le writer finalise les en-têtes à sa destruction
    let mut writer = shapefile::Writer::from_path(base.with_extension("shp"), table)?;

    for parcel in parcels.values() {
        let shape = to_shape(parcel);
        let record = to_record(parcel);
        writer.write_shape_and_record(&shape, &record)?;
    }

    drop(writer);
    Ok(())
}

fn field_name(name: &str) -> Result<FieldName> {
    FieldName::try_from(name).map_err(|e| {
        LotPlanError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid DBF field name {}: {:?}", name, e),
        ))
    })
}

/// Polygone Shapefile : toutes les parties, anneaux extérieurs et trous
fn to_shape(parcel: &ResolvedParcel) -> shapefile::Polygon {
    let to_points = |ring: &geo::LineString| -> Vec<Point> {
        ring.coords().map(|c| Point::new(c.x, c.y)).collect()
    };

    let mut rings = Vec::new();
    for polygon in parcel.geometry.polygons() {
        rings.push(PolygonRing::Outer(to_points(polygon.exterior())));
        for hole in polygon.interiors() {
            rings.push(PolygonRing::Inner(to_points(hole)));
        }
    }
    shapefile::Polygon::with_rings(rings)
}

fn to_record(parcel: &ResolvedParcel) -> Record {
    let mut record = Record::default();
    record.insert(
        FIELD_LOTPLAN.to_string(),
        FieldValue::Character(Some(parcel.identifier.clone())),
    );
    record.insert(
        FIELD_LOT_TYPE.to_string(),
        FieldValue::Character(parcel.lot_type()),
    );
    record.insert(
        FIELD_LOCALITY.to_string(),
        FieldValue::Character(parcel.locality()),
    );
    record.insert(
        FIELD_AREA_HA.to_string(),
        FieldValue::Numeric(Some(round2(parcel.area_ha()))),
    );
    record
}
