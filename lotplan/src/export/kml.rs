//! Export KML 2.2 stylé
//!
//! Une `<Placemark>` par polygone : un MultiPolygon de N parties donne N
//! placemarks nommés `"{id} (1)"` … `"{id} (N)"`.

use std::collections::BTreeMap;
use std::fmt::Write;

use geo::{LineString, Polygon};
use serde_json::Value;

use super::area::geodesic_area_ha;
use super::color::{outline_color, to_export_color};
use crate::error::{LotPlanError, Result};
use crate::types::{round2, ParcelGeometry, ResolvedParcel, StyleConfig};

/// Type MIME d'un document KML
pub const KML_MIME: &str = "application/vnd.google-earth.kml+xml";

/// Couleurs KML pré-calculées pour un export
struct KmlStyle<'a> {
    fill: String,
    outline: String,
    width: f64,
    folder: &'a str,
}

impl<'a> KmlStyle<'a> {
    fn new(style: &'a StyleConfig) -> Result<Self> {
        Ok(Self {
            fill: to_export_color(&style.fill_color, style.fill_opacity)?,
            outline: outline_color(&style.outline_color)?,
            width: style.outline_width,
            folder: &style.folder_name,
        })
    }
}

/// Construit un document KML pour les parcelles résolues.
///
/// # Errors
///
/// - `LotPlanError::NothingToExport` si aucune parcelle n'est fournie
/// - `LotPlanError::InvalidColor` si une couleur du style est mal formée
pub fn build_kml(parcels: &BTreeMap<String, ResolvedParcel>, style: &StyleConfig) -> Result<String> {
    if parcels.is_empty() {
        return Err(LotPlanError::NothingToExport);
    }

    let kml_style = KmlStyle::new(style)?;
    let mut out = String::with_capacity(4096 * parcels.len());

    write_document(&mut out, parcels.values(), &kml_style).map_err(|e| {
        LotPlanError::Io(std::io::Error::new(std::io::ErrorKind::Other, e))
    })?;

    Ok(out)
}

fn write_document<'p, W: Write>(
    w: &mut W,
    parcels: impl Iterator<Item = &'p ResolvedParcel>,
    style: &KmlStyle<'_>,
) -> std::fmt::Result {
    let folder = escape_xml(style.folder);

    writeln!(w, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(w, r#"<kml xmlns="http://www.opengis.net/kml/2.2">"#)?;
    writeln!(w, "<Document>")?;
    writeln!(w, "<name>{}</name>", folder)?;
    writeln!(w, "<Folder>")?;
    writeln!(w, "<name>{}</name>", folder)?;

    for parcel in parcels {
        write_parcel(w, parcel, style)?;
    }

    writeln!(w, "</Folder>")?;
    writeln!(w, "</Document>")?;
    writeln!(w, "</kml>")
}

fn write_parcel<W: Write>(w: &mut W, parcel: &ResolvedParcel, style: &KmlStyle<'_>) -> std::fmt::Result {
    let polygons = parcel.geometry.polygons();
    let multi = polygons.len() > 1;
    let total_ha = round2(parcel.area_ha());

    for (i, polygon) in polygons.into_iter().enumerate() {
        let name = if multi {
            format!("{} ({})", parcel.identifier, i + 1)
        } else {
            parcel.identifier.clone()
        };
        let part_ha = round2(geodesic_area_ha(&ParcelGeometry::Polygon(polygon.clone())));

        writeln!(w, "<Placemark>")?;
        writeln!(w, "<name>{}</name>", escape_xml(&name))?;
        write_description(w, parcel, part_ha, multi.then_some(total_ha))?;
        write_extended_data(w, parcel, part_ha)?;
        writeln!(
            w,
            "<Style><LineStyle><color>{}</color><width>{}</width></LineStyle>\
             <PolyStyle><color>{}</color></PolyStyle></Style>",
            style.outline, style.width, style.fill
        )?;
        write_polygon(w, polygon)?;
        writeln!(w, "</Placemark>")?;
    }

    Ok(())
}

fn write_description<W: Write>(
    w: &mut W,
    parcel: &ResolvedParcel,
    part_ha: f64,
    total_ha: Option<f64>,
) -> std::fmt::Result {
    let mut text = format!("Lot/Plan: {}\nArea: {:.2} ha", parcel.identifier, part_ha);
    if let Some(total) = total_ha {
        write!(text, " (parcel total {:.2} ha)", total)?;
    }
    if let Some(lot_type) = parcel.lot_type() {
        write!(text, "\nLot type: {}", lot_type)?;
    }
    if let Some(locality) = parcel.locality() {
        write!(text, "\nLocality: {}", locality)?;
    }
    writeln!(w, "<description>{}</description>", escape_xml(&text))
}

fn write_extended_data<W: Write>(w: &mut W, parcel: &ResolvedParcel, part_ha: f64) -> std::fmt::Result {
    writeln!(w, "<ExtendedData>")?;
    write_data(w, "Lot/plan", &parcel.identifier)?;
    write_data(w, "Jurisdiction", &parcel.jurisdiction.to_string())?;
    write_data(w, "Area (ha)", &format!("{:.2}", part_ha))?;

    for (key, value) in &parcel.properties {
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => continue,
        };
        write_data(w, key, &text)?;
    }
    writeln!(w, "</ExtendedData>")
}

fn write_data<W: Write>(w: &mut W, name: &str, value: &str) -> std::fmt::Result {
    writeln!(
        w,
        r#"<Data name="{}"><value>{}</value></Data>"#,
        escape_xml(name),
        escape_xml(value)
    )
}

fn write_polygon<W: Write>(w: &mut W, polygon: &Polygon) -> std::fmt::Result {
    writeln!(w, "<Polygon>")?;
    writeln!(w, "<outerBoundaryIs><LinearRing><coordinates>")?;
    write_ring(w, polygon.exterior())?;
    writeln!(w, "</coordinates></LinearRing></outerBoundaryIs>")?;
    for hole in polygon.interiors() {
        writeln!(w, "<innerBoundaryIs><LinearRing><coordinates>")?;
        write_ring(w, hole)?;
        writeln!(w, "</coordinates></LinearRing></innerBoundaryIs>")?;
    }
    writeln!(w, "</Polygon>")
}

/// Anneau `lon,lat,0` fermé
fn write_ring<W: Write>(w: &mut W, ring: &LineString) -> std::fmt::Result {
    let coords = &ring.0;
    for (i, c) in coords.iter().enumerate() {
        if i > 0 {
            w.write_char(' ')?;
        }
        write!(w, "{},{},0", c.x, c.y)?;
    }
    if let (Some(first), Some(last)) = (coords.first(), coords.last()) {
        if first != last {
            write!(w, " {},{},0", first.x, first.y)?;
        }
    }
    writeln!(w)
}

/// Échappe une chaîne pour XML
fn escape_xml(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            c => result.push(c),
        }
    }
    result
}
