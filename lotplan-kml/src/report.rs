//! Rapport de recherche
//!
//! Regroupe le résultat d'une résolution pour l'affichage console et la
//! réponse JSON de l'API : tableau, identifiants manquants, emprise.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use lotplan::export::geojson::to_geojson_string;
use lotplan::{Bounds, ParcelRow, Resolution, StyleConfig};
use serde::Serialize;

/// Statut global de la recherche
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SearchStatus {
    /// Tous les identifiants ont été résolus
    Success,
    /// Une partie des identifiants est manquante
    PartialSuccess,
    /// Aucun identifiant résolu
    Failed,
}

/// Rapport complet d'une recherche
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub status: SearchStatus,
    pub duration_secs: f64,
    /// Nombre de parcelles résolues
    pub resolved: usize,
    pub missing: Vec<String>,
    pub rows: Vec<ParcelRow>,
    /// Emprise `[[sud, ouest], [nord, est]]`
    pub bounds: Bounds,
    pub warning: Option<String>,
    pub style: StyleConfig,
    /// FeatureCollection WGS84 pour l'affichage cartographique
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geojson: Option<serde_json::Value>,
}

impl SearchReport {
    /// Construit le rapport d'une résolution
    pub fn new(resolution: &Resolution, style: &StyleConfig, duration: Duration) -> Self {
        let status = match (resolution.resolved.is_empty(), resolution.missing.is_empty()) {
            (true, _) => SearchStatus::Failed,
            (false, true) => SearchStatus::Success,
            (false, false) => SearchStatus::PartialSuccess,
        };

        Self {
            status,
            duration_secs: duration.as_secs_f64(),
            resolved: resolution.resolved.len(),
            missing: resolution.missing.clone(),
            rows: resolution.rows(),
            bounds: resolution.bounds(),
            warning: resolution.warning(),
            style: style.clone(),
            geojson: None,
        }
    }

    /// Ajoute la FeatureCollection des parcelles résolues
    pub fn with_geojson(mut self, resolution: &Resolution) -> Result<Self> {
        if !resolution.resolved.is_empty() {
            let text = to_geojson_string(&resolution.resolved)?;
            self.geojson = Some(serde_json::from_str(&text)?);
        }
        Ok(self)
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(72));
        println!("SEARCH REPORT");
        println!("{}", "=".repeat(72));

        println!("\nStatus: {:?}", self.status);
        println!("Duration: {:.2}s", self.duration_secs);
        println!(
            "Parcels: {} resolved, {} missing",
            self.resolved,
            self.missing.len()
        );

        if !self.rows.is_empty() {
            println!("\n--- PARCELS ---");
            println!(
                "  {:<20} {:<5} {:>12}  {:<24} {}",
                "Lot/Plan", "State", "Area (ha)", "Lot type", "Locality"
            );
            for row in &self.rows {
                println!(
                    "  {:<20} {:<5} {:>12.2}  {:<24} {}",
                    row.identifier,
                    row.jurisdiction.to_string(),
                    row.area_ha,
                    row.lot_type.as_deref().unwrap_or("-"),
                    row.locality.as_deref().unwrap_or("-")
                );
            }
        }

        if let Some(warning) = &self.warning {
            println!("\n--- WARNING ---");
            println!("  {}", warning);
        }

        println!("\n{}", "=".repeat(72));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Affichage compact pour les logs
    pub fn summary(&self) -> String {
        format!(
            "{} resolved, {} missing in {:.2}s",
            self.resolved,
            self.missing.len(),
            self.duration_secs
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;
    use lotplan::{Jurisdiction, ParcelGeometry, ResolvedParcel};

    fn resolution(missing: &[&str]) -> Resolution {
        let parcel = ResolvedParcel {
            identifier: "6RP702264".into(),
            jurisdiction: Jurisdiction::Qld,
            geometry: ParcelGeometry::Polygon(polygon![
                (x: 153.0, y: -27.5),
                (x: 153.01, y: -27.5),
                (x: 153.01, y: -27.51),
                (x: 153.0, y: -27.5),
            ]),
            properties: serde_json::Map::new(),
            feature_count: 1,
        };
        Resolution {
            resolved: [(parcel.identifier.clone(), parcel)].into_iter().collect(),
            missing: missing.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_status() {
        let style = StyleConfig::default();
        let report = SearchReport::new(&resolution(&[]), &style, Duration::ZERO);
        assert_eq!(report.status, SearchStatus::Success);
        assert!(report.warning.is_none());

        let report = SearchReport::new(&resolution(&["1RP1"]), &style, Duration::ZERO);
        assert_eq!(report.status, SearchStatus::PartialSuccess);
        assert_eq!(report.warning.as_deref(), Some("No parcel found for: 1RP1"));

        let report = SearchReport::new(&Resolution::default(), &style, Duration::ZERO);
        assert_eq!(report.status, SearchStatus::Failed);
        assert_eq!(report.bounds, Bounds::AUSTRALIA);
    }

    #[test]
    fn test_json_shape() {
        let res = resolution(&["9SP9"]);
        let report = SearchReport::new(&res, &StyleConfig::default(), Duration::from_millis(250))
            .with_geojson(&res)
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["resolved"], 1);
        assert_eq!(json["missing"][0], "9SP9");
        assert_eq!(json["rows"][0]["jurisdiction"], "QLD");
        assert_eq!(json["geojson"]["type"], "FeatureCollection");
        assert_eq!(json["bounds"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_summary() {
        let report = SearchReport::new(&resolution(&["1RP1"]), &StyleConfig::default(), Duration::ZERO);
        assert!(report.summary().contains("1 resolved, 1 missing"));
    }
}
