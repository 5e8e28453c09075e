//! Types d'erreurs pour le crate lotplan

use thiserror::Error;

/// Erreurs pouvant survenir lors de la résolution ou de l'export des parcelles
#[derive(Debug, Error)]
pub enum LotPlanError {
    /// Identifiant impossible à classer en QLD ou NSW
    #[error("Invalid Lot/Plan identifier '{token}': {reason}")]
    InvalidIdentifier { token: String, reason: String },

    /// Aucune feature retournée pour l'identifiant
    #[error("No parcel found for '{0}'")]
    NotFound(String),

    /// Erreur réseau ou statut HTTP non 2xx
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Réponse du service illisible (pas du JSON, pas une FeatureCollection)
    #[error("Invalid response from {service}: {reason}")]
    InvalidResponse { service: String, reason: String },

    /// Reprojection impossible vers WGS84
    #[error("Reprojection from EPSG:{wkid} failed: {reason}")]
    Reprojection { wkid: u32, reason: String },

    /// Géométrie autre que Polygon / MultiPolygon
    #[error("Unsupported geometry type: {0}")]
    UnsupportedGeometry(String),

    /// Couleur hexadécimale mal formée (erreur de configuration)
    #[error("Invalid hex color '{0}': expected #RRGGBB")]
    InvalidColor(String),

    /// Aucune parcelle à exporter
    #[error("Nothing to export: no resolved parcels")]
    NothingToExport,

    /// Erreur d'écriture GeoJSON
    #[error("GeoJSON error: {0}")]
    Geozero(#[from] geozero::error::GeozeroError),

    /// Erreur d'écriture Shapefile
    #[error("Shapefile error: {0}")]
    Shapefile(#[from] shapefile::Error),

    /// Erreur d'écriture de l'archive zip
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Erreur d'I/O
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LotPlanError {
    /// Crée une erreur d'identifiant invalide avec contexte
    pub fn invalid_identifier(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            token: token.into(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur de réponse invalide
    pub fn invalid_response(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            service: service.into(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur de reprojection
    pub fn reprojection(wkid: u32, reason: impl Into<String>) -> Self {
        Self::Reprojection {
            wkid,
            reason: reason.into(),
        }
    }
}

/// Alias pratique pour les résultats du crate
pub type Result<T> = std::result::Result<T, LotPlanError>;
