//! Client des services cadastraux ArcGIS (QLD et NSW)

use std::future::Future;
use std::time::Duration;

use geojson::FeatureCollection;
use serde_json::Value;
use tracing::debug;

use crate::classify::{Jurisdiction, ParcelQuery};
use crate::error::{LotPlanError, Result};

/// Service cadastral du Queensland (LandParcelPropertyFramework, couche 4)
pub const QLD_URL: &str = "https://spatial-gis.information.qld.gov.au/arcgis/rest/services/PlanningCadastre/LandParcelPropertyFramework/MapServer/4/query";

/// Service cadastral de Nouvelle-Galles du Sud (NSW_Cadastre, couche 9)
pub const NSW_URL: &str =
    "https://maps.six.nsw.gov.au/arcgis/rest/services/public/NSW_Cadastre/MapServer/9/query";

/// Timeout par défaut d'une requête
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Source de features pour une requête de parcelle
pub trait ParcelSource {
    /// Interroge le service de la juridiction et retourne la FeatureCollection brute
    fn query(&self, query: &ParcelQuery) -> impl Future<Output = Result<FeatureCollection>> + Send;
}

/// Forme du prédicat NSW
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NswPredicate {
    /// `lotidstring='lot/section/plan'`
    #[default]
    LotIdString,
    /// `lotnumber=... AND sectionnumber ... AND plannumber=...`
    Decomposed,
}

impl std::str::FromStr for NswPredicate {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lotidstring" | "string" => Ok(Self::LotIdString),
            "decomposed" | "parts" => Ok(Self::Decomposed),
            _ => Err(format!(
                "Invalid NSW predicate: {}. Use: lotidstring, decomposed",
                s
            )),
        }
    }
}

/// Configuration du client ArcGIS
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub qld_url: String,
    pub nsw_url: String,
    pub timeout: Duration,
    pub nsw_predicate: NswPredicate,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            qld_url: QLD_URL.into(),
            nsw_url: NSW_URL.into(),
            timeout: DEFAULT_TIMEOUT,
            nsw_predicate: NswPredicate::default(),
        }
    }
}

impl ServiceConfig {
    /// Charge la configuration depuis les variables d'environnement
    pub fn from_env() -> Self {
        Self {
            qld_url: std::env::var("LOTPLAN_QLD_URL").unwrap_or_else(|_| QLD_URL.into()),
            nsw_url: std::env::var("LOTPLAN_NSW_URL").unwrap_or_else(|_| NSW_URL.into()),
            timeout: std::env::var("LOTPLAN_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TIMEOUT),
            nsw_predicate: std::env::var("LOTPLAN_NSW_PREDICATE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
        }
    }

    pub fn url_for(&self, jurisdiction: Jurisdiction) -> &str {
        match jurisdiction {
            Jurisdiction::Qld => &self.qld_url,
            Jurisdiction::Nsw => &self.nsw_url,
        }
    }

    /// Clause `where` selon la juridiction et le mode NSW
    pub fn where_clause(&self, query: &ParcelQuery) -> String {
        match (&query.parts, self.nsw_predicate) {
            (Some(parts), NswPredicate::Decomposed) => parts.where_clause(),
            _ => query.where_clause(),
        }
    }
}

/// Client HTTP des services ArcGIS MapServer
#[derive(Debug, Clone)]
pub struct ArcGisClient {
    http: reqwest::Client,
    config: ServiceConfig,
}

impl ArcGisClient {
    /// Crée un client avec un timeout borné par requête
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("lotplan/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

impl ParcelSource for ArcGisClient {
    fn query(&self, query: &ParcelQuery) -> impl Future<Output = Result<FeatureCollection>> + Send {
        let url = self.config.url_for(query.jurisdiction).to_string();
        let where_clause = self.config.where_clause(query);
        let service = query.jurisdiction.to_string();
        let http = self.http.clone();

        async move {
            debug!(service = %service, predicate = %where_clause, "Querying cadastre");

            let body = http
                .get(&url)
                .query(&[
                    ("where", where_clause.as_str()),
                    ("outFields", "*"),
                    ("returnGeometry", "true"),
                    ("f", "geojson"),
                ])
                .send()
                .await?
                .error_for_status()?
                .text()
                .await?;

            parse_feature_collection(&service, &body)
        }
    }
}

/// Parse le corps d'une réponse `f=geojson`.
///
/// ArcGIS renvoie ses erreurs avec un statut 200 et un objet `error`.
pub fn parse_feature_collection(service: &str, body: &str) -> Result<FeatureCollection> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| LotPlanError::invalid_response(service, format!("not JSON: {}", e)))?;

    if let Some(error) = value.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown service error");
        return Err(LotPlanError::invalid_response(service, message));
    }

    serde_json::from_value(value).map_err(|e| {
        LotPlanError::invalid_response(service, format!("not a FeatureCollection: {}", e))
    })
}
