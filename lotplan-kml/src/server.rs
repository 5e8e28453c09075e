//! API HTTP (axum)
//!
//! | Route                              | Réponse                         |
//! |------------------------------------|---------------------------------|
//! | `GET /`                            | message d'accueil               |
//! | `GET /health`                      | `{"status":"ok"}`               |
//! | `GET /api/parcels/:lotplan`        | FeatureCollection GeoJSON       |
//! | `GET /api/parcels/:lotplan/kml`    | KML en pièce jointe             |
//! | `GET /api/parcels/:lotplan/shapefile` | zip en pièce jointe          |
//! | `POST /api/search`                 | `SearchReport`                  |
//!
//! Les identifiants NSW contiennent des `/` : ils doivent être encodés
//! (`5%2F%2FDP123456`) dans le chemin.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use lotplan::export::geojson::{to_geojson_string, GEOJSON_MIME};
use lotplan::{
    build_kml, build_shapefile_zip, resolve, LotPlanError, ParcelSource, Resolution,
    ResolveOptions, StyleConfig, KML_MIME, ZIP_MIME,
};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::config::validate_style;
use crate::report::SearchReport;

/// État partagé entre les handlers
pub struct AppState<S> {
    source: Arc<S>,
    options: ResolveOptions,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            options: self.options,
        }
    }
}

impl<S> AppState<S> {
    pub fn new(source: S, options: ResolveOptions) -> Self {
        Self {
            source: Arc::new(source),
            options,
        }
    }
}

/// Erreurs renvoyées au client HTTP
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<LotPlanError> for ApiError {
    fn from(e: LotPlanError) -> Self {
        match e {
            LotPlanError::NotFound(_) | LotPlanError::NothingToExport => {
                Self::NotFound(e.to_string())
            }
            LotPlanError::InvalidColor(_) | LotPlanError::InvalidIdentifier { .. } => {
                Self::BadRequest(e.to_string())
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(msg) => {
                error!(error = %msg, "Request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

/// Corps de `POST /api/search`
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub identifiers: Vec<String>,
    #[serde(default)]
    pub style: Option<StyleConfig>,
}

/// Construit le routeur de l'API
pub fn router<S>(state: AppState<S>) -> Router
where
    S: ParcelSource + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/parcels/:lotplan", get(get_parcel::<S>))
        .route("/api/parcels/:lotplan/kml", get(get_parcel_kml::<S>))
        .route("/api/parcels/:lotplan/shapefile", get(get_parcel_shapefile::<S>))
        .route("/api/search", post(search::<S>))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "See /api/parcels/{lotplan} for parcel lookups" }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Résout un seul identifiant, 404 s'il est introuvable
async fn resolve_single<S>(state: &AppState<S>, lotplan: &str) -> Result<Resolution, ApiError>
where
    S: ParcelSource + Send + Sync,
{
    let resolution = resolve(state.source.as_ref(), [lotplan], state.options).await;
    if resolution.resolved.is_empty() {
        return Err(ApiError::NotFound(format!("No parcel found for: {}", lotplan.trim())));
    }
    Ok(resolution)
}

/// Nom de fichier sûr pour `Content-Disposition`
fn attachment_name(lotplan: &str, ext: &str) -> String {
    let stem: String = lotplan
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("attachment; filename=\"{}.{}\"", stem, ext)
}

async fn get_parcel<S>(
    State(state): State<AppState<S>>,
    Path(lotplan): Path<String>,
) -> Result<Response, ApiError>
where
    S: ParcelSource + Send + Sync,
{
    let resolution = resolve_single(&state, &lotplan).await?;
    let body = to_geojson_string(&resolution.resolved)?;
    Ok(([(header::CONTENT_TYPE, GEOJSON_MIME)], body).into_response())
}

async fn get_parcel_kml<S>(
    State(state): State<AppState<S>>,
    Path(lotplan): Path<String>,
) -> Result<Response, ApiError>
where
    S: ParcelSource + Send + Sync,
{
    let resolution = resolve_single(&state, &lotplan).await?;
    let kml = build_kml(&resolution.resolved, &StyleConfig::default())?;
    Ok((
        [
            (header::CONTENT_TYPE, KML_MIME.to_string()),
            (header::CONTENT_DISPOSITION, attachment_name(&lotplan, "kml")),
        ],
        kml,
    )
        .into_response())
}

async fn get_parcel_shapefile<S>(
    State(state): State<AppState<S>>,
    Path(lotplan): Path<String>,
) -> Result<Response, ApiError>
where
    S: ParcelSource + Send + Sync,
{
    let resolution = resolve_single(&state, &lotplan).await?;
    let zip = build_shapefile_zip(&resolution.resolved)?;
    Ok((
        [
            (header::CONTENT_TYPE, ZIP_MIME.to_string()),
            (header::CONTENT_DISPOSITION, attachment_name(&lotplan, "zip")),
        ],
        zip,
    )
        .into_response())
}

async fn search<S>(
    State(state): State<AppState<S>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchReport>, ApiError>
where
    S: ParcelSource + Send + Sync,
{
    let style = request.style.unwrap_or_default();
    validate_style(&style).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    if request.identifiers.iter().all(|s| s.trim().is_empty()) {
        return Err(ApiError::BadRequest("No Lot/Plan identifiers given".into()));
    }

    let started_at = Instant::now();
    let resolution = resolve(state.source.as_ref(), &request.identifiers, state.options).await;
    let report = SearchReport::new(&resolution, &style, started_at.elapsed())
        .with_geojson(&resolution)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    info!(summary = %report.summary(), "Search complete");
    Ok(Json(report))
}
