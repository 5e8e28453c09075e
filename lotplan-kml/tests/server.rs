//! Tests de l'API HTTP avec un service cadastral simulé

use std::collections::HashMap;
use std::future::Future;
use std::io::Cursor;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use geojson::FeatureCollection;
use lotplan::source::parse_feature_collection;
use lotplan::{ParcelQuery, ParcelSource, ResolveOptions};
use lotplan_kml::{router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

const QLD_SQUARE: &str = r#"{"type":"FeatureCollection","features":[{"type":"Feature","properties":{"lotplan":"6RP702264","locality":"BRISBANE CITY"},"geometry":{"type":"Polygon","coordinates":[[[153.02,-27.47],[153.03,-27.47],[153.03,-27.48],[153.02,-27.48],[153.02,-27.47]]]}}]}"#;

const NSW_SQUARE: &str = r#"{"type":"FeatureCollection","features":[{"type":"Feature","properties":{"lotidstring":"5//DP123456"},"geometry":{"type":"Polygon","coordinates":[[[151.00,-33.81],[151.01,-33.81],[151.01,-33.82],[151.00,-33.81]]]}}]}"#;

const EMPTY: &str = r#"{"type":"FeatureCollection","features":[]}"#;

struct StubSource(HashMap<&'static str, &'static str>);

impl ParcelSource for StubSource {
    fn query(
        &self,
        query: &ParcelQuery,
    ) -> impl Future<Output = lotplan::Result<FeatureCollection>> + Send {
        let body = self.0.get(query.value.as_str()).copied().unwrap_or(EMPTY);
        let service = query.jurisdiction.to_string();
        async move { parse_feature_collection(&service, body) }
    }
}

fn app() -> Router {
    let source = StubSource(
        [("6RP702264", QLD_SQUARE), ("5//DP123456", NSW_SQUARE)]
            .into_iter()
            .collect(),
    );
    router(AppState::new(source, ResolveOptions::default()))
}

async fn get(uri: &str) -> (StatusCode, HashMap<String, String>, Vec<u8>) {
    let response = app()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response
        .headers()
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
        .collect();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

async fn post_json(uri: &str, payload: Value) -> (StatusCode, Value) {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_root_and_health() {
    let (status, _, body) = get("/").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json["message"].as_str().unwrap().contains("/api/parcels/"));

    let (status, _, body) = get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!({"status": "ok"}));
}

#[tokio::test]
async fn test_get_parcel_geojson() {
    let (status, headers, body) = get("/api/parcels/6RP702264").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-type"], "application/geo+json");

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["type"], "FeatureCollection");
    assert_eq!(json["features"][0]["properties"]["name"], "6RP702264");
}

#[tokio::test]
async fn test_get_nsw_parcel_with_encoded_slashes() {
    let (status, _, body) = get("/api/parcels/5%2F%2FDP123456").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["features"][0]["properties"]["jurisdiction"], "NSW");
}

#[tokio::test]
async fn test_unknown_parcel_is_404() {
    let (status, _, body) = get("/api/parcels/9SP999999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json["detail"].as_str().unwrap().contains("9SP999999"));

    let (status, _, _) = get("/api/parcels/9SP999999/kml").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = get("/api/parcels/not-an-id/shapefile").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_parcel_kml_attachment() {
    let (status, headers, body) = get("/api/parcels/6RP702264/kml").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-type"], "application/vnd.google-earth.kml+xml");
    assert_eq!(
        headers["content-disposition"],
        "attachment; filename=\"6RP702264.kml\""
    );

    let kml = String::from_utf8(body).unwrap();
    assert!(kml.contains("<name>6RP702264</name>"));
    assert_eq!(kml.matches("<Placemark>").count(), 1);
}

#[tokio::test]
async fn test_get_parcel_shapefile_attachment() {
    let (status, headers, body) = get("/api/parcels/6RP702264/shapefile").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-type"], "application/zip");

    let archive = zip::ZipArchive::new(Cursor::new(body)).unwrap();
    let mut names: Vec<&str> = archive.file_names().collect();
    names.sort_unstable();
    assert_eq!(
        names,
        vec!["parcels.dbf", "parcels.prj", "parcels.shp", "parcels.shx"]
    );
}

#[tokio::test]
async fn test_search_report() {
    let (status, json) = post_json(
        "/api/search",
        json!({
            "identifiers": ["6RP702264", "5//DP123456", "bogus/token/with/4/slashes"],
            "style": {"fill_color": "#00ff00", "fill_opacity": 40}
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["resolved"], 2);
    assert_eq!(json["missing"], json!(["bogus/token/with/4/slashes"]));
    assert_eq!(json["status"], "PartialSuccess");
    assert_eq!(json["rows"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["style"]["fill_color"], "#00ff00");
    assert_eq!(json["style"]["folder_name"], "Parcels");
    assert_eq!(json["geojson"]["features"].as_array().map(Vec::len), Some(2));
    assert!(json["warning"].as_str().unwrap().contains("bogus/token/with/4/slashes"));
}

#[tokio::test]
async fn test_search_invalid_color_is_400() {
    let (status, json) = post_json(
        "/api/search",
        json!({"identifiers": ["6RP702264"], "style": {"fill_color": "green"}}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["detail"].as_str().is_some());
}

#[tokio::test]
async fn test_search_without_identifiers_is_400() {
    let (status, _) = post_json("/api/search", json!({"identifiers": ["", "  "]})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
