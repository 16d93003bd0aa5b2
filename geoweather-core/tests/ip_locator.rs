//! IP geolocation source against a mock server.

use geoweather_core::{
    Coordinates, LocationError, LocationFetcher, Priority,
    location::{ConfiguredLocation, IpLocator},
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn server_with(status: u16, body: serde_json::Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/"))
        .and(query_param("fields", "status,message,lat,lon"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(&server)
        .await;
    server
}

fn locator(server: &MockServer) -> IpLocator {
    IpLocator::new(&format!("{}/json/", server.uri())).expect("client")
}

#[tokio::test]
async fn resolves_coordinates() {
    let server = server_with(
        200,
        serde_json::json!({"status": "success", "lat": 52.52, "lon": 13.405}),
    )
    .await;

    let fix = locator(&server).request_fix(Priority::HighAccuracy).await.expect("fix");
    assert_eq!(fix, Coordinates::new(52.52, 13.405));
}

#[tokio::test]
async fn reports_lookup_failure_message() {
    let server = server_with(
        200,
        serde_json::json!({"status": "fail", "message": "private range"}),
    )
    .await;

    let err = locator(&server).request_fix(Priority::HighAccuracy).await.unwrap_err();
    match err {
        LocationError::Lookup(msg) => assert_eq!(msg, "private range"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn non_success_status_is_lookup_error() {
    let server = server_with(503, serde_json::json!({})).await;

    let err = locator(&server).request_fix(Priority::HighAccuracy).await.unwrap_err();
    assert!(matches!(err, LocationError::Lookup(_)));
}

#[tokio::test]
async fn falls_back_to_fixed_coordinates() {
    let server = server_with(500, serde_json::json!({})).await;
    let fixed = Coordinates::new(1.5, 2.5);
    let loc = ConfiguredLocation::new(Some(fixed), Some(locator(&server)));

    let fix = loc.request_fix(Priority::LowPower).await.expect("fallback");
    assert_eq!(fix, fixed);
}

#[tokio::test]
async fn low_power_prefers_network_source() {
    let server = server_with(
        200,
        serde_json::json!({"status": "success", "lat": 10.0, "lon": 20.0}),
    )
    .await;
    let loc = ConfiguredLocation::new(Some(Coordinates::new(1.5, 2.5)), Some(locator(&server)));

    let fix = loc.request_fix(Priority::LowPower).await.expect("fix");
    assert_eq!(fix, Coordinates::new(10.0, 20.0));
}
