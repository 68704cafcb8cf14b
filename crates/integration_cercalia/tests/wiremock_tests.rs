//! Integration tests for the Cercalia client (wiremock-based)

use std::time::Duration;

use domain::Coordinate;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use integration_cercalia::{
    CercaliaClient, CercaliaConfig, CercaliaError, GeocodingOptions, ReverseGeocodeLevel,
    RouteOptions, RouteWeight, StaticMapOptions, SuggestOptions,
};

fn client_for_mock(server: &MockServer) -> CercaliaClient {
    CercaliaClient::new(CercaliaConfig::for_testing(&server.uri())).unwrap()
}

const fn sample_candidates_json() -> &'static str {
    r#"{
        "cercalia": {
            "version": "1.0",
            "candidates": {
                "@num": "1",
                "candidate": {
                    "@id": "1",
                    "@desc": "Barcelona",
                    "@sc": "100",
                    "ge": {
                        "@id": "0801910001",
                        "@name": "Barcelona",
                        "@type": "ct",
                        "municipality": { "@id": "0801910", "value": "Barcelona" },
                        "country": { "@id": "ESP", "value": "España" },
                        "coord": { "@x": "2.1734", "@y": "41.3851" }
                    }
                }
            }
        }
    }"#
}

const fn sample_route_json() -> &'static str {
    r#"{
        "cercalia": {
            "route": {
                "@id": "r1",
                "@dist": "621.5",
                "@duration": "05:54:30",
                "@time": "21270"
            }
        }
    }"#
}

#[tokio::test]
async fn test_geocode_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("cmd", "cand"))
        .and(query_param("key", "test-key"))
        .and(query_param("ctn", "Barcelona"))
        .and(query_param("ctc", "ESP"))
        .and(query_param("srs", "EPSG:4326"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sample_candidates_json()))
        .expect(1)
        .mount(&server)
        .await;

    let candidates = client_for_mock(&server)
        .geocoding()
        .geocode(&GeocodingOptions::locality("Barcelona"))
        .await
        .unwrap();

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].coordinate, Coordinate::new(41.3851, 2.1734));
    assert_eq!(candidates[0].element.id.as_deref(), Some("0801910001"));
    let municipality = candidates[0].element.municipality.as_ref().unwrap();
    assert_eq!(municipality.code.as_deref(), Some("0801910"));
}

#[tokio::test]
async fn test_no_results_sentinel_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("cmd", "cand"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"cercalia": {"error": {"@id": "30006", "value": "No candidates found"}}}"#,
        ))
        .mount(&server)
        .await;

    let candidates = client_for_mock(&server)
        .geocoding()
        .geocode(&GeocodingOptions::locality("Nowhere"))
        .await
        .unwrap();

    assert!(candidates.is_empty());
}

#[tokio::test]
async fn test_route_sends_waypoints_and_weight() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("cmd", "route"))
        .and(query_param("mo_o", "41.3851,2.1734"))
        .and(query_param("mo_d", "40.4168,-3.7038"))
        .and(query_param("mo_1", "41.6488,-0.8891"))
        .and(query_param("weight", "distance"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sample_route_json()))
        .expect(1)
        .mount(&server)
        .await;

    let options = RouteOptions {
        waypoints: vec![Coordinate::new(41.6488, -0.8891)],
        weight: RouteWeight::Distance,
        ..RouteOptions::default()
    };
    let route = client_for_mock(&server)
        .routing()
        .route(
            Coordinate::new(41.3851, 2.1734),
            Coordinate::new(40.4168, -3.7038),
            &options,
        )
        .await
        .unwrap();

    assert!((route.distance_m - 621_500.0).abs() < 1e-6);
    assert_eq!(route.duration_secs, 21_270);
    assert_eq!(route.weight, RouteWeight::Distance);
}

#[tokio::test]
async fn test_vendor_error_in_success_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"cercalia": {"error": {"@id": "50001", "value": "Invalid key"}}}"#,
        ))
        .mount(&server)
        .await;

    let err = client_for_mock(&server)
        .routing()
        .route(
            Coordinate::new(41.3851, 2.1734),
            Coordinate::new(40.4168, -3.7038),
            &RouteOptions::default(),
        )
        .await
        .unwrap_err();

    match err {
        CercaliaError::Vendor {
            operation,
            code,
            message,
        } => {
            assert_eq!(operation, "route");
            assert_eq!(code, "50001");
            assert_eq!(message, "Invalid key");
        },
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_route_no_results_propagates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"cercalia": {"error": {"@id": "30006", "value": "No route"}}}"#,
        ))
        .mount(&server)
        .await;

    let err = client_for_mock(&server)
        .routing()
        .route(
            Coordinate::new(41.3851, 2.1734),
            Coordinate::new(28.1, -15.4),
            &RouteOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(err.is_no_results());
}

#[tokio::test]
async fn test_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let err = client_for_mock(&server)
        .reverse_geocoding()
        .reverse_geocode(Coordinate::new(41.3851, 2.1734), ReverseGeocodeLevel::Address)
        .await
        .unwrap_err();

    assert!(matches!(err, CercaliaError::RequestFailed(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_rate_limit_with_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "30"))
        .mount(&server)
        .await;

    let err = client_for_mock(&server)
        .geocoding()
        .geocode(&GeocodingOptions::locality("Barcelona"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CercaliaError::RateLimitExceeded {
            retry_after_secs: Some(30)
        }
    ));
}

#[tokio::test]
async fn test_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client_for_mock(&server)
        .geocoding()
        .geocode(&GeocodingOptions::locality("Barcelona"))
        .await
        .unwrap_err();

    assert!(matches!(err, CercaliaError::AuthenticationFailed(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_invalid_json() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let err = client_for_mock(&server)
        .geocoding()
        .geocode(&GeocodingOptions::locality("Barcelona"))
        .await
        .unwrap_err();

    assert!(matches!(err, CercaliaError::ParseError(_)));
    assert!(!err.to_string().contains("test-key"), "{err}");
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(sample_route_json())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = CercaliaConfig {
        timeout_secs: 1,
        ..CercaliaConfig::for_testing(&server.uri())
    };
    let err = CercaliaClient::new(config)
        .unwrap()
        .routing()
        .route(
            Coordinate::new(41.3851, 2.1734),
            Coordinate::new(40.4168, -3.7038),
            &RouteOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CercaliaError::Timeout { timeout_secs: 1 }), "{err:?}");
    assert!(!err.to_string().contains("test-key"));
}

#[tokio::test]
async fn test_static_map_reissues_with_candidate() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("cmd", "map"))
        .and(query_param("ctn", "Barcelona"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"cercalia": {"candidates": {"candidate": [
                {"@id": "1", "ge": {"@id": "0801910", "@name": "Barcelona", "@type": "mun"}},
                {"@id": "2", "ge": {"@id": "08", "@name": "Barcelona", "@type": "subreg"}}
            ]}}}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let image_url = format!("{}/maps/abc.png", server.uri());
    let map_body = format!(
        r#"{{"cercalia": {{"map": {{
            "@width": "400", "@height": "300",
            "img": {{"@href": "{image_url}"}}
        }}}}}}"#
    );
    Mock::given(method("GET"))
        .and(query_param("cmd", "map"))
        .and(query_param("munid", "0801910"))
        .respond_with(ResponseTemplate::new(200).set_body_string(map_body))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/maps/abc.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, b'P', b'N', b'G']))
        .expect(1)
        .mount(&server)
        .await;

    let maps = client_for_mock(&server).static_maps();
    let map = maps
        .generate(&StaticMapOptions {
            locality: Some("Barcelona".to_string()),
            width: Some(400),
            height: Some(300),
            ..StaticMapOptions::default()
        })
        .await
        .unwrap();

    assert_eq!(map.image_url, image_url);
    assert_eq!(map.width, Some(400));

    let image = maps.fetch_image(&map).await.unwrap();
    assert_eq!(&image[..], &[0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn test_suggest_uses_servlet_path() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/suggest/SuggestServlet"))
        .and(query_param("key", "test-key"))
        .and(query_param("t", "Balm"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"suggestions": [
                {
                    "id": "st-1", "type": "street", "desc": "Carrer de Balmes, Barcelona",
                    "street": {"code": "0801910001001", "name": "Balmes"},
                    "city": {"code": "0801910001", "name": "Barcelona"},
                    "coord": {"x": 2.1618, "y": 41.3889}
                }
            ]}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let suggestions = client_for_mock(&server)
        .suggest()
        .suggest(&SuggestOptions::new("Balm"))
        .await
        .unwrap();

    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].description, "Carrer de Balmes, Barcelona");
    assert_eq!(suggestions[0].coordinate, Some(Coordinate::new(41.3889, 2.1618)));
}

#[tokio::test]
async fn test_batch_reverse_geocode_keeps_input_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("cmd", "prox"))
        .and(query_param("molist", "[41.3851,2.1734|1],[40.4168,-3.7038|2]"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"cercalia": {"proximity": {"molist": {"mo": [
                {"@id": "2", "ge": {"@id": "m2", "@name": "Madrid", "@type": "mun"}},
                {"@id": "1", "ge": {"@id": "m1", "@name": "Barcelona", "@type": "mun"}}
            ]}}}}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let results = client_for_mock(&server)
        .reverse_geocoding()
        .reverse_geocode_batch(
            &[
                Coordinate::new(41.3851, 2.1734),
                Coordinate::new(40.4168, -3.7038),
            ],
            ReverseGeocodeLevel::Municipality,
        )
        .await
        .unwrap();

    let names: Vec<Option<&str>> = results
        .iter()
        .map(|r| r.result.as_ref().and_then(|g| g.element.name.as_deref()))
        .collect();
    assert_eq!(names, vec![Some("Barcelona"), Some("Madrid")]);
}
