//! API integration tests for tile retrieval, metadata and error handling.
//!
//! Tests verify:
//! - Tiles are served byte-for-byte with gzip and cache headers
//! - XYZ requests find rows stored in TMS orientation
//! - Coordinate validation (zoom and grid bounds)
//! - Missing tiles vs archive faults
//! - Stats and TileJSON synthesis, including fallbacks

use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use tower::ServiceExt;

use vector_tile_server::tile::{TileService, FALLBACK_BOUNDS};
use vector_tile_server::RouterConfig;

use super::test_utils::{
    body_bytes, body_json, fake_tile, get, get_with_headers, FaultyStore, Fixture, XyzTile,
};

fn berlin_metadata() -> Vec<(&'static str, &'static str)> {
    vec![
        ("name", "Berlin"),
        ("format", "pbf"),
        ("bounds", "13.0,52.0,14.0,53.0"),
        ("center", "13.4,52.5,12"),
        ("minzoom", "2"),
        ("maxzoom", "14"),
    ]
}

// =============================================================================
// Tile Retrieval
// =============================================================================

#[tokio::test]
async fn test_tile_retrieval_success() {
    let payload = fake_tile("14/8800/5373");
    let fixture = Fixture::new(
        &berlin_metadata(),
        &[XyzTile::new(14, 8800, 5373, payload.clone())],
    )
    .await;
    let router = fixture.router().await;

    let response = get(router, "/tiles/14/8800/5373.mvt").await;

    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(headers.get("content-type").unwrap(), "application/x-protobuf");
    assert_eq!(headers.get("content-encoding").unwrap(), "gzip");
    assert_eq!(headers.get("cache-control").unwrap(), "public, max-age=900");
    assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");

    // Payload is delivered exactly as stored
    let body = body_bytes(response).await;
    assert_eq!(&body[..], &payload[..]);
}

#[tokio::test]
async fn test_tile_retrieval_without_extension() {
    let payload = fake_tile("1/0/0");
    let fixture = Fixture::new(&[], &[XyzTile::new(1, 0, 0, payload.clone())]).await;
    let router = fixture.router().await;

    let response = get(router, "/tiles/1/0/0").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(&body_bytes(response).await[..], &payload[..]);
}

#[tokio::test]
async fn test_xyz_row_is_flipped() {
    // At z=2 the northern row y=0 is stored at TMS row 3
    let fixture = Fixture::new(
        &[],
        &[
            XyzTile::new(2, 1, 0, fake_tile("north")),
            XyzTile::new(2, 1, 3, fake_tile("south")),
        ],
    )
    .await;
    let router = fixture.router().await;

    let north = body_bytes(get(router.clone(), "/tiles/2/1/0.mvt").await).await;
    let south = body_bytes(get(router, "/tiles/2/1/3.mvt").await).await;

    assert_eq!(&north[..], &fake_tile("north")[..]);
    assert_eq!(&south[..], &fake_tile("south")[..]);
}

#[tokio::test]
async fn test_zoom_zero_single_tile() {
    let fixture = Fixture::new(&[], &[XyzTile::new(0, 0, 0, fake_tile("world"))]).await;
    let router = fixture.router().await;

    let response = get(router.clone(), "/tiles/0/0/0.mvt").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(router, "/tiles/0/1/0.mvt").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_tile_not_found_has_empty_body() {
    let fixture = Fixture::new(&[], &[]).await;
    let router = fixture.router().await;

    let response = get(router, "/tiles/5/3/7.mvt").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_bytes(response).await.is_empty());
}

// =============================================================================
// Coordinate Validation
// =============================================================================

#[tokio::test]
async fn test_invalid_zoom() {
    let fixture = Fixture::new(&[], &[]).await;
    let router = fixture.router().await;

    for uri in ["/tiles/-1/0/0.mvt", "/tiles/19/0/0.mvt"] {
        let response = get(router.clone(), uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);

        let json = body_json(response).await;
        assert_eq!(json["error"], "invalid_zoom");
        assert_eq!(json["status"], 400);
    }
}

#[tokio::test]
async fn test_max_zoom_accepted() {
    let fixture = Fixture::new(&[], &[]).await;
    let router = fixture.router().await;

    // z=18 is in range; the tile simply is not stored
    let response = get(router, "/tiles/18/262143/0.mvt").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_coordinate_out_of_grid() {
    let fixture = Fixture::new(&[], &[]).await;
    let router = fixture.router().await;

    for uri in ["/tiles/3/8/0.mvt", "/tiles/3/0/8.mvt", "/tiles/3/-1/0.mvt"] {
        let response = get(router.clone(), uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);

        let json = body_json(response).await;
        assert_eq!(json["error"], "invalid_coordinates");
    }
}

#[tokio::test]
async fn test_non_integer_coordinates() {
    let fixture = Fixture::new(&[], &[]).await;
    let router = fixture.router().await;

    for uri in ["/tiles/a/0/0.mvt", "/tiles/3/x/0.mvt", "/tiles/3/0/y.mvt"] {
        let response = get(router.clone(), uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
    }
}

// =============================================================================
// Archive Faults
// =============================================================================

#[tokio::test]
async fn test_archive_fault_is_server_error() {
    let fixture = Fixture::empty();
    let router = fixture.router_for(
        TileService::new(FaultyStore::failing()),
        RouterConfig::default().with_tracing(false),
    );

    let response = get(router, "/tiles/3/1/1.mvt").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["error"], "internal_error");
    // Fault detail stays in the logs
    assert_eq!(json["message"], "Internal server error");
}

#[tokio::test]
async fn test_archive_without_tiles_table_is_server_error() {
    let fixture = Fixture::empty();
    super::test_utils::write_mbtiles(&fixture.mbtiles, &[("name", "broken")], &[], false).await;
    let router = fixture.router().await;

    let response = get(router, "/tiles/3/1/1.mvt").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_archive_read_timeout_is_server_error() {
    let fixture = Fixture::empty();
    let service = TileService::new(FaultyStore::hanging(Duration::from_secs(5)))
        .with_read_timeout(Duration::from_millis(20));
    let router = fixture.router_for(service, RouterConfig::default().with_tracing(false));

    let response = get(router, "/tiles/3/1/1.mvt").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// =============================================================================
// Stats and TileJSON
// =============================================================================

#[tokio::test]
async fn test_tile_stats() {
    let fixture = Fixture::new(&berlin_metadata(), &[]).await;
    let router = fixture.router().await;

    for uri in ["/tiles/stats/", "/tiles/stats"] {
        let response = get(router.clone(), uri).await;
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);

        let json = body_json(response).await;
        assert_eq!(json["metadata"]["name"], "Berlin");
        assert_eq!(json["metadata"]["format"], "pbf");
        assert_eq!(json["bounds"], serde_json::json!([13.0, 52.0, 14.0, 53.0]));
        assert_eq!(json["minzoom"], 2);
        assert_eq!(json["maxzoom"], 14);
    }
}

#[tokio::test]
async fn test_tile_stats_degrade_on_fault() {
    let fixture = Fixture::empty();
    let router = fixture.router_for(
        TileService::new(FaultyStore::failing()),
        RouterConfig::default().with_tracing(false),
    );

    let response = get(router, "/tiles/stats/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["metadata"], serde_json::json!({}));
    assert!(json["bounds"].is_null());
    assert_eq!(json["minzoom"], 0);
    assert_eq!(json["maxzoom"], 14);
}

#[tokio::test]
async fn test_tilejson_from_metadata() {
    let fixture = Fixture::new(&berlin_metadata(), &[]).await;
    let router = fixture.router().await;

    let response = get_with_headers(
        router,
        "/tiles/metadata.json",
        &[("host", "maps.example.com")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["tilejson"], "3.0.0");
    assert_eq!(json["name"], "Berlin");
    assert_eq!(json["scheme"], "xyz");
    assert_eq!(
        json["tiles"][0],
        "http://maps.example.com/tiles/{z}/{x}/{y}.mvt"
    );
    assert_eq!(json["center"], serde_json::json!([13.4, 52.5, 12.0]));
    assert_eq!(json["minzoom"], 2);
    assert_eq!(json["vector_layers"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_tilejson_fallbacks() {
    let fixture = Fixture::new(&[], &[]).await;
    let router = fixture.router().await;

    let json = body_json(get(router, "/tiles/metadata.json").await).await;

    assert_eq!(json["name"], "Local OSM Vector Tiles");
    assert_eq!(json["attribution"], "© OpenStreetMap contributors");
    assert_eq!(json["bounds"], serde_json::json!(FALLBACK_BOUNDS));
    assert_eq!(
        json["center"],
        serde_json::json!([
            (FALLBACK_BOUNDS[0] + FALLBACK_BOUNDS[2]) / 2.0,
            (FALLBACK_BOUNDS[1] + FALLBACK_BOUNDS[3]) / 2.0,
            10.0
        ])
    );
    assert_eq!(json["minzoom"], 0);
    assert_eq!(json["maxzoom"], 14);
}

#[tokio::test]
async fn test_tilejson_respects_forwarded_proto() {
    let fixture = Fixture::new(&[], &[]).await;
    let router = fixture.router().await;

    let response = get_with_headers(
        router,
        "/tiles/metadata.json",
        &[("host", "tiles.example.com"), ("x-forwarded-proto", "https")],
    )
    .await;

    let json = body_json(response).await;
    assert_eq!(
        json["tiles"][0],
        "https://tiles.example.com/tiles/{z}/{x}/{y}.mvt"
    );
}

#[tokio::test]
async fn test_tilejson_uses_public_url() {
    let fixture = Fixture::new(&[], &[]).await;
    let router = fixture
        .router_with(
            RouterConfig::default()
                .with_tracing(false)
                .with_public_url("https://cdn.example.org"),
        )
        .await;

    let response = get_with_headers(router, "/tiles/metadata.json", &[("host", "ignored")]).await;

    let json = body_json(response).await;
    assert_eq!(
        json["tiles"][0],
        "https://cdn.example.org/tiles/{z}/{x}/{y}.mvt"
    );
}

// =============================================================================
// Health and Preflight
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = Fixture::new(&[], &[]).await;
    let router = fixture.router().await;

    let response = get(router, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert!(json["version"].is_string());
}

/// Send a CORS preflight for a GET request.
async fn preflight(router: axum::Router, uri: &str) -> axum::http::Response<Body> {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri(uri)
        .header("origin", "https://maps.example.com")
        .header("access-control-request-method", "GET")
        .header("access-control-request-headers", "content-type")
        .body(Body::empty())
        .unwrap();
    router.oneshot(request).await.unwrap()
}

#[tokio::test]
async fn test_tile_preflight() {
    let fixture = Fixture::new(&[], &[]).await;
    let router = fixture.router().await;

    let response = preflight(router, "/tiles/3/1/1.mvt").await;

    assert!(response.status().is_success());
    let headers = response.headers();
    assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
    let methods = headers
        .get("access-control-allow-methods")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(methods.contains("GET"));
    assert!(methods.contains("OPTIONS"));
    assert!(headers
        .get("access-control-allow-headers")
        .unwrap()
        .to_str()
        .unwrap()
        .eq_ignore_ascii_case("content-type"));
    assert_eq!(headers.get("access-control-max-age").unwrap(), "86400");
    assert!(headers.get("vary").is_some());
}

#[tokio::test]
async fn test_preflight_on_every_route() {
    let fixture = Fixture::new(&[], &[]).await;
    let router = fixture.router().await;

    for uri in [
        "/tiles/metadata.json",
        "/tiles/stats/",
        "/fonts/",
        "/fonts/Noto%20Sans%20Regular/0-255.pbf",
        "/styles/",
        "/styles/osm-bright-local.json",
    ] {
        let response = preflight(router.clone(), uri).await;
        assert!(response.status().is_success(), "{}", uri);
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*",
            "{}",
            uri
        );
    }
}

#[tokio::test]
async fn test_cross_origin_get_has_single_allow_origin() {
    let tiles = [XyzTile::new(1, 0, 0, fake_tile("a"))];
    let fixture = Fixture::new(&[], &tiles).await;
    let router = fixture.router().await;

    let response = get_with_headers(
        router,
        "/tiles/1/0/0.mvt",
        &[("origin", "https://maps.example.com")],
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let origins: Vec<_> = response
        .headers()
        .get_all("access-control-allow-origin")
        .iter()
        .collect();
    assert_eq!(origins, vec!["*"]);
    assert_eq!(
        response.headers().get("access-control-allow-methods").unwrap(),
        "GET, OPTIONS"
    );
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn test_concurrent_tile_reads() {
    let tiles: Vec<XyzTile> = (0..4u32)
        .flat_map(|x| (0..4u32).map(move |y| XyzTile::new(2, x, y, fake_tile(&format!("{}/{}", x, y)))))
        .collect();
    let fixture = Fixture::new(&[], &tiles).await;
    let router = fixture.router().await;

    let mut handles = Vec::new();
    for round in 0..4u32 {
        for x in 0..4u32 {
            for y in 0..4u32 {
                let router = router.clone();
                handles.push(tokio::spawn(async move {
                    let uri = format!("/tiles/2/{}/{}.mvt", x, y);
                    let response = get(router, &uri).await;
                    (round, x, y, response.status(), body_bytes(response).await)
                }));
            }
        }
    }

    for handle in handles {
        let (_, x, y, status, body) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], &fake_tile(&format!("{}/{}", x, y))[..]);
    }
}
