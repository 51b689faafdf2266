use std::time::{Duration, Instant};

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::header::CACHE_CONTROL;
use axum::http::{Request, StatusCode};
use dex_relay::{RelayConfig, RelayState, relay_router};
use httpmock::Method::GET;
use httpmock::MockServer;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tower::ServiceExt;

fn app(server: &MockServer) -> Router {
    let config = RelayConfig {
        upstream_url: server.base_url(),
        ..Default::default()
    };
    relay_router(RelayState::new(config).unwrap())
}

async fn get(app: Router, uri: &str) -> (StatusCode, Option<String>, Value) {
    let response = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let cache_control = response
        .headers()
        .get(CACHE_CONTROL)
        .map(|value| value.to_str().unwrap().to_string());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, cache_control, body)
}

fn pikachu() -> Value {
    json!({
        "id": 25,
        "name": "pikachu",
        "height": 4,
        "weight": 60,
        "types": [{ "slot": 1, "type": { "name": "electric", "url": "" } }],
    })
}

#[tokio::test]
async fn list_forwards_pagination_and_caches_for_an_hour() {
    let server = MockServer::start_async().await;
    let body = json!({
        "count": 1302,
        "next": "https://pokeapi.co/api/v2/pokemon?offset=80&limit=20",
        "previous": null,
        "results": [{ "name": "bulbasaur", "url": "https://pokeapi.co/api/v2/pokemon/1/" }],
    });
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/pokemon")
            .query_param("offset", "60")
            .query_param("limit", "20");
        then.status(200).json_body(body.clone());
    });

    let (status, cache, received) = get(app(&server), "/api/pokemon?offset=60&limit=20").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache.as_deref(), Some("public, max-age=3600"));
    assert_eq!(received, body);
    mock.assert();
}

#[tokio::test]
async fn list_defaults_pagination() {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.path("/pokemon")
            .query_param("offset", "0")
            .query_param("limit", "20");
        then.status(200)
            .json_body(json!({ "count": 0, "next": null, "previous": null, "results": [] }));
    });

    let (status, _, _) = get(app(&server), "/api/pokemon").await;

    assert_eq!(status, StatusCode::OK);
    mock.assert();
}

#[tokio::test]
async fn list_rejects_invalid_pagination() {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.path("/pokemon");
        then.status(200);
    });

    let (status, cache, body) = get(app(&server), "/api/pokemon?offset=-5").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(cache, None);
    assert_eq!(body, json!({ "error": "Invalid pagination parameters" }));
    mock.assert_hits(0);
}

#[tokio::test]
async fn list_upstream_failure_is_normalized() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.path("/pokemon");
        then.status(503).body("maintenance");
    });

    let (status, cache, body) = get(app(&server), "/api/pokemon").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(cache, None);
    assert_eq!(body, json!({ "error": "Failed to fetch Pokemon list" }));
}

#[tokio::test]
async fn detail_lowercases_identifier() {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.path("/pokemon/pikachu");
        then.status(200).json_body(pikachu());
    });

    let (status, cache, body) = get(app(&server), "/api/pokemon/Pikachu").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache.as_deref(), Some("public, max-age=3600"));
    assert_eq!(body, pikachu());
    mock.assert();
}

#[tokio::test]
async fn detail_not_found() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.path("/pokemon/missingno");
        then.status(404).body("Not Found");
    });

    let (status, _, body) = get(app(&server), "/api/pokemon/missingno").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Pokemon not found" }));
}

#[tokio::test]
async fn detail_upstream_failure() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.path("/pokemon/25");
        then.status(500);
    });

    let (status, _, body) = get(app(&server), "/api/pokemon/25").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to fetch Pokemon" }));
}

#[tokio::test]
async fn detail_rejects_invalid_identifier() {
    let server = MockServer::start_async().await;

    for uri in ["/api/pokemon/0", "/api/pokemon/mr.mime", "/api/pokemon/%20"] {
        let (status, _, body) = get(app(&server), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body, json!({ "error": "Invalid Pokemon ID" }), "{uri}");
    }
}

#[tokio::test]
async fn types_are_cached_for_a_day() {
    let server = MockServer::start_async().await;
    let body = json!({
        "count": 2,
        "next": null,
        "previous": null,
        "results": [
            { "name": "normal", "url": "https://pokeapi.co/api/v2/type/1/" },
            { "name": "fire", "url": "https://pokeapi.co/api/v2/type/10/" },
        ],
    });
    let mock = server.mock(|when, then| {
        when.path("/type");
        then.status(200).json_body(body.clone());
    });

    let (status, cache, received) = get(app(&server), "/api/pokemon/types").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache.as_deref(), Some("public, max-age=86400"));
    assert_eq!(received, body);
    mock.assert();
}

#[tokio::test]
async fn types_upstream_failure() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.path("/type");
        then.status(502);
    });

    let (status, _, body) = get(app(&server), "/api/pokemon/types").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to fetch Pokemon types" }));
}

#[tokio::test]
async fn search_exact_match() {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.path("/pokemon/pikachu");
        then.status(200).json_body(pikachu());
    });

    let (status, cache, body) = get(app(&server), "/api/pokemon/search?q=PIKACHU").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache.as_deref(), Some("public, max-age=3600"));
    assert_eq!(body, json!({ "results": [pikachu()], "type": "exact" }));
    mock.assert();
}

#[tokio::test]
async fn search_without_exact_match_is_partial() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.path("/pokemon/pika");
        then.status(404);
    });

    let (status, _, body) = get(app(&server), "/api/pokemon/search?q=pika").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "results": [], "type": "partial" }));
}

#[tokio::test]
async fn search_requires_query() {
    let server = MockServer::start_async().await;

    for uri in ["/api/pokemon/search", "/api/pokemon/search?q="] {
        let (status, _, body) = get(app(&server), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body, json!({ "error": "Search query is required" }), "{uri}");
    }
}

#[tokio::test]
async fn unknown_route_is_enveloped() {
    let server = MockServer::start_async().await;

    let (status, _, body) = get(app(&server), "/api/berries").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "not found: /api/berries" }));
}

#[tokio::test]
async fn concurrency_limit_is_shared_across_routes() {
    let server = MockServer::start_async().await;
    let delay = Duration::from_millis(300);
    server.mock(|when, then| {
        when.path("/pokemon");
        then.status(200)
            .delay(delay)
            .json_body(json!({ "count": 0, "next": null, "previous": null, "results": [] }));
    });
    server.mock(|when, then| {
        when.path("/type");
        then.status(200)
            .delay(delay)
            .json_body(json!({ "count": 0, "next": null, "previous": null, "results": [] }));
    });
    let config = RelayConfig {
        upstream_url: server.base_url(),
        concurrency_limit: Some(1),
        ..Default::default()
    };
    let app = relay_router(RelayState::new(config).unwrap());

    let start = Instant::now();
    let (list, types) = tokio::join!(
        get(app.clone(), "/api/pokemon"),
        get(app, "/api/pokemon/types")
    );
    let elapsed = start.elapsed();

    assert_eq!(list.0, StatusCode::OK);
    assert_eq!(types.0, StatusCode::OK);
    assert!(
        elapsed >= delay * 2,
        "requests on different routes ran in parallel: {elapsed:?}"
    );
}
