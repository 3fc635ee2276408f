use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    Json, Router,
};
use meetups_cal::{
    model::TimeRange,
    search::{AlgoliaClient, MeetupSource, SearchError},
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
struct Recorded {
    path: String,
    app_id: Option<String>,
    api_key: Option<String>,
    body: Value,
}

#[derive(Clone)]
struct Stub {
    status: StatusCode,
    reply: Value,
    seen: Arc<Mutex<Vec<Recorded>>>,
}

async fn answer(
    State(stub): State<Stub>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    stub.seen.lock().unwrap().push(Recorded {
        path: uri.path().to_string(),
        app_id: header("x-algolia-application-id"),
        api_key: header("x-algolia-api-key"),
        body,
    });
    (stub.status, Json(stub.reply.clone()))
}

/// Serves `reply` with `status` for every request and returns the base URL.
async fn serve(status: StatusCode, reply: Value) -> (String, Arc<Mutex<Vec<Recorded>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let stub = Stub {
        status,
        reply,
        seen: Arc::clone(&seen),
    };
    let router = Router::new().fallback(answer).with_state(stub);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{}/", addr), seen)
}

const MARCH_2024: TimeRange = TimeRange {
    start_unix: 1709247600,
    end_unix: 1711922399,
};

#[tokio::test]
async fn lists_meetups_for_a_month() {
    let (base, seen) = serve(
        StatusCode::OK,
        json!({
            "results": [{
                "hits": [
                    {
                        "objectID": "rust-paris",
                        "name": "Rust Paris",
                        "startDate": 1709310600,
                        "url": "https://example.org/rust-paris",
                        "pictureMain": { "url": "https://example.org/p.jpg" },
                        "_highlightResult": {}
                    },
                    { "objectID": "no-date", "name": "Undated" }
                ],
                "nbHits": 2
            }]
        }),
    )
    .await;

    let client = AlgoliaClient::new("APPID", "search-key")
        .with_base_url(base)
        .with_index("meetups_test");
    let hits = client.fetch_meetups(MARCH_2024).await.unwrap();

    let ids: Vec<&str> = hits.iter().map(|h| h.object_id.as_str()).collect();
    assert_eq!(ids, vec!["rust-paris", "no-date"]);
    assert_eq!(hits[0].start_date, Some(1709310600));
    assert_eq!(hits[0].picture_url(), Some("https://example.org/p.jpg"));
    assert_eq!(hits[1].start_date, None);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let request = &seen[0];
    assert_eq!(request.path, "/1/indexes/*/queries");
    assert_eq!(request.app_id.as_deref(), Some("APPID"));
    assert_eq!(request.api_key.as_deref(), Some("search-key"));
    assert_eq!(
        request.body,
        json!({
            "requests": [{
                "indexName": "meetups_test",
                "query": "",
                "filters": "startDate >= 1709247600 AND startDate <= 1711922399",
                "hitsPerPage": 100
            }]
        })
    );
}

#[tokio::test]
async fn error_status_is_reported_with_its_message() {
    let (base, _) = serve(
        StatusCode::FORBIDDEN,
        json!({ "message": "Invalid Application-ID or API key", "status": 403 }),
    )
    .await;

    let client = AlgoliaClient::new("APPID", "wrong").with_base_url(base);
    match client.fetch_meetups(MARCH_2024).await {
        Err(SearchError::Status { status, message }) => {
            assert_eq!(status, 403);
            assert_eq!(message, "Invalid Application-ID or API key");
        }
        other => panic!("expected a status error, got {:?}", other.map(|h| h.len())),
    }
}

#[tokio::test]
async fn empty_results_are_an_error() {
    let (base, _) = serve(StatusCode::OK, json!({ "results": [] })).await;

    let client = AlgoliaClient::new("APPID", "key").with_base_url(base);
    assert!(matches!(
        client.fetch_meetups(MARCH_2024).await,
        Err(SearchError::MissingResult)
    ));
}

#[tokio::test]
async fn unreachable_service_is_an_http_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = AlgoliaClient::new("APPID", "key").with_base_url(format!("http://{}", addr));
    assert!(matches!(
        client.fetch_meetups(MARCH_2024).await,
        Err(SearchError::Http(_))
    ));
}
