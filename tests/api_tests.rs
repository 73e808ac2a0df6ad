use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::Value;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use movie_recommender_api::{
    api::{create_router, ApiSettings, AppState},
    corpus::{Corpus, FeatureMatrix, MetadataTable, TitleIndex},
    models::{EnrichmentRecord, MetadataRecord},
    services::{EnrichmentError, EnrichmentFanout, EnrichmentSource},
};

const CORPUS_SIZE: usize = 45;

/// Counts outward calls and enriches every title with a poster
struct CountingSource {
    calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl EnrichmentSource for CountingSource {
    async fn lookup(&self, title: &str) -> Result<Option<EnrichmentRecord>, EnrichmentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(EnrichmentRecord {
            poster_url: Some(format!("https://img.test/{}.jpg", title.replace(' ', "_"))),
            ..Default::default()
        }))
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

/// Always fails, like an unreachable remote
struct FailingSource;

#[async_trait::async_trait]
impl EnrichmentSource for FailingSource {
    async fn lookup(&self, _title: &str) -> Result<Option<EnrichmentRecord>, EnrichmentError> {
        Err(EnrichmentError::Status(502))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

fn movie_title(i: usize) -> String {
    format!("Movie {:02}", i)
}

/// 45 movies sharing overlapping genre/keyword features
fn test_corpus() -> Corpus {
    let rows = (0..CORPUS_SIZE)
        .map(|i| {
            vec![
                (i % 9, 1.0),
                (9 + i / 9, 0.5 + i as f64 * 0.01),
                (14 + i % 5, 0.3),
            ]
        })
        .collect();
    let matrix = FeatureMatrix::from_rows(19, rows).unwrap();

    let metadata = MetadataTable::new(
        (0..CORPUS_SIZE)
            .map(|i| MetadataRecord {
                title: movie_title(i),
                overview: Some(format!("Local overview {}", i)),
                genres: Some("Drama".to_string()),
                tagline: None,
                original_language: Some("en".to_string()),
                vote_average: Some(6.0 + (i % 4) as f64 * 0.5),
                popularity: Some(i as f64),
            })
            .collect(),
    );
    let titles = TitleIndex::from_metadata(&metadata);

    Corpus::from_parts(matrix, metadata, titles).unwrap()
}

fn create_test_server(source: Option<Arc<dyn EnrichmentSource>>) -> TestServer {
    let enrichment =
        source.map(|source| EnrichmentFanout::new(source, Duration::from_secs(2), 4));
    let state = AppState::new(Arc::new(test_corpus()), enrichment, ApiSettings::default());
    TestServer::new(create_router(state)).unwrap()
}

fn recommendations(body: &Value) -> &Vec<Value> {
    body["recommendations"].as_array().unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server(None);
    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "online");
    assert_eq!(body["database_size"], CORPUS_SIZE);
    assert_eq!(body["similarity_mode"], "on_demand");
    assert_eq!(body["enrichment_enabled"], false);
}

#[tokio::test]
async fn test_root_is_health() {
    let server = create_test_server(None);
    let response = server.get("/").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["database_size"], CORPUS_SIZE);
}

#[tokio::test]
async fn test_unknown_title_returns_not_found_payload() {
    let calls = Arc::new(AtomicUsize::new(0));
    let server = create_test_server(Some(Arc::new(CountingSource {
        calls: calls.clone(),
    })));

    let response = server.get("/recommend/Nonexistent%20Film").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["error"], "Movie not found");
    assert!(recommendations(&body).is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_returns_ten_ranked_recommendations() {
    let server = create_test_server(None);

    let response = server.get("/recommend/Movie%2000").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert!(body.get("error").is_none());

    let items = recommendations(&body);
    assert_eq!(items.len(), 10);
    assert!(items.iter().all(|item| item["title"] != "Movie 00"));

    let scores: Vec<f64> = items
        .iter()
        .map(|item| item["similarity"].as_f64().unwrap())
        .collect();
    assert!(scores.windows(2).all(|pair| pair[0] >= pair[1]));
}

#[tokio::test]
async fn test_title_lookup_is_normalized() {
    let server = create_test_server(None);

    let exact: Value = server.get("/recommend/Movie%2007").await.json();
    let loose: Value = server.get("/recommend/%20%20movie%2007%20").await.json();

    assert_eq!(recommendations(&exact), recommendations(&loose));
}

#[tokio::test]
async fn test_query_parameter_form() {
    let server = create_test_server(None);

    let response = server
        .get("/recommend")
        .add_query_param("movie_title", "Movie 12")
        .add_query_param("limit", 5)
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(recommendations(&body).len(), 5);
}

#[tokio::test]
async fn test_include_searched_prepends_query() {
    let server = create_test_server(None);

    let response = server
        .get("/recommend/Movie%2003")
        .add_query_param("include_searched", true)
        .await;
    let body: Value = response.json();
    let items = recommendations(&body);

    assert_eq!(items.len(), 11);
    assert_eq!(items[0]["title"], "Movie 03");
    assert_eq!(items[0]["is_searched"], true);
    assert!(items[1..].iter().all(|item| item["is_searched"] == false));
}

#[tokio::test]
async fn test_limit_is_validated() {
    let server = create_test_server(None);

    let response = server.get("/recommend/Movie%2000?limit=0").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server.get("/recommend/Movie%2000?limit=500").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_limit_above_corpus_returns_all_other_movies() {
    let server = create_test_server(None);

    let body: Value = server.get("/recommend/Movie%2000?limit=50").await.json();
    assert_eq!(recommendations(&body).len(), CORPUS_SIZE - 1);
}

#[tokio::test]
async fn test_enrichment_fields_are_merged() {
    let calls = Arc::new(AtomicUsize::new(0));
    let server = create_test_server(Some(Arc::new(CountingSource {
        calls: calls.clone(),
    })));

    let body: Value = server.get("/recommend/Movie%2000?limit=3").await.json();
    let items = recommendations(&body);

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    for item in items {
        let title = item["title"].as_str().unwrap();
        assert_eq!(
            item["poster_path"],
            format!("https://img.test/{}.jpg", title.replace(' ', "_"))
        );
        assert!(item["overview"].as_str().unwrap().starts_with("Local overview"));
        assert_eq!(item["original_language"], "EN");
    }
}

#[tokio::test]
async fn test_failing_enrichment_falls_back_to_local() {
    let server = create_test_server(Some(Arc::new(FailingSource)));

    let response = server.get("/recommend/Movie%2000").await;
    response.assert_status_ok();

    let body: Value = response.json();
    let items = recommendations(&body);
    assert_eq!(items.len(), 10);
    assert!(items
        .iter()
        .all(|item| item["poster_path"] == "https://via.placeholder.com/500x750"));
}

#[tokio::test]
async fn test_precomputed_mode_matches_on_demand() {
    let on_demand = create_test_server(None);
    let state = AppState::new(
        Arc::new(test_corpus().with_neighbor_table(10)),
        None,
        ApiSettings::default(),
    );
    let precomputed = TestServer::new(create_router(state)).unwrap();

    let health: Value = precomputed.get("/health").await.json();
    assert_eq!(health["similarity_mode"], "precomputed");

    for title in ["Movie%2000", "Movie%2021", "Movie%2044"] {
        let path = format!("/recommend/{}", title);
        let expected: Value = on_demand.get(&path).await.json();
        let actual: Value = precomputed.get(&path).await.json();
        assert_eq!(expected, actual);
    }
}

#[tokio::test]
async fn test_response_carries_request_id() {
    let server = create_test_server(None);
    let request_id = "5f0c6a4e-8a40-4d7e-9a57-2f3c1c1e2b11";

    let response = server
        .get("/health")
        .add_header(
            "x-request-id".parse::<axum::http::HeaderName>().unwrap(),
            request_id.parse::<axum::http::HeaderValue>().unwrap(),
        )
        .await;

    assert_eq!(response.header("x-request-id"), request_id);
}
