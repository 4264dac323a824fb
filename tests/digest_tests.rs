use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sbot::ai::{GenerationRequest, InputBudget, Summarizer, SummaryBackend, TokenStream};
use sbot::api::{AppState, create_router};
use sbot::clients::NewsClient;
use sbot::errors::ServiceError;
use sbot::features::digest::SUMMARY_FAILED;
use sbot::nlp::{BiasReducer, SentimentScorer, StaticLexicon};

struct Flat;

impl SentimentScorer for Flat {
    fn compound(&self, _text: &str) -> f64 {
        0.0
    }
}

/// Answers with the requested bounds so tests can tell the calls apart.
#[derive(Default)]
struct RecordingBackend {
    requests: Mutex<Vec<GenerationRequest>>,
    fail_max_length: Option<usize>,
}

#[async_trait]
impl SummaryBackend for RecordingBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ServiceError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail_max_length == Some(request.params.max_length) {
            return Err(ServiceError::BackendError("model exploded".to_string()));
        }
        Ok(format!(
            "summary {}/{}",
            request.params.max_length, request.params.min_length
        ))
    }

    async fn generate_stream(
        &self,
        _request: &GenerationRequest,
    ) -> Result<TokenStream, ServiceError> {
        Err(ServiceError::BackendError("not used".to_string()))
    }
}

fn article_body(subject: &str) -> String {
    format!(
        "Officials in the region confirmed on Monday that the {subject} project will move ahead \
         after months of public consultation and a close council vote."
    )
}

fn article_html(subject: &str) -> String {
    format!(
        "<html><body><nav>Home</nav><p>{}</p><p>Subscribe to our newsletter for more.</p></body></html>",
        article_body(subject)
    )
}

async fn mount_article(server: &MockServer, route: &str, status: u16, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_raw(html, "text/html"))
        .mount(server)
        .await;
}

fn app(server: &MockServer, backend: Arc<RecordingBackend>) -> Router {
    let reducer = BiasReducer::new(Arc::new(Flat), Arc::new(StaticLexicon::new()));
    let summarizer = Summarizer::new(backend, InputBudget::Words);
    let news = NewsClient::new(format!("{}/search", server.uri()), "test-key").unwrap();

    create_router(AppState::new(summarizer, reducer).with_news(news))
}

async fn post_digest(router: Router, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/digest")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_digest_summarizes_first_three_usable_articles() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "light rail"))
        .and(query_param("lang", "en"))
        .and(query_param("max", "6"))
        .and(query_param("apikey", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalArticles": 6,
            "articles": [
                { "title": "Rail approved", "url": format!("{base}/a1") },
                { "title": "Too short", "url": format!("{base}/a2") },
                { "title": "Gone", "url": format!("{base}/a3") },
                { "title": "Budget set", "url": format!("{base}/a4") },
                { "title": "Route chosen", "url": format!("{base}/a5") },
                { "title": "Never fetched", "url": format!("{base}/a6") }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    mount_article(&server, "/a1", 200, article_html("rail")).await;
    mount_article(&server, "/a2", 200, "<p>Brief.</p>".to_string()).await;
    mount_article(&server, "/a3", 404, String::new()).await;
    mount_article(&server, "/a4", 200, article_html("budget")).await;
    mount_article(&server, "/a5", 200, article_html("route")).await;
    Mock::given(method("GET"))
        .and(path("/a6"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let backend = Arc::new(RecordingBackend::default());
    let (status, body) = post_digest(app(&server, backend.clone()), json!({ "topic": "light rail" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["topic"], "light rail");

    let articles = body["articles"].as_array().unwrap();
    let titles: Vec<&str> = articles.iter().map(|a| a["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Rail approved", "Budget set", "Route chosen"]);
    assert_eq!(articles[0]["url"], format!("{base}/a1"));
    for article in articles {
        assert_eq!(article["summary"], "summary 100/80");
    }
    assert_eq!(body["overall_summary"], "summary 200/150");

    let requests = backend.requests.lock().unwrap();
    assert_eq!(requests.len(), 4);
    let overall = requests
        .iter()
        .find(|r| r.params.max_length == 200)
        .unwrap();
    for subject in ["rail", "budget", "route"] {
        assert!(overall.inputs.contains(&article_body(subject)));
    }
    assert!(requests.iter().all(|r| !r.inputs.contains("newsletter")));
}

async fn mount_single_article_search(server: &MockServer) {
    let base = server.uri();
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "articles": [{ "title": "Rail approved", "url": format!("{base}/a1") }]
        })))
        .mount(server)
        .await;
    mount_article(server, "/a1", 200, article_html("rail")).await;
}

#[tokio::test]
async fn test_failed_article_summary_keeps_the_digest() {
    let server = MockServer::start().await;
    mount_single_article_search(&server).await;

    let backend = Arc::new(RecordingBackend {
        fail_max_length: Some(100),
        ..RecordingBackend::default()
    });
    let (status, body) = post_digest(app(&server, backend.clone()), json!({ "topic": "rail" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["articles"][0]["title"], "Rail approved");
    assert_eq!(body["articles"][0]["summary"], SUMMARY_FAILED);
    assert_eq!(body["overall_summary"], "summary 200/150");
    assert_eq!(backend.requests.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_failed_overall_summary_keeps_article_summaries() {
    let server = MockServer::start().await;
    mount_single_article_search(&server).await;

    let backend = Arc::new(RecordingBackend {
        fail_max_length: Some(200),
        ..RecordingBackend::default()
    });
    let (status, body) = post_digest(app(&server, backend), json!({ "topic": "rail" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["articles"][0]["summary"], "summary 100/80");
    assert_eq!(body["overall_summary"], SUMMARY_FAILED);
}

#[tokio::test]
async fn test_failed_search_yields_empty_digest() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({ "errors": ["Invalid API key"] })),
        )
        .mount(&server)
        .await;

    let backend = Arc::new(RecordingBackend::default());
    let (status, body) = post_digest(app(&server, backend.clone()), json!({ "topic": "rail" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["articles"], json!([]));
    assert!(body["overall_summary"].is_null());
    assert!(backend.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_blank_topic_is_rejected() {
    let server = MockServer::start().await;

    let (status, body) = post_digest(
        app(&server, Arc::new(RecordingBackend::default())),
        json!({ "topic": "   " }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "'topic' must not be empty.");
}

#[tokio::test]
async fn test_news_client_search_error_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "message": "q is required" })),
        )
        .mount(&server)
        .await;

    let client = NewsClient::new(format!("{}/search", server.uri()), "k").unwrap();
    let err = client.search("rail").await.unwrap_err();

    assert!(matches!(err, ServiceError::NewsError(_)));
    assert!(err.to_string().contains("q is required"));
}
