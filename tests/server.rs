use actix_web::http::{header, StatusCode};
use actix_web::{test as actix_test, web, App};
use sentiment_api::pipelines::sentiment::Sentiment;
use sentiment_api::server::io_struct::{ErrorResponse, SentimentResponse};
use sentiment_api::server::{configure, cors, AppState, Classifier};
use sentiment_api::SentimentError;
use serde_json::json;
use std::sync::Arc;

/// Deterministic classifier: more `!` means more positive, more `?` more negative.
struct KeywordClassifier;

impl Classifier for KeywordClassifier {
    fn classify(&self, text: &str) -> Result<Sentiment, SentimentError> {
        let positive = 1.0 + text.matches('!').count() as f64;
        let negative = 1.0 + text.matches('?').count() as f64;
        let neutral = 1.0;
        let total = positive + negative + neutral;
        Sentiment::from_probabilities(&[negative / total, neutral / total, positive / total])
    }
}

struct FailingClassifier;

impl Classifier for FailingClassifier {
    fn classify(&self, _text: &str) -> Result<Sentiment, SentimentError> {
        Err(SentimentError::TchError("forward pass failed".to_string()))
    }
}

macro_rules! init_app {
    ($classifier:expr) => {
        actix_test::init_service(
            App::new()
                .wrap(cors())
                .app_data(web::Data::new(AppState::new(Arc::new($classifier))))
                .configure(configure),
        )
        .await
    };
}

#[actix_web::test]
async fn analyze_returns_label_and_scores() {
    let app = init_app!(KeywordClassifier);

    let req = actix_test::TestRequest::post()
        .uri("/analyze")
        .set_json(json!({"text": "I love this!"}))
        .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = actix_test::read_body_json(resp).await;
    assert_eq!(body["text"], "I love this!");
    assert_eq!(body["sentiment"], "Positive");
    let scores = body["scores"].as_object().unwrap();
    assert_eq!(scores.len(), 3);
    for label in ["Negative", "Neutral", "Positive"] {
        assert!(scores[label].is_f64(), "missing score for {label}");
    }
}

#[actix_web::test]
async fn scores_sum_to_one_and_label_is_max() {
    let app = init_app!(KeywordClassifier);

    for text in ["Great!!!", "Why? Really?", "plain", "Ok!?"] {
        let req = actix_test::TestRequest::post()
            .uri("/analyze")
            .set_json(json!({ "text": text }))
            .to_request();
        let response: SentimentResponse = actix_test::call_and_read_body_json(&app, req).await;

        let scores = response.scores;
        let total = scores.negative + scores.neutral + scores.positive;
        assert!((total - 1.0).abs() <= 3e-4, "scores sum to {total}");
        let best = scores.negative.max(scores.neutral).max(scores.positive);
        assert_eq!(scores.get(response.sentiment), best);
        assert_eq!(response.text, text);
    }
}

#[actix_web::test]
async fn identical_input_gives_identical_output() {
    let app = init_app!(KeywordClassifier);

    let mut responses = Vec::new();
    for _ in 0..2 {
        let req = actix_test::TestRequest::post()
            .uri("/analyze")
            .set_json(json!({"text": "Same text, same answer!"}))
            .to_request();
        let response: SentimentResponse = actix_test::call_and_read_body_json(&app, req).await;
        responses.push(response);
    }
    assert_eq!(responses[0], responses[1]);
}

#[actix_web::test]
async fn empty_text_is_accepted() {
    let app = init_app!(KeywordClassifier);

    let req = actix_test::TestRequest::post()
        .uri("/analyze")
        .set_json(json!({"text": ""}))
        .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let response: SentimentResponse = actix_test::read_body_json(resp).await;
    assert_eq!(response.text, "");
    // all classes tie, the first one wins
    assert_eq!(response.sentiment.as_str(), "Negative");
}

#[actix_web::test]
async fn malformed_bodies_are_rejected_with_422() {
    let app = init_app!(KeywordClassifier);

    for payload in [json!({}), json!({"text": 42}), json!({"txt": "hello"})] {
        let req = actix_test::TestRequest::post()
            .uri("/analyze")
            .set_json(payload)
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let error: ErrorResponse = actix_test::read_body_json(resp).await;
        assert!(!error.detail.is_empty());
    }

    let req = actix_test::TestRequest::post()
        .uri("/analyze")
        .insert_header(header::ContentType::json())
        .set_payload("{\"text\": ")
        .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn wrong_content_type_is_rejected_with_415() {
    let app = init_app!(KeywordClassifier);

    let req = actix_test::TestRequest::post()
        .uri("/analyze")
        .insert_header(header::ContentType::plaintext())
        .set_payload("{\"text\": \"hello\"}")
        .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[actix_web::test]
async fn inference_failure_returns_500() {
    let app = init_app!(FailingClassifier);

    let req = actix_test::TestRequest::post()
        .uri("/analyze")
        .set_json(json!({"text": "anything"}))
        .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let error: ErrorResponse = actix_test::read_body_json(resp).await;
    assert!(error.detail.contains("forward pass failed"));
}

#[actix_web::test]
async fn unknown_routes_and_methods() {
    let app = init_app!(KeywordClassifier);

    let req = actix_test::TestRequest::get().uri("/health").to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = actix_test::TestRequest::get().uri("/analyze").to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[actix_web::test]
async fn cors_echoes_any_origin_with_credentials() {
    let app = init_app!(KeywordClassifier);

    let req = actix_test::TestRequest::post()
        .uri("/analyze")
        .insert_header((header::ORIGIN, "http://localhost:3000"))
        .set_json(json!({"text": "hello"}))
        .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:3000"
    );
    assert_eq!(
        headers
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .unwrap(),
        "true"
    );
}

#[actix_web::test]
async fn cors_preflight_is_accepted() {
    let app = init_app!(KeywordClassifier);

    let req = actix_test::TestRequest::default()
        .method(actix_web::http::Method::OPTIONS)
        .uri("/analyze")
        .insert_header((header::ORIGIN, "https://example.org"))
        .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "POST"))
        .insert_header((header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type"))
        .to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    assert_eq!(
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "https://example.org"
    );
}
