use super::*;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use shared::domain::Skill;
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct Received {
    uploads: Arc<Mutex<Vec<(String, String, Option<String>, Vec<u8>)>>>,
    drafts: Arc<Mutex<Vec<Draft>>>,
}

async fn handle_upload(
    State(received): State<Received>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, Json<ErrorBody>)> {
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.unwrap_or_default().to_vec();
        if name == UPLOAD_FIELD {
            received
                .uploads
                .lock()
                .unwrap()
                .push((name, filename.clone(), content_type, bytes));
            return Ok(Json(UploadResponse {
                url: format!("/uploads/0123_{filename}"),
            }));
        }
    }
    Err((StatusCode::BAD_REQUEST, Json(ErrorBody::new("No file part"))))
}

async fn handle_preview(State(received): State<Received>, Json(draft): Json<Draft>) -> Html<String> {
    let html = format!("<html><h1>{}</h1></html>", draft.personal.name);
    received.drafts.lock().unwrap().push(draft);
    Html(html)
}

async fn handle_generate(State(received): State<Received>, Json(draft): Json<Draft>) -> Vec<u8> {
    received.drafts.lock().unwrap().push(draft);
    b"PK\x03\x04zip".to_vec()
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
    })
}

async fn handle_failure() -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::new("template missing")),
    )
}

async fn handle_slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(5)).await;
    "late"
}

async fn serve(app: Router) -> Url {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Url::parse(&format!("http://{addr}")).expect("url")
}

async fn spawn_portfolio_server() -> (Url, Received) {
    let received = Received::default();
    let app = Router::new()
        .route(UPLOAD_PATH, post(handle_upload))
        .route(PREVIEW_PATH, post(handle_preview))
        .route(GENERATE_PATH, post(handle_generate))
        .route(HEALTH_PATH, get(handle_health))
        .with_state(received.clone());
    (serve(app).await, received)
}

async fn spawn_failing_server() -> Url {
    let app = Router::new()
        .route(UPLOAD_PATH, post(handle_failure))
        .route(PREVIEW_PATH, post(handle_failure))
        .route(GENERATE_PATH, post(|| async { StatusCode::NOT_FOUND }))
        .route(HEALTH_PATH, get(handle_slow));
    serve(app).await
}

fn client(url: &Url) -> HttpPortfolioService {
    HttpPortfolioService::new(url, Duration::from_secs(5)).expect("client")
}

fn sample_draft() -> Draft {
    let mut draft = Draft::default();
    draft.personal.name = "Ada".into();
    draft.skills.push(Skill { name: "Rust".into() });
    draft
}

#[tokio::test]
async fn upload_sends_single_file_field() {
    let (url, received) = spawn_portfolio_server().await;

    let reference = client(&url)
        .upload_image(ImageUpload::new("me.png", vec![9, 8, 7]).with_mime_type("image/png"))
        .await
        .expect("upload");

    assert_eq!(reference, "/uploads/0123_me.png");
    let uploads = received.uploads.lock().unwrap().clone();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].0, "file");
    assert_eq!(uploads[0].1, "me.png");
    assert_eq!(uploads[0].2.as_deref(), Some("image/png"));
    assert_eq!(uploads[0].3, vec![9, 8, 7]);
}

#[tokio::test]
async fn preview_posts_full_draft_and_returns_html() {
    let (url, received) = spawn_portfolio_server().await;

    let html = client(&url)
        .render_preview(&sample_draft())
        .await
        .expect("preview");

    assert_eq!(html, "<html><h1>Ada</h1></html>");
    assert_eq!(received.drafts.lock().unwrap()[0], sample_draft());
}

#[tokio::test]
async fn generate_returns_raw_bytes() {
    let (url, received) = spawn_portfolio_server().await;

    let bytes = client(&url)
        .generate_archive(&sample_draft())
        .await
        .expect("generate");

    assert_eq!(bytes, b"PK\x03\x04zip".to_vec());
    assert_eq!(received.drafts.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn health_accepts_healthy_status() {
    let (url, _) = spawn_portfolio_server().await;
    client(&url).health().await.expect("healthy");
}

#[tokio::test]
async fn non_success_status_carries_service_message() {
    let url = spawn_failing_server().await;
    let service = client(&url);

    let err = service
        .render_preview(&Draft::default())
        .await
        .expect_err("must fail");
    match err {
        ServiceError::Status {
            status, message, ..
        } => {
            assert_eq!(status, 500);
            assert_eq!(message.as_deref(), Some("template missing"));
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = service
        .generate_archive(&Draft::default())
        .await
        .expect_err("must fail");
    assert!(matches!(
        err,
        ServiceError::Status {
            status: 404,
            message: None,
            ..
        }
    ));

    let err = service
        .upload_image(ImageUpload::new("me.png", vec![1]))
        .await
        .expect_err("must fail");
    assert!(err.to_string().contains("template missing"));
}

#[tokio::test]
async fn slow_service_times_out() {
    let url = spawn_failing_server().await;
    let service = HttpPortfolioService::new(&url, Duration::from_millis(200)).expect("client");

    let err = service.health().await.expect_err("must time out");
    assert!(matches!(err, ServiceError::Timeout { .. }), "got {err}");
    assert!(err.is_transient());
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let url = Url::parse(&format!("http://{addr}")).expect("url");

    let err = client(&url)
        .render_preview(&Draft::default())
        .await
        .expect_err("must fail");
    assert!(matches!(err, ServiceError::Transport { .. }), "got {err}");
}

#[tokio::test]
async fn base_url_trailing_slash_is_tolerated() {
    let (url, _) = spawn_portfolio_server().await;
    let with_slash = Url::parse(&format!("{}/", url.as_str().trim_end_matches('/'))).expect("url");
    client(&with_slash).health().await.expect("healthy");
}
