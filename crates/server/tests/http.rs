use std::io::Cursor;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Rgb};
use serde_json::{json, Value};
use study_pdf::{encode_data_url, fonts, Composer};
use study_server::services::{ServiceError, Simplifier, SpeechSynthesizer, Translator};
use study_server::{app, AppState};
use tower::ServiceExt;

struct EchoSimplifier;

impl Simplifier for EchoSimplifier {
    fn simplify(&self, text: &str) -> Result<String, ServiceError> {
        Ok(format!("simple: {text}"))
    }
}

struct UnconfiguredSimplifier;

impl Simplifier for UnconfiguredSimplifier {
    fn simplify(&self, _text: &str) -> Result<String, ServiceError> {
        Err(ServiceError::NotConfigured("LLM API key"))
    }
}

struct TaggingTranslator;

impl Translator for TaggingTranslator {
    fn translate(&self, text: &str, target: &str) -> Result<String, ServiceError> {
        Ok(format!("[{target}] {text}"))
    }
}

struct FixedSpeech;

impl SpeechSynthesizer for FixedSpeech {
    fn synthesize(&self, _text: &str, _language: &str) -> Result<Vec<u8>, ServiceError> {
        Ok(b"ID3-fake-mp3".to_vec())
    }
}

fn state_with(simplifier: Arc<dyn Simplifier>) -> AppState {
    AppState {
        composer: Arc::new(Composer::new().with_bookmarks(true)),
        simplifier,
        translator: Arc::new(TaggingTranslator),
        synthesizer: Arc::new(FixedSpeech),
        translate_target: "hi".to_owned(),
        max_body_bytes: 8 * 1024 * 1024,
    }
}

fn router() -> Router {
    app(state_with(Arc::new(EchoSimplifier)))
}

fn png_data_url(width: u32, height: u32) -> String {
    let image =
        DynamicImage::ImageRgb8(ImageBuffer::from_pixel(width, height, Rgb([240u8, 240, 250])));
    let mut cursor = Cursor::new(Vec::new());
    image
        .write_to(&mut cursor, ImageOutputFormat::Png)
        .expect("encode png");
    encode_data_url("image/png", cursor.into_inner())
}

async fn post(router: Router, uri: &str, body: impl Into<Body>) -> Response {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .body(body.into())
        .expect("request");
    router.oneshot(request).await.expect("response")
}

async fn post_json(router: Router, uri: &str, body: Value) -> Response {
    post(router, uri, body.to_string()).await
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

async fn assert_error(response: Response, status: StatusCode, message_prefix: &str) {
    assert_eq!(response.status(), status);
    let body = json_body(response).await;
    assert_eq!(body["status"], "error");
    let message = body["message"].as_str().expect("message");
    assert!(
        message.starts_with(message_prefix),
        "unexpected message '{message}'"
    );
}

#[tokio::test]
async fn notes_export_requires_a_template() {
    let response = post_json(
        router(),
        "/export/notes/pdf",
        json!({"topic_name": "Motion", "content": "Text"}),
    )
    .await;
    assert_error(response, StatusCode::BAD_REQUEST, "Template missing").await;
}

#[tokio::test]
async fn template_without_base64_marker_is_rejected() {
    let response = post_json(
        router(),
        "/export/notes/pdf",
        json!({"topic_name": "Motion", "template_data_url": "data:image/png,abc"}),
    )
    .await;
    assert_error(response, StatusCode::BAD_REQUEST, "Template decode error: ").await;
}

#[tokio::test]
async fn unparsable_body_is_a_bad_request() {
    let response = post(router(), "/export/chapter/pdf", "{\"chapter_title\": ").await;
    assert_error(response, StatusCode::BAD_REQUEST, "Invalid JSON body").await;
}

#[tokio::test]
async fn chapter_export_requires_topics() {
    let response = post_json(
        router(),
        "/export/chapter/pdf",
        json!({"chapter_title": "Motion", "topics": [], "template_data_url": png_data_url(4, 4)}),
    )
    .await;
    assert_error(response, StatusCode::BAD_REQUEST, "Topics missing").await;
}

#[tokio::test]
async fn mindmap_export_requires_a_mindmap() {
    let response = post_json(
        router(),
        "/export/mindmap/pdf",
        json!({"topic_name": "Motion", "template_data_url": png_data_url(4, 4)}),
    )
    .await;
    assert_error(response, StatusCode::BAD_REQUEST, "Mindmap image missing").await;
}

#[tokio::test]
async fn malformed_mindmap_payload_is_a_decode_error() {
    let response = post_json(
        router(),
        "/export/topic/combined/pdf",
        json!({
            "topic_name": "Motion",
            "content": "Text",
            "template_data_url": png_data_url(4, 4),
            "mindmap_image_data_url": "data:image/png;base64,@@@",
        }),
    )
    .await;
    assert_error(response, StatusCode::BAD_REQUEST, "Decode error: ").await;
}

#[tokio::test]
async fn undecodable_template_image_is_an_internal_error() {
    let response = post_json(
        router(),
        "/export/notes/pdf",
        json!({
            "topic_name": "Motion",
            "template_data_url": encode_data_url("image/png", b"not really a png"),
        }),
    )
    .await;
    assert_error(
        response,
        StatusCode::INTERNAL_SERVER_ERROR,
        "Failed to generate PDF",
    )
    .await;
}

#[tokio::test]
async fn notes_export_returns_a_named_pdf_attachment() {
    if !fonts::default_fonts_available() {
        eprintln!("Skipping notes_export_returns_a_named_pdf_attachment: no usable fonts found.");
        return;
    }

    let response = post_json(
        router(),
        "/export/notes/pdf",
        json!({
            "topic_name": "Newton's Laws!! (Part 1)",
            "content": "An object at rest stays at rest.",
            "template_data_url": png_data_url(21, 30),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/pdf"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"Newtons_Laws_Part_1_notes.pdf\""
    );
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn corrupt_topic_mindmap_still_exports_the_chapter() {
    if !fonts::default_fonts_available() {
        eprintln!("Skipping corrupt_topic_mindmap_still_exports_the_chapter: no usable fonts found.");
        return;
    }

    let response = post_json(
        router(),
        "/export/chapter/combined/pdf",
        json!({
            "template_data_url": png_data_url(21, 30),
            "topics": [
                {"topic": "Inertia", "content": "First law.", "mindmap_image_data_url": png_data_url(60, 40)},
                {"topic": "", "content": "Second law.", "mindmap_image_data_url": "data:image/png;base64,AAAA"},
                {"topic": "Reaction", "content": "Third law."}
            ],
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"Chapter_Notes__Mindmaps.pdf\""
    );
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let document = lopdf::Document::load_mem(&bytes).expect("valid pdf");
    let operations: Vec<lopdf::content::Operation> = document
        .get_pages()
        .values()
        .flat_map(|page_id| {
            let content = document.get_page_content(*page_id).expect("page content");
            lopdf::content::Content::decode(&content)
                .expect("decode content")
                .operations
        })
        .collect();

    let images = operations.iter().filter(|op| op.operator == "Do").count();
    assert_eq!(
        images,
        document.get_pages().len() + 1,
        "one background per page plus the valid mindmap"
    );
    let notice_drawn = operations.iter().any(|op| {
        op.operator == "rg"
            && op
                .operands
                .first()
                .and_then(|value| value.as_float().ok())
                .map_or(false, |red| (f64::from(red) - 180.0 / 255.0).abs() < 0.01)
    });
    assert!(notice_drawn, "the corrupt mindmap is replaced by the red notice");
}

#[tokio::test]
async fn simplify_wraps_the_result_in_a_success_envelope() {
    let response = post_json(router(), "/simplify_text", json!({"text": "Inertia"})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"], "simple: Inertia");
}

#[tokio::test]
async fn simplify_without_text_is_rejected() {
    let response = post_json(router(), "/simplify_text", json!({"text": ""})).await;
    assert_error(response, StatusCode::BAD_REQUEST, "No text provided").await;

    let response = post_json(router(), "/simplify_text", json!({})).await;
    assert_error(response, StatusCode::BAD_REQUEST, "No text provided").await;
}

#[tokio::test]
async fn whitespace_text_is_passed_through() {
    let response = post_json(router(), "/translate", json!({"text": "  "})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["translated_text"], "[hi]   ");
}

#[tokio::test]
async fn collaborator_failures_are_internal_errors() {
    let router = app(state_with(Arc::new(UnconfiguredSimplifier)));
    let response = post_json(router, "/simplify_text", json!({"text": "Inertia"})).await;
    assert_error(
        response,
        StatusCode::INTERNAL_SERVER_ERROR,
        "LLM API key is not configured",
    )
    .await;
}

#[tokio::test]
async fn translate_defaults_to_the_configured_target() {
    let response = post_json(router(), "/translate", json!({"text": "Force"})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Translation successful");
    assert_eq!(body["data"]["translated_text"], "[hi] Force");

    let response = post_json(router(), "/translate", json!({"text": "Force", "target": "ta"})).await;
    let body = json_body(response).await;
    assert_eq!(body["data"]["translated_text"], "[ta] Force");
}

#[tokio::test]
async fn audio_is_served_as_an_mp3_attachment() {
    let response = post_json(
        router(),
        "/generate_audio",
        json!({"text": "Force", "language": "hindi"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=audio.mp3"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    assert_eq!(&bytes[..], b"ID3-fake-mp3");
}

#[tokio::test]
async fn health_reports_ok() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("request");
    let response = router().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["message"], "ok");
}
