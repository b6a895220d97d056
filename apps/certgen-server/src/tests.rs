//! Tests for the certificate server API
//!
//! Requests are driven through the full router with `oneshot`; error
//! mapping is covered with proptest.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::IntoResponse,
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use http_body_util::BodyExt;
use lopdf::{dictionary, Document, Object};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use certgen_core::{CertGenError, NoFontSource};

use crate::api::MISSING_INPUTS;
use crate::error::ServerError;
use crate::{router, AppState};

fn app() -> Router {
    router(AppState::new(Arc::new(NoFontSource)), 10 * 1024 * 1024)
}

fn create_test_pdf(width: i64, height: i64) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn field() -> Value {
    json!({
        "x": 50,
        "y": 50,
        "width": 200,
        "height": 50,
        "fontSize": 24,
        "fontFamily": "Helvetica",
        "fontWeight": "normal",
        "color": "#111111",
        "alignment": "center",
        "text": "Participant Name"
    })
}

#[tokio::test]
async fn test_health() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "certgen-server");
}

#[tokio::test]
async fn test_names_preview() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/names/preview")
        .header(header::CONTENT_TYPE, "text/csv")
        .body(Body::from(
            "name,email\nAda Lovelace,ada@example.com\n\"Hopper, Grace\",g@example.com\n\n",
        ))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 2);
    assert_eq!(body["names"], json!(["Ada Lovelace", "Hopper, Grace"]));
    assert_eq!(body["summary"], "Found 2 names");
}

#[tokio::test]
async fn test_names_preview_semicolon_export() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/names/preview")
        .header(header::CONTENT_TYPE, "text/csv")
        .body(Body::from("Name;Email\nAda;a@example.com\nPat O\"Brien;p@example.com\n"))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["names"], json!(["Ada", "Pat O\"Brien"]));
}

#[tokio::test]
async fn test_generate_certificates_returns_pdf() {
    let body = json!({
        "template": STANDARD.encode(create_test_pdf(600, 800)),
        "names": ["Ada", "Grace"],
        "field": field(),
        "viewport": { "width": 300, "height": 400 }
    });
    let response = app()
        .oneshot(json_request("/api/certificates", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"certificates_bundle.pdf\""
    );
    assert_eq!(headers["x-certificate-count"], "2");
    assert_eq!(headers["x-font-fallback"], "false");

    let pdf = body_bytes(response).await;
    let doc = Document::load_mem(&pdf).unwrap();
    assert_eq!(doc.get_pages().len(), 2);
}

#[tokio::test]
async fn test_generate_from_csv_with_container() {
    let template = STANDARD.encode(create_test_pdf(600, 800));
    let body = json!({
        "template": format!("data:application/pdf;base64,{}", template),
        "csv": "Name\nAda\nGrace\nLinus\n",
        "field": field(),
        "container": { "width": 640, "height": 840 }
    });
    let response = app()
        .oneshot(json_request("/api/certificates", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-certificate-count"], "3");
}

#[tokio::test]
async fn test_decorative_font_without_source_reports_fallback() {
    let mut decorative = field();
    decorative["fontFamily"] = json!("var(--font-great-vibes)");
    let body = json!({
        "template": STANDARD.encode(create_test_pdf(600, 800)),
        "names": ["Ada"],
        "field": decorative,
        "viewport": { "width": 300, "height": 400 }
    });
    let response = app()
        .oneshot(json_request("/api/certificates", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-font-fallback"], "true");
}

#[tokio::test]
async fn test_missing_template_is_input_missing() {
    let body = json!({
        "names": ["Ada"],
        "field": field(),
        "viewport": { "width": 300, "height": 400 }
    });
    let response = app()
        .oneshot(json_request("/api/certificates", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "INPUT_MISSING");
    assert_eq!(body["error"], MISSING_INPUTS);
}

#[tokio::test]
async fn test_missing_names_is_input_missing() {
    let body = json!({
        "template": STANDARD.encode(create_test_pdf(600, 800)),
        "csv": "name\n\n",
        "viewport": { "width": 300, "height": 400 }
    });
    let response = app()
        .oneshot(json_request("/api/certificates", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INPUT_MISSING");
}

#[tokio::test]
async fn test_invalid_base64_is_rejected() {
    let body = json!({
        "template": "%%% not base64 %%%",
        "names": ["Ada"],
        "viewport": { "width": 300, "height": 400 }
    });
    let response = app()
        .oneshot(json_request("/api/certificates", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_corrupt_template_is_unprocessable() {
    let body = json!({
        "template": STANDARD.encode(b"this is not a pdf"),
        "names": ["Ada"],
        "viewport": { "width": 300, "height": 400 }
    });
    let response = app()
        .oneshot(json_request("/api/certificates", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["code"], "TEMPLATE_CORRUPT");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Please re-upload the template"));
}

#[tokio::test]
async fn test_degenerate_field_is_rejected() {
    let mut flat = field();
    flat["height"] = json!(0);
    let body = json!({
        "template": STANDARD.encode(create_test_pdf(600, 800)),
        "names": ["Ada"],
        "field": flat,
        "viewport": { "width": 300, "height": 400 }
    });
    let response = app()
        .oneshot(json_request("/api/certificates", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_FIELD");
}

#[tokio::test]
async fn test_viewport_or_container_required() {
    let body = json!({
        "template": STANDARD.encode(create_test_pdf(600, 800)),
        "names": ["Ada"]
    });
    let response = app()
        .oneshot(json_request("/api/certificates", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_REQUEST");
}

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn any_error() -> impl Strategy<Value = ServerError> {
        let message = "[a-zA-Z0-9 ]{0,40}";
        prop_oneof![
            message.prop_map(ServerError::InvalidRequest),
            message.prop_map(|m| ServerError::from(CertGenError::InputMissing(m))),
            message.prop_map(|m| ServerError::from(CertGenError::InvalidField(m))),
            message.prop_map(|m| ServerError::from(CertGenError::TemplateCorrupt(m))),
            message.prop_map(|m| ServerError::from(CertGenError::FontEmbed(m))),
            message.prop_map(|m| ServerError::from(CertGenError::Generation(m))),
        ]
    }

    proptest! {
        /// Property: errors never map to a success status
        #[test]
        fn errors_are_never_success(err in any_error()) {
            let status = err.into_response().status();
            prop_assert!(status.is_client_error() || status.is_server_error());
        }

        /// Property: client mistakes are 4xx, internal failures 5xx
        #[test]
        fn status_matches_error_class(err in any_error()) {
            let code = err.code();
            let status = err.status();
            match code {
                "INVALID_REQUEST" | "INPUT_MISSING" | "INVALID_FIELD" | "TEMPLATE_CORRUPT" => {
                    prop_assert!(status.is_client_error())
                }
                "FONT_EMBED_FAILURE" | "GENERATION_FAILURE" => {
                    prop_assert!(status.is_server_error())
                }
                other => prop_assert!(false, "unexpected code {}", other),
            }
        }

        /// Property: input-missing errors carry the bare message
        #[test]
        fn input_missing_message_is_unprefixed(message in "[a-zA-Z ]{1,40}") {
            let err: ServerError = CertGenError::InputMissing(message.clone()).into();
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let body = rt.block_on(body_json(err.into_response()));
            prop_assert_eq!(body["error"].as_str().unwrap(), message.as_str());
        }
    }
}
