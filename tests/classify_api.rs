use std::io::Cursor;
use std::sync::Arc;

use actix_web::body::{BodySize, MessageBody};
use actix_web::http::header::{self, HeaderValue};
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use classify_server::api;
use classify_server::error::ClassifyError;
use classify_server::labels::LabelList;
use classify_server::models::{InferenceEngine, ModelDescriptor};
use classify_server::state::AppState;
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::{json, Value};

const BOUNDARY: &str = "----classify-test-boundary";

/// Stands in for a 3-class model that always scores `[0.1, 0.7, 0.2]`.
struct ThreeClassModel {
    descriptor: ModelDescriptor,
    activations: Vec<f32>,
}

impl ThreeClassModel {
    fn new(activations: Vec<f32>) -> Self {
        Self {
            descriptor: ModelDescriptor {
                input_shape: [1, 3, 24, 24],
                output_shape: vec![1, activations.len()],
                input_name: "input".into(),
                output_name: "logits".into(),
            },
            activations,
        }
    }
}

impl InferenceEngine for ThreeClassModel {
    fn descriptor(&self) -> &ModelDescriptor {
        &self.descriptor
    }

    fn infer(&self, input: &candle::Tensor) -> Result<Vec<f32>, ClassifyError> {
        if input.dims() != self.descriptor.input_shape {
            return Err(ClassifyError::InferenceEngine(format!(
                "unexpected input shape {:?}",
                input.dims()
            )));
        }
        Ok(self.activations.clone())
    }
}

fn state_with(activations: Vec<f32>, max_upload_bytes: usize) -> web::Data<AppState> {
    let labels: LabelList = ["cat", "dog", "bird"].into_iter().collect();
    web::Data::new(AppState::new(
        Arc::new(ThreeClassModel::new(activations)),
        labels,
        max_upload_bytes,
    ))
}

fn state() -> web::Data<AppState> {
    state_with(vec![0.1, 0.7, 0.2], 1024 * 1024)
}

fn png_image() -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    RgbImage::from_fn(64, 48, |x, y| Rgb([x as u8, y as u8, 128]))
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

fn multipart_body(field: &str, filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload(uri: &str, body: Vec<u8>) -> test::TestRequest {
    test::TestRequest::post()
        .uri(uri)
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(body)
}

async fn assert_failure(resp: actix_web::dev::ServiceResponse) {
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["result"], json!(false));
    let reason = body["reason"].as_str().unwrap();
    assert!(!reason.is_empty());
}

#[actix_web::test]
async fn classifies_uploaded_image() {
    let app = test::init_service(App::new().app_data(state()).service(api::classify)).await;

    let req = upload("/classify", multipart_body("file", "cat.png", &png_image())).to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE),
        Some(&HeaderValue::from_static("application/json"))
    );
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"label_id": 1, "label": "dog"}));
}

#[actix_web::test]
async fn response_body_is_streamed() {
    let app = test::init_service(App::new().app_data(state()).service(api::classify)).await;

    let ok = upload("/classify", multipart_body("file", "a.png", &png_image())).to_request();
    let resp = test::call_service(&app, ok).await;
    assert!(matches!(resp.response().body().size(), BodySize::Stream));

    let failed = upload("/classify", multipart_body("file", "a.png", b"")).to_request();
    let resp = test::call_service(&app, failed).await;
    assert!(matches!(resp.response().body().size(), BodySize::Stream));
}

#[actix_web::test]
async fn any_classify_prefix_is_routed() {
    let app = test::init_service(App::new().app_data(state()).service(api::classify)).await;

    for uri in ["/classify/", "/classify/resnet18", "/classify?verbose=1"] {
        let req = upload(uri, multipart_body("image", "x.png", &png_image())).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({"label_id": 1, "label": "dog"}), "{uri}");
    }
}

#[actix_web::test]
async fn other_paths_are_not_found() {
    let app = test::init_service(App::new().app_data(state()).service(api::classify)).await;

    let req = upload("/predict", multipart_body("file", "x.png", &png_image())).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn repeated_requests_agree() {
    let app = test::init_service(App::new().app_data(state()).service(api::classify)).await;
    let image = png_image();

    let first: Value = test::call_and_read_body_json(
        &app,
        upload("/classify", multipart_body("file", "a.png", &image)).to_request(),
    )
    .await;
    let second: Value = test::call_and_read_body_json(
        &app,
        upload("/classify", multipart_body("file", "a.png", &image)).to_request(),
    )
    .await;
    assert_eq!(first, second);
}

#[actix_web::test]
async fn first_maximum_wins_over_http() {
    let app = test::init_service(
        App::new()
            .app_data(state_with(vec![0.2, 0.4, 0.4], 1024 * 1024))
            .service(api::classify),
    )
    .await;

    let req = upload("/classify", multipart_body("file", "a.png", &png_image())).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({"label_id": 1, "label": "dog"}));
}

#[actix_web::test]
async fn empty_part_is_reported_as_json() {
    let app = test::init_service(App::new().app_data(state()).service(api::classify)).await;

    let req = upload("/classify", multipart_body("file", "empty.png", b"")).to_request();
    assert_failure(test::call_service(&app, req).await).await;
}

#[actix_web::test]
async fn text_file_is_reported_as_json() {
    let app = test::init_service(App::new().app_data(state()).service(api::classify)).await;

    let req = upload(
        "/classify",
        multipart_body("file", "notes.jpg", b"shopping list: eggs, milk\n"),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["result"], json!(false));
    assert!(body["reason"]
        .as_str()
        .unwrap()
        .starts_with("failed to decode image"));
}

#[actix_web::test]
async fn zero_byte_body_is_reported_as_json() {
    let app = test::init_service(App::new().app_data(state()).service(api::classify)).await;

    let req = upload("/classify", Vec::new()).to_request();
    assert_failure(test::call_service(&app, req).await).await;
}

#[actix_web::test]
async fn non_multipart_body_is_reported_as_json() {
    let app = test::init_service(App::new().app_data(state()).service(api::classify)).await;

    let req = test::TestRequest::post()
        .uri("/classify")
        .insert_header((header::CONTENT_TYPE, "image/png"))
        .set_payload(png_image())
        .to_request();
    assert_failure(test::call_service(&app, req).await).await;
}

#[actix_web::test]
async fn oversized_upload_is_reported_as_json() {
    let app = test::init_service(
        App::new()
            .app_data(state_with(vec![0.1, 0.7, 0.2], 16))
            .service(api::classify),
    )
    .await;

    let req = upload("/classify", multipart_body("file", "a.png", &png_image())).to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["result"], json!(false));
    assert!(body["reason"].as_str().unwrap().contains("larger than 16 bytes"));
}

#[actix_web::test]
async fn unlabelled_class_is_reported_as_json() {
    let app = test::init_service(
        App::new()
            .app_data(state_with(vec![0.1, 0.2, 0.3, 0.9], 1024 * 1024))
            .service(api::classify),
    )
    .await;

    let req = upload("/classify", multipart_body("file", "a.png", &png_image())).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(
        body,
        json!({
            "result": false,
            "reason": "predicted class 3 has no label (3 labels loaded)"
        })
    );
}
