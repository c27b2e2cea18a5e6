// API routes and handlers
use actix_multipart::{Multipart, MultipartError};
use actix_web::http::header::ContentType;
use actix_web::{post, web, HttpRequest, HttpResponse};
use futures_util::{future, stream, TryStreamExt};
use log::{info, warn};
use serde::Serialize;

use crate::error::ClassifyError;
use crate::predict::{self, PredictionResult};
use crate::state::AppState;

/// JSON body sent back for every classification request.
#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ClassifyOutcome {
    Label(PredictionResult),
    Failure { result: bool, reason: String },
}

impl From<Result<PredictionResult, ClassifyError>> for ClassifyOutcome {
    fn from(result: Result<PredictionResult, ClassifyError>) -> Self {
        match result {
            Ok(prediction) => ClassifyOutcome::Label(prediction),
            Err(e) => ClassifyOutcome::Failure {
                result: false,
                reason: e.to_string(),
            },
        }
    }
}

// Any path starting with /classify lands here.
#[post("/classify{tail:.*}")]
pub async fn classify(
    req: HttpRequest,
    payload: web::Payload,
    state: web::Data<AppState>,
) -> HttpResponse {
    let result = match read_image(&req, payload, state.max_upload_bytes).await {
        Ok(image) => run_pipeline(state, image).await,
        Err(e) => Err(e),
    };

    match &result {
        Ok(prediction) => info!(
            "{} classified as {} ({})",
            req.path(),
            prediction.label_id,
            prediction.label
        ),
        Err(e) => warn!("{} failed: {}", req.path(), e),
    }

    let body = serde_json::to_vec(&ClassifyOutcome::from(result)).map(web::Bytes::from);
    HttpResponse::Ok()
        .content_type(ContentType::json())
        .streaming(stream::once(future::ready(body)))
}

/// Collects the first multipart part, whatever its field name.
async fn read_image(
    req: &HttpRequest,
    payload: web::Payload,
    limit: usize,
) -> Result<Vec<u8>, ClassifyError> {
    let upload_error = |e: MultipartError| ClassifyError::Upload(e.to_string());

    let mut multipart = Multipart::new(req.headers(), payload);
    let mut field = multipart
        .try_next()
        .await
        .map_err(upload_error)?
        .ok_or_else(|| ClassifyError::Upload("no image part in request".into()))?;

    let mut image = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(upload_error)? {
        if image.len() + chunk.len() > limit {
            return Err(ClassifyError::Upload(format!(
                "image part is larger than {limit} bytes"
            )));
        }
        image.extend_from_slice(&chunk);
    }
    Ok(image)
}

async fn run_pipeline(
    state: web::Data<AppState>,
    image: Vec<u8>,
) -> Result<PredictionResult, ClassifyError> {
    // decoding and the forward pass are CPU bound, keep them off the event loop
    web::block(move || predict::classify(state.model.as_ref(), &state.labels, &image))
        .await
        .map_err(|e| ClassifyError::InferenceEngine(e.to_string()))?
}
