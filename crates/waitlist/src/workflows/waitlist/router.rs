use std::error::Error as _;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::error;

use super::domain::{Field, PhotoAttachment};
use super::payload::{IntakePayload, PayloadError};
use super::repository::{ApplicationRepository, AssetStore};
use super::service::{IntakeError, WaitlistIntakeService};

/// Allowance for the text parts riding alongside the photo in a multipart body.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Router exposing the intake endpoint and the storage probe.
pub fn intake_router<R, S>(service: Arc<WaitlistIntakeService<R, S>>) -> Router
where
    R: ApplicationRepository + 'static,
    S: AssetStore + 'static,
{
    let body_limit = service.policy().max_photo_bytes + FORM_OVERHEAD_BYTES;
    Router::new()
        .route("/api/apply", post(apply_handler::<R, S>))
        .route("/api/test", get(storage_probe_handler::<R, S>))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(service)
}

/// Request body accepted by `/api/apply`: multipart form data or plain JSON.
#[derive(Debug)]
pub struct IntakeForm(pub IntakePayload);

#[async_trait]
impl<S> FromRequest<S> for IntakeForm
where
    S: Send + Sync,
{
    type Rejection = PayloadError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|rejection| PayloadError::Multipart(rejection.body_text()))?;
            return read_multipart(multipart).await.map(IntakeForm);
        }

        let Json(payload) = Json::<IntakePayload>::from_request(req, state)
            .await
            .map_err(|rejection| PayloadError::Json(rejection.body_text()))?;
        Ok(IntakeForm(payload))
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<IntakePayload, PayloadError> {
    let mut payload = IntakePayload::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| PayloadError::Multipart(err.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == Field::ProfilePhoto.wire_name() {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|err| PayloadError::Multipart(err.body_text()))?;
            payload.profile_photo = Some(PhotoAttachment::new(file_name, content_type, bytes.to_vec()));
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|err| PayloadError::Multipart(err.body_text()))?;
        payload.set_form_field(&name, value)?;
    }
    Ok(payload)
}

impl IntoResponse for PayloadError {
    fn into_response(self) -> Response {
        let payload = json!({
            "error": self.to_string(),
        });
        (StatusCode::BAD_REQUEST, Json(payload)).into_response()
    }
}

pub(crate) async fn apply_handler<R, S>(
    State(service): State<Arc<WaitlistIntakeService<R, S>>>,
    IntakeForm(payload): IntakeForm,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: AssetStore + 'static,
{
    let outcome = tokio::task::spawn_blocking(move || service.handle(payload))
        .await
        .unwrap_or_else(|err| Err(IntakeError::Unknown(err.to_string())));

    match outcome {
        Ok(receipt) => {
            let payload = json!({
                "success": true,
                "waitlistCount": receipt.position,
                "message": "Application submitted successfully",
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => intake_error_response(err),
    }
}

fn intake_error_response(err: IntakeError) -> Response {
    let (status, payload) = match &err {
        IntakeError::Validation(validation) => (
            StatusCode::BAD_REQUEST,
            json!({ "error": validation.to_string() }),
        ),
        IntakeError::Conflict => (StatusCode::CONFLICT, json!({ "error": err.to_string() })),
        IntakeError::Persistence(_) => {
            let details = err
                .source()
                .map(ToString::to_string)
                .unwrap_or_default();
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": err.to_string(), "details": details }),
            )
        }
        IntakeError::Storage(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": err.to_string() }),
        ),
        IntakeError::Unknown(cause) => {
            error!(%cause, "intake handler failed unexpectedly");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": err.to_string() }),
            )
        }
    };
    (status, Json(payload)).into_response()
}

pub(crate) async fn storage_probe_handler<R, S>(
    State(service): State<Arc<WaitlistIntakeService<R, S>>>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: AssetStore + 'static,
{
    match service.repository().count() {
        Ok(count) => {
            let payload = json!({
                "success": true,
                "message": "Storage connection working",
                "data": { "count": count },
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => {
            error!(error = %err, "storage probe failed");
            let payload = json!({
                "error": "Storage connection failed",
                "details": err.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
