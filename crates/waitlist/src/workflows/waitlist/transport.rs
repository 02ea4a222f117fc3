use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::debug;

use super::payload::IntakePayload;
use super::steps::photo_media_type;
use super::submission::{SubmissionTransport, TransportError, TransportResponse};
use crate::config::ClientConfig;

/// `reqwest`-backed transport: JSON when there is no photo, multipart otherwise.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| TransportError::Request(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        Self::new(config.endpoint.clone(), config.timeout)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub(crate) fn multipart_form(payload: IntakePayload) -> Result<Form, TransportError> {
        let mut form = Form::new();
        for (name, value) in payload.form_fields() {
            form = form.text(name, value);
        }

        if let Some(photo) = payload.profile_photo {
            // The declared type may be blank; send the type the photo was validated as.
            let media_type = photo_media_type(&photo);
            let mut part = Part::bytes(photo.bytes).file_name(photo.file_name);
            if let Some(media_type) = media_type {
                part = part
                    .mime_str(media_type.essence_str())
                    .map_err(|err| TransportError::Request(err.to_string()))?;
            }
            form = form.part("profilePhoto", part);
        }
        Ok(form)
    }
}

#[async_trait]
impl SubmissionTransport for HttpTransport {
    async fn send(&self, payload: IntakePayload) -> Result<TransportResponse, TransportError> {
        let request = self.client.post(&self.endpoint);
        let request = if payload.profile_photo.is_some() {
            request.multipart(Self::multipart_form(payload)?)
        } else {
            request.json(&payload)
        };

        let response = request.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let body = match response.json::<Value>().await {
            Ok(body) => body,
            Err(err) => {
                debug!(status, error = %err, "intake response body was not JSON");
                Value::Null
            }
        };
        Ok(TransportResponse { status, body })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Request(err.to_string())
    }
}
