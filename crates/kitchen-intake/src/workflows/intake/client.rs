use tracing::warn;

use super::requirements::RequirementsDocument;
use super::submission::{MultipartPayload, PartBody};

/// Source of per-location requirements documents.
///
/// A failed fetch is indistinguishable from "no requirements configured":
/// both come back as `None` and callers substitute
/// [`RequirementsDocument::fallback`], which fails safe toward more
/// validation. No retry policy lives at this layer.
pub trait RequirementsSource {
    fn fetch(
        &self,
        location_id: &str,
    ) -> impl std::future::Future<Output = Option<RequirementsDocument>> + Send;

    fn fetch_or_fallback(
        &self,
        location_id: &str,
    ) -> impl std::future::Future<Output = RequirementsDocument> + Send
    where
        Self: Sync,
    {
        async move {
            self.fetch(location_id)
                .await
                .unwrap_or_else(RequirementsDocument::fallback)
        }
    }
}

/// Requirements client over the marketplace REST backend.
#[derive(Debug, Clone)]
pub struct HttpRequirementsSource {
    http: reqwest::Client,
    base_url: String,
}

impl HttpRequirementsSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn requirements_url(&self, location_id: &str) -> String {
        format!(
            "{}/api/public/locations/{location_id}/requirements",
            self.base_url.trim_end_matches('/')
        )
    }

    /// Sends an assembled payload as one multipart request. Form fields and
    /// files travel together; a failure means resubmitting from scratch.
    pub async fn submit(
        &self,
        location_id: &str,
        payload: MultipartPayload,
    ) -> Result<(), SubmitError> {
        let url = format!(
            "{}/api/v1/locations/{location_id}/applications",
            self.base_url.trim_end_matches('/')
        );
        let form = to_form(payload)?;
        let response = self.http.post(url).multipart(form).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| {
                body.get("error")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "application could not be submitted".to_string());
        Err(SubmitError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

impl RequirementsSource for HttpRequirementsSource {
    async fn fetch(&self, location_id: &str) -> Option<RequirementsDocument> {
        let url = self.requirements_url(location_id);
        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(error) => {
                warn!(%error, location_id, "requirements fetch failed");
                return None;
            }
        };
        if !response.status().is_success() {
            warn!(
                status = response.status().as_u16(),
                location_id, "requirements fetch returned non-success"
            );
            return None;
        }
        match response.json::<RequirementsDocument>().await {
            Ok(document) => Some(document),
            Err(error) => {
                warn!(%error, location_id, "requirements document failed to parse");
                None
            }
        }
    }
}

fn to_form(payload: MultipartPayload) -> Result<reqwest::multipart::Form, SubmitError> {
    let mut form = reqwest::multipart::Form::new();
    for part in payload.parts {
        form = match part.body {
            PartBody::Text(value) => form.text(part.name, value),
            PartBody::Json(value) => form.text(part.name, value.to_string()),
            PartBody::File(file) => {
                let piece = reqwest::multipart::Part::bytes(file.bytes)
                    .file_name(file.name)
                    .mime_str(&file.content_type)
                    .map_err(SubmitError::Transport)?;
                form.part(part.name, piece)
            }
        };
    }
    Ok(form)
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("submission rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
}
