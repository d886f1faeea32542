use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Serialize;
use serde_json::json;
use tracing::{instrument, warn};

use crate::errors::ServiceError;

const VISION_PROMPT: &str =
    "Identify this automotive part. Return: technical name, probable part code and application.";
const VISION_SYSTEM: &str = "You are a visual specialist in automotive parts.";

/// Result of a successful classification: free-text analysis plus the
/// backend that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct PartDescriptor {
    pub analysis: String,
    pub engine: String,
}

/// Best-effort vision/text generation over an ordered failover list of model
/// backends. The first backend to answer wins; only when every backend fails
/// does the caller see `ExternalServiceError`. Has no access to, and no
/// effect on, ledger state.
#[derive(Clone)]
pub struct ClassifierService {
    http: reqwest::Client,
    backends: Vec<String>,
    api_key: Option<String>,
}

impl ClassifierService {
    pub fn new(backends: Vec<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            backends,
            api_key,
        }
    }

    /// Identifies an automotive part from a photo.
    #[instrument(skip(self, image), fields(image_bytes = image.len()))]
    pub async fn classify(&self, image: &[u8]) -> Result<PartDescriptor, ServiceError> {
        let encoded = BASE64.encode(image);
        self.run(VISION_PROMPT, VISION_SYSTEM, Some(&encoded)).await
    }

    /// Plain text generation through the same failover chain (technical
    /// chat, supplier e-mail drafting).
    #[instrument(skip(self, prompt, system_instruction))]
    pub async fn generate(
        &self,
        prompt: &str,
        system_instruction: &str,
    ) -> Result<PartDescriptor, ServiceError> {
        self.run(prompt, system_instruction, None).await
    }

    async fn run(
        &self,
        prompt: &str,
        system_instruction: &str,
        image_b64: Option<&str>,
    ) -> Result<PartDescriptor, ServiceError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ServiceError::ExternalServiceError("classifier API key not configured".to_string())
        })?;

        let mut parts = vec![json!({ "text": prompt })];
        if let Some(data) = image_b64 {
            parts.push(json!({
                "inline_data": { "mime_type": "image/jpeg", "data": data }
            }));
        }
        let body = json!({
            "system_instruction": { "parts": [{ "text": system_instruction }] },
            "contents": [{ "parts": parts }],
        });

        for backend in &self.backends {
            let url = format!("{}?key={}", backend, api_key);
            match self.http.post(&url).json(&body).send().await {
                Ok(resp) if resp.status().is_success() => {
                    match resp.json::<serde_json::Value>().await {
                        Ok(v) => {
                            if let Some(text) = v
                                .pointer("/candidates/0/content/parts/0/text")
                                .and_then(|t| t.as_str())
                            {
                                return Ok(PartDescriptor {
                                    analysis: text.to_string(),
                                    engine: backend.clone(),
                                });
                            }
                            warn!(backend = %backend, "classifier backend returned no candidates");
                        }
                        Err(err) => {
                            warn!(backend = %backend, error = %err, "classifier backend returned malformed payload");
                        }
                    }
                }
                Ok(resp) => {
                    warn!(backend = %backend, status = %resp.status(), "classifier backend rejected request");
                }
                Err(err) => {
                    warn!(backend = %backend, error = %err, "classifier backend unreachable");
                }
            }
        }

        Err(ServiceError::ExternalServiceError(
            "all classifier backends unavailable".to_string(),
        ))
    }
}
