//! Gemini image transformation gateway
//!
//! Sends the frame (as JPEG) and the instruction to the `generateContent`
//! endpoint of an image-capable Gemini model and decodes the first inline
//! image of the reply.
//!
//! Timeout, retry and concurrency policy live here, not in the session
//! core: each attempt is bounded by `timeout`, retryable failures back off
//! exponentially, and a semaphore caps the number of requests in flight.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{DynamicImage, ImageFormat};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::time::Duration;
use tokio::sync::Semaphore;

use super::TransformGateway;
use crate::config::GeminiConfig;
use crate::error::GatewayError;
use crate::state::Frame;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Longest error body kept in a `GatewayError::Status`
const MAX_ERROR_BODY: usize = 512;

// ========== Wire types ==========

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text {
        text: String,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    inline_data: Option<InlineData>,
}

// ========== Gateway ==========

/// Transformation gateway backed by the Gemini API
pub struct GeminiGateway {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    timeout: Duration,
    max_attempts: u32,
    base_delay: Duration,
    permits: Semaphore,
}

impl GeminiGateway {
    /// Create a gateway from config.
    ///
    /// API key priority:
    /// 1. `gemini.api_key` from the config file
    /// 2. `GEMINI_API_KEY` environment variable
    /// 3. `GOOGLE_API_KEY` environment variable
    pub fn new(config: &GeminiConfig) -> Self {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .filter(|key| !key.trim().is_empty());

        Self {
            client: Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: config.model.clone(),
            timeout: config.timeout(),
            max_attempts: config.max_retries.max(1),
            base_delay: config.base_delay(),
            permits: Semaphore::new(config.concurrency.max(1)),
        }
    }

    /// Point the gateway at another endpoint (proxies, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn model_name(model: &str) -> String {
        if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{model}")
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.base_url,
            Self::model_name(&self.model)
        )
    }

    fn build_request(jpeg: &[u8], instruction: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![
                    RequestPart::Text {
                        text: instruction.to_string(),
                    },
                    RequestPart::Inline {
                        inline_data: InlineData {
                            mime_type: "image/jpeg".to_string(),
                            data: BASE64.encode(jpeg),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
            },
        }
    }

    /// First inline image of the first candidate that has one
    fn extract_image(response: GenerateContentResponse) -> Result<Frame, GatewayError> {
        let data = response
            .candidates
            .into_iter()
            .filter_map(|candidate| candidate.content)
            .flat_map(|content| content.parts)
            .find_map(|part| part.inline_data)
            .ok_or(GatewayError::NoImage)?;

        let bytes = BASE64
            .decode(data.data.as_bytes())
            .map_err(|e| GatewayError::Request(format!("invalid image data in response: {e}")))?;
        Ok(Frame::decode(&bytes)?)
    }

    async fn send_once(
        &self,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<Frame, GatewayError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let mut message = response.text().await.unwrap_or_default();
            if message.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !message.is_char_boundary(cut) {
                    cut -= 1;
                }
                message.truncate(cut);
            }
            return Err(GatewayError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateContentResponse = response.json().await?;
        Self::extract_image(body)
    }
}

/// JPEG encoding of a frame; JPEG has no alpha so it is dropped first
fn encode_jpeg(frame: &Frame) -> Result<Vec<u8>, GatewayError> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(frame.image().to_rgb8())
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)?;
    Ok(bytes)
}

#[async_trait]
impl TransformGateway for GeminiGateway {
    async fn transform(&self, image: Frame, instruction: String) -> Result<Frame, GatewayError> {
        let api_key = self.api_key.as_deref().ok_or(GatewayError::MissingApiKey)?;

        let jpeg = tokio::task::spawn_blocking(move || encode_jpeg(&image))
            .await
            .map_err(|e| GatewayError::Join(e.to_string()))??;
        let request = Self::build_request(&jpeg, &instruction);

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        let mut attempt = 0;
        let mut delay = self.base_delay;
        loop {
            attempt += 1;
            let error = match tokio::time::timeout(self.timeout, self.send_once(api_key, &request)).await {
                Ok(Ok(frame)) => {
                    if attempt > 1 {
                        tracing::info!(attempt, "Transformation recovered after retries");
                    }
                    return Ok(frame);
                }
                Ok(Err(e)) => e,
                Err(_) => GatewayError::Timeout(self.timeout.as_secs()),
            };

            if attempt >= self.max_attempts || !error.is_retryable() {
                return Err(error);
            }

            tracing::warn!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Transformation attempt failed, retrying: {error}"
            );
            tokio::time::sleep(delay).await;
            delay = delay.saturating_mul(2);
        }
    }
}
