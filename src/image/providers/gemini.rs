//! Gemini (Google) image edit provider.

use crate::error::{parse_retry_after, sanitize_error_message, EditError, Result};
use crate::image::provider::ImageEditor;
use crate::image::types::{decode_base64_lenient, ImagePayload};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::{Duration, Instant};

/// Default Gemini REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Message returned when no API key can be found at call time.
const MISSING_KEY_MESSAGE: &str = "API Key not found";

/// Environment variables consulted for the API key, in order.
const API_KEY_ENV_VARS: [&str; 2] = ["GOOGLE_API_KEY", "API_KEY"];

/// Environment variable selecting the model.
const MODEL_ENV_VAR: &str = "PRODUCTCLEAN_MODEL";

/// Edits are seconds-scale; anything past this is treated as a network failure.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Gemini image model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Nano Banana - Gemini 2.5 Flash Image (fast, economical).
    #[default]
    NanoBanana,
    /// Nano Banana Pro - Gemini 3 Pro Image (highest quality).
    NanoBananaPro,
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NanoBanana => "gemini-2.5-flash-image",
            Self::NanoBananaPro => "nano-banana-pro-preview",
        }
    }
}

impl FromStr for GeminiModel {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "flash" | "nano-banana" | "gemini-2.5-flash-image" => Ok(Self::NanoBanana),
            "pro" | "nano-banana-pro" | "nano-banana-pro-preview" => Ok(Self::NanoBananaPro),
            other => Err(EditError::InvalidRequest(format!(
                "unknown Gemini model: {other}"
            ))),
        }
    }
}

/// Wraps a user instruction in the product-photo editing prompt.
pub(crate) fn edit_prompt(instruction: &str) -> String {
    format!(
        "You are a professional product photo editor. {}. Please provide the resulting edited image.",
        instruction.trim()
    )
}

/// Builder for GeminiEditor.
#[derive(Debug, Clone, Default)]
pub struct GeminiEditorBuilder {
    api_key: Option<String>,
    model: Option<GeminiModel>,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl GeminiEditorBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `GOOGLE_API_KEY`, then `API_KEY`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the Gemini model variant. Falls back to `PRODUCTCLEAN_MODEL`.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = Some(model);
        self
    }

    /// Overrides the REST endpoint (e.g. for a proxy).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the HTTP timeout for a single edit.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the editor.
    ///
    /// A missing API key is not an error here: it is reported by
    /// [`ImageEditor::submit_edit`] so the session can surface it.
    pub fn build(self) -> Result<GeminiEditor> {
        let api_key = self.api_key.or_else(|| {
            API_KEY_ENV_VARS
                .iter()
                .find_map(|var| std::env::var(var).ok())
                .filter(|key| !key.trim().is_empty())
        });

        let model = match self.model {
            Some(model) => model,
            None => match std::env::var(MODEL_ENV_VAR) {
                Ok(value) => value.parse()?,
                Err(_) => GeminiModel::default(),
            },
        };

        let client = reqwest::Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()?;

        Ok(GeminiEditor {
            client,
            api_key,
            model,
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

/// Gemini image edit provider.
pub struct GeminiEditor {
    client: reqwest::Client,
    api_key: Option<String>,
    model: GeminiModel,
    base_url: String,
}

impl GeminiEditor {
    /// Creates a new `GeminiEditorBuilder`.
    pub fn builder() -> GeminiEditorBuilder {
        GeminiEditorBuilder::new()
    }

    /// Returns the configured model.
    pub fn model(&self) -> GeminiModel {
        self.model
    }

    /// Returns true if an API key is available.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| EditError::Auth(MISSING_KEY_MESSAGE.into()))
    }

    async fn edit_impl(&self, image: &ImagePayload, instruction: &str) -> Result<ImagePayload> {
        let api_key = self.api_key()?;
        let start = Instant::now();

        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url,
            self.model.as_str(),
        );

        let body = GeminiRequest::for_edit(image, instruction);

        tracing::debug!(
            model = self.model.as_str(),
            size_bytes = image.size(),
            mime_type = image.mime_type(),
            "submitting edit to Gemini"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text, &headers));
        }

        let gemini_response: GeminiResponse = response.json().await?;
        let edited = extract_image(gemini_response)?;

        tracing::info!(
            model = self.model.as_str(),
            duration_ms = start.elapsed().as_millis() as u64,
            size_bytes = edited.size(),
            "Gemini edit complete"
        );

        Ok(edited)
    }
}

#[async_trait]
impl ImageEditor for GeminiEditor {
    async fn submit_edit(&self, image: &ImagePayload, instruction: &str) -> Result<ImagePayload> {
        let result = self.edit_impl(image, instruction).await;
        if let Err(ref e) = result {
            tracing::warn!(model = self.model.as_str(), "Gemini API error: {e}");
        }
        result
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }

    async fn health_check(&self) -> Result<()> {
        let api_key = self.api_key()?;
        let url = format!("{}/models/{}", self.base_url, self.model.as_str());

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", api_key)
            .send()
            .await?;

        match response.status().as_u16() {
            401 | 403 => Err(EditError::Auth("Invalid API key".into())),
            404 => Err(EditError::InvalidRequest(
                "Model not found. Verify the model name is correct.".into(),
            )),
            s if !(200..300).contains(&s) => Err(EditError::Api {
                status: s,
                message: "Health check failed".into(),
            }),
            _ => Ok(()),
        }
    }
}

fn parse_error(status: u16, text: &str, headers: &reqwest::header::HeaderMap) -> EditError {
    let text = sanitize_error_message(text);
    if status == 404 {
        return EditError::InvalidRequest(
            "Model not found. Verify the model name is correct.".into(),
        );
    }
    if status == 429 {
        let retry_after = parse_retry_after(headers).map(Duration::from_secs);
        return EditError::RateLimited { retry_after };
    }
    if status == 401 || status == 403 {
        return EditError::Auth(format!("authentication failed: {text}"));
    }
    let lower = text.to_lowercase();
    if lower.contains("safety")
        || lower.contains("blocked")
        || lower.contains("content_policy")
        || lower.contains("prohibited")
    {
        return EditError::ContentBlocked(text);
    }
    EditError::Api {
        status,
        message: text,
    }
}

/// Pulls the first inline image out of a Gemini response.
fn extract_image(response: GeminiResponse) -> Result<ImagePayload> {
    // Blocked prompts still come back as HTTP 200
    if let Some(ref feedback) = response.prompt_feedback {
        if let Some(ref reason) = feedback.block_reason {
            let msg = feedback
                .block_reason_message
                .clone()
                .unwrap_or_else(|| format!("Prompt blocked: {}", reason));
            return Err(EditError::ContentBlocked(msg));
        }
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| EditError::UnexpectedResponse("No image data returned from AI".into()))?;

    if let Some(ref finish_reason) = candidate.finish_reason {
        match finish_reason.as_str() {
            "SAFETY"
            | "IMAGE_SAFETY"
            | "IMAGE_PROHIBITED_CONTENT"
            | "IMAGE_RECITATION"
            | "RECITATION"
            | "PROHIBITED_CONTENT"
            | "BLOCKLIST" => {
                return Err(EditError::ContentBlocked(format!(
                    "Content blocked by Gemini safety filter: {}",
                    finish_reason
                )));
            }
            "IMAGE_OTHER" | "NO_IMAGE" => {
                return Err(EditError::UnexpectedResponse(format!(
                    "Generation failed: {}. Try a different prompt.",
                    finish_reason
                )));
            }
            _ => {} // STOP, MAX_TOKENS, etc. are normal
        }
    }

    let content = candidate
        .content
        .ok_or_else(|| EditError::UnexpectedResponse("No image data returned from AI".into()))?;

    let inline_data = content
        .parts
        .into_iter()
        .find_map(|p| p.inline_data)
        .ok_or_else(|| {
            EditError::UnexpectedResponse("The AI response did not contain an image.".into())
        })?;

    let data =
        decode_base64_lenient(&inline_data.data).map_err(|e| EditError::Decode(e.to_string()))?;

    Ok(ImagePayload::new(data, inline_data.mime_type))
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - can be text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    Text { text: String },
    InlineData { inline_data: GeminiInlineData },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<String>,
}

impl GeminiRequest {
    fn for_edit(image: &ImagePayload, instruction: &str) -> Self {
        let parts = vec![
            GeminiRequestPart::InlineData {
                inline_data: GeminiInlineData {
                    mime_type: image.mime_type().to_string(),
                    data: image.to_base64(),
                },
            },
            GeminiRequestPart::Text {
                text: edit_prompt(instruction),
            },
        ];

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_modalities: vec!["IMAGE".to_string()],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}
