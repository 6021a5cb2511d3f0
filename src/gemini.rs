use std::fmt;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::types::ImageAttachment;

/// Custom error types for Gemini API interactions
#[derive(Error, Debug)]
pub enum GeminiError {
    #[error("Gemini servers are currently busy. Please try again in a few moments.")]
    ServerBusy,

    #[error("Network connection failed: {message}")]
    NetworkError { message: String },

    #[error("Request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {message}")]
    ParseError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

impl GeminiError {
    /// Check if the error indicates server is busy
    #[allow(dead_code)]
    pub fn is_server_busy(&self) -> bool {
        matches!(self, GeminiError::ServerBusy)
    }

    /// Check if the error is a network-related issue
    #[allow(dead_code)]
    pub fn is_network_error(&self) -> bool {
        matches!(self, GeminiError::NetworkError { .. })
    }
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text(TextPart),
    InlineData(InlineDataPart),
}

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct InlineDataPart {
    #[serde(rename = "inlineData")]
    inline_data: InlineData,
}

#[derive(Debug, Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Tool {
    #[serde(rename = "googleSearch")]
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

// ============================================================================
// Client
// ============================================================================

/// Gemini generateContent client. One instance per persona; the Honesty
/// Agent's instance may carry search grounding.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    config: Config,
    search_grounding: bool,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .field("search_grounding", &self.search_grounding)
            .finish()
    }
}

impl GeminiClient {
    /// Create a new Gemini client with the given configuration
    pub fn new(config: Config) -> Result<Self, GeminiError> {
        config.validate().map_err(|e| GeminiError::ConfigError {
            message: e.to_string(),
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent("recovery_agents/0.1.0")
            .build()
            .map_err(|e| GeminiError::ConfigError {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            config,
            search_grounding: false,
        })
    }

    /// Attach the googleSearch tool to every request made by this client.
    pub fn with_search_grounding(mut self) -> Self {
        self.search_grounding = true;
        self
    }

    /// Send one generateContent request. Returns `Ok(None)` when the model
    /// produced no usable text, which is distinct from a failed call.
    pub async fn generate(
        &self,
        instructions: &str,
        message: &str,
        images: &[ImageAttachment],
    ) -> Result<Option<String>, GeminiError> {
        let mut parts = vec![Part::Text(TextPart {
            text: message.to_string(),
        })];
        for image in images {
            parts.push(Part::InlineData(InlineDataPart {
                inline_data: InlineData {
                    mime_type: image.media_type.clone(),
                    data: BASE64.encode(&image.bytes),
                },
            }));
        }

        let request = GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            system_instruction: Some(SystemInstruction {
                parts: vec![TextPart {
                    text: instructions.to_string(),
                }],
            }),
            generation_config: Some(GenerationConfig {
                max_output_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
            }),
            tools: if self.search_grounding {
                Some(vec![Tool {
                    google_search: GoogleSearch {},
                }])
            } else {
                None
            },
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.handle_error_response(status, response).await);
        }

        let api_response: GenerateResponse =
            response.json().await.map_err(|e| GeminiError::ParseError {
                message: format!("Failed to parse API response: {}", e),
            })?;

        if let Some(error) = api_response.error {
            return Err(GeminiError::ApiError {
                status: status.as_u16(),
                message: error.message,
            });
        }

        let text: String = api_response
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts)
            .map(|parts| parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }

    /// Map reqwest errors to our custom error types
    fn map_reqwest_error(&self, error: reqwest::Error) -> GeminiError {
        if error.is_timeout() {
            return GeminiError::Timeout {
                seconds: self.config.timeout,
            };
        }

        if error.is_connect() {
            return GeminiError::NetworkError {
                message: "Failed to connect to server".to_string(),
            };
        }

        let error_msg = error.to_string().to_lowercase();
        if error_msg.contains("dns") {
            return GeminiError::NetworkError {
                message: "DNS resolution failed".to_string(),
            };
        }

        if error_msg.contains("network") || error_msg.contains("connection") {
            return GeminiError::NetworkError {
                message: error.to_string(),
            };
        }

        GeminiError::NetworkError {
            message: format!("Request error: {}", error),
        }
    }

    /// Handle error responses from the server
    async fn handle_error_response(
        &self,
        status: StatusCode,
        response: reqwest::Response,
    ) -> GeminiError {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        match status {
            StatusCode::TOO_MANY_REQUESTS => GeminiError::ServerBusy,
            StatusCode::SERVICE_UNAVAILABLE => GeminiError::ServerBusy,
            StatusCode::BAD_GATEWAY | StatusCode::GATEWAY_TIMEOUT => GeminiError::ServerBusy,
            _ => GeminiError::ApiError {
                status: status.as_u16(),
                message: error_text,
            },
        }
    }
}
