use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::types::ImageAttachment;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/analyze/";

/// Failures the console client distinguishes for the user. Each variant
/// maps to its own displayed message; none of them crash the session.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("API request timed out. Please try again later.")]
    Timeout,

    #[error("Could not connect to the API. Please check your internet connection.")]
    Connection,

    #[error("API request failed with status code {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Could not parse API response as JSON: {message}")]
    InvalidJson { message: String },

    #[error("API returned an error: {message}")]
    Api { message: String },

    #[error("API response is missing data field")]
    MissingData,

    #[error("API request error: {message}")]
    Request { message: String },
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    data: Option<Value>,
    error: Option<String>,
}

/// HTTP client for the aggregator service. One end-to-end timeout covers
/// the whole four-agent chain on the server side.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    api_url: String,
}

impl ApiClient {
    pub fn new(api_url: impl Into<String>, timeout_secs: u64) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("recovery_agents/0.1.0")
            .build()
            .map_err(|e| ClientError::Request {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// POST the text and images as one multipart request and return the
    /// raw `data` mapping. The mapping is kept as loose JSON so one
    /// malformed section can be isolated at render time.
    pub async fn analyze(
        &self,
        user_text: &str,
        images: &[ImageAttachment],
    ) -> Result<Value, ClientError> {
        let mut form = Form::new().text("user_input", user_text.to_string());
        for image in images {
            let part = Part::bytes(image.bytes.clone())
                .file_name(image.filename.clone())
                .mime_str(&image.media_type)
                .map_err(|e| ClientError::Request {
                    message: format!("Invalid media type for {}: {}", image.filename, e),
                })?;
            form = form.part("files", part);
        }

        let response = self
            .client
            .post(&self.api_url)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_reqwest_error)?;

        if status != StatusCode::OK {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: Envelope =
            serde_json::from_str(&body).map_err(|e| ClientError::InvalidJson {
                message: e.to_string(),
            })?;

        if !envelope.success {
            return Err(ClientError::Api {
                message: envelope
                    .error
                    .unwrap_or_else(|| "Unknown error".to_string()),
            });
        }

        envelope.data.ok_or(ClientError::MissingData)
    }
}

fn map_reqwest_error(error: reqwest::Error) -> ClientError {
    if error.is_timeout() {
        return ClientError::Timeout;
    }
    if error.is_connect() {
        return ClientError::Connection;
    }

    let error_msg = error.to_string().to_lowercase();
    if error_msg.contains("dns") || error_msg.contains("connection") {
        return ClientError::Connection;
    }

    ClientError::Request {
        message: error.to_string(),
    }
}

/// Read one image file into an upload attachment, guessing the media type
/// from the extension.
pub async fn load_attachment(path: &Path) -> std::io::Result<ImageAttachment> {
    let bytes = tokio::fs::read(path).await?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let media_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();
    Ok(ImageAttachment {
        filename,
        media_type,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api_client(server: &MockServer) -> ApiClient {
        ApiClient::new(format!("{}/analyze/", server.uri()), 5).unwrap()
    }

    fn success_body() -> Value {
        json!({
            "success": true,
            "data": {
                "therapist": {"status": "success", "data": "a"},
                "closure": {"status": "success", "data": "b"},
                "routine": {"status": "success", "data": "c"},
                "honesty": {"status": "failure", "data": "No response"}
            }
        })
    }

    #[tokio::test]
    async fn analyze_returns_data_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze/"))
            .and(body_string_contains("I feel hurt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .mount(&server)
            .await;

        let data = api_client(&server).analyze("I feel hurt", &[]).await.unwrap();
        assert_eq!(data["therapist"]["data"], json!("a"));
        assert_eq!(data["honesty"]["status"], json!("failure"));
    }

    #[tokio::test]
    async fn analyze_sends_image_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze/"))
            .and(body_string_contains("pic.png"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .expect(1)
            .mount(&server)
            .await;

        let image = ImageAttachment {
            filename: "pic.png".to_string(),
            media_type: "image/png".to_string(),
            bytes: b"png-bytes".to_vec(),
        };
        let result = api_client(&server).analyze("I feel hurt", &[image]).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn non_200_maps_to_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze/"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal failure"))
            .mount(&server)
            .await;

        let err = api_client(&server).analyze("I feel hurt", &[]).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "API request failed with status code 500: internal failure"
        );
    }

    #[tokio::test]
    async fn malformed_json_maps_to_invalid_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = api_client(&server).analyze("I feel hurt", &[]).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidJson { .. }));
    }

    #[tokio::test]
    async fn error_envelope_surfaces_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "error": "API_KEY environment variable is not set"
            })))
            .mount(&server)
            .await;

        let err = api_client(&server).analyze("I feel hurt", &[]).await.unwrap_err();
        match err {
            ClientError::Api { message } => {
                assert_eq!(message, "API_KEY environment variable is not set")
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_data_field_is_detected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .mount(&server)
            .await;

        let err = api_client(&server).analyze("I feel hurt", &[]).await.unwrap_err();
        assert!(matches!(err, ClientError::MissingData));
    }

    #[tokio::test]
    async fn unreachable_server_maps_to_connection_error() {
        // Nothing listens on this port; the connection is refused outright,
        // which must surface differently from a timeout.
        let client = ApiClient::new("http://127.0.0.1:1/analyze/", 5).unwrap();
        let err = client.analyze("I feel hurt", &[]).await.unwrap_err();
        assert!(matches!(err, ClientError::Connection));
    }
}
