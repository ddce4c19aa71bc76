//! Image generation client for OpenAI-style `/images/generations` endpoints.

use crate::{ImageGenerationRequest, ImageGenerationResponse};
use async_trait::async_trait;
use scrivener_config::ImageConfig;
use scrivener_error::{ModelError, ModelErrorKind, ScrivenerResult};
use scrivener_interface::{GeneratedImage, ImageGeneration};
use std::time::Duration;
use tracing::{error, info, instrument};

/// Image generation timeout.
const IMAGE_TIMEOUT_SECS: u64 = 120;

/// Client for an `/images/generations` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiImageClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OpenAiImageClient {
    /// Create a client from the `[image]` configuration section.
    pub fn from_config(config: &ImageConfig) -> ScrivenerResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(IMAGE_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                ModelError::new(ModelErrorKind::Configuration(format!(
                    "Failed to build HTTP client: {}",
                    e
                )))
            })?;
        Ok(Self {
            base_url: config.base_url().clone(),
            model: config.model().clone(),
            api_key: config.api_key().clone(),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/images/generations", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ImageGeneration for OpenAiImageClient {
    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn generate_image(&self, prompt: &str, size: &str) -> ScrivenerResult<GeneratedImage> {
        let body = ImageGenerationRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            size: size.to_string(),
            response_format: "url".to_string(),
            stream: false,
            watermark: false,
        };

        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| {
            error!("Image request failed: {}", e);
            ModelError::new(ModelErrorKind::Http(format!("Image request failed: {}", e)))
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(ModelError::new(ModelErrorKind::Api {
                status: status.as_u16(),
                message,
            })
            .into());
        }

        let parsed: ImageGenerationResponse = response.json().await.map_err(|e| {
            ModelError::new(ModelErrorKind::Deserialization(format!(
                "Failed to parse image response: {}",
                e
            )))
        })?;

        if let Some(api_error) = parsed.error {
            return Err(ModelError::new(ModelErrorKind::Api {
                status: status.as_u16(),
                message: api_error.message,
            })
            .into());
        }

        let image = parsed.data.into_iter().next().unwrap_or_default();
        let url = image.url.ok_or_else(|| {
            ModelError::new(ModelErrorKind::EmptyResponse(
                "image response carried no url".to_string(),
            ))
        })?;

        info!(url = %url, "Image generated");
        Ok(GeneratedImage {
            url,
            size: image.size.unwrap_or_else(|| size.to_string()),
        })
    }
}
