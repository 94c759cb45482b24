//! HTTP client for the Gemini `generateContent` endpoint.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::GenerationConfig;
use crate::error::GeminiError;

use super::auth::AuthMethod;
use super::chat::ChatBackend;
use super::credentials::CredentialsFile;
use super::types::{Content, GenerateContentRequest, GenerateContentResponse};

const GENERATIVE_LANGUAGE_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Header carrying an API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Maximum number of response body characters kept in error messages.
const ERROR_BODY_PREVIEW: usize = 500;

/// How each request is authorized.
#[derive(Clone)]
pub enum RequestAuth {
    Bearer(String),
    ApiKey(String),
}

/// Client bound to one model.
pub struct GeminiClient {
    http: reqwest::Client,
    model_url: String,
    auth: RequestAuth,
}

impl GeminiClient {
    /// Build a client for the configured model.
    ///
    /// Credential files are exchanged for an access token here and target
    /// Vertex AI. API keys target the Generative Language API.
    pub async fn connect(
        config: &GenerationConfig,
        method: &AuthMethod,
    ) -> Result<Self, GeminiError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(GeminiError::Http)?;

        let (model_url, auth) = match method {
            AuthMethod::CredentialsFile { path, .. } => {
                let credentials = CredentialsFile::read(path)?;
                let token = credentials.fetch_access_token(&http).await?;
                (vertex_model_url(config), RequestAuth::Bearer(token))
            }
            AuthMethod::ApiKey(key) => (
                generative_language_model_url(config),
                RequestAuth::ApiKey(key.clone()),
            ),
        };

        info!("Initialized Gemini model {}", config.gemini_model);
        debug!("Model URL: {}", model_url);

        Ok(Self::with_model_url(http, model_url, auth))
    }

    /// Build a client against an explicit model URL.
    pub fn with_model_url(http: reqwest::Client, model_url: String, auth: RequestAuth) -> Self {
        Self {
            http,
            model_url,
            auth,
        }
    }

    pub fn model_url(&self) -> &str {
        &self.model_url
    }
}

#[async_trait]
impl ChatBackend for GeminiClient {
    async fn generate_content(
        &self,
        contents: &[Content],
    ) -> Result<Option<GenerateContentResponse>, GeminiError> {
        let url = format!("{}:generateContent", self.model_url);
        let request = self
            .http
            .post(&url)
            .json(&GenerateContentRequest { contents });

        let request = match &self.auth {
            RequestAuth::Bearer(token) => request.bearer_auth(token),
            RequestAuth::ApiKey(key) => request.header(API_KEY_HEADER, key),
        };

        let response = request.send().await.map_err(GeminiError::Http)?;
        let status = response.status();
        let body = response.text().await.map_err(GeminiError::Http)?;

        if !status.is_success() {
            return Err(GeminiError::Api {
                status: status.as_u16(),
                body: preview(&body),
            });
        }

        if body.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str::<Option<GenerateContentResponse>>(&body).map_err(|e| {
            GeminiError::Decode(format!("{}. Response: {}", e, preview(&body)))
        })
    }
}

/// Vertex AI publisher-model URL for the configured project and location.
pub fn vertex_model_url(config: &GenerationConfig) -> String {
    let base = match &config.api_endpoint {
        Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
        None if config.location == "global" => "https://aiplatform.googleapis.com".to_string(),
        None => format!("https://{}-aiplatform.googleapis.com", config.location),
    };

    format!(
        "{}/v1/projects/{}/locations/{}/publishers/google/models/{}",
        base, config.project_id, config.location, config.gemini_model
    )
}

/// Generative Language API model URL.
pub fn generative_language_model_url(config: &GenerationConfig) -> String {
    let base = config
        .api_endpoint
        .as_deref()
        .unwrap_or(GENERATIVE_LANGUAGE_ENDPOINT)
        .trim_end_matches('/');

    format!("{}/v1beta/models/{}", base, config.gemini_model)
}

fn preview(body: &str) -> String {
    body.chars().take(ERROR_BODY_PREVIEW).collect()
}
