//! Google credential files and OAuth access-token exchange.

use std::path::{Path, PathBuf};

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GeminiError;

/// OAuth scope needed for Vertex AI.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for a signed assertion (Google's maximum).
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Supported credential file types, tagged by their `type` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialsFile {
    ServiceAccount(ServiceAccountKey),
    AuthorizedUser(AuthorizedUser),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizedUser {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl CredentialsFile {
    /// Read and parse a credentials JSON file.
    pub fn read(path: &Path) -> Result<Self, GeminiError> {
        let content = std::fs::read_to_string(path).map_err(|source| GeminiError::CredentialsRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    fn parse(path: &Path, content: &str) -> Result<Self, GeminiError> {
        serde_json::from_str(content).map_err(|e| GeminiError::InvalidCredentials {
            path: PathBuf::from(path),
            reason: e.to_string(),
        })
    }

    pub fn token_uri(&self) -> &str {
        let uri = match self {
            CredentialsFile::ServiceAccount(key) => key.token_uri.as_deref(),
            CredentialsFile::AuthorizedUser(user) => user.token_uri.as_deref(),
        };
        uri.unwrap_or(DEFAULT_TOKEN_URI)
    }

    /// Exchange the credentials for a bearer access token.
    pub async fn fetch_access_token(
        &self,
        http: &reqwest::Client,
    ) -> Result<String, GeminiError> {
        let token_uri = self.token_uri();

        match self {
            CredentialsFile::ServiceAccount(key) => {
                debug!("Exchanging service account assertion for {}", key.client_email);
                let assertion = sign_assertion(key, token_uri)?;
                exchange(
                    http,
                    token_uri,
                    &[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())],
                )
                .await
            }
            CredentialsFile::AuthorizedUser(user) => {
                debug!("Refreshing authorized user token");
                exchange(
                    http,
                    token_uri,
                    &[
                        ("grant_type", "refresh_token"),
                        ("client_id", user.client_id.as_str()),
                        ("client_secret", user.client_secret.as_str()),
                        ("refresh_token", user.refresh_token.as_str()),
                    ],
                )
                .await
            }
        }
    }
}

fn sign_assertion(key: &ServiceAccountKey, audience: &str) -> Result<String, GeminiError> {
    let now = Utc::now().timestamp();
    let claims = AssertionClaims {
        iss: &key.client_email,
        scope: CLOUD_PLATFORM_SCOPE,
        aud: audience,
        iat: now,
        exp: now + ASSERTION_LIFETIME_SECS,
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let encoding_key =
        EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(GeminiError::Signing)?;

    jsonwebtoken::encode(&header, &claims, &encoding_key).map_err(GeminiError::Signing)
}

async fn exchange(
    http: &reqwest::Client,
    token_uri: &str,
    form: &[(&str, &str)],
) -> Result<String, GeminiError> {
    let response = http
        .post(token_uri)
        .form(form)
        .send()
        .await
        .map_err(GeminiError::Http)?;

    let status = response.status();
    let body = response.text().await.map_err(GeminiError::Http)?;

    if !status.is_success() {
        return Err(GeminiError::TokenExchange {
            status: status.as_u16(),
            body,
        });
    }

    let token: TokenResponse = serde_json::from_str(&body)
        .map_err(|e| GeminiError::Decode(format!("token response: {}", e)))?;
    Ok(token.access_token)
}
