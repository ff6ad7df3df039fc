use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;

use crate::config::DriveConfig;

const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files?uploadType=multipart&fields=id";
const BOUNDARY: &str = "academy-api-drive-boundary";
/// Refresh the access token this long before Google expires it
const TOKEN_SLACK_SECS: i64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum DriveError {
    #[error("invalid service account key: {0}")]
    Key(#[from] jsonwebtoken::errors::Error),
    #[error("drive request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("drive API returned {status}: {body}")]
    Api { status: u16, body: String },
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
    expires_in: i64,
}

#[derive(Deserialize)]
struct UploadResponse {
    id: String,
}

struct CachedToken {
    value: String,
    expires_at: i64,
}

/// Mirrors uploads into a Drive folder with a service account
#[derive(Clone)]
pub struct DriveMirror {
    config: Arc<DriveConfig>,
    http: reqwest::Client,
    token: Arc<Mutex<Option<CachedToken>>>,
}

impl DriveMirror {
    pub fn new(config: DriveConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_default();
        Self {
            config: Arc::new(config),
            http,
            token: Arc::new(Mutex::new(None)),
        }
    }

    /// Signed RS256 JWT exchanged for an OAuth access token
    fn assertion(&self, now: i64) -> Result<String, DriveError> {
        // Keys pasted into env files often carry literal `\n`
        let pem = self.config.private_key.replace("\\n", "\n");
        let key = EncodingKey::from_rsa_pem(pem.as_bytes())?;
        let claims = AssertionClaims {
            iss: &self.config.client_email,
            scope: DRIVE_SCOPE,
            aud: &self.config.token_uri,
            iat: now,
            exp: now + 3600,
        };
        Ok(encode(&Header::new(Algorithm::RS256), &claims, &key)?)
    }

    async fn access_token(&self) -> Result<String, DriveError> {
        let mut cached = self.token.lock().await;
        let now = Utc::now().timestamp();
        if let Some(token) = cached.as_ref() {
            if token.expires_at - TOKEN_SLACK_SECS > now {
                return Ok(token.value.clone());
            }
        }

        let assertion = self.assertion(now)?;
        let response = self
            .http
            .post(&self.config.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let token: TokenResponse = response.json().await?;

        tracing::debug!(expires_in = token.expires_in, "Obtained Drive access token");
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: now + token.expires_in,
        });
        Ok(token.access_token)
    }

    /// Uploads `bytes` and returns the Drive file id
    pub async fn upload(&self, name: &str, content_type: &str, bytes: Bytes) -> Result<String, DriveError> {
        let token = self.access_token().await?;
        let mut metadata = json!({ "name": name });
        if let Some(folder) = &self.config.folder_id {
            metadata["parents"] = json!([folder]);
        }
        let body = related_body(&metadata, content_type, &bytes);

        let response = self
            .http
            .post(UPLOAD_URL)
            .bearer_auth(token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", BOUNDARY),
            )
            .body(body)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let uploaded: UploadResponse = response.json().await?;

        tracing::info!(drive_file_id = %uploaded.id, name = %name, "Mirrored upload to Drive");
        Ok(uploaded.id)
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, DriveError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(DriveError::Api { status: status.as_u16(), body })
}

/// `multipart/related` body: JSON metadata part followed by the media part
fn related_body(metadata: &serde_json::Value, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(bytes.len() + 512);
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata.to_string().as_bytes());
    body.extend_from_slice(format!("\r\n--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mirror(private_key: &str) -> DriveMirror {
        DriveMirror::new(DriveConfig {
            client_email: "uploader@academy.iam.gserviceaccount.com".into(),
            private_key: private_key.into(),
            folder_id: Some("folder123".into()),
            token_uri: "https://oauth2.googleapis.com/token".into(),
        })
    }

    #[test]
    fn related_body_layout() {
        let body = related_body(&json!({"name": "a.png"}), "image/png", b"PNG");
        let text = String::from_utf8(body).unwrap();
        assert!(text.starts_with("--academy-api-drive-boundary\r\n"));
        assert!(text.contains(r#"{"name":"a.png"}"#));
        assert!(text.contains("Content-Type: image/png\r\n\r\nPNG\r\n"));
        assert!(text.ends_with("--academy-api-drive-boundary--\r\n"));
    }

    #[tokio::test]
    async fn malformed_key_fails_before_any_request() {
        let result = mirror("not a pem").upload("a.png", "image/png", Bytes::from_static(b"x")).await;
        assert!(matches!(result, Err(DriveError::Key(_))));
    }
}
