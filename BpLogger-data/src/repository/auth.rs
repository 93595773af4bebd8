//! Service-account authentication for the Google APIs
//!
//! A signed RS256 assertion is exchanged at the key's token endpoint for a
//! short-lived bearer token. Tokens are cached until shortly before expiry.

use std::time::{Duration, Instant};

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error};

use super::sheets::SheetsError;

/// Scopes requested for every token
pub const SCOPES: &str =
    "https://www.googleapis.com/auth/spreadsheets https://www.googleapis.com/auth/drive";

/// Token endpoint used when the key does not name one
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// The fields of a service-account key file we need
#[derive(Deserialize)]
struct RawKey {
    client_email: String,
    private_key: String,
    #[serde(default)]
    token_uri: Option<String>,
}

/// Parsed service-account key
pub struct ServiceAccountKey {
    pub client_email: String,
    pub token_uri: String,
    private_key: SecretString,
}

impl ServiceAccountKey {
    /// Parse a service-account key from its JSON form
    pub fn parse(json: &str) -> Result<Self, SheetsError> {
        if json.trim().is_empty() {
            return Err(SheetsError::Auth("service account credentials are empty".to_string()));
        }

        let raw: RawKey = serde_json::from_str(json)
            .map_err(|e| SheetsError::Auth(format!("invalid service account JSON: {}", e)))?;

        Ok(Self {
            client_email: raw.client_email,
            token_uri: raw
                .token_uri
                .filter(|uri| !uri.is_empty())
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
            private_key: SecretString::from(raw.private_key),
        })
    }

    /// Build the signed assertion sent to the token endpoint
    pub fn build_assertion(&self) -> Result<String, SheetsError> {
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: SCOPES,
            aud: &self.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        let key = EncodingKey::from_rsa_pem(self.private_key.expose_secret().as_bytes())
            .map_err(|e| SheetsError::Auth(format!("invalid private key: {}", e)))?;

        encode(&Header::new(Algorithm::RS256), &claims, &key).map_err(|e| {
            error!("Failed to sign service account assertion: {}", e);
            SheetsError::Auth(e.to_string())
        })
    }
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
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// Hands out bearer tokens for a service account
pub struct ServiceAccountAuth {
    credentials: SecretString,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub fn new(credentials: SecretString, http: reqwest::Client) -> Self {
        Self {
            credentials,
            http,
            cached: Mutex::new(None),
        }
    }

    /// Current bearer token, fetching a new one when the cached token is
    /// missing or about to expire
    pub async fn access_token(&self) -> Result<String, SheetsError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        let key = ServiceAccountKey::parse(self.credentials.expose_secret())?;
        let assertion = key.build_assertion()?;

        debug!("Requesting access token for {}", key.client_email);
        let response = self
            .http
            .post(&key.token_uri)
            .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| SheetsError::Auth(format!("token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Token endpoint returned {}: {}", status, body);
            return Err(SheetsError::Auth(format!("token endpoint returned {}: {}", status, body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SheetsError::Auth(format!("invalid token response: {}", e)))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(REFRESH_MARGIN);
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });

        Ok(token.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_credentials_are_rejected() {
        let err = ServiceAccountKey::parse("  ").err().unwrap();
        assert!(matches!(err, SheetsError::Auth(_)));
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        let err = ServiceAccountKey::parse("{not json").err().unwrap();
        assert!(matches!(err, SheetsError::Auth(_)));
    }

    #[test]
    fn test_token_uri_defaults() {
        let key = ServiceAccountKey::parse(
            r#"{"client_email":"svc@example.iam.gserviceaccount.com","private_key":"x"}"#,
        )
        .unwrap();
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
        assert_eq!(key.client_email, "svc@example.iam.gserviceaccount.com");
    }

    #[test]
    fn test_bad_private_key_fails_to_sign() {
        let key = ServiceAccountKey::parse(
            r#"{"client_email":"svc@example.com","private_key":"not a pem","token_uri":"https://example.com/token"}"#,
        )
        .unwrap();
        assert_eq!(key.token_uri, "https://example.com/token");

        let err = key.build_assertion().err().unwrap();
        assert!(matches!(err, SheetsError::Auth(_)));
    }

    #[tokio::test]
    async fn test_access_token_with_empty_credentials() {
        let auth = ServiceAccountAuth::new(SecretString::from(String::new()), reqwest::Client::new());
        let err = auth.access_token().await.err().unwrap();
        assert!(matches!(err, SheetsError::Auth(_)));
    }
}
