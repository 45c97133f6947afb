//! Federated identity assertion verification.
//!
//! The auth service depends on [`IdentityVerifier`] to turn an opaque
//! `id_token` into typed claims. Signature and expiry checks belong to the
//! verifier; issuer, audience and subject policy is enforced by the caller
//! through [`IdentityClaims::check`].

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::instrument;

/// Issuers accepted for Google-signed ID tokens.
pub const TRUSTED_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Token-info endpoint that validates signature and expiry server-side.
const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Claims extracted from a verified identity assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaims {
    pub issuer: String,
    pub audience: String,
    pub subject: String,
    pub email: Option<String>,
    pub email_verified: bool,
}

/// Why claims were refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimsError {
    #[error("untrusted issuer: {0}")]
    UntrustedIssuer(String),

    #[error("token was issued for a different client")]
    AudienceMismatch,

    #[error("token has no subject")]
    MissingSubject,
}

impl IdentityClaims {
    /// Check issuer, audience and subject against policy.
    ///
    /// # Errors
    ///
    /// Returns the first failed check.
    pub fn check(&self, expected_audience: &str) -> Result<(), ClaimsError> {
        if !TRUSTED_ISSUERS.contains(&self.issuer.as_str()) {
            return Err(ClaimsError::UntrustedIssuer(self.issuer.clone()));
        }
        if self.audience != expected_audience {
            return Err(ClaimsError::AudienceMismatch);
        }
        if self.subject.trim().is_empty() {
            return Err(ClaimsError::MissingSubject);
        }
        Ok(())
    }
}

/// Errors from the verification capability itself.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The provider refused the token (bad signature, expired, malformed).
    #[error("identity token rejected: {0}")]
    Rejected(String),

    /// The provider could not be reached.
    #[error("identity provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Turns an opaque identity assertion into verified claims.
pub trait IdentityVerifier: Send + Sync {
    /// Verify `id_token` and return its claims.
    fn verify(
        &self,
        id_token: &str,
    ) -> impl Future<Output = Result<IdentityClaims, VerifyError>> + Send;
}

// =============================================================================
// Google
// =============================================================================

/// Verifies Google ID tokens through Google's token-info endpoint.
#[derive(Debug, Clone)]
pub struct GoogleTokenVerifier {
    client: reqwest::Client,
    endpoint: String,
}

impl GoogleTokenVerifier {
    /// Create a verifier against the public Google endpoint.
    ///
    /// # Errors
    ///
    /// Returns `VerifyError::Transport` if the HTTP client cannot be built.
    pub fn new() -> Result<Self, VerifyError> {
        Self::with_endpoint(GOOGLE_TOKENINFO_URL)
    }

    /// Create a verifier against a custom token-info endpoint.
    ///
    /// # Errors
    ///
    /// Returns `VerifyError::Transport` if the HTTP client cannot be built.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self, VerifyError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

impl IdentityVerifier for GoogleTokenVerifier {
    #[instrument(skip_all)]
    async fn verify(&self, id_token: &str) -> Result<IdentityClaims, VerifyError> {
        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("id_token", id_token)])
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), "Identity token rejected");
            return Err(VerifyError::Rejected(message));
        }

        let info: TokenInfo = response.json().await?;
        Ok(info.into())
    }
}

/// Token-info response body. Google encodes booleans as strings here.
#[derive(Debug, Deserialize)]
struct TokenInfo {
    #[serde(default)]
    iss: String,
    #[serde(default)]
    aud: String,
    #[serde(default)]
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    email_verified: bool,
}

impl From<TokenInfo> for IdentityClaims {
    fn from(info: TokenInfo) -> Self {
        Self {
            issuer: info.iss,
            audience: info.aud,
            subject: info.sub,
            email: info.email.filter(|e| !e.trim().is_empty()),
            email_verified: info.email_verified,
        }
    }
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    Ok(match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(b) => b,
        BoolOrString::String(s) => s.eq_ignore_ascii_case("true"),
    })
}
