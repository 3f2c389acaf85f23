//! Authentication extractor.
//!
//! Every `/v1` route takes an [`AuthUser`]: the bearer token is verified
//! against the identity provider's JWKS and its `sub` claim becomes the
//! [`UserId`] passed to every tracker operation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tokio::sync::RwLock;

use habit_core::UserId;

use crate::config::ServiceConfig;
use crate::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Constants
// ============================================================================

/// How long fetched keys are trusted before the JWKS is fetched again.
const JWKS_REFRESH_INTERVAL: Duration = Duration::from_secs(3600); // 1 hour

/// Timeout for JWKS fetch requests.
const JWKS_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// An authenticated user extracted from a bearer JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user ID (the token's subject).
    pub user_id: UserId,
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Self, Self::Rejection>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let token = bearer_token(parts).ok_or(ApiError::Unauthorized)?;

            // Test tokens are compiled in only for tests and the "test-auth"
            // feature, never in production builds.
            #[cfg(any(test, feature = "test-auth"))]
            if let Some(subject) = token.strip_prefix("test-token:") {
                let user_id = subject
                    .parse::<UserId>()
                    .map_err(|_| ApiError::Unauthorized)?;
                return Ok(AuthUser { user_id });
            }

            let claims = state.jwks.verify(token, &state.config).await?;
            let user_id = claims.sub.parse::<UserId>().map_err(|e| {
                tracing::debug!(error = %e, "JWT subject is not a valid user ID");
                ApiError::Unauthorized
            })?;

            Ok(AuthUser { user_id })
        })
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Claims read from a verified token.
///
/// `exp`, `iss` and `aud` are checked by `jsonwebtoken` during decoding.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID).
    pub sub: String,
    /// Expiration time.
    pub exp: i64,
}

// ============================================================================
// JWKS
// ============================================================================

/// JWKS (JSON Web Key Set) response structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwks {
    /// List of JWK keys.
    pub keys: Vec<Jwk>,
}

/// Single JSON Web Key.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key type (e.g., "RSA").
    pub kty: String,
    /// Key ID.
    pub kid: Option<String>,
    /// RSA public key modulus (base64url encoded).
    pub n: Option<String>,
    /// RSA public key exponent (base64url encoded).
    pub e: Option<String>,
}

impl Jwk {
    /// Build a decoding key. Only RSA keys are supported.
    fn decoding_key(&self) -> Option<DecodingKey> {
        if self.kty != "RSA" {
            tracing::debug!(kty = %self.kty, "Skipping non-RSA JWK");
            return None;
        }
        DecodingKey::from_rsa_components(self.n.as_ref()?, self.e.as_ref()?).ok()
    }
}

#[derive(Default)]
struct KeySet {
    by_kid: HashMap<String, DecodingKey>,
    /// Used for tokens without a `kid` header.
    fallback: Option<DecodingKey>,
    fetched_at: Option<Instant>,
}

impl KeySet {
    fn is_fresh(&self) -> bool {
        self.fetched_at
            .is_some_and(|at| at.elapsed() < JWKS_REFRESH_INTERVAL)
    }

    fn lookup(&self, kid: Option<&str>) -> Option<DecodingKey> {
        match kid {
            Some(kid) => self.by_kid.get(kid).cloned(),
            None => self.fallback.clone(),
        }
    }

    fn from_jwks(jwks: &Jwks) -> Self {
        let mut set = Self {
            fetched_at: Some(Instant::now()),
            ..Self::default()
        };
        for jwk in &jwks.keys {
            let Some(key) = jwk.decoding_key() else {
                continue;
            };
            if let Some(kid) = &jwk.kid {
                set.by_kid.insert(kid.clone(), key.clone());
            }
            set.fallback.get_or_insert(key);
        }
        set
    }
}

/// Verifies bearer tokens against a cached JWKS.
///
/// Keys are fetched on first use and again when they expire or a token names
/// an unknown `kid` (key rotation).
pub struct JwksVerifier {
    /// Reused across fetches for connection pooling.
    client: reqwest::Client,
    keys: RwLock<KeySet>,
}

impl JwksVerifier {
    /// Create a verifier with an empty key cache.
    #[must_use]
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(JWKS_FETCH_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            keys: RwLock::new(KeySet::default()),
        }
    }

    /// Validate a token's signature, expiry, issuer and audience.
    async fn verify(&self, token: &str, config: &ServiceConfig) -> Result<JwtClaims, ApiError> {
        let header = decode_header(token).map_err(|e| {
            tracing::debug!(error = %e, "Failed to decode JWT header");
            ApiError::Unauthorized
        })?;

        let key = self.key_for(header.kid.as_deref(), config).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&config.auth_audience]);
        validation.set_issuer(&[&config.auth_issuer]);

        let data = decode::<JwtClaims>(token, &key, &validation).map_err(|e| {
            tracing::debug!(error = %e, "JWT validation failed");
            ApiError::Unauthorized
        })?;

        Ok(data.claims)
    }

    async fn key_for(
        &self,
        kid: Option<&str>,
        config: &ServiceConfig,
    ) -> Result<DecodingKey, ApiError> {
        {
            let keys = self.keys.read().await;
            if keys.is_fresh() {
                if let Some(key) = keys.lookup(kid) {
                    return Ok(key);
                }
            }
        }

        let jwks = self.fetch(&config.auth_jwks_url).await?;
        let fresh = KeySet::from_jwks(&jwks);
        let key = fresh.lookup(kid);
        *self.keys.write().await = fresh;

        key.ok_or(ApiError::Unauthorized)
    }

    async fn fetch(&self, url: &str) -> Result<Jwks, ApiError> {
        tracing::debug!(url = %url, "Fetching JWKS");

        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::error!(error = %e, url = %url, "Failed to fetch JWKS");
            ApiError::ExternalService("Failed to fetch authentication keys".into())
        })?;

        if !response.status().is_success() {
            tracing::error!(
                status = %response.status(),
                url = %url,
                "JWKS fetch returned non-success status"
            );
            return Err(ApiError::ExternalService(
                "Failed to fetch authentication keys".into(),
            ));
        }

        let jwks: Jwks = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to parse JWKS response");
            ApiError::ExternalService("Failed to parse authentication keys".into())
        })?;

        tracing::info!(keys_count = jwks.keys.len(), "JWKS fetched");
        Ok(jwks)
    }
}

impl Default for JwksVerifier {
    fn default() -> Self {
        Self::new()
    }
}
