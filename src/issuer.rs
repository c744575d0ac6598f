//! Development token minting.
//!
//! [`TokenIssuer`] signs short-lived RS256 JWTs with the process's private
//! key, with the configured issuer and audience baked in. This is a local
//! testing aid: the server only exposes it when development mode is enabled,
//! and it is never part of a production credential flow.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{Algorithm, Header};

use crate::config::GateConfig;
use crate::error::IssueError;
use crate::key::KeyMaterial;
use crate::validator::{unix_now, Claims, TokenAudience};

/// Hard upper bound on issued token lifetime.
///
/// Keeps an over-generous `ttl` parameter from minting accidental
/// long-lived credentials.
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(4 * 60 * 60);

/// Default lifetime when the caller does not ask for one.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

/// Mints development JWTs against the process key material.
#[derive(Clone)]
pub struct TokenIssuer {
    key: Arc<KeyMaterial>,
    issuer: String,
    audience: String,
}

impl TokenIssuer {
    /// Create an issuer bound to the given key material and configuration.
    pub fn new(key: Arc<KeyMaterial>, config: &GateConfig) -> Self {
        Self {
            key,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
        }
    }

    /// Sign a token for `subject` with the given scopes and lifetime.
    ///
    /// `ttl` is clamped to [`MAX_TOKEN_TTL`]. Fails if the key material is
    /// verify-only.
    pub fn issue(
        &self,
        subject: &str,
        scopes: impl IntoIterator<Item = impl Into<String>>,
        ttl: Duration,
    ) -> Result<String, IssueError> {
        self.issue_at(subject, scopes, ttl, unix_now())
    }

    /// Sign with an explicit clock, for callers that control time.
    pub fn issue_at(
        &self,
        subject: &str,
        scopes: impl IntoIterator<Item = impl Into<String>>,
        ttl: Duration,
        now: u64,
    ) -> Result<String, IssueError> {
        let signing_key = self.key.signing_key().ok_or(IssueError::NoSigningKey)?;

        let ttl = ttl.min(MAX_TOKEN_TTL);
        let scope_list: Vec<String> = scopes.into_iter().map(Into::into).collect();
        let scope = if scope_list.is_empty() {
            None
        } else {
            Some(scope_list.join(" "))
        };

        let claims = Claims {
            iss: Some(self.issuer.clone()),
            aud: Some(TokenAudience::Single(self.audience.clone())),
            sub: Some(subject.to_string()),
            exp: Some(now + ttl.as_secs()),
            iat: Some(now),
            scope,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.key.kid().to_string());

        let token = jsonwebtoken::encode(&header, &claims, signing_key)
            .map_err(|e| IssueError::Signing(e.to_string()))?;

        tracing::debug!(subject, ttl_secs = ttl.as_secs(), "issued development token");
        Ok(token)
    }
}
