//! Bearer token validation.
//!
//! [`TokenValidator`] verifies a raw JWT against the configured key
//! material, issuer, audience, and an operation's required scopes, and
//! produces a [`Principal`] on success. Verification is ordered and
//! short-circuits: structural decode, signature, issuer, audience, expiry,
//! scope. The first failing step determines the error.
//!
//! Validation is a pure function of token + configuration + clock; it
//! performs no I/O and no mutation, so a validator can be shared freely
//! across concurrent requests.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, Validation};
use serde::{Deserialize, Serialize};

use crate::config::GateConfig;
use crate::error::AuthError;
use crate::key::KeyMaterial;
use crate::scope::ScopeRequirement;

/// Seconds since the Unix epoch.
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Audience claim value; a single string or an array of strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenAudience {
    /// A single audience string.
    Single(String),
    /// Multiple audience strings.
    Multiple(Vec<String>),
}

impl TokenAudience {
    /// Check if the audience contains a specific value.
    pub fn contains(&self, value: &str) -> bool {
        match self {
            TokenAudience::Single(s) => s == value,
            TokenAudience::Multiple(v) => v.iter().any(|s| s == value),
        }
    }
}

/// Raw JWT claims as decoded from the token payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience (this resource server or other identifiers).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<TokenAudience>,

    /// Subject (user/client identifier).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Expiration time (Unix timestamp).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,

    /// Issued-at time (Unix timestamp).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,

    /// Space-delimited scope string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl Claims {
    /// Parse the scope string into a set of individual scopes.
    pub fn scopes(&self) -> HashSet<String> {
        self.scope
            .as_deref()
            .unwrap_or("")
            .split_whitespace()
            .map(String::from)
            .collect()
    }
}

/// The authenticated identity derived from a validated token.
///
/// Created by [`TokenValidator`] on success; immutable; lives for the
/// duration of one request (injected into request extensions by the gate).
#[derive(Debug, Clone)]
pub struct Principal {
    /// Subject identifier from the token's `sub` claim.
    pub subject: String,
    /// Issuer that signed the token.
    pub issuer: String,
    /// Audience the token was validated against.
    pub audience: String,
    /// Scopes granted to the token.
    pub scopes: HashSet<String>,
    /// Expiry timestamp (seconds since Unix epoch).
    pub expires_at: u64,
}

impl Principal {
    /// Check if the principal holds a specific scope.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }
}

/// Verifies bearer tokens against the configured key and claims.
#[derive(Clone)]
pub struct TokenValidator {
    key: Arc<KeyMaterial>,
    issuer: String,
    audience: String,
}

impl TokenValidator {
    /// Create a validator bound to the given key material and configuration.
    pub fn new(key: Arc<KeyMaterial>, config: &GateConfig) -> Self {
        Self {
            key,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
        }
    }

    /// Validate a raw token against the operation's required scopes.
    ///
    /// Judged against the current time with zero grace period.
    pub fn validate(
        &self,
        token: &str,
        required: &ScopeRequirement,
    ) -> Result<Principal, AuthError> {
        self.validate_at(token, required, unix_now())
    }

    /// Validate with an explicit clock, for callers that control time.
    ///
    /// Checks run in a fixed order and short-circuit on the first failure:
    /// structural decode, signature, issuer, audience, expiry, scope.
    pub fn validate_at(
        &self,
        token: &str,
        required: &ScopeRequirement,
        now: u64,
    ) -> Result<Principal, AuthError> {
        // Structural decode of the header; anything that is not a JWT
        // fails here before any cryptography runs.
        jsonwebtoken::decode_header(token).map_err(|e| AuthError::MalformedToken {
            reason: e.to_string(),
        })?;

        // Signature check. Claim validation is disabled here so the
        // per-claim checks below control both ordering and error kinds;
        // the jsonwebtoken crate performs the actual RS256 verification.
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let decoded =
            jsonwebtoken::decode::<Claims>(token, self.key.decoding_key(), &validation).map_err(
                |e| match e.kind() {
                    ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                    _ => AuthError::MalformedToken {
                        reason: e.to_string(),
                    },
                },
            )?;
        let claims = decoded.claims;

        // Claims the rest of the pipeline depends on must be present.
        let subject = claims.sub.clone().ok_or_else(|| AuthError::MalformedToken {
            reason: "missing `sub` claim".to_string(),
        })?;
        let expires_at = claims.exp.ok_or_else(|| AuthError::MalformedToken {
            reason: "missing `exp` claim".to_string(),
        })?;

        match claims.iss.as_deref() {
            Some(iss) if iss == self.issuer => {}
            _ => return Err(AuthError::IssuerMismatch),
        }

        match &claims.aud {
            Some(aud) if aud.contains(&self.audience) => {}
            _ => return Err(AuthError::AudienceMismatch),
        }

        if now >= expires_at {
            return Err(AuthError::Expired);
        }

        let scopes = claims.scopes();
        required.check(&scopes)?;

        tracing::debug!(subject = %subject, "token validated");

        Ok(Principal {
            subject,
            issuer: self.issuer.clone(),
            audience: self.audience.clone(),
            scopes,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issuer::TokenIssuer;
    use crate::test_support::{other_key, test_config, test_key};
    use std::time::Duration;

    fn validator() -> TokenValidator {
        TokenValidator::new(test_key(), &test_config())
    }

    fn issue(scopes: &[&str], ttl_secs: u64) -> String {
        TokenIssuer::new(test_key(), &test_config())
            .issue("alice", scopes.iter().copied(), Duration::from_secs(ttl_secs))
            .unwrap()
    }

    #[test]
    fn test_valid_token_yields_principal() {
        let token = issue(&["tools:call"], 3600);
        let principal = validator()
            .validate(&token, &ScopeRequirement::one("tools:call"))
            .unwrap();
        assert_eq!(principal.subject, "alice");
        assert_eq!(principal.issuer, "https://dev.example.com");
        assert_eq!(principal.audience, "my-mcp-server");
        assert!(principal.has_scope("tools:call"));
        assert!(principal.expires_at > unix_now());
    }

    #[test]
    fn test_garbage_is_malformed() {
        let err = validator()
            .validate("not-a-jwt", &ScopeRequirement::new())
            .unwrap_err();
        assert!(matches!(err, AuthError::MalformedToken { .. }));
    }

    #[test]
    fn test_tampered_signature() {
        let mut token = issue(&[], 3600);
        // Flip the last character of the signature segment
        let last = token.pop().unwrap();
        token.push(if last == 'A' { 'B' } else { 'A' });

        let err = validator()
            .validate(&token, &ScopeRequirement::new())
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature));
    }

    #[test]
    fn test_other_key_is_invalid_signature_even_with_matching_claims() {
        // Signed by a different keypair but with otherwise perfect claims
        let token = TokenIssuer::new(other_key(), &test_config())
            .issue("alice", ["tools:call"], Duration::from_secs(3600))
            .unwrap();

        let err = validator()
            .validate(&token, &ScopeRequirement::new())
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature));
    }

    #[test]
    fn test_issuer_mismatch() {
        let foreign = GateConfig::new(
            "https://other.example.com",
            "my-mcp-server",
            "http://127.0.0.1:8000",
        );
        let token = TokenIssuer::new(test_key(), &foreign)
            .issue("alice", [] as [&str; 0], Duration::from_secs(3600))
            .unwrap();

        let err = validator()
            .validate(&token, &ScopeRequirement::new())
            .unwrap_err();
        assert!(matches!(err, AuthError::IssuerMismatch));
    }

    #[test]
    fn test_audience_mismatch() {
        let foreign = GateConfig::new(
            "https://dev.example.com",
            "someone-elses-server",
            "http://127.0.0.1:8000",
        );
        let token = TokenIssuer::new(test_key(), &foreign)
            .issue("alice", [] as [&str; 0], Duration::from_secs(3600))
            .unwrap();

        let err = validator()
            .validate(&token, &ScopeRequirement::new())
            .unwrap_err();
        assert!(matches!(err, AuthError::AudienceMismatch));
    }

    #[test]
    fn test_expired_with_zero_grace() {
        let token = issue(&["read"], 3600);
        let v = validator();

        // Fine now, expired the second the clock reaches exp
        let principal = v
            .validate_at(&token, &ScopeRequirement::new(), unix_now())
            .unwrap();
        let err = v
            .validate_at(&token, &ScopeRequirement::new(), principal.expires_at)
            .unwrap_err();
        assert!(matches!(err, AuthError::Expired));
    }

    #[test]
    fn test_expiry_checked_before_scope() {
        let token = issue(&[], 3600);
        let v = validator();
        let exp = v
            .validate_at(&token, &ScopeRequirement::new(), unix_now())
            .unwrap()
            .expires_at;

        // Token is both expired and missing the required scope; expiry wins
        let err = v
            .validate_at(&token, &ScopeRequirement::one("tools:call"), exp + 1)
            .unwrap_err();
        assert!(matches!(err, AuthError::Expired));
    }

    #[test]
    fn test_insufficient_scope() {
        let token = issue(&["read"], 3600);
        let err = validator()
            .validate(&token, &ScopeRequirement::one("tools:call"))
            .unwrap_err();
        match err {
            AuthError::InsufficientScope { required, provided } => {
                assert_eq!(required, vec!["tools:call"]);
                assert_eq!(provided, vec!["read"]);
            }
            other => panic!("expected InsufficientScope, got {other:?}"),
        }
    }

    #[test]
    fn test_audience_array_accepted() {
        let aud = TokenAudience::Multiple(vec![
            "other".to_string(),
            "my-mcp-server".to_string(),
        ]);
        assert!(aud.contains("my-mcp-server"));
        assert!(!aud.contains("third"));
    }

    #[test]
    fn test_claims_scope_parsing() {
        let claims = Claims {
            iss: None,
            aud: None,
            sub: None,
            exp: None,
            iat: None,
            scope: Some("read write tools:call".to_string()),
        };
        let scopes = claims.scopes();
        assert_eq!(scopes.len(), 3);
        assert!(scopes.contains("tools:call"));
    }
}
