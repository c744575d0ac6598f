//! Error types for the authentication gate.
//!
//! Token and request failures follow RFC 6750 Section 3, including the
//! `resource_metadata` parameter from RFC 9728 so rejected clients can
//! discover the Protected Resource Metadata document.

/// Boxed error type used at transport boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A failed token validation or credential extraction.
///
/// Each variant maps to a specific HTTP status code, a machine-readable
/// error code, and a `WWW-Authenticate` header value per RFC 6750 Section 3.
/// Validation short-circuits, so a rejected request carries exactly one of
/// these.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    /// The token could not be decoded as a JWT at all.
    #[error("malformed token: {reason}")]
    MalformedToken {
        /// Why decoding failed. Never contains token material.
        reason: String,
    },

    /// The signature does not verify under the configured public key.
    #[error("token signature does not verify")]
    InvalidSignature,

    /// The `exp` claim is in the past (zero grace period).
    #[error("token has expired")]
    Expired,

    /// The `iss` claim does not equal the configured issuer.
    #[error("token issuer does not match this server")]
    IssuerMismatch,

    /// The `aud` claim does not contain the configured audience.
    #[error("token audience does not match this resource")]
    AudienceMismatch,

    /// The token's scopes do not cover the operation's required scopes.
    #[error("insufficient scope: required [{}], provided [{}]", required.join(", "), provided.join(", "))]
    InsufficientScope {
        /// Scopes required by the operation, sorted.
        required: Vec<String>,
        /// Scopes present in the token, sorted.
        provided: Vec<String>,
    },

    /// No `Authorization: Bearer` header was present on the request.
    #[error("missing bearer credential")]
    MissingCredential,
}

impl AuthError {
    /// Machine-readable error code surfaced in rejection bodies.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MalformedToken { .. } => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::Expired => "expired",
            AuthError::IssuerMismatch => "issuer_mismatch",
            AuthError::AudienceMismatch => "audience_mismatch",
            AuthError::InsufficientScope { .. } => "insufficient_scope",
            AuthError::MissingCredential => "missing_credential",
        }
    }

    /// HTTP status code for this error.
    ///
    /// 401 for credential and token problems, 403 for insufficient scope.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::InsufficientScope { .. } => 403,
            _ => 401,
        }
    }

    /// Builds the `WWW-Authenticate` header value per RFC 6750 Section 3.
    ///
    /// When `resource_metadata_url` is provided, includes the
    /// `resource_metadata` parameter per RFC 9728 so clients can discover
    /// the authorization server.
    pub fn www_authenticate(&self, resource_metadata_url: Option<&str>) -> String {
        let mut parts = Vec::new();

        if let Some(url) = resource_metadata_url {
            parts.push(format!("resource_metadata=\"{}\"", url));
        }

        match self {
            AuthError::MissingCredential => {
                // RFC 6750 Section 3: a request with no authentication
                // information gets a challenge without an error code.
                if parts.is_empty() {
                    return "Bearer".to_string();
                }
                format!("Bearer {}", parts.join(", "))
            }
            AuthError::InsufficientScope { required, .. } => {
                parts.push("error=\"insufficient_scope\"".to_string());
                if !required.is_empty() {
                    parts.push(format!("scope=\"{}\"", required.join(" ")));
                }
                format!("Bearer {}", parts.join(", "))
            }
            other => {
                parts.push("error=\"invalid_token\"".to_string());
                parts.push(format!("error_description=\"{}\"", other));
                format!("Bearer {}", parts.join(", "))
            }
        }
    }
}

/// A failed dynamic client registration.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistrationError {
    /// A supplied redirect URI is not a well-formed absolute URI.
    #[error("invalid redirect URI `{uri}`: {reason}")]
    InvalidRedirectUri {
        /// The offending URI as supplied.
        uri: String,
        /// Parser diagnostic.
        reason: String,
    },
}

impl RegistrationError {
    /// Machine-readable error code per RFC 7591 Section 3.2.2.
    pub fn error_code(&self) -> &'static str {
        match self {
            RegistrationError::InvalidRedirectUri { .. } => "invalid_redirect_uri",
        }
    }
}

/// A fatal startup-time configuration problem.
///
/// Configuration errors abort startup; the gate never serves protected
/// operations with authentication disabled.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required configuration value was not supplied.
    #[error("missing required configuration: {0}")]
    Missing(&'static str),

    /// A configuration value was supplied but is not usable.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Which field failed validation.
        field: &'static str,
        /// Why it is invalid.
        reason: String,
    },

    /// Key material could not be generated or parsed.
    #[error("key material error: {0}")]
    Key(String),
}

/// A failed token mint on the development path.
#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    /// The configured key material has no private half to sign with.
    #[error("no private key available for signing")]
    NoSigningKey,

    /// The JWT library rejected the signing operation.
    #[error("failed to sign token: {0}")]
    Signing(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::MissingCredential.status_code(), 401);
        assert_eq!(AuthError::InvalidSignature.status_code(), 401);
        assert_eq!(AuthError::Expired.status_code(), 401);
        assert_eq!(
            AuthError::InsufficientScope {
                required: vec!["tools:call".into()],
                provided: vec![],
            }
            .status_code(),
            403
        );
    }

    #[test]
    fn test_missing_credential_challenge() {
        let err = AuthError::MissingCredential;
        assert_eq!(err.www_authenticate(None), "Bearer");

        let header = err.www_authenticate(Some(
            "https://mcp.example.com/.well-known/oauth-protected-resource",
        ));
        assert!(header.starts_with("Bearer "));
        assert!(header.contains("resource_metadata="));
        // No error code when no credential was presented
        assert!(!header.contains("error="));
    }

    #[test]
    fn test_invalid_token_challenge() {
        let err = AuthError::InvalidSignature;
        let header = err.www_authenticate(None);
        assert!(header.contains("error=\"invalid_token\""));
        assert!(header.contains("signature"));
    }

    #[test]
    fn test_expired_challenge() {
        let err = AuthError::Expired;
        let header = err.www_authenticate(None);
        assert!(header.contains("error=\"invalid_token\""));
        assert!(header.contains("expired"));
    }

    #[test]
    fn test_insufficient_scope_challenge() {
        let err = AuthError::InsufficientScope {
            required: vec!["tools:call".to_string()],
            provided: vec!["read".to_string()],
        };
        let header = err.www_authenticate(None);
        assert!(header.contains("error=\"insufficient_scope\""));
        assert!(header.contains("scope=\"tools:call\""));
    }

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = [
            AuthError::MalformedToken { reason: "x".into() },
            AuthError::InvalidSignature,
            AuthError::Expired,
            AuthError::IssuerMismatch,
            AuthError::AudienceMismatch,
            AuthError::InsufficientScope {
                required: vec![],
                provided: vec![],
            },
            AuthError::MissingCredential,
        ];
        let codes: std::collections::HashSet<_> =
            errors.iter().map(|e| e.error_code()).collect();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_registration_error_code() {
        let err = RegistrationError::InvalidRedirectUri {
            uri: "not a uri".into(),
            reason: "relative URL without a base".into(),
        };
        assert_eq!(err.error_code(), "invalid_redirect_uri");
        assert!(err.to_string().contains("not a uri"));
    }
}
