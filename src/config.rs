//! Gate configuration.
//!
//! All protocol-relevant settings live in [`GateConfig`], validated once at
//! startup. Nothing in the crate reads environment variables or other ambient
//! state; the surrounding process (CLI, env loader) builds a config and hands
//! it in.

use url::Url;

use crate::error::ConfigError;

/// Static configuration for the authentication gate.
///
/// The `issuer` string is used byte-for-byte in every discovery document;
/// OAuth/OIDC clients treat issuer mismatches between documents as fatal.
///
/// # Example
///
/// ```rust
/// use mcp_oauth_gate::GateConfig;
///
/// let config = GateConfig::new(
///     "https://dev.example.com",
///     "my-mcp-server",
///     "http://127.0.0.1:8000",
/// )
/// .scope("tools:call")
/// .dev_mode(true);
///
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Issuer URL expected in token `iss` claims and advertised in metadata.
    pub issuer: String,
    /// Audience expected in token `aud` claims.
    pub audience: String,
    /// Base URL this server is reachable at; the resource identifier.
    pub base_url: String,
    /// Whether the development token-minting endpoint is reachable.
    ///
    /// Off by default. Deployed configurations must opt in explicitly.
    pub dev_mode: bool,
    /// Scopes advertised in discovery documents.
    pub scopes_supported: Vec<String>,
}

impl GateConfig {
    /// Create a configuration with the three mandatory values.
    pub fn new(
        issuer: impl Into<String>,
        audience: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            issuer: trim_trailing_slash(issuer.into()),
            audience: audience.into(),
            base_url: trim_trailing_slash(base_url.into()),
            dev_mode: false,
            scopes_supported: Vec::new(),
        }
    }

    /// Enable or disable the development token endpoint.
    pub fn dev_mode(mut self, enabled: bool) -> Self {
        self.dev_mode = enabled;
        self
    }

    /// Add an advertised scope.
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes_supported.push(scope.into());
        self
    }

    /// Validate the configuration.
    ///
    /// Fatal at startup: a gate with a missing or unparseable issuer,
    /// audience, or base URL must not serve anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.is_empty() {
            return Err(ConfigError::Missing("issuer"));
        }
        if self.audience.is_empty() {
            return Err(ConfigError::Missing("audience"));
        }
        if self.base_url.is_empty() {
            return Err(ConfigError::Missing("base_url"));
        }
        Url::parse(&self.issuer).map_err(|e| ConfigError::Invalid {
            field: "issuer",
            reason: e.to_string(),
        })?;
        Url::parse(&self.base_url).map_err(|e| ConfigError::Invalid {
            field: "base_url",
            reason: e.to_string(),
        })?;
        Ok(())
    }

    /// URL of the Protected Resource Metadata document on this server.
    ///
    /// Advertised in `WWW-Authenticate` challenges so rejected clients can
    /// self-discover requirements.
    pub fn resource_metadata_url(&self) -> String {
        format!("{}/.well-known/oauth-protected-resource", self.base_url)
    }

    /// URL of the JWKS document for the configured issuer.
    pub fn jwks_uri(&self) -> String {
        format!("{}/.well-known/jwks.json", self.issuer)
    }
}

fn trim_trailing_slash(mut s: String) -> String {
    while s.ends_with('/') {
        s.pop();
    }
    s
}
