//! Discovery document assembly.
//!
//! [`MetadataPublisher`] builds the three well-known documents (RFC 8414
//! Authorization Server metadata, OpenID Connect discovery, RFC 9728
//! Protected Resource metadata) plus the JWKS document, as pure functions
//! of the startup configuration and key material. The `issuer` string is
//! byte-identical across every document.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::GateConfig;
use crate::key::{JwkSet, KeyMaterial};

/// Authorization Server metadata (RFC 8414), served at
/// `/.well-known/oauth-authorization-server`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationServerMetadata {
    /// Issuer identifier URL.
    pub issuer: String,
    /// Authorization endpoint URL.
    pub authorization_endpoint: String,
    /// Token endpoint URL.
    pub token_endpoint: String,
    /// JWK Set document URL.
    pub jwks_uri: String,
    /// Dynamic client registration endpoint URL.
    pub registration_endpoint: String,
    /// Supported response types; `code` per OAuth 2.1.
    pub response_types_supported: Vec<String>,
    /// Supported PKCE challenge methods.
    pub code_challenge_methods_supported: Vec<String>,
    /// Supported token endpoint auth methods.
    pub token_endpoint_auth_methods_supported: Vec<String>,
    /// Supported grant types.
    pub grant_types_supported: Vec<String>,
    /// Advertised scopes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes_supported: Vec<String>,
}

/// OpenID Connect discovery document, served at
/// `/.well-known/openid-configuration`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenIdConfiguration {
    /// Issuer identifier URL; must match the Authorization Server metadata
    /// byte-for-byte.
    pub issuer: String,
    /// Authorization endpoint URL.
    pub authorization_endpoint: String,
    /// Token endpoint URL.
    pub token_endpoint: String,
    /// JWK Set document URL.
    pub jwks_uri: String,
    /// UserInfo endpoint, when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userinfo_endpoint: Option<String>,
    /// Supported response types.
    pub response_types_supported: Vec<String>,
    /// Supported subject identifier types.
    pub subject_types_supported: Vec<String>,
    /// Supported ID token signing algorithms.
    pub id_token_signing_alg_values_supported: Vec<String>,
}

/// Protected Resource metadata (RFC 9728), served at
/// `/.well-known/oauth-protected-resource`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectedResourceMetadata {
    /// The resource server's identifier URL.
    pub resource: String,
    /// Authorization servers trusted to issue tokens for this resource.
    pub authorization_servers: Vec<String>,
    /// JWK Set document URL.
    pub jwks_uri: String,
    /// Advertised scopes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes_supported: Vec<String>,
    /// Methods supported for sending bearer tokens.
    pub bearer_methods_supported: Vec<String>,
    /// URL of documentation for this resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_documentation: Option<String>,
}

/// Well-known path for Authorization Server metadata.
pub const AUTHORIZATION_SERVER_PATH: &str = "/.well-known/oauth-authorization-server";
/// Well-known path for OpenID Connect discovery.
pub const OPENID_CONFIGURATION_PATH: &str = "/.well-known/openid-configuration";
/// Well-known path for Protected Resource metadata.
pub const PROTECTED_RESOURCE_PATH: &str = "/.well-known/oauth-protected-resource";
/// Well-known path for the JWK Set document.
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// Assembles discovery documents from configuration and key material.
///
/// No side effects and no per-request state; documents are recomputed on
/// each call, which is cheap at this scale.
#[derive(Clone)]
pub struct MetadataPublisher {
    config: GateConfig,
    key: Arc<KeyMaterial>,
}

impl MetadataPublisher {
    /// Create a publisher over validated configuration.
    pub fn new(config: GateConfig, key: Arc<KeyMaterial>) -> Self {
        Self { config, key }
    }

    /// The Authorization Server metadata document.
    pub fn authorization_server_metadata(&self) -> AuthorizationServerMetadata {
        let issuer = &self.config.issuer;
        AuthorizationServerMetadata {
            issuer: issuer.clone(),
            authorization_endpoint: format!("{issuer}/oauth/authorize"),
            token_endpoint: format!("{issuer}/oauth/token"),
            jwks_uri: self.config.jwks_uri(),
            registration_endpoint: format!("{}/register", self.config.base_url),
            response_types_supported: vec!["code".to_string()],
            code_challenge_methods_supported: vec!["S256".to_string()],
            token_endpoint_auth_methods_supported: vec!["client_secret_post".to_string()],
            grant_types_supported: vec![
                "authorization_code".to_string(),
                "refresh_token".to_string(),
            ],
            scopes_supported: self.config.scopes_supported.clone(),
        }
    }

    /// The OpenID Connect discovery document.
    pub fn openid_configuration(&self) -> OpenIdConfiguration {
        let issuer = &self.config.issuer;
        OpenIdConfiguration {
            issuer: issuer.clone(),
            authorization_endpoint: format!("{issuer}/oauth/authorize"),
            token_endpoint: format!("{issuer}/oauth/token"),
            jwks_uri: self.config.jwks_uri(),
            userinfo_endpoint: None,
            response_types_supported: vec!["code".to_string()],
            subject_types_supported: vec!["public".to_string()],
            id_token_signing_alg_values_supported: vec!["RS256".to_string()],
        }
    }

    /// The Protected Resource metadata document.
    pub fn protected_resource_metadata(&self) -> ProtectedResourceMetadata {
        ProtectedResourceMetadata {
            resource: self.config.base_url.clone(),
            authorization_servers: vec![self.config.issuer.clone()],
            jwks_uri: self.config.jwks_uri(),
            scopes_supported: self.config.scopes_supported.clone(),
            bearer_methods_supported: vec!["header".to_string()],
            resource_documentation: Some(format!("{}/docs", self.config.base_url)),
        }
    }

    /// The JWK Set for the active signing key.
    pub fn jwks(&self) -> JwkSet {
        self.key.jwk_set()
    }
}
