//! HTTP surface assembly.
//!
//! Wires the gate components into an axum [`Router`]: the well-known
//! discovery documents, dynamic client registration, the development token
//! endpoint (dev mode only), a health check, and two sample protected
//! tool operations standing in for real RPC tools behind the auth
//! boundary.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};

use crate::config::GateConfig;
use crate::error::ConfigError;
use crate::gate::AuthGateLayer;
use crate::issuer::{TokenIssuer, DEFAULT_TOKEN_TTL};
use crate::key::{JwkSet, KeyMaterial};
use crate::metadata::{
    AuthorizationServerMetadata, MetadataPublisher, OpenIdConfiguration,
    ProtectedResourceMetadata, AUTHORIZATION_SERVER_PATH, JWKS_PATH, OPENID_CONFIGURATION_PATH,
    PROTECTED_RESOURCE_PATH,
};
use crate::registry::{ClientRegistry, RegistrationRequest};
use crate::scope::ScopePolicy;
use crate::validator::{Principal, TokenValidator};

/// Shared state behind the HTTP handlers.
pub struct GateState {
    /// Discovery document assembly.
    pub publisher: MetadataPublisher,
    /// Dynamic client registrations.
    pub registry: ClientRegistry,
    /// Development token minting; `None` outside dev mode.
    pub issuer: Option<TokenIssuer>,
}

/// Scope policy protecting the sample tools.
///
/// Both tools require the `tools:call` scope.
pub fn default_policy() -> ScopePolicy {
    ScopePolicy::new()
        .path_scope("/tools/hello", "tools:call")
        .path_scope("/tools/add", "tools:call")
}

/// Build the complete router for the given configuration and key material.
///
/// Validates the configuration first; a bad configuration is fatal, never
/// an insecure fallback. The returned router has the [`AuthGateLayer`]
/// applied, with the discovery, health, registration, and dev-token paths
/// public and everything else requiring a bearer token.
pub fn build_router(
    config: GateConfig,
    key: Arc<KeyMaterial>,
    policy: ScopePolicy,
) -> Result<Router, ConfigError> {
    config.validate()?;

    let validator = TokenValidator::new(key.clone(), &config);
    let issuer = if config.dev_mode {
        Some(TokenIssuer::new(key.clone(), &config))
    } else {
        None
    };

    let gate = AuthGateLayer::new(validator, config.resource_metadata_url())
        .scope_policy(policy)
        .public_path("/mcp/health")
        .public_path("/register")
        .public_path("/dev/token");

    let dev_mode = config.dev_mode;
    let state = Arc::new(GateState {
        publisher: MetadataPublisher::new(config, key),
        registry: ClientRegistry::new(),
        issuer,
    });

    let mut router = Router::new()
        .route(AUTHORIZATION_SERVER_PATH, get(authorization_server_metadata))
        .route(OPENID_CONFIGURATION_PATH, get(openid_configuration))
        .route(PROTECTED_RESOURCE_PATH, get(protected_resource_metadata))
        .route(JWKS_PATH, get(jwks))
        .route("/register", post(register))
        .route("/mcp/health", get(health))
        .route("/tools/hello", post(hello))
        .route("/tools/add", post(add));

    if dev_mode {
        router = router.route("/dev/token", get(dev_token));
    }

    Ok(router.with_state(state).layer(gate))
}

async fn authorization_server_metadata(
    State(state): State<Arc<GateState>>,
) -> Json<AuthorizationServerMetadata> {
    Json(state.publisher.authorization_server_metadata())
}

async fn openid_configuration(
    State(state): State<Arc<GateState>>,
) -> Json<OpenIdConfiguration> {
    Json(state.publisher.openid_configuration())
}

async fn protected_resource_metadata(
    State(state): State<Arc<GateState>>,
) -> Json<ProtectedResourceMetadata> {
    Json(state.publisher.protected_resource_metadata())
}

async fn jwks(State(state): State<Arc<GateState>>) -> Json<JwkSet> {
    Json(state.publisher.jwks())
}

async fn health() -> &'static str {
    "OK"
}

async fn register(
    State(state): State<Arc<GateState>>,
    Json(request): Json<RegistrationRequest>,
) -> Response {
    match state.registry.register(request) {
        Ok(registration) => (StatusCode::CREATED, Json(registration)).into_response(),
        Err(err) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": err.error_code(),
                "error_description": err.to_string(),
            })),
        )
            .into_response(),
    }
}

/// Query parameters accepted by the development token endpoint.
#[derive(Debug, Deserialize)]
struct DevTokenParams {
    subject: Option<String>,
    /// Space-delimited scope string.
    scope: Option<String>,
    /// Lifetime in seconds; clamped to the issuer's maximum.
    ttl: Option<u64>,
}

/// RFC 6749-style token response body.
#[derive(Debug, Serialize)]
struct TokenResponse {
    access_token: String,
    token_type: &'static str,
    expires_in: u64,
    scope: String,
}

async fn dev_token(
    State(state): State<Arc<GateState>>,
    Query(params): Query<DevTokenParams>,
) -> Response {
    // The route only exists in dev mode, so the issuer is always present.
    let Some(issuer) = state.issuer.as_ref() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let subject = params.subject.as_deref().unwrap_or("dev-user");
    let scope = params.scope.as_deref().unwrap_or("read write");
    let scopes: Vec<&str> = scope.split_whitespace().collect();
    let ttl = params
        .ttl
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_TOKEN_TTL)
        .min(crate::issuer::MAX_TOKEN_TTL);

    match issuer.issue(subject, scopes.iter().copied(), ttl) {
        Ok(access_token) => Json(TokenResponse {
            access_token,
            token_type: "Bearer",
            expires_in: ttl.as_secs(),
            scope: scopes.join(" "),
        })
        .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "development token mint failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "token_mint_failed",
                    "error_description": err.to_string(),
                })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct HelloInput {
    name: String,
}

#[derive(Debug, Serialize)]
struct HelloOutput {
    message: String,
    subject: String,
}

/// Sample protected operation: greet the caller.
async fn hello(
    Extension(principal): Extension<Principal>,
    Json(input): Json<HelloInput>,
) -> Json<HelloOutput> {
    Json(HelloOutput {
        message: format!("Hello, {}! This is a protected endpoint.", input.name),
        subject: principal.subject,
    })
}

#[derive(Debug, Deserialize)]
struct AddInput {
    a: i64,
    b: i64,
}

#[derive(Debug, Serialize)]
struct AddOutput {
    result: i64,
}

/// Sample protected operation: add two numbers.
async fn add(Json(input): Json<AddInput>) -> Json<AddOutput> {
    Json(AddOutput {
        result: input.a + input.b,
    })
}
