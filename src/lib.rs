//! # mcp-oauth-gate
//!
//! OAuth 2.1 bearer-token gate and discovery surface for MCP-style tool
//! servers.
//!
//! The crate acts as the **resource server** side of OAuth 2.1: it validates
//! RS256 JWTs against local key material, serves the standard discovery
//! documents, accepts RFC 7591 dynamic client registrations, and (in
//! development mode) mints test tokens against its own private key. It does
//! not implement an authorization server — there is no login, consent, or
//! code exchange.
//!
//! # Architecture
//!
//! - **[`KeyMaterial`]**: the process RSA keypair, created once at startup
//!   and shared by `Arc` — never ambient global state.
//! - **[`TokenValidator`]**: ordered, short-circuiting token verification
//!   (decode, signature, issuer, audience, expiry, scope) producing a
//!   [`Principal`].
//! - **[`TokenIssuer`]**: development-only JWT minting with a clamped TTL.
//! - **[`ClientRegistry`]**: append-only in-memory dynamic client
//!   registration store.
//! - **[`MetadataPublisher`]**: the three well-known documents plus JWKS,
//!   pure functions of configuration.
//! - **[`AuthGateLayer`]**: tower middleware enforcing bearer auth per
//!   request, with RFC 6750/9728 challenges on rejection.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mcp_oauth_gate::{build_router, default_policy, GateConfig, KeyMaterial};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mcp_oauth_gate::BoxError> {
//!     let config = GateConfig::new(
//!         "https://dev.example.com",
//!         "my-mcp-server",
//!         "http://127.0.0.1:8000",
//!     )
//!     .scope("tools:call")
//!     .dev_mode(true);
//!
//!     let key = Arc::new(KeyMaterial::generate()?);
//!     let app = build_router(config, key, default_policy())?;
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Discovery Flow
//!
//! 1. Client calls a protected operation without a token
//! 2. Server returns `401` with `WWW-Authenticate: Bearer resource_metadata="..."`
//! 3. Client fetches `/.well-known/oauth-protected-resource` to find the
//!    authorization server
//! 4. Client obtains a token (in development, from `/dev/token`)
//! 5. Client retries with `Authorization: Bearer <token>`

pub mod config;
pub mod error;
pub mod gate;
pub mod issuer;
pub mod key;
pub mod metadata;
pub mod registry;
pub mod scope;
pub mod secret;
pub mod server;
pub mod validator;

// Re-exports
pub use config::GateConfig;
pub use error::{AuthError, BoxError, ConfigError, IssueError, RegistrationError};
pub use gate::{principal_of, AuthGateLayer, AuthGateService};
pub use issuer::{TokenIssuer, DEFAULT_TOKEN_TTL, MAX_TOKEN_TTL};
pub use key::{Jwk, JwkSet, KeyMaterial};
pub use metadata::{
    AuthorizationServerMetadata, MetadataPublisher, OpenIdConfiguration,
    ProtectedResourceMetadata,
};
pub use registry::{ClientRegistration, ClientRegistry, RegistrationRequest};
pub use scope::{ScopePolicy, ScopeRequirement};
pub use secret::SecretString;
pub use server::{build_router, default_policy, GateState};
pub use validator::{Claims, Principal, TokenAudience, TokenValidator};
