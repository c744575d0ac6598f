//! Request-level authentication enforcement.
//!
//! [`AuthGateLayer`] and [`AuthGateService`] implement the gate as tower
//! middleware: extract the bearer token from the `Authorization` header,
//! validate it with the operation's required scopes, and either admit the
//! request (injecting the [`Principal`] into request extensions) or reject
//! it with a protocol-correct error. Failures are terminal per request;
//! nothing here retries.
//!
//! Every rejection carries a `WWW-Authenticate` challenge advertising the
//! Protected Resource Metadata location, so compliant clients can
//! self-discover requirements.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use tower::Layer;

use crate::error::AuthError;
use crate::scope::ScopePolicy;
use crate::validator::{Principal, TokenValidator};

/// Tower layer that wraps services with bearer token enforcement.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use mcp_oauth_gate::{AuthGateLayer, GateConfig, KeyMaterial, ScopePolicy, TokenValidator};
///
/// let config = GateConfig::new("https://auth.example.com", "my-server", "http://localhost:8000");
/// let key = Arc::new(KeyMaterial::generate().unwrap());
/// let validator = TokenValidator::new(key, &config);
///
/// let layer = AuthGateLayer::new(validator, config.resource_metadata_url())
///     .scope_policy(ScopePolicy::new().default_scope("read"))
///     .public_path("/mcp/health");
/// ```
#[derive(Clone)]
pub struct AuthGateLayer {
    validator: TokenValidator,
    resource_metadata_url: String,
    policy: ScopePolicy,
    public_paths: Vec<String>,
}

impl AuthGateLayer {
    /// Create a gate over the given validator.
    ///
    /// `resource_metadata_url` is advertised in every rejection challenge.
    /// The well-known discovery paths are always public.
    pub fn new(validator: TokenValidator, resource_metadata_url: impl Into<String>) -> Self {
        Self {
            validator,
            resource_metadata_url: resource_metadata_url.into(),
            policy: ScopePolicy::new(),
            public_paths: Vec::new(),
        }
    }

    /// Set the per-operation scope policy.
    pub fn scope_policy(mut self, policy: ScopePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Add a path prefix that does not require authentication.
    pub fn public_path(mut self, path: impl Into<String>) -> Self {
        self.public_paths.push(path.into());
        self
    }
}

impl<S> Layer<S> for AuthGateLayer {
    type Service = AuthGateService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthGateService {
            inner,
            validator: self.validator.clone(),
            resource_metadata_url: self.resource_metadata_url.clone(),
            policy: self.policy.clone(),
            public_paths: self.public_paths.clone(),
        }
    }
}

/// Tower service created by [`AuthGateLayer`].
///
/// For each request: skip public paths, extract the bearer token, validate
/// against the path's required scopes, then admit or reject.
#[derive(Clone)]
pub struct AuthGateService<S> {
    inner: S,
    validator: TokenValidator,
    resource_metadata_url: String,
    policy: ScopePolicy,
    public_paths: Vec<String>,
}

impl<S> tower_service::Service<Request<Body>> for AuthGateService<S>
where
    S: tower_service::Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Into<crate::error::BoxError> + Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let path = req.uri().path().to_string();
        let public_paths = self.public_paths.clone();
        let validator = self.validator.clone();
        let resource_metadata_url = self.resource_metadata_url.clone();
        let policy = self.policy.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            // Discovery documents are always public
            if path.starts_with("/.well-known/")
                || public_paths.iter().any(|p| path.starts_with(p.as_str()))
            {
                return inner.call(req).await;
            }

            let token = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
                .map(|t| t.trim().to_string());

            let Some(token) = token else {
                let error = AuthError::MissingCredential;
                tracing::debug!(path = %path, "rejected request without credential");
                return Ok(gate_error_response(&error, &resource_metadata_url));
            };

            let required = policy.requirement_for(&path);
            let principal = match validator.validate(&token, &required) {
                Ok(principal) => principal,
                Err(error) => {
                    tracing::warn!(
                        path = %path,
                        error = error.error_code(),
                        "rejected bearer token"
                    );
                    return Ok(gate_error_response(&error, &resource_metadata_url));
                }
            };

            let mut req = req;
            req.extensions_mut().insert(principal);
            inner.call(req).await
        })
    }
}

/// Build the HTTP rejection for an authentication failure.
///
/// 401 or 403 with a `WWW-Authenticate` challenge and a structured JSON
/// body naming the specific failure kind.
fn gate_error_response(error: &AuthError, resource_metadata_url: &str) -> Response {
    let status = match error.status_code() {
        403 => StatusCode::FORBIDDEN,
        _ => StatusCode::UNAUTHORIZED,
    };

    let www_authenticate = error.www_authenticate(Some(resource_metadata_url));

    let body = serde_json::json!({
        "error": error.error_code(),
        "error_description": error.to_string(),
    });

    let mut response = (status, axum::Json(body)).into_response();
    if let Ok(value) = www_authenticate.parse() {
        response.headers_mut().insert("WWW-Authenticate", value);
    }
    response
}

/// Extract the validated [`Principal`] from an admitted request.
///
/// Handlers behind the gate can also use axum's `Extension<Principal>`
/// extractor; this helper exists for plain tower services.
pub fn principal_of<B>(req: &Request<B>) -> Option<&Principal> {
    req.extensions().get::<Principal>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issuer::TokenIssuer;
    use crate::scope::ScopePolicy;
    use crate::test_support::{test_config, test_key};
    use std::convert::Infallible;
    use std::time::Duration;
    use tower::ServiceExt;
    use tower_service::Service;

    /// Minimal inner service returning 200 for any request.
    #[derive(Clone)]
    struct OkService;

    impl tower_service::Service<Request<Body>> for OkService {
        type Response = Response;
        type Error = Infallible;
        type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: Request<Body>) -> Self::Future {
            let has_principal = principal_of(&req).is_some();
            Box::pin(async move {
                let status = if has_principal {
                    StatusCode::OK
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                Ok(Response::builder().status(status).body(Body::empty()).unwrap())
            })
        }
    }

    fn layer() -> AuthGateLayer {
        let config = test_config();
        AuthGateLayer::new(
            TokenValidator::new(test_key(), &config),
            config.resource_metadata_url(),
        )
    }

    fn token(scopes: &[&str]) -> String {
        TokenIssuer::new(test_key(), &test_config())
            .issue("alice", scopes.iter().copied(), Duration::from_secs(3600))
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_credential_is_401_with_challenge() {
        let mut service = layer().layer(OkService);
        let req = Request::builder()
            .uri("/tools/hello")
            .body(Body::empty())
            .unwrap();

        let resp = service.ready().await.unwrap().call(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let challenge = resp
            .headers()
            .get("WWW-Authenticate")
            .unwrap()
            .to_str()
            .unwrap();
        assert!(challenge.contains("resource_metadata="));
        assert!(challenge.contains("/.well-known/oauth-protected-resource"));
    }

    #[tokio::test]
    async fn test_valid_token_admitted_with_principal() {
        let mut service = layer().layer(OkService);
        let req = Request::builder()
            .uri("/tools/hello")
            .header("Authorization", format!("Bearer {}", token(&["tools:call"])))
            .body(Body::empty())
            .unwrap();

        let resp = service.ready().await.unwrap().call(req).await.unwrap();
        // OkService returns 500 unless a Principal was injected
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_token_is_401() {
        let mut service = layer().layer(OkService);
        let req = Request::builder()
            .uri("/tools/hello")
            .header("Authorization", "Bearer not-a-jwt")
            .body(Body::empty())
            .unwrap();

        let resp = service.ready().await.unwrap().call(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_basic_auth_is_missing_credential() {
        let mut service = layer().layer(OkService);
        let req = Request::builder()
            .uri("/tools/hello")
            .header("Authorization", "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .unwrap();

        let resp = service.ready().await.unwrap().call(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let challenge = resp
            .headers()
            .get("WWW-Authenticate")
            .unwrap()
            .to_str()
            .unwrap();
        // No credential was presented in bearer form, so no error code
        assert!(!challenge.contains("error="));
    }

    #[tokio::test]
    async fn test_insufficient_scope_is_403() {
        let policy = ScopePolicy::new().path_scope("/tools/admin", "admin");
        let mut service = layer().scope_policy(policy).layer(OkService);
        let req = Request::builder()
            .uri("/tools/admin")
            .header("Authorization", format!("Bearer {}", token(&["read"])))
            .body(Body::empty())
            .unwrap();

        let resp = service.ready().await.unwrap().call(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let challenge = resp
            .headers()
            .get("WWW-Authenticate")
            .unwrap()
            .to_str()
            .unwrap();
        assert!(challenge.contains("insufficient_scope"));
        assert!(challenge.contains("scope=\"admin\""));
    }

    #[tokio::test]
    async fn test_well_known_paths_public() {
        let mut service = layer().layer(OkService);
        let req = Request::builder()
            .uri("/.well-known/oauth-protected-resource")
            .body(Body::empty())
            .unwrap();

        let resp = service.ready().await.unwrap().call(req).await.unwrap();
        // No principal injected, but the request went through
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_configured_public_path() {
        let mut service = layer().public_path("/mcp/health").layer(OkService);
        let req = Request::builder()
            .uri("/mcp/health")
            .body(Body::empty())
            .unwrap();

        let resp = service.ready().await.unwrap().call(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
