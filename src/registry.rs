//! Dynamic client registration (RFC 7591).
//!
//! [`ClientRegistry`] is an in-memory, append-only store of registered
//! OAuth clients. Every registration gets a fresh cryptographically random
//! `client_id` and `client_secret`; identical metadata submitted twice
//! produces two distinct registrations. Registrations do not survive a
//! process restart.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::RegistrationError;
use crate::secret::SecretString;
use crate::validator::unix_now;

/// Entropy of a generated client secret, in bytes.
const CLIENT_SECRET_BYTES: usize = 32;

/// Client metadata submitted to the registration endpoint.
///
/// Unknown fields are accepted and ignored, per RFC 7591 Section 2.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationRequest {
    /// Redirection URIs; each must be a well-formed absolute URI.
    #[serde(default)]
    pub redirect_uris: Vec<String>,

    /// Human-readable client name.
    #[serde(default)]
    pub client_name: Option<String>,

    /// Requested token endpoint auth method.
    #[serde(default)]
    pub token_endpoint_auth_method: Option<String>,

    /// Requested grant types.
    #[serde(default)]
    pub grant_types: Option<Vec<String>>,

    /// Requested response types.
    #[serde(default)]
    pub response_types: Option<Vec<String>>,

    /// Requested scope string.
    #[serde(default)]
    pub scope: Option<String>,
}

/// A completed client registration, including the one-time secret.
///
/// Returned exactly once, at registration time; there is no endpoint to
/// recover the secret afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRegistration {
    /// Generated client identifier, unique for the process lifetime.
    pub client_id: String,
    /// Generated high-entropy client secret.
    pub client_secret: SecretString,
    /// Registration timestamp (seconds since Unix epoch).
    pub client_id_issued_at: u64,
    /// Secret expiry; 0 means the secret does not expire.
    pub client_secret_expires_at: u64,
    /// Redirect URIs as supplied.
    pub redirect_uris: Vec<String>,
    /// Token endpoint auth method (client request or default).
    pub token_endpoint_auth_method: String,
    /// Grant types (client request or default).
    pub grant_types: Vec<String>,
    /// Response types (client request or default).
    pub response_types: Vec<String>,
    /// Human-readable client name.
    pub client_name: String,
    /// Scope string as supplied.
    pub scope: String,
}

/// In-memory store of dynamically registered clients.
///
/// Register-only: no update or delete, no persistence. The map is the only
/// shared mutable state in the crate; the check-and-insert under the mutex
/// keeps client ids unique across concurrent registrations.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: Mutex<HashMap<String, ClientRegistration>>,
}

impl ClientRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client and return the full record with its credentials.
    ///
    /// Fails with [`RegistrationError::InvalidRedirectUri`] if any supplied
    /// redirect URI is not a well-formed absolute URI. Never deduplicates:
    /// identical metadata yields a fresh id and secret every time.
    pub fn register(
        &self,
        request: RegistrationRequest,
    ) -> Result<ClientRegistration, RegistrationError> {
        for uri in &request.redirect_uris {
            Url::parse(uri).map_err(|e| RegistrationError::InvalidRedirectUri {
                uri: uri.clone(),
                reason: e.to_string(),
            })?;
        }

        // Credential generation happens outside the lock; only the
        // uniqueness check-and-insert is serialized.
        let mut registration = ClientRegistration {
            client_id: generate_client_id(),
            client_secret: generate_client_secret(),
            client_id_issued_at: unix_now(),
            client_secret_expires_at: 0,
            redirect_uris: request.redirect_uris,
            token_endpoint_auth_method: request
                .token_endpoint_auth_method
                .unwrap_or_else(|| "client_secret_post".to_string()),
            grant_types: request
                .grant_types
                .unwrap_or_else(|| vec!["authorization_code".to_string()]),
            response_types: request
                .response_types
                .unwrap_or_else(|| vec!["code".to_string()]),
            client_name: request.client_name.unwrap_or_default(),
            scope: request.scope.unwrap_or_default(),
        };

        let mut clients = self
            .clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while clients.contains_key(&registration.client_id) {
            registration.client_id = generate_client_id();
        }
        clients.insert(registration.client_id.clone(), registration.clone());
        drop(clients);

        tracing::info!(client_id = %registration.client_id, "registered client");
        Ok(registration)
    }

    /// Look up a registration by client id.
    ///
    /// Operator/debug concern, not part of the protocol surface.
    pub fn get(&self, client_id: &str) -> Option<ClientRegistration> {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(client_id)
            .cloned()
    }

    /// Number of registered clients.
    pub fn len(&self) -> usize {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True if no clients are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn generate_client_id() -> String {
    format!("client-{}", uuid::Uuid::new_v4())
}

fn generate_client_secret() -> SecretString {
    let mut bytes = [0u8; CLIENT_SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    SecretString::new(URL_SAFE_NO_PAD.encode(bytes))
}
