//! Scope requirements and per-operation scope policy.
//!
//! A [`ScopeRequirement`] names the scopes an operation demands; the
//! [`ScopePolicy`] maps request paths to requirements with a default
//! fallback. All scopes in a requirement must be present in the token
//! (AND semantics).

use std::collections::{HashMap, HashSet};

use crate::error::AuthError;

/// A set of required OAuth scopes for one operation.
#[derive(Debug, Clone, Default)]
pub struct ScopeRequirement {
    required: HashSet<String>,
}

impl ScopeRequirement {
    /// Create an empty requirement (no scopes needed).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a requirement from a single scope.
    pub fn one(scope: impl Into<String>) -> Self {
        let mut required = HashSet::new();
        required.insert(scope.into());
        Self { required }
    }

    /// Create a requirement from multiple scopes.
    pub fn all(scopes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            required: scopes.into_iter().map(Into::into).collect(),
        }
    }

    /// Add a required scope.
    pub fn require(mut self, scope: impl Into<String>) -> Self {
        self.required.insert(scope.into());
        self
    }

    /// Merge another requirement into this one.
    pub fn merge(mut self, other: &ScopeRequirement) -> Self {
        self.required.extend(other.required.iter().cloned());
        self
    }

    /// Check that the granted scopes cover this requirement.
    ///
    /// Returns [`AuthError::InsufficientScope`] naming the required and
    /// provided scopes (sorted, for stable output) when they do not.
    pub fn check(&self, granted: &HashSet<String>) -> Result<(), AuthError> {
        if self.required.is_subset(granted) {
            return Ok(());
        }
        let mut required: Vec<String> = self.required.iter().cloned().collect();
        required.sort();
        let mut provided: Vec<String> = granted.iter().cloned().collect();
        provided.sort();
        Err(AuthError::InsufficientScope { required, provided })
    }

    /// The required scopes.
    pub fn required_scopes(&self) -> &HashSet<String> {
        &self.required
    }

    /// True if no scopes are required.
    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
    }
}

/// Policy mapping protected operations (by request path) to required scopes.
///
/// Path requirements are checked *in addition* to the default requirement.
///
/// # Example
///
/// ```rust
/// use mcp_oauth_gate::ScopePolicy;
///
/// let policy = ScopePolicy::new()
///     .default_scope("read")
///     .path_scope("/tools/add", "tools:call");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScopePolicy {
    default_scopes: ScopeRequirement,
    path_scopes: HashMap<String, ScopeRequirement>,
}

impl ScopePolicy {
    /// Create an empty policy (no scopes required for anything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a scope for every protected operation.
    pub fn default_scope(mut self, scope: impl Into<String>) -> Self {
        self.default_scopes = self.default_scopes.require(scope);
        self
    }

    /// Replace the default requirement wholesale.
    pub fn default_scopes(mut self, requirement: ScopeRequirement) -> Self {
        self.default_scopes = requirement;
        self
    }

    /// Require a scope for one request path.
    pub fn path_scope(mut self, path: impl Into<String>, scope: impl Into<String>) -> Self {
        let entry = self.path_scopes.entry(path.into()).or_default();
        entry.required.insert(scope.into());
        self
    }

    /// Replace the requirement for one request path.
    pub fn path_scopes(mut self, path: impl Into<String>, requirement: ScopeRequirement) -> Self {
        self.path_scopes.insert(path.into(), requirement);
        self
    }

    /// The combined requirement (default plus path-specific) for a path.
    pub fn requirement_for(&self, path: &str) -> ScopeRequirement {
        match self.path_scopes.get(path) {
            Some(extra) => self.default_scopes.clone().merge(extra),
            None => self.default_scopes.clone(),
        }
    }
}
