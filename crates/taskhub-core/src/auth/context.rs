use std::collections::HashMap;

use crate::error::{Result, TaskHubError};

use super::Claims;

/// Authentication context attached to every gateway request.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    user_id: Option<String>,
    org_id: Option<String>,
    claims: HashMap<String, serde_json::Value>,
}

impl AuthContext {
    /// Create an unauthenticated context.
    pub fn unauthenticated() -> Self {
        Self::default()
    }

    /// Create an authenticated context for a user.
    pub fn authenticated(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Default::default()
        }
    }

    /// Create an authenticated context from verified claims.
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            user_id: Some(claims.sub),
            org_id: claims.org_id,
            claims: claims.custom,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Get the user id, returning an error if not authenticated.
    pub fn require_user_id(&self) -> Result<&str> {
        self.user_id
            .as_deref()
            .ok_or_else(|| TaskHubError::Unauthorized("Authentication required".into()))
    }

    /// The organization selected in the session, if any.
    pub fn org_id(&self) -> Option<&str> {
        self.org_id.as_deref()
    }

    /// Get a custom claim value.
    pub fn claim(&self, key: &str) -> Option<&serde_json::Value> {
        self.claims.get(key)
    }
}
