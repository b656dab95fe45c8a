use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Session token claims issued by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (identity-provider user id, e.g. `user_2abc`).
    pub sub: String,
    /// Issued at (Unix timestamp).
    #[serde(default)]
    pub iat: i64,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Active organization, when the session has one selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    /// Custom claims.
    #[serde(flatten)]
    pub custom: HashMap<String, serde_json::Value>,
}

impl Claims {
    /// Get the user id.
    pub fn user_id(&self) -> &str {
        &self.sub
    }

    /// Check if the token is expired.
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        self.exp < now
    }

    /// Get a custom claim value.
    pub fn get_claim(&self, key: &str) -> Option<&serde_json::Value> {
        self.custom.get(key)
    }

    /// Create a builder for constructing claims.
    pub fn builder() -> ClaimsBuilder {
        ClaimsBuilder::new()
    }
}

/// Builder for session claims, mostly used to mint tokens in tests.
#[derive(Debug)]
pub struct ClaimsBuilder {
    sub: Option<String>,
    org_id: Option<String>,
    custom: HashMap<String, serde_json::Value>,
    duration_secs: i64,
}

impl Default for ClaimsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimsBuilder {
    pub fn new() -> Self {
        Self {
            sub: None,
            org_id: None,
            custom: HashMap::new(),
            duration_secs: 3600,
        }
    }

    /// Set the subject (user id).
    pub fn subject(mut self, sub: impl Into<String>) -> Self {
        self.sub = Some(sub.into());
        self
    }

    /// Set the active organization.
    pub fn org_id(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = Some(org_id.into());
        self
    }

    /// Add a custom claim.
    pub fn claim(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.custom.insert(key.into(), value);
        self
    }

    /// Set token lifetime in seconds. Negative values produce expired tokens.
    pub fn duration_secs(mut self, secs: i64) -> Self {
        self.duration_secs = secs;
        self
    }

    pub fn build(self) -> Result<Claims, String> {
        let sub = self.sub.ok_or("Subject is required")?;
        let now = chrono::Utc::now().timestamp();

        Ok(Claims {
            sub,
            iat: now,
            exp: now + self.duration_secs,
            org_id: self.org_id,
            custom: self.custom,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_builder() {
        let claims = Claims::builder()
            .subject("user_2abc")
            .org_id("org_9xyz")
            .claim("sid", serde_json::json!("sess_1"))
            .duration_secs(7200)
            .build()
            .unwrap();

        assert_eq!(claims.user_id(), "user_2abc");
        assert_eq!(claims.org_id.as_deref(), Some("org_9xyz"));
        assert_eq!(claims.get_claim("sid"), Some(&serde_json::json!("sess_1")));
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_builder_requires_subject() {
        assert!(ClaimsBuilder::new().build().is_err());
    }

    #[test]
    fn test_claims_expiration() {
        let claims = Claims {
            sub: "user_1".to_string(),
            iat: 0,
            exp: 1,
            org_id: None,
            custom: HashMap::new(),
        };

        assert!(claims.is_expired());
    }

    #[test]
    fn test_provider_token_shape_deserializes() {
        let json = r#"{
            "sub": "user_2abc",
            "exp": 4102444800,
            "iat": 1700000000,
            "sid": "sess_123",
            "azp": "http://localhost:5173"
        }"#;

        let claims: Claims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.sub, "user_2abc");
        assert!(claims.org_id.is_none());
        assert_eq!(claims.get_claim("azp"), Some(&serde_json::json!("http://localhost:5173")));
    }
}
