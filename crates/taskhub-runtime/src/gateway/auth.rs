use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use taskhub_core::config::{AuthConfig, JwtAlgorithm};
use taskhub_core::error::{Result, TaskHubError};
use taskhub_core::{AuthContext, Claims};

use super::response::ApiError;

fn algorithm(alg: JwtAlgorithm) -> Algorithm {
    match alg {
        JwtAlgorithm::HS256 => Algorithm::HS256,
        JwtAlgorithm::HS384 => Algorithm::HS384,
        JwtAlgorithm::HS512 => Algorithm::HS512,
        JwtAlgorithm::RS256 => Algorithm::RS256,
    }
}

/// Bearer token verifier.
#[derive(Clone)]
pub struct AuthMiddleware {
    config: Arc<AuthConfig>,
    decoding_key: Option<DecodingKey>,
}

impl std::fmt::Debug for AuthMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthMiddleware")
            .field("algorithm", &self.config.algorithm)
            .field("skip_verification", &self.config.skip_verification)
            .field("decoding_key", &self.decoding_key.is_some())
            .finish()
    }
}

impl AuthMiddleware {
    /// Build the verifier. Fails when an RSA key is configured but unreadable.
    pub fn new(config: AuthConfig) -> Result<Self> {
        let decoding_key = if config.skip_verification {
            None
        } else {
            match config.algorithm {
                JwtAlgorithm::RS256 => match config.jwt_public_key_pem.as_deref() {
                    Some(pem) => Some(DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| {
                        TaskHubError::Config(format!("Invalid auth.jwt_public_key_pem: {}", e))
                    })?),
                    None => None,
                },
                _ => config
                    .jwt_secret
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .map(|s| DecodingKey::from_secret(s.as_bytes())),
            }
        };

        if decoding_key.is_none() && !config.skip_verification {
            tracing::warn!("No JWT verification key configured; every request is unauthenticated");
        }

        Ok(Self {
            config: Arc::new(config),
            decoding_key,
        })
    }

    /// Verifier that accepts any well-formed, unexpired token.
    /// WARNING: skips signature verification. Development only.
    pub fn permissive() -> Self {
        Self {
            config: Arc::new(AuthConfig {
                skip_verification: true,
                ..Default::default()
            }),
            decoding_key: None,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Validate a token and extract its claims.
    pub fn validate_token(&self, token: &str) -> std::result::Result<Claims, AuthError> {
        if self.config.skip_verification {
            self.decode_without_verification(token)
        } else if let Some(ref key) = self.decoding_key {
            self.decode_with_verification(token, key)
        } else {
            Err(AuthError::InvalidToken("Verification key not configured".to_string()))
        }
    }

    fn decode_with_verification(
        &self,
        token: &str,
        key: &DecodingKey,
    ) -> std::result::Result<Claims, AuthError> {
        let mut validation = Validation::new(algorithm(self.config.algorithm));
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = self.config.leeway_secs;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data = decode::<Claims>(token, key, &validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                AuthError::InvalidToken("Invalid signature".to_string())
            }
            jsonwebtoken::errors::ErrorKind::InvalidToken => {
                AuthError::InvalidToken("Invalid token format".to_string())
            }
            jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(claim) => {
                AuthError::InvalidToken(format!("Missing required claim: {}", claim))
            }
            _ => AuthError::InvalidToken(e.to_string()),
        })?;

        Ok(token_data.claims)
    }

    fn decode_without_verification(&self, token: &str) -> std::result::Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let dummy_key = DecodingKey::from_secret(b"dummy");

        let token_data =
            decode::<Claims>(token, &dummy_key, &validation).map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidToken => {
                    AuthError::InvalidToken("Invalid token format".to_string())
                }
                _ => AuthError::InvalidToken(e.to_string()),
            })?;

        // Expiry is still enforced without a signature check.
        if token_data.claims.is_expired() {
            return Err(AuthError::TokenExpired);
        }

        Ok(token_data.claims)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Token expired")]
    TokenExpired,
}

/// Resolve the auth context for a request. Missing or invalid tokens yield an
/// unauthenticated context; rejecting is left to [`require_auth`].
pub fn extract_auth_context(req: &Request<Body>, middleware: &AuthMiddleware) -> AuthContext {
    let token = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    match token {
        Some(token) => match middleware.validate_token(token) {
            Ok(claims) if !claims.sub.is_empty() => AuthContext::from_claims(claims),
            Ok(_) => AuthContext::unauthenticated(),
            Err(e) => {
                tracing::debug!(error = %e, "Rejected bearer token");
                AuthContext::unauthenticated()
            }
        },
        None => AuthContext::unauthenticated(),
    }
}

pub async fn auth_middleware(
    State(middleware): State<Arc<AuthMiddleware>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let auth_context = extract_auth_context(&req, &middleware);
    req.extensions_mut().insert(auth_context);
    next.run(req).await
}

/// Reject requests without an authenticated user.
pub async fn require_auth(req: Request<Body>, next: Next) -> Response {
    let authenticated = req
        .extensions()
        .get::<AuthContext>()
        .map(AuthContext::is_authenticated)
        .unwrap_or(false);

    if !authenticated {
        return ApiError::unauthorized("Unauthenticated").into_response();
    }
    next.run(req).await
}
