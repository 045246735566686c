//! Supabase JWT verification and the admin gate for `/admin` routes.
//!
//! The service never issues tokens; it only validates the HS256 access
//! tokens Supabase Auth hands to signed-in users and checks the admin
//! role carried in `app_metadata`.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Claims of a Supabase access token (the subset this service reads).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub app_metadata: AppMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppMetadata {
    #[serde(default)]
    pub role: Option<String>,
}

impl Claims {
    /// Admin screens are reachable for users whose `app_metadata` carries
    /// the admin role, and for service-role tokens.
    pub fn is_admin(&self) -> bool {
        self.app_metadata.role.as_deref() == Some("admin")
            || self.role.as_deref() == Some("service_role")
    }
}

pub struct AdminAuth {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AdminAuth {
    pub fn new(jwt_secret: &str) -> Self {
        let mut validation = Validation::default();
        // Supabase sets aud = "authenticated" for every signed-in user;
        // authorization happens on the role claim instead.
        validation.validate_aud = false;
        Self {
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation,
        }
    }

    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("SUPABASE_JWT_SECRET")
            .map_err(|_| anyhow!("SUPABASE_JWT_SECRET not set"))?;
        Ok(Self::new(&secret))
    }

    /// Validate signature and expiry, returning the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding_key, &self.validation).map(|data| data.claims)
    }
}

/// Middleware guarding the admin router: 401 for missing/invalid tokens,
/// 403 for valid tokens without the admin role.
pub async fn require_admin(
    State(auth): State<Arc<AdminAuth>>,
    request: Request,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                "Missing bearer token".to_string(),
            )
        })?;

    let claims = auth
        .verify(token)
        .map_err(|e| (StatusCode::UNAUTHORIZED, format!("Invalid token: {}", e)))?;

    if !claims.is_admin() {
        return Err((StatusCode::FORBIDDEN, "Admin role required".to_string()));
    }

    debug!("Admin request authorized for {}", claims.sub);
    Ok(next.run(request).await)
}
