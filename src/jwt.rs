use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};

use crate::app::AppState;
use crate::authz::Role;
use crate::errors::AppError;

const DEFAULT_EXP_HOURS: i64 = 1;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: Arc<Vec<u8>>,
    pub exp_hours: i64,
}

impl JwtConfig {
    pub fn new(secret: impl Into<Vec<u8>>, exp_hours: i64) -> Self {
        Self {
            secret: Arc::new(secret.into()),
            exp_hours,
        }
    }

    pub fn from_env() -> Result<Self, AppError> {
        Self::from_settings(
            std::env::var("JWT_SECRET").ok(),
            std::env::var("JWT_EXP_HOURS").ok(),
        )
    }

    fn from_settings(secret: Option<String>, exp_hours: Option<String>) -> Result<Self, AppError> {
        let secret = secret
            .filter(|secret| !secret.trim().is_empty())
            .ok_or_else(|| AppError::configuration("JWT_SECRET must be set to a non-empty value"))?;

        let exp_hours = match exp_hours {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|hours| *hours > 0)
                .ok_or_else(|| AppError::configuration("JWT_EXP_HOURS must be a positive integer"))?,
            None => DEFAULT_EXP_HOURS,
        };

        Ok(Self::new(secret, exp_hours))
    }

    pub fn encode(&self, employee_id: i64, role: Role, department: &str) -> Result<String, AppError> {
        use chrono::{Duration, Utc};

        let now = Utc::now();
        let exp = now + Duration::hours(self.exp_hours);

        let claims = Claims {
            id: employee_id,
            role,
            department: department.to_string(),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(&self.secret))
            .map_err(|err| AppError::internal(format!("failed to sign token: {err}")))
    }

    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&self.secret), &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => AppError::TokenExpired,
                _ => {
                    tracing::debug!(error = %err, "token verification failed");
                    AppError::invalid_token("Invalid token.")
                }
            })
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    pub id: i64,
    pub role: Role,
    pub department: String,
    pub exp: usize,
    pub iat: usize,
}

/// Caller identity attached to every protected request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub employee_id: i64,
    pub role: Role,
    pub department: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::unauthenticated("Access denied. No token provided."))?;

        let claims = state.jwt.decode(token)?;

        Ok(AuthUser {
            employee_id: claims.id,
            role: claims.role,
            department: claims.department,
        })
    }
}
