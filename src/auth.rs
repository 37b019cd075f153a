use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    typed_header::TypedHeaderRejectionReason,
    TypedHeader,
};
use regex_lite::Regex;
use sha2::{Digest, Sha256};
use std::sync::{Arc, OnceLock};

use crate::config::Config;
use crate::db::{PropertyScope, RuleViolation};
use crate::handlers::ErrorResponse;
use crate::models::{Claims, Role, User};
use crate::AppState;

/// Extractor that validates the bearer token and loads the caller's account.
///
/// Add `auth: AuthUser` to a handler's parameters to require authentication.
pub struct AuthUser {
    pub user: User,
}

impl AuthUser {
    /// Records this caller may see
    pub fn scope(&self) -> PropertyScope {
        PropertyScope::for_user(&self.user)
    }
}

#[async_trait::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|e| match e.reason() {
                    TypedHeaderRejectionReason::Missing => AuthError::MissingToken,
                    _ => AuthError::InvalidToken,
                })?;

        let claims = decode_token(&state.config, bearer.token()).ok_or(AuthError::InvalidToken)?;
        let user_id: i64 = claims.sub.parse().map_err(|_| AuthError::InvalidToken)?;

        let user = state
            .store
            .get_user(user_id)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load authenticated user: {:#}", e);
                AuthError::InvalidToken
            })?
            .ok_or(AuthError::UnknownUser)?;

        Ok(AuthUser { user })
    }
}

/// Declare an extractor that admits authenticated users passing `$allowed`
macro_rules! role_gate {
    ($(#[$meta:meta])* $name:ident, $allowed:expr) => {
        $(#[$meta])*
        pub struct $name(pub AuthUser);

        impl std::ops::Deref for $name {
            type Target = AuthUser;

            fn deref(&self) -> &AuthUser {
                &self.0
            }
        }

        #[async_trait::async_trait]
        impl FromRequestParts<Arc<AppState>> for $name {
            type Rejection = AuthError;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &Arc<AppState>,
            ) -> Result<Self, Self::Rejection> {
                let auth = AuthUser::from_request_parts(parts, state).await?;
                let allowed: fn(&Role) -> bool = $allowed;
                if !allowed(&auth.user.role) {
                    return Err(AuthError::Forbidden);
                }
                Ok($name(auth))
            }
        }
    };
}

role_gate!(
    /// Platform super-admin only
    SuperAdminUser,
    |role| *role == Role::SuperAdmin
);
role_gate!(
    /// Hostel admins and the super-admin
    AdminUser,
    Role::is_admin
);
role_gate!(
    /// Staff, admins and the super-admin
    StaffUser,
    Role::is_staff
);
role_gate!(
    /// Tenant accounts only
    TenantUser,
    |role| *role == Role::Tenant
);

pub enum AuthError {
    MissingToken,
    InvalidToken,
    UnknownUser,
    Forbidden,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "Not authorized, no token"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Not authorized, token failed"),
            AuthError::UnknownUser => (StatusCode::UNAUTHORIZED, "Not authorized, user not found"),
            AuthError::Forbidden => (StatusCode::FORBIDDEN, "Not authorized for this action"),
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

/// Sign a token for `user` valid for the configured lifetime
pub fn issue_token(cfg: &Config, user: &User) -> anyhow::Result<String> {
    let now = chrono::Utc::now();
    let exp = now + chrono::TimeDelta::hours(cfg.token_ttl_hours);

    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role,
        exp: exp.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(cfg.jwt_secret.as_bytes()),
    )
    .map_err(|e| anyhow::anyhow!("token generation error: {}", e))
}

fn decode_token(cfg: &Config, token: &str) -> Option<Claims> {
    jsonwebtoken::decode::<Claims>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(cfg.jwt_secret.as_bytes()),
        &jsonwebtoken::Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

pub fn hash_password(password: &str, cost: u32) -> anyhow::Result<String> {
    bcrypt::hash(password, cost).map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
}

/// A malformed stored hash counts as a mismatch
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Fresh password reset token and the SHA-256 digest that gets stored
pub fn generate_reset_token() -> (String, String) {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let token = hex::encode(bytes);
    let digest = hash_reset_token(&token);
    (token, digest)
}

pub fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

// ========== Input validation ==========

fn email_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
}

fn invalid(msg: &str) -> anyhow::Error {
    RuleViolation::new(msg).into()
}

/// At least 8 characters with upper, lower, digit and special character
pub fn validate_password(password: &str) -> anyhow::Result<()> {
    let long_enough = password.chars().count() >= 8;
    let upper = password.chars().any(|c| c.is_ascii_uppercase());
    let lower = password.chars().any(|c| c.is_ascii_lowercase());
    let digit = password.chars().any(|c| c.is_ascii_digit());
    let special = password.chars().any(|c| !c.is_ascii_alphanumeric() && !c.is_whitespace());
    if long_enough && upper && lower && digit && special {
        Ok(())
    } else {
        Err(invalid(
            "Password must be at least 8 characters and include uppercase, lowercase, number and special character",
        ))
    }
}

pub fn validate_phone(phone: &str) -> anyhow::Result<()> {
    let phone = phone.trim();
    if phone.len() == 10 && phone.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(invalid("Phone number must be exactly 10 digits"))
    }
}

pub fn validate_email(email: &str) -> anyhow::Result<()> {
    if email_regex().is_some_and(|re| re.is_match(email.trim())) {
        Ok(())
    } else {
        Err(invalid("Please provide a valid email"))
    }
}

pub fn validate_aadhaar(aadhaar: &str) -> anyhow::Result<()> {
    let aadhaar = aadhaar.trim();
    if aadhaar.len() == 12 && aadhaar.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(invalid("Aadhaar number must be exactly 12 digits"))
    }
}

pub fn validate_name(name: &str) -> anyhow::Result<()> {
    let len = name.trim().chars().count();
    if (2..=100).contains(&len) {
        Ok(())
    } else {
        Err(invalid("Name must be between 2 and 100 characters"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        let mut cfg = Config::load();
        cfg.jwt_secret = "test-secret".to_string();
        cfg
    }

    fn user(role: Role) -> User {
        User {
            id: 42,
            name: "Asha".into(),
            email: "asha@example.com".into(),
            phone: "9876543210".into(),
            password_hash: String::new(),
            role,
            email_verified: false,
            phone_verified: false,
            property_id: None,
            tenant_id: None,
            verification_status: Default::default(),
            verified_at: None,
            organizational_code: None,
            profile_image: None,
            settings: Default::default(),
            reset_token_hash: None,
            reset_token_expires_at: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_token_round_trip() {
        let cfg = config();
        let token = issue_token(&cfg, &user(Role::Staff)).unwrap();
        let claims = decode_token(&cfg, &token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.role, Role::Staff);

        let mut other = config();
        other.jwt_secret = "different".to_string();
        assert!(decode_token(&other, &token).is_none());
    }

    #[test]
    fn test_password_policy() {
        assert!(validate_password("Str0ng!pass").is_ok());
        assert!(validate_password("weakpass").is_err());
        assert!(validate_password("NoDigits!").is_err());
        assert!(validate_password("Sh0rt!").is_err());
    }

    #[test]
    fn test_field_validators() {
        assert!(validate_phone("9876543210").is_ok());
        assert!(validate_phone("98765").is_err());
        assert!(validate_email("a.b@example.co.in").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_aadhaar("123412341234").is_ok());
        assert!(validate_aadhaar("1234-1234-1234").is_err());
        assert!(validate_name("Al").is_ok());
        assert!(validate_name(" A ").is_err());
    }

    #[test]
    fn test_reset_token_digest() {
        let (token, digest) = generate_reset_token();
        assert_eq!(token.len(), 64);
        assert_eq!(digest, hash_reset_token(&token));
        assert_ne!(token, digest);
    }

    #[test]
    fn test_password_hashing() {
        let hash = hash_password("Str0ng!pass", 4).unwrap();
        assert!(verify_password("Str0ng!pass", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("Str0ng!pass", "not-a-hash"));
    }
}
