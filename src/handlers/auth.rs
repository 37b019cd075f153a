use std::sync::Arc;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::{self, AdminUser, AuthUser},
    handlers::{
        created,
        uploads::{save_upload, UploadKind},
        ApiError, MessageResponse,
    },
    models::*,
    AppState,
};

const RESET_TOKEN_TTL_MINUTES: i64 = 30;

/// Property an organizational code points at: an admin's own code first,
/// then a hostel's code.
async fn resolve_org_code(state: &AppState, code: &str) -> Result<Option<i64>, ApiError> {
    if let Some(owner) = state.store.get_user_by_org_code(code).await? {
        return Ok(owner.property_id);
    }
    match state.store.get_property_by_org_code(code).await? {
        Some(property) => Ok(Some(property.id)),
        None => Err(ApiError::bad_request("Invalid organizational code")),
    }
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    auth::validate_name(&req.name)?;
    auth::validate_email(&req.email)?;
    auth::validate_phone(&req.phone)?;
    auth::validate_password(&req.password)?;

    if state.store.get_user_by_email(&req.email).await?.is_some() {
        return Err(ApiError::bad_request("User already exists"));
    }

    let property_id = match req.organizational_code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => resolve_org_code(&state, code).await?,
        _ => None,
    };

    let password_hash = auth::hash_password(&req.password, state.config.bcrypt_cost)?;
    let user = state
        .store
        .create_user(&NewUser {
            name: req.name,
            email: req.email,
            phone: req.phone,
            password_hash,
            role: Role::Tenant,
            property_id,
            verification_status: UserVerificationStatus::Unverified,
            organizational_code: None,
        })
        .await?;

    tracing::info!("Registered user {} (property {:?})", user.email, user.property_id);

    let token = auth::issue_token(&state.config, &user)?;
    Ok(created(RegisterResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        phone: user.phone,
        role: user.role,
        token,
    }))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .store
        .get_user_by_email(&req.email)
        .await?
        .filter(|u| auth::verify_password(&req.password, &u.password_hash))
        .ok_or_else(|| ApiError::bad_request("Invalid credentials"))?;

    let token = auth::issue_token(&state.config, &user)?;
    Ok(Json(LoginResponse {
        requires_onboarding: user.role == Role::Tenant && user.tenant_id.is_none(),
        id: user.id,
        name: user.name,
        email: user.email,
        phone: user.phone,
        role: user.role,
        verification_status: user.verification_status,
        organizational_code: user.organizational_code,
        token,
    }))
}

pub async fn get_profile(auth: AuthUser) -> Json<ProfileResponse> {
    Json(auth.user.into())
}

pub async fn update_profile(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    if let Some(name) = &req.name {
        auth::validate_name(name)?;
    }
    if let Some(phone) = &req.phone {
        auth::validate_phone(phone)?;
    }
    if let Some(email) = &req.email {
        auth::validate_email(email)?;
        if let Some(existing) = state.store.get_user_by_email(email).await? {
            if existing.id != auth.user.id {
                return Err(ApiError::bad_request("Email already in use"));
            }
        }
    }

    let user = state
        .store
        .update_user(
            auth.user.id,
            &UpdateUserRequest {
                name: req.name,
                email: req.email,
                phone: req.phone,
                property_id: None,
            },
        )
        .await?;
    Ok(Json(user.into()))
}

pub async fn update_settings(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(settings): Json<UserSettings>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = state.store.update_user_settings(auth.user.id, &settings).await?;
    Ok(Json(user.into()))
}

pub async fn upload_profile_image(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ProfileImageResponse>, ApiError> {
    let url = save_upload(
        &mut multipart,
        "image",
        UploadKind::Image,
        &state.config.uploads_dir,
        "profiles",
    )
    .await?;

    let user = state.store.update_user_profile_image(auth.user.id, &url).await?;
    Ok(Json(ProfileImageResponse {
        profile_image: user.profile_image.unwrap_or(url),
        message: "Profile image updated successfully".to_string(),
    }))
}

pub async fn change_password(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !auth::verify_password(&req.current_password, &auth.user.password_hash) {
        return Err(ApiError::bad_request("Current password is incorrect"));
    }
    auth::validate_password(&req.new_password)?;

    let hash = auth::hash_password(&req.new_password, state.config.bcrypt_cost)?;
    state.store.update_user_password(auth.user.id, &hash).await?;
    Ok(MessageResponse::new("Password updated successfully"))
}

pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>, ApiError> {
    let user = state
        .store
        .get_user_by_email(&req.email)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    let (token, digest) = auth::generate_reset_token();
    let expires_at = chrono::Utc::now() + chrono::TimeDelta::minutes(RESET_TOKEN_TTL_MINUTES);
    state.store.set_user_reset_token(user.id, &digest, expires_at).await?;

    tracing::info!("Password reset requested for user {}", user.id);
    Ok(Json(ForgotPasswordResponse {
        message: "Password reset link generated".to_string(),
        reset_url: format!("{}/reset-password?token={}", state.config.frontend_url(), token),
    }))
}

pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let digest = auth::hash_reset_token(req.token.trim());
    let user = state
        .store
        .get_user_by_reset_hash(&digest)
        .await?
        .filter(|u| u.reset_token_expires_at.is_some_and(|exp| exp > chrono::Utc::now()))
        .ok_or_else(|| ApiError::bad_request("Invalid or expired reset token"))?;

    auth::validate_password(&req.password)?;
    let hash = auth::hash_password(&req.password, state.config.bcrypt_cost)?;
    state.store.update_user_password(user.id, &hash).await?;

    tracing::info!("Password reset completed for user {}", user.id);
    Ok(MessageResponse::new("Password reset successful"))
}

pub async fn link_tenant(
    auth: AdminUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<LinkTenantRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let tenant = state
        .store
        .get_tenant(req.tenant_id)
        .await?
        .filter(|t| auth.scope().allows(t.property_id))
        .ok_or_else(|| ApiError::not_found("Tenant"))?;
    let target = state
        .store
        .get_user(req.user_id)
        .await?
        .filter(|u| auth.scope().allows(u.property_id))
        .ok_or_else(|| ApiError::not_found("User"))?;
    if target.role != Role::Tenant {
        return Err(ApiError::bad_request("Only tenant accounts can be linked to a tenant profile"));
    }

    let user = state.store.link_user_tenant(target.id, tenant.id).await?;
    Ok(Json(user.into()))
}
