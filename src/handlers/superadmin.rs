//! Platform administration: hostels, their compliance review, and the
//! admin accounts that run them. Every route requires the super-admin.

use std::sync::Arc;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    auth::{self, SuperAdminUser},
    db::generate_org_code,
    handlers::{
        created, filter_value,
        uploads::{save_upload, UploadKind},
        ApiError, MessageResponse, PageQuery,
    },
    models::*,
    AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct HostelListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AdminList {
    pub admins: Vec<AdminSummary>,
}

async fn target_user(state: &AppState, id: i64) -> Result<User, ApiError> {
    state
        .store
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))
}

async fn ensure_hostel(state: &AppState, id: i64) -> Result<Property, ApiError> {
    state
        .store
        .get_property(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Hostel"))
}

// ========== Hostels ==========

pub async fn platform_stats(
    _auth: SuperAdminUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<PlatformStats>, ApiError> {
    let stats = state.store.platform_stats().await?;
    Ok(Json(stats))
}

pub async fn list_hostels(
    _auth: SuperAdminUser,
    State(state): State<Arc<AppState>>,
    Query(q): Query<HostelListQuery>,
) -> Result<Json<HostelList>, ApiError> {
    let status = filter_value(q.status.as_deref())
        .map(str::parse::<PropertyVerificationStatus>)
        .transpose()
        .map_err(|_| ApiError::bad_request("Invalid verification status"))?;
    let (page, limit, offset) = PageQuery { page: q.page, limit: q.limit }.resolve(20);

    let (hostels, total) = state
        .store
        .list_properties(filter_value(q.search.as_deref()), status, limit, offset)
        .await?;
    Ok(Json(HostelList {
        hostels,
        page: PageMeta::new(total, page, limit),
    }))
}

pub async fn list_unassigned_hostels(
    _auth: SuperAdminUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Property>>, ApiError> {
    let hostels = state.store.list_unassigned_properties().await?;
    Ok(Json(hostels))
}

pub async fn get_hostel(
    _auth: SuperAdminUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<HostelDetail>, ApiError> {
    let hostel = state
        .store
        .get_property_summary(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Hostel"))?;

    let tenants = state.store.list_property_tenants(id).await?;
    let rooms = state.store.list_property_rooms(id).await?;
    let admins = state.store.list_property_staff(id).await?;
    Ok(Json(HostelDetail {
        hostel,
        tenants,
        rooms,
        admins,
    }))
}

pub async fn create_hostel(
    _auth: SuperAdminUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePropertyRequest>,
) -> Result<(StatusCode, Json<Property>), ApiError> {
    if req.name.trim().is_empty() || req.address.trim().is_empty() {
        return Err(ApiError::bad_request("Hostel name and address are required"));
    }
    let hostel = state.store.create_property(&req).await?;
    Ok(created(hostel))
}

pub async fn update_hostel(
    _auth: SuperAdminUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdatePropertyRequest>,
) -> Result<Json<Property>, ApiError> {
    let blank = |v: &Option<String>| v.as_deref().is_some_and(|s| s.trim().is_empty());
    if blank(&req.name) || blank(&req.address) {
        return Err(ApiError::bad_request("Hostel name and address cannot be empty"));
    }
    let hostel = state.store.update_property(id, &req).await?;
    Ok(Json(hostel))
}

pub async fn upload_hostel_document(
    _auth: SuperAdminUser,
    State(state): State<Arc<AppState>>,
    Path((id, kind)): Path<(i64, String)>,
    mut multipart: Multipart,
) -> Result<Json<Property>, ApiError> {
    let kind: DocumentKind = kind
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid document type"))?;
    ensure_hostel(&state, id).await?;

    let url = save_upload(
        &mut multipart,
        "file",
        UploadKind::Document,
        &state.config.uploads_dir,
        "documents",
    )
    .await?;

    let hostel = state.store.set_property_document(id, kind, &url).await?;
    tracing::info!("Stored {} for hostel {}", kind, id);
    Ok(Json(hostel))
}

pub async fn verify_hostel(
    auth: SuperAdminUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<VerifyHostelRequest>,
) -> Result<Json<Property>, ApiError> {
    let action: VerifyAction = req
        .action
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid action. Use 'verify' or 'reject'"))?;

    let hostel = match action {
        VerifyAction::Verify => state.store.verify_property(id, auth.user.id).await?,
        VerifyAction::Reject => {
            let reason = req
                .reason
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .unwrap_or("No reason provided");
            state.store.reject_property(id, reason).await?
        }
    };
    tracing::info!("Hostel {} marked {}", id, hostel.verification_status);
    Ok(Json(hostel))
}

pub async fn delete_hostel(
    _auth: SuperAdminUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.store.delete_property(id).await?;
    Ok(MessageResponse::new("Hostel deleted"))
}

// ========== Admin accounts ==========

pub async fn list_admins(
    _auth: SuperAdminUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<AdminList>, ApiError> {
    let admins = state.store.list_admins().await?;
    Ok(Json(AdminList { admins }))
}

pub async fn create_admin(
    _auth: SuperAdminUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAdminRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    auth::validate_name(&req.name)?;
    auth::validate_email(&req.email)?;
    auth::validate_phone(&req.phone)?;
    auth::validate_password(&req.password)?;

    if state.store.get_user_by_email(&req.email).await?.is_some() {
        return Err(ApiError::bad_request("User already exists"));
    }
    if let Some(property_id) = req.property_id {
        ensure_hostel(&state, property_id).await?;
    }

    let password_hash = auth::hash_password(&req.password, state.config.bcrypt_cost)?;
    let mut admin = state
        .store
        .create_user(&NewUser {
            name: req.name,
            email: req.email,
            phone: req.phone,
            password_hash,
            role: Role::Admin,
            property_id: None,
            verification_status: UserVerificationStatus::Verified,
            organizational_code: Some(generate_org_code()),
        })
        .await?;

    if let Some(property_id) = req.property_id {
        state.store.assign_admin_to_property(admin.id, property_id).await?;
        admin.property_id = Some(property_id);
    }

    tracing::info!("Admin account {} created (property {:?})", admin.email, admin.property_id);
    Ok(created(admin))
}

pub async fn update_admin(
    _auth: SuperAdminUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    target_user(&state, id).await?;
    if let Some(name) = &req.name {
        auth::validate_name(name)?;
    }
    if let Some(phone) = &req.phone {
        auth::validate_phone(phone)?;
    }
    if let Some(email) = &req.email {
        auth::validate_email(email)?;
        if let Some(existing) = state.store.get_user_by_email(email).await? {
            if existing.id != id {
                return Err(ApiError::bad_request("Email already in use"));
            }
        }
    }

    let property_id = req.property_id;
    let mut admin = state
        .store
        .update_user(id, &UpdateUserRequest { property_id: None, ..req })
        .await?;
    if let Some(property_id) = property_id {
        state.store.assign_admin_to_property(id, property_id).await?;
        admin.property_id = Some(property_id);
    }
    Ok(Json(admin))
}

pub async fn delete_admin(
    _auth: SuperAdminUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let target = target_user(&state, id).await?;
    if target.role == Role::SuperAdmin {
        return Err(ApiError::forbidden("Cannot delete a super admin"));
    }
    state.store.delete_user(id).await?;
    tracing::info!("User {} deleted", target.email);
    Ok(MessageResponse::new("Admin deleted successfully"))
}

pub async fn update_admin_role(
    _auth: SuperAdminUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<Json<User>, ApiError> {
    let role = req
        .role
        .parse::<Role>()
        .ok()
        .filter(|r| *r != Role::SuperAdmin)
        .ok_or_else(|| ApiError::bad_request("Invalid role. Use 'admin', 'staff' or 'tenant'"))?;

    let target = target_user(&state, id).await?;
    if target.role == Role::SuperAdmin {
        return Err(ApiError::forbidden("Cannot change the role of a super admin"));
    }

    let user = state.store.update_user_role(id, role).await?;
    tracing::info!("User {} role changed from {} to {}", id, target.role, role);
    Ok(Json(user))
}
