use std::sync::Arc;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Datelike, Months, NaiveDate, Utc};
use serde::Deserialize;

use crate::{
    auth::{self, AdminUser, AuthUser, StaffUser},
    db::PropertyScope,
    handlers::{created, filter_value, ApiError, MessageResponse, PageQuery},
    models::*,
    notify::notify_best_effort,
    AppState,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantListQuery {
    pub search: Option<String>,
    /// active | inactive | all
    pub status: Option<String>,
    pub approval_status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    pub tenant_id: Option<i64>,
}

/// Tenant visible to `scope`, 404 otherwise
pub(crate) async fn scoped_tenant(state: &AppState, scope: PropertyScope, id: i64) -> Result<Tenant, ApiError> {
    state
        .store
        .get_tenant(id)
        .await?
        .filter(|t| scope.allows(t.property_id))
        .ok_or_else(|| ApiError::not_found("Tenant"))
}

/// Tenants may only look at their own profile; staff see their hostel's
async fn visible_tenant(state: &AppState, auth: &AuthUser, id: i64) -> Result<Tenant, ApiError> {
    if auth.user.role.is_staff() {
        return scoped_tenant(state, auth.scope(), id).await;
    }
    if auth.user.tenant_id != Some(id) {
        return Err(ApiError::not_found("Tenant"));
    }
    state
        .store
        .get_tenant(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Tenant"))
}

fn validate_contact(email: Option<&str>, phone: Option<&str>, aadhaar: Option<&str>) -> anyhow::Result<()> {
    if let Some(email) = email {
        auth::validate_email(email)?;
    }
    if let Some(phone) = phone.filter(|p| !p.trim().is_empty()) {
        auth::validate_phone(phone)?;
    }
    if let Some(aadhaar) = aadhaar.filter(|a| !a.trim().is_empty()) {
        auth::validate_aadhaar(aadhaar)?;
    }
    Ok(())
}

/// Rent is due a month after the last rent payment, or on the first of
/// next month when nothing has been paid yet.
pub fn next_due_date(last_rent_paid: Option<NaiveDate>, today: NaiveDate) -> NaiveDate {
    match last_rent_paid {
        Some(paid) => paid.checked_add_months(Months::new(1)).unwrap_or(paid),
        None => today
            .with_day(1)
            .and_then(|first| first.checked_add_months(Months::new(1)))
            .unwrap_or(today),
    }
}

/// "Jane Doe" -> ("Jane", Some("Doe")); single names have no last name
fn split_name(name: &str) -> (String, Option<String>) {
    let mut parts = name.split_whitespace();
    let first = parts.next().unwrap_or_default().to_string();
    let rest = parts.collect::<Vec<_>>().join(" ");
    (first, (!rest.is_empty()).then_some(rest))
}

pub async fn list_tenants(
    auth: StaffUser,
    State(state): State<Arc<AppState>>,
    Query(q): Query<TenantListQuery>,
) -> Result<Json<TenantList>, ApiError> {
    let active = match filter_value(q.status.as_deref()) {
        None => None,
        Some("active") => Some(true),
        Some("inactive") => Some(false),
        Some(_) => return Err(ApiError::bad_request("Invalid tenant status")),
    };
    let filter = TenantFilter {
        search: filter_value(q.search.as_deref()).map(str::to_string),
        active,
        approval_status: filter_value(q.approval_status.as_deref())
            .map(str::parse::<ApprovalStatus>)
            .transpose()
            .map_err(|_| ApiError::bad_request("Invalid approval status"))?,
    };
    let (page, limit, offset) = PageQuery { page: q.page, limit: q.limit }.resolve(10);

    let (tenants, total) = state.store.list_tenants(auth.scope(), &filter, limit, offset).await?;
    Ok(Json(TenantList {
        tenants,
        page: PageMeta::new(total, page, limit),
    }))
}

pub async fn tenant_stats(
    auth: AdminUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<TenantStats>, ApiError> {
    let stats = state.store.tenant_stats(auth.scope()).await?;
    Ok(Json(stats))
}

pub async fn tenant_dashboard(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(q): Query<DashboardQuery>,
) -> Result<Json<TenantDashboard>, ApiError> {
    let tenant_id = if auth.user.role == Role::Tenant {
        auth.user.tenant_id
    } else {
        q.tenant_id.or(auth.user.tenant_id)
    }
    .ok_or_else(|| ApiError::not_found("Tenant"))?;
    let tenant = visible_tenant(&state, &auth, tenant_id).await?;

    let recent_invoices = state.store.recent_payments(tenant.id, 5).await?;
    let last_rent = state.store.last_rent_payment(tenant.id).await?;
    let active_tickets = state.store.list_tenant_tickets(tenant.id, true).await?;

    let current_rent = last_rent
        .as_ref()
        .map(|p| p.amount)
        .or_else(|| tenant.room.as_ref().map(|r| r.rent))
        .unwrap_or(0.0);
    let due_date = next_due_date(
        last_rent.as_ref().map(|p| p.paid_at.date_naive()),
        Utc::now().date_naive(),
    );

    Ok(Json(TenantDashboard {
        user_name: tenant.full_name(),
        current_rent,
        due_date,
        active_issues: active_tickets.len(),
        room_number: tenant.room.as_ref().map(|r| r.number.clone()),
        recent_invoices,
        active_tickets,
    }))
}

pub async fn get_tenant(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Tenant>, ApiError> {
    let tenant = visible_tenant(&state, &auth, id).await?;
    Ok(Json(tenant))
}

/// Admin-added tenants are approved and seated immediately
pub async fn create_tenant(
    auth: AdminUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTenantRequest>,
) -> Result<(StatusCode, Json<Tenant>), ApiError> {
    if req.first_name.trim().is_empty() {
        return Err(ApiError::bad_request("First name is required"));
    }
    validate_contact(
        Some(&req.email),
        req.phone.as_deref(),
        req.details.aadhar_number.as_deref(),
    )?;
    if let Some(room_id) = req.room {
        crate::handlers::rooms::scoped_room(&state, auth.scope(), room_id).await?;
    }

    let tenant = state
        .store
        .create_tenant(&NewTenant {
            property_id: auth.scope().owning_property(),
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            phone: req.phone,
            room_id: req.room,
            details: req.details,
            terms_accepted: false,
            organizational_code: None,
            admission: Admission::Direct {
                approved_by: auth.user.id,
            },
        })
        .await?;

    tracing::info!("Tenant {} added by user {}", tenant.id, auth.user.id);
    Ok(created(tenant))
}

/// Self-service registration; stays pending until an admin approves it
pub async fn onboard_tenant(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<OnboardTenantRequest>,
) -> Result<(StatusCode, Json<OnboardResponse>), ApiError> {
    if auth.user.tenant_id.is_some() {
        return Err(ApiError::bad_request("Tenant profile already exists"));
    }
    let room_id = req.room.ok_or_else(|| ApiError::bad_request("Room selection is required"))?;
    if req.details.move_in_date.is_none() {
        return Err(ApiError::bad_request("Move-in date is required"));
    }
    if !req.terms_accepted {
        return Err(ApiError::bad_request("You must accept the terms and conditions"));
    }
    if let Some(aadhaar) = req.details.aadhar_number.as_deref().filter(|a| !a.trim().is_empty()) {
        auth::validate_aadhaar(aadhaar)?;
    }

    let room = state
        .store
        .get_room(room_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Room"))?;

    let user = &auth.user;
    let (first_name, last_name) = split_name(&user.name);
    let tenant = state
        .store
        .onboard_tenant(
            user.id,
            &NewTenant {
                property_id: user.property_id.or(room.property_id),
                first_name,
                last_name,
                email: user.email.clone(),
                phone: Some(user.phone.clone()),
                room_id: Some(room.id),
                details: req.details,
                terms_accepted: true,
                organizational_code: None,
                admission: Admission::SelfService,
            },
        )
        .await?;

    tracing::info!("Tenant {} submitted onboarding for room {}", tenant.id, room.number);
    Ok(created(OnboardResponse {
        tenant,
        message: "Registration submitted. Awaiting admin approval.".to_string(),
    }))
}

pub async fn update_tenant(
    auth: AdminUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTenantRequest>,
) -> Result<Json<Tenant>, ApiError> {
    scoped_tenant(&state, auth.scope(), id).await?;
    if let Some(first) = &req.first_name {
        if first.trim().is_empty() {
            return Err(ApiError::bad_request("First name is required"));
        }
    }
    validate_contact(
        req.email.as_deref(),
        req.phone.as_deref(),
        req.details.aadhar_number.as_deref(),
    )?;
    if let Some(room_id) = req.room {
        crate::handlers::rooms::scoped_room(&state, auth.scope(), room_id).await?;
    }

    let tenant = state.store.update_tenant(id, &req).await?;
    Ok(Json(tenant))
}

pub async fn approve_tenant(
    auth: AdminUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<TenantActionResponse>, ApiError> {
    scoped_tenant(&state, auth.scope(), id).await?;
    let tenant = state.store.approve_tenant(id, auth.user.id).await?;

    let body = format!(
        "Hello {}, your tenant registration has been approved! You can now log in to HostelHub.",
        tenant.first_name
    );
    notify_best_effort(state.sms.as_ref(), tenant.phone.as_deref(), &body, "tenant-approval").await;

    Ok(Json(TenantActionResponse {
        message: "Tenant approved successfully".to_string(),
        tenant,
    }))
}

pub async fn reject_tenant(
    auth: AdminUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    body: Option<Json<RejectTenantRequest>>,
) -> Result<Json<TenantActionResponse>, ApiError> {
    scoped_tenant(&state, auth.scope(), id).await?;
    let reason = body
        .and_then(|Json(req)| req.rejection_reason)
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| "No reason provided".to_string());

    let tenant = state.store.reject_tenant(id, &reason).await?;
    Ok(Json(TenantActionResponse {
        message: "Tenant rejected".to_string(),
        tenant,
    }))
}

pub async fn vacate_tenant(
    auth: AdminUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<TenantActionResponse>, ApiError> {
    scoped_tenant(&state, auth.scope(), id).await?;
    let tenant = state.store.vacate_tenant(id).await?;
    Ok(Json(TenantActionResponse {
        message: "Tenant vacated".to_string(),
        tenant,
    }))
}

pub async fn delete_tenant(
    auth: AdminUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    scoped_tenant(&state, auth.scope(), id).await?;
    state.store.delete_tenant(id).await?;
    Ok(MessageResponse::new("Tenant removed"))
}

/// Broadcast an admin message to the selected tenants, one result each
pub async fn send_sms(
    auth: AdminUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendSmsRequest>,
) -> Result<Json<SendSmsResponse>, ApiError> {
    if req.tenant_ids.is_empty() {
        return Err(ApiError::bad_request("Tenant IDs array is required"));
    }
    let message = req.message.trim();
    if message.is_empty() {
        return Err(ApiError::bad_request("Message is required"));
    }

    let scope = auth.scope();
    let tenants: Vec<Tenant> = state
        .store
        .list_tenants_by_ids(&req.tenant_ids)
        .await?
        .into_iter()
        .filter(|t| scope.allows(t.property_id))
        .collect();
    if tenants.is_empty() {
        return Err(ApiError::not_found("Tenants"));
    }

    let mut results = Vec::with_capacity(tenants.len());
    for tenant in tenants {
        let name = tenant.full_name();
        let outcome = match tenant.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            Some(phone) => state
                .sms
                .send(phone, &format!("Hello {}, {}", name, message))
                .await
                .map(|_| ())
                .map_err(|e| e.to_string()),
            None => Err("No phone number on record".to_string()),
        };
        if let Err(e) = &outcome {
            tracing::warn!(tenant_id = tenant.id, "SMS failed: {}", e);
        }
        results.push(SmsResult {
            tenant_id: tenant.id,
            name,
            phone: tenant.phone,
            success: outcome.is_ok(),
            error: outcome.err(),
        });
    }

    let sent = results.iter().filter(|r| r.success).count();
    Ok(Json(SendSmsResponse {
        message: format!("SMS sent to {} tenants, {} failed", sent, results.len() - sent),
        results,
    }))
}

pub async fn send_manual_sms(
    _auth: AdminUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ManualSmsRequest>,
) -> Result<Json<ManualSmsResponse>, ApiError> {
    let phone = req.phone.trim();
    if phone.is_empty() {
        return Err(ApiError::bad_request("Phone number is required"));
    }
    let message = req.message.trim();
    if message.is_empty() {
        return Err(ApiError::bad_request("Message is required"));
    }

    let receipt = state.sms.send(phone, message).await.map_err(|e| {
        tracing::warn!("Manual SMS failed: {}", e);
        ApiError::bad_gateway(e.to_string())
    })?;
    Ok(Json(ManualSmsResponse {
        message: "SMS sent successfully".to_string(),
        sid: receipt.sid,
    }))
}
