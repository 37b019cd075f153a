use std::sync::Arc;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{
    auth::{AuthUser, StaffUser, TenantUser},
    handlers::{created, filter_value, tenants::scoped_tenant, ApiError},
    models::*,
    AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct TicketListQuery {
    pub status: Option<String>,
}

pub async fn list_tickets(
    auth: StaffUser,
    State(state): State<Arc<AppState>>,
    Query(q): Query<TicketListQuery>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
    let status = filter_value(q.status.as_deref())
        .map(str::parse::<TicketStatus>)
        .transpose()
        .map_err(|_| ApiError::bad_request("Invalid ticket status"))?;
    let tickets = state.store.list_tickets(auth.scope(), status).await?;
    Ok(Json(tickets))
}

pub async fn my_tickets(
    auth: TenantUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
    let Some(tenant_id) = auth.user.tenant_id else {
        return Ok(Json(Vec::new()));
    };
    let tickets = state.store.list_tenant_tickets(tenant_id, false).await?;
    Ok(Json(tickets))
}

/// Tenants file for themselves; staff must name the tenant
pub async fn create_ticket(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<Ticket>), ApiError> {
    let tenant = if auth.user.role.is_staff() {
        let tenant_id = req
            .tenant
            .ok_or_else(|| ApiError::bad_request("Tenant is required"))?;
        scoped_tenant(&state, auth.scope(), tenant_id).await?
    } else {
        let tenant_id = auth
            .user
            .tenant_id
            .ok_or_else(|| ApiError::bad_request("Complete onboarding before raising tickets"))?;
        state
            .store
            .get_tenant(tenant_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Tenant"))?
    };

    let ticket = state.store.create_ticket(&tenant, &req).await?;
    tracing::info!("Ticket {} opened for tenant {}", ticket.id, tenant.id);
    Ok(created(ticket))
}

pub async fn update_ticket_status(
    auth: StaffUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTicketStatusRequest>,
) -> Result<Json<Ticket>, ApiError> {
    state
        .store
        .get_ticket(id)
        .await?
        .filter(|t| auth.scope().allows(t.property_id))
        .ok_or_else(|| ApiError::not_found("Ticket"))?;

    let ticket = state.store.update_ticket_status(id, req.status).await?;
    Ok(Json(ticket))
}
