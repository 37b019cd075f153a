use std::sync::Arc;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{
    auth::{StaffUser, TenantUser},
    db::PropertyScope,
    handlers::{created, tenants::scoped_tenant, ApiError},
    models::*,
    AppState,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentListQuery {
    pub tenant_id: Option<i64>,
}

pub async fn list_payments(
    auth: StaffUser,
    State(state): State<Arc<AppState>>,
    Query(q): Query<PaymentListQuery>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    let payments = state.store.list_payments(auth.scope(), q.tenant_id).await?;
    Ok(Json(payments))
}

pub async fn my_payments(
    auth: TenantUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    let Some(tenant_id) = auth.user.tenant_id else {
        return Ok(Json(Vec::new()));
    };
    let payments = state
        .store
        .list_payments(PropertyScope::All, Some(tenant_id))
        .await?;
    Ok(Json(payments))
}

pub async fn create_payment(
    auth: StaffUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<Payment>), ApiError> {
    let tenant = scoped_tenant(&state, auth.scope(), req.tenant).await?;
    let payment = state.store.create_payment(tenant.property_id, &req).await?;
    tracing::info!(
        "Recorded {} payment of {:.2} for tenant {}",
        payment.payment_type,
        payment.amount,
        tenant.id
    );
    Ok(created(payment))
}
