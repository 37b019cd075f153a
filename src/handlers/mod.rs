pub mod auth;
pub mod payments;
pub mod rooms;
pub mod superadmin;
pub mod tenants;
pub mod tickets;
pub mod uploads;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::{NotFoundError, RuleViolation};

/// Shared pagination query parameters for list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl PageQuery {
    /// Resolve to (page, limit, offset); page >= 1, limit in [1, 100]
    pub fn resolve(&self, default_limit: i64) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(default_limit).clamp(1, 100);
        (page, limit, (page - 1) * limit)
    }
}

/// Error body understood by the SPA: {"message": "..."}
#[derive(Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// API error type
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn not_found(resource: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: format!("{} not found", resource),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: msg.into(),
        }
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: msg.into(),
        }
    }

    pub fn bad_gateway(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }

    #[cfg(test)]
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse::new(self.message))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(nf) = err.downcast_ref::<NotFoundError>() {
            return Self::not_found(&nf.resource);
        }
        if let Some(rule) = err.downcast_ref::<RuleViolation>() {
            return Self::bad_request(rule.0.clone());
        }
        if let Some(sqlx::Error::Database(db_err)) = err.downcast_ref::<sqlx::Error>() {
            if db_err.is_unique_violation() {
                return Self::conflict("A record with these details already exists");
            }
        }
        tracing::error!("Request failed: {:#}", err);
        Self::internal("internal server error")
    }
}

/// Message response for simple status messages
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(msg: impl Into<String>) -> Json<Self> {
        Json(Self { message: msg.into() })
    }
}

/// Response helper: return 201 Created with JSON body
pub fn created<T: Serialize>(item: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(item))
}

/// Healthcheck endpoint: returns 200 OK with status
pub async fn healthcheck() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "hostel-hub",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Treat an empty or "all" filter value as absent
pub(crate) fn filter_value(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_query_resolve() {
        let q = PageQuery { page: Some(3), limit: Some(10) };
        assert_eq!(q.resolve(10), (3, 10, 20));
        let q = PageQuery { page: Some(0), limit: Some(5000) };
        assert_eq!(q.resolve(10), (1, 100, 0));
        assert_eq!(PageQuery::default().resolve(20), (1, 20, 0));
    }

    #[test]
    fn test_error_mapping() {
        let nf: ApiError = anyhow::Error::from(NotFoundError::new("Room", "9")).into();
        assert_eq!(nf.status(), StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "Room not found");

        let rule: ApiError = anyhow::Error::from(RuleViolation::new("Room is fully occupied")).into();
        assert_eq!(rule.status(), StatusCode::BAD_REQUEST);
        assert_eq!(rule.message, "Room is fully occupied");

        let other: ApiError = anyhow::anyhow!("disk on fire").into();
        assert_eq!(other.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(other.message, "internal server error");
    }

    #[test]
    fn test_filter_value() {
        assert_eq!(filter_value(Some("all")), None);
        assert_eq!(filter_value(Some(" ")), None);
        assert_eq!(filter_value(Some("occupied")), Some("occupied"));
    }
}
