use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Payment, Room, Ticket};

text_enum! {
    /// Onboarding review state; only approved tenants can hold a seat
    pub enum ApprovalStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
    default = Pending;
}

text_enum! {
    pub enum Gender {
        Male => "male",
        Female => "female",
        Other => "other",
    }
    default = Other;
}

/// Personal, identity and stay details collected by both admission paths.
/// Every field is optional; on update `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantDetails {
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub aadhar_number: Option<String>,
    #[serde(default)]
    pub identity_proof: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub native_place: Option<String>,
    #[serde(default)]
    pub room_category: Option<String>,
    #[serde(default)]
    pub move_in_date: Option<NaiveDate>,
    #[serde(default)]
    pub expected_duration: Option<String>,
    #[serde(default)]
    pub emergency_contact_name: Option<String>,
    #[serde(default)]
    pub emergency_contact_relationship: Option<String>,
    #[serde(default)]
    pub emergency_contact_phone: Option<String>,
    #[serde(default)]
    pub security_deposit: Option<f64>,
    #[serde(default)]
    pub blood_group: Option<String>,
    #[serde(default)]
    pub medical_condition: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub digital_signature: Option<String>,
}

/// Tenant is a resident profile, optionally assigned to a room
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: i64,
    pub property_id: Option<i64>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    #[serde(flatten)]
    pub details: TenantDetails,
    pub room_id: Option<i64>,
    pub room: Option<Room>,
    pub terms_accepted: bool,
    pub terms_accepted_at: Option<DateTime<Utc>>,
    pub organizational_code: Option<String>,
    pub approval_status: ApprovalStatus,
    pub approved_by: Option<i64>,
    pub approval_date: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// A tenant counts toward its room's occupancy only while approved,
    /// active and assigned.
    pub fn holds_seat(&self) -> bool {
        self.approval_status == ApprovalStatus::Approved && self.active && self.room_id.is_some()
    }

    pub fn full_name(&self) -> String {
        match self.last_name.as_deref().filter(|s| !s.is_empty()) {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }
}

/// How a tenant record enters the system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Added by an admin: approved, active and seated immediately
    Direct { approved_by: i64 },
    /// Submitted through onboarding: pending until an admin decides
    SelfService,
}

/// Fields for inserting a tenant
#[derive(Debug, Clone)]
pub struct NewTenant {
    pub property_id: Option<i64>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub room_id: Option<i64>,
    pub details: TenantDetails,
    pub terms_accepted: bool,
    pub organizational_code: Option<String>,
    pub admission: Admission,
}

/// Admin request to add a tenant directly
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenantRequest {
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub room: Option<i64>,
    #[serde(flatten)]
    pub details: TenantDetails,
}

/// Self-service onboarding submitted by a tenant account
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardTenantRequest {
    #[serde(default)]
    pub room: Option<i64>,
    #[serde(default)]
    pub terms_accepted: bool,
    #[serde(flatten)]
    pub details: TenantDetails,
}

/// Partial tenant update; a new `room` moves the tenant's seat.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTenantRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub room: Option<i64>,
    #[serde(flatten)]
    pub details: TenantDetails,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectTenantRequest {
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

/// List filters for tenants
#[derive(Debug, Clone, Default)]
pub struct TenantFilter {
    pub search: Option<String>,
    pub active: Option<bool>,
    pub approval_status: Option<ApprovalStatus>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantList {
    pub tenants: Vec<Tenant>,
    #[serde(flatten)]
    pub page: super::PageMeta,
}

/// Tenant plus a human-readable outcome, returned by workflow actions
#[derive(Debug, Clone, Serialize)]
pub struct TenantActionResponse {
    pub message: String,
    pub tenant: Tenant,
}

/// Onboarding result: the pending profile with a status message
#[derive(Debug, Clone, Serialize)]
pub struct OnboardResponse {
    #[serde(flatten)]
    pub tenant: Tenant,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomCount {
    pub room_id: i64,
    pub count: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantStats {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    pub pending: i64,
    pub by_room: Vec<RoomCount>,
}

/// Home screen of a tenant
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantDashboard {
    pub user_name: String,
    pub current_rent: f64,
    pub due_date: NaiveDate,
    pub active_issues: usize,
    pub room_number: Option<String>,
    pub recent_invoices: Vec<Payment>,
    pub active_tickets: Vec<Ticket>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendSmsRequest {
    #[serde(default)]
    pub tenant_ids: Vec<i64>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsResult {
    pub tenant_id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendSmsResponse {
    pub message: String,
    pub results: Vec<SmsResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManualSmsRequest {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManualSmsResponse {
    pub message: String,
    pub sid: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_onboard_request_flattens_details() {
        let req: OnboardTenantRequest = serde_json::from_str(
            r#"{"room":3,"moveInDate":"2025-07-01","termsAccepted":true,"gender":"female","securityDeposit":2500}"#,
        )
        .unwrap();
        assert_eq!(req.room, Some(3));
        assert!(req.terms_accepted);
        assert_eq!(req.details.gender, Some(Gender::Female));
        assert_eq!(req.details.security_deposit, Some(2500.0));
        assert_eq!(req.details.move_in_date, NaiveDate::from_ymd_opt(2025, 7, 1));
    }
}
