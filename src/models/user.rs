use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

text_enum! {
    /// Account role; gates decide which API surfaces a user can reach.
    pub enum Role {
        SuperAdmin => "superadmin",
        Admin => "admin",
        Staff => "staff",
        Tenant => "tenant",
    }
    default = Tenant;
}

impl Role {
    /// Admin gate: hostel admins and the platform super-admin
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }

    /// Staff gate: anyone who works a hostel
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Staff | Role::Admin | Role::SuperAdmin)
    }
}

text_enum! {
    /// Verification state of an owner/admin account
    pub enum UserVerificationStatus {
        Unverified => "unverified",
        Pending => "pending",
        Verified => "verified",
        Rejected => "rejected",
    }
    default = Unverified;
}

/// Email notification toggles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailNotifications {
    pub new_tenants: bool,
    pub payment_reminders: bool,
    pub maintenance_requests: bool,
    pub system_updates: bool,
}

impl Default for EmailNotifications {
    fn default() -> Self {
        Self {
            new_tenants: true,
            payment_reminders: true,
            maintenance_requests: true,
            system_updates: false,
        }
    }
}

/// In-app notification toggles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppNotifications {
    pub push_notifications: bool,
    pub sound_alerts: bool,
    pub desktop_notifications: bool,
}

impl Default for AppNotifications {
    fn default() -> Self {
        Self {
            push_notifications: true,
            sound_alerts: true,
            desktop_notifications: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    #[serde(default)]
    pub email_notifications: EmailNotifications,
    #[serde(default)]
    pub app_notifications: AppNotifications,
}

/// Per-user preferences, stored as a JSON document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    #[serde(default)]
    pub notifications: NotificationSettings,
}

/// User is an account of any role
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub email_verified: bool,
    pub phone_verified: bool,
    pub property_id: Option<i64>,
    pub tenant_id: Option<i64>,
    pub verification_status: UserVerificationStatus,
    pub verified_at: Option<DateTime<Utc>>,
    pub organizational_code: Option<String>,
    pub profile_image: Option<String>,
    pub settings: UserSettings,
    #[serde(skip_serializing)]
    pub reset_token_hash: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting a new account; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub role: Role,
    pub property_id: Option<i64>,
    pub verification_status: UserVerificationStatus,
    pub organizational_code: Option<String>,
}

/// Partial account update; `None` leaves a column untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub property_id: Option<i64>,
}

/// Request to create a hostel admin account
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdminRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    #[serde(default)]
    pub property_id: Option<i64>,
}

/// Role change; the value is checked by hand so an unknown role is a 400
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

/// Minimal hostel view embedded in admin listings
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRef {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub verification_status: super::PropertyVerificationStatus,
    pub organizational_code: String,
}

/// Admin account with the hostel it manages
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub verification_status: UserVerificationStatus,
    pub organizational_code: Option<String>,
    pub property: Option<PropertyRef>,
    pub created_at: DateTime<Utc>,
}
