mod payments;
mod properties;
mod rooms;
pub(crate) mod row_helpers;
mod seeds;
mod tenants;
mod tickets;
mod users;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePoolOptions, Pool, QueryBuilder, Sqlite};

use crate::models::*;

pub use seeds::SeedConfig;

/// A looked-up record does not exist; the API layer turns it into a 404.
#[derive(Debug)]
pub struct NotFoundError {
    pub resource: String,
    pub id: String,
}

impl NotFoundError {
    pub fn new(resource: &str, id: &str) -> Self {
        Self {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }
}

impl std::fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} not found: {}", self.resource, self.id)
    }
}

impl std::error::Error for NotFoundError {}

/// A business rule refused the operation (already approved, room full, ...).
/// The message is safe to show to the client.
#[derive(Debug)]
pub struct RuleViolation(pub String);

impl RuleViolation {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl std::fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for RuleViolation {}

/// Which hostel's records a caller may see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyScope {
    /// Platform super-admin
    All,
    /// Members of one hostel
    Property(i64),
    /// Accounts not attached to any hostel see only unattached records
    Unassigned,
}

impl PropertyScope {
    pub fn for_user(user: &User) -> Self {
        match (user.role, user.property_id) {
            (Role::SuperAdmin, _) => PropertyScope::All,
            (_, Some(id)) => PropertyScope::Property(id),
            (_, None) => PropertyScope::Unassigned,
        }
    }

    pub fn allows(&self, property_id: Option<i64>) -> bool {
        match self {
            PropertyScope::All => true,
            PropertyScope::Property(id) => property_id == Some(*id),
            PropertyScope::Unassigned => property_id.is_none(),
        }
    }

    /// Property a record created by this caller belongs to
    pub fn owning_property(&self) -> Option<i64> {
        match self {
            PropertyScope::Property(id) => Some(*id),
            _ => None,
        }
    }

    /// Append an `AND <column> ...` clause restricting rows to this scope
    pub(crate) fn push_filter(&self, qb: &mut QueryBuilder<'_, Sqlite>, column: &str) {
        match self {
            PropertyScope::All => {}
            PropertyScope::Property(id) => {
                qb.push(format!(" AND {} = ", column)).push_bind(*id);
            }
            PropertyScope::Unassigned => {
                qb.push(format!(" AND {} IS NULL", column));
            }
        }
    }
}

/// Store handles all database operations, delegating to per-entity repo modules.
#[derive(Clone)]
pub struct Store {
    pool: Pool<Sqlite>,
}

impl Store {
    /// Create a new database store with a specific pool size
    pub async fn with_pool_size(db_path: &str, max_connections: u32) -> Result<Self> {
        let db_url = format!("sqlite:{}?mode=rwc", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&db_url)
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Private in-memory database, one connection so every query sees it
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        Self::with_pool_size(":memory:", 1).await
    }

    /// Run database migrations
    async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Ensure the super-admin account and a default hostel exist
    pub async fn seed_defaults(&self, cfg: &SeedConfig) -> Result<()> {
        seeds::seed_defaults(&self.pool, cfg).await
    }

    // ========== User Operations ==========

    pub async fn get_user(&self, id: i64) -> Result<Option<User>> {
        users::UserRepo::get(&self.pool, id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        users::UserRepo::get_by_email(&self.pool, email).await
    }

    pub async fn get_user_by_org_code(&self, code: &str) -> Result<Option<User>> {
        users::UserRepo::get_by_org_code(&self.pool, code).await
    }

    pub async fn get_user_by_reset_hash(&self, hash: &str) -> Result<Option<User>> {
        users::UserRepo::get_by_reset_hash(&self.pool, hash).await
    }

    pub async fn create_user(&self, new: &NewUser) -> Result<User> {
        users::UserRepo::create(&self.pool, new).await
    }

    pub async fn update_user(&self, id: i64, req: &UpdateUserRequest) -> Result<User> {
        users::UserRepo::update(&self.pool, id, req).await
    }

    pub async fn update_user_settings(&self, id: i64, settings: &UserSettings) -> Result<User> {
        users::UserRepo::update_settings(&self.pool, id, settings).await
    }

    pub async fn update_user_profile_image(&self, id: i64, url: &str) -> Result<User> {
        users::UserRepo::update_profile_image(&self.pool, id, url).await
    }

    pub async fn update_user_password(&self, id: i64, password_hash: &str) -> Result<()> {
        users::UserRepo::update_password(&self.pool, id, password_hash).await
    }

    pub async fn set_user_reset_token(&self, id: i64, hash: &str, expires_at: DateTime<Utc>) -> Result<()> {
        users::UserRepo::set_reset_token(&self.pool, id, hash, expires_at).await
    }

    pub async fn update_user_role(&self, id: i64, role: Role) -> Result<User> {
        users::UserRepo::update_role(&self.pool, id, role).await
    }

    pub async fn link_user_tenant(&self, user_id: i64, tenant_id: i64) -> Result<User> {
        users::UserRepo::link_tenant(&self.pool, user_id, tenant_id).await
    }

    pub async fn delete_user(&self, id: i64) -> Result<()> {
        users::UserRepo::delete(&self.pool, id).await
    }

    pub async fn list_admins(&self) -> Result<Vec<AdminSummary>> {
        users::UserRepo::list_admins(&self.pool).await
    }

    pub async fn list_property_staff(&self, property_id: i64) -> Result<Vec<StaffSummary>> {
        users::UserRepo::list_property_staff(&self.pool, property_id).await
    }

    // ========== Property Operations ==========

    pub async fn list_properties(
        &self,
        search: Option<&str>,
        status: Option<PropertyVerificationStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<HostelSummary>, i64)> {
        properties::PropertyRepo::list(&self.pool, search, status, limit, offset).await
    }

    pub async fn list_unassigned_properties(&self) -> Result<Vec<Property>> {
        properties::PropertyRepo::list_unassigned(&self.pool).await
    }

    pub async fn get_property(&self, id: i64) -> Result<Option<Property>> {
        properties::PropertyRepo::get(&self.pool, id).await
    }

    pub async fn get_property_summary(&self, id: i64) -> Result<Option<HostelSummary>> {
        properties::PropertyRepo::get_summary(&self.pool, id).await
    }

    pub async fn get_property_by_org_code(&self, code: &str) -> Result<Option<Property>> {
        properties::PropertyRepo::get_by_org_code(&self.pool, code).await
    }

    pub async fn create_property(&self, req: &CreatePropertyRequest) -> Result<Property> {
        properties::PropertyRepo::create(&self.pool, req).await
    }

    pub async fn update_property(&self, id: i64, req: &UpdatePropertyRequest) -> Result<Property> {
        properties::PropertyRepo::update(&self.pool, id, req).await
    }

    pub async fn set_property_document(&self, id: i64, kind: DocumentKind, url: &str) -> Result<Property> {
        properties::PropertyRepo::set_document(&self.pool, id, kind, url).await
    }

    pub async fn verify_property(&self, id: i64, verifier: i64) -> Result<Property> {
        properties::PropertyRepo::verify(&self.pool, id, verifier).await
    }

    pub async fn reject_property(&self, id: i64, reason: &str) -> Result<Property> {
        properties::PropertyRepo::reject(&self.pool, id, reason).await
    }

    pub async fn delete_property(&self, id: i64) -> Result<()> {
        properties::PropertyRepo::delete(&self.pool, id).await
    }

    pub async fn assign_admin_to_property(&self, user_id: i64, property_id: i64) -> Result<()> {
        properties::PropertyRepo::assign_admin(&self.pool, user_id, property_id).await
    }

    pub async fn platform_stats(&self) -> Result<PlatformStats> {
        properties::PropertyRepo::platform_stats(&self.pool).await
    }

    // ========== Room Operations ==========

    pub async fn list_rooms(
        &self,
        scope: PropertyScope,
        filter: &RoomFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Room>, i64)> {
        rooms::RoomRepo::list(&self.pool, scope, filter, limit, offset).await
    }

    pub async fn list_property_rooms(&self, property_id: i64) -> Result<Vec<Room>> {
        rooms::RoomRepo::list_by_property(&self.pool, property_id).await
    }

    pub async fn get_room(&self, id: i64) -> Result<Option<Room>> {
        rooms::RoomRepo::get(&self.pool, id).await
    }

    pub async fn create_room(&self, property_id: Option<i64>, req: &CreateRoomRequest) -> Result<Room> {
        rooms::RoomRepo::create(&self.pool, property_id, req).await
    }

    pub async fn update_room(&self, id: i64, req: &UpdateRoomRequest) -> Result<Room> {
        rooms::RoomRepo::update(&self.pool, id, req).await
    }

    pub async fn delete_room(&self, id: i64) -> Result<()> {
        rooms::RoomRepo::delete(&self.pool, id).await
    }

    pub async fn room_stats(&self, scope: PropertyScope) -> Result<RoomStats> {
        rooms::RoomRepo::stats(&self.pool, scope).await
    }

    // ========== Tenant Operations ==========

    pub async fn list_tenants(
        &self,
        scope: PropertyScope,
        filter: &TenantFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Tenant>, i64)> {
        tenants::TenantRepo::list(&self.pool, scope, filter, limit, offset).await
    }

    pub async fn list_property_tenants(&self, property_id: i64) -> Result<Vec<Tenant>> {
        tenants::TenantRepo::list_by_property(&self.pool, property_id).await
    }

    pub async fn list_tenants_by_ids(&self, ids: &[i64]) -> Result<Vec<Tenant>> {
        tenants::TenantRepo::list_by_ids(&self.pool, ids).await
    }

    pub async fn get_tenant(&self, id: i64) -> Result<Option<Tenant>> {
        tenants::TenantRepo::get(&self.pool, id).await
    }

    pub async fn create_tenant(&self, new: &NewTenant) -> Result<Tenant> {
        tenants::TenantRepo::create(&self.pool, new).await
    }

    pub async fn onboard_tenant(&self, user_id: i64, new: &NewTenant) -> Result<Tenant> {
        tenants::TenantRepo::onboard(&self.pool, user_id, new).await
    }

    pub async fn update_tenant(&self, id: i64, req: &UpdateTenantRequest) -> Result<Tenant> {
        tenants::TenantRepo::update(&self.pool, id, req).await
    }

    pub async fn approve_tenant(&self, id: i64, approver: i64) -> Result<Tenant> {
        tenants::TenantRepo::approve(&self.pool, id, approver).await
    }

    pub async fn reject_tenant(&self, id: i64, reason: &str) -> Result<Tenant> {
        tenants::TenantRepo::reject(&self.pool, id, reason).await
    }

    pub async fn vacate_tenant(&self, id: i64) -> Result<Tenant> {
        tenants::TenantRepo::vacate(&self.pool, id).await
    }

    pub async fn delete_tenant(&self, id: i64) -> Result<()> {
        tenants::TenantRepo::delete(&self.pool, id).await
    }

    pub async fn tenant_stats(&self, scope: PropertyScope) -> Result<TenantStats> {
        tenants::TenantRepo::stats(&self.pool, scope).await
    }

    // ========== Payment Operations ==========

    pub async fn list_payments(&self, scope: PropertyScope, tenant_id: Option<i64>) -> Result<Vec<Payment>> {
        payments::PaymentRepo::list(&self.pool, scope, tenant_id).await
    }

    pub async fn recent_payments(&self, tenant_id: i64, limit: i64) -> Result<Vec<Payment>> {
        payments::PaymentRepo::recent_for_tenant(&self.pool, tenant_id, limit).await
    }

    pub async fn last_rent_payment(&self, tenant_id: i64) -> Result<Option<Payment>> {
        payments::PaymentRepo::last_rent(&self.pool, tenant_id).await
    }

    pub async fn create_payment(&self, property_id: Option<i64>, req: &CreatePaymentRequest) -> Result<Payment> {
        payments::PaymentRepo::create(&self.pool, property_id, req).await
    }

    // ========== Ticket Operations ==========

    pub async fn list_tickets(&self, scope: PropertyScope, status: Option<TicketStatus>) -> Result<Vec<Ticket>> {
        tickets::TicketRepo::list(&self.pool, scope, status).await
    }

    pub async fn list_tenant_tickets(&self, tenant_id: i64, active_only: bool) -> Result<Vec<Ticket>> {
        tickets::TicketRepo::list_for_tenant(&self.pool, tenant_id, active_only).await
    }

    pub async fn get_ticket(&self, id: i64) -> Result<Option<Ticket>> {
        tickets::TicketRepo::get(&self.pool, id).await
    }

    pub async fn create_ticket(&self, tenant: &Tenant, req: &CreateTicketRequest) -> Result<Ticket> {
        tickets::TicketRepo::create(&self.pool, tenant, req).await
    }

    pub async fn update_ticket_status(&self, id: i64, status: TicketStatus) -> Result<Ticket> {
        tickets::TicketRepo::update_status(&self.pool, id, status).await
    }
}

/// Generate a shareable hostel registration code, e.g. `ORG-3FA94C1B`
pub fn generate_org_code() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 4];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("ORG-{}", hex::encode_upper(bytes))
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Admin account for tests whose records point back at an approving user
    pub async fn approver(store: &Store) -> User {
        store
            .create_user(&NewUser {
                name: "Warden".to_string(),
                email: "approver@example.com".to_string(),
                phone: "9800000001".to_string(),
                password_hash: "hash".to_string(),
                role: Role::Admin,
                property_id: None,
                verification_status: UserVerificationStatus::Verified,
                organizational_code: None,
            })
            .await
            .unwrap()
    }
}
