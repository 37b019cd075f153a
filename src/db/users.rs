use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Pool, Row, Sqlite};

use super::row_helpers::map_user_row;
use super::{NotFoundError, RuleViolation};
use crate::models::*;

/// User database operations
pub struct UserRepo;

impl UserRepo {
    pub async fn get(pool: &Pool<Sqlite>, id: i64) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.as_ref().map(map_user_row))
    }

    pub async fn get_by_email(pool: &Pool<Sqlite>, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email.trim().to_lowercase())
            .fetch_optional(pool)
            .await?;
        Ok(row.as_ref().map(map_user_row))
    }

    /// Organizational codes held by admin accounts
    pub async fn get_by_org_code(pool: &Pool<Sqlite>, code: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT * FROM users WHERE organizational_code = ? AND role IN ('admin', 'superadmin')",
        )
        .bind(code)
        .fetch_optional(pool)
        .await?;
        Ok(row.as_ref().map(map_user_row))
    }

    pub async fn get_by_reset_hash(pool: &Pool<Sqlite>, hash: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE reset_token_hash = ?")
            .bind(hash)
            .fetch_optional(pool)
            .await?;
        Ok(row.as_ref().map(map_user_row))
    }

    pub async fn create(pool: &Pool<Sqlite>, new: &NewUser) -> Result<User> {
        let now = Utc::now();
        let verified_at = (new.verification_status == UserVerificationStatus::Verified).then_some(now);
        let result = sqlx::query(
            r#"
            INSERT INTO users (name, email, phone, password_hash, role, property_id,
                               verification_status, verified_at, organizational_code,
                               created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.name.trim())
        .bind(new.email.trim().to_lowercase())
        .bind(new.phone.trim())
        .bind(&new.password_hash)
        .bind(new.role.as_str())
        .bind(new.property_id)
        .bind(new.verification_status.as_str())
        .bind(verified_at)
        .bind(&new.organizational_code)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        let new_id = result.last_insert_rowid();
        Self::get(pool, new_id)
            .await?
            .context("User not found after creation")
    }

    pub async fn update(pool: &Pool<Sqlite>, id: i64, req: &UpdateUserRequest) -> Result<User> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                name = COALESCE(?, name),
                email = COALESCE(?, email),
                phone = COALESCE(?, phone),
                property_id = COALESCE(?, property_id),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(req.name.as_deref().map(str::trim))
        .bind(req.email.as_deref().map(|e| e.trim().to_lowercase()))
        .bind(req.phone.as_deref().map(str::trim))
        .bind(req.property_id)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

        Self::fetch_updated(pool, id, result.rows_affected()).await
    }

    pub async fn update_settings(pool: &Pool<Sqlite>, id: i64, settings: &UserSettings) -> Result<User> {
        let data = serde_json::to_string(settings)?;
        let result = sqlx::query("UPDATE users SET settings = ?, updated_at = ? WHERE id = ?")
            .bind(&data)
            .bind(Utc::now())
            .bind(id)
            .execute(pool)
            .await?;
        Self::fetch_updated(pool, id, result.rows_affected()).await
    }

    pub async fn update_profile_image(pool: &Pool<Sqlite>, id: i64, url: &str) -> Result<User> {
        let result = sqlx::query("UPDATE users SET profile_image = ?, updated_at = ? WHERE id = ?")
            .bind(url)
            .bind(Utc::now())
            .bind(id)
            .execute(pool)
            .await?;
        Self::fetch_updated(pool, id, result.rows_affected()).await
    }

    /// Replace the password hash and invalidate any outstanding reset token
    pub async fn update_password(pool: &Pool<Sqlite>, id: i64, password_hash: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE users SET password_hash = ?, reset_token_hash = NULL,
                             reset_token_expires_at = NULL, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(NotFoundError::new("User", &id.to_string()).into());
        }
        Ok(())
    }

    pub async fn set_reset_token(
        pool: &Pool<Sqlite>,
        id: i64,
        hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE users SET reset_token_hash = ?, reset_token_expires_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(hash)
        .bind(expires_at)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn update_role(pool: &Pool<Sqlite>, id: i64, role: Role) -> Result<User> {
        let result = sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(Utc::now())
            .bind(id)
            .execute(pool)
            .await?;
        Self::fetch_updated(pool, id, result.rows_affected()).await
    }

    /// Point a tenant account at a tenant profile. A profile belongs to at
    /// most one account.
    pub async fn link_tenant(pool: &Pool<Sqlite>, user_id: i64, tenant_id: i64) -> Result<User> {
        let mut tx = pool.begin().await?;

        let role: String = sqlx::query_scalar("SELECT role FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| NotFoundError::new("User", &user_id.to_string()))?;
        if role != Role::Tenant.as_str() {
            return Err(RuleViolation::new("Only tenant accounts can be linked to a tenant profile").into());
        }

        let holder: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE tenant_id = ? AND id != ?")
            .bind(tenant_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if holder.is_some() {
            return Err(RuleViolation::new("Tenant profile is already linked to another account").into());
        }

        sqlx::query("UPDATE users SET tenant_id = ?, updated_at = ? WHERE id = ?")
            .bind(tenant_id)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Self::get(pool, user_id)
            .await?
            .context("User not found after update")
    }

    pub async fn delete(pool: &Pool<Sqlite>, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(NotFoundError::new("User", &id.to_string()).into());
        }
        Ok(())
    }

    /// Admin accounts with their hostel, newest first
    pub async fn list_admins(pool: &Pool<Sqlite>) -> Result<Vec<AdminSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT u.id, u.name, u.email, u.phone, u.role, u.verification_status,
                   u.organizational_code, u.created_at,
                   p.id AS p_id, p.name AS p_name, p.address AS p_address,
                   p.verification_status AS p_verification_status,
                   p.organizational_code AS p_organizational_code
            FROM users u
            LEFT JOIN properties p ON p.id = u.property_id
            WHERE u.role = 'admin'
            ORDER BY u.created_at DESC, u.id DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| {
                let property_id: Option<i64> = r.get("p_id");
                AdminSummary {
                    id: r.get("id"),
                    name: r.get("name"),
                    email: r.get("email"),
                    phone: r.get("phone"),
                    role: r.get::<String, _>("role").parse().unwrap_or_default(),
                    verification_status: r
                        .get::<String, _>("verification_status")
                        .parse()
                        .unwrap_or_default(),
                    organizational_code: r.get("organizational_code"),
                    property: property_id.map(|id| PropertyRef {
                        id,
                        name: r.get("p_name"),
                        address: r.get("p_address"),
                        verification_status: r
                            .get::<String, _>("p_verification_status")
                            .parse()
                            .unwrap_or_default(),
                        organizational_code: r.get("p_organizational_code"),
                    }),
                    created_at: r.get("created_at"),
                }
            })
            .collect())
    }

    /// Admin and staff accounts attached to a hostel
    pub async fn list_property_staff(pool: &Pool<Sqlite>, property_id: i64) -> Result<Vec<StaffSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM users
            WHERE property_id = ? AND role IN ('admin', 'staff')
            ORDER BY created_at
            "#,
        )
        .bind(property_id)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .iter()
            .map(map_user_row)
            .map(|u| StaffSummary {
                id: u.id,
                name: u.name,
                email: u.email,
                phone: u.phone,
                role: u.role,
                verification_status: u.verification_status,
                created_at: u.created_at,
            })
            .collect())
    }

    async fn fetch_updated(pool: &Pool<Sqlite>, id: i64, rows_affected: u64) -> Result<User> {
        if rows_affected == 0 {
            return Err(NotFoundError::new("User", &id.to_string()).into());
        }
        Self::get(pool, id)
            .await?
            .context("User not found after update")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;
    use tokio_test::assert_err;

    fn new_user(email: &str, role: Role) -> NewUser {
        NewUser {
            name: "Asha Rao".to_string(),
            email: email.to_string(),
            phone: "9876543210".to_string(),
            password_hash: "hash".to_string(),
            role,
            property_id: None,
            verification_status: UserVerificationStatus::Unverified,
            organizational_code: None,
        }
    }

    #[tokio::test]
    async fn test_email_is_normalised_and_unique() {
        let store = Store::in_memory().await.unwrap();
        let user = store.create_user(&new_user("  Asha@Example.COM ", Role::Tenant)).await.unwrap();
        assert_eq!(user.email, "asha@example.com");
        assert!(store.get_user_by_email("ASHA@example.com").await.unwrap().is_some());

        let dup = store.create_user(&new_user("asha@example.com", Role::Tenant)).await;
        assert!(dup.is_err());
    }

    #[tokio::test]
    async fn test_partial_update_keeps_untouched_columns() {
        let store = Store::in_memory().await.unwrap();
        let user = store.create_user(&new_user("ravi@example.com", Role::Admin)).await.unwrap();
        let updated = store
            .update_user(user.id, &UpdateUserRequest { phone: Some("9000000001".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(updated.phone, "9000000001");
        assert_eq!(updated.name, "Asha Rao");
        assert_eq!(updated.email, "ravi@example.com");
    }

    #[tokio::test]
    async fn test_password_update_clears_reset_token() {
        let store = Store::in_memory().await.unwrap();
        let user = store.create_user(&new_user("meena@example.com", Role::Tenant)).await.unwrap();
        store
            .set_user_reset_token(user.id, "abc", Utc::now() + chrono::TimeDelta::minutes(30))
            .await
            .unwrap();
        assert!(store.get_user_by_reset_hash("abc").await.unwrap().is_some());

        store.update_user_password(user.id, "new-hash").await.unwrap();
        assert!(store.get_user_by_reset_hash("abc").await.unwrap().is_none());
        let reloaded = store.get_user(user.id).await.unwrap().unwrap();
        assert_eq!(reloaded.password_hash, "new-hash");
    }

    #[tokio::test]
    async fn test_settings_round_trip() {
        let store = Store::in_memory().await.unwrap();
        let user = store.create_user(&new_user("kiran@example.com", Role::Staff)).await.unwrap();
        assert_eq!(user.settings, UserSettings::default());

        let mut settings = UserSettings::default();
        settings.notifications.email_notifications.system_updates = true;
        let updated = store.update_user_settings(user.id, &settings).await.unwrap();
        assert!(updated.settings.notifications.email_notifications.system_updates);
    }

    #[tokio::test]
    async fn test_tenant_profile_links_to_one_tenant_account() {
        let store = Store::in_memory().await.unwrap();
        let first = store.create_user(&new_user("first@example.com", Role::Tenant)).await.unwrap();
        let second = store.create_user(&new_user("second@example.com", Role::Tenant)).await.unwrap();
        let staff = store.create_user(&new_user("staff@example.com", Role::Staff)).await.unwrap();
        let profile = store
            .create_tenant(&NewTenant {
                property_id: None,
                first_name: "Asha".to_string(),
                last_name: None,
                email: "asha@example.com".to_string(),
                phone: None,
                room_id: None,
                details: TenantDetails::default(),
                terms_accepted: true,
                organizational_code: None,
                admission: Admission::SelfService,
            })
            .await
            .unwrap();

        let linked = store.link_user_tenant(first.id, profile.id).await.unwrap();
        assert_eq!(linked.tenant_id, Some(profile.id));
        // relinking the same pair is a no-op
        assert!(store.link_user_tenant(first.id, profile.id).await.is_ok());

        let err = assert_err!(store.link_user_tenant(second.id, profile.id).await);
        assert_eq!(err.to_string(), "Tenant profile is already linked to another account");

        let err = assert_err!(store.link_user_tenant(staff.id, profile.id).await);
        assert!(err.downcast_ref::<RuleViolation>().is_some());
        assert!(store.get_user(staff.id).await.unwrap().unwrap().tenant_id.is_none());

        let err = assert_err!(store.link_user_tenant(404, profile.id).await);
        assert!(err.downcast_ref::<NotFoundError>().is_some());
    }
}
