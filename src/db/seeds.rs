use anyhow::Result;
use chrono::Utc;
use sqlx::{Pool, Sqlite};

use super::generate_org_code;
use super::users::UserRepo;
use crate::models::*;

/// Accounts and records every fresh installation starts with
#[derive(Debug, Clone)]
pub struct SeedConfig {
    pub superadmin_email: String,
    pub superadmin_password: String,
    pub superadmin_phone: String,
    pub default_hostel_name: String,
    pub default_hostel_address: String,
    pub bcrypt_cost: u32,
}

/// Create the super-admin and the default hostel when missing. Safe to
/// run on every start.
pub(super) async fn seed_defaults(pool: &Pool<Sqlite>, cfg: &SeedConfig) -> Result<()> {
    let superadmin_id = seed_superadmin(pool, cfg).await?;
    seed_default_hostel(pool, cfg, superadmin_id).await?;
    Ok(())
}

async fn seed_superadmin(pool: &Pool<Sqlite>, cfg: &SeedConfig) -> Result<i64> {
    let existing: Option<i64> =
        sqlx::query_scalar("SELECT id FROM users WHERE role = 'superadmin' ORDER BY id LIMIT 1")
            .fetch_optional(pool)
            .await?;
    if let Some(id) = existing {
        return Ok(id);
    }

    let password_hash = bcrypt::hash(&cfg.superadmin_password, cfg.bcrypt_cost)
        .map_err(|e| anyhow::anyhow!("Failed to hash super-admin password: {}", e))?;

    let user = UserRepo::create(
        pool,
        &NewUser {
            name: "Super Admin".to_string(),
            email: cfg.superadmin_email.clone(),
            phone: cfg.superadmin_phone.clone(),
            password_hash,
            role: Role::SuperAdmin,
            property_id: None,
            verification_status: UserVerificationStatus::Verified,
            organizational_code: None,
        },
    )
    .await?;

    tracing::info!("Created super-admin account ({})", user.email);
    Ok(user.id)
}

async fn seed_default_hostel(pool: &Pool<Sqlite>, cfg: &SeedConfig, verifier: i64) -> Result<()> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM properties")
        .fetch_one(pool)
        .await?;
    if count.0 > 0 {
        return Ok(());
    }

    let now = Utc::now();
    let code = generate_org_code();
    sqlx::query(
        r#"
        INSERT INTO properties (name, address, verification_status, verified_at, verified_by,
                                organizational_code, created_at, updated_at)
        VALUES (?, ?, 'verified', ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&cfg.default_hostel_name)
    .bind(&cfg.default_hostel_address)
    .bind(now)
    .bind(verifier)
    .bind(&code)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    tracing::info!("Created default hostel '{}' ({})", cfg.default_hostel_name, code);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;

    fn config() -> SeedConfig {
        SeedConfig {
            superadmin_email: "Root@HostelHub.local".to_string(),
            superadmin_password: "SuperAdmin@123".to_string(),
            superadmin_phone: "9999999999".to_string(),
            default_hostel_name: "Main Hostel".to_string(),
            default_hostel_address: "Chennai, Tamil Nadu, India".to_string(),
            bcrypt_cost: 4,
        }
    }

    #[tokio::test]
    async fn test_seeding_is_idempotent() {
        let store = Store::in_memory().await.unwrap();
        store.seed_defaults(&config()).await.unwrap();
        store.seed_defaults(&config()).await.unwrap();

        let root = store.get_user_by_email("root@hostelhub.local").await.unwrap().unwrap();
        assert_eq!(root.role, Role::SuperAdmin);
        assert_eq!(root.verification_status, UserVerificationStatus::Verified);
        assert!(bcrypt::verify("SuperAdmin@123", &root.password_hash).unwrap());

        let (hostels, total) = store.list_properties(None, None, 20, 0).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(hostels[0].property.name, "Main Hostel");
        assert_eq!(hostels[0].property.verification_status, PropertyVerificationStatus::Verified);
        assert_eq!(hostels[0].property.verified_by, Some(root.id));
    }
}
