use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Pool, QueryBuilder, Row, Sqlite};
use tracing::info;

use super::generate_org_code;
use super::row_helpers::map_property_row;
use super::users::UserRepo;
use super::NotFoundError;
use crate::models::*;

/// Property (hostel) database operations
pub struct PropertyRepo;

impl PropertyRepo {
    /// Newest first; search covers name, address, owner name and code
    pub async fn list(
        pool: &Pool<Sqlite>,
        search: Option<&str>,
        status: Option<PropertyVerificationStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<HostelSummary>, i64)> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM properties WHERE 1 = 1");
        push_property_filters(&mut qb, search, status);
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let rows = qb.build().fetch_all(pool).await?;

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM properties WHERE 1 = 1");
        push_property_filters(&mut count, search, status);
        let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

        let mut hostels = Vec::with_capacity(rows.len());
        for row in &rows {
            hostels.push(Self::summarize(pool, map_property_row(row)).await?);
        }
        Ok((hostels, total))
    }

    /// Hostels nobody owns yet, for the admin assignment picker
    pub async fn list_unassigned(pool: &Pool<Sqlite>) -> Result<Vec<Property>> {
        let rows = sqlx::query("SELECT * FROM properties WHERE owner_id IS NULL ORDER BY name")
            .fetch_all(pool)
            .await?;
        Ok(rows.iter().map(map_property_row).collect())
    }

    pub async fn get(pool: &Pool<Sqlite>, id: i64) -> Result<Option<Property>> {
        let row = sqlx::query("SELECT * FROM properties WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.as_ref().map(map_property_row))
    }

    pub async fn get_summary(pool: &Pool<Sqlite>, id: i64) -> Result<Option<HostelSummary>> {
        match Self::get(pool, id).await? {
            Some(property) => Ok(Some(Self::summarize(pool, property).await?)),
            None => Ok(None),
        }
    }

    pub async fn get_by_org_code(pool: &Pool<Sqlite>, code: &str) -> Result<Option<Property>> {
        let row = sqlx::query("SELECT * FROM properties WHERE organizational_code = ?")
            .bind(code.trim())
            .fetch_optional(pool)
            .await?;
        Ok(row.as_ref().map(map_property_row))
    }

    /// Register a hostel with a fresh organizational code. A given owner
    /// is attached to the new hostel in the same transaction.
    pub async fn create(pool: &Pool<Sqlite>, req: &CreatePropertyRequest) -> Result<Property> {
        let mut tx = pool.begin().await?;
        let now = Utc::now();
        let o = &req.owner_details;

        let result = sqlx::query(
            r#"
            INSERT INTO properties (name, address, owner_id, owner_full_name, owner_pan,
                                    owner_business_phone, owner_business_email,
                                    owner_personal_phone, owner_personal_email,
                                    owner_government_id_type, organizational_code,
                                    created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(req.name.trim())
        .bind(req.address.trim())
        .bind(req.owner_id)
        .bind(&o.owner_full_name)
        .bind(&o.owner_pan)
        .bind(&o.owner_business_phone)
        .bind(&o.owner_business_email)
        .bind(&o.owner_personal_phone)
        .bind(&o.owner_personal_email)
        .bind(o.owner_government_id_type.map(|t| t.as_str()))
        .bind(generate_org_code())
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        let new_id = result.last_insert_rowid();

        if let Some(owner_id) = req.owner_id {
            let linked = sqlx::query("UPDATE users SET property_id = ?, updated_at = ? WHERE id = ?")
                .bind(new_id)
                .bind(now)
                .bind(owner_id)
                .execute(&mut *tx)
                .await?;
            if linked.rows_affected() == 0 {
                return Err(NotFoundError::new("User", &owner_id.to_string()).into());
            }
        }

        tx.commit().await?;
        info!(property_id = new_id, "Hostel created");

        Self::get(pool, new_id)
            .await?
            .context("Hostel not found after creation")
    }

    pub async fn update(pool: &Pool<Sqlite>, id: i64, req: &UpdatePropertyRequest) -> Result<Property> {
        let mut tx = pool.begin().await?;
        let now = Utc::now();
        let o = &req.owner_details;

        let result = sqlx::query(
            r#"
            UPDATE properties SET
                name = COALESCE(?, name),
                address = COALESCE(?, address),
                owner_id = COALESCE(?, owner_id),
                owner_full_name = COALESCE(?, owner_full_name),
                owner_pan = COALESCE(?, owner_pan),
                owner_business_phone = COALESCE(?, owner_business_phone),
                owner_business_email = COALESCE(?, owner_business_email),
                owner_personal_phone = COALESCE(?, owner_personal_phone),
                owner_personal_email = COALESCE(?, owner_personal_email),
                owner_government_id_type = COALESCE(?, owner_government_id_type),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(req.name.as_deref().map(str::trim))
        .bind(req.address.as_deref().map(str::trim))
        .bind(req.owner_id)
        .bind(&o.owner_full_name)
        .bind(&o.owner_pan)
        .bind(&o.owner_business_phone)
        .bind(&o.owner_business_email)
        .bind(&o.owner_personal_phone)
        .bind(&o.owner_personal_email)
        .bind(o.owner_government_id_type.map(|t| t.as_str()))
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(NotFoundError::new("Hostel", &id.to_string()).into());
        }

        if let Some(owner_id) = req.owner_id {
            let linked = sqlx::query("UPDATE users SET property_id = ?, updated_at = ? WHERE id = ?")
                .bind(id)
                .bind(now)
                .bind(owner_id)
                .execute(&mut *tx)
                .await?;
            if linked.rows_affected() == 0 {
                return Err(NotFoundError::new("User", &owner_id.to_string()).into());
            }
        }

        tx.commit().await?;

        Self::get(pool, id)
            .await?
            .context("Hostel not found after update")
    }

    /// Store an uploaded compliance document; a pending hostel moves to review
    pub async fn set_document(pool: &Pool<Sqlite>, id: i64, kind: DocumentKind, url: &str) -> Result<Property> {
        let sql = format!(
            r#"
            UPDATE properties SET
                {} = ?,
                verification_status = CASE
                    WHEN verification_status = 'pending' THEN 'under_review'
                    ELSE verification_status
                END,
                updated_at = ?
            WHERE id = ?
            "#,
            kind.column()
        );
        let result = sqlx::query(&sql)
            .bind(url)
            .bind(Utc::now())
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(NotFoundError::new("Hostel", &id.to_string()).into());
        }
        Self::get(pool, id)
            .await?
            .context("Hostel not found after update")
    }

    /// Mark a hostel verified; its owner account is verified with it
    pub async fn verify(pool: &Pool<Sqlite>, id: i64, verifier: i64) -> Result<Property> {
        let mut tx = pool.begin().await?;
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE properties SET verification_status = 'verified', verified_at = ?,
                                  verified_by = ?, rejection_reason = NULL, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(now)
        .bind(verifier)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(NotFoundError::new("Hostel", &id.to_string()).into());
        }

        sqlx::query(
            r#"
            UPDATE users SET verification_status = 'verified', verified_at = ?, updated_at = ?
            WHERE id = (SELECT owner_id FROM properties WHERE id = ?)
            "#,
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(property_id = id, verifier, "Hostel verified");

        Self::get(pool, id)
            .await?
            .context("Hostel not found after verification")
    }

    /// Mark a hostel rejected; its owner account is rejected with it
    pub async fn reject(pool: &Pool<Sqlite>, id: i64, reason: &str) -> Result<Property> {
        let mut tx = pool.begin().await?;
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE properties SET verification_status = 'rejected', rejection_reason = ?,
                                  updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(reason)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(NotFoundError::new("Hostel", &id.to_string()).into());
        }

        sqlx::query(
            r#"
            UPDATE users SET verification_status = 'rejected', updated_at = ?
            WHERE id = (SELECT owner_id FROM properties WHERE id = ?)
            "#,
        )
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(property_id = id, reason, "Hostel rejected");

        Self::get(pool, id)
            .await?
            .context("Hostel not found after rejection")
    }

    /// Remove a hostel with its rooms, tenants, payments and tickets.
    /// Member accounts survive without a hostel.
    pub async fn delete(pool: &Pool<Sqlite>, id: i64) -> Result<()> {
        let mut tx = pool.begin().await?;

        sqlx::query("UPDATE users SET property_id = NULL, updated_at = ? WHERE property_id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM properties WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(NotFoundError::new("Hostel", &id.to_string()).into());
        }

        tx.commit().await?;
        info!(property_id = id, "Hostel deleted");
        Ok(())
    }

    /// Attach an account to a hostel; it becomes the owner when there is none
    pub async fn assign_admin(pool: &Pool<Sqlite>, user_id: i64, property_id: i64) -> Result<()> {
        let mut tx = pool.begin().await?;
        let now = Utc::now();

        let owned = sqlx::query(
            "UPDATE properties SET owner_id = COALESCE(owner_id, ?), updated_at = ? WHERE id = ?",
        )
        .bind(user_id)
        .bind(now)
        .bind(property_id)
        .execute(&mut *tx)
        .await?;
        if owned.rows_affected() == 0 {
            return Err(NotFoundError::new("Hostel", &property_id.to_string()).into());
        }

        let linked = sqlx::query("UPDATE users SET property_id = ?, updated_at = ? WHERE id = ?")
            .bind(property_id)
            .bind(now)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        if linked.rows_affected() == 0 {
            return Err(NotFoundError::new("User", &user_id.to_string()).into());
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn platform_stats(pool: &Pool<Sqlite>) -> Result<PlatformStats> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM properties) AS total_hostels,
                (SELECT COUNT(*) FROM properties WHERE verification_status = 'verified') AS verified_hostels,
                (SELECT COUNT(*) FROM properties
                    WHERE verification_status IN ('pending', 'under_review')) AS pending_hostels,
                (SELECT COUNT(*) FROM properties WHERE verification_status = 'rejected') AS rejected_hostels,
                (SELECT COUNT(*) FROM users WHERE role = 'admin') AS total_admins,
                (SELECT COUNT(*) FROM tenants) AS total_tenants,
                (SELECT COUNT(*) FROM tenants WHERE active = 1) AS active_tenants,
                (SELECT COUNT(*) FROM rooms) AS total_rooms,
                (SELECT COUNT(*) FROM rooms WHERE status = 'available') AS available_rooms
            "#,
        )
        .fetch_one(pool)
        .await?;

        Ok(PlatformStats {
            total_hostels: row.get("total_hostels"),
            verified_hostels: row.get("verified_hostels"),
            pending_hostels: row.get("pending_hostels"),
            rejected_hostels: row.get("rejected_hostels"),
            total_admins: row.get("total_admins"),
            total_tenants: row.get("total_tenants"),
            active_tenants: row.get("active_tenants"),
            total_rooms: row.get("total_rooms"),
            available_rooms: row.get("available_rooms"),
        })
    }

    async fn summarize(pool: &Pool<Sqlite>, property: Property) -> Result<HostelSummary> {
        let owner = match property.owner_id {
            Some(owner_id) => UserRepo::get(pool, owner_id).await?.map(|u| OwnerSummary {
                id: u.id,
                name: u.name,
                email: u.email,
                phone: u.phone,
                role: u.role,
                verification_status: u.verification_status,
            }),
            None => None,
        };

        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM tenants WHERE property_id = ?1) AS total_tenants,
                (SELECT COUNT(*) FROM tenants WHERE property_id = ?1 AND active = 1) AS active_tenants,
                (SELECT COUNT(*) FROM tenants
                    WHERE property_id = ?1 AND approval_status = 'pending') AS pending_tenants,
                (SELECT COUNT(*) FROM rooms WHERE property_id = ?1) AS total_rooms,
                (SELECT COUNT(*) FROM rooms
                    WHERE property_id = ?1 AND status = 'available') AS available_rooms
            "#,
        )
        .bind(property.id)
        .fetch_one(pool)
        .await?;

        let stats = HostelStats {
            total_tenants: row.get("total_tenants"),
            active_tenants: row.get("active_tenants"),
            pending_tenants: row.get("pending_tenants"),
            total_rooms: row.get("total_rooms"),
            available_rooms: row.get("available_rooms"),
        };

        Ok(HostelSummary { property, owner, stats })
    }
}

fn push_property_filters(
    qb: &mut QueryBuilder<'_, Sqlite>,
    search: Option<&str>,
    status: Option<PropertyVerificationStatus>,
) {
    if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        qb.push(" AND (name LIKE ")
            .push_bind(pattern.clone())
            .push(" OR address LIKE ")
            .push_bind(pattern.clone())
            .push(" OR owner_full_name LIKE ")
            .push_bind(pattern.clone())
            .push(" OR organizational_code LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(status) = status {
        qb.push(" AND verification_status = ").push_bind(status.as_str());
    }
}
