use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Pool, QueryBuilder, Row, Sqlite, SqliteConnection};
use tracing::info;

use super::rooms::{release_seat, take_seat};
use super::row_helpers::map_tenant_row;
use super::{NotFoundError, PropertyScope, RuleViolation};
use crate::models::*;

/// Tenant columns plus the assigned room under `r_` aliases
const TENANT_SELECT: &str = r#"
    SELECT t.*,
           r.id AS r_id, r.property_id AS r_property_id, r.number AS r_number,
           r.room_type AS r_room_type, r.rent AS r_rent, r.capacity AS r_capacity,
           r.occupancy AS r_occupancy, r.status AS r_status, r.active AS r_active,
           r.created_at AS r_created_at, r.updated_at AS r_updated_at
    FROM tenants t
    LEFT JOIN rooms r ON r.id = t.room_id
"#;

async fn fetch_tenant(conn: &mut SqliteConnection, id: i64) -> Result<Tenant> {
    let row = sqlx::query(&format!("{} WHERE t.id = ?", TENANT_SELECT))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| NotFoundError::new("Tenant", &id.to_string()))?;
    Ok(map_tenant_row(&row))
}

async fn insert_tenant(conn: &mut SqliteConnection, new: &NewTenant, now: DateTime<Utc>) -> Result<i64> {
    let (approval_status, active, approved_by, approval_date) = match new.admission {
        Admission::Direct { approved_by } => (ApprovalStatus::Approved, true, Some(approved_by), Some(now)),
        Admission::SelfService => (ApprovalStatus::Pending, false, None, None),
    };
    let d = &new.details;

    let result = sqlx::query(
        r#"
        INSERT INTO tenants (
            property_id, first_name, last_name, email, phone,
            date_of_birth, gender, aadhar_number, identity_proof, occupation, native_place,
            room_id, room_category, move_in_date, expected_duration,
            emergency_contact_name, emergency_contact_relationship, emergency_contact_phone,
            security_deposit, blood_group, medical_condition, photo,
            terms_accepted, terms_accepted_at, digital_signature, organizational_code,
            approval_status, approved_by, approval_date, active, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(new.property_id)
    .bind(new.first_name.trim())
    .bind(new.last_name.as_deref().map(str::trim))
    .bind(new.email.trim().to_lowercase())
    .bind(new.phone.as_deref().map(str::trim))
    .bind(d.date_of_birth)
    .bind(d.gender.map(|g| g.as_str()))
    .bind(&d.aadhar_number)
    .bind(&d.identity_proof)
    .bind(&d.occupation)
    .bind(&d.native_place)
    .bind(new.room_id)
    .bind(&d.room_category)
    .bind(d.move_in_date)
    .bind(&d.expected_duration)
    .bind(&d.emergency_contact_name)
    .bind(&d.emergency_contact_relationship)
    .bind(&d.emergency_contact_phone)
    .bind(d.security_deposit)
    .bind(&d.blood_group)
    .bind(&d.medical_condition)
    .bind(&d.photo)
    .bind(new.terms_accepted)
    .bind(new.terms_accepted.then_some(now))
    .bind(&d.digital_signature)
    .bind(&new.organizational_code)
    .bind(approval_status.as_str())
    .bind(approved_by)
    .bind(approval_date)
    .bind(active)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Tenant database operations. Every change that moves a seat runs in one
/// transaction with the room update, so a refused seat leaves no trace.
pub struct TenantRepo;

impl TenantRepo {
    pub async fn list(
        pool: &Pool<Sqlite>,
        scope: PropertyScope,
        filter: &TenantFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Tenant>, i64)> {
        let mut qb = QueryBuilder::<Sqlite>::new(TENANT_SELECT);
        qb.push(" WHERE 1 = 1");
        push_tenant_filters(&mut qb, scope, filter);
        qb.push(" ORDER BY t.created_at DESC, t.id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let rows = qb.build().fetch_all(pool).await?;

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM tenants t WHERE 1 = 1");
        push_tenant_filters(&mut count, scope, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

        Ok((rows.iter().map(map_tenant_row).collect(), total))
    }

    pub async fn list_by_property(pool: &Pool<Sqlite>, property_id: i64) -> Result<Vec<Tenant>> {
        let rows = sqlx::query(&format!(
            "{} WHERE t.property_id = ? ORDER BY t.created_at DESC, t.id DESC",
            TENANT_SELECT
        ))
        .bind(property_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.iter().map(map_tenant_row).collect())
    }

    pub async fn list_by_ids(pool: &Pool<Sqlite>, ids: &[i64]) -> Result<Vec<Tenant>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = QueryBuilder::<Sqlite>::new(TENANT_SELECT);
        qb.push(" WHERE t.id IN (");
        let mut sep = qb.separated(", ");
        for id in ids {
            sep.push_bind(*id);
        }
        sep.push_unseparated(") ORDER BY t.id");
        let rows = qb.build().fetch_all(pool).await?;
        Ok(rows.iter().map(map_tenant_row).collect())
    }

    pub async fn get(pool: &Pool<Sqlite>, id: i64) -> Result<Option<Tenant>> {
        let row = sqlx::query(&format!("{} WHERE t.id = ?", TENANT_SELECT))
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.as_ref().map(map_tenant_row))
    }

    /// Insert a tenant. Direct admissions take their seat in the same transaction.
    pub async fn create(pool: &Pool<Sqlite>, new: &NewTenant) -> Result<Tenant> {
        let mut tx = pool.begin().await?;
        let now = Utc::now();

        let id = insert_tenant(&mut tx, new, now).await?;
        if let (Admission::Direct { .. }, Some(room_id)) = (new.admission, new.room_id) {
            take_seat(&mut tx, room_id).await?;
        }

        let tenant = fetch_tenant(&mut tx, id).await?;
        tx.commit().await?;
        Ok(tenant)
    }

    /// Self-service onboarding: the room is checked but not reserved, and
    /// the user account is linked to the new pending profile.
    pub async fn onboard(pool: &Pool<Sqlite>, user_id: i64, new: &NewTenant) -> Result<Tenant> {
        let mut tx = pool.begin().await?;

        let linked: Option<i64> = sqlx::query_scalar("SELECT tenant_id FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| NotFoundError::new("User", &user_id.to_string()))?;
        if linked.is_some() {
            return Err(RuleViolation::new("Tenant profile already exists").into());
        }

        if let Some(room_id) = new.room_id {
            let row = sqlx::query("SELECT occupancy, capacity FROM rooms WHERE id = ?")
                .bind(room_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| NotFoundError::new("Room", &room_id.to_string()))?;
            let occupancy: i64 = row.get("occupancy");
            let capacity: i64 = row.get("capacity");
            if occupancy >= capacity {
                return Err(RuleViolation::new("Room is fully occupied").into());
            }
        }

        let now = Utc::now();
        let id = insert_tenant(&mut tx, new, now).await?;
        sqlx::query("UPDATE users SET tenant_id = ?, updated_at = ? WHERE id = ?")
            .bind(id)
            .bind(now)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let tenant = fetch_tenant(&mut tx, id).await?;
        tx.commit().await?;
        Ok(tenant)
    }

    /// Partial update. An admitted tenant given a new room takes the new
    /// seat before giving back the old one, if any.
    pub async fn update(pool: &Pool<Sqlite>, id: i64, req: &UpdateTenantRequest) -> Result<Tenant> {
        let mut tx = pool.begin().await?;
        let current = fetch_tenant(&mut tx, id).await?;

        if let Some(new_room) = req.room.filter(|r| Some(*r) != current.room_id) {
            // seat-holder once the room is set
            if current.approval_status == ApprovalStatus::Approved && current.active {
                take_seat(&mut tx, new_room).await?;
                if let Some(old_room) = current.room_id {
                    release_seat(&mut tx, old_room).await?;
                    info!(tenant_id = id, old_room, new_room, "Tenant moved rooms");
                } else {
                    info!(tenant_id = id, new_room, "Tenant assigned a room");
                }
            } else {
                let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM rooms WHERE id = ?")
                    .bind(new_room)
                    .fetch_optional(&mut *tx)
                    .await?;
                if exists.is_none() {
                    return Err(NotFoundError::new("Room", &new_room.to_string()).into());
                }
            }
        }

        let d = &req.details;
        sqlx::query(
            r#"
            UPDATE tenants SET
                first_name = COALESCE(?, first_name),
                last_name = COALESCE(?, last_name),
                email = COALESCE(?, email),
                phone = COALESCE(?, phone),
                date_of_birth = COALESCE(?, date_of_birth),
                gender = COALESCE(?, gender),
                aadhar_number = COALESCE(?, aadhar_number),
                identity_proof = COALESCE(?, identity_proof),
                occupation = COALESCE(?, occupation),
                native_place = COALESCE(?, native_place),
                room_id = COALESCE(?, room_id),
                room_category = COALESCE(?, room_category),
                move_in_date = COALESCE(?, move_in_date),
                expected_duration = COALESCE(?, expected_duration),
                emergency_contact_name = COALESCE(?, emergency_contact_name),
                emergency_contact_relationship = COALESCE(?, emergency_contact_relationship),
                emergency_contact_phone = COALESCE(?, emergency_contact_phone),
                security_deposit = COALESCE(?, security_deposit),
                blood_group = COALESCE(?, blood_group),
                medical_condition = COALESCE(?, medical_condition),
                photo = COALESCE(?, photo),
                digital_signature = COALESCE(?, digital_signature),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(req.first_name.as_deref().map(str::trim))
        .bind(req.last_name.as_deref().map(str::trim))
        .bind(req.email.as_deref().map(|e| e.trim().to_lowercase()))
        .bind(req.phone.as_deref().map(str::trim))
        .bind(d.date_of_birth)
        .bind(d.gender.map(|g| g.as_str()))
        .bind(&d.aadhar_number)
        .bind(&d.identity_proof)
        .bind(&d.occupation)
        .bind(&d.native_place)
        .bind(req.room)
        .bind(&d.room_category)
        .bind(d.move_in_date)
        .bind(&d.expected_duration)
        .bind(&d.emergency_contact_name)
        .bind(&d.emergency_contact_relationship)
        .bind(&d.emergency_contact_phone)
        .bind(d.security_deposit)
        .bind(&d.blood_group)
        .bind(&d.medical_condition)
        .bind(&d.photo)
        .bind(&d.digital_signature)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let tenant = fetch_tenant(&mut tx, id).await?;
        tx.commit().await?;
        Ok(tenant)
    }

    /// Admit a pending or rejected applicant, or re-admit a vacated tenant.
    /// The tenant's room, if set, must have a free seat.
    pub async fn approve(pool: &Pool<Sqlite>, id: i64, approver: i64) -> Result<Tenant> {
        let mut tx = pool.begin().await?;
        let current = fetch_tenant(&mut tx, id).await?;
        if current.approval_status == ApprovalStatus::Approved && current.active {
            return Err(RuleViolation::new("Tenant is already approved").into());
        }

        if let Some(room_id) = current.room_id {
            take_seat(&mut tx, room_id).await?;
        }

        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE tenants SET approval_status = 'approved', active = 1, approved_by = ?,
                               approval_date = ?, rejection_reason = NULL, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(approver)
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let tenant = fetch_tenant(&mut tx, id).await?;
        tx.commit().await?;
        info!(tenant_id = id, approver, room_id = ?tenant.room_id, "Tenant approved");
        Ok(tenant)
    }

    /// Reject a pending application. Nothing was reserved, so rooms are untouched.
    pub async fn reject(pool: &Pool<Sqlite>, id: i64, reason: &str) -> Result<Tenant> {
        let mut tx = pool.begin().await?;
        let current = fetch_tenant(&mut tx, id).await?;
        if current.approval_status == ApprovalStatus::Approved {
            return Err(RuleViolation::new("Cannot reject an approved tenant").into());
        }

        sqlx::query(
            r#"
            UPDATE tenants SET approval_status = 'rejected', active = 0,
                               rejection_reason = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(reason)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let tenant = fetch_tenant(&mut tx, id).await?;
        tx.commit().await?;
        info!(tenant_id = id, "Tenant rejected");
        Ok(tenant)
    }

    /// Move an active seat-holder out: seat released, room cleared, inactive.
    pub async fn vacate(pool: &Pool<Sqlite>, id: i64) -> Result<Tenant> {
        let mut tx = pool.begin().await?;
        let current = fetch_tenant(&mut tx, id).await?;
        let room_id = match current.room_id {
            Some(room_id) if current.holds_seat() => room_id,
            _ => return Err(RuleViolation::new("Tenant is not occupying a room").into()),
        };

        release_seat(&mut tx, room_id).await?;
        sqlx::query("UPDATE tenants SET active = 0, room_id = NULL, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let tenant = fetch_tenant(&mut tx, id).await?;
        tx.commit().await?;
        info!(tenant_id = id, room_id, "Tenant vacated");
        Ok(tenant)
    }

    /// Delete a tenant, releasing its seat. Linked user accounts and the
    /// tenant's payments and tickets follow through foreign keys.
    pub async fn delete(pool: &Pool<Sqlite>, id: i64) -> Result<()> {
        let mut tx = pool.begin().await?;
        let current = fetch_tenant(&mut tx, id).await?;

        if let (true, Some(room_id)) = (current.holds_seat(), current.room_id) {
            release_seat(&mut tx, room_id).await?;
        }
        sqlx::query("DELETE FROM tenants WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!(tenant_id = id, "Tenant deleted");
        Ok(())
    }

    pub async fn stats(pool: &Pool<Sqlite>, scope: PropertyScope) -> Result<TenantStats> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT COUNT(*) AS total,
                   COALESCE(SUM(CASE WHEN t.active = 1 THEN 1 ELSE 0 END), 0) AS active,
                   COALESCE(SUM(CASE WHEN t.approval_status = 'pending' THEN 1 ELSE 0 END), 0) AS pending
            FROM tenants t WHERE 1 = 1
            "#,
        );
        scope.push_filter(&mut qb, "t.property_id");
        let row = qb.build().fetch_one(pool).await?;
        let total: i64 = row.get("total");
        let active: i64 = row.get("active");

        let mut by_room_qb = QueryBuilder::<Sqlite>::new(
            "SELECT t.room_id, COUNT(*) AS count FROM tenants t WHERE t.active = 1 AND t.room_id IS NOT NULL",
        );
        scope.push_filter(&mut by_room_qb, "t.property_id");
        by_room_qb.push(" GROUP BY t.room_id ORDER BY t.room_id");
        let by_room = by_room_qb
            .build()
            .fetch_all(pool)
            .await?
            .iter()
            .map(|r| RoomCount {
                room_id: r.get("room_id"),
                count: r.get("count"),
            })
            .collect();

        Ok(TenantStats {
            total,
            active,
            inactive: total - active,
            pending: row.get("pending"),
            by_room,
        })
    }
}

fn push_tenant_filters(qb: &mut QueryBuilder<'_, Sqlite>, scope: PropertyScope, filter: &TenantFilter) {
    scope.push_filter(qb, "t.property_id");
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        qb.push(" AND (t.first_name LIKE ")
            .push_bind(pattern.clone())
            .push(" OR t.last_name LIKE ")
            .push_bind(pattern.clone())
            .push(" OR t.email LIKE ")
            .push_bind(pattern.clone())
            .push(" OR t.phone LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(active) = filter.active {
        qb.push(" AND t.active = ").push_bind(active);
    }
    if let Some(status) = filter.approval_status {
        qb.push(" AND t.approval_status = ").push_bind(status.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{testing::approver, Store};
    use tokio_test::{assert_err, assert_ok};

    async fn room(store: &Store, number: &str, capacity: i64) -> Room {
        store
            .create_room(
                None,
                &CreateRoomRequest {
                    number: number.to_string(),
                    room_type: RoomType::Shared,
                    rent: 4500.0,
                    capacity,
                    status: RoomStatus::Available,
                },
            )
            .await
            .unwrap()
    }

    fn applicant(email: &str, room_id: Option<i64>, admission: Admission) -> NewTenant {
        NewTenant {
            property_id: None,
            first_name: "Priya".to_string(),
            last_name: Some("Nair".to_string()),
            email: email.to_string(),
            phone: Some("9876500000".to_string()),
            room_id,
            details: TenantDetails::default(),
            terms_accepted: true,
            organizational_code: None,
            admission,
        }
    }

    async fn occupancy(store: &Store, room_id: i64) -> (i64, RoomStatus) {
        let r = store.get_room(room_id).await.unwrap().unwrap();
        (r.occupancy, r.status)
    }

    #[tokio::test]
    async fn test_self_service_starts_pending_without_seat() {
        let store = Store::in_memory().await.unwrap();
        let r = room(&store, "201", 2).await;
        let t = store
            .create_tenant(&applicant("p1@example.com", Some(r.id), Admission::SelfService))
            .await
            .unwrap();

        assert_eq!(t.approval_status, ApprovalStatus::Pending);
        assert!(!t.active);
        assert_eq!(t.room.as_ref().map(|r| r.number.as_str()), Some("201"));
        assert_eq!(occupancy(&store, r.id).await, (0, RoomStatus::Available));
    }

    #[tokio::test]
    async fn test_direct_admission_takes_seat() {
        let store = Store::in_memory().await.unwrap();
        let admin = approver(&store).await.id;
        let r = room(&store, "202", 1).await;
        let t = store
            .create_tenant(&applicant("p2@example.com", Some(r.id), Admission::Direct { approved_by: admin }))
            .await
            .unwrap();

        assert_eq!(t.approval_status, ApprovalStatus::Approved);
        assert!(t.active);
        assert!(t.approval_date.is_some());
        assert_eq!(occupancy(&store, r.id).await, (1, RoomStatus::Occupied));

        // Room is full: the second direct admission leaves no tenant behind
        let err = assert_err!(
            store
                .create_tenant(&applicant("p3@example.com", Some(r.id), Admission::Direct { approved_by: admin }))
                .await
        );
        assert!(err.downcast_ref::<RuleViolation>().is_some());
        let (_, total) = store
            .list_tenants(PropertyScope::All, &TenantFilter::default(), 10, 0)
            .await
            .unwrap();
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn test_second_approval_fills_room() {
        let store = Store::in_memory().await.unwrap();
        let admin = approver(&store).await.id;
        let r = room(&store, "203", 2).await;
        store
            .create_tenant(&applicant("first@example.com", Some(r.id), Admission::Direct { approved_by: admin }))
            .await
            .unwrap();
        assert_eq!(occupancy(&store, r.id).await, (1, RoomStatus::Available));

        let pending = store
            .create_tenant(&applicant("second@example.com", Some(r.id), Admission::SelfService))
            .await
            .unwrap();
        let approved = store.approve_tenant(pending.id, admin).await.unwrap();
        assert_eq!(approved.approved_by, Some(admin));
        assert!(approved.active);
        assert_eq!(occupancy(&store, r.id).await, (2, RoomStatus::Occupied));
    }

    #[tokio::test]
    async fn test_approve_twice_is_refused() {
        let store = Store::in_memory().await.unwrap();
        let admin = approver(&store).await.id;
        let r = room(&store, "204", 3).await;
        let t = store
            .create_tenant(&applicant("twice@example.com", Some(r.id), Admission::SelfService))
            .await
            .unwrap();
        assert_ok!(store.approve_tenant(t.id, admin).await);
        let err = assert_err!(store.approve_tenant(t.id, admin).await);
        assert_eq!(err.to_string(), "Tenant is already approved");
        assert_eq!(occupancy(&store, r.id).await.0, 1);
    }

    #[tokio::test]
    async fn test_approve_into_full_room_rolls_back() {
        let store = Store::in_memory().await.unwrap();
        let admin = approver(&store).await.id;
        let r = room(&store, "205", 1).await;
        store
            .create_tenant(&applicant("holder@example.com", Some(r.id), Admission::Direct { approved_by: admin }))
            .await
            .unwrap();
        let waiting = store
            .create_tenant(&applicant("waiting@example.com", Some(r.id), Admission::SelfService))
            .await
            .unwrap();

        let err = assert_err!(store.approve_tenant(waiting.id, admin).await);
        assert_eq!(err.to_string(), "Room is fully occupied");

        let still = store.get_tenant(waiting.id).await.unwrap().unwrap();
        assert_eq!(still.approval_status, ApprovalStatus::Pending);
        assert!(!still.active);
        assert_eq!(occupancy(&store, r.id).await.0, 1);
    }

    #[tokio::test]
    async fn test_reject_never_touches_rooms() {
        let store = Store::in_memory().await.unwrap();
        let admin = approver(&store).await.id;
        let r = room(&store, "206", 2).await;
        let t = store
            .create_tenant(&applicant("nope@example.com", Some(r.id), Admission::SelfService))
            .await
            .unwrap();
        let rejected = store.reject_tenant(t.id, "Incomplete documents").await.unwrap();
        assert_eq!(rejected.approval_status, ApprovalStatus::Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("Incomplete documents"));
        assert_eq!(occupancy(&store, r.id).await.0, 0);

        // A rejected applicant can still be approved later
        assert_ok!(store.approve_tenant(t.id, admin).await);
        let approved = store.get_tenant(t.id).await.unwrap().unwrap();
        assert!(approved.rejection_reason.is_none());
        assert_err!(store.reject_tenant(t.id, "late").await);
    }

    #[tokio::test]
    async fn test_delete_releases_exactly_one_seat() {
        let store = Store::in_memory().await.unwrap();
        let admin = approver(&store).await.id;
        let r = room(&store, "207", 2).await;
        let a = store
            .create_tenant(&applicant("a@example.com", Some(r.id), Admission::Direct { approved_by: admin }))
            .await
            .unwrap();
        store
            .create_tenant(&applicant("b@example.com", Some(r.id), Admission::Direct { approved_by: admin }))
            .await
            .unwrap();
        let pending = store
            .create_tenant(&applicant("c@example.com", Some(r.id), Admission::SelfService))
            .await
            .unwrap();
        assert_eq!(occupancy(&store, r.id).await, (2, RoomStatus::Occupied));

        store.delete_tenant(pending.id).await.unwrap();
        assert_eq!(occupancy(&store, r.id).await.0, 2);

        store.delete_tenant(a.id).await.unwrap();
        assert_eq!(occupancy(&store, r.id).await, (1, RoomStatus::Available));
        assert!(store.get_tenant(a.id).await.unwrap().is_none());

        let err = assert_err!(store.delete_tenant(a.id).await);
        assert!(err.downcast_ref::<NotFoundError>().is_some());
    }

    #[tokio::test]
    async fn test_vacate_clears_room() {
        let store = Store::in_memory().await.unwrap();
        let admin = approver(&store).await.id;
        let r = room(&store, "208", 1).await;
        let t = store
            .create_tenant(&applicant("leaving@example.com", Some(r.id), Admission::Direct { approved_by: admin }))
            .await
            .unwrap();

        let vacated = store.vacate_tenant(t.id).await.unwrap();
        assert!(!vacated.active);
        assert!(vacated.room_id.is_none());
        assert!(vacated.room.is_none());
        assert_eq!(occupancy(&store, r.id).await, (0, RoomStatus::Available));

        assert_err!(store.vacate_tenant(t.id).await);
        assert_eq!(occupancy(&store, r.id).await.0, 0);
    }

    #[tokio::test]
    async fn test_room_move_keeps_total_occupancy() {
        let store = Store::in_memory().await.unwrap();
        let admin = approver(&store).await.id;
        let from = room(&store, "301", 2).await;
        let to = room(&store, "302", 1).await;
        let t = store
            .create_tenant(&applicant("mover@example.com", Some(from.id), Admission::Direct { approved_by: admin }))
            .await
            .unwrap();

        let moved = store
            .update_tenant(t.id, &UpdateTenantRequest { room: Some(to.id), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(moved.room_id, Some(to.id));
        assert_eq!(occupancy(&store, from.id).await.0, 0);
        assert_eq!(occupancy(&store, to.id).await, (1, RoomStatus::Occupied));

        // Moving back into a full room is refused and nothing changes
        let other = store
            .create_tenant(&applicant("other@example.com", Some(from.id), Admission::Direct { approved_by: admin }))
            .await
            .unwrap();
        let third = room(&store, "303", 1).await;
        store
            .create_tenant(&applicant("third@example.com", Some(third.id), Admission::Direct { approved_by: admin }))
            .await
            .unwrap();
        assert_err!(
            store
                .update_tenant(other.id, &UpdateTenantRequest { room: Some(third.id), ..Default::default() })
                .await
        );
        let other = store.get_tenant(other.id).await.unwrap().unwrap();
        assert_eq!(other.room_id, Some(from.id));
        assert_eq!(occupancy(&store, from.id).await.0, 1);
    }

    #[tokio::test]
    async fn test_assigning_room_to_admitted_tenant_takes_seat() {
        let store = Store::in_memory().await.unwrap();
        let admin = approver(&store).await.id;
        let r = room(&store, "304", 1).await;
        let a = store
            .create_tenant(&applicant("roomless@example.com", None, Admission::Direct { approved_by: admin }))
            .await
            .unwrap();
        assert_eq!(occupancy(&store, r.id).await.0, 0);

        let assigned = store
            .update_tenant(a.id, &UpdateTenantRequest { room: Some(r.id), ..Default::default() })
            .await
            .unwrap();
        assert!(assigned.holds_seat());
        assert_eq!(occupancy(&store, r.id).await, (1, RoomStatus::Occupied));

        // The seat is taken, so nobody else gets in
        let err = assert_err!(
            store
                .create_tenant(&applicant("late@example.com", Some(r.id), Admission::Direct { approved_by: admin }))
                .await
        );
        assert_eq!(err.to_string(), "Room is fully occupied");

        store.delete_tenant(a.id).await.unwrap();
        assert_eq!(occupancy(&store, r.id).await, (0, RoomStatus::Available));
    }

    #[tokio::test]
    async fn test_pending_tenant_room_change_reserves_nothing() {
        let store = Store::in_memory().await.unwrap();
        let r = room(&store, "305", 1).await;
        let t = store
            .create_tenant(&applicant("waiting@example.com", None, Admission::SelfService))
            .await
            .unwrap();
        let updated = store
            .update_tenant(t.id, &UpdateTenantRequest { room: Some(r.id), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(updated.room_id, Some(r.id));
        assert_eq!(occupancy(&store, r.id).await.0, 0);

        let err = assert_err!(
            store
                .update_tenant(t.id, &UpdateTenantRequest { room: Some(999), ..Default::default() })
                .await
        );
        assert!(err.downcast_ref::<NotFoundError>().is_some());
    }

    #[tokio::test]
    async fn test_vacated_tenant_can_be_readmitted() {
        let store = Store::in_memory().await.unwrap();
        let admin = approver(&store).await.id;
        let r = room(&store, "306", 1).await;
        let t = store
            .create_tenant(&applicant("returning@example.com", Some(r.id), Admission::Direct { approved_by: admin }))
            .await
            .unwrap();
        store.vacate_tenant(t.id).await.unwrap();

        // Inactive tenants pick a room without holding it until approved
        store
            .update_tenant(t.id, &UpdateTenantRequest { room: Some(r.id), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(occupancy(&store, r.id).await.0, 0);

        let back = store.approve_tenant(t.id, admin).await.unwrap();
        assert!(back.holds_seat());
        assert_eq!(occupancy(&store, r.id).await, (1, RoomStatus::Occupied));

        let err = assert_err!(store.approve_tenant(t.id, admin).await);
        assert_eq!(err.to_string(), "Tenant is already approved");
        assert_eq!(occupancy(&store, r.id).await.0, 1);
    }

    #[tokio::test]
    async fn test_onboard_links_user_once() {
        let store = Store::in_memory().await.unwrap();
        let r = room(&store, "401", 1).await;
        let user = store
            .create_user(&NewUser {
                name: "Priya Nair".to_string(),
                email: "priya@example.com".to_string(),
                phone: "9876500000".to_string(),
                password_hash: "hash".to_string(),
                role: Role::Tenant,
                property_id: None,
                verification_status: UserVerificationStatus::Unverified,
                organizational_code: None,
            })
            .await
            .unwrap();

        let t = store
            .onboard_tenant(user.id, &applicant("priya@example.com", Some(r.id), Admission::SelfService))
            .await
            .unwrap();
        assert_eq!(t.approval_status, ApprovalStatus::Pending);
        assert!(t.terms_accepted_at.is_some());
        let linked = store.get_user(user.id).await.unwrap().unwrap();
        assert_eq!(linked.tenant_id, Some(t.id));

        let err = assert_err!(
            store
                .onboard_tenant(user.id, &applicant("again@example.com", Some(r.id), Admission::SelfService))
                .await
        );
        assert!(err.downcast_ref::<RuleViolation>().is_some());

        // Deleting the profile unlinks the account
        store.delete_tenant(t.id).await.unwrap();
        let unlinked = store.get_user(user.id).await.unwrap().unwrap();
        assert!(unlinked.tenant_id.is_none());
    }

    #[tokio::test]
    async fn test_list_search_and_stats() {
        let store = Store::in_memory().await.unwrap();
        let admin = approver(&store).await.id;
        let r = room(&store, "501", 3).await;
        store
            .create_tenant(&applicant("alpha@example.com", Some(r.id), Admission::Direct { approved_by: admin }))
            .await
            .unwrap();
        let mut other = applicant("beta@example.com", None, Admission::SelfService);
        other.first_name = "Rahul".to_string();
        other.last_name = None;
        store.create_tenant(&other).await.unwrap();

        let filter = TenantFilter { search: Some("rahul".into()), ..Default::default() };
        let (found, total) = store.list_tenants(PropertyScope::All, &filter, 10, 0).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(found[0].email, "beta@example.com");

        let filter = TenantFilter { active: Some(true), ..Default::default() };
        let (found, _) = store.list_tenants(PropertyScope::All, &filter, 10, 0).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].room.as_ref().map(|r| r.id), Some(r.id));

        let stats = store.tenant_stats(PropertyScope::Unassigned).await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.inactive, 1);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.by_room.len(), 1);
        assert_eq!(stats.by_room[0].count, 1);

        let picked = store.list_tenants_by_ids(&[2, 99]).await.unwrap();
        assert_eq!(picked.len(), 1);
    }
}
