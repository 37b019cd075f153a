use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Pool, QueryBuilder, Row, Sqlite, SqliteConnection};

use super::row_helpers::map_room_row;
use super::{NotFoundError, PropertyScope, RuleViolation};
use crate::models::*;

/// Claim one seat in a room. The conditional UPDATE is the only place
/// occupancy grows, so concurrent claims can never push it past capacity.
pub(crate) async fn take_seat(conn: &mut SqliteConnection, room_id: i64) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE rooms SET
            occupancy = occupancy + 1,
            status = CASE
                WHEN status = 'maintenance' THEN status
                WHEN occupancy + 1 >= capacity THEN 'occupied'
                ELSE 'available'
            END,
            updated_at = ?
        WHERE id = ? AND occupancy < capacity
        "#,
    )
    .bind(Utc::now())
    .bind(room_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM rooms WHERE id = ?")
            .bind(room_id)
            .fetch_optional(&mut *conn)
            .await?;
        return match exists {
            Some(_) => Err(RuleViolation::new("Room is fully occupied").into()),
            None => Err(NotFoundError::new("Room", &room_id.to_string()).into()),
        };
    }
    Ok(())
}

/// Give back one seat; occupancy floors at zero.
pub(crate) async fn release_seat(conn: &mut SqliteConnection, room_id: i64) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE rooms SET
            occupancy = MAX(occupancy - 1, 0),
            status = CASE
                WHEN status = 'occupied' AND MAX(occupancy - 1, 0) < capacity THEN 'available'
                ELSE status
            END,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(Utc::now())
    .bind(room_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Room database operations
pub struct RoomRepo;

impl RoomRepo {
    pub async fn list(
        pool: &Pool<Sqlite>,
        scope: PropertyScope,
        filter: &RoomFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Room>, i64)> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM rooms WHERE 1 = 1");
        push_room_filters(&mut qb, scope, filter);
        qb.push(" ORDER BY number LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let rows = qb.build().fetch_all(pool).await?;

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM rooms WHERE 1 = 1");
        push_room_filters(&mut count, scope, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

        Ok((rows.iter().map(map_room_row).collect(), total))
    }

    pub async fn list_by_property(pool: &Pool<Sqlite>, property_id: i64) -> Result<Vec<Room>> {
        let rows = sqlx::query("SELECT * FROM rooms WHERE property_id = ? ORDER BY number")
            .bind(property_id)
            .fetch_all(pool)
            .await?;
        Ok(rows.iter().map(map_room_row).collect())
    }

    pub async fn get(pool: &Pool<Sqlite>, id: i64) -> Result<Option<Room>> {
        let row = sqlx::query("SELECT * FROM rooms WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.as_ref().map(map_room_row))
    }

    pub async fn create(pool: &Pool<Sqlite>, property_id: Option<i64>, req: &CreateRoomRequest) -> Result<Room> {
        let number = req.number.trim();
        if number.is_empty() {
            return Err(RuleViolation::new("Room number is required").into());
        }
        if req.rent <= 0.0 {
            return Err(RuleViolation::new("Rent must be greater than zero").into());
        }
        if req.capacity < 1 {
            return Err(RuleViolation::new("Capacity must be at least 1").into());
        }

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO rooms (property_id, number, room_type, rent, capacity, occupancy,
                               status, active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 0, ?, 1, ?, ?)
            "#,
        )
        .bind(property_id)
        .bind(number)
        .bind(req.room_type.as_str())
        .bind(req.rent)
        .bind(req.capacity)
        .bind(req.status.as_str())
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        let new_id = result.last_insert_rowid();
        Self::get(pool, new_id)
            .await?
            .context("Room not found after creation")
    }

    pub async fn update(pool: &Pool<Sqlite>, id: i64, req: &UpdateRoomRequest) -> Result<Room> {
        let mut tx = pool.begin().await?;

        let row = sqlx::query("SELECT * FROM rooms WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| NotFoundError::new("Room", &id.to_string()))?;
        let room = map_room_row(&row);

        let capacity = req.capacity.unwrap_or(room.capacity);
        let occupancy = req.occupancy.unwrap_or(room.occupancy);
        if capacity < 1 {
            return Err(RuleViolation::new("Capacity must be at least 1").into());
        }
        if capacity < room.occupancy && req.occupancy.is_none() {
            return Err(RuleViolation::new(format!(
                "Capacity cannot be lower than current occupancy ({})",
                room.occupancy
            ))
            .into());
        }
        if occupancy < 0 || occupancy > capacity {
            return Err(RuleViolation::new("Occupancy must be between 0 and capacity").into());
        }
        if let Some(rent) = req.rent {
            if rent <= 0.0 {
                return Err(RuleViolation::new("Rent must be greater than zero").into());
            }
        }
        let number = match req.number.as_deref().map(str::trim) {
            Some("") => return Err(RuleViolation::new("Room number is required").into()),
            Some(n) => n.to_string(),
            None => room.number.clone(),
        };

        let requested = req.status.unwrap_or(room.status);
        let status = match requested {
            RoomStatus::Maintenance => RoomStatus::Maintenance,
            // Leaving maintenance or editing a regular room: derive from seats
            other => RoomStatus::for_occupancy(other, occupancy, capacity),
        };

        sqlx::query(
            r#"
            UPDATE rooms SET number = ?, room_type = ?, rent = ?, capacity = ?,
                             occupancy = ?, status = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&number)
        .bind(req.room_type.unwrap_or(room.room_type).as_str())
        .bind(req.rent.unwrap_or(room.rent))
        .bind(capacity)
        .bind(occupancy)
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Self::get(pool, id)
            .await?
            .context("Room not found after update")
    }

    /// Delete an empty room; tenants still referencing it lose the reference
    pub async fn delete(pool: &Pool<Sqlite>, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM rooms WHERE id = ? AND occupancy = 0")
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return match Self::get(pool, id).await? {
                Some(_) => Err(RuleViolation::new("Cannot delete a room that has tenants").into()),
                None => Err(NotFoundError::new("Room", &id.to_string()).into()),
            };
        }
        Ok(())
    }

    pub async fn stats(pool: &Pool<Sqlite>, scope: PropertyScope) -> Result<RoomStats> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT COUNT(*) AS total,
                   COALESCE(SUM(CASE WHEN status = 'available' THEN 1 ELSE 0 END), 0) AS available,
                   COALESCE(SUM(CASE WHEN status = 'occupied' THEN 1 ELSE 0 END), 0) AS occupied,
                   COALESCE(SUM(CASE WHEN status = 'maintenance' THEN 1 ELSE 0 END), 0) AS maintenance,
                   COALESCE(SUM(occupancy), 0) AS seats_taken,
                   COALESCE(SUM(capacity), 0) AS seats
            FROM rooms WHERE 1 = 1
            "#,
        );
        scope.push_filter(&mut qb, "property_id");
        let row = qb.build().fetch_one(pool).await?;

        let mut by_type_qb =
            QueryBuilder::<Sqlite>::new("SELECT room_type, COUNT(*) AS count FROM rooms WHERE 1 = 1");
        scope.push_filter(&mut by_type_qb, "property_id");
        by_type_qb.push(" GROUP BY room_type ORDER BY room_type");
        let by_type = by_type_qb
            .build()
            .fetch_all(pool)
            .await?
            .iter()
            .map(|r| TypeCount {
                room_type: r.get::<String, _>("room_type").parse().unwrap_or_default(),
                count: r.get("count"),
            })
            .collect();

        Ok(RoomStats {
            total: row.get("total"),
            available: row.get("available"),
            occupied: row.get("occupied"),
            maintenance: row.get("maintenance"),
            by_type,
            occupancy: OccupancyTotals {
                total: row.get("seats_taken"),
                capacity: row.get("seats"),
            },
        })
    }
}

fn push_room_filters(qb: &mut QueryBuilder<'_, Sqlite>, scope: PropertyScope, filter: &RoomFilter) {
    scope.push_filter(qb, "property_id");
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        qb.push(" AND number LIKE ")
            .push_bind(format!("%{}%", search))
            .push(" COLLATE NOCASE");
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(room_type) = filter.room_type {
        qb.push(" AND room_type = ").push_bind(room_type.as_str());
    }
}
