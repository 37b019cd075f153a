use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Pool, QueryBuilder, Sqlite};

use super::row_helpers::map_payment_row;
use super::{PropertyScope, RuleViolation};
use crate::models::*;

/// Payment database operations
pub struct PaymentRepo;

impl PaymentRepo {
    pub async fn list(pool: &Pool<Sqlite>, scope: PropertyScope, tenant_id: Option<i64>) -> Result<Vec<Payment>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM payments WHERE 1 = 1");
        scope.push_filter(&mut qb, "property_id");
        if let Some(tenant_id) = tenant_id {
            qb.push(" AND tenant_id = ").push_bind(tenant_id);
        }
        qb.push(" ORDER BY paid_at DESC, id DESC");
        let rows = qb.build().fetch_all(pool).await?;
        Ok(rows.iter().map(map_payment_row).collect())
    }

    pub async fn recent_for_tenant(pool: &Pool<Sqlite>, tenant_id: i64, limit: i64) -> Result<Vec<Payment>> {
        let rows = sqlx::query(
            "SELECT * FROM payments WHERE tenant_id = ? ORDER BY paid_at DESC, id DESC LIMIT ?",
        )
        .bind(tenant_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(rows.iter().map(map_payment_row).collect())
    }

    /// Most recent completed rent payment
    pub async fn last_rent(pool: &Pool<Sqlite>, tenant_id: i64) -> Result<Option<Payment>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM payments
            WHERE tenant_id = ? AND payment_type = 'rent' AND status = 'completed'
            ORDER BY paid_at DESC, id DESC LIMIT 1
            "#,
        )
        .bind(tenant_id)
        .fetch_optional(pool)
        .await?;
        Ok(row.as_ref().map(map_payment_row))
    }

    pub async fn create(pool: &Pool<Sqlite>, property_id: Option<i64>, req: &CreatePaymentRequest) -> Result<Payment> {
        if req.amount <= 0.0 {
            return Err(RuleViolation::new("Amount must be greater than zero").into());
        }

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO payments (tenant_id, property_id, amount, method, status, payment_type,
                                  note, paid_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(req.tenant)
        .bind(property_id)
        .bind(req.amount)
        .bind(req.method.as_str())
        .bind(req.status.as_str())
        .bind(req.payment_type.as_str())
        .bind(req.note.as_deref().map(str::trim).filter(|n| !n.is_empty()))
        .bind(req.paid_at.unwrap_or(now))
        .bind(now)
        .execute(pool)
        .await?;

        let row = sqlx::query("SELECT * FROM payments WHERE id = ?")
            .bind(result.last_insert_rowid())
            .fetch_optional(pool)
            .await?
            .context("Payment not found after creation")?;
        Ok(map_payment_row(&row))
    }
}
