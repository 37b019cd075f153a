use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Pool, QueryBuilder, Sqlite};

use super::row_helpers::map_ticket_row;
use super::{NotFoundError, PropertyScope, RuleViolation};
use crate::models::*;

const MAX_TITLE_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 2000;

/// Ticket database operations
pub struct TicketRepo;

impl TicketRepo {
    pub async fn list(pool: &Pool<Sqlite>, scope: PropertyScope, status: Option<TicketStatus>) -> Result<Vec<Ticket>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM tickets WHERE 1 = 1");
        scope.push_filter(&mut qb, "property_id");
        if let Some(status) = status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        qb.push(" ORDER BY created_at DESC, id DESC");
        let rows = qb.build().fetch_all(pool).await?;
        Ok(rows.iter().map(map_ticket_row).collect())
    }

    pub async fn list_for_tenant(pool: &Pool<Sqlite>, tenant_id: i64, active_only: bool) -> Result<Vec<Ticket>> {
        let sql = if active_only {
            "SELECT * FROM tickets WHERE tenant_id = ? AND status IN ('open', 'in_progress') ORDER BY created_at DESC, id DESC"
        } else {
            "SELECT * FROM tickets WHERE tenant_id = ? ORDER BY created_at DESC, id DESC"
        };
        let rows = sqlx::query(sql).bind(tenant_id).fetch_all(pool).await?;
        Ok(rows.iter().map(map_ticket_row).collect())
    }

    pub async fn get(pool: &Pool<Sqlite>, id: i64) -> Result<Option<Ticket>> {
        let row = sqlx::query("SELECT * FROM tickets WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.as_ref().map(map_ticket_row))
    }

    /// Open a ticket for a tenant, inside the tenant's hostel
    pub async fn create(pool: &Pool<Sqlite>, tenant: &Tenant, req: &CreateTicketRequest) -> Result<Ticket> {
        let title = req.title.trim();
        if title.is_empty() {
            return Err(RuleViolation::new("Title is required").into());
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(RuleViolation::new(format!("Title cannot exceed {} characters", MAX_TITLE_LEN)).into());
        }
        let description = req.description.as_deref().map(str::trim).filter(|d| !d.is_empty());
        if description.is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LEN) {
            return Err(RuleViolation::new(format!(
                "Description cannot exceed {} characters",
                MAX_DESCRIPTION_LEN
            ))
            .into());
        }

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO tickets (tenant_id, property_id, title, description, priority, category,
                                 status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, 'open', ?, ?)
            "#,
        )
        .bind(tenant.id)
        .bind(tenant.property_id)
        .bind(title)
        .bind(description)
        .bind(req.priority.as_str())
        .bind(req.category.as_str())
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        Self::get(pool, result.last_insert_rowid())
            .await?
            .context("Ticket not found after creation")
    }

    pub async fn update_status(pool: &Pool<Sqlite>, id: i64, status: TicketStatus) -> Result<Ticket> {
        let result = sqlx::query("UPDATE tickets SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(NotFoundError::new("Ticket", &id.to_string()).into());
        }
        Self::get(pool, id)
            .await?
            .context("Ticket not found after update")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;
    use tokio_test::assert_err;

    fn ticket(title: &str) -> CreateTicketRequest {
        CreateTicketRequest {
            tenant: None,
            title: title.to_string(),
            description: Some("Water leaking under the sink".to_string()),
            priority: TicketPriority::High,
            category: TicketCategory::Plumbing,
        }
    }

    #[tokio::test]
    async fn test_active_tickets_follow_status() {
        let store = Store::in_memory().await.unwrap();
        let t = store
            .create_tenant(&NewTenant {
                property_id: None,
                first_name: "Divya".to_string(),
                last_name: None,
                email: "divya@example.com".to_string(),
                phone: None,
                room_id: None,
                details: TenantDetails::default(),
                terms_accepted: false,
                organizational_code: None,
                admission: Admission::SelfService,
            })
            .await
            .unwrap();

        let leak = store.create_ticket(&t, &ticket("Leaking tap")).await.unwrap();
        store.create_ticket(&t, &ticket("Broken fan")).await.unwrap();
        assert_eq!(leak.status, TicketStatus::Open);
        assert_eq!(store.list_tenant_tickets(t.id, true).await.unwrap().len(), 2);

        store.update_ticket_status(leak.id, TicketStatus::Resolved).await.unwrap();
        assert_eq!(store.list_tenant_tickets(t.id, true).await.unwrap().len(), 1);
        assert_eq!(store.list_tenant_tickets(t.id, false).await.unwrap().len(), 2);

        let resolved = store
            .list_tickets(PropertyScope::All, Some(TicketStatus::Resolved))
            .await
            .unwrap();
        assert_eq!(resolved.len(), 1);

        assert_err!(store.create_ticket(&t, &ticket("   ")).await);
        assert_err!(store.create_ticket(&t, &ticket(&"x".repeat(201))).await);
        assert_err!(store.update_ticket_status(999, TicketStatus::Closed).await);
    }
}
