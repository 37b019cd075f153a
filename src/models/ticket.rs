use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

text_enum! {
    pub enum TicketPriority {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
    default = Medium;
}

text_enum! {
    pub enum TicketCategory {
        Technical => "technical",
        Payment => "payment",
        Maintenance => "maintenance",
        Complaint => "complaint",
        Security => "security",
        Plumbing => "plumbing",
        Other => "other",
    }
    default = Other;
}

text_enum! {
    pub enum TicketStatus {
        Open => "open",
        InProgress => "in_progress",
        Resolved => "resolved",
        Closed => "closed",
    }
    default = Open;
}

/// Ticket is a maintenance or support request raised for a tenant
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: i64,
    pub tenant_id: i64,
    pub property_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub priority: TicketPriority,
    pub category: TicketCategory,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTicketRequest {
    /// Required when staff file on behalf of a tenant
    #[serde(default)]
    pub tenant: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: TicketPriority,
    #[serde(default)]
    pub category: TicketCategory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTicketStatusRequest {
    pub status: TicketStatus,
}
