use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

text_enum! {
    pub enum PaymentMethod {
        Cash => "cash",
        Card => "card",
        Online => "online",
        BankTransfer => "bank_transfer",
        Check => "check",
    }
    default = Cash;
}

text_enum! {
    pub enum PaymentStatus {
        Pending => "pending",
        Completed => "completed",
        Failed => "failed",
        Refunded => "refunded",
    }
    default = Completed;
}

text_enum! {
    pub enum PaymentType {
        Rent => "rent",
        Deposit => "deposit",
        Maintenance => "maintenance",
        Other => "other",
    }
    default = Rent;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: i64,
    pub tenant_id: i64,
    pub property_id: Option<i64>,
    pub amount: f64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
    pub note: Option<String>,
    pub paid_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub tenant: i64,
    pub amount: f64,
    #[serde(default)]
    pub method: PaymentMethod,
    #[serde(default)]
    pub status: PaymentStatus,
    #[serde(default, rename = "type")]
    pub payment_type: PaymentType,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
}
