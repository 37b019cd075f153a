use std::str::FromStr;

use sqlx::{sqlite::SqliteRow, Row};

use crate::models::*;

/// Empty strings read back as None
pub fn none_if_empty(opt: Option<String>) -> Option<String> {
    opt.filter(|s| !s.is_empty())
}

/// Parse a TEXT enum column; CHECK constraints keep unknown values out,
/// so a mismatch falls back to the variant's default.
fn enum_col<T: FromStr + Default>(row: &SqliteRow, column: &str) -> T {
    let raw: String = row.get(column);
    raw.parse().unwrap_or_default()
}

fn opt_enum_col<T: FromStr>(row: &SqliteRow, column: &str) -> Option<T> {
    let raw: Option<String> = row.get(column);
    raw.and_then(|s| s.parse().ok())
}

/// Map a SQLite row to a User struct
pub fn map_user_row(row: &SqliteRow) -> User {
    let settings_json: Option<String> = row.get("settings");
    User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        password_hash: row.get("password_hash"),
        role: enum_col(row, "role"),
        email_verified: row.get("email_verified"),
        phone_verified: row.get("phone_verified"),
        property_id: row.get("property_id"),
        tenant_id: row.get("tenant_id"),
        verification_status: enum_col(row, "verification_status"),
        verified_at: row.get("verified_at"),
        organizational_code: none_if_empty(row.get("organizational_code")),
        profile_image: none_if_empty(row.get("profile_image")),
        settings: settings_json
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default(),
        reset_token_hash: none_if_empty(row.get("reset_token_hash")),
        reset_token_expires_at: row.get("reset_token_expires_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Map a SQLite row to a Property struct
pub fn map_property_row(row: &SqliteRow) -> Property {
    Property {
        id: row.get("id"),
        name: row.get("name"),
        address: row.get("address"),
        owner_id: row.get("owner_id"),
        owner_details: OwnerDetails {
            owner_full_name: none_if_empty(row.get("owner_full_name")),
            owner_pan: none_if_empty(row.get("owner_pan")),
            owner_business_phone: none_if_empty(row.get("owner_business_phone")),
            owner_business_email: none_if_empty(row.get("owner_business_email")),
            owner_personal_phone: none_if_empty(row.get("owner_personal_phone")),
            owner_personal_email: none_if_empty(row.get("owner_personal_email")),
            owner_government_id_type: opt_enum_col(row, "owner_government_id_type"),
        },
        documents: ComplianceDocuments {
            owner_government_id: none_if_empty(row.get("owner_government_id")),
            trade_license: none_if_empty(row.get("trade_license")),
            fire_safety_certificate: none_if_empty(row.get("fire_safety_certificate")),
            noc: none_if_empty(row.get("noc")),
            proof_of_address: none_if_empty(row.get("proof_of_address")),
            gst_certificate: none_if_empty(row.get("gst_certificate")),
            building_occupancy_certificate: none_if_empty(row.get("building_occupancy_certificate")),
            lease_agreement: none_if_empty(row.get("lease_agreement")),
            insurance_certificate: none_if_empty(row.get("insurance_certificate")),
            health_sanitation_certificate: none_if_empty(row.get("health_sanitation_certificate")),
        },
        verification_status: enum_col(row, "verification_status"),
        verified_at: row.get("verified_at"),
        verified_by: row.get("verified_by"),
        rejection_reason: none_if_empty(row.get("rejection_reason")),
        organizational_code: row.get("organizational_code"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Map a SQLite row to a Room struct
pub fn map_room_row(row: &SqliteRow) -> Room {
    map_room_columns(row, "")
}

/// Map room columns that were selected with a name prefix (joined queries)
pub fn map_room_columns(row: &SqliteRow, prefix: &str) -> Room {
    let col = |name: &str| format!("{}{}", prefix, name);
    Room {
        id: row.get(col("id").as_str()),
        property_id: row.get(col("property_id").as_str()),
        number: row.get(col("number").as_str()),
        room_type: enum_col(row, &col("room_type")),
        rent: row.get(col("rent").as_str()),
        capacity: row.get(col("capacity").as_str()),
        occupancy: row.get(col("occupancy").as_str()),
        status: enum_col(row, &col("status")),
        active: row.get(col("active").as_str()),
        created_at: row.get(col("created_at").as_str()),
        updated_at: row.get(col("updated_at").as_str()),
    }
}

/// Map a tenant row; the joined room is read from `r_`-prefixed columns
pub fn map_tenant_row(row: &SqliteRow) -> Tenant {
    let joined_room: Option<i64> = row.try_get("r_id").ok().flatten();
    Tenant {
        id: row.get("id"),
        property_id: row.get("property_id"),
        first_name: row.get("first_name"),
        last_name: none_if_empty(row.get("last_name")),
        email: row.get("email"),
        phone: none_if_empty(row.get("phone")),
        details: TenantDetails {
            date_of_birth: row.get("date_of_birth"),
            gender: opt_enum_col(row, "gender"),
            aadhar_number: none_if_empty(row.get("aadhar_number")),
            identity_proof: none_if_empty(row.get("identity_proof")),
            occupation: none_if_empty(row.get("occupation")),
            native_place: none_if_empty(row.get("native_place")),
            room_category: none_if_empty(row.get("room_category")),
            move_in_date: row.get("move_in_date"),
            expected_duration: none_if_empty(row.get("expected_duration")),
            emergency_contact_name: none_if_empty(row.get("emergency_contact_name")),
            emergency_contact_relationship: none_if_empty(row.get("emergency_contact_relationship")),
            emergency_contact_phone: none_if_empty(row.get("emergency_contact_phone")),
            security_deposit: row.get("security_deposit"),
            blood_group: none_if_empty(row.get("blood_group")),
            medical_condition: none_if_empty(row.get("medical_condition")),
            photo: none_if_empty(row.get("photo")),
            digital_signature: none_if_empty(row.get("digital_signature")),
        },
        room_id: row.get("room_id"),
        room: joined_room.map(|_| map_room_columns(row, "r_")),
        terms_accepted: row.get("terms_accepted"),
        terms_accepted_at: row.get("terms_accepted_at"),
        organizational_code: none_if_empty(row.get("organizational_code")),
        approval_status: enum_col(row, "approval_status"),
        approved_by: row.get("approved_by"),
        approval_date: row.get("approval_date"),
        rejection_reason: none_if_empty(row.get("rejection_reason")),
        active: row.get("active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Map a SQLite row to a Payment struct
pub fn map_payment_row(row: &SqliteRow) -> Payment {
    Payment {
        id: row.get("id"),
        tenant_id: row.get("tenant_id"),
        property_id: row.get("property_id"),
        amount: row.get("amount"),
        method: enum_col(row, "method"),
        status: enum_col(row, "status"),
        payment_type: enum_col(row, "payment_type"),
        note: none_if_empty(row.get("note")),
        paid_at: row.get("paid_at"),
        created_at: row.get("created_at"),
    }
}

/// Map a SQLite row to a Ticket struct
pub fn map_ticket_row(row: &SqliteRow) -> Ticket {
    Ticket {
        id: row.get("id"),
        tenant_id: row.get("tenant_id"),
        property_id: row.get("property_id"),
        title: row.get("title"),
        description: none_if_empty(row.get("description")),
        priority: enum_col(row, "priority"),
        category: enum_col(row, "category"),
        status: enum_col(row, "status"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
