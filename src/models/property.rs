use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Role, Room, Tenant, UserVerificationStatus};

text_enum! {
    /// Compliance review state of a hostel
    pub enum PropertyVerificationStatus {
        Pending => "pending",
        UnderReview => "under_review",
        Verified => "verified",
        Rejected => "rejected",
    }
    default = Pending;
}

text_enum! {
    pub enum GovernmentIdType {
        Aadhaar => "aadhaar",
        Passport => "passport",
        VoterId => "voter_id",
    }
    default = Aadhaar;
}

text_enum! {
    /// Uploadable compliance documents; the text is the URL path segment
    pub enum DocumentKind {
        OwnerGovernmentId => "owner-government-id",
        TradeLicense => "trade-license",
        FireSafetyCertificate => "fire-safety-certificate",
        Noc => "noc",
        ProofOfAddress => "proof-of-address",
        GstCertificate => "gst-certificate",
        BuildingOccupancyCertificate => "building-occupancy-certificate",
        LeaseAgreement => "lease-agreement",
        InsuranceCertificate => "insurance-certificate",
        HealthSanitationCertificate => "health-sanitation-certificate",
    }
    default = TradeLicense;
}

impl DocumentKind {
    /// Column holding the document URL
    pub fn column(&self) -> &'static str {
        match self {
            DocumentKind::OwnerGovernmentId => "owner_government_id",
            DocumentKind::TradeLicense => "trade_license",
            DocumentKind::FireSafetyCertificate => "fire_safety_certificate",
            DocumentKind::Noc => "noc",
            DocumentKind::ProofOfAddress => "proof_of_address",
            DocumentKind::GstCertificate => "gst_certificate",
            DocumentKind::BuildingOccupancyCertificate => "building_occupancy_certificate",
            DocumentKind::LeaseAgreement => "lease_agreement",
            DocumentKind::InsuranceCertificate => "insurance_certificate",
            DocumentKind::HealthSanitationCertificate => "health_sanitation_certificate",
        }
    }
}

/// Owner identity and contact details captured at hostel registration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerDetails {
    #[serde(default)]
    pub owner_full_name: Option<String>,
    #[serde(default, rename = "ownerPAN")]
    pub owner_pan: Option<String>,
    #[serde(default)]
    pub owner_business_phone: Option<String>,
    #[serde(default)]
    pub owner_business_email: Option<String>,
    #[serde(default)]
    pub owner_personal_phone: Option<String>,
    #[serde(default)]
    pub owner_personal_email: Option<String>,
    #[serde(default)]
    pub owner_government_id_type: Option<GovernmentIdType>,
}

/// URLs of uploaded compliance documents
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceDocuments {
    pub owner_government_id: Option<String>,
    pub trade_license: Option<String>,
    pub fire_safety_certificate: Option<String>,
    pub noc: Option<String>,
    pub proof_of_address: Option<String>,
    pub gst_certificate: Option<String>,
    pub building_occupancy_certificate: Option<String>,
    pub lease_agreement: Option<String>,
    pub insurance_certificate: Option<String>,
    pub health_sanitation_certificate: Option<String>,
}

/// Property is a hostel registered on the platform
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub owner_id: Option<i64>,
    #[serde(flatten)]
    pub owner_details: OwnerDetails,
    #[serde(flatten)]
    pub documents: ComplianceDocuments,
    pub verification_status: PropertyVerificationStatus,
    pub verified_at: Option<DateTime<Utc>>,
    pub verified_by: Option<i64>,
    pub rejection_reason: Option<String>,
    pub organizational_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to register a hostel
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePropertyRequest {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub owner_id: Option<i64>,
    #[serde(flatten)]
    pub owner_details: OwnerDetails,
}

/// Partial hostel update; `None` leaves a column untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePropertyRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub owner_id: Option<i64>,
    #[serde(flatten)]
    pub owner_details: OwnerDetails,
}

text_enum! {
    pub enum VerifyAction {
        Verify => "verify",
        Reject => "reject",
    }
    default = Verify;
}

/// Body of the verify endpoint; `action` stays a string so unknown
/// values can be answered with a 400 instead of a parse failure.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyHostelRequest {
    pub action: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Owner account shown alongside a hostel
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub verification_status: UserVerificationStatus,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostelStats {
    pub total_tenants: i64,
    pub active_tenants: i64,
    pub pending_tenants: i64,
    pub total_rooms: i64,
    pub available_rooms: i64,
}

/// Hostel list entry with owner and occupancy figures
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostelSummary {
    #[serde(flatten)]
    pub property: Property,
    pub owner: Option<OwnerSummary>,
    pub stats: HostelStats,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostelList {
    pub hostels: Vec<HostelSummary>,
    #[serde(flatten)]
    pub page: super::PageMeta,
}

/// Staff member of a hostel
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub verification_status: UserVerificationStatus,
    pub created_at: DateTime<Utc>,
}

/// Everything the super-admin hostel page shows
#[derive(Debug, Clone, Serialize)]
pub struct HostelDetail {
    pub hostel: HostelSummary,
    pub tenants: Vec<Tenant>,
    pub rooms: Vec<Room>,
    pub admins: Vec<StaffSummary>,
}

/// Platform-wide counters for the super-admin dashboard
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub total_hostels: i64,
    pub verified_hostels: i64,
    pub pending_hostels: i64,
    pub rejected_hostels: i64,
    pub total_admins: i64,
    pub total_tenants: i64,
    pub active_tenants: i64,
    pub total_rooms: i64,
    pub available_rooms: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_kind_path_and_column() {
        let kind: DocumentKind = "fire-safety-certificate".parse().unwrap();
        assert_eq!(kind.column(), "fire_safety_certificate");
        assert!("passport-scan".parse::<DocumentKind>().is_err());
    }

    #[test]
    fn test_owner_pan_wire_name() {
        let req: CreatePropertyRequest =
            serde_json::from_str(r#"{"name":"A","address":"B","ownerPAN":"ABCDE1234F"}"#).unwrap();
        assert_eq!(req.owner_details.owner_pan.as_deref(), Some("ABCDE1234F"));
    }
}
