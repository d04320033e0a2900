use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::attachment::Attachment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaintenanceKind {
    Plumbing,
    Electrical,
    Structural,
    #[serde(other)]
    Other,
}

impl MaintenanceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenanceKind::Plumbing => "Plumbing",
            MaintenanceKind::Electrical => "Electrical",
            MaintenanceKind::Structural => "Structural",
            MaintenanceKind::Other => "Other",
        }
    }
}

impl std::str::FromStr for MaintenanceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "plumbing" => Ok(MaintenanceKind::Plumbing),
            "electrical" => Ok(MaintenanceKind::Electrical),
            "structural" => Ok(MaintenanceKind::Structural),
            "other" => Ok(MaintenanceKind::Other),
            other => Err(format!("unknown maintenance type: {}", other)),
        }
    }
}

// The landlord screens use lowercase workflow names, the model uses title case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaintenanceStatus {
    #[serde(alias = "pending")]
    Pending,
    #[serde(rename = "In Progress", alias = "ongoing")]
    InProgress,
    #[serde(alias = "approved")]
    Approved,
    #[serde(alias = "completed")]
    Completed,
    #[serde(alias = "cancelled")]
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl MaintenanceStatus {
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            MaintenanceStatus::Pending | MaintenanceStatus::InProgress | MaintenanceStatus::Approved
        )
    }
}

impl std::fmt::Display for MaintenanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaintenanceStatus::Pending => write!(f, "Pending"),
            MaintenanceStatus::InProgress => write!(f, "In Progress"),
            MaintenanceStatus::Approved => write!(f, "Approved"),
            MaintenanceStatus::Completed => write!(f, "Completed"),
            MaintenanceStatus::Cancelled => write!(f, "Cancelled"),
            MaintenanceStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    #[serde(alias = "low")]
    Low,
    #[serde(alias = "medium")]
    Medium,
    #[serde(alias = "high")]
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            other => Err(format!("unknown severity: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceRequest {
    #[serde(rename = "type")]
    pub kind: MaintenanceKind,
    pub description: String,
    pub status: MaintenanceStatus,
    pub severity: Severity,
    pub submitted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub image1: Option<String>,
    pub image2: Option<String>,
    pub image3: Option<String>,
    pub video: Option<String>,
    /// Approved budget as a decimal string
    pub budget: Option<String>,
}

/// Tenant's repair request, sent as multipart to `api/maintenance-requests/`.
#[derive(Debug, Clone)]
pub struct NewMaintenanceRequest {
    pub property_id: i64,
    pub kind: MaintenanceKind,
    pub severity: Severity,
    pub description: String,
    /// Sent as `image_0`..`image_2`
    pub images: Vec<Attachment>,
    pub video: Option<Attachment>,
}

impl NewMaintenanceRequest {
    pub const MAX_IMAGES: usize = 3;

    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("description", self.description.clone()),
            ("maintenance_type", self.kind.as_str().to_string()),
            ("severity", self.severity.as_str().to_string()),
            ("property_id", self.property_id.to_string()),
        ]
    }
}

/// Landlord approval of a repair with the budget they will cover.
#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceApproval {
    pub property: i64,
    pub tenant: i64,
    pub budget: String,
}
