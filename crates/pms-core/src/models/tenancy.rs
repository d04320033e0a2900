use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::maintenance::MaintenanceRequest;
use super::notification::Notification;
use super::property::Property;
use super::user::UserSummary;

/// A tenant's standing with the property they rent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantProfile {
    pub user: UserSummary,
    pub property: Option<Property>,
    pub water_bill: Option<String>,
    pub arrears: Option<String>,
    pub total_monthly_bill: Option<String>,
    pub total_billed: Option<String>,
    pub total_paid: Option<String>,
    pub rent_status: Option<String>,
    pub move_in_date: Option<NaiveDate>,
    #[serde(default)]
    pub invoices: Vec<RentInvoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub phone_number: Option<String>,
    pub amount: String,
    pub transaction_status: String,
    pub transaction_id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Invoice generated by the backend's billing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentInvoice {
    pub id: i64,
    #[serde(default)]
    pub amount_due: Option<String>,
    #[serde(default)]
    pub amount_paid: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

/// Notice to leave a rented property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VacateNotice {
    pub vacate_date: NaiveDate,
    pub reason: String,
}

/// Everything the tenant home screen shows, fetched in one go.
#[derive(Debug, Clone)]
pub struct TenantOverview {
    pub profile: TenantProfile,
    pub notifications: Vec<Notification>,
    pub maintenance_requests: Vec<MaintenanceRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandlordProperty {
    pub property: Property,
    #[serde(default)]
    pub maintenance_requests: Vec<MaintenanceRequest>,
    pub tenant_profile: Option<TenantProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandlordDashboard {
    #[serde(default)]
    pub properties: Vec<LandlordProperty>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

impl LandlordDashboard {
    pub fn occupied_count(&self) -> usize {
        self.properties
            .iter()
            .filter(|p| p.tenant_profile.is_some())
            .count()
    }

    pub fn open_maintenance_count(&self) -> usize {
        self.properties
            .iter()
            .flat_map(|p| p.maintenance_requests.iter())
            .filter(|m| m.status.is_open())
            .count()
    }
}
