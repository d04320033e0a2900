//! Data models for the property management API.
//!
//! These mirror the JSON the backend sends and accepts:
//!
//! - `UserType`, `Registration`: accounts
//! - `Property`, `NewProperty`, `Application`: listings and tenancy applications
//! - `MaintenanceRequest` and friends: repair requests and their approval
//! - `TenantProfile`, `RentInvoice`, `Transaction`, `VacateNotice`: tenancy and billing
//! - `Notification`: messages between landlords and tenants
//!
//! Decimal amounts stay in the server's string form (e.g. `"1500.00"`); all
//! billing arithmetic happens server side.

pub mod attachment;
pub mod maintenance;
pub mod notification;
pub mod property;
pub mod tenancy;
pub mod user;

pub use attachment::Attachment;
pub use maintenance::{
    MaintenanceApproval, MaintenanceKind, MaintenanceRequest, MaintenanceStatus,
    NewMaintenanceRequest, Severity,
};
pub use notification::{Notification, NotificationKind};
pub use property::{Application, ApplicationReview, ApplicationStatus, NewProperty, Property};
pub use tenancy::{
    LandlordDashboard, LandlordProperty, RentInvoice, TenantOverview, TenantProfile, Transaction, VacateNotice,
};
pub use user::{Registration, UserSummary, UserType};
