//! Landlord and tenant resource endpoints.

use reqwest::Method;
use serde::Serialize;
use tracing::debug;

use crate::models::{
    Application, ApplicationReview, LandlordDashboard, MaintenanceApproval, MaintenanceRequest,
    NewMaintenanceRequest, NewProperty, Notification, Property, TenantOverview, TenantProfile,
    VacateNotice,
};

use super::client::{file_part, text_form, ApiClient};
use super::error::{ApiError, ApiResult};

const PROPERTIES_PATH: &str = "api/properties/";
const APPLICATIONS_PATH: &str = "api/applications/";
const MAINTENANCE_PATH: &str = "api/maintenance-requests/";
const NOTIFICATIONS_PATH: &str = "api/notifications/";
const NOTIFICATIONS_EDIT_PATH: &str = "api/notifications-edit/";
const VACATE_NOTICES_PATH: &str = "api/vacate-notices/";
const TENANT_INFO_PATH: &str = "api/tenant-info/";
const LANDLORD_DASHBOARD_PATH: &str = "api/landlord/";

#[derive(Debug, Serialize)]
struct MarkReadRequest {
    notification: i64,
}

impl ApiClient {
    // ===== Properties =====

    /// Landlords see their own listings, tenants see what is available
    pub async fn fetch_properties(&self) -> ApiResult<Vec<Property>> {
        self.get(PROPERTIES_PATH).await
    }

    pub async fn create_property(&self, property: &NewProperty) -> ApiResult<serde_json::Value> {
        if property.images.len() > NewProperty::MAX_IMAGES {
            return Err(ApiError::InvalidRequest(format!(
                "at most {} images per property",
                NewProperty::MAX_IMAGES
            )));
        }

        let mut form = text_form(property.text_fields());
        for (index, image) in property.images.iter().enumerate() {
            form = form.part(format!("image_{}", index + 1), file_part(image));
        }
        for document in &property.documents {
            form = form.part("files[]", file_part(document));
        }
        debug!(images = property.images.len(), documents = property.documents.len(), "Creating property");
        self.send_form(Method::POST, PROPERTIES_PATH, form).await
    }

    // ===== Applications =====

    pub async fn apply_for_property(&self, property_id: i64, tenant_id: i64) -> ApiResult<serde_json::Value> {
        let application = Application::new(property_id, tenant_id);
        self.send_json(Method::POST, APPLICATIONS_PATH, &application).await
    }

    pub async fn fetch_applications(&self) -> ApiResult<Vec<Application>> {
        self.get(APPLICATIONS_PATH).await
    }

    pub async fn approve_application(&self, review: &ApplicationReview) -> ApiResult<serde_json::Value> {
        let form = text_form(vec![
            ("tenant", review.tenant_email.clone()),
            ("property", review.property.to_string()),
        ]);
        self.send_form(Method::PATCH, APPLICATIONS_PATH, form).await
    }

    // ===== Maintenance =====

    pub async fn fetch_maintenance_requests(&self) -> ApiResult<Vec<MaintenanceRequest>> {
        self.get(MAINTENANCE_PATH).await
    }

    pub async fn submit_maintenance_request(
        &self,
        request: &NewMaintenanceRequest,
    ) -> ApiResult<serde_json::Value> {
        if request.images.len() > NewMaintenanceRequest::MAX_IMAGES {
            return Err(ApiError::InvalidRequest(format!(
                "at most {} images per maintenance request",
                NewMaintenanceRequest::MAX_IMAGES
            )));
        }

        let mut form = text_form(request.text_fields());
        for (index, image) in request.images.iter().enumerate() {
            form = form.part(format!("image_{}", index), file_part(image));
        }
        if let Some(ref video) = request.video {
            form = form.part("video", file_part(video));
        }
        self.send_form(Method::POST, MAINTENANCE_PATH, form).await
    }

    pub async fn approve_maintenance(&self, approval: &MaintenanceApproval) -> ApiResult<serde_json::Value> {
        self.send_json(Method::PATCH, MAINTENANCE_PATH, approval).await
    }

    // ===== Tenancy =====

    pub async fn fetch_notifications(&self) -> ApiResult<Vec<Notification>> {
        self.get(NOTIFICATIONS_PATH).await
    }

    /// Mark one of the caller's notifications read. Unknown ids are `NotFound`.
    pub async fn mark_notification_read(&self, notification_id: i64) -> ApiResult<serde_json::Value> {
        debug!(notification_id, "Marking notification read");
        self.send_json(
            Method::PATCH,
            NOTIFICATIONS_EDIT_PATH,
            &MarkReadRequest {
                notification: notification_id,
            },
        )
        .await
    }

    pub async fn submit_vacate_notice(&self, notice: &VacateNotice) -> ApiResult<serde_json::Value> {
        self.send_json(Method::POST, VACATE_NOTICES_PATH, notice).await
    }

    pub async fn fetch_tenant_profile(&self) -> ApiResult<TenantProfile> {
        self.get(TENANT_INFO_PATH).await
    }

    /// Fetch the tenant home screen data concurrently
    pub async fn fetch_tenant_overview(&self) -> ApiResult<TenantOverview> {
        let (profile, notifications, maintenance_requests) = futures::try_join!(
            self.fetch_tenant_profile(),
            self.fetch_notifications(),
            self.fetch_maintenance_requests(),
        )?;

        Ok(TenantOverview {
            profile,
            notifications,
            maintenance_requests,
        })
    }

    pub async fn fetch_landlord_dashboard(&self) -> ApiResult<LandlordDashboard> {
        self.get(LANDLORD_DASHBOARD_PATH).await
    }
}
