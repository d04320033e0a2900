use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::attachment::Attachment;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: i64,
    /// Owning landlord's user id
    #[serde(default)]
    pub landlord: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: String,
    #[serde(default = "default_rooms")]
    pub bedrooms: i32,
    #[serde(default = "default_rooms")]
    pub bathrooms: i32,
    #[serde(default)]
    pub parking: i32,
    /// Monthly rent as a decimal string
    pub rent_price: String,
    #[serde(default = "default_available")]
    pub available: bool,
    pub image1: Option<String>,
    pub image2: Option<String>,
    pub image3: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_rooms() -> i32 {
    1
}

fn default_available() -> bool {
    true
}

impl Property {
    pub fn images(&self) -> impl Iterator<Item = &str> {
        [&self.image1, &self.image2, &self.image3]
            .into_iter()
            .filter_map(|img| img.as_deref())
    }

    pub fn summary(&self) -> String {
        format!(
            "{} ({} bd / {} ba) - {} @ {}",
            self.title, self.bedrooms, self.bathrooms, self.address, self.rent_price
        )
    }
}

/// New listing, sent as multipart to `api/properties/`.
#[derive(Debug, Clone)]
pub struct NewProperty {
    pub title: String,
    pub description: String,
    pub location: String,
    pub rent_amount: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub parking: u32,
    pub landlord_id: i64,
    /// Up to three listing photos, sent as `image_1`..`image_3`
    pub images: Vec<Attachment>,
    /// Supporting documents, sent as `files[]`
    pub documents: Vec<Attachment>,
}

impl NewProperty {
    pub const MAX_IMAGES: usize = 3;

    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("title", self.title.clone()),
            ("rent_amount", self.rent_amount.clone()),
            ("location", self.location.clone()),
            ("description", self.description.clone()),
            ("bedrooms", self.bedrooms.to_string()),
            ("bathrooms", self.bathrooms.to_string()),
            ("parking", self.parking.to_string()),
            ("landlord", self.landlord_id.to_string()),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

/// A tenant's application to rent a property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    #[serde(default)]
    pub id: Option<i64>,
    pub property: i64,
    pub tenant: i64,
    pub status: ApplicationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl Application {
    pub fn new(property: i64, tenant: i64) -> Self {
        Self {
            id: None,
            property,
            tenant,
            status: ApplicationStatus::Pending,
            submitted_at: None,
            reviewed_at: None,
        }
    }
}

/// Landlord approval of an application, sent as a multipart PATCH.
#[derive(Debug, Clone)]
pub struct ApplicationReview {
    pub tenant_email: String,
    pub property: i64,
}
