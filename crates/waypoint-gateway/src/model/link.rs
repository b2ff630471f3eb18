use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use waypoint_core::LinkRecord;

#[derive(Debug, Deserialize)]
pub struct CreateLinkRequest {
    pub short_code: String,
    pub name: String,
    pub target_url: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateLinkRequest {
    pub name: Option<String>,
    pub target_url: Option<String>,
    /// `null` clears the description; absent leaves it unchanged.
    #[serde(default)]
    pub description: Option<Option<String>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub short_code: String,
    pub short_url: String,
    pub name: String,
    pub target_url: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl LinkResponse {
    pub fn from_record(record: LinkRecord, base_url: &str) -> Self {
        Self {
            short_url: record.short_code.to_url(base_url),
            short_code: record.short_code.to_string(),
            name: record.name,
            target_url: record.target_url,
            description: record.description,
            is_active: record.is_active,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
