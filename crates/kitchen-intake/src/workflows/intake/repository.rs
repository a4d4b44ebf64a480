use serde::Serialize;

use super::domain::{ApplicationId, ApplicationRecord};
use super::requirements::RequirementsDocument;
use super::status::{present, StatusView};

/// Storage abstraction over applications, keyed by (chef, location), so the
/// service module can be exercised with in-memory doubles.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError>;
    fn update(&self, record: ApplicationRecord) -> Result<(), RepositoryError>;
    fn fetch(
        &self,
        chef_id: &str,
        location_id: &str,
    ) -> Result<Option<ApplicationRecord>, RepositoryError>;
}

/// Per-location requirements configuration store.
pub trait RequirementsStore: Send + Sync {
    fn get(&self, location_id: &str) -> Result<Option<RequirementsDocument>, RepositoryError>;
    fn put(
        &self,
        location_id: &str,
        document: RequirementsDocument,
    ) -> Result<(), RepositoryError>;
}

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Sanitized projection of an application's exposed status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStatusView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_id: Option<ApplicationId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    pub current_tier: u8,
    pub effective_tier: u8,
    #[serde(flatten)]
    pub view: StatusView,
}

impl ApplicationStatusView {
    pub fn for_record(existing: Option<&ApplicationRecord>) -> Self {
        let view = present(existing);
        match existing {
            Some(record) => Self {
                application_id: Some(record.id.clone()),
                status: Some(record.status.label()),
                current_tier: record.current_tier,
                effective_tier: record.effective_tier(),
                view,
            },
            None => Self {
                application_id: None,
                status: None,
                current_tier: 1,
                effective_tier: 1,
                view,
            },
        }
    }
}
