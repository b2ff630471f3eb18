use crate::error::StorageError;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, StorageError>;

/// A stored link in the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// The short code the link is served under.
    pub short_code: ShortCode,
    /// Operator-facing display name.
    pub name: String,
    /// The URL the short code redirects to.
    pub target_url: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Inactive links are not served by the redirector.
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Parameters for creating a link.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub short_code: ShortCode,
    pub name: String,
    pub target_url: String,
    pub description: Option<String>,
}

/// A partial update of a link; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct LinkUpdate {
    pub name: Option<String>,
    pub target_url: Option<String>,
    pub description: Option<Option<String>>,
    pub is_active: Option<bool>,
}

/// A read-only view of a repository.
///
/// This trait provides only the read operations from [`Repository`],
/// allowing the redirect path to have read-only access.
#[async_trait]
pub trait ReadRepository: Send + Sync + 'static {
    /// Retrieves the link for a given short code.
    /// Returns `None` if the code does not exist.
    async fn get(&self, code: &ShortCode) -> Result<Option<LinkRecord>>;

    /// Checks whether a short code already exists in the repository.
    async fn exists(&self, code: &ShortCode) -> Result<bool>;
}

#[async_trait]
pub trait Repository: ReadRepository {
    /// Inserts a new link. Returns `Err(Conflict)` if the code already exists.
    async fn insert(&self, link: NewLink) -> Result<LinkRecord>;

    /// Applies a partial update to the link for a given short code.
    /// Returns `None` if the code does not exist.
    async fn update(&self, code: &ShortCode, update: LinkUpdate) -> Result<Option<LinkRecord>>;

    /// Deletes the link for a given short code.
    /// Returns `true` if the record existed and was removed.
    async fn delete(&self, code: &ShortCode) -> Result<bool>;

    /// Lists all links, newest first.
    async fn list(&self) -> Result<Vec<LinkRecord>>;
}
