use async_trait::async_trait;
use dashmap::DashMap;
use jiff::Timestamp;
use waypoint_core::error::StorageError;
use waypoint_core::repository::{
    LinkRecord, LinkUpdate, NewLink, ReadRepository, Repository, Result,
};
use waypoint_core::shortcode::ShortCode;

/// In-memory implementation of the Repository trait using DashMap.
///
/// DashMap provides better concurrency than RwLock<HashMap> because it
/// uses sharded locks, allowing concurrent reads and writes to different
/// buckets without blocking.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    storage: DashMap<String, LinkRecord>,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self {
            storage: DashMap::new(),
        }
    }
}

#[async_trait]
impl ReadRepository for InMemoryRepository {
    async fn get(&self, code: &ShortCode) -> Result<Option<LinkRecord>> {
        Ok(self.storage.get(code.as_str()).map(|e| e.clone()))
    }

    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        Ok(self.storage.contains_key(code.as_str()))
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn insert(&self, link: NewLink) -> Result<LinkRecord> {
        let key = link.short_code.as_str().to_owned();

        if self.storage.contains_key(&key) {
            return Err(StorageError::Conflict(link.short_code.to_string()));
        }

        let now = Timestamp::now();
        let record = LinkRecord {
            short_code: link.short_code,
            name: link.name,
            target_url: link.target_url,
            description: link.description,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.storage.insert(key, record.clone());
        Ok(record)
    }

    async fn update(&self, code: &ShortCode, update: LinkUpdate) -> Result<Option<LinkRecord>> {
        let Some(mut entry) = self.storage.get_mut(code.as_str()) else {
            return Ok(None);
        };

        if let Some(name) = update.name {
            entry.name = name;
        }
        if let Some(target_url) = update.target_url {
            entry.target_url = target_url;
        }
        if let Some(description) = update.description {
            entry.description = description;
        }
        if let Some(is_active) = update.is_active {
            entry.is_active = is_active;
        }
        entry.updated_at = Timestamp::now();

        Ok(Some(entry.clone()))
    }

    async fn delete(&self, code: &ShortCode) -> Result<bool> {
        Ok(self.storage.remove(code.as_str()).is_some())
    }

    async fn list(&self) -> Result<Vec<LinkRecord>> {
        let mut records: Vec<LinkRecord> =
            self.storage.iter().map(|e| e.value().clone()).collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}
