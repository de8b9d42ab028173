//! Station name and telecode lookup
//!
//! Registration takes display names ("北京", "上海") while the remote endpoint
//! only understands telecodes ("BJP", "SHH").

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::errors::RepositoryResult;
use crate::models::Station;

#[async_trait]
pub trait StationDirectory: Send + Sync {
    async fn code_for_name(&self, name: &str) -> RepositoryResult<Option<String>>;

    async fn name_for_code(&self, code: &str) -> RepositoryResult<Option<String>>;
}

/// Fixed station table held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryStationDirectory {
    by_name: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryStationDirectory {
    pub fn new(stations: impl IntoIterator<Item = Station>) -> Self {
        let by_name = stations.into_iter().map(|s| (s.name, s.code)).collect();
        Self {
            by_name: Arc::new(RwLock::new(by_name)),
        }
    }

    pub async fn insert(&self, station: Station) {
        self.by_name.write().await.insert(station.name, station.code);
    }
}

#[async_trait]
impl StationDirectory for InMemoryStationDirectory {
    async fn code_for_name(&self, name: &str) -> RepositoryResult<Option<String>> {
        Ok(self.by_name.read().await.get(name.trim()).cloned())
    }

    async fn name_for_code(&self, code: &str) -> RepositoryResult<Option<String>> {
        Ok(self
            .by_name
            .read()
            .await
            .iter()
            .find(|(_, c)| c.as_str() == code.trim())
            .map(|(name, _)| name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup_both_directions() {
        let directory = InMemoryStationDirectory::new([
            Station::new("北京", "BJP"),
            Station::new("上海", "SHH"),
        ]);

        assert_eq!(
            directory.code_for_name("北京").await.unwrap().as_deref(),
            Some("BJP")
        );
        assert_eq!(
            directory.name_for_code("SHH").await.unwrap().as_deref(),
            Some("上海")
        );
        assert!(directory.code_for_name("Atlantis").await.unwrap().is_none());

        directory.insert(Station::new("广州", "GZQ")).await;
        assert_eq!(
            directory.code_for_name(" 广州 ").await.unwrap().as_deref(),
            Some("GZQ")
        );
    }
}
