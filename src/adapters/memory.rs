//! In-memory application repository for tests and local development.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::{Application, ApplicationRepository};
use crate::error::Result;

#[derive(Default)]
pub struct InMemoryApplications {
    applications: RwLock<HashMap<i64, Application>>,
}

impl InMemoryApplications {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, application: Application) {
        self.applications
            .write()
            .await
            .insert(application.id, application);
    }
}

#[async_trait]
impl ApplicationRepository for InMemoryApplications {
    async fn find_by_id(&self, id: i64) -> Result<Option<Application>> {
        Ok(self.applications.read().await.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn stores_and_finds_applications() {
        let repo = InMemoryApplications::new();
        repo.insert(Application {
            id: 1,
            payment_id: "A-1".to_string(),
            created_at: Utc::now(),
            products: vec![],
        })
        .await;

        assert!(repo.find_by_id(1).await.unwrap().is_some());
        assert!(repo.find_by_id(2).await.unwrap().is_none());
    }
}
