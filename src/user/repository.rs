use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::Id;
use super::model::Profile;

#[async_trait]
pub trait ProfileRepository {
    async fn find_by_id(&self, id: &Id) -> super::Result<Profile>;

    async fn exists(&self, id: &Id) -> super::Result<bool>;
}

#[derive(Default)]
pub struct InMemoryProfileRepository {
    profiles: RwLock<HashMap<Id, Profile>>,
}

impl InMemoryProfileRepository {
    pub async fn insert(&self, profile: Profile) {
        self.profiles.write().await.insert(profile.id, profile);
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn find_by_id(&self, id: &Id) -> super::Result<Profile> {
        self.profiles
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(super::Error::NotFound(*id))
    }

    async fn exists(&self, id: &Id) -> super::Result<bool> {
        Ok(self.profiles.read().await.contains_key(id))
    }
}
