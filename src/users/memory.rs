use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::users::repo::UserCollection;
use crate::users::repo_types::{DeleteOutcome, NewUser, UpdateOutcome, User, UserId, UserPatch};

/// In-process collection kept in insertion order.
#[derive(Default)]
pub struct MemoryUserCollection {
    docs: RwLock<Vec<User>>,
}

impl MemoryUserCollection {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserCollection for MemoryUserCollection {
    async fn insert_one(&self, user: NewUser) -> anyhow::Result<User> {
        let user = User::from_new(UserId::new(), user);
        self.docs.write().await.push(user.clone());
        Ok(user)
    }

    async fn find_all(&self) -> anyhow::Result<Vec<User>> {
        Ok(self.docs.read().await.clone())
    }

    async fn find_by_id(&self, id: UserId) -> anyhow::Result<Option<User>> {
        Ok(self.docs.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn update_by_id(&self, id: UserId, patch: &UserPatch) -> anyhow::Result<UpdateOutcome> {
        let mut docs = self.docs.write().await;
        Ok(match docs.iter_mut().find(|u| u.id == id) {
            Some(user) => UpdateOutcome::matched(user.apply(patch)),
            None => UpdateOutcome::no_match(),
        })
    }

    async fn delete_by_id(&self, id: UserId) -> anyhow::Result<DeleteOutcome> {
        let mut docs = self.docs.write().await;
        let before = docs.len();
        docs.retain(|u| u.id != id);
        Ok(DeleteOutcome::deleted((before - docs.len()) as u64))
    }
}
