use std::sync::Arc;

use tracing::debug;

use crate::error::UserError;
use crate::users::dto::{CreateUserRequest, UpdateUserRequest};
use crate::users::repo::UserCollection;
use crate::users::repo_types::{DeleteOutcome, UpdateOutcome, User, UserId};

/// The user resource store: validates input and maps intents onto the
/// injected collection. Holds no state of its own.
#[derive(Clone)]
pub struct UserService {
    collection: Arc<dyn UserCollection>,
}

impl UserService {
    pub fn new(collection: Arc<dyn UserCollection>) -> Self {
        Self { collection }
    }

    pub async fn create(&self, input: CreateUserRequest) -> Result<User, UserError> {
        let candidate = input.validate()?;
        let user = self
            .collection
            .insert_one(candidate)
            .await
            .map_err(UserError::StorageUnavailable)?;
        debug!(user_id = %user.id, "user inserted");
        Ok(user)
    }

    pub async fn list(&self) -> Result<Vec<User>, UserError> {
        self.collection
            .find_all()
            .await
            .map_err(UserError::StorageUnavailable)
    }

    /// `Ok(None)` when no record has this id.
    pub async fn get(&self, id: UserId) -> Result<Option<User>, UserError> {
        self.collection
            .find_by_id(id)
            .await
            .map_err(UserError::StorageUnavailable)
    }

    pub async fn update(
        &self,
        id: UserId,
        input: UpdateUserRequest,
    ) -> Result<UpdateOutcome, UserError> {
        let patch = input.validate()?;
        if patch.is_empty() {
            debug!(user_id = %id, "empty update patch");
        }
        let outcome = self
            .collection
            .update_by_id(id, &patch)
            .await
            .map_err(UserError::StorageUnavailable)?;
        debug!(
            user_id = %id,
            matched = outcome.matched_count,
            modified = outcome.modified_count,
            "user update applied"
        );
        Ok(outcome)
    }

    pub async fn delete(&self, id: UserId) -> Result<DeleteOutcome, UserError> {
        self.collection
            .delete_by_id(id)
            .await
            .map_err(UserError::StorageUnavailable)
    }
}
