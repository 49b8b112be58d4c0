use std::{fmt, str::FromStr};

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::UserError;

/// Identifier of a stored user.
///
/// The path segment is parsed into this type before the store is called, so
/// nothing below the handlers ever sees the raw string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl FromStr for UserId {
    type Err = UserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| UserError::InvalidIdentifier(s.to_string()))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// User resource as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub age: i64,
    pub email: String,
    pub national_id: i64,
}

impl User {
    pub fn from_new(id: UserId, new: NewUser) -> Self {
        Self {
            id,
            first_name: new.first_name,
            last_name: new.last_name,
            age: new.age,
            email: new.email,
            national_id: new.national_id,
        }
    }

    /// Merges the fields present in `patch`. Returns `true` when any stored
    /// value actually changed.
    pub fn apply(&mut self, patch: &UserPatch) -> bool {
        let mut changed = false;
        if let Some(first_name) = &patch.first_name {
            changed |= replace(&mut self.first_name, first_name.clone());
        }
        if let Some(last_name) = &patch.last_name {
            changed |= replace(&mut self.last_name, last_name.clone());
        }
        if let Some(age) = patch.age {
            changed |= replace(&mut self.age, age);
        }
        if let Some(email) = &patch.email {
            changed |= replace(&mut self.email, email.clone());
        }
        changed
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

/// Validated candidate for creation. Carries no id: the collection assigns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub age: i64,
    pub email: String,
    pub national_id: i64,
}

/// Validated partial update. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<i64>,
    pub email: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.age.is_none()
            && self.email.is_none()
    }
}

/// Result of an update: how many documents matched and how many changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
}

impl UpdateOutcome {
    pub fn no_match() -> Self {
        Self {
            acknowledged: true,
            matched_count: 0,
            modified_count: 0,
        }
    }

    pub fn matched(modified: bool) -> Self {
        Self {
            acknowledged: true,
            matched_count: 1,
            modified_count: u64::from(modified),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl DeleteOutcome {
    pub fn deleted(count: u64) -> Self {
        Self {
            acknowledged: true,
            deleted_count: count,
        }
    }
}

/// Row in the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub age: i64,
    pub email: String,
    pub national_id: i64,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: UserId(r.id),
            first_name: r.first_name,
            last_name: r.last_name,
            age: r.age,
            email: r.email,
            national_id: r.national_id,
        }
    }
}
