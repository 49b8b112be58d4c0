use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::users::repo_types::{
    DeleteOutcome, NewUser, UpdateOutcome, User, UserId, UserPatch, UserRow,
};

/// Document collection holding user records.
///
/// Implementations assign ids on insert and own their own concurrency control.
/// Any error they return is a storage failure.
#[async_trait]
pub trait UserCollection: Send + Sync {
    async fn insert_one(&self, user: NewUser) -> anyhow::Result<User>;
    async fn find_all(&self) -> anyhow::Result<Vec<User>>;
    async fn find_by_id(&self, id: UserId) -> anyhow::Result<Option<User>>;
    async fn update_by_id(&self, id: UserId, patch: &UserPatch) -> anyhow::Result<UpdateOutcome>;
    async fn delete_by_id(&self, id: UserId) -> anyhow::Result<DeleteOutcome>;
}

#[derive(Clone)]
pub struct PgUserCollection {
    db: PgPool,
}

impl PgUserCollection {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserCollection for PgUserCollection {
    async fn insert_one(&self, user: NewUser) -> anyhow::Result<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, first_name, last_name, age, email, national_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, first_name, last_name, age, email, national_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.age)
        .bind(&user.email)
        .bind(user.national_id)
        .fetch_one(&self.db)
        .await
        .context("insert user")?;
        Ok(row.into())
    }

    async fn find_all(&self) -> anyhow::Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, first_name, last_name, age, email, national_id
              FROM users
             ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list users")?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn find_by_id(&self, id: UserId) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, first_name, last_name, age, email, national_id
              FROM users
             WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(row.map(User::from))
    }

    async fn update_by_id(&self, id: UserId, patch: &UserPatch) -> anyhow::Result<UpdateOutcome> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        let current = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, first_name, last_name, age, email, national_id
              FROM users
             WHERE id = $1
               FOR UPDATE
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .context("lock user for update")?;

        let Some(row) = current else {
            return Ok(UpdateOutcome::no_match());
        };

        let mut user = User::from(row);
        if !user.apply(patch) {
            return Ok(UpdateOutcome::matched(false));
        }

        sqlx::query(
            r#"
            UPDATE users
               SET first_name = $2, last_name = $3, age = $4, email = $5
             WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.age)
        .bind(&user.email)
        .execute(&mut *tx)
        .await
        .context("update user")?;

        tx.commit().await.context("commit tx")?;
        Ok(UpdateOutcome::matched(true))
    }

    async fn delete_by_id(&self, id: UserId) -> anyhow::Result<DeleteOutcome> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.db)
            .await
            .context("delete user")?;
        Ok(DeleteOutcome::deleted(res.rows_affected()))
    }
}

#[cfg(test)]
mod pg_tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    /// `None` when no database is configured; these tests then do nothing.
    async fn collection() -> Option<PgUserCollection> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let db = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .expect("connect to DATABASE_URL");
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .expect("run migrations");
        Some(PgUserCollection::new(db))
    }

    fn new_user(first_name: &str) -> NewUser {
        NewUser {
            first_name: first_name.into(),
            last_name: "Ruiz".into(),
            age: 30,
            email: format!("{}@x.com", first_name.to_lowercase()),
            national_id: 12345678,
        }
    }

    #[tokio::test]
    async fn update_without_change_writes_nothing() {
        let Some(users) = collection().await else {
            return;
        };
        let ana = users.insert_one(new_user("Ana")).await.unwrap();

        let same = UserPatch {
            first_name: Some("Ana".into()),
            age: Some(30),
            ..Default::default()
        };
        assert_eq!(users.update_by_id(ana.id, &same).await.unwrap(), UpdateOutcome::matched(false));

        let older = UserPatch {
            age: Some(31),
            ..Default::default()
        };
        assert_eq!(users.update_by_id(ana.id, &older).await.unwrap(), UpdateOutcome::matched(true));
        let stored = users.find_by_id(ana.id).await.unwrap().unwrap();
        assert_eq!(stored, User { age: 31, ..ana.clone() });

        assert_eq!(
            users.update_by_id(UserId::new(), &older).await.unwrap(),
            UpdateOutcome::no_match()
        );
        assert_eq!(users.delete_by_id(ana.id).await.unwrap().deleted_count, 1);
        assert_eq!(users.delete_by_id(ana.id).await.unwrap().deleted_count, 0);
    }

    #[tokio::test]
    async fn find_all_returns_insertion_order() {
        let Some(users) = collection().await else {
            return;
        };
        let mut ids = Vec::new();
        for name in ["Ana", "Bea", "Carla"] {
            ids.push(users.insert_one(new_user(name)).await.unwrap().id);
        }

        // Other tests may share the table; only the relative order of ours matters.
        let listed: Vec<UserId> = users
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.id)
            .filter(|id| ids.contains(id))
            .collect();
        assert_eq!(listed, ids);

        for id in ids {
            users.delete_by_id(id).await.unwrap();
        }
    }
}
