use crate::domain::record::User;
use crate::storage::{NewUser, UserStore};
use anyhow::Context;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: sqlx::PgPool,
}

impl PgUserStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

type UserRow = (uuid::Uuid, String, String, Option<String>, bool, DateTime<Utc>);

fn user_from_row(row: UserRow) -> User {
    let (id, username, password_hash, email, is_active, created_at) = row;
    User {
        id,
        username,
        password_hash,
        email,
        is_active,
        created_at,
    }
}

#[async_trait::async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> anyhow::Result<User> {
        let row: UserRow = sqlx::query_as(
            "INSERT INTO users (id, username, password_hash, email, is_active, created_at) \
             VALUES ($1, $2, $3, $4, TRUE, now()) \
             RETURNING id, username, password_hash, email, is_active, created_at",
        )
        .bind(uuid::Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.email)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("insert users failed (username '{}' may exist)", user.username))?;

        Ok(user_from_row(row))
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, password_hash, email, is_active, created_at \
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("select user failed")?;

        Ok(row.map(user_from_row))
    }

    async fn list(&self) -> anyhow::Result<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT id, username, password_hash, email, is_active, created_at \
             FROM users ORDER BY username",
        )
        .fetch_all(&self.pool)
        .await
        .context("select users failed")?;

        Ok(rows.into_iter().map(user_from_row).collect())
    }

    async fn set_password(&self, username: &str, password_hash: &str) -> anyhow::Result<bool> {
        let res = sqlx::query("UPDATE users SET password_hash = $2 WHERE username = $1")
            .bind(username)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .context("update users failed")?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete(&self, username: &str) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(username)
            .execute(&self.pool)
            .await
            .context("delete user failed")?;
        Ok(res.rows_affected() > 0)
    }
}
