pub mod analyses;
pub mod memory;
pub mod users;

use crate::domain::record::{AnalysisRecord, AnalysisSummary, User};
use anyhow::Context;

pub use analyses::PgHistoryStore;
pub use memory::{MemoryHistoryStore, MemoryUserStore};
pub use users::PgUserStore;

pub async fn migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("sqlx migrations failed")?;
    Ok(())
}

pub async fn connect(database_url: &str) -> anyhow::Result<sqlx::PgPool> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")
}

/// Past analyses, keyed by record id and owned by a user.
#[async_trait::async_trait]
pub trait HistoryStore: Send + Sync {
    async fn save(&self, record: &AnalysisRecord) -> anyhow::Result<()>;

    /// Newest first.
    async fn list(&self, user_id: uuid::Uuid) -> anyhow::Result<Vec<AnalysisSummary>>;

    async fn get(&self, id: uuid::Uuid) -> anyhow::Result<Option<AnalysisRecord>>;

    /// Returns false when no record with that id belongs to the user.
    async fn delete(&self, id: uuid::Uuid, user_id: uuid::Uuid) -> anyhow::Result<bool>;
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
}

#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Fails when the username is taken.
    async fn create(&self, user: NewUser) -> anyhow::Result<User>;

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;

    async fn list(&self) -> anyhow::Result<Vec<User>>;

    async fn set_password(&self, username: &str, password_hash: &str) -> anyhow::Result<bool>;

    async fn delete(&self, username: &str) -> anyhow::Result<bool>;
}
