//! Process-local stores for tests and single-user CLI runs.

use crate::domain::record::{AnalysisRecord, AnalysisSummary, User};
use crate::storage::{HistoryStore, NewUser, UserStore};
use std::sync::{Mutex, MutexGuard};

fn lock<T>(m: &Mutex<T>) -> anyhow::Result<MutexGuard<'_, T>> {
    m.lock().map_err(|_| anyhow::anyhow!("in-memory store lock poisoned"))
}

#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    records: Mutex<Vec<AnalysisRecord>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn save(&self, record: &AnalysisRecord) -> anyhow::Result<()> {
        let mut records = lock(&self.records)?;
        anyhow::ensure!(
            records.iter().all(|r| r.id != record.id),
            "analysis {} already stored",
            record.id
        );
        records.push(record.clone());
        Ok(())
    }

    async fn list(&self, user_id: uuid::Uuid) -> anyhow::Result<Vec<AnalysisSummary>> {
        let records = lock(&self.records)?;
        let mut out: Vec<AnalysisSummary> = records
            .iter()
            .rev()
            .filter(|r| r.user_id == Some(user_id))
            .map(AnalysisSummary::from)
            .collect();
        out.sort_by(|a, b| b.analysis_datetime.cmp(&a.analysis_datetime));
        Ok(out)
    }

    async fn get(&self, id: uuid::Uuid) -> anyhow::Result<Option<AnalysisRecord>> {
        Ok(lock(&self.records)?.iter().find(|r| r.id == id).cloned())
    }

    async fn delete(&self, id: uuid::Uuid, user_id: uuid::Uuid) -> anyhow::Result<bool> {
        let mut records = lock(&self.records)?;
        let before = records.len();
        records.retain(|r| !(r.id == id && r.user_id == Some(user_id)));
        Ok(records.len() < before)
    }
}

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test hook for inactive accounts, which have no management operation of their own.
    pub fn set_active(&self, username: &str, active: bool) -> anyhow::Result<bool> {
        let mut users = lock(&self.users)?;
        Ok(match users.iter_mut().find(|u| u.username == username) {
            Some(u) => {
                u.is_active = active;
                true
            }
            None => false,
        })
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: NewUser) -> anyhow::Result<User> {
        let mut users = lock(&self.users)?;
        anyhow::ensure!(
            users.iter().all(|u| u.username != user.username),
            "username '{}' already exists",
            user.username
        );
        let created = User {
            id: uuid::Uuid::new_v4(),
            username: user.username,
            password_hash: user.password_hash,
            email: user.email,
            is_active: true,
            created_at: chrono::Utc::now(),
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        Ok(lock(&self.users)?
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list(&self) -> anyhow::Result<Vec<User>> {
        let mut users = lock(&self.users)?.clone();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn set_password(&self, username: &str, password_hash: &str) -> anyhow::Result<bool> {
        let mut users = lock(&self.users)?;
        Ok(match users.iter_mut().find(|u| u.username == username) {
            Some(u) => {
                u.password_hash = password_hash.to_string();
                true
            }
            None => false,
        })
    }

    async fn delete(&self, username: &str) -> anyhow::Result<bool> {
        let mut users = lock(&self.users)?;
        let before = users.len();
        users.retain(|u| u.username != username);
        Ok(users.len() < before)
    }
}
