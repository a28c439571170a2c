//! In-process repositories used by the test suite in place of Postgres.

use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::{
    repo::{CreateUserError, SessionRepo, UserRepo},
    repo_types::{SessionRow, User},
};

#[derive(Default)]
pub struct MemoryUserRepo {
    users: Mutex<Vec<User>>,
}

impl MemoryUserRepo {
    pub fn count(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, CreateUserError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == email) {
            return Err(CreateUserError::EmailTaken);
        }
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }
}

#[derive(Default)]
pub struct MemorySessionRepo {
    sessions: Mutex<HashMap<Vec<u8>, SessionRow>>,
}

impl MemorySessionRepo {
    pub fn count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn contains(&self, token_hash: &[u8]) -> bool {
        self.sessions.lock().unwrap().contains_key(token_hash)
    }
}

#[async_trait]
impl SessionRepo for MemorySessionRepo {
    async fn insert(&self, session: &SessionRow) -> anyhow::Result<()> {
        let mut sessions = self.sessions.lock().unwrap();
        if sessions.contains_key(&session.token_hash) {
            anyhow::bail!("duplicate session token");
        }
        sessions.insert(session.token_hash.clone(), session.clone());
        Ok(())
    }

    async fn lookup(&self, token_hash: &[u8]) -> anyhow::Result<Option<Uuid>> {
        let now = OffsetDateTime::now_utc();
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions
            .get(token_hash)
            .filter(|s| s.expires_at > now)
            .map(|s| s.user_id))
    }

    async fn delete(&self, token_hash: &[u8]) -> anyhow::Result<()> {
        self.sessions.lock().unwrap().remove(token_hash);
        Ok(())
    }

    async fn purge_expired(&self) -> anyhow::Result<u64> {
        let now = OffsetDateTime::now_utc();
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);
        Ok((before - sessions.len()) as u64)
    }
}
