use shared::{
    domain::{User, UserId},
    error::{InventoryError, InventoryResult},
};
use storage::KvStore;
use tracing::{info, warn};

use crate::now_millis;

/// Registered users, persisted as one JSON array under a single key.
pub struct UserDirectory<S> {
    store: S,
    key: String,
}

impl<S: KvStore> UserDirectory<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Absent or unreadable data yields an empty directory.
    pub async fn list_users(&self) -> InventoryResult<Vec<User>> {
        let Some(raw) = self.store.get(&self.key).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Option<Vec<User>>>(&raw) {
            Ok(users) => Ok(users.unwrap_or_default()),
            Err(err) => {
                warn!(key = %self.key, error = %err, "discarding unreadable user directory");
                Ok(Vec::new())
            }
        }
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> InventoryResult<User> {
        let mut users = self.list_users().await?;
        if users.iter().any(|u| u.email == email) {
            return Err(InventoryError::AlreadyExists {
                email: email.to_string(),
            });
        }

        let user = User {
            id: UserId(now_millis()),
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        users.push(user.clone());
        self.save(&users).await?;
        info!(user_id = user.id.0, email = %user.email, "registered user");
        Ok(user)
    }

    /// Exact, case-sensitive match on both email and password.
    pub async fn find_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> InventoryResult<Option<User>> {
        Ok(self
            .list_users()
            .await?
            .into_iter()
            .find(|u| u.email == email && u.password == password))
    }

    async fn save(&self, users: &[User]) -> InventoryResult<()> {
        let raw = serde_json::to_string(users)
            .map_err(|err| InventoryError::Storage(anyhow::Error::new(err)))?;
        self.store.set(&self.key, &raw).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/users_tests.rs"]
mod tests;
