use shared::{
    domain::{PageKind, RedirectTarget, User},
    error::{InventoryError, InventoryResult},
};
use storage::KvStore;
use tracing::{info, warn};

use crate::{users::UserDirectory, StorageKeys};

/// Routing decision for a page load.
pub fn guard_route(page: PageKind, session: Option<&User>) -> Option<RedirectTarget> {
    match (page, session) {
        (PageKind::Protected, None) => Some(RedirectTarget::AnonymousLanding),
        (PageKind::Anonymous, Some(_)) => Some(RedirectTarget::Dashboard),
        _ => None,
    }
}

/// Sign-in state: the user directory plus the single current-session slot.
pub struct SessionGate<S> {
    store: S,
    key: String,
    directory: UserDirectory<S>,
}

impl<S: KvStore + Clone> SessionGate<S> {
    pub fn new(store: S, keys: &StorageKeys) -> Self {
        Self {
            directory: UserDirectory::new(store.clone(), keys.users.clone()),
            store,
            key: keys.session.clone(),
        }
    }
}

impl<S: KvStore> SessionGate<S> {
    pub fn directory(&self) -> &UserDirectory<S> {
        &self.directory
    }

    pub async fn login(&self, email: &str, password: &str) -> InventoryResult<User> {
        let Some(user) = self.directory.find_by_credentials(email, password).await? else {
            info!(email = %email, "rejected login");
            return Err(InventoryError::InvalidCredentials);
        };

        let raw = serde_json::to_string(&user)
            .map_err(|err| InventoryError::Storage(anyhow::Error::new(err)))?;
        self.store.set(&self.key, &raw).await?;
        info!(user_id = user.id.0, "session started");
        Ok(user)
    }

    /// An unreadable session slot counts as signed out.
    pub async fn current_session(&self) -> InventoryResult<Option<User>> {
        let Some(raw) = self.store.get(&self.key).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<Option<User>>(&raw) {
            Ok(user) => Ok(user),
            Err(err) => {
                warn!(key = %self.key, error = %err, "ignoring unreadable session");
                Ok(None)
            }
        }
    }

    pub async fn logout(&self) -> InventoryResult<()> {
        self.store.remove(&self.key).await?;
        info!("session cleared");
        Ok(())
    }

    pub async fn guard_route(&self, page: PageKind) -> InventoryResult<Option<RedirectTarget>> {
        let session = self.current_session().await?;
        Ok(guard_route(page, session.as_ref()))
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
