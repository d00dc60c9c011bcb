//! Inventory management core: a user directory and session gate for sign-in,
//! a product store with search, sort, totals and JSON import/export, and an
//! intent handler that a view layer drives one user action at a time.
//!
//! All state is mirrored into a [`storage::KvStore`] under three keys (see
//! [`StorageKeys`]).

pub mod dashboard;
pub mod ids;
pub mod money;
pub mod products;
pub mod session;
pub mod users;

pub use dashboard::{AlwaysConfirm, Confirm, Dashboard, ADD_LABEL, EXPORT_FILE_NAME, UPDATE_LABEL};
pub use ids::IdGenerator;
pub use money::{Grouping, MoneyFormat};
pub use products::ProductStore;
pub use session::{guard_route, SessionGate};
pub use users::UserDirectory;

pub const DEFAULT_USERS_KEY: &str = "inventory_users";
pub const DEFAULT_SESSION_KEY: &str = "inventory_session";
pub const DEFAULT_PRODUCTS_KEY: &str = "products_db_v1";

/// Names of the three persisted slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub users: String,
    pub session: String,
    pub products: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            users: DEFAULT_USERS_KEY.into(),
            session: DEFAULT_SESSION_KEY.into(),
            products: DEFAULT_PRODUCTS_KEY.into(),
        }
    }
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
