pub mod auth_service;
pub mod auth_service_impl;
pub mod clock;
pub mod password;
pub mod vault_service;
pub mod vault_service_impl;

pub use auth_service::{AuthContext, AuthError, AuthService, RegisterOutcome};
pub use auth_service_impl::StoreAuthService;
pub use clock::{Clock, ManualClock, SystemClock};
pub use vault_service::{StoredData, VaultError, VaultService};
pub use vault_service_impl::StoreVaultService;
