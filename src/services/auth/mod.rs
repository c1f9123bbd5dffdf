pub mod factory;
pub mod identity;
pub mod identity_store;
pub mod password;
pub mod signing_key;
pub mod token_service;

pub use factory::build_token_service;
pub use identity::{Capability, Identity};
#[cfg(test)]
pub use identity_store::MemoryIdentityStore;
pub use identity_store::{IdentityStore, PgIdentityStore};
pub use token_service::{IssuedToken, TokenError, TokenService};
