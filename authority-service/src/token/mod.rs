//! Token lifecycle: C1 (generator) + C2 (store) + C3 (manager).

pub mod generator;
pub mod manager;
pub mod model;
pub mod store;

pub use generator::{AccessClaims, SignedAccessGenerator};
pub use manager::{TokenManager, TokenManagerConfig};
pub use model::GrantEnvelope;
pub use store::{RedisTokenStore, TokenStore};
