//! Infrastructure layer: store adapters, schema, store configuration, seeding.

pub mod config;
pub mod seed;
pub mod store;


pub use config::{ConfigError, StoreBackend, StoreConfig};
pub use store::{AccessStores, InMemoryAccessStore, PostgresAccessStore};
