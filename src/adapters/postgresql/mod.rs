//! PostgreSQL record store
//!
//! - [`client`] - Connection pool with TLS and statement timeouts
//! - [`store`] - [`RecordStore`](crate::adapters::store::RecordStore) over the register tables

pub mod client;
pub mod store;

pub use client::PostgreSQLClient;
pub use store::PostgresStore;
