//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_permission_cache;
mod postgres_access_store;
mod redis_permission_cache;

pub use in_memory_permission_cache::InMemoryPermissionCache;
pub use postgres_access_store::PostgresAccessStore;
pub use redis_permission_cache::RedisPermissionCache;
