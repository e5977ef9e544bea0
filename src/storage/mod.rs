//! Storage backends.
//!
//! - [`traits`]: `SearchBackend` (the index) and `ProductSource` (the catalog)
//! - [`redis`]: RediSearch over RedisJSON documents
//! - [`sql`]: catalog `products` table through sqlx
//! - [`memory`]: in-process implementations of both traits

pub mod memory;
pub mod redis;
pub mod sql;
pub mod traits;
