// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! SQL source of record for products.
//!
//! Reads the catalog's `products` table; the schema is owned elsewhere:
//! ```sql
//! CREATE TABLE products (
//!   id INTEGER PRIMARY KEY,
//!   name VARCHAR(255) NOT NULL,
//!   description TEXT,
//!   price DECIMAL(10,2) NOT NULL,
//!   stock INTEGER NOT NULL DEFAULT 0,
//!   imageUrl VARCHAR(255),
//!   views INTEGER NOT NULL DEFAULT 0,
//!   discount INTEGER NOT NULL DEFAULT 0,
//!   categoryId INTEGER NOT NULL,
//!   createdAt DATETIME NOT NULL,
//!   updatedAt DATETIME NOT NULL
//! )
//! ```
//!
//! ## sqlx Any Driver Quirks
//!
//! The `Any` driver has no DECIMAL or DATETIME mapping, so the SELECT casts
//! price to a double and timestamps to epoch milliseconds. MySQL returns TEXT
//! columns as BLOB through `Any`, so strings are read as `String` first and
//! then as `Vec<u8>`.

use async_trait::async_trait;
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, Row};
use std::sync::Once;
use std::time::Duration;

use super::traits::{ProductSource, StorageError};
use crate::product::ProductRecord;
use crate::resilience::retry::{retry, RetryConfig};

// SQLx `Any` driver requires runtime installation
static INSTALL_DRIVERS: Once = Once::new();

fn install_drivers() {
    INSTALL_DRIVERS.call_once(|| {
        sqlx::any::install_default_drivers();
    });
}

/// SQLite caps bound parameters per statement at 999 on older builds.
const MAX_IDS_PER_QUERY: usize = 900;

pub struct SqlProductSource {
    pool: AnyPool,
    is_sqlite: bool,
}

impl SqlProductSource {
    /// Connect with startup-mode retry (fails fast if config is wrong).
    pub async fn connect(connection_string: &str) -> Result<Self, StorageError> {
        install_drivers();

        let is_sqlite = connection_string.starts_with("sqlite:");

        let pool = retry("sql_connect", &RetryConfig::startup(), || async {
            AnyPoolOptions::new()
                .max_connections(10)
                .acquire_timeout(Duration::from_secs(10))
                .idle_timeout(Duration::from_secs(300))
                .connect(connection_string)
                .await
                .map_err(|e| StorageError::Connection(e.to_string()))
        })
        .await?;

        Ok(Self { pool, is_sqlite })
    }

    /// Get a clone of the connection pool.
    pub fn pool(&self) -> AnyPool {
        self.pool.clone()
    }

    fn select_clause(&self) -> &'static str {
        if self.is_sqlite {
            "SELECT id, name, description, CAST(price AS REAL) AS price, stock, imageUrl, \
             categoryId, views, discount, \
             CAST(strftime('%s', createdAt) AS INTEGER) * 1000 AS created_ms, \
             CAST(strftime('%s', updatedAt) AS INTEGER) * 1000 AS updated_ms \
             FROM products"
        } else {
            "SELECT CAST(id AS SIGNED) AS id, name, description, CAST(price AS DOUBLE) AS price, \
             CAST(stock AS SIGNED) AS stock, imageUrl, CAST(categoryId AS SIGNED) AS categoryId, \
             CAST(views AS SIGNED) AS views, CAST(discount AS SIGNED) AS discount, \
             CAST(UNIX_TIMESTAMP(createdAt) * 1000 AS SIGNED) AS created_ms, \
             CAST(UNIX_TIMESTAMP(updatedAt) * 1000 AS SIGNED) AS updated_ms \
             FROM products"
        }
    }

    fn row_to_record(row: &AnyRow) -> Result<ProductRecord, StorageError> {
        let id: i64 = row
            .try_get("id")
            .map_err(|e| StorageError::Backend(format!("Bad id column: {}", e)))?;
        let name = text_column(row, "name")
            .ok_or_else(|| StorageError::Backend(format!("Product {} has no name", id)))?;
        let price: f64 = row
            .try_get("price")
            .map_err(|e| StorageError::Backend(format!("Product {}: bad price: {}", id, e)))?;

        Ok(ProductRecord {
            id,
            name,
            description: text_column(row, "description"),
            price,
            stock: int_column(row, id, "stock")?,
            image_ref: text_column(row, "imageUrl"),
            category_id: row
                .try_get("categoryId")
                .map_err(|e| StorageError::Backend(format!("Product {}: bad categoryId: {}", id, e)))?,
            views: int_column(row, id, "views")?,
            discount_percent: int_column(row, id, "discount")?,
            created_at: int_column(row, id, "created_ms")?,
            updated_at: int_column(row, id, "updated_ms")?,
        })
    }

    async fn fetch_chunk(&self, ids: &[i64]) -> Result<Vec<ProductRecord>, StorageError> {
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("{} WHERE id IN ({})", self.select_clause(), placeholders);

        retry("sql_fetch_by_ids", &RetryConfig::query(), || async {
            let mut query = sqlx::query(&sql);
            for id in ids {
                query = query.bind(*id);
            }
            let rows = query
                .fetch_all(&self.pool)
                .await
                .map_err(|e| StorageError::Backend(e.to_string()))?;
            rows.iter().map(Self::row_to_record).collect()
        })
        .await
    }
}

/// Integer column where SQL NULL reads as 0. Any other decode failure is an error.
fn int_column(row: &AnyRow, id: i64, column: &str) -> Result<i64, StorageError> {
    row.try_get::<Option<i64>, _>(column)
        .map(Option::unwrap_or_default)
        .map_err(|e| StorageError::Backend(format!("Product {}: bad {}: {}", id, column, e)))
}

/// Try reading as String first (SQLite TEXT), then as bytes (MySQL TEXT via Any).
fn text_column(row: &AnyRow, column: &str) -> Option<String> {
    row.try_get::<Option<String>, _>(column)
        .ok()
        .flatten()
        .or_else(|| {
            row.try_get::<Option<Vec<u8>>, _>(column)
                .ok()
                .flatten()
                .and_then(|bytes| String::from_utf8(bytes).ok())
        })
}

#[async_trait]
impl ProductSource for SqlProductSource {
    async fn fetch_all(&self) -> Result<Vec<ProductRecord>, StorageError> {
        let sql = format!("{} ORDER BY id", self.select_clause());

        retry("sql_fetch_all", &RetryConfig::query(), || async {
            let rows = sqlx::query(&sql)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| StorageError::Backend(e.to_string()))?;
            rows.iter().map(Self::row_to_record).collect()
        })
        .await
    }

    async fn fetch_by_ids(&self, ids: &[i64]) -> Result<Vec<ProductRecord>, StorageError> {
        let mut records = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(MAX_IDS_PER_QUERY) {
            records.extend(self.fetch_chunk(chunk).await?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_db_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("catalog_search_test_{}_{}.db", name, std::process::id()))
    }

    fn cleanup_db(path: &PathBuf) {
        let _ = std::fs::remove_file(path);
        let _ = std::fs::remove_file(format!("{}-wal", path.display()));
        let _ = std::fs::remove_file(format!("{}-shm", path.display()));
    }

    async fn seeded_source(name: &str) -> (SqlProductSource, PathBuf) {
        let path = temp_db_path(name);
        cleanup_db(&path);
        let url = format!("sqlite://{}?mode=rwc", path.display());
        let source = SqlProductSource::connect(&url).await.unwrap();

        sqlx::query(
            "CREATE TABLE products (
                id INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                description TEXT,
                price DECIMAL(10,2) NOT NULL,
                stock INTEGER NOT NULL DEFAULT 0,
                imageUrl VARCHAR(255),
                views INTEGER NOT NULL DEFAULT 0,
                discount INTEGER NOT NULL DEFAULT 0,
                categoryId INTEGER NOT NULL,
                createdAt DATETIME NOT NULL,
                updatedAt DATETIME NOT NULL
            )",
        )
        .execute(&source.pool)
        .await
        .unwrap();

        // Timestamps in the format the catalog's ORM writes
        sqlx::query(
            "INSERT INTO products VALUES
                (1, 'Dell XPS 15', 'Laptop Windows cao cấp', 42990000, 25, 'https://img/1.jpg', 1500, 5, 2,
                 '2024-01-01 00:00:00.000 +00:00', '2024-01-02 00:00:00.000 +00:00'),
                (2, 'Cáp sạc USB-C 2m', NULL, 490000.5, 300, NULL, 620, 0, 4,
                 '2024-01-01 00:01:00.000 +00:00', '2024-01-01 00:01:00.000 +00:00'),
                (3, 'AirPods Pro 2', 'Tai nghe', 6490000, 100, NULL, 3200, 12, 3,
                 '2024-01-01 00:02:00.000 +00:00', '2024-01-01 00:02:00.000 +00:00')",
        )
        .execute(&source.pool)
        .await
        .unwrap();

        (source, path)
    }

    #[tokio::test]
    async fn test_fetch_all_maps_columns() {
        let (source, path) = seeded_source("fetch_all").await;

        let all = source.fetch_all().await.unwrap();
        assert_eq!(all.len(), 3);

        let dell = &all[0];
        assert_eq!(dell.id, 1);
        assert_eq!(dell.name, "Dell XPS 15");
        assert_eq!(dell.price, 42_990_000.0);
        assert_eq!(dell.image_ref.as_deref(), Some("https://img/1.jpg"));
        assert_eq!(dell.category_id, 2);
        assert_eq!(dell.discount_percent, 5);
        assert_eq!(dell.created_at, 1_704_067_200_000);
        assert_eq!(dell.updated_at, 1_704_153_600_000);

        let cable = &all[1];
        assert_eq!(cable.description, None);
        assert_eq!(cable.image_ref, None);
        assert_eq!(cable.price, 490_000.5);
        assert_eq!(cable.created_at, 1_704_067_260_000);

        cleanup_db(&path);
    }

    #[tokio::test]
    async fn test_fetch_by_ids_skips_unknown() {
        let (source, path) = seeded_source("by_ids").await;

        let mut rows = source.fetch_by_ids(&[3, 42, 1]).await.unwrap();
        rows.sort_by_key(|r| r.id);
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 3]);

        assert!(source.fetch_one(42).await.unwrap().is_none());
        assert_eq!(source.fetch_one(3).await.unwrap().unwrap().views, 3200);

        cleanup_db(&path);
    }

    #[tokio::test]
    async fn test_unparsable_timestamp_reads_as_zero() {
        let (source, path) = seeded_source("null_ts").await;
        sqlx::query("UPDATE products SET createdAt = 'unknown' WHERE id = 2")
            .execute(&source.pool)
            .await
            .unwrap();

        let cable = source.fetch_one(2).await.unwrap().unwrap();
        assert_eq!(cable.created_at, 0);
        assert_eq!(cable.updated_at, 1_704_067_260_000);

        cleanup_db(&path);
    }

    #[tokio::test]
    async fn test_mistyped_integer_column_is_error() {
        let (source, path) = seeded_source("bad_views").await;
        sqlx::query("UPDATE products SET views = 'lots' WHERE id = 3")
            .execute(&source.pool)
            .await
            .unwrap();

        let err = source.fetch_all().await.unwrap_err();
        assert!(matches!(err, StorageError::Backend(_)));
        assert_eq!(source.fetch_by_ids(&[1, 2]).await.unwrap().len(), 2);

        cleanup_db(&path);
    }

    #[tokio::test]
    async fn test_missing_table_is_error() {
        let path = temp_db_path("missing_table");
        cleanup_db(&path);
        let url = format!("sqlite://{}?mode=rwc", path.display());
        let source = SqlProductSource::connect(&url).await.unwrap();

        assert!(source.fetch_all().await.is_err());

        cleanup_db(&path);
    }
}
