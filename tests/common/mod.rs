//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use catalog_search::storage::memory::{InMemoryCatalog, InMemorySearchIndex};
use catalog_search::storage::sql::SqlProductSource;
use catalog_search::{CatalogSearch, CatalogSearchConfig, ProductRecord};

pub const BASE_TS: i64 = 1_704_067_200_000;

/// Ten products across phones (1), laptops (2), audio (3) and accessories (4).
pub fn seed_products() -> Vec<ProductRecord> {
    let rows: [(&str, &str, f64, i64, i64, i64, i64); 10] = [
        ("iPhone 15 Pro Max", "Flagship iPhone mới nhất với chip A17 Pro", 29_990_000.0, 50, 1250, 10, 1),
        ("Samsung Galaxy S24 Ultra", "Smartphone Android cao cấp với S Pen", 27_990_000.0, 40, 980, 15, 1),
        ("Xiaomi 14 Pro", "Smartphone chất lượng giá tốt", 15_990_000.0, 60, 750, 20, 1),
        ("MacBook Pro 16 M3", "Laptop chuyên nghiệp cho developer", 55_990_000.0, 20, 2100, 0, 2),
        ("Dell XPS 15", "Laptop Windows cao cấp", 42_990_000.0, 25, 1500, 5, 2),
        ("ThinkPad X1 Carbon", "Laptop doanh nhân nhẹ bền", 38_990_000.0, 30, 890, 0, 2),
        ("AirPods Pro 2", "Tai nghe không dây chống ồn từ Apple", 6_490_000.0, 100, 3200, 12, 3),
        ("Sony WH-1000XM5", "Tai nghe over-ear chống ồn tốt nhất", 8_990_000.0, 80, 2800, 8, 3),
        ("Ốp lưng iPhone 15", "Ốp lưng silicone chính hãng Apple", 1_290_000.0, 200, 450, 0, 4),
        ("Cáp sạc USB-C 2m", "Cáp sạc nhanh USB-C to USB-C", 490_000.0, 300, 620, 0, 4),
    ];

    rows.iter()
        .zip(1i64..)
        .map(|(&(name, description, price, stock, views, discount, category_id), id)| ProductRecord {
            id,
            name: name.to_string(),
            description: Some(description.to_string()),
            price,
            stock,
            image_ref: Some(format!("https://cdn.example.com/products/{id}.jpg")),
            category_id,
            views,
            discount_percent: discount,
            created_at: BASE_TS + id * 60_000,
            updated_at: BASE_TS + id * 60_000,
        })
        .collect()
}

/// In-memory service over `records`, index created but empty.
pub async fn memory_search(
    records: Vec<ProductRecord>,
) -> (CatalogSearch, Arc<InMemorySearchIndex>, Arc<InMemoryCatalog>) {
    let backend = Arc::new(InMemorySearchIndex::new());
    let catalog = Arc::new(records.into_iter().collect::<InMemoryCatalog>());
    let search = CatalogSearch::new(CatalogSearchConfig::default(), backend.clone(), catalog.clone());
    search.ensure_index().await.expect("memory index");
    (search, backend, catalog)
}

pub fn ids(records: &[ProductRecord]) -> Vec<i64> {
    records.iter().map(|r| r.id).collect()
}

pub fn temp_db_path(name: &str) -> PathBuf {
    let _ = std::fs::create_dir_all("./temp");
    PathBuf::from(format!("./temp/catalog_{}_{}.db", name, uuid::Uuid::new_v4()))
}

/// Clean up the database file and its journal files (-shm, -wal)
pub fn cleanup_db(path: &PathBuf) {
    let _ = std::fs::remove_file(path);
    let _ = std::fs::remove_file(format!("{}-shm", path.display()));
    let _ = std::fs::remove_file(format!("{}-wal", path.display()));
}

/// SQLite catalog holding `records`, laid out like the shop's `products` table.
pub async fn sqlite_catalog(path: &PathBuf, records: &[ProductRecord]) -> SqlProductSource {
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let source = SqlProductSource::connect(&url).await.expect("sqlite connect");
    let pool = source.pool();

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
    .execute(&pool)
    .await
    .expect("create products");

    for r in records {
        sqlx::query(
            "INSERT INTO products VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, \
             datetime(? / 1000, 'unixepoch'), datetime(? / 1000, 'unixepoch'))",
        )
        .bind(r.id)
        .bind(r.name.clone())
        .bind(r.description.clone())
        .bind(r.price)
        .bind(r.stock)
        .bind(r.image_ref.clone())
        .bind(r.views)
        .bind(r.discount_percent)
        .bind(r.category_id)
        .bind(r.created_at)
        .bind(r.updated_at)
        .execute(&pool)
        .await
        .expect("insert product");
    }

    source
}

pub async fn delete_product(source: &SqlProductSource, id: i64) {
    sqlx::query("DELETE FROM products WHERE id = ?")
        .bind(id)
        .execute(&source.pool())
        .await
        .expect("delete product");
}
