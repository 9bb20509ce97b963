//! Persistence across store restarts, backed by the JSON file store.

use std::sync::Arc;

use rust_decimal::Decimal;
use testresult::TestResult;

use range_cart::prelude::*;

async fn open(path: &std::path::Path) -> TestResult<(CartStore, Arc<Persister>)> {
    let storage = JsonFileStore::open(path).await?;

    Ok(CartStore::open(Arc::new(storage), CART_STORAGE_KEY).await)
}

#[tokio::test]
async fn cart_survives_restart() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("storage.json");

    let (mut store, persister) = open(&path).await?;
    store.add_item(
        CartItem::product("product-1", "Targets", Decimal::new(1250, 2))
            .with_discount(Decimal::from(20))
            .with_quantity(2),
    )?;
    store.add_item(
        CartItem::service("service-2-1-0", "Instructor", Decimal::from(600))
            .with_duration(60)
            .with_master("Ivan")
            .with_schedule("2026-10-20T10:00:00Z"),
    )?;
    let status = persister.flush().await;
    assert!(status.last_error.is_none(), "write failed: {:?}", status.last_error);
    let before = store.cart().clone();
    drop(store);

    let (restored, _persister) = open(&path).await?;

    assert_eq!(restored.cart(), &before);
    assert_eq!(restored.total(), Decimal::from(620));

    Ok(())
}

#[tokio::test]
async fn cleared_cart_is_persisted() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("storage.json");

    let (mut store, persister) = open(&path).await?;
    store.add_item(CartItem::product("product-1", "Targets", Decimal::ONE))?;
    store.clear_cart();
    persister.flush().await;
    drop(store);

    let (restored, _persister) = open(&path).await?;

    assert!(restored.items().is_empty());

    Ok(())
}

#[tokio::test]
async fn corrupt_snapshot_starts_empty_and_is_overwritten() -> TestResult {
    let storage = Arc::new(MemoryStore::with_entries([(CART_STORAGE_KEY, "[{\"id\":")]));

    let (mut store, persister) =
        CartStore::open(Arc::clone(&storage) as Arc<dyn KeyValueStore>, CART_STORAGE_KEY).await;
    assert!(store.items().is_empty());

    store.add_item(CartItem::product("product-1", "Targets", Decimal::ONE))?;
    persister.flush().await;

    let stored = storage.get(CART_STORAGE_KEY).await?.ok_or("nothing stored")?;
    assert_eq!(range_cart::snapshot::decode(&stored)?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn api_url_override_survives_restart() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("storage.json");

    let mut config = ApiConfig::new(Arc::new(JsonFileStore::open(&path).await?), "http://localhost:8001");
    config.initialize().await;
    config.set_api_url("https://range.example").await?;

    let mut reopened =
        ApiConfig::new(Arc::new(JsonFileStore::open(&path).await?), "http://localhost:8001");
    reopened.initialize().await;

    assert_eq!(reopened.api_url(), "https://range.example");

    Ok(())
}
