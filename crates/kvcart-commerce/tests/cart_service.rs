//! Cart service behavior over a real cache manager.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kvcart_cache::{CacheManager, MemoryStore, Store, StoreError, StoreResult};
use kvcart_commerce::prelude::*;

const CART_ID: &str = "test-cart-id";

/// Memory store that counts writes and can be switched off.
#[derive(Default)]
struct RecordingStore {
    inner: MemoryStore,
    writes: AtomicUsize,
    down: AtomicBool,
}

impl RecordingStore {
    fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self, op: &'static str) -> StoreResult<()> {
        if self.down.load(Ordering::SeqCst) {
            Err(StoreError::command(op, "connection refused"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Store for RecordingStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.check("GET")?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String, expire: Option<Duration>) -> StoreResult<()> {
        self.check("SET")?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value, expire).await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.check("DEL")?;
        self.inner.delete(key).await
    }

    async fn hash_get_all(&self, key: &str) -> StoreResult<HashMap<String, String>> {
        self.check("HGETALL")?;
        self.inner.hash_get_all(key).await
    }

    async fn hash_set_many(&self, key: &str, fields: &HashMap<String, String>) -> StoreResult<()> {
        self.check("HSET")?;
        self.inner.hash_set_many(key, fields).await
    }

    async fn get_delete(&self, key: &str) -> StoreResult<Option<String>> {
        self.check("GETDEL")?;
        self.inner.get_delete(key).await
    }
}

fn setup() -> (Arc<RecordingStore>, CartService) {
    let store = Arc::new(RecordingStore::default());
    let cache = Arc::new(CacheManager::new(store.clone()));
    (store, CartService::new(cache, CART_ID))
}

fn item(id: &str, quantity: u32, price: f64) -> CartItem {
    CartItem::new(id, format!("Item {id}"), price, quantity).unwrap()
}

fn ids(cart: &Cart) -> Vec<&str> {
    cart.items.iter().map(|i| i.id.as_str()).collect()
}

async fn seed(service: &CartService, items: &[(&str, u32, f64)]) {
    let mut cart = Cart::new(CART_ID);
    for (id, qty, price) in items {
        cart.add_item(item(id, *qty, *price)).unwrap();
    }
    service.save_cart(&cart).await.unwrap();
}

#[tokio::test]
async fn test_get_cart_when_cart_exists() {
    let (store, service) = setup();
    store
        .set(
            CART_ID,
            r#"{"id":"test-cart-id","items":[{"id":"item1","title":"Item 1","quantity":2,"price":10.0}]}"#
                .to_string(),
            None,
        )
        .await
        .unwrap();

    let cart = service.get_cart().await;
    assert_eq!(cart.id.as_str(), CART_ID);
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].id.as_str(), "item1");
}

#[tokio::test]
async fn test_get_cart_when_cart_does_not_exist() {
    let (store, service) = setup();
    let cart = service.get_cart().await;
    assert_eq!(cart.id.as_str(), CART_ID);
    assert!(cart.is_empty());
    // Reading never creates the entry
    assert!(!store.inner.contains_key(CART_ID).await);
}

#[tokio::test]
async fn test_get_cart_degrades_on_backend_failure() {
    let (store, service) = setup();
    seed(&service, &[("item1", 2, 10.0)]).await;

    store.set_down(true);
    let cart = service.get_cart().await;
    assert_eq!(cart.id.as_str(), CART_ID);
    assert!(cart.is_empty());
}

#[tokio::test]
async fn test_get_cart_degrades_on_malformed_record() {
    let (store, service) = setup();
    store.set(CART_ID, "{not json".into(), None).await.unwrap();
    assert!(service.get_cart().await.is_empty());
}

#[tokio::test]
async fn test_stored_cart_with_broken_items_is_normalized_before_saving() {
    let (store, service) = setup();
    store
        .set(
            CART_ID,
            r#"{"id":"test-cart-id","items":[
                {"id":"a","title":"A","price":1.0,"quantity":0},
                {"id":"b","title":"B","price":2.0,"quantity":1},
                {"id":"b","title":"B","price":2.0,"quantity":1}
            ]}"#
            .to_string(),
            None,
        )
        .await
        .unwrap();

    let cart = service.get_cart().await;
    assert_eq!(ids(&cart), ["b"]);
    assert_eq!(cart.items[0].quantity, 2);

    service.add_item(item("b", 1, 2.0)).await.unwrap();

    let raw = store.inner.get(CART_ID).await.unwrap().unwrap();
    let stored: Cart = serde_json::from_str(&raw).unwrap();
    assert_eq!(ids(&stored), ["b"]);
    assert_eq!(stored.items[0].quantity, 3);
}

#[tokio::test]
async fn test_save_cart() {
    let (store, service) = setup();
    let mut cart = Cart::new(CART_ID);
    cart.add_item(item("item1", 2, 10.0)).unwrap();

    service.save_cart(&cart).await.unwrap();
    assert_eq!(store.writes(), 1);

    let raw = store.inner.get(CART_ID).await.unwrap().unwrap();
    let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored, serde_json::to_value(&cart).unwrap());
}

#[tokio::test]
async fn test_save_cart_reports_backend_failure() {
    let (store, service) = setup();
    store.set_down(true);
    let err = service.save_cart(&Cart::new(CART_ID)).await.unwrap_err();
    assert!(matches!(err, CommerceError::Cache(_)));
    assert!(!err.is_validation());
}

#[tokio::test]
async fn test_add_item_new_item() {
    let (store, service) = setup();
    service.add_item(item("item1", 2, 15.0)).await.unwrap();

    let cart = service.get_cart().await;
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].id.as_str(), "item1");
    assert_eq!(cart.items[0].quantity, 2);
    assert_eq!(store.writes(), 1);
}

#[tokio::test]
async fn test_add_item_existing_item_merges() {
    let (_, service) = setup();
    seed(&service, &[("item1", 2, 10.0)]).await;

    service.add_item(item("item1", 3, 10.0)).await.unwrap();

    let cart = service.get_cart().await;
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 5);
}

#[tokio::test]
async fn test_add_invalid_item_writes_nothing() {
    let (store, service) = setup();
    let bad = CartItem {
        id: ItemId::new("item1"),
        title: "Item 1".into(),
        price: 10.0,
        quantity: 0,
        discount: 0.0,
    };
    let err = service.add_item(bad).await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn test_remove_item_existing_item() {
    let (_, service) = setup();
    seed(&service, &[("item1", 2, 10.0), ("item2", 1, 20.0)]).await;

    let cart = service.remove_item(&ItemId::new("item1")).await.unwrap();
    assert_eq!(ids(&cart), ["item2"]);
    assert_eq!(ids(&service.get_cart().await), ["item2"]);
}

#[tokio::test]
async fn test_remove_item_is_idempotent_and_always_saves() {
    let (store, service) = setup();
    seed(&service, &[("item1", 2, 10.0), ("item2", 1, 20.0)]).await;

    let once = service.remove_item(&ItemId::new("item1")).await.unwrap();
    let twice = service.remove_item(&ItemId::new("item1")).await.unwrap();
    assert_eq!(once, twice);
    assert_eq!(ids(&twice), ["item2"]);
    // seed + two removals
    assert_eq!(store.writes(), 3);
}

#[tokio::test]
async fn test_increment_quantity_existing_item() {
    let (_, service) = setup();
    seed(&service, &[("item1", 2, 10.0), ("item2", 1, 20.0)]).await;

    service
        .increment_quantity(&ItemId::new("item1"))
        .await
        .unwrap();

    let cart = service.get_cart().await;
    assert_eq!(cart.items[0].quantity, 3);
    assert_eq!(cart.items[1].quantity, 1);
}

#[tokio::test]
async fn test_increment_quantity_item_not_found() {
    let (store, service) = setup();
    seed(&service, &[("item2", 1, 20.0)]).await;
    let before = service.get_cart().await;

    let after = service
        .increment_quantity(&ItemId::new("item1"))
        .await
        .unwrap();
    assert_eq!(after, before);
    assert_eq!(store.writes(), 2);
}

#[tokio::test]
async fn test_decrement_quantity_existing_item() {
    let (_, service) = setup();
    seed(&service, &[("item1", 2, 10.0), ("item2", 1, 20.0)]).await;

    let cart = service
        .decrement_quantity(&ItemId::new("item1"))
        .await
        .unwrap();
    assert_eq!(cart.items[0].quantity, 1);
    assert_eq!(cart.items.len(), 2);
}

#[tokio::test]
async fn test_decrement_quantity_item_removed() {
    let (_, service) = setup();
    seed(&service, &[("item1", 1, 10.0), ("item2", 1, 20.0)]).await;

    let cart = service
        .decrement_quantity(&ItemId::new("item1"))
        .await
        .unwrap();
    assert_eq!(ids(&cart), ["item2"]);
}

#[tokio::test]
async fn test_decrement_quantity_item_not_found() {
    let (store, service) = setup();
    seed(&service, &[("item2", 1, 20.0)]).await;

    let cart = service
        .decrement_quantity(&ItemId::new("item1"))
        .await
        .unwrap();
    assert_eq!(ids(&cart), ["item2"]);
    assert_eq!(store.writes(), 2);
}

#[tokio::test]
async fn test_apply_overall_discount() {
    let (_, service) = setup();
    seed(&service, &[("item1", 2, 10.0)]).await;

    service.apply_overall_discount(0.25).await.unwrap();
    let cart = service.get_cart().await;
    assert_eq!(cart.overall_discount, 0.25);
    assert_eq!(service.pricing().await.grand_total, 15.0);

    assert!(service.apply_overall_discount(2.0).await.is_err());
    assert_eq!(service.get_cart().await.overall_discount, 0.25);
}

#[tokio::test]
async fn test_clear_cart_overwrites_with_empty_record() {
    let (store, service) = setup();
    seed(&service, &[("item1", 2, 10.0), ("item2", 1, 20.0)]).await;
    service.apply_overall_discount(0.1).await.unwrap();

    service.clear_cart().await.unwrap();

    let cart = service.get_cart().await;
    assert!(cart.is_empty());
    assert_eq!(cart.overall_discount, 0.0);
    assert!(store.inner.contains_key(CART_ID).await);
}

#[tokio::test]
async fn test_clear_cart_on_missing_cart() {
    let (_, service) = setup();
    service.clear_cart().await.unwrap();
    assert!(service.get_cart().await.is_empty());
}

#[tokio::test]
async fn test_add_increment_decrement_scenario() {
    let (_, service) = setup();
    let widget = CartItem::new("item1", "Widget", 10.0, 2).unwrap();
    let item1 = ItemId::new("item1");

    service.add_item(widget).await.unwrap();
    let cart = service.get_cart().await;
    assert_eq!(ids(&cart), ["item1"]);
    assert_eq!(cart.items[0].quantity, 2);

    service.increment_quantity(&item1).await.unwrap();
    assert_eq!(service.get_cart().await.items[0].quantity, 3);

    for _ in 0..3 {
        service.decrement_quantity(&item1).await.unwrap();
    }
    assert!(service.get_cart().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cart_ttl_expires_record() {
    let (store, service) = setup();
    let service = service.with_ttl(Duration::from_secs(60));
    service.add_item(item("item1", 1, 1.0)).await.unwrap();

    tokio::time::advance(Duration::from_secs(61)).await;
    assert!(!store.inner.contains_key(CART_ID).await);
    assert!(service.get_cart().await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_increments_are_not_lost() {
    let (_, service) = setup();
    seed(&service, &[("item1", 1, 10.0)]).await;

    let tasks: Vec<_> = (0..50)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .increment_quantity(&ItemId::new("item1"))
                    .await
                    .unwrap();
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(service.get_cart().await.items[0].quantity, 51);
}

#[tokio::test]
async fn test_services_for_different_carts_are_isolated() {
    let store = Arc::new(MemoryStore::new());
    let cache = Arc::new(CacheManager::new(store));
    let alice = CartService::new(cache.clone(), "alice-cart");
    let bob = CartService::new(cache, "bob-cart");

    alice.add_item(item("item1", 1, 1.0)).await.unwrap();
    assert!(bob.get_cart().await.is_empty());
    assert_eq!(alice.get_cart().await.unique_item_count(), 1);
}
