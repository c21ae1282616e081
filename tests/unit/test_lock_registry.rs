//! Unit tests for the advisory lock registry.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use home_automation_api::services::{automation_key, LockRegistry};

#[test]
fn key_includes_the_full_resource_identity() {
    let key = automation_key("a1", "u1", "h1", "app");
    assert_eq!(key, "automation/a1/u1/h1/app");
}

#[tokio::test]
async fn same_key_is_mutually_exclusive() {
    let registry = Arc::new(LockRegistry::new());
    let holders = Arc::new(AtomicUsize::new(0));

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let registry = registry.clone();
        let holders = holders.clone();
        tasks.push(tokio::spawn(async move {
            let _guard = registry.acquire("automation/a1/u1/h1/app").await;
            let concurrent = holders.fetch_add(1, Ordering::SeqCst);
            assert_eq!(concurrent, 0, "another task held the same lock");
            tokio::time::sleep(Duration::from_millis(5)).await;
            holders.fetch_sub(1, Ordering::SeqCst);
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
}

#[tokio::test]
async fn different_keys_do_not_block_each_other() {
    let registry = LockRegistry::new();
    let _a = registry.acquire("automation/a1/u1/h1/app").await;
    // Completes immediately; a shared key would deadlock here.
    let _b = registry.acquire("automation/a2/u1/h1/app").await;
}

#[tokio::test]
async fn lock_is_released_on_drop() {
    let registry = LockRegistry::new();
    {
        let _guard = registry.acquire("automation/a1/u1/h1/app").await;
    }
    let _again = registry.acquire("automation/a1/u1/h1/app").await;
}

#[tokio::test]
async fn released_keys_are_swept_from_the_registry() {
    let registry = LockRegistry::new();
    {
        let _a = registry.acquire("automation/a1/u1/h1/app").await;
        let _b = registry.acquire("automation/a2/u1/h1/app").await;
        // Held keys survive the sweep that runs on each acquire.
        assert_eq!(registry.len().await, 2);
    }

    // Both guards dropped; the next acquire sweeps the dead cells and only
    // the new key remains.
    let _c = registry.acquire("automation/a3/u1/h1/app").await;
    assert_eq!(registry.len().await, 1);
}
