mod support;

use std::sync::Arc;
use std::time::Duration;

use catalog_mirror::repository::SqliteRepository;
use catalog_mirror::services::{SyncScheduler, SyncService, Throttle};

use support::{FixtureEbs, memory_pool, structure_json};

async fn scheduler_with(ebs: Arc<FixtureEbs>) -> SyncScheduler {
    let pool = memory_pool().await;
    let repo = Arc::new(SqliteRepository::new(pool));
    let service = Arc::new(SyncService::new(repo, ebs, Throttle::disabled()));
    SyncScheduler::new(service)
}

#[tokio::test]
async fn test_scheduler_initialization() {
    let ebs = Arc::new(FixtureEbs::new("[]"));
    let scheduler = scheduler_with(ebs.clone()).await;

    assert!(!scheduler.is_running());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(ebs.structure_calls(), 0);
}

#[tokio::test]
async fn test_start_runs_immediately_then_periodically() {
    let ebs = Arc::new(FixtureEbs::new("[]"));
    let mut scheduler = scheduler_with(ebs.clone()).await;

    scheduler.start(Duration::from_millis(300));
    assert!(scheduler.is_running());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(ebs.structure_calls(), 1, "first run starts without waiting");

    tokio::time::sleep(Duration::from_millis(600)).await;
    scheduler.stop().await;
    assert!(!scheduler.is_running());

    let runs = ebs.structure_calls();
    assert!(runs >= 2, "expected periodic runs, got {}", runs);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(ebs.structure_calls(), runs, "no runs after stop");
}

#[tokio::test]
async fn test_start_twice_keeps_single_task() {
    let ebs = Arc::new(FixtureEbs::new("[]"));
    let mut scheduler = scheduler_with(ebs.clone()).await;

    scheduler.start(Duration::from_secs(60));
    scheduler.start(Duration::from_secs(60));

    tokio::time::sleep(Duration::from_millis(100)).await;
    scheduler.stop().await;

    assert_eq!(ebs.structure_calls(), 1);
}

#[tokio::test]
async fn test_stop_cancels_in_flight_run() {
    let departments: Vec<(i64, String)> = (1..=20).map(|i| (i, format!("d{}", i))).collect();
    let department_refs: Vec<(i64, &str)> = departments
        .iter()
        .map(|(id, guid)| (*id, guid.as_str()))
        .collect();
    let structure = structure_json(&[(1, department_refs.as_slice())]);

    let ebs = Arc::new(FixtureEbs::new(structure).slow_listings(Duration::from_millis(20)));
    let mut scheduler = scheduler_with(ebs.clone()).await;

    scheduler.start(Duration::from_secs(60));
    tokio::time::sleep(Duration::from_millis(150)).await;
    scheduler.stop().await;

    // 20 departments x 8 years would take over three seconds
    let listings = ebs.listing_calls().len();
    assert!(listings > 0);
    assert!(listings < 160, "run was not cancelled: {} listings", listings);
    assert_eq!(ebs.structure_calls(), 1);
}

#[tokio::test]
async fn test_zero_interval_is_rejected() {
    let ebs = Arc::new(FixtureEbs::new("[]"));
    let mut scheduler = scheduler_with(ebs.clone()).await;

    scheduler.start(Duration::ZERO);
    assert!(!scheduler.is_running());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(ebs.structure_calls(), 0);
}
