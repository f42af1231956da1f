//! Cascading-deletion tests: the sweeper must remove every deployment
//! record for an application, across page boundaries and transient
//! partial-batch failures, without touching other applications.

use std::sync::Arc;

use capstan_core::{ApplicationId, DeploymentId};
use capstan_status::deployment::DeploymentKey;
use capstan_status::error::Result;
use capstan_status::store::MAX_DELETE_BATCH;
use capstan_status::store::memory::MemoryStore;
use capstan_status::sweeper::DeletionSweeper;

fn seeded_store(app: &ApplicationId, count: usize) -> Result<Arc<MemoryStore>> {
    let store = Arc::new(MemoryStore::new());
    for i in 0..count {
        let key = DeploymentKey::new(app.clone(), DeploymentId::new(format!("dep-{i:04}")));
        store.register_deployment(&key)?;
    }
    Ok(store)
}

#[tokio::test]
async fn sweeping_an_empty_history_deletes_nothing() -> Result<()> {
    let app = ApplicationId::new("app-1");
    let store = seeded_store(&app, 0)?;

    let report = DeletionSweeper::new(store.clone()).delete_all(&app).await?;
    assert_eq!(report.deleted, 0);
    assert_eq!(report.pages, 1);
    Ok(())
}

#[tokio::test]
async fn sweeping_a_single_record() -> Result<()> {
    let app = ApplicationId::new("app-1");
    let store = seeded_store(&app, 1)?;

    let report = DeletionSweeper::new(store.clone()).delete_all(&app).await?;
    assert_eq!(report.deleted, 1);
    assert_eq!(store.deployment_count(&app)?, 0);
    Ok(())
}

#[tokio::test]
async fn sweeping_exactly_one_full_page() -> Result<()> {
    let app = ApplicationId::new("app-1");
    let store = seeded_store(&app, MAX_DELETE_BATCH)?;

    let report = DeletionSweeper::new(store.clone()).delete_all(&app).await?;
    assert_eq!(report.deleted, MAX_DELETE_BATCH);
    assert_eq!(store.deployment_count(&app)?, 0);
    Ok(())
}

#[tokio::test]
async fn sweeping_a_multi_page_history() -> Result<()> {
    let app = ApplicationId::new("app-1");
    let store = seeded_store(&app, 60)?;

    let report = DeletionSweeper::new(store.clone()).delete_all(&app).await?;
    assert_eq!(report.deleted, 60);
    assert!(report.pages >= 3);
    assert_eq!(store.deployment_count(&app)?, 0);
    Ok(())
}

#[tokio::test]
async fn unprocessed_keys_are_resubmitted_until_gone() -> Result<()> {
    let app = ApplicationId::new("app-1");
    let store = seeded_store(&app, 10)?;
    store.leave_unprocessed_once(4)?;

    let report = DeletionSweeper::new(store.clone()).delete_all(&app).await?;
    assert_eq!(report.deleted, 10);
    assert_eq!(store.deployment_count(&app)?, 0);
    Ok(())
}

#[tokio::test]
async fn small_pages_still_cover_the_whole_history() -> Result<()> {
    let app = ApplicationId::new("app-1");
    let store = seeded_store(&app, 17)?;

    let report = DeletionSweeper::new(store.clone())
        .with_page_size(5)
        .delete_all(&app)
        .await?;
    assert_eq!(report.deleted, 17);
    assert!(report.pages >= 4);
    assert_eq!(store.deployment_count(&app)?, 0);
    Ok(())
}

#[tokio::test]
async fn other_applications_are_untouched() -> Result<()> {
    let app = ApplicationId::new("app-1");
    let other = ApplicationId::new("app-2");
    let store = seeded_store(&app, 30)?;
    for i in 0..3 {
        let key = DeploymentKey::new(other.clone(), DeploymentId::new(format!("dep-{i}")));
        store.register_deployment(&key)?;
    }

    DeletionSweeper::new(store.clone()).delete_all(&app).await?;
    assert_eq!(store.deployment_count(&app)?, 0);
    assert_eq!(store.deployment_count(&other)?, 3);
    Ok(())
}

#[tokio::test]
async fn sweeping_twice_is_idempotent() -> Result<()> {
    let app = ApplicationId::new("app-1");
    let store = seeded_store(&app, 8)?;
    let sweeper = DeletionSweeper::new(store.clone());

    let first = sweeper.delete_all(&app).await?;
    assert_eq!(first.deleted, 8);

    let second = sweeper.delete_all(&app).await?;
    assert_eq!(second.deleted, 0);
    assert_eq!(store.deployment_count(&app)?, 0);
    Ok(())
}
