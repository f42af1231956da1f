//! Cascading deletion of an application's deployment history.
//!
//! When an application is removed, every deployment record it owns must
//! go with it. The store caps both query pages and delete batches, and a
//! batch may come back partially processed under throttling - so the
//! sweeper pages with a key-only projection, deletes page by page, and
//! resubmits unprocessed keys until each page is fully drained.
//!
//! Any store error aborts the sweep; partial completion is safe because
//! deleting an already-deleted key is a no-op, so the whole operation is
//! idempotent and restartable from the top.

use std::sync::Arc;

use capstan_core::ApplicationId;

use crate::error::Result;
use crate::store::{DeploymentStore, MAX_DELETE_BATCH};

/// What a completed sweep did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Number of deployment records deleted.
    pub deleted: usize,
    /// Number of pages queried.
    pub pages: usize,
}

/// Deletes all deployment records owned by an application.
pub struct DeletionSweeper {
    deployments: Arc<dyn DeploymentStore>,
    page_size: usize,
}

impl DeletionSweeper {
    /// Creates a sweeper with the store's maximum batch size as the page
    /// size.
    #[must_use]
    pub fn new(deployments: Arc<dyn DeploymentStore>) -> Self {
        Self {
            deployments,
            page_size: MAX_DELETE_BATCH,
        }
    }

    /// Overrides the page size, clamped to [1, [`MAX_DELETE_BATCH`]] so
    /// every page fits in one delete batch.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, MAX_DELETE_BATCH);
        self
    }

    /// Deletes every deployment record owned by `application_id`.
    ///
    /// # Errors
    ///
    /// Aborts with the store's error on any query or delete failure. Safe
    /// to re-invoke after a failure.
    #[tracing::instrument(skip(self), fields(application_id = %application_id))]
    pub async fn delete_all(&self, application_id: &ApplicationId) -> Result<SweepReport> {
        let mut report = SweepReport::default();
        let mut cursor = None;

        loop {
            let page = self
                .deployments
                .query_key_page(application_id, self.page_size, cursor.take())
                .await?;
            report.pages += 1;

            let mut pending = page.keys;
            while !pending.is_empty() {
                let submitted = pending.len();
                let unprocessed = self.deployments.delete_batch(pending).await?;
                report.deleted += submitted - unprocessed.len();
                if !unprocessed.is_empty() {
                    tracing::warn!(
                        page = report.pages,
                        unprocessed = unprocessed.len(),
                        "resubmitting unprocessed deployment deletes"
                    );
                }
                pending = unprocessed;
            }

            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        tracing::debug!(
            deleted = report.deleted,
            pages = report.pages,
            "deployment history sweep complete"
        );
        Ok(report)
    }
}
