use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog_store::{CatalogStore, StoreError};
use crate::model::{Difficulty, ProblemRecord, SolveStatus, SyncMetadata};
use crate::provider::{CatalogProvider, ProviderError, ProviderRecord};

pub type ProgressFn<'a> = &'a (dyn Fn(usize, usize) + Send + Sync);

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub is_stale: bool,
    pub last_sync: Option<DateTime<Utc>>,
    pub total_count: usize,
}

pub struct CatalogSyncService {
    store: Arc<CatalogStore>,
    provider: Arc<dyn CatalogProvider>,
    freshness_window: TimeDelta,
}

impl CatalogSyncService {
    pub fn new(
        store: Arc<CatalogStore>,
        provider: Arc<dyn CatalogProvider>,
        freshness_window: TimeDelta,
    ) -> Self {
        Self {
            store,
            provider,
            freshness_window,
        }
    }

    pub fn store(&self) -> &Arc<CatalogStore> {
        &self.store
    }

    pub fn is_stale(&self) -> Result<bool, SyncError> {
        self.is_stale_at(Utc::now())
    }

    pub fn is_stale_at(&self, now: DateTime<Utc>) -> Result<bool, SyncError> {
        let Some(meta) = self.store.get_metadata()? else {
            return Ok(true);
        };
        Ok(now.signed_duration_since(meta.last_fetched_at) > self.freshness_window)
    }

    pub async fn sync(&self, on_progress: Option<ProgressFn<'_>>) -> Result<bool, SyncError> {
        self.sync_at(Utc::now(), on_progress).await
    }

    /// Returns `Ok(false)` without touching the provider or the store when
    /// the mirror is still fresh at `now`.
    pub async fn sync_at(
        &self,
        now: DateTime<Utc>,
        on_progress: Option<ProgressFn<'_>>,
    ) -> Result<bool, SyncError> {
        if !self.is_stale_at(now)? {
            log::debug!("catalog is fresh; skipping sync");
            return Ok(false);
        }
        self.refresh_at(now, on_progress).await?;
        Ok(true)
    }

    pub async fn refresh(&self, on_progress: Option<ProgressFn<'_>>) -> Result<usize, SyncError> {
        self.refresh_at(Utc::now(), on_progress).await
    }

    async fn refresh_at(
        &self,
        now: DateTime<Utc>,
        on_progress: Option<ProgressFn<'_>>,
    ) -> Result<usize, SyncError> {
        log::info!("syncing problem catalog");
        let fetched = self.provider.fetch_all().await.map_err(|error| {
            log::warn!("catalog fetch failed: {error}");
            error
        })?;

        let problems = map_snapshot(fetched)?;
        let total = problems.len();
        if let Some(report) = on_progress {
            report(total, total);
        }

        self.store
            .replace_all_with_metadata(&problems, &SyncMetadata::new(now, total))?;
        log::info!("synced {total} problems");
        Ok(total)
    }

    pub fn last_sync_date(&self) -> Result<Option<DateTime<Utc>>, SyncError> {
        Ok(self.store.get_metadata()?.map(|meta| meta.last_fetched_at))
    }

    pub fn age_at(&self, now: DateTime<Utc>) -> Result<Option<TimeDelta>, SyncError> {
        Ok(self
            .last_sync_date()?
            .map(|last| now.signed_duration_since(last)))
    }

    pub fn total_count(&self) -> Result<usize, SyncError> {
        Ok(self.store.count()?)
    }

    pub fn status(&self) -> Result<SyncStatus, SyncError> {
        Ok(SyncStatus {
            is_stale: self.is_stale()?,
            last_sync: self.last_sync_date()?,
            total_count: self.total_count()?,
        })
    }
}

/// Maps and validates a provider snapshot, sorted by id ascending. Any bad
/// record rejects the snapshot as a whole.
pub fn map_snapshot(records: Vec<ProviderRecord>) -> Result<Vec<ProblemRecord>, ProviderError> {
    let mut ids = HashSet::with_capacity(records.len());
    let mut slugs = HashSet::with_capacity(records.len());
    let mut problems = Vec::with_capacity(records.len());

    for record in records {
        let problem = map_record(record)?;
        if !ids.insert(problem.id) {
            return Err(ProviderError::Malformed(format!(
                "duplicate problem id {}",
                problem.id
            )));
        }
        if !slugs.insert(problem.slug.clone()) {
            return Err(ProviderError::Malformed(format!(
                "duplicate problem slug {}",
                problem.slug
            )));
        }
        problems.push(problem);
    }

    problems.sort_by_key(|problem| problem.id);
    Ok(problems)
}

fn map_record(record: ProviderRecord) -> Result<ProblemRecord, ProviderError> {
    if record.frontend_id <= 0 {
        return Err(ProviderError::Malformed(format!(
            "invalid problem id {} for '{}'",
            record.frontend_id, record.title_slug
        )));
    }
    if record.title.trim().is_empty() || record.title_slug.trim().is_empty() {
        return Err(ProviderError::Malformed(format!(
            "problem {} is missing a title or slug",
            record.frontend_id
        )));
    }

    Ok(ProblemRecord {
        id: record.frontend_id,
        difficulty: Difficulty::from_level(record.difficulty_level),
        is_paid_only: record.paid_only,
        ac_rate: acceptance_rate(record.total_accepted, record.total_submitted),
        status: SolveStatus::from_provider(record.status.as_deref()),
        title: record.title,
        slug: record.title_slug,
    })
}

pub fn acceptance_rate(accepted: u64, submitted: u64) -> f64 {
    if submitted == 0 {
        return 0.0;
    }
    accepted as f64 / submitted as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::{acceptance_rate, map_snapshot};
    use crate::model::Difficulty;
    use crate::provider::{ProviderError, ProviderRecord};

    fn record(frontend_id: i64, slug: &str, level: i64) -> ProviderRecord {
        ProviderRecord {
            id: frontend_id + 1000,
            frontend_id,
            title: slug.replace('-', " "),
            title_slug: slug.to_string(),
            total_accepted: 50,
            total_submitted: 200,
            difficulty_level: level,
            paid_only: false,
            status: None,
        }
    }

    #[test]
    fn acceptance_rate_is_zero_without_submissions() {
        assert_eq!(acceptance_rate(10, 0), 0.0);
        assert_eq!(acceptance_rate(50, 200), 25.0);
    }

    #[test]
    fn snapshot_is_sorted_by_frontend_id() {
        let problems = map_snapshot(vec![
            record(3, "c", 3),
            record(1, "a", 1),
            record(2, "b", 9),
        ])
        .unwrap();
        let ids: Vec<i64> = problems.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(problems[1].difficulty, Difficulty::Medium);
        assert_eq!(problems[2].difficulty, Difficulty::Hard);
        assert_eq!(problems[0].ac_rate, 25.0);
    }

    #[test]
    fn duplicate_slug_rejects_snapshot() {
        let result = map_snapshot(vec![record(1, "a", 1), record(2, "a", 1)]);
        assert!(matches!(result, Err(ProviderError::Malformed(_))));
    }

    #[test]
    fn empty_title_rejects_snapshot() {
        let mut bad = record(1, "a", 1);
        bad.title = "  ".to_string();
        assert!(matches!(
            map_snapshot(vec![bad]),
            Err(ProviderError::Malformed(_))
        ));
    }
}
