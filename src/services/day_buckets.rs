//! In-memory day buckets with lazy archival.
//!
//! Every submission is appended to the bucket of its UTC day. When a
//! submission finds an older day still resident, that day is handed out as an
//! [`ArchiveJob`]; the bucket is evicted only after the job's write succeeds.
//!
//! Buckets live for the lifetime of the process. A restart drops every
//! bucket that has not been archived yet.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::models::survey::SurveyRecord;
use crate::services::blob::BlobStore;

pub type BucketMap = BTreeMap<String, Vec<SurveyRecord>>;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("failed to serialize bucket {day}: {source}")]
    Serialize {
        day: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write bucket {day}: {source}")]
    Write {
        day: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Snapshot of a stale day taken at selection time.
#[derive(Debug)]
pub struct ArchiveJob {
    pub day: String,
    pub records: Vec<SurveyRecord>,
}

#[derive(Default)]
struct Inner {
    buckets: BucketMap,
    // Days with a write in flight; never selected twice.
    archiving: HashSet<String>,
}

#[derive(Clone)]
pub struct DayBuckets {
    inner: Arc<Mutex<Inner>>,
    prefix: String,
}

impl DayBuckets {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            prefix: prefix.into(),
        }
    }

    /// Append `record` to its day and pick at most one older resident day to archive.
    ///
    /// The oldest eligible day wins. Further stale days wait for later submissions.
    pub async fn append(&self, record: SurveyRecord) -> Option<ArchiveJob> {
        let day = record.day_key();
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;

        inner.buckets.entry(day.clone()).or_default().push(record);
        tracing::debug!(
            day = %day,
            records = inner.buckets.get(&day).map(Vec::len).unwrap_or(0),
            "Appended survey record"
        );

        let stale = inner
            .buckets
            .keys()
            .find(|key| key.as_str() < day.as_str() && !inner.archiving.contains(*key))
            .cloned()?;

        let records = inner.buckets.get(&stale).cloned().unwrap_or_default();
        inner.archiving.insert(stale.clone());

        Some(ArchiveJob {
            day: stale,
            records,
        })
    }

    /// Write the job's records and evict them on success. Failures leave the
    /// bucket resident for a later submission to retry.
    pub async fn archive(
        &self,
        job: ArchiveJob,
        store: &dyn BlobStore,
    ) -> Result<String, ArchiveError> {
        let result = self.write(&job, store).await;

        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        inner.archiving.remove(&job.day);

        match &result {
            Ok(url) => {
                let mut remaining = 0;
                if let Some(bucket) = inner.buckets.get_mut(&job.day) {
                    // Append-only: the archived records are the bucket's prefix.
                    let archived = job.records.len().min(bucket.len());
                    bucket.drain(..archived);
                    remaining = bucket.len();
                    if bucket.is_empty() {
                        inner.buckets.remove(&job.day);
                    }
                }
                tracing::info!(
                    day = %job.day,
                    records = job.records.len(),
                    remaining,
                    url = %url,
                    "Archived day bucket"
                );
            }
            Err(e) => {
                tracing::error!(day = %job.day, error = %e, "Day bucket archival failed");
            }
        }

        result
    }

    /// Run [`DayBuckets::archive`] as a detached background task.
    pub fn spawn_archive(&self, job: ArchiveJob, store: Arc<dyn BlobStore>) -> JoinHandle<()> {
        let buckets = self.clone();
        tokio::spawn(async move {
            // Outcome is logged inside archive().
            let _ = buckets.archive(job, store.as_ref()).await;
        })
    }

    pub async fn snapshot(&self) -> BucketMap {
        self.inner.lock().await.buckets.clone()
    }

    fn archive_key(&self, day: &str) -> String {
        format!(
            "{}/{}/formdata-{}.json",
            self.prefix,
            day,
            Utc::now().timestamp_millis()
        )
    }

    async fn write(&self, job: &ArchiveJob, store: &dyn BlobStore) -> Result<String, ArchiveError> {
        let body = serde_json::to_vec(&job.records).map_err(|source| ArchiveError::Serialize {
            day: job.day.clone(),
            source,
        })?;

        let key = self.archive_key(&job.day);
        tracing::debug!(day = %job.day, key = %key, "Writing day bucket");

        store
            .put(&key, body)
            .await
            .map_err(|source| ArchiveError::Write {
                day: job.day.clone(),
                source,
            })
    }
}
