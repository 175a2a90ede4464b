use courtcase_core::{
    CaseDataRecord, CaseQuery, CaseRecord, CaseStore, CleanupReport, Error, QueryDetails,
    QueryRecord, QueryStatus, Result, StoreStatistics,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const DAY_S: u64 = 24 * 60 * 60;

fn now_epoch_s() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_secs()
}

fn store_err(e: impl ToString) -> Error {
    Error::Store(e.to_string())
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Counters {
    next_query_id: u64,
    next_case_data_id: u64,
}

/// JSON-file store for query/result pairs.
///
/// Layout under `root`:
/// - `meta.json`: id counters
/// - `queries/<id>.json`: one [`QueryRecord`] per query
/// - `case_data/<query_id>.json`: the [`CaseDataRecord`] of a completed query
/// - `.lock`: held exclusively around every write, so several processes can share `root`
#[derive(Debug)]
pub struct FsCaseStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FsCaseStore {
    /// Open (and create, if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let store = Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        };
        fs::create_dir_all(store.queries_dir()).map_err(store_err)?;
        fs::create_dir_all(store.case_data_dir()).map_err(store_err)?;
        tracing::debug!(root = %store.root.display(), "case store ready");
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn queries_dir(&self) -> PathBuf {
        self.root.join("queries")
    }

    fn case_data_dir(&self) -> PathBuf {
        self.root.join("case_data")
    }

    fn query_path(&self, id: u64) -> PathBuf {
        self.queries_dir().join(format!("{id}.json"))
    }

    fn case_data_path(&self, query_id: u64) -> PathBuf {
        self.case_data_dir().join(format!("{query_id}.json"))
    }

    fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        let bytes = match fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(store_err(e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| Error::Parse(format!("{}: {e}", path.display())))
    }

    /// Whole-file write: a uniquely named temp sibling first, then rename over the target.
    fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value).map_err(store_err)?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::Builder::new()
            .prefix(".")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(store_err)?;
        tmp.write_all(&bytes).map_err(store_err)?;
        tmp.persist(path).map_err(|e| store_err(e.error))?;
        Ok(())
    }

    fn remove_if_present(path: &Path) -> Result<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(store_err(e)),
        }
    }

    /// Hand out the next id of one kind. Callers run inside [`Self::exclusive`].
    fn next_id(&self, pick: impl FnOnce(&mut Counters) -> &mut u64) -> Result<u64> {
        let meta = self.root.join("meta.json");
        let mut counters: Counters = Self::read_json(&meta)?.unwrap_or_default();
        let slot = pick(&mut counters);
        *slot = (*slot).max(1);
        let id = *slot;
        *slot += 1;
        Self::write_json(&meta, &counters)?;
        Ok(id)
    }

    fn load_queries(&self) -> Result<Vec<QueryRecord>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(self.queries_dir()).map_err(store_err)? {
            let path = entry.map_err(store_err)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(q) = Self::read_json::<QueryRecord>(&path)? {
                out.push(q);
            }
        }
        Ok(out)
    }

    fn details(&self, query: QueryRecord) -> Result<QueryDetails> {
        let case_data = Self::read_json(&self.case_data_path(query.id))?;
        Ok(QueryDetails { query, case_data })
    }

    /// Run `f` holding both the in-process mutex and an exclusive lock on `root/.lock`.
    fn exclusive<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let _local = self
            .write_lock
            .lock()
            .map_err(|_| Error::Store("store lock poisoned".to_string()))?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.root.join(".lock"))
            .map_err(store_err)?;
        let mut lock = fd_lock::RwLock::new(file);
        let _held = lock.write().map_err(store_err)?;
        f()
    }
}

impl CaseStore for FsCaseStore {
    fn store_query(&self, query: &CaseQuery, status: QueryStatus) -> Result<u64> {
        let id = self.exclusive(|| {
            let id = self.next_id(|c| &mut c.next_query_id)?;
            let record = QueryRecord {
                id,
                case_type: query.case_type.clone(),
                case_number: query.case_number.clone(),
                filing_year: query.filing_year.clone(),
                timestamp: now_epoch_s(),
                status,
                error_message: None,
            };
            Self::write_json(&self.query_path(id), &record)?;
            Ok(id)
        })?;
        tracing::info!(query_id = id, %query, %status, "stored query");
        Ok(id)
    }

    fn update_query_status(
        &self,
        query_id: u64,
        status: QueryStatus,
        error_message: Option<&str>,
    ) -> Result<()> {
        self.exclusive(|| {
            let path = self.query_path(query_id);
            let mut record: QueryRecord = Self::read_json(&path)?
                .ok_or_else(|| Error::NotFound(format!("query {query_id}")))?;
            record.status = status;
            record.error_message = error_message.map(str::to_string);
            Self::write_json(&path, &record)
        })?;
        tracing::info!(query_id, %status, "updated query status");
        Ok(())
    }

    fn store_case_data(
        &self,
        query_id: u64,
        record: &CaseRecord,
        raw_response: &str,
    ) -> Result<u64> {
        let id = self.exclusive(|| {
            if !self.query_path(query_id).exists() {
                return Err(Error::NotFound(format!("query {query_id}")));
            }
            let id = self.next_id(|c| &mut c.next_case_data_id)?;
            let row = CaseDataRecord {
                id,
                query_id,
                parties: record.parties.clone(),
                filing_date: record.filing_date.clone(),
                hearing_date: record.hearing_date.clone(),
                pdf_links: record.document_links.clone(),
                raw_response: raw_response.to_string(),
                created_at: now_epoch_s(),
            };
            Self::write_json(&self.case_data_path(query_id), &row)?;
            Ok(id)
        })?;
        tracing::info!(case_data_id = id, query_id, "stored case data");
        Ok(id)
    }

    fn get_query(&self, query_id: u64) -> Result<Option<QueryDetails>> {
        match Self::read_json::<QueryRecord>(&self.query_path(query_id))? {
            Some(q) => self.details(q).map(Some),
            None => Ok(None),
        }
    }

    fn recent_queries(&self, limit: usize) -> Result<Vec<QueryDetails>> {
        let mut queries = self.load_queries()?;
        queries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        queries
            .into_iter()
            .take(limit)
            .map(|q| self.details(q))
            .collect()
    }

    fn statistics(&self, now_epoch_s: u64) -> Result<StoreStatistics> {
        let queries = self.load_queries()?;
        let total = queries.len() as u64;
        let count = |s: QueryStatus| queries.iter().filter(|q| q.status == s).count() as u64;
        let successful = count(QueryStatus::Completed);
        let failed = count(QueryStatus::Failed);

        let mut distribution = BTreeMap::new();
        for q in &queries {
            *distribution.entry(q.case_type.clone()).or_insert(0u64) += 1;
        }
        let since = now_epoch_s.saturating_sub(DAY_S);
        let recent = queries.iter().filter(|q| q.timestamp >= since).count() as u64;

        Ok(StoreStatistics {
            total_queries: total,
            successful_queries: successful,
            failed_queries: failed,
            success_rate: if total > 0 {
                successful as f64 / total as f64 * 100.0
            } else {
                0.0
            },
            case_type_distribution: distribution,
            recent_activity_24h: recent,
        })
    }

    fn cleanup_older_than(&self, days: u64, now_epoch_s: u64) -> Result<CleanupReport> {
        let cutoff = now_epoch_s.saturating_sub(days.saturating_mul(DAY_S));
        let report = self.exclusive(|| {
            let mut report = CleanupReport::default();
            for q in self.load_queries()? {
                if q.timestamp >= cutoff {
                    continue;
                }
                if Self::remove_if_present(&self.case_data_path(q.id))? {
                    report.deleted_case_data += 1;
                }
                if Self::remove_if_present(&self.query_path(q.id))? {
                    report.deleted_queries += 1;
                }
            }
            Ok(report)
        })?;
        tracing::info!(
            days,
            deleted_queries = report.deleted_queries,
            deleted_case_data = report.deleted_case_data,
            "cleaned up old lookups"
        );
        Ok(report)
    }
}
