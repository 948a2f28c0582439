//! Transactional key-value substrate backed by redb.
//!
//! Writers are serialised by redb itself; readers see a snapshot taken when
//! their transaction began. Every closure passed to [`Store::update`] runs in
//! one write transaction that commits if the closure returns `Ok` and aborts
//! otherwise, so a failed multi-bucket operation leaves nothing behind.

use std::path::Path;
use std::sync::Arc;

use cap_std::ambient_authority;
use cap_std::fs::Dir;
use chrono::{DateTime, Utc};
use mockable::Clock;
use redb::backends::InMemoryBackend;
use redb::{
    Database, ReadTransaction, ReadableTable, StorageError, TableDefinition, WriteTransaction,
};
use tracing::{debug, info, warn};

use crate::domain::ports::RepositoryError;

use super::bucket::Bucket;

/// Per-bucket id counters, kept beside the data so they commit atomically
/// with the records they number.
const SEQUENCES: TableDefinition<'static, &'static str, u64> = TableDefinition::new("_Sequences");

/// Key/value pair returned by scans.
pub type Entry = (Vec<u8>, Vec<u8>);

pub(crate) fn substrate(error: impl Into<redb::Error>) -> RepositoryError {
    RepositoryError::substrate(error.into().to_string())
}

/// Handle to an open database file.
pub struct Store {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl Store {
    /// Open or create the database at `path`, creating parent directories
    /// and every bucket.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Substrate`] when the file cannot be opened
    /// or initialised.
    pub fn open(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            Dir::create_ambient_dir_all(parent, ambient_authority()).map_err(|err| {
                RepositoryError::substrate(format!("create {}: {err}", parent.display()))
            })?;
        }
        let db = Database::create(path).map_err(substrate)?;
        info!(path = %path.display(), "store opened");
        Self::initialise(db, clock)
    }

    /// Open a database that lives only in memory. Used by tests and tools.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Substrate`] if redb refuses the backend.
    pub fn in_memory(clock: Arc<dyn Clock>) -> Result<Self, RepositoryError> {
        let db = Database::builder()
            .create_with_backend(InMemoryBackend::new())
            .map_err(substrate)?;
        Self::initialise(db, clock)
    }

    fn initialise(db: Database, clock: Arc<dyn Clock>) -> Result<Self, RepositoryError> {
        let txn = db.begin_write().map_err(substrate)?;
        for bucket in Bucket::ALL {
            txn.open_table(bucket.definition()).map_err(substrate)?;
        }
        txn.open_table(SEQUENCES).map_err(substrate)?;
        txn.commit().map_err(substrate)?;
        Ok(Self { db, clock })
    }

    /// Begin a transaction. Callers must finish it with [`Tx::commit`] or
    /// [`Tx::rollback`]; dropping a write transaction aborts it.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Substrate`] if redb cannot start one.
    pub fn begin(&self, writable: bool) -> Result<Tx, RepositoryError> {
        let inner = if writable {
            TxInner::Write(self.db.begin_write().map_err(substrate)?)
        } else {
            TxInner::Read(self.db.begin_read().map_err(substrate)?)
        };
        Ok(Tx {
            inner,
            now: self.clock.utc(),
        })
    }

    /// Run `op` in a read-only snapshot.
    ///
    /// # Errors
    ///
    /// Propagates the closure's error or a substrate failure.
    pub fn view<T>(
        &self,
        op: impl FnOnce(&Tx) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let tx = self.begin(false)?;
        let result = op(&tx);
        tx.rollback();
        result
    }

    /// Run `op` in a write transaction, committing on `Ok` and aborting on
    /// `Err`.
    ///
    /// # Errors
    ///
    /// Propagates the closure's error or a commit failure.
    pub fn update<T>(
        &self,
        op: impl FnOnce(&Tx) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let tx = self.begin(true)?;
        match op(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                debug!(error = %err, "rolling back write transaction");
                tx.rollback();
                Err(err)
            }
        }
    }
}

enum TxInner {
    Read(ReadTransaction),
    Write(WriteTransaction),
}

/// An open read or write transaction.
///
/// Every record stamped during one transaction shares the timestamp captured
/// when it began.
pub struct Tx {
    inner: TxInner,
    now: DateTime<Utc>,
}

impl Tx {
    /// Timestamp captured at `begin`.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Whether mutations are permitted.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        matches!(self.inner, TxInner::Write(_))
    }

    fn writer(&self) -> Result<&WriteTransaction, RepositoryError> {
        match &self.inner {
            TxInner::Write(txn) => Ok(txn),
            TxInner::Read(_) => Err(RepositoryError::substrate(
                "write attempted in read-only transaction",
            )),
        }
    }

    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Substrate`] on storage failure.
    pub fn get(&self, bucket: Bucket, key: &[u8]) -> Result<Option<Vec<u8>>, RepositoryError> {
        match &self.inner {
            TxInner::Read(txn) => {
                let table = txn.open_table(bucket.definition()).map_err(substrate)?;
                read_value(&table, key).map_err(substrate)
            }
            TxInner::Write(txn) => {
                let table = txn.open_table(bucket.definition()).map_err(substrate)?;
                read_value(&table, key).map_err(substrate)
            }
        }
    }

    /// Whether `key` is present, without copying its value out.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Substrate`] on storage failure.
    pub fn contains(&self, bucket: Bucket, key: &[u8]) -> Result<bool, RepositoryError> {
        match &self.inner {
            TxInner::Read(txn) => {
                let table = txn.open_table(bucket.definition()).map_err(substrate)?;
                has_key(&table, key).map_err(substrate)
            }
            TxInner::Write(txn) => {
                let table = txn.open_table(bucket.definition()).map_err(substrate)?;
                has_key(&table, key).map_err(substrate)
            }
        }
    }

    /// Insert or overwrite `key`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Substrate`] on storage failure or when the
    /// transaction is read-only.
    pub fn put(&self, bucket: Bucket, key: &[u8], value: &[u8]) -> Result<(), RepositoryError> {
        let mut table = self
            .writer()?
            .open_table(bucket.definition())
            .map_err(substrate)?;
        table.insert(key, value).map_err(substrate)?;
        Ok(())
    }

    /// Remove `key`, reporting whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Substrate`] on storage failure or when the
    /// transaction is read-only.
    pub fn delete(&self, bucket: Bucket, key: &[u8]) -> Result<bool, RepositoryError> {
        let mut table = self
            .writer()?
            .open_table(bucket.definition())
            .map_err(substrate)?;
        let removed = table.remove(key).map_err(substrate)?.is_some();
        Ok(removed)
    }

    /// Every entry whose key starts with `prefix`, in ascending key order.
    /// An empty prefix scans the whole bucket.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Substrate`] on storage failure.
    pub fn scan_prefix(&self, bucket: Bucket, prefix: &[u8]) -> Result<Vec<Entry>, RepositoryError> {
        match &self.inner {
            TxInner::Read(txn) => {
                let table = txn.open_table(bucket.definition()).map_err(substrate)?;
                scan_from(&table, prefix).map_err(substrate)
            }
            TxInner::Write(txn) => {
                let table = txn.open_table(bucket.definition()).map_err(substrate)?;
                scan_from(&table, prefix).map_err(substrate)
            }
        }
    }

    /// Increment and return the bucket's sequence. The first value is 1.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Substrate`] on storage failure, overflow,
    /// or when the transaction is read-only.
    pub fn next_sequence(&self, bucket: Bucket) -> Result<u64, RepositoryError> {
        let mut table = self.writer()?.open_table(SEQUENCES).map_err(substrate)?;
        let current = table
            .get(bucket.name())
            .map_err(substrate)?
            .map_or(0, |value| value.value());
        let next = current.checked_add(1).ok_or_else(|| {
            RepositoryError::substrate(format!("sequence exhausted for {}", bucket.name()))
        })?;
        table.insert(bucket.name(), next).map_err(substrate)?;
        Ok(next)
    }

    /// Make every write durable. Read transactions simply close.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Substrate`] if the commit fails; nothing
    /// from the transaction is visible afterwards.
    pub fn commit(self) -> Result<(), RepositoryError> {
        match self.inner {
            TxInner::Read(_) => Ok(()),
            TxInner::Write(txn) => txn.commit().map_err(substrate),
        }
    }

    /// Discard every write.
    pub fn rollback(self) {
        if let TxInner::Write(txn) = self.inner {
            if let Err(err) = txn.abort() {
                warn!(error = %err, "write transaction abort failed");
            }
        }
    }
}

fn read_value<T>(table: &T, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    Ok(table.get(key)?.map(|value| value.value().to_vec()))
}

fn has_key<T>(table: &T, key: &[u8]) -> Result<bool, StorageError>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    Ok(table.get(key)?.is_some())
}

fn scan_from<T>(table: &T, prefix: &[u8]) -> Result<Vec<Entry>, StorageError>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    let mut entries = Vec::new();
    for item in table.range(prefix..)? {
        let (key, value) = item?;
        let key = key.value();
        if !key.starts_with(prefix) {
            break;
        }
        entries.push((key.to_vec(), value.value().to_vec()));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::outbound::store::codec::encode_id;
    use crate::test_support::memory_store;

    #[rstest]
    fn sequences_start_at_one_per_bucket() {
        let store = memory_store();
        let (a, b, c) = store
            .update(|tx| {
                Ok((
                    tx.next_sequence(Bucket::Users)?,
                    tx.next_sequence(Bucket::Users)?,
                    tx.next_sequence(Bucket::Jobs)?,
                ))
            })
            .expect("sequences");
        assert_eq!((a, b, c), (1, 2, 1));
    }

    #[rstest]
    fn failed_update_discards_writes_and_sequence() {
        let store = memory_store();
        let result: Result<(), _> = store.update(|tx| {
            tx.next_sequence(Bucket::Users)?;
            tx.put(Bucket::Users, &encode_id(1), b"draft")?;
            Err(RepositoryError::validation("mobile number"))
        });
        assert!(result.is_err());

        let (value, next) = store
            .update(|tx| Ok((tx.get(Bucket::Users, &encode_id(1))?, tx.next_sequence(Bucket::Users)?)))
            .expect("inspect");
        assert_eq!(value, None);
        assert_eq!(next, 1);
    }

    #[rstest]
    fn prefix_scan_stops_at_first_foreign_key() {
        let store = memory_store();
        store
            .update(|tx| {
                tx.put(Bucket::UsersPlaylists, b"ab1", b"")?;
                tx.put(Bucket::UsersPlaylists, b"ab2", b"")?;
                tx.put(Bucket::UsersPlaylists, b"ac1", b"")?;
                tx.put(Bucket::UsersPlaylists, b"aa9", b"")
            })
            .expect("seed");

        let keys: Vec<Vec<u8>> = store
            .view(|tx| tx.scan_prefix(Bucket::UsersPlaylists, b"ab"))
            .expect("scan")
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        assert_eq!(keys, vec![b"ab1".to_vec(), b"ab2".to_vec()]);

        let all = store
            .view(|tx| tx.scan_prefix(Bucket::UsersPlaylists, &[]))
            .expect("scan all");
        assert_eq!(all.len(), 4);
    }

    #[rstest]
    fn read_transactions_reject_writes() {
        let store = memory_store();
        let err = store
            .view(|tx| tx.put(Bucket::Users, b"k", b"v"))
            .expect_err("read-only");
        assert!(matches!(err, RepositoryError::Substrate { .. }));
    }

    #[rstest]
    fn delete_reports_presence() {
        let store = memory_store();
        let (first, second) = store
            .update(|tx| {
                tx.put(Bucket::JobQueue, b"k", b"v")?;
                Ok((tx.delete(Bucket::JobQueue, b"k")?, tx.delete(Bucket::JobQueue, b"k")?))
            })
            .expect("delete");
        assert!(first);
        assert!(!second);
    }

    #[rstest]
    fn reopening_a_file_keeps_data() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("peapod.redb");
        let clock: Arc<dyn Clock> = Arc::new(mockable::DefaultClock);

        let store = Store::open(&path, Arc::clone(&clock)).expect("open");
        store
            .update(|tx| tx.put(Bucket::Users, &encode_id(1), b"kept"))
            .expect("write");
        drop(store);

        let store = Store::open(&path, clock).expect("reopen");
        let value = store
            .view(|tx| tx.get(Bucket::Users, &encode_id(1)))
            .expect("read");
        assert_eq!(value.as_deref(), Some(&b"kept"[..]));
    }
}
