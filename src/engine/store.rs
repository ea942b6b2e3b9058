use std::fs;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{error, info};

use super::KvEngine;
use crate::buffer::Buffer;
use crate::index::HashIndex;
use crate::log::CommandLog;
use crate::Result;

// file name of the durability log within the data directory
const LOG_FILENAME: &str = "bytekv.log";

/// The concurrency-safe façade combining the in-memory [`HashIndex`] with
/// the on-disk [`CommandLog`].
///
/// ## Concurrency model
///
/// One process-wide reader-writer lock guards both the index and the log
/// handle. Mutations (`set`, `del`, `rename`) take the lock exclusively;
/// pure lookups (`get`, `exists`) take it shared and may overlap with each
/// other but never with a mutation. Operations on the same key are thereby
/// serialized with no lost updates, and a reader can never observe a
/// half-written value.
///
/// ## Durability
///
/// Every `set` appends a record to the log and every successful `del`
/// rewrites the log without the removed key, while holding the exclusive
/// lock. On open the log is replayed front-to-back to rebuild the index.
/// A `set` whose key or value exceeds [`MAX_PAYLOAD_LEN`] is refused
/// outright, leaving memory and disk unchanged. Past that gate a failed
/// log write is reported and swallowed: the in-memory mutation stands, the
/// connection stays up, and the on-disk state lags until the next
/// successful write. The guard is released on every path.
///
/// [`MAX_PAYLOAD_LEN`]: crate::MAX_PAYLOAD_LEN
///
/// Cloning a `Store` clones a shared handle, not the data.
#[derive(Debug, Clone)]
pub struct Store {
    inner: Arc<RwLock<StoreInner>>,
}

#[derive(Debug)]
struct StoreInner {
    index: HashIndex,
    log: CommandLog,
}

impl Store {
    /// Opens (or creates) a store rooted at `data_dir`, replaying the
    /// durability log found there into the in-memory index.
    pub fn open(data_dir: &Path) -> Result<Store> {
        fs::create_dir_all(data_dir)?;
        let log = CommandLog::new(data_dir.join(LOG_FILENAME));

        let mut index = HashIndex::new();
        let records = log.replay()?;
        let replayed = records.len();
        for (key, value) in records {
            index.put(&key, &value);
        }
        info!(
            "opened store at {:?}: {} log records replayed into {} live keys",
            data_dir,
            replayed,
            index.len()
        );

        Ok(Store {
            inner: Arc::new(RwLock::new(StoreInner { index, log })),
        })
    }
}

impl KvEngine for Store {
    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut inner = self.inner.write();
        // a payload the log could never replay is rejected before it can
        // reach the index
        CommandLog::check_record(key, value)?;
        inner.index.put(key, value);
        if let Err(e) = inner.log.append(key, value) {
            // in-memory and on-disk state diverge until the next good write
            error!("failed to append to durability log: {}", e);
        }
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Buffer>> {
        let inner = self.inner.read();
        Ok(inner.index.get(key).cloned())
    }

    fn del(&self, key: &[u8]) -> Result<bool> {
        let mut inner = self.inner.write();
        if !inner.index.remove(key) {
            return Ok(false);
        }
        if let Err(e) = inner.log.compact_without(key) {
            error!("failed to compact durability log: {}", e);
        }
        Ok(true)
    }

    fn exists(&self, key: &[u8]) -> Result<bool> {
        let inner = self.inner.read();
        Ok(inner.index.contains(key))
    }

    fn rename(&self, old_key: &[u8], new_key: &[u8]) -> Result<bool> {
        let mut inner = self.inner.write();
        if !inner.index.rename(old_key, new_key) {
            return Ok(false);
        }
        // keep the log replayable: the old key's records vanish and the
        // value is re-recorded under its new key
        let value = inner
            .index
            .get(new_key)
            .cloned()
            .unwrap_or_else(|| Buffer::copy_from(&[]));
        if let Err(e) = inner
            .log
            .compact_without(old_key)
            .and_then(|_| inner.log.append(new_key, &value))
        {
            error!("failed to record rename in durability log: {}", e);
        }
        Ok(true)
    }
}
