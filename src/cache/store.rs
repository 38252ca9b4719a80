use crate::cache::CacheKey;
use crate::constants::CACHE_ENCODING_VERSION;
use crate::error::Error;
use crate::models::Ohlcv;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// One cached series artifact: the OHLCV records plus the metadata needed
/// to judge freshness and encoding version on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSeries {
    pub version: u32,
    pub symbol: String,
    pub written_at: DateTime<Utc>,
    pub records: Vec<Ohlcv>,
}

impl CachedSeries {
    pub fn new(symbol: &str, records: Vec<Ohlcv>) -> Self {
        Self {
            version: CACHE_ENCODING_VERSION,
            symbol: symbol.to_string(),
            written_at: Utc::now(),
            records,
        }
    }
}

/// Counts reported by [`CacheStore::stats`].
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub current_entries: usize,
    pub legacy_entries: usize,
    pub total_bytes: u64,
}

/// On-disk cache: one file per [`CacheKey`], bincode-encoded in the current
/// format with serde_json legacy entries readable until migrated.
///
/// Writes go to a temp file in the same directory followed by a rename, so
/// a concurrent reader sees either the old or the new entry, never a torn
/// one. Writes to the same key are serialized through a per-key lock;
/// distinct keys never block each other.
pub struct CacheStore {
    dir: PathBuf,
    write_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CacheStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            write_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn current_path(&self, hex: &str) -> PathBuf {
        self.dir.join(format!("{}.bin", hex))
    }

    fn legacy_path(&self, hex: &str) -> PathBuf {
        self.dir.join(format!("{}.json", hex))
    }

    async fn key_lock(&self, hex: &str) -> Arc<Mutex<()>> {
        let mut locks = self.write_locks.lock().await;
        locks
            .entry(hex.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Freshness check. TTL is a property of the read, not the stored entry,
    /// so the same artifact can serve callers with different staleness
    /// tolerances. A write timestamp ahead of the local clock counts as
    /// fresh.
    pub fn is_valid(entry: &CachedSeries, ttl: Duration) -> bool {
        let age = Utc::now().signed_duration_since(entry.written_at);
        match age.to_std() {
            Ok(age) => age < ttl,
            Err(_) => true,
        }
    }

    /// Lookup without a freshness check. Corrupt or unreadable entries are
    /// misses, never errors.
    pub async fn get(&self, key: &CacheKey) -> Option<CachedSeries> {
        let hex = key.as_hex();

        match tokio::fs::read(self.current_path(hex)).await {
            Ok(bytes) => match bincode::deserialize::<CachedSeries>(&bytes) {
                Ok(entry) => return Some(entry),
                Err(e) => {
                    warn!(key = hex, error = %e, "Corrupt cache entry, treating as miss");
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(key = hex, error = %e, "Unreadable cache entry, treating as miss");
            }
        }

        // Legacy entries stay readable until migrate() rewrites them.
        match tokio::fs::read(self.legacy_path(hex)).await {
            Ok(bytes) => match serde_json::from_slice::<CachedSeries>(&bytes) {
                Ok(entry) => {
                    debug!(key = hex, "Served legacy-encoded cache entry");
                    Some(entry)
                }
                Err(e) => {
                    warn!(key = hex, error = %e, "Corrupt legacy cache entry, treating as miss");
                    None
                }
            },
            Err(_) => None,
        }
    }

    /// Lookup honoring the caller-supplied TTL. Stale entries are misses.
    pub async fn get_fresh(&self, key: &CacheKey, ttl: Duration) -> Option<CachedSeries> {
        let entry = self.get(key).await?;
        if Self::is_valid(&entry, ttl) {
            debug!(key = key.as_hex(), records = entry.records.len(), "Cache hit");
            Some(entry)
        } else {
            debug!(key = key.as_hex(), written_at = %entry.written_at, "Cache entry expired");
            None
        }
    }

    /// Overwrite the entry for `key`. Never merges partial series;
    /// last-writer-wins on concurrent puts to the same key.
    pub async fn put(&self, key: &CacheKey, entry: &CachedSeries) -> Result<(), Error> {
        let hex = key.as_hex();
        let lock = self.key_lock(hex).await;
        let _guard = lock.lock().await;

        self.write_current(hex, entry).await
    }

    /// Encode and atomically replace the current-format file for `hex`.
    /// Caller must hold the per-key write lock.
    async fn write_current(&self, hex: &str, entry: &CachedSeries) -> Result<(), Error> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let bytes = bincode::serialize(entry)?;
        let suffix: u32 = rand::thread_rng().gen();
        let tmp = self.dir.join(format!("{}.tmp-{:08x}", hex, suffix));

        tokio::fs::write(&tmp, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, self.current_path(hex)).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        debug!(key = hex, bytes = bytes.len(), records = entry.records.len(), "Cache entry written");
        Ok(())
    }

    /// Re-encode every legacy entry into the current format and remove the
    /// legacy copy. Returns how many entries were migrated.
    ///
    /// Safe to run while normal get/put traffic continues: each entry is
    /// rewritten under its per-key lock and replaced by rename. Running it
    /// again immediately reports zero.
    pub async fn migrate(&self) -> Result<usize, Error> {
        if !self.dir.exists() {
            return Ok(0);
        }

        let mut migrated = 0usize;
        let mut dir = tokio::fs::read_dir(&self.dir).await?;

        while let Some(dirent) = dir.next_entry().await? {
            let path = dirent.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let hex = match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) => stem.to_string(),
                None => continue,
            };

            let lock = self.key_lock(&hex).await;
            let _guard = lock.lock().await;

            // Re-check under the lock: a concurrent migrate or put may have
            // handled this entry already.
            if !path.exists() {
                continue;
            }
            if self.current_path(&hex).exists() {
                // A put since the legacy write supersedes this entry.
                tokio::fs::remove_file(&path).await?;
                debug!(key = %hex, "Removed superseded legacy cache entry");
                continue;
            }

            let bytes = tokio::fs::read(&path).await?;
            let mut entry: CachedSeries = match serde_json::from_slice(&bytes) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(key = %hex, error = %e, "Dropping corrupt legacy cache entry");
                    tokio::fs::remove_file(&path).await?;
                    continue;
                }
            };

            entry.version = CACHE_ENCODING_VERSION;
            self.write_current(&hex, &entry).await?;
            tokio::fs::remove_file(&path).await?;
            migrated += 1;
        }

        info!(migrated = migrated, dir = %self.dir.display(), "Cache migration finished");
        Ok(migrated)
    }

    /// Entry and size counts for status reporting.
    pub async fn stats(&self) -> Result<CacheStats, Error> {
        let mut stats = CacheStats::default();
        if !self.dir.exists() {
            return Ok(stats);
        }

        let mut dir = tokio::fs::read_dir(&self.dir).await?;
        while let Some(dirent) = dir.next_entry().await? {
            let path = dirent.path();
            match path.extension().and_then(|e| e.to_str()) {
                Some("bin") => stats.current_entries += 1,
                Some("json") => stats.legacy_entries += 1,
                _ => continue,
            }
            if let Ok(meta) = dirent.metadata().await {
                stats.total_bytes += meta.len();
            }
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Interval, Period};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn sample_records(n: usize) -> Vec<Ohlcv> {
        (0..n)
            .map(|i| {
                let time = Utc.timestamp_opt(1_700_000_000 + i as i64 * 86_400, 0).unwrap();
                Ohlcv::new(time, 10.0 + i as f64, 11.0 + i as f64, 9.5 + i as f64, 10.5 + i as f64, 1_000 + i as u64)
            })
            .collect()
    }

    fn key() -> CacheKey {
        CacheKey::new("AAPL", Period::OneYear, Interval::Daily)
    }

    #[tokio::test]
    async fn test_put_then_get_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = CacheStore::new(tmp.path().to_path_buf());

        let entry = CachedSeries::new("AAPL", sample_records(5));
        store.put(&key(), &entry).await.unwrap();

        let read = store.get_fresh(&key(), Duration::from_secs(60)).await.unwrap();
        assert_eq!(read.records, entry.records);
        assert_eq!(read.version, CACHE_ENCODING_VERSION);
    }

    #[tokio::test]
    async fn test_ttl_is_a_property_of_the_read() {
        let tmp = TempDir::new().unwrap();
        let store = CacheStore::new(tmp.path().to_path_buf());

        // Backdated write simulates an entry two hours old.
        let mut entry = CachedSeries::new("AAPL", sample_records(3));
        entry.written_at = Utc::now() - chrono::Duration::hours(2);
        store.put(&key(), &entry).await.unwrap();

        // Same artifact, different staleness tolerances.
        assert!(store.get_fresh(&key(), Duration::from_secs(3600)).await.is_none());
        assert!(store.get_fresh(&key(), Duration::from_secs(3 * 3600)).await.is_some());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let tmp = TempDir::new().unwrap();
        let store = CacheStore::new(tmp.path().to_path_buf());

        store.put(&key(), &CachedSeries::new("AAPL", sample_records(5))).await.unwrap();
        store.put(&key(), &CachedSeries::new("AAPL", sample_records(8))).await.unwrap();

        let read = store.get(&key()).await.unwrap();
        assert_eq!(read.records.len(), 8);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss() {
        let tmp = TempDir::new().unwrap();
        let store = CacheStore::new(tmp.path().to_path_buf());

        std::fs::write(store.current_path(key().as_hex()), b"not bincode").unwrap();
        assert!(store.get(&key()).await.is_none());
    }

    #[tokio::test]
    async fn test_legacy_entry_readable_before_migration() {
        let tmp = TempDir::new().unwrap();
        let store = CacheStore::new(tmp.path().to_path_buf());

        let mut entry = CachedSeries::new("AAPL", sample_records(4));
        entry.version = 1;
        let json = serde_json::to_vec(&entry).unwrap();
        std::fs::write(store.legacy_path(key().as_hex()), json).unwrap();

        let read = store.get(&key()).await.unwrap();
        assert_eq!(read.records, entry.records);
    }

    #[tokio::test]
    async fn test_migration_is_idempotent_and_preserves_content() {
        let tmp = TempDir::new().unwrap();
        let store = CacheStore::new(tmp.path().to_path_buf());

        let keys: Vec<CacheKey> = ["AAPL", "MSFT", "BTC"]
            .iter()
            .map(|s| CacheKey::new(s, Period::OneYear, Interval::Daily))
            .collect();
        let mut originals = Vec::new();
        for (i, k) in keys.iter().enumerate() {
            let mut entry = CachedSeries::new(&format!("SYM{}", i), sample_records(3 + i));
            entry.version = 1;
            std::fs::write(store.legacy_path(k.as_hex()), serde_json::to_vec(&entry).unwrap()).unwrap();
            originals.push(entry);
        }

        assert_eq!(store.migrate().await.unwrap(), 3);
        assert_eq!(store.migrate().await.unwrap(), 0);

        for (k, original) in keys.iter().zip(&originals) {
            assert!(!store.legacy_path(k.as_hex()).exists());
            let read = store.get(k).await.unwrap();
            assert_eq!(read.records, original.records);
            assert_eq!(read.version, CACHE_ENCODING_VERSION);
        }
    }

    #[tokio::test]
    async fn test_migration_skips_entries_superseded_by_put() {
        let tmp = TempDir::new().unwrap();
        let store = CacheStore::new(tmp.path().to_path_buf());

        let mut legacy = CachedSeries::new("AAPL", sample_records(2));
        legacy.version = 1;
        std::fs::write(store.legacy_path(key().as_hex()), serde_json::to_vec(&legacy).unwrap()).unwrap();

        let fresh = CachedSeries::new("AAPL", sample_records(9));
        store.put(&key(), &fresh).await.unwrap();

        assert_eq!(store.migrate().await.unwrap(), 0);
        assert!(!store.legacy_path(key().as_hex()).exists());
        assert_eq!(store.get(&key()).await.unwrap().records.len(), 9);
    }

    #[tokio::test]
    async fn test_concurrent_reads_never_see_torn_entry() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(CacheStore::new(tmp.path().to_path_buf()));

        let old = CachedSeries::new("AAPL", sample_records(500));
        store.put(&key(), &old).await.unwrap();

        let writer = {
            let store = store.clone();
            tokio::spawn(async move {
                let new = CachedSeries::new("AAPL", sample_records(900));
                store.put(&key(), &new).await.unwrap();
            })
        };

        let readers: Vec<_> = (0..100)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.get(&key()).await })
            })
            .collect();

        for reader in readers {
            let read = reader.await.unwrap().expect("entry must always be present");
            assert!(read.records.len() == 500 || read.records.len() == 900);
        }
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_stats_counts_encodings() {
        let tmp = TempDir::new().unwrap();
        let store = CacheStore::new(tmp.path().to_path_buf());

        store.put(&key(), &CachedSeries::new("AAPL", sample_records(2))).await.unwrap();
        let other = CacheKey::new("BTC", Period::OneYear, Interval::Daily);
        let mut legacy = CachedSeries::new("BTC", sample_records(2));
        legacy.version = 1;
        std::fs::write(store.legacy_path(other.as_hex()), serde_json::to_vec(&legacy).unwrap()).unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.current_entries, 1);
        assert_eq!(stats.legacy_entries, 1);
        assert!(stats.total_bytes > 0);
    }
}
