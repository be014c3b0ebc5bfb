//! Disk-backed staging cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bincas_core::{ContentKey, Digested, HashingReader};
use bytes::Bytes;
use jiff::{SignedDuration, Timestamp};
use tempfile::TempDir;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::StagingConfig;
use crate::staged::StagedObject;
use crate::{Error, Result, TRACING_TARGET_CACHE};

const PARTIAL_SUFFIX: &str = ".partial";

/// Local staging area keyed by content.
///
/// Cloning is cheap; clones share the same directory and bookkeeping.
#[derive(Debug, Clone)]
pub struct StagingCache {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    root: StagingRoot,
    expiry: SignedDuration,
    held_expiry: SignedDuration,
    entries: Mutex<HashMap<ContentKey, Entry>>,
}

/// A private temporary directory is removed together with the cache.
#[derive(Debug)]
enum StagingRoot {
    Owned(TempDir),
    Configured(PathBuf),
}

impl StagingRoot {
    fn path(&self) -> &Path {
        match self {
            Self::Owned(dir) => dir.path(),
            Self::Configured(path) => path,
        }
    }
}

#[derive(Debug)]
struct Entry {
    path: PathBuf,
    staged_at: Timestamp,
    last_touched: Timestamp,
    holders: usize,
}

impl StagingCache {
    /// Creates a staging cache from configuration.
    ///
    /// Without a configured directory a private temporary directory is
    /// created and removed when the last clone is dropped. A configured
    /// directory is scanned for leftovers of an earlier process: partial
    /// writes are deleted and fully staged files are adopted as unheld
    /// entries, so the next sweep reclaims them.
    pub fn new(config: &StagingConfig) -> Result<Self> {
        let (root, entries) = match &config.staging_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                let entries = recover(dir)?;
                (StagingRoot::Configured(dir.clone()), entries)
            }
            None => {
                let dir = tempfile::Builder::new()
                    .prefix("bincas-staging-")
                    .tempdir()?;
                (StagingRoot::Owned(dir), HashMap::new())
            }
        };

        let expiry = signed(config.expiry());
        let held_expiry = signed(config.held_expiry());

        tracing::debug!(
            target: TRACING_TARGET_CACHE,
            dir = %root.path().display(),
            expiry_secs = config.staging_expiry_secs,
            held_expiry_secs = config.held_expiry().as_secs(),
            "Staging cache initialized"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                root,
                expiry,
                held_expiry,
                entries: Mutex::new(entries),
            }),
        })
    }

    /// Returns the staging directory.
    pub fn dir(&self) -> &Path {
        self.inner.root.path()
    }

    /// Number of distinct keys currently staged.
    pub async fn len(&self) -> usize {
        self.inner.entries.lock().await.len()
    }

    /// Returns `true` if nothing is staged.
    pub async fn is_empty(&self) -> bool {
        self.inner.entries.lock().await.is_empty()
    }

    /// Drains `reader` to disk, returning its key, size and media type.
    ///
    /// Each call counts as one holder of the key until [`evict`](Self::evict)
    /// releases it. Expired entries are swept first.
    pub async fn store<R>(&self, reader: R) -> Result<StagedObject>
    where
        R: AsyncRead + Unpin + Send,
    {
        self.sweep_expired().await;

        let partial = self.dir().join(format!("{}{PARTIAL_SUFFIX}", Uuid::now_v7()));
        let digested = match write_partial(&partial, reader).await {
            Ok(digested) => digested,
            Err(e) => {
                discard(&partial).await;
                tracing::warn!(
                    target: TRACING_TARGET_CACHE,
                    error = %e,
                    "Failed to stage stream"
                );
                return Err(e.into());
            }
        };

        let Digested {
            key,
            size,
            mime_type,
        } = digested;
        let now = Timestamp::now();

        let mut entries = self.inner.entries.lock().await;
        let existing = entries.get_mut(&key).map(|entry| {
            entry.holders += 1;
            entry.last_touched = now;
            entry.staged_at
        });

        let staged_at = match existing {
            Some(staged_at) => {
                drop(entries);
                discard(&partial).await;
                staged_at
            }
            None => {
                let path = self.dir().join(key.to_string());
                if let Err(e) = fs::rename(&partial, &path).await {
                    drop(entries);
                    discard(&partial).await;
                    return Err(e.into());
                }
                entries.insert(
                    key.clone(),
                    Entry {
                        path,
                        staged_at: now,
                        last_touched: now,
                        holders: 1,
                    },
                );
                now
            }
        };

        tracing::debug!(
            target: TRACING_TARGET_CACHE,
            key = %key,
            size,
            mime_type,
            "Content staged"
        );

        Ok(StagedObject::new(key, size, mime_type.to_owned(), staged_at))
    }

    /// Reads the staged bytes for `key`.
    pub async fn read(&self, key: &ContentKey) -> Result<Bytes> {
        let path = self.touch(key).await?;
        Ok(Bytes::from(fs::read(&path).await?))
    }

    /// Releases one holder of each key, removing files nobody holds anymore.
    ///
    /// Unknown keys are ignored. Returns the number of files removed.
    pub async fn evict<'a, I>(&self, keys: I) -> usize
    where
        I: IntoIterator<Item = &'a ContentKey>,
    {
        let mut released = Vec::new();
        {
            let mut entries = self.inner.entries.lock().await;
            for key in keys {
                let Some(entry) = entries.get_mut(key) else {
                    continue;
                };
                entry.holders = entry.holders.saturating_sub(1);
                if entry.holders == 0
                    && let Some(entry) = entries.remove(key)
                {
                    released.push((key.clone(), entry.path));
                }
            }
        }

        for (key, path) in &released {
            discard(path).await;
            tracing::debug!(target: TRACING_TARGET_CACHE, key = %key, "Staged content evicted");
        }

        released.len()
    }

    /// Removes entries left untouched for too long, whether or not they were
    /// evicted. Returns the number of entries removed.
    ///
    /// Unheld entries expire after the unused-window. Entries a caller still
    /// holds expire only after the held window, which is never shorter.
    pub async fn sweep_expired(&self) -> usize {
        let now = Timestamp::now();
        let expired: Vec<(ContentKey, Entry)> = {
            let mut entries = self.inner.entries.lock().await;
            let keys: Vec<ContentKey> = entries
                .iter()
                .filter(|(_, entry)| {
                    let window = match entry.holders {
                        0 => self.inner.expiry,
                        _ => self.inner.held_expiry,
                    };
                    now.duration_since(entry.last_touched) >= window
                })
                .map(|(key, _)| key.clone())
                .collect();
            keys.into_iter()
                .filter_map(|key| entries.remove(&key).map(|entry| (key, entry)))
                .collect()
        };

        for (key, entry) in &expired {
            discard(&entry.path).await;
            tracing::debug!(
                target: TRACING_TARGET_CACHE,
                key = %key,
                holders = entry.holders,
                "Expired staged content swept"
            );
        }

        if !expired.is_empty() {
            tracing::info!(
                target: TRACING_TARGET_CACHE,
                count = expired.len(),
                "Swept expired staging entries"
            );
        }

        expired.len()
    }

    /// Spawns a background task that sweeps expired entries every `period`.
    ///
    /// The task keeps the cache alive until it is aborted.
    pub fn spawn_sweeper(&self, period: Duration) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                cache.sweep_expired().await;
            }
        })
    }

    async fn touch(&self, key: &ContentKey) -> Result<PathBuf> {
        let mut entries = self.inner.entries.lock().await;
        let entry = entries.get_mut(key).ok_or_else(|| Error::not_staged(key))?;
        entry.last_touched = Timestamp::now();
        Ok(entry.path.clone())
    }
}

fn signed(duration: Duration) -> SignedDuration {
    SignedDuration::try_from(duration).unwrap_or(SignedDuration::MAX)
}

/// Deletes `*.partial` files and adopts `<hex-key>` files found in `dir`.
fn recover(dir: &Path) -> std::io::Result<HashMap<ContentKey, Entry>> {
    let mut entries = HashMap::new();
    let mut discarded = 0usize;

    for dirent in std::fs::read_dir(dir)? {
        let dirent = dirent?;
        let path = dirent.path();
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };

        if name.ends_with(PARTIAL_SUFFIX) {
            match std::fs::remove_file(&path) {
                Ok(()) => discarded += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(
                        target: TRACING_TARGET_CACHE,
                        path = %path.display(),
                        error = %e,
                        "Failed to remove partial staging file"
                    );
                }
            }
            continue;
        }

        let Ok(key) = ContentKey::from_hex(name) else {
            continue;
        };
        let metadata = dirent.metadata()?;
        if !metadata.is_file() {
            continue;
        }

        let touched = metadata
            .modified()
            .ok()
            .and_then(|mtime| Timestamp::try_from(mtime).ok())
            .unwrap_or_else(Timestamp::now);
        entries.insert(
            key,
            Entry {
                path,
                staged_at: touched,
                last_touched: touched,
                holders: 0,
            },
        );
    }

    if discarded > 0 || !entries.is_empty() {
        tracing::info!(
            target: TRACING_TARGET_CACHE,
            dir = %dir.display(),
            adopted = entries.len(),
            discarded,
            "Recovered leftover staging files"
        );
    }

    Ok(entries)
}

async fn write_partial<R>(path: &Path, reader: R) -> std::io::Result<Digested>
where
    R: AsyncRead + Unpin + Send,
{
    let mut file = fs::File::create(path).await?;
    let mut reader = HashingReader::new(reader);
    tokio::io::copy(&mut reader, &mut file).await?;
    file.flush().await?;
    Ok(reader.finalize())
}

async fn discard(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(
                target: TRACING_TARGET_CACHE,
                path = %path.display(),
                error = %e,
                "Failed to remove staged file"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use tokio::io::ReadBuf;

    use super::*;

    /// Yields a few bytes, then fails.
    struct FailingReader {
        sent: bool,
    }

    impl AsyncRead for FailingReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.sent {
                return Poll::Ready(Err(io::Error::other("connection reset")));
            }
            self.sent = true;
            buf.put_slice(b"partial");
            Poll::Ready(Ok(()))
        }
    }

    fn cache_in(dir: &Path) -> StagingCache {
        StagingCache::new(&StagingConfig::default().with_dir(dir)).unwrap()
    }

    fn files_in(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn store_keys_and_replays_content() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path());

        let staged = cache.store(&b"hello staging"[..]).await.unwrap();
        assert_eq!(staged.key(), &ContentKey::digest(b"hello staging"));
        assert_eq!(staged.size(), 13);
        assert_eq!(staged.mime_type(), "text/plain");

        let bytes = cache.read(staged.key()).await.unwrap();
        assert_eq!(&bytes[..], b"hello staging");

        assert!(dir.path().join(staged.key().to_string()).exists());
    }

    #[tokio::test]
    async fn identical_content_shares_one_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path());

        let first = cache.store(&b"same"[..]).await.unwrap();
        let second = cache.store(&b"same"[..]).await.unwrap();
        assert_eq!(first.key(), second.key());
        assert_eq!(cache.len().await, 1);
        assert_eq!(files_in(dir.path()), 1);

        assert_eq!(cache.evict([first.key()]).await, 0);
        assert!(cache.read(first.key()).await.is_ok());

        assert_eq!(cache.evict([second.key()]).await, 1);
        assert!(cache.is_empty().await);
        assert_eq!(files_in(dir.path()), 0);
    }

    #[tokio::test]
    async fn evict_unknown_key_is_noop() {
        let cache = StagingCache::new(&StagingConfig::default()).unwrap();
        let key = ContentKey::digest(b"never staged");

        assert_eq!(cache.evict([&key]).await, 0);
        assert_eq!(cache.evict([&key]).await, 0);
        assert!(matches!(
            cache.read(&key).await,
            Err(Error::NotStaged { .. })
        ));
    }

    #[tokio::test]
    async fn failed_stream_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path());

        let err = cache.store(FailingReader { sent: false }).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(cache.is_empty().await);
        assert_eq!(files_in(dir.path()), 0);
    }

    #[tokio::test]
    async fn sweep_spares_held_entries_within_the_held_window() {
        let dir = tempfile::tempdir().unwrap();
        let config = StagingConfig::default()
            .with_dir(dir.path())
            .with_expiry_secs(0);
        let cache = StagingCache::new(&config).unwrap();

        let staged = cache.store(&b"in flight"[..]).await.unwrap();
        assert_eq!(cache.sweep_expired().await, 0);
        assert_eq!(&cache.read(staged.key()).await.unwrap()[..], b"in flight");

        assert_eq!(cache.evict([staged.key()]).await, 1);
        assert_eq!(files_in(dir.path()), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_stores_survive_a_zero_window_sweeper() {
        let config = StagingConfig::default().with_expiry_secs(0);
        let cache = StagingCache::new(&config).unwrap();
        let sweeper = cache.spawn_sweeper(Duration::from_millis(1));

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..64u32 {
            let cache = cache.clone();
            tasks.spawn(async move {
                let payload = i.to_le_bytes().repeat(2048);
                let staged = cache.store(&payload[..]).await?;
                tokio::task::yield_now().await;
                let bytes = cache.read(staged.key()).await?;
                cache.evict([staged.key()]).await;
                Ok::<_, Error>(bytes.len())
            });
        }

        while let Some(result) = tasks.join_next().await {
            assert_eq!(result.unwrap().unwrap(), 8192);
        }
        sweeper.abort();
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn sweep_removes_abandoned_held_entries() {
        let dir = tempfile::tempdir().unwrap();
        let config = StagingConfig::default()
            .with_dir(dir.path())
            .with_expiry_secs(0)
            .with_held_expiry_secs(0);
        let cache = StagingCache::new(&config).unwrap();

        let staged = cache.store(&b"forgotten"[..]).await.unwrap();
        assert_eq!(cache.len().await, 1);

        assert_eq!(cache.sweep_expired().await, 1);
        assert!(cache.is_empty().await);
        assert_eq!(files_in(dir.path()), 0);
        assert!(cache.read(staged.key()).await.is_err());
    }

    #[tokio::test]
    async fn sweep_keeps_recent_entries() {
        let cache = StagingCache::new(&StagingConfig::default()).unwrap();
        cache.store(&b"fresh"[..]).await.unwrap();

        assert_eq!(cache.sweep_expired().await, 0);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn background_sweeper_clears_expired_entries() {
        let config = StagingConfig::default()
            .with_expiry_secs(0)
            .with_held_expiry_secs(0);
        let cache = StagingCache::new(&config).unwrap();
        cache.store(&b"abandoned"[..]).await.unwrap();
        assert_eq!(cache.len().await, 1);

        let sweeper = cache.spawn_sweeper(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(50)).await;
        sweeper.abort();

        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn leftovers_of_an_earlier_process_are_reclaimed() {
        let dir = tempfile::tempdir().unwrap();
        let key = ContentKey::digest(b"left behind");
        std::fs::write(dir.path().join(key.to_string()), b"left behind").unwrap();
        std::fs::write(dir.path().join("0190-dead.partial"), b"half").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"unrelated").unwrap();

        let config = StagingConfig::default()
            .with_dir(dir.path())
            .with_expiry_secs(0);
        let cache = StagingCache::new(&config).unwrap();
        assert_eq!(cache.len().await, 1);
        assert!(!dir.path().join("0190-dead.partial").exists());

        assert_eq!(cache.sweep_expired().await, 1);
        assert!(cache.is_empty().await);
        assert!(!dir.path().join(key.to_string()).exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[tokio::test]
    async fn adopted_leftovers_are_reused_then_released() {
        let dir = tempfile::tempdir().unwrap();
        let key = ContentKey::digest(b"left behind");
        std::fs::write(dir.path().join(key.to_string()), b"left behind").unwrap();

        let cache = cache_in(dir.path());
        assert_eq!(&cache.read(&key).await.unwrap()[..], b"left behind");

        let staged = cache.store(&b"left behind"[..]).await.unwrap();
        assert_eq!(staged.key(), &key);
        assert_eq!(files_in(dir.path()), 1);

        assert_eq!(cache.evict([&key]).await, 1);
        assert_eq!(files_in(dir.path()), 0);
    }

    #[tokio::test]
    async fn private_directory_is_removed_on_drop() {
        let cache = StagingCache::new(&StagingConfig::default()).unwrap();
        let dir = cache.dir().to_path_buf();
        cache.store(&b"temporary"[..]).await.unwrap();
        assert!(dir.exists());

        drop(cache);
        assert!(!dir.exists());
    }
}
