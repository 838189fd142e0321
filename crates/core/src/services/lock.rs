//! Mutual exclusion gate for poll creation.
//!
//! The store has no unique constraint on poll titles, so the
//! open-or-create path is a bare check-then-act. This gate serializes
//! that critical section process-wide. It is scoped to a single
//! process (or a single shared filesystem); multi-instance deployments
//! need a distributed lock instead and can disable this one.

use std::future::Future;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ballot_common::{AppError, AppResult, IdGenerator, LockConfig};
use tokio::io::AsyncWriteExt;

/// Trait for the poll-creation gate.
///
/// `acquire` blocks cooperatively (yielding to other tasks) until the
/// gate is free. Callers should go through [`with_lock`], which
/// guarantees release on every exit path.
#[async_trait]
pub trait Locker: Send + Sync {
    /// Take the gate, waiting until it is free.
    async fn acquire(&self) -> AppResult<()>;

    /// Release the gate.
    async fn release(&self) -> AppResult<()>;
}

/// Run `op` inside the gate's critical section.
///
/// The gate is released whether `op` succeeds or fails. A release
/// failure is logged; it only surfaces as the call's error when `op`
/// itself succeeded.
pub async fn with_lock<F, Fut, T>(locker: &dyn Locker, op: F) -> AppResult<T>
where
    F: FnOnce() -> Fut + Send,
    Fut: Future<Output = AppResult<T>> + Send,
    T: Send,
{
    locker.acquire().await?;

    let result = op().await;

    if let Err(release_err) = locker.release().await {
        tracing::error!(error = %release_err, "Failed to release poll-creation lock");
        if result.is_ok() {
            return Err(release_err);
        }
    }

    result
}

/// Pass-through gate for deployments that rely on an external unique
/// constraint instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLocker;

#[async_trait]
impl Locker for NoopLocker {
    async fn acquire(&self) -> AppResult<()> {
        Ok(())
    }

    async fn release(&self) -> AppResult<()> {
        Ok(())
    }
}

/// Exclusive-create file lock with cooperative retry.
///
/// Acquisition races on `O_CREAT|O_EXCL`: whoever creates the lock
/// file holds the gate; everyone else sleeps and retries. A lock file
/// older than `stale_after` is treated as abandoned by a crashed
/// holder and reclaimed.
pub struct FileLocker {
    path: PathBuf,
    retry_interval: Duration,
    stale_after: Duration,
    /// Opaque token written into the lock file, so logs can tell whose
    /// stale lock got reclaimed.
    owner: String,
}

impl FileLocker {
    /// Create a file locker from configuration.
    #[must_use]
    pub fn new(config: &LockConfig) -> Self {
        Self {
            path: PathBuf::from(&config.path),
            retry_interval: Duration::from_millis(config.retry_interval_ms),
            stale_after: Duration::from_secs(config.stale_after_secs),
            owner: IdGenerator::new().generate_token(),
        }
    }

    async fn try_create(&self) -> std::io::Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .await?;
        file.write_all(self.owner.as_bytes()).await?;
        Ok(())
    }

    /// Remove the lock file if it has outlived `stale_after`. Returns
    /// whether the caller should retry immediately.
    async fn reclaim_if_stale(&self) -> AppResult<bool> {
        let meta = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta,
            // Freed between our create attempt and this check.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(true),
            Err(e) => return Err(AppError::Lock(e.to_string())),
        };

        let age = meta.modified().ok().and_then(|m| m.elapsed().ok());
        if !age.is_some_and(|age| age >= self.stale_after) {
            return Ok(false);
        }

        let previous_owner = tokio::fs::read_to_string(&self.path)
            .await
            .unwrap_or_default();
        tracing::warn!(
            path = %self.path.display(),
            previous_owner = %previous_owner,
            "Reclaiming stale poll-creation lock"
        );

        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(true),
            Err(e) => Err(AppError::Lock(e.to_string())),
        }
    }
}

#[async_trait]
impl Locker for FileLocker {
    async fn acquire(&self) -> AppResult<()> {
        loop {
            match self.try_create().await {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if self.reclaim_if_stale().await? {
                        continue;
                    }
                    tokio::time::sleep(self.retry_interval).await;
                }
                Err(e) => return Err(AppError::Lock(e.to_string())),
            }
        }
    }

    async fn release(&self) -> AppResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            // Already reclaimed as stale by another waiter.
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Lock(e.to_string())),
        }
    }
}

/// Build the configured gate implementation.
#[must_use]
pub fn locker_from_config(config: &LockConfig) -> Arc<dyn Locker> {
    if config.enabled {
        Arc::new(FileLocker::new(config))
    } else {
        tracing::warn!(
            "Poll-creation lock is disabled; duplicate-title protection must come from the store"
        );
        Arc::new(NoopLocker)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    fn scratch_config(stale_after_secs: u64) -> LockConfig {
        let path = std::env::temp_dir().join(format!(
            "ballot-lock-test-{}",
            IdGenerator::new().generate_token()
        ));
        LockConfig {
            enabled: true,
            path: path.to_string_lossy().into_owned(),
            retry_interval_ms: 1,
            stale_after_secs,
        }
    }

    #[tokio::test]
    async fn test_noop_locker_passes_through() {
        let result = with_lock(&NoopLocker, || async { Ok::<_, AppError>(42) })
            .await
            .unwrap();
        assert_eq!(result, 42);
    }

    #[tokio::test]
    async fn test_acquire_creates_lock_file_and_release_removes_it() {
        let config = scratch_config(60);
        let locker = FileLocker::new(&config);

        locker.acquire().await.unwrap();
        assert!(tokio::fs::try_exists(&config.path).await.unwrap());

        locker.release().await.unwrap();
        assert!(!tokio::fs::try_exists(&config.path).await.unwrap());
    }

    #[tokio::test]
    async fn test_lock_released_when_operation_fails() {
        let config = scratch_config(60);
        let locker = FileLocker::new(&config);

        let result = with_lock(&locker, || async {
            Err::<(), _>(AppError::Internal("boom".to_string()))
        })
        .await;

        assert!(result.is_err());
        assert!(!tokio::fs::try_exists(&config.path).await.unwrap());
    }

    #[tokio::test]
    async fn test_critical_sections_do_not_overlap() {
        let config = scratch_config(60);
        let locker = Arc::new(FileLocker::new(&config));

        let inside = Arc::new(AtomicBool::new(false));
        let entered = Arc::new(AtomicU32::new(0));

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let locker = Arc::clone(&locker);
                let inside = Arc::clone(&inside);
                let entered = Arc::clone(&entered);

                tokio::spawn(async move {
                    with_lock(locker.as_ref(), || async {
                        assert!(!inside.swap(true, Ordering::SeqCst), "lock overlap");
                        entered.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        inside.store(false, Ordering::SeqCst);
                        Ok::<_, AppError>(())
                    })
                    .await
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(entered.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_stale_lock_is_reclaimed() {
        let config = scratch_config(0);
        tokio::fs::write(&config.path, b"crashed-holder").await.unwrap();

        let locker = FileLocker::new(&config);
        locker.acquire().await.unwrap();

        locker.release().await.unwrap();
    }

    #[tokio::test]
    async fn test_release_tolerates_missing_file() {
        let config = scratch_config(60);
        let locker = FileLocker::new(&config);

        locker.release().await.unwrap();
    }
}
