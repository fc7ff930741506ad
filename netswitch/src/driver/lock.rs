//! Per-device exclusive locks.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use dashmap::DashMap;
use log::debug;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::{DriverError, Result};

static GLOBAL: LazyLock<DeviceLocks> = LazyLock::new(DeviceLocks::new);

/// Registry of one lock per device, keyed by hostname.
///
/// Clones share the same locks. Switches built without an explicit registry
/// use [`DeviceLocks::global`], so every wrapper in the process targeting a
/// given device serializes on the same lock.
#[derive(Debug, Clone, Default)]
pub struct DeviceLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl DeviceLocks {
    /// An isolated registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> Self {
        GLOBAL.clone()
    }

    /// Wait for the lock on `host`, giving up after `timeout` when set.
    pub async fn acquire(&self, host: &str, timeout: Option<Duration>) -> Result<DeviceLockGuard> {
        let lock = self.locks.entry(host.to_string()).or_default().value().clone();

        debug!("waiting for device lock on {host}");
        let guard = match timeout {
            Some(waited) => tokio::time::timeout(waited, lock.lock_owned())
                .await
                .map_err(|_| DriverError::LockTimeout {
                    host: host.to_string(),
                    waited,
                })?,
            None => lock.lock_owned().await,
        };
        debug!("acquired device lock on {host}");

        Ok(DeviceLockGuard {
            host: host.to_string(),
            _guard: guard,
        })
    }

    /// Whether someone currently holds the lock on `host`.
    pub fn is_locked(&self, host: &str) -> bool {
        self.locks
            .get(host)
            .is_some_and(|lock| lock.try_lock().is_err())
    }
}

/// Held for as long as a switch is connected; dropping it releases the device.
#[derive(Debug)]
pub struct DeviceLockGuard {
    host: String,
    _guard: OwnedMutexGuard<()>,
}

impl DeviceLockGuard {
    pub fn host(&self) -> &str {
        &self.host
    }
}

impl Drop for DeviceLockGuard {
    fn drop(&mut self) {
        debug!("released device lock on {}", self.host);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_host_serializes() {
        let locks = DeviceLocks::new();
        let first = locks.acquire("my.switch", None).await.unwrap();
        assert!(locks.is_locked("my.switch"));

        let err = locks
            .acquire("my.switch", Some(Duration::from_millis(20)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Driver(DriverError::LockTimeout { .. })
        ));

        drop(first);
        assert!(!locks.is_locked("my.switch"));
        let again = locks.acquire("my.switch", Some(Duration::from_millis(20))).await;
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn test_different_hosts_are_independent() {
        let locks = DeviceLocks::new();
        let _a = locks.acquire("a.switch", None).await.unwrap();
        let b = locks.acquire("b.switch", Some(Duration::from_millis(20))).await;
        assert_eq!(b.unwrap().host(), "b.switch");
    }

    #[tokio::test]
    async fn test_clones_share_locks() {
        let locks = DeviceLocks::new();
        let other = locks.clone();
        let _guard = locks.acquire("my.switch", None).await.unwrap();
        assert!(other.is_locked("my.switch"));
        assert!(!DeviceLocks::new().is_locked("my.switch"));
    }
}
