//! Per-session event serialization.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::flow::SessionKey;

const PRUNE_THRESHOLD: usize = 1024;

/// One async mutex per session key.
///
/// The guard is held for the whole event, including option loading,
/// persistence and `finish`, so events for one key run strictly one after
/// another in arrival order while different keys proceed in parallel.
#[derive(Debug, Default)]
pub(crate) struct SessionLocks {
    locks: Mutex<HashMap<SessionKey, Arc<AsyncMutex<()>>>>,
}

impl SessionLocks {
    pub(crate) async fn lock(&self, key: &SessionKey) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            if locks.len() > PRUNE_THRESHOLD {
                // Only the map holds these: nobody owns or awaits them.
                locks.retain(|_, m| Arc::strong_count(m) > 1);
            }
            Arc::clone(locks.entry(key.clone()).or_default())
        };
        mutex.lock_owned().await
    }
}
