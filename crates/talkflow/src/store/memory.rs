//! In-memory stores.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{FlowStackStorage, SessionStore, StackFrame};
use crate::error::Result;
use crate::flow::{SessionKey, UserId};
use crate::session::SessionState;

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-local session store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<Mutex<HashMap<SessionKey, SessionState>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        locked(&self.sessions).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &SessionKey) -> Result<Option<SessionState>> {
        Ok(locked(&self.sessions).get(key).cloned())
    }

    async fn set(&self, key: &SessionKey, state: SessionState) -> Result<()> {
        locked(&self.sessions).insert(key.clone(), state);
        Ok(())
    }

    async fn delete(&self, key: &SessionKey) -> Result<()> {
        locked(&self.sessions).remove(key);
        Ok(())
    }

    async fn sessions_for(&self, user: &UserId) -> Result<Vec<SessionState>> {
        Ok(locked(&self.sessions)
            .iter()
            .filter(|(key, _)| &key.user == user)
            .map(|(_, state)| state.clone())
            .collect())
    }
}

/// Process-local flow stack.
#[derive(Debug, Clone, Default)]
pub struct MemoryFlowStack {
    frames: Arc<Mutex<HashMap<UserId, Vec<StackFrame>>>>,
}

impl MemoryFlowStack {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FlowStackStorage for MemoryFlowStack {
    async fn push(&self, user: &UserId, frame: StackFrame) -> Result<()> {
        locked(&self.frames)
            .entry(user.clone())
            .or_default()
            .push(frame);
        Ok(())
    }

    async fn pop(&self, user: &UserId, child: &str) -> Result<Option<StackFrame>> {
        let mut frames = locked(&self.frames);
        let Some(stack) = frames.get_mut(user) else {
            return Ok(None);
        };
        if stack.last().is_none_or(|top| top.child != child) {
            return Ok(None);
        }
        let frame = stack.pop();
        if stack.is_empty() {
            frames.remove(user);
        }
        Ok(frame)
    }

    async fn depth(&self, user: &UserId) -> Result<usize> {
        Ok(locked(&self.frames).get(user).map_or(0, Vec::len))
    }
}
