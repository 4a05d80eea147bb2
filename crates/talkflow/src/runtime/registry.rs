//! Flow registry and service builder.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use super::config::FlowServiceConfig;
use super::lock::SessionLocks;
use crate::error::{Error, Result};
use crate::field::FlowDefinition;
use crate::finish::{FinishContext, FinishHandler};
use crate::flow::{FinishOutcome, Flow, Values};
use crate::service::FlowService;
use crate::store::{FlowStackStorage, MemoryFlowStack, SessionStore};

/// Type-erased flow entry for dynamic dispatch.
///
/// Lets the registry hold flows with different record types in one map
/// while the handler still receives its typed record.
#[async_trait]
pub(crate) trait FlowEntry: Send + Sync {
    fn definition(&self) -> &FlowDefinition;

    /// Decode `values` into the record and run the handler's `finish`.
    ///
    /// The outer error is a decode failure; the inner one is the handler's
    /// domain error rendered to text.
    async fn finish(
        &self,
        values: Values,
        ctx: &FinishContext,
    ) -> Result<std::result::Result<FinishOutcome, String>>;

    /// Decode the frame's values and run the handler's `resume`.
    async fn resume(
        &self,
        values: Values,
        ctx: &FinishContext,
    ) -> Result<std::result::Result<FinishOutcome, String>>;
}

/// Typed entry capturing the handler at registration.
struct TypedFlowEntry<H: FinishHandler> {
    definition: FlowDefinition,
    handler: H,
}

impl<H: FinishHandler> TypedFlowEntry<H> {
    fn decode(&self, values: Values) -> Result<H::Flow> {
        serde_json::from_value(Value::Object(values))
            .map_err(|e| Error::record_decode(<H::Flow as Flow>::NAME, e))
    }
}

#[async_trait]
impl<H: FinishHandler> FlowEntry for TypedFlowEntry<H> {
    fn definition(&self) -> &FlowDefinition {
        &self.definition
    }

    async fn finish(
        &self,
        values: Values,
        ctx: &FinishContext,
    ) -> Result<std::result::Result<FinishOutcome, String>> {
        let record = self.decode(values)?;
        Ok(self
            .handler
            .finish(record, ctx)
            .await
            .map_err(|e| e.to_string()))
    }

    async fn resume(
        &self,
        values: Values,
        ctx: &FinishContext,
    ) -> Result<std::result::Result<FinishOutcome, String>> {
        let record = self.decode(values)?;
        Ok(self
            .handler
            .resume(record, ctx)
            .await
            .map_err(|e| e.to_string()))
    }
}

/// Registry mapping flow names and callback hashes to their entries.
pub(crate) struct FlowRegistry {
    entries: HashMap<&'static str, Box<dyn FlowEntry>>,
    hashes: HashMap<String, &'static str>,
}

impl FlowRegistry {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            hashes: HashMap::new(),
        }
    }

    /// Look up a flow by name.
    ///
    /// Returns the static flow name alongside the entry so callers can
    /// build [`FinishContext`] values.
    pub(crate) fn get(&self, flow: &str) -> Option<(&'static str, &dyn FlowEntry)> {
        self.entries
            .get_key_value(flow)
            .map(|(k, v)| (*k, v.as_ref()))
    }

    /// Look up a flow by the callback hash stamped on its buttons.
    pub(crate) fn by_hash(&self, hash: &str) -> Option<(&'static str, &dyn FlowEntry)> {
        self.hashes.get(hash).and_then(|name| self.get(name))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Registered flow names, sorted.
    pub(crate) fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

/// Builder for constructing a [`FlowService`].
///
/// Definition errors are deferred to [`build`](Self::build) so that
/// registration chains stay fluent.
///
/// # Example
///
/// ```ignore
/// let service = FlowService::builder(MemorySessionStore::new(), FlowServiceConfig::default())
///     .register(SignupHandler::new(db.clone()))
///     .register(TeamHandler::new(db))
///     .stack(MemoryFlowStack::new())
///     .build()?;
/// ```
pub struct FlowServiceBuilder<S: SessionStore> {
    store: S,
    stack: Arc<dyn FlowStackStorage>,
    registry: FlowRegistry,
    duplicate_flow: Option<String>,
    deferred_error: Option<Error>,
    config: FlowServiceConfig,
}

impl<S: SessionStore> FlowServiceBuilder<S> {
    pub(crate) fn new(store: S, config: FlowServiceConfig) -> Self {
        Self {
            store,
            stack: Arc::new(MemoryFlowStack::new()),
            registry: FlowRegistry::new(),
            duplicate_flow: None,
            deferred_error: None,
            config,
        }
    }

    /// Register a flow with its finish handler.
    ///
    /// The flow is inferred from the handler's associated type and keyed
    /// by its `NAME`. Each flow can only be registered once.
    pub fn register<H: FinishHandler>(mut self, handler: H) -> Self {
        let name = <H::Flow as Flow>::NAME;
        if self.registry.entries.contains_key(name) {
            if self.duplicate_flow.is_none() {
                self.duplicate_flow = Some(name.to_string());
            }
            return self;
        }

        let definition = match FlowDefinition::build::<H::Flow>() {
            Ok(definition) => definition,
            Err(err) => {
                self.deferred_error.get_or_insert(err);
                return self;
            }
        };

        let hash = definition.hash().to_string();
        if let Some(existing) = self.registry.hashes.get(&hash) {
            self.deferred_error.get_or_insert(Error::CallbackCollision {
                first: existing.to_string(),
                second: name.to_string(),
                hash,
            });
            return self;
        }

        self.registry.hashes.insert(hash, name);
        self.registry
            .entries
            .insert(name, Box::new(TypedFlowEntry { definition, handler }));
        self
    }

    /// Replace the flow stack backend.
    ///
    /// If not called, uses an in-memory [`MemoryFlowStack`].
    pub fn stack(mut self, stack: impl FlowStackStorage + 'static) -> Self {
        self.stack = Arc::new(stack);
        self
    }

    /// Replace the service configuration.
    pub fn config(mut self, config: FlowServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<FlowService<S>> {
        if let Some(flow) = self.duplicate_flow {
            return Err(Error::DuplicateFlow(flow));
        }
        if let Some(err) = self.deferred_error {
            return Err(err);
        }

        let skip = self.config.skip_keyword.as_str();
        for (_, entry) in self.registry.entries.iter() {
            let def = entry.definition();
            if let Some((trigger, owner)) = def
                .transforms()
                .triggers()
                .into_iter()
                .find(|(trigger, _)| *trigger == skip)
            {
                return Err(Error::ConflictingTrigger {
                    flow: def.name(),
                    trigger: trigger.to_string(),
                    first: "skip",
                    second: owner,
                });
            }
        }

        info!(flows = ?self.registry.names(), "flow service built");

        Ok(FlowService::new(
            self.store,
            self.stack,
            Arc::new(self.registry),
            Arc::new(SessionLocks::default()),
            self.config,
        ))
    }
}
