//! Name-keyed registry of input stream handler factories

use std::collections::HashMap;
use std::sync::Arc;

use cadence_core::{CadenceError, CadenceResult};
use cadence_stream::InputStreamCollection;
use tracing::{debug, warn};

use crate::{HandlerOptions, InputStreamHandler, SyncSetInputStreamHandler};

/// Builds a handler for a node's streams
pub type HandlerFactory =
    fn(Arc<InputStreamCollection>, &HandlerOptions) -> Arc<dyn InputStreamHandler>;

/// Explicit table of handler factories, populated at start-up.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    factories: HashMap<String, HandlerFactory>,
}

impl HandlerRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every handler shipped in this crate
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(
            SyncSetInputStreamHandler::NAME,
            |streams, options| -> Arc<dyn InputStreamHandler> {
                Arc::new(SyncSetInputStreamHandler::new(
                    streams,
                    options.sync_set.clone(),
                ))
            },
        );
        registry
    }

    /// Register a factory under `name`, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, factory: HandlerFactory) {
        let name = name.into();
        if self.factories.insert(name.clone(), factory).is_some() {
            warn!(handler = %name, "replacing registered input stream handler");
        } else {
            debug!(handler = %name, "registered input stream handler");
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Instantiate the handler registered under `name`.
    pub fn create(
        &self,
        name: &str,
        streams: Arc<InputStreamCollection>,
        options: &HandlerOptions,
    ) -> CadenceResult<Arc<dyn InputStreamHandler>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| CadenceError::UnknownHandler(name.to_string()))?;
        Ok(factory(streams, options))
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}
