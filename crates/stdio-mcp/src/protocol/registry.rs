//! Method-name to handler registration.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::value::RawValue;
use serde_json::Value;

use crate::types::methods::INITIALIZE;
use crate::types::{McpError, McpResult};

/// A request handler. Receives the raw `params` member, if any.
///
/// Errors become error responses; they never reach the transport.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle(&self, params: Option<Box<RawValue>>) -> McpResult<Value>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> RequestHandler for FnHandler<F>
where
    F: Fn(Option<Box<RawValue>>) -> Fut + Send + Sync,
    Fut: Future<Output = McpResult<Value>> + Send,
{
    async fn handle(&self, params: Option<Box<RawValue>>) -> McpResult<Value> {
        (self.0)(params).await
    }
}

/// Handlers keyed by method name, populated before the connection starts.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn RequestHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method`, replacing any earlier one.
    ///
    /// `initialize` belongs to the dispatcher and cannot be registered.
    pub fn register<H>(&mut self, method: impl Into<String>, handler: H) -> &mut Self
    where
        H: RequestHandler + 'static,
    {
        let method = method.into();
        if method == INITIALIZE {
            tracing::warn!("Ignoring handler registration for reserved method '{INITIALIZE}'");
            return self;
        }
        if self
            .handlers
            .insert(method.clone(), Arc::new(handler))
            .is_some()
        {
            tracing::warn!("Replaced existing handler for '{method}'");
        }
        self
    }

    /// Register an async closure as the handler for `method`.
    pub fn register_fn<F, Fut>(&mut self, method: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(Option<Box<RawValue>>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = McpResult<Value>> + Send + 'static,
    {
        self.register(method, FnHandler(f))
    }

    pub fn get(&self, method: &str) -> Option<Arc<dyn RequestHandler>> {
        self.handlers.get(method).cloned()
    }

    pub fn contains(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    /// Registered method names, sorted.
    pub fn methods(&self) -> Vec<&str> {
        let mut methods: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        methods.sort_unstable();
        methods
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Decode required params into `T`.
pub fn decode_params<T: DeserializeOwned>(
    method: &str,
    params: Option<Box<RawValue>>,
) -> McpResult<T> {
    let raw = params.ok_or_else(|| McpError::InvalidParams(format!("{method} params required")))?;
    serde_json::from_str(raw.get()).map_err(|e| McpError::InvalidParams(e.to_string()))
}

/// Decode optional params, falling back to `T::default()` when absent.
pub fn decode_optional_params<T: DeserializeOwned + Default>(
    params: Option<Box<RawValue>>,
) -> McpResult<T> {
    params
        .map(|raw| serde_json::from_str(raw.get()))
        .transpose()
        .map_err(|e| McpError::InvalidParams(e.to_string()))
        .map(Option::unwrap_or_default)
}
