use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use axum::http::{HeaderMap, Uri};
use serde_json::Value;

use blueprint_core::HookStage;

/// Request context handed to controller handlers.
///
/// Carries only what the binding metadata extracted from the request, not
/// the raw axum types, so controllers stay transport-agnostic.
#[derive(Debug, Clone, Default)]
pub struct RequestCtx {
    /// Which reader produced the context ("rest", "lifecycle", ...)
    pub provider: String,
    pub method: String,
    pub path: String,
    /// Values resolved from the declared parameter bindings
    pub params: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    /// Parsed JSON body, when the request carried one
    pub body: Option<Value>,
    pub raw_query: Option<String>,
}

impl RequestCtx {
    pub fn from_parts(provider: &str, method: &str, uri: &Uri, headers: &HeaderMap) -> Self {
        let mut out = Self {
            provider: provider.to_string(),
            method: method.to_string(),
            path: uri.path().to_string(),
            raw_query: uri.query().map(|s| s.to_string()),
            ..Default::default()
        };

        for (k, v) in headers.iter() {
            if let Ok(s) = v.to_str() {
                out.headers.insert(k.to_string(), s.to_string());
            }
        }

        out
    }

    /// Context for app-scoped lifecycle hooks, which have no request
    pub fn lifecycle() -> Self {
        Self {
            provider: "lifecycle".to_string(),
            ..Default::default()
        }
    }

    /// A bound parameter by name
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|v| v.as_str())
    }

    /// A request header by (lowercase) name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|v| v.as_str())
    }
}

/// Server-side dispatch for a controller.
///
/// The metadata records store handler *names*; this trait is the runtime
/// counterpart that maps those names back to code, the Rust analogue of a
/// reflective method lookup.
#[async_trait]
pub trait RestController: Send + Sync + 'static {
    /// Invoke the route handler registered under `handler`
    async fn dispatch(&self, handler: &str, ctx: RequestCtx) -> Result<Value>;

    /// Invoke a lifecycle hook handler.
    ///
    /// The default ignores unknown hooks so controllers only implement the
    /// stages they declared.
    async fn hook(&self, _handler: &str, _stage: HookStage, _ctx: &mut RequestCtx) -> Result<()> {
        Ok(())
    }
}
