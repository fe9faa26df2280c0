use serde::{Deserialize, Serialize};

/// When in the request or application lifecycle a hook runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookStage {
    /// As soon as a request reaches the controller
    OnRequest,

    /// After bindings are resolved, right before the handler
    PreHandler,

    /// After the handler, before the response is serialized
    OnResponse,

    /// When the handler or an earlier hook failed
    OnError,

    /// Application startup, before the listener accepts traffic
    OnReady,

    /// Application shutdown, after the server future resolves
    OnClose,
}

impl HookStage {
    /// Stages that run per request rather than per application lifecycle
    pub fn is_request_scoped(self) -> bool {
        matches!(
            self,
            Self::OnRequest | Self::PreHandler | Self::OnResponse | Self::OnError
        )
    }

    /// Get the stage name as a string
    pub fn name(self) -> &'static str {
        match self {
            Self::OnRequest => "on_request",
            Self::PreHandler => "pre_handler",
            Self::OnResponse => "on_response",
            Self::OnError => "on_error",
            Self::OnReady => "on_ready",
            Self::OnClose => "on_close",
        }
    }

    pub fn all() -> &'static [HookStage] {
        &[
            Self::OnRequest,
            Self::PreHandler,
            Self::OnResponse,
            Self::OnError,
            Self::OnReady,
            Self::OnClose,
        ]
    }
}

/// Stored descriptor mapping a lifecycle stage to a handler name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookRecord {
    pub stage: HookStage,
    pub handler: String,
}

impl HookRecord {
    pub fn new(stage: HookStage, handler: impl Into<String>) -> Self {
        Self {
            stage,
            handler: handler.into(),
        }
    }
}
