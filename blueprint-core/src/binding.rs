use serde::{Deserialize, Serialize};

/// Where a bound request parameter is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamSource {
    /// A path capture, e.g. `{id}`
    Path,

    /// A query-string key
    Query,

    /// A request header
    Header,

    /// A top-level key of the JSON body
    Body,
}

impl ParamSource {
    /// Get the source name as a string
    pub fn name(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Body => "body",
        }
    }
}

/// Stored descriptor binding one request value to a handler parameter.
///
/// Bindings are attached per handler name; the runtime reader resolves them
/// from the incoming request before dispatch. A missing required binding
/// fails the request before the handler runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamBinding {
    pub source: ParamSource,
    pub name: String,
    pub required: bool,
}

impl ParamBinding {
    pub fn new(source: ParamSource, name: impl Into<String>) -> Self {
        Self {
            source,
            name: name.into(),
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}
