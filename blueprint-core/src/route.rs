use serde::{Deserialize, Serialize};

use crate::errors::{MetadataError, MetadataResult};
use crate::method::HttpMethod;

/// Extra, transport-agnostic route metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteOptions {
    /// Human-readable description
    pub description: Option<String>,

    /// Free-form tags for grouping in listings
    pub tags: Vec<String>,

    /// Hide the route from introspection output
    pub hidden: bool,
}

impl RouteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// Stored descriptor mapping an HTTP method + path to a handler name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRecord {
    pub method: HttpMethod,
    pub path: String,
    pub handler: String,
    pub options: RouteOptions,
}

impl RouteRecord {
    /// Create a record; the path must start with `/`
    pub fn new(
        method: HttpMethod,
        path: impl Into<String>,
        handler: impl Into<String>,
    ) -> MetadataResult<Self> {
        let path = path.into();
        if !path.starts_with('/') {
            return Err(MetadataError::InvalidPath(path));
        }
        Ok(Self {
            method,
            path,
            handler: handler.into(),
            options: RouteOptions::default(),
        })
    }

    pub fn with_options(mut self, options: RouteOptions) -> Self {
        self.options = options;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_method_accepts_slash_prefixed_paths() {
        for method in HttpMethod::all() {
            assert!(RouteRecord::new(*method, "/things", "list").is_ok());
        }
    }

    #[test]
    fn paths_without_leading_slash_are_rejected() {
        assert!(matches!(
            RouteRecord::new(HttpMethod::Get, "things", "list"),
            Err(MetadataError::InvalidPath(p)) if p == "things"
        ));
    }
}
