use std::collections::HashMap;

use blueprint_cron::CronJobRecord;

use crate::binding::ParamBinding;
use crate::errors::{MetadataError, MetadataResult};
use crate::hook::{HookRecord, HookStage};
use crate::method::HttpMethod;
use crate::route::{RouteOptions, RouteRecord};

/// Everything a controller declares: routes, hooks, parameter bindings, and
/// scheduled jobs.
///
/// All mutating methods validate synchronously, so a `ControllerMeta` that
/// was built without errors is safe for any runtime reader to consume.
#[derive(Debug, Clone)]
pub struct ControllerMeta {
    name: String,
    prefix: String,
    routes: Vec<RouteRecord>,
    hooks: Vec<HookRecord>,
    bindings: HashMap<String, Vec<ParamBinding>>,
    jobs: Vec<CronJobRecord>,
}

impl ControllerMeta {
    /// Create metadata for a controller, mounted at `/<name>` by default
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let prefix = format!("/{name}");
        Self {
            name,
            prefix,
            routes: Vec::new(),
            hooks: Vec::new(),
            bindings: HashMap::new(),
            jobs: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path the controller's routes are nested under
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Change the mount prefix; must start with `/`
    pub fn mount_at(&mut self, prefix: impl Into<String>) -> MetadataResult<&mut Self> {
        let prefix = prefix.into();
        if !prefix.starts_with('/') {
            return Err(MetadataError::InvalidPrefix(prefix));
        }
        self.prefix = prefix;
        Ok(self)
    }

    /// Declare a route. Duplicate `(method, path)` pairs are rejected.
    pub fn route(
        &mut self,
        method: HttpMethod,
        path: &str,
        handler: &str,
    ) -> MetadataResult<&mut Self> {
        self.route_with(method, path, handler, RouteOptions::default())
    }

    /// Declare a route with options
    pub fn route_with(
        &mut self,
        method: HttpMethod,
        path: &str,
        handler: &str,
        options: RouteOptions,
    ) -> MetadataResult<&mut Self> {
        let record = RouteRecord::new(method, path, handler)?.with_options(options);
        if self
            .routes
            .iter()
            .any(|r| r.method == record.method && r.path == record.path)
        {
            return Err(MetadataError::DuplicateRoute {
                controller: self.name.clone(),
                method: record.method,
                path: record.path,
            });
        }
        self.routes.push(record);
        Ok(self)
    }

    /// Declare a lifecycle hook. Duplicate `(stage, handler)` pairs are
    /// rejected.
    pub fn hook(&mut self, stage: HookStage, handler: &str) -> MetadataResult<&mut Self> {
        if self
            .hooks
            .iter()
            .any(|h| h.stage == stage && h.handler == handler)
        {
            return Err(MetadataError::DuplicateHook {
                controller: self.name.clone(),
                stage: stage.name(),
                handler: handler.to_string(),
            });
        }
        self.hooks.push(HookRecord::new(stage, handler));
        Ok(self)
    }

    /// Bind a request value to a handler parameter. Duplicate
    /// `(source, name)` pairs per handler are rejected.
    pub fn bind(&mut self, handler: &str, binding: ParamBinding) -> MetadataResult<&mut Self> {
        let bindings = self.bindings.entry(handler.to_string()).or_default();
        if bindings
            .iter()
            .any(|b| b.source == binding.source && b.name == binding.name)
        {
            return Err(MetadataError::DuplicateBinding {
                handler: handler.to_string(),
                binding_source: binding.source.name(),
                name: binding.name,
            });
        }
        bindings.push(binding);
        Ok(self)
    }

    /// Declare a scheduled job. Duplicate job names are rejected.
    pub fn job(&mut self, record: CronJobRecord) -> MetadataResult<&mut Self> {
        if self.jobs.iter().any(|j| j.name == record.name) {
            return Err(MetadataError::DuplicateJob {
                controller: self.name.clone(),
                name: record.name,
            });
        }
        self.jobs.push(record);
        Ok(self)
    }

    pub fn routes(&self) -> &[RouteRecord] {
        &self.routes
    }

    pub fn hooks(&self) -> &[HookRecord] {
        &self.hooks
    }

    /// Hooks declared for one stage, in declaration order
    pub fn hooks_for(&self, stage: HookStage) -> impl DoubleEndedIterator<Item = &HookRecord> {
        self.hooks.iter().filter(move |h| h.stage == stage)
    }

    /// Bindings declared for a handler name
    pub fn bindings_for(&self, handler: &str) -> &[ParamBinding] {
        self.bindings
            .get(handler)
            .map(|b| b.as_slice())
            .unwrap_or(&[])
    }

    pub fn jobs(&self) -> &[CronJobRecord] {
        &self.jobs
    }
}

/// A type that declares controller metadata.
///
/// The runtime counterpart (actually invoking the named handlers) lives in
/// the adapter crates; this trait is purely declarative.
pub trait Controller {
    /// Controller name, unique per registry
    const NAME: &'static str;

    /// Declare routes, hooks, bindings, and jobs
    fn describe(meta: &mut ControllerMeta) -> MetadataResult<()>;
}
