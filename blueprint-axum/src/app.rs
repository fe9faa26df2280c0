use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use blueprint_core::{Controller, HookStage, MetadataRegistry};
use blueprint_cron::{CronHandler, CronRunner, RunnerHandle};

use crate::dispatch::{RequestCtx, RestController};
use crate::router::controller_router;

type ErasedCronHandler = Arc<dyn CronHandler<Output = ()>>;

/// The application container: owns the metadata registry, the mounted
/// controllers, and the composed axum router.
///
/// Controllers are mounted once; everything else (routes, hooks, jobs) is
/// read back from their stored metadata.
pub struct BlueprintApp {
    registry: MetadataRegistry,
    controllers: HashMap<String, Arc<dyn RestController>>,
    cron_handlers: HashMap<String, ErasedCronHandler>,
    router: Router,
}

impl BlueprintApp {
    pub fn new() -> Self {
        Self {
            registry: MetadataRegistry::new(),
            controllers: HashMap::new(),
            cron_handlers: HashMap::new(),
            router: Router::new(),
        }
    }

    /// Register a controller's metadata and nest its routes under the
    /// controller's mount prefix.
    pub fn mount<C>(mut self, controller: Arc<C>) -> anyhow::Result<Self>
    where
        C: Controller + RestController,
    {
        let meta = self.registry.register::<C>()?;
        let erased: Arc<dyn RestController> = controller;

        let router = controller_router(Arc::clone(&meta), Arc::clone(&erased));
        self.router = if meta.prefix() == "/" {
            self.router.merge(router)
        } else {
            self.router.nest(meta.prefix(), router)
        };

        self.controllers.insert(meta.name().to_string(), erased);
        info!(controller = %meta.name(), prefix = %meta.prefix(), routes = meta.routes().len(), "Mounted controller");
        Ok(self)
    }

    /// Register the runtime implementation for a scheduled-job handler name
    pub fn job_handler(mut self, name: impl Into<String>, handler: ErasedCronHandler) -> Self {
        self.cron_handlers.insert(name.into(), handler);
        self
    }

    /// Read every mounted controller's job records, pair them with their
    /// registered handlers, and start the scheduler.
    pub fn schedule_jobs(&self) -> anyhow::Result<RunnerHandle> {
        let mut runner = CronRunner::new();

        for meta in self.registry.iter() {
            for record in meta.jobs() {
                let handler = self.cron_handlers.get(&record.handler).ok_or_else(|| {
                    anyhow::anyhow!(
                        "No cron handler registered for '{}' (job '{}')",
                        record.handler,
                        record.name
                    )
                })?;
                runner.register(record.clone(), Arc::clone(handler))?;
            }
        }

        info!(jobs = runner.len(), "Starting job scheduler");
        Ok(runner.start()?)
    }

    /// The stored metadata, for introspection
    pub fn registry(&self) -> &MetadataRegistry {
        &self.registry
    }

    /// The composed router with tracing and request-id middleware applied
    pub fn into_router(self) -> Router {
        apply_layers(self.router)
    }

    /// Bind, run `on_ready` hooks, serve, then run `on_close` hooks once
    /// the server future resolves.
    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        self.run_app_hooks(HookStage::OnReady).await?;

        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "Listening");

        let router = apply_layers(self.router.clone());
        let served = axum::serve(listener, router).await;

        self.run_app_hooks(HookStage::OnClose).await?;
        served?;
        Ok(())
    }

    /// Run every controller's hooks for an app-scoped stage
    async fn run_app_hooks(&self, stage: HookStage) -> anyhow::Result<()> {
        for meta in self.registry.iter() {
            let Some(controller) = self.controllers.get(meta.name()) else {
                continue;
            };
            for hook in meta.hooks_for(stage) {
                let mut ctx = RequestCtx::lifecycle();
                controller.hook(&hook.handler, stage, &mut ctx).await?;
            }
        }
        Ok(())
    }
}

impl Default for BlueprintApp {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_layers(router: Router) -> Router {
    // Layering is inside-out: propagate innermost, set-request-id outermost.
    router
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
