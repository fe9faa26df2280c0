use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Query, RawPathParams},
    http::HeaderMap,
    routing::{on, MethodFilter, MethodRouter},
    Json, Router,
};
use bytes::Bytes;
use serde_json::Value;
use tracing::warn;

use blueprint_core::{ControllerMeta, HookStage, HttpMethod, ParamSource, RouteRecord};

use crate::dispatch::{RequestCtx, RestController};
use crate::error::{ApiError, RequestError};

/// Build an axum router from a controller's route records.
///
/// This is the runtime reader for HTTP metadata: every stored record becomes
/// one axum route whose closure resolves the declared bindings, runs the
/// hook pipeline, and dispatches by handler name.
pub fn controller_router(meta: Arc<ControllerMeta>, controller: Arc<dyn RestController>) -> Router {
    let mut routes: HashMap<String, MethodRouter> = HashMap::new();

    for record in meta.routes() {
        let meta = Arc::clone(&meta);
        let controller = Arc::clone(&controller);
        let record_for_handler = record.clone();

        let handler = move |path_params: RawPathParams,
                            Query(query): Query<HashMap<String, String>>,
                            OriginalUri(uri): OriginalUri,
                            headers: HeaderMap,
                            body: Bytes| async move {
            let record = record_for_handler;
            let mut ctx = RequestCtx::from_parts("rest", record.method.as_str(), &uri, &headers);

            resolve_bindings(&meta, &record, &path_params, &query, &body, &mut ctx)
                .map_err(|e| ApiError(e.into_anyhow()))?;

            run_route(&meta, controller.as_ref(), &record, &mut ctx).await
        };

        let filter = method_filter(record.method);
        let method_router = match routes.remove(&record.path) {
            Some(existing) => existing.on(filter, handler),
            None => on(filter, handler),
        };
        routes.insert(record.path.clone(), method_router);
    }

    let mut router = Router::new();
    for (path, method_router) in routes {
        router = router.route(&path, method_router);
    }
    router
}

fn method_filter(method: HttpMethod) -> MethodFilter {
    match method {
        HttpMethod::Get => MethodFilter::GET,
        HttpMethod::Post => MethodFilter::POST,
        HttpMethod::Put => MethodFilter::PUT,
        HttpMethod::Delete => MethodFilter::DELETE,
        HttpMethod::Patch => MethodFilter::PATCH,
        HttpMethod::Head => MethodFilter::HEAD,
        HttpMethod::Options => MethodFilter::OPTIONS,
    }
}

/// Fill `ctx.body` and `ctx.params` from the request per the declared
/// bindings. A missing required binding fails here, before any hook runs.
fn resolve_bindings(
    meta: &ControllerMeta,
    record: &RouteRecord,
    path_params: &RawPathParams,
    query: &HashMap<String, String>,
    body: &Bytes,
    ctx: &mut RequestCtx,
) -> Result<(), RequestError> {
    if !body.is_empty() {
        ctx.body = Some(serde_json::from_slice(body).map_err(|_| RequestError::InvalidBody)?);
    }

    let path: HashMap<&str, &str> = path_params.iter().collect();

    for binding in meta.bindings_for(&record.handler) {
        let value = match binding.source {
            ParamSource::Path => path.get(binding.name.as_str()).map(|v| v.to_string()),
            ParamSource::Query => query.get(&binding.name).cloned(),
            ParamSource::Header => ctx.header(&binding.name).map(|v| v.to_string()),
            ParamSource::Body => ctx
                .body
                .as_ref()
                .and_then(|b| b.get(&binding.name))
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                }),
        };

        match value {
            Some(v) => {
                ctx.params.insert(binding.name.clone(), v);
            }
            None if binding.required => {
                return Err(RequestError::MissingParam {
                    source: binding.source.name(),
                    name: binding.name.clone(),
                });
            }
            None => {}
        }
    }

    Ok(())
}

async fn run_route(
    meta: &ControllerMeta,
    controller: &dyn RestController,
    record: &RouteRecord,
    ctx: &mut RequestCtx,
) -> Result<Json<Value>, ApiError> {
    match dispatch_with_hooks(meta, controller, record, ctx).await {
        Ok(value) => Ok(Json(value)),
        Err(err) => {
            // Error hooks observe the failure; they cannot swallow it.
            for hook in meta.hooks_for(HookStage::OnError) {
                if let Err(hook_err) = controller.hook(&hook.handler, HookStage::OnError, ctx).await
                {
                    warn!(handler = %hook.handler, error = %hook_err, "Error hook failed");
                }
            }
            Err(ApiError(err))
        }
    }
}

/// The request pipeline: on_request and pre_handler hooks in declaration
/// order, the handler, then on_response hooks in reverse order.
async fn dispatch_with_hooks(
    meta: &ControllerMeta,
    controller: &dyn RestController,
    record: &RouteRecord,
    ctx: &mut RequestCtx,
) -> anyhow::Result<Value> {
    for hook in meta.hooks_for(HookStage::OnRequest) {
        controller
            .hook(&hook.handler, HookStage::OnRequest, ctx)
            .await?;
    }
    for hook in meta.hooks_for(HookStage::PreHandler) {
        controller
            .hook(&hook.handler, HookStage::PreHandler, ctx)
            .await?;
    }

    let value = controller.dispatch(&record.handler, ctx.clone()).await?;

    for hook in meta.hooks_for(HookStage::OnResponse).rev() {
        controller
            .hook(&hook.handler, HookStage::OnResponse, ctx)
            .await?;
    }

    Ok(value)
}
