//! Library template created with FerrisUp

//! blueprint-axum: Axum adapter for Blueprint.
//!
//! The runtime reader for controller metadata: builds axum routers and the
//! request hook pipeline from stored records, runs app lifecycle hooks, and
//! wires scheduled jobs into the blueprint-cron runner.

pub mod app;
pub mod dispatch;
pub mod router;
mod error;

pub use app::BlueprintApp;
pub use dispatch::{RequestCtx, RestController};
pub use error::{ApiError, RequestError};
pub use router::controller_router;
