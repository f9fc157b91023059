//! The user handler contract and its execution models.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use serde::Deserialize;

use crate::http::request::Request;
use crate::http::response::Response;

/// A user-supplied request handler: a pure function from request to
/// response. Closures with the matching signature implement it directly.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, request: Request) -> Response;
}

impl<F> Handler for F
where
    F: Fn(Request) -> Response + Send + Sync + 'static,
{
    fn handle(&self, request: Request) -> Response {
        (self)(request)
    }
}

/// Where handler invocations run.
///
/// `Inline` calls the handler on the connection's own task and is the
/// default; a blocking handler stalls only its own connection. `Offloaded`
/// runs the handler on the blocking pool, so handlers for distinct
/// connections may run in parallel while invocations for one connection
/// stay serialized (the connection task awaits each result).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerModel {
    Inline,
    Offloaded,
}

/// Invokes the handler exactly once for a frozen request. A panicking
/// handler is contained and answered with the canonical 500.
pub async fn invoke(handler: Arc<dyn Handler>, model: HandlerModel, request: Request) -> Response {
    match model {
        HandlerModel::Inline => {
            std::panic::catch_unwind(AssertUnwindSafe(|| handler.handle(request))).unwrap_or_else(
                |_| {
                    tracing::error!("handler panicked");
                    Response::internal_error()
                },
            )
        }
        HandlerModel::Offloaded => {
            match tokio::task::spawn_blocking(move || handler.handle(request)).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(error = %e, "offloaded handler failed");
                    Response::internal_error()
                }
            }
        }
    }
}
