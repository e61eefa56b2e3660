//! Dispatcher
//!
//! Routes an inbound request to one of four outcomes: CORS preflight,
//! documentation redirect, method rejection, or handler execution. The
//! decision is an explicit ordered enumeration, evaluated top to bottom.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, HOST, LOCATION};
use axum::http::{Method, StatusCode};
use axum::response::Response;
use fnhost_core::{EngineError, TraceId};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::request::LambdaRequest;
use crate::responder::Responder;
use crate::server::EngineState;

/// Base URL GET requests redirect to
const DOCS_BASE_URL: &str = "https://github.com/node-lambdas/";
/// Host suffix stripped to derive the project name for the redirect
const HOST_SUFFIX: &str = ".jsfn.run";

/// Where a request goes; variants are tried in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// OPTIONS: CORS preflight, empty 204
    Preflight,
    /// GET: redirect to the project documentation
    Documentation,
    /// Anything that is not OPTIONS, GET, or POST: 405
    MethodNotAllowed,
    /// POST: run the configured handler
    Execute,
}

pub fn decide(method: &Method) -> RouteDecision {
    match *method {
        Method::OPTIONS => RouteDecision::Preflight,
        Method::GET => RouteDecision::Documentation,
        Method::POST => RouteDecision::Execute,
        _ => RouteDecision::MethodNotAllowed,
    }
}

/// Top-level entry: one call per inbound request
pub async fn dispatch(State(state): State<Arc<EngineState>>, request: Request) -> Response {
    let trace_id = TraceId::new();
    match decide(request.method()) {
        RouteDecision::Preflight => preflight(&trace_id),
        RouteDecision::Documentation => documentation(&trace_id, &request),
        RouteDecision::MethodNotAllowed => method_not_allowed(),
        RouteDecision::Execute => execute(state, trace_id, request).await,
    }
}

fn preflight(trace_id: &TraceId) -> Response {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header("X-Trace-Id", trace_id.as_str())
        .body(Body::empty())
        .unwrap()
}

/// Strip the marketing-domain suffix from a Host header to get the project
/// name; anything else (including a host with an explicit port) yields ""
fn project_name(host: &str) -> &str {
    host.strip_suffix(HOST_SUFFIX).unwrap_or("")
}

fn documentation(trace_id: &TraceId, request: &Request) -> Response {
    let host = request
        .headers()
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    Response::builder()
        .status(StatusCode::FOUND)
        .header(LOCATION, format!("{DOCS_BASE_URL}{}", project_name(host)))
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header("X-Trace-Id", trace_id.as_str())
        .body(Body::empty())
        .unwrap()
}

fn method_not_allowed() -> Response {
    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .body(Body::empty())
        .unwrap()
}

/// The execute path: CORS, contract preparation, body read, handler
/// invocation under the configured deadline, single completion.
///
/// Every failure in here completes as an error response; no request is left
/// without one.
async fn execute(state: Arc<EngineState>, trace_id: TraceId, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let mut req = LambdaRequest::new(parts.method, parts.uri, parts.headers, trace_id);
    let output = state.contract.prepare(&mut req);

    let mut responder = Responder::new(req.trace_id.clone(), output, req.uri.to_string());
    responder.set_header(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));

    let deadline = state.handler_timeout;
    let contract = state.contract.clone();
    // catch_unwind keeps a panicking handler from tearing the connection
    // down without a response
    let outcome = tokio::time::timeout(
        deadline,
        AssertUnwindSafe(async {
            req.read_body(body).await?;
            responder.set_request_body(req.body_log_form());
            contract.run(req).await
        })
        .catch_unwind(),
    )
    .await;

    match outcome {
        Ok(Ok(Ok(reply))) => responder.finish(reply),
        Ok(Ok(Err(err))) => responder.finish_error(&err),
        Ok(Err(panic)) => responder.finish_error(&EngineError::Handler(panic_message(&panic))),
        Err(_elapsed) => responder.finish_error(&EngineError::Timeout(deadline.as_secs())),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}
