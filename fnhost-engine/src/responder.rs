//! Response contract
//!
//! A [`Responder`] is constructed once per request and consumed by the single
//! completion call; double completion is unrepresentable. The old
//! arity-overloaded `send` is replaced by the discriminated [`Completion`]
//! operations carried on a [`Reply`].

use axum::body::Body;
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::StatusCode;
use axum::response::Response;
use fnhost_core::{EngineError, Format, Payload, TraceId};
use tracing::{error, info, warn};

/// What a handler asks the engine to do with the response
#[derive(Debug)]
pub enum Completion {
    /// Complete with a body and implicit status 200
    Complete(Payload),
    /// Complete with an explicit status
    CompleteWithStatus(u16, Payload),
    /// Error path: log the message, complete 500 with an empty body
    Fail(String),
    /// Status 400 with the given message (default "Invalid input") plus a
    /// trailing newline
    Reject(Option<String>),
}

/// A handler's reply: response headers plus one [`Completion`]
#[derive(Debug)]
pub struct Reply {
    headers: Vec<(String, String)>,
    completion: Completion,
}

impl Reply {
    /// Complete with status 200
    pub fn send(body: impl Into<Payload>) -> Self {
        Self {
            headers: Vec::new(),
            completion: Completion::Complete(body.into()),
        }
    }

    /// Complete with an explicit status
    pub fn with_status(status: u16, body: impl Into<Payload>) -> Self {
        Self {
            headers: Vec::new(),
            completion: Completion::CompleteWithStatus(status, body.into()),
        }
    }

    /// Route to the error path: logged, status 500, empty body
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            headers: Vec::new(),
            completion: Completion::Fail(message.into()),
        }
    }

    /// Status 400 with the default "Invalid input" message
    pub fn reject() -> Self {
        Self {
            headers: Vec::new(),
            completion: Completion::Reject(None),
        }
    }

    /// Status 400 with a specific message
    pub fn reject_with(message: impl Into<String>) -> Self {
        Self {
            headers: Vec::new(),
            completion: Completion::Reject(Some(message.into())),
        }
    }

    /// Set a response header; returns the reply for chaining
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn completion(&self) -> &Completion {
        &self.completion
    }
}

/// Per-request response capability.
///
/// Holds the trace id, the declared output format, and the log context.
/// Exactly one of [`Responder::finish`] / [`Responder::finish_error`] runs;
/// both consume the responder and close the response.
pub struct Responder {
    trace_id: TraceId,
    output: Format,
    url: String,
    request_body: String,
    preset_headers: Vec<(HeaderName, HeaderValue)>,
}

impl Responder {
    pub fn new(trace_id: TraceId, output: Format, url: impl Into<String>) -> Self {
        Self {
            trace_id,
            output,
            url: url.into(),
            request_body: String::new(),
            preset_headers: Vec::new(),
        }
    }

    /// Set a header ahead of completion (the engine uses this for CORS)
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.preset_headers.push((name, value));
    }

    /// Record the inbound body's log form once the body reader has run
    pub fn set_request_body(&mut self, body: impl Into<String>) {
        self.request_body = body.into();
    }

    pub fn trace_id(&self) -> &TraceId {
        &self.trace_id
    }

    /// Complete the response from a handler reply. Terminal.
    pub fn finish(self, reply: Reply) -> Response {
        let (status, payload) = match reply.completion {
            Completion::Complete(payload) => (200, Some(payload)),
            Completion::CompleteWithStatus(status, payload) => (status, Some(payload)),
            Completion::Fail(message) => {
                error!(trace_id = %self.trace_id, error = %message, "handler failed");
                (500, None)
            }
            Completion::Reject(message) => {
                let message = message.unwrap_or_else(|| "Invalid input".to_string());
                (400, Some(Payload::Text(format!("{message}\n"))))
            }
        };
        self.complete(status, payload, reply.headers)
    }

    /// Complete the response from an engine-level error. Terminal.
    pub fn finish_error(self, err: &EngineError) -> Response {
        error!(trace_id = %self.trace_id, error = %err, "request failed");
        self.complete(err.http_status(), None, Vec::new())
    }

    fn complete(self, status: u16, payload: Option<Payload>, headers: Vec<(String, String)>) -> Response {
        let Self {
            trace_id,
            output,
            url,
            request_body,
            preset_headers,
        } = self;

        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = payload.as_ref().map(|p| output.encode(p));
        let response_log = body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default();

        let mut builder = Response::builder().status(status);
        for (name, value) in preset_headers {
            builder = builder.header(name, value);
        }
        for (name, value) in headers {
            // the trace header belongs to the engine; a reply cannot override it
            if name.eq_ignore_ascii_case("x-trace-id") {
                warn!(trace_id = %trace_id, "dropping reserved X-Trace-Id reply header");
                continue;
            }
            match (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value.as_str())) {
                (Ok(name), Ok(value)) => builder = builder.header(name, value),
                _ => warn!(trace_id = %trace_id, header = %name, "dropping invalid response header"),
            }
        }
        builder = builder.header("X-Trace-Id", trace_id.as_str());

        info!(
            trace_id = %trace_id,
            url = %url,
            request_body = %request_body,
            status = %status.as_u16(),
            response_body = %response_log,
            "request completed"
        );

        let body = body.map(Body::from).unwrap_or_else(Body::empty);
        builder.body(body).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::json;

    fn responder(output: Format) -> Responder {
        Responder::new(TraceId::with_id("trace-1"), output, "/test")
    }

    async fn body_string(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    #[tokio::test]
    async fn test_send_defaults_to_200() {
        let response = responder(Format::Text).finish(Reply::send("ok"));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("X-Trace-Id").unwrap(), "trace-1");
        assert_eq!(body_string(response).await, "ok");
    }

    #[tokio::test]
    async fn test_explicit_status_is_used() {
        let response = responder(Format::Text).finish(Reply::with_status(203, "ok"));
        assert_eq!(response.status().as_u16(), 203);
        assert_eq!(body_string(response).await, "ok");
    }

    #[tokio::test]
    async fn test_json_output_serializes_via_codec() {
        let response = responder(Format::Json).finish(Reply::send(json!({"a": 1})));
        assert_eq!(body_string(response).await, r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_fail_is_500_with_empty_body() {
        let response = responder(Format::Json).finish(Reply::fail("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(response).await, "");
    }

    #[tokio::test]
    async fn test_reject_defaults_to_invalid_input() {
        let response = responder(Format::Text).finish(Reply::reject());
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_string(response).await, "Invalid input\n");
    }

    #[tokio::test]
    async fn test_reject_with_message_keeps_trailing_newline() {
        let response = responder(Format::Text).finish(Reply::reject_with("missing field"));
        assert_eq!(body_string(response).await, "missing field\n");
    }

    #[tokio::test]
    async fn test_reply_headers_and_preset_headers_are_attached() {
        let mut responder = responder(Format::Text);
        responder.set_header(
            HeaderName::from_static("access-control-allow-origin"),
            HeaderValue::from_static("*"),
        );
        let response = responder.finish(Reply::send("ok").header("X-Extra", "1"));
        assert_eq!(response.headers().get("access-control-allow-origin").unwrap(), "*");
        assert_eq!(response.headers().get("X-Extra").unwrap(), "1");
    }

    #[tokio::test]
    async fn test_reply_cannot_override_the_trace_header() {
        let response = responder(Format::Text)
            .finish(Reply::send("ok").header("X-Trace-Id", "spoofed"));
        let values: Vec<_> = response.headers().get_all("X-Trace-Id").iter().collect();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0], "trace-1");
    }

    #[tokio::test]
    async fn test_finish_error_maps_timeout_to_504() {
        let response = responder(Format::Text).finish_error(&EngineError::Timeout(30));
        assert_eq!(response.status().as_u16(), 504);
        assert_eq!(body_string(response).await, "");
    }
}
