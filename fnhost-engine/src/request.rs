//! Request model and body reader

use axum::body::Body;
use axum::http::{HeaderMap, Method, Uri};
use fnhost_core::{EngineError, Format, Payload, TraceId};
use http_body_util::BodyExt;

/// An inbound request, owned exclusively for the lifetime of one dispatch
/// call.
///
/// `body` stays `None` until [`LambdaRequest::read_body`] has run; the engine
/// only runs it for POST requests with a declared input format.
#[derive(Debug)]
pub struct LambdaRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub trace_id: TraceId,
    /// Declared input format; `None` means the body is not read at all
    pub input: Option<Format>,
    /// Action selected by the active contract (version 2 only)
    pub action: Option<String>,
    /// Decoded body, absent until the body reader runs
    pub body: Option<Payload>,
}

impl LambdaRequest {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, trace_id: TraceId) -> Self {
        Self {
            method,
            uri,
            headers,
            trace_id,
            input: None,
            action: None,
            body: None,
        }
    }

    /// Accumulate the inbound byte stream into one buffer, then decode it
    /// with the declared input format.
    ///
    /// Chunks are collected in arrival order. Suspends this request until the
    /// stream completes; other requests are unaffected. A no-op unless the
    /// method is POST and an input format is declared.
    pub async fn read_body(&mut self, body: Body) -> Result<(), EngineError> {
        if self.method != Method::POST {
            return Ok(());
        }
        let Some(format) = self.input else {
            return Ok(());
        };

        let buffer = body
            .collect()
            .await
            .map_err(|e| EngineError::Body(e.to_string()))?
            .to_bytes();

        self.body = Some(format.decode(buffer));
        Ok(())
    }

    /// Best-effort stringification of the decoded body for the access log
    pub fn body_log_form(&self) -> String {
        self.body.as_ref().map(Payload::log_form).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post_request(input: Option<Format>) -> LambdaRequest {
        let mut request = LambdaRequest::new(
            Method::POST,
            Uri::from_static("/"),
            HeaderMap::new(),
            TraceId::with_id("test-trace"),
        );
        request.input = input;
        request
    }

    #[tokio::test]
    async fn test_read_body_skipped_without_input_format() {
        let mut request = post_request(None);
        request.read_body(Body::from("ignored")).await.unwrap();
        assert!(request.body.is_none());
    }

    #[tokio::test]
    async fn test_read_body_skipped_for_non_post() {
        let mut request = post_request(Some(Format::Text));
        request.method = Method::GET;
        request.read_body(Body::from("ignored")).await.unwrap();
        assert!(request.body.is_none());
    }

    #[tokio::test]
    async fn test_read_body_decodes_json() {
        let mut request = post_request(Some(Format::Json));
        request.read_body(Body::from(r#"{"n":1}"#)).await.unwrap();
        assert_eq!(request.body, Some(Payload::Json(json!({"n": 1}))));
    }

    #[tokio::test]
    async fn test_read_body_malformed_json_is_recoverable() {
        let mut request = post_request(Some(Format::Json));
        request.read_body(Body::from("not json")).await.unwrap();
        assert_eq!(
            request.body,
            Some(Payload::Json(serde_json::Value::String("not json".to_string())))
        );
    }

    #[tokio::test]
    async fn test_read_body_binary_keeps_bytes() {
        let mut request = post_request(Some(Format::Binary));
        request
            .read_body(Body::from(vec![0x00u8, 0xff, 0x42]))
            .await
            .unwrap();
        assert_eq!(
            request.body,
            Some(Payload::Binary(bytes::Bytes::from_static(&[0x00, 0xff, 0x42])))
        );
    }
}
