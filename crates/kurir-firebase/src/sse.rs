// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSE parser for the Realtime Database streaming protocol.
//!
//! Converts a reqwest response byte stream into typed [`StreamEvent`]
//! variants using the `eventsource-stream` crate. The protocol delivers
//! `put`/`patch` events whose data is a `{"path": ..., "data": ...}`
//! envelope, plus `keep-alive`, `cancel`, and `auth_revoked` control events.

use std::pin::Pin;

use eventsource_stream::Eventsource;
use futures::stream::{Stream, StreamExt};
use kurir_core::KurirError;
use serde::Deserialize;
use serde_json::Value;

/// Envelope carried by `put` and `patch` events.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeEnvelope {
    /// Path of the change, relative to the streamed location.
    pub path: String,
    /// New contents at `path`; `null` means deletion.
    pub data: Value,
}

/// Typed events from the Realtime Database streaming protocol.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// Data at the path was replaced (also the initial full snapshot).
    Put(ChangeEnvelope),
    /// Children of the path were merged.
    Patch(ChangeEnvelope),
    /// Periodic keep-alive.
    KeepAlive,
    /// The server revoked the listen (rules changed, location deleted).
    Cancel,
    /// The auth credential expired; the stream must be re-opened.
    AuthRevoked,
}

/// Parses a reqwest streaming response into a stream of typed
/// [`StreamEvent`]s.
///
/// Unknown event names are silently skipped so protocol additions do not
/// break the listener.
pub fn parse_event_stream(
    response: reqwest::Response,
) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, KurirError>> + Send>> {
    let byte_stream = response.bytes_stream();
    let event_stream = byte_stream.eventsource();

    let mapped = event_stream.filter_map(|result| async move {
        match result {
            Ok(event) => {
                let parsed = match event.event.as_str() {
                    "put" => serde_json::from_str::<ChangeEnvelope>(&event.data)
                        .map(StreamEvent::Put)
                        .map_err(|e| KurirError::Realtime {
                            message: format!("failed to parse put event: {e}"),
                            source: Some(Box::new(e)),
                        }),
                    "patch" => serde_json::from_str::<ChangeEnvelope>(&event.data)
                        .map(StreamEvent::Patch)
                        .map_err(|e| KurirError::Realtime {
                            message: format!("failed to parse patch event: {e}"),
                            source: Some(Box::new(e)),
                        }),
                    "keep-alive" => Ok(StreamEvent::KeepAlive),
                    "cancel" => Ok(StreamEvent::Cancel),
                    "auth_revoked" => Ok(StreamEvent::AuthRevoked),
                    _ => return None,
                };
                Some(parsed)
            }
            Err(e) => Some(Err(KurirError::Realtime {
                message: format!("event stream error: {e}"),
                source: None,
            })),
        }
    });

    Box::pin(mapped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    /// Helper: serve raw SSE text through wiremock to get a real
    /// `reqwest::Response` with a streaming body.
    async fn mock_sse_response(sse_text: &str) -> reqwest::Response {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse_text.to_string()),
            )
            .mount(&server)
            .await;

        reqwest::get(&server.uri()).await.unwrap()
    }

    #[tokio::test]
    async fn parse_put_event() {
        let sse = "event: put\ndata: {\"path\":\"/abc\",\"data\":{\"entity_id\":\"500\"}}\n\n";
        let response = mock_sse_response(sse).await;
        let mut stream = parse_event_stream(response);

        let event = stream.next().await.unwrap().unwrap();
        match event {
            StreamEvent::Put(envelope) => {
                assert_eq!(envelope.path, "/abc");
                assert_eq!(envelope.data["entity_id"], "500");
            }
            other => panic!("expected Put, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn parse_patch_event() {
        let sse = "event: patch\ndata: {\"path\":\"/abc\",\"data\":{\"messages\":\"hi\"}}\n\n";
        let response = mock_sse_response(sse).await;
        let mut stream = parse_event_stream(response);

        let event = stream.next().await.unwrap().unwrap();
        assert!(matches!(event, StreamEvent::Patch(_)));
    }

    #[tokio::test]
    async fn parse_null_data_put() {
        let sse = "event: put\ndata: {\"path\":\"/abc\",\"data\":null}\n\n";
        let response = mock_sse_response(sse).await;
        let mut stream = parse_event_stream(response);

        let event = stream.next().await.unwrap().unwrap();
        match event {
            StreamEvent::Put(envelope) => assert!(envelope.data.is_null()),
            other => panic!("expected Put, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn keep_alive_and_control_events() {
        let sse = "event: keep-alive\ndata: null\n\n\
                   event: cancel\ndata: null\n\n\
                   event: auth_revoked\ndata: \"credential expired\"\n\n";
        let response = mock_sse_response(sse).await;
        let mut stream = parse_event_stream(response);

        assert!(matches!(
            stream.next().await.unwrap().unwrap(),
            StreamEvent::KeepAlive
        ));
        assert!(matches!(
            stream.next().await.unwrap().unwrap(),
            StreamEvent::Cancel
        ));
        assert!(matches!(
            stream.next().await.unwrap().unwrap(),
            StreamEvent::AuthRevoked
        ));
    }

    #[tokio::test]
    async fn unknown_events_are_skipped() {
        let sse = "event: some_future_event\ndata: {}\n\nevent: keep-alive\ndata: null\n\n";
        let response = mock_sse_response(sse).await;
        let mut stream = parse_event_stream(response);

        let event = stream.next().await.unwrap().unwrap();
        assert!(matches!(event, StreamEvent::KeepAlive));
    }
}
