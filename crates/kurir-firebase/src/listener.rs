// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background listener task bridging the event stream into a bounded channel.
//!
//! The subscription is push-based; the dispatch loop is pull-based. A bounded
//! `mpsc` channel sits between them: the listener task is the producer, the
//! dispatch loop the consumer. Ordering is preserved and a full channel
//! applies backpressure to the stream instead of dropping events.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use kurir_core::{ChangeKind, RealtimeEvent};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::FirebaseClient;
use crate::sse::StreamEvent;

/// Spawns the listener task.
///
/// The task opens the streaming connection on the client's base path,
/// forwards every non-null `put`/`patch` change into `tx`, and re-opens the
/// connection after `reconnect_delay` when the stream ends or errors. It
/// exits when `cancel` fires or the receiving side of the channel is dropped.
pub fn spawn_listener(
    client: Arc<FirebaseClient>,
    reconnect_delay: Duration,
    tx: mpsc::Sender<RealtimeEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if cancel.is_cancelled() {
                break;
            }

            let stream = tokio::select! {
                result = client.stream_events() => result,
                _ = cancel.cancelled() => break,
            };

            match stream {
                Ok(mut stream) => {
                    info!("realtime event stream opened");
                    loop {
                        let item = tokio::select! {
                            item = stream.next() => item,
                            _ = cancel.cancelled() => return,
                        };

                        match item {
                            Some(Ok(event)) => {
                                if let Some(realtime_event) = to_realtime_event(event) {
                                    if tx.send(realtime_event).await.is_err() {
                                        debug!("event channel closed, stopping listener");
                                        return;
                                    }
                                }
                            }
                            Some(Err(e)) => {
                                warn!(error = %e, "event stream error, reconnecting");
                                break;
                            }
                            None => {
                                warn!("event stream ended, reconnecting");
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to open event stream, retrying");
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(reconnect_delay) => {}
                _ = cancel.cancelled() => break,
            }
        }

        info!("realtime listener stopped");
    })
}

/// Maps a protocol event to a dispatchable change, filtering out control
/// events and deletions (null data).
fn to_realtime_event(event: StreamEvent) -> Option<RealtimeEvent> {
    let (kind, envelope) = match event {
        StreamEvent::Put(envelope) => (ChangeKind::Put, envelope),
        StreamEvent::Patch(envelope) => (ChangeKind::Patch, envelope),
        StreamEvent::KeepAlive => return None,
        StreamEvent::Cancel => {
            warn!("server cancelled the listen");
            return None;
        }
        StreamEvent::AuthRevoked => {
            warn!("auth credential revoked, stream will be re-opened");
            return None;
        }
    };

    if envelope.data.is_null() {
        // Deletions come back as null puts; consuming our own cleanup
        // deletes would loop forever.
        return None;
    }

    let path = if envelope.path.starts_with('/') {
        envelope.path
    } else {
        format!("/{}", envelope.path)
    };

    Some(RealtimeEvent {
        kind,
        path,
        data: envelope.data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurir_config::model::FirebaseConfig;
    use serde_json::json;
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sse_body() -> String {
        [
            "event: put\ndata: {\"path\":\"/\",\"data\":null}\n\n",
            "event: keep-alive\ndata: null\n\n",
            "event: put\ndata: {\"path\":\"/lead-1\",\"data\":{\"entity_id\":\"500\",\"messages\":\"hi\"}}\n\n",
            "event: patch\ndata: {\"path\":\"lead-2\",\"data\":{\"messages\":\"halo\"}}\n\n",
        ]
        .concat()
    }

    async fn start_stream_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("Accept", "text/event-stream"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse_body()),
            )
            .mount(&server)
            .await;
        server
    }

    fn client_for(server: &MockServer) -> Arc<FirebaseClient> {
        Arc::new(
            FirebaseClient::new(&FirebaseConfig {
                database_url: server.uri(),
                base_path: "/incoming".to_string(),
                auth_token: None,
                timeout_secs: 5,
                reconnect_delay_secs: 1,
            })
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn forwards_changes_and_skips_null_and_keepalive() {
        let server = start_stream_server().await;
        let (tx, mut rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();

        let handle = spawn_listener(client_for(&server), Duration::from_secs(60), tx, cancel.clone());

        let first = rx.recv().await.unwrap();
        assert_eq!(first.kind, ChangeKind::Put);
        assert_eq!(first.path, "/lead-1");
        assert_eq!(first.data, json!({"entity_id": "500", "messages": "hi"}));

        let second = rx.recv().await.unwrap();
        assert_eq!(second.kind, ChangeKind::Patch);
        assert_eq!(second.path, "/lead-2");

        cancel.cancel();
        let _ = handle.await;
    }

    #[tokio::test]
    async fn reconnects_after_stream_end() {
        let server = start_stream_server().await;
        let (tx, mut rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();

        // Short reconnect delay: the mock serves the same body each time, so
        // a second batch of events proves the stream was re-opened.
        let handle = spawn_listener(
            client_for(&server),
            Duration::from_millis(10),
            tx,
            cancel.clone(),
        );

        for _ in 0..4 {
            let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("listener should keep delivering after reconnect")
                .unwrap();
            assert!(event.path.starts_with('/'));
        }

        cancel.cancel();
        let _ = handle.await;
    }

    #[tokio::test]
    async fn stops_when_receiver_dropped() {
        let server = start_stream_server().await;
        let (tx, rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();

        let handle = spawn_listener(
            client_for(&server),
            Duration::from_millis(10),
            tx,
            cancel.clone(),
        );
        drop(rx);

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("listener should exit once the channel closes")
            .unwrap();
    }
}
