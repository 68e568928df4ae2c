// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, error, warn};

use crate::bridge::codec::{Frame, Framing, McpCodec, Outbound};
use crate::errors::RelayError;
use crate::protocol::{JsonRpcRequest, JsonRpcResponse, RequestId};

/// Messages arriving from the local client
#[derive(Debug)]
pub enum DownstreamEvent {
    Request(Framing, JsonRpcRequest),
    /// A frame that could not become a request; answered with `error`
    Error {
        framing: Framing,
        id: Option<RequestId>,
        error: RelayError,
    },
    /// Client closed its end of the stream
    Disconnect,
}

/// A reply slot in the ordered output queue.
pub struct PendingReply {
    pub framing: Framing,
    /// Used if the task filling the slot dies
    pub id: Option<RequestId>,
    pub rx: oneshot::Receiver<Option<JsonRpcResponse>>,
}

/// Spawns a background task reading framed messages from the local client.
pub fn spawn_downstream_reader<R>(stream: R, tx: mpsc::Sender<DownstreamEvent>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut framed = FramedRead::new(stream, McpCodec::new());

        while let Some(result) = framed.next().await {
            let event = match result {
                Ok(frame) => match classify(frame) {
                    Some(event) => event,
                    None => continue,
                },
                Err(e) => {
                    error!("Downstream read error: {}", e);
                    break;
                }
            };
            if tx.send(event).await.is_err() {
                break;
            }
        }
        let _ = tx.send(DownstreamEvent::Disconnect).await;
    })
}

fn classify(frame: Frame) -> Option<DownstreamEvent> {
    let (framing, value) = match frame {
        Frame::Message(framing, value) => (framing, value),
        Frame::Malformed(framing, detail) => {
            warn!("Malformed frame from client: {}", detail);
            return Some(DownstreamEvent::Error {
                framing,
                id: None,
                error: RelayError::Parse(detail),
            });
        }
    };

    // Replies to server-initiated requests; the bridge never sends any
    if value.get("method").is_none()
        && (value.get("result").is_some() || value.get("error").is_some())
    {
        debug!("Ignoring response-shaped message from client");
        return None;
    }

    match decode_request(&value) {
        Ok(request) => Some(DownstreamEvent::Request(framing, request)),
        Err(error) => {
            warn!("Invalid request from client: {:?}", error);
            Some(DownstreamEvent::Error {
                framing,
                id: RequestId::recover(&value),
                error,
            })
        }
    }
}

fn decode_request(value: &Value) -> Result<JsonRpcRequest, RelayError> {
    if !value.is_object() {
        return Err(RelayError::InvalidRequest("message is not an object".to_string()));
    }
    serde_json::from_value(value.clone()).map_err(|e| RelayError::InvalidRequest(e.to_string()))
}

/// Spawns the writer task. Replies are written strictly in queue order.
pub fn spawn_downstream_writer<W>(stream: W, mut rx: mpsc::Receiver<PendingReply>) -> JoinHandle<()>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut framed = FramedWrite::new(stream, McpCodec::new());

        while let Some(pending) = rx.recv().await {
            let response = match pending.rx.await {
                Ok(Some(response)) => response,
                Ok(None) => continue,
                Err(_) => JsonRpcResponse::from_error(
                    pending.id,
                    &RelayError::Internal("request handler terminated".to_string()),
                ),
            };
            let outbound = Outbound {
                framing: pending.framing,
                response,
            };
            if let Err(e) = framed.send(outbound).await {
                error!("Downstream write error: {}", e);
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_request() {
        let event = classify(Frame::Message(
            Framing::Newline,
            json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}),
        ));
        assert!(matches!(event, Some(DownstreamEvent::Request(Framing::Newline, req)) if req.method == "ping"));
    }

    #[test]
    fn test_classify_malformed_has_null_id() {
        let event = classify(Frame::Malformed(Framing::ContentLength, "EOF".to_string()));
        assert!(matches!(
            event,
            Some(DownstreamEvent::Error { framing: Framing::ContentLength, id: None, error: RelayError::Parse(_) })
        ));
    }

    #[test]
    fn test_classify_invalid_request_recovers_id() {
        let event = classify(Frame::Message(Framing::Newline, json!({"id": 9, "method": 3})));
        assert!(matches!(
            event,
            Some(DownstreamEvent::Error { id: Some(ref id), error: RelayError::InvalidRequest(_), .. })
                if *id == RequestId::from(9)
        ));
    }

    #[test]
    fn test_classify_ignores_client_responses() {
        assert!(classify(Frame::Message(Framing::Newline, json!({"id": 1, "result": {}}))).is_none());
    }
}
