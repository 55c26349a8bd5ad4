/// WebSocket RPC transport: one JSON envelope per text frame, one reply per envelope.
use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::protocol::Message};
use tracing::{debug, info, warn};

use crate::core::error::ApiError;
use crate::core::protocol::{RpcEnvelope, RpcReply};
use crate::core::service::HangmanService;

pub struct RpcServer {
    listener: TcpListener,
    service: Arc<HangmanService>,
}

impl RpcServer {
    pub async fn bind(addr: &str, service: Arc<HangmanService>) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, service })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until the listener fails.
    pub async fn run(self) -> anyhow::Result<()> {
        info!(addr = %self.listener.local_addr()?, "rpc server listening");

        loop {
            let (stream, peer) = self.listener.accept().await?;
            debug!(%peer, "new connection");
            tokio::spawn(Self::handle_connection(stream, peer, Arc::clone(&self.service)));
        }
    }

    async fn handle_connection(stream: TcpStream, peer: SocketAddr, service: Arc<HangmanService>) {
        let mut ws_stream = match accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                warn!(%peer, error = %e, "websocket handshake failed");
                return;
            }
        };

        while let Some(msg_result) = ws_stream.next().await {
            match msg_result {
                Ok(Message::Text(text)) => {
                    let reply = dispatch_frame(&service, &text).await;
                    let json = match serde_json::to_string(&reply) {
                        Ok(json) => json,
                        Err(e) => {
                            warn!(%peer, error = %e, "failed to encode reply");
                            continue;
                        }
                    };
                    if ws_stream.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!(%peer, error = %e, "websocket error");
                    break;
                }
            }
        }

        debug!(%peer, "connection closed");
    }
}

/// Decodes one frame and runs it. Frames that don't parse are answered with
/// a `bad_request` reply carrying id 0.
pub async fn dispatch_frame(service: &HangmanService, text: &str) -> RpcReply {
    let envelope: RpcEnvelope = match serde_json::from_str(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(error = %e, "malformed frame");
            let err = ApiError::BadRequest(format!("malformed request: {e}"));
            return RpcReply::err(0, err.to_body());
        }
    };

    match service.handle(envelope.request).await {
        Ok(result) => RpcReply::ok(envelope.id, result),
        Err(e) => {
            debug!(id = envelope.id, error = %e, "request rejected");
            RpcReply::err(envelope.id, e.to_body())
        }
    }
}
