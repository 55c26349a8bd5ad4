/// WebSocket RPC client - one outstanding call at a time.
use anyhow::{anyhow, bail, Result};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use crate::core::protocol::{RpcEnvelope, RpcReply, RpcRequest};

pub struct RpcClient {
    ws_stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    next_id: u64,
}

impl RpcClient {
    /// Accepts either a bare `host:port` or a full `ws://` URL.
    pub async fn connect(addr: &str) -> Result<Self> {
        let url = if addr.starts_with("ws://") || addr.starts_with("wss://") {
            addr.to_string()
        } else {
            format!("ws://{}", addr)
        };

        let (ws_stream, _) = connect_async(&url)
            .await
            .map_err(|e| anyhow!("Failed to connect to {}: {}", url, e))?;
        Ok(Self {
            ws_stream,
            next_id: 1,
        })
    }

    pub async fn call(&mut self, request: RpcRequest) -> Result<RpcReply> {
        let id = self.next_id;
        self.next_id += 1;

        let json = serde_json::to_string(&RpcEnvelope { id, request })?;
        self.ws_stream.send(Message::Text(json)).await?;

        while let Some(msg_result) = self.ws_stream.next().await {
            match msg_result? {
                Message::Text(text) => {
                    let reply: RpcReply = serde_json::from_str(&text)?;
                    // id 0 means the server could not read our frame at all
                    if reply.id == id || reply.id == 0 {
                        return Ok(reply);
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }

        bail!("connection closed before reply to request {id}")
    }

    pub async fn close(mut self) -> Result<()> {
        self.ws_stream.close(None).await?;
        Ok(())
    }
}
