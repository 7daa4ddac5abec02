//! Transport-agnostic bidirectional message connections.
//!
//! The relay state machine only needs to send, receive, and close ordered
//! streams of text/binary frames. Both real transports (the axum server
//! socket and the tungstenite upstream socket) are adapted to the same trait,
//! which also lets tests drive the relay with in-memory fakes.

use anyhow::Result;
use async_trait::async_trait;
use axum::extract::ws::{Message as AxumMessage, WebSocket};
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, tungstenite::protocol::Message as WsMessage,
};

/// One WebSocket frame, as the relay sees it. Binary payloads are opaque
/// audio; text payloads are JSON control messages.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Text(String),
    Binary(Bytes),
}

/// An ordered, bidirectional stream of frames.
///
/// `recv` returns `None` once the peer has closed; transport errors surface
/// as `Some(Err(_))`. `close` is best-effort and may be called after the
/// connection is already gone.
#[async_trait]
pub trait MessageConnection: Send {
    async fn send(&mut self, frame: Frame) -> Result<()>;
    async fn recv(&mut self) -> Option<Result<Frame>>;
    async fn close(&mut self) -> Result<()>;
}

/// Opens a fresh connection to the upstream voice-agent service.
#[async_trait]
pub trait UpstreamConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn MessageConnection>>;
}

/// Adapts an accepted axum server-side WebSocket to `MessageConnection`.
pub struct AxumConnection {
    socket: WebSocket,
}

impl AxumConnection {
    pub fn new(socket: WebSocket) -> Self {
        Self { socket }
    }
}

#[async_trait]
impl MessageConnection for AxumConnection {
    async fn send(&mut self, frame: Frame) -> Result<()> {
        let msg = match frame {
            Frame::Text(text) => AxumMessage::Text(text.into()),
            Frame::Binary(data) => AxumMessage::Binary(data),
        };
        self.socket.send(msg).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<Frame>> {
        loop {
            match self.socket.recv().await? {
                Ok(AxumMessage::Text(text)) => {
                    return Some(Ok(Frame::Text(text.as_str().to_owned())));
                }
                Ok(AxumMessage::Binary(data)) => return Some(Ok(Frame::Binary(data))),
                Ok(AxumMessage::Close(_)) => return None,
                // axum answers pings itself; both are invisible to the relay.
                Ok(AxumMessage::Ping(_) | AxumMessage::Pong(_)) => continue,
                Err(e) => return Some(Err(e.into())),
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.socket.send(AxumMessage::Close(None)).await?;
        Ok(())
    }
}

/// Adapts a tungstenite client-side WebSocket to `MessageConnection`.
pub struct TungsteniteConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TungsteniteConnection {
    pub fn new(stream: WebSocketStream<MaybeTlsStream<TcpStream>>) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl MessageConnection for TungsteniteConnection {
    async fn send(&mut self, frame: Frame) -> Result<()> {
        let msg = match frame {
            Frame::Text(text) => WsMessage::Text(text.into()),
            Frame::Binary(data) => WsMessage::Binary(data),
        };
        self.stream.send(msg).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<Frame>> {
        loop {
            match self.stream.next().await? {
                Ok(WsMessage::Text(text)) => {
                    return Some(Ok(Frame::Text(text.as_str().to_owned())));
                }
                Ok(WsMessage::Binary(data)) => return Some(Ok(Frame::Binary(data))),
                Ok(WsMessage::Close(_)) => return None,
                Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_)) => continue,
                Err(e) => return Some(Err(e.into())),
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.stream.close(None).await?;
        Ok(())
    }
}
