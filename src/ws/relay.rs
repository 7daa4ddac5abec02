//! The per-session relay state machine.
//!
//! One `RelaySession` bridges one client connection to one upstream
//! connection. Once active it is a pure pass-through pipe: no buffering,
//! no reordering, no transformation of frames in either direction.

use super::{
    Frame, MessageConnection, UpstreamConnector,
    protocol::{AgentEvent, ControlMessage},
};
use crate::settings::Settings;
use anyhow::Result;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Lifecycle of a relay session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    UpstreamHandshake,
    Active,
    Closing,
    Closed,
}

const UPSTREAM_FAILED: &str = "Deepgram connection failed";

/// One end-to-end bridged connection.
///
/// The upstream handle is exclusively owned here; `upstream` is `Some` for at
/// most the Active span of the session, which makes closing it naturally
/// idempotent (`Option::take`).
pub struct RelaySession<C: MessageConnection> {
    client: C,
    upstream: Option<Box<dyn MessageConnection>>,
    state: SessionState,
    keepalive_interval: Duration,
}

enum LoopEvent {
    FromClient(Option<Result<Frame>>),
    FromUpstream(Option<Result<Frame>>),
    KeepAliveTick,
}

impl<C: MessageConnection> RelaySession<C> {
    pub fn new(client: C, keepalive_interval: Duration) -> Self {
        Self {
            client,
            upstream: None,
            state: SessionState::Connecting,
            keepalive_interval,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drives the session to completion: upstream handshake, settings
    /// delivery, then bidirectional forwarding until both sides are done.
    ///
    /// All failures are handled internally and reported to the client as a
    /// single `Error` message; an `Err` return only signals a serialization
    /// bug, not a transport condition.
    pub async fn run(
        &mut self,
        connector: &dyn UpstreamConnector,
        settings: &Settings,
    ) -> Result<()> {
        self.state = SessionState::UpstreamHandshake;

        let connect = connector.connect();
        tokio::pin!(connect);

        // The agent greets first, so frames the client sends while the
        // handshake is pending are dropped, never queued.
        let connected = loop {
            tokio::select! {
                biased;
                result = &mut connect => break result,
                incoming = self.client.recv() => match incoming {
                    Some(Ok(_)) => {
                        debug!("Dropping client frame sent before upstream was open");
                    }
                    Some(Err(e)) => {
                        warn!(error = ?e, "Client connection failed during upstream handshake");
                        self.state = SessionState::Closed;
                        return Ok(());
                    }
                    None => {
                        info!("Client disconnected during upstream handshake");
                        self.state = SessionState::Closed;
                        return Ok(());
                    }
                },
            }
        };

        let mut upstream = match connected {
            Ok(upstream) => upstream,
            Err(e) => {
                error!(error = ?e, "Upstream handshake failed");
                self.fail_client(UPSTREAM_FAILED).await;
                return Ok(());
            }
        };

        let settings_frame = Frame::Text(serde_json::to_string(settings)?);
        if let Err(e) = upstream.send(settings_frame).await {
            error!(error = ?e, "Failed to send session settings upstream");
            let _ = upstream.close().await;
            self.fail_client(UPSTREAM_FAILED).await;
            return Ok(());
        }
        debug!("Session settings sent upstream");

        self.upstream = Some(upstream);
        self.state = SessionState::Active;
        info!("Relay active");

        self.relay_loop().await?;

        self.state = SessionState::Closing;
        self.close_upstream().await;
        let _ = self.client.close().await;
        self.state = SessionState::Closed;
        info!("Session closed");
        Ok(())
    }

    /// The Active-state forwarding loop. Returns when the client side is
    /// finished; an upstream close or error leaves the client connected and
    /// keeps looping.
    async fn relay_loop(&mut self) -> Result<()> {
        let mut keepalive = time::interval(self.keepalive_interval);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of an interval resolves immediately.
        keepalive.tick().await;

        loop {
            let upstream_open = self.upstream.is_some();
            let event = tokio::select! {
                biased;
                incoming = recv_from(self.upstream.as_deref_mut()), if upstream_open => {
                    LoopEvent::FromUpstream(incoming)
                }
                incoming = self.client.recv() => LoopEvent::FromClient(incoming),
                _ = keepalive.tick(), if upstream_open => LoopEvent::KeepAliveTick,
            };

            match event {
                LoopEvent::FromClient(Some(Ok(frame))) => {
                    match self.upstream.as_mut() {
                        Some(upstream) => {
                            if let Err(e) = upstream.send(frame).await {
                                error!(error = ?e, "Upstream send failed");
                                self.upstream_failed().await?;
                            }
                        }
                        None => debug!("Dropping client frame; upstream is closed"),
                    }
                }
                LoopEvent::FromClient(Some(Err(e))) => {
                    warn!(error = ?e, "Client connection error");
                    return Ok(());
                }
                LoopEvent::FromClient(None) => {
                    info!("Client disconnected");
                    return Ok(());
                }
                LoopEvent::FromUpstream(Some(Ok(frame))) => {
                    if let Frame::Text(text) = &frame {
                        match serde_json::from_str::<AgentEvent>(text) {
                            Ok(event) => debug!(kind = event.kind(), "Upstream event"),
                            Err(_) => debug!("Unparseable upstream text frame, forwarding as-is"),
                        }
                    }
                    if let Err(e) = self.client.send(frame).await {
                        warn!(error = ?e, "Client send failed");
                        return Ok(());
                    }
                }
                LoopEvent::FromUpstream(Some(Err(e))) => {
                    error!(error = ?e, "Upstream connection error");
                    self.upstream_failed().await?;
                }
                LoopEvent::FromUpstream(None) => {
                    info!("Upstream closed");
                    self.close_upstream().await;
                }
                LoopEvent::KeepAliveTick => {
                    if let Some(upstream) = self.upstream.as_mut() {
                        let frame = ControlMessage::KeepAlive.into_frame()?;
                        if let Err(e) = upstream.send(frame).await {
                            warn!(error = ?e, "Keep-alive send failed");
                            self.upstream_failed().await?;
                        }
                    }
                }
            }
        }
    }

    /// Upstream runtime failure: one best-effort diagnostic to the client,
    /// then drop the upstream handle. The client connection stays up.
    async fn upstream_failed(&mut self) -> Result<()> {
        let frame = ControlMessage::error(UPSTREAM_FAILED).into_frame()?;
        let _ = self.client.send(frame).await;
        self.close_upstream().await;
        Ok(())
    }

    async fn close_upstream(&mut self) {
        if let Some(mut upstream) = self.upstream.take() {
            let _ = upstream.close().await;
        }
    }

    /// Fatal setup failure: report once to the client and tear down.
    async fn fail_client(&mut self, message: &str) {
        if let Ok(frame) = ControlMessage::error(message).into_frame() {
            let _ = self.client.send(frame).await;
        }
        let _ = self.client.close().await;
        self.state = SessionState::Closed;
    }
}

async fn recv_from(
    upstream: Option<&mut (dyn MessageConnection + 'static)>,
) -> Option<Result<Frame>> {
    match upstream {
        Some(upstream) => upstream.recv().await,
        // Unreachable behind the `is_some` guard, but select! still type-checks it.
        None => std::future::pending().await,
    }
}
