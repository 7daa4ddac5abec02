//! WebSocket Relay
//!
//! This module contains the core logic for bridging a client WebSocket to the
//! upstream Deepgram Agent WebSocket. It is structured into submodules:
//!
//! - `connection`: the transport-agnostic message connection traits and the
//!   adapters for axum (client side) and tungstenite (upstream side).
//! - `deepgram`: the connector that opens authenticated upstream sockets.
//! - `protocol`: the JSON control messages on both legs of the relay.
//! - `relay`: the per-session state machine that forwards frames.
//! - `session`: the axum handler, parameter validation, and session setup.

mod connection;
pub mod deepgram;
pub mod protocol;
pub mod relay;
pub mod session;

pub use connection::{AxumConnection, Frame, MessageConnection, UpstreamConnector};
pub use session::ws_handler;
