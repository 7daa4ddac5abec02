//! Interview Relay Library Crate
//!
//! This library contains all the core logic for the interview relay service:
//! configuration, the persona catalog, prompt synthesis, the Deepgram Agent
//! settings payload, and the WebSocket relay itself. The `server` binary is a
//! thin wrapper around this library.

pub mod config;
pub mod persona;
pub mod prompt;
pub mod router;
pub mod settings;
pub mod state;
pub mod ws;
