//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds all shared,
//! clonable resources: the configuration, the persona catalog, and the
//! service clients the WebSocket handler depends on.

use crate::{config::Config, persona::PersonaCatalog, prompt::PromptSynthesizer, ws::UpstreamConnector};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all
/// handlers. The synthesizer and connector are trait objects so that tests
/// can substitute fakes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub personas: Arc<PersonaCatalog>,
    pub synthesizer: Arc<dyn PromptSynthesizer>,
    pub upstream: Arc<dyn UpstreamConnector>,
}
