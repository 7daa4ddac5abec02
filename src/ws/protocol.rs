//! JSON control messages on both legs of the relay.
//!
//! The relay never acts on upstream control messages beyond logging their
//! type, but the known variants are modeled so the log line can name them and
//! so anything unrecognized still passes through untouched.

use super::Frame;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Control messages originated by this server: the periodic upstream
/// keep-alive and the single error report a failing session sends its client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum ControlMessage {
    KeepAlive,
    Error { error: String },
}

impl ControlMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    pub fn into_frame(self) -> Result<Frame> {
        Ok(Frame::Text(serde_json::to_string(&self)?))
    }
}

/// Known control messages from the Deepgram Agent stream. Parsed for
/// diagnostics only; the raw frame is forwarded regardless.
#[derive(Deserialize, Debug)]
#[serde(tag = "type")]
pub enum AgentEvent {
    Welcome,
    SettingsApplied,
    ConversationText {
        role: String,
        content: String,
    },
    UserStartedSpeaking,
    AgentStartedSpeaking,
    AgentAudioDone,
    Error {
        #[serde(default)]
        description: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

impl AgentEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            AgentEvent::Welcome => "Welcome",
            AgentEvent::SettingsApplied => "SettingsApplied",
            AgentEvent::ConversationText { .. } => "ConversationText",
            AgentEvent::UserStartedSpeaking => "UserStartedSpeaking",
            AgentEvent::AgentStartedSpeaking => "AgentStartedSpeaking",
            AgentEvent::AgentAudioDone => "AgentAudioDone",
            AgentEvent::Error { .. } => "Error",
            AgentEvent::Unknown => "Unknown",
        }
    }
}
