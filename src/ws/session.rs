//! Manages the WebSocket connection lifecycle for an interview session.
//!
//! The handler upgrades the connection, validates query parameters, runs the
//! pre-session setup (persona selection, prompt synthesis, settings build),
//! and then hands the socket to the relay state machine. Any setup failure is
//! reported to the client as a single `Error` message before closing; the
//! upstream socket is never opened on a failed setup.

use super::{
    AxumConnection, connection::MessageConnection, protocol::ControlMessage, relay::RelaySession,
};
use crate::{prompt::PromptSynthesisError, settings::Settings, state::AppState};
use axum::{
    extract::{Query, State, WebSocketUpgrade, ws::WebSocket},
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{Instrument, error, info, warn};

/// Query parameters accepted on the upgrade request.
#[derive(Deserialize, Debug)]
pub struct SessionParams {
    pub role: Option<String>,
    #[serde(rename = "interviewerName")]
    pub interviewer_name: Option<String>,
}

/// A fatal session-setup failure. The display string is exactly what the
/// client receives in its `Error` message.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("Missing required parameter: role")]
    MissingRole,
    #[error("DEEPGRAM_KEY not found in environment")]
    MissingUpstreamCredential,
    #[error("Failed to generate interviewer prompt: {0}")]
    Prompt(#[from] PromptSynthesisError),
}

/// Axum handler to upgrade an HTTP connection to a WebSocket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<SessionParams>,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, params))
}

/// Main handler for an individual WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, params: SessionParams) {
    let session_id: u32 = rand::random();
    let span = tracing::info_span!("relay_session", session_id);

    async move {
        info!(role = ?params.role, interviewer = ?params.interviewer_name, "Client connected");
        let mut client = AxumConnection::new(socket);

        let settings = match prepare_session(&state, &params).await {
            Ok(settings) => settings,
            Err(e) => {
                error!(error = %e, "Session setup failed");
                if let Ok(frame) = ControlMessage::error(e.to_string()).into_frame() {
                    let _ = client.send(frame).await;
                }
                let _ = client.close().await;
                return;
            }
        };

        let mut session = RelaySession::new(client, state.config.keepalive_interval);
        if let Err(e) = session.run(state.upstream.as_ref(), &settings).await {
            error!(error = ?e, "Relay session terminated with error");
        }
    }
    .instrument(span)
    .await
}

/// Runs the pre-session setup and produces the upstream settings payload.
///
/// Checked in the same order as the original server: role, upstream
/// credential, persona, prompt.
pub async fn prepare_session(
    state: &AppState,
    params: &SessionParams,
) -> Result<Settings, SetupError> {
    let role = params
        .role
        .as_deref()
        .filter(|r| !r.is_empty())
        .ok_or(SetupError::MissingRole)?;

    if state.config.deepgram_key.is_none() {
        return Err(SetupError::MissingUpstreamCredential);
    }

    let persona = state.personas.select(params.interviewer_name.as_deref());
    info!(interviewer = %persona.name, "Interviewer selected");

    let prompt = state
        .synthesizer
        .synthesize(role, &persona.name)
        .await
        .map_err(|e| {
            warn!(error = %e, "Prompt synthesis failed");
            SetupError::from(e)
        })?;

    Ok(Settings::build(
        prompt,
        state.config.greeting.clone(),
        persona.speak_config.clone(),
        state.config.think_model.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config, persona::PersonaCatalog, prompt::PromptSynthesizer,
        ws::UpstreamConnector,
    };
    use async_trait::async_trait;

    struct FixedSynthesizer(Result<String, fn() -> PromptSynthesisError>);

    #[async_trait]
    impl PromptSynthesizer for FixedSynthesizer {
        async fn synthesize(
            &self,
            _role: &str,
            _persona_name: &str,
        ) -> Result<String, PromptSynthesisError> {
            match &self.0 {
                Ok(prompt) => Ok(prompt.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    struct NeverConnector;

    #[async_trait]
    impl UpstreamConnector for NeverConnector {
        async fn connect(&self) -> anyhow::Result<Box<dyn MessageConnection>> {
            panic!("setup tests must not open an upstream connection");
        }
    }

    fn test_state(deepgram_key: Option<&str>, synthesizer: FixedSynthesizer) -> AppState {
        let config = Config {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            deepgram_key: deepgram_key.map(str::to_string),
            groq_api_key: Some("test-key".to_string()),
            prompt_model: "openai/gpt-oss-120b".to_string(),
            think_model: "openai/gpt-oss-20b".to_string(),
            greeting: "Hello, welcome to your interview.".to_string(),
            keepalive_interval: std::time::Duration::from_secs(5),
            log_level: tracing::Level::INFO,
        };
        AppState {
            config: Arc::new(config),
            personas: Arc::new(PersonaCatalog::builtin()),
            synthesizer: Arc::new(synthesizer),
            upstream: Arc::new(NeverConnector),
        }
    }

    fn params(role: Option<&str>, interviewer: Option<&str>) -> SessionParams {
        SessionParams {
            role: role.map(str::to_string),
            interviewer_name: interviewer.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_missing_role_is_rejected() {
        let state = test_state(
            Some("dg-key"),
            FixedSynthesizer(Ok("prompt".to_string())),
        );
        let err = prepare_session(&state, &params(None, None)).await.unwrap_err();
        assert_eq!(err.to_string(), "Missing required parameter: role");
    }

    #[tokio::test]
    async fn test_empty_role_is_rejected() {
        let state = test_state(
            Some("dg-key"),
            FixedSynthesizer(Ok("prompt".to_string())),
        );
        let err = prepare_session(&state, &params(Some(""), None))
            .await
            .unwrap_err();
        assert!(matches!(err, SetupError::MissingRole));
    }

    #[tokio::test]
    async fn test_missing_deepgram_key_is_rejected() {
        let state = test_state(None, FixedSynthesizer(Ok("prompt".to_string())));
        let err = prepare_session(&state, &params(Some("Nurse"), None))
            .await
            .unwrap_err();
        assert!(matches!(err, SetupError::MissingUpstreamCredential));
    }

    #[tokio::test]
    async fn test_known_persona_speak_config_used() {
        let state = test_state(
            Some("dg-key"),
            FixedSynthesizer(Ok("generated prompt".to_string())),
        );
        let settings = prepare_session(&state, &params(Some("Nurse"), Some("Lauren Ashford")))
            .await
            .unwrap();
        let value = serde_json::to_value(settings).unwrap();
        assert_eq!(value["agent"]["speak"]["provider"]["model"], "aura-2-delia-en");
        assert_eq!(value["agent"]["think"]["prompt"], "generated prompt");
    }

    #[tokio::test]
    async fn test_unknown_persona_falls_back_to_default() {
        let state = test_state(
            Some("dg-key"),
            FixedSynthesizer(Ok("generated prompt".to_string())),
        );
        let settings = prepare_session(&state, &params(Some("Nurse"), Some("DoesNotExist")))
            .await
            .unwrap();
        let value = serde_json::to_value(settings).unwrap();
        // Default persona is Kevin McCannly (eleven_labs voice).
        assert_eq!(value["agent"]["speak"]["provider"]["type"], "eleven_labs");
        assert_eq!(
            value["agent"]["speak"]["provider"]["voice_id"],
            "onwK4e9ZLuTAKqWW03F9"
        );
    }

    #[tokio::test]
    async fn test_prompt_failure_maps_to_client_message() {
        let state = test_state(
            Some("dg-key"),
            FixedSynthesizer(Err(|| {
                PromptSynthesisError::Api("Internal Server Error".to_string())
            })),
        );
        let err = prepare_session(&state, &params(Some("Nurse"), None))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to generate interviewer prompt: Groq API error: Internal Server Error"
        );
    }
}
