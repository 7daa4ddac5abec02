//! The Deepgram Agent `Settings` payload.
//!
//! Built once per session and sent as the first upstream message. The audio
//! and listen parameters are fixed to what the browser client records and
//! plays back; the speak block is the selected persona's opaque provider blob.

use serde::Serialize;
use serde_json::Value;

#[derive(Serialize, Debug, Clone)]
pub struct Settings {
    #[serde(rename = "type")]
    kind: &'static str,
    audio: AudioSettings,
    agent: AgentSettings,
}

#[derive(Serialize, Debug, Clone)]
struct AudioSettings {
    input: AudioInput,
    output: AudioOutput,
}

#[derive(Serialize, Debug, Clone)]
struct AudioInput {
    encoding: &'static str,
    sample_rate: u32,
}

#[derive(Serialize, Debug, Clone)]
struct AudioOutput {
    encoding: &'static str,
    sample_rate: u32,
    container: &'static str,
}

#[derive(Serialize, Debug, Clone)]
struct AgentSettings {
    language: &'static str,
    speak: Value,
    listen: ListenSettings,
    think: ThinkSettings,
    greeting: String,
}

#[derive(Serialize, Debug, Clone)]
struct ListenSettings {
    provider: ListenProvider,
}

#[derive(Serialize, Debug, Clone)]
struct ListenProvider {
    #[serde(rename = "type")]
    kind: &'static str,
    version: &'static str,
    model: &'static str,
}

#[derive(Serialize, Debug, Clone)]
struct ThinkSettings {
    provider: ThinkProvider,
    prompt: String,
}

#[derive(Serialize, Debug, Clone)]
struct ThinkProvider {
    #[serde(rename = "type")]
    kind: &'static str,
    model: String,
}

impl Settings {
    /// Assembles the session settings. Pure and deterministic; `speak_config`
    /// is passed through unvalidated since the upstream service owns its
    /// schema.
    pub fn build(prompt: String, greeting: String, speak_config: Value, think_model: String) -> Self {
        Self {
            kind: "Settings",
            audio: AudioSettings {
                input: AudioInput {
                    encoding: "linear16",
                    sample_rate: 48000,
                },
                output: AudioOutput {
                    encoding: "linear16",
                    sample_rate: 24000,
                    container: "none",
                },
            },
            agent: AgentSettings {
                language: "en",
                speak: speak_config,
                listen: ListenSettings {
                    provider: ListenProvider {
                        kind: "deepgram",
                        version: "v1",
                        model: "nova-3",
                    },
                },
                think: ThinkSettings {
                    provider: ThinkProvider {
                        kind: "groq",
                        model: think_model,
                    },
                    prompt,
                },
                greeting,
            },
        }
    }
}
