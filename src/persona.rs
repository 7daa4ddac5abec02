//! The fixed catalog of interviewer personas.
//!
//! Each persona pairs a display name with an opaque `speak` provider blob for
//! the Deepgram Agent API. The blob's schema is owned by the upstream service,
//! so it is carried as raw JSON and never validated here.

use serde_json::{Value, json};
use tracing::warn;

/// A named voice personality for the interviewing agent.
#[derive(Clone, Debug)]
pub struct Persona {
    pub name: String,
    pub speak_config: Value,
}

/// An immutable, non-empty list of personas. Index 0 is the default.
#[derive(Clone, Debug)]
pub struct PersonaCatalog {
    personas: Vec<Persona>,
}

impl PersonaCatalog {
    /// The interviewers shipped with the service.
    pub fn builtin() -> Self {
        Self {
            personas: vec![
                Persona {
                    name: "Kevin McCannly".to_string(),
                    speak_config: json!({
                        "provider": {
                            "type": "eleven_labs",
                            "model_id": "eleven_multilingual_v2",
                            "voice_id": "onwK4e9ZLuTAKqWW03F9"
                        }
                    }),
                },
                Persona {
                    name: "Michael Crickett".to_string(),
                    speak_config: json!({
                        "provider": {
                            "type": "deepgram",
                            "model": "aura-2-odysseus-en"
                        }
                    }),
                },
                Persona {
                    name: "Tom Bradshaw".to_string(),
                    speak_config: json!({
                        "provider": {
                            "type": "deepgram",
                            "model": "aura-arcas-en"
                        }
                    }),
                },
                Persona {
                    name: "Lauren Ashford".to_string(),
                    speak_config: json!({
                        "provider": {
                            "type": "deepgram",
                            "model": "aura-2-delia-en"
                        }
                    }),
                },
            ],
        }
    }

    pub fn default_persona(&self) -> &Persona {
        &self.personas[0]
    }

    /// Selects a persona by exact name, falling back to the default entry.
    ///
    /// An unknown name is not an error: the original server logs the mismatch
    /// and proceeds with the default interviewer.
    pub fn select(&self, requested: Option<&str>) -> &Persona {
        match requested {
            Some(name) => match self.personas.iter().find(|p| p.name == name) {
                Some(persona) => persona,
                None => {
                    let fallback = self.default_persona();
                    warn!(
                        requested = name,
                        fallback = %fallback.name,
                        "Requested interviewer not found, using default"
                    );
                    fallback
                }
            },
            None => self.default_persona(),
        }
    }
}
