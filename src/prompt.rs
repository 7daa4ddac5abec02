//! Per-session interviewer prompt synthesis.
//!
//! Before any audio flows, the server asks a Groq chat-completion model to
//! write the full system prompt the voice agent will interview with. The call
//! is a single request/response with no retries: a failure here is fatal for
//! the session that requested it.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";

/// A failure while synthesizing an interviewer prompt.
#[derive(Debug, thiserror::Error)]
pub enum PromptSynthesisError {
    #[error("GROQ_API_KEY is missing")]
    MissingCredential,
    #[error("Groq API error: {0}")]
    Api(String),
    #[error("No content received from Groq API")]
    EmptyCompletion,
    #[error("Groq request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Produces a ready-to-use voice-agent system prompt for one session.
#[async_trait]
pub trait PromptSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        role: &str,
        persona_name: &str,
    ) -> Result<String, PromptSynthesisError>;
}

/// The meta-prompt handed to the completion model. Deterministic given the
/// role and interviewer name.
fn interviewer_meta_prompt(role: &str, persona_name: &str) -> String {
    format!(
        r#"You are an expert prompt engineer. Create a comprehensive prompt for an AI voice agent that will conduct a technical interview. The interview is for a {role} position. The interviewer's name is {persona_name}.

Requirements for the prompt you create:

INTERVIEW STYLE: This is a technical expert interview, not an HR screening. The agent should act as a senior professional in the field where {role}s work, someone who is evaluating the candidate's technical knowledge, problem-solving approach, and real-world experience. The tone should be professional but conversational and encouraging.

STRUCTURE: Design an appropriate interview structure with multiple phases that makes sense for evaluating a {role}. Provide example questions for each phase you create, but explicitly tell the agent they can deviate and ask follow-up questions based on the candidate's responses. The agent should have a natural conversation, not rigidly follow a script.

VOICE-ONLY CONSTRAINTS: The agent must NEVER ask coding questions or anything requiring the user to write, read, or see code. All questions must be answerable through spoken explanation only. Focus on conceptual understanding, architectural decisions, trade-offs, past experiences, and hypothetical scenarios.

PACING: Keep the interview concise, around 20-30 minutes total. The agent should ask ONE question at a time and wait for the complete response before moving on. Never bombard the candidate with multiple questions at once. Give the candidate space to think and elaborate.

PERSONALITY: The interviewer name is {persona_name}. If the candidate asks personal questions like where they worked before, their background, or their experience in the field where {role}s work, the agent should respond naturally as a human would, making up reasonable and contextually appropriate details. They should never reveal they are an AI.

FEEDBACK: At the end of the interview, the agent MUST provide honest, constructive feedback. This should include what the candidate did well, areas for improvement, and an assessment of how they performed. Be direct but respectful. The candidate should leave with a clear understanding of their performance.

CRITICAL FORMATTING RULE: The agent must speak in plain natural text only, with no special formatting whatsoever. No asterisks for bold or italics, no bullet points, no numbered lists, no dashes, no special characters. This is essential because the output goes directly to a text-to-speech system that cannot handle markdown or special formatting. Everything should be spoken naturally as if having a normal conversation.

Now generate the complete interviewer prompt following all these requirements. The prompt should begin with "You are" and be written in plain text that can be directly fed to the voice agent."#
    )
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// A `PromptSynthesizer` backed by the Groq chat-completions endpoint.
pub struct GroqPromptSynthesizer {
    http: reqwest::Client,
    api_key: Option<String>,
    api_base: String,
    model: String,
}

impl GroqPromptSynthesizer {
    pub fn new(api_key: Option<String>, model: String) -> Self {
        Self::with_api_base(api_key, model, GROQ_API_BASE.to_string())
    }

    pub fn with_api_base(api_key: Option<String>, model: String, api_base: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            api_base,
            model,
        }
    }
}

#[async_trait]
impl PromptSynthesizer for GroqPromptSynthesizer {
    async fn synthesize(
        &self,
        role: &str,
        persona_name: &str,
    ) -> Result<String, PromptSynthesisError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(PromptSynthesisError::MissingCredential)?;

        let meta_prompt = interviewer_meta_prompt(role, persona_name);
        debug!(model = %self.model, "Requesting interviewer prompt from Groq");

        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(api_key)
            .json(&json!({
                "messages": [{ "role": "user", "content": meta_prompt }],
                "model": self.model,
                "temperature": 0.7,
                "max_tokens": 3000,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PromptSynthesisError::Api(
                response
                    .status()
                    .canonical_reason()
                    .unwrap_or("unknown status")
                    .to_string(),
            ));
        }

        let body: ChatCompletionResponse = response.json().await?;
        let content = body
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|c| !c.trim().is_empty())
            .ok_or(PromptSynthesisError::EmptyCompletion)?;

        info!("Interviewer prompt generated");

        // The prompt goes straight to a text-to-speech pipeline, so strip any
        // markdown emphasis the model slipped in despite the instructions.
        Ok(content.replace('*', "").trim().to_string())
    }
}
