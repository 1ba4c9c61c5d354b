//! OpenAI implementation of the judgment capabilities.
//!
//! One client backs all three capabilities. Every call uses structured
//! output: the response schema is derived from the Rust type with
//! `schemars` and sent as a `json_schema` response format.
//!
//! # Example
//!
//! ```rust,ignore
//! use research_judge::ai::OpenAI;
//!
//! let ai = Arc::new(OpenAI::from_credentials(&Credentials::from_env()));
//! let judge = ResearchJudge::with_capabilities(connectors, ai, JudgeConfig::default());
//! ```

use async_trait::async_trait;
use reqwest::Client;
use schemars::{schema_for, JsonSchema};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::error::{CapabilityError, CapabilityResult};
use crate::pipeline::prompts;
use crate::security::{
    credentials::{DEFAULT_MODEL, OPENAI_API_KEY},
    Credentials, SecretString,
};
use crate::traits::ai::{
    ConflictIdentifier, JudgmentSynthesizer, StanceClassifier, SynthesisOutput, SynthesisRequest,
};
use crate::types::evidence::{Evidence, EvidenceAnalysis};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const SYSTEM_PROMPT: &str = "You are a careful research analyst. Judge only from the evidence \
    you are given and answer strictly in the requested JSON format.";

/// Conflict identifier output.
#[derive(Debug, Deserialize, JsonSchema)]
struct ConflictList {
    /// One sentence per contradiction between analyses
    conflicts: Vec<String>,
}

/// OpenAI-backed stance classifier, conflict identifier and synthesizer.
///
/// The API key may be absent at construction; every call then fails with
/// `CapabilityError::MissingCredential`.
#[derive(Clone)]
pub struct OpenAI {
    client: Client,
    api_key: Option<SecretString>,
    model: String,
    base_url: String,
}

impl OpenAI {
    pub fn new(api_key: Option<SecretString>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from credentials read at startup.
    pub fn from_credentials(credentials: &Credentials) -> Self {
        let mut ai = Self::new(credentials.openai_api_key.clone())
            .with_model(credentials.openai_model.clone());
        if let Some(url) = &credentials.openai_base_url {
            ai = ai.with_base_url(url.clone());
        }
        ai
    }

    /// Set the chat model (default: gpt-4o).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Structured output with JSON schema (OpenAI's json_schema response_format).
    pub async fn generate_structured<T>(&self, schema_name: &str, user: &str) -> CapabilityResult<T>
    where
        T: JsonSchema + DeserializeOwned,
    {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| CapabilityError::MissingCredential {
                var: OPENAI_API_KEY.to_string(),
            })?;

        let schema = serde_json::to_value(schema_for!(T))?;
        let request = StructuredRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature: 0.0,
            response_format: ResponseFormat {
                format_type: "json_schema".to_string(),
                json_schema: JsonSchemaFormat {
                    name: schema_name.to_string(),
                    strict: false,
                    schema,
                },
            },
        };

        debug!(model = %self.model, schema = schema_name, "Structured completion");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key.expose()))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| CapabilityError::Http(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CapabilityError::Api(format!(
                "OpenAI returned {}: {}",
                status, error_text
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| CapabilityError::Parse(e.to_string()))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| CapabilityError::Api("No response from OpenAI".into()))?;

        parse_json(&content)
    }
}

/// Parse model output, tolerating a surrounding markdown code fence.
fn parse_json<T: DeserializeOwned>(content: &str) -> CapabilityResult<T> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed);

    Ok(serde_json::from_str(body.trim())?)
}

#[async_trait]
impl StanceClassifier for OpenAI {
    async fn classify(
        &self,
        question: &str,
        evidence: &Evidence,
    ) -> CapabilityResult<EvidenceAnalysis> {
        let prompt = prompts::format_classify_prompt(question, evidence);
        self.generate_structured("evidence_analysis", &prompt).await
    }
}

#[async_trait]
impl ConflictIdentifier for OpenAI {
    async fn find_conflicts(
        &self,
        question: &str,
        serialized_analyses: &str,
    ) -> CapabilityResult<Vec<String>> {
        let prompt = prompts::format_conflicts_prompt(question, serialized_analyses);
        let list: ConflictList = self.generate_structured("conflict_list", &prompt).await?;
        Ok(list.conflicts)
    }
}

#[async_trait]
impl JudgmentSynthesizer for OpenAI {
    async fn synthesize(&self, request: &SynthesisRequest<'_>) -> CapabilityResult<SynthesisOutput> {
        let prompt = prompts::format_synthesize_prompt(request);
        self.generate_structured("judgment", &prompt).await
    }
}

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Serialize)]
struct StructuredRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
    json_schema: JsonSchemaFormat,
}

#[derive(Serialize)]
struct JsonSchemaFormat {
    name: String,
    strict: bool,
    schema: serde_json::Value,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}
