//! LLM agent module for page classification and summarization.
//!
//! Uses rstructor to talk to the configured provider; responses are shape-checked with serde.

use crate::config::Config;
use rstructor::{GeminiClient, GeminiModel, LLMClient, OpenAIClient, OpenAIModel};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LLM request failed: {0}")]
    RequestFailed(String),
    #[error("response does not match the expected shape: {0}")]
    ContractViolation(String),
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl AgentError {
    /// Whether the pipeline may skip the page and keep going
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ContractViolation(_))
    }
}

/// Classification of a single page.
///
/// `knowledge` is only meaningful when `has_content` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PageContent {
    /// Whether the page holds material worth studying
    pub has_content: bool,
    /// Knowledge points extracted from the page
    pub knowledge: Vec<String>,
}

impl PageContent {
    pub fn empty() -> Self {
        Self {
            has_content: false,
            knowledge: Vec::new(),
        }
    }
}

/// Decides whether a page has content and extracts its knowledge points
#[allow(async_fn_in_trait)]
pub trait Classifier {
    async fn classify(&self, page_text: &str) -> Result<PageContent, AgentError>;
}

/// Turns the accumulated knowledge into a markdown narrative
#[allow(async_fn_in_trait)]
pub trait Summarizer {
    async fn summarize(&self, knowledge: &[String]) -> Result<String, AgentError>;
}

const CLASSIFY_PERSONA: &str = r#"Analyze this page as if you're studying from a book.

SKIP content if the page contains:
- Table of contents
- Chapter listings
- Index pages
- Blank pages
- Copyright information
- Publishing details
- References or bibliography
- Acknowledgments

DO extract knowledge if the page contains:
- Preface content that explains important concepts
- Actual educational content
- Key definitions and concepts
- Important arguments or theories
- Examples and case studies
- Significant findings or conclusions
- Methodologies or frameworks
- Critical analyses or interpretations

For valid content:
- Set has_content to true
- Extract detailed, learnable knowledge points
- Include important quotes or key statements
- Capture examples with their context
- Preserve technical terms and definitions

For pages to skip:
- Set has_content to false
- Return empty knowledge list"#;

const SUMMARIZE_PERSONA: &str = r#"Create a comprehensive summary of the provided content in a concise but detailed way, using markdown format.

Use markdown formatting:
- ## for main sections
- ### for subsections
- Bullet points for lists
- `code blocks` for any code or formulas
- **bold** for emphasis
- *italic* for terminology
- > blockquotes for important notes

Return only the markdown summary, nothing else. Do not say 'here is the summary' or anything like that before or after"#;

/// Provider-backed agent used for both classification and summarization
pub struct LlmAgent {
    provider: String,
    api_key: String,
    classifier_model: String,
    summarizer_model: String,
}

impl LlmAgent {
    pub fn from_config(config: &Config) -> Result<Self, AgentError> {
        let api_key = config.api_key()?.to_string();
        Ok(Self {
            provider: config.agent.provider.clone(),
            api_key,
            classifier_model: config.agent.classifier_model.clone(),
            summarizer_model: config.agent.summarizer_model.clone(),
        })
    }

    /// Send a single prompt and return the raw text reply
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, AgentError> {
        debug!(provider = %self.provider, model, prompt_chars = prompt.len(), "sending LLM request");

        let result = match self.provider.as_str() {
            "gemini" => {
                let client = GeminiClient::new(self.api_key.clone())
                    .map_err(|e| AgentError::RequestFailed(e.to_string()))?
                    .model(parse_gemini_model(model));
                client.generate_with_metadata(prompt).await
            }
            _ => {
                let client = OpenAIClient::new(self.api_key.clone())
                    .map_err(|e| AgentError::RequestFailed(e.to_string()))?
                    .model(parse_openai_model(model));
                client.generate_with_metadata(prompt).await
            }
        }
        .map_err(|e| AgentError::RequestFailed(e.to_string()))?;

        Ok(result.text)
    }
}

impl Classifier for LlmAgent {
    async fn classify(&self, page_text: &str) -> Result<PageContent, AgentError> {
        let schema = serde_json::to_string_pretty(&schemars::schema_for!(PageContent))
            .map_err(|e| AgentError::RequestFailed(e.to_string()))?;

        let prompt = format!(
            r#"{}

You MUST respond with valid JSON matching this exact schema:
{}

Do not include any markdown formatting, code blocks, or explanations. Only output the raw JSON object.

---

Page text: {}"#,
            CLASSIFY_PERSONA, schema, page_text
        );

        let reply = self.generate(&self.classifier_model, &prompt).await?;
        parse_page_content(&reply)
    }
}

impl Summarizer for LlmAgent {
    async fn summarize(&self, knowledge: &[String]) -> Result<String, AgentError> {
        if knowledge.is_empty() {
            return Ok(String::new());
        }

        let prompt = format!(
            "{}\n\n---\n\nAnalyze this content:\n{}",
            SUMMARIZE_PERSONA,
            knowledge.join("\n")
        );

        let reply = self.generate(&self.summarizer_model, &prompt).await?;
        Ok(reply.trim().to_string())
    }
}

/// Shape-check a classifier reply
pub fn parse_page_content(reply: &str) -> Result<PageContent, AgentError> {
    let cleaned = strip_markdown_json(reply);
    let content: PageContent = serde_json::from_str(&cleaned)
        .map_err(|e| AgentError::ContractViolation(format!("{}: {}", e, cleaned)))?;

    if !content.has_content && !content.knowledge.is_empty() {
        warn!(
            dropped = content.knowledge.len(),
            "classifier returned knowledge for a page without content"
        );
        return Ok(PageContent::empty());
    }
    Ok(content)
}

/// Strip markdown code block wrappers from JSON response
fn strip_markdown_json(text: &str) -> String {
    let trimmed = text.trim();

    // Remove ```json ... ``` or ``` ... ```
    if let Some(rest) = trimmed.strip_prefix("```") {
        let without_prefix = rest.strip_prefix("json").unwrap_or(rest);

        if let Some(end_idx) = without_prefix.rfind("```") {
            return without_prefix[..end_idx].trim().to_string();
        }
    }

    trimmed.to_string()
}

/// Parse a model string into a GeminiModel
fn parse_gemini_model(model: &str) -> GeminiModel {
    match model {
        "gemini-2.0-flash" => GeminiModel::Gemini20Flash,
        "gemini-2.5-flash" => GeminiModel::Gemini25Flash,
        "gemini-2.5-pro" => GeminiModel::Gemini25Pro,
        other => {
            warn!(model = other, "unknown Gemini model, using gemini-2.0-flash");
            GeminiModel::Gemini20Flash
        }
    }
}

/// Parse a model string into an OpenAIModel
fn parse_openai_model(model: &str) -> OpenAIModel {
    match model {
        "gpt-4o" => OpenAIModel::Gpt4O,
        "gpt-4o-mini" => OpenAIModel::Gpt4OMini,
        other => {
            warn!(model = other, "unknown OpenAI model, using gpt-4o-mini");
            OpenAIModel::Gpt4OMini
        }
    }
}
