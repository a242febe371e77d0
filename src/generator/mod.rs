pub mod claude;
pub mod prompt;

pub use claude::ClaudeClient;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::github::ChangedFile;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("model API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("model API responded with {status}: {message}")]
    Status {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("model reply contained no text block")]
    MissingTextBlock,

    #[error("model reply contained no parseable JSON object: {0}")]
    Parse(String),

    #[error("model returned an empty {0}")]
    EmptyField(&'static str),
}

/// Context about the target carried into the prompt. Fully populated for
/// the pull request path; branch labels only for the compare path.
#[derive(Debug, Clone, Default)]
pub struct GenerationContext {
    pub title: Option<String>,
    pub body: Option<String>,
    pub base: Option<String>,
    pub head: Option<String>,
}

/// The model's structured output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneratedContent {
    pub title: String,
    pub description: String,
}

/// Remote text-generation model. The real implementation calls the
/// Anthropic Messages API; tests substitute canned replies.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, GeneratorError>;
}

/// Build the prompt, invoke the model once, and parse its structured reply.
pub async fn generate(
    model: &dyn CompletionModel,
    files: &[ChangedFile],
    context: &GenerationContext,
) -> Result<GeneratedContent, GeneratorError> {
    let prompt = prompt::build_prompt(files, context);
    debug!(prompt_bytes = prompt.len(), files = files.len(), "invoking model");
    let reply = model.complete(&prompt).await?;
    debug!(reply_bytes = reply.len(), "received model reply");
    parse_reply(&reply)
}

fn parse_reply(reply: &str) -> Result<GeneratedContent, GeneratorError> {
    let json = extract_json(reply)
        .ok_or_else(|| GeneratorError::Parse("no JSON object found in reply".to_string()))?;
    let content: GeneratedContent =
        serde_json::from_str(json).map_err(|err| GeneratorError::Parse(err.to_string()))?;
    if content.title.trim().is_empty() {
        return Err(GeneratorError::EmptyField("title"));
    }
    if content.description.trim().is_empty() {
        return Err(GeneratorError::EmptyField("description"));
    }
    Ok(content)
}

/// Greedy extraction: first `{` through last `}`. Assumes the model kept
/// braces out of any surrounding prose, which the prompt asks for but
/// nothing enforces.
fn extract_json(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&reply[start..=end])
}
