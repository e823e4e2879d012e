//! Generation-service seam.
//!
//! The answering and summarization paths each hold their own configured
//! [`Generator`] instance. Provider failures surface as
//! [`RagError::Generation`] and are never retried here; callers that want
//! timeouts wrap the call themselves.

use async_trait::async_trait;
use parking_lot::Mutex;
use rig::agent::{Agent, AgentBuilder};
use rig::completion::{CompletionModel, Prompt};

use crate::config::GenerationSettings;
use crate::types::RagError;

/// Produces text from a fully rendered prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, RagError>;
}

/// Generator backed by a rig [`Agent`].
pub struct RigGenerator<M>
where
    M: CompletionModel,
{
    agent: Agent<M>,
}

impl<M> RigGenerator<M>
where
    M: CompletionModel,
{
    /// Wraps an already-configured agent.
    pub fn new(agent: Agent<M>) -> Self {
        Self { agent }
    }

    /// Builds an agent for `model` with the instance's sampling settings.
    ///
    /// The `model` handle already names the provider-side model; the
    /// [`GenerationSettings::model`] field documents which one a deployment
    /// is expected to construct.
    pub fn from_settings(model: M, settings: &GenerationSettings) -> Self {
        let agent = AgentBuilder::new(model)
            .temperature(settings.temperature)
            .build();
        Self { agent }
    }
}

#[async_trait]
impl<M> Generator for RigGenerator<M>
where
    M: CompletionModel,
{
    async fn generate(&self, prompt: &str) -> Result<String, RagError> {
        self.agent
            .prompt(prompt.to_string())
            .await
            .map_err(|err| RagError::Generation(err.to_string()))
    }
}

/// Deterministic generator for tests: returns a canned reply (or a canned
/// failure) and records every prompt it receives.
#[derive(Debug, Default)]
pub struct MockGenerator {
    reply: String,
    failure: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    /// Generator that answers every prompt with `reply`.
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            failure: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Generator whose every call fails with the given provider error.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            reply: String::new(),
            failure: Some(reason.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, RagError> {
        self.prompts.lock().push(prompt.to_string());
        match &self.failure {
            Some(reason) => Err(RagError::Generation(reason.clone())),
            None => Ok(self.reply.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_generator_records_prompts() {
        let generator = MockGenerator::replying("the answer");
        let reply = generator.generate("who won?").await.unwrap();
        assert_eq!(reply, "the answer");
        assert_eq!(generator.prompts(), vec!["who won?".to_string()]);
    }

    #[tokio::test]
    async fn failing_generator_surfaces_provider_error() {
        let generator = MockGenerator::failing("rate limited");
        let err = generator.generate("anything").await.unwrap_err();
        assert!(matches!(err, RagError::Generation(_)));
        assert!(err.to_string().contains("rate limited"));
    }
}
