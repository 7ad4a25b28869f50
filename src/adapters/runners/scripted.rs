//! Scripted trial runner for testing.

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::domain::models::{ChoicePrompt, ChoiceResponse};
use crate::domain::ports::TrialRunner;

const DEFAULT_RESPONSE_TIME_MS: u64 = 750;

/// Answers prompts with a fixed list of labels, in order
///
/// Every prompt and message it receives is kept so tests can inspect exactly
/// what the subject would have seen.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTrialRunner {
    labels: Vec<String>,
    cursor: usize,
    cycle: bool,
    response_time_ms: u64,
    prompts: Vec<ChoicePrompt>,
    messages: Vec<String>,
}

impl ScriptedTrialRunner {
    /// Play `labels` once; presenting past the end is an error
    pub fn new<S: AsRef<str>>(labels: &[S]) -> Self {
        Self {
            labels: labels.iter().map(|l| l.as_ref().to_string()).collect(),
            cursor: 0,
            cycle: false,
            response_time_ms: DEFAULT_RESPONSE_TIME_MS,
            prompts: Vec::new(),
            messages: Vec::new(),
        }
    }

    /// Play `labels` round-robin, forever
    pub fn cycling<S: AsRef<str>>(labels: &[S]) -> Self {
        Self {
            cycle: true,
            ..Self::new(labels)
        }
    }

    #[must_use]
    pub fn with_response_time(mut self, response_time_ms: u64) -> Self {
        self.response_time_ms = response_time_ms;
        self
    }

    /// Prompts presented so far
    pub fn prompts(&self) -> &[ChoicePrompt] {
        &self.prompts
    }

    /// Messages shown so far
    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

#[async_trait]
impl TrialRunner for ScriptedTrialRunner {
    async fn present_choice(&mut self, prompt: &ChoicePrompt) -> Result<ChoiceResponse> {
        if self.labels.is_empty() || (!self.cycle && self.cursor >= self.labels.len()) {
            bail!(
                "Scripted runner exhausted after {} responses",
                self.prompts.len()
            );
        }

        let label = self.labels[self.cursor % self.labels.len()].clone();
        self.cursor += 1;
        self.prompts.push(prompt.clone());

        Ok(ChoiceResponse::new(label, self.response_time_ms))
    }

    async fn show_message(&mut self, text: &str) -> Result<()> {
        self.messages.push(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::TrialKind;

    #[tokio::test]
    async fn test_plays_labels_in_order_then_fails() {
        let mut runner = ScriptedTrialRunner::new(&["A", "B"]);
        let prompt = ChoicePrompt::new(TrialKind::Titration, "text");

        assert_eq!(runner.present_choice(&prompt).await.unwrap().chosen_label, "A");
        assert_eq!(runner.present_choice(&prompt).await.unwrap().chosen_label, "B");
        assert!(runner.present_choice(&prompt).await.is_err());
        assert_eq!(runner.prompts().len(), 2);
    }

    #[tokio::test]
    async fn test_cycling_wraps_around() {
        let mut runner = ScriptedTrialRunner::cycling(&["B"]).with_response_time(10);
        let prompt = ChoicePrompt::new(TrialKind::Filler, "text");

        for _ in 0..5 {
            let response = runner.present_choice(&prompt).await.unwrap();
            assert_eq!(response, ChoiceResponse::new("B", 10));
        }
    }

    #[tokio::test]
    async fn test_empty_script_fails() {
        let mut runner = ScriptedTrialRunner::cycling::<&str>(&[]);
        let prompt = ChoicePrompt::new(TrialKind::Titration, "text");
        assert!(runner.present_choice(&prompt).await.is_err());
    }

    #[tokio::test]
    async fn test_messages_are_kept() {
        let mut runner = ScriptedTrialRunner::new(&["A"]);
        runner.show_message("hello").await.unwrap();
        assert_eq!(runner.messages(), ["hello".to_string()]);
    }
}
