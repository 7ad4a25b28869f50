use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::{ChoicePrompt, ChoiceResponse};

/// Port for the collaborator that puts stimuli in front of the subject
///
/// The session orchestrator calls the runner one trial at a time and waits
/// for each response before doing anything else. The runner never sees
/// bracket state; it renders what it is given and reports the label the
/// subject picked.
///
/// # Examples
///
/// ```no_run
/// use titrate::domain::models::{ChoicePrompt, TrialKind};
/// use titrate::domain::ports::TrialRunner;
/// use anyhow::Result;
///
/// async fn example(runner: &mut dyn TrialRunner) -> Result<()> {
///     let prompt = ChoicePrompt::new(TrialKind::Titration, "A: $400 now\nB: $1000 in 30 days");
///     let response = runner.present_choice(&prompt).await?;
///     println!("picked {} after {}ms", response.chosen_label, response.response_time_ms);
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait TrialRunner: Send {
    /// Present a binary choice and wait for the subject's answer
    ///
    /// # Returns
    ///
    /// * `Ok(ChoiceResponse)` - The label picked (validated by the caller) and
    ///   the response time in milliseconds
    /// * `Err` - The runner could not collect a response
    async fn present_choice(&mut self, prompt: &ChoicePrompt) -> Result<ChoiceResponse>;

    /// Show an informational screen (instructions, payoff announcement)
    ///
    /// Runners without a display surface may ignore it.
    async fn show_message(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }
}
