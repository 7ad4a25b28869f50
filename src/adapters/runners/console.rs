//! Interactive runner reading answers from stdin.

use anyhow::{Context, Result};
use async_trait::async_trait;
use console::{style, Term};
use std::io::Write;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::domain::models::{ChoicePrompt, ChoiceResponse, TrialKind};
use crate::domain::ports::TrialRunner;

/// Presents trials on the terminal and times the subject's answer
///
/// The raw answer is returned as typed; label validation belongs to the
/// orchestrator, which re-presents the trial on anything it cannot parse.
pub struct ConsoleTrialRunner {
    lines: Lines<BufReader<Stdin>>,
    term: Term,
    clear_between_trials: bool,
}

impl Default for ConsoleTrialRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleTrialRunner {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            term: Term::stdout(),
            clear_between_trials: true,
        }
    }

    #[must_use]
    pub fn with_clear_between_trials(mut self, clear: bool) -> Self {
        self.clear_between_trials = clear;
        self
    }

    async fn read_line(&mut self) -> Result<String> {
        self.lines
            .next_line()
            .await
            .context("Failed to read from stdin")?
            .context("Input closed before the session finished")
    }

    fn clear(&self) {
        if self.clear_between_trials && self.term.is_term() {
            // Clearing is cosmetic
            let _ = self.term.clear_screen();
        }
    }
}

#[async_trait]
impl TrialRunner for ConsoleTrialRunner {
    async fn present_choice(&mut self, prompt: &ChoicePrompt) -> Result<ChoiceResponse> {
        self.clear();

        if prompt.trial_kind == TrialKind::Payoff {
            println!("{}", style("This choice is for real.").yellow().bold());
            println!();
        }
        println!("{}", style(&prompt.stimulus_text).bold());
        println!();
        print!("Your choice [{}]: ", prompt.option_labels.join("/"));
        std::io::stdout().flush().context("Failed to flush stdout")?;

        let started = Instant::now();
        let answer = self.read_line().await?;
        let response_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        Ok(ChoiceResponse::new(answer.trim(), response_time_ms))
    }

    async fn show_message(&mut self, text: &str) -> Result<()> {
        self.clear();
        println!("{text}");
        println!();
        print!("{}", style("Press Enter to continue").dim());
        std::io::stdout().flush().context("Failed to flush stdout")?;
        self.read_line().await?;
        Ok(())
    }
}
