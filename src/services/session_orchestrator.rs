//! Session lifecycle: instructions, titration loop, payoff draw, summary.
//!
//! The orchestrator owns the session context and drives the trial runner one
//! trial at a time. Every state change (bracket updates, counters, the trial
//! log) happens here, between two awaited runner calls, so nothing in the
//! core is ever touched concurrently.

use anyhow::{Context, Result};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::{DomainResult, TitrationError};
use crate::domain::models::{
    ChoiceContext, ChoiceOption, ChoicePrompt, ChoiceResponse, ConditionKind, ConditionSnapshot,
    ConditionStore, KindCategory, PayoffOutcome, Payout, SessionConfig, SessionPhase,
    SessionState, SessionSummary, StepDecision, TrialKind, TrialRecord, TrialSpec, FILLER_ID,
};
use crate::domain::ports::{TrialRunner, TrialSink};
use crate::services::bracket_updater::BracketUpdater;
use crate::services::reward_sampler::RewardSampler;
use crate::services::stimulus_formatter::StimulusFormatter;
use crate::services::trial_sequencer::{TrialSequence, TrialSequencer};

/// A trial as it was put in front of the subject, before the response
struct PresentedTrial {
    trial_kind: TrialKind,
    condition_id: String,
    stimulus_condition_id: Option<String>,
    sequence_position: Option<usize>,
    offered_reward: u32,
    stimulus_text: String,
}

/// Drives one titration session from instructions to summary
pub struct SessionOrchestrator<R: TrialRunner> {
    config: SessionConfig,
    sampler: RewardSampler,
    updater: BracketUpdater,
    sequencer: TrialSequencer,
    formatter: StimulusFormatter,
    runner: R,
    sink: Arc<dyn TrialSink>,
    rng: StdRng,
    state: SessionState,
    sequence: Option<TrialSequence>,
}

impl<R: TrialRunner> SessionOrchestrator<R> {
    /// Create a session from validated configuration
    ///
    /// Uses `config.seed` when set, otherwise seeds from OS entropy.
    pub fn new(config: SessionConfig, runner: R, sink: Arc<dyn TrialSink>) -> Self {
        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        let conditions = ConditionStore::initialize(
            config.standard_amount,
            &config.temporal_delay_levels,
            &config.probability_levels,
        );

        Self {
            sampler: RewardSampler::new(config.step_size, config.standard_amount),
            updater: BracketUpdater::new(config.standard_amount, config.step_size),
            sequencer: TrialSequencer::new(),
            formatter: StimulusFormatter::new(config.standard_amount, config.currency_symbol.clone()),
            state: SessionState::new(conditions),
            config,
            runner,
            sink,
            rng,
            sequence: None,
        }
    }

    /// Replace the default sequencer
    #[must_use]
    pub fn with_sequencer(mut self, sequencer: TrialSequencer) -> Self {
        self.sequencer = sequencer;
        self
    }

    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The titration sequence, once the titration phase has started
    pub const fn sequence(&self) -> Option<&TrialSequence> {
        self.sequence.as_ref()
    }

    pub const fn runner(&self) -> &R {
        &self.runner
    }

    pub fn into_runner(self) -> R {
        self.runner
    }

    /// Run every phase in order and return the summary
    #[instrument(skip_all, fields(session_id = %self.state.id))]
    pub async fn run(&mut self) -> Result<SessionSummary> {
        info!(
            conditions = self.config.condition_count(),
            repeats = self.config.repeats_per_condition,
            budget = self.config.effective_trial_budget(),
            "session started"
        );

        self.present_instructions().await?;
        self.run_titration().await?;
        let payoff = self.run_payoff().await?;
        self.finish(payoff).await
    }

    /// Phase 1: instruction pages
    pub async fn present_instructions(&mut self) -> Result<()> {
        self.state.advance(SessionPhase::Instructions);
        for page in self.formatter.instruction_pages() {
            self.runner
                .show_message(&page)
                .await
                .context("Failed to show instructions")?;
        }
        Ok(())
    }

    /// Phase 2: the titration loop with interleaved filler trials
    #[instrument(skip_all)]
    pub async fn run_titration(&mut self) -> Result<()> {
        self.state.advance(SessionPhase::Titration);

        let sequence = self.sequencer.build_sequence(
            &self.state.conditions,
            self.config.repeats_per_condition,
            &mut self.rng,
        );
        let entries = sequence.entries.clone();
        self.sequence = Some(sequence);

        for spec in &entries {
            match self.on_sequence_step(spec)? {
                StepDecision::Stop => break,
                StepDecision::Skip => {
                    debug!(position = spec.position, condition_id = %spec.condition_id, "skipping resolved condition");
                    continue;
                }
                StepDecision::Proceed => {}
            }

            self.run_titration_trial(spec).await?;

            if self.filler_due() {
                self.run_filler_trial(&spec.condition_id).await?;
            }
        }

        info!(
            trials = self.state.total_trials_run,
            fillers = self.state.filler_trials_run,
            resolved = self.state.resolved_count,
            "titration finished"
        );
        Ok(())
    }

    /// Decide what to do with the next sequence entry
    pub fn on_sequence_step(&self, spec: &TrialSpec) -> DomainResult<StepDecision> {
        if self.state.total_trials_run >= self.config.effective_trial_budget()
            || self.state.conditions.all_resolved()
        {
            return Ok(StepDecision::Stop);
        }

        if self.state.conditions.is_resolved(&spec.condition_id)? {
            return Ok(StepDecision::Skip);
        }

        Ok(StepDecision::Proceed)
    }

    /// One filler every second titration trial once the threshold is reached
    pub const fn filler_due(&self) -> bool {
        let run = self.state.total_trials_run;
        run >= self.config.distractor_start_threshold && run % 2 == 0
    }

    async fn run_titration_trial(&mut self, spec: &TrialSpec) -> Result<()> {
        let condition = self.state.conditions.get(&spec.condition_id)?;
        let kind = condition.kind;
        let offered = self.sampler.sample(condition, &mut self.rng)?;
        let text = self.formatter.format(&spec.condition_id, kind, offered)?;

        let presented = PresentedTrial {
            trial_kind: TrialKind::Titration,
            condition_id: spec.condition_id.clone(),
            stimulus_condition_id: None,
            sequence_position: Some(spec.position),
            offered_reward: offered,
            stimulus_text: text,
        };
        let (response, chosen) = self.present(&presented, kind).await?;

        let condition = self.state.conditions.get_mut(&spec.condition_id)?;
        let update = self.updater.apply_choice(condition, chosen, offered)?;
        let snapshot = condition.snapshot();

        self.state.total_trials_run += 1;
        if update.converged() {
            self.state.resolved_count += 1;
        }

        self.commit(presented, response, chosen, snapshot).await
    }

    async fn run_filler_trial(&mut self, after_condition_id: &str) -> Result<()> {
        let after = self.state.conditions.get(after_condition_id)?.kind.category();
        let (source_id, source_kind) = self.pick_filler_source(after)?;

        let filler = self.state.conditions.filler()?;
        let offered = self.sampler.sample(filler, &mut self.rng)?;
        let snapshot = filler.snapshot();
        let text = self.formatter.format(&source_id, source_kind, offered)?;

        let presented = PresentedTrial {
            trial_kind: TrialKind::Filler,
            condition_id: FILLER_ID.to_string(),
            stimulus_condition_id: Some(source_id),
            sequence_position: None,
            offered_reward: offered,
            stimulus_text: text,
        };
        let (response, chosen) = self.present(&presented, source_kind).await?;

        self.state.filler_trials_run += 1;
        self.commit(presented, response, chosen, snapshot).await
    }

    /// Uniform pick among conditions of the opposite category; falls back to
    /// the same category when the opposite one is empty.
    fn pick_filler_source(&mut self, after: KindCategory) -> DomainResult<(String, ConditionKind)> {
        let mut candidates = after
            .opposite()
            .map(|opposite| self.state.conditions.of_category(opposite))
            .unwrap_or_default();

        if candidates.is_empty() {
            debug!(category = %after, "no opposite-kind conditions; filler reuses same kind");
            candidates = self.state.conditions.of_category(after);
        }

        candidates
            .choose(&mut self.rng)
            .map(|c| (c.id.clone(), c.kind))
            .ok_or_else(|| TitrationError::UnknownCondition(format!("any {after} condition")))
    }

    /// Phase 3: re-present one completed titration trial for real stakes
    #[instrument(skip_all)]
    pub async fn run_payoff(&mut self) -> Result<Option<PayoffOutcome>> {
        self.state.advance(SessionPhase::Payoff);

        let Some(source) = self
            .state
            .titration_records()
            .choose(&mut self.rng)
            .map(|r| (*r).clone())
        else {
            warn!(error = %TitrationError::NoCompletedTrials, "skipping payoff trial");
            return Ok(None);
        };

        let kind = self.state.conditions.get(&source.condition_id)?.kind;

        self.runner
            .show_message(&self.formatter.payoff_intro())
            .await
            .context("Failed to announce payoff trial")?;

        let presented = PresentedTrial {
            trial_kind: TrialKind::Payoff,
            condition_id: source.condition_id.clone(),
            stimulus_condition_id: None,
            sequence_position: source.sequence_position,
            offered_reward: source.offered_reward,
            stimulus_text: source.stimulus_text.clone(),
        };
        let (response, chosen) = self.present(&presented, kind).await?;

        let payout = Payout::for_choice(chosen, kind, source.offered_reward, self.config.standard_amount);
        let snapshot = self.state.conditions.get(&source.condition_id)?.snapshot();

        let outcome = PayoffOutcome {
            source_trial_index: source.trial_index,
            condition_id: source.condition_id.clone(),
            kind,
            offered_reward: source.offered_reward,
            stimulus_text: source.stimulus_text,
            chosen_label: response.chosen_label.clone(),
            chosen_option: chosen,
            response_time_ms: response.response_time_ms,
            payout,
        };

        self.commit(presented, response, chosen, snapshot).await?;

        self.runner
            .show_message(&self.formatter.payout_message(chosen, &payout))
            .await
            .context("Failed to announce payout")?;

        info!(
            source_trial = outcome.source_trial_index,
            condition_id = %outcome.condition_id,
            payout = %outcome.payout,
            "payoff trial completed"
        );
        Ok(Some(outcome))
    }

    /// Phase 4: assemble and publish the summary
    pub async fn finish(&mut self, payoff: Option<PayoffOutcome>) -> Result<SessionSummary> {
        self.state.advance(SessionPhase::Complete);
        let summary = self.state.summary(payoff);

        self.runner
            .show_message(&self.formatter.closing_message())
            .await
            .context("Failed to show closing message")?;

        self.sink
            .finish(&summary)
            .await
            .context("Failed to persist session summary")?;

        info!(
            total_trials = summary.total_trials_run,
            filler_trials = summary.filler_trials_run,
            resolved = summary.resolved_count,
            conditions = summary.condition_count,
            "session complete"
        );
        Ok(summary)
    }

    /// Present a prompt until a recognised label comes back
    ///
    /// Unrecognised labels leave every bracket untouched and re-present the
    /// same prompt, up to `max_invalid_responses` times in a row.
    async fn present(
        &mut self,
        presented: &PresentedTrial,
        kind: ConditionKind,
    ) -> Result<(ChoiceResponse, ChoiceOption)> {
        self.state
            .note_presented(presented.offered_reward, &presented.stimulus_text);

        let prompt = ChoicePrompt::new(presented.trial_kind, presented.stimulus_text.clone())
            .with_context(ChoiceContext {
                kind,
                offered_reward: presented.offered_reward,
                standard_amount: self.config.standard_amount,
            });

        let mut invalid = 0;
        loop {
            let response = self
                .runner
                .present_choice(&prompt)
                .await
                .context("Trial runner failed to collect a response")?;

            match ChoiceOption::from_label(&response.chosen_label) {
                Ok(chosen) => return Ok((response, chosen)),
                Err(err) => {
                    invalid += 1;
                    warn!(
                        condition_id = %presented.condition_id,
                        label = %response.chosen_label,
                        attempt = invalid,
                        "invalid response; re-presenting trial"
                    );
                    if invalid >= self.config.max_invalid_responses {
                        return Err(err.into());
                    }
                }
            }
        }
    }

    /// Append the record to the session log and hand it to the sink
    async fn commit(
        &mut self,
        presented: PresentedTrial,
        response: ChoiceResponse,
        chosen: ChoiceOption,
        snapshot: ConditionSnapshot,
    ) -> Result<()> {
        let record = TrialRecord {
            session_id: self.state.id,
            trial_index: self.state.next_trial_index(),
            sequence_position: presented.sequence_position,
            trial_kind: presented.trial_kind,
            condition_id: presented.condition_id,
            stimulus_condition_id: presented.stimulus_condition_id,
            offered_reward: presented.offered_reward,
            stimulus_text: presented.stimulus_text,
            chosen_label: response.chosen_label,
            chosen_option: chosen,
            response_time_ms: response.response_time_ms,
            condition_snapshot: snapshot,
            recorded_at: Utc::now(),
        };

        debug!(
            trial_index = record.trial_index,
            trial_kind = %record.trial_kind,
            condition_id = %record.condition_id,
            offered = record.offered_reward,
            chosen = %record.chosen_option,
            "trial recorded"
        );

        self.sink
            .record(&record)
            .await
            .context("Failed to persist trial record")?;
        self.state.append_record(record);

        if self.config.post_trial_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.post_trial_delay_ms)).await;
        }
        Ok(())
    }
}
