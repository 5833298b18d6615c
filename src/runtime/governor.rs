//! Session governor
//!
//! Routes one user input per call. Sessions that have not completed the
//! handshake go through the onboarding state machine; active sessions go
//! through the gating pipeline:
//!
//! 1. validate the credential (`PMT_INVALID`)
//! 2. hard-stop scan of the input (`SAFETY_PRE`, no inference)
//! 3. budget check (`BUDGET_DEPLETED`, no inference)
//! 4. inference with the mode's system instruction and the full history
//! 5. hard-stop scan of the output (`SAFETY_POST`)
//! 6. ledger decrement
//! 7. assembly: optional `BUDGET_WARNING`, text, budget footer
//!
//! `RENEW` skips steps 2 to 7 once the credential has been validated.

use super::{GovernorConfig, LlmClient, SessionLocks, SessionStore, SessionSummary};
use crate::credential::CredentialIssuer;
use crate::filter::HardStopFilter;
use crate::interrupt::{Constraint, InterruptRecord};
use crate::ledger::{LexicalScorer, RiskBudget, RiskCategory, RiskScorer};
use crate::llm::{LlmMessage, LlmRequest};
use crate::session::Session;
use crate::state_machine::state::{RENEW_COMMAND, RENEW_RESPONSE};
use crate::state_machine::{transition, CredentialLifetime, Effect, TransitionError};
use crate::system_prompt::system_instruction;
use chrono::{DateTime, Utc};
use std::fmt::Write;
use std::sync::Arc;

/// Body returned by a session reset
pub const RESET_ACKNOWLEDGEMENT: &str = "Reset complete";

/// Reply to a blank message in an active session
pub const EMPTY_INPUT_RESPONSE: &str = "Empty message. Type your inquiry.";

/// How an active turn ended
enum ActiveOutcome {
    /// Model text, possibly prefixed with a budget warning
    Reply(String),
    /// Interrupt record in place of model output
    Interrupt(Constraint, String),
    /// Budget refilled; not recorded in history
    Renewed,
    /// Inference failed; nothing recorded
    Failed(String),
}

pub struct Governor<S, L> {
    store: S,
    llm: L,
    issuer: CredentialIssuer,
    filter: HardStopFilter,
    scorer: Arc<dyn RiskScorer>,
    config: GovernorConfig,
    locks: SessionLocks,
}

impl<S: SessionStore, L: LlmClient> Governor<S, L> {
    pub fn new(store: S, llm: L, issuer: CredentialIssuer, config: GovernorConfig) -> Self {
        Self {
            store,
            llm,
            issuer,
            filter: HardStopFilter::default(),
            scorer: Arc::new(LexicalScorer::default()),
            config,
            locks: SessionLocks::default(),
        }
    }

    pub fn with_filter(mut self, filter: HardStopFilter) -> Self {
        self.filter = filter;
        self
    }

    #[allow(dead_code)] // Scoring override for tests and embedders
    pub fn with_scorer(mut self, scorer: Arc<dyn RiskScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn model_id(&self) -> &str {
        self.llm.model_id()
    }

    /// Process one user message and return the reply. Never fails: every
    /// path yields a response string.
    pub async fn handle_turn(&self, session_id: &str, message: &str) -> String {
        let guard = self.locks.acquire(session_id).await;
        let response = self.turn(session_id, message.trim()).await;
        self.locks.release(session_id, guard).await;
        response
    }

    async fn turn(&self, session_id: &str, input: &str) -> String {
        let mut session = self.load(session_id).await;

        // Blank input never reaches history or the model
        if input.is_empty() {
            return empty_input_reply(&session);
        }

        let response = if session.is_active() {
            self.active_turn(session_id, &mut session, input).await
        } else {
            self.onboarding_turn(session_id, &mut session, input)
        };

        self.save(session_id, &session).await;
        response
    }

    /// Reinitialize a session to mode selection
    pub async fn reset(&self, session_id: &str) {
        let guard = self.locks.acquire(session_id).await;
        self.save(session_id, &Session::default()).await;
        self.locks.release(session_id, guard).await;
        tracing::info!(session_id, "Session reset");
    }

    /// Markdown transcript of a session
    pub async fn export(&self, session_id: &str) -> String {
        let guard = self.locks.acquire(session_id).await;
        let session = self.load(session_id).await;
        self.locks.release(session_id, guard).await;
        session.history.render_transcript(session.mode, Utc::now())
    }

    /// Remove a session, returning whether it existed
    pub async fn delete(&self, session_id: &str) -> Result<bool, String> {
        let guard = self.locks.acquire(session_id).await;
        let result = self.store.delete(session_id).await;
        self.locks.release(session_id, guard).await;

        let existed = result?;
        if existed {
            tracing::info!(session_id, "Session deleted");
        }
        Ok(existed)
    }

    pub async fn list_recent(&self, limit: usize) -> Result<Vec<SessionSummary>, String> {
        let records = self.store.list_recent(limit).await?;
        Ok(records
            .into_iter()
            .map(|record| {
                let session = Session::from_blob(&record.blob).ok();
                SessionSummary {
                    id: record.id,
                    updated_at: record.updated_at,
                    step: session.as_ref().map(|s| s.step),
                    mode: session.and_then(|s| s.mode),
                }
            })
            .collect())
    }

    pub async fn clear_all(&self) -> Result<usize, String> {
        let removed = self.store.clear_all().await?;
        self.locks.prune().await;
        tracing::info!(removed, "Cleared all sessions");
        Ok(removed)
    }

    // ========================================================================
    // Onboarding
    // ========================================================================

    fn onboarding_turn(&self, session_id: &str, session: &mut Session, input: &str) -> String {
        let from = session.step;
        let outcome = transition(session.step, &session.consent_context(), input)
            .and_then(|result| {
                self.apply_effects(session, &result.effects)?;
                Ok(result)
            });

        let response = match outcome {
            Ok(result) => {
                session.step = result.new_step;
                tracing::debug!(
                    session_id,
                    from = from.as_str(),
                    to = session.step.as_str(),
                    "Onboarding step accepted"
                );
                result.response
            }
            Err(e) => e.to_string(),
        };

        session.history.push_user(input);
        session.history.push_model(response.clone());
        response
    }

    fn apply_effects(&self, session: &mut Session, effects: &[Effect]) -> Result<(), TransitionError> {
        for effect in effects {
            match effect {
                Effect::SelectMode(mode) => session.mode = Some(*mode),
                Effect::AllocateBudget(budget) => session.risk_budget = Some(*budget),
                Effect::SetLifetime(lifetime) => session.lifetime = Some(*lifetime),
                Effect::IssueCredential => {
                    let mode = session
                        .mode
                        .ok_or(TransitionError::MissingContext("mode"))?;
                    let budget = session
                        .risk_budget
                        .ok_or(TransitionError::MissingContext("risk_budget"))?;
                    let lifetime = session
                        .lifetime
                        .map_or(self.config.default_lifetime, CredentialLifetime::duration);

                    session.credential = Some(self.issuer.issue(mode, budget, lifetime));
                    tracing::info!(
                        mode = %mode,
                        lifetime_hours = lifetime.num_hours(),
                        "Credential issued"
                    );
                }
                Effect::ResetSession => {
                    *session = Session::default();
                    tracing::info!("Contract declined, session reset");
                }
            }
        }
        Ok(())
    }

    // ========================================================================
    // Active session
    // ========================================================================

    async fn active_turn(&self, session_id: &str, session: &mut Session, input: &str) -> String {
        match self.run_pipeline(session_id, session, input).await {
            ActiveOutcome::Reply(text) => {
                session.history.push_user(input);
                session.history.push_model(text.clone());
                text
            }
            ActiveOutcome::Interrupt(constraint, record) => {
                tracing::warn!(session_id, constraint = constraint.id(), "Turn interrupted");
                session.history.push_user(input);
                session.history.push_interrupt(record.clone());
                record
            }
            ActiveOutcome::Renewed => {
                tracing::info!(session_id, "Risk budget renewed");
                RENEW_RESPONSE.to_string()
            }
            ActiveOutcome::Failed(message) => message,
        }
    }

    async fn run_pipeline(&self, session_id: &str, session: &mut Session, input: &str) -> ActiveOutcome {
        let now = Utc::now();

        let Some(claims) = session
            .credential
            .as_deref()
            .and_then(|token| self.issuer.validate_at(token, now))
        else {
            return interrupt(Constraint::PmtInvalid, now);
        };
        tracing::debug!(session_id, expires_at = ?claims.expires_at(), "Credential valid");

        if input.eq_ignore_ascii_case(RENEW_COMMAND) {
            session.risk_budget.get_or_insert_with(RiskBudget::full).renew();
            return ActiveOutcome::Renewed;
        }

        if let Some(keyword) = self.filter.matched(input) {
            tracing::debug!(session_id, keyword, "Hard-stop keyword in input");
            return interrupt(Constraint::SafetyPre, now);
        }

        if session
            .risk_budget
            .get_or_insert(claims.risk_budget)
            .any_depleted()
        {
            return interrupt(Constraint::BudgetDepleted, now);
        }

        let mut messages = session.history.to_messages(self.config.exclude_interrupts);
        messages.push(LlmMessage::user(input));
        let request = LlmRequest {
            mode: Some(claims.mode),
            system: Some(system_instruction(claims.mode).to_string()),
            messages,
            max_tokens: Some(self.config.max_output_tokens),
            temperature: Some(self.config.temperature),
        };

        let text = match self.llm.complete(&request).await {
            Ok(response) => response.text,
            Err(e) => return ActiveOutcome::Failed(format!("Backend Error: {e}")),
        };
        let finished_at = Utc::now();

        if let Some(keyword) = self.filter.matched(&text) {
            tracing::debug!(session_id, keyword, "Hard-stop keyword in output");
            return interrupt(Constraint::SafetyPost, finished_at);
        }

        let budget = session.risk_budget.get_or_insert(claims.risk_budget);
        let consumption = self.scorer.score(&text);
        if !consumption.is_zero() {
            tracing::debug!(session_id, ?consumption, "Risk consumed");
        }
        let newly_depleted = budget.consume(&consumption);

        let mut response = String::new();
        if !newly_depleted.is_empty() {
            tracing::warn!(
                session_id,
                constraint = Constraint::BudgetWarning.id(),
                depleted = ?newly_depleted,
                "Risk budget category depleted"
            );
            let record = InterruptRecord::for_constraint(
                Constraint::BudgetWarning,
                format!("Depleted: [{}]", join_keys(&newly_depleted)),
                finished_at,
            );
            let _ = write!(response, "{record}\n\n");
        }
        response.push_str(&text);
        let _ = write!(response, "\n\n---\nRunning Risk Budget: {budget}");

        ActiveOutcome::Reply(response)
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    async fn load(&self, session_id: &str) -> Session {
        match self.store.load(session_id).await {
            Ok(Some(blob)) => Session::from_blob(&blob).unwrap_or_else(|e| {
                tracing::warn!(session_id, error = %e, "Malformed session blob, reinitializing");
                Session::default()
            }),
            Ok(None) => Session::default(),
            Err(e) => {
                tracing::warn!(session_id, error = %e, "Failed to load session, reinitializing");
                Session::default()
            }
        }
    }

    async fn save(&self, session_id: &str, session: &Session) {
        let blob = match session.to_blob() {
            Ok(blob) => blob,
            Err(e) => {
                tracing::error!(session_id, error = %e, "Failed to serialize session");
                return;
            }
        };
        if let Err(e) = self.store.save(session_id, &blob).await {
            tracing::error!(session_id, error = %e, "Failed to save session");
        }
    }
}

/// Re-prompt for blank input, computed without touching the session
fn empty_input_reply(session: &Session) -> String {
    if session.is_active() {
        return EMPTY_INPUT_RESPONSE.to_string();
    }
    match transition(session.step, &session.consent_context(), "") {
        Err(e) => e.to_string(),
        Ok(_) => EMPTY_INPUT_RESPONSE.to_string(),
    }
}

fn interrupt(constraint: Constraint, now: DateTime<Utc>) -> ActiveOutcome {
    let details = constraint.default_details().unwrap_or_default();
    let record = InterruptRecord::for_constraint(constraint, details, now);
    ActiveOutcome::Interrupt(constraint, record.to_string())
}

fn join_keys(categories: &[RiskCategory]) -> String {
    categories
        .iter()
        .map(|c| c.key())
        .collect::<Vec<_>>()
        .join(", ")
}
