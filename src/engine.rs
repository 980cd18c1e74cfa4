//! The pipeline façade.
//!
//! `Engine` drives a goal through pre-validation, readiness, mission
//! creation, approval routing and execution, and owns the resumption inboxes
//! for clarifications and approvals. Suspension is plain state: a pending
//! approval or an outstanding clarification is a map entry, and the matching
//! resolution message unblocks that specific mission. No coroutine
//! machinery, just state plus an inbox.
//!
//! # Execution Flow
//! 1. Pre-validate (six read-only checks; severe failure ends here)
//! 2. Readiness (sole mission gate; non-READY yields a clarification)
//! 3. Mission proposed, tool selected
//! 4. Confidence routed: auto-execute / request approval / reject / clarify
//! 5. Execution and learning signals for auto or later-approved missions

use std::sync::{Arc, Mutex};

use chrono::Utc;
use url::Url;

use crate::approval::{
    derive_risks, ApprovalGate, ApprovalOracle, ApprovalRequest, ApprovalResponse,
    LowConfidenceCause, PendingApprovals, Route,
};
use crate::clarification::{Clarification, ClarificationGenerator, ClarificationType};
use crate::confidence::ConfidenceModel;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::executor::ExecutionDriver;
use crate::goal::{Goal, SessionContext};
use crate::learning::{LearnedWeights, LearningSignal, SignalLog, ToolPerformance};
use crate::mission::{
    ApprovalSource, Mission, MissionEvent, MissionId, MissionStatus, MissionStore,
    StructuredFields,
};
use crate::readiness::{extract, ReadinessDecision, ReadinessEngine};
use crate::selector::{Selection, ToolSelector};
use crate::sink::PersistenceSink;
use crate::tools::{ToolInput, ToolRegistry};
use crate::validation::{CheckKind, PreValidator, ValidationReport};

/// What processing one goal (or one resumption message) produced.
#[derive(Debug)]
pub enum Outcome {
    /// The goal needs an answer before anything can happen. No mission was
    /// created for it (a gate-level clarify leaves its proposed mission
    /// terminally denied).
    Clarification(Clarification),
    /// The goal was rejected. Any proposed mission is terminally denied.
    Rejected { reason: String },
    /// A mission is suspended awaiting an external approval decision.
    AwaitingApproval(ApprovalRequest),
    /// The mission ran to completion.
    Executed(Mission),
    /// The mission ran and failed after retries.
    MissionFailed(Mission),
}

/// The mission-lifecycle orchestration engine.
pub struct Engine {
    config: Config,
    registry: Arc<ToolRegistry>,
    store: MissionStore,
    validator: PreValidator,
    readiness: ReadinessEngine,
    clarifier: ClarificationGenerator,
    confidence: ConfidenceModel,
    gate: ApprovalGate,
    selector: ToolSelector,
    driver: ExecutionDriver,
    oracle: Arc<dyn ApprovalOracle>,

    signals: SignalLog,
    learned: Mutex<LearnedWeights>,
    performance: Mutex<ToolPerformance>,

    pending: PendingApprovals,
    session: Mutex<SessionContext>,
    /// The goal text whose clarification question is outstanding, if any.
    awaiting_clarification: Mutex<Option<String>>,
}

impl Engine {
    pub fn new(
        config: Config,
        registry: Arc<ToolRegistry>,
        sink: Arc<dyn PersistenceSink>,
        oracle: Arc<dyn ApprovalOracle>,
    ) -> Self {
        Self::with_signal_history(config, registry, sink, oracle, Vec::new())
    }

    /// Build an engine whose learned weights and historical stats are
    /// re-derived from a previously persisted signal log.
    pub fn with_signal_history(
        config: Config,
        registry: Arc<ToolRegistry>,
        sink: Arc<dyn PersistenceSink>,
        oracle: Arc<dyn ApprovalOracle>,
        history: Vec<LearningSignal>,
    ) -> Self {
        let learned = LearnedWeights::replay(config.learning, history.iter());
        let performance = ToolPerformance::replay(history.iter());
        Self {
            driver: ExecutionDriver::new(&config),
            confidence: ConfidenceModel::new(config.weights),
            gate: ApprovalGate::new(config.thresholds),
            selector: ToolSelector::new(config.selector),
            store: MissionStore::new(Arc::clone(&sink)),
            signals: SignalLog::new(sink),
            learned: Mutex::new(learned),
            performance: Mutex::new(performance),
            validator: PreValidator::new(),
            readiness: ReadinessEngine::new(),
            clarifier: ClarificationGenerator::new(),
            pending: PendingApprovals::new(),
            session: Mutex::new(SessionContext::default()),
            awaiting_clarification: Mutex::new(None),
            registry,
            oracle,
            config,
        }
    }

    /// Drive one goal through the pipeline.
    pub async fn process_goal(&self, text: &str) -> Result<Outcome> {
        let goal = Goal::with_context(text, self.session_snapshot());
        tracing::info!(goal = %goal.text, "Processing goal");

        // Stage 1: cheap screens before any deeper reasoning.
        let report = self.validator.run(&goal, &self.registry);
        if let Some(failure) = report.severe() {
            let outcome = match failure.kind {
                CheckKind::Contradiction => {
                    self.set_awaiting(&goal.text);
                    Outcome::Clarification(
                        self.clarifier
                            .for_kind(ClarificationType::ConstraintUnclear, &goal),
                    )
                }
                _ => Outcome::Rejected {
                    reason: failure.message.clone(),
                },
            };
            self.note_goal(&goal.text, None);
            return Ok(outcome);
        }

        // Stage 2: readiness - the sole mission gate.
        let readiness = self.readiness.evaluate(&goal)?;
        if readiness.decision != ReadinessDecision::Ready {
            tracing::info!(decision = %readiness.decision, "Goal not ready, asking for clarification");
            let clarification = self.clarifier.generate(&readiness, &goal);
            self.set_awaiting(&goal.text);
            self.note_goal(&goal.text, readiness.source_url.as_deref());
            return Ok(Outcome::Clarification(clarification));
        }

        let fields = StructuredFields::from_readiness(&readiness)?;
        let confidence = self
            .confidence
            .score(&goal, &readiness, &self.registry, &report);

        // Stage 3: the mission comes into existence, here and only here.
        let mission_id = MissionId::new();
        let _guard = self.store.begin_write(mission_id)?;
        self.store
            .append(
                mission_id,
                MissionEvent::Proposed {
                    objective: goal.text.clone(),
                    scope: fields.source_url.as_deref().and_then(host_of),
                    fields: fields.clone(),
                    at: Utc::now(),
                },
            )
            .await?;

        let selection = {
            let learned = self
                .learned
                .lock()
                .map_err(|_| Error::InvariantViolation("learned weights poisoned".to_string()))?;
            let performance = self
                .performance
                .lock()
                .map_err(|_| Error::InvariantViolation("performance stats poisoned".to_string()))?;
            self.selector
                .select(&goal.text, &fields, &self.registry, &performance, &learned)
        };
        let Some(selection) = selection else {
            self.store
                .append(
                    mission_id,
                    MissionEvent::ApprovalDenied {
                        feedback: Some("no suitable tool available".to_string()),
                        at: Utc::now(),
                    },
                )
                .await?;
            self.note_goal(&goal.text, fields.source_url.as_deref());
            return Ok(Outcome::Rejected {
                reason: "no suitable tool is available for this goal".to_string(),
            });
        };

        self.store
            .append(
                mission_id,
                MissionEvent::ToolSelected {
                    tool: selection.best.name.clone(),
                    confidence: selection.best.combined,
                    input: selection.input.clone(),
                    at: Utc::now(),
                },
            )
            .await?;
        self.note_goal(&goal.text, fields.source_url.as_deref());

        // Stage 4: confidence-routed approval.
        let cause = if report.ambiguity_caused() {
            LowConfidenceCause::Ambiguity
        } else {
            LowConfidenceCause::Infeasibility
        };
        match self.gate.route(confidence, cause) {
            Route::AutoExecute => {
                self.store
                    .append(
                        mission_id,
                        MissionEvent::Approved {
                            source: ApprovalSource::Auto,
                            at: Utc::now(),
                        },
                    )
                    .await?;
                self.record_session_approval();
                self.execute_approved(mission_id, &selection.best.name, &selection.input)
                    .await
            }
            Route::RequestApproval => Ok(self.suspend_for_approval(
                mission_id,
                &goal.text,
                confidence,
                &selection,
            )),
            Route::Reject => {
                let reason = format!(
                    "confidence {confidence:.2} is below the approval threshold {:.2}",
                    self.config.thresholds.medium
                );
                self.store
                    .append(
                        mission_id,
                        MissionEvent::ApprovalDenied {
                            feedback: Some(reason.clone()),
                            at: Utc::now(),
                        },
                    )
                    .await?;
                Ok(Outcome::Rejected { reason })
            }
            Route::Clarify => {
                self.store
                    .append(
                        mission_id,
                        MissionEvent::ApprovalDenied {
                            feedback: Some("confidence too low; clarification requested".to_string()),
                            at: Utc::now(),
                        },
                    )
                    .await?;
                self.set_awaiting(&goal.text);
                let kind = clarification_kind(&report);
                Ok(Outcome::Clarification(self.clarifier.for_kind(kind, &goal)))
            }
        }
    }

    /// Feed a clarification answer back in. The answer merges into the
    /// session and the original goal re-enters the full pipeline; with no
    /// question outstanding the answer is processed as a fresh goal.
    pub async fn answer_clarification(&self, answer: &str) -> Result<Outcome> {
        let original = self
            .awaiting_clarification
            .lock()
            .ok()
            .and_then(|mut a| a.take());
        if let Ok(mut session) = self.session.lock() {
            session.record_answer(answer);
            if let Some(url) = extract::find_url(answer) {
                session.last_url = Some(url);
            }
        }
        match original {
            Some(text) => {
                tracing::info!(original = %text, "Re-entering pipeline with clarified context");
                self.process_goal(&text).await
            }
            None => self.process_goal(answer).await,
        }
    }

    /// Deliver an approval decision for a pending request.
    ///
    /// # Errors
    ///
    /// `Error::ApprovalRequestNotFound` for unknown or already-resolved
    /// requests, `Error::ApprovalTimeout` when the decision arrived after the
    /// window closed (the mission is then terminally timed out).
    pub async fn resolve_approval(&self, response: ApprovalResponse) -> Result<Outcome> {
        let request = self
            .pending
            .take(response.request_id)
            .ok_or(Error::ApprovalRequestNotFound(response.request_id))?;
        let mission_id = request.mission_id;
        let _guard = match self.store.begin_write(mission_id) {
            Ok(guard) => guard,
            Err(e) => {
                // The mission is owned by another operation right now; put
                // the request back so the decision is not lost.
                self.pending.insert(request);
                return Err(e);
            }
        };

        if request.expired_at(response.timestamp) {
            tracing::warn!(mission = %mission_id, "Approval decision arrived after the window");
            self.store
                .append(mission_id, MissionEvent::ApprovalTimedOut { at: Utc::now() })
                .await?;
            return Err(Error::ApprovalTimeout {
                request_id: request.request_id,
            });
        }

        if !response.approved {
            let reason = response
                .feedback
                .clone()
                .unwrap_or_else(|| "approval denied".to_string());
            self.store
                .append(
                    mission_id,
                    MissionEvent::ApprovalDenied {
                        feedback: response.feedback,
                        at: Utc::now(),
                    },
                )
                .await?;
            return Ok(Outcome::Rejected { reason });
        }

        let mission = self
            .store
            .append(
                mission_id,
                MissionEvent::Approved {
                    source: ApprovalSource::Oracle,
                    at: Utc::now(),
                },
            )
            .await?;
        self.record_session_approval();

        let (tool, input) = mission
            .tool
            .clone()
            .zip(mission.tool_input.clone())
            .ok_or_else(|| {
                Error::InvariantViolation(format!(
                    "mission {mission_id} approved without a selected tool"
                ))
            })?;
        self.execute_approved(mission_id, &tool, &input).await
    }

    /// Ask the injected oracle to decide a request and apply its answer.
    pub async fn drive_approval(&self, request: &ApprovalRequest) -> Result<Outcome> {
        let decision = self
            .oracle
            .validate(request)
            .await
            .map_err(|e| Error::Oracle(e.to_string()))?;
        let response = ApprovalResponse {
            request_id: request.request_id,
            approved: decision.approved,
            feedback: decision.feedback,
            timestamp: Utc::now(),
        };
        self.resolve_approval(response).await
    }

    /// Sweep pending approvals whose window has elapsed; each becomes a
    /// terminal `approval_timeout` with an audit event.
    pub async fn expire_approvals(&self) -> Result<Vec<MissionId>> {
        let mut timed_out = Vec::new();
        for request in self.pending.sweep_expired(Utc::now()) {
            let guard = match self.store.begin_write(request.mission_id) {
                Ok(guard) => guard,
                Err(Error::WriterConflict { mission }) => {
                    tracing::warn!(mission = %mission, "Skipping timeout sweep; mission in flight");
                    continue;
                }
                Err(e) => return Err(e),
            };
            self.store
                .append(
                    request.mission_id,
                    MissionEvent::ApprovalTimedOut { at: Utc::now() },
                )
                .await?;
            drop(guard);
            tracing::info!(mission = %request.mission_id, "Approval timed out");
            timed_out.push(request.mission_id);
        }
        Ok(timed_out)
    }

    /// Record an explicit user rating (1-5 stars) for a finished mission.
    pub async fn record_rating(&self, mission_id: MissionId, stars: u8) -> Result<()> {
        let mission = self.store.get(mission_id).await?;
        let tool = mission.tool.ok_or_else(|| {
            Error::InvariantViolation(format!("mission {mission_id} has no tool to rate"))
        })?;
        let signal = LearningSignal::from_rating(&tool, mission.fields.intent.task_type(), stars);
        self.learn(signal).await;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub async fn mission(&self, mission_id: MissionId) -> Result<Mission> {
        self.store.get(mission_id).await
    }

    /// Full audit trail for one mission.
    pub async fn audit(&self, mission_id: MissionId) -> Result<Vec<MissionEvent>> {
        self.store.events(mission_id).await
    }

    pub async fn missions_by_status(&self, status: MissionStatus) -> Vec<Mission> {
        self.store.missions_by_status(status).await
    }

    pub async fn mission_count(&self) -> usize {
        self.store.count().await
    }

    pub fn pending_approval_count(&self) -> usize {
        self.pending.len()
    }

    /// Current learned multiplier for a (tool, task-type) pair.
    pub fn learned_multiplier(&self, tool: &str, task_type: &str) -> f64 {
        self.learned
            .lock()
            .map(|l| l.multiplier(tool, task_type))
            .unwrap_or(0.0)
    }

    pub fn session(&self) -> SessionContext {
        self.session_snapshot()
    }

    /// Snapshot of the learning signal log, oldest first.
    pub fn signal_history(&self) -> Vec<LearningSignal> {
        self.signals.snapshot()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn suspend_for_approval(
        &self,
        mission_id: MissionId,
        goal_text: &str,
        confidence: f64,
        selection: &Selection,
    ) -> Outcome {
        let traits = self.registry.get(&selection.best.name).map(|t| t.traits());
        let risks = derive_risks(goal_text, confidence, &self.config.thresholds, traits);
        let request = ApprovalRequest::new(
            mission_id,
            goal_text,
            confidence,
            selection,
            risks,
            self.config.approval_timeout,
        );
        tracing::info!(
            mission = %mission_id,
            request = %request.request_id,
            confidence,
            "Mission suspended awaiting approval"
        );
        self.pending.insert(request.clone());
        Outcome::AwaitingApproval(request)
    }

    async fn execute_approved(
        &self,
        mission_id: MissionId,
        tool: &str,
        input: &ToolInput,
    ) -> Result<Outcome> {
        self.store
            .append(mission_id, MissionEvent::Started { at: Utc::now() })
            .await?;

        let record = self.driver.run(&self.registry, tool, input).await;
        let success = record.success;

        let mission = if success {
            self.store
                .append(
                    mission_id,
                    MissionEvent::Completed {
                        record: record.clone(),
                        at: Utc::now(),
                    },
                )
                .await?
        } else {
            let reason = record
                .error
                .clone()
                .unwrap_or_else(|| "tool reported failure".to_string());
            self.store
                .append(
                    mission_id,
                    MissionEvent::Failed {
                        record: Some(record.clone()),
                        reason,
                        at: Utc::now(),
                    },
                )
                .await?
        };

        self.learn(LearningSignal::from_execution(
            tool,
            mission.fields.intent.task_type(),
            success,
        ))
        .await;

        Ok(if success {
            Outcome::Executed(mission)
        } else {
            Outcome::MissionFailed(mission)
        })
    }

    async fn learn(&self, signal: LearningSignal) {
        if let Ok(mut learned) = self.learned.lock() {
            learned.observe(&signal);
        }
        if let Ok(mut performance) = self.performance.lock() {
            performance.observe(&signal);
        }
        self.signals.append(signal).await;
    }

    fn session_snapshot(&self) -> SessionContext {
        self.session
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    fn note_goal(&self, text: &str, url: Option<&str>) {
        if let Ok(mut session) = self.session.lock() {
            session.record_goal(text);
            if let Some(u) = url {
                session.last_url = Some(u.to_string());
            } else if let Some(u) = extract::find_url(text) {
                session.last_url = Some(u);
            }
        }
    }

    fn record_session_approval(&self) {
        if let Ok(mut session) = self.session.lock() {
            session.record_approval();
        }
    }

    fn set_awaiting(&self, goal_text: &str) {
        if let Ok(mut awaiting) = self.awaiting_clarification.lock() {
            *awaiting = Some(goal_text.to_string());
        }
    }
}

/// Host part of a URL, used as the mission's scope.
fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

/// Pick the clarification type that matches what pre-validation flagged.
fn clarification_kind(report: &ValidationReport) -> ClarificationType {
    for failure in &report.failures {
        match failure.kind {
            CheckKind::Contradiction => return ClarificationType::ConstraintUnclear,
            CheckKind::TargetElement => return ClarificationType::MissingTarget,
            CheckKind::ContextAvailability => return ClarificationType::AmbiguousReference,
            _ => {}
        }
    }
    ClarificationType::TooVague
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::{ApproveAll, DenyAll};
    use crate::sink::testing::RecordingSink;
    use crate::sink::NullSink;
    use crate::tools::testing::standard_registry;
    use crate::tools::{Tool, ToolCategory, ToolOutput, ToolTraits};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn engine_with(registry: ToolRegistry) -> Engine {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
        Engine::new(
            Config::default(),
            Arc::new(registry),
            Arc::new(NullSink),
            Arc::new(ApproveAll),
        )
    }

    fn standard_engine() -> Engine {
        engine_with(standard_registry())
    }

    /// An extraction tool whose traits keep confidence in the
    /// approval-required band.
    struct RiskyExtractor {
        calls: AtomicU32,
    }

    impl RiskyExtractor {
        fn new() -> Self {
            Self {
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl Tool for RiskyExtractor {
        fn name(&self) -> &str {
            "page_extractor"
        }
        fn description(&self) -> &str {
            "Extract the title, text, links or table data from a web page"
        }
        fn category(&self) -> ToolCategory {
            ToolCategory::Extraction
        }
        fn traits(&self) -> ToolTraits {
            ToolTraits {
                deterministic: false,
                idempotent: false,
                side_effects: true,
            }
        }
        async fn execute(&self, _input: &ToolInput) -> anyhow::Result<ToolOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ToolOutput::ok("extracted"))
        }
    }

    fn risky_registry() -> (ToolRegistry, Arc<RiskyExtractor>) {
        let mut registry = ToolRegistry::new();
        let extractor = Arc::new(RiskyExtractor::new());
        registry.register(extractor.clone());
        (registry, extractor)
    }

    // Scenario A: complete extraction goal auto-executes.
    #[tokio::test]
    async fn complete_goal_auto_executes() {
        let engine = standard_engine();
        let outcome = engine
            .process_goal("Extract the title from https://example.com")
            .await
            .unwrap();

        let Outcome::Executed(mission) = outcome else {
            panic!("expected auto-execution, got {outcome:?}");
        };
        assert_eq!(mission.status, MissionStatus::Completed);
        assert_eq!(mission.fields.action_object.as_deref(), Some("title"));
        assert_eq!(
            mission.fields.source_url.as_deref(),
            Some("https://example.com")
        );
        assert_eq!(mission.tool.as_deref(), Some("page_extractor"));
        assert!(mission.tool_confidence >= 0.85);
        assert_eq!(mission.scope.as_deref(), Some("example.com"));
        assert!(mission.execution.is_some());
        assert_eq!(engine.signal_history().len(), 1);
    }

    // Scenario B: missing URL yields a clarification and zero missions.
    #[tokio::test]
    async fn incomplete_goal_yields_clarification() {
        let engine = standard_engine();
        let outcome = engine.process_goal("Extract the title").await.unwrap();

        let Outcome::Clarification(clarification) = outcome else {
            panic!("expected clarification, got {outcome:?}");
        };
        assert!(clarification.question.to_lowercase().contains("where"));
        assert_eq!(engine.mission_count().await, 0);
    }

    // Scenario C: repeating an incomplete goal creates nothing, ever.
    #[tokio::test]
    async fn repeated_incomplete_goal_has_no_side_effects() {
        let engine = standard_engine();
        for _ in 0..3 {
            let outcome = engine.process_goal("Extract the title").await.unwrap();
            assert!(matches!(outcome, Outcome::Clarification(_)));
        }
        assert_eq!(engine.mission_count().await, 0);
        assert_eq!(engine.pending_approval_count(), 0);
        assert!(engine.signal_history().is_empty());
    }

    // Scenario D: mid confidence suspends; denial is terminal and the tool
    // never runs.
    #[tokio::test]
    async fn denied_approval_is_terminal_without_execution() {
        let (registry, extractor) = risky_registry();
        let engine = Engine::new(
            Config::default(),
            Arc::new(registry),
            Arc::new(NullSink),
            Arc::new(DenyAll {
                feedback: Some("not in this session".to_string()),
            }),
        );

        let outcome = engine
            .process_goal("Extract the title from https://example.com")
            .await
            .unwrap();
        let Outcome::AwaitingApproval(request) = outcome else {
            panic!("expected approval suspension, got {outcome:?}");
        };
        assert!((0.55..0.85).contains(&request.confidence));
        assert!(!request.risks.is_empty());

        let resolved = engine.drive_approval(&request).await.unwrap();
        assert!(matches!(resolved, Outcome::Rejected { .. }));

        let mission = engine.mission(request.mission_id).await.unwrap();
        assert_eq!(mission.status, MissionStatus::ApprovalDenied);
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    }

    // Approval path: a yes runs the mission to completion.
    #[tokio::test]
    async fn approved_mission_executes() {
        let (registry, extractor) = risky_registry();
        let engine = Engine::new(
            Config::default(),
            Arc::new(registry),
            Arc::new(NullSink),
            Arc::new(ApproveAll),
        );

        let outcome = engine
            .process_goal("Extract the title from https://example.com")
            .await
            .unwrap();
        let Outcome::AwaitingApproval(request) = outcome else {
            panic!("expected approval suspension, got {outcome:?}");
        };

        let resolved = engine.drive_approval(&request).await.unwrap();
        let Outcome::Executed(mission) = resolved else {
            panic!("expected execution, got {resolved:?}");
        };
        assert_eq!(mission.status, MissionStatus::Completed);
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
        assert_eq!(engine.session().prior_approvals, 1);
    }

    // Scenario E: an unanswered request times out into its own terminal
    // state, with the timeout in the audit log.
    #[tokio::test]
    async fn unanswered_approval_times_out() {
        let (registry, extractor) = risky_registry();
        let config = Config {
            approval_timeout: Duration::from_secs(0),
            ..Config::default()
        };
        let engine = Engine::new(
            config,
            Arc::new(registry),
            Arc::new(NullSink),
            Arc::new(ApproveAll),
        );

        let outcome = engine
            .process_goal("Extract the title from https://example.com")
            .await
            .unwrap();
        let Outcome::AwaitingApproval(request) = outcome else {
            panic!("expected approval suspension, got {outcome:?}");
        };

        let timed_out = engine.expire_approvals().await.unwrap();
        assert_eq!(timed_out, vec![request.mission_id]);

        let mission = engine.mission(request.mission_id).await.unwrap();
        assert_eq!(mission.status, MissionStatus::ApprovalTimeout);
        let audit = engine.audit(request.mission_id).await.unwrap();
        assert!(audit
            .iter()
            .any(|e| matches!(e, MissionEvent::ApprovalTimedOut { .. })));
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);

        // A late answer is not accepted either.
        let late = engine
            .resolve_approval(ApprovalResponse::approve(request.request_id))
            .await;
        assert!(matches!(late, Err(Error::ApprovalRequestNotFound(_))));
    }

    // Clarification round-trip: answer merges into context and the original
    // goal becomes READY.
    #[tokio::test]
    async fn clarification_answer_completes_the_goal() {
        let engine = standard_engine();
        let outcome = engine.process_goal("Extract the title").await.unwrap();
        assert!(matches!(outcome, Outcome::Clarification(_)));

        let outcome = engine
            .answer_clarification("from https://example.com please")
            .await
            .unwrap();
        let Outcome::Executed(mission) = outcome else {
            panic!("expected execution after clarification, got {outcome:?}");
        };
        assert_eq!(
            mission.fields.source_url.as_deref(),
            Some("https://example.com")
        );
        assert_eq!(engine.mission_count().await, 1);
    }

    // Sole-gate property: out-of-scope and question goals never create
    // missions.
    #[tokio::test]
    async fn non_ready_paths_create_no_missions() {
        let engine = standard_engine();

        let rejected = engine.process_goal("order a pizza for me").await.unwrap();
        assert!(matches!(rejected, Outcome::Rejected { .. }));

        let question = engine
            .process_goal("What is the capital of France?")
            .await
            .unwrap();
        assert!(matches!(question, Outcome::Clarification(_)));

        let meta = engine.process_goal("what can you do").await.unwrap();
        assert!(matches!(meta, Outcome::Clarification(_)));

        assert_eq!(engine.mission_count().await, 0);
    }

    // Execution failure marks the mission failed and records a negative
    // signal.
    #[tokio::test]
    async fn failed_execution_marks_mission_failed() {
        struct BrokenExtractor;

        #[async_trait]
        impl Tool for BrokenExtractor {
            fn name(&self) -> &str {
                "page_extractor"
            }
            fn description(&self) -> &str {
                "Extract the title, text or links from a web page"
            }
            fn category(&self) -> ToolCategory {
                ToolCategory::Extraction
            }
            fn traits(&self) -> ToolTraits {
                ToolTraits {
                    deterministic: true,
                    idempotent: true,
                    side_effects: false,
                }
            }
            async fn execute(&self, _input: &ToolInput) -> anyhow::Result<ToolOutput> {
                Ok(ToolOutput::failed("page did not load"))
            }
        }

        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(BrokenExtractor));
        let config = Config {
            retry_base_delay: Duration::from_millis(1),
            ..Config::default()
        };
        let engine = Engine::new(
            config,
            Arc::new(registry),
            Arc::new(NullSink),
            Arc::new(ApproveAll),
        );

        let outcome = engine
            .process_goal("Extract the title from https://example.com")
            .await
            .unwrap();
        let Outcome::MissionFailed(mission) = outcome else {
            panic!("expected failure, got {outcome:?}");
        };
        assert_eq!(mission.status, MissionStatus::Failed);
        let record = mission.execution.expect("record captured");
        assert!(!record.success);
        assert_eq!(record.attempts, 3);

        let history = engine.signal_history();
        assert_eq!(history.len(), 1);
        assert!(history[0].confidence_delta < 0.0);
    }

    // Ratings feed the learned multiplier for the mission's tool.
    #[tokio::test]
    async fn rating_updates_learned_weights() {
        let engine = standard_engine();
        let outcome = engine
            .process_goal("Extract the title from https://example.com")
            .await
            .unwrap();
        let Outcome::Executed(mission) = outcome else {
            panic!("expected execution, got {outcome:?}");
        };

        engine.record_rating(mission.id, 5).await.unwrap();
        let history = engine.signal_history();
        assert_eq!(history.len(), 2);
        let live = engine.learned_multiplier("page_extractor", "extract");
        assert!(live > 0.0);

        // Replaying the log into a fresh engine reproduces the learned state.
        let replayed = Engine::with_signal_history(
            Config::default(),
            Arc::new(standard_registry()),
            Arc::new(NullSink),
            Arc::new(ApproveAll),
            history,
        );
        assert_eq!(replayed.learned_multiplier("page_extractor", "extract"), live);
        assert_eq!(replayed.signal_history().len(), 0);
        assert_eq!(replayed.mission_count().await, 0);
    }

    // A decision that arrives after the window closed times the mission out
    // instead of executing it.
    #[tokio::test]
    async fn late_approval_decision_becomes_timeout() {
        let (registry, extractor) = risky_registry();
        let config = Config {
            approval_timeout: Duration::from_secs(0),
            ..Config::default()
        };
        let engine = Engine::new(
            config,
            Arc::new(registry),
            Arc::new(NullSink),
            Arc::new(ApproveAll),
        );

        let outcome = engine
            .process_goal("Extract the title from https://example.com")
            .await
            .unwrap();
        let Outcome::AwaitingApproval(request) = outcome else {
            panic!("expected approval suspension, got {outcome:?}");
        };

        let late = engine
            .resolve_approval(ApprovalResponse::approve(request.request_id))
            .await;
        assert!(matches!(late, Err(Error::ApprovalTimeout { .. })));

        let mission = engine.mission(request.mission_id).await.unwrap();
        assert_eq!(mission.status, MissionStatus::ApprovalTimeout);
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rating_unknown_mission_fails() {
        let engine = standard_engine();
        let result = engine.record_rating(MissionId::new(), 5).await;
        assert!(matches!(result, Err(Error::MissionNotFound(_))));
    }

    // Persistence failure never blocks the user-visible response.
    #[tokio::test]
    async fn sink_failure_is_non_blocking() {
        let sink = Arc::new(RecordingSink::default());
        sink.fail_next(true);
        let engine = Engine::new(
            Config::default(),
            Arc::new(standard_registry()),
            sink,
            Arc::new(ApproveAll),
        );

        let outcome = engine
            .process_goal("Extract the title from https://example.com")
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::Executed(_)));
    }

    // Pipeline determinism: identical goal, registry and context score the
    // same.
    #[tokio::test]
    async fn confidence_is_deterministic_for_identical_context() {
        let registry = Arc::new(standard_registry());
        let first = {
            let engine = Engine::new(
                Config::default(),
                Arc::clone(&registry),
                Arc::new(NullSink),
                Arc::new(ApproveAll),
            );
            match engine
                .process_goal("Extract the title from https://example.com")
                .await
                .unwrap()
            {
                Outcome::Executed(m) => m.tool_confidence,
                other => panic!("unexpected outcome {other:?}"),
            }
        };
        let second = {
            let engine = Engine::new(
                Config::default(),
                Arc::clone(&registry),
                Arc::new(NullSink),
                Arc::new(ApproveAll),
            );
            match engine
                .process_goal("Extract the title from https://example.com")
                .await
                .unwrap()
            {
                Outcome::Executed(m) => m.tool_confidence,
                other => panic!("unexpected outcome {other:?}"),
            }
        };
        assert_eq!(first, second);
    }
}
