//! Send Request Use Case
//!
//! Drives one send of a tab through
//! `Idle → Resolving → PreScript → Transport → TestScript → Complete`,
//! with `Errored` for resolution and transport failures.

use std::sync::Arc;
use std::time::Duration;

use courier_domain::environment::{ResolutionContext, VariableMap};
use courier_domain::history::HistoryEntry;
use courier_domain::request::{Request, ResolvedRequest};
use courier_domain::response::{RawResponse, Response};
use courier_domain::scripting::{
    ScriptContext, ScriptExecutionResult, ScriptOutcome, ScriptRequestInfo,
};
use courier_domain::settings::EngineSettings;
use courier_domain::state::{SendErrorKind, SendFailure, SendState};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::tab_handle::TabHandle;
use crate::ports::{Clock, HistorySink, ScriptSandbox, Transport, TransportError};
use crate::variable_resolver::{ResolutionWarning, VariableResolver};

/// Slack for the sandbox to report its own timeout, with logs, before the
/// orchestrator gives up on it.
const SANDBOX_GRACE: Duration = Duration::from_millis(250);

/// How a send ended.
#[derive(Debug, Clone)]
pub enum SendOutcome {
    /// A response was produced.
    Completed(Arc<Response>),
    /// Resolution or transport failed, or the send was cancelled.
    Failed(SendFailure),
    /// Another send was already in flight on the tab, or the tab is closed.
    Rejected,
}

/// Everything a send produced.
#[derive(Debug, Clone)]
pub struct SendReport {
    /// How the send ended.
    pub outcome: SendOutcome,
    /// States visited, starting at `Idle`. Empty for rejected sends.
    pub states: Vec<SendState>,
    /// Unresolved placeholders of the request that was sent.
    pub warnings: Vec<ResolutionWarning>,
    /// Result of the pre-request script, kept even when the send failed.
    pub pre_request_script_result: Option<ScriptExecutionResult>,
    /// The request as handed to the transport, once the send got that far.
    pub sent: Option<ResolvedRequest>,
    /// False when the tab was closed before the result could be delivered.
    pub delivered: bool,
}

impl SendReport {
    const fn rejected() -> Self {
        Self {
            outcome: SendOutcome::Rejected,
            states: Vec::new(),
            warnings: Vec::new(),
            pre_request_script_result: None,
            sent: None,
            delivered: false,
        }
    }

    /// The response, for completed sends.
    #[must_use]
    pub const fn response(&self) -> Option<&Arc<Response>> {
        match &self.outcome {
            SendOutcome::Completed(response) => Some(response),
            _ => None,
        }
    }

    /// The failure, for failed sends.
    #[must_use]
    pub const fn failure(&self) -> Option<&SendFailure> {
        match &self.outcome {
            SendOutcome::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    /// True when the send never started.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self.outcome, SendOutcome::Rejected)
    }

    /// Last state reached.
    #[must_use]
    pub fn final_state(&self) -> SendState {
        self.states.last().copied().unwrap_or_default()
    }
}

/// Visited states, with every step checked against the state machine.
struct StateTrace {
    tab_id: String,
    states: Vec<SendState>,
}

impl StateTrace {
    fn new(tab_id: String) -> Self {
        Self {
            tab_id,
            states: vec![SendState::Idle],
        }
    }

    fn current(&self) -> SendState {
        self.states.last().copied().unwrap_or_default()
    }

    fn advance(&mut self, next: SendState) {
        let from = self.current();
        match from.transition(next) {
            Ok(state) => {
                debug!(tab = %self.tab_id, %from, to = %state, "send transition");
                self.states.push(state);
            }
            Err(err) => error!(tab = %self.tab_id, %err, "send state machine violated"),
        }
    }
}

/// Use case for sending a tab's request.
///
/// # Example
///
/// ```ignore
/// let use_case = SendRequest::new(transport, sandbox, clock, settings)
///     .with_history(history);
/// let report = use_case.execute(&tab, context).await;
/// ```
pub struct SendRequest {
    transport: Arc<dyn Transport>,
    sandbox: Arc<dyn ScriptSandbox>,
    history: Option<Arc<dyn HistorySink>>,
    clock: Arc<dyn Clock>,
    settings: EngineSettings,
}

impl SendRequest {
    /// Creates the use case.
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        sandbox: Arc<dyn ScriptSandbox>,
        clock: Arc<dyn Clock>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            transport,
            sandbox,
            history: None,
            clock,
            settings,
        }
    }

    /// Records completed sends to `history`.
    #[must_use]
    pub fn with_history(mut self, history: Arc<dyn HistorySink>) -> Self {
        self.history = Some(history);
        self
    }

    /// Sends the tab's current request.
    ///
    /// `context` holds the environment, collection and global layers as they
    /// are now; it is owned by the send, so later edits do not affect it.
    /// The tab's own variables become the local scope.
    ///
    /// A send on a tab that is already sending is rejected without touching
    /// the transport.
    pub async fn execute(&self, tab: &TabHandle, context: ResolutionContext) -> SendReport {
        let Some(cancel) = tab.try_begin() else {
            debug!(tab = %tab.id(), "send rejected, tab busy or closed");
            return SendReport::rejected();
        };

        let (tab_id, request, locals) =
            tab.with_tab(|t| (t.id.clone(), t.request(), t.local_variables.clone()));
        let mut trace = StateTrace::new(tab_id);
        let mut report = self.run(&request, context, locals, &cancel, &mut trace).await;

        let response = report.response().cloned();
        if let (Some(response), Some(sent)) = (&response, &report.sent) {
            self.record_history(sent, response);
        }
        report.delivered = tab.finish(response);
        if !report.delivered {
            debug!(tab = %trace.tab_id, "tab closed, result discarded");
        }
        report.states = trace.states;
        report
    }

    async fn run(
        &self,
        request: &Request,
        mut context: ResolutionContext,
        locals: VariableMap,
        cancel: &CancellationToken,
        trace: &mut StateTrace,
    ) -> SendReport {
        let mut report = SendReport::rejected();

        // Resolving
        trace.advance(SendState::Resolving);
        context.local.extend(locals);
        let mut resolver = VariableResolver::new(context.clone());
        let mut resolution = resolver.resolve_request(request);
        if resolution.request.url.trim().is_empty() {
            trace.advance(SendState::Errored);
            report.outcome = SendOutcome::Failed(SendFailure::new(
                SendErrorKind::Resolution,
                "URL is required",
            ));
            return report;
        }

        // PreScript
        trace.advance(SendState::PreScript);
        if let Some(source) = script_source(request.pre_request_script.as_deref()) {
            let script_context = ScriptContext::pre_request(
                resolver.context().effective_values(),
                request_info(&resolution.request),
            );
            let outcome = self.run_script(source, script_context).await;
            if !outcome.variable_writes.is_empty() {
                for (name, value) in outcome.variable_writes {
                    match value {
                        Some(value) => context.set_local(name, value),
                        None => {
                            context.local.shift_remove(&name);
                        }
                    }
                }
                resolver.set_context(context);
                resolution = resolver.resolve_request(request);
            }
            report.pre_request_script_result = Some(outcome.result);
        }
        for warning in &resolution.warnings {
            debug!(%warning, "unresolved placeholder");
        }
        report.warnings = resolution.warnings;

        // Transport
        trace.advance(SendState::Transport);
        let sent = report.sent.insert(resolution.request);
        let raw = match self.call_transport(sent, cancel).await {
            Ok(raw) => raw,
            Err(failure) => {
                trace.advance(SendState::Errored);
                warn!(kind = ?failure.kind, message = %failure.message, "send failed");
                report.outcome = SendOutcome::Failed(failure);
                return report;
            }
        };

        // TestScript
        trace.advance(SendState::TestScript);
        let test_result = match script_source(request.test_script.as_deref()) {
            Some(source) => {
                let script_context = ScriptContext::test(
                    resolver.context().effective_values(),
                    request_info(sent),
                    raw.clone(),
                );
                Some(self.run_script(source, script_context).await.result)
            }
            None => None,
        };

        // Complete
        trace.advance(SendState::Complete);
        info!(
            url = %sent.url,
            status = raw.status,
            time_ms = raw.time_ms,
            "send completed"
        );
        let response = Response::new(raw, report.pre_request_script_result.clone(), test_result);
        report.outcome = SendOutcome::Completed(Arc::new(response));
        report
    }

    async fn call_transport(
        &self,
        request: &ResolvedRequest,
        cancel: &CancellationToken,
    ) -> Result<RawResponse, SendFailure> {
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(TransportError::Cancelled),
            result = self.transport.send(request) => result,
        };
        result.map_err(|err| match err {
            TransportError::Cancelled => SendFailure::cancelled(),
            other => SendFailure::new(SendErrorKind::Transport, other.to_string()),
        })
    }

    async fn run_script(&self, source: &str, context: ScriptContext) -> ScriptOutcome {
        let limit = self.settings.script_timeout();
        let phase = context.phase;
        match tokio::time::timeout(limit + SANDBOX_GRACE, self.sandbox.run(source, context, limit))
            .await
        {
            Ok(outcome) => {
                if let Some(err) = &outcome.result.error {
                    debug!(?phase, error = %err, "script failed");
                }
                outcome
            }
            Err(_) => {
                warn!(?phase, limit_ms = self.settings.script_timeout_ms, "sandbox did not stop in time");
                ScriptOutcome::from_result(ScriptExecutionResult::timed_out(
                    Vec::new(),
                    self.settings.script_timeout_ms,
                ))
            }
        }
    }

    fn record_history(&self, request: &Request, response: &Response) {
        let Some(sink) = self.history.clone() else {
            return;
        };
        let entry = HistoryEntry::record(request, response, self.clock.now());
        tokio::spawn(async move {
            if let Err(err) = sink.append(entry).await {
                warn!(%err, "failed to record history");
            }
        });
    }
}

fn script_source(source: Option<&str>) -> Option<&str> {
    source.filter(|s| !s.trim().is_empty())
}

fn request_info(request: &Request) -> ScriptRequestInfo {
    ScriptRequestInfo {
        name: request.name.clone(),
        url: request.url.clone(),
        protocol: request.protocol(),
        method: request.as_http().map(|h| h.method.as_str().to_string()),
    }
}
