//! TurnOrchestrator - Runs one user turn end to end.
//!
//! Load session, route, invoke the handler, write state back, persist,
//! normalize. Persistence happens only after the handler has returned, so a
//! cancelled or failed turn never leaves a half-written session behind.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::domain::foundation::{HandlerId, SessionKey};
use crate::domain::response::{ResponseEnvelope, ResponseNormalizer};
use crate::domain::session::{HandlerPhase, Session};
use crate::ports::{HandlerInput, SessionStore, SessionStoreError};

use super::dispatch::{Dispatcher, RouteReason};

/// Context key that names a handler explicitly.
pub const OVERRIDE_CONTEXT_KEY: &str = "mode";

const HANDLER_FAILURE_MESSAGE: &str =
    "Sorry, something went wrong while handling your request. Please try again in a moment.";

/// Command to process one inbound turn.
#[derive(Debug, Clone, Default)]
pub struct TurnCommand {
    /// Existing session; a fresh key is issued when absent.
    pub session_key: Option<SessionKey>,
    pub message: String,
    pub context: Map<String, Value>,
}

impl TurnCommand {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_session(mut self, key: SessionKey) -> Self {
        self.session_key = Some(key);
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    fn override_id(&self) -> Option<&str> {
        self.context.get(OVERRIDE_CONTEXT_KEY).and_then(Value::as_str)
    }
}

/// Result of a processed turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub session_key: SessionKey,
    pub envelope: ResponseEnvelope,
    pub handler: HandlerId,
    pub route_reason: RouteReason,
    pub persisted: bool,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrchestratorError {
    #[error("message cannot be empty")]
    EmptyMessage,
}

pub struct TurnOrchestrator {
    store: Arc<dyn SessionStore>,
    dispatcher: Arc<Dispatcher>,
    normalizer: ResponseNormalizer,
}

impl TurnOrchestrator {
    pub fn new(store: Arc<dyn SessionStore>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            store,
            dispatcher,
            normalizer: ResponseNormalizer::new(),
        }
    }

    pub fn with_normalizer(mut self, normalizer: ResponseNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Issues a key without creating any stored state.
    pub fn new_session_key(&self) -> SessionKey {
        self.store.new_key()
    }

    /// Forgets everything stored for `key`.
    pub async fn reset_session(&self, key: &SessionKey) -> Result<(), SessionStoreError> {
        self.store.delete(key).await
    }

    pub async fn handle_turn(&self, cmd: TurnCommand) -> Result<TurnOutcome, OrchestratorError> {
        let text = cmd.message.trim();
        if text.is_empty() {
            return Err(OrchestratorError::EmptyMessage);
        }

        let session_key = cmd
            .session_key
            .clone()
            .unwrap_or_else(|| self.store.new_key());
        let mut session = self.load(&session_key).await;

        let decision = self.dispatcher.route(text, &session, cmd.override_id()).await;
        let Some(handler) = self.dispatcher.registry().get(&decision.handler).cloned() else {
            // Unreachable with a consistent registry; answer rather than fail.
            tracing::warn!(handler = %decision.handler, "routed to unregistered handler");
            return Ok(self.failed_turn(session_key, decision.handler, decision.reason));
        };

        if session.activate(&decision.handler) {
            tracing::debug!(handler = %decision.handler, "handler switched; history cleared");
        }

        let input = HandlerInput {
            text: text.to_string(),
            history: session.history.clone(),
            in_progress: session.has_flow_in_progress(),
            state: session.handler_state.clone(),
            context: cmd.context.clone(),
        };

        let output = match handler.handle(input).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(handler = %decision.handler, error = %e, "handler failed; session not persisted");
                return Ok(self.failed_turn(session_key, decision.handler, decision.reason));
            }
        };

        session.history = output.history;
        if output.state.phase == HandlerPhase::Done {
            session.release_handler();
        } else {
            session.handler_state = output.state;
        }
        session.touch();

        let persisted = match self.store.put(&session_key, &session).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(session = %session_key, error = %e, "session write failed; continuing in memory");
                false
            }
        };

        let envelope = self
            .normalizer
            .normalize(output.response)
            .with_meta("handler", decision.handler.as_str())
            .with_meta("route", decision.reason.label())
            .with_meta("session_persisted", persisted);

        tracing::info!(
            session = %session_key,
            handler = %decision.handler,
            kind = ?envelope.kind,
            phase = ?session.phase(),
            persisted,
            "turn completed"
        );

        Ok(TurnOutcome {
            session_key,
            envelope,
            handler: decision.handler,
            route_reason: decision.reason,
            persisted,
        })
    }

    async fn load(&self, key: &SessionKey) -> Session {
        match self.store.get(key).await {
            Ok(Some(session)) => session,
            Ok(None) => Session::new(),
            Err(e) => {
                tracing::warn!(session = %key, error = %e, "session read failed; starting fresh");
                Session::new()
            }
        }
    }

    fn failed_turn(&self, session_key: SessionKey, handler: HandlerId, reason: RouteReason) -> TurnOutcome {
        let envelope = ResponseEnvelope::error(HANDLER_FAILURE_MESSAGE)
            .with_meta("handler", handler.as_str())
            .with_meta("route", reason.label())
            .with_meta("session_persisted", false);
        TurnOutcome {
            session_key,
            envelope,
            handler,
            route_reason: reason,
            persisted: false,
        }
    }
}
