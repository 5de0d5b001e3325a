//! Orchestrator facade.
//!
//! The interface the UI consumes: submit a prompt, poll turn events,
//! cancel. Owns the conversation, the selected backend, and the live
//! cancellation token. Single-flight per conversation: a prompt
//! submitted while a turn is running is rejected.

use crate::model::{Backend, Conversation, Message};
use crate::providers::{Provider, ProviderBackend};
use crate::session::{Session, TurnEvent};
use crate::tools::{FsToolHost, ToolHost};
use crate::{Error, Result, prompt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

/// Builder for an [`Orchestrator`].
pub struct OrchestratorBuilder<B, H> {
    backend: B,
    tools: H,
    system: Option<String>,
    timeout: Option<Duration>,
    max_tool_turns: Option<u32>,
}

impl<B: Backend + 'static, H: ToolHost + 'static> OrchestratorBuilder<B, H> {
    pub fn new(backend: B, tools: H) -> Self {
        Self {
            backend,
            tools,
            system: None,
            timeout: None,
            max_tool_turns: None,
        }
    }

    /// Override the default system instruction.
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Per-request deadline (default one minute).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Tool-round cap per turn; `0` disables it.
    pub fn max_tool_turns(mut self, max_tool_turns: u32) -> Self {
        self.max_tool_turns = Some(max_tool_turns);
        self
    }

    pub fn build(self) -> Orchestrator<B, H> {
        let system = self.system.unwrap_or_else(prompt::system_prompt);
        let mut session = Session::new(self.backend, self.tools, system);
        if let Some(timeout) = self.timeout {
            session = session.timeout(timeout);
        }
        if let Some(max) = self.max_tool_turns {
            session = session.max_tool_turns(max);
        }
        Orchestrator {
            session: Arc::new(session),
            conversation: Arc::new(Mutex::new(Conversation::new())),
            cancel: StdMutex::new(CancellationToken::new()),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// Handle to one running turn; yields [`TurnEvent`]s in generation order,
/// ending with exactly one terminal event.
pub struct TurnHandle {
    events: mpsc::UnboundedReceiver<TurnEvent>,
}

impl TurnHandle {
    /// Wait for the next event. `None` after the terminal event.
    pub async fn recv(&mut self) -> Option<TurnEvent> {
        self.events.recv().await
    }

    /// Non-blocking poll for the next event.
    pub fn try_recv(&mut self) -> Option<TurnEvent> {
        self.events.try_recv().ok()
    }
}

/// The conversation orchestrator consumed by the UI.
pub struct Orchestrator<B, H> {
    session: Arc<Session<B, H>>,
    conversation: Arc<Mutex<Conversation>>,
    cancel: StdMutex<CancellationToken>,
    in_flight: Arc<AtomicBool>,
}

impl<H: ToolHost + 'static> Orchestrator<ProviderBackend, H> {
    /// Build an orchestrator for the configured provider.
    pub fn for_provider(
        provider: Provider,
        api_key: impl Into<String>,
        model: impl Into<String>,
        tools: H,
    ) -> OrchestratorBuilder<ProviderBackend, H> {
        OrchestratorBuilder::new(ProviderBackend::create(provider, api_key, model), tools)
    }
}

impl Orchestrator<ProviderBackend, FsToolHost> {
    /// The default interactive setup: configured provider plus the
    /// filesystem tool set.
    pub fn with_fs_tools(
        provider: Provider,
        api_key: impl Into<String>,
        model: impl Into<String>,
        policy: policy::Policy,
    ) -> OrchestratorBuilder<ProviderBackend, FsToolHost> {
        Self::for_provider(provider, api_key, model, FsToolHost::new(policy))
    }
}

impl<B: Backend + 'static, H: ToolHost + 'static> Orchestrator<B, H> {
    pub fn builder(backend: B, tools: H) -> OrchestratorBuilder<B, H> {
        OrchestratorBuilder::new(backend, tools)
    }

    /// Start one turn asynchronously.
    ///
    /// Returns [`Error::TurnInFlight`] if the previous turn has not
    /// reached a terminal event yet.
    pub fn submit(&self, text: impl Into<String>) -> Result<TurnHandle> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::TurnInFlight);
        }

        let token = CancellationToken::new();
        *self.cancel.lock().unwrap_or_else(PoisonError::into_inner) = token.clone();

        let (tx, rx) = mpsc::unbounded_channel();
        let session = Arc::clone(&self.session);
        let conversation = Arc::clone(&self.conversation);
        let in_flight = Arc::clone(&self.in_flight);
        let text = text.into();

        tokio::spawn(async move {
            let result = session.run_turn(&conversation, &text, &tx, &token).await;
            // Release the flight slot before the terminal event so a
            // caller that saw the terminal can submit immediately.
            in_flight.store(false, Ordering::SeqCst);
            let terminal = match result {
                Ok(()) => TurnEvent::Done,
                Err(Error::Cancelled) => TurnEvent::Cancelled,
                Err(err) => {
                    tracing::error!(%err, "turn failed");
                    TurnEvent::Failed(err.to_string())
                }
            };
            let _ = tx.send(terminal);
        });

        Ok(TurnHandle { events: rx })
    }

    /// Request cooperative cancellation of the active turn.
    pub fn cancel(&self) {
        self.cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }

    /// Read-only snapshot of the conversation for rendering.
    pub async fn conversation(&self) -> Vec<Message> {
        self.conversation.lock().await.snapshot()
    }
}
