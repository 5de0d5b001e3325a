//! Turn loop controller.
//!
//! Drives the generate → execute-tools → regenerate cycle for one user
//! prompt until the backend stops requesting tools, an error occurs, or
//! cancellation is requested. The loop is iterative with an explicit
//! round counter; visible text flows out through a [`TurnEvent`] channel
//! in generation order.

use crate::model::{
    Backend, Conversation, Message, ModelError, ModelRequest, ModelResponse, ToolResult,
};
use crate::tools::{ToolError, ToolHost};
use crate::{Error, Result};
use serde_json::json;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

/// Default per-request deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default cap on tool rounds within one turn. `0` disables the cap,
/// leaving only the per-request timeout to bound runaway tool-calling.
pub const DEFAULT_MAX_TOOL_TURNS: u32 = 25;

/// Incremental output of one turn, delivered in generation order.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    /// Visible text produced by the model.
    Text(String),
    /// A tool is about to execute.
    ToolInvoked(String),
    /// Terminal: the turn completed normally.
    Done,
    /// Terminal: the turn was cancelled.
    Cancelled,
    /// Terminal: the turn failed.
    Failed(String),
}

impl TurnEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Cancelled | Self::Failed(_))
    }
}

/// One conversation's turn loop: a backend, a tool host, and the loop
/// policy knobs.
pub struct Session<B, H> {
    backend: B,
    tools: H,
    system: String,
    timeout: Duration,
    max_tool_turns: u32,
}

impl<B: Backend, H: ToolHost> Session<B, H> {
    pub fn new(backend: B, tools: H, system: impl Into<String>) -> Self {
        Self {
            backend,
            tools,
            system: system.into(),
            timeout: DEFAULT_TIMEOUT,
            max_tool_turns: DEFAULT_MAX_TOOL_TURNS,
        }
    }

    /// Set the per-request deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the tool-round cap. `0` disables it.
    pub fn max_tool_turns(mut self, max_tool_turns: u32) -> Self {
        self.max_tool_turns = max_tool_turns;
        self
    }

    /// Run one full turn: append the prompt, then generate and execute
    /// tools until the backend converges.
    ///
    /// Only fully-completed messages are ever appended: an assistant
    /// message and its tool results land together after the whole tool
    /// batch ran, and a cancelled or failed round appends nothing.
    pub async fn run_turn(
        &self,
        conversation: &Mutex<Conversation>,
        prompt: &str,
        events: &mpsc::UnboundedSender<TurnEvent>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        conversation.lock().await.push(Message::user(prompt));

        let mut rounds: u32 = 0;
        loop {
            let response = self.generate(conversation, cancel).await?;

            let text = response.message.text();
            if !text.is_empty() {
                let _ = events.send(TurnEvent::Text(text));
            }

            let calls = response.message.tool_calls();
            if calls.is_empty() {
                conversation.lock().await.push(response.message);
                return Ok(());
            }

            rounds += 1;
            if self.max_tool_turns != 0 && rounds > self.max_tool_turns {
                return Err(Error::TurnLimit(self.max_tool_turns));
            }

            let mut results = Vec::with_capacity(calls.len());
            for call in &calls {
                if cancel.is_cancelled() {
                    return Err(Error::Cancelled);
                }
                let _ = events.send(TurnEvent::ToolInvoked(call.name.clone()));

                match self.tools.execute(call).await {
                    Ok(output) => results.push(ToolResult {
                        id: call.id.clone(),
                        name: call.name.clone(),
                        result: output,
                    }),
                    // Unknown tool or malformed arguments: skip this call,
                    // keep the rest of the batch and the loop alive.
                    Err(err @ (ToolError::NotFound(_) | ToolError::InvalidInput(_))) => {
                        tracing::warn!(tool = %call.name, %err, "skipping tool call");
                    }
                    // Everything else is data for the model, not a fault.
                    Err(err) => results.push(ToolResult {
                        id: call.id.clone(),
                        name: call.name.clone(),
                        result: json!({ "error": err.to_string() }),
                    }),
                }
            }

            let mut conv = conversation.lock().await;
            conv.push(response.message);
            if !results.is_empty() {
                conv.push(Message::tool_results(results));
            }
            // Continuation round: regenerate with no new user text.
        }
    }

    async fn generate(
        &self,
        conversation: &Mutex<Conversation>,
        cancel: &CancellationToken,
    ) -> Result<ModelResponse> {
        let snapshot = conversation.lock().await.snapshot();
        let request = ModelRequest {
            messages: &snapshot,
            tools: self.tools.specs(),
            system: &self.system,
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(Error::Cancelled),
            result = tokio::time::timeout(self.timeout, self.backend.generate(request)) => {
                match result {
                    Ok(response) => Ok(response?),
                    Err(_) => Err(ModelError::Timeout(self.timeout.as_secs()).into()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Part, Role, ToolCall, ToolSpec};
    use serde_json::{Value, json};
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Backend that replays a fixed script of responses.
    struct ScriptedBackend {
        script: StdMutex<VecDeque<ScriptStep>>,
        generate_calls: AtomicU32,
    }

    enum ScriptStep {
        Respond(Message),
        Fail(ModelError),
        /// Cancel the given token and never resolve.
        Hang(CancellationToken),
    }

    impl ScriptedBackend {
        fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
            Self {
                script: StdMutex::new(steps.into_iter().collect()),
                generate_calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.generate_calls.load(Ordering::SeqCst)
        }
    }

    impl Backend for &ScriptedBackend {
        async fn generate(
            &self,
            _request: ModelRequest<'_>,
        ) -> std::result::Result<ModelResponse, ModelError> {
            self.generate_calls.fetch_add(1, Ordering::SeqCst);
            let step = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .expect("script exhausted");
            match step {
                ScriptStep::Respond(message) => Ok(ModelResponse {
                    message,
                    usage: Default::default(),
                }),
                ScriptStep::Fail(err) => Err(err),
                ScriptStep::Hang(token) => {
                    token.cancel();
                    std::future::pending().await
                }
            }
        }
    }

    /// Tool host that records executions and answers with a canned payload.
    struct RecordingHost {
        specs: Vec<ToolSpec>,
        executed: StdMutex<Vec<String>>,
    }

    impl RecordingHost {
        fn new() -> Self {
            Self {
                specs: Vec::new(),
                executed: StdMutex::new(Vec::new()),
            }
        }
    }

    impl ToolHost for &RecordingHost {
        fn specs(&self) -> &[ToolSpec] {
            &self.specs
        }

        async fn execute(&self, call: &ToolCall) -> std::result::Result<Value, ToolError> {
            match call.name.as_str() {
                "missing" => Err(ToolError::NotFound(call.name.clone())),
                "malformed" => Err(ToolError::InvalidInput("missing argument".into())),
                "broken" => Err(ToolError::Io("permission denied".into())),
                _ => {
                    self.executed.lock().unwrap().push(call.name.clone());
                    Ok(json!({ "ok": true }))
                }
            }
        }
    }

    fn tool_call_message(names: &[&str]) -> Message {
        let parts = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                Part::ToolCall(ToolCall {
                    id: format!("call-{i}"),
                    name: (*name).into(),
                    args: json!({}),
                })
            })
            .collect();
        Message::from_parts(Role::Assistant, parts)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<TurnEvent>) -> Vec<TurnEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn loop_converges_after_n_tool_rounds() {
        let backend = ScriptedBackend::new([
            ScriptStep::Respond(tool_call_message(&["echo"])),
            ScriptStep::Respond(tool_call_message(&["echo"])),
            ScriptStep::Respond(Message::assistant("done")),
        ]);
        let host = RecordingHost::new();
        let session = Session::new(&backend, &host, "system");
        let conversation = Mutex::new(Conversation::new());
        let (tx, mut rx) = mpsc::unbounded_channel();

        session
            .run_turn(&conversation, "go", &tx, &CancellationToken::new())
            .await
            .unwrap();

        // N tool rounds means exactly N+1 generate calls.
        assert_eq!(backend.calls(), 3);
        assert_eq!(host.executed.lock().unwrap().len(), 2);

        // user, (assistant, tool) x2, assistant
        let conv = conversation.lock().await;
        let roles: Vec<Role> = conv.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            [Role::User, Role::Assistant, Role::Tool, Role::Assistant, Role::Tool, Role::Assistant]
        );

        let events = drain(&mut rx);
        assert!(events.contains(&TurnEvent::Text("done".into())));
    }

    #[tokio::test]
    async fn failed_calls_do_not_stop_the_batch() {
        let backend = ScriptedBackend::new([
            ScriptStep::Respond(tool_call_message(&["missing", "malformed", "broken", "echo"])),
            ScriptStep::Respond(Message::assistant("recovered")),
        ]);
        let host = RecordingHost::new();
        let session = Session::new(&backend, &host, "system");
        let conversation = Mutex::new(Conversation::new());
        let (tx, _rx) = mpsc::unbounded_channel();

        session
            .run_turn(&conversation, "go", &tx, &CancellationToken::new())
            .await
            .unwrap();

        // The good call still ran.
        assert_eq!(*host.executed.lock().unwrap(), ["echo"]);

        // Skipped calls produce no result; the execution failure becomes
        // a textual result.
        let conv = conversation.lock().await;
        let tool_msg = &conv.messages()[2];
        assert_eq!(tool_msg.role, Role::Tool);
        assert_eq!(tool_msg.parts.len(), 2);
        let Part::ToolResult(broken) = &tool_msg.parts[0] else {
            panic!("expected tool result");
        };
        assert!(broken.result["error"].as_str().unwrap().contains("permission denied"));
    }

    #[tokio::test]
    async fn network_error_fails_the_turn_without_partial_append() {
        let backend = ScriptedBackend::new([
            ScriptStep::Respond(tool_call_message(&["echo"])),
            ScriptStep::Fail(ModelError::Network("connection reset".into())),
        ]);
        let host = RecordingHost::new();
        let session = Session::new(&backend, &host, "system");
        let conversation = Mutex::new(Conversation::new());
        let (tx, _rx) = mpsc::unbounded_channel();

        let err = session
            .run_turn(&conversation, "go", &tx, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Model(ModelError::Network(_))));

        // Only the completed first round is present.
        let conv = conversation.lock().await;
        assert_eq!(conv.len(), 3);
    }

    #[tokio::test]
    async fn cancellation_aborts_without_partial_append() {
        let cancel = CancellationToken::new();
        let backend = ScriptedBackend::new([
            ScriptStep::Respond(tool_call_message(&["echo"])),
            ScriptStep::Hang(cancel.clone()),
        ]);
        let host = RecordingHost::new();
        let session = Session::new(&backend, &host, "system");
        let conversation = Mutex::new(Conversation::new());
        let (tx, _rx) = mpsc::unbounded_channel();

        let err = session
            .run_turn(&conversation, "go", &tx, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));

        // Round 1 completed and was appended; nothing partial after it,
        // and no tool ran after cancellation was observed.
        let conv = conversation.lock().await;
        assert_eq!(conv.len(), 3);
        assert_eq!(host.executed.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn runaway_tool_calling_hits_the_round_cap() {
        let backend = ScriptedBackend::new(
            (0..5).map(|_| ScriptStep::Respond(tool_call_message(&["echo"]))),
        );
        let host = RecordingHost::new();
        let session = Session::new(&backend, &host, "system").max_tool_turns(3);
        let conversation = Mutex::new(Conversation::new());
        let (tx, _rx) = mpsc::unbounded_channel();

        let err = session
            .run_turn(&conversation, "go", &tx, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TurnLimit(3)));
    }
}
