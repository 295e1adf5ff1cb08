//! Chat flow — runs turns on background tasks and feeds their UI calls back
//! to the draw loop over an unbounded channel.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use crate::message::{MessageId, OutgoingMessage};
use crate::runner::RunEvent;
use crate::session::{Session, SessionId};
use crate::turn::{ChatUi, TurnOutcome};

use super::App;
use super::log_src;
use super::logging::LogLevel;

// ── UI events ────────────────────────────────────────────────────────

/// A UI call made by a session's task, tagged with that session.
#[derive(Clone, Debug)]
pub struct UiEvent {
    pub session: SessionId,
    pub kind: UiEventKind,
}

#[derive(Clone, Debug)]
pub enum UiEventKind {
    Send(MessageId, OutgoingMessage),
    Token(MessageId, String),
    Update(MessageId, String),
    Activity(RunEvent),
    TurnFinished(TurnOutcome),
}

/// [`ChatUi`] that forwards every call to the draw loop.
#[derive(Clone)]
pub struct ChannelUi {
    session: SessionId,
    tx: mpsc::UnboundedSender<UiEvent>,
    next_id: Arc<AtomicU64>,
}

impl ChannelUi {
    pub fn new(
        session: SessionId,
        tx: mpsc::UnboundedSender<UiEvent>,
        next_id: Arc<AtomicU64>,
    ) -> Self {
        Self {
            session,
            tx,
            next_id,
        }
    }

    fn emit(&self, kind: UiEventKind) -> Result<()> {
        self.tx
            .send(UiEvent {
                session: self.session,
                kind,
            })
            .map_err(|_| anyhow!("chat window closed"))
    }
}

#[async_trait]
impl ChatUi for ChannelUi {
    async fn send(&self, message: OutgoingMessage) -> Result<MessageId> {
        let id = MessageId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.emit(UiEventKind::Send(id, message))?;
        Ok(id)
    }

    async fn stream_token(&self, id: MessageId, token: &str) -> Result<()> {
        self.emit(UiEventKind::Token(id, token.to_string()))
    }

    async fn update(&self, id: MessageId, content: &str) -> Result<()> {
        self.emit(UiEventKind::Update(id, content.to_string()))
    }

    fn observe(&self, event: &RunEvent) {
        if !matches!(event, RunEvent::TextDelta(_)) {
            let _ = self.emit(UiEventKind::Activity(event.clone()));
        }
    }
}

// ── Turn launch & event application ──────────────────────────────────

impl App {
    fn channel_ui(&self) -> ChannelUi {
        ChannelUi::new(self.session_id, self.ui_tx.clone(), self.next_message_id.clone())
    }

    /// Whether the current session has a turn in flight.
    pub(crate) fn is_busy(&self) -> bool {
        self.turn.is_some()
    }

    /// Greet the current session.
    pub(crate) fn start_chat(&mut self) {
        let ui = self.channel_ui();
        if let Err(err) = self.runtime.block_on(self.handler.on_chat_start(&ui)) {
            log_src!(self, LogLevel::Warn, format!("Welcome message failed: {err:#}"));
        }
    }

    /// Launch a non-blocking turn for `message`.
    ///
    /// Refused while the session already has a turn in flight.
    pub(crate) fn handle_chat_message(&mut self, message: &str) {
        if self.is_busy() {
            log_src!(
                self,
                LogLevel::Warn,
                "Still answering the previous message, please wait.".to_string()
            );
            return;
        }

        self.conversation.push_user(message);

        let ui = self.channel_ui();
        let tx = self.ui_tx.clone();
        let session_id = self.session_id;
        let session = self.session.clone();
        let handler = self.handler.clone();
        let message = message.to_string();

        let task = self.runtime.spawn(async move {
            let outcome = {
                let mut session = session.lock().await;
                handler.on_message(&mut session, &ui, &message).await
            };
            let _ = tx.send(UiEvent {
                session: session_id,
                kind: UiEventKind::TurnFinished(outcome),
            });
        });
        self.turn = Some(task.abort_handle());
    }

    /// Apply every pending UI event without blocking.
    pub(crate) fn drain_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            self.apply_ui_event(event);
        }
    }

    pub(crate) fn apply_ui_event(&mut self, event: UiEvent) {
        if event.session != self.session_id {
            return;
        }
        match event.kind {
            UiEventKind::Send(id, message) => {
                if !message.elements.is_empty() {
                    self.log(
                        LogLevel::Info,
                        format!("📎 Sent message with {} attachment(s)", message.elements.len()),
                    );
                }
                self.conversation.push_message(id, message);
            }
            UiEventKind::Token(id, token) => self.conversation.append(id, &token),
            UiEventKind::Update(id, content) => self.conversation.replace(id, &content),
            UiEventKind::Activity(activity) => self.log_activity(activity),
            UiEventKind::TurnFinished(outcome) => {
                self.turn = None;
                match outcome {
                    TurnOutcome::Completed {
                        last_agent,
                        tripwire_triggered,
                        ..
                    } => {
                        if tripwire_triggered {
                            log_src!(self, LogLevel::Warn, "Guardrail triggered".to_string());
                        }
                        self.active_agent = last_agent;
                    }
                    TurnOutcome::Failed { error } => {
                        log_src!(self, LogLevel::Error, format!("🚨 Error: {error}"));
                    }
                }
            }
        }
    }

    fn log_activity(&mut self, activity: RunEvent) {
        match activity {
            RunEvent::AgentSwitched { from, to } => {
                self.log(LogLevel::Info, format!("🔀 {from} → {to}"));
                self.active_agent = to;
            }
            RunEvent::ToolCalled { agent, tool } => {
                self.log(LogLevel::Info, format!("🛠️ {agent} used {tool}"));
            }
            RunEvent::Effect(_) | RunEvent::TextDelta(_) => {}
        }
    }

    /// End the current session and start a fresh one.
    ///
    /// The old session's in-flight turn is aborted; anything it already
    /// queued is dropped by [`App::apply_ui_event`] as stale.
    pub(crate) fn new_session(&mut self) {
        self.end_session();
        self.session_id = SessionId(self.session_id.0 + 1);
        self.session = Arc::new(Mutex::new(Session::new(self.session_id)));
        self.conversation.clear();
        self.active_agent = self.handler.agent().name.clone();
        self.log(LogLevel::Info, format!("Started session {}", self.session_id));
        self.start_chat();
    }

    /// Abort the in-flight turn, if any.
    pub(crate) fn end_session(&mut self) {
        if let Some(turn) = self.turn.take() {
            turn.abort();
            self.log(LogLevel::Info, format!("Cancelled reply in session {}", self.session_id));
        }
    }
}
