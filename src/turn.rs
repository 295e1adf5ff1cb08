//! Conversation turn handling: the host-facing half of a chat session.
//!
//! [`TurnHandler::on_message`] takes one user message through
//! `Idle → AwaitingModel → Streaming → Done | Failed`, forwarding streamed
//! text and tool effects to a [`ChatUi`] while the runner works.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::agents::AgentDescriptor;
use crate::constants::{GUARDRAIL_NOTICE, THINKING_PLACEHOLDER, WELCOME_MESSAGE};
use crate::message::{MessageId, OutgoingMessage};
use crate::runner::{RunEvent, Runner, run_channel};
use crate::session::{Session, Turn, TurnState};
use crate::tools::UiEffect;

// ── Host interface ───────────────────────────────────────────────────

/// The chat surface a session renders into.
#[async_trait]
pub trait ChatUi: Send + Sync {
    /// Show a new message and return its handle.
    async fn send(&self, message: OutgoingMessage) -> Result<MessageId>;

    /// Append streamed text to an existing message.
    async fn stream_token(&self, id: MessageId, token: &str) -> Result<()>;

    /// Replace the content of an existing message.
    async fn update(&self, id: MessageId, content: &str) -> Result<()>;

    /// Notification of runner activity that has no visible message.
    fn observe(&self, _event: &RunEvent) {}
}

/// A canned prompt offered to users before their first message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Starter {
    pub label: &'static str,
    pub message: &'static str,
}

pub const STARTERS: [Starter; 3] = [
    Starter {
        label: "👨‍💻 Code Help",
        message: "Fix this code: print('Hello')",
    },
    Starter {
        label: "🧠 About Creator",
        message: "Who is your creator?",
    },
    Starter {
        label: "🕌 Islamic Question",
        message: "Why do Shia pray with open hands?",
    },
];

pub fn starters() -> &'static [Starter] {
    &STARTERS
}

// ── Turn handling ────────────────────────────────────────────────────

/// How a turn ended.
#[derive(Clone, Debug, PartialEq)]
pub enum TurnOutcome {
    Completed {
        text: String,
        last_agent: String,
        tripwire_triggered: bool,
    },
    Failed {
        error: String,
    },
}

/// Drives turns of any session against one entry agent.
#[derive(Clone)]
pub struct TurnHandler {
    runner: Arc<dyn Runner>,
    agent: Arc<AgentDescriptor>,
}

impl TurnHandler {
    pub fn new(runner: Arc<dyn Runner>, agent: Arc<AgentDescriptor>) -> Self {
        Self { runner, agent }
    }

    pub fn agent(&self) -> &AgentDescriptor {
        &self.agent
    }

    /// Greet a freshly started session.
    pub async fn on_chat_start(&self, ui: &dyn ChatUi) -> Result<MessageId> {
        ui.send(OutgoingMessage::text(WELCOME_MESSAGE)).await
    }

    /// Run one user message through the session.
    ///
    /// Errors never escape: a failed turn leaves the user entry in the
    /// transcript, shows an error notice, and puts the session in
    /// [`TurnState::Failed`], from which the next message is accepted.
    pub async fn on_message(
        &self,
        session: &mut Session,
        ui: &dyn ChatUi,
        content: &str,
    ) -> TurnOutcome {
        session.transcript.push(Turn::user(content));
        session.state = TurnState::AwaitingModel;

        match self.run_turn(session, ui).await {
            Ok(outcome) => {
                session.state = TurnState::Done;
                outcome
            }
            Err(err) => {
                session.state = TurnState::Failed;
                let notice = format!("❌ Error occurred: `{err:#}`");
                // The notice is best effort; the turn has already failed.
                let _ = ui.send(OutgoingMessage::text(notice)).await;
                TurnOutcome::Failed {
                    error: format!("{err:#}"),
                }
            }
        }
    }

    async fn run_turn(&self, session: &mut Session, ui: &dyn ChatUi) -> Result<TurnOutcome> {
        let placeholder = ui.send(OutgoingMessage::text(THINKING_PLACEHOLDER)).await?;

        let input = session.transcript.turns().to_vec();
        let (tx, mut rx) = run_channel();
        let run = self.runner.run_streamed(self.agent.clone(), input, tx);

        let state = &mut session.state;
        let forward = async {
            let mut assembled = String::new();
            while let Some(event) = rx.recv().await {
                match &event {
                    RunEvent::TextDelta(delta) => {
                        *state = TurnState::Streaming;
                        ui.stream_token(placeholder, delta).await?;
                        assembled.push_str(delta);
                    }
                    RunEvent::Effect(UiEffect::SendMessage(message)) => {
                        ui.send(message.clone()).await?;
                    }
                    RunEvent::AgentSwitched { .. } | RunEvent::ToolCalled { .. } => {}
                }
                ui.observe(&event);
            }
            Ok::<_, anyhow::Error>(assembled)
        };

        let (result, forwarded) = tokio::join!(run, forward);
        let assembled = forwarded?;
        let result = result?;

        let text = if assembled.is_empty() {
            result.final_output
        } else {
            assembled
        };
        ui.update(placeholder, &text).await?;
        if result.tripwire_triggered {
            ui.send(OutgoingMessage::text(GUARDRAIL_NOTICE)).await?;
        }
        session.transcript.push(Turn::assistant(text.clone()));

        Ok(TurnOutcome::Completed {
            text,
            last_agent: result.last_agent,
            tripwire_triggered: result.tripwire_triggered,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use anyhow::anyhow;

    use crate::agents::{AgentRegistry, MAIN_AGENT};
    use crate::config::AssetConfig;
    use crate::message::Element;
    use crate::runner::{RunResult, RunSender};
    use crate::session::{Role, SessionId};
    use crate::tools::{CreatorTool, Tool, ToolSet};

    use super::*;

    /// What the recording UI saw, in order.
    #[derive(Clone, Debug, PartialEq)]
    enum UiCall {
        Send(MessageId, String),
        Token(MessageId, String),
        Update(MessageId, String),
        Effect(MessageId, usize),
    }

    #[derive(Default)]
    struct RecordingUi {
        calls: Mutex<Vec<UiCall>>,
        observed: Mutex<Vec<RunEvent>>,
        fail_tokens: bool,
    }

    impl RecordingUi {
        fn calls(&self) -> Vec<UiCall> {
            self.calls.lock().unwrap().clone()
        }

        /// Final content of message `id` after replaying tokens and updates.
        fn content_of(&self, id: MessageId) -> String {
            let mut content = String::new();
            for call in self.calls() {
                match call {
                    UiCall::Send(m, text) if m == id => content = text,
                    UiCall::Token(m, token) if m == id => content.push_str(&token),
                    UiCall::Update(m, text) if m == id => content = text,
                    _ => {}
                }
            }
            content
        }
    }

    #[async_trait]
    impl ChatUi for RecordingUi {
        async fn send(&self, message: OutgoingMessage) -> Result<MessageId> {
            let mut calls = self.calls.lock().unwrap();
            let id = MessageId(calls.len() as u64 + 1);
            if message.elements.is_empty() {
                calls.push(UiCall::Send(id, message.content));
            } else {
                calls.push(UiCall::Effect(id, message.elements.len()));
            }
            Ok(id)
        }

        async fn stream_token(&self, id: MessageId, token: &str) -> Result<()> {
            if self.fail_tokens {
                return Err(anyhow!("display went away"));
            }
            self.calls
                .lock()
                .unwrap()
                .push(UiCall::Token(id, token.to_string()));
            Ok(())
        }

        async fn update(&self, id: MessageId, content: &str) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(UiCall::Update(id, content.to_string()));
            Ok(())
        }

        fn observe(&self, event: &RunEvent) {
            self.observed.lock().unwrap().push(event.clone());
        }
    }

    /// One scripted run: events to emit, then the result.
    struct Script {
        events: Vec<RunEvent>,
        result: std::result::Result<RunResult, String>,
        delay: Duration,
    }

    impl Script {
        fn answer(deltas: &[&str]) -> Self {
            Self {
                events: deltas
                    .iter()
                    .map(|d| RunEvent::TextDelta(d.to_string()))
                    .collect(),
                result: Ok(RunResult {
                    final_output: deltas.concat(),
                    last_agent: MAIN_AGENT.to_string(),
                    tripwire_triggered: false,
                }),
                delay: Duration::ZERO,
            }
        }

        fn failure(message: &str) -> Self {
            Self {
                events: vec![RunEvent::TextDelta("half an ans".into())],
                result: Err(message.to_string()),
                delay: Duration::ZERO,
            }
        }
    }

    #[derive(Default)]
    struct ScriptedRunner {
        scripts: Mutex<VecDeque<Script>>,
        inputs: Mutex<Vec<Vec<Turn>>>,
    }

    impl ScriptedRunner {
        fn new(scripts: Vec<Script>) -> Arc<Self> {
            Arc::new(Self {
                scripts: Mutex::new(scripts.into()),
                inputs: Mutex::default(),
            })
        }
    }

    #[async_trait]
    impl Runner for ScriptedRunner {
        async fn run_streamed(
            &self,
            _agent: Arc<AgentDescriptor>,
            input: Vec<Turn>,
            events: RunSender,
        ) -> Result<RunResult> {
            self.inputs.lock().unwrap().push(input);
            let script = self
                .scripts
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| anyhow!("no script left"))?;
            for event in script.events {
                if !script.delay.is_zero() {
                    tokio::time::sleep(script.delay).await;
                }
                events
                    .send(event)
                    .await
                    .map_err(|_| anyhow!("receiver dropped"))?;
            }
            script.result.map_err(|message| anyhow!(message))
        }
    }

    fn handler(runner: Arc<ScriptedRunner>) -> TurnHandler {
        let tools = ToolSet::builtin(&AssetConfig::default());
        let registry = AgentRegistry::asa_mind(&tools).unwrap();
        TurnHandler::new(runner, registry.main())
    }

    fn roles_and_content(session: &Session) -> Vec<(Role, String)> {
        session
            .transcript
            .turns()
            .iter()
            .map(|t| (t.role, t.content.clone()))
            .collect()
    }

    #[tokio::test]
    async fn welcome_message_on_start() {
        let ui = RecordingUi::default();
        let handler = handler(ScriptedRunner::new(vec![]));
        let id = handler.on_chat_start(&ui).await.unwrap();
        assert_eq!(ui.content_of(id), WELCOME_MESSAGE);
    }

    #[tokio::test]
    async fn successful_turn_streams_then_updates_and_records() {
        let runner = ScriptedRunner::new(vec![Script::answer(&["Salam", ", ", "dost"])]);
        let handler = handler(runner.clone());
        let ui = RecordingUi::default();
        let mut session = Session::new(SessionId(1));

        let outcome = handler.on_message(&mut session, &ui, "hello").await;

        assert_eq!(
            outcome,
            TurnOutcome::Completed {
                text: "Salam, dost".into(),
                last_agent: MAIN_AGENT.into(),
                tripwire_triggered: false,
            }
        );
        assert_eq!(session.state, TurnState::Done);
        assert_eq!(
            roles_and_content(&session),
            vec![
                (Role::User, "hello".to_string()),
                (Role::Assistant, "Salam, dost".to_string()),
            ]
        );

        let placeholder = MessageId(1);
        assert_eq!(
            ui.calls(),
            vec![
                UiCall::Send(placeholder, THINKING_PLACEHOLDER.into()),
                UiCall::Token(placeholder, "Salam".into()),
                UiCall::Token(placeholder, ", ".into()),
                UiCall::Token(placeholder, "dost".into()),
                UiCall::Update(placeholder, "Salam, dost".into()),
            ]
        );
        assert_eq!(runner.inputs.lock().unwrap()[0], vec![Turn::user("hello")]);
    }

    #[tokio::test]
    async fn failed_turn_keeps_user_entry_and_next_turn_succeeds() {
        let runner = ScriptedRunner::new(vec![
            Script::failure("upstream exploded"),
            Script::answer(&["recovered"]),
        ]);
        let handler = handler(runner.clone());
        let ui = RecordingUi::default();
        let mut session = Session::new(SessionId(1));

        let outcome = handler.on_message(&mut session, &ui, "first").await;
        assert!(matches!(outcome, TurnOutcome::Failed { ref error } if error.contains("upstream exploded")));
        assert_eq!(session.state, TurnState::Failed);
        assert_eq!(roles_and_content(&session), vec![(Role::User, "first".to_string())]);
        let notice = ui
            .calls()
            .into_iter()
            .find_map(|c| match c {
                UiCall::Send(_, text) if text.starts_with("❌ Error occurred:") => Some(text),
                _ => None,
            })
            .unwrap();
        assert_eq!(notice, "❌ Error occurred: `upstream exploded`");

        let outcome = handler.on_message(&mut session, &ui, "second").await;
        assert!(matches!(outcome, TurnOutcome::Completed { .. }));
        assert_eq!(
            roles_and_content(&session),
            vec![
                (Role::User, "first".to_string()),
                (Role::User, "second".to_string()),
                (Role::Assistant, "recovered".to_string()),
            ]
        );
        assert_eq!(runner.inputs.lock().unwrap()[1].len(), 2);
    }

    #[tokio::test]
    async fn effects_are_sent_before_the_final_update() {
        let card = CreatorTool::new("creator_image.jpg".into())
            .invoke(&serde_json::json!({"request": "who is your creator?"}))
            .unwrap();
        let effect = card.effect.unwrap();
        let runner = ScriptedRunner::new(vec![Script {
            events: vec![
                RunEvent::Effect(effect),
                RunEvent::TextDelta("That's him.".into()),
            ],
            result: Ok(RunResult {
                final_output: "That's him.".into(),
                last_agent: MAIN_AGENT.into(),
                tripwire_triggered: false,
            }),
            delay: Duration::ZERO,
        }]);
        let handler = handler(runner);
        let ui = RecordingUi::default();
        let mut session = Session::new(SessionId(7));

        handler.on_message(&mut session, &ui, "who made you?").await;

        let calls = ui.calls();
        let effect_at = calls
            .iter()
            .position(|c| matches!(c, UiCall::Effect(_, 1)))
            .unwrap();
        let update_at = calls
            .iter()
            .position(|c| matches!(c, UiCall::Update(..)))
            .unwrap();
        assert!(effect_at < update_at);
        let observed = ui.observed.lock().unwrap();
        assert!(matches!(
            &observed[0],
            RunEvent::Effect(UiEffect::SendMessage(m)) if matches!(m.elements[0], Element::Image { .. })
        ));
    }

    #[tokio::test]
    async fn guardrail_notice_follows_update() {
        let mut script = Script::answer(&["careful"]);
        if let Ok(result) = &mut script.result {
            result.tripwire_triggered = true;
        }
        let handler = handler(ScriptedRunner::new(vec![script]));
        let ui = RecordingUi::default();
        let mut session = Session::new(SessionId(1));

        let outcome = handler.on_message(&mut session, &ui, "x").await;
        assert!(matches!(outcome, TurnOutcome::Completed { tripwire_triggered: true, .. }));
        let calls = ui.calls();
        assert!(matches!(calls[calls.len() - 2], UiCall::Update(..)));
        assert_eq!(calls.last(), Some(&UiCall::Send(MessageId(4), GUARDRAIL_NOTICE.into())));
        assert_eq!(session.transcript.len(), 2);
    }

    #[tokio::test]
    async fn final_output_used_when_nothing_streamed() {
        let handler = handler(ScriptedRunner::new(vec![Script {
            events: vec![],
            result: Ok(RunResult {
                final_output: "quiet answer".into(),
                last_agent: "Developer".into(),
                tripwire_triggered: false,
            }),
            delay: Duration::ZERO,
        }]));
        let ui = RecordingUi::default();
        let mut session = Session::new(SessionId(1));

        handler.on_message(&mut session, &ui, "x").await;
        assert_eq!(ui.content_of(MessageId(1)), "quiet answer");
        assert_eq!(
            session.transcript.last(),
            Some(&Turn::assistant("quiet answer"))
        );
    }

    #[tokio::test]
    async fn ui_failure_mid_stream_fails_the_turn() {
        let handler = handler(ScriptedRunner::new(vec![Script::answer(&["a", "b"])]));
        let ui = RecordingUi {
            fail_tokens: true,
            ..Default::default()
        };
        let mut session = Session::new(SessionId(1));

        let outcome = handler.on_message(&mut session, &ui, "x").await;
        assert!(matches!(outcome, TurnOutcome::Failed { .. }));
        assert_eq!(session.transcript.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_sessions_do_not_interfere() {
        let slow = |text: &str| {
            let mut script = Script::answer(&[text, "-1", "-2"]);
            script.delay = Duration::from_millis(5);
            script
        };
        let handler_a = handler(ScriptedRunner::new(vec![slow("alpha")]));
        let handler_b = handler(ScriptedRunner::new(vec![slow("beta")]));
        let ui_a = RecordingUi::default();
        let ui_b = RecordingUi::default();
        let mut session_a = Session::new(SessionId(1));
        let mut session_b = Session::new(SessionId(2));

        let (a, b) = tokio::join!(
            handler_a.on_message(&mut session_a, &ui_a, "to a"),
            handler_b.on_message(&mut session_b, &ui_b, "to b"),
        );

        assert!(matches!(a, TurnOutcome::Completed { ref text, .. } if text == "alpha-1-2"));
        assert!(matches!(b, TurnOutcome::Completed { ref text, .. } if text == "beta-1-2"));
        assert_eq!(ui_a.content_of(MessageId(1)), "alpha-1-2");
        assert_eq!(ui_b.content_of(MessageId(1)), "beta-1-2");
        assert_eq!(session_a.transcript.last(), Some(&Turn::assistant("alpha-1-2")));
        assert_eq!(session_b.transcript.last(), Some(&Turn::assistant("beta-1-2")));
    }

    #[test]
    fn starters_are_fixed() {
        let labels: Vec<&str> = starters().iter().map(|s| s.label).collect();
        assert_eq!(
            labels,
            vec!["👨‍💻 Code Help", "🧠 About Creator", "🕌 Islamic Question"]
        );
        assert_eq!(starters()[1].message, "Who is your creator?");
    }
}
