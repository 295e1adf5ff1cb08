//! Application core — state, lifecycle, and event dispatch.
//!
//! The [`App`] struct holds all runtime state and is the single entry point
//! for the rest of the binary.  Heavy concerns are delegated to focused
//! submodules:
//!
//! | Module         | Responsibility                               |
//! |----------------|----------------------------------------------|
//! | `chat`         | Background turns & the UI event channel      |
//! | `commands`     | Slash-command dispatch & handlers            |
//! | `conversation` | Conversation panel contents                  |
//! | `input`        | Text-input editing (cursor, insert, etc.)    |
//! | `logging`      | `LogLevel`, `LogLine`                        |
//! | `ui`           | TUI rendering & status-bar helpers           |

mod chat;
mod commands;
mod conversation;
mod input;
mod logging;
mod ui;

use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use tokio::runtime::Runtime;
use tokio::sync::{Mutex, mpsc};
use tokio::task::AbortHandle;

use crate::agents::AgentRegistry;
use crate::config::{ConfigSource, MindConfig};
use crate::constants::{APP_VERSION, MAX_LOGS};
use crate::provider::{Credentials, ProbeReport, ProviderHandle, resolve_provider};
use crate::runner::{ChatRunner, Runner};
use crate::session::{Session, SessionId};
use crate::tools::ToolSet;
use crate::turn::TurnHandler;

use self::chat::UiEvent;
use self::conversation::Conversation;
use self::logging::{LogLevel, LogLine};

// ── Application state ────────────────────────────────────────────────

/// Top-level application state.
///
/// Fields use `pub(crate)` visibility so that the sibling submodules
/// (`commands`, `chat`, `ui`, …) can access them directly while keeping
/// them hidden from the rest of the crate.
pub struct App {
    pub(crate) runtime: Runtime,
    pub(crate) input: String,
    pub(crate) cursor: usize,
    pub(crate) logs: Vec<LogLine>,
    pub(crate) config: MindConfig,
    pub(crate) config_source: ConfigSource,
    pub(crate) provider: ProviderHandle,
    pub(crate) registry: Arc<AgentRegistry>,
    pub(crate) tools: ToolSet,
    pub(crate) handler: TurnHandler,
    pub(crate) session_id: SessionId,
    pub(crate) session: Arc<Mutex<Session>>,
    pub(crate) turn: Option<AbortHandle>,
    pub(crate) conversation: Conversation,
    pub(crate) active_agent: String,
    pub(crate) next_message_id: Arc<AtomicU64>,
    pub(crate) ui_tx: mpsc::UnboundedSender<UiEvent>,
    pub(crate) ui_rx: mpsc::UnboundedReceiver<UiEvent>,
    pub(crate) scroll_offset: u16,
    pub(crate) should_quit: bool,
}

// ── Lifecycle ────────────────────────────────────────────────────────

impl App {
    /// Load configuration, resolve a working provider, and open the first
    /// session. Any failure here is fatal.
    pub fn new() -> Result<Self> {
        let runtime = Runtime::new().context("create tokio runtime")?;
        let (config, config_source) = MindConfig::load()?;

        let credentials = Credentials::from_env();
        let mut reports: Vec<ProbeReport> = Vec::new();
        let provider = runtime
            .block_on(resolve_provider(&config.provider, &credentials, |report| {
                eprintln!("{report}");
                reports.push(report);
            }))
            .context("resolve model provider")?;

        let tools = ToolSet::builtin(&config.assets);
        let registry = Arc::new(AgentRegistry::asa_mind(&tools)?);
        let runner: Arc<dyn Runner> = Arc::new(ChatRunner::new(
            provider.clone(),
            registry.clone(),
            tools.clone(),
            config.runner.max_turns,
        ));

        let mut app = Self::with_runner(
            runtime,
            config,
            config_source,
            provider,
            registry,
            tools,
            runner,
        );
        for report in reports {
            let level = if report.succeeded() {
                LogLevel::Info
            } else {
                LogLevel::Warn
            };
            app.log(level, report.to_string());
        }
        app.start_chat();
        Ok(app)
    }

    /// Assemble the application around an already-built runner.
    pub(crate) fn with_runner(
        runtime: Runtime,
        config: MindConfig,
        config_source: ConfigSource,
        provider: ProviderHandle,
        registry: Arc<AgentRegistry>,
        tools: ToolSet,
        runner: Arc<dyn Runner>,
    ) -> Self {
        let main = registry.main();
        let session_id = SessionId(1);
        let (ui_tx, ui_rx) = mpsc::unbounded_channel();

        let mut app = App {
            runtime,
            input: String::new(),
            cursor: 0,
            logs: Vec::new(),
            config,
            config_source,
            provider,
            registry,
            tools,
            active_agent: main.name.clone(),
            handler: TurnHandler::new(runner, main),
            session_id,
            session: Arc::new(Mutex::new(Session::new(session_id))),
            turn: None,
            conversation: Conversation::default(),
            next_message_id: Arc::new(AtomicU64::new(1)),
            ui_tx,
            ui_rx,
            scroll_offset: 0,
            should_quit: false,
        };

        app.log(
            LogLevel::Info,
            format!(
                "Loaded config from {} · {} agent(s), {} tool(s).",
                app.config_source.label(),
                app.registry.len(),
                app.tools.iter().count(),
            ),
        );
        app.log(
            LogLevel::Info,
            format!("ASA-Mind v{APP_VERSION} · /help for commands, /starters for ideas ✨"),
        );
        app
    }

    /// Whether the user has requested to quit.
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Per-frame housekeeping: apply UI events queued by background turns.
    pub fn tick(&mut self) {
        self.drain_ui_events();
    }
}

// ── Event handling ───────────────────────────────────────────────────

impl App {
    /// Route a terminal event to the appropriate handler.
    pub fn handle_event(&mut self, event: Event) -> Result<()> {
        if let Event::Key(key) = event {
            self.handle_key(key)?;
        }
        Ok(())
    }

    /// Dispatch a key press to input editing, commands, or control actions.
    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        match key {
            KeyEvent {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL,
                ..
            } => self.quit(),

            KeyEvent {
                code: KeyCode::Char('l'),
                modifiers: KeyModifiers::CONTROL,
                ..
            } => self.logs.clear(),

            KeyEvent { code, .. } => match code {
                KeyCode::Char(ch) => {
                    self.scroll_offset = 0; // snap to bottom on new input
                    self.insert_char(ch);
                }
                KeyCode::Backspace => self.backspace(),
                KeyCode::Delete => self.delete(),
                KeyCode::Left => self.move_cursor_left(),
                KeyCode::Right => self.move_cursor_right(),
                KeyCode::Home => self.move_cursor_home(),
                KeyCode::End => self.move_cursor_end(),
                KeyCode::Up => self.scroll_up(1),
                KeyCode::Down => self.scroll_down(1),
                KeyCode::PageUp => self.scroll_up(10),
                KeyCode::PageDown => self.scroll_down(10),
                KeyCode::Enter => {
                    self.scroll_offset = 0; // snap to bottom on submit
                    self.submit_input()?;
                }
                KeyCode::Esc => self.quit(),
                _ => {}
            },
        }
        Ok(())
    }

    /// Submit the current input line for processing.
    fn submit_input(&mut self) -> Result<()> {
        let line = self.input.trim().to_string();
        self.input.clear();
        self.cursor = 0;

        if line.is_empty() {
            return Ok(());
        }

        if line.starts_with('/') {
            self.handle_command(&line)?;
        } else {
            self.handle_chat_message(&line);
        }

        Ok(())
    }

    pub(crate) fn quit(&mut self) {
        self.end_session();
        self.should_quit = true;
    }
}

// ── Scrolling ────────────────────────────────────────────────────────

impl App {
    /// Scroll the conversation up by `n` lines.
    pub(crate) fn scroll_up(&mut self, n: u16) {
        self.scroll_offset = self.scroll_offset.saturating_add(n);
    }

    /// Scroll the conversation down by `n` lines (towards the latest).
    pub(crate) fn scroll_down(&mut self, n: u16) {
        self.scroll_offset = self.scroll_offset.saturating_sub(n);
    }
}

// ── Logging ──────────────────────────────────────────────────────────

/// Log a `Warn`/`Error` message, attaching `[file:line]` in debug-logs builds.
///
/// In release (no `debug-logs` feature) this behaves like `self.log()`.
///
/// ```ignore
/// log_src!(self, LogLevel::Warn, format!("something broke: {err:#}"));
/// ```
macro_rules! log_src {
    ($app:expr, $level:expr, $msg:expr) => {{
        #[cfg(feature = "debug-logs")]
        {
            let loc = format!("{}:{}", file!(), line!());
            $app.log_with_src($level, $msg, &loc);
        }
        #[cfg(not(feature = "debug-logs"))]
        {
            $app.log($level, $msg);
        }
    }};
}
pub(crate) use log_src;

impl App {
    /// Append a message to the activity log.
    pub(crate) fn log(&mut self, level: LogLevel, message: String) {
        let timestamp = Local::now().format("%H:%M:%S").to_string();
        self.logs.push(LogLine {
            timestamp,
            level,
            message,
        });
        if self.logs.len() > MAX_LOGS {
            let overflow = self.logs.len() - MAX_LOGS;
            self.logs.drain(0..overflow);
        }
    }

    /// Append a message with a source location suffix (debug-logs builds only).
    #[cfg(feature = "debug-logs")]
    pub(crate) fn log_with_src(&mut self, level: LogLevel, message: String, src: &str) {
        let tagged = match level {
            LogLevel::Warn | LogLevel::Error => format!("{message}  [{src}]"),
            _ => message,
        };
        self.log(level, tagged);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::agents::{AgentDescriptor, MAIN_AGENT};
    use crate::config::AssetConfig;
    use crate::runner::{RunEvent, RunResult, RunSender};
    use crate::session::{Turn, TurnState};

    use super::chat::UiEventKind;
    use super::conversation::Author;
    use super::*;

    /// Echoes the last user message back, one word per delta.
    struct EchoRunner;

    #[async_trait]
    impl Runner for EchoRunner {
        async fn run_streamed(
            &self,
            _agent: Arc<AgentDescriptor>,
            input: Vec<Turn>,
            events: RunSender,
        ) -> Result<RunResult> {
            let last = input.last().map(|t| t.content.clone()).unwrap_or_default();
            if last == "hang" {
                std::future::pending::<()>().await;
            }
            if last == "boom" {
                anyhow::bail!("upstream down");
            }
            let _ = events
                .send(RunEvent::AgentSwitched {
                    from: MAIN_AGENT.into(),
                    to: "Developer".into(),
                })
                .await;
            for word in last.split_inclusive(' ') {
                let _ = events.send(RunEvent::TextDelta(word.to_string())).await;
            }
            Ok(RunResult {
                final_output: last,
                last_agent: "Developer".into(),
                tripwire_triggered: false,
            })
        }
    }

    fn test_app() -> App {
        let runtime = Runtime::new().unwrap();
        let tools = ToolSet::builtin(&AssetConfig::default());
        let registry = Arc::new(AgentRegistry::asa_mind(&tools).unwrap());
        let provider = ProviderHandle::new("http://127.0.0.1:9", "m", "primary", "sk-test");
        App::with_runner(
            runtime,
            MindConfig::default(),
            ConfigSource::Embedded,
            provider,
            registry,
            tools,
            Arc::new(EchoRunner),
        )
    }

    /// Block on the UI channel until the current turn finishes.
    fn pump_until_idle(app: &mut App) {
        while app.is_busy() {
            let rx = &mut app.ui_rx;
            let event = app
                .runtime
                .block_on(async { tokio::time::timeout(Duration::from_secs(5), rx.recv()).await })
                .expect("turn finished in time")
                .expect("channel open");
            app.apply_ui_event(event);
        }
        app.drain_ui_events();
    }

    fn assistant_texts(app: &App) -> Vec<String> {
        app.conversation
            .entries()
            .iter()
            .filter(|e| e.author == Author::Assistant)
            .map(|e| e.content.clone())
            .collect()
    }

    #[test]
    fn welcome_is_shown_on_start() {
        let mut app = test_app();
        app.start_chat();
        app.drain_ui_events();
        assert_eq!(assistant_texts(&app), vec![crate::constants::WELCOME_MESSAGE]);
    }

    #[test]
    fn turn_streams_into_placeholder_and_records_transcript() {
        let mut app = test_app();
        app.handle_chat_message("salam dost");
        assert!(app.is_busy());
        pump_until_idle(&mut app);

        assert_eq!(assistant_texts(&app), vec!["salam dost"]);
        assert_eq!(app.active_agent, "Developer");
        let session = app.session.try_lock().unwrap();
        assert_eq!(session.state, TurnState::Done);
        assert_eq!(session.transcript.len(), 2);
        drop(session);
        assert!(app.logs.iter().any(|l| l.message.contains("ASA-Mind → Developer")));
    }

    #[test]
    fn failed_turn_is_logged_and_session_continues() {
        let mut app = test_app();
        app.handle_chat_message("boom");
        pump_until_idle(&mut app);
        assert!(app
            .logs
            .iter()
            .any(|l| l.level == LogLevel::Error && l.message.starts_with("🚨 Error:")));
        assert!(assistant_texts(&app)
            .iter()
            .any(|t| t.starts_with("❌ Error occurred:")));

        app.handle_chat_message("again");
        pump_until_idle(&mut app);
        assert_eq!(app.session.try_lock().unwrap().transcript.len(), 3);
    }

    #[test]
    fn input_is_refused_while_busy() {
        let mut app = test_app();
        app.handle_chat_message("hang");
        app.handle_chat_message("second");
        let users = app
            .conversation
            .entries()
            .iter()
            .filter(|e| e.author == Author::User)
            .count();
        assert_eq!(users, 1);
        assert!(app.logs.iter().any(|l| l.level == LogLevel::Warn));
        app.end_session();
        assert!(!app.is_busy());
    }

    #[test]
    fn stale_session_events_are_dropped() {
        let mut app = test_app();
        let stale = app.session_id;
        app.new_session();
        app.drain_ui_events();
        let before = app.conversation.entries().len();

        app.apply_ui_event(UiEvent {
            session: stale,
            kind: UiEventKind::Send(
                crate::message::MessageId(999),
                crate::message::OutgoingMessage::text("late"),
            ),
        });
        assert_eq!(app.conversation.entries().len(), before);
        assert_eq!(app.session_id, SessionId(2));
    }

    #[test]
    fn new_session_aborts_in_flight_turn() {
        let mut app = test_app();
        app.handle_chat_message("hang");
        app.new_session();
        assert!(!app.is_busy());
        app.handle_chat_message("fresh start");
        pump_until_idle(&mut app);
        assert!(assistant_texts(&app).contains(&"fresh start".to_string()));
    }

    #[test]
    fn starter_command_sends_its_message() {
        let mut app = test_app();
        app.handle_command("/starter 2").unwrap();
        pump_until_idle(&mut app);
        assert_eq!(app.conversation.entries()[0].content, "Who is your creator?");

        app.handle_command("/starter 9").unwrap();
        assert!(app.logs.last().unwrap().message.starts_with("Usage: /starter"));
    }

    #[test]
    fn history_lists_transcript_entries() {
        let mut app = test_app();
        app.handle_chat_message("one two");
        pump_until_idle(&mut app);
        app.handle_command("/history").unwrap();
        let tail: Vec<&str> = app.logs.iter().rev().take(2).map(|l| l.message.as_str()).collect();
        assert_eq!(tail, vec!["assistant: one two", "user: one two"]);
    }

    #[test]
    fn editing_handles_multibyte_input() {
        let mut app = test_app();
        for ch in "سلام".chars() {
            app.insert_char(ch);
        }
        app.move_cursor_left();
        app.backspace();
        assert_eq!(app.input, "سلم");
        app.move_cursor_home();
        app.delete();
        app.move_cursor_end();
        app.insert_char('!');
        assert_eq!(app.input, "لم!");
        assert_eq!(app.cursor, 3);
    }
}
