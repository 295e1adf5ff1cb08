//! Compile-time constants and tunables shared across the crate.

/// Application name used for config directories and the status bar.
pub const APP_NAME: &str = "asa-mind";
/// Application version injected from `Cargo.toml` at compile time.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default OpenAI-compatible endpoint (Gemini's OpenAI surface).
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai/";
/// Default chat model shared by every agent.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
/// Default path of the creator picture shown by `creator_tool`.
pub const DEFAULT_CREATOR_IMAGE: &str = "creator_image.jpg";

/// Environment variables for the primary credential slot, in priority order.
pub const PRIMARY_KEY_VARS: &[&str] = &["OPENAI_API_KEY", "OPENAI_API_KEY_01"];
/// Environment variables for the backup credential slot, in priority order.
pub const BACKUP_KEY_VARS: &[&str] = &["OPENAI_BACKUP_KEY", "OPENAI_API_KEY_02"];

/// Prompt used by the start-up liveness probe.
pub const PROBE_PROMPT: &str = "Just say OK";
/// Completion budget of the liveness probe.
pub const PROBE_MAX_TOKENS: u32 = 10;

/// Default ceiling on model calls inside a single run.
pub const DEFAULT_MAX_TURNS: usize = 10;
/// Buffer size of the runner event channel.
pub const RUN_EVENT_BUFFER: usize = 64;
/// Maximum number of log entries kept in the activity panel.
pub const MAX_LOGS: usize = 1000;

/// Placeholder shown while the model has not answered yet.
pub const THINKING_PLACEHOLDER: &str = "⏳ Thinking...";
/// Notice sent when a run reports a guardrail trip.
pub const GUARDRAIL_NOTICE: &str = "⚠️ Guardrail Triggered!";
/// Greeting sent when a chat session starts.
pub const WELCOME_MESSAGE: &str = "👋 **Welcome to ASA-Mind!** 🤖
I'm your **AI** friend built with 💚 by **Asad Shabir**.
**Ask me anything** — coding, life help, religion, ya kuch aur. 😊";
