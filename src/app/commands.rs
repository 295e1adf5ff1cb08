//! Slash-command dispatch and handler implementations.
//!
//! Every `/command` typed by the user is routed through [`App::handle_command`]
//! and dispatched to the appropriate handler method in this module.

use anyhow::Result;

use crate::openai::format_json;
use crate::turn::starters;

use super::App;
use super::log_src;
use super::logging::LogLevel;

// ── Command dispatch ─────────────────────────────────────────────────

impl App {
    /// Route a slash-command to the matching handler.
    pub(crate) fn handle_command(&mut self, line: &str) -> Result<()> {
        let mut parts = line.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "/help" => self.show_help(),
            "/quit" | "/exit" => self.quit(),
            "/clear" => self.logs.clear(),
            "/new" => self.new_session(),
            "/starters" => self.list_starters(),
            "/starter" => self.run_starter(parts.next()),
            "/agents" => self.list_agents(),
            "/tools" => match parts.next() {
                Some(name) => self.show_tool(name),
                None => self.list_tools(),
            },
            "/provider" => self.show_provider(),
            "/history" => self.show_history(),
            _ => log_src!(self, LogLevel::Warn, format!("Unknown command: {cmd}")),
        }

        Ok(())
    }
}

// ── Help ─────────────────────────────────────────────────────────────

impl App {
    fn show_help(&mut self) {
        let lines = [
            "Commands:",
            "(no slash)        Chat with ASA-Mind",
            "/new              End this session and start a fresh one",
            "/starters         List starter prompts",
            "/starter <n>      Send starter prompt number n",
            "/agents           List agents and their handoffs",
            "/tools            List tools",
            "/tools <name>     Show a tool's description and argument schema",
            "/provider         Show the active model provider",
            "/history          Show this session's transcript",
            "/clear            Clear activity log",
            "/quit             Exit",
        ];
        for line in lines {
            self.log(LogLevel::Info, line.to_string());
        }
    }
}

// ── Starters ─────────────────────────────────────────────────────────

impl App {
    fn list_starters(&mut self) {
        self.log(LogLevel::Info, "Starters:".to_string());
        for (n, starter) in starters().iter().enumerate() {
            self.log(
                LogLevel::Info,
                format!("{}. {} — {}", n + 1, starter.label, starter.message),
            );
        }
    }

    fn run_starter(&mut self, arg: Option<&str>) {
        let picked = arg
            .and_then(|n| n.parse::<usize>().ok())
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| starters().get(i));
        match picked {
            Some(starter) => {
                self.log(LogLevel::Info, format!("▶ {}", starter.label));
                self.handle_chat_message(starter.message);
            }
            None => log_src!(
                self,
                LogLevel::Warn,
                format!("Usage: /starter <1-{}>", starters().len())
            ),
        }
    }
}

// ── Introspection ────────────────────────────────────────────────────

impl App {
    fn list_agents(&mut self) {
        let mut lines = Vec::new();
        for agent in self.registry.iter() {
            let mut line = format!("- {}", agent.name);
            if !agent.handoff_description.is_empty() {
                line.push_str(&format!(": {}", agent.handoff_description));
            }
            if !agent.tools.is_empty() {
                line.push_str(&format!(" [tools: {}]", agent.tools.join(", ")));
            }
            if !agent.is_leaf() {
                line.push_str(&format!(" [handoffs: {}]", agent.handoffs.join(", ")));
            }
            lines.push(line);
        }
        self.log(LogLevel::Info, format!("Agents ({}):", lines.len()));
        for line in lines {
            self.log(LogLevel::Info, line);
        }
    }

    fn list_tools(&mut self) {
        let lines: Vec<String> = self
            .tools
            .iter()
            .map(|tool| format!("- {}: {}", tool.name(), first_line(tool.description())))
            .collect();
        self.log(LogLevel::Info, format!("Tools ({}):", lines.len()));
        for line in lines {
            self.log(LogLevel::Info, line);
        }
    }

    fn show_tool(&mut self, name: &str) {
        let Some(tool) = self.tools.get(name) else {
            log_src!(self, LogLevel::Warn, format!("Unknown tool: {name}"));
            return;
        };
        self.log(LogLevel::Info, format!("{}:", tool.name()));
        for line in tool.description().trim().lines() {
            self.log(LogLevel::Info, format!("  {}", line.trim()));
        }
        for line in format_json(tool.parameters()).lines() {
            self.log(LogLevel::Info, format!("  {line}"));
        }
    }

    fn show_provider(&mut self) {
        let lines = [
            format!("Endpoint: {}", self.provider.base_url),
            format!("Model: {}", self.provider.model),
            format!(
                "Credential: {} ({})",
                self.provider.credential,
                self.provider.key_hint()
            ),
            format!("Max model calls per turn: {}", self.config.runner.max_turns),
            format!("Config: {}", self.config_source.label()),
        ];
        for line in lines {
            self.log(LogLevel::Info, line);
        }
    }

    fn show_history(&mut self) {
        let snapshot = self
            .session
            .try_lock()
            .ok()
            .map(|session| session.transcript.turns().to_vec());
        let Some(turns) = snapshot else {
            log_src!(
                self,
                LogLevel::Warn,
                "Transcript is locked while a reply is in progress.".to_string()
            );
            return;
        };
        if turns.is_empty() {
            self.log(LogLevel::Info, "Transcript is empty.".to_string());
            return;
        }
        self.log(
            LogLevel::Info,
            format!("Transcript of session {} ({} entries):", self.session_id, turns.len()),
        );
        for turn in turns {
            self.log(
                LogLevel::Info,
                format!("{}: {}", turn.role.as_str(), first_line(&turn.content)),
            );
        }
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}
