//! Orchestration runner — drives an agent over a transcript, following tool
//! calls and handoffs, and streams what happens as [`RunEvent`]s.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use crate::agents::{AgentDescriptor, AgentRegistry};
use crate::constants::RUN_EVENT_BUFFER;
use crate::openai::OpenAiClient;
use crate::provider::ProviderHandle;
use crate::session::Turn;
use crate::tools::{ToolSet, UiEffect};

// ── Public types ─────────────────────────────────────────────────────

/// Something that happened while a run was in progress.
#[derive(Clone, Debug, PartialEq)]
pub enum RunEvent {
    /// Incremental assistant text, in generation order.
    TextDelta(String),
    /// A tool asked for something to be shown in the UI.
    Effect(UiEffect),
    /// Control moved to another agent through a handoff.
    AgentSwitched { from: String, to: String },
    /// A tool finished running.
    ToolCalled { agent: String, tool: String },
}

/// Outcome of a completed run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunResult {
    pub final_output: String,
    pub last_agent: String,
    /// Set when the provider reported a safety/policy stop.
    pub tripwire_triggered: bool,
}

pub type RunSender = mpsc::Sender<RunEvent>;
pub type RunReceiver = mpsc::Receiver<RunEvent>;

pub fn run_channel() -> (RunSender, RunReceiver) {
    mpsc::channel(RUN_EVENT_BUFFER)
}

/// Executes an agent against a transcript.
///
/// Events are pushed to `events` while the run is in progress; the sender is
/// dropped when the run returns, which ends the event stream.
#[async_trait]
pub trait Runner: Send + Sync {
    async fn run_streamed(
        &self,
        agent: Arc<AgentDescriptor>,
        input: Vec<Turn>,
        events: RunSender,
    ) -> Result<RunResult>;
}

async fn emit(events: &RunSender, event: RunEvent) -> Result<()> {
    events
        .send(event)
        .await
        .map_err(|_| anyhow!("run cancelled: event receiver dropped"))
}

// ── Chat-completions runner ──────────────────────────────────────────

/// [`Runner`] backed by a streaming OpenAI-compatible chat-completions API.
pub struct ChatRunner {
    client: OpenAiClient,
    provider: ProviderHandle,
    registry: Arc<AgentRegistry>,
    tools: ToolSet,
    max_turns: usize,
}

impl ChatRunner {
    pub fn new(
        provider: ProviderHandle,
        registry: Arc<AgentRegistry>,
        tools: ToolSet,
        max_turns: usize,
    ) -> Self {
        Self {
            client: OpenAiClient::new(&provider.base_url),
            provider,
            registry,
            tools,
            max_turns,
        }
    }

    fn request_body(&self, agent: &AgentDescriptor, messages: &[Value]) -> Result<Value> {
        let mut all_messages = Vec::with_capacity(messages.len() + 1);
        all_messages.push(json!({"role": "system", "content": agent.instructions}));
        all_messages.extend_from_slice(messages);

        let mut body = json!({
            "model": self.provider.model,
            "messages": all_messages,
            "temperature": agent.settings.temperature,
            "top_p": agent.settings.top_p,
            "max_tokens": agent.settings.max_tokens,
        });

        let mut tools = self.tools.definitions(&agent.tools)?;
        tools.extend(self.registry.handoff_definitions(agent));
        if !tools.is_empty() {
            body["tools"] = Value::Array(tools);
        }
        Ok(body)
    }

    async fn invoke_tool(
        &self,
        agent: &AgentDescriptor,
        call: &ToolCall,
        events: &RunSender,
    ) -> Result<String> {
        if !agent.tools.iter().any(|t| t == &call.name) {
            return Err(anyhow!(
                "model called tool {} which agent {} does not have",
                call.name,
                agent.name
            ));
        }
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| anyhow!("unknown tool: {}", call.name))?;

        let args = match parse_arguments(&call.arguments) {
            Ok(args) => args,
            Err(err) => return Ok(tool_error_text(&err)),
        };

        let text = match tool.invoke(&args) {
            Ok(output) => {
                if let Some(effect) = output.effect {
                    emit(events, RunEvent::Effect(effect)).await?;
                }
                output.text
            }
            Err(err) => tool_error_text(&err),
        };

        emit(
            events,
            RunEvent::ToolCalled {
                agent: agent.name.clone(),
                tool: call.name.clone(),
            },
        )
        .await?;
        Ok(text)
    }
}

#[async_trait]
impl Runner for ChatRunner {
    async fn run_streamed(
        &self,
        agent: Arc<AgentDescriptor>,
        input: Vec<Turn>,
        events: RunSender,
    ) -> Result<RunResult> {
        let mut agent = agent;
        let mut messages: Vec<Value> = input
            .iter()
            .map(|turn| json!({"role": turn.role.as_str(), "content": turn.content}))
            .collect();
        let mut output = String::new();
        let mut tripwire_triggered = false;

        for _ in 0..self.max_turns {
            let body = self.request_body(&agent, &messages)?;
            let mut stream = self
                .client
                .stream_chat_completion(self.provider.key(), body)
                .await
                .with_context(|| format!("model call for agent {}", agent.name))?;

            let mut step = StepAccumulator::default();
            while let Some(chunk) = stream.next_chunk().await? {
                if let Some(delta) = step.apply(&chunk) {
                    output.push_str(&delta);
                    emit(&events, RunEvent::TextDelta(delta)).await?;
                }
            }

            if step.finish_reason.as_deref() == Some("content_filter") {
                tripwire_triggered = true;
            }

            let content = step.content.clone();
            let calls = step.into_tool_calls();
            if calls.is_empty() {
                return Ok(RunResult {
                    final_output: output,
                    last_agent: agent.name.clone(),
                    tripwire_triggered,
                });
            }

            messages.push(assistant_tool_call_message(&content, &calls));

            let mut next_agent: Option<Arc<AgentDescriptor>> = None;
            for call in &calls {
                let result = match self.registry.resolve_handoff(&agent, &call.name) {
                    Some(target) if next_agent.is_none() => {
                        emit(
                            &events,
                            RunEvent::AgentSwitched {
                                from: agent.name.clone(),
                                to: target.name.clone(),
                            },
                        )
                        .await?;
                        let result = json!({"assistant": target.name}).to_string();
                        next_agent = Some(target);
                        result
                    }
                    Some(_) => "Multiple handoffs detected, ignoring this one.".to_string(),
                    None => self.invoke_tool(&agent, call, &events).await?,
                };
                messages.push(json!({
                    "role": "tool",
                    "tool_call_id": call.id,
                    "content": result,
                }));
            }

            if let Some(next) = next_agent {
                agent = next;
            }
        }

        Err(anyhow!("max turns ({}) exceeded", self.max_turns))
    }
}

// ── Stream accumulation ──────────────────────────────────────────────

/// A tool call assembled from streamed fragments.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

/// Collects one model response out of its streamed chunks.
#[derive(Debug, Default)]
struct StepAccumulator {
    content: String,
    /// Keyed by the upstream `index`, which is not trusted to be dense.
    tool_calls: BTreeMap<usize, ToolCall>,
    finish_reason: Option<String>,
}

impl StepAccumulator {
    /// Fold one chunk in, returning its text delta if it carried one.
    fn apply(&mut self, chunk: &Value) -> Option<String> {
        let choice = chunk.get("choices")?.as_array()?.first()?;

        if let Some(reason) = choice.get("finish_reason").and_then(|v| v.as_str()) {
            self.finish_reason = Some(reason.to_string());
        }

        let delta = choice.get("delta")?;

        if let Some(calls) = delta.get("tool_calls").and_then(|v| v.as_array()) {
            for (position, call) in calls.iter().enumerate() {
                let index = call
                    .get("index")
                    .and_then(|v| v.as_u64())
                    .and_then(|i| usize::try_from(i).ok())
                    .unwrap_or_else(|| {
                        self.tool_calls
                            .last_key_value()
                            .map_or(0, |(last, _)| last.saturating_add(1))
                            .max(position)
                    });
                let slot = self.tool_calls.entry(index).or_default();
                if let Some(id) = call.get("id").and_then(|v| v.as_str()) {
                    if !id.is_empty() {
                        slot.id = id.to_string();
                    }
                }
                if let Some(function) = call.get("function") {
                    if let Some(name) = function.get("name").and_then(|v| v.as_str()) {
                        if !name.is_empty() {
                            slot.name = name.to_string();
                        }
                    }
                    if let Some(args) = function.get("arguments").and_then(|v| v.as_str()) {
                        slot.arguments.push_str(args);
                    }
                }
            }
        }

        let text = delta.get("content").and_then(|v| v.as_str())?;
        if text.is_empty() {
            return None;
        }
        self.content.push_str(text);
        Some(text.to_string())
    }

    fn into_tool_calls(self) -> Vec<ToolCall> {
        self.tool_calls
            .into_values()
            .filter(|call| !call.name.is_empty())
            .enumerate()
            .map(|(n, mut call)| {
                if call.id.is_empty() {
                    call.id = format!("asa_call_{n}");
                }
                call
            })
            .collect()
    }
}

fn assistant_tool_call_message(content: &str, calls: &[ToolCall]) -> Value {
    let tool_calls: Vec<Value> = calls
        .iter()
        .map(|call| {
            json!({
                "id": call.id,
                "type": "function",
                "function": {"name": call.name, "arguments": call.arguments},
            })
        })
        .collect();
    let content = if content.is_empty() {
        Value::Null
    } else {
        Value::String(content.to_string())
    };
    json!({"role": "assistant", "content": content, "tool_calls": tool_calls})
}

fn parse_arguments(raw: &str) -> Result<Value> {
    if raw.trim().is_empty() {
        return Ok(json!({}));
    }
    let value: Value = serde_json::from_str(raw).context("tool arguments are not valid JSON")?;
    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Ok(json!({})),
        other => Err(anyhow!("tool arguments must be a JSON object, got {other}")),
    }
}

fn tool_error_text(err: &anyhow::Error) -> String {
    format!("An error occurred while running the tool. Please try again. Error: {err:#}")
}
