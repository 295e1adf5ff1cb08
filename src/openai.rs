//! OpenAI-compatible chat-completions client — plain and streamed requests,
//! SSE decoding, and response helpers.

use std::collections::VecDeque;

use anyhow::{Context, Result, anyhow};
use reqwest::Client as HttpClient;
use reqwest::Response;
use serde::Serialize;
use serde_json::{Value, json};

use crate::util::join_url;

const CHAT_COMPLETIONS_PATH: &str = "chat/completions";

/// Thin wrapper around an OpenAI-compatible HTTP API.
#[derive(Clone)]
pub struct OpenAiClient {
    pub base_url: String,
    http_client: HttpClient,
}

impl OpenAiClient {
    pub fn new(base_url: &str) -> Self {
        OpenAiClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client: HttpClient::new(),
        }
    }

    /// Run a non-streamed chat completion and return the decoded body.
    pub async fn chat_completion(&self, key: &str, body: Value) -> Result<Value> {
        let response = self.send(key, body).await?;
        let text = response.text().await.context("read OpenAI response")?;
        let json: Value = serde_json::from_str(&text).unwrap_or_else(|_| json!({"raw": text}));
        Ok(json)
    }

    /// Start a streamed chat completion. `stream: true` is forced on the body.
    pub async fn stream_chat_completion(&self, key: &str, mut body: Value) -> Result<ChatStream> {
        body["stream"] = Value::Bool(true);
        let response = self.send(key, body).await?;
        Ok(ChatStream::new(response))
    }

    async fn send(&self, key: &str, body: Value) -> Result<Response> {
        let url = join_url(&self.base_url, CHAT_COMPLETIONS_PATH);
        let response = self
            .http_client
            .post(url)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await
            .context("send OpenAI request")?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.context("read OpenAI error body")?;
            let json: Value =
                serde_json::from_str(&text).unwrap_or_else(|_| json!({"raw": text}));
            return Err(anyhow!("OpenAI error {status}: {json}"));
        }
        Ok(response)
    }
}

// ── Streaming ────────────────────────────────────────────────────────

/// An in-flight streamed completion, yielding decoded JSON chunks.
pub struct ChatStream {
    response: Response,
    decoder: SseDecoder,
    pending: VecDeque<Value>,
    done: bool,
}

impl ChatStream {
    fn new(response: Response) -> Self {
        Self {
            response,
            decoder: SseDecoder::default(),
            pending: VecDeque::new(),
            done: false,
        }
    }

    /// Next `chat.completion.chunk` object, or `None` once the stream ended.
    pub async fn next_chunk(&mut self) -> Result<Option<Value>> {
        loop {
            if let Some(chunk) = self.pending.pop_front() {
                return Ok(Some(chunk));
            }
            if self.done {
                return Ok(None);
            }
            match self.response.chunk().await.context("read stream chunk")? {
                Some(bytes) => {
                    let events = self.decoder.push(&bytes);
                    self.enqueue(events)?;
                }
                None => {
                    let events = self.decoder.finish();
                    self.enqueue(events)?;
                    self.done = true;
                }
            }
        }
    }

    fn enqueue(&mut self, events: Vec<SseData>) -> Result<()> {
        for event in events {
            if self.done {
                break;
            }
            match event {
                SseData::Done => self.done = true,
                SseData::Payload(raw) => {
                    let chunk: Value = serde_json::from_str(&raw)
                        .with_context(|| format!("decode stream chunk: {raw}"))?;
                    if let Some(error) = chunk.get("error") {
                        return Err(anyhow!("OpenAI stream error: {error}"));
                    }
                    self.pending.push_back(chunk);
                }
            }
        }
        Ok(())
    }
}

/// One `data:` record of a server-sent event stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SseData {
    Payload(String),
    Done,
}

/// Incremental line decoder for `text/event-stream` bodies.
///
/// Bytes are buffered until a full line is available, so multi-byte
/// characters split across network chunks decode correctly.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseData> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = parse_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a trailing line that had no newline terminator.
    pub fn finish(&mut self) -> Vec<SseData> {
        let line = std::mem::take(&mut self.buffer);
        parse_line(&line).into_iter().collect()
    }
}

fn parse_line(line: &[u8]) -> Option<SseData> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim_end_matches(['\n', '\r']);
    let payload = line.strip_prefix("data:")?.trim_start();
    match payload {
        "" => None,
        "[DONE]" => Some(SseData::Done),
        other => Some(SseData::Payload(other.to_string())),
    }
}

// ── Response helpers ─────────────────────────────────────────────────

/// Build a chat-completions `function` tool definition.
pub fn function_tool(name: &str, description: &str, parameters: Value) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": name,
            "description": description,
            "parameters": parameters,
        }
    })
}

/// Whether a non-streamed completion body carries a `choices` array.
pub fn has_choices(response: &Value) -> bool {
    response
        .get("choices")
        .map(|choices| choices.is_array())
        .unwrap_or(false)
}

/// Pretty-print any serialisable value as JSON, with a safe fallback.
pub fn format_json<T: Serialize>(value: T) -> String {
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| "<unrenderable>".to_string())
}
