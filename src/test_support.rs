//! Local HTTP doubles for the OpenAI-compatible API, used by unit tests.

use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;

use serde_json::{Value, json};
use tiny_http::{Header, Response, Server};

/// A request received by [`MockServer`].
#[derive(Clone, Debug)]
pub struct CapturedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

/// Canned reply served by [`MockServer`].
#[derive(Clone, Debug)]
pub struct MockResponse {
    status: u16,
    content_type: &'static str,
    body: String,
}

impl MockResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    /// A `text/event-stream` body carrying `chunks` followed by `[DONE]`.
    pub fn sse(chunks: &[Value]) -> Self {
        let mut body = String::new();
        for chunk in chunks {
            body.push_str(&format!("data: {chunk}\n\n"));
        }
        body.push_str("data: [DONE]\n\n");
        Self {
            status: 200,
            content_type: "text/event-stream",
            body,
        }
    }
}

/// Minimal chat-completions server on an ephemeral local port.
pub struct MockServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl MockServer {
    /// Serve each request with `handler(index, request)`.
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(usize, &CapturedRequest) -> MockResponse + Send + 'static,
    {
        let server = Server::http("127.0.0.1:0").expect("bind mock server");
        let addr = server
            .server_addr()
            .to_ip()
            .expect("mock server has an IP address");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let captured = requests.clone();

        thread::spawn(move || {
            for mut request in server.incoming_requests() {
                let mut raw = String::new();
                let _ = request.as_reader().read_to_string(&mut raw);
                let authorization = request
                    .headers()
                    .iter()
                    .find(|h| h.field.equiv("Authorization"))
                    .map(|h| h.value.as_str().to_string());
                let entry = CapturedRequest {
                    path: request.url().to_string(),
                    authorization,
                    body: serde_json::from_str(&raw).unwrap_or(Value::Null),
                };
                let index = {
                    let mut log = captured.lock().expect("request log");
                    log.push(entry.clone());
                    log.len() - 1
                };
                let reply = handler(index, &entry);
                let header = Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes())
                    .expect("content-type header");
                let response = Response::from_string(reply.body)
                    .with_status_code(reply.status)
                    .with_header(header);
                let _ = request.respond(response);
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            requests,
        }
    }

    /// Serve `responses` in order, then HTTP 500 for anything extra.
    pub fn scripted(responses: Vec<MockResponse>) -> Self {
        Self::start(move |index, _| {
            responses.get(index).cloned().unwrap_or_else(|| {
                MockResponse::json(500, json!({"error": {"message": "script exhausted"}}))
            })
        })
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().expect("request log").clone()
    }
}

pub fn text_chunk(text: &str) -> Value {
    json!({"choices": [{"index": 0, "delta": {"content": text}, "finish_reason": null}]})
}

pub fn tool_call_chunk(index: usize, id: &str, name: &str, arguments: &str) -> Value {
    json!({"choices": [{"index": 0, "delta": {"tool_calls": [{
        "index": index,
        "id": id,
        "type": "function",
        "function": {"name": name, "arguments": arguments},
    }]}, "finish_reason": null}]})
}

pub fn finish_chunk(reason: &str) -> Value {
    json!({"choices": [{"index": 0, "delta": {}, "finish_reason": reason}]})
}
