//! STDIO JSON-RPC transport (spec.md §6: "over STDIO as JSON-RPC
//! `tools/call`"), adapted from the teacher's
//! `memory-mcp/src/jsonrpc.rs` framing helpers: line-delimited JSON by
//! default, with LSP-style `Content-Length` framing supported for clients
//! that prefer it.

use std::io::{self, BufRead, Read, Write};
use std::sync::Arc;

use memory_core::VerbsService;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::dto::{AskRequest, AugmentRequest, InspectRequest, PanRequest, RecallRequest, TellRequest, TiltRequest, ZoomRequest};

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub id: Option<Value>,
    pub method: String,
    pub params: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

/// Read one message, supporting both bare JSON lines and
/// `Content-Length`-framed bodies. Returns `(body, was_content_length)`.
pub fn read_next_message<R: BufRead + Read>(reader: &mut R) -> io::Result<Option<(String, bool)>> {
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with('{') {
            return Ok(Some((trimmed.to_string(), false)));
        }
        let lower = trimmed.to_ascii_lowercase();
        if let Some(len_str) = lower.strip_prefix("content-length:") {
            let len: usize = len_str.trim().parse().unwrap_or(0);
            loop {
                let mut header_line = String::new();
                if reader.read_line(&mut header_line)? == 0 || header_line.trim().is_empty() {
                    break;
                }
            }
            if len == 0 {
                continue;
            }
            let mut buf = vec![0u8; len];
            reader.read_exact(&mut buf)?;
            return Ok(Some((String::from_utf8_lossy(&buf).to_string(), true)));
        }
        continue;
    }
}

pub fn write_framed<W: Write>(writer: &mut W, body: &str, use_length_header: bool) -> io::Result<()> {
    if use_length_header {
        let header = format!("Content-Length: {}\r\n\r\n", body.len());
        writer.write_all(header.as_bytes())?;
        writer.write_all(body.as_bytes())?;
        writer.write_all(b"\n")?;
    } else {
        writeln!(writer, "{body}")?;
    }
    writer.flush()
}

/// Run the STDIO read-dispatch-write loop until EOF (spec.md §6). Every
/// `tools/call` request is dispatched by its `name` parameter (the verb)
/// against `params.arguments`, same request shapes as the HTTP router.
pub async fn run(verbs: Arc<VerbsService>) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut stdout = io::stdout();

    loop {
        let message = read_next_message(&mut input)?;
        let Some((line, framed)) = message else {
            info!("stdin closed, shutting down");
            break;
        };

        let response = match serde_json::from_str::<JsonRpcRequest>(&line) {
            Ok(request) => handle_request(request, &verbs).await,
            Err(err) => {
                error!(error = %err, "failed to parse JSON-RPC request");
                JsonRpcResponse {
                    jsonrpc: "2.0".to_string(),
                    id: None,
                    result: None,
                    error: Some(JsonRpcError { code: -32700, message: "parse error".to_string() }),
                }
            }
        };

        if let Some(response) = response {
            let body = serde_json::to_string(&response)?;
            write_framed(&mut stdout, &body, framed)?;
        }
    }
    Ok(())
}

async fn handle_request(request: JsonRpcRequest, verbs: &Arc<VerbsService>) -> Option<JsonRpcResponse> {
    if request.id.is_none() {
        return None;
    }

    let result = match request.method.as_str() {
        "tools/call" => dispatch_tool_call(request.params, verbs).await,
        other => {
            warn!(method = other, "unknown JSON-RPC method");
            return Some(JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id: request.id,
                result: None,
                error: Some(JsonRpcError { code: -32601, message: "method not found".to_string() }),
            });
        }
    };

    Some(JsonRpcResponse {
        jsonrpc: "2.0".to_string(),
        id: request.id,
        result: Some(result),
        error: None,
    })
}

async fn dispatch_tool_call(params: Option<Value>, verbs: &Arc<VerbsService>) -> Value {
    let Some(params) = params else {
        return json!({ "success": false, "error": "tools/call requires params" });
    };
    let name = params.get("name").and_then(Value::as_str).unwrap_or_default();
    let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));
    let now_ms = chrono::Utc::now().timestamp_millis();

    let envelope = match name {
        "tell" => match serde_json::from_value::<TellRequest>(arguments) {
            Ok(body) => verbs.tell(&body.content, body.content_type, body.lazy, now_ms).await,
            Err(err) => return invalid_arguments(err),
        },
        "ask" => match serde_json::from_value::<AskRequest>(arguments) {
            Ok(body) => {
                verbs
                    .ask(
                        &body.question,
                        body.mode,
                        body.use_hyde,
                        body.use_wikipedia,
                        body.use_wikidata,
                        body.use_web_search,
                        now_ms,
                    )
                    .await
            }
            Err(err) => return invalid_arguments(err),
        },
        "augment" => match serde_json::from_value::<AugmentRequest>(arguments) {
            Ok(body) => verbs.augment(&body.target, body.operation, now_ms).await,
            Err(err) => return invalid_arguments(err),
        },
        "zoom" => match serde_json::from_value::<ZoomRequest>(arguments) {
            Ok(body) => verbs.zoom(body.level, body.query.as_deref(), now_ms).await,
            Err(err) => return invalid_arguments(err),
        },
        "pan" => match serde_json::from_value::<PanRequest>(arguments) {
            Ok(body) => verbs.pan(body, now_ms).await,
            Err(err) => return invalid_arguments(err),
        },
        "tilt" => match serde_json::from_value::<TiltRequest>(arguments) {
            Ok(body) => verbs.tilt(body.style, body.query.as_deref(), now_ms).await,
            Err(err) => return invalid_arguments(err),
        },
        "recall" => match serde_json::from_value::<RecallRequest>(arguments) {
            Ok(body) => verbs.recall(&body.query, now_ms).await,
            Err(err) => return invalid_arguments(err),
        },
        "inspect" => match serde_json::from_value::<InspectRequest>(arguments) {
            Ok(body) => verbs.inspect(&body.kind, body.target.as_deref(), body.include_recommendations),
            Err(err) => return invalid_arguments(err),
        },
        other => return json!({ "success": false, "error": format!("unknown tool: {other}") }),
    };

    serde_json::to_value(envelope).unwrap_or_else(|_| json!({"success": false, "error": "envelope serialization failed"}))
}

fn invalid_arguments(err: serde_json::Error) -> Value {
    json!({ "success": false, "error": format!("invalid arguments: {err}") })
}
