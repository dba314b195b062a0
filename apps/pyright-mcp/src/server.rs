//! Tool-protocol server: newline-delimited JSON-RPC 2.0 over stdio.
//!
//! Exposes `pyright_version`, `find_pyright_config` and `pyright_check` as
//! tools. Requests are handled one at a time; every check builds its own
//! request and result.

use crate::config::{self, Overrides};
use crate::discovery::find_pyright_config;
use crate::models::FailOn;
use crate::output::to_canonical_json;
use crate::resolve::get_version;
use crate::runner::PyrightRunner;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, info, warn};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "Pyright MCP Server";

const PARSE_ERROR: i32 = -32700;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;

#[derive(Debug)]
struct RpcError {
    code: i32,
    message: String,
}

impl RpcError {
    fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: INVALID_PARAMS,
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FindConfigArgs {
    #[serde(default)]
    start_dir: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CheckArgs {
    #[serde(default = "default_target")]
    target: String,
    #[serde(default)]
    cwd: Option<String>,
    #[serde(default)]
    include: Option<Vec<String>>,
    #[serde(default)]
    exclude: Option<Vec<String>>,
    #[serde(default)]
    extra_args: Option<Vec<String>>,
    #[serde(default)]
    timeout_sec: Option<u64>,
    #[serde(default)]
    fail_on_severity: Option<FailOn>,
}

fn default_target() -> String {
    ".".to_string()
}

/// Serve requests from `input` until EOF, writing responses to `out`.
pub fn serve<R: BufRead, W: Write>(input: R, mut out: W) -> Result<()> {
    info!("tool-protocol server started");
    for line in input.lines() {
        let line = line.context("read request line")?;
        if line.trim().is_empty() {
            continue;
        }
        if let Some(response) = handle_line(&line) {
            let text = serde_json::to_string(&response).context("serialize response")?;
            writeln!(out, "{}", text).context("write response")?;
            out.flush().context("flush response")?;
        }
    }
    info!("input closed; shutting down");
    Ok(())
}

/// Handle one protocol line; `None` for notifications.
pub fn handle_line(line: &str) -> Option<Value> {
    let msg: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "unparseable request");
            return Some(error_response(Value::Null, PARSE_ERROR, "Parse error"));
        }
    };
    let method = msg.get("method").and_then(Value::as_str).unwrap_or_default();
    let Some(id) = msg.get("id").cloned() else {
        debug!(method, "notification ignored");
        return None;
    };
    let params = msg.get("params").cloned().unwrap_or(Value::Null);
    debug!(method, "dispatching request");
    let response = match dispatch(method, params) {
        Ok(result) => json!({"jsonrpc": "2.0", "id": id, "result": result}),
        Err(e) => error_response(id, e.code, &e.message),
    };
    Some(response)
}

fn error_response(id: Value, code: i32, message: &str) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "error": {"code": code, "message": message}})
}

fn dispatch(method: &str, params: Value) -> Result<Value, RpcError> {
    match method {
        "initialize" => Ok(json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {"tools": {"listChanged": false}},
            "serverInfo": {"name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION")},
        })),
        "ping" => Ok(json!({})),
        "tools/list" => Ok(json!({"tools": tool_definitions()})),
        "tools/call" => {
            let call: ToolCall = serde_json::from_value(params)
                .map_err(|e| RpcError::invalid_params(format!("invalid tools/call params: {}", e)))?;
            call_tool(&call.name, call.arguments.unwrap_or_else(|| json!({})))
        }
        other => Err(RpcError {
            code: METHOD_NOT_FOUND,
            message: format!("Method not found: {}", other),
        }),
    }
}

fn call_tool(name: &str, args: Value) -> Result<Value, RpcError> {
    let structured = match name {
        "pyright_version" => to_value(&get_version())?,
        "find_pyright_config" => {
            let args: FindConfigArgs = parse_args(args)?;
            let start = args.start_dir.map(PathBuf::from);
            to_value(&find_pyright_config(start.as_deref()))?
        }
        "pyright_check" => {
            let args: CheckArgs = parse_args(args)?;
            if args.timeout_sec == Some(0) {
                return Err(RpcError::invalid_params("timeout_sec must be >= 1"));
            }
            let target = PathBuf::from(&args.target);
            let cwd = args.cwd.map(PathBuf::from);
            let start = config::search_start(&target, cwd.as_deref());
            let eff = config::resolve_effective(
                &start,
                Overrides {
                    timeout_sec: args.timeout_sec,
                    fail_on_severity: args.fail_on_severity,
                    include: args.include,
                    exclude: args.exclude,
                    extra_args: args.extra_args,
                    output: None,
                },
            );
            let result = PyrightRunner::new().run_check(eff.to_request(target, cwd));
            to_value(&result)?
        }
        other => return Err(RpcError::invalid_params(format!("Unknown tool: {}", other))),
    };
    let text = to_canonical_json(&structured).map_err(internal)?;
    Ok(json!({
        "content": [{"type": "text", "text": text}],
        "structuredContent": structured,
        "isError": false,
    }))
}

fn parse_args<T: for<'de> Deserialize<'de>>(args: Value) -> Result<T, RpcError> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args)
        .map_err(|e| RpcError::invalid_params(format!("invalid arguments: {}", e)))
}

fn to_value<T: serde::Serialize>(v: &T) -> Result<Value, RpcError> {
    serde_json::to_value(v).map_err(internal)
}

fn internal(e: serde_json::Error) -> RpcError {
    RpcError {
        code: -32603,
        message: format!("Internal error: {}", e),
    }
}

fn tool_definitions() -> Value {
    json!([
        {
            "name": "pyright_version",
            "description": "Return pyright CLI version info and resolved executable path.",
            "inputSchema": {"type": "object", "properties": {}},
        },
        {
            "name": "find_pyright_config",
            "description": "Discover the configuration file used by Pyright starting from start_dir (or CWD if omitted).",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "start_dir": {"type": ["string", "null"], "description": "Directory to start searching from"}
                },
            },
        },
        {
            "name": "pyright_check",
            "description": "Run Pyright with JSON output and return normalized, structured diagnostics.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "target": {"type": "string", "default": ".", "description": "File or directory to analyze"},
                    "cwd": {"type": ["string", "null"], "description": "Working directory to run from"},
                    "include": {"type": ["array", "null"], "items": {"type": "string"}, "description": "Glob patterns to include, resolved relative to the target root"},
                    "exclude": {"type": ["array", "null"], "items": {"type": "string"}, "description": "Glob patterns to exclude from the include set"},
                    "extra_args": {"type": ["array", "null"], "items": {"type": "string"}, "description": "Additional Pyright CLI args, e.g. ['--pythonversion','3.12']"},
                    "timeout_sec": {"type": "integer", "minimum": 1, "default": 60, "description": "Timeout in seconds"},
                    "fail_on_severity": {"type": "string", "enum": ["none", "information", "warning", "error"], "default": "none", "description": "Threshold to mark ok=false when diagnostics at or above this severity are present"},
                },
            },
        },
    ])
}
