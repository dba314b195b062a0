use assert_cmd::Command;
use serde_json::{json, Value};
use tempfile::TempDir;

fn exchange(requests: &[Value]) -> Vec<Value> {
    let input: String = requests.iter().map(|r| format!("{}\n", r)).collect();
    let out = Command::cargo_bin("pyright-mcp-server")
        .expect("binary should build")
        .write_stdin(input)
        .output()
        .expect("server should run");
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    String::from_utf8_lossy(&out.stdout)
        .lines()
        .map(|l| serde_json::from_str(l).expect("response is JSON"))
        .collect()
}

#[test]
fn initialize_list_and_call_tools() {
    let td = TempDir::new().expect("temp");
    std::fs::write(
        td.path().join("pyproject.toml"),
        "[project]\nname = \"x\"\n\n[tool.pyright]\nstrict = [\"src\"]\n",
    )
    .unwrap();
    let missing = td.path().join("missing");

    let responses = exchange(&[
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {"protocolVersion": "2024-11-05"}}),
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
        json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call",
               "params": {"name": "find_pyright_config", "arguments": {"start_dir": td.path()}}}),
        json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call",
               "params": {"name": "pyright_check", "arguments": {"target": missing}}}),
        json!({"jsonrpc": "2.0", "id": 5, "method": "tools/call",
               "params": {"name": "pyright_version", "arguments": {}}}),
    ]);
    assert_eq!(responses.len(), 5);

    assert_eq!(responses[0]["id"], 1);
    assert!(responses[0]["result"]["capabilities"]["tools"].is_object());

    let tools: Vec<&str> = responses[1]["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    for name in ["pyright_check", "pyright_version", "find_pyright_config"] {
        assert!(tools.contains(&name));
    }

    let cfg = &responses[2]["result"]["structuredContent"];
    assert_eq!(cfg["found"], true);
    assert_eq!(cfg["kind"], "pyproject.toml");

    let check = &responses[3]["result"]["structuredContent"];
    assert_eq!(check["ok"], false);
    assert_eq!(check["exit_code"], 4);

    let ver = &responses[4]["result"]["structuredContent"];
    assert!(ver["version"].is_string());
    assert!(ver["supports_outputjson"].is_boolean());
}
