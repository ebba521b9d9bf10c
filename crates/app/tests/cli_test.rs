//! End-to-end tests of the `courier` binary.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::process::{Command, Output};
use std::thread;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tempfile::TempDir;

fn courier(data_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_courier"))
        .arg("--data-dir")
        .arg(data_dir)
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("run courier")
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn write_json(dir: &Path, name: &str, value: &Value) -> String {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
    path.to_str().unwrap().to_string()
}

/// Answers one request with `body` and returns the request head it saw.
fn serve_once(body: &'static str) -> (String, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream);
        let mut head = String::new();
        let mut content_length = 0;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                content_length = value.trim().parse().unwrap();
            }
            if line == "\r\n" {
                break;
            }
            head.push_str(&line);
        }
        let mut request_body = vec![0; content_length];
        reader.read_exact(&mut request_body).unwrap();

        let mut stream = reader.into_inner();
        write!(
            stream,
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        )
        .unwrap();
        head
    });
    (base, handle)
}

#[test]
fn test_languages_lists_every_generator() {
    let data = TempDir::new().unwrap();
    let output = courier(data.path(), &["languages"]);

    assert!(output.status.success());
    let ids: Vec<String> = stdout(&output)
        .lines()
        .map(|line| line.split_whitespace().next().unwrap().to_string())
        .collect();
    assert_eq!(ids.len(), 8);
    for id in ["curl", "python", "javascript", "go", "rust", "java", "ruby", "php"] {
        assert!(ids.iter().any(|i| i == id), "missing {id}");
    }
}

#[test]
fn test_codegen_prints_snippet() {
    let data = TempDir::new().unwrap();
    let request = write_json(
        data.path(),
        "request.json",
        &json!({
            "id": "r-1",
            "name": "Create user",
            "url": "https://api.test/users",
            "type": "http",
            "method": "POST",
            "headers": [{"key": "Accept", "value": "application/json"}],
            "body": {"kind": "json", "content": "{\"name\": \"Ada\"}"}
        }),
    );

    let first = courier(data.path(), &["codegen", &request, "--lang", "curl"]);
    let second = courier(data.path(), &["codegen", &request, "--lang", "curl"]);

    assert!(first.status.success());
    let snippet = stdout(&first);
    assert!(snippet.contains("https://api.test/users"));
    assert!(snippet.contains("Accept: application/json"));
    assert_eq!(snippet, stdout(&second));

    let unknown = courier(data.path(), &["codegen", &request, "--lang", "cobol"]);
    assert!(!unknown.status.success());
}

#[test]
fn test_import_then_export_postman() {
    let data = TempDir::new().unwrap();
    let postman = write_json(
        data.path(),
        "petstore.postman.json",
        &json!({
            "info": {
                "_postman_id": "petstore",
                "name": "Petstore",
                "schema": "https://schema.getpostman.com/json/collection/v2.1.0/collection.json"
            },
            "item": [
                {"name": "List pets", "request": {"method": "GET", "url": "https://pets.test/pets"}},
                {"name": "Broken", "request": {"method": 7}}
            ],
            "variable": [{"key": "base", "value": "https://pets.test"}]
        }),
    );
    let native = data.path().join("petstore.courier.json");

    let imported = courier(
        data.path(),
        &["import", &postman, "--out", native.to_str().unwrap()],
    );

    assert!(imported.status.success());
    let text = stdout(&imported);
    assert!(text.contains("imported 'Petstore' as petstore (1 requests)"));
    assert!(text.contains("Petstore/Broken"));
    let envelope: Value = serde_json::from_slice(&std::fs::read(&native).unwrap()).unwrap();
    assert_eq!(envelope["format"], json!("courier.collection"));
    assert_eq!(envelope["version"], json!(1));
    assert!(data.path().join("collections/petstore.json").exists());

    let out = data.path().join("exported.json");
    let exported = courier(
        data.path(),
        &["export", "petstore", "--out", out.to_str().unwrap()],
    );

    assert!(exported.status.success());
    let document: Value = serde_json::from_slice(&std::fs::read(&out).unwrap()).unwrap();
    assert_eq!(document["info"]["name"], json!("Petstore"));
    assert_eq!(document["item"][0]["request"]["method"], json!("GET"));
    assert_eq!(document["variable"][0]["key"], json!("base"));
}

#[test]
fn test_import_rejects_unknown_format() {
    let data = TempDir::new().unwrap();
    let file = write_json(data.path(), "other.json", &json!({"hello": "world"}));

    let output = courier(data.path(), &["import", &file]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("pass --format"));
}

#[test]
fn test_export_unknown_collection_fails() {
    let data = TempDir::new().unwrap();
    let out = data.path().join("out.json");
    let output = courier(data.path(), &["export", "missing", "--out", out.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(!out.exists());
}

#[test]
fn test_send_resolves_runs_scripts_and_records_history() {
    let data = TempDir::new().unwrap();
    let (base, server) = serve_once(r#"{"id": 7}"#);
    let request = write_json(
        data.path(),
        "request.json",
        &json!({
            "id": "r-1",
            "name": "Get user",
            "url": "{{base}}/users/{{user}}",
            "type": "http",
            "method": "GET",
            "headers": [{"key": "X-Trace", "value": "{{trace}}"}],
            "pre_request_script": "set(\"user\", \"7\")\nlog(\"fetching {{user}}\")",
            "test_script": "test(\"status is 200\", \"{{$status}} == 200\")\ntest(\"id\", \"{{$json.id}} == 7\")"
        }),
    );
    let env = write_json(
        data.path(),
        "dev.json",
        &json!({"id": "e-1", "name": "dev", "variables": {"base": {"value": base}}}),
    );

    let output = courier(data.path(), &["send", &request, "--env", &env]);
    let head = server.join().unwrap();

    let text = stdout(&output);
    assert!(output.status.success(), "{text}");
    assert!(head.starts_with("GET /users/7 HTTP/1.1\r\n"), "{head}");
    assert!(head.contains("x-trace: {{trace}}"), "{head}");
    assert!(text.contains("warning: variable 'trace' not found"));
    assert!(text.contains("[pre-request] fetching 7"));
    assert!(text.contains("200 OK"));
    assert!(text.contains("PASS status is 200"));
    assert!(text.contains("2 passed, 0 failed"));

    let history: Value =
        serde_json::from_slice(&std::fs::read(data.path().join("history.json")).unwrap()).unwrap();
    assert_eq!(history["entries"].as_array().unwrap().len(), 1);
}

#[test]
fn test_send_connection_failure_exits_nonzero() {
    let data = TempDir::new().unwrap();
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let request = write_json(
        data.path(),
        "request.json",
        &json!({
            "id": "r-1",
            "name": "Down",
            "url": format!("http://127.0.0.1:{port}/"),
            "type": "http",
            "test_script": "log(\"never\")"
        }),
    );

    let output = courier(data.path(), &["send", &request]);

    let text = stdout(&output);
    assert!(!output.status.success());
    assert!(text.contains("error:"), "{text}");
    assert!(!text.contains("never"));
    assert!(!data.path().join("history.json").exists());
}
