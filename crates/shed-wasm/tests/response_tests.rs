//! Wire-format tests for the browser facade.

use serde_json::{json, Value};
use shed_types::{ErrorKind, ReportedError, SourcePosition, SourceRange};
use shed_wasm::{compile_json, compile_request, ErrorDto, RequestError};

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn compile_value(source: &str, level: Option<&str>) -> Value {
    serde_json::from_str(&compile_json(source, level)).expect("response is JSON")
}

// ─── Tokens ───────────────────────────────────────────────────────────────────

#[test]
fn test_token_shape() {
    let response = compile_value("let x = \"a\\tb\"", None);
    let tokens = response["tokens"].as_array().unwrap();
    assert_eq!(
        tokens[0],
        json!({
            "position": { "line": 1, "character": 1 },
            "value": "let",
            "rawText": "let",
            "kind": "keyword"
        })
    );
    // Trivia is included and has no value.
    assert_eq!(tokens[1]["kind"], "whitespace");
    assert_eq!(tokens[1]["value"], "");

    let string = tokens.iter().find(|t| t["kind"] == "string").unwrap();
    assert_eq!(string["rawText"], "\"a\\tb\"");
    assert_eq!(string["value"], "a\tb");
    assert_eq!(string["position"], json!({ "line": 1, "character": 9 }));

    assert_eq!(tokens.last().unwrap()["kind"], "end");
}

// ─── Results ──────────────────────────────────────────────────────────────────

#[test]
fn test_success_response() {
    let response = compile_value("let x = 1 + 2", None);
    assert_eq!(response["success"], true);
    assert_eq!(response["errors"], json!([]));
    let js = response["javascript"].as_str().unwrap();
    assert!(js.starts_with("SHED.exportModule(\"snippet\", function() {"));
}

#[test]
fn test_error_response() {
    let response = compile_value("let x = 1 + \"text\"", None);
    assert_eq!(response["success"], false);
    assert!(response.get("javascript").is_none());
    assert_eq!(
        response["errors"],
        json!([{
            "module": "snippet",
            "description": "Type error: cannot apply '+' to Number and String",
            "start": { "line": 1, "character": 9 },
            "end": { "line": 1, "character": 19 }
        }])
    );
}

#[test]
fn test_errors_name_their_module() {
    let response = compile_value("import shed.core.numbers\nlet x = numbers.biggest(1, 2)", None);
    assert_eq!(response["errors"][0]["module"], "snippet");
    assert_eq!(
        response["errors"][0]["description"],
        "Type error: type shed.core.numbers has no member 'biggest'"
    );

    let dependency = ReportedError {
        kind: ErrorKind::Type,
        module: "app.util".into(),
        description: "Type error: cannot apply '+' to Number and String".into(),
        range: SourceRange::new(SourcePosition::new(3, 5), SourcePosition::new(3, 12)),
    };
    assert_eq!(
        serde_json::to_value(ErrorDto::from(&dependency)).unwrap(),
        json!({
            "module": "app.util",
            "description": "Type error: cannot apply '+' to Number and String",
            "start": { "line": 3, "character": 5 },
            "end": { "line": 3, "character": 12 }
        })
    );
}

#[test]
fn test_browser_profile_is_used() {
    let response = compile_value("fun hello(): Unit {\n    alert(\"hi\")\n}", None);
    assert_eq!(response["success"], true);
    assert!(response["javascript"]
        .as_str()
        .unwrap()
        .contains("window.alert(\"hi\");"));
}

// ─── Optimisation level ───────────────────────────────────────────────────────

#[test]
fn test_level_selects_rendering() {
    let none = compile_value("let x = 1 + 2", Some("NONE"));
    let simple = compile_value("let x = 1 + 2", Some("simple"));
    assert!(none["javascript"].as_str().unwrap().contains("const x = 1 + 2;"));
    assert!(simple["javascript"].as_str().unwrap().contains("const x=3;"));
    assert_eq!(compile_value("let x = 1 + 2", None), none);
}

#[test]
fn test_unknown_level_is_rejected() {
    let response = compile_value("let x = 1", Some("FAST"));
    assert_eq!(
        response,
        json!({ "error": "unknown optimisation level 'FAST' (expected NONE or SIMPLE)" })
    );
    assert!(matches!(
        compile_request("let x = 1", Some("")),
        Err(RequestError::Level(_))
    ));
}

#[test]
fn test_responses_deterministic() {
    let first = compile_json("import shed.core.strings\nlet s = strings.concat(\"a\", \"b\")", Some("SIMPLE"));
    for i in 0..100 {
        let again = compile_json("import shed.core.strings\nlet s = strings.concat(\"a\", \"b\")", Some("SIMPLE"));
        assert_eq!(first, again, "response differs on iteration {i}");
    }
}
