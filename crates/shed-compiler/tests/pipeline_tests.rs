//! End-to-end pipeline tests: source → tokens → tree → checked tree → JavaScript.
//!
//! Tests verify:
//! - Clean snippets produce text and `success = true`
//! - Every error kind surfaces as a located, described diagnostic
//! - No generated text is returned alongside errors
//! - Snippets can import the bundled library

use shed_codegen::OptimisationLevel;
use shed_compiler::{
    BuiltinProfile, CompilationResult, CompilerOptions, ShedCompiler, Target, SNIPPET_MODULE,
};
use shed_lexer::TokenKind;
use shed_types::{ErrorKind, ReportedError, SourcePosition};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn compile(source: &str) -> CompilationResult {
    ShedCompiler::default()
        .compile_source(source)
        .unwrap_or_else(|e| panic!("internal error compiling {source:?}: {e}"))
}

fn compile_with(source: &str, options: CompilerOptions) -> CompilationResult {
    ShedCompiler::new(options)
        .compile_source(source)
        .unwrap_or_else(|e| panic!("internal error compiling {source:?}: {e}"))
}

fn errors_of_kind(result: &CompilationResult, kind: ErrorKind) -> Vec<&ReportedError> {
    result.errors.iter().filter(|e| e.kind == kind).collect()
}

fn assert_clean(result: &CompilationResult) -> &str {
    assert!(
        result.success,
        "expected success, got errors:\n{}",
        result
            .errors
            .iter()
            .map(|e| format!("  {e}"))
            .collect::<Vec<_>>()
            .join("\n")
    );
    result.javascript.as_deref().unwrap_or_default()
}

fn pos(line: u32, character: u32) -> SourcePosition {
    SourcePosition::new(line, character)
}

// ══════════════════════════════════════════════════════════════════════════════
// Success
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_addition_compiles() {
    let result = compile("let x = 1 + 2");
    assert!(result.errors.is_empty());
    let js = assert_clean(&result);
    assert!(!js.is_empty());
    assert_eq!(
        js,
        "SHED.exportModule(\"snippet\", function() {\n    const x = 1 + 2;\n    return {\n        x: x\n    };\n});\n"
    );
}

#[test]
fn test_program_with_every_declaration_kind() {
    let source = r#"
class Counter(start: Number) {
    var count = start
    fun bump(): Unit {
        count = count + 1
    }
}

fun describe(c: Counter): String {
    if c.count > 10 {
        return "many"
    } else if c.count == 0 {
        return "none"
    }
    return "some"
}

let counter = Counter(3)
let label = describe(counter)
let twice = fun(n: Number): Number => n * 2
"#;
    let js = assert_clean(&compile(source)).to_string();
    assert!(js.contains("function Counter(start)"));
    assert!(js.contains("function describe(c)"));
    assert!(js.contains("const counter = Counter(3);"));
    assert!(js.contains("} else if (c.count === 0) {"));
}

#[test]
fn test_empty_source_compiles() {
    let result = compile("");
    let js = assert_clean(&result);
    assert_eq!(js, "SHED.exportModule(\"snippet\", function() {\n    return {};\n});\n");
    assert_eq!(result.modules.len(), 1);
}

#[test]
fn test_forward_references_resolve() {
    let source = "let y = double(2)\nfun double(n: Number): Number {\n    return n * 2\n}";
    assert_clean(&compile(source));
}

#[test]
fn test_simple_level_output_is_compact() {
    let result = compile_with(
        "let x = 1 + 2",
        CompilerOptions {
            optimisation_level: OptimisationLevel::Simple,
            ..CompilerOptions::default()
        },
    );
    assert_eq!(
        assert_clean(&result),
        "SHED.exportModule(\"snippet\",function(){const x=3;return {x:x};});\n"
    );
}

#[test]
fn test_commonjs_target() {
    let result = compile_with(
        "let x = 1",
        CompilerOptions {
            target: Target::CommonJs,
            ..CompilerOptions::default()
        },
    );
    assert_eq!(
        assert_clean(&result),
        "const x = 1;\nmodule.exports = {\n    x: x\n};\n"
    );
}

#[test]
fn test_script_target_has_no_envelope() {
    let result = compile_with(
        "let x = 1",
        CompilerOptions {
            target: Target::Script,
            ..CompilerOptions::default()
        },
    );
    assert_eq!(assert_clean(&result), "const x = 1;\n");
}

// ══════════════════════════════════════════════════════════════════════════════
// Tokens
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_tokens_reproduce_snippet() {
    let source = "let x = 1 // one\nvar s = \"a\\nb\"";
    let result = compile(source);
    let rebuilt: String = result.tokens.iter().map(|t| t.token.raw.as_str()).collect();
    assert_eq!(rebuilt, source);
    assert_eq!(result.tokens.last().map(|t| t.kind()), Some(TokenKind::End));
}

#[test]
fn test_tokens_returned_on_failure() {
    let result = compile("let x = 1 + \"text\"");
    assert!(!result.success);
    assert!(result.tokens.len() > 1);
}

// ══════════════════════════════════════════════════════════════════════════════
// Errors
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_type_error_at_plus_expression() {
    let result = compile("let x = 1 + \"text\"");
    assert!(errors_of_kind(&result, ErrorKind::Syntax).is_empty());
    let type_errors = errors_of_kind(&result, ErrorKind::Type);
    assert_eq!(type_errors.len(), 1);
    assert_eq!(result.errors.len(), 1);

    let error = type_errors[0];
    assert_eq!(error.module, SNIPPET_MODULE);
    assert_eq!(error.range.start, pos(1, 9));
    assert_eq!(error.range.end, pos(1, 19));
    assert_eq!(
        error.description,
        "Type error: cannot apply '+' to Number and String"
    );
    assert!(!result.success);
    assert!(result.javascript.is_none());
    assert!(result.modules.is_empty());
}

#[test]
fn test_lexical_error_reported_and_blocks_output() {
    let result = compile("let x = 1 # 2");
    assert_eq!(errors_of_kind(&result, ErrorKind::Lexical).len(), 1);
    assert!(result.javascript.is_none());
    assert!(result
        .tokens
        .iter()
        .any(|t| t.kind() == TokenKind::Error));
}

#[test]
fn test_syntax_errors_recover_and_accumulate() {
    let result = compile("let = 1\nlet y = )\nlet z = 3");
    let syntax = errors_of_kind(&result, ErrorKind::Syntax);
    assert_eq!(syntax.len(), 2);
    assert_eq!(syntax[0].range.start.line, 1);
    assert_eq!(syntax[1].range.start.line, 2);
    // Type checking never runs on a tree that failed to parse.
    assert!(errors_of_kind(&result, ErrorKind::Type).is_empty());
    assert!(errors_of_kind(&result, ErrorKind::Name).is_empty());
}

#[test]
fn test_name_errors() {
    let result = compile("let x = y\nlet a = 1\nlet a = 2");
    let names = errors_of_kind(&result, ErrorKind::Name);
    assert_eq!(names.len(), 2);
    // Declarations are bound before any initialiser is checked.
    assert_eq!(names[0].description, "Name error: duplicate name 'a'");
    assert_eq!(names[1].description, "Name error: undefined name 'y'");
}

#[test]
fn test_missing_module() {
    let result = compile("import nonexistent.module\nlet x = 1");
    assert_eq!(result.errors.len(), 1);
    let error = &result.errors[0];
    assert_eq!(error.kind, ErrorKind::ModuleResolution);
    assert!(error.description.contains("nonexistent.module"));
    assert_eq!(error.range.start, pos(1, 1));
    assert!(!result.success);
    assert!(result.javascript.is_none());
}

#[test]
fn test_missing_module_does_not_cascade() {
    let result = compile("import nonexistent.module\nlet x = module.anything + 1");
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].kind, ErrorKind::ModuleResolution);
}

#[test]
fn test_success_iff_no_errors() {
    for source in [
        "let x = 1",
        "let x = 1 + true",
        "let",
        "import a.b",
        "fun f(): Number {\n    print(\"no return\")\n}",
    ] {
        let result = compile(source);
        assert_eq!(result.success, result.errors.is_empty(), "{source:?}");
        assert_eq!(result.success, result.javascript.is_some(), "{source:?}");
    }
}

#[test]
fn test_long_operator_chain_is_a_syntax_error() {
    for n in [1_000, 20_000] {
        let result = compile(&format!("let x = {}", vec!["1"; n].join(" + ")));
        assert_eq!(result.errors.len(), 1, "n = {n}");
        assert_eq!(result.errors[0].kind, ErrorKind::Syntax);
        assert!(result.errors[0]
            .description
            .starts_with("Syntax error: nesting is too deep"));
        assert!(result.javascript.is_none());
    }
}

#[test]
fn test_operator_chain_within_limit_compiles_at_every_level() {
    let source = format!("let x = {}", vec!["1"; 150].join(" + "));
    let none = compile(&source);
    assert!(assert_clean(&none).contains("const x = 1 + 1 + 1"));
    let simple = compile_with(
        &source,
        CompilerOptions {
            optimisation_level: OptimisationLevel::Simple,
            ..CompilerOptions::default()
        },
    );
    assert!(assert_clean(&simple).contains("const x=150;"));
}

#[test]
fn test_long_member_chain_is_a_syntax_error() {
    let result = compile(&format!("let x = numbers{}", ".abs".repeat(5_000)));
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].kind, ErrorKind::Syntax);
}

// ══════════════════════════════════════════════════════════════════════════════
// Bundled library
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_snippet_imports_bundled_library() {
    let result = compile(
        "import shed.core.strings\nlet banner = strings.repeat(\"=\", 3)\nlet padded = strings.padLeft(\"x\", \" \", 4)",
    );
    assert_clean(&result);
    let names: Vec<String> = result.modules.iter().map(|m| m.name.to_string()).collect();
    assert_eq!(
        names,
        vec!["shed.core.numbers", "shed.core.strings", SNIPPET_MODULE]
    );

    let js = result.javascript.as_deref().unwrap_or_default();
    let numbers = js.find("SHED.exportModule(\"shed.core.numbers\"");
    let strings = js.find("SHED.exportModule(\"shed.core.strings\"");
    let snippet = js.find("SHED.exportModule(\"snippet\"");
    assert!(numbers < strings && strings < snippet);
    assert!(js.contains("var strings = SHED.importModule(\"shed.core.strings\");"));
}

#[test]
fn test_bundled_member_types_are_checked() {
    let result = compile("import shed.core.numbers\nlet x: String = numbers.max(1, 2)");
    let type_errors = errors_of_kind(&result, ErrorKind::Type);
    assert_eq!(type_errors.len(), 1);
    assert_eq!(
        type_errors[0].description,
        "Type error: 'x' is declared String but initialised with Number"
    );
}

#[test]
fn test_aliased_import() {
    let result = compile("import shed.core.numbers as n\nlet x = n.clamp(5, 0, 3)");
    let js = assert_clean(&result).to_string();
    assert!(js.contains("var n = SHED.importModule(\"shed.core.numbers\");"));
    assert!(js.contains("const x = n.clamp(5, 0, 3);"));
}

// ══════════════════════════════════════════════════════════════════════════════
// Profiles
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_browser_profile_globals() {
    let source = "fun greet(): Unit {\n    alert(\"hi\")\n    console.log(\"hi\")\n}";
    assert!(!compile(source).success);

    let result = ShedCompiler::for_browser(OptimisationLevel::None)
        .compile_source(source)
        .unwrap();
    let js = assert_clean(&result).to_string();
    assert!(js.contains("window.alert(\"hi\");"));
    assert!(js.contains("console.log(\"hi\");"));
}

#[test]
fn test_profile_option_selects_builtins() {
    let options = CompilerOptions {
        profile: BuiltinProfile::Browser,
        ..CompilerOptions::default()
    };
    let result = compile_with("fun f(): Unit {\n    alert(\"x\")\n}", options);
    assert_clean(&result);
}
