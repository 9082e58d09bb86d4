//! Text and JSON rendering of tokens and diagnostics.

use light_lang::diag::Diagnostic;
use light_lang::lexer::Token;
use light_lang::parser::ast::File;
use serde_json::json;

pub fn print_diagnostics(diags: &[Diagnostic]) {
    for diag in diags {
        eprintln!("{}", diag);
    }
}

pub fn print_tokens_text(tokens: &[Token]) {
    for tok in tokens {
        println!(
            "{:<12} {:<20} {}:{}",
            tok.kind.to_string(),
            tok.lexeme,
            tok.span.start.line,
            tok.span.start.column
        );
    }
}

/// Flat JSON form of a diagnostic: code, severity, message, line, column,
/// offset, and an optional hint.
pub fn diagnostic_json(diag: &Diagnostic) -> serde_json::Value {
    let mut value = json!({
        "code": diag.code,
        "severity": diag.severity.to_string(),
        "message": diag.message,
        "line": diag.span.start.line,
        "column": diag.span.start.column,
        "offset": diag.span.start.offset,
    });
    if let Some(hint) = &diag.hint {
        value["hint"] = json!(hint);
    }
    value
}

pub fn tokens_json(tokens: &[Token], diags: &[Diagnostic]) -> String {
    let value = json!({
        "tokens": tokens
            .iter()
            .map(|tok| json!({
                "kind": tok.kind.to_string(),
                "lexeme": tok.lexeme,
                "line": tok.span.start.line,
                "column": tok.span.start.column,
                "offset": tok.span.start.offset,
            }))
            .collect::<Vec<_>>(),
        "diagnostics": diags.iter().map(diagnostic_json).collect::<Vec<_>>(),
    });
    serde_json::to_string_pretty(&value).unwrap_or_default()
}

pub fn ast_json(file: &File, diags: &[Diagnostic]) -> String {
    let value = json!({
        "ast": file,
        "diagnostics": diags.iter().map(diagnostic_json).collect::<Vec<_>>(),
    });
    serde_json::to_string_pretty(&value).unwrap_or_default()
}
