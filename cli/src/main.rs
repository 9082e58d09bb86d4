//! Light CLI.
//!
//! Usage:
//!   light run <SCRIPT>              Run a source file
//!   light tokens <SCRIPT> [--json]  Tokenize and print tokens
//!   light parse <SCRIPT>            Parse and print the AST as JSON
//!
//! Exit codes: 0 on clean completion, 1 on lex/parse diagnostics or a
//! runtime/thrown error. Program output goes to stdout; diagnostics and
//! errors to stderr.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;

use clap::{Parser, Subcommand};

use light_lang::lexer::lex;
use light_lang::parser::parse;
use light_lang::runtime::{Interpreter, Output};

mod output;

/// The Light language toolchain
#[derive(Parser, Debug)]
#[command(name = "light")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a source file
    Run {
        /// The script file to run
        script: PathBuf,
    },
    /// Tokenize a source file and print the tokens
    Tokens {
        /// The script file to tokenize
        script: PathBuf,
        /// Emit tokens and diagnostics as JSON
        #[arg(long)]
        json: bool,
    },
    /// Parse a source file and print the AST as JSON
    Parse {
        /// The script file to parse
        script: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Command::Run { script } => cmd_run(&script),
        Command::Tokens { script, json } => cmd_tokens(&script, json),
        Command::Parse { script } => cmd_parse(&script),
    }
}

fn read_source(path: &Path) -> Result<String, ExitCode> {
    std::fs::read_to_string(path).map_err(|err| {
        eprintln!("error: cannot read file {}: {}", path.display(), err);
        ExitCode::from(1)
    })
}

fn cmd_run(script: &Path) -> ExitCode {
    let source = match read_source(script) {
        Ok(source) => source,
        Err(code) => return code,
    };

    let (tokens, lex_diags) = lex(&source);
    if !lex_diags.is_empty() {
        output::print_diagnostics(&lex_diags);
        return ExitCode::from(1);
    }

    let (file, parse_diags) = parse(tokens);
    if !parse_diags.is_empty() {
        output::print_diagnostics(&parse_diags);
        return ExitCode::from(1);
    }

    let stdout: Output = Rc::new(RefCell::new(std::io::stdout()));
    let interpreter = Interpreter::new(stdout);
    if let Err(err) = interpreter.run(&file) {
        eprintln!("{}", err);
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

fn cmd_tokens(script: &Path, json: bool) -> ExitCode {
    let source = match read_source(script) {
        Ok(source) => source,
        Err(code) => return code,
    };

    let (tokens, diags) = lex(&source);

    if json {
        println!("{}", output::tokens_json(&tokens, &diags));
    } else {
        output::print_tokens_text(&tokens);
        output::print_diagnostics(&diags);
    }

    if diags.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn cmd_parse(script: &Path) -> ExitCode {
    let source = match read_source(script) {
        Ok(source) => source,
        Err(code) => return code,
    };

    let (tokens, lex_diags) = lex(&source);
    let (file, parse_diags) = parse(tokens);

    let mut diags = lex_diags;
    diags.extend(parse_diags);

    println!("{}", output::ast_json(&file, &diags));

    if diags.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_args_run() {
        let cli = Cli::try_parse_from(["light", "run", "script.lt"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Run { ref script } if script == &PathBuf::from("script.lt")
        ));
    }

    #[test]
    fn parse_args_tokens_with_json() {
        let cli = Cli::try_parse_from(["light", "tokens", "script.lt", "--json"]).unwrap();
        assert!(matches!(cli.command, Command::Tokens { json: true, .. }));
    }

    #[test]
    fn parse_args_tokens_without_json() {
        let cli = Cli::try_parse_from(["light", "tokens", "script.lt"]).unwrap();
        assert!(matches!(cli.command, Command::Tokens { json: false, .. }));
    }

    #[test]
    fn parse_args_parse() {
        let cli = Cli::try_parse_from(["light", "parse", "script.lt"]).unwrap();
        assert!(matches!(cli.command, Command::Parse { .. }));
    }

    #[test]
    fn missing_subcommand_is_an_error() {
        assert!(Cli::try_parse_from(["light"]).is_err());
    }
}
