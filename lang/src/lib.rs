//! Core library for the Light scripting language.
//!
//! Light is a small dynamically-typed scripting language with a classic
//! three-stage toolchain: [`lexer`] turns source text into tokens,
//! [`parser`] turns tokens into an AST, and [`runtime`] walks the AST
//! against lexically-scoped environments.
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use light_lang::lexer::lex;
//! use light_lang::parser::parse;
//! use light_lang::runtime::Interpreter;
//!
//! let (tokens, lex_diags) = lex("print(1 + 2 * 3)");
//! assert!(lex_diags.is_empty());
//! let (file, parse_diags) = parse(tokens);
//! assert!(parse_diags.is_empty());
//!
//! let buf = Rc::new(RefCell::new(Vec::<u8>::new()));
//! let interpreter = Interpreter::new(buf.clone());
//! interpreter.run(&file).unwrap();
//! assert_eq!(String::from_utf8_lossy(&buf.borrow()), "7\n");
//! ```

pub mod diag;
pub mod lexer;
pub mod parser;
pub mod runtime;
