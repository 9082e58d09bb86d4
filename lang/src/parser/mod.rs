//! Syntax analysis for Light programs.
//!
//! Expressions are parsed with Pratt-style precedence climbing, statements
//! and declarations with recursive descent. The parser is resilient: every
//! recoverable error records a diagnostic, resynchronizes at a likely
//! statement boundary, and parsing continues. `parse` always terminates and
//! always returns a `File`.

pub mod ast;

#[cfg(test)]
mod tests;

use crate::diag::Diagnostic;
use crate::lexer::token::{Position, Span, Token, TokenKind};
use ast::*;

// ---- binding power (precedence) levels ----

const BP_NONE: u8 = 0;
const BP_OR: u8 = 10; // ||
const BP_AND: u8 = 20; // &&
const BP_EQUALITY: u8 = 30; // == !=
const BP_COMPARISON: u8 = 40; // < <= > >=
const BP_ADDITIVE: u8 = 50; // + -
const BP_MULTIPLY: u8 = 60; // * / %
const BP_PREFIX: u8 = 70; // ! -
const BP_POSTFIX: u8 = 80; // () [] .

/// Left binding power for an infix or postfix operator.
fn infix_bp(kind: TokenKind) -> u8 {
    match kind {
        TokenKind::OrOr => BP_OR,
        TokenKind::AndAnd => BP_AND,
        TokenKind::EqualEqual | TokenKind::NotEqual => BP_EQUALITY,
        TokenKind::Less | TokenKind::LessEqual | TokenKind::Greater | TokenKind::GreaterEqual => {
            BP_COMPARISON
        }
        TokenKind::Plus | TokenKind::Minus => BP_ADDITIVE,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => BP_MULTIPLY,
        TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::Dot => BP_POSTFIX,
        _ => BP_NONE,
    }
}

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::OrOr => BinaryOp::Or,
        TokenKind::AndAnd => BinaryOp::And,
        TokenKind::EqualEqual => BinaryOp::Eq,
        TokenKind::NotEqual => BinaryOp::NotEq,
        TokenKind::Less => BinaryOp::Less,
        TokenKind::LessEqual => BinaryOp::LessEq,
        TokenKind::Greater => BinaryOp::Greater,
        TokenKind::GreaterEqual => BinaryOp::GreaterEq,
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        _ => return None,
    };
    Some(op)
}

/// Binary operator a compound assignment desugars to.
fn compound_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::PlusEqual => BinaryOp::Add,
        TokenKind::MinusEqual => BinaryOp::Sub,
        TokenKind::StarEqual => BinaryOp::Mul,
        TokenKind::SlashEqual => BinaryOp::Div,
        _ => return None,
    };
    Some(op)
}

/// Parses a token stream into a `File` plus diagnostics.
pub fn parse(tokens: Vec<Token>) -> (File, Vec<Diagnostic>) {
    let mut parser = Parser::new(tokens);
    let file = parser.parse_file();
    (file, parser.diags)
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    diags: Vec<Diagnostic>,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        // The grammar relies on a trailing EOF token; synthesize one for
        // token streams that were not produced by the lexer.
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let pos = tokens
                .last()
                .map(|t| t.span.end)
                .unwrap_or_else(|| Position::new(0, 1, 1));
            tokens.push(Token::new(TokenKind::Eof, "", Span::new(pos, pos)));
        }
        Self {
            tokens,
            pos: 0,
            diags: Vec::new(),
        }
    }

    pub fn parse_file(&mut self) -> File {
        let start = self.peek().span.start;
        let mut body = Vec::new();

        self.skip_sep();
        while !self.is_at_end() {
            let before = self.pos;
            if let Some(stmt) = self.parse_stmt() {
                body.push(stmt);
            }
            self.skip_sep();
            if self.pos == before {
                // The error path consumed nothing; force progress.
                self.advance();
            }
        }

        let end = self.peek().span.end;
        File {
            body,
            span: Span::new(start, end),
        }
    }

    // ---- navigation helpers ----

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn peek_nth_kind(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn is_at_end(&self) -> bool {
        self.peek_kind() == TokenKind::Eof
    }

    /// Consumes the expected token kind, or records E2001 and stays put.
    fn expect(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            return true;
        }
        let tok = self.peek().clone();
        self.error(
            "E2001",
            tok.span,
            format!("expected '{}', got '{}'", kind, tok.kind),
        );
        false
    }

    fn expect_ident(&mut self) -> Option<String> {
        if self.check(TokenKind::Identifier) {
            return Some(self.advance().lexeme);
        }
        let tok = self.peek().clone();
        self.error(
            "E2001",
            tok.span,
            format!("expected '{}', got '{}'", TokenKind::Identifier, tok.kind),
        );
        None
    }

    /// Skips NEWLINE and SEMICOLON separators.
    fn skip_sep(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Semicolon) {
            self.advance();
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    fn prev_end(&self) -> Position {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span.end
        } else {
            self.peek().span.start
        }
    }

    fn span_from(&self, start: Position) -> Span {
        Span::new(start, self.prev_end())
    }

    fn error(&mut self, code: &'static str, span: Span, message: impl Into<String>) {
        self.diags.push(Diagnostic::error(code, span, message));
    }

    // ---- error recovery ----

    /// Skips tokens until a likely statement boundary.
    fn synchronize(&mut self) {
        while !self.is_at_end() {
            if matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Semicolon) {
                self.advance();
                return;
            }
            if self.check(TokenKind::RightBrace) {
                return;
            }
            if matches!(
                self.peek_kind(),
                TokenKind::If
                    | TokenKind::While
                    | TokenKind::For
                    | TokenKind::Function
                    | TokenKind::Class
                    | TokenKind::Var
                    | TokenKind::Const
                    | TokenKind::Return
                    | TokenKind::Break
                    | TokenKind::Continue
                    | TokenKind::Try
                    | TokenKind::Throw
            ) {
                return;
            }
            self.advance();
        }
    }

    // ---- statement parsing ----

    fn parse_stmt(&mut self) -> Option<Stmt> {
        match self.peek_kind() {
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::While => self.parse_while_stmt(),
            TokenKind::For => self.parse_for_stmt(),
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::Break => {
                let span = self.advance().span;
                Some(Stmt::Break { span })
            }
            TokenKind::Continue => {
                let span = self.advance().span;
                Some(Stmt::Continue { span })
            }
            TokenKind::Var | TokenKind::Const => self.parse_var_decl(),
            TokenKind::Try => self.parse_try_stmt(),
            TokenKind::Throw => self.parse_throw_stmt(),
            TokenKind::Function => self.parse_func_decl(),
            TokenKind::Class => self.parse_class_decl(),
            // `interface` and `enum` are contextual keywords: they lex as
            // identifiers and only start a declaration when followed by a name.
            TokenKind::Identifier if self.is_contextual_decl("interface") => {
                self.parse_interface_decl()
            }
            TokenKind::Identifier if self.is_contextual_decl("enum") => self.parse_enum_decl(),
            _ => self.parse_simple_stmt(),
        }
    }

    fn is_contextual_decl(&self, word: &str) -> bool {
        self.peek().lexeme == word && self.peek_nth_kind(1) == TokenKind::Identifier
    }

    /// Parses: if (expr) block { else if (expr) block } [ else block ]
    fn parse_if_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span.start; // 'if'

        if !self.expect(TokenKind::LeftParen) {
            self.synchronize();
            return None;
        }
        let condition = self.parse_expr_required()?;
        self.expect(TokenKind::RightParen);

        let body = self.parse_block();

        let mut else_ifs = Vec::new();
        let mut else_body = None;
        while self.check(TokenKind::Else) {
            self.advance(); // 'else'
            if self.check(TokenKind::If) {
                let else_if_start = self.advance().span.start; // 'if'
                self.expect(TokenKind::LeftParen);
                let condition = self.parse_expr_required()?;
                self.expect(TokenKind::RightParen);
                let body = self.parse_block();
                let span = self.span_from(else_if_start);
                else_ifs.push(ElseIf { condition, body, span });
            } else {
                else_body = Some(self.parse_block());
                break;
            }
        }

        Some(Stmt::If {
            condition,
            body,
            else_ifs,
            else_body,
            span: self.span_from(start),
        })
    }

    /// Parses: while (expr) block
    fn parse_while_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span.start; // 'while'

        if !self.expect(TokenKind::LeftParen) {
            self.synchronize();
            return None;
        }
        let condition = self.parse_expr_required()?;
        self.expect(TokenKind::RightParen);
        let body = self.parse_block();

        Some(Stmt::While {
            condition,
            body,
            span: self.span_from(start),
        })
    }

    /// Parses: return [expr]
    fn parse_return_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span.start; // 'return'

        let mut value = None;
        if !matches!(
            self.peek_kind(),
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::RightBrace | TokenKind::Eof
        ) {
            value = Some(self.parse_expr_required()?);
        }

        Some(Stmt::Return {
            value,
            span: self.span_from(start),
        })
    }

    /// Parses: (var | const) IDENT [ = expr ]
    fn parse_var_decl(&mut self) -> Option<Stmt> {
        let start = self.advance(); // 'var' or 'const'
        let is_const = start.kind == TokenKind::Const;

        let Some(name) = self.expect_ident() else {
            self.synchronize();
            return None;
        };

        let mut init = None;
        if self.check(TokenKind::Equal) {
            self.advance();
            init = Some(self.parse_expr_required()?);
        }

        Some(Stmt::VarDecl {
            name,
            is_const,
            init,
            span: self.span_from(start.span.start),
        })
    }

    /// Parses: try block [ catch [( IDENT )] block ]
    fn parse_try_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span.start; // 'try'
        let body = self.parse_block();

        let mut catch_param = None;
        let mut catch_body = None;
        self.skip_newlines();
        if self.check(TokenKind::Catch) {
            self.advance();
            if self.check(TokenKind::LeftParen) {
                self.advance();
                catch_param = self.expect_ident();
                self.expect(TokenKind::RightParen);
            }
            catch_body = Some(self.parse_block());
        }

        Some(Stmt::Try {
            body,
            catch_param,
            catch_body,
            span: self.span_from(start),
        })
    }

    /// Parses: throw expr
    fn parse_throw_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span.start; // 'throw'
        let value = self.parse_expr_required()?;
        Some(Stmt::Throw {
            value,
            span: self.span_from(start),
        })
    }

    /// Parses an expression statement, assignment, or compound assignment.
    fn parse_simple_stmt(&mut self) -> Option<Stmt> {
        let Some(expr) = self.parse_expr() else {
            let tok = self.peek().clone();
            self.error(
                "E2002",
                tok.span,
                format!("unexpected token: '{}'", tok.lexeme),
            );
            self.synchronize();
            return None;
        };
        let start = expr.span().start;

        // expr = value
        if self.check(TokenKind::Equal) {
            self.advance();
            let value = self.parse_expr_required()?;
            return Some(Stmt::Assign {
                target: expr,
                value,
                span: self.span_from(start),
            });
        }

        // expr op= value, desugared to expr = expr op value
        if let Some(op) = compound_op(self.peek_kind()) {
            self.advance();
            let rhs = self.parse_expr_required()?;
            let value_span = Span::new(start, rhs.span().end);
            let value = Expr::Binary {
                op,
                left: Box::new(expr.clone()),
                right: Box::new(rhs),
                span: value_span,
            };
            return Some(Stmt::Assign {
                target: expr,
                value,
                span: self.span_from(start),
            });
        }

        let span = expr.span();
        Some(Stmt::Expr { expr, span })
    }

    /// Parses: { stmts }
    fn parse_block(&mut self) -> Block {
        let start = self.peek().span.start;
        let mut stmts = Vec::new();

        if !self.expect(TokenKind::LeftBrace) {
            self.synchronize();
            return Block {
                stmts,
                span: self.span_from(start),
            };
        }

        self.skip_sep();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            let before = self.pos;
            if let Some(stmt) = self.parse_stmt() {
                stmts.push(stmt);
            }
            self.skip_sep();
            if self.pos == before {
                self.advance();
            }
        }

        self.expect(TokenKind::RightBrace);
        Block {
            stmts,
            span: self.span_from(start),
        }
    }

    // ---- for loops ----

    /// Dispatches between C-style for and for-of.
    fn parse_for_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span.start; // 'for'

        if !self.expect(TokenKind::LeftParen) {
            self.synchronize();
            return None;
        }
        self.skip_newlines();

        // for (var IDENT of expr): two-token lookahead past 'var'
        if self.check(TokenKind::Var)
            && self.peek_nth_kind(1) == TokenKind::Identifier
            && self.peek_nth_kind(2) == TokenKind::Of
        {
            return self.parse_for_of_body(start);
        }

        self.parse_c_style_for(start)
    }

    /// Parses the rest of: for ( var IDENT of expr ) block
    fn parse_for_of_body(&mut self, start: Position) -> Option<Stmt> {
        self.advance(); // 'var'
        let var_name = self.advance().lexeme; // IDENT
        self.advance(); // 'of'
        self.skip_newlines();

        let iterable = self.parse_expr_required()?;

        self.skip_newlines();
        self.expect(TokenKind::RightParen);
        let body = self.parse_block();

        Some(Stmt::ForOf {
            var_name,
            iterable,
            body,
            span: self.span_from(start),
        })
    }

    /// Parses: for ( [init]; [cond]; [update] ) block
    fn parse_c_style_for(&mut self, start: Position) -> Option<Stmt> {
        let mut init = None;
        self.skip_newlines();
        if !self.check(TokenKind::Semicolon) {
            let parsed = if matches!(self.peek_kind(), TokenKind::Var | TokenKind::Const) {
                self.parse_var_decl()
            } else {
                self.parse_simple_stmt()
            };
            init = parsed.map(Box::new);
        }
        self.expect(TokenKind::Semicolon);

        self.skip_newlines();
        let mut condition = None;
        if !self.check(TokenKind::Semicolon) {
            condition = self.parse_expr();
        }
        self.expect(TokenKind::Semicolon);

        self.skip_newlines();
        let mut update = None;
        if !self.check(TokenKind::RightParen) {
            update = self.parse_simple_stmt().map(Box::new);
        }
        self.expect(TokenKind::RightParen);

        let body = self.parse_block();
        Some(Stmt::For {
            init,
            condition,
            update,
            body,
            span: self.span_from(start),
        })
    }

    // ---- declaration parsing ----

    /// Parses: function IDENT ( params ) block
    fn parse_func_decl(&mut self) -> Option<Stmt> {
        let start = self.advance().span.start; // 'function'

        let Some(name) = self.expect_ident() else {
            self.synchronize();
            return None;
        };

        let params = self.parse_param_list();
        let body = self.parse_block();

        Some(Stmt::Func(FuncDecl {
            name,
            params,
            body,
            span: self.span_from(start),
        }))
    }

    /// Parses: class IDENT [extends IDENT] { constructor / methods }
    fn parse_class_decl(&mut self) -> Option<Stmt> {
        let start = self.advance().span.start; // 'class'

        let Some(name) = self.expect_ident() else {
            self.synchronize();
            return None;
        };

        let mut super_class = None;
        if self.check(TokenKind::Extends) {
            self.advance();
            super_class = self.expect_ident();
        }

        if !self.expect(TokenKind::LeftBrace) {
            self.synchronize();
            return None;
        }

        let mut constructor = None;
        let mut methods = Vec::new();
        self.skip_sep();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            let before = self.pos;
            if self.check(TokenKind::Constructor) {
                constructor = Some(self.parse_constructor_decl());
            } else if self.check(TokenKind::Identifier) {
                methods.push(self.parse_method_decl());
            } else {
                let tok = self.peek().clone();
                self.error(
                    "E2003",
                    tok.span,
                    format!("expected method or constructor, got '{}'", tok.lexeme),
                );
                self.synchronize();
            }
            self.skip_sep();
            if self.pos == before {
                self.advance();
            }
        }

        self.expect(TokenKind::RightBrace);
        Some(Stmt::Class(ClassDecl {
            name,
            super_class,
            constructor,
            methods,
            span: self.span_from(start),
        }))
    }

    fn parse_constructor_decl(&mut self) -> ConstructorDecl {
        let start = self.advance().span.start; // 'constructor'
        let params = self.parse_param_list();
        let body = self.parse_block();
        ConstructorDecl {
            params,
            body,
            span: self.span_from(start),
        }
    }

    fn parse_method_decl(&mut self) -> MethodDecl {
        let name_tok = self.advance(); // method name (IDENT)
        let params = self.parse_param_list();
        let body = self.parse_block();
        MethodDecl {
            name: name_tok.lexeme,
            params,
            body,
            span: self.span_from(name_tok.span.start),
        }
    }

    /// Parses: interface IDENT { sig(params) ... }
    fn parse_interface_decl(&mut self) -> Option<Stmt> {
        let start = self.advance().span.start; // 'interface' (contextual)
        let name = self.advance().lexeme; // IDENT, verified by the caller

        if !self.expect(TokenKind::LeftBrace) {
            self.synchronize();
            return None;
        }

        let mut methods = Vec::new();
        self.skip_sep();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            let before = self.pos;
            if self.check(TokenKind::Identifier) {
                let sig_name = self.advance().lexeme;
                let params = self.parse_param_list();
                methods.push(MethodSig {
                    name: sig_name,
                    param_count: params.len(),
                });
            } else {
                let tok = self.peek().clone();
                self.error(
                    "E2003",
                    tok.span,
                    format!("expected method signature, got '{}'", tok.lexeme),
                );
                self.synchronize();
            }
            self.skip_sep();
            if self.pos == before {
                self.advance();
            }
        }

        self.expect(TokenKind::RightBrace);
        Some(Stmt::Interface(InterfaceDecl {
            name,
            methods,
            span: self.span_from(start),
        }))
    }

    /// Parses: enum IDENT { Variant, ... }
    fn parse_enum_decl(&mut self) -> Option<Stmt> {
        let start = self.advance().span.start; // 'enum' (contextual)
        let name = self.advance().lexeme; // IDENT, verified by the caller

        if !self.expect(TokenKind::LeftBrace) {
            self.synchronize();
            return None;
        }

        let mut variants = Vec::new();
        self.skip_sep();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            let before = self.pos;
            if let Some(variant) = self.expect_ident() {
                variants.push(variant);
            } else {
                self.synchronize();
            }
            if self.check(TokenKind::Comma) {
                self.advance();
            }
            self.skip_sep();
            if self.pos == before {
                self.advance();
            }
        }

        self.expect(TokenKind::RightBrace);
        Some(Stmt::Enum(EnumDecl {
            name,
            variants,
            span: self.span_from(start),
        }))
    }

    /// Parses: ( ident, ident, ... )
    fn parse_param_list(&mut self) -> Vec<String> {
        let mut params = Vec::new();

        if !self.expect(TokenKind::LeftParen) {
            return params;
        }

        if !self.check(TokenKind::RightParen) {
            if let Some(name) = self.expect_ident() {
                params.push(name);
            }
            while self.check(TokenKind::Comma) {
                self.advance();
                self.skip_newlines();
                if let Some(name) = self.expect_ident() {
                    params.push(name);
                }
            }
        }

        self.expect(TokenKind::RightParen);
        params
    }

    // ---- expression parsing (Pratt / precedence climbing) ----

    /// Parses a full expression, including the ternary form which sits above
    /// the Pratt ladder and associates to the right.
    fn parse_expr(&mut self) -> Option<Expr> {
        let expr = self.parse_expr_bp(BP_NONE)?;

        if self.check(TokenKind::Question) {
            self.advance();
            self.skip_newlines();
            let then = self.parse_expr()?;
            self.skip_newlines();
            self.expect(TokenKind::Colon);
            self.skip_newlines();
            let otherwise = self.parse_expr()?;
            let span = Span::new(expr.span().start, otherwise.span().end);
            return Some(Expr::Ternary {
                condition: Box::new(expr),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
                span,
            });
        }

        Some(expr)
    }

    /// Statement-level expression entry: on failure records E2002 and
    /// resynchronizes.
    fn parse_expr_required(&mut self) -> Option<Expr> {
        match self.parse_expr() {
            Some(expr) => Some(expr),
            None => {
                let tok = self.peek().clone();
                self.error(
                    "E2002",
                    tok.span,
                    format!("unexpected token: '{}'", tok.lexeme),
                );
                self.synchronize();
                None
            }
        }
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Option<Expr> {
        let mut left = self.nud()?;

        loop {
            let bp = infix_bp(self.peek_kind());
            if bp <= min_bp {
                break;
            }
            left = self.led(left)?;
        }

        Some(left)
    }

    /// Null denotation: literals, identifiers, prefix operators, grouping,
    /// and the composite literal forms.
    fn nud(&mut self) -> Option<Expr> {
        let tok = self.peek().clone();

        match tok.kind {
            TokenKind::Integer => {
                self.advance();
                // Out-of-range literals clamp rather than fail the parse.
                let value = tok.lexeme.parse::<i64>().unwrap_or(i64::MAX);
                Some(Expr::Integer { value, span: tok.span })
            }
            TokenKind::Float => {
                self.advance();
                let value = tok.lexeme.parse::<f64>().unwrap_or_default();
                Some(Expr::Float { value, span: tok.span })
            }
            TokenKind::String => {
                self.advance();
                Some(Expr::String {
                    value: tok.lexeme,
                    span: tok.span,
                })
            }
            TokenKind::True => {
                self.advance();
                Some(Expr::Boolean { value: true, span: tok.span })
            }
            TokenKind::False => {
                self.advance();
                Some(Expr::Boolean { value: false, span: tok.span })
            }
            TokenKind::Null => {
                self.advance();
                Some(Expr::Null { span: tok.span })
            }
            TokenKind::This => {
                self.advance();
                Some(Expr::This { span: tok.span })
            }
            TokenKind::Super => {
                self.advance();
                Some(Expr::Super { span: tok.span })
            }
            TokenKind::Identifier => {
                if self.peek_nth_kind(1) == TokenKind::Arrow {
                    return self.parse_single_param_arrow();
                }
                self.advance();
                Some(Expr::Identifier {
                    name: tok.lexeme,
                    span: tok.span,
                })
            }
            TokenKind::LeftParen => {
                if self.is_arrow_params() {
                    return self.parse_paren_arrow();
                }
                // Grouped expression: ( expr )
                self.advance();
                self.skip_newlines();
                let expr = self.parse_expr()?;
                self.skip_newlines();
                self.expect(TokenKind::RightParen);
                Some(expr)
            }
            TokenKind::Bang => {
                self.advance();
                self.skip_newlines();
                let operand = self.parse_expr_bp(BP_PREFIX)?;
                let span = Span::new(tok.span.start, operand.span().end);
                Some(Expr::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                    span,
                })
            }
            TokenKind::Minus => {
                self.advance();
                self.skip_newlines();
                let operand = self.parse_expr_bp(BP_PREFIX)?;
                let span = Span::new(tok.span.start, operand.span().end);
                Some(Expr::Unary {
                    op: UnaryOp::Negate,
                    operand: Box::new(operand),
                    span,
                })
            }
            TokenKind::New => self.parse_new_expr(),
            TokenKind::Function => self.parse_func_expr(),
            TokenKind::LeftBracket => self.parse_array_literal(),
            TokenKind::LeftBrace => self.parse_map_literal(),
            TokenKind::TemplateLiteral => {
                self.advance();
                Some(Expr::Template {
                    parts: vec![tok.lexeme],
                    exprs: Vec::new(),
                    span: tok.span,
                })
            }
            TokenKind::TemplateHead => self.parse_template(),
            _ => None,
        }
    }

    /// Left denotation: infix operators, calls, indexing, member access.
    fn led(&mut self, left: Expr) -> Option<Expr> {
        let tok = self.peek().clone();

        match tok.kind {
            TokenKind::LeftParen => self.parse_call_expr(left),
            TokenKind::LeftBracket => {
                self.advance();
                self.skip_newlines();
                let index = self.parse_expr()?;
                self.skip_newlines();
                self.expect(TokenKind::RightBracket);
                let span = self.span_from(left.span().start);
                Some(Expr::Index {
                    object: Box::new(left),
                    index: Box::new(index),
                    span,
                })
            }
            TokenKind::Dot => {
                self.advance();
                self.skip_newlines();
                let property = self.expect_ident()?;
                let span = self.span_from(left.span().start);
                Some(Expr::Member {
                    object: Box::new(left),
                    property,
                    span,
                })
            }
            _ => {
                let op = binary_op(tok.kind)?;
                let bp = infix_bp(tok.kind);
                self.advance();
                self.skip_newlines(); // allow continuation after the operator
                let right = self.parse_expr_bp(bp)?;
                let span = Span::new(left.span().start, right.span().end);
                Some(Expr::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                    span,
                })
            }
        }
    }

    /// Parses: callee ( args )
    fn parse_call_expr(&mut self, callee: Expr) -> Option<Expr> {
        self.advance(); // '('
        let args = self.parse_call_args()?;
        let span = self.span_from(callee.span().start);
        Some(Expr::Call {
            callee: Box::new(callee),
            args,
            span,
        })
    }

    fn parse_call_args(&mut self) -> Option<Vec<Expr>> {
        let mut args = Vec::new();

        self.skip_newlines();
        if !self.check(TokenKind::RightParen) {
            args.push(self.parse_expr()?);
            while self.check(TokenKind::Comma) {
                self.advance();
                self.skip_newlines();
                args.push(self.parse_expr()?);
            }
        }
        self.skip_newlines();
        self.expect(TokenKind::RightParen);

        Some(args)
    }

    /// Parses: new ClassName ( args )
    fn parse_new_expr(&mut self) -> Option<Expr> {
        let start = self.advance().span.start; // 'new'

        let class_name = self.expect_ident()?;

        let mut args = Vec::new();
        if self.expect(TokenKind::LeftParen) {
            args = self.parse_call_args()?;
        }

        Some(Expr::New {
            class_name,
            args,
            span: self.span_from(start),
        })
    }

    /// Parses: function [name] ( params ) block
    fn parse_func_expr(&mut self) -> Option<Expr> {
        let start = self.advance().span.start; // 'function'

        let mut name = None;
        if self.check(TokenKind::Identifier) {
            name = Some(self.advance().lexeme);
        }

        let params = self.parse_param_list();
        let body = self.parse_block();

        Some(Expr::Function {
            name,
            params,
            body,
            span: self.span_from(start),
        })
    }

    /// Parses: [ expr, expr, ... ]
    fn parse_array_literal(&mut self) -> Option<Expr> {
        let start = self.advance().span.start; // '['
        let mut elements = Vec::new();

        self.skip_newlines();
        if !self.check(TokenKind::RightBracket) {
            elements.push(self.parse_expr()?);
            while self.check(TokenKind::Comma) {
                self.advance();
                self.skip_newlines();
                if self.check(TokenKind::RightBracket) {
                    break; // trailing comma
                }
                elements.push(self.parse_expr()?);
            }
        }
        self.skip_newlines();
        self.expect(TokenKind::RightBracket);

        Some(Expr::Array {
            elements,
            span: self.span_from(start),
        })
    }

    /// Parses: { key: expr, ... } with identifier or string keys.
    fn parse_map_literal(&mut self) -> Option<Expr> {
        let start = self.advance().span.start; // '{'
        let mut entries = Vec::new();

        self.skip_newlines();
        if !self.check(TokenKind::RightBrace) {
            loop {
                let key = match self.peek_kind() {
                    TokenKind::Identifier | TokenKind::String => self.advance().lexeme,
                    _ => {
                        let tok = self.peek().clone();
                        self.error(
                            "E2001",
                            tok.span,
                            format!("expected map key, got '{}'", tok.kind),
                        );
                        return None;
                    }
                };
                self.expect(TokenKind::Colon);
                self.skip_newlines();
                let value = self.parse_expr()?;
                entries.push((key, value));

                self.skip_newlines();
                if self.check(TokenKind::Comma) {
                    self.advance();
                    self.skip_newlines();
                    if self.check(TokenKind::RightBrace) {
                        break; // trailing comma
                    }
                    continue;
                }
                break;
            }
        }
        self.skip_newlines();
        self.expect(TokenKind::RightBrace);

        Some(Expr::Map {
            entries,
            span: self.span_from(start),
        })
    }

    /// Reassembles a template literal from HEAD, embedded expressions, and
    /// MIDDLE/TAIL text parts.
    fn parse_template(&mut self) -> Option<Expr> {
        let head = self.advance(); // TEMPLATE_HEAD
        let start = head.span.start;
        let mut parts = vec![head.lexeme];
        let mut exprs = Vec::new();

        loop {
            exprs.push(self.parse_expr()?);
            match self.peek_kind() {
                TokenKind::TemplateMiddle => {
                    parts.push(self.advance().lexeme);
                }
                TokenKind::TemplateTail => {
                    parts.push(self.advance().lexeme);
                    break;
                }
                _ => {
                    let tok = self.peek().clone();
                    self.error(
                        "E2001",
                        tok.span,
                        format!("expected '{}', got '{}'", TokenKind::TemplateTail, tok.kind),
                    );
                    return None;
                }
            }
        }

        Some(Expr::Template {
            parts,
            exprs,
            span: self.span_from(start),
        })
    }

    // ---- arrow functions ----

    /// Lookahead from a `(`: true when the tokens form a parameter list
    /// followed by `=>`.
    fn is_arrow_params(&self) -> bool {
        let mut idx = self.pos + 1;
        while let Some(tok) = self.tokens.get(idx) {
            match tok.kind {
                TokenKind::Identifier | TokenKind::Comma | TokenKind::Newline => idx += 1,
                TokenKind::RightParen => {
                    return self
                        .tokens
                        .get(idx + 1)
                        .is_some_and(|t| t.kind == TokenKind::Arrow);
                }
                _ => return false,
            }
        }
        false
    }

    /// Parses: IDENT => expr-or-block
    fn parse_single_param_arrow(&mut self) -> Option<Expr> {
        let param = self.advance(); // IDENT
        self.advance(); // '=>'
        self.parse_arrow_body(vec![param.lexeme], param.span.start)
    }

    /// Parses: ( idents ) => expr-or-block
    fn parse_paren_arrow(&mut self) -> Option<Expr> {
        let start = self.advance().span.start; // '('
        let mut params = Vec::new();

        self.skip_newlines();
        if !self.check(TokenKind::RightParen) {
            if let Some(name) = self.expect_ident() {
                params.push(name);
            }
            while self.check(TokenKind::Comma) {
                self.advance();
                self.skip_newlines();
                if let Some(name) = self.expect_ident() {
                    params.push(name);
                }
            }
        }
        self.skip_newlines();
        self.expect(TokenKind::RightParen);
        self.expect(TokenKind::Arrow);

        self.parse_arrow_body(params, start)
    }

    /// An expression body desugars to a block that returns the expression.
    fn parse_arrow_body(&mut self, params: Vec<String>, start: Position) -> Option<Expr> {
        self.skip_newlines();
        let body = if self.check(TokenKind::LeftBrace) {
            self.parse_block()
        } else {
            let expr = self.parse_expr()?;
            let span = expr.span();
            Block {
                stmts: vec![Stmt::Return {
                    value: Some(expr),
                    span,
                }],
                span,
            }
        };

        Some(Expr::Function {
            name: None,
            params,
            body,
            span: self.span_from(start),
        })
    }
}
