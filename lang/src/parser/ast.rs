//! Abstract syntax tree for Light programs.
//!
//! Every node carries the `Span` of the source text it covers. The node set
//! is closed: expressions, statements, and declarations are plain enums and
//! the interpreter matches on them exhaustively.

use serde::Serialize;

use crate::lexer::token::Span;

/// The root of a parsed source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct File {
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Not,    // !
    Negate, // -
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOp::Not => f.write_str("!"),
            UnaryOp::Negate => f.write_str("-"),
        }
    }
}

/// Infix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Or,       // ||
    And,      // &&
    Eq,       // ==
    NotEq,    // !=
    Less,     // <
    LessEq,   // <=
    Greater,  // >
    GreaterEq,// >=
    Add,      // +
    Sub,      // -
    Mul,      // *
    Div,      // /
    Mod,      // %
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEq => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEq => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        };
        f.write_str(s)
    }
}

/// Expression nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    Integer {
        value: i64,
        span: Span,
    },
    Float {
        value: f64,
        span: Span,
    },
    String {
        value: String,
        span: Span,
    },
    Boolean {
        value: bool,
        span: Span,
    },
    Null {
        span: Span,
    },
    This {
        span: Span,
    },
    Super {
        span: Span,
    },
    Identifier {
        name: String,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    Ternary {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
        span: Span,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        span: Span,
    },
    Member {
        object: Box<Expr>,
        property: String,
        span: Span,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
    New {
        class_name: String,
        args: Vec<Expr>,
        span: Span,
    },
    Array {
        elements: Vec<Expr>,
        span: Span,
    },
    /// Map literal. Keys are string literals in source (bare identifiers are
    /// shorthand for their string form); duplicates keep the first position
    /// and the interpreter lets the last value win.
    Map {
        entries: Vec<(String, Expr)>,
        span: Span,
    },
    /// Function expression, including arrow functions (which desugar to a
    /// body block returning the expression).
    Function {
        name: Option<String>,
        params: Vec<String>,
        body: Block,
        span: Span,
    },
    /// Template literal: `parts.len() == exprs.len() + 1`, a text part before
    /// each embedded expression and a trailing part after the last.
    Template {
        parts: Vec<String>,
        exprs: Vec<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Integer { span, .. }
            | Expr::Float { span, .. }
            | Expr::String { span, .. }
            | Expr::Boolean { span, .. }
            | Expr::Null { span }
            | Expr::This { span }
            | Expr::Super { span }
            | Expr::Identifier { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Ternary { span, .. }
            | Expr::Call { span, .. }
            | Expr::Member { span, .. }
            | Expr::Index { span, .. }
            | Expr::New { span, .. }
            | Expr::Array { span, .. }
            | Expr::Map { span, .. }
            | Expr::Function { span, .. }
            | Expr::Template { span, .. } => *span,
        }
    }
}

/// A braced sequence of statements.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// A single `else if` branch of an if statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElseIf {
    pub condition: Expr,
    pub body: Block,
    pub span: Span,
}

/// Statement nodes. Declarations are statements so they can appear at the
/// top level and inside any block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    Expr {
        expr: Expr,
        span: Span,
    },
    /// Assignment. The target may be any expression; the interpreter rejects
    /// non-lvalues at execution time.
    Assign {
        target: Expr,
        value: Expr,
        span: Span,
    },
    VarDecl {
        name: String,
        is_const: bool,
        init: Option<Expr>,
        span: Span,
    },
    Return {
        value: Option<Expr>,
        span: Span,
    },
    Break {
        span: Span,
    },
    Continue {
        span: Span,
    },
    If {
        condition: Expr,
        body: Block,
        else_ifs: Vec<ElseIf>,
        else_body: Option<Block>,
        span: Span,
    },
    While {
        condition: Expr,
        body: Block,
        span: Span,
    },
    For {
        init: Option<Box<Stmt>>,
        condition: Option<Expr>,
        update: Option<Box<Stmt>>,
        body: Block,
        span: Span,
    },
    ForOf {
        var_name: String,
        iterable: Expr,
        body: Block,
        span: Span,
    },
    Block {
        block: Block,
        span: Span,
    },
    Try {
        body: Block,
        catch_param: Option<String>,
        catch_body: Option<Block>,
        span: Span,
    },
    Throw {
        value: Expr,
        span: Span,
    },
    Func(FuncDecl),
    Class(ClassDecl),
    Interface(InterfaceDecl),
    Enum(EnumDecl),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Expr { span, .. }
            | Stmt::Assign { span, .. }
            | Stmt::VarDecl { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::Break { span }
            | Stmt::Continue { span }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::For { span, .. }
            | Stmt::ForOf { span, .. }
            | Stmt::Block { span, .. }
            | Stmt::Try { span, .. }
            | Stmt::Throw { span, .. } => *span,
            Stmt::Func(decl) => decl.span,
            Stmt::Class(decl) => decl.span,
            Stmt::Interface(decl) => decl.span,
            Stmt::Enum(decl) => decl.span,
        }
    }
}

/// Function declaration: `function name(params) { ... }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuncDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
    pub span: Span,
}

/// Class declaration with optional single inheritance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassDecl {
    pub name: String,
    pub super_class: Option<String>,
    pub constructor: Option<ConstructorDecl>,
    pub methods: Vec<MethodDecl>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstructorDecl {
    pub params: Vec<String>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
    pub span: Span,
}

/// Interface declaration: a named set of method signatures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceDecl {
    pub name: String,
    pub methods: Vec<MethodSig>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodSig {
    pub name: String,
    pub param_count: usize,
}

/// Enum declaration: a named, ordered list of variants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumDecl {
    pub name: String,
    pub variants: Vec<String>,
    pub span: Span,
}
