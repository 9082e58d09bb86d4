use expect_test::{expect, Expect};

use super::*;
use crate::lexer::lex;

fn parse_source(source: &str) -> (File, Vec<Diagnostic>) {
    let (tokens, lex_diags) = lex(source);
    assert!(lex_diags.is_empty(), "lex diagnostics: {:?}", lex_diags);
    parse(tokens)
}

fn parse_clean(source: &str) -> File {
    let (file, diags) = parse_source(source);
    assert!(diags.is_empty(), "parse diagnostics: {:?}", diags);
    file
}

fn check_stmt(source: &str, expect: Expect) {
    let file = parse_clean(source);
    assert_eq!(file.body.len(), 1, "expected a single statement");
    expect.assert_eq(&stmt_sexpr(&file.body[0]));
}

// ---- span-free renderings of the tree, for compact assertions ----

fn expr_sexpr(expr: &Expr) -> String {
    match expr {
        Expr::Integer { value, .. } => value.to_string(),
        Expr::Float { value, .. } => format!("{:?}", value),
        Expr::String { value, .. } => format!("{:?}", value),
        Expr::Boolean { value, .. } => value.to_string(),
        Expr::Null { .. } => "null".into(),
        Expr::This { .. } => "this".into(),
        Expr::Super { .. } => "super".into(),
        Expr::Identifier { name, .. } => name.clone(),
        Expr::Unary { op, operand, .. } => format!("({} {})", op, expr_sexpr(operand)),
        Expr::Binary { op, left, right, .. } => {
            format!("({} {} {})", op, expr_sexpr(left), expr_sexpr(right))
        }
        Expr::Ternary {
            condition,
            then,
            otherwise,
            ..
        } => format!(
            "(?: {} {} {})",
            expr_sexpr(condition),
            expr_sexpr(then),
            expr_sexpr(otherwise)
        ),
        Expr::Call { callee, args, .. } => {
            let mut out = format!("(call {}", expr_sexpr(callee));
            for arg in args {
                out.push(' ');
                out.push_str(&expr_sexpr(arg));
            }
            out.push(')');
            out
        }
        Expr::Member { object, property, .. } => format!("(. {} {})", expr_sexpr(object), property),
        Expr::Index { object, index, .. } => {
            format!("([] {} {})", expr_sexpr(object), expr_sexpr(index))
        }
        Expr::New { class_name, args, .. } => {
            let mut out = format!("(new {}", class_name);
            for arg in args {
                out.push(' ');
                out.push_str(&expr_sexpr(arg));
            }
            out.push(')');
            out
        }
        Expr::Array { elements, .. } => {
            let inner = elements.iter().map(expr_sexpr).collect::<Vec<_>>().join(" ");
            format!("[{}]", inner)
        }
        Expr::Map { entries, .. } => {
            let inner = entries
                .iter()
                .map(|(k, v)| format!("{}: {}", k, expr_sexpr(v)))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{{{}}}", inner)
        }
        Expr::Function { name, params, body, .. } => format!(
            "(fn {} ({}) {})",
            name.as_deref().unwrap_or("_"),
            params.join(" "),
            block_sexpr(body)
        ),
        Expr::Template { parts, exprs, .. } => {
            let exprs = exprs.iter().map(expr_sexpr).collect::<Vec<_>>().join(" ");
            format!("(template {:?} [{}])", parts, exprs)
        }
    }
}

fn block_sexpr(block: &Block) -> String {
    if block.stmts.is_empty() {
        return "{}".into();
    }
    let inner = block
        .stmts
        .iter()
        .map(stmt_sexpr)
        .collect::<Vec<_>>()
        .join("; ");
    format!("{{ {} }}", inner)
}

fn stmt_sexpr(stmt: &Stmt) -> String {
    match stmt {
        Stmt::Expr { expr, .. } => expr_sexpr(expr),
        Stmt::Assign { target, value, .. } => {
            format!("(= {} {})", expr_sexpr(target), expr_sexpr(value))
        }
        Stmt::VarDecl {
            name,
            is_const,
            init,
            ..
        } => {
            let kw = if *is_const { "const" } else { "var" };
            match init {
                Some(init) => format!("({} {} {})", kw, name, expr_sexpr(init)),
                None => format!("({} {})", kw, name),
            }
        }
        Stmt::Return { value, .. } => match value {
            Some(value) => format!("(return {})", expr_sexpr(value)),
            None => "(return)".into(),
        },
        Stmt::Break { .. } => "(break)".into(),
        Stmt::Continue { .. } => "(continue)".into(),
        Stmt::If {
            condition,
            body,
            else_ifs,
            else_body,
            ..
        } => {
            let mut out = format!("(if {} {}", expr_sexpr(condition), block_sexpr(body));
            for else_if in else_ifs {
                out.push_str(&format!(
                    " (elif {} {})",
                    expr_sexpr(&else_if.condition),
                    block_sexpr(&else_if.body)
                ));
            }
            if let Some(else_body) = else_body {
                out.push_str(&format!(" (else {})", block_sexpr(else_body)));
            }
            out.push(')');
            out
        }
        Stmt::While { condition, body, .. } => {
            format!("(while {} {})", expr_sexpr(condition), block_sexpr(body))
        }
        Stmt::For {
            init,
            condition,
            update,
            body,
            ..
        } => format!(
            "(for {} {} {} {})",
            init.as_deref().map_or("_".into(), |s| stmt_sexpr(s)),
            condition.as_ref().map_or("_".into(), expr_sexpr),
            update.as_deref().map_or("_".into(), |s| stmt_sexpr(s)),
            block_sexpr(body)
        ),
        Stmt::ForOf {
            var_name,
            iterable,
            body,
            ..
        } => format!(
            "(for-of {} {} {})",
            var_name,
            expr_sexpr(iterable),
            block_sexpr(body)
        ),
        Stmt::Block { block, .. } => block_sexpr(block),
        Stmt::Try {
            body,
            catch_param,
            catch_body,
            ..
        } => format!(
            "(try {} {} {})",
            block_sexpr(body),
            catch_param.as_deref().unwrap_or("_"),
            catch_body.as_ref().map_or("_".into(), block_sexpr)
        ),
        Stmt::Throw { value, .. } => format!("(throw {})", expr_sexpr(value)),
        Stmt::Func(decl) => format!(
            "(function {} ({}) {})",
            decl.name,
            decl.params.join(" "),
            block_sexpr(&decl.body)
        ),
        Stmt::Class(decl) => {
            let mut out = format!("(class {}", decl.name);
            if let Some(super_class) = &decl.super_class {
                out.push_str(&format!(" extends {}", super_class));
            }
            if let Some(ctor) = &decl.constructor {
                out.push_str(&format!(
                    " (constructor ({}) {})",
                    ctor.params.join(" "),
                    block_sexpr(&ctor.body)
                ));
            }
            for method in &decl.methods {
                out.push_str(&format!(
                    " (method {} ({}) {})",
                    method.name,
                    method.params.join(" "),
                    block_sexpr(&method.body)
                ));
            }
            out.push(')');
            out
        }
        Stmt::Interface(decl) => {
            let sigs = decl
                .methods
                .iter()
                .map(|m| format!("{}/{}", m.name, m.param_count))
                .collect::<Vec<_>>()
                .join(" ");
            format!("(interface {} [{}])", decl.name, sigs)
        }
        Stmt::Enum(decl) => format!("(enum {} [{}])", decl.name, decl.variants.join(" ")),
    }
}

// ---- expressions ----

#[test]
fn multiplication_binds_tighter_than_addition() {
    check_stmt("1 + 2 * 3", expect![["(+ 1 (* 2 3))"]]);
    check_stmt("1 * 2 + 3", expect![["(+ (* 1 2) 3)"]]);
}

#[test]
fn grouping_overrides_precedence() {
    check_stmt("(1 + 2) * 3", expect![["(* (+ 1 2) 3)"]]);
}

#[test]
fn binary_operators_are_left_associative() {
    check_stmt("1 - 2 - 3", expect![["(- (- 1 2) 3)"]]);
    check_stmt("10 / 2 / 5", expect![["(/ (/ 10 2) 5)"]]);
}

#[test]
fn comparison_binds_tighter_than_equality() {
    check_stmt("1 < 2 == true", expect![["(== (< 1 2) true)"]]);
}

#[test]
fn and_binds_tighter_than_or() {
    check_stmt("a || b && c", expect![["(|| a (&& b c))"]]);
}

#[test]
fn unary_operators() {
    check_stmt("!a && -b", expect![["(&& (! a) (- b))"]]);
    check_stmt("-1 + 2", expect![["(+ (- 1) 2)"]]);
    check_stmt("-a.b", expect![["(- (. a b))"]]);
}

#[test]
fn postfix_chains() {
    check_stmt("a.b.c(1)[2]", expect![["([] (call (. (. a b) c) 1) 2)"]]);
    check_stmt("f(1, 2)(3)", expect![["(call (call f 1 2) 3)"]]);
}

#[test]
fn ternary_is_right_associative() {
    check_stmt("a ? b : c ? d : e", expect![["(?: a b (?: c d e))"]]);
    check_stmt("a ? b ? c : d : e", expect![["(?: a (?: b c d) e)"]]);
}

#[test]
fn ternary_inside_call_args() {
    check_stmt("f(a ? 1 : 2)", expect![["(call f (?: a 1 2))"]]);
}

#[test]
fn float_and_string_literals() {
    check_stmt("3.14", expect![["3.14"]]);
    check_stmt(r#""hello""#, expect![[r#""hello""#]]);
}

#[test]
fn array_literal_with_trailing_comma() {
    check_stmt("[1, 2, 3,]", expect![["[1 2 3]"]]);
    check_stmt("[]", expect![["[]"]]);
}

#[test]
fn map_literal() {
    check_stmt(r#"{a: 1, "b c": 2}"#, expect![["{a: 1, b c: 2}"]]);
    check_stmt("{}", expect![["{}"]]);
}

#[test]
fn map_literal_multiline() {
    check_stmt("{\n  a: 1,\n  b: 2\n}", expect![["{a: 1, b: 2}"]]);
}

#[test]
fn template_literal() {
    check_stmt(
        "`hi ${name}, ${1 + 2}`",
        expect![[r#"(template ["hi ", ", ", ""] [name (+ 1 2)])"#]],
    );
    check_stmt("`plain`", expect![[r#"(template ["plain"] [])"#]],);
}

#[test]
fn function_expression() {
    check_stmt(
        "var f = function add(a, b) { return a + b }",
        expect![["(var f (fn add (a b) { (return (+ a b)) }))"]],
    );
    check_stmt(
        "var f = function() { }",
        expect![["(var f (fn _ () {}))"]],
    );
}

#[test]
fn arrow_function_single_param() {
    check_stmt("var inc = x => x + 1", expect![["(var inc (fn _ (x) { (return (+ x 1)) }))"]]);
}

#[test]
fn arrow_function_paren_params() {
    check_stmt(
        "var add = (a, b) => a + b",
        expect![["(var add (fn _ (a b) { (return (+ a b)) }))"]],
    );
    check_stmt("var f = () => 1", expect![["(var f (fn _ () { (return 1) }))"]]);
}

#[test]
fn arrow_function_block_body() {
    check_stmt(
        "var f = (a) => { return a * 2 }",
        expect![["(var f (fn _ (a) { (return (* a 2)) }))"]],
    );
}

#[test]
fn parenthesized_expr_is_not_arrow() {
    check_stmt("(a)", expect![["a"]]);
    check_stmt("(a + b) * c", expect![["(* (+ a b) c)"]]);
}

#[test]
fn arrow_as_call_argument() {
    check_stmt(
        "xs.map(x => x * 2)",
        expect![["(call (. xs map) (fn _ (x) { (return (* x 2)) }))"]],
    );
}

#[test]
fn new_expression() {
    check_stmt("new Point(1, 2)", expect![["(new Point 1 2)"]]);
    check_stmt("new Point()", expect![["(new Point)"]]);
}

#[test]
fn super_calls() {
    let file = parse_clean("class B extends A { constructor() { super(1) } m() { super.m() } }");
    expect![[
        "(class B extends A (constructor () { (call super 1) }) (method m () { (call (. super m)) }))"
    ]]
    .assert_eq(&stmt_sexpr(&file.body[0]));
}

// ---- statements ----

#[test]
fn assignment_forms() {
    check_stmt("x = 1", expect![["(= x 1)"]]);
    check_stmt("a.b = 1", expect![["(= (. a b) 1)"]]);
    check_stmt("a[0] = 1", expect![["(= ([] a 0) 1)"]]);
}

#[test]
fn compound_assignment_desugars() {
    check_stmt("x += 1", expect![["(= x (+ x 1))"]]);
    check_stmt("x -= 1", expect![["(= x (- x 1))"]]);
    check_stmt("x *= 2", expect![["(= x (* x 2))"]]);
    check_stmt("x /= 2", expect![["(= x (/ x 2))"]]);
    check_stmt("a.b += 1", expect![["(= (. a b) (+ (. a b) 1))"]]);
}

#[test]
fn var_and_const_declarations() {
    check_stmt("var x = 1", expect![["(var x 1)"]]);
    check_stmt("const y = 2", expect![["(const y 2)"]]);
    check_stmt("var z", expect![["(var z)"]]);
}

#[test]
fn if_else_chain() {
    check_stmt(
        "if (a) { b() } else if (c) { d() } else { e() }",
        expect![["(if a { (call b) } (elif c { (call d) }) (else { (call e) }))"]],
    );
}

#[test]
fn while_statement() {
    check_stmt("while (x < 5) { x = x + 1 }", expect![["(while (< x 5) { (= x (+ x 1)) })"]]);
}

#[test]
fn c_style_for() {
    check_stmt(
        "for (var i = 0; i < 3; i = i + 1) { f(i) }",
        expect![["(for (var i 0) (< i 3) (= i (+ i 1)) { (call f i) })"]],
    );
}

#[test]
fn for_with_empty_clauses() {
    check_stmt("for (;;) { break }", expect![["(for _ _ _ { (break) })"]]);
}

#[test]
fn for_of_statement() {
    check_stmt("for (var k of m) { print(k) }", expect![["(for-of k m { (call print k) })"]]);
}

#[test]
fn return_forms() {
    let file = parse_clean("function f() { return }\nfunction g() { return 1 }");
    assert_eq!(stmt_sexpr(&file.body[0]), "(function f () { (return) })");
    assert_eq!(stmt_sexpr(&file.body[1]), "(function g () { (return 1) })");
}

#[test]
fn try_catch_forms() {
    check_stmt(
        "try { f() } catch (e) { g(e) }",
        expect![["(try { (call f) } e { (call g e) })"]],
    );
    check_stmt("try { f() } catch { g() }", expect![["(try { (call f) } _ { (call g) })"]]);
    check_stmt("try { f() }", expect![["(try { (call f) } _ _)"]]);
}

#[test]
fn throw_statement() {
    check_stmt("throw \"bad\"", expect![[r#"(throw "bad")"#]]);
}

#[test]
fn class_declaration() {
    check_stmt(
        "class Point { constructor(x, y) { this.x = x } move(dx) { this.x = this.x + dx } }",
        expect![[
            "(class Point (constructor (x y) { (= (. this x) x) }) (method move (dx) { (= (. this x) (+ (. this x) dx)) }))"
        ]],
    );
}

#[test]
fn interface_declaration() {
    check_stmt(
        "interface Shape { area() scale(factor) }",
        expect![["(interface Shape [area/0 scale/1])"]],
    );
}

#[test]
fn enum_declaration() {
    check_stmt("enum Color { Red, Green, Blue }", expect![["(enum Color [Red Green Blue])"]]);
}

#[test]
fn interface_as_plain_identifier_still_works() {
    // Contextual keyword: not followed by a name, so it is an expression.
    check_stmt("interface + 1", expect![["(+ interface 1)"]]);
}

#[test]
fn separators_are_collapsed() {
    let file = parse_clean("1;;\n\n;2\n");
    assert_eq!(file.body.len(), 2);
}

#[test]
fn newlines_allowed_in_call_args_and_literals() {
    check_stmt("f(1,\n  2)", expect![["(call f 1 2)"]]);
    check_stmt("[1,\n 2]", expect![["[1 2]"]]);
    check_stmt("1 +\n2", expect![["(+ 1 2)"]]);
}

// ---- diagnostics and recovery ----

#[test]
fn missing_name_recovers_and_keeps_later_statements() {
    let (file, diags) = parse_source("var = 1\nprint(2)");
    assert_eq!(diags[0].code, "E2001");
    assert_eq!(file.body.len(), 1);
    assert_eq!(stmt_sexpr(&file.body[0]), "(call print 2)");
}

#[test]
fn unexpected_token_reports_e2002() {
    let (file, diags) = parse_source("var x = 1\n* 2\nprint(x)");
    assert!(diags.iter().any(|d| d.code == "E2002"));
    // statements before and after the error survive
    assert_eq!(stmt_sexpr(&file.body[0]), "(var x 1)");
    assert_eq!(stmt_sexpr(file.body.last().unwrap()), "(call print x)");
}

#[test]
fn class_body_junk_reports_e2003() {
    let (_, diags) = parse_source("class C { 42 }");
    assert!(diags.iter().any(|d| d.code == "E2003"));
}

#[test]
fn stray_closing_brace_terminates() {
    let (file, diags) = parse_source("}\nvar x = 1");
    assert!(!diags.is_empty());
    assert_eq!(stmt_sexpr(file.body.last().unwrap()), "(var x 1)");
}

#[test]
fn expected_but_got_message_shape() {
    let (_, diags) = parse_source("if (x { }");
    assert!(diags
        .iter()
        .any(|d| d.code == "E2001" && d.message.starts_with("expected ")));
}

#[test]
fn file_span_covers_whole_source() {
    let source = "print(1)\n";
    let file = parse_clean(source);
    assert_eq!(file.span.start.offset, 0);
    assert_eq!(file.span.end.offset, source.len());
}

#[test]
fn empty_file() {
    let file = parse_clean("");
    assert!(file.body.is_empty());
}

#[test]
fn parser_terminates_on_arbitrary_tokens() {
    // Resilience: any token stream yields a File.
    let (tokens, _) = lex(") ] } , : ; => ? . foo ( [ {");
    let (_, diags) = parse(tokens);
    assert!(!diags.is_empty());
}
