//! The tree-walking interpreter.
//!
//! Statements produce an [`ExecResult`] carrying the control-flow signal
//! (`return`/`break`/`continue`), so `try`/`catch` can never intercept
//! ordinary control flow. Runtime errors and user-thrown values travel
//! out-of-band as `Err(RuntimeError)` and are caught only by `try`/`catch`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

use crate::lexer::token::Span;
use crate::parser::ast::{BinaryOp, Block, Expr, File, Stmt, UnaryOp};
use crate::runtime::builtins::register_builtins;
use crate::runtime::env::Environment;
use crate::runtime::value::{
    find_constructor, find_method, to_f64, to_i64, values_equal, ClassValue, EnumValue,
    EnumVariantValue, FunctionValue, MapValue, ObjectValue, Value,
};

/// Where program output (`print`/`println`) goes. A single shared handle,
/// written synchronously in program order.
pub type Output = Rc<RefCell<dyn Write>>;

/// Control-flow outcome of executing a statement.
#[derive(Debug)]
pub enum ExecResult {
    Normal,
    Return(Value),
    Break,
    Continue,
}

/// An error travelling the out-of-band channel: either a runtime error with
/// a message, or a value raised by `throw`. Both carry the span they
/// originated at and both are caught by `try`/`catch`.
#[derive(Debug, Clone)]
pub enum RuntimeError {
    Error { message: String, span: Span },
    Thrown { value: Value, span: Span },
}

impl RuntimeError {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        RuntimeError::Error {
            message: message.into(),
            span,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            RuntimeError::Error { span, .. } | RuntimeError::Thrown { span, .. } => *span,
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::Error { message, span } => write!(
                f,
                "runtime error at {}:{}: {}",
                span.start.line, span.start.column, message
            ),
            RuntimeError::Thrown { value, span } => write!(
                f,
                "uncaught throw at {}:{}: {}",
                span.start.line, span.start.column, value
            ),
        }
    }
}

impl std::error::Error for RuntimeError {}

type Exec = Result<ExecResult, RuntimeError>;
type Eval = Result<Value, RuntimeError>;

/// Walks the AST and executes it against a chain of environments.
pub struct Interpreter {
    globals: Rc<Environment>,
}

impl Interpreter {
    /// Creates an interpreter whose built-ins write to the given sink.
    pub fn new(output: Output) -> Self {
        let globals = Environment::new();
        register_builtins(&globals, output);
        Interpreter { globals }
    }

    /// Executes an entire file. Control-flow signals escaping to the top
    /// level are errors.
    pub fn run(&self, file: &File) -> Result<(), RuntimeError> {
        for stmt in &file.body {
            match self.exec_stmt(stmt, &self.globals)? {
                ExecResult::Normal => {}
                ExecResult::Return(_) => {
                    return Err(RuntimeError::new(stmt.span(), "return outside of function"));
                }
                ExecResult::Break => {
                    return Err(RuntimeError::new(stmt.span(), "break outside of loop"));
                }
                ExecResult::Continue => {
                    return Err(RuntimeError::new(stmt.span(), "continue outside of loop"));
                }
            }
        }
        Ok(())
    }

    // ---- statement execution ----

    fn exec_stmt(&self, stmt: &Stmt, env: &Rc<Environment>) -> Exec {
        match stmt {
            Stmt::Expr { expr, .. } => {
                self.eval_expr(expr, env)?;
                Ok(ExecResult::Normal)
            }

            Stmt::VarDecl {
                name,
                is_const,
                init,
                span,
            } => {
                let value = match init {
                    Some(expr) => self.eval_expr(expr, env)?,
                    None => Value::Null,
                };
                env.define(name, value, *is_const)
                    .map_err(|e| RuntimeError::new(*span, e))?;
                Ok(ExecResult::Normal)
            }

            Stmt::Assign { target, value, span } => self.exec_assign(target, value, *span, env),

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr, env)?,
                    None => Value::Null,
                };
                Ok(ExecResult::Return(value))
            }

            Stmt::Break { .. } => Ok(ExecResult::Break),
            Stmt::Continue { .. } => Ok(ExecResult::Continue),

            Stmt::If {
                condition,
                body,
                else_ifs,
                else_body,
                ..
            } => {
                if self.eval_expr(condition, env)?.is_truthy() {
                    return self.exec_block(body, Environment::with_parent(env.clone()));
                }
                for else_if in else_ifs {
                    if self.eval_expr(&else_if.condition, env)?.is_truthy() {
                        return self.exec_block(&else_if.body, Environment::with_parent(env.clone()));
                    }
                }
                if let Some(else_body) = else_body {
                    return self.exec_block(else_body, Environment::with_parent(env.clone()));
                }
                Ok(ExecResult::Normal)
            }

            Stmt::While { condition, body, .. } => {
                loop {
                    if !self.eval_expr(condition, env)?.is_truthy() {
                        break;
                    }
                    match self.exec_block(body, Environment::with_parent(env.clone()))? {
                        ExecResult::Break => break,
                        result @ ExecResult::Return(_) => return Ok(result),
                        ExecResult::Normal | ExecResult::Continue => {}
                    }
                }
                Ok(ExecResult::Normal)
            }

            Stmt::For {
                init,
                condition,
                update,
                body,
                ..
            } => self.exec_for(init.as_deref(), condition.as_ref(), update.as_deref(), body, env),

            Stmt::ForOf {
                var_name,
                iterable,
                body,
                span,
            } => self.exec_for_of(var_name, iterable, body, *span, env),

            Stmt::Block { block, .. } => {
                self.exec_block(block, Environment::with_parent(env.clone()))
            }

            Stmt::Try {
                body,
                catch_param,
                catch_body,
                span,
            } => self.exec_try(body, catch_param.as_deref(), catch_body.as_ref(), *span, env),

            Stmt::Throw { value, span } => {
                let value = self.eval_expr(value, env)?;
                Err(RuntimeError::Thrown { value, span: *span })
            }

            Stmt::Func(decl) => {
                let func = FunctionValue {
                    name: decl.name.clone(),
                    params: decl.params.clone(),
                    body: decl.body.clone(),
                    closure: env.clone(),
                };
                env.define(&decl.name, Value::Function(Rc::new(func)), false)
                    .map_err(|e| RuntimeError::new(decl.span, e))?;
                Ok(ExecResult::Normal)
            }

            Stmt::Class(decl) => {
                let superclass = match &decl.super_class {
                    Some(super_name) => {
                        let super_val = env.get(super_name).ok_or_else(|| {
                            RuntimeError::new(decl.span, format!("undefined class '{}'", super_name))
                        })?;
                        match super_val {
                            Value::Class(c) => Some(c),
                            _ => {
                                return Err(RuntimeError::new(
                                    decl.span,
                                    format!("'{}' is not a class", super_name),
                                ));
                            }
                        }
                    }
                    None => None,
                };
                let cls = ClassValue {
                    decl: Rc::new(decl.clone()),
                    env: env.clone(),
                    superclass,
                };
                env.define(&decl.name, Value::Class(Rc::new(cls)), false)
                    .map_err(|e| RuntimeError::new(decl.span, e))?;
                Ok(ExecResult::Normal)
            }

            Stmt::Interface(decl) => {
                env.define(&decl.name, Value::Interface(Rc::new(decl.clone())), false)
                    .map_err(|e| RuntimeError::new(decl.span, e))?;
                Ok(ExecResult::Normal)
            }

            Stmt::Enum(decl) => {
                let value = Value::EnumType(Rc::new(EnumValue {
                    name: decl.name.clone(),
                    variants: decl.variants.clone(),
                }));
                env.define(&decl.name, value, false)
                    .map_err(|e| RuntimeError::new(decl.span, e))?;
                Ok(ExecResult::Normal)
            }
        }
    }

    /// Runs a block's statements in the given environment, short-circuiting
    /// on the first non-normal signal.
    pub(crate) fn exec_block(&self, block: &Block, env: Rc<Environment>) -> Exec {
        for stmt in &block.stmts {
            match self.exec_stmt(stmt, &env)? {
                ExecResult::Normal => {}
                result => return Ok(result),
            }
        }
        Ok(ExecResult::Normal)
    }

    fn exec_assign(&self, target: &Expr, value_expr: &Expr, span: Span, env: &Rc<Environment>) -> Exec {
        let value = self.eval_expr(value_expr, env)?;

        match target {
            Expr::Identifier { name, .. } => {
                env.set(name, value).map_err(|e| RuntimeError::new(span, e))?;
            }
            Expr::Member { object, property, .. } => {
                let obj = self.eval_expr(object, env)?;
                match &obj {
                    Value::Object(o) => {
                        o.props.borrow_mut().insert(property.clone(), value);
                    }
                    Value::Map(m) => {
                        m.borrow_mut().insert(property.clone(), value);
                    }
                    _ => {
                        return Err(RuntimeError::new(
                            span,
                            format!("cannot set property on value of type '{}'", obj.type_name()),
                        ));
                    }
                }
            }
            Expr::Index { object, index, .. } => {
                let obj = self.eval_expr(object, env)?;
                let index_val = self.eval_expr(index, env)?;
                match &obj {
                    Value::Array(arr) => {
                        let idx = to_i64(&index_val).ok_or_else(|| {
                            RuntimeError::new(span, "array index must be an integer")
                        })?;
                        let mut elements = arr.borrow_mut();
                        if idx < 0 || idx as usize >= elements.len() {
                            return Err(RuntimeError::new(
                                span,
                                format!(
                                    "array index {} out of range (length {})",
                                    idx,
                                    elements.len()
                                ),
                            ));
                        }
                        elements[idx as usize] = value;
                    }
                    Value::Map(m) => {
                        let Value::String(key) = index_val else {
                            return Err(RuntimeError::new(
                                span,
                                format!("map key must be a string, got '{}'", index_val.type_name()),
                            ));
                        };
                        m.borrow_mut().insert(key, value);
                    }
                    _ => {
                        return Err(RuntimeError::new(
                            span,
                            format!("cannot index-assign value of type '{}'", obj.type_name()),
                        ));
                    }
                }
            }
            _ => return Err(RuntimeError::new(span, "invalid assignment target")),
        }

        Ok(ExecResult::Normal)
    }

    fn exec_for(
        &self,
        init: Option<&Stmt>,
        condition: Option<&Expr>,
        update: Option<&Stmt>,
        body: &Block,
        env: &Rc<Environment>,
    ) -> Exec {
        // Init vars are scoped to the loop.
        let for_env = Environment::with_parent(env.clone());

        if let Some(init) = init {
            match self.exec_stmt(init, &for_env)? {
                ExecResult::Normal => {}
                result => return Ok(result),
            }
        }

        loop {
            if let Some(condition) = condition {
                if !self.eval_expr(condition, &for_env)?.is_truthy() {
                    break;
                }
            }

            // Fresh scope for each iteration.
            match self.exec_block(body, Environment::with_parent(for_env.clone()))? {
                ExecResult::Break => break,
                result @ ExecResult::Return(_) => return Ok(result),
                ExecResult::Normal | ExecResult::Continue => {}
            }

            if let Some(update) = update {
                self.exec_stmt(update, &for_env)?;
            }
        }

        Ok(ExecResult::Normal)
    }

    fn exec_for_of(
        &self,
        var_name: &str,
        iterable: &Expr,
        body: &Block,
        span: Span,
        env: &Rc<Environment>,
    ) -> Exec {
        let iterable = self.eval_expr(iterable, env)?;

        let items: Vec<Value> = match &iterable {
            Value::Array(arr) => arr.borrow().clone(),
            Value::Map(m) => m.borrow().keys.iter().cloned().map(Value::String).collect(),
            _ => {
                return Err(RuntimeError::new(
                    span,
                    format!("for-of requires an array or map, got '{}'", iterable.type_name()),
                ));
            }
        };

        for item in items {
            let loop_env = Environment::with_parent(env.clone());
            loop_env
                .define(var_name, item, false)
                .map_err(|e| RuntimeError::new(span, e))?;

            match self.exec_block(body, loop_env)? {
                ExecResult::Break => break,
                result @ ExecResult::Return(_) => return Ok(result),
                ExecResult::Normal | ExecResult::Continue => {}
            }
        }

        Ok(ExecResult::Normal)
    }

    fn exec_try(
        &self,
        body: &Block,
        catch_param: Option<&str>,
        catch_body: Option<&Block>,
        span: Span,
        env: &Rc<Environment>,
    ) -> Exec {
        let result = self.exec_block(body, Environment::with_parent(env.clone()));
        let err = match result {
            Ok(r) => return Ok(r),
            Err(err) => err,
        };

        let Some(catch_body) = catch_body else {
            return Err(err); // no handler, rethrow
        };

        // Thrown values bind unchanged; runtime errors bind their message.
        let err_val = match err {
            RuntimeError::Thrown { value, .. } => value,
            RuntimeError::Error { message, .. } => Value::String(message),
        };

        let catch_env = Environment::with_parent(env.clone());
        if let Some(param) = catch_param {
            catch_env
                .define(param, err_val, false)
                .map_err(|e| RuntimeError::new(span, e))?;
        }
        self.exec_block(catch_body, catch_env)
    }

    // ---- expression evaluation ----

    pub(crate) fn eval_expr(&self, expr: &Expr, env: &Rc<Environment>) -> Eval {
        match expr {
            Expr::Integer { value, .. } => Ok(Value::Int(*value)),
            Expr::Float { value, .. } => Ok(Value::Float(*value)),
            Expr::String { value, .. } => Ok(Value::String(value.clone())),
            Expr::Boolean { value, .. } => Ok(Value::Bool(*value)),
            Expr::Null { .. } => Ok(Value::Null),

            Expr::This { span } => env.get("this").ok_or_else(|| {
                RuntimeError::new(*span, "'this' used outside of a class method or constructor")
            }),

            Expr::Super { span } => Err(RuntimeError::new(
                *span,
                "super can only be used as super() or super.method()",
            )),

            Expr::Identifier { name, span } => env
                .get(name)
                .ok_or_else(|| RuntimeError::new(*span, format!("undefined variable '{}'", name))),

            Expr::Unary { op, operand, span } => {
                let operand = self.eval_expr(operand, env)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
                    UnaryOp::Negate => match operand {
                        Value::Int(n) => Ok(Value::Int(n.wrapping_neg())),
                        Value::Float(n) => Ok(Value::Float(-n)),
                        _ => Err(RuntimeError::new(
                            *span,
                            format!("cannot negate value of type '{}'", operand.type_name()),
                        )),
                    },
                }
            }

            Expr::Binary { op, left, right, span } => {
                self.eval_binary(*op, left, right, *span, env)
            }

            Expr::Ternary {
                condition,
                then,
                otherwise,
                ..
            } => {
                if self.eval_expr(condition, env)?.is_truthy() {
                    self.eval_expr(then, env)
                } else {
                    self.eval_expr(otherwise, env)
                }
            }

            Expr::Call { callee, args, span } => self.eval_call(callee, args, *span, env),

            Expr::Member { object, property, span } => {
                let obj = self.eval_expr(object, env)?;
                self.member_value(&obj, property, *span)
            }

            Expr::Index { object, index, span } => {
                let obj = self.eval_expr(object, env)?;
                let index = self.eval_expr(index, env)?;
                self.index_value(&obj, &index, *span)
            }

            Expr::New { class_name, args, span } => self.eval_new(class_name, args, *span, env),

            Expr::Array { elements, .. } => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval_expr(element, env)?);
                }
                Ok(Value::Array(Rc::new(RefCell::new(values))))
            }

            Expr::Map { entries, .. } => {
                let mut map = MapValue::default();
                for (key, value_expr) in entries {
                    let value = self.eval_expr(value_expr, env)?;
                    map.insert(key.clone(), value);
                }
                Ok(Value::Map(Rc::new(RefCell::new(map))))
            }

            Expr::Function { name, params, body, .. } => {
                let func = FunctionValue {
                    name: name.clone().unwrap_or_else(|| "<anonymous>".to_string()),
                    params: params.clone(),
                    body: body.clone(),
                    closure: env.clone(),
                };
                Ok(Value::Function(Rc::new(func)))
            }

            Expr::Template { parts, exprs, .. } => {
                let mut out = String::new();
                for (i, part) in parts.iter().enumerate() {
                    out.push_str(part);
                    if let Some(expr) = exprs.get(i) {
                        out.push_str(&self.eval_expr(expr, env)?.to_string());
                    }
                }
                Ok(Value::String(out))
            }
        }
    }

    fn eval_binary(
        &self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        span: Span,
        env: &Rc<Environment>,
    ) -> Eval {
        // Logical operators short-circuit and return the determining side's
        // original value.
        if matches!(op, BinaryOp::And | BinaryOp::Or) {
            let lhs = self.eval_expr(left, env)?;
            return match op {
                BinaryOp::Or if lhs.is_truthy() => Ok(lhs),
                BinaryOp::And if !lhs.is_truthy() => Ok(lhs),
                _ => self.eval_expr(right, env),
            };
        }

        let lhs = self.eval_expr(left, env)?;
        let rhs = self.eval_expr(right, env)?;

        // String concatenation: + coerces when either side is a string.
        if op == BinaryOp::Add
            && (matches!(lhs, Value::String(_)) || matches!(rhs, Value::String(_)))
        {
            return Ok(Value::String(format!("{}{}", lhs, rhs)));
        }

        if op == BinaryOp::Eq {
            return Ok(Value::Bool(values_equal(&lhs, &rhs)));
        }
        if op == BinaryOp::NotEq {
            return Ok(Value::Bool(!values_equal(&lhs, &rhs)));
        }

        let (Some(lf), Some(rf)) = (to_f64(&lhs), to_f64(&rhs)) else {
            return Err(RuntimeError::new(
                span,
                format!(
                    "cannot apply '{}' to '{}' and '{}'",
                    op,
                    lhs.type_name(),
                    rhs.type_name()
                ),
            ));
        };

        match op {
            BinaryOp::Less => return Ok(Value::Bool(lf < rf)),
            BinaryOp::LessEq => return Ok(Value::Bool(lf <= rf)),
            BinaryOp::Greater => return Ok(Value::Bool(lf > rf)),
            BinaryOp::GreaterEq => return Ok(Value::Bool(lf >= rf)),
            _ => {}
        }

        // Arithmetic stays integral when both operands are ints.
        if let (Value::Int(a), Value::Int(b)) = (&lhs, &rhs) {
            let (a, b) = (*a, *b);
            return match op {
                BinaryOp::Add => Ok(Value::Int(a.wrapping_add(b))),
                BinaryOp::Sub => Ok(Value::Int(a.wrapping_sub(b))),
                BinaryOp::Mul => Ok(Value::Int(a.wrapping_mul(b))),
                BinaryOp::Div => {
                    if b == 0 {
                        return Err(RuntimeError::new(span, "division by zero"));
                    }
                    Ok(Value::Int(a.wrapping_div(b)))
                }
                BinaryOp::Mod => {
                    if b == 0 {
                        return Err(RuntimeError::new(span, "division by zero"));
                    }
                    Ok(Value::Int(a.wrapping_rem(b)))
                }
                _ => Err(RuntimeError::new(
                    span,
                    format!("unknown binary operator: {}", op),
                )),
            };
        }

        match op {
            BinaryOp::Add => Ok(Value::Float(lf + rf)),
            BinaryOp::Sub => Ok(Value::Float(lf - rf)),
            BinaryOp::Mul => Ok(Value::Float(lf * rf)),
            BinaryOp::Div => {
                if rf == 0.0 {
                    return Err(RuntimeError::new(span, "division by zero"));
                }
                Ok(Value::Float(lf / rf))
            }
            BinaryOp::Mod => Err(RuntimeError::new(span, "modulo requires integer operands")),
            _ => Err(RuntimeError::new(
                span,
                format!("unknown binary operator: {}", op),
            )),
        }
    }

    // ---- calls ----

    fn eval_args(&self, args: &[Expr], env: &Rc<Environment>) -> Result<Vec<Value>, RuntimeError> {
        args.iter().map(|arg| self.eval_expr(arg, env)).collect()
    }

    fn eval_call(&self, callee: &Expr, args: &[Expr], span: Span, env: &Rc<Environment>) -> Eval {
        // super(args): nearest ancestor constructor
        if matches!(callee, Expr::Super { .. }) {
            let args = self.eval_args(args, env)?;
            return self.call_super_constructor(&args, span, env);
        }

        if let Expr::Member { object, property, .. } = callee {
            // super.method(args)
            if matches!(object.as_ref(), Expr::Super { .. }) {
                let args = self.eval_args(args, env)?;
                return self.call_super_method(property, &args, span, env);
            }

            // Method dispatch on the receiver's type.
            let obj = self.eval_expr(object, env)?;
            let args = self.eval_args(args, env)?;
            return match &obj {
                Value::Object(o) => self.call_method(o, property, &args, span),
                Value::Array(arr) => self.call_array_method(arr, property, &args, span),
                Value::String(s) => self.call_string_method(s, property, &args, span),
                _ => {
                    // Not a method receiver: a member lookup yielding a
                    // callable value (e.g. a function stored in a map).
                    let callee_val = self.member_value(&obj, property, span)?;
                    self.call_value(callee_val, &args, span)
                }
            };
        }

        let callee_val = self.eval_expr(callee, env)?;
        let args = self.eval_args(args, env)?;
        self.call_value(callee_val, &args, span)
    }

    pub(crate) fn call_value(&self, callee: Value, args: &[Value], span: Span) -> Eval {
        match &callee {
            Value::Function(func) => self.call_func(func, args, span),
            Value::Builtin(builtin) => {
                (builtin.func)(args).map_err(|msg| RuntimeError::new(span, msg))
            }
            _ => Err(RuntimeError::new(
                span,
                format!("cannot call value of type '{}'", callee.type_name()),
            )),
        }
    }

    fn call_func(&self, func: &Rc<FunctionValue>, args: &[Value], span: Span) -> Eval {
        if args.len() != func.params.len() {
            return Err(RuntimeError::new(
                span,
                format!(
                    "{}() expects {} arguments, got {}",
                    func.name,
                    func.params.len(),
                    args.len()
                ),
            ));
        }

        let func_env = Environment::with_parent(func.closure.clone());
        for (param, arg) in func.params.iter().zip(args) {
            func_env
                .define(param, arg.clone(), false)
                .map_err(|e| RuntimeError::new(span, e))?;
        }

        match self.exec_block(&func.body, func_env)? {
            ExecResult::Return(value) => Ok(value),
            _ => Ok(Value::Null),
        }
    }

    fn call_method(
        &self,
        obj: &Rc<ObjectValue>,
        method_name: &str,
        args: &[Value],
        span: Span,
    ) -> Eval {
        if let Some((owner, idx)) = find_method(&obj.class, method_name) {
            let method = &owner.decl.methods[idx];
            if args.len() != method.params.len() {
                return Err(RuntimeError::new(
                    span,
                    format!(
                        "{}.{}() expects {} arguments, got {}",
                        obj.class.decl.name,
                        method_name,
                        method.params.len(),
                        args.len()
                    ),
                ));
            }

            let method_env = Environment::with_parent(owner.env.clone());
            let _ = method_env.define("this", Value::Object(obj.clone()), true);
            let _ = method_env.define("__class__", Value::Class(owner.clone()), true);
            for (param, arg) in method.params.iter().zip(args) {
                method_env
                    .define(param, arg.clone(), false)
                    .map_err(|e| RuntimeError::new(span, e))?;
            }

            return match self.exec_block(&method.body, method_env)? {
                ExecResult::Return(value) => Ok(value),
                _ => Ok(Value::Null),
            };
        }

        // A property holding a callable value is invocable too.
        let prop = obj.props.borrow().get(method_name).cloned();
        if let Some(prop_val) = prop {
            return self.call_value(prop_val, args, span);
        }

        Err(RuntimeError::new(
            span,
            format!(
                "undefined method '{}' on class '{}'",
                method_name, obj.class.decl.name
            ),
        ))
    }

    /// `super(args)` inside a constructor: invokes the nearest ancestor
    /// constructor above the class owning the currently running one.
    fn call_super_constructor(&self, args: &[Value], span: Span, env: &Rc<Environment>) -> Eval {
        let class_val = env
            .get("__class__")
            .ok_or_else(|| RuntimeError::new(span, "super() used outside of a constructor"))?;
        let Value::Class(cls) = class_val else {
            return Err(RuntimeError::new(span, "super() used outside of a constructor"));
        };
        let Some(superclass) = cls.superclass.clone() else {
            return Err(RuntimeError::new(
                span,
                format!("class '{}' has no super class", cls.decl.name),
            ));
        };

        let Some(owner) = find_constructor(&superclass) else {
            if !args.is_empty() {
                return Err(RuntimeError::new(
                    span,
                    format!(
                        "super class has no constructor but was called with {} arguments",
                        args.len()
                    ),
                ));
            }
            return Ok(Value::Null);
        };

        if let Some(ctor) = owner.decl.constructor.as_ref() {
            if args.len() != ctor.params.len() {
                return Err(RuntimeError::new(
                    span,
                    format!(
                        "super constructor expects {} arguments, got {}",
                        ctor.params.len(),
                        args.len()
                    ),
                ));
            }

            let this_val = env.get("this").unwrap_or(Value::Null);
            let ctor_env = Environment::with_parent(owner.env.clone());
            let _ = ctor_env.define("this", this_val, true);
            let _ = ctor_env.define("__class__", Value::Class(owner.clone()), true);
            for (param, arg) in ctor.params.iter().zip(args) {
                ctor_env
                    .define(param, arg.clone(), false)
                    .map_err(|e| RuntimeError::new(span, e))?;
            }

            self.exec_block(&ctor.body, ctor_env)?;
        }

        Ok(Value::Null)
    }

    /// `super.method(args)`: method lookup starting at the superclass of the
    /// class owning the currently running method, so nested super calls
    /// climb the chain one step at a time.
    fn call_super_method(
        &self,
        method_name: &str,
        args: &[Value],
        span: Span,
        env: &Rc<Environment>,
    ) -> Eval {
        let class_val = env
            .get("__class__")
            .ok_or_else(|| RuntimeError::new(span, "super used outside of a class"))?;
        let Value::Class(cls) = class_val else {
            return Err(RuntimeError::new(span, "super used outside of a class"));
        };
        let Some(superclass) = cls.superclass.clone() else {
            return Err(RuntimeError::new(span, "class has no super class"));
        };

        let Some((owner, idx)) = find_method(&superclass, method_name) else {
            return Err(RuntimeError::new(
                span,
                format!("super class has no method '{}'", method_name),
            ));
        };
        let method = &owner.decl.methods[idx];
        if args.len() != method.params.len() {
            return Err(RuntimeError::new(
                span,
                format!(
                    "super.{}() expects {} arguments, got {}",
                    method_name,
                    method.params.len(),
                    args.len()
                ),
            ));
        }

        let this_val = env.get("this").unwrap_or(Value::Null);
        let method_env = Environment::with_parent(owner.env.clone());
        let _ = method_env.define("this", this_val, true);
        let _ = method_env.define("__class__", Value::Class(owner.clone()), true);
        for (param, arg) in method.params.iter().zip(args) {
            method_env
                .define(param, arg.clone(), false)
                .map_err(|e| RuntimeError::new(span, e))?;
        }

        match self.exec_block(&method.body, method_env)? {
            ExecResult::Return(value) => Ok(value),
            _ => Ok(Value::Null),
        }
    }

    fn eval_new(&self, class_name: &str, args: &[Expr], span: Span, env: &Rc<Environment>) -> Eval {
        let class_val = env
            .get(class_name)
            .ok_or_else(|| RuntimeError::new(span, format!("undefined class '{}'", class_name)))?;
        let Value::Class(cls) = class_val else {
            return Err(RuntimeError::new(
                span,
                format!("'{}' is not a class", class_name),
            ));
        };

        let args = self.eval_args(args, env)?;

        let obj = Rc::new(ObjectValue {
            class: cls.clone(),
            props: RefCell::new(HashMap::new()),
        });

        match find_constructor(&cls) {
            Some(owner) => {
                if let Some(ctor) = owner.decl.constructor.as_ref() {
                    if args.len() != ctor.params.len() {
                        return Err(RuntimeError::new(
                            span,
                            format!(
                                "{} constructor expects {} arguments, got {}",
                                class_name,
                                ctor.params.len(),
                                args.len()
                            ),
                        ));
                    }

                    let ctor_env = Environment::with_parent(owner.env.clone());
                    let _ = ctor_env.define("this", Value::Object(obj.clone()), true);
                    let _ = ctor_env.define("__class__", Value::Class(owner.clone()), true);
                    for (param, arg) in ctor.params.iter().zip(&args) {
                        ctor_env
                            .define(param, arg.clone(), false)
                            .map_err(|e| RuntimeError::new(span, e))?;
                    }

                    // A `return` merely ends the constructor early.
                    self.exec_block(&ctor.body, ctor_env)?;
                }
            }
            None => {
                if !args.is_empty() {
                    return Err(RuntimeError::new(
                        span,
                        format!(
                            "{} has no constructor but was called with {} arguments",
                            class_name,
                            args.len()
                        ),
                    ));
                }
            }
        }

        Ok(Value::Object(obj))
    }

    // ---- member and index access ----

    pub(crate) fn member_value(&self, obj: &Value, property: &str, span: Span) -> Eval {
        match obj {
            Value::Object(o) => Ok(o
                .props
                .borrow()
                .get(property)
                .cloned()
                .unwrap_or(Value::Null)),
            Value::Map(m) => Ok(m
                .borrow()
                .values
                .get(property)
                .cloned()
                .unwrap_or(Value::Null)),
            Value::Array(arr) => {
                if property == "length" {
                    Ok(Value::Int(arr.borrow().len() as i64))
                } else {
                    Err(RuntimeError::new(
                        span,
                        format!("array has no property '{}'", property),
                    ))
                }
            }
            Value::String(s) => {
                if property == "length" {
                    Ok(Value::Int(s.len() as i64))
                } else {
                    Err(RuntimeError::new(
                        span,
                        format!("string has no property '{}'", property),
                    ))
                }
            }
            Value::EnumType(e) => match e.variants.iter().position(|v| v == property) {
                Some(ordinal) => Ok(Value::EnumVariant(Rc::new(EnumVariantValue {
                    enum_name: e.name.clone(),
                    variant: property.to_string(),
                    ordinal,
                }))),
                None => Err(RuntimeError::new(
                    span,
                    format!("enum '{}' has no variant '{}'", e.name, property),
                )),
            },
            _ => Err(RuntimeError::new(
                span,
                format!(
                    "cannot access property '{}' on value of type '{}'",
                    property,
                    obj.type_name()
                ),
            )),
        }
    }

    fn index_value(&self, obj: &Value, index: &Value, span: Span) -> Eval {
        match obj {
            Value::String(s) => {
                let idx = to_i64(index)
                    .ok_or_else(|| RuntimeError::new(span, "string index must be an integer"))?;
                if idx < 0 || idx as usize >= s.len() {
                    return Err(RuntimeError::new(
                        span,
                        format!("string index {} out of range (length {})", idx, s.len()),
                    ));
                }
                // Byte-based indexing: a single byte, widened as a char.
                let byte = s.as_bytes()[idx as usize];
                Ok(Value::String((byte as char).to_string()))
            }
            Value::Array(arr) => {
                let idx = to_i64(index)
                    .ok_or_else(|| RuntimeError::new(span, "array index must be an integer"))?;
                let elements = arr.borrow();
                if idx < 0 || idx as usize >= elements.len() {
                    return Err(RuntimeError::new(
                        span,
                        format!("array index {} out of range (length {})", idx, elements.len()),
                    ));
                }
                Ok(elements[idx as usize].clone())
            }
            Value::Map(m) => {
                let Value::String(key) = index else {
                    return Err(RuntimeError::new(
                        span,
                        format!("map key must be a string, got '{}'", index.type_name()),
                    ));
                };
                Ok(m.borrow().values.get(key).cloned().unwrap_or(Value::Null))
            }
            _ => Err(RuntimeError::new(
                span,
                format!("cannot index value of type '{}'", obj.type_name()),
            )),
        }
    }
}
