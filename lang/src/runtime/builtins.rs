//! Built-in functions registered into the global environment.
//!
//! All built-ins are bound as constants, so user code cannot shadow them at
//! the top level. Errors are returned as plain messages; the interpreter
//! attaches the span of the offending call.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use crate::runtime::env::Environment;
use crate::runtime::interpreter::Output;
use crate::runtime::value::{
    find_method, values_string, BuiltinFn, BuiltinValue, Value,
};

pub fn register_builtins(env: &Rc<Environment>, output: Output) {
    let define = |name: &'static str, func: BuiltinFn| {
        // The global scope is freshly created; registration cannot collide.
        let _ = env.define(name, Value::Builtin(Rc::new(BuiltinValue { name, func })), true);
    };

    let out = output.clone();
    define(
        "print",
        Box::new(move |args| {
            let _ = writeln!(out.borrow_mut(), "{}", values_string(args, " "));
            Ok(Value::Null)
        }),
    );

    let out = output;
    define(
        "println",
        Box::new(move |args| {
            let _ = writeln!(out.borrow_mut(), "{}", values_string(args, " "));
            Ok(Value::Null)
        }),
    );

    define(
        "typeOf",
        Box::new(|args| {
            if args.len() != 1 {
                return Err(format!("typeOf() expects 1 argument, got {}", args.len()));
            }
            Ok(Value::String(args[0].type_name().to_string()))
        }),
    );

    define(
        "toString",
        Box::new(|args| {
            if args.len() != 1 {
                return Err(format!("toString() expects 1 argument, got {}", args.len()));
            }
            Ok(Value::String(args[0].to_string()))
        }),
    );

    define(
        "len",
        Box::new(|args| {
            if args.len() != 1 {
                return Err(format!("len() expects 1 argument, got {}", args.len()));
            }
            match &args[0] {
                Value::String(s) => Ok(Value::Int(s.len() as i64)),
                Value::Array(arr) => Ok(Value::Int(arr.borrow().len() as i64)),
                Value::Map(m) => Ok(Value::Int(m.borrow().keys.len() as i64)),
                other => Err(format!("len() not supported for type '{}'", other.type_name())),
            }
        }),
    );

    define(
        "push",
        Box::new(|args| {
            if args.len() != 2 {
                return Err(format!("push() expects 2 arguments, got {}", args.len()));
            }
            let Value::Array(arr) = &args[0] else {
                return Err(format!(
                    "push() first argument must be an array, got '{}'",
                    args[0].type_name()
                ));
            };
            arr.borrow_mut().push(args[1].clone());
            Ok(Value::Int(arr.borrow().len() as i64))
        }),
    );

    define(
        "pop",
        Box::new(|args| {
            if args.len() != 1 {
                return Err(format!("pop() expects 1 argument, got {}", args.len()));
            }
            let Value::Array(arr) = &args[0] else {
                return Err(format!(
                    "pop() first argument must be an array, got '{}'",
                    args[0].type_name()
                ));
            };
            let popped = arr.borrow_mut().pop();
            popped.ok_or_else(|| "pop() on empty array".to_string())
        }),
    );

    define(
        "keys",
        Box::new(|args| {
            if args.len() != 1 {
                return Err(format!("keys() expects 1 argument, got {}", args.len()));
            }
            let Value::Map(m) = &args[0] else {
                return Err(format!(
                    "keys() expects a map argument, got '{}'",
                    args[0].type_name()
                ));
            };
            let keys: Vec<Value> = m.borrow().keys.iter().cloned().map(Value::String).collect();
            Ok(Value::Array(Rc::new(RefCell::new(keys))))
        }),
    );

    define(
        "values",
        Box::new(|args| {
            if args.len() != 1 {
                return Err(format!("values() expects 1 argument, got {}", args.len()));
            }
            let Value::Map(m) = &args[0] else {
                return Err(format!(
                    "values() expects a map argument, got '{}'",
                    args[0].type_name()
                ));
            };
            let m = m.borrow();
            let vals: Vec<Value> = m
                .keys
                .iter()
                .map(|k| m.values.get(k).cloned().unwrap_or(Value::Null))
                .collect();
            Ok(Value::Array(Rc::new(RefCell::new(vals))))
        }),
    );

    define(
        "implements",
        Box::new(|args| {
            if args.len() != 2 {
                return Err(format!("implements() expects 2 arguments, got {}", args.len()));
            }
            let Value::Object(obj) = &args[0] else {
                return Ok(Value::Bool(false));
            };
            let Value::Interface(iface) = &args[1] else {
                return Err(format!(
                    "implements() second argument must be an interface, got '{}'",
                    args[1].type_name()
                ));
            };
            for sig in &iface.methods {
                match find_method(&obj.class, &sig.name) {
                    Some((owner, idx))
                        if owner.decl.methods[idx].params.len() == sig.param_count => {}
                    _ => return Ok(Value::Bool(false)),
                }
            }
            Ok(Value::Bool(true))
        }),
    );
}
