//! Lexical environments: parent-chained scopes holding named bindings.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::runtime::value::Value;

/// A single scope in the environment chain. Blocks, function calls, and loop
/// iterations each allocate a child; closures keep their defining
/// environment alive through the `Rc`.
#[derive(Debug, Default)]
pub struct Environment {
    bindings: RefCell<HashMap<String, Value>>,
    consts: RefCell<HashSet<String>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    /// Creates a root environment with no parent.
    pub fn new() -> Rc<Environment> {
        Rc::new(Environment::default())
    }

    /// Creates a child scope of the given environment.
    pub fn with_parent(parent: Rc<Environment>) -> Rc<Environment> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            consts: RefCell::new(HashSet::new()),
            parent: Some(parent),
        })
    }

    /// Declares a new binding in this scope. Redeclaring a name already
    /// present in this scope is an error; shadowing a parent binding is not.
    pub fn define(&self, name: &str, value: Value, is_const: bool) -> Result<(), String> {
        let mut bindings = self.bindings.borrow_mut();
        if bindings.contains_key(name) {
            return Err(format!("variable '{}' already declared in this scope", name));
        }
        bindings.insert(name.to_string(), value);
        if is_const {
            self.consts.borrow_mut().insert(name.to_string());
        }
        Ok(())
    }

    /// Looks a name up, walking the parent chain to the first hit.
    pub fn get(&self, name: &str) -> Option<Value> {
        let mut env = self;
        loop {
            if let Some(value) = env.bindings.borrow().get(name) {
                return Some(value.clone());
            }
            match &env.parent {
                Some(parent) => env = parent,
                None => return None,
            }
        }
    }

    /// Assigns to the nearest existing binding in the chain. Fails for
    /// undefined names and for constants.
    pub fn set(&self, name: &str, value: Value) -> Result<(), String> {
        let mut env = self;
        loop {
            if env.bindings.borrow().contains_key(name) {
                if env.consts.borrow().contains(name) {
                    return Err(format!("cannot assign to constant '{}'", name));
                }
                env.bindings.borrow_mut().insert(name.to_string(), value);
                return Ok(());
            }
            match &env.parent {
                Some(parent) => env = parent,
                None => return Err(format!("undefined variable '{}'", name)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_then_get() {
        let env = Environment::new();
        env.define("x", Value::Int(1), false).unwrap();
        assert!(matches!(env.get("x"), Some(Value::Int(1))));
        assert!(env.get("y").is_none());
    }

    #[test]
    fn redeclaration_in_same_scope_fails() {
        let env = Environment::new();
        env.define("x", Value::Int(1), false).unwrap();
        let err = env.define("x", Value::Int(2), false).unwrap_err();
        assert!(err.contains("already declared"));
    }

    #[test]
    fn child_shadows_parent() {
        let parent = Environment::new();
        parent.define("x", Value::Int(1), false).unwrap();

        let child = Environment::with_parent(parent.clone());
        child.define("x", Value::Int(2), false).unwrap();

        assert!(matches!(child.get("x"), Some(Value::Int(2))));
        assert!(matches!(parent.get("x"), Some(Value::Int(1))));
    }

    #[test]
    fn set_walks_to_nearest_binding() {
        let parent = Environment::new();
        parent.define("x", Value::Int(1), false).unwrap();

        let child = Environment::with_parent(parent.clone());
        child.set("x", Value::Int(5)).unwrap();

        assert!(matches!(parent.get("x"), Some(Value::Int(5))));
    }

    #[test]
    fn set_undefined_fails() {
        let env = Environment::new();
        let err = env.set("missing", Value::Null).unwrap_err();
        assert_eq!(err, "undefined variable 'missing'");
    }

    #[test]
    fn set_const_fails() {
        let env = Environment::new();
        env.define("pi", Value::Float(3.14), true).unwrap();
        let err = env.set("pi", Value::Int(3)).unwrap_err();
        assert_eq!(err, "cannot assign to constant 'pi'");
    }

    #[test]
    fn const_in_parent_fails_from_child() {
        let parent = Environment::new();
        parent.define("c", Value::Int(1), true).unwrap();
        let child = Environment::with_parent(parent);
        let err = child.set("c", Value::Int(2)).unwrap_err();
        assert!(err.contains("cannot assign to constant"));
    }
}
