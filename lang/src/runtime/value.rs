//! Runtime values for the Light interpreter.
//!
//! Primitives (`Int`, `Float`, `String`, `Bool`, `Null`) have value
//! semantics. Arrays, maps, and objects are `Rc`-shared heap values with
//! interior mutability: assignment and argument passing alias, and mutation
//! through one handle is visible through every other.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::parser::ast::{Block, ClassDecl, InterfaceDecl};
use crate::runtime::env::Environment;

#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Null,
    Array(Rc<RefCell<Vec<Value>>>),
    Map(Rc<RefCell<MapValue>>),
    Function(Rc<FunctionValue>),
    Builtin(Rc<BuiltinValue>),
    Class(Rc<ClassValue>),
    Object(Rc<ObjectValue>),
    EnumType(Rc<EnumValue>),
    EnumVariant(Rc<EnumVariantValue>),
    Interface(Rc<InterfaceDecl>),
}

/// Map contents: insertion-ordered keys alongside the key/value mapping.
/// Overwriting an existing key does not change its position.
#[derive(Debug, Clone, Default)]
pub struct MapValue {
    pub keys: Vec<String>,
    pub values: HashMap<String, Value>,
}

impl MapValue {
    /// Inserts or overwrites an entry, appending the key on first insertion.
    pub fn insert(&mut self, key: String, value: Value) {
        if !self.values.contains_key(&key) {
            self.keys.push(key.clone());
        }
        self.values.insert(key, value);
    }
}

/// A user-defined function together with its captured defining environment.
pub struct FunctionValue {
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
    pub closure: Rc<Environment>,
}

impl fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The closure environment routinely points back at this function;
        // keep Debug output acyclic.
        f.debug_struct("FunctionValue")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

pub type BuiltinFn = Box<dyn Fn(&[Value]) -> Result<Value, String>>;

/// A native function. Builtin errors carry only a message; the interpreter
/// attaches the call span.
pub struct BuiltinValue {
    pub name: &'static str,
    pub func: BuiltinFn,
}

impl fmt::Debug for BuiltinValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinValue").field("name", &self.name).finish()
    }
}

/// A class definition bound in an environment. `superclass` is the resolved
/// parent, forming a finite chain.
pub struct ClassValue {
    pub decl: Rc<ClassDecl>,
    pub env: Rc<Environment>,
    pub superclass: Option<Rc<ClassValue>>,
}

impl ClassValue {
    pub fn name(&self) -> &str {
        &self.decl.name
    }
}

impl fmt::Debug for ClassValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassValue")
            .field("name", &self.decl.name)
            .field("superclass", &self.superclass.as_ref().map(|s| s.decl.name.clone()))
            .finish()
    }
}

/// An instance of a class.
pub struct ObjectValue {
    pub class: Rc<ClassValue>,
    pub props: RefCell<HashMap<String, Value>>,
}

impl fmt::Debug for ObjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Properties can refer back to the object itself.
        f.debug_struct("ObjectValue")
            .field("class", &self.class.decl.name)
            .finish()
    }
}

/// An enum type: a name plus its ordered variants.
#[derive(Debug, Clone)]
pub struct EnumValue {
    pub name: String,
    pub variants: Vec<String>,
}

/// A single enum variant value, e.g. `Color.Red`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumVariantValue {
    pub enum_name: String,
    pub variant: String,
    pub ordinal: usize,
}

/// Walks the class inheritance chain looking for a method. Returns the
/// owning class and the method's index in its declaration.
pub fn find_method(cls: &Rc<ClassValue>, name: &str) -> Option<(Rc<ClassValue>, usize)> {
    let mut current = Some(cls.clone());
    while let Some(c) = current {
        if let Some(idx) = c.decl.methods.iter().position(|m| m.name == name) {
            return Some((c, idx));
        }
        current = c.superclass.clone();
    }
    None
}

/// Walks the chain to the nearest class that declares a constructor.
pub fn find_constructor(cls: &Rc<ClassValue>) -> Option<Rc<ClassValue>> {
    let mut current = Some(cls.clone());
    while let Some(c) = current {
        if c.decl.constructor.is_some() {
            return Some(c);
        }
        current = c.superclass.clone();
    }
    None
}

impl Value {
    /// The name `typeOf` reports. Enum variants report their enum's name.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bool(_) => "bool",
            Value::Null => "null",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Function(_) => "function",
            Value::Builtin(_) => "builtin",
            Value::Class(_) => "class",
            Value::Object(_) => "object",
            Value::EnumType(_) => "enum",
            Value::EnumVariant(v) => &v.enum_name,
            Value::Interface(_) => "interface",
        }
    }

    /// Truthiness: `null`, `false`, `0`, `0.0`, and `""` are falsy,
    /// everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::String(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Null => f.write_str("null"),
            Value::Array(elements) => {
                f.write_str("[")?;
                for (i, elem) in elements.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match elem {
                        Value::String(s) => write!(f, "{:?}", s)?,
                        other => write!(f, "{}", other)?,
                    }
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                let map = map.borrow();
                f.write_str("{")?;
                for (i, key) in map.keys.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:?}: ", key)?;
                    match map.values.get(key) {
                        Some(Value::String(s)) => write!(f, "{:?}", s)?,
                        Some(other) => write!(f, "{}", other)?,
                        None => f.write_str("null")?,
                    }
                }
                f.write_str("}")
            }
            Value::Function(func) => write!(f, "<function {}>", func.name),
            Value::Builtin(b) => write!(f, "<builtin {}>", b.name),
            Value::Class(cls) => write!(f, "<class {}>", cls.decl.name),
            Value::Object(obj) => write!(f, "<object {}>", obj.class.decl.name),
            Value::EnumType(e) => write!(f, "<enum {}>", e.name),
            Value::EnumVariant(v) => write!(f, "{}.{}", v.enum_name, v.variant),
            Value::Interface(i) => write!(f, "<interface {}>", i.name),
        }
    }
}

/// Language-level equality: structural for primitives (with Int/Float
/// cross-type numeric equality), reference identity for heap values, and
/// field equality for enum variants.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Int(x), Value::Float(y)) | (Value::Float(y), Value::Int(x)) => (*x as f64) == *y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Null, Value::Null) => true,
        (Value::Array(x), Value::Array(y)) => Rc::ptr_eq(x, y),
        (Value::Map(x), Value::Map(y)) => Rc::ptr_eq(x, y),
        (Value::Function(x), Value::Function(y)) => Rc::ptr_eq(x, y),
        (Value::Builtin(x), Value::Builtin(y)) => Rc::ptr_eq(x, y),
        (Value::Class(x), Value::Class(y)) => Rc::ptr_eq(x, y),
        (Value::Object(x), Value::Object(y)) => Rc::ptr_eq(x, y),
        (Value::EnumType(x), Value::EnumType(y)) => Rc::ptr_eq(x, y),
        (Value::EnumVariant(x), Value::EnumVariant(y)) => {
            x.enum_name == y.enum_name && x.variant == y.variant
        }
        (Value::Interface(x), Value::Interface(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

/// Ordering used by the default `sort` comparator: numeric when both sides
/// are numbers, otherwise by display form.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    if let (Some(x), Some(y)) = (to_f64(a), to_f64(b)) {
        return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
    }
    a.to_string().cmp(&b.to_string())
}

/// Numeric widening to f64 for Int and Float values.
pub fn to_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Int(n) => Some(*n as f64),
        Value::Float(n) => Some(*n),
        _ => None,
    }
}

/// Numeric narrowing to i64, truncating floats toward zero.
pub fn to_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Int(n) => Some(*n),
        Value::Float(n) => Some(*n as i64),
        _ => None,
    }
}

/// Joins the display forms of values with a separator.
pub fn values_string(vals: &[Value], sep: &str) -> String {
    vals.iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(sep)
}
