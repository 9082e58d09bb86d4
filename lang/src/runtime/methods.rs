//! Receiver-based method surface for arrays and strings.
//!
//! Callback-taking methods iterate over a snapshot of the receiver so a
//! callback that mutates the array cannot invalidate the traversal.
//! String methods are byte-oriented throughout.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use crate::lexer::token::Span;
use crate::runtime::interpreter::{Interpreter, RuntimeError};
use crate::runtime::value::{compare_values, to_f64, to_i64, values_equal, values_string, Value};

type Eval = Result<Value, RuntimeError>;

/// Resolves negative offsets from the end and clamps to the container.
/// Returns `None` for an empty result range.
fn clamp_slice_range(len: usize, mut start: i64, mut end: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    if start < 0 {
        start += len;
    }
    if end < 0 {
        end += len;
    }
    if start < 0 {
        start = 0;
    }
    if end > len {
        end = len;
    }
    if start >= end {
        return None;
    }
    Some((start as usize, end as usize))
}

impl Interpreter {
    pub(crate) fn call_array_method(
        &self,
        arr: &Rc<RefCell<Vec<Value>>>,
        name: &str,
        args: &[Value],
        span: Span,
    ) -> Eval {
        match name {
            "push" => {
                if args.len() != 1 {
                    return Err(RuntimeError::new(
                        span,
                        format!("push() expects 1 argument, got {}", args.len()),
                    ));
                }
                arr.borrow_mut().push(args[0].clone());
                Ok(Value::Int(arr.borrow().len() as i64))
            }

            "pop" => {
                if !args.is_empty() {
                    return Err(RuntimeError::new(
                        span,
                        format!("pop() expects 0 arguments, got {}", args.len()),
                    ));
                }
                arr.borrow_mut()
                    .pop()
                    .ok_or_else(|| RuntimeError::new(span, "pop() on empty array"))
            }

            "map" => {
                if args.len() != 1 {
                    return Err(RuntimeError::new(
                        span,
                        format!("map() expects 1 argument, got {}", args.len()),
                    ));
                }
                let func = &args[0];
                let elements = arr.borrow().clone();
                let mut result = Vec::with_capacity(elements.len());
                for element in elements {
                    result.push(self.call_value(func.clone(), &[element], span)?);
                }
                Ok(Value::Array(Rc::new(RefCell::new(result))))
            }

            "filter" => {
                if args.len() != 1 {
                    return Err(RuntimeError::new(
                        span,
                        format!("filter() expects 1 argument, got {}", args.len()),
                    ));
                }
                let func = &args[0];
                let elements = arr.borrow().clone();
                let mut result = Vec::new();
                for element in elements {
                    if self
                        .call_value(func.clone(), &[element.clone()], span)?
                        .is_truthy()
                    {
                        result.push(element);
                    }
                }
                Ok(Value::Array(Rc::new(RefCell::new(result))))
            }

            "reduce" => {
                if args.is_empty() || args.len() > 2 {
                    return Err(RuntimeError::new(
                        span,
                        format!("reduce() expects 1-2 arguments, got {}", args.len()),
                    ));
                }
                let func = &args[0];
                let elements = arr.borrow().clone();
                let (mut acc, start_idx) = if args.len() == 2 {
                    (args[1].clone(), 0)
                } else {
                    if elements.is_empty() {
                        return Err(RuntimeError::new(
                            span,
                            "reduce() of empty array with no initial value",
                        ));
                    }
                    (elements[0].clone(), 1)
                };
                for element in &elements[start_idx..] {
                    acc = self.call_value(func.clone(), &[acc, element.clone()], span)?;
                }
                Ok(acc)
            }

            "forEach" => {
                if args.len() != 1 {
                    return Err(RuntimeError::new(
                        span,
                        format!("forEach() expects 1 argument, got {}", args.len()),
                    ));
                }
                let func = &args[0];
                let elements = arr.borrow().clone();
                for element in elements {
                    self.call_value(func.clone(), &[element], span)?;
                }
                Ok(Value::Null)
            }

            "find" => {
                if args.len() != 1 {
                    return Err(RuntimeError::new(
                        span,
                        format!("find() expects 1 argument, got {}", args.len()),
                    ));
                }
                let func = &args[0];
                let elements = arr.borrow().clone();
                for element in elements {
                    if self
                        .call_value(func.clone(), &[element.clone()], span)?
                        .is_truthy()
                    {
                        return Ok(element);
                    }
                }
                Ok(Value::Null)
            }

            "sort" => {
                if args.len() > 1 {
                    return Err(RuntimeError::new(
                        span,
                        format!("sort() expects 0-1 arguments, got {}", args.len()),
                    ));
                }
                let mut elements = arr.borrow().clone();
                if args.is_empty() {
                    elements.sort_by(|a, b| compare_values(a, b));
                } else {
                    let cmp = args[0].clone();
                    let mut sort_err: Option<RuntimeError> = None;
                    elements.sort_by(|a, b| {
                        if sort_err.is_some() {
                            return Ordering::Equal;
                        }
                        match self.call_value(cmp.clone(), &[a.clone(), b.clone()], span) {
                            Ok(result) => match to_f64(&result) {
                                Some(n) => n.partial_cmp(&0.0).unwrap_or(Ordering::Equal),
                                None => {
                                    sort_err = Some(RuntimeError::new(
                                        span,
                                        "sort comparator must return a number",
                                    ));
                                    Ordering::Equal
                                }
                            },
                            Err(err) => {
                                sort_err = Some(err);
                                Ordering::Equal
                            }
                        }
                    });
                    if let Some(err) = sort_err {
                        return Err(err);
                    }
                }
                *arr.borrow_mut() = elements;
                Ok(Value::Array(arr.clone()))
            }

            "reverse" => {
                arr.borrow_mut().reverse();
                Ok(Value::Array(arr.clone()))
            }

            "join" => {
                let sep = match args {
                    [] => ",".to_string(),
                    [Value::String(s)] => s.clone(),
                    [_] => {
                        return Err(RuntimeError::new(span, "join() separator must be a string"));
                    }
                    _ => {
                        return Err(RuntimeError::new(
                            span,
                            format!("join() expects 0-1 arguments, got {}", args.len()),
                        ));
                    }
                };
                let elements = arr.borrow();
                Ok(Value::String(values_string(&elements, &sep)))
            }

            "slice" => {
                if args.is_empty() || args.len() > 2 {
                    return Err(RuntimeError::new(
                        span,
                        format!("slice() expects 1-2 arguments, got {}", args.len()),
                    ));
                }
                let elements = arr.borrow();
                let start = to_i64(&args[0])
                    .ok_or_else(|| RuntimeError::new(span, "slice() start must be an integer"))?;
                let end = match args.get(1) {
                    Some(v) => to_i64(v)
                        .ok_or_else(|| RuntimeError::new(span, "slice() end must be an integer"))?,
                    None => elements.len() as i64,
                };
                let sliced = match clamp_slice_range(elements.len(), start, end) {
                    Some((a, b)) => elements[a..b].to_vec(),
                    None => Vec::new(),
                };
                Ok(Value::Array(Rc::new(RefCell::new(sliced))))
            }

            "indexOf" => {
                if args.len() != 1 {
                    return Err(RuntimeError::new(
                        span,
                        format!("indexOf() expects 1 argument, got {}", args.len()),
                    ));
                }
                let elements = arr.borrow();
                let idx = elements
                    .iter()
                    .position(|element| values_equal(element, &args[0]));
                Ok(Value::Int(idx.map_or(-1, |i| i as i64)))
            }

            "includes" => {
                if args.len() != 1 {
                    return Err(RuntimeError::new(
                        span,
                        format!("includes() expects 1 argument, got {}", args.len()),
                    ));
                }
                let found = arr
                    .borrow()
                    .iter()
                    .any(|element| values_equal(element, &args[0]));
                Ok(Value::Bool(found))
            }

            "concat" => {
                if args.len() != 1 {
                    return Err(RuntimeError::new(
                        span,
                        format!("concat() expects 1 argument, got {}", args.len()),
                    ));
                }
                let Value::Array(other) = &args[0] else {
                    return Err(RuntimeError::new(span, "concat() argument must be an array"));
                };
                let mut result = arr.borrow().clone();
                result.extend(other.borrow().iter().cloned());
                Ok(Value::Array(Rc::new(RefCell::new(result))))
            }

            "flat" => {
                let elements = arr.borrow();
                let mut result = Vec::new();
                for element in elements.iter() {
                    match element {
                        Value::Array(inner) => result.extend(inner.borrow().iter().cloned()),
                        other => result.push(other.clone()),
                    }
                }
                Ok(Value::Array(Rc::new(RefCell::new(result))))
            }

            _ => Err(RuntimeError::new(
                span,
                format!("array has no method '{}'", name),
            )),
        }
    }

    pub(crate) fn call_string_method(
        &self,
        s: &str,
        name: &str,
        args: &[Value],
        span: Span,
    ) -> Eval {
        match name {
            "split" => {
                if args.len() != 1 {
                    return Err(RuntimeError::new(
                        span,
                        format!("split() expects 1 argument, got {}", args.len()),
                    ));
                }
                let Value::String(sep) = &args[0] else {
                    return Err(RuntimeError::new(span, "split() separator must be a string"));
                };
                let parts: Vec<Value> = if sep.is_empty() {
                    // Empty separator splits into individual characters.
                    s.chars().map(|c| Value::String(c.to_string())).collect()
                } else {
                    s.split(sep.as_str())
                        .map(|part| Value::String(part.to_string()))
                        .collect()
                };
                Ok(Value::Array(Rc::new(RefCell::new(parts))))
            }

            "trim" => {
                if !args.is_empty() {
                    return Err(RuntimeError::new(
                        span,
                        format!("trim() expects 0 arguments, got {}", args.len()),
                    ));
                }
                Ok(Value::String(s.trim().to_string()))
            }

            "trimStart" => Ok(Value::String(
                s.trim_start_matches([' ', '\t', '\n', '\r']).to_string(),
            )),

            "trimEnd" => Ok(Value::String(
                s.trim_end_matches([' ', '\t', '\n', '\r']).to_string(),
            )),

            "indexOf" => {
                if args.len() != 1 {
                    return Err(RuntimeError::new(
                        span,
                        format!("indexOf() expects 1 argument, got {}", args.len()),
                    ));
                }
                let Value::String(sub) = &args[0] else {
                    return Err(RuntimeError::new(span, "indexOf() argument must be a string"));
                };
                Ok(Value::Int(s.find(sub.as_str()).map_or(-1, |i| i as i64)))
            }

            "slice" => {
                if args.is_empty() || args.len() > 2 {
                    return Err(RuntimeError::new(
                        span,
                        format!("slice() expects 1-2 arguments, got {}", args.len()),
                    ));
                }
                let start = to_i64(&args[0])
                    .ok_or_else(|| RuntimeError::new(span, "slice() start must be an integer"))?;
                let end = match args.get(1) {
                    Some(v) => to_i64(v)
                        .ok_or_else(|| RuntimeError::new(span, "slice() end must be an integer"))?,
                    None => s.len() as i64,
                };
                let bytes = s.as_bytes();
                let sliced = match clamp_slice_range(bytes.len(), start, end) {
                    Some((a, b)) => String::from_utf8_lossy(&bytes[a..b]).into_owned(),
                    None => String::new(),
                };
                Ok(Value::String(sliced))
            }

            "substring" => {
                if args.is_empty() || args.len() > 2 {
                    return Err(RuntimeError::new(
                        span,
                        format!("substring() expects 1-2 arguments, got {}", args.len()),
                    ));
                }
                let start = to_i64(&args[0]).ok_or_else(|| {
                    RuntimeError::new(span, "substring() start must be an integer")
                })?;
                let end = match args.get(1) {
                    Some(v) => to_i64(v).ok_or_else(|| {
                        RuntimeError::new(span, "substring() end must be an integer")
                    })?,
                    None => s.len() as i64,
                };
                // Negatives clamp to zero; a reversed range swaps.
                let len = s.len() as i64;
                let mut start = start.clamp(0, len) as usize;
                let mut end = end.clamp(0, len) as usize;
                if start > end {
                    std::mem::swap(&mut start, &mut end);
                }
                Ok(Value::String(
                    String::from_utf8_lossy(&s.as_bytes()[start..end]).into_owned(),
                ))
            }

            "toUpperCase" => Ok(Value::String(s.to_uppercase())),

            "toLowerCase" => Ok(Value::String(s.to_lowercase())),

            "replace" => {
                if args.len() != 2 {
                    return Err(RuntimeError::new(
                        span,
                        format!("replace() expects 2 arguments, got {}", args.len()),
                    ));
                }
                let (Value::String(old), Value::String(new)) = (&args[0], &args[1]) else {
                    return Err(RuntimeError::new(span, "replace() arguments must be strings"));
                };
                Ok(Value::String(s.replacen(old.as_str(), new, 1)))
            }

            "replaceAll" => {
                if args.len() != 2 {
                    return Err(RuntimeError::new(
                        span,
                        format!("replaceAll() expects 2 arguments, got {}", args.len()),
                    ));
                }
                let (Value::String(old), Value::String(new)) = (&args[0], &args[1]) else {
                    return Err(RuntimeError::new(
                        span,
                        "replaceAll() arguments must be strings",
                    ));
                };
                Ok(Value::String(s.replace(old.as_str(), new)))
            }

            "startsWith" => {
                if args.len() != 1 {
                    return Err(RuntimeError::new(
                        span,
                        format!("startsWith() expects 1 argument, got {}", args.len()),
                    ));
                }
                let Value::String(prefix) = &args[0] else {
                    return Err(RuntimeError::new(
                        span,
                        "startsWith() argument must be a string",
                    ));
                };
                Ok(Value::Bool(s.starts_with(prefix.as_str())))
            }

            "endsWith" => {
                if args.len() != 1 {
                    return Err(RuntimeError::new(
                        span,
                        format!("endsWith() expects 1 argument, got {}", args.len()),
                    ));
                }
                let Value::String(suffix) = &args[0] else {
                    return Err(RuntimeError::new(span, "endsWith() argument must be a string"));
                };
                Ok(Value::Bool(s.ends_with(suffix.as_str())))
            }

            "includes" => {
                if args.len() != 1 {
                    return Err(RuntimeError::new(
                        span,
                        format!("includes() expects 1 argument, got {}", args.len()),
                    ));
                }
                let Value::String(sub) = &args[0] else {
                    return Err(RuntimeError::new(span, "includes() argument must be a string"));
                };
                Ok(Value::Bool(s.contains(sub.as_str())))
            }

            "charAt" => {
                if args.len() != 1 {
                    return Err(RuntimeError::new(
                        span,
                        format!("charAt() expects 1 argument, got {}", args.len()),
                    ));
                }
                let idx = to_i64(&args[0])
                    .ok_or_else(|| RuntimeError::new(span, "charAt() argument must be an integer"))?;
                if idx < 0 || idx as usize >= s.len() {
                    return Ok(Value::String(String::new()));
                }
                let byte = s.as_bytes()[idx as usize];
                Ok(Value::String((byte as char).to_string()))
            }

            "repeat" => {
                if args.len() != 1 {
                    return Err(RuntimeError::new(
                        span,
                        format!("repeat() expects 1 argument, got {}", args.len()),
                    ));
                }
                let count = to_i64(&args[0]);
                match count {
                    Some(n) if n >= 0 => Ok(Value::String(s.repeat(n as usize))),
                    _ => Err(RuntimeError::new(
                        span,
                        "repeat() count must be a non-negative integer",
                    )),
                }
            }

            _ => Err(RuntimeError::new(
                span,
                format!("string has no method '{}'", name),
            )),
        }
    }
}
