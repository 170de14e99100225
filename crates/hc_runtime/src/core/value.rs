//! Host value representation.

use std::fmt;
use std::rc::Rc;

use super::module::ModuleRef;
use super::object::ObjRef;
use super::text::Text;
use super::typeobj::{MethodDef, TypeRef};

/// A method looked up on an object, holding a reference to its receiver.
pub struct BoundMethod {
    pub def: &'static MethodDef,
    pub receiver: ObjRef,
}

#[derive(Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Str(Text),
    Object(ObjRef),
    Type(TypeRef),
    Module(ModuleRef),
    /// A module-level function.
    Builtin(&'static MethodDef),
    Method(Rc<BoundMethod>),
}

impl Value {
    pub fn str(s: &str) -> Value {
        Value::Str(Text::from_str(s))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Str(_) => "str",
            Value::Object(o) => o.type_object().short_name(),
            Value::Type(_) => "type",
            Value::Module(_) => "module",
            Value::Builtin(_) => "builtin_function_or_method",
            Value::Method(_) => "method",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Value::Str(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn repr(&self) -> String {
        match self {
            Value::Str(t) => {
                let mut out = String::with_capacity(t.len() + 2);
                out.push('\'');
                for c in t.chars() {
                    match c {
                        '\\' => out.push_str("\\\\"),
                        '\'' => out.push_str("\\'"),
                        '\n' => out.push_str("\\n"),
                        _ => out.push(c),
                    }
                }
                out.push('\'');
                out
            }
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(i) => f.write_str(itoa::Buffer::new().format(*i)),
            Value::Str(t) => f.write_str(t.as_str()),
            Value::Object(o) => write!(f, "{o:?}"),
            Value::Type(t) => write!(f, "<class '{}'>", t.name),
            Value::Module(m) => write!(f, "<module '{}'>", m.name()),
            Value::Builtin(def) => write!(f, "<built-in function {}>", def.name),
            Value::Method(bm) => write!(
                f,
                "<built-in method {} of {} object>",
                bm.def.name,
                bm.receiver.type_object().short_name()
            ),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

/// Scalars compare by value, everything else by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.is(b),
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::Module(a), Value::Module(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => std::ptr::eq(*a, *b),
            (Value::Method(a), Value::Method(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::str(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(Text::from_string(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}
