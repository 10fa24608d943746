//! Member value model and the forwarding capability contract.
//!
//! # Responsibility
//! - Define the fixed set of operations a deferred reference can forward.
//! - Provide the value type units expose as members.
//!
//! # Invariants
//! - Every forwarding operation has an explicit `Unsupported` fallback; a
//!   target never panics for an operation it does not implement.

use crate::unit::error::{UnitError, UnitResult};
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// Operations a caller may perform on a unit or on one of its members.
///
/// Implementors only override what they support; the defaults report
/// [`UnitError::Unsupported`].
pub trait Forward: Debug + Display + Send + Sync {
    fn read(&self, member: &str) -> UnitResult<Value> {
        let _ = member;
        Err(UnitError::unsupported(self.to_string(), "member reads"))
    }

    fn write(&self, member: &str, value: Value) -> UnitResult<()> {
        let _ = (member, value);
        Err(UnitError::unsupported(self.to_string(), "member writes"))
    }

    fn delete(&self, member: &str) -> UnitResult<()> {
        let _ = member;
        Err(UnitError::unsupported(self.to_string(), "member deletes"))
    }

    fn call(&self, args: &[Value]) -> UnitResult<Value> {
        let _ = args;
        Err(UnitError::NotCallable(self.to_string()))
    }

    fn index(&self, key: &Value) -> UnitResult<Value> {
        let _ = key;
        Err(UnitError::NotIndexable(self.to_string()))
    }
}

impl<T: Forward + ?Sized> Forward for Arc<T> {
    fn read(&self, member: &str) -> UnitResult<Value> {
        (**self).read(member)
    }

    fn write(&self, member: &str, value: Value) -> UnitResult<()> {
        (**self).write(member, value)
    }

    fn delete(&self, member: &str) -> UnitResult<()> {
        (**self).delete(member)
    }

    fn call(&self, args: &[Value]) -> UnitResult<Value> {
        (**self).call(args)
    }

    fn index(&self, key: &Value) -> UnitResult<Value> {
        (**self).index(key)
    }
}

type NativeFnBody = dyn Fn(&[Value]) -> UnitResult<Value> + Send + Sync;

/// Named native function exposed as a unit member.
#[derive(Clone)]
pub struct NativeFn {
    name: Arc<str>,
    body: Arc<NativeFnBody>,
}

impl NativeFn {
    pub fn new<F>(name: &str, body: F) -> Self
    where
        F: Fn(&[Value]) -> UnitResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name),
            body: Arc::new(body),
        }
    }

    pub fn invoke(&self, args: &[Value]) -> UnitResult<Value> {
        (self.body)(args)
    }
}

impl PartialEq for NativeFn {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.body, &other.body)
    }
}

impl Debug for NativeFn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<fn {}>", self.name)
    }
}

/// Dynamically typed member value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Function(NativeFn),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Short type name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::List(_) => "list",
            Self::Function(_) => "function",
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Str(value) => write!(f, "{value}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (position, item) in items.iter().enumerate() {
                    if position > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Function(function) => write!(f, "{function:?}"),
        }
    }
}

impl Forward for Value {
    fn call(&self, args: &[Value]) -> UnitResult<Value> {
        match self {
            Self::Function(function) => function.invoke(args),
            other => Err(UnitError::NotCallable(other.kind().to_string())),
        }
    }

    // Negative indices count from the end.
    fn index(&self, key: &Value) -> UnitResult<Value> {
        let (Self::List(items), Some(index)) = (self, key.as_int()) else {
            return Err(UnitError::NotIndexable(self.kind().to_string()));
        };
        let len = items.len();
        let position = if index < 0 {
            i64::try_from(len).ok().and_then(|len| len.checked_add(index))
        } else {
            Some(index)
        };
        position
            .and_then(|position| usize::try_from(position).ok())
            .and_then(|position| items.get(position))
            .cloned()
            .ok_or(UnitError::IndexOutOfRange { len, index })
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}

impl From<NativeFn> for Value {
    fn from(value: NativeFn) -> Self {
        Self::Function(value)
    }
}
