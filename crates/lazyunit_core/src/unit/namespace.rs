//! Acquired unit namespace.

use crate::unit::error::{UnitError, UnitResult};
use crate::unit::value::{Forward, Value};
use std::collections::BTreeMap;
use std::fmt::{Debug, Display, Formatter};
use std::sync::{PoisonError, RwLock};

/// Member table of one acquired unit.
///
/// Members stay writable after acquisition, so writes through a deferred
/// reference land here.
pub struct Namespace {
    name: String,
    members: RwLock<BTreeMap<String, Value>>,
}

impl Namespace {
    pub fn new(name: impl Into<String>, members: BTreeMap<String, Value>) -> Self {
        Self {
            name: name.into(),
            members: RwLock::new(members),
        }
    }

    fn missing(&self, member: &str) -> UnitError {
        UnitError::MissingMember {
            unit: self.name.clone(),
            member: member.to_string(),
        }
    }
}

impl Forward for Namespace {
    fn read(&self, member: &str) -> UnitResult<Value> {
        self.members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(member)
            .cloned()
            .ok_or_else(|| self.missing(member))
    }

    fn write(&self, member: &str, value: Value) -> UnitResult<()> {
        self.members
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(member.to_string(), value);
        Ok(())
    }

    fn delete(&self, member: &str) -> UnitResult<()> {
        self.members
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(member)
            .map(|_| ())
            .ok_or_else(|| self.missing(member))
    }

    fn index(&self, key: &Value) -> UnitResult<Value> {
        match key.as_str() {
            Some(member) => self.read(member),
            None => Err(UnitError::NotIndexable(self.to_string())),
        }
    }
}

impl Display for Namespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<unit '{}'>", self.name)
    }
}

impl Debug for Namespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}
