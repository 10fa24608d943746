//! Deferred reference proxy.
//!
//! # Responsibility
//! - Stand in for a unit (or one of its members) that has not been acquired.
//! - Acquire it on the first forwarded operation and reuse the result after.
//!
//! # Invariants
//! - Construction never runs the resolver unless eager mode is configured.
//! - A successful resolution is stored once and never replaced.
//! - A failed resolution is not cached; the next force retries.
//! - `Debug`/`Display` never run the resolver.

use crate::defer::config::{self, LoadMode};
use crate::unit::error::UnitResult;
use crate::unit::value::{Forward, Value};
use log::{debug, warn};
use once_cell::sync::OnceCell;
use std::fmt::{Debug, Display, Formatter};

type Resolver<T> = dyn Fn() -> UnitResult<T> + Send + Sync;

/// Lazily materialized handle to a value produced by a resolver callback.
///
/// Concurrent first use is serialized by the underlying cell: one thread
/// runs the resolver while the others wait for its result.
pub struct DeferredRef<T> {
    label: Option<String>,
    resolver: Box<Resolver<T>>,
    cell: OnceCell<T>,
}

impl<T> DeferredRef<T> {
    /// Creates an unlabeled reference using the process-wide load mode.
    pub fn new<F>(resolver: F) -> Self
    where
        F: Fn() -> UnitResult<T> + Send + Sync + 'static,
    {
        Self::with_mode(None, config::global().load_mode, resolver)
    }

    /// Creates a reference whose unresolved representation names `label`.
    pub fn labeled<F>(label: impl Into<String>, resolver: F) -> Self
    where
        F: Fn() -> UnitResult<T> + Send + Sync + 'static,
    {
        Self::with_mode(Some(label.into()), config::global().load_mode, resolver)
    }

    /// Like [`DeferredRef::labeled`], but an eager-mode failure is returned
    /// to the caller instead of being deferred to the first force.
    pub fn try_labeled<F>(label: impl Into<String>, resolver: F) -> UnitResult<Self>
    where
        F: Fn() -> UnitResult<T> + Send + Sync + 'static,
    {
        Self::try_with_mode(Some(label.into()), config::global().load_mode, resolver)
    }

    /// Creates a reference with an explicit load mode.
    ///
    /// In eager mode the resolver runs here; a failure is logged and the
    /// reference stays unresolved, so the error resurfaces on first force.
    /// Use [`DeferredRef::try_with_mode`] to receive the failure here.
    pub fn with_mode<F>(label: Option<String>, mode: LoadMode, resolver: F) -> Self
    where
        F: Fn() -> UnitResult<T> + Send + Sync + 'static,
    {
        let reference = Self::unresolved(label, resolver);
        if mode == LoadMode::Eager {
            if let Err(err) = reference.force() {
                warn!(
                    "event=eager_resolve_failed module=defer status=deferred label={} error={}",
                    reference.label_or_anonymous(),
                    err
                );
            }
        }
        reference
    }

    /// Creates a reference with an explicit load mode, failing construction
    /// when eager resolution fails.
    pub fn try_with_mode<F>(
        label: Option<String>,
        mode: LoadMode,
        resolver: F,
    ) -> UnitResult<Self>
    where
        F: Fn() -> UnitResult<T> + Send + Sync + 'static,
    {
        let reference = Self::unresolved(label, resolver);
        if mode == LoadMode::Eager {
            reference.force()?;
        }
        Ok(reference)
    }

    fn unresolved<F>(label: Option<String>, resolver: F) -> Self
    where
        F: Fn() -> UnitResult<T> + Send + Sync + 'static,
    {
        Self {
            label,
            resolver: Box::new(resolver),
            cell: OnceCell::new(),
        }
    }

    /// Resolves the target if needed and returns it.
    pub fn force(&self) -> UnitResult<&T> {
        self.cell.get_or_try_init(|| match (self.resolver)() {
            Ok(value) => {
                debug!(
                    "event=unit_resolved module=defer status=ok label={}",
                    self.label_or_anonymous()
                );
                Ok(value)
            }
            Err(err) => {
                debug!(
                    "event=unit_resolve_failed module=defer status=error label={} error={}",
                    self.label_or_anonymous(),
                    err
                );
                Err(err)
            }
        })
    }

    /// Returns the target only if it is already resolved.
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    pub fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }

    fn label_or_anonymous(&self) -> &str {
        self.label.as_deref().unwrap_or("<anonymous>")
    }

    fn write_sentinel(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.label {
            Some(label) => write!(f, "<deferred '{label}' (not loaded)>"),
            None => write!(f, "<deferred (not loaded)>"),
        }
    }
}

impl<T: Forward> Forward for DeferredRef<T> {
    fn read(&self, member: &str) -> UnitResult<Value> {
        self.force()?.read(member)
    }

    fn write(&self, member: &str, value: Value) -> UnitResult<()> {
        self.force()?.write(member, value)
    }

    fn delete(&self, member: &str) -> UnitResult<()> {
        self.force()?.delete(member)
    }

    fn call(&self, args: &[Value]) -> UnitResult<Value> {
        self.force()?.call(args)
    }

    fn index(&self, key: &Value) -> UnitResult<Value> {
        self.force()?.index(key)
    }
}

impl<T: Debug> Debug for DeferredRef<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.cell.get() {
            Some(target) => Debug::fmt(target, f),
            None => self.write_sentinel(f),
        }
    }
}

impl<T: Display> Display for DeferredRef<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.cell.get() {
            Some(target) => Display::fmt(target, f),
            None => self.write_sentinel(f),
        }
    }
}
