//! Resolution chain contracts.
//!
//! # Responsibility
//! - Define how a requested name becomes a loadable unit description.
//! - Keep an ordered, shared list of resolvers consulted in turn.
//!
//! # Invariants
//! - Lookups iterate over a snapshot; the chain lock is never held while a
//!   resolver runs, so resolvers may re-enter the chain or mutate it.
//! - The first resolver returning a spec wins.

use crate::unit::error::UnitResult;
use crate::unit::value::Forward;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, PoisonError, RwLock};

/// Acquisition step for one resolved unit.
pub trait UnitLoader: Send + Sync {
    /// Runs the unit's initialization and returns the acquired unit.
    fn load(&self, spec: &UnitSpec) -> UnitResult<Arc<dyn Forward>>;

    /// Whether this loader already postpones acquisition.
    fn is_deferred(&self) -> bool {
        false
    }
}

/// Resolved description of a loadable unit.
#[derive(Clone)]
pub struct UnitSpec {
    pub name: String,
    /// Where the resolver found the unit, for diagnostics.
    pub origin: Option<String>,
    pub loader: Arc<dyn UnitLoader>,
}

impl UnitSpec {
    pub fn new(name: impl Into<String>, loader: Arc<dyn UnitLoader>) -> Self {
        Self {
            name: name.into(),
            origin: None,
            loader,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Runs this spec's loader.
    pub fn load(&self) -> UnitResult<Arc<dyn Forward>> {
        self.loader.load(self)
    }

    pub fn is_deferred(&self) -> bool {
        self.loader.is_deferred()
    }
}

impl Debug for UnitSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitSpec")
            .field("name", &self.name)
            .field("origin", &self.origin)
            .field("deferred", &self.is_deferred())
            .finish()
    }
}

/// One participant of the resolution chain.
pub trait UnitResolver: Send + Sync {
    /// Returns `Ok(None)` when this resolver does not handle `name`.
    ///
    /// `search_path` and `target` are optional hints forwarded unchanged
    /// along the chain.
    fn resolve(
        &self,
        name: &str,
        search_path: Option<&[String]>,
        target: Option<&str>,
    ) -> UnitResult<Option<UnitSpec>>;
}

/// Ordered list of resolvers.
#[derive(Default)]
pub struct ResolverChain {
    resolvers: RwLock<Vec<Arc<dyn UnitResolver>>>,
}

impl ResolverChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a resolver at the lowest priority.
    pub fn push(&self, resolver: Arc<dyn UnitResolver>) {
        self.resolvers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(resolver);
    }

    /// Inserts a resolver ahead of every existing one.
    pub fn insert_front(&self, resolver: Arc<dyn UnitResolver>) {
        self.resolvers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(0, resolver);
    }

    pub fn len(&self) -> usize {
        self.resolvers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the current resolvers in priority order.
    pub fn snapshot(&self) -> Vec<Arc<dyn UnitResolver>> {
        self.resolvers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Asks each resolver in order; the first spec wins.
    ///
    /// A resolver error aborts the lookup and is returned to the caller.
    pub fn find(
        &self,
        name: &str,
        search_path: Option<&[String]>,
        target: Option<&str>,
    ) -> UnitResult<Option<UnitSpec>> {
        for resolver in self.snapshot() {
            if let Some(spec) = resolver.resolve(name, search_path, target)? {
                return Ok(Some(spec));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::{ResolverChain, UnitLoader, UnitResolver, UnitSpec};
    use crate::unit::error::{UnitError, UnitResult};
    use crate::unit::namespace::Namespace;
    use crate::unit::value::Forward;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    struct EmptyLoader;

    impl UnitLoader for EmptyLoader {
        fn load(&self, spec: &UnitSpec) -> UnitResult<Arc<dyn Forward>> {
            Ok(Arc::new(Namespace::new(spec.name.clone(), BTreeMap::new())))
        }
    }

    struct Fixed {
        handles: &'static str,
        origin: &'static str,
    }

    impl UnitResolver for Fixed {
        fn resolve(
            &self,
            name: &str,
            _search_path: Option<&[String]>,
            _target: Option<&str>,
        ) -> UnitResult<Option<UnitSpec>> {
            if name != self.handles {
                return Ok(None);
            }
            Ok(Some(
                UnitSpec::new(name, Arc::new(EmptyLoader)).with_origin(self.origin),
            ))
        }
    }

    struct Failing;

    impl UnitResolver for Failing {
        fn resolve(
            &self,
            name: &str,
            _search_path: Option<&[String]>,
            _target: Option<&str>,
        ) -> UnitResult<Option<UnitSpec>> {
            Err(UnitError::load_failed(name, "resolver offline"))
        }
    }

    #[test]
    fn first_matching_resolver_wins() {
        let chain = ResolverChain::new();
        chain.push(Arc::new(Fixed {
            handles: "alpha",
            origin: "first",
        }));
        chain.push(Arc::new(Fixed {
            handles: "alpha",
            origin: "second",
        }));

        let spec = chain
            .find("alpha", None, None)
            .expect("lookup")
            .expect("alpha resolves");
        assert_eq!(spec.origin.as_deref(), Some("first"));
        assert!(chain.find("beta", None, None).expect("lookup").is_none());
    }

    #[test]
    fn insert_front_takes_priority() {
        let chain = ResolverChain::new();
        chain.push(Arc::new(Fixed {
            handles: "alpha",
            origin: "back",
        }));
        chain.insert_front(Arc::new(Fixed {
            handles: "alpha",
            origin: "front",
        }));

        assert_eq!(chain.len(), 2);
        let spec = chain
            .find("alpha", None, None)
            .expect("lookup")
            .expect("alpha resolves");
        assert_eq!(spec.origin.as_deref(), Some("front"));
    }

    #[test]
    fn resolver_errors_abort_plain_lookups() {
        let chain = ResolverChain::new();
        chain.push(Arc::new(Failing));
        chain.push(Arc::new(Fixed {
            handles: "alpha",
            origin: "unreached",
        }));

        let err = chain
            .find("alpha", None, None)
            .expect_err("failing resolver must surface");
        assert!(matches!(err, UnitError::LoadFailed { .. }));
    }

    #[test]
    fn spec_loads_through_its_loader() {
        let spec = UnitSpec::new("alpha", Arc::new(EmptyLoader));
        assert!(!spec.is_deferred());
        let unit = spec.load().expect("load");
        assert_eq!(unit.to_string(), "<unit 'alpha'>");
    }
}
