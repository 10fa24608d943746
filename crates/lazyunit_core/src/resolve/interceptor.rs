//! Chain interceptor rewriting watched units into deferred acquisitions.
//!
//! # Responsibility
//! - For watched top-level names, find the real spec via the rest of the
//!   chain and swap its loader for a deferred one.
//! - Prevent the interceptor from re-entering itself while it delegates.
//!
//! # Invariants
//! - The reentrancy guard is per thread and per interceptor.
//! - The guard is released on every exit path, including unwinding.
//! - Delegation failures are treated as "not handled" by that resolver.
//! - A spec whose loader is already deferred is returned unchanged.

use crate::defer::reference::DeferredRef;
use crate::resolve::chain::{ResolverChain, UnitLoader, UnitResolver, UnitSpec};
use crate::unit::error::UnitResult;
use crate::unit::value::Forward;
use log::{debug, info};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

static NEXT_INTERCEPTOR_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static ACTIVE_LOOKUPS: RefCell<BTreeSet<u64>> = const { RefCell::new(BTreeSet::new()) };
}

/// Marks one interceptor as delegating on the current thread.
struct LookupGuard {
    interceptor_id: u64,
}

impl LookupGuard {
    /// Returns `None` when the interceptor is already delegating here.
    fn enter(interceptor_id: u64) -> Option<Self> {
        let entered = ACTIVE_LOOKUPS.with(|active| active.borrow_mut().insert(interceptor_id));
        entered.then_some(Self { interceptor_id })
    }

    fn is_active(interceptor_id: u64) -> bool {
        ACTIVE_LOOKUPS.with(|active| active.borrow().contains(&interceptor_id))
    }
}

impl Drop for LookupGuard {
    fn drop(&mut self) {
        let _ = ACTIVE_LOOKUPS.try_with(|active| {
            active.borrow_mut().remove(&self.interceptor_id);
        });
    }
}

/// Returns the first dotted segment of a unit name.
pub fn top_level(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

/// Resolver that defers acquisition of watched units.
pub struct UnitInterceptor {
    id: u64,
    watched: RwLock<BTreeSet<String>>,
    chain: Weak<ResolverChain>,
}

impl UnitInterceptor {
    /// Creates an interceptor delegating to `chain`.
    ///
    /// The chain is held weakly so the interceptor can live inside it.
    pub fn new<I>(chain: &Arc<ResolverChain>, names: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            id: NEXT_INTERCEPTOR_ID.fetch_add(1, Ordering::Relaxed),
            watched: RwLock::new(names.into_iter().collect()),
            chain: Arc::downgrade(chain),
        }
    }

    /// Adds names to the watched set; returns how many were new.
    pub fn watch<I>(&self, names: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let mut watched = self.watched.write().unwrap_or_else(PoisonError::into_inner);
        names
            .into_iter()
            .filter(|name| watched.insert(name.clone()))
            .count()
    }

    /// Returns the watched names, sorted.
    pub fn watched(&self) -> Vec<String> {
        self.watched
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Whether `name` falls under a watched top-level name.
    pub fn is_watched(&self, name: &str) -> bool {
        self.watched
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(top_level(name))
    }

    /// Whether this interceptor is delegating on the current thread.
    pub fn is_delegating(&self) -> bool {
        LookupGuard::is_active(self.id)
    }

    fn delegate(
        &self,
        name: &str,
        search_path: Option<&[String]>,
        target: Option<&str>,
    ) -> Option<UnitSpec> {
        let chain = self.chain.upgrade()?;
        let this: *const Self = self;
        chain
            .snapshot()
            .into_iter()
            .filter(|resolver| !std::ptr::addr_eq(Arc::as_ptr(resolver), this))
            .find_map(
                |resolver| match resolver.resolve(name, search_path, target) {
                    Ok(found) => found,
                    Err(err) => {
                        debug!(
                            "event=delegation_failed module=interceptor status=skipped unit={} error={}",
                            name, err
                        );
                        None
                    }
                },
            )
    }
}

impl UnitResolver for UnitInterceptor {
    fn resolve(
        &self,
        name: &str,
        search_path: Option<&[String]>,
        target: Option<&str>,
    ) -> UnitResult<Option<UnitSpec>> {
        if !self.is_watched(name) {
            return Ok(None);
        }
        let Some(guard) = LookupGuard::enter(self.id) else {
            return Ok(None);
        };
        let found = self.delegate(name, search_path, target);
        drop(guard);

        let Some(mut spec) = found else {
            return Ok(None);
        };
        if !spec.is_deferred() {
            spec.loader = Arc::new(DeferredLoader::new(Arc::clone(&spec.loader)));
            debug!(
                "event=unit_deferred module=interceptor status=ok unit={}",
                spec.name
            );
        }
        Ok(Some(spec))
    }
}

/// Loader wrapper that hands out a deferred reference instead of acquiring.
pub struct DeferredLoader {
    inner: Arc<dyn UnitLoader>,
}

impl DeferredLoader {
    pub fn new(inner: Arc<dyn UnitLoader>) -> Self {
        Self { inner }
    }
}

impl UnitLoader for DeferredLoader {
    fn load(&self, spec: &UnitSpec) -> UnitResult<Arc<dyn Forward>> {
        let eager_spec = UnitSpec {
            loader: Arc::clone(&self.inner),
            ..spec.clone()
        };
        info!(
            "event=unit_load_deferred module=interceptor status=ok unit={}",
            spec.name
        );
        let reference = DeferredRef::try_labeled(spec.name.clone(), move || eager_spec.load())?;
        Ok(Arc::new(reference))
    }

    fn is_deferred(&self) -> bool {
        true
    }
}
