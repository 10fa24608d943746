//! Interceptor installation and watched-name registration.
//!
//! # Responsibility
//! - Install at most one interceptor per chain, at the front.
//! - Grow its watched set on later registrations.
//! - Keep denylisted units out of deferral.
//!
//! # Invariants
//! - Denylisted and blank names are dropped; registration never fails.
//! - Installation is serialized by one mutex; re-registration only merges.

use crate::defer::config::DeferralConfig;
use crate::resolve::chain::ResolverChain;
use crate::resolve::interceptor::UnitInterceptor;
use crate::system;
use log::{debug, info};
use once_cell::sync::OnceCell;
use std::sync::{Arc, Mutex, PoisonError};

/// Units whose acquisition installs process-global hooks; never deferred.
pub const DENYLIST: &[&str] = &["alloc", "logging", "signals"];

static GLOBAL_REGISTRY: OnceCell<Registry> = OnceCell::new();

/// Returns whether `name` is on the fixed denylist.
pub fn is_denylisted(name: &str) -> bool {
    DENYLIST.contains(&name)
}

/// Handle owning the interceptor lifecycle for one resolution chain.
pub struct Registry {
    chain: Arc<ResolverChain>,
    installed: Mutex<Option<Arc<UnitInterceptor>>>,
}

impl Registry {
    pub fn new(chain: Arc<ResolverChain>) -> Self {
        Self {
            chain,
            installed: Mutex::new(None),
        }
    }

    pub fn chain(&self) -> &Arc<ResolverChain> {
        &self.chain
    }

    /// Marks top-level unit names for deferred acquisition.
    ///
    /// The first call installs the interceptor; later calls extend its
    /// watched set.
    pub fn register<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let accepted = filter_names(names);
        let mut installed = self
            .installed
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        match installed.as_ref() {
            Some(interceptor) => {
                let added = interceptor.watch(accepted);
                debug!(
                    "event=watch_extended module=registry status=ok added={} watched={}",
                    added,
                    interceptor.watched().len()
                );
            }
            None => {
                let interceptor = Arc::new(UnitInterceptor::new(&self.chain, accepted));
                self.chain.insert_front(interceptor.clone());
                info!(
                    "event=interceptor_installed module=registry status=ok watched={}",
                    interceptor.watched().join(",")
                );
                *installed = Some(interceptor);
            }
        }
    }

    /// Registers the watch list of `config`.
    pub fn apply(&self, config: &DeferralConfig) {
        if !config.watch.is_empty() {
            self.register(&config.watch);
        }
    }

    pub fn is_installed(&self) -> bool {
        self.interceptor().is_some()
    }

    pub fn interceptor(&self) -> Option<Arc<UnitInterceptor>> {
        self.installed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the watched names, or nothing before installation.
    pub fn watched(&self) -> Vec<String> {
        self.interceptor()
            .map(|interceptor| interceptor.watched())
            .unwrap_or_default()
    }
}

/// Returns the process-wide registry bound to the global unit system.
pub fn global() -> &'static Registry {
    GLOBAL_REGISTRY.get_or_init(|| Registry::new(Arc::clone(system::global().chain())))
}

fn filter_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .filter_map(|name| {
            let name = name.as_ref().trim();
            if name.is_empty() {
                return None;
            }
            if is_denylisted(name) {
                debug!(
                    "event=denylisted_skipped module=registry status=skipped unit={}",
                    name
                );
                return None;
            }
            Some(name.to_string())
        })
        .collect()
}
