//! Name-based unit import facade.
//!
//! # Responsibility
//! - Turn a unit name into an acquired (or deferred) unit via the chain.
//! - Cache imported handles so a name is imported once per system.
//! - Build deferred references from names.
//!
//! # Invariants
//! - A failed import leaves nothing cached.
//! - When two threads import the same name, the first cached handle wins and
//!   both callers receive it.

use crate::defer::reference::DeferredRef;
use crate::resolve::chain::{ResolverChain, UnitSpec};
use crate::unit::error::{UnitError, UnitResult};
use crate::unit::value::{Forward, Value};
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

static GLOBAL_SYSTEM: OnceCell<Arc<UnitSystem>> = OnceCell::new();

/// Shared handle to an imported unit.
pub type UnitHandle = Arc<dyn Forward>;

/// Resolution chain plus the table of already imported units.
pub struct UnitSystem {
    chain: Arc<ResolverChain>,
    imported: RwLock<BTreeMap<String, UnitHandle>>,
}

impl UnitSystem {
    pub fn new(chain: Arc<ResolverChain>) -> Self {
        Self {
            chain,
            imported: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn chain(&self) -> &Arc<ResolverChain> {
        &self.chain
    }

    /// Looks `name` up without loading it.
    pub fn find(&self, name: &str) -> UnitResult<Option<UnitSpec>> {
        self.find_with(name, None, None)
    }

    /// Looks `name` up, passing location hints through to every resolver.
    pub fn find_with(
        &self,
        name: &str,
        search_path: Option<&[String]>,
        target: Option<&str>,
    ) -> UnitResult<Option<UnitSpec>> {
        self.chain.find(name, search_path, target)
    }

    /// Imports `name`, reusing a previous import when present.
    pub fn import(&self, name: &str) -> UnitResult<UnitHandle> {
        self.import_with(name, None, None)
    }

    /// Imports `name` with location hints. The cache is keyed by name only,
    /// so hints matter only for the first import.
    pub fn import_with(
        &self,
        name: &str,
        search_path: Option<&[String]>,
        target: Option<&str>,
    ) -> UnitResult<UnitHandle> {
        if let Some(unit) = self.imported(name) {
            return Ok(unit);
        }

        let spec = self
            .find_with(name, search_path, target)?
            .ok_or_else(|| UnitError::NotFound(name.to_string()))?;
        let unit = spec.load()?;

        let mut imported = self.imported.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(imported.entry(name.to_string()).or_insert(unit)))
    }

    /// Returns the cached handle for `name`, if imported.
    pub fn imported(&self, name: &str) -> Option<UnitHandle> {
        self.imported
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn is_imported(&self, name: &str) -> bool {
        self.imported(name).is_some()
    }

    /// Returns a reference that imports `name` on first use.
    ///
    /// Fails only in eager mode, when the import itself fails.
    pub fn defer(self: &Arc<Self>, name: &str) -> UnitResult<DeferredRef<UnitHandle>> {
        let system = Arc::clone(self);
        let unit = name.to_string();
        DeferredRef::try_labeled(name, move || system.import(&unit))
    }

    /// Returns a reference to one member of `unit`, imported on first use.
    ///
    /// Fails only in eager mode, when the import or member read fails.
    pub fn defer_member(
        self: &Arc<Self>,
        unit: &str,
        member: &str,
    ) -> UnitResult<DeferredRef<Value>> {
        let system = Arc::clone(self);
        let unit_name = unit.to_string();
        let member_name = member.to_string();
        DeferredRef::try_labeled(format!("{unit}.{member}"), move || {
            system.import(&unit_name)?.read(&member_name)
        })
    }
}

/// Returns the process-wide unit system, created with an empty chain.
pub fn global() -> &'static Arc<UnitSystem> {
    GLOBAL_SYSTEM.get_or_init(|| Arc::new(UnitSystem::new(Arc::new(ResolverChain::new()))))
}
