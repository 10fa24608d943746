//! In-process unit table resolver.
//!
//! # Responsibility
//! - Resolve statically declared units by exact name.
//! - Record which units actually ran their initializer, in order.
//!
//! # Invariants
//! - Resolving a name never runs its initializer; only loading does.
//! - Every successful initializer run is recorded exactly once per run.

use crate::resolve::chain::{UnitLoader, UnitResolver, UnitSpec};
use crate::unit::error::UnitResult;
use crate::unit::namespace::Namespace;
use crate::unit::value::{Forward, Value};
use log::info;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Member table produced by a unit initializer.
pub type Members = BTreeMap<String, Value>;

type Initializer = dyn Fn() -> UnitResult<Members> + Send + Sync;

const TABLE_ORIGIN: &str = "table";

/// Resolver backed by named initializer functions.
#[derive(Default)]
pub struct UnitTable {
    units: RwLock<BTreeMap<String, Arc<Initializer>>>,
    acquired: Arc<RwLock<Vec<String>>>,
}

impl UnitTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares or replaces one unit.
    pub fn define<F>(&self, name: &str, init: F)
    where
        F: Fn() -> UnitResult<Members> + Send + Sync + 'static,
    {
        self.units
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), Arc::new(init));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.units
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Names whose initializer has run, in acquisition order.
    pub fn acquired(&self) -> Vec<String> {
        self.acquired
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_acquired(&self, name: &str) -> bool {
        self.acquisition_count(name) > 0
    }

    /// How many times `name` has been initialized.
    pub fn acquisition_count(&self, name: &str) -> usize {
        self.acquired
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|acquired| acquired.as_str() == name)
            .count()
    }
}

impl UnitResolver for UnitTable {
    fn resolve(
        &self,
        name: &str,
        _search_path: Option<&[String]>,
        _target: Option<&str>,
    ) -> UnitResult<Option<UnitSpec>> {
        let init = self
            .units
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned();
        Ok(init.map(|init| {
            let loader = TableLoader {
                init,
                acquired: Arc::clone(&self.acquired),
            };
            UnitSpec::new(name, Arc::new(loader)).with_origin(TABLE_ORIGIN)
        }))
    }
}

struct TableLoader {
    init: Arc<Initializer>,
    acquired: Arc<RwLock<Vec<String>>>,
}

impl UnitLoader for TableLoader {
    fn load(&self, spec: &UnitSpec) -> UnitResult<Arc<dyn Forward>> {
        let members = (self.init)()?;
        self.acquired
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(spec.name.clone());
        info!(
            "event=unit_acquired module=table status=ok unit={} members={}",
            spec.name,
            members.len()
        );
        Ok(Arc::new(Namespace::new(spec.name.clone(), members)))
    }
}
