//! Deferred acquisition of named units.
//!
//! Units (plugins, modules, shared libraries) are resolved through an
//! ordered resolver chain. Callers either wrap a unit in a [`DeferredRef`]
//! directly, or register top-level names so every lookup of those names
//! through the chain yields a deferred unit instead of an acquired one.

pub mod defer;
pub mod logging;
pub mod resolve;
pub mod system;
pub mod unit;

pub use defer::config::{DeferralConfig, LoadMode, EAGER_ENV_VAR, WATCH_ENV_VAR};
pub use defer::reference::DeferredRef;
pub use logging::{init_logging, logging_status, LoggingError};
pub use resolve::chain::{ResolverChain, UnitLoader, UnitResolver, UnitSpec};
pub use resolve::interceptor::{DeferredLoader, UnitInterceptor};
pub use resolve::registry::{is_denylisted, Registry, DENYLIST};
pub use system::{UnitHandle, UnitSystem};
pub use unit::error::{UnitError, UnitResult};
pub use unit::namespace::Namespace;
pub use unit::table::{Members, UnitTable};
pub use unit::value::{Forward, NativeFn, Value};

/// Returns a reference that imports `name` from the global system on first use.
///
/// In eager mode the import runs here and its failure is returned.
pub fn lazy_unit(name: &str) -> UnitResult<DeferredRef<UnitHandle>> {
    system::global().defer(name)
}

/// Returns a reference to `unit.member` in the global system, imported on
/// first use.
pub fn lazy_member(unit: &str, member: &str) -> UnitResult<DeferredRef<Value>> {
    system::global().defer_member(unit, member)
}

/// Defers every later global lookup of the given top-level names.
pub fn defer_units<I, S>(names: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    resolve::registry::global().register(names);
}

/// Registers the watch list from `LAZYUNIT_WATCH` with the global registry.
pub fn defer_from_env() {
    resolve::registry::global().apply(defer::config::global());
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
