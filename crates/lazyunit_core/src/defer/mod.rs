//! Deferred references and their configuration.
//!
//! A `DeferredRef` wraps a resolver callback and only runs it when a caller
//! first performs an observable operation on the reference.

pub mod config;
pub mod reference;
