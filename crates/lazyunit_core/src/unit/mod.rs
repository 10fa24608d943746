//! Unit model: values, acquired namespaces, and the in-process unit table.
//!
//! # Responsibility
//! - Define what an acquired unit looks like to callers (`Forward`).
//! - Provide the shared error type for acquisition and forwarding.
//!
//! # Invariants
//! - Units are shared as `Arc<dyn Forward>`; member writes use interior
//!   mutability so every holder observes them.

pub mod error;
pub mod namespace;
pub mod table;
pub mod value;
