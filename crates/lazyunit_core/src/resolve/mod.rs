//! Name resolution: the resolver chain, the deferring interceptor, and the
//! registry that installs it.

pub mod chain;
pub mod interceptor;
pub mod registry;
