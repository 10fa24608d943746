//! CLI smoke probe.
//!
//! # Responsibility
//! - Show a watched unit staying unacquired until its first member read.
//! - Keep output deterministic for quick local sanity checks.

use lazyunit_core::{
    Forward, Members, Registry, ResolverChain, UnitResult, UnitSystem, UnitTable, Value,
};
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("lazyunit probe failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> UnitResult<()> {
    let chain = Arc::new(ResolverChain::new());
    let table = Arc::new(UnitTable::new());
    table.define("demo.widget", || {
        let mut members = Members::new();
        members.insert("label".to_string(), Value::from("widget"));
        Ok(members)
    });
    chain.push(table.clone());

    let system = UnitSystem::new(Arc::clone(&chain));
    let registry = Registry::new(chain);
    registry.register(["demo"]);

    println!("lazyunit_core version={}", lazyunit_core::core_version());
    println!("watched={}", registry.watched().join(","));

    let widget = system.import("demo.widget")?;
    println!("imported={widget:?} acquired={}", table.is_acquired("demo.widget"));

    let label = widget.read("label")?;
    println!(
        "label={label} acquired={} repr={widget}",
        table.is_acquired("demo.widget")
    );
    Ok(())
}
