use lazyunit_core::{
    Forward, Members, NativeFn, Registry, ResolverChain, UnitError, UnitSystem, UnitTable, Value,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Fixture {
    system: Arc<UnitSystem>,
    registry: Registry,
    table: Arc<UnitTable>,
}

fn fixture() -> Fixture {
    let chain = Arc::new(ResolverChain::new());
    let table = Arc::new(UnitTable::new());
    table.define("demo.widget", || {
        let mut members = Members::new();
        members.insert("label".to_string(), Value::from("widget"));
        members.insert(
            "sizes".to_string(),
            Value::from(vec![Value::Int(8), Value::Int(16), Value::Int(32)]),
        );
        members.insert(
            "render".to_string(),
            Value::from(NativeFn::new("render", |args| {
                let width = args.first().and_then(Value::as_int).unwrap_or(0);
                Ok(Value::from(format!("widget@{width}")))
            })),
        );
        Ok(members)
    });
    table.define("beta", || {
        let mut members = Members::new();
        members.insert("ready".to_string(), Value::Bool(true));
        Ok(members)
    });
    chain.push(table.clone());

    Fixture {
        system: Arc::new(UnitSystem::new(Arc::clone(&chain))),
        registry: Registry::new(chain),
        table,
    }
}

#[test]
fn registered_prefix_defers_submodule_until_member_access() {
    let fx = fixture();
    fx.registry.register(["demo"]);

    let spec = fx
        .system
        .find("demo.widget")
        .expect("lookup")
        .expect("demo.widget resolves");
    assert!(spec.is_deferred());

    let widget = fx.system.import("demo.widget").expect("import");
    assert!(!fx.table.is_acquired("demo.widget"));

    let label = widget.read("label").expect("member read");
    assert!(fx.table.is_acquired("demo.widget"));

    let direct = fx
        .table
        .resolve_direct("demo.widget")
        .read("label")
        .expect("direct read");
    assert_eq!(label, direct);
}

#[test]
fn unregistered_names_load_eagerly() {
    let fx = fixture();
    fx.registry.register(["demo"]);

    let beta = fx.system.import("beta").expect("import beta");
    assert!(fx.table.is_acquired("beta"));
    assert_eq!(beta.to_string(), "<unit 'beta'>");
}

#[test]
fn forwarded_operations_match_direct_acquisition() {
    let fx = fixture();
    fx.registry.register(["demo"]);

    let widget = fx.system.import("demo.widget").expect("import");
    let direct = fx.table.resolve_direct("demo.widget");

    let render = widget.read("render").expect("render member");
    assert_eq!(
        render.call(&[Value::Int(64)]).expect("call"),
        direct
            .read("render")
            .and_then(|render| render.call(&[Value::Int(64)]))
            .expect("direct call")
    );
    assert_eq!(
        widget
            .index(&Value::from("sizes"))
            .and_then(|sizes| sizes.index(&Value::Int(-1)))
            .expect("nested index"),
        Value::Int(32)
    );

    widget
        .write("label", Value::from("renamed"))
        .expect("write through deferred unit");
    assert_eq!(
        widget.read("label").expect("read back"),
        Value::from("renamed")
    );
    widget.delete("label").expect("delete");
    assert!(matches!(
        widget.read("label"),
        Err(UnitError::MissingMember { .. })
    ));
}

#[test]
fn denylisted_registration_has_no_effect() {
    let fx = fixture();
    fx.table.define("signals", || Ok(Members::new()));
    fx.registry.register(["signals"]);

    fx.system.import("signals").expect("import signals");
    assert!(fx.table.is_acquired("signals"));
}

#[test]
fn initializer_failures_surface_at_first_use() {
    let fx = fixture();
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);
    fx.table.define("flaky", move || {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(UnitError::load_failed("flaky", "dependency not ready"))
        } else {
            Ok(Members::new())
        }
    });
    fx.registry.register(["flaky"]);

    let flaky = fx.system.import("flaky").expect("deferred import succeeds");
    assert_eq!(attempts.load(Ordering::SeqCst), 0);

    let err = flaky.read("anything").expect_err("first use fails");
    assert!(matches!(err, UnitError::LoadFailed { .. }));

    let err = flaky.read("anything").expect_err("member is missing");
    assert!(matches!(err, UnitError::MissingMember { .. }));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

trait ResolveDirect {
    fn resolve_direct(&self, name: &str) -> Arc<dyn Forward>;
}

impl ResolveDirect for UnitTable {
    fn resolve_direct(&self, name: &str) -> Arc<dyn Forward> {
        use lazyunit_core::UnitResolver;
        self.resolve(name, None, None)
            .expect("lookup")
            .expect("unit declared")
            .load()
            .expect("direct load")
    }
}
