//! End-to-end tests: ready-made decorators running inside the dispatch engine.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use proptest::prelude::*;
use std::cell::Cell;
use std::sync::Arc;
use veneer_core::{
    Decoratable, Decorated, Decorator, DecoratorRef, DecoratorRegistry, Error, Manifest,
    MethodDef, MethodTable, Value, args, json,
};
use veneer_std::{Denied, Guard, Memoize, Retry, register_defaults};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Inventory service whose `reserve` fails until `outages` runs out.
struct Inventory {
    outages: Cell<u32>,
    lookups: Cell<u32>,
}

impl Inventory {
    fn new(outages: u32) -> Self {
        Self {
            outages: Cell::new(outages),
            lookups: Cell::new(0),
        }
    }
}

impl Decoratable for Inventory {
    type Output = Value;

    fn methods() -> MethodTable<Self> {
        MethodTable::new()
            .method(MethodDef::restricted("reserve", |inv: &Inventory, args| {
                let sku = args.get::<String>(0)?;
                if inv.outages.get() > 0 {
                    inv.outages.set(inv.outages.get() - 1);
                    return Err(Error::failed("warehouse unavailable"));
                }
                Ok(json!({ "sku": sku, "reserved": true }))
            }))
            .method(MethodDef::restricted("stock", |inv: &Inventory, args| {
                inv.lookups.set(inv.lookups.get() + 1);
                Ok(json!(args.get::<String>(0)?.len() * 10))
            }))
            .method(MethodDef::restricted("purge", |_: &Inventory, _| {
                Ok(json!("purged"))
            }))
    }

    fn type_name() -> &'static str {
        "Inventory"
    }
}

fn registry() -> DecoratorRegistry<Inventory> {
    let mut registry = DecoratorRegistry::new();
    register_defaults(&mut registry);
    registry
}

#[test]
fn named_trace_and_retry_recover_from_outage() {
    init_tracing();
    let manifest = Manifest::new()
        .declare("Inventory", "reserve", "trace")
        .declare("Inventory", "reserve", "retry");
    let inventory = Decorated::new(Inventory::new(2))
        .with_registry(registry())
        .with_source(manifest);

    let reserved = inventory.invoke("reserve", args!["ab-1"]).unwrap();

    assert_eq!(reserved, json!({ "sku": "ab-1", "reserved": true }));
    assert_eq!(inventory.target().outages.get(), 0);
}

#[test]
fn retry_gives_up_with_last_failure() {
    init_tracing();
    let inventory = Decorated::new(Inventory::new(10));
    inventory.set_declarations(
        "reserve",
        vec![DecoratorRef::instance(Retry::with_max_attempts(4))],
    );

    let err = inventory.invoke("reserve", args!["ab-1"]).unwrap_err();

    assert_eq!(err.to_string(), "warehouse unavailable");
    assert_eq!(inventory.target().outages.get(), 6);
}

#[test]
fn argument_failures_surface_after_retries() {
    let inventory = Decorated::new(Inventory::new(0));
    inventory.set_declarations(
        "reserve",
        vec![DecoratorRef::instance(Retry::with_max_attempts(2))],
    );

    let err = inventory.invoke("reserve", args![]).unwrap_err();

    assert!(matches!(err, Error::Argument { index: 0, .. }));
}

#[test]
fn shared_memoize_skips_repeat_lookups() {
    init_tracing();
    let memo = Arc::new(Memoize::<Value>::default());
    let inventory = Decorated::new(Inventory::new(0)).with_registry(registry());
    inventory.set_declarations(
        "stock",
        vec![
            DecoratorRef::named("trace"),
            DecoratorRef::shared(Arc::clone(&memo) as Arc<dyn Decorator<Inventory>>),
        ],
    );

    assert_eq!(inventory.invoke("stock", args!["bolt"]).unwrap(), json!(40));
    assert_eq!(inventory.invoke("stock", args!["bolt"]).unwrap(), json!(40));
    assert_eq!(inventory.invoke("stock", args!["washer"]).unwrap(), json!(60));

    assert_eq!(inventory.target().lookups.get(), 2);
    assert_eq!(memo.stats().hits, 1);
    assert_eq!(memo.len(), 2);
}

/// Inventory whose `stock` answer depends on the instance.
struct Warehouse {
    shelf: i64,
}

impl Decoratable for Warehouse {
    type Output = Value;

    fn methods() -> MethodTable<Self> {
        MethodTable::new().method(MethodDef::restricted("stock", |w: &Warehouse, _| {
            Ok(json!(w.shelf))
        }))
    }

    fn type_name() -> &'static str {
        "Warehouse"
    }
}

fn memoized(shelf: i64, memo: &Arc<Memoize<Value>>) -> Decorated<Warehouse> {
    let warehouse = Decorated::new(Warehouse { shelf });
    warehouse.set_declarations(
        "stock",
        vec![DecoratorRef::shared(Arc::clone(memo) as Arc<dyn Decorator<Warehouse>>)],
    );
    warehouse
}

#[test]
fn memoize_instance_per_target_keeps_results_apart() {
    let north = memoized(5, &Arc::new(Memoize::default()));
    let south = memoized(9, &Arc::new(Memoize::default()));

    assert_eq!(north.invoke("stock", args!["bolt"]).unwrap(), json!(5));
    assert_eq!(south.invoke("stock", args!["bolt"]).unwrap(), json!(9));
}

#[test]
fn memoize_shared_between_targets_ignores_the_target() {
    let memo = Arc::new(Memoize::default());
    let north = memoized(5, &memo);
    let south = memoized(9, &memo);

    assert_eq!(north.invoke("stock", args!["bolt"]).unwrap(), json!(5));
    assert_eq!(south.invoke("stock", args!["bolt"]).unwrap(), json!(5));
    assert_eq!(memo.stats().hits, 1);
}

#[test]
fn guard_blocks_before_inner_decorators() {
    let memo = Arc::new(Memoize::<Value>::default());
    let inventory = Decorated::new(Inventory::new(0));
    inventory.set_declarations(
        "purge",
        vec![
            DecoratorRef::instance(Guard::<Inventory>::new(|_, _, args| {
                args.get::<bool>(0).unwrap_or(false)
            })),
            DecoratorRef::shared(Arc::clone(&memo) as Arc<dyn Decorator<Inventory>>),
        ],
    );

    let err = inventory.invoke("purge", args![false]).unwrap_err();
    let denied = err.downcast_ref::<Denied>().unwrap();
    assert_eq!(denied.method, "purge");
    assert_eq!(err.to_string(), "Access to Inventory::purge() denied");
    assert!(memo.is_empty());

    assert_eq!(inventory.invoke("purge", args![true]).unwrap(), json!("purged"));
    assert_eq!(memo.len(), 1);
}

#[test]
fn unregistered_identifier_in_manifest_is_reported() {
    let manifest = Manifest::from_json(r#"{ "Inventory": { "stock": ["trace", "audit"] } }"#)
        .unwrap();
    let inventory = Decorated::new(Inventory::new(0))
        .with_registry(registry())
        .with_source(manifest);

    let err = inventory.invoke("stock", args!["bolt"]).unwrap_err();

    assert_eq!(err.to_string(), "Decorator audit does not exist.");
    assert!(matches!(
        err,
        Error::DecoratorNotFound { ref type_name, ref method, .. }
            if type_name == "Inventory" && method == "stock"
    ));
    assert_eq!(inventory.target().lookups.get(), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_retry_succeeds_iff_outages_fit_budget(outages in 0u32..6, attempts in 1u32..6) {
        let inventory = Decorated::new(Inventory::new(outages));
        inventory.set_declarations(
            "reserve",
            vec![DecoratorRef::instance(Retry::with_max_attempts(attempts))],
        );

        let result = inventory.invoke("reserve", args!["sku"]);

        prop_assert_eq!(result.is_ok(), outages < attempts);
    }

    #[test]
    fn prop_memoize_runs_body_once_per_distinct_argument(skus in proptest::collection::vec("[a-d]{1,2}", 1..20)) {
        let memo = Arc::new(Memoize::<Value>::default());
        let inventory = Decorated::new(Inventory::new(0));
        inventory.set_declarations(
            "stock",
            vec![DecoratorRef::shared(Arc::clone(&memo) as Arc<dyn Decorator<Inventory>>)],
        );

        for sku in &skus {
            prop_assert_eq!(
                inventory.invoke("stock", args![sku]).unwrap(),
                json!(sku.len() * 10)
            );
        }

        let distinct: std::collections::BTreeSet<_> = skus.iter().collect();
        prop_assert_eq!(inventory.target().lookups.get() as usize, distinct.len());
    }
}
