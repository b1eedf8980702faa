use std::sync::Arc;

use k8gb::k8gb::config::{MetricsConfig, DEFAULT_METRICS_NAMESPACE};
use k8gb::k8gb::observability::{init, metrics, InstrumentKind, Metrics, MetricsError};
use prometheus::Registry;
use serial_test::serial;

fn family_names(collector: &Registry) -> Vec<String> {
    collector
        .gather()
        .iter()
        .map(|family| family.get_name().to_string())
        .collect()
}

#[test]
#[serial]
fn accessor_never_returns_uninitialized_instance() {
    let first = metrics();
    let second = metrics();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.registry().len(), 4);
    assert!(!first.config().namespace.is_empty());
}

#[test]
#[serial]
fn init_replaces_rather_than_merges() {
    let c1 = init(MetricsConfig::new("c1")).expect("init c1");
    let c2 = init(MetricsConfig::new("c2")).expect("init c2");

    let current = metrics();
    assert!(Arc::ptr_eq(&current, &c2));
    assert!(!Arc::ptr_eq(&current, &c1));
    assert_eq!(current.config(), &MetricsConfig::new("c2"));
    assert!(current.try_get("c1_gslb_reconciliation_total").is_none());
    assert!(current.try_get("c2_gslb_reconciliation_total").is_some());

    c1.reconciliation_increment();
    assert_eq!(
        current
            .get("c2_gslb_reconciliation_total")
            .as_counter()
            .get(),
        0
    );
}

#[test]
#[serial]
fn register_then_unregister_leaves_default_collector_clean() {
    let metrics = init(MetricsConfig::new(DEFAULT_METRICS_NAMESPACE)).expect("init");
    metrics.register().expect("register");
    assert!(family_names(prometheus::default_registry())
        .contains(&"k8gb_gslb_reconciliation_total".to_string()));

    metrics.unregister();
    assert!(family_names(prometheus::default_registry())
        .iter()
        .all(|name| !name.starts_with("k8gb_gslb_")));
}

#[test]
#[serial]
fn stale_registration_from_previous_init_collides() {
    let stale = init(MetricsConfig::new("restart")).expect("first init");
    stale.register().expect("first register");

    let fresh = init(MetricsConfig::new("restart")).expect("second init");
    match fresh.register() {
        Err(MetricsError::Registration { metric, .. }) => {
            assert!(metric.starts_with("restart_gslb_"))
        }
        other => panic!("expected registration collision, got {other:?}"),
    }

    stale.unregister();
    fresh.register().expect("register after stale unregister");
    fresh.unregister();
}

#[test]
fn counters_restart_from_zero_with_fresh_instruments() {
    let collector = Registry::new();
    let config = MetricsConfig::new("ns");

    let before_restart = Metrics::with_collector(config.clone(), collector.clone()).expect("first");
    before_restart.register().expect("register");
    for _ in 0..3 {
        before_restart.reconciliation_increment();
    }
    before_restart.unregister();

    let after_restart = Metrics::with_collector(config, collector).expect("second");
    after_restart.register().expect("register");
    assert_eq!(
        after_restart
            .get("ns_gslb_reconciliation_total")
            .as_counter()
            .get(),
        0
    );
    after_restart.unregister();
}

#[test]
fn instruments_report_their_kind() {
    let metrics = Metrics::with_collector(MetricsConfig::new("ns"), Registry::new()).expect("metrics");
    let kinds: Vec<(String, InstrumentKind)> = metrics
        .registry()
        .into_iter()
        .map(|(name, instrument)| (name, instrument.kind()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("ns_gslb_healthy_records".to_string(), InstrumentKind::LabeledGauge),
            (
                "ns_gslb_ingress_hosts_per_status".to_string(),
                InstrumentKind::LabeledGauge
            ),
            ("ns_gslb_reconciliation_total".to_string(), InstrumentKind::Counter),
            ("ns_gslb_zone_update_total".to_string(), InstrumentKind::Counter),
        ]
    );
}
