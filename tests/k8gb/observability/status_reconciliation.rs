use std::collections::HashMap;

use k8gb::k8gb::config::MetricsConfig;
use k8gb::k8gb::gslb::{HealthSnapshot, HealthStatus, ResourceIdentity, StatusSnapshot};
use k8gb::k8gb::observability::Metrics;
use prometheus::Registry;

const PER_STATUS: &str = "k8gb_gslb_ingress_hosts_per_status";
const HEALTHY_RECORDS: &str = "k8gb_gslb_healthy_records";

struct Host {
    name: &'static str,
    status: HealthStatus,
    addresses: Vec<&'static str>,
}

fn host(name: &'static str, status: HealthStatus, addresses: &[&'static str]) -> Host {
    Host {
        name,
        status,
        addresses: addresses.to_vec(),
    }
}

struct Harness {
    metrics: Metrics,
}

impl Harness {
    fn new() -> Self {
        let metrics =
            Metrics::with_collector(MetricsConfig::default(), Registry::new()).expect("metrics");
        metrics.register().expect("register");
        Self { metrics }
    }

    fn pass(&self, owner: &ResourceIdentity, hosts: &[Host]) {
        let statuses: StatusSnapshot = hosts
            .iter()
            .map(|host| (host.name.to_string(), host.status))
            .collect();
        let records: HealthSnapshot = hosts
            .iter()
            .filter(|host| host.status == HealthStatus::Healthy)
            .map(|host| {
                (
                    host.name.to_string(),
                    host.addresses.iter().map(|a| a.to_string()).collect(),
                )
            })
            .collect();
        self.metrics.reconciliation_increment();
        self.metrics
            .update_ingress_hosts_per_status_metric(owner, Some(&statuses));
        self.metrics
            .update_healthy_records_metric(owner, Some(&records));
    }

    fn status_counts(&self, owner: &ResourceIdentity) -> HashMap<HealthStatus, f64> {
        let gauge = self.metrics.get(PER_STATUS);
        HealthStatus::ALL
            .into_iter()
            .map(|status| {
                let value = gauge
                    .as_gauge_vec()
                    .with_label_values(&[
                        owner.namespace.as_str(),
                        owner.name.as_str(),
                        status.as_label(),
                    ])
                    .get();
                (status, value)
            })
            .collect()
    }

    fn healthy_records(&self, owner: &ResourceIdentity) -> f64 {
        self.metrics
            .get(HEALTHY_RECORDS)
            .as_gauge_vec()
            .with_label_values(&[owner.namespace.as_str(), owner.name.as_str()])
            .get()
    }
}

#[test]
fn recovered_hosts_drop_unhealthy_count_to_zero() {
    let harness = Harness::new();
    let owner = ResourceIdentity::new("test-gslb-ns", "failover");

    harness.pass(
        &owner,
        &[
            host("app.cloud.example.com", HealthStatus::Healthy, &["10.0.0.1"]),
            host("api.cloud.example.com", HealthStatus::Unhealthy, &[]),
            host("old.cloud.example.com", HealthStatus::NotFound, &[]),
        ],
    );
    let first = harness.status_counts(&owner);
    assert_eq!(first[&HealthStatus::Healthy], 1.0);
    assert_eq!(first[&HealthStatus::Unhealthy], 1.0);
    assert_eq!(first[&HealthStatus::NotFound], 1.0);

    harness.pass(
        &owner,
        &[
            host("app.cloud.example.com", HealthStatus::Healthy, &["10.0.0.1", "10.0.0.2"]),
            host("api.cloud.example.com", HealthStatus::Healthy, &["10.0.1.1"]),
        ],
    );
    let second = harness.status_counts(&owner);
    assert_eq!(second[&HealthStatus::Healthy], 2.0);
    assert_eq!(second[&HealthStatus::Unhealthy], 0.0);
    assert_eq!(second[&HealthStatus::NotFound], 0.0);
    assert_eq!(harness.healthy_records(&owner), 3.0);
}

#[test]
fn owners_do_not_disturb_each_other() {
    let harness = Harness::new();
    let roundrobin = ResourceIdentity::new("test-gslb-ns", "roundrobin");
    let failover = ResourceIdentity::new("test-gslb-ns", "failover");
    let other_namespace = ResourceIdentity::new("other-ns", "roundrobin");

    harness.pass(
        &roundrobin,
        &[host("rr.cloud.example.com", HealthStatus::Healthy, &["10.0.0.1", "10.0.0.2"])],
    );
    harness.pass(
        &failover,
        &[host("fo.cloud.example.com", HealthStatus::Unhealthy, &[])],
    );
    harness.pass(&other_namespace, &[]);

    assert_eq!(harness.healthy_records(&roundrobin), 2.0);
    assert_eq!(harness.healthy_records(&failover), 0.0);
    assert_eq!(harness.status_counts(&roundrobin)[&HealthStatus::Unhealthy], 0.0);
    assert_eq!(harness.status_counts(&failover)[&HealthStatus::Unhealthy], 1.0);
    assert!(harness
        .status_counts(&other_namespace)
        .values()
        .all(|value| *value == 0.0));
}

#[test]
fn exposition_lists_every_status_for_every_owner() {
    let harness = Harness::new();
    let owner = ResourceIdentity::new("test-gslb-ns", "roundrobin");
    harness.pass(
        &owner,
        &[host("rr.cloud.example.com", HealthStatus::Healthy, &["10.0.0.1"])],
    );

    let text = String::from_utf8(harness.metrics.gather().expect("gather")).expect("utf8");
    for status in HealthStatus::ALL {
        let series = format!(
            "{PER_STATUS}{{name=\"roundrobin\",namespace=\"test-gslb-ns\",status=\"{}\"}}",
            status.as_label()
        );
        assert!(text.contains(&series), "missing {series} in {text}");
    }
    assert!(text.contains("k8gb_gslb_reconciliation_total 1"));
}

#[test]
fn deleted_owner_leaves_no_series() {
    let harness = Harness::new();
    let owner = ResourceIdentity::new("test-gslb-ns", "deleted");
    harness.pass(
        &owner,
        &[host("gone.cloud.example.com", HealthStatus::Healthy, &["10.0.0.9"])],
    );

    harness.metrics.clear_resource(&owner);

    let text = String::from_utf8(harness.metrics.gather().expect("gather")).expect("utf8");
    assert!(!text.contains("name=\"deleted\""), "stale series in {text}");
}
