/*
 * Copyright (C) 2024 The k8gb Authors
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 * http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */


//! Process-wide metrics facade for the GSLB reconciliation loop.
//!
//! [`init`] installs a freshly built [`Metrics`] for the process and
//! [`metrics`] hands out the current one, creating a default instance on
//! first use. Reconciliation workers hold the returned `Arc` and update
//! instruments concurrently; every update is a single atomic Prometheus
//! operation.
//!
//! The snapshot updates overwrite the owner's series on every pass. The
//! per-status gauge zeroes absent statuses by walking the closed
//! [`HealthStatus`] set. An open-ended label such as a per-hostname gauge
//! cannot be cleared that way and would need explicit removal of labels
//! missing from the snapshot, as [`Metrics::clear_resource`] does for a
//! deleted owner.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::sync::{Arc, PoisonError, RwLock};

use prometheus::{Encoder, Registry, TextEncoder};

use crate::k8gb::config::MetricsConfig;
use crate::k8gb::gslb::{HealthSnapshot, HealthStatus, ResourceIdentity, StatusSnapshot};
use crate::k8gb::logger::{log_debug, log_error, log_info};
use crate::k8gb::observability::instrument::{GslbInstruments, Instrument};

const COMPONENT: &str = "metrics";

static SHARED: RwLock<Option<Arc<Metrics>>> = RwLock::new(None);

#[derive(Debug)]
pub enum MetricsError {
    InvalidNamespace(String),
    Build {
        metric: String,
        source: prometheus::Error,
    },
    Registration {
        metric: String,
        source: prometheus::Error,
    },
    Encode(prometheus::Error),
}

impl Display for MetricsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            MetricsError::InvalidNamespace(namespace) => {
                write!(f, "invalid metrics namespace '{}'", namespace)
            }
            MetricsError::Build { metric, source } => {
                write!(f, "failed to build metric {}: {}", metric, source)
            }
            MetricsError::Registration { metric, source } => {
                write!(f, "failed to register metric {}: {}", metric, source)
            }
            MetricsError::Encode(source) => write!(f, "failed to encode metrics: {}", source),
        }
    }
}

impl Error for MetricsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MetricsError::InvalidNamespace(_) => None,
            MetricsError::Build { source, .. }
            | MetricsError::Registration { source, .. }
            | MetricsError::Encode(source) => Some(source),
        }
    }
}

/// Replaces the process-wide instance with one built from `config`.
pub fn init(config: MetricsConfig) -> Result<Arc<Metrics>, MetricsError> {
    let metrics = Arc::new(Metrics::new(config)?);
    let mut shared = SHARED.write().unwrap_or_else(PoisonError::into_inner);
    *shared = Some(Arc::clone(&metrics));
    drop(shared);

    log_info(
        COMPONENT,
        "installed metrics registry",
        &[("namespace", metrics.config.namespace.as_str())],
    );
    Ok(metrics)
}

/// Returns the process-wide instance, installing the default one if
/// [`init`] was never called.
pub fn metrics() -> Arc<Metrics> {
    {
        let shared = SHARED.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = shared.as_ref() {
            return Arc::clone(current);
        }
    }

    let mut shared = SHARED.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(current) = shared.as_ref() {
        return Arc::clone(current);
    }
    let metrics = Arc::new(
        Metrics::new(MetricsConfig::default()).expect("default metrics namespace must be valid"),
    );
    *shared = Some(Arc::clone(&metrics));
    log_debug(
        COMPONENT,
        "installed default metrics registry",
        &[("namespace", metrics.config.namespace.as_str())],
    );
    metrics
}

#[cfg(test)]
fn reset_shared() {
    *SHARED.write().unwrap_or_else(PoisonError::into_inner) = None;
}

/// Instruments for one configuration, bound to the collector they are
/// attached to by [`Metrics::register`].
pub struct Metrics {
    config: MetricsConfig,
    instruments: GslbInstruments,
    collector: Registry,
}

impl Metrics {
    /// Builds instruments that attach to the default Prometheus registry.
    pub fn new(config: MetricsConfig) -> Result<Self, MetricsError> {
        Self::with_collector(config, prometheus::default_registry().clone())
    }

    pub fn with_collector(config: MetricsConfig, collector: Registry) -> Result<Self, MetricsError> {
        validate_namespace(&config.namespace)?;
        let instruments = GslbInstruments::new(&config.namespace)?;
        Ok(Self {
            config,
            instruments,
            collector,
        })
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    pub fn collector(&self) -> &Registry {
        &self.collector
    }

    pub fn registry(&self) -> BTreeMap<String, Instrument> {
        self.instruments.registry()
    }

    pub fn names(&self) -> Vec<String> {
        self.registry().into_keys().collect()
    }

    pub fn try_get(&self, name: &str) -> Option<Instrument> {
        self.registry().remove(name)
    }

    /// Looks up a declared instrument. Unknown names are a programming
    /// error and panic.
    pub fn get(&self, name: &str) -> Instrument {
        match self.try_get(name) {
            Some(instrument) => instrument,
            None => panic!(
                "unknown metric {}; declared metrics are {:?}",
                name,
                self.names()
            ),
        }
    }

    /// Attaches every instrument to the collector. On a name collision the
    /// instruments attached by this call are detached again before the
    /// error is returned.
    pub fn register(&self) -> Result<(), MetricsError> {
        let mut attached: Vec<Instrument> = Vec::with_capacity(GslbInstruments::COUNT);
        for (name, instrument) in self.registry() {
            if let Err(source) = self.collector.register(instrument.boxed()) {
                for previous in &attached {
                    let _ = self.collector.unregister(previous.boxed());
                }
                let message = source.to_string();
                log_error(
                    COMPONENT,
                    "metric registration failed",
                    &[("metric", name.as_str()), ("error", message.as_str())],
                );
                return Err(MetricsError::Registration {
                    metric: name,
                    source,
                });
            }
            attached.push(instrument);
        }

        let count = attached.len().to_string();
        log_info(
            COMPONENT,
            "registered metrics",
            &[
                ("namespace", self.config.namespace.as_str()),
                ("count", count.as_str()),
            ],
        );
        Ok(())
    }

    /// Detaches every instrument. Instruments that are not attached are
    /// skipped.
    pub fn unregister(&self) {
        let mut detached = 0usize;
        for (name, instrument) in self.registry() {
            match self.collector.unregister(instrument.boxed()) {
                Ok(()) => detached += 1,
                Err(err) => {
                    let message = err.to_string();
                    log_debug(
                        COMPONENT,
                        "metric was not registered",
                        &[("metric", name.as_str()), ("error", message.as_str())],
                    );
                }
            }
        }

        let count = detached.to_string();
        log_info(
            COMPONENT,
            "unregistered metrics",
            &[
                ("namespace", self.config.namespace.as_str()),
                ("count", count.as_str()),
            ],
        );
    }

    pub fn reconciliation_increment(&self) {
        self.instruments.reconciliation_total.inc();
    }

    pub fn zone_update_increment(&self) {
        self.instruments.zone_update_total.inc();
    }

    /// Sets the owner's healthy-records gauge to the number of healthy
    /// addresses across all hostnames. An absent snapshot sets it to zero.
    pub fn update_healthy_records_metric(
        &self,
        owner: &ResourceIdentity,
        snapshot: Option<&HealthSnapshot>,
    ) {
        let total: usize = snapshot
            .map(|records| records.values().map(Vec::len).sum())
            .unwrap_or(0);
        self.instruments
            .healthy_records
            .with_label_values(&[owner.namespace.as_str(), owner.name.as_str()])
            .set(total as f64);
    }

    /// Sets one series per [`HealthStatus`] for the owner, including zero
    /// for statuses missing from the snapshot.
    pub fn update_ingress_hosts_per_status_metric(
        &self,
        owner: &ResourceIdentity,
        snapshot: Option<&StatusSnapshot>,
    ) {
        let gauge = &self.instruments.ingress_hosts_per_status;
        for status in HealthStatus::ALL {
            let count = snapshot
                .map(|hosts| hosts.values().filter(|value| **value == status).count())
                .unwrap_or(0);
            gauge
                .with_label_values(&[
                    owner.namespace.as_str(),
                    owner.name.as_str(),
                    status.as_label(),
                ])
                .set(count as f64);
        }
    }

    /// Removes every gauge series labeled with `owner` so a deleted
    /// resource leaves no stale time series behind.
    pub fn clear_resource(&self, owner: &ResourceIdentity) {
        let namespace = owner.namespace.as_str();
        let name = owner.name.as_str();
        let mut removed = 0usize;

        if self
            .instruments
            .healthy_records
            .remove_label_values(&[namespace, name])
            .is_ok()
        {
            removed += 1;
        }
        for status in HealthStatus::ALL {
            if self
                .instruments
                .ingress_hosts_per_status
                .remove_label_values(&[namespace, name, status.as_label()])
                .is_ok()
            {
                removed += 1;
            }
        }

        let count = removed.to_string();
        log_debug(
            COMPONENT,
            "cleared resource series",
            &[
                ("namespace", namespace),
                ("name", name),
                ("removed", count.as_str()),
            ],
        );
    }

    /// Encodes everything attached to the collector in the Prometheus text
    /// exposition format.
    pub fn gather(&self) -> Result<Vec<u8>, MetricsError> {
        let metric_families = self.collector.gather();
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(MetricsError::Encode)?;
        Ok(buffer)
    }
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics")
            .field("config", &self.config)
            .field("instruments", &self.names())
            .finish()
    }
}

fn validate_namespace(namespace: &str) -> Result<(), MetricsError> {
    let mut chars = namespace.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == ':');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':');
    if valid_start && valid_rest {
        Ok(())
    } else {
        Err(MetricsError::InvalidNamespace(namespace.to_string()))
    }
}
