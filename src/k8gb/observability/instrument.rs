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


//! The fixed set of GSLB instruments and their name-keyed view.
//!
//! Each instrument carries an explicit kind tag so callers can look one up
//! by its fully-qualified name and still reach the typed Prometheus handle.
//! Names are built as `<namespace>_gslb_<metric>` through Prometheus
//! `Opts`, so the key used for lookup is exactly the name the collector
//! exposes.

use std::collections::BTreeMap;
use std::fmt::{self, Debug, Formatter};

use prometheus::core::Collector;
use prometheus::{GaugeVec, IntCounter, Opts};

use crate::k8gb::observability::metrics::MetricsError;

pub const GSLB_SUBSYSTEM: &str = "gslb";

pub const RECONCILIATION_TOTAL: &str = "reconciliation_total";
pub const HEALTHY_RECORDS: &str = "healthy_records";
pub const ZONE_UPDATE_TOTAL: &str = "zone_update_total";
pub const INGRESS_HOSTS_PER_STATUS: &str = "ingress_hosts_per_status";

pub const LABEL_NAMESPACE: &str = "namespace";
pub const LABEL_NAME: &str = "name";
pub const LABEL_STATUS: &str = "status";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InstrumentKind {
    Counter,
    LabeledGauge,
}

/// A single registered metric primitive.
#[derive(Clone)]
pub enum Instrument {
    Counter(IntCounter),
    LabeledGauge(GaugeVec),
}

impl Instrument {
    pub fn kind(&self) -> InstrumentKind {
        match self {
            Instrument::Counter(_) => InstrumentKind::Counter,
            Instrument::LabeledGauge(_) => InstrumentKind::LabeledGauge,
        }
    }

    /// Fully-qualified exposition name.
    pub fn fq_name(&self) -> String {
        let descs = match self {
            Instrument::Counter(counter) => counter.desc(),
            Instrument::LabeledGauge(gauge) => gauge.desc(),
        };
        descs
            .first()
            .map(|desc| desc.fq_name.clone())
            .unwrap_or_default()
    }

    /// Panics when the instrument is not a counter.
    pub fn as_counter(&self) -> &IntCounter {
        match self {
            Instrument::Counter(counter) => counter,
            Instrument::LabeledGauge(_) => {
                panic!("metric {} is a labeled gauge, not a counter", self.fq_name())
            }
        }
    }

    /// Panics when the instrument is not a labeled gauge.
    pub fn as_gauge_vec(&self) -> &GaugeVec {
        match self {
            Instrument::LabeledGauge(gauge) => gauge,
            Instrument::Counter(_) => {
                panic!("metric {} is a counter, not a labeled gauge", self.fq_name())
            }
        }
    }

    pub(crate) fn boxed(&self) -> Box<dyn Collector> {
        match self {
            Instrument::Counter(counter) => Box::new(counter.clone()),
            Instrument::LabeledGauge(gauge) => Box::new(gauge.clone()),
        }
    }
}

impl Debug for Instrument {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instrument")
            .field("kind", &self.kind())
            .field("name", &self.fq_name())
            .finish()
    }
}

/// Every instrument the controller publishes.
#[derive(Clone)]
pub struct GslbInstruments {
    pub reconciliation_total: IntCounter,
    pub healthy_records: GaugeVec,
    pub zone_update_total: IntCounter,
    pub ingress_hosts_per_status: GaugeVec,
}

impl GslbInstruments {
    /// Number of declared instruments.
    pub const COUNT: usize = 4;

    pub fn new(namespace: &str) -> Result<Self, MetricsError> {
        Ok(Self {
            reconciliation_total: counter(
                namespace,
                RECONCILIATION_TOTAL,
                "Number of successful reconciliations.",
            )?,
            healthy_records: gauge_vec(
                namespace,
                HEALTHY_RECORDS,
                "Number of healthy records observed by K8GB.",
                &[LABEL_NAMESPACE, LABEL_NAME],
            )?,
            zone_update_total: counter(namespace, ZONE_UPDATE_TOTAL, "Number of zone updates.")?,
            ingress_hosts_per_status: gauge_vec(
                namespace,
                INGRESS_HOSTS_PER_STATUS,
                "Number of managed hosts observed by K8GB.",
                &[LABEL_NAMESPACE, LABEL_NAME, LABEL_STATUS],
            )?,
        })
    }

    /// Name-keyed view over every declared instrument.
    pub fn registry(&self) -> BTreeMap<String, Instrument> {
        // Exhaustive so a new field fails to compile until it is listed here.
        let GslbInstruments {
            reconciliation_total,
            healthy_records,
            zone_update_total,
            ingress_hosts_per_status,
        } = self;

        [
            Instrument::Counter(reconciliation_total.clone()),
            Instrument::LabeledGauge(healthy_records.clone()),
            Instrument::Counter(zone_update_total.clone()),
            Instrument::LabeledGauge(ingress_hosts_per_status.clone()),
        ]
        .into_iter()
        .map(|instrument| (instrument.fq_name(), instrument))
        .collect()
    }
}

fn opts(namespace: &str, metric: &str, help: &str) -> Opts {
    Opts::new(metric, help)
        .namespace(namespace)
        .subsystem(GSLB_SUBSYSTEM)
}

fn counter(namespace: &str, metric: &str, help: &str) -> Result<IntCounter, MetricsError> {
    IntCounter::with_opts(opts(namespace, metric, help)).map_err(|source| MetricsError::Build {
        metric: metric.to_string(),
        source,
    })
}

fn gauge_vec(
    namespace: &str,
    metric: &str,
    help: &str,
    labels: &[&str],
) -> Result<GaugeVec, MetricsError> {
    GaugeVec::new(opts(namespace, metric, help), labels).map_err(|source| MetricsError::Build {
        metric: metric.to_string(),
        source,
    })
}
