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


//! Observability primitives for the GSLB controller.
//!
//! Metric names follow the Prometheus conventions used across Kubernetes
//! controllers: snake_case, scoped by a configurable namespace and the
//! `gslb` subsystem, counters ending with `_total`. Label keys mirror the
//! owning resource identity (`namespace`, `name`) so series line up with
//! the Gslb objects they describe.

pub mod instrument;
pub mod metrics;
pub mod tracing;

pub use instrument::{Instrument, InstrumentKind, GSLB_SUBSYSTEM};
pub use metrics::{init, metrics, Metrics, MetricsError};
