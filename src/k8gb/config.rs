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


use std::env;

/// Namespace used when the metrics facade is first touched before `init`.
pub const DEFAULT_METRICS_NAMESPACE: &str = "k8gb";

/// Enum for supported configuration parameters
#[derive(Debug)]
pub enum Config {
    MetricsNamespace,
    LogFormat,
}

impl Config {
    /// Returns the associated environment variable for the config parameter.
    pub fn env_var(&self) -> &'static str {
        match self {
            Config::MetricsNamespace => "K8GB_METRICS_NAMESPACE",
            Config::LogFormat => "K8GB_LOG_FORMAT",
        }
    }

    /// Returns the value used when the environment variable is unset or blank.
    pub fn default_value(&self) -> &'static str {
        match self {
            Config::MetricsNamespace => DEFAULT_METRICS_NAMESPACE,
            Config::LogFormat => "text",
        }
    }

    /// Returns the effective value, either from environment or default.
    pub fn get(&self) -> String {
        env::var(self.env_var())
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| self.default_value().to_string())
    }
}

/// Naming scope applied to every GSLB metric.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetricsConfig {
    pub namespace: String,
}

impl MetricsConfig {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// Builds the configuration from `K8GB_METRICS_NAMESPACE`.
    pub fn from_env() -> Self {
        Self::new(Config::MetricsNamespace.get())
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self::new(DEFAULT_METRICS_NAMESPACE)
    }
}
