// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Telemetry configuration for tagged caches.

#[cfg(any(feature = "metrics", test))]
use opentelemetry::metrics::{Meter, MeterProvider};
use thread_aware::Arc;

use crate::telemetry::{CacheTelemetry, cache::CacheTelemetryInner};

/// Configuration for cache telemetry.
///
/// Enable logs and, with the `metrics` feature, metrics, then pass the configuration to the
/// cache builder via `.telemetry()`.
///
/// # Examples
///
/// ```
/// use tagcache::{TaggedCache, TelemetryConfig};
/// use tick::Clock;
///
/// # fn example(clock: Clock) {
/// let cache = TaggedCache::builder(clock)
///     .memory()
///     .name("catalog")
///     .telemetry(TelemetryConfig::new().with_logs())
///     .build();
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct TelemetryConfig {
    logs_enabled: bool,
    #[cfg(any(feature = "metrics", test))]
    meter: Option<Meter>,
}

impl TelemetryConfig {
    /// Creates a configuration with everything disabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables structured logging of cache operations via `tracing`.
    ///
    /// Hits, misses and skipped conditional writes log at `DEBUG`; stale entries, writes and
    /// invalidations at `INFO`; failures at `ERROR`.
    #[must_use]
    pub fn with_logs(self) -> Self {
        Self {
            logs_enabled: true,
            ..self
        }
    }

    /// Enables metrics collection using the provided meter provider.
    #[cfg(any(feature = "metrics", test))]
    #[must_use]
    pub fn with_metrics(mut self, provider: &dyn MeterProvider) -> Self {
        self.meter = Some(crate::telemetry::metrics::create_meter(provider));
        self
    }

    #[must_use]
    pub(crate) fn build(self) -> CacheTelemetry {
        #[cfg(any(feature = "metrics", test))]
        let (event_counter, operation_duration) = {
            use crate::telemetry::metrics::{create_event_counter, create_operation_duration_histogram};
            (
                self.meter.as_ref().map(create_event_counter),
                self.meter.as_ref().map(create_operation_duration_histogram),
            )
        };

        CacheTelemetry {
            inner: Arc::from_unaware(CacheTelemetryInner {
                logging_enabled: self.logs_enabled,
                #[cfg(any(feature = "metrics", test))]
                event_counter,
                #[cfg(any(feature = "metrics", test))]
                operation_duration,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::testing::MetricTester;

    #[test]
    fn build_keeps_settings_across_clones() {
        let tester = MetricTester::new();
        let telemetry = TelemetryConfig::new().with_logs().with_metrics(tester.meter_provider()).build();
        let clone = telemetry.clone();

        assert!(clone.inner.logging_enabled);
        assert!(clone.inner.event_counter.is_some());
        assert!(clone.inner.operation_duration.is_some());
    }
}
