// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Extension traits for recording operations.

use std::time::Duration;

use crate::{
    Result,
    cache::CacheName,
    telemetry::{CacheActivity, CacheOperation, CacheTelemetry},
};

pub(crate) trait CacheTelemetryExt {
    /// Records an operation if telemetry is configured.
    fn record(&self, name: CacheName, operation: CacheOperation, activity: CacheActivity, duration: Duration);

    /// Records the outcome of `result`, classifying successes with `activity`.
    fn record_result<T>(
        &self,
        name: CacheName,
        operation: CacheOperation,
        result: &Result<T>,
        activity: impl FnOnce(&T) -> CacheActivity,
        duration: Duration,
    ) {
        let activity = result.as_ref().map_or(CacheActivity::Error, activity);
        self.record(name, operation, activity, duration);
    }
}

impl CacheTelemetryExt for Option<CacheTelemetry> {
    fn record(&self, name: CacheName, operation: CacheOperation, activity: CacheActivity, duration: Duration) {
        if let Some(telemetry) = self {
            telemetry.record(name, operation, activity, duration);
        }
    }
}
