//! Order number generation.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Human-facing order number, `ORD-<unix millis>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

static GLOBAL: OrderNumberGenerator = OrderNumberGenerator::new();

impl OrderNumber {
    /// Issues the next number from the process-wide generator.
    pub fn generate(now: DateTime<Utc>) -> Self {
        GLOBAL.next(now)
    }

    /// Wraps a persisted order number.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Issues strictly increasing time-based order numbers.
///
/// The suffix is the wall clock in milliseconds, bumped past the previous
/// value when two orders land in the same millisecond or the clock steps back.
#[derive(Debug)]
pub struct OrderNumberGenerator {
    last: AtomicI64,
}

impl OrderNumberGenerator {
    pub const fn new() -> Self {
        Self {
            last: AtomicI64::new(0),
        }
    }

    /// Returns a number strictly greater than every number issued before.
    pub fn next(&self, now: DateTime<Utc>) -> OrderNumber {
        let millis = now.timestamp_millis();
        let previous = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(millis.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        OrderNumber(format!("ORD-{}", millis.max(previous + 1)))
    }
}

impl Default for OrderNumberGenerator {
    fn default() -> Self {
        Self::new()
    }
}
