//! Core identifier and time types shared by every component.

use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Registry-scoped opaque agent id.
pub type AgentId = String;

/// Opaque thread id.
pub type ThreadId = String;

/// Capability id within a thread: an explicit id or the capability's type tag.
pub type CapabilityId = String;

/// Wall-clock timestamp used on every record.
pub type Timestamp = DateTime<Utc>;

/// Mint a fresh opaque id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

static LAST_NANOS: AtomicI64 = AtomicI64::new(i64::MIN);

/// Current wall-clock time, strictly increasing within the process so records
/// created one after another never share a timestamp.
pub fn now() -> Timestamp {
    let wall = Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX);
    let mut previous = LAST_NANOS.load(Ordering::Relaxed);
    loop {
        let next = wall.max(previous.saturating_add(1));
        match LAST_NANOS.compare_exchange_weak(previous, next, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return Utc.timestamp_nanos(next),
            Err(actual) => previous = actual,
        }
    }
}
