//! Wall-clock timestamps and the process-wide update counter.

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

static LAST_UPDATE_INDEX: AtomicU64 = AtomicU64::new(0);

/// Current wall-clock time in Unix milliseconds.
pub fn now_millis() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

/// Next update index.
///
/// Seeded from the wall clock in nanoseconds and strictly increasing within
/// the process, so two calls never return the same value even when the clock
/// does not move between them.
pub fn next_update_index() -> u64 {
    let wall = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_default()
        .max(0) as u64;

    let mut current = LAST_UPDATE_INDEX.load(Ordering::Relaxed);
    loop {
        let next = wall.max(current.saturating_add(1));
        match LAST_UPDATE_INDEX.compare_exchange_weak(
            current,
            next,
            Ordering::AcqRel,
            Ordering::Relaxed,
        ) {
            Ok(_) => return next,
            Err(actual) => current = actual,
        }
    }
}
