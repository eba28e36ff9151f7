use serde::{Deserialize, Serialize};
use std::{
    cell::RefCell,
    cmp::Ordering,
    collections::BTreeMap,
    time::{SystemTime, UNIX_EPOCH},
};

///
/// EventState
/// Ephemeral, in-memory counters for index operations.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub indexes: BTreeMap<String, IndexCounters>,
    pub since_ms: u64,
}

impl Default for EventState {
    fn default() -> Self {
        Self {
            ops: EventOps::default(),
            indexes: BTreeMap::new(),
            since_ms: now_millis(),
        }
    }
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventOps {
    // Reads
    pub readers_opened: u64,
    pub seeks: u64,
    pub seek_exact: u64,
    pub seek_nearest: u64,
    pub seek_none: u64,

    // Segment filtering
    pub segment_rows_skipped: u64,
    pub segment_seek_fallbacks: u64,

    // Differential overlay
    pub tombstones_skipped: u64,
    pub overlay_inserts: u64,
    pub overlay_tombstones: u64,
    pub overlay_clears: u64,
}

///
/// IndexCounters
/// Read counters split by index kind.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct IndexCounters {
    pub readers_opened: u64,
    pub seeks: u64,
    pub seek_exact: u64,
    pub seek_nearest: u64,
    pub seek_none: u64,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
        })
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters and restart the window.
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

///
/// EventReport
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    /// Counters since `since_ms`.
    pub counters: Option<EventState>,
    /// Per-kind read summaries.
    pub index_summaries: Vec<IndexSummary>,
}

///
/// IndexSummary
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct IndexSummary {
    pub kind: String,
    pub readers_opened: u64,
    pub seeks: u64,
    pub exact_seek_ratio: f64,
}

/// Build a report from in-memory counters.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub(crate) fn report() -> EventReport {
    let snap = with_state(Clone::clone);

    let mut index_summaries = snap
        .indexes
        .iter()
        .map(|(kind, counters)| {
            let exact_seek_ratio = if counters.seeks > 0 {
                counters.seek_exact as f64 / counters.seeks as f64
            } else {
                0.0
            };

            IndexSummary {
                kind: kind.clone(),
                readers_opened: counters.readers_opened,
                seeks: counters.seeks,
                exact_seek_ratio,
            }
        })
        .collect::<Vec<_>>();

    // Busiest first, then by name.
    index_summaries.sort_by(|a, b| match b.seeks.cmp(&a.seeks) {
        Ordering::Equal => a.kind.cmp(&b.kind),
        other => other,
    });

    EventReport {
        counters: Some(snap),
        index_summaries,
    }
}

///
/// TESTS
///
