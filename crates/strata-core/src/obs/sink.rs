//! Metrics sink boundary.
//!
//! Index logic MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
use crate::{index::SeekResultType, obs::metrics};
use std::{cell::RefCell, fmt, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = RefCell::new(None);
}

///
/// IndexKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IndexKind {
    Memory,
    Segment,
    Differential,
}

impl IndexKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Segment => "segment",
            Self::Differential => "differential",
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug)]
pub enum MetricsEvent {
    ReaderOpen {
        index: IndexKind,
    },
    Seek {
        index: IndexKind,
        outcome: SeekResultType,
    },
    SegmentRowsSkipped {
        rows: u64,
    },
    SegmentSeekFallback,
    TombstonesSkipped {
        rows: u64,
    },
    OverlayInsert,
    OverlayTombstone,
    OverlayClear {
        tombstones: u64,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default thread-local sink that writes into the counter state.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        match event {
            MetricsEvent::ReaderOpen { index } => {
                metrics::with_state_mut(|m| {
                    m.ops.readers_opened = m.ops.readers_opened.saturating_add(1);
                    let entry = m.indexes.entry(index.label().to_string()).or_default();
                    entry.readers_opened = entry.readers_opened.saturating_add(1);
                });
            }

            MetricsEvent::Seek { index, outcome } => {
                metrics::with_state_mut(|m| {
                    m.ops.seeks = m.ops.seeks.saturating_add(1);
                    match outcome {
                        SeekResultType::Exact => {
                            m.ops.seek_exact = m.ops.seek_exact.saturating_add(1);
                        }
                        SeekResultType::Nearest => {
                            m.ops.seek_nearest = m.ops.seek_nearest.saturating_add(1);
                        }
                        SeekResultType::None => m.ops.seek_none = m.ops.seek_none.saturating_add(1),
                    }

                    let entry = m.indexes.entry(index.label().to_string()).or_default();
                    entry.seeks = entry.seeks.saturating_add(1);
                    match outcome {
                        SeekResultType::Exact => {
                            entry.seek_exact = entry.seek_exact.saturating_add(1);
                        }
                        SeekResultType::Nearest => {
                            entry.seek_nearest = entry.seek_nearest.saturating_add(1);
                        }
                        SeekResultType::None => entry.seek_none = entry.seek_none.saturating_add(1),
                    }
                });
            }

            MetricsEvent::SegmentRowsSkipped { rows } => {
                metrics::with_state_mut(|m| {
                    m.ops.segment_rows_skipped = m.ops.segment_rows_skipped.saturating_add(rows);
                });
            }

            MetricsEvent::SegmentSeekFallback => {
                metrics::with_state_mut(|m| {
                    m.ops.segment_seek_fallbacks = m.ops.segment_seek_fallbacks.saturating_add(1);
                });
            }

            MetricsEvent::TombstonesSkipped { rows } => {
                metrics::with_state_mut(|m| {
                    m.ops.tombstones_skipped = m.ops.tombstones_skipped.saturating_add(rows);
                });
            }

            MetricsEvent::OverlayInsert => {
                metrics::with_state_mut(|m| {
                    m.ops.overlay_inserts = m.ops.overlay_inserts.saturating_add(1);
                });
            }

            MetricsEvent::OverlayTombstone => {
                metrics::with_state_mut(|m| {
                    m.ops.overlay_tombstones = m.ops.overlay_tombstones.saturating_add(1);
                });
            }

            MetricsEvent::OverlayClear { tombstones } => {
                metrics::with_state_mut(|m| {
                    m.ops.overlay_clears = m.ops.overlay_clears.saturating_add(1);
                    m.ops.overlay_tombstones = m.ops.overlay_tombstones.saturating_add(tombstones);
                });
            }
        }
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    let sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match sink {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot the current thread's metrics state.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all metrics state on the current thread.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with `sink` receiving every event emitted on this thread.
/// The previous sink is restored on return and on unwind.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let prev = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = prev;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        cell::Cell,
        panic::{AssertUnwindSafe, catch_unwind},
    };

    #[derive(Default)]
    struct CountingSink {
        calls: Cell<usize>,
    }

    impl MetricsSink for CountingSink {
        fn record(&self, _: MetricsEvent) {
            self.calls.set(self.calls.get() + 1);
        }
    }

    fn seek_event() -> MetricsEvent {
        MetricsEvent::Seek {
            index: IndexKind::Memory,
            outcome: SeekResultType::Exact,
        }
    }

    #[test]
    fn with_metrics_sink_routes_and_restores_nested_overrides() {
        SINK_OVERRIDE.with(|cell| {
            *cell.borrow_mut() = None;
        });

        let outer = Rc::new(CountingSink::default());
        let inner = Rc::new(CountingSink::default());

        // No override installed yet.
        record(seek_event());
        assert_eq!(outer.calls.get(), 0);
        assert_eq!(inner.calls.get(), 0);

        with_metrics_sink(outer.clone(), || {
            record(seek_event());
            assert_eq!(outer.calls.get(), 1);
            assert_eq!(inner.calls.get(), 0);

            with_metrics_sink(inner.clone(), || {
                record(MetricsEvent::OverlayInsert);
            });

            // Inner override was restored to outer override.
            record(MetricsEvent::SegmentSeekFallback);
        });

        assert_eq!(outer.calls.get(), 2);
        assert_eq!(inner.calls.get(), 1);

        SINK_OVERRIDE.with(|cell| {
            assert!(cell.borrow().is_none());
        });

        record(seek_event());
        assert_eq!(outer.calls.get(), 2);
        assert_eq!(inner.calls.get(), 1);
    }

    #[test]
    fn with_metrics_sink_restores_override_on_panic() {
        SINK_OVERRIDE.with(|cell| {
            *cell.borrow_mut() = None;
        });

        let sink = Rc::new(CountingSink::default());

        let panicked = catch_unwind(AssertUnwindSafe(|| {
            with_metrics_sink(sink.clone(), || {
                record(seek_event());
                panic!("intentional panic for guard test");
            });
        }))
        .is_err();
        assert!(panicked);
        assert_eq!(sink.calls.get(), 1);

        SINK_OVERRIDE.with(|cell| {
            assert!(cell.borrow().is_none());
        });

        record(seek_event());
        assert_eq!(sink.calls.get(), 1);
    }

    #[test]
    fn seek_events_accumulate_per_kind() {
        metrics_reset_all();

        record(seek_event());
        record(MetricsEvent::Seek {
            index: IndexKind::Segment,
            outcome: SeekResultType::None,
        });
        record(MetricsEvent::ReaderOpen {
            index: IndexKind::Segment,
        });

        let counters = metrics_report()
            .counters
            .expect("metrics report should include counters");
        assert_eq!(counters.ops.seeks, 2);
        assert_eq!(counters.ops.seek_exact, 1);
        assert_eq!(counters.ops.seek_none, 1);
        assert_eq!(counters.ops.readers_opened, 1);

        let segment = counters
            .indexes
            .get("segment")
            .expect("segment counters should be present");
        assert_eq!(segment.seeks, 1);
        assert_eq!(segment.readers_opened, 1);
    }

    #[test]
    fn overlay_clear_counts_its_tombstones() {
        metrics_reset_all();

        record(MetricsEvent::OverlayTombstone);
        record(MetricsEvent::OverlayClear { tombstones: 3 });
        record(MetricsEvent::TombstonesSkipped { rows: 2 });

        let counters = metrics_report()
            .counters
            .expect("metrics report should include counters");
        assert_eq!(counters.ops.overlay_clears, 1);
        assert_eq!(counters.ops.overlay_tombstones, 4);
        assert_eq!(counters.ops.tombstones_skipped, 2);
    }
}
