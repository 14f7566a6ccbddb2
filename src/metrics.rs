//! Metric taxonomy and collectors
//!
//! Two kinds of metric are emitted:
//!
//! - [`Meter`] — discrete occurrences, recorded as a count
//! - [`Timer`] — durations
//!
//! Every metric has a stable dotted path (e.g. `nakadi.java.client.event.sent`)
//! looked up from a single static table, so downstream collectors can
//! forward them without matching on variants.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

/// A metric that measures an occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Meter {
    /// The event stream processor was restarted
    StreamRestart,
    /// An event stream connection was retried
    StreamRetry,
    /// The subscription stream processor was restarted
    SubscriptionRestart,
    /// A subscription stream connection was retried
    SubscriptionRetry,
    /// An event was consumed from a stream
    Received,
    /// A response with a status outside the known classes
    HttpUnknown,
    /// A multi-status (partial success) response
    Http207,
    Http4xx,
    Http400,
    Http401,
    Http404,
    Http409,
    Http412,
    Http422,
    Http429,
    Http5xx,
    Http500,
    Http503,
    /// Events accepted by the broker
    Sent,
    /// A retry policy was skipped because it had already finished
    RetrySkipFinished,
}

/// A metric that measures a duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timer {
    /// Wall-clock time of one event send, retries included
    EventSend,
    /// Wall-clock time of one cursor checkpoint
    CheckpointSend,
}

/// Meter → dotted path
pub const METER_PATHS: [(Meter, &str); 20] = [
    (Meter::StreamRestart, "nakadi.java.client.stream.event.restart"),
    (Meter::StreamRetry, "nakadi.java.client.stream.event.retry"),
    (Meter::SubscriptionRestart, "nakadi.java.client.stream.subscription.restart"),
    (Meter::SubscriptionRetry, "nakadi.java.client.stream.subscription.retry"),
    (Meter::Received, "nakadi.java.client.event.received"),
    (Meter::HttpUnknown, "nakadi.java.client.http.error"),
    (Meter::Http207, "nakadi.java.client.http.207"),
    (Meter::Http4xx, "nakadi.java.client.http.4xx"),
    (Meter::Http400, "nakadi.java.client.http.400"),
    (Meter::Http401, "nakadi.java.client.http.401"),
    (Meter::Http404, "nakadi.java.client.http.404"),
    (Meter::Http409, "nakadi.java.client.http.409"),
    (Meter::Http412, "nakadi.java.client.http.412"),
    (Meter::Http422, "nakadi.java.client.http.422"),
    (Meter::Http429, "nakadi.java.client.http.429"),
    (Meter::Http5xx, "nakadi.java.client.http.5xx"),
    (Meter::Http500, "nakadi.java.client.http.500"),
    (Meter::Http503, "nakadi.java.client.http.503"),
    (Meter::Sent, "nakadi.java.client.event.sent"),
    (Meter::RetrySkipFinished, "nakadi.java.client.retry.skip_finished"),
];

/// Timer → dotted path
pub const TIMER_PATHS: [(Timer, &str); 2] = [
    (Timer::EventSend, "nakadi.java.client.event.sendtime"),
    (Timer::CheckpointSend, "nakadi.java.client.checkpoint.sendtime"),
];

impl Meter {
    /// All meters, in table order
    pub fn all() -> impl Iterator<Item = Meter> {
        METER_PATHS.iter().map(|(meter, _)| *meter)
    }

    /// The dotted path used when forwarding to downstream collectors
    pub fn path(self) -> &'static str {
        METER_PATHS
            .iter()
            .find(|(meter, _)| *meter == self)
            .map(|(_, path)| *path)
            .unwrap_or("nakadi.java.client.unknown")
    }

    /// Status-class meters for an error response
    ///
    /// Marked by the execution layer for every response it sees. Successful
    /// statuses (including 207) yield nothing here.
    pub fn for_error_status(status: u16) -> Vec<Meter> {
        match status {
            100..=399 => Vec::new(),
            400..=499 => {
                let specific = match status {
                    400 => Some(Meter::Http400),
                    401 => Some(Meter::Http401),
                    404 => Some(Meter::Http404),
                    409 => Some(Meter::Http409),
                    412 => Some(Meter::Http412),
                    422 => Some(Meter::Http422),
                    429 => Some(Meter::Http429),
                    _ => None,
                };
                std::iter::once(Meter::Http4xx).chain(specific).collect()
            }
            500..=599 => {
                let specific = match status {
                    500 => Some(Meter::Http500),
                    503 => Some(Meter::Http503),
                    _ => None,
                };
                std::iter::once(Meter::Http5xx).chain(specific).collect()
            }
            _ => vec![Meter::HttpUnknown],
        }
    }
}

impl Timer {
    /// All timers, in table order
    pub fn all() -> impl Iterator<Item = Timer> {
        TIMER_PATHS.iter().map(|(timer, _)| *timer)
    }

    /// The dotted path used when forwarding to downstream collectors
    pub fn path(self) -> &'static str {
        TIMER_PATHS
            .iter()
            .find(|(timer, _)| *timer == self)
            .map(|(_, path)| *path)
            .unwrap_or("nakadi.java.client.unknown")
    }
}

/// Meter increments for one completed send
///
/// 200..=204 counts every event as sent; 207 counts the multi-status
/// occurrence once. Everything else is left to the execution layer.
pub fn classify_send(status: u16, event_count: usize) -> Vec<(Meter, u64)> {
    match status {
        200..=204 => vec![(Meter::Sent, event_count as u64)],
        207 => vec![(Meter::Http207, 1)],
        _ => Vec::new(),
    }
}

/// Sink for meters and timers
///
/// Implementations must be cheap and must not fail; they are called on
/// every send.
pub trait MetricCollector: Send + Sync {
    /// Mark `count` occurrences of a meter
    fn mark_count(&self, meter: Meter, count: u64);

    /// Record how long an occurrence took
    fn duration(&self, timer: Timer, elapsed: Duration);

    /// Mark a single occurrence of a meter
    fn mark(&self, meter: Meter) {
        self.mark_count(meter, 1);
    }
}

/// Collector that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetricCollector;

impl MetricCollector for NoopMetricCollector {
    fn mark_count(&self, _meter: Meter, _count: u64) {}

    fn duration(&self, _timer: Timer, _elapsed: Duration) {}
}

/// Collector that forwards metrics as `tracing` events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMetricCollector;

impl MetricCollector for TracingMetricCollector {
    fn mark_count(&self, meter: Meter, count: u64) {
        tracing::debug!(metric = meter.path(), count, "meter");
    }

    fn duration(&self, timer: Timer, elapsed: Duration) {
        tracing::debug!(
            metric = timer.path(),
            nanos = elapsed.as_nanos() as u64,
            "timer"
        );
    }
}

/// In-memory collector for testing and local inspection
#[derive(Debug, Default)]
pub struct MemoryMetricCollector {
    meters: RwLock<HashMap<Meter, u64>>,
    timers: RwLock<HashMap<Timer, Vec<Duration>>>,
}

impl MemoryMetricCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total marked for a meter
    pub fn count(&self, meter: Meter) -> u64 {
        self.meters
            .read()
            .map(|meters| meters.get(&meter).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Every meter with a non-zero count
    pub fn meters(&self) -> HashMap<Meter, u64> {
        self.meters
            .read()
            .map(|meters| meters.clone())
            .unwrap_or_default()
    }

    /// Recorded durations for a timer, in recording order
    pub fn durations(&self, timer: Timer) -> Vec<Duration> {
        self.timers
            .read()
            .map(|timers| timers.get(&timer).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Clear all recorded metrics
    pub fn reset(&self) {
        if let Ok(mut meters) = self.meters.write() {
            meters.clear();
        }
        if let Ok(mut timers) = self.timers.write() {
            timers.clear();
        }
    }
}

impl MetricCollector for MemoryMetricCollector {
    fn mark_count(&self, meter: Meter, count: u64) {
        if let Ok(mut meters) = self.meters.write() {
            *meters.entry(meter).or_insert(0) += count;
        }
    }

    fn duration(&self, timer: Timer, elapsed: Duration) {
        if let Ok(mut timers) = self.timers.write() {
            timers.entry(timer).or_default().push(elapsed);
        }
    }
}
