//! The live, thread-safe span record (`RecordingSpan`), its no-op
//! counterpart, and the serializable `SpanSnapshot`.

use std::sync::{Arc, Mutex};

use log::{debug, error};

use crate::attributes::{AttributeValue, BoundedAttributes};
use crate::clock::{Clock, Timestamp, TimestampConverter};
use crate::config::TraceConfig;
use crate::id::{SpanContext, SpanId};
use crate::processor::SpanProcessor;
use crate::queue::{BoundedQueue, Event, Link, TimedEvent, TimedEventSnapshot};
use crate::resource::Resource;
use crate::status::Status;

/// The kind of span, per the OpenTelemetry-style span-kind taxonomy. Ordinals
/// match the wire protocol's `SpanKind` enum (zero reserved for
/// "unspecified", never produced by the builder — every span starts out
/// `Internal` unless overridden).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, serde::Serialize)]
#[repr(u8)]
pub enum SpanKind {
    Unspecified = 0,
    #[default]
    Internal = 1,
    Server = 2,
    Client = 3,
    Producer = 4,
    Consumer = 5,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct LinkSnapshot {
    pub trace_id: [u8; 16],
    pub span_id: [u8; 8],
    pub trace_state: Vec<(String, String)>,
    pub attributes: Vec<(String, AttributeValue)>,
    pub dropped_attributes_count: u32,
}

/// A wire-format-faithful, point-in-time view of a span. Produced by
/// `Span::snapshot()`, callable at any moment, including mid-flight.
#[derive(Clone, Debug, serde::Serialize)]
pub struct SpanSnapshot {
    pub trace_id: [u8; 16],
    pub span_id: [u8; 8],
    pub parent_span_id: Vec<u8>,
    pub trace_state: Vec<(String, String)>,
    pub name: String,
    pub kind: SpanKind,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub attributes: Vec<(String, AttributeValue)>,
    pub dropped_attributes_count: u32,
    pub time_events: Vec<TimedEventSnapshot>,
    pub dropped_timed_events_count: u32,
    pub links: Vec<LinkSnapshot>,
    pub dropped_links_count: u32,
    pub status: Option<Status>,
    pub child_span_count: Option<u32>,
    pub resource: Resource,
}

impl SpanSnapshot {
    pub fn latency_nanos(&self) -> i64 {
        let start = self.start_time.seconds * 1_000_000_000 + self.start_time.nanos as i64;
        let end = self.end_time.seconds * 1_000_000_000 + self.end_time.nanos as i64;
        end - start
    }
}

struct Mutable {
    name: String,
    attributes: Option<BoundedAttributes>,
    events: Option<BoundedQueue<TimedEvent>>,
    links: Option<BoundedQueue<Link>>,
    status: Option<Status>,
    children: u32,
    has_been_ended: bool,
    end_nanos: i64,
}

pub(crate) struct RecordingSpanInner {
    context: SpanContext,
    parent_span_id: Option<SpanId>,
    kind: SpanKind,
    clock: Arc<dyn Clock>,
    timestamp_converter: Arc<TimestampConverter>,
    trace_config: TraceConfig,
    resource: Resource,
    processor: Arc<dyn SpanProcessor>,
    start_nanos: i64,
    mutable: Mutex<Mutable>,
}

impl RecordingSpanInner {
    fn debug_id(&self) -> String {
        format!("{:?}/{:?}", self.context.trace_id(), self.context.span_id())
    }
}

/// A live span, produced by `SpanBuilder::start`. Either a recording span
/// with the full mutation surface, or a zero-cost no-op produced when
/// sampling rejects the span. Both satisfy the same mutation API.
#[derive(Clone)]
pub enum Span {
    Recording(Arc<RecordingSpanInner>),
    NoOp(SpanContext),
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn new_recording_span(
    context: SpanContext,
    parent_span_id: Option<SpanId>,
    kind: SpanKind,
    name: String,
    clock: Arc<dyn Clock>,
    timestamp_converter: Arc<TimestampConverter>,
    trace_config: TraceConfig,
    resource: Resource,
    processor: Arc<dyn SpanProcessor>,
    start_nanos: i64,
) -> Span {
    Span::Recording(Arc::new(RecordingSpanInner {
        context,
        parent_span_id,
        kind,
        clock,
        timestamp_converter,
        trace_config,
        resource,
        processor,
        start_nanos,
        mutable: Mutex::new(Mutable {
            name,
            attributes: None,
            events: None,
            links: None,
            status: None,
            children: 0,
            has_been_ended: false,
            end_nanos: 0,
        }),
    }))
}

impl Span {
    pub fn context(&self) -> &SpanContext {
        match self {
            Span::Recording(inner) => &inner.context,
            Span::NoOp(ctx) => ctx,
        }
    }

    pub fn is_recording(&self) -> bool {
        match self {
            Span::Recording(inner) => !inner.mutable.lock().unwrap().has_been_ended,
            Span::NoOp(_) => false,
        }
    }

    pub fn kind(&self) -> Option<SpanKind> {
        match self {
            Span::Recording(inner) => Some(inner.kind),
            Span::NoOp(_) => None,
        }
    }

    pub fn name(&self) -> Option<String> {
        match self {
            Span::Recording(inner) => Some(inner.mutable.lock().unwrap().name.clone()),
            Span::NoOp(_) => None,
        }
    }

    pub fn status(&self) -> Option<Status> {
        match self {
            Span::Recording(inner) => inner.mutable.lock().unwrap().status.clone(),
            Span::NoOp(_) => None,
        }
    }

    pub(crate) fn timestamp_converter(&self) -> Option<Arc<TimestampConverter>> {
        match self {
            Span::Recording(inner) => Some(inner.timestamp_converter.clone()),
            Span::NoOp(_) => None,
        }
    }

    pub(crate) fn add_child(&self) {
        if let Span::Recording(inner) = self {
            let mut m = inner.mutable.lock().unwrap();
            if m.has_been_ended {
                debug!("add_child on ended span {}", inner.debug_id());
                return;
            }
            m.children += 1;
        }
    }

    pub fn set_attribute(&self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        let Span::Recording(inner) = self else {
            return;
        };
        let mut m = inner.mutable.lock().unwrap();
        if m.has_been_ended {
            debug!("set_attribute on ended span {}", inner.debug_id());
            return;
        }
        let cap = inner.trace_config.max_attributes_per_span();
        m.attributes
            .get_or_insert_with(|| BoundedAttributes::new(cap))
            .put(key, value);
    }

    pub fn add_event(&self, event: Event) {
        let Span::Recording(inner) = self else {
            return;
        };
        let now = inner.clock.now_nanos();
        let mut m = inner.mutable.lock().unwrap();
        if m.has_been_ended {
            debug!("add_event on ended span {}", inner.debug_id());
            return;
        }
        let cap = inner.trace_config.max_events_per_span();
        m.events
            .get_or_insert_with(|| BoundedQueue::new(cap))
            .push(TimedEvent {
                nanos_monotonic: now,
                event,
            });
    }

    pub fn add_event_now(&self, name: impl Into<String>) {
        self.add_event(Event::new(name));
    }

    pub fn add_link(&self, link: Link) {
        let Span::Recording(inner) = self else {
            return;
        };
        let mut m = inner.mutable.lock().unwrap();
        if m.has_been_ended {
            debug!("add_link on ended span {}", inner.debug_id());
            return;
        }
        let cap = inner.trace_config.max_links_per_span();
        m.links.get_or_insert_with(|| BoundedQueue::new(cap)).push(link);
    }

    pub fn set_status(&self, status: Status) {
        let Span::Recording(inner) = self else {
            return;
        };
        let mut m = inner.mutable.lock().unwrap();
        if m.has_been_ended {
            debug!("set_status on ended span {}", inner.debug_id());
            return;
        }
        m.status = Some(status);
    }

    pub fn update_name(&self, name: impl Into<String>) {
        let Span::Recording(inner) = self else {
            return;
        };
        let mut m = inner.mutable.lock().unwrap();
        if m.has_been_ended {
            debug!("update_name on ended span {}", inner.debug_id());
            return;
        }
        m.name = name.into();
    }

    /// Ends the span. Idempotent: the second and subsequent calls are
    /// silent no-ops logged at debug level. The processor callback happens
    /// after the internal lock is released, so a processor can never
    /// deadlock by calling back into the span.
    pub fn end(&self) {
        let Span::Recording(inner) = self else {
            return;
        };
        {
            let mut m = inner.mutable.lock().unwrap();
            if m.has_been_ended {
                debug!("duplicate end() on span {}", inner.debug_id());
                return;
            }
            m.end_nanos = inner.clock.now_nanos();
            m.has_been_ended = true;
        }
        inner.processor.on_end(self);
    }

    /// Takes a consistent snapshot of all fields under the span's lock.
    /// Live spans report `end_time = now`; ended spans report the frozen
    /// end time.
    pub fn snapshot(&self) -> SpanSnapshot {
        match self {
            Span::Recording(inner) => {
                let m = inner.mutable.lock().unwrap();
                let end_nanos = if m.has_been_ended {
                    m.end_nanos
                } else {
                    inner.clock.now_nanos()
                };

                let (attributes, dropped_attributes_count) = match &m.attributes {
                    Some(attrs) => (
                        attrs
                            .iter()
                            .map(|(k, v)| (k.to_string(), v.clone()))
                            .collect(),
                        attrs.dropped(),
                    ),
                    None => (Vec::new(), 0),
                };

                let (time_events, dropped_timed_events_count) = match &m.events {
                    Some(events) => (
                        events
                            .iter()
                            .map(|te| TimedEventSnapshot {
                                time: inner.timestamp_converter.convert(te.nanos_monotonic),
                                name: te.event.name.clone(),
                                attributes: te.event.attributes.clone(),
                            })
                            .collect(),
                        events.dropped(),
                    ),
                    None => (Vec::new(), 0),
                };

                let (links, dropped_links_count) = match &m.links {
                    Some(links) => (
                        links
                            .iter()
                            .map(|l| LinkSnapshot {
                                trace_id: l.context.trace_id().to_bytes(),
                                span_id: l.context.span_id().to_bytes(),
                                trace_state: l.context.trace_state().iter().cloned().collect(),
                                attributes: l.attributes.clone(),
                                dropped_attributes_count: 0,
                            })
                            .collect(),
                        links.dropped(),
                    ),
                    None => (Vec::new(), 0),
                };

                let status = if m.has_been_ended {
                    Some(m.status.clone().unwrap_or(Status::OK))
                } else {
                    m.status.clone()
                };

                SpanSnapshot {
                    trace_id: inner.context.trace_id().to_bytes(),
                    span_id: inner.context.span_id().to_bytes(),
                    parent_span_id: inner
                        .parent_span_id
                        .map(|id| id.to_bytes().to_vec())
                        .unwrap_or_default(),
                    trace_state: inner.context.trace_state().iter().cloned().collect(),
                    name: m.name.clone(),
                    kind: inner.kind,
                    start_time: inner.timestamp_converter.convert(inner.start_nanos),
                    end_time: inner.timestamp_converter.convert(end_nanos),
                    attributes,
                    dropped_attributes_count,
                    time_events,
                    dropped_timed_events_count,
                    links,
                    dropped_links_count,
                    status,
                    child_span_count: Some(m.children),
                    resource: inner.resource.clone(),
                }
            }
            Span::NoOp(ctx) => SpanSnapshot {
                trace_id: ctx.trace_id().to_bytes(),
                span_id: ctx.span_id().to_bytes(),
                parent_span_id: Vec::new(),
                trace_state: Vec::new(),
                name: String::new(),
                kind: SpanKind::Internal,
                start_time: Timestamp { seconds: 0, nanos: 0 },
                end_time: Timestamp { seconds: 0, nanos: 0 },
                attributes: Vec::new(),
                dropped_attributes_count: 0,
                time_events: Vec::new(),
                dropped_timed_events_count: 0,
                links: Vec::new(),
                dropped_links_count: 0,
                status: None,
                child_span_count: None,
                resource: Resource::empty(),
            },
        }
    }
}

impl Drop for RecordingSpanInner {
    fn drop(&mut self) {
        // Only one Arc<RecordingSpanInner> owner reaching zero refs logs
        // this; Arc::strong_count at Drop time is always the count
        // observed by the last dropper, so there's no race to guard here.
        if let Ok(m) = self.mutable.lock() {
            if !m.has_been_ended {
                error!(
                    "span {} dropped without end() — observability leak",
                    self.debug_id()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TestClock;
    use crate::config::TraceConfig;
    use crate::id::{SpanContext, SpanId, TraceFlags, TraceId, TraceState};
    use crate::processor::NoopProcessor;

    fn make_recording_span(clock: Arc<TestClock>) -> Span {
        let converter = Arc::new(TimestampConverter::with_wall_anchor(0, 1_000_000_000_000_000_000));
        new_recording_span(
            SpanContext::new(
                TraceId::from_bytes([1; 16]),
                SpanId::from_bytes([1; 8]),
                TraceFlags::SAMPLED,
                TraceState::empty(),
            ),
            None,
            SpanKind::Internal,
            "test".to_string(),
            clock.clone(),
            converter,
            TraceConfig::default(),
            Resource::empty(),
            Arc::new(NoopProcessor),
            clock.now_nanos(),
        )
    }

    #[test]
    fn mutation_after_end_is_silent_no_op() {
        let clock = Arc::new(TestClock::new());
        let span = make_recording_span(clock.clone());
        span.end();
        let before = span.snapshot();

        span.set_attribute("key", "value");
        span.add_event(Event::new("evt"));
        span.add_link(Link::new(SpanContext::empty()));
        span.set_status(Status::new(crate::status::StatusCode::Cancelled));
        span.update_name("renamed");

        let after = span.snapshot();
        assert_eq!(before.name, after.name);
        assert_eq!(after.attributes.len(), 0);
        assert_eq!(after.time_events.len(), 0);
        assert_eq!(after.links.len(), 0);
        assert_eq!(after.status, Some(Status::OK));
    }

    #[test]
    fn second_end_is_a_silent_no_op() {
        let clock = Arc::new(TestClock::new());
        let span = make_recording_span(clock.clone());
        span.end();
        let end_time = span.snapshot().end_time;
        clock.advance(1_000_000_000);
        span.end();
        assert_eq!(span.snapshot().end_time, end_time);
    }

    #[test]
    fn end_time_never_precedes_start_time() {
        let clock = Arc::new(TestClock::new());
        let span = make_recording_span(clock.clone());
        let snap = span.snapshot();
        assert!(snap.end_time >= snap.start_time);
    }
}
