//! The `SpanProcessor` contract and the composite that fans a single
//! `on_start`/`on_end`/`shutdown` call out to every registered processor.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;

use arc_swap::ArcSwap;
use log::error;

use crate::span::{Span, SpanSnapshot};

/// Synchronous callbacks invoked by the tracer on span start and end, and
/// once by the tracer on shutdown. Implementations must be thread-safe.
/// A panic raised by a processor is caught and logged; it must never
/// propagate to the recording thread.
pub trait SpanProcessor: Send + Sync {
    fn on_start(&self, span: &Span);
    fn on_end(&self, span: &Span);
    fn shutdown(&self);
}

/// Forwards to an ordered list of processors, invoking each in
/// registration order. Built fresh and atomically published whenever the
/// registered-processor list changes, so that the hot `on_start`/`on_end`
/// path only ever does one atomic load, never a lock.
pub struct CompositeSpanProcessor {
    processors: Vec<std::sync::Arc<dyn SpanProcessor>>,
}

impl CompositeSpanProcessor {
    pub fn new(processors: Vec<std::sync::Arc<dyn SpanProcessor>>) -> Self {
        CompositeSpanProcessor { processors }
    }

    pub fn empty() -> Self {
        CompositeSpanProcessor {
            processors: Vec::new(),
        }
    }
}

fn guarded<F: FnOnce()>(label: &str, f: F) {
    if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(f)) {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "<no panic message>".to_string());
        error!("span processor {label} panicked: {message}");
    }
}

impl SpanProcessor for CompositeSpanProcessor {
    fn on_start(&self, span: &Span) {
        for (i, p) in self.processors.iter().enumerate() {
            guarded(&format!("#{i}:on_start"), || p.on_start(span));
        }
    }

    fn on_end(&self, span: &Span) {
        for (i, p) in self.processors.iter().enumerate() {
            guarded(&format!("#{i}:on_end"), || p.on_end(span));
        }
    }

    fn shutdown(&self) {
        for (i, p) in self.processors.iter().enumerate() {
            guarded(&format!("#{i}:shutdown"), || p.shutdown());
        }
    }
}

/// Holds the tracer's live composite processor behind a lock-free swap, and
/// the registration list behind a lock used only on registration (never on
/// the `on_start`/`on_end` hot path).
pub(crate) struct ProcessorRegistry {
    registered: Mutex<Vec<std::sync::Arc<dyn SpanProcessor>>>,
    active: ArcSwap<CompositeSpanProcessor>,
}

impl ProcessorRegistry {
    pub(crate) fn new() -> Self {
        ProcessorRegistry {
            registered: Mutex::new(Vec::new()),
            active: ArcSwap::from_pointee(CompositeSpanProcessor::empty()),
        }
    }

    pub(crate) fn add(&self, processor: std::sync::Arc<dyn SpanProcessor>) {
        let mut registered = self.registered.lock().unwrap();
        registered.push(processor);
        self.active
            .store(std::sync::Arc::new(CompositeSpanProcessor::new(registered.clone())));
    }

    pub(crate) fn active(&self) -> std::sync::Arc<CompositeSpanProcessor> {
        self.active.load_full()
    }
}

/// A minimal processor that forwards `on_end` snapshots synchronously to a
/// single downstream exporter. No batching, no transport, no I/O — those
/// remain out of scope for the core.
pub trait SpanExporter: Send + Sync {
    fn export(&self, span: SpanSnapshot);
    fn shutdown(&self) {}
}

pub struct SimpleSpanProcessor<E: SpanExporter> {
    exporter: E,
}

impl<E: SpanExporter> SimpleSpanProcessor<E> {
    pub fn new(exporter: E) -> Self {
        SimpleSpanProcessor { exporter }
    }
}

impl<E: SpanExporter> SpanProcessor for SimpleSpanProcessor<E> {
    fn on_start(&self, _span: &Span) {}

    fn on_end(&self, span: &Span) {
        self.exporter.export(span.snapshot());
    }

    fn shutdown(&self) {
        self.exporter.shutdown();
    }
}

/// A processor that does nothing; useful as a default/placeholder.
pub struct NoopProcessor;

impl SpanProcessor for NoopProcessor {
    fn on_start(&self, _span: &Span) {}
    fn on_end(&self, _span: &Span) {}
    fn shutdown(&self) {}
}

/// Records every `on_start`/`on_end` snapshot for test assertions.
#[cfg(any(test, feature = "test-util"))]
pub struct InMemorySpanProcessor {
    started: Mutex<Vec<SpanSnapshot>>,
    ended: Mutex<Vec<SpanSnapshot>>,
}

#[cfg(any(test, feature = "test-util"))]
impl InMemorySpanProcessor {
    pub fn new() -> Self {
        InMemorySpanProcessor {
            started: Mutex::new(Vec::new()),
            ended: Mutex::new(Vec::new()),
        }
    }

    pub fn started_spans(&self) -> Vec<SpanSnapshot> {
        self.started.lock().unwrap().clone()
    }

    pub fn finished_spans(&self) -> Vec<SpanSnapshot> {
        self.ended.lock().unwrap().clone()
    }
}

#[cfg(any(test, feature = "test-util"))]
impl Default for InMemorySpanProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-util"))]
impl SpanProcessor for InMemorySpanProcessor {
    fn on_start(&self, span: &Span) {
        self.started.lock().unwrap().push(span.snapshot());
    }

    fn on_end(&self, span: &Span) {
        self.ended.lock().unwrap().push(span.snapshot());
    }

    fn shutdown(&self) {}
}
