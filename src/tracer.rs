//! The `Tracer` façade and the `TracerProvider` that owns shared tracer
//! state: clock, resource, id generator, active `TraceConfig`, and the
//! processor registry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use log::warn;
use rand::RngCore;

use crate::builder::SpanBuilder;
use crate::clock::{Clock, SystemClock};
use crate::config::TraceConfig;
use crate::context::{self, Scope};
use crate::id::{SpanId, TraceId};
use crate::processor::{ProcessorRegistry, SpanProcessor};
use crate::resource::Resource;
use crate::span::Span;

/// Generates fresh trace/span identifiers. Implementations must be
/// thread-safe; the default `RandomIdGenerator` draws from `rand`'s
/// thread-local generator and retries on the all-zero (invalid) value.
pub trait IdGenerator: Send + Sync {
    fn new_trace_id(&self) -> TraceId;
    fn new_span_id(&self) -> SpanId;
}

#[derive(Debug, Default)]
pub struct RandomIdGenerator;

impl RandomIdGenerator {
    pub fn new() -> Self {
        RandomIdGenerator
    }
}

impl IdGenerator for RandomIdGenerator {
    fn new_trace_id(&self) -> TraceId {
        loop {
            let mut bytes = [0u8; 16];
            rand::rng().fill_bytes(&mut bytes);
            let id = TraceId::from_bytes(bytes);
            if id.is_valid() {
                return id;
            }
        }
    }

    fn new_span_id(&self) -> SpanId {
        loop {
            let mut bytes = [0u8; 8];
            rand::rng().fill_bytes(&mut bytes);
            let id = SpanId::from_bytes(bytes);
            if id.is_valid() {
                return id;
            }
        }
    }
}

struct Shared {
    clock: Arc<dyn Clock>,
    resource: Resource,
    id_generator: Arc<dyn IdGenerator>,
    processors: ProcessorRegistry,
    trace_config: RwLock<TraceConfig>,
    stopped: AtomicBool,
}

/// A handle used to start spans. Cheap to clone; every clone shares the
/// same processors, config, and id generator.
#[derive(Clone)]
pub struct Tracer {
    shared: Arc<Shared>,
}

impl Tracer {
    /// Starts building a span named `name`. By default the builder resolves
    /// its parent from the ambient current-span slot; call
    /// `with_no_parent()` or `with_parent_span(...)` to override that.
    pub fn span_builder(&self, name: impl Into<String>) -> SpanBuilder {
        SpanBuilder::new(
            name,
            self.shared.clock.clone(),
            self.shared.trace_config.read().unwrap().clone(),
            self.shared.processors.active(),
            self.shared.resource.clone(),
            self.shared.id_generator.clone(),
            self.shared.stopped.load(Ordering::Acquire),
        )
    }

    /// The span on top of the ambient current-span stack, if any.
    pub fn current_span(&self) -> Option<Span> {
        context::current_span()
    }

    /// Pushes `span` onto the ambient current-span stack for the lifetime
    /// of the returned `Scope`.
    #[must_use = "dropping the Scope immediately restores the previous current span"]
    pub fn with_span(&self, span: Span) -> Scope {
        context::push_current(span)
    }

    pub fn add_span_processor(&self, processor: Arc<dyn SpanProcessor>) {
        self.shared.processors.add(processor);
    }

    pub fn active_trace_config(&self) -> TraceConfig {
        self.shared.trace_config.read().unwrap().clone()
    }

    pub fn update_active_trace_config(&self, config: TraceConfig) {
        *self.shared.trace_config.write().unwrap() = config;
    }

    /// Flushes every registered processor via `shutdown()`. Idempotent: a
    /// repeat call is a silent no-op logged at warn level, since it almost
    /// always indicates a lifecycle bug in the caller.
    pub fn shutdown(&self) {
        if self.shared.stopped.swap(true, Ordering::AcqRel) {
            warn!("Tracer::shutdown() called more than once; ignoring repeat call");
            return;
        }
        self.shared.processors.active().shutdown();
    }
}

/// Owns the shared state behind every `Tracer` handle it produces. One
/// provider typically backs an entire process; `tracer()` is cheap and can
/// be called per module/component.
pub struct TracerProvider {
    shared: Arc<Shared>,
}

impl TracerProvider {
    pub fn builder() -> TracerProviderBuilder {
        TracerProviderBuilder::default()
    }

    pub fn tracer(&self, _instrumentation_name: impl Into<String>) -> Tracer {
        Tracer {
            shared: self.shared.clone(),
        }
    }

    pub fn shutdown(&self) {
        self.tracer("").shutdown();
    }
}

pub struct TracerProviderBuilder {
    clock: Arc<dyn Clock>,
    resource: Resource,
    id_generator: Arc<dyn IdGenerator>,
    trace_config: TraceConfig,
    processors: Vec<Arc<dyn SpanProcessor>>,
}

impl Default for TracerProviderBuilder {
    fn default() -> Self {
        TracerProviderBuilder {
            clock: Arc::new(SystemClock::new()),
            resource: Resource::empty(),
            id_generator: Arc::new(RandomIdGenerator::new()),
            trace_config: TraceConfig::default(),
            processors: Vec::new(),
        }
    }
}

impl TracerProviderBuilder {
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resource = resource;
        self
    }

    pub fn with_id_generator(mut self, id_generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = id_generator;
        self
    }

    pub fn with_config(mut self, trace_config: TraceConfig) -> Self {
        self.trace_config = trace_config;
        self
    }

    pub fn with_span_processor(mut self, processor: Arc<dyn SpanProcessor>) -> Self {
        self.processors.push(processor);
        self
    }

    pub fn build(self) -> TracerProvider {
        let registry = ProcessorRegistry::new();
        for processor in self.processors {
            registry.add(processor);
        }
        TracerProvider {
            shared: Arc::new(Shared {
                clock: self.clock,
                resource: self.resource,
                id_generator: self.id_generator,
                processors: registry,
                trace_config: RwLock::new(self.trace_config),
                stopped: AtomicBool::new(false),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::InMemorySpanProcessor;

    #[test]
    fn span_builder_starts_recording_span_by_default() {
        let memory = Arc::new(InMemorySpanProcessor::new());
        let provider = TracerProvider::builder()
            .with_span_processor(memory.clone())
            .build();
        let tracer = provider.tracer("test");

        let span = tracer.span_builder("root").with_no_parent().start();
        assert!(span.is_recording());
        span.end();

        assert_eq!(memory.started_spans().len(), 1);
        assert_eq!(memory.finished_spans().len(), 1);
    }

    #[test]
    fn with_span_sets_ambient_parent_for_child_builders() {
        let memory = Arc::new(InMemorySpanProcessor::new());
        let provider = TracerProvider::builder()
            .with_span_processor(memory.clone())
            .build();
        let tracer = provider.tracer("test");

        let parent = tracer.span_builder("parent").with_no_parent().start();
        let scope = tracer.with_span(parent.clone());
        let child = tracer.span_builder("child").start();
        drop(scope);

        assert_eq!(child.snapshot().trace_id, parent.snapshot().trace_id);
        child.end();
        parent.end();
    }

    #[test]
    fn shutdown_is_idempotent() {
        let provider = TracerProvider::builder().build();
        let tracer = provider.tracer("test");
        tracer.shutdown();
        tracer.shutdown();
    }

    #[test]
    fn stopped_tracer_yields_noop_spans() {
        let provider = TracerProvider::builder().build();
        let tracer = provider.tracer("test");
        tracer.shutdown();
        let span = tracer.span_builder("after-shutdown").start();
        assert!(!span.is_recording());
    }
}
