//! Collects builder inputs and runs the sampling/id-allocation/processor
//! `onStart` sequence that produces either a recording span or a no-op.

use std::sync::Arc;

use log::warn;

use crate::attributes::AttributeValue;
use crate::clock::{Clock, TimestampConverter};
use crate::config::{Sampler, TraceConfig};
use crate::context;
use crate::error::TraceError;
use crate::id::{SpanContext, TraceFlags};
use crate::processor::SpanProcessor;
use crate::queue::Link;
use crate::span::{new_recording_span, Span, SpanKind};
use crate::tracer::IdGenerator;

const MAX_NAME_BYTES: usize = 255;

/// Where the builder resolves a span's parent from.
enum ParentSource {
    /// No parent was given and no ambient context was consulted: root span.
    NoParent,
    /// An explicit `SpanContext` or live `Span` was given.
    Explicit(SpanContext),
    /// Consult the ambient current-span slot at `start()` time.
    Ambient,
}

pub struct SpanBuilder {
    name: String,
    kind: SpanKind,
    parent_source: ParentSource,
    parent_span: Option<Span>,
    attributes: Vec<(String, AttributeValue)>,
    links: Vec<Link>,
    start_timestamp: Option<i64>,
    sampler_override: Option<Arc<dyn Sampler>>,

    clock: Arc<dyn Clock>,
    trace_config: TraceConfig,
    processor: Arc<dyn SpanProcessor>,
    resource: crate::resource::Resource,
    id_generator: Arc<dyn IdGenerator>,
    tracer_stopped: bool,
}

impl SpanBuilder {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: impl Into<String>,
        clock: Arc<dyn Clock>,
        trace_config: TraceConfig,
        processor: Arc<dyn SpanProcessor>,
        resource: crate::resource::Resource,
        id_generator: Arc<dyn IdGenerator>,
        tracer_stopped: bool,
    ) -> Self {
        SpanBuilder {
            name: name.into(),
            kind: SpanKind::Internal,
            parent_source: ParentSource::Ambient,
            parent_span: None,
            attributes: Vec::new(),
            links: Vec::new(),
            start_timestamp: None,
            sampler_override: None,
            clock,
            trace_config,
            processor,
            resource,
            id_generator,
            tracer_stopped,
        }
    }

    pub fn with_kind(mut self, kind: SpanKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_parent_context(mut self, context: SpanContext) -> Self {
        self.parent_source = ParentSource::Explicit(context);
        self.parent_span = None;
        self
    }

    pub fn with_parent_span(mut self, span: Span) -> Self {
        self.parent_source = ParentSource::Explicit(span.context().clone());
        self.parent_span = Some(span);
        self
    }

    pub fn with_no_parent(mut self) -> Self {
        self.parent_source = ParentSource::NoParent;
        self.parent_span = None;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn with_attributes(mut self, attrs: Vec<(String, AttributeValue)>) -> Self {
        self.attributes.extend(attrs);
        self
    }

    pub fn with_link(mut self, link: Link) -> Self {
        self.links.push(link);
        self
    }

    pub fn with_links(mut self, links: Vec<Link>) -> Self {
        self.links.extend(links);
        self
    }

    pub fn with_start_timestamp(mut self, nanos: i64) -> Self {
        self.start_timestamp = Some(nanos);
        self
    }

    pub fn with_sampler(mut self, sampler: Arc<dyn Sampler>) -> Self {
        self.sampler_override = Some(sampler);
        self
    }

    /// Validates inputs and builds the span. Invalid names (empty, not
    /// ASCII, or over 255 bytes) return a typed error rather than silently
    /// building a broken span.
    pub fn try_start(self) -> Result<Span, TraceError> {
        if self.name.is_empty() {
            return Err(TraceError::invalid_argument("span name must not be empty"));
        }
        if !self.name.is_ascii() {
            return Err(TraceError::invalid_argument("span name must be ASCII"));
        }
        if self.name.len() > MAX_NAME_BYTES {
            return Err(TraceError::invalid_argument(format!(
                "span name must be at most {MAX_NAME_BYTES} bytes, got {}",
                self.name.len()
            )));
        }

        if self.tracer_stopped {
            return Ok(Span::NoOp(SpanContext::empty()));
        }

        Ok(self.build())
    }

    /// Infallible convenience wrapper: a build failure (invalid argument,
    /// or a stopped tracer) is treated the same way — a no-op span, logged
    /// at warn level rather than propagated.
    pub fn start(self) -> Span {
        let name = self.name.clone();
        match self.try_start() {
            Ok(span) => span,
            Err(err) => {
                warn!("span_builder(\"{name}\").start() failed: {err}; returning a no-op span");
                Span::NoOp(SpanContext::empty())
            }
        }
    }

    fn resolve_parent(&self) -> Option<SpanContext> {
        match &self.parent_source {
            ParentSource::NoParent => None,
            ParentSource::Explicit(ctx) if ctx.is_valid() => Some(ctx.clone()),
            ParentSource::Explicit(_) => None,
            ParentSource::Ambient => context::current_span().map(|s| s.context().clone()),
        }
    }

    fn local_parent_span(&self) -> Option<Span> {
        if let Some(span) = &self.parent_span {
            return Some(span.clone());
        }
        if matches!(self.parent_source, ParentSource::Ambient) {
            return context::current_span();
        }
        None
    }

    fn build(self) -> Span {
        let parent_context = self.resolve_parent();
        let local_parent = self.local_parent_span();

        let span_id = self.id_generator.new_span_id();
        let trace_id = match &parent_context {
            Some(ctx) if ctx.is_valid() => ctx.trace_id(),
            _ => self.id_generator.new_trace_id(),
        };

        let sampler = self
            .sampler_override
            .clone()
            .unwrap_or_else(|| self.trace_config.sampler().clone());
        let sampling_result =
            sampler.should_sample(parent_context.as_ref(), trace_id, &self.name, self.kind, &self.links);

        if !sampling_result.is_recording() {
            let context = SpanContext::new(
                trace_id,
                span_id,
                TraceFlags::NONE,
                parent_context
                    .as_ref()
                    .map(|c| c.trace_state().clone())
                    .unwrap_or_default(),
            );
            return Span::NoOp(context);
        }

        let trace_state = parent_context
            .as_ref()
            .map(|c| c.trace_state().clone())
            .unwrap_or_default();
        let context = SpanContext::new(
            trace_id,
            span_id,
            TraceFlags::NONE.with_sampled(sampling_result.is_sampled()),
            trace_state,
        );

        let parent_span_id = parent_context.as_ref().and_then(|ctx| {
            if ctx.is_valid() {
                Some(ctx.span_id())
            } else {
                None
            }
        });

        let start_nanos = self.start_timestamp.unwrap_or_else(|| self.clock.now_nanos());

        // Inherit the parent's timestamp converter when the parent is a
        // local recording span, so sibling spans stay ordered even if the
        // wall clock jitters between conversions.
        let timestamp_converter = local_parent
            .as_ref()
            .and_then(|p| p.timestamp_converter())
            .unwrap_or_else(|| Arc::new(TimestampConverter::new(start_nanos)));

        let span = new_recording_span(
            context,
            parent_span_id,
            self.kind,
            self.name,
            self.clock.clone(),
            timestamp_converter,
            self.trace_config.clone(),
            self.resource,
            self.processor.clone(),
            start_nanos,
        );

        for (key, value) in self.attributes.into_iter().chain(sampling_result.attributes) {
            span.set_attribute(key, value);
        }
        for link in self.links {
            span.add_link(link);
        }

        self.processor.on_start(&span);

        if let Some(parent) = local_parent {
            parent.add_child();
        }

        span
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TestClock;
    use crate::processor::InMemorySpanProcessor;
    use crate::tracer::RandomIdGenerator;

    fn test_builder(name: &str, clock: Arc<TestClock>, processor: Arc<dyn SpanProcessor>) -> SpanBuilder {
        SpanBuilder::new(
            name,
            clock,
            TraceConfig::default(),
            processor,
            crate::resource::Resource::empty(),
            Arc::new(RandomIdGenerator::new()),
            false,
        )
    }

    #[test]
    fn empty_name_is_rejected() {
        let clock = Arc::new(TestClock::new());
        let builder = test_builder("", clock, Arc::new(InMemorySpanProcessor::new()));
        let err = builder.try_start().unwrap_err();
        assert!(matches!(err, TraceError::InvalidArgument { .. }));
    }

    #[test]
    fn over_length_name_is_rejected() {
        let clock = Arc::new(TestClock::new());
        let name = "a".repeat(300);
        let builder = test_builder(&name, clock, Arc::new(InMemorySpanProcessor::new()));
        assert!(builder.try_start().is_err());
    }

    #[test]
    fn stopped_tracer_yields_silent_noop() {
        let clock = Arc::new(TestClock::new());
        let mut builder = test_builder("x", clock, Arc::new(InMemorySpanProcessor::new()));
        builder.tracer_stopped = true;
        let span = builder.start();
        assert!(!span.is_recording());
    }

    #[test]
    fn root_span_has_empty_parent_span_id() {
        let clock = Arc::new(TestClock::new());
        let builder = test_builder("root", clock, Arc::new(InMemorySpanProcessor::new())).with_no_parent();
        let span = builder.start();
        assert_eq!(span.snapshot().parent_span_id, Vec::<u8>::new());
    }

    #[test]
    fn child_inherits_trace_id_and_parent_span_id() {
        let clock = Arc::new(TestClock::new());
        let processor: Arc<dyn SpanProcessor> = Arc::new(InMemorySpanProcessor::new());
        let parent = test_builder("parent", clock.clone(), processor.clone())
            .with_no_parent()
            .start();
        let child = test_builder("child", clock, processor)
            .with_parent_span(parent.clone())
            .start();

        let parent_snap = parent.snapshot();
        let child_snap = child.snapshot();
        assert_eq!(child_snap.trace_id, parent_snap.trace_id);
        assert_eq!(child_snap.parent_span_id, parent_snap.span_id.to_vec());
    }
}
