//! Immutable per-tracer configuration snapshot, and the pluggable
//! `Sampler` collaborator.

use std::sync::Arc;

use crate::attributes::AttributeValue;
use crate::id::{SpanContext, TraceId};
use crate::queue::Link;
use crate::span::SpanKind;

pub const DEFAULT_MAX_ATTRIBUTES: usize = 32;
pub const DEFAULT_MAX_EVENTS: usize = 128;
pub const DEFAULT_MAX_LINKS: usize = 32;
pub const DEFAULT_MAX_ATTRIBUTES_PER_EVENT: usize = 32;
pub const DEFAULT_MAX_ATTRIBUTES_PER_LINK: usize = 32;

/// The sampler's verdict: whether to record/export, and which trace state
/// to carry forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SamplingDecision {
    Drop,
    RecordOnly,
    RecordAndSample,
}

pub struct SamplingResult {
    pub decision: SamplingDecision,
    pub attributes: Vec<(String, AttributeValue)>,
}

impl SamplingResult {
    pub fn is_sampled(&self) -> bool {
        matches!(self.decision, SamplingDecision::RecordAndSample)
    }

    pub fn is_recording(&self) -> bool {
        !matches!(self.decision, SamplingDecision::Drop)
    }
}

/// The sampling-decision collaborator. Sees the proposed parent context,
/// ids, name, kind, and links, and returns a `SamplingResult`. Kept
/// independent of the recording path so decisions stay reproducible.
pub trait Sampler: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    fn should_sample(
        &self,
        parent: Option<&SpanContext>,
        trace_id: TraceId,
        name: &str,
        kind: SpanKind,
        links: &[Link],
    ) -> SamplingResult;

    fn description(&self) -> &'static str {
        "Sampler"
    }
}

/// Always records and samples, regardless of parent.
#[derive(Debug, Default)]
pub struct AlwaysOn;

impl Sampler for AlwaysOn {
    fn should_sample(
        &self,
        _parent: Option<&SpanContext>,
        _trace_id: TraceId,
        _name: &str,
        _kind: SpanKind,
        _links: &[Link],
    ) -> SamplingResult {
        SamplingResult {
            decision: SamplingDecision::RecordAndSample,
            attributes: Vec::new(),
        }
    }

    fn description(&self) -> &'static str {
        "AlwaysOnSampler"
    }
}

/// Never records.
#[derive(Debug, Default)]
pub struct AlwaysOff;

impl Sampler for AlwaysOff {
    fn should_sample(
        &self,
        _parent: Option<&SpanContext>,
        _trace_id: TraceId,
        _name: &str,
        _kind: SpanKind,
        _links: &[Link],
    ) -> SamplingResult {
        SamplingResult {
            decision: SamplingDecision::Drop,
            attributes: Vec::new(),
        }
    }

    fn description(&self) -> &'static str {
        "AlwaysOffSampler"
    }
}

/// Defers to the parent's sampling decision when a valid parent exists;
/// otherwise defers to a root sampler (default `AlwaysOn`).
pub struct ParentBased {
    root: Arc<dyn Sampler>,
}

impl ParentBased {
    pub fn new(root: Arc<dyn Sampler>) -> Self {
        ParentBased { root }
    }
}

impl Default for ParentBased {
    fn default() -> Self {
        ParentBased::new(Arc::new(AlwaysOn))
    }
}

impl Sampler for ParentBased {
    fn should_sample(
        &self,
        parent: Option<&SpanContext>,
        trace_id: TraceId,
        name: &str,
        kind: SpanKind,
        links: &[Link],
    ) -> SamplingResult {
        match parent {
            Some(ctx) if ctx.is_valid() => {
                let decision = if ctx.is_sampled() {
                    SamplingDecision::RecordAndSample
                } else {
                    SamplingDecision::Drop
                };
                SamplingResult {
                    decision,
                    attributes: Vec::new(),
                }
            }
            _ => self.root.should_sample(parent, trace_id, name, kind, links),
        }
    }

    fn description(&self) -> &'static str {
        "ParentBased"
    }
}

/// Immutable configuration snapshot consumed by the builder and the span:
/// sampler plus the caps on attributes/events/links per span, and the
/// per-event/per-link attribute caps.
#[derive(Clone)]
pub struct TraceConfig {
    sampler: Arc<dyn Sampler>,
    max_attributes_per_span: usize,
    max_events_per_span: usize,
    max_links_per_span: usize,
    max_attributes_per_event: usize,
    max_attributes_per_link: usize,
}

impl TraceConfig {
    pub fn builder() -> TraceConfigBuilder {
        TraceConfigBuilder::default()
    }

    pub fn sampler(&self) -> &Arc<dyn Sampler> {
        &self.sampler
    }

    pub fn max_attributes_per_span(&self) -> usize {
        self.max_attributes_per_span
    }

    pub fn max_events_per_span(&self) -> usize {
        self.max_events_per_span
    }

    pub fn max_links_per_span(&self) -> usize {
        self.max_links_per_span
    }

    pub fn max_attributes_per_event(&self) -> usize {
        self.max_attributes_per_event
    }

    pub fn max_attributes_per_link(&self) -> usize {
        self.max_attributes_per_link
    }
}

impl Default for TraceConfig {
    fn default() -> Self {
        TraceConfig {
            sampler: Arc::new(ParentBased::default()),
            max_attributes_per_span: DEFAULT_MAX_ATTRIBUTES,
            max_events_per_span: DEFAULT_MAX_EVENTS,
            max_links_per_span: DEFAULT_MAX_LINKS,
            max_attributes_per_event: DEFAULT_MAX_ATTRIBUTES_PER_EVENT,
            max_attributes_per_link: DEFAULT_MAX_ATTRIBUTES_PER_LINK,
        }
    }
}

#[derive(Default)]
pub struct TraceConfigBuilder {
    config: TraceConfig,
}

impl TraceConfigBuilder {
    pub fn with_sampler(mut self, sampler: impl Sampler + 'static) -> Self {
        self.config.sampler = Arc::new(sampler);
        self
    }

    pub fn with_max_attributes_per_span(mut self, max: usize) -> Self {
        self.config.max_attributes_per_span = max;
        self
    }

    pub fn with_max_events_per_span(mut self, max: usize) -> Self {
        self.config.max_events_per_span = max;
        self
    }

    pub fn with_max_links_per_span(mut self, max: usize) -> Self {
        self.config.max_links_per_span = max;
        self
    }

    pub fn with_max_attributes_per_event(mut self, max: usize) -> Self {
        self.config.max_attributes_per_event = max;
        self
    }

    pub fn with_max_attributes_per_link(mut self, max: usize) -> Self {
        self.config.max_attributes_per_link = max;
        self
    }

    pub fn build(self) -> TraceConfig {
        self.config
    }
}
