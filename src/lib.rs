//! # tracecore
//!
//! An in-process span lifecycle engine for a distributed-tracing data
//! plane: a `Tracer`/`SpanBuilder` façade over `RecordingSpan`, fanned out
//! to zero or more `SpanProcessor`s.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use tracecore::{SpanKind, Status, StatusCode, TracerProvider};
//! use tracecore::processor::InMemorySpanProcessor;
//!
//! let memory = Arc::new(InMemorySpanProcessor::new());
//! let provider = TracerProvider::builder()
//!     .with_span_processor(memory.clone())
//!     .build();
//! let tracer = provider.tracer("my-component");
//!
//! let span = tracer.span_builder("do-work").with_kind(SpanKind::Internal).start();
//! span.set_attribute("retries", 2i64);
//! span.set_status(Status::new(StatusCode::Ok));
//! span.end();
//!
//! assert_eq!(memory.finished_spans().len(), 1);
//! ```
//!
//! Spans rejected by sampling, or started after `Tracer::shutdown()`, are
//! zero-cost no-ops satisfying the same mutation API — instrumented code
//! never needs to check whether it is "really" being recorded.

mod attributes;
pub mod builder;
mod clock;
mod config;
mod context;
mod error;
mod id;
pub mod processor;
mod queue;
mod resource;
mod span;
pub mod tracer;
mod status;

pub use attributes::AttributeValue;
pub use builder::SpanBuilder;
pub use clock::{Clock, SystemClock, TestClock, Timestamp, TimestampConverter};
pub use config::{
    AlwaysOff, AlwaysOn, ParentBased, Sampler, SamplingDecision, SamplingResult, TraceConfig,
    TraceConfigBuilder,
};
pub use context::{current_span, push_current, Scope};
pub use error::TraceError;
pub use id::{SpanContext, SpanId, TraceFlags, TraceId, TraceState};
pub use processor::{CompositeSpanProcessor, SimpleSpanProcessor, SpanExporter, SpanProcessor};
pub use queue::{Event, Link, TimedEventSnapshot};
pub use resource::Resource;
pub use span::{LinkSnapshot, Span, SpanKind, SpanSnapshot};
pub use status::{Status, StatusCode};
pub use tracer::{IdGenerator, RandomIdGenerator, Tracer, TracerProvider, TracerProviderBuilder};
