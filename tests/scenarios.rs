//! End-to-end scenarios and quantified invariants from the span lifecycle
//! model, driven through the public `Tracer`/`SpanBuilder` surface rather
//! than the internal span API directly.

use std::sync::Arc;
use std::thread;

use tracecore::processor::InMemorySpanProcessor;
use tracecore::{AlwaysOff, SpanKind, Status, StatusCode, TraceConfig, TracerProvider};

fn provider_with_memory() -> (TracerProvider, Arc<InMemorySpanProcessor>) {
    let memory = Arc::new(InMemorySpanProcessor::new());
    let provider = TracerProvider::builder().with_span_processor(memory.clone()).build();
    (provider, memory)
}

// S1 — a root span starts, accumulates state, and ends with a snapshot
// reflecting everything recorded on it.
#[test]
fn s1_basic_lifecycle_end_to_end() {
    let (provider, memory) = provider_with_memory();
    let tracer = provider.tracer("scenarios");

    let span = tracer.span_builder("s1").with_no_parent().start();
    assert!(span.is_recording());
    span.set_attribute("a", 1i64);
    span.add_event_now("tick");
    span.end();
    assert!(!span.is_recording());

    let snap = memory.finished_spans().into_iter().next().unwrap();
    assert_eq!(snap.name, "s1");
    assert_eq!(snap.attributes, vec![("a".to_string(), 1i64.into())]);
    assert_eq!(snap.time_events.len(), 1);
}

// S3 — a span started with no ambient or explicit parent is a root: empty
// parent_span_id, fresh trace_id.
#[test]
fn s3_root_span_has_no_parent() {
    let (provider, _memory) = provider_with_memory();
    let tracer = provider.tracer("scenarios");

    let root = tracer.span_builder("root").with_no_parent().start();
    let snap = root.snapshot();
    assert!(snap.parent_span_id.is_empty());
    assert!(snap.trace_id != [0u8; 16]);
    root.end();
}

// Invariant #1 (roughly): every started span is eventually observed by
// on_start before on_end, in that order, for every processor.
#[test]
fn invariant_on_start_precedes_on_end() {
    let (provider, memory) = provider_with_memory();
    let tracer = provider.tracer("scenarios");

    let span = tracer.span_builder("ordered").with_no_parent().start();
    assert_eq!(memory.started_spans().len(), 1);
    assert_eq!(memory.finished_spans().len(), 0);
    span.end();
    assert_eq!(memory.finished_spans().len(), 1);
}

// Invariant #2: a span rejected by the sampler never reaches a processor.
#[test]
fn invariant_dropped_spans_never_reach_processors() {
    let memory = Arc::new(InMemorySpanProcessor::new());
    let provider = TracerProvider::builder()
        .with_span_processor(memory.clone())
        .with_config(TraceConfig::builder().with_sampler(AlwaysOff).build())
        .build();
    let tracer = provider.tracer("scenarios");

    let span = tracer.span_builder("dropped").with_no_parent().start();
    assert!(!span.is_recording());
    span.set_attribute("ignored", true);
    span.end();

    assert!(memory.started_spans().is_empty());
    assert!(memory.finished_spans().is_empty());
}

// Invariant #4: child_span_count reflects only children added before the
// parent ended; it is monotonic and never decreases.
#[test]
fn invariant_child_span_count_is_monotonic() {
    let (provider, _memory) = provider_with_memory();
    let tracer = provider.tracer("scenarios");

    let parent = tracer.span_builder("parent").with_no_parent().start();
    assert_eq!(parent.snapshot().child_span_count, Some(0));

    let scope = tracer.with_span(parent.clone());
    let c1 = tracer.span_builder("c1").start();
    assert_eq!(parent.snapshot().child_span_count, Some(1));
    let c2 = tracer.span_builder("c2").start();
    assert_eq!(parent.snapshot().child_span_count, Some(2));
    drop(scope);

    c1.end();
    c2.end();
    parent.end();
    assert_eq!(parent.snapshot().child_span_count, Some(2));
}

// Invariant #5: status defaults to unset while live, and to OK once ended
// if never explicitly set.
#[test]
fn invariant_status_defaults_to_ok_only_after_end() {
    let (provider, _memory) = provider_with_memory();
    let tracer = provider.tracer("scenarios");

    let span = tracer.span_builder("status").with_no_parent().start();
    assert_eq!(span.snapshot().status, None);
    span.end();
    assert_eq!(span.snapshot().status, Some(Status::new(StatusCode::Ok)));
}

// Invariant #8: spans are safe to mutate from any thread that holds a
// clone of the `Span` handle, and the resulting state is consistent.
#[test]
fn invariant_concurrent_mutation_is_consistent() {
    let (provider, memory) = provider_with_memory();
    let tracer = provider.tracer("scenarios");

    let span = tracer
        .span_builder("concurrent")
        .with_kind(SpanKind::Internal)
        .with_no_parent()
        .start();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let span = span.clone();
            thread::spawn(move || {
                span.set_attribute(format!("k{i}"), i as i64);
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    span.end();

    let snap = memory.finished_spans().into_iter().next().unwrap();
    assert_eq!(snap.attributes.len(), 8);
}
