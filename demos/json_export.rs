//! Wires a `SimpleSpanProcessor` up to a `SpanExporter` that prints each
//! finished span as a line of JSON, the way a real exporter would hand
//! snapshots off to a collector.

use std::sync::Arc;

use tracecore::processor::SimpleSpanProcessor;
use tracecore::{SpanExporter, SpanKind, SpanSnapshot, TracerProvider};

struct StdoutJsonExporter;

impl SpanExporter for StdoutJsonExporter {
    fn export(&self, span: SpanSnapshot) {
        println!(
            "[{}] {}",
            span.end_time.to_chrono().to_rfc3339(),
            span.name
        );
        match serde_json::to_string(&span) {
            Ok(line) => println!("{line}"),
            Err(err) => eprintln!("failed to serialize span {}: {err}", span.name),
        }
    }
}

fn main() {
    env_logger::init();

    let provider = TracerProvider::builder()
        .with_span_processor(Arc::new(SimpleSpanProcessor::new(StdoutJsonExporter)))
        .build();
    let tracer = provider.tracer("json_export_demo");

    let request = tracer
        .span_builder("handle-request")
        .with_kind(SpanKind::Server)
        .with_no_parent()
        .start();
    request.set_attribute("http.method", "GET");
    request.set_attribute("http.route", "/users/:id");

    let scope = tracer.with_span(request.clone());
    let db = tracer.span_builder("query-users").with_kind(SpanKind::Client).start();
    db.set_attribute("db.statement", "SELECT * FROM users WHERE id = $1");
    db.end();
    drop(scope);

    request.end();
    provider.shutdown();
}
