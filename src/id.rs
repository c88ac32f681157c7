//! Opaque trace/span identifiers, trace flags, tracestate, and `SpanContext`.

use core::fmt;

use crate::error::TraceError;

/// A 16-byte trace identifier. The all-zero value is invalid.
#[derive(Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct TraceId([u8; 16]);

impl TraceId {
    pub const INVALID: TraceId = TraceId([0; 16]);

    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        TraceId(bytes)
    }

    pub const fn to_bytes(self) -> [u8; 16] {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        self.0 != [0; 16]
    }
}

impl fmt::Debug for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// An 8-byte span identifier. The all-zero value is invalid.
#[derive(Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct SpanId([u8; 8]);

impl SpanId {
    pub const INVALID: SpanId = SpanId([0; 8]);

    pub const fn from_bytes(bytes: [u8; 8]) -> Self {
        SpanId(bytes)
    }

    pub const fn to_bytes(self) -> [u8; 8] {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        self.0 != [0; 8]
    }
}

impl fmt::Debug for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Trace flags; bit 0 is the `SAMPLED` flag.
#[derive(Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct TraceFlags(u8);

impl TraceFlags {
    pub const NONE: TraceFlags = TraceFlags(0);
    pub const SAMPLED: TraceFlags = TraceFlags(1);

    pub const fn new(bits: u8) -> Self {
        TraceFlags(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub fn is_sampled(&self) -> bool {
        self.0 & Self::SAMPLED.0 != 0
    }

    pub fn with_sampled(self, sampled: bool) -> Self {
        if sampled {
            TraceFlags(self.0 | Self::SAMPLED.0)
        } else {
            TraceFlags(self.0 & !Self::SAMPLED.0)
        }
    }
}

/// Ordered `(key, value)` pairs propagated alongside a trace, per the W3C
/// tracestate model. Insertion order is preserved, matching the wire
/// format's `repeated` field semantics.
#[derive(Clone, PartialEq, Eq, Default, serde::Serialize)]
pub struct TraceState(Vec<(String, String)>);

impl TraceState {
    pub fn empty() -> Self {
        TraceState(Vec::new())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Inserts or updates `key`, moving it to the front (most-recently-set
    /// entries lead, matching the W3C tracestate mutation rule).
    pub fn insert(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<TraceState, TraceError> {
        let key = key.into();
        let value = value.into();
        if key.is_empty() {
            return Err(TraceError::invalid_tracestate("key must not be empty"));
        }
        if value.contains(',') || value.contains('=') {
            return Err(TraceError::invalid_tracestate(
                "value must not contain ',' or '='",
            ));
        }
        let mut entries: Vec<(String, String)> =
            self.0.iter().filter(|(k, _)| k != &key).cloned().collect();
        entries.insert(0, (key, value));
        Ok(TraceState(entries))
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, String)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for TraceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

/// Immutable `(TraceId, SpanId, TraceFlags, TraceState)` tuple identifying a
/// span's position in a trace. Equality is by value.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SpanContext {
    trace_id: TraceId,
    span_id: SpanId,
    trace_flags: TraceFlags,
    trace_state: TraceState,
}

impl SpanContext {
    pub fn new(
        trace_id: TraceId,
        span_id: SpanId,
        trace_flags: TraceFlags,
        trace_state: TraceState,
    ) -> Self {
        SpanContext {
            trace_id,
            span_id,
            trace_flags,
            trace_state,
        }
    }

    pub fn empty() -> Self {
        SpanContext {
            trace_id: TraceId::INVALID,
            span_id: SpanId::INVALID,
            trace_flags: TraceFlags::NONE,
            trace_state: TraceState::empty(),
        }
    }

    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    pub fn span_id(&self) -> SpanId {
        self.span_id
    }

    pub fn trace_flags(&self) -> TraceFlags {
        self.trace_flags
    }

    pub fn trace_state(&self) -> &TraceState {
        &self.trace_state
    }

    pub fn is_valid(&self) -> bool {
        self.trace_id.is_valid() && self.span_id.is_valid()
    }

    pub fn is_sampled(&self) -> bool {
        self.trace_flags.is_sampled()
    }
}
