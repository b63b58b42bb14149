//! W3C trace-context `traceparent` values.

use rand::RngCore;
use rand::rngs::OsRng;
use std::fmt;

/// Header carrying the trace context.
pub const TRACEPARENT_HEADER: &str = "traceparent";

/// A freshly sampled trace context: `00-<trace-id>-<span-id>-01`.
///
/// Ids come from the OS random source and are never all zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceParent {
    trace_id: [u8; 16],
    span_id: [u8; 8],
}

impl TraceParent {
    pub fn generate() -> Self {
        Self {
            trace_id: nonzero(),
            span_id: nonzero(),
        }
    }

    pub fn trace_id(&self) -> String {
        hex::encode(self.trace_id)
    }

    pub fn span_id(&self) -> String {
        hex::encode(self.span_id)
    }
}

impl fmt::Display for TraceParent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "00-{}-{}-01", self.trace_id(), self.span_id())
    }
}

fn nonzero<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    while bytes.iter().all(|b| *b == 0) {
        OsRng.fill_bytes(&mut bytes);
    }
    bytes
}
