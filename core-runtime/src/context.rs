//! Per-invocation context threaded through every entry point.

use crate::events::EventSink;
use std::fmt;
use std::sync::Arc;
use tracing::Span;

/// What one trigger or action invocation borrows from the host.
///
/// The auth and provider layers read from it but never own it. Entry points
/// refuse a context whose `credential_id` differs from the secret their
/// connector authorizes with. The `span`
/// is the invocation's logging handle: work done on behalf of the
/// invocation runs inside it so every log line carries the step fields.
#[derive(Clone)]
pub struct CallContext {
    pub credential_id: String,
    pub span: Span,
    pub sink: Arc<dyn EventSink>,
}

impl CallContext {
    pub fn new(credential_id: impl Into<String>, sink: Arc<dyn EventSink>) -> Self {
        let credential_id = credential_id.into();
        let span = tracing::info_span!("invocation", credential_id = %credential_id);
        Self {
            credential_id,
            span,
            sink,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl fmt::Debug for CallContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallContext")
            .field("credential_id", &self.credential_id)
            .field("span", &self.span)
            .field("sink", &"EventSink { ... }")
            .finish()
    }
}
