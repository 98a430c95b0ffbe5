//! Per-call spans.
//!
//! Every proxy call runs inside a `proxy_call` span carrying a fresh call id,
//! so log lines from the binder, builder and transport correlate.

use uuid::Uuid;

use crate::binding::model::MethodBinding;

/// Span for one call of `binding`.
pub fn call_span(binding: &MethodBinding) -> ::tracing::Span {
    let call_id = Uuid::new_v4();
    ::tracing::info_span!(
        "proxy_call",
        call_id = %call_id,
        interface = %binding.interface.name,
        method = %binding.name,
        verb = %binding.verb,
        kind = binding.kind.as_str(),
    )
}
