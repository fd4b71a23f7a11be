//! Metric names and the shared fallback reporter.
//!
//! The library only records through the `metrics` facade; installing an
//! exporter is up to the embedding binary.

use metrics::counter;
use quill_core::ItemId;
use quill_events::PayloadError;
use tracing::warn;

/// Events that changed a snapshot, labeled by `kind`.
pub const EVENTS_APPLIED_TOTAL: &str = "view_events_applied_total";
/// Events dropped by the dispatcher (unknown or non-rendering kinds).
pub const EVENTS_IGNORED_TOTAL: &str = "view_events_ignored_total";
/// Payloads that failed to decode and fell back to a default, labeled by `op`.
pub const PAYLOAD_FALLBACK_TOTAL: &str = "view_payload_fallback_total";
/// Batch replays executed.
pub const REPLAYS_TOTAL: &str = "view_replays_total";

/// Record a payload decode fallback.
pub(crate) fn payload_fallback(op: &'static str, item_id: &ItemId, error: &PayloadError) {
    warn!(op, item_id = %item_id, error = %error, "payload decode failed, using fallback");
    counter!(PAYLOAD_FALLBACK_TOTAL, "op" => op).increment(1);
}
