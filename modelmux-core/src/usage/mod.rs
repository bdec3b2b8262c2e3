//! Usage-history submission
//!
//! Records are shipped best-effort: submission is spawned, never joined, and
//! failures are logged and dropped.

pub mod http;
pub mod record;
pub mod sink;

pub use http::HttpUsageSink;
pub use record::{UsageRecord, USAGE_RECORD_TYPE};
pub use sink::{UsageError, UsageSink};

use std::sync::Arc;
use tracing::{debug, warn};

/// Submit a record in the background
///
/// The returned handle may be dropped; the submission keeps running and its
/// outcome is only logged. Outside a tokio runtime the record is dropped with
/// a warning and `None` is returned.
pub fn submit_detached(
    sink: Arc<dyn UsageSink>,
    record: UsageRecord,
) -> Option<tokio::task::JoinHandle<()>> {
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        warn!(record_id = %record.id, "No tokio runtime; usage record dropped");
        return None;
    };

    Some(runtime.spawn(async move {
        let id = record.id;
        match sink.submit(record).await {
            Ok(()) => debug!(record_id = %id, "Usage record persisted"),
            Err(e) => warn!(record_id = %id, error = %e, "Failed to persist usage record"),
        }
    }))
}
