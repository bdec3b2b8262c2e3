//! Token budget enforcement

use crate::config::RouterConfig;
use crate::protocol::types::CompletionRequest;
use tracing::debug;

/// Lower `request.max_tokens` to the configured ceiling
///
/// An unset value becomes `default_max_tokens` first, so the field is never
/// unset afterwards.
pub fn clamp(request: &mut CompletionRequest, config: &RouterConfig) {
    let requested = request.max_tokens.unwrap_or(config.default_max_tokens);
    let clamped = requested.min(config.max_tokens_ceiling);

    if clamped < requested {
        debug!(
            requested,
            ceiling = config.max_tokens_ceiling,
            "Clamped max_tokens to ceiling"
        );
    }

    request.max_tokens = Some(clamped);
}
