//! Default User-Agent string for session requests.

/// Default User-Agent for all requests (identifies the tool).
///
/// Callers can override it per request or through `requestOptionOverrides`.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("session-client/{version}")
}
