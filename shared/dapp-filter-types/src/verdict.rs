use serde::Serialize;

/// Outcome of asking a filter about one call. Produced per call and consumed
/// immediately by the executor; never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuthorizationVerdict {
    pub allowed: bool,
    /// Filter-level detail. Logged, but not surfaced to the batch caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AuthorizationVerdict {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}
