//! Location request state machine.
//!
//! `Idle → Requesting → (AwaitingAuthorization → Requesting) → Idle`.
//! Owned by `RequestCoordinator`; at most one request is ever outside `Idle`.

/// Phase of the single in-flight location request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestPhase {
    #[default]
    Idle,
    /// Provider configured or updates started; waiting for a sample
    Requesting,
    /// Authorization was requested; waiting for the provider to report a decision
    AwaitingAuthorization,
}

impl RequestPhase {
    /// True if an authorization decision would be acted upon.
    pub fn awaits_authorization(self) -> bool {
        matches!(self, RequestPhase::AwaitingAuthorization)
    }

    /// State after asking the provider for authorization.
    pub fn on_authorization_requested(self) -> Self {
        match self {
            RequestPhase::Requesting => RequestPhase::AwaitingAuthorization,
            other => other,
        }
    }

    /// State after the provider reports the request is now authorized.
    pub fn on_authorized(self) -> Self {
        match self {
            RequestPhase::AwaitingAuthorization => RequestPhase::Requesting,
            other => other,
        }
    }

    /// State after the request resolved, successfully or not.
    pub fn on_resolved(self) -> Self {
        RequestPhase::Idle
    }
}
