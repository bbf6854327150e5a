//! One-shot access decision for a navigation.

use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::auth::{AuthError, TokenValidator};
use crate::config::UnreachablePolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Pending,
    Granted,
    Denied,
}

#[derive(Clone)]
pub struct AccessGate {
    validator: Arc<dyn TokenValidator>,
    on_unreachable: UnreachablePolicy,
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate")
            .field("on_unreachable", &self.on_unreachable)
            .finish_non_exhaustive()
    }
}

impl AccessGate {
    pub fn new(validator: Arc<dyn TokenValidator>, on_unreachable: UnreachablePolicy) -> Self {
        if on_unreachable == UnreachablePolicy::Allow {
            warn!("auth.on_unreachable is 'allow': navigations pass when the auth service is down");
        }
        Self {
            validator,
            on_unreachable,
        }
    }

    /// Resolve a `Pending` navigation. A missing or empty token is denied
    /// without contacting the validator.
    #[instrument(skip_all)]
    pub async fn evaluate(&self, token: Option<&str>) -> GateState {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            info!("navigation without token; denied");
            return GateState::Denied;
        };

        match self.validator.validate_token(token).await {
            Ok(true) => GateState::Granted,
            Ok(false) => {
                info!("token rejected by auth service");
                GateState::Denied
            }
            Err(AuthError::Unreachable(err)) => match self.on_unreachable {
                UnreachablePolicy::Deny => {
                    warn!(?err, "auth service unreachable; denying");
                    GateState::Denied
                }
                UnreachablePolicy::Allow => {
                    warn!(?err, "auth service unreachable; allowing by configuration");
                    GateState::Granted
                }
            },
            Err(err) => {
                warn!(?err, "token validation failed; denying");
                GateState::Denied
            }
        }
    }
}
