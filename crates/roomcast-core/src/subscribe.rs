//! Checks run by the delivery server before it joins a socket to a room.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{RealtimeError, RealtimeResult};
use crate::permission::{PermissionChecker, PermissionType};
use crate::session::SessionData;

/// Response of the user-info endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub user: String,
}

pub fn get_user_info(session: &SessionData) -> UserInfo {
    UserInfo {
        user: session.user.clone(),
    }
}

/// Decides whether a session may subscribe to a document room.
#[derive(Clone)]
pub struct SubscriptionGuard {
    permissions: Arc<dyn PermissionChecker>,
    ci_bypass: bool,
}

impl SubscriptionGuard {
    pub fn new(permissions: Arc<dyn PermissionChecker>) -> Self {
        Self {
            permissions,
            ci_bypass: false,
        }
    }

    /// Allow every subscription without evaluating permissions.
    /// Only meant for CI runs.
    pub fn with_ci_bypass(mut self, ci_bypass: bool) -> Self {
        if ci_bypass {
            info!("Document subscription permission checks are bypassed (CI)");
        }
        self.ci_bypass = ci_bypass;
        self
    }

    /// Every subscription is allowed; callers may skip resolving the session.
    pub fn is_bypassed(&self) -> bool {
        self.ci_bypass
    }

    /// `Ok(true)` when the session user can read the document, otherwise
    /// [`RealtimeError::PermissionDenied`].
    pub async fn can_subscribe_doc(
        &self,
        session: &SessionData,
        doctype: &str,
        docname: &str,
    ) -> RealtimeResult<bool> {
        if self.ci_bypass {
            return Ok(true);
        }

        let allowed = self
            .permissions
            .has_permission(&session.user, doctype, docname, PermissionType::Read)
            .await?;

        if !allowed {
            debug!(user = %session.user, doctype, docname, "Document subscription refused");
            return Err(RealtimeError::permission_denied(format!(
                "{} cannot read {} {}",
                session.user, doctype, docname
            )));
        }
        Ok(true)
    }
}
