// SPDX-License-Identifier: AGPL-3.0-or-later

/// Request-scoped ambient context.
///
/// Carries the values the outer layers (HTTP session handling, API tokens)
/// resolved for the current request. The projection only consumes the
/// authenticated user id; resolving it into a member happens at query time
/// against the current timeline.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    user_id: Option<String>,
}

impl RequestContext {
    /// Returns an anonymous context without an authenticated user.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a context for an authenticated user id.
    pub fn with_user_id(user_id: &str) -> Self {
        Self {
            user_id: Some(user_id.to_owned()),
        }
    }

    /// The authenticated user id, when present.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }
}
