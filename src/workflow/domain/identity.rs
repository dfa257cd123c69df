//! Authenticated caller identity supplied by the outer layer.

use serde::{Deserialize, Serialize};

/// Already-validated identity of the user behind a routing request.
///
/// No credential checks happen inside the crate; callers construct this
/// from whatever their authentication layer produced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallerIdentity {
    user_id: String,
    role: String,
}

impl CallerIdentity {
    /// Creates an identity.
    #[must_use]
    pub fn new(user_id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: role.into(),
        }
    }

    /// Returns the user identifier.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Returns the user's role.
    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }
}
