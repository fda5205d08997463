use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated user making a request.
///
/// Anonymous requests carry no identity; core operations take `Option<&Identity>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
}

impl Identity {
    pub fn new(user_id: Uuid, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
        }
    }
}

impl From<&crate::domain::User> for Identity {
    fn from(user: &crate::domain::User) -> Self {
        Self::new(user.id, user.username.clone())
    }
}
