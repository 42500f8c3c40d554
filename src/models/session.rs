use crate::models::User;

/// A point-in-time view of the session: who is signed in, whether a
/// transition is in flight, and the last human-readable failure.
#[derive(Clone, Debug, Default)]
pub struct SessionSnapshot {
    pub user: Option<User>,
    pub token: Option<String>,
    /// True only during initial validation and login/register transitions.
    pub loading: bool,
    pub error: Option<String>,
}

impl SessionSnapshot {
    /// True when both halves of the identity are present. Token and user are
    /// always set and cleared together outside a pending validation.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }
}
