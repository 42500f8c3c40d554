use serde::{Deserialize, Serialize};

/// Role identifiers issued by the backend.
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";
pub const ROLE_NURSE: &str = "ROLE_NURSE";
pub const ROLE_PARENT: &str = "ROLE_PARENT";
pub const ROLE_STUDENT: &str = "ROLE_STUDENT";

/// Recognized roles in decreasing order of privilege. Used when a single
/// role must be picked for role-scoped navigation.
const ROLE_PRECEDENCE: [&str; 4] = [ROLE_ADMIN, ROLE_NURSE, ROLE_PARENT, ROLE_STUDENT];

/// The User struct represents an authenticated account in the system.
///
/// Field names follow the backend's camelCase wire shape. The persisted
/// record additionally embeds a copy of the bearer token; the who-am-i
/// endpoint returns the same shape without it.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub user_code: String,
    /// Embedded copy of the bearer token, present only in persisted records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl User {
    /// Construct a new User with optional roles and token copy.
    pub fn new(
        id: i64,
        username: String,
        email: String,
        full_name: String,
        roles: Option<Vec<String>>,
        user_code: String,
        token: Option<String>,
    ) -> Self {
        User {
            id,
            username,
            email,
            full_name,
            roles: roles.unwrap_or_default(),
            user_code,
            token,
        }
    }

    /// True when the account carries the given role identifier.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// The role used for role-scoped navigation. Recognized roles win in
    /// precedence order; an account carrying only unrecognized roles falls
    /// back to the first one listed.
    pub fn primary_role(&self) -> Option<&str> {
        ROLE_PRECEDENCE
            .iter()
            .find(|role| self.has_role(role))
            .copied()
            .or_else(|| self.roles.first().map(String::as_str))
    }
}
