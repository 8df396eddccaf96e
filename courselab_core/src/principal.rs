//! Users and roles that policies get attached to.
//!

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// The user attached to when no target is given.
pub const DEFAULT_USER: &str = "learner";

/// The type of identity a policy is attached to.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    /// An IAM user
    User,
    /// An IAM role
    Role,
}

impl Display for PrincipalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrincipalKind::User => write!(f, "user"),
            PrincipalKind::Role => write!(f, "role"),
        }
    }
}

/// A remote user or role, referenced by name. This tool never creates
/// principals; they must already exist.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Principal {
    /// User or role
    pub kind: PrincipalKind,
    /// The principal's name in the account
    pub name: String,
}

impl Principal {
    /// Reference a user by name.
    pub fn user<S: Into<String>>(name: S) -> Self {
        Self {
            kind: PrincipalKind::User,
            name: name.into(),
        }
    }

    /// Reference a role by name.
    pub fn role<S: Into<String>>(name: S) -> Self {
        Self {
            kind: PrincipalKind::Role,
            name: name.into(),
        }
    }

    /// Pick the target from mutually exclusive user/role selections. A role
    /// wins if present, then the user, then `default_user`.
    pub fn from_selection(
        user: Option<String>,
        role: Option<String>,
        default_user: Option<String>,
    ) -> Self {
        match (role, user) {
            (Some(role), _) => Principal::role(role),
            (None, Some(user)) => Principal::user(user),
            (None, None) => {
                Principal::user(default_user.unwrap_or_else(|| DEFAULT_USER.to_owned()))
            }
        }
    }
}

impl Default for Principal {
    fn default() -> Self {
        Principal::user(DEFAULT_USER)
    }
}

impl Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}
