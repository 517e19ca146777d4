use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Where visitors without a matching session are sent.
pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown session role: {0}")]
pub struct UnknownRoleError(pub String);

/// Which dashboard the current session may reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionRole {
    Admin,
    User,
}

impl SessionRole {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionRole::Admin => "admin",
            SessionRole::User => "user",
        }
    }

    #[must_use]
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            SessionRole::Admin => "/dashboard/admin",
            SessionRole::User => "/dashboard/user",
        }
    }
}

impl fmt::Display for SessionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionRole {
    type Err = UnknownRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "admin" => Ok(SessionRole::Admin),
            "user" => Ok(SessionRole::User),
            other => Err(UnknownRoleError(other.to_owned())),
        }
    }
}

/// Outcome of checking the session marker against a dashboard's required role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    RedirectToLogin,
}

impl Access {
    #[must_use]
    pub fn check(current: Option<SessionRole>, required: SessionRole) -> Self {
        if current == Some(required) {
            Access::Granted
        } else {
            Access::RedirectToLogin
        }
    }

    #[must_use]
    pub fn is_granted(&self) -> bool {
        matches!(self, Access::Granted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_round_trip_through_markers() {
        for role in [SessionRole::Admin, SessionRole::User] {
            assert_eq!(role.as_str().parse::<SessionRole>().unwrap(), role);
        }
        assert!("guest".parse::<SessionRole>().is_err());
    }

    #[test]
    fn access_requires_exact_role() {
        assert!(Access::check(Some(SessionRole::Admin), SessionRole::Admin).is_granted());
        assert_eq!(
            Access::check(Some(SessionRole::User), SessionRole::Admin),
            Access::RedirectToLogin
        );
        assert_eq!(Access::check(None, SessionRole::User), Access::RedirectToLogin);
    }
}
