//! Login resolution: a username/password pair in, a role-bearing identity out.

use crate::directory::UserEntry;
use crate::profile::{ROLE_ADMIN, ROLE_USER};
use crate::routes::Route;

/// Hardcoded super-admin credential, checked before the user directory.
/// Local-demo trust model only; this is not a production credential scheme.
const SUPER_ADMIN_USERNAME: &str = "admin";
const SUPER_ADMIN_PASSWORD: &str = "admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginError {
    /// Username or password was blank after trimming.
    MissingField,
    /// No credential matched.
    InvalidCredentials,
}

impl std::fmt::Display for LoginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField => write!(f, "username and password are required"),
            Self::InvalidCredentials => write!(f, "invalid username or password"),
        }
    }
}

impl std::error::Error for LoginError {}

/// A successful authentication: the username plus the role granted for
/// this login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    pub username: String,
    pub role: String,
}

/// Resolve a credential pair. First match wins:
/// 1. blank username/password fails before any credential check;
/// 2. the hardcoded super-admin credential grants `admin`, independent of
///    the directory;
/// 3. an exact, case-sensitive directory match grants `user`. The entry's
///    stored role field is not consulted, so a directory-created admin still
///    logs in as a plain user.
pub fn authenticate(
    users: &[UserEntry],
    username: &str,
    password: &str,
) -> Result<Authenticated, LoginError> {
    if username.trim().is_empty() || password.trim().is_empty() {
        return Err(LoginError::MissingField);
    }

    if username == SUPER_ADMIN_USERNAME && password == SUPER_ADMIN_PASSWORD {
        return Ok(Authenticated {
            username: username.to_string(),
            role: ROLE_ADMIN.to_string(),
        });
    }

    if let Some(entry) = users
        .iter()
        .find(|u| u.username == username && u.password == password)
    {
        return Ok(Authenticated {
            username: entry.username.clone(),
            role: ROLE_USER.to_string(),
        });
    }

    Err(LoginError::InvalidCredentials)
}

/// Landing route for a freshly granted role.
pub fn landing_route(role: &str) -> Route {
    if role == ROLE_ADMIN {
        Route::AdminDashboard
    } else {
        Route::UserDashboard
    }
}
