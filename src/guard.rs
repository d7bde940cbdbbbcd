//! Access gate for protected routes.
//!
//! A guard starts `Pending`, resolves against the session store, and ends
//! `Granted` or `Denied` with a redirect target. Nothing is cached: every
//! navigation constructs a fresh guard and re-reads the store, so a session
//! removed between checks is noticed immediately.

use crate::profile::{self, Profile};
use crate::routes::Route;
use crate::session::SessionStore;
use crate::storage::Storage;
use anyhow::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Session not yet resolved.
    Pending,
    /// No usable session, or the required role was not met.
    Denied { redirect: Route },
    /// Session present and the role requirement, if any, satisfied.
    Granted(Profile),
}

impl Access {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Denied { .. } => "denied",
            Self::Granted(_) => "granted",
        }
    }
}

pub struct RouteGuard {
    state: Access,
    /// A corrupt session record was cleared during the last resolution.
    cleared_corrupt: bool,
}

impl RouteGuard {
    pub fn new() -> Self {
        Self {
            state: Access::Pending,
            cleared_corrupt: false,
        }
    }

    pub fn state(&self) -> &Access {
        &self.state
    }

    pub fn cleared_corrupt(&self) -> bool {
        self.cleared_corrupt
    }

    /// Resolve access for a view, optionally requiring a role. A missing
    /// profile redirects to the login route; a role mismatch redirects to
    /// the unauthorized route.
    pub fn resolve<S: Storage>(
        &mut self,
        sessions: &mut SessionStore<S>,
        required_role: Option<&str>,
    ) -> Result<Access> {
        let derived = profile::derive(sessions)?;
        self.cleared_corrupt = derived.cleared_corrupt;
        self.state = match derived.profile {
            None => Access::Denied {
                redirect: Route::Login,
            },
            Some(profile) => match required_role {
                Some(role) if profile.role != role => Access::Denied {
                    redirect: Route::Unauthorized,
                },
                _ => Access::Granted(profile),
            },
        };
        Ok(self.state.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{new_token, SessionRecord};
    use crate::storage::testing::MemStorage;
    use crate::storage::SESSION_KEY;

    fn logged_in(username: &str) -> SessionStore<MemStorage> {
        let mut sessions = SessionStore::new(MemStorage::new());
        sessions
            .save(&SessionRecord {
                username: username.to_string(),
                token: new_token(),
            })
            .unwrap();
        sessions
    }

    #[test]
    fn test_starts_pending() {
        let guard = RouteGuard::new();
        assert_eq!(guard.state(), &Access::Pending);
    }

    #[test]
    fn test_no_session_denied_to_login() {
        let mut sessions = SessionStore::new(MemStorage::new());
        let mut guard = RouteGuard::new();
        let access = guard.resolve(&mut sessions, None).unwrap();
        assert_eq!(
            access,
            Access::Denied {
                redirect: Route::Login
            }
        );
    }

    #[test]
    fn test_session_without_role_requirement_granted() {
        let mut sessions = logged_in("budi");
        let mut guard = RouteGuard::new();
        match guard.resolve(&mut sessions, None).unwrap() {
            Access::Granted(profile) => assert_eq!(profile.role, "user"),
            other => panic!("expected granted, got {:?}", other),
        }
    }

    #[test]
    fn test_user_session_denied_admin_route() {
        let mut sessions = logged_in("budi");
        let mut guard = RouteGuard::new();
        let access = guard.resolve(&mut sessions, Some("admin")).unwrap();
        assert_eq!(
            access,
            Access::Denied {
                redirect: Route::Unauthorized
            }
        );
    }

    #[test]
    fn test_admin_session_granted_admin_route() {
        let mut sessions = logged_in("admin");
        let mut guard = RouteGuard::new();
        match guard.resolve(&mut sessions, Some("admin")).unwrap() {
            Access::Granted(profile) => assert_eq!(profile.name, "Administrator Utama"),
            other => panic!("expected granted, got {:?}", other),
        }
    }

    #[test]
    fn test_admin_session_denied_user_route() {
        let mut sessions = logged_in("admin");
        let mut guard = RouteGuard::new();
        let access = guard.resolve(&mut sessions, Some("user")).unwrap();
        assert_eq!(
            access,
            Access::Denied {
                redirect: Route::Unauthorized
            }
        );
    }

    #[test]
    fn test_corrupt_session_denied_and_cleared() {
        let storage = MemStorage::with(SESSION_KEY, "][");
        let mut sessions = SessionStore::new(storage);
        let mut guard = RouteGuard::new();
        let access = guard.resolve(&mut sessions, None).unwrap();
        assert_eq!(
            access,
            Access::Denied {
                redirect: Route::Login
            }
        );
        assert!(guard.cleared_corrupt());
    }

    #[test]
    fn test_every_resolution_rereads_the_store() {
        let mut sessions = logged_in("budi");
        let mut guard = RouteGuard::new();
        assert!(matches!(
            guard.resolve(&mut sessions, None).unwrap(),
            Access::Granted(_)
        ));

        // Logout between checks is picked up on the next resolution.
        sessions.clear().unwrap();
        assert_eq!(
            guard.resolve(&mut sessions, None).unwrap(),
            Access::Denied {
                redirect: Route::Login
            }
        );
        assert!(!guard.cleared_corrupt());
    }
}
